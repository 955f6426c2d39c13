use crate::demo::{run_commission_check, run_demo, CommissionArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use vk_assessment::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "VK Assessment",
    about = "Run the selection-procedure exam service or exercise it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a candidate through a scripted exam on a simulated clock
    Demo(DemoArgs),
    /// Check an evaluation commission roster stored as JSON
    Commission(CommissionArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Commission(args) => run_commission_check(args),
    }
}
