use crate::infra::{bootstrap, SAMPLE_PROCEDURE};
use chrono::{Duration, Utc};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use vk_assessment::assessment::{
    check_commission, AnswerResponse, CandidateId, CommissionMember, CommissionReport, Letter,
    ManualClock, Question, QuestionKind,
};
use vk_assessment::config::AssessmentConfig;
use vk_assessment::error::AppError;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Candidate identifier used for the scripted session.
    #[arg(long, default_value = "cand-demo")]
    pub(crate) candidate: String,
    /// Minutes the simulated candidate spends on each question.
    #[arg(long, default_value_t = 2)]
    pub(crate) minutes_per_question: i64,
    /// Answer the first question, then walk away and let the deadline pass.
    #[arg(long)]
    pub(crate) abandon: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CommissionArgs {
    /// JSON file holding an array of commission members
    #[arg(long)]
    pub(crate) file: PathBuf,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        candidate,
        minutes_per_question,
        abandon,
    } = args;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let (service, definition) = bootstrap(clock.clone(), &AssessmentConfig::default())?;
    let candidate = CandidateId::new(candidate);

    println!("Selection procedure exam demo");
    println!(
        "Test '{}' ({}): {} questions, {} minutes, pass mark {} points",
        definition.name(),
        definition.id(),
        definition.questions().len(),
        definition.recommended_duration(),
        definition.recommended_score()
    );
    for question in definition.questions() {
        println!(
            "  {}. [{}] {} ({} pts)",
            question.order(),
            question.question_type(),
            question.text(),
            question.points()
        );
    }

    let session = service.start_session(&candidate, definition.id())?;
    if let (Some(start), Some(deadline)) = (session.server_start_time, session.deadline()) {
        println!(
            "\nSession {} started at {} (server time), deadline {}",
            session.id,
            start.format("%H:%M:%S"),
            deadline.format("%H:%M:%S")
        );
    }

    let answered = if abandon { 1 } else { definition.questions().len() };
    for question in definition.questions().iter().take(answered) {
        clock.advance(Duration::minutes(minutes_per_question));
        let Some(response) = scripted_response(question) else {
            continue;
        };
        let view = service.record_answer(&candidate, &session.id, question.id().clone(), response)?;
        println!(
            "  answered {:<16} {:>5}s remaining",
            question.id().as_str(),
            view.remaining_seconds
        );
    }

    let outcome = if abandon {
        clock.advance(Duration::minutes(i64::from(definition.recommended_duration())));
        let view = service.session_status(&candidate, &session.id)?;
        println!(
            "\nCandidate walked away; next status check reports {} ({} s remaining)",
            view.status.label(),
            view.remaining_seconds
        );
        service.session_result(&candidate, &session.id)?.outcome
    } else {
        service.complete_session(&candidate, &session.id)?
    };

    println!("\nResult: {}", outcome.summary());
    println!(
        "  {} of {} questions fully correct ({:.0} %)",
        outcome.correct_count, outcome.total_questions, outcome.success_rate
    );
    for grade in &outcome.grades {
        println!(
            "  {:<16} {:>4.1}/{:<4.1} {:?}",
            grade.question_id.as_str(),
            grade.awarded,
            grade.possible,
            grade.verdict
        );
    }

    let report = service.procedure_commission_validity(SAMPLE_PROCEDURE)?;
    println!("\nCommission for {SAMPLE_PROCEDURE}");
    render_commission_report(&report);
    Ok(())
}

pub(crate) fn run_commission_check(args: CommissionArgs) -> Result<(), AppError> {
    let raw = fs::read_to_string(&args.file)?;
    let members: Vec<CommissionMember> = serde_json::from_str(&raw)?;
    let report = check_commission(&members);

    println!("Commission roster {}", args.file.display());
    render_commission_report(&report);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Correct choices everywhere except the true/false statement, which is flipped.
fn scripted_response(question: &Question) -> Option<AnswerResponse> {
    match question.kind() {
        QuestionKind::SingleChoice { correct, .. } => Some(AnswerResponse::Choice(*correct)),
        QuestionKind::MultipleChoice { correct, .. } => {
            Some(AnswerResponse::Choices(correct.clone()))
        }
        QuestionKind::TrueFalse { is_true } => {
            Letter::from_index(usize::from(*is_true)).map(AnswerResponse::Choice)
        }
        QuestionKind::OpenEnded => Some(AnswerResponse::Text(
            "Komisia hodnotí uchádzačov a určuje poradie.".to_string(),
        )),
    }
}

fn render_commission_report(report: &CommissionReport) {
    let readiness = if report.is_ready { "ready" } else { "not ready" };
    println!("  Status: {readiness}");
    for issue in &report.errors {
        println!("  error   {}: {}", issue.code(), issue.message());
    }
    for issue in &report.warnings {
        println!("  warning {}: {}", issue.code(), issue.message());
    }
}
