mod commission;
mod common;
mod definition;
