//! Assessment engine for recruitment selection procedures.
//!
//! Covers exam question authoring rules, test definitions, timed candidate
//! sessions, scoring, and evaluation-commission composition checks.

pub mod assessment;
pub mod config;
pub mod error;
pub mod telemetry;
