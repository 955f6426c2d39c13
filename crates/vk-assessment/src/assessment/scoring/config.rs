use serde::{Deserialize, Serialize};

use super::policy::MultipleChoicePolicy;

/// Grading rules applied by the scoring engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub multiple_choice: MultipleChoicePolicy,
}
