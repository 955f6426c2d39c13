use serde::{Deserialize, Serialize};

/// How a multiple-choice response earns points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleChoicePolicy {
    /// Full points only when the selection equals the correct set exactly.
    #[default]
    AllOrNothing,
    /// Points proportional to correct selections minus incorrect ones, floored at zero.
    Partial,
}

impl MultipleChoicePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all_or_nothing" | "all-or-nothing" | "strict" => Some(Self::AllOrNothing),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MultipleChoicePolicy::AllOrNothing => "all_or_nothing",
            MultipleChoicePolicy::Partial => "partial",
        }
    }

    /// Points awarded for `hits` correct and `misses` incorrect selections.
    pub(crate) fn award(
        self,
        points: u32,
        hits: usize,
        misses: usize,
        correct_total: usize,
    ) -> f64 {
        if correct_total == 0 {
            return 0.0;
        }
        match self {
            MultipleChoicePolicy::AllOrNothing => {
                if hits == correct_total && misses == 0 {
                    f64::from(points)
                } else {
                    0.0
                }
            }
            MultipleChoicePolicy::Partial => {
                let net = hits.saturating_sub(misses);
                f64::from(points) * net as f64 / correct_total as f64
            }
        }
    }
}
