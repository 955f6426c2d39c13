use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::domain::UserId;

const RECOMMENDED_MAX_MEMBERS: usize = 9;

/// One seat on a procedure's evaluation commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionMember {
    pub user_id: UserId,
    #[serde(default)]
    pub is_chairman: bool,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CommissionMember {
    pub fn new(user_id: impl Into<String>, is_chairman: bool) -> Self {
        Self {
            user_id: UserId::new(user_id),
            is_chairman,
            active: true,
        }
    }
}

/// Problems found in a commission's composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommissionIssue {
    EvenCount { members: usize },
    NoChairman,
    MultipleChairmen { chairmen: usize },
    OverRecommendedMaximum { members: usize },
    InactiveMembers { inactive: usize },
}

impl CommissionIssue {
    pub const fn code(&self) -> &'static str {
        match self {
            CommissionIssue::EvenCount { .. } => "COMMISSION_EVEN_COUNT",
            CommissionIssue::NoChairman => "NO_CHAIRMAN",
            CommissionIssue::MultipleChairmen { .. } => "MULTIPLE_CHAIRMEN",
            CommissionIssue::OverRecommendedMaximum { .. } => "COMMISSION_MAX_MEMBERS",
            CommissionIssue::InactiveMembers { .. } => "INACTIVE_COMMISSION_MEMBERS",
        }
    }

    pub fn message(&self) -> String {
        match self {
            CommissionIssue::EvenCount { members } => {
                format!("even count: commission has {members} members")
            }
            CommissionIssue::NoChairman => "no chairman: commission has no chairman".to_string(),
            CommissionIssue::MultipleChairmen { chairmen } => {
                format!("multiple chairmen: {chairmen} members are marked as chairman")
            }
            CommissionIssue::OverRecommendedMaximum { members } => format!(
                "commission has {members} members, over the recommended maximum of {RECOMMENDED_MAX_MEMBERS}"
            ),
            CommissionIssue::InactiveMembers { inactive } => {
                format!("inactive members: {inactive} commission member(s) are inactive")
            }
        }
    }
}

impl Serialize for CommissionIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CommissionIssue", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}

/// Outcome of a composition check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommissionReport {
    pub errors: Vec<CommissionIssue>,
    pub warnings: Vec<CommissionIssue>,
    pub is_ready: bool,
}

impl CommissionReport {
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|issue| issue.code() == code)
    }

    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|issue| issue.code() == code)
    }
}

/// Evaluate commission composition. Ready means an odd headcount with exactly one chairman.
pub fn check(members: &[CommissionMember]) -> CommissionReport {
    let mut seats: BTreeMap<&UserId, (bool, bool)> = BTreeMap::new();
    for member in members {
        let seat = seats.entry(&member.user_id).or_insert((false, true));
        seat.0 |= member.is_chairman;
        seat.1 &= member.active;
    }

    let count = seats.len();
    let chairmen = seats.values().filter(|(chairman, _)| *chairman).count();
    let inactive = seats.values().filter(|(_, active)| !*active).count();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if count % 2 == 0 {
        warnings.push(CommissionIssue::EvenCount { members: count });
    }
    match chairmen {
        0 => warnings.push(CommissionIssue::NoChairman),
        1 => {}
        chairmen => errors.push(CommissionIssue::MultipleChairmen { chairmen }),
    }
    if count > RECOMMENDED_MAX_MEMBERS {
        warnings.push(CommissionIssue::OverRecommendedMaximum { members: count });
    }
    if inactive > 0 {
        warnings.push(CommissionIssue::InactiveMembers { inactive });
    }

    CommissionReport {
        errors,
        warnings,
        is_ready: count % 2 == 1 && chairmen == 1,
    }
}
