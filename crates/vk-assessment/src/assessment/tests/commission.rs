use super::common::*;
use crate::assessment::commission::{check, CommissionIssue, CommissionMember};

#[test]
fn four_members_warn_about_even_count() {
    let report = check(&members(4, 1));
    assert!(report.has_warning("COMMISSION_EVEN_COUNT"));
    assert!(report
        .warnings
        .iter()
        .any(|issue| issue.message().contains("even count")));
    assert!(report.errors.is_empty());
    assert!(!report.is_ready);
}

#[test]
fn five_members_with_one_chairman_are_ready() {
    let report = check(&members(5, 1));
    assert!(report.is_ready);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn missing_chairman_is_a_warning() {
    let report = check(&members(3, 0));
    assert_eq!(report.warnings, vec![CommissionIssue::NoChairman]);
    assert!(report.errors.is_empty());
    assert!(!report.is_ready);
}

#[test]
fn several_chairmen_are_an_error() {
    let report = check(&members(5, 2));
    assert_eq!(
        report.errors,
        vec![CommissionIssue::MultipleChairmen { chairmen: 2 }]
    );
    assert!(report.has_error("MULTIPLE_CHAIRMEN"));
    assert!(!report.is_ready);
}

#[test]
fn oversized_commission_is_flagged() {
    let report = check(&members(11, 1));
    assert!(report.has_warning("COMMISSION_MAX_MEMBERS"));
    assert!(report.is_ready);
}

#[test]
fn inactive_members_are_flagged() {
    let mut roster = members(3, 1);
    roster[2].active = false;
    let report = check(&roster);
    assert_eq!(
        report.warnings,
        vec![CommissionIssue::InactiveMembers { inactive: 1 }]
    );
}

#[test]
fn duplicate_user_ids_count_once() {
    let mut roster = members(3, 1);
    roster.push(CommissionMember::new("user-1", false));
    let report = check(&roster);
    assert!(report.is_ready);
    assert!(!report.has_warning("COMMISSION_EVEN_COUNT"));
}

#[test]
fn repeated_user_marked_inactive_is_flagged() {
    let mut inactive = CommissionMember::new("user-0", false);
    inactive.active = false;
    let roster = vec![
        CommissionMember::new("user-0", true),
        inactive,
        CommissionMember::new("user-1", false),
    ];
    let report = check(&roster);
    assert_eq!(
        report.warnings,
        vec![
            CommissionIssue::EvenCount { members: 2 },
            CommissionIssue::InactiveMembers { inactive: 1 },
        ]
    );
}

#[test]
fn empty_commission_is_not_ready() {
    let report = check(&[]);
    assert!(report.has_warning("COMMISSION_EVEN_COUNT"));
    assert!(report.has_warning("NO_CHAIRMAN"));
    assert!(!report.is_ready);
}

#[test]
fn report_serializes_codes_and_messages() {
    let json = serde_json::to_value(check(&members(2, 2))).expect("serialize");
    assert_eq!(json["is_ready"], false);
    assert_eq!(json["errors"][0]["code"], "MULTIPLE_CHAIRMEN");
    assert!(json["errors"][0]["message"]
        .as_str()
        .expect("message string")
        .contains("multiple chairmen"));
    assert_eq!(json["warnings"][0]["code"], "COMMISSION_EVEN_COUNT");
}
