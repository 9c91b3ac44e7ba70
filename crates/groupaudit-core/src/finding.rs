//! Join-policy classification and report formatting.

use std::fmt;

use serde::Serialize;

use crate::group::{GroupSettings, WhoCanJoin};

/// The kind of permissive join policy detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingKind {
    /// Anyone with an account in the domain can join.
    DomainOpen,
    /// Anyone on the internet can join.
    PublicOpen,
}

impl FindingKind {
    /// Maps a join policy to a finding kind. Non-permissive and unknown
    /// values produce no finding.
    pub fn from_policy(policy: &WhoCanJoin) -> Option<Self> {
        match policy {
            WhoCanJoin::AllInDomainCanJoin => Some(Self::DomainOpen),
            WhoCanJoin::AnyoneCanJoin => Some(Self::PublicOpen),
            _ => None,
        }
    }

    /// Human-readable description printed in reports.
    pub fn description(&self) -> &'static str {
        match self {
            Self::DomainOpen => "allows anyone in the domain to join",
            Self::PublicOpen => "allows anyone anywhere to join",
        }
    }
}

/// A group whose join policy is considered overly permissive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// The offending group's email.
    pub group_email: String,
    /// The raw policy value.
    pub policy: WhoCanJoin,
    /// Classification of the policy.
    pub kind: FindingKind,
}

impl Finding {
    /// Classifies a group's settings, returning a finding if its join
    /// policy is permissive.
    pub fn classify(group_email: &str, settings: &GroupSettings) -> Option<Self> {
        let kind = FindingKind::from_policy(&settings.who_can_join)?;
        Some(Self {
            group_email: group_email.to_string(),
            policy: settings.who_can_join.clone(),
            kind,
        })
    }

    /// Returns the human-readable description of this finding.
    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group: {} | {}", self.group_email, self.description())
    }
}

/// Output format for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// `Group: <email> | <description>` lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// JSON representation of a finding.
#[derive(Debug, Serialize)]
pub struct JsonFinding<'a> {
    pub group: &'a str,
    pub who_can_join: &'a WhoCanJoin,
    pub description: &'static str,
}

impl<'a> From<&'a Finding> for JsonFinding<'a> {
    fn from(finding: &'a Finding) -> Self {
        Self {
            group: &finding.group_email,
            who_can_join: &finding.policy,
            description: finding.description(),
        }
    }
}

/// Renders a single finding as one output line (without trailing newline).
///
/// # Errors
///
/// Returns the serializer error if the JSON line cannot be produced.
pub fn format_finding(finding: &Finding, format: ReportFormat) -> serde_json::Result<String> {
    match format {
        ReportFormat::Text => Ok(finding.to_string()),
        ReportFormat::Json => serde_json::to_string(&JsonFinding::from(finding)),
    }
}

/// Counters collected over one audit run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    /// Groups returned by the directory.
    pub groups_seen: usize,
    /// Groups reported as permissive.
    pub findings: usize,
    /// Groups whose settings could not be fetched.
    pub failures: usize,
}

impl AuditSummary {
    /// Adds another summary's counters to this one.
    pub fn merge(&mut self, other: AuditSummary) {
        self.groups_seen += other.groups_seen;
        self.findings += other.findings;
        self.failures += other.failures;
    }
}

impl fmt::Display for AuditSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "audited {} groups: {} permissive, {} failed",
            self.groups_seen, self.findings, self.failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(raw: &str) -> Option<Finding> {
        Finding::classify("team@example.com", &GroupSettings::new("team@example.com", raw))
    }

    #[test]
    fn classification_table() {
        assert_eq!(
            classify("ALL_IN_DOMAIN_CAN_JOIN").map(|f| f.description()),
            Some("allows anyone in the domain to join")
        );
        assert_eq!(
            classify("ANYONE_CAN_JOIN").map(|f| f.description()),
            Some("allows anyone anywhere to join")
        );
        assert!(classify("INVITED_CAN_JOIN").is_none());
        assert!(classify("CAN_REQUEST_TO_JOIN").is_none());
        assert!(classify("SOMETHING_ELSE").is_none());
        assert!(classify("").is_none());
    }

    #[test]
    fn classification_is_case_sensitive() {
        assert!(classify("anyone_can_join").is_none());
        assert!(classify("All_In_Domain_Can_Join").is_none());
    }

    #[test]
    fn text_format() {
        let finding = classify("ALL_IN_DOMAIN_CAN_JOIN").unwrap();
        insta::assert_snapshot!(
            format_finding(&finding, ReportFormat::Text).unwrap(),
            @"Group: team@example.com | allows anyone in the domain to join"
        );
    }

    #[test]
    fn json_format() {
        let finding = classify("ANYONE_CAN_JOIN").unwrap();
        insta::assert_snapshot!(
            format_finding(&finding, ReportFormat::Json).unwrap(),
            @r#"{"group":"team@example.com","who_can_join":"ANYONE_CAN_JOIN","description":"allows anyone anywhere to join"}"#
        );
    }

    #[test]
    fn json_line_has_only_report_fields() {
        let finding = classify("ALL_IN_DOMAIN_CAN_JOIN").unwrap();
        let line = format_finding(&finding, ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["description", "group", "who_can_join"]);
    }

    #[test]
    fn summary_merge_and_display() {
        let mut total = AuditSummary::default();
        total.merge(AuditSummary {
            groups_seen: 3,
            findings: 1,
            failures: 0,
        });
        total.merge(AuditSummary {
            groups_seen: 2,
            findings: 0,
            failures: 1,
        });
        assert_eq!(total.groups_seen, 5);
        assert_eq!(total.to_string(), "audited 5 groups: 1 permissive, 1 failed");
    }
}
