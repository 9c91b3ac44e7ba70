//! Per-group join-policy audit.
//!
//! The auditor is the only place where partial failure is tolerated: a
//! settings fetch that fails for one group is logged and counted, and the
//! remaining groups are still audited.

use groupaudit_core::{AuditSummary, Finding, Group};
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::source::GroupSettingsSource;

/// Fetches and classifies group settings.
pub struct SettingsAuditor<'a> {
    settings: &'a dyn GroupSettingsSource,
}

impl<'a> SettingsAuditor<'a> {
    /// Creates an auditor backed by the given settings source.
    pub fn new(settings: &'a dyn GroupSettingsSource) -> Self {
        Self { settings }
    }

    /// Audits a single group.
    ///
    /// Returns `Ok(None)` when the group's policy is not permissive.
    pub async fn audit_group(&self, group: &Group) -> ApiResult<Option<Finding>> {
        let settings = self.settings.group_settings(&group.email).await?;
        debug!(
            group = %group.email,
            who_can_join = %settings.who_can_join,
            "fetched group settings"
        );
        Ok(Finding::classify(&group.email, &settings))
    }

    /// Audits every group of a page in order, handing each finding to `sink`
    /// as soon as it is known.
    ///
    /// Exactly one settings lookup is attempted per group.
    pub async fn audit_page<F>(&self, groups: &[Group], mut sink: F) -> AuditSummary
    where
        F: FnMut(&Finding),
    {
        let mut summary = AuditSummary::default();

        for group in groups {
            summary.groups_seen += 1;
            match self.audit_group(group).await {
                Ok(Some(finding)) => {
                    summary.findings += 1;
                    sink(&finding);
                }
                Ok(None) => {}
                Err(e) => {
                    summary.failures += 1;
                    warn!("unable to retrieve settings for group {}: {}", group.email, e);
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use groupaudit_core::{FindingKind, GroupSettings};

    use super::*;
    use crate::error::ApiError;
    use crate::source::BoxFuture;

    /// Maps group emails to a raw `whoCanJoin` value; unknown emails fail.
    struct StaticSettings {
        policies: HashMap<&'static str, &'static str>,
        lookups: Mutex<Vec<String>>,
    }

    impl StaticSettings {
        fn new(policies: &[(&'static str, &'static str)]) -> Self {
            Self {
                policies: policies.iter().copied().collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }
    }

    impl GroupSettingsSource for StaticSettings {
        fn group_settings<'a>(
            &'a self,
            group_email: &'a str,
        ) -> BoxFuture<'a, ApiResult<GroupSettings>> {
            self.lookups.lock().unwrap().push(group_email.to_string());
            let result = match self.policies.get(group_email) {
                Some(raw) => Ok(GroupSettings::new(group_email, raw)),
                None => Err(ApiError::authorization("access denied")),
            };
            Box::pin(async move { result })
        }
    }

    fn groups(emails: &[&str]) -> Vec<Group> {
        emails.iter().map(|e| Group::new(*e)).collect()
    }

    #[tokio::test]
    async fn audit_group_classifies() {
        let source = StaticSettings::new(&[
            ("domain@x.com", "ALL_IN_DOMAIN_CAN_JOIN"),
            ("public@x.com", "ANYONE_CAN_JOIN"),
            ("invite@x.com", "INVITED_CAN_JOIN"),
            ("odd@x.com", "NOT_A_REAL_VALUE"),
        ]);
        let auditor = SettingsAuditor::new(&source);

        let finding = auditor
            .audit_group(&Group::new("domain@x.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(finding.kind, FindingKind::DomainOpen);

        let finding = auditor
            .audit_group(&Group::new("public@x.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(finding.kind, FindingKind::PublicOpen);

        assert!(
            auditor
                .audit_group(&Group::new("invite@x.com"))
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            auditor
                .audit_group(&Group::new("odd@x.com"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn failure_in_the_middle_does_not_stop_later_groups() {
        let source = StaticSettings::new(&[
            ("a@x.com", "ANYONE_CAN_JOIN"),
            ("c@x.com", "ALL_IN_DOMAIN_CAN_JOIN"),
        ]);
        let auditor = SettingsAuditor::new(&source);

        let mut reported = Vec::new();
        let summary = auditor
            .audit_page(&groups(&["a@x.com", "b@x.com", "c@x.com"]), |f| {
                reported.push(f.to_string())
            })
            .await;

        assert_eq!(
            reported,
            vec![
                "Group: a@x.com | allows anyone anywhere to join",
                "Group: c@x.com | allows anyone in the domain to join",
            ]
        );
        assert_eq!(
            summary,
            AuditSummary {
                groups_seen: 3,
                findings: 2,
                failures: 1,
            }
        );
    }

    #[tokio::test]
    async fn one_lookup_per_group() {
        let source = StaticSettings::new(&[
            ("a@x.com", "INVITED_CAN_JOIN"),
            ("b@x.com", "ANYONE_CAN_JOIN"),
        ]);
        let auditor = SettingsAuditor::new(&source);

        auditor
            .audit_page(&groups(&["a@x.com", "b@x.com", "missing@x.com"]), |_| {})
            .await;

        assert_eq!(
            *source.lookups.lock().unwrap(),
            vec!["a@x.com", "b@x.com", "missing@x.com"]
        );
    }
}
