//! Core types: groups, settings, join-policy findings, tracing

pub mod finding;
pub mod group;
pub mod tracing;

pub use finding::{AuditSummary, Finding, FindingKind, JsonFinding, ReportFormat, format_finding};
pub use group::{Group, GroupSettings, WhoCanJoin};
pub use crate::tracing::{TracingConfig, TracingError, init_tracing};
