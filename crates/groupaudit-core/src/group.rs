//! Group and group-settings types.
//!
//! These are the provider-agnostic shapes the auditor works with. The
//! Google-specific wire structs live in `groupaudit-providers` and are
//! converted into these types.

use std::fmt;

use serde::{Serialize, Serializer};

/// A group listed from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Stable directory identifier.
    pub id: String,
    /// The group's email address, used as its key for settings lookups.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Free-form description, if any.
    pub description: Option<String>,
    /// Number of direct members, as reported by the directory.
    pub direct_members_count: Option<u64>,
    /// Whether the group was created by an administrator.
    pub admin_created: bool,
}

impl Group {
    /// Creates a group with only an email set.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            email: email.into(),
            name: String::new(),
            description: None,
            direct_members_count: None,
            admin_created: false,
        }
    }
}

/// Who may join a group without an invitation.
///
/// Unknown values are kept verbatim in [`WhoCanJoin::Other`] so that new
/// API values never fail deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WhoCanJoin {
    /// `ANYONE_CAN_JOIN`
    AnyoneCanJoin,
    /// `ALL_IN_DOMAIN_CAN_JOIN`
    AllInDomainCanJoin,
    /// `INVITED_CAN_JOIN`
    InvitedCanJoin,
    /// `CAN_REQUEST_TO_JOIN`
    CanRequestToJoin,
    /// Any other value, including the empty string.
    Other(String),
}

impl WhoCanJoin {
    /// Parses the raw API value. Matching is exact and case-sensitive.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ANYONE_CAN_JOIN" => Self::AnyoneCanJoin,
            "ALL_IN_DOMAIN_CAN_JOIN" => Self::AllInDomainCanJoin,
            "INVITED_CAN_JOIN" => Self::InvitedCanJoin,
            "CAN_REQUEST_TO_JOIN" => Self::CanRequestToJoin,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the raw API value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AnyoneCanJoin => "ANYONE_CAN_JOIN",
            Self::AllInDomainCanJoin => "ALL_IN_DOMAIN_CAN_JOIN",
            Self::InvitedCanJoin => "INVITED_CAN_JOIN",
            Self::CanRequestToJoin => "CAN_REQUEST_TO_JOIN",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for WhoCanJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WhoCanJoin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The subset of a group's settings resource used by the audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSettings {
    /// The group's email address.
    pub email: String,
    /// Display name as reported by the settings API.
    pub name: Option<String>,
    /// Join policy.
    pub who_can_join: WhoCanJoin,
}

impl GroupSettings {
    /// Creates settings from a raw `whoCanJoin` value.
    pub fn new(email: impl Into<String>, who_can_join: &str) -> Self {
        Self {
            email: email.into(),
            name: None,
            who_can_join: WhoCanJoin::parse(who_can_join),
        }
    }
}
