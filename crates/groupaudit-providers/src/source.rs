//! Directory and settings source traits.
//!
//! [`GroupDirectory`] lists groups one page at a time and
//! [`GroupSettingsSource`] fetches a single group's settings. The Google
//! implementation lives in [`crate::google`]; tests substitute in-memory
//! implementations.

use std::future::Future;
use std::pin::Pin;

use groupaudit_core::{Group, GroupSettings};

use crate::error::ApiResult;

/// Maximum number of groups requested per directory page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object-safe so callers can hold
/// `&dyn GroupDirectory`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One page of a directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPage {
    /// Groups on this page, in API order.
    pub groups: Vec<Group>,
    /// Continuation cursor. `None` or empty means this was the last page.
    pub next_page_token: Option<String>,
}

impl GroupPage {
    /// Creates a page with groups and no continuation.
    pub fn last(groups: Vec<Group>) -> Self {
        Self {
            groups,
            next_page_token: None,
        }
    }

    /// Builder method to set the continuation token.
    pub fn with_next_page_token(mut self, token: impl Into<String>) -> Self {
        self.next_page_token = Some(token.into());
        self
    }

    /// Returns the continuation token if another page follows.
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

/// Lists the groups of a customer.
pub trait GroupDirectory: Send + Sync {
    /// Fetches one page of groups.
    ///
    /// `page_token` is `None` for the first request and the previous page's
    /// continuation token afterwards.
    fn list_groups_page<'a>(
        &'a self,
        customer_id: &'a str,
        page_token: Option<&'a str>,
        max_results: u32,
    ) -> BoxFuture<'a, ApiResult<GroupPage>>;
}

/// Fetches per-group settings.
pub trait GroupSettingsSource: Send + Sync {
    /// Fetches the settings of the group with the given email.
    fn group_settings<'a>(&'a self, group_email: &'a str)
    -> BoxFuture<'a, ApiResult<GroupSettings>>;
}
