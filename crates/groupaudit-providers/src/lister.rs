//! Paged group listing.

use groupaudit_core::Group;
use tracing::debug;

use crate::error::ApiResult;
use crate::source::{GroupDirectory, MAX_PAGE_SIZE};

#[derive(Debug)]
enum PageCursor {
    First,
    Next(String),
    Done,
}

/// Walks a customer's groups one directory page at a time.
///
/// The lister is a finite, non-restartable sequence: once
/// [`next_page`](Self::next_page) has returned `None` it keeps returning
/// `None`. Errors are returned as-is; nothing is retried.
pub struct GroupLister<'a> {
    directory: &'a dyn GroupDirectory,
    customer_id: String,
    cursor: PageCursor,
    pages_fetched: usize,
}

impl<'a> GroupLister<'a> {
    /// Creates a lister for the given customer.
    pub fn new(directory: &'a dyn GroupDirectory, customer_id: impl Into<String>) -> Self {
        Self {
            directory,
            customer_id: customer_id.into(),
            cursor: PageCursor::First,
            pages_fetched: 0,
        }
    }

    /// Fetches the next page, or returns `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> ApiResult<Option<Vec<Group>>> {
        let token = match &self.cursor {
            PageCursor::Done => return Ok(None),
            PageCursor::First => None,
            PageCursor::Next(token) => Some(token.as_str()),
        };

        let page = self
            .directory
            .list_groups_page(&self.customer_id, token, MAX_PAGE_SIZE)
            .await?;
        self.pages_fetched += 1;

        debug!(
            page = self.pages_fetched,
            groups = page.groups.len(),
            "fetched directory page"
        );

        self.cursor = match page.continuation() {
            Some(next) => PageCursor::Next(next.to_string()),
            None => PageCursor::Done,
        };

        Ok(Some(page.groups))
    }

    /// Drains the remaining pages into a single list, preserving order.
    pub async fn collect_all(mut self) -> ApiResult<Vec<Group>> {
        let mut all = Vec::new();
        while let Some(groups) = self.next_page().await? {
            all.extend(groups);
        }
        Ok(all)
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}
