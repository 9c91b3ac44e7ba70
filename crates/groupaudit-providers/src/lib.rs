//! Group listing, settings lookup, and join-policy auditing.
//!
//! - [`GroupDirectory`] / [`GroupSettingsSource`] - the API seams
//! - [`GroupLister`] - pages through a customer's groups
//! - [`SettingsAuditor`] - fetches and classifies each group's settings
//! - [`ApiError`] - error type for everything that talks to an API
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────────┐
//! │ Directory API    │   │ Groups Settings API  │
//! └────────┬─────────┘   └──────────┬───────────┘
//!          │                        │
//!          └──────┬─────────────────┘
//!                 ▼
//!        ┌─────────────────┐
//!        │ GoogleWorkspace │
//!        └───┬─────────┬───┘
//!            │         │
//!  GroupDirectory   GroupSettingsSource
//!            │         │
//!            ▼         ▼
//!   ┌─────────────┐ ┌─────────────────┐
//!   │ GroupLister │→│ SettingsAuditor │→ Finding
//!   └─────────────┘ └─────────────────┘
//! ```

pub mod auditor;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod lister;
pub mod source;

pub use auditor::SettingsAuditor;
pub use error::{ApiError, ApiErrorCode, ApiResult};
pub use lister::GroupLister;
pub use source::{BoxFuture, GroupDirectory, GroupPage, GroupSettingsSource, MAX_PAGE_SIZE};
