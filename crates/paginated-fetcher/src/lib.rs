//! Auto-pagination over continuation-token list operations.
//!
//! A caller binds a list operation to its filters as a closure taking
//! `(token, page_size_hint)` and hands it to [`fetch`]. The returned
//! [`PaginatedFetcher`] requests pages lazily, caps the total item count,
//! and applies one error policy across pages:
//!
//! - an unbounded fetch, or one that has received nothing yet, fails with
//!   the page error;
//! - a bounded fetch that already received items stops early and keeps the
//!   error as [`PaginatedFetcher::soft_stop_error`].

mod error;
mod fetcher;
mod options;
mod page;
mod state;

pub use error::{ErrorKind, FetchError};
pub use fetcher::{fetch, FetchOutcome, PaginatedFetcher};
pub use options::{CancelFlag, FetchOptions, DEFAULT_SERVICE_MAX_PAGE_SIZE};
pub use page::Page;
pub use state::{FetchPhase, FetchState};
