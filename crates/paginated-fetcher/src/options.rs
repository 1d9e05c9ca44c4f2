use bon::Builder;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Largest page the AWS list operations accept.
pub const DEFAULT_SERVICE_MAX_PAGE_SIZE: i32 = 1000;

/// Caller-supplied knobs for one fetch.
///
/// ```
/// use paginated_fetcher::FetchOptions;
///
/// let options = FetchOptions::builder()
///     .max_items(250)
///     .start_token("resume-here".to_string())
///     .build();
///
/// assert!(options.auto_advance);
/// assert!(!options.strict_limit);
/// ```
#[derive(Builder, Debug, Clone)]
pub struct FetchOptions {
    /// Token to resume from; `None` or empty starts at the beginning.
    pub start_token: Option<String>,

    /// Cap on the total number of items; `None` is unbounded.
    pub max_items: Option<usize>,

    /// `false` fetches exactly one page and hands the token back.
    #[builder(default = true)]
    pub auto_advance: bool,

    /// Truncate the last page so no more than `max_items` are emitted.
    /// Off by default: full pages are emitted and the budget may be overshot.
    #[builder(default)]
    pub strict_limit: bool,

    /// Largest page to ask for; capped at [`DEFAULT_SERVICE_MAX_PAGE_SIZE`].
    #[builder(default = DEFAULT_SERVICE_MAX_PAGE_SIZE)]
    pub service_max_page_size: i32,

    /// Checked before every page fetch.
    pub cancel: Option<CancelFlag>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FetchOptions {
    /// Fetch every page, no cap.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Fetch a single page starting at `start_token`.
    pub fn single_page(start_token: Option<String>) -> Self {
        Self::builder()
            .auto_advance(false)
            .maybe_start_token(start_token)
            .build()
    }

    /// Page-size hint to send for the given remaining budget.
    ///
    /// Never above [`DEFAULT_SERVICE_MAX_PAGE_SIZE`] whatever
    /// `service_max_page_size` says, and never below 1: a spent budget still
    /// sends a request the service accepts.
    pub fn page_size_hint(&self, remaining: Option<usize>) -> Option<i32> {
        let service_max = self
            .service_max_page_size
            .clamp(1, DEFAULT_SERVICE_MAX_PAGE_SIZE);
        remaining.map(|remaining| {
            let remaining = i32::try_from(remaining).unwrap_or(i32::MAX);
            remaining.clamp(1, service_max)
        })
    }
}

/// Shared cancellation switch for an in-progress fetch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
