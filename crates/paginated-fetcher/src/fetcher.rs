use std::collections::VecDeque;
use std::future::Future;

use futures::Stream;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::options::FetchOptions;
use crate::page::Page;
use crate::state::{FetchPhase, FetchState};

/// Start a fetch over `page_fetch`.
///
/// `page_fetch` receives the continuation token to send (or `None` for the
/// first page) and the page-size hint, and returns one page. Nothing is
/// requested until the returned fetcher is polled.
///
/// ```
/// use paginated_fetcher::{fetch, FetchError, FetchOptions, Page};
///
/// # tokio_test::block_on(async {
/// let outcome = fetch(
///     |token: Option<String>, _hint: Option<i32>| async move {
///         Ok::<_, FetchError>(match token.as_deref() {
///             None => Page::new(vec![1, 2], Some("p2".to_string())),
///             _ => Page::last(vec![3]),
///         })
///     },
///     FetchOptions::unbounded(),
/// )
/// .collect()
/// .await
/// .unwrap();
///
/// assert_eq!(outcome.items, vec![1, 2, 3]);
/// # });
/// ```
pub fn fetch<T, F, Fut>(page_fetch: F, options: FetchOptions) -> PaginatedFetcher<T, F>
where
    F: FnMut(Option<String>, Option<i32>) -> Fut,
    Fut: Future<Output = Result<Page<T>, FetchError>>,
{
    PaginatedFetcher::new(page_fetch, options)
}

/// Everything a drained fetch produced.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub items: Vec<T>,
    /// Resume point; `None` once the service reported no more pages.
    pub next_token: Option<String>,
    /// Error that ended a bounded fetch after partial results.
    pub soft_stop: Option<FetchError>,
    pub pages_fetched: usize,
    /// Items dropped by a strict limit. When non-zero `next_token` is `None`:
    /// the fetch cannot be resumed without skipping them.
    pub truncated: usize,
    /// A cancellation request stopped the fetch early.
    pub cancelled: bool,
}

impl<T> FetchOutcome<T> {
    pub fn is_partial(&self) -> bool {
        self.soft_stop.is_some()
    }
}

/// Forward-only cursor over the items of a paged list operation.
///
/// Pages are requested one at a time, only after every item of the previous
/// page has been handed out.
pub struct PaginatedFetcher<T, F> {
    page_fetch: F,
    options: FetchOptions,
    state: FetchState,
    buffer: VecDeque<T>,
    soft_stop: Option<FetchError>,
}

impl<T, F> PaginatedFetcher<T, F> {
    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Token a later fetch can start from to continue where this one stopped.
    pub fn next_token(&self) -> Option<&str> {
        self.state.continuation_token()
    }

    pub fn soft_stop_error(&self) -> Option<&FetchError> {
        self.soft_stop.as_ref()
    }

    /// Whether a cancellation request stopped this fetch before a page it
    /// would otherwise have requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled
    }

    fn cancel_requested(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.is_cancelled())
    }

    /// The first page is always requested; later pages only in auto-advance
    /// mode while a token and budget remain.
    fn should_fetch(&mut self) -> bool {
        if self.state.phase.is_terminal() {
            return false;
        }
        let more = self.state.pages_fetched == 0
            || (self.options.auto_advance
                && !self.state.budget_exhausted()
                && self.state.continuation_token.is_some());
        if more && self.cancel_requested() {
            debug!(
                pages_fetched = self.state.pages_fetched,
                "Fetch cancelled before next page"
            );
            self.state.cancelled = true;
            return false;
        }
        more
    }

    fn accept(&mut self, page: Page<T>) {
        let mut next_token = page.continuation().map(str::to_owned);
        let mut items = page.items;

        if self.options.strict_limit {
            if let Some(remaining) = self.state.remaining_budget {
                if items.len() > remaining {
                    self.state.truncated += items.len() - remaining;
                    items.truncate(remaining);
                    // The token points past the dropped items; resuming from it
                    // would skip them.
                    next_token = None;
                }
            }
        }

        self.state.record_page(items.len(), next_token);
        self.buffer.extend(items);
        self.state.phase = FetchPhase::Emitting;
    }

    /// Apply the error policy: unbounded fetches and fetches with nothing
    /// received yet propagate, bounded fetches with partial results stop.
    fn fail(&mut self, err: FetchError) -> Result<(), FetchError> {
        if self.options.max_items.is_some() && self.state.received_so_far > 0 {
            warn!(
                kind = %err.kind(),
                error = %err,
                received = self.state.received_so_far,
                pages_fetched = self.state.pages_fetched,
                "Page fetch failed after partial results, stopping early"
            );
            self.soft_stop = Some(err);
            self.state.phase = FetchPhase::Done;
            return Ok(());
        }

        self.state.phase = FetchPhase::Failed;
        Err(err)
    }
}

impl<T, F, Fut> PaginatedFetcher<T, F>
where
    F: FnMut(Option<String>, Option<i32>) -> Fut,
    Fut: Future<Output = Result<Page<T>, FetchError>>,
{
    pub fn new(page_fetch: F, options: FetchOptions) -> Self {
        let state = FetchState::new(options.start_token.clone(), options.max_items);
        Self {
            page_fetch,
            options,
            state,
            buffer: VecDeque::new(),
            soft_stop: None,
        }
    }

    /// Next item, fetching another page when the current one is used up.
    ///
    /// Returns `None` once the fetch is over. An `Err` is returned at most
    /// once and ends the fetch.
    pub async fn next(&mut self) -> Option<Result<T, FetchError>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }

            if !self.should_fetch() {
                if !self.state.phase.is_terminal() {
                    self.state.phase = FetchPhase::Done;
                }
                return None;
            }

            if let Err(err) = self.fetch_page().await {
                return Some(Err(err));
            }
        }
    }

    async fn fetch_page(&mut self) -> Result<(), FetchError> {
        let token = self.state.continuation_token.clone();
        let page_size_hint = self.options.page_size_hint(self.state.remaining_budget);

        self.state.phase = FetchPhase::Fetching;
        debug!(
            page = self.state.pages_fetched + 1,
            token = ?token,
            page_size_hint = ?page_size_hint,
            "Fetching page"
        );

        let result = (self.page_fetch)(token.clone(), page_size_hint).await;

        match result.and_then(|page| reject_repeated_token(token.as_deref(), page)) {
            Ok(page) => {
                debug!(
                    items = page.len(),
                    has_more = page.has_more(),
                    "Received page"
                );
                self.accept(page);
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Drain the fetch into memory.
    pub async fn collect(mut self) -> Result<FetchOutcome<T>, FetchError> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }

        let cancelled = self.state.cancelled;
        Ok(FetchOutcome {
            items,
            next_token: self.state.continuation_token,
            soft_stop: self.soft_stop,
            pages_fetched: self.state.pages_fetched,
            truncated: self.state.truncated,
            cancelled,
        })
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<T, FetchError>> {
        futures::stream::unfold(self, |mut fetcher| async move {
            fetcher.next().await.map(|item| (item, fetcher))
        })
    }
}

/// A service that hands back the token it was given would never finish.
fn reject_repeated_token<T>(sent: Option<&str>, page: Page<T>) -> Result<Page<T>, FetchError> {
    match (sent, page.continuation()) {
        (Some(sent), Some(next)) if sent == next => Err(FetchError::Protocol(format!(
            "service returned the continuation token it was sent: {sent}"
        ))),
        _ => Ok(page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CancelFlag;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Calls = Rc<RefCell<Vec<(Option<String>, Option<i32>)>>>;

    /// Serves fixed pages keyed by position; records every call.
    fn scripted(
        pages: Vec<Result<Page<u32>, FetchError>>,
    ) -> (
        impl FnMut(Option<String>, Option<i32>) -> std::future::Ready<Result<Page<u32>, FetchError>>,
        Calls,
    ) {
        let calls: Calls = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&calls);
        let mut pages = pages.into_iter();
        let page_fetch = move |token: Option<String>, hint: Option<i32>| {
            recorded.borrow_mut().push((token, hint));
            std::future::ready(
                pages
                    .next()
                    .unwrap_or_else(|| Err(FetchError::Protocol("no more scripted pages".into()))),
            )
        };
        (page_fetch, calls)
    }

    fn page(items: &[u32], token: &str) -> Result<Page<u32>, FetchError> {
        Ok(Page::new(items.to_vec(), Some(token.to_string())))
    }

    #[tokio::test]
    async fn test_phase_transitions() {
        let (page_fetch, _) = scripted(vec![page(&[1], "")]);
        let mut fetcher = fetch(page_fetch, FetchOptions::default());
        assert_eq!(fetcher.state().phase(), FetchPhase::Ready);

        assert_eq!(fetcher.next().await, Some(Ok(1)));
        assert_eq!(fetcher.state().phase(), FetchPhase::Emitting);

        assert_eq!(fetcher.next().await, None);
        assert_eq!(fetcher.state().phase(), FetchPhase::Done);
    }

    #[tokio::test]
    async fn test_failed_phase_is_terminal() {
        let (page_fetch, calls) = scripted(vec![Err(FetchError::Transport("reset".into()))]);
        let mut fetcher = fetch(page_fetch, FetchOptions::default());

        assert!(matches!(fetcher.next().await, Some(Err(FetchError::Transport(_)))));
        assert_eq!(fetcher.state().phase(), FetchPhase::Failed);
        assert_eq!(fetcher.next().await, None);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_with_token_keeps_going() {
        let (page_fetch, calls) = scripted(vec![page(&[], "a"), page(&[7], "")]);
        let outcome = fetch(page_fetch, FetchOptions::default())
            .collect()
            .await
            .unwrap();

        assert_eq!(outcome.items, vec![7]);
        assert_eq!(calls.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_token_is_protocol_violation() {
        let (page_fetch, _) = scripted(vec![page(&[1], "a"), page(&[2], "a")]);
        let err = fetch(page_fetch, FetchOptions::default())
            .collect()
            .await
            .unwrap_err();

        assert!(err.is_protocol_violation());
    }

    #[tokio::test]
    async fn test_cancel_between_pages() {
        let cancel = CancelFlag::new();
        let (page_fetch, calls) = scripted(vec![page(&[1, 2], "a"), page(&[3], "")]);
        let options = FetchOptions::builder().cancel(cancel.clone()).build();
        let mut fetcher = fetch(page_fetch, options);

        assert_eq!(fetcher.next().await, Some(Ok(1)));
        cancel.cancel();
        // Items already buffered are still handed out.
        assert_eq!(fetcher.next().await, Some(Ok(2)));
        assert_eq!(fetcher.next().await, None);

        assert!(fetcher.is_cancelled());
        assert_eq!(fetcher.next_token(), Some("a"));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_after_exhaustion_is_not_reported() {
        let cancel = CancelFlag::new();
        let (page_fetch, calls) = scripted(vec![Ok(Page::last(vec![1]))]);
        let options = FetchOptions::builder().cancel(cancel.clone()).build();
        let mut fetcher = fetch(page_fetch, options);

        assert_eq!(fetcher.next().await, Some(Ok(1)));
        assert_eq!(fetcher.next().await, None);
        cancel.cancel();
        assert_eq!(fetcher.next().await, None);

        assert!(!fetcher.is_cancelled());
        assert_eq!(calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_strict_limit_truncates_last_page() {
        let (page_fetch, calls) = scripted(vec![page(&[1, 2, 3], "a"), page(&[4, 5, 6], "b")]);
        let options = FetchOptions::builder()
            .max_items(5)
            .strict_limit(true)
            .build();
        let outcome = fetch(page_fetch, options).collect().await.unwrap();

        assert_eq!(outcome.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(outcome.truncated, 1);
        assert_eq!(outcome.next_token, None);
        assert_eq!(calls.borrow()[1].1, Some(2));
    }
}
