use std::fmt;

/// Where a fetch is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// Nothing requested yet.
    Ready,
    /// A page request is in flight.
    Fetching,
    /// Items of the last page are being handed out.
    Emitting,
    /// An error was propagated to the caller. Terminal.
    Failed,
    /// No further calls will be made. Terminal.
    Done,
}

impl FetchPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Done)
    }
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Fetching => write!(f, "fetching"),
            Self::Emitting => write!(f, "emitting"),
            Self::Failed => write!(f, "failed"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Cursor state of one fetch. Only the fetcher mutates it.
#[derive(Debug, Clone)]
pub struct FetchState {
    pub(crate) continuation_token: Option<String>,
    pub(crate) remaining_budget: Option<usize>,
    pub(crate) received_so_far: usize,
    pub(crate) pages_fetched: usize,
    pub(crate) truncated: usize,
    pub(crate) cancelled: bool,
    pub(crate) phase: FetchPhase,
}

impl FetchState {
    pub(crate) fn new(start_token: Option<String>, max_items: Option<usize>) -> Self {
        Self {
            continuation_token: start_token.filter(|token| !token.is_empty()),
            remaining_budget: max_items,
            received_so_far: 0,
            pages_fetched: 0,
            truncated: 0,
            cancelled: false,
            phase: FetchPhase::Ready,
        }
    }

    /// Token to send with the next page request.
    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    pub fn remaining_budget(&self) -> Option<usize> {
        self.remaining_budget
    }

    pub fn received_so_far(&self) -> usize {
        self.received_so_far
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Items dropped by a strict limit.
    pub fn truncated(&self) -> usize {
        self.truncated
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    pub(crate) fn budget_exhausted(&self) -> bool {
        self.remaining_budget == Some(0)
    }

    /// Record a successful page of `count` items and the token it returned.
    pub(crate) fn record_page(&mut self, count: usize, next_token: Option<String>) {
        self.pages_fetched += 1;
        self.received_so_far += count;
        if let Some(remaining) = self.remaining_budget.as_mut() {
            *remaining = remaining.saturating_sub(count);
        }
        self.continuation_token = next_token;
    }
}
