// Request tokens and committed views - guards against stale responses
use crate::domain::view::{ViewKind, ViewState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One monotonically increasing counter per view.
#[derive(Debug, Default)]
pub struct RequestTokens {
    counters: [AtomicU64; ViewKind::ALL.len()],
}

impl RequestTokens {
    pub fn issue(&self, kind: ViewKind) -> u64 {
        self.counters[kind.index()].fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self, kind: ViewKind) -> u64 {
        self.counters[kind.index()].load(Ordering::SeqCst)
    }

    pub fn is_latest(&self, kind: ViewKind, token: u64) -> bool {
        self.latest(kind) == token
    }
}

/// Last committed result of one view and the key it answered (metric,
/// category, month). Only the holder of the latest token may commit.
pub struct ViewSlot<T> {
    kind: ViewKind,
    tokens: Arc<RequestTokens>,
    committed: Mutex<Option<(String, ViewState<T>)>>,
}

impl<T: Clone> ViewSlot<T> {
    pub fn new(kind: ViewKind, tokens: Arc<RequestTokens>) -> Self {
        Self {
            kind,
            tokens,
            committed: Mutex::new(None),
        }
    }

    pub fn begin(&self) -> u64 {
        self.tokens.issue(self.kind)
    }

    /// Commits `view` if its token is still the latest. A stale view is
    /// discarded; the caller gets the newer committed view for the same key
    /// when one exists, otherwise its own result back.
    pub async fn commit(&self, key: &str, view: ViewState<T>) -> ViewState<T> {
        let mut committed = self.committed.lock().await;

        if self.tokens.is_latest(self.kind, view.token) {
            *committed = Some((key.to_string(), view.clone()));
            return view;
        }

        tracing::debug!(
            "Discarding stale {:?} view (token {}, latest {})",
            self.kind,
            view.token,
            self.tokens.latest(self.kind)
        );
        match committed.as_ref() {
            Some((newer_key, newer)) if newer_key == key && newer.token > view.token => newer.clone(),
            _ => view,
        }
    }

    #[cfg(test)]
    pub async fn current(&self, key: &str) -> Option<ViewState<T>> {
        match self.committed.lock().await.as_ref() {
            Some((committed_key, view)) if committed_key == key => Some(view.clone()),
            _ => None,
        }
    }
}
