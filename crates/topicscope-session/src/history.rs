//! Searchable, paginated, multi-selectable view over past predictions.
//!
//! The selection holds URLs, not entry ids, and is always a subset of the
//! URLs in the loaded (unfiltered) list. Pagination is a pure view over the
//! filtered list.

use crate::sequence::{Completion, Sequenced};
use std::sync::Arc;
use tokio::sync::RwLock;
use topicscope_gateway::{Backend, GatewayError, RetrainOutcome};
use topicscope_types::{HistoryEntry, Identity};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(GatewayError),
}

/// State of the mutating actions (retrain, delete)
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    Retraining {
        urls: Vec<String>,
    },
    Deleting {
        entry_id: String,
    },
    Completed {
        operation: HistoryOperation,
        message: String,
    },
    Failed {
        operation: HistoryOperation,
        error: GatewayError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOperation {
    Load,
    Retrain,
    Delete,
}

/// How much of the filtered view is selected (drives a tri-state checkbox)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    None,
    Partial,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub offset: usize,
    pub page_size: usize,
    pub total_filtered: usize,
}

impl HistoryPage {
    pub fn page_index(&self) -> usize {
        self.offset / self.page_size.max(1)
    }

    pub fn page_count(&self) -> usize {
        self.total_filtered.div_ceil(self.page_size.max(1))
    }
}

/// Slice of `items` starting at `offset`, at most `page_size` long
pub fn paginate<T>(items: &[T], offset: usize, page_size: usize) -> &[T] {
    let start = offset.min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Largest page-aligned offset not past the last page
fn clamp_offset(offset: usize, page_size: usize, total: usize) -> usize {
    let page_size = page_size.max(1);
    if total == 0 {
        return 0;
    }
    let last_start = ((total - 1) / page_size) * page_size;
    (offset.min(last_start) / page_size) * page_size
}

#[derive(Debug)]
struct HistoryView {
    entries: Vec<HistoryEntry>,
    filter: String,
    needle: String,
    offset: usize,
    page_size: usize,
    selection: Vec<String>,
    limit: usize,
    action: Sequenced<ActionState>,
    latest_error: Option<(HistoryOperation, GatewayError)>,
}

impl HistoryView {
    fn filtered(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(|entry| entry.matches(&self.needle))
    }

    fn filtered_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for entry in self.filtered() {
            if !urls.contains(&entry.url) {
                urls.push(entry.url.clone());
            }
        }
        urls
    }

    fn filtered_count(&self) -> usize {
        self.filtered().count()
    }

    fn reclamp(&mut self) {
        self.offset = clamp_offset(self.offset, self.page_size, self.filtered_count());
    }

    fn prune_selection(&mut self) {
        let entries = &self.entries;
        self.selection
            .retain(|url| entries.iter().any(|entry| &entry.url == url));
    }

    fn record_failure(&mut self, operation: HistoryOperation, error: GatewayError) {
        self.latest_error = Some((operation, error));
    }

    fn record_success(&mut self, operation: HistoryOperation) {
        if matches!(self.latest_error, Some((op, _)) if op == operation) {
            self.latest_error = None;
        }
    }
}

/// Prior predictions for one identity, with search, paging, selection and
/// the retrain/delete actions built on top of them
pub struct HistoryManager {
    backend: Arc<dyn Backend>,
    identity: Identity,
    load: RwLock<Sequenced<LoadState>>,
    view: RwLock<HistoryView>,
}

impl HistoryManager {
    pub fn new(backend: Arc<dyn Backend>, identity: Identity) -> Self {
        Self {
            backend,
            identity,
            load: RwLock::new(Sequenced::new(LoadState::Idle)),
            view: RwLock::new(HistoryView {
                entries: Vec::new(),
                filter: String::new(),
                needle: String::new(),
                offset: 0,
                page_size: DEFAULT_PAGE_SIZE,
                selection: Vec::new(),
                limit: DEFAULT_HISTORY_LIMIT,
                action: Sequenced::new(ActionState::Idle),
                latest_error: None,
            }),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.view.get_mut().page_size = page_size.max(1);
        self
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replace the list wholesale with the backend's latest `limit` entries
    pub async fn load(&self, limit: usize) -> Completion<Result<usize, GatewayError>> {
        self.view.write().await.limit = limit;
        let ticket = self.load.write().await.begin(LoadState::Loading);

        let outcome = self
            .backend
            .fetch_history(Some(&self.identity), limit)
            .await;

        // Lock order: load, then view
        let mut load = self.load.write().await;
        let mut view = self.view.write().await;
        let next = match &outcome {
            Ok(_) => LoadState::Loaded,
            Err(error) => LoadState::Failed(error.clone()),
        };
        if !load.settle(ticket, next) {
            tracing::debug!("Discarding superseded history load #{}", ticket);
            return Completion::Superseded;
        }

        match outcome {
            Ok(entries) => {
                let count = entries.len();
                view.entries = entries;
                view.prune_selection();
                view.reclamp();
                view.record_success(HistoryOperation::Load);
                tracing::debug!("Loaded {} history entries", count);
                Completion::Applied(Ok(count))
            }
            Err(error) => {
                view.record_failure(HistoryOperation::Load, error.clone());
                Completion::Applied(Err(error))
            }
        }
    }

    /// Load again with the most recently used limit
    pub async fn reload(&self) -> Completion<Result<usize, GatewayError>> {
        let limit = self.view.read().await.limit;
        self.load(limit).await
    }

    pub async fn load_state(&self) -> LoadState {
        self.load.read().await.state().clone()
    }

    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.view.read().await.entries.clone()
    }

    // ------------------------------------------------------------------
    // Filtering and pagination
    // ------------------------------------------------------------------

    /// Change the search text; always returns to the first page
    pub async fn set_filter(&self, text: &str) {
        let mut view = self.view.write().await;
        view.filter = text.to_string();
        view.needle = text.to_lowercase();
        view.offset = 0;
    }

    pub async fn filter(&self) -> String {
        self.view.read().await.filter.clone()
    }

    pub async fn filtered(&self) -> Vec<HistoryEntry> {
        self.view.read().await.filtered().cloned().collect()
    }

    pub async fn filtered_count(&self) -> usize {
        self.view.read().await.filtered_count()
    }

    pub async fn page(&self) -> HistoryPage {
        let view = self.view.read().await;
        let filtered: Vec<HistoryEntry> = view.filtered().cloned().collect();
        HistoryPage {
            entries: paginate(&filtered, view.offset, view.page_size).to_vec(),
            offset: view.offset,
            page_size: view.page_size,
            total_filtered: filtered.len(),
        }
    }

    pub async fn set_offset(&self, offset: usize) {
        let mut view = self.view.write().await;
        view.offset = offset;
        view.reclamp();
    }

    /// Change the page size, keeping the first visible entry on screen
    pub async fn set_page_size(&self, page_size: usize) {
        let mut view = self.view.write().await;
        view.page_size = page_size.max(1);
        view.reclamp();
    }

    pub async fn next_page(&self) {
        let mut view = self.view.write().await;
        view.offset = view.offset.saturating_add(view.page_size);
        view.reclamp();
    }

    pub async fn prev_page(&self) {
        let mut view = self.view.write().await;
        view.offset = view.offset.saturating_sub(view.page_size);
        view.reclamp();
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Flip one URL in or out of the selection. URLs not in the loaded list
    /// are ignored; returns whether the URL is now selected.
    pub async fn toggle_select(&self, url: &str) -> bool {
        let mut view = self.view.write().await;
        if let Some(pos) = view.selection.iter().position(|u| u == url) {
            view.selection.remove(pos);
            return false;
        }
        if view.entries.iter().any(|entry| entry.url == url) {
            view.selection.push(url.to_string());
            return true;
        }
        false
    }

    /// Select every URL in the filtered view, or deselect them all if they
    /// already are. Selections outside the filter are left alone.
    pub async fn select_all_filtered(&self) {
        let mut view = self.view.write().await;
        let filtered = view.filtered_urls();
        if filtered.is_empty() {
            return;
        }

        let all_selected = filtered.iter().all(|url| view.selection.contains(url));
        if all_selected {
            view.selection.retain(|url| !filtered.contains(url));
        } else {
            for url in filtered {
                if !view.selection.contains(&url) {
                    view.selection.push(url);
                }
            }
        }
    }

    pub async fn clear_selection(&self) {
        self.view.write().await.selection.clear();
    }

    pub async fn selection(&self) -> Vec<String> {
        self.view.read().await.selection.clone()
    }

    pub async fn selection_state(&self) -> SelectionState {
        let view = self.view.read().await;
        let filtered = view.filtered_urls();
        let selected = filtered
            .iter()
            .filter(|url| view.selection.contains(url))
            .count();

        match selected {
            0 => SelectionState::None,
            n if n == filtered.len() => SelectionState::All,
            _ => SelectionState::Partial,
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    pub async fn action_state(&self) -> ActionState {
        self.view.read().await.action.state().clone()
    }

    /// The most recent failure of any history operation, until that
    /// operation next succeeds
    pub async fn latest_error(&self) -> Option<(HistoryOperation, GatewayError)> {
        self.view.read().await.latest_error.clone()
    }

    /// Retrain the classifier on the selected URLs.
    ///
    /// An empty selection fails locally. On success the URLs that were sent
    /// leave the selection; anything selected meanwhile stays. On failure the
    /// selection is kept so the user can retry. A newer retrain or delete
    /// supersedes this one's effect on the action state.
    pub async fn request_retrain(&self) -> Result<RetrainOutcome, GatewayError> {
        let (ticket, urls) = {
            let mut view = self.view.write().await;
            if view.selection.is_empty() {
                let error =
                    GatewayError::validation("Select at least one URL to retrain the model");
                view.action.reset(ActionState::Failed {
                    operation: HistoryOperation::Retrain,
                    error: error.clone(),
                });
                view.record_failure(HistoryOperation::Retrain, error.clone());
                return Err(error);
            }
            let urls = view.selection.clone();
            let ticket = view
                .action
                .begin(ActionState::Retraining { urls: urls.clone() });
            (ticket, urls)
        };

        tracing::info!("Retraining on {} selected URLs", urls.len());
        let outcome = self.backend.retrain(&urls, Some(&self.identity)).await;

        let mut view = self.view.write().await;
        match &outcome {
            Ok(result) => {
                view.selection.retain(|url| !urls.contains(url));
                let applied = view.action.settle(
                    ticket,
                    ActionState::Completed {
                        operation: HistoryOperation::Retrain,
                        message: result.message.clone(),
                    },
                );
                if applied {
                    view.record_success(HistoryOperation::Retrain);
                }
            }
            Err(error) => {
                tracing::warn!("Retrain failed, keeping selection: {}", error);
                let applied = view.action.settle(
                    ticket,
                    ActionState::Failed {
                        operation: HistoryOperation::Retrain,
                        error: error.clone(),
                    },
                );
                if applied {
                    view.record_failure(HistoryOperation::Retrain, error.clone());
                }
            }
        }
        outcome
    }

    /// Delete one entry, drop it locally (list and selection), then reload
    /// from the backend so the view reflects server truth. The local removal
    /// applies even if a newer action has since taken over the action state.
    pub async fn request_delete(&self, entry_id: &str) -> Result<String, GatewayError> {
        let ticket = self.view.write().await.action.begin(ActionState::Deleting {
            entry_id: entry_id.to_string(),
        });

        let outcome = self
            .backend
            .delete_history_entry(entry_id, Some(&self.identity))
            .await;

        {
            let mut view = self.view.write().await;
            match &outcome {
                Ok(message) => {
                    if let Some(pos) = view.entries.iter().position(|e| e.id == entry_id) {
                        let removed = view.entries.remove(pos);
                        view.selection.retain(|url| url != &removed.url);
                    }
                    view.reclamp();
                    let applied = view.action.settle(
                        ticket,
                        ActionState::Completed {
                            operation: HistoryOperation::Delete,
                            message: message.clone(),
                        },
                    );
                    if applied {
                        view.record_success(HistoryOperation::Delete);
                    }
                }
                Err(error) => {
                    let applied = view.action.settle(
                        ticket,
                        ActionState::Failed {
                            operation: HistoryOperation::Delete,
                            error: error.clone(),
                        },
                    );
                    if applied {
                        view.record_failure(HistoryOperation::Delete, error.clone());
                    }
                    return outcome;
                }
            }
        }

        if let Completion::Applied(Err(error)) = self.reload().await {
            tracing::warn!("History reload after delete failed: {}", error);
        }
        outcome
    }
}
