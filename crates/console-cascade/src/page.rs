//! Settings page state machine
//!
//! `Idle → Selecting* → ChainComplete → Loading → {Loaded, LoadError}`
//! `Loaded → Submitting → {Loaded, SubmitError}`
//!
//! [`SettingsPage`] drives a cascade, a scoped loader and a submitter
//! through these states. Completing the chain loads automatically; breaking
//! it again drops the view.

use crate::chain::{ChainSnapshot, SelectionChain};
use crate::controller::{CascadeController, FetchStatus};
use crate::error::CascadeError;
use crate::loader::{ScopedDataLoader, ScopedSource};
use crate::submitter::{Confirmation, FormDraft, RecordStore, RemoveOutcome, Submitter};
use console_client::OptionFetcher;
use console_core::{ConsoleError, NodeId, Validate};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Page lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Nothing selected
    Idle,
    /// Some levels selected
    Selecting,
    /// Every level selected, load not started
    ChainComplete,
    /// Scoped records loading
    Loading,
    /// Records loaded and editable
    Loaded,
    /// Load failed; previous records (if any) kept
    LoadError,
    /// Write in flight
    Submitting,
    /// Write failed; stale records kept
    SubmitError,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: PageState) -> Vec<PageState> {
    use PageState::*;
    match from {
        Idle => vec![Idle, Selecting, ChainComplete],
        Selecting => vec![Idle, Selecting, ChainComplete],
        ChainComplete => vec![Loading],
        Loading => vec![Idle, Selecting, ChainComplete, Loaded, LoadError],
        Loaded => vec![Idle, Selecting, ChainComplete, Loading, Submitting],
        LoadError => vec![Idle, Selecting, ChainComplete, Loading],
        Submitting => vec![Loaded, SubmitError, LoadError],
        SubmitError => vec![Idle, Selecting, ChainComplete, Loading, Submitting],
    }
}

/// Validate a state transition
///
/// # Errors
/// `CascadeError::IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(from: PageState, to: PageState) -> Result<(), CascadeError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(CascadeError::IllegalTransition { from, to })
    }
}

/// One settings page: location cascade + scoped records + write-back
pub struct SettingsPage<F: ?Sized, S: ScopedSource, St> {
    controller: CascadeController<F>,
    loader: Arc<ScopedDataLoader<S>>,
    submitter: Submitter<St, S>,
    state: Mutex<PageState>,
    last_error: Mutex<Option<CascadeError>>,
    // latest load ticket; older loads finish without touching the state
    loads: AtomicU64,
    // selections in flight; writes wait for zero
    selecting: AtomicUsize,
}

/// Registration of an in-flight selection, released on drop
struct PendingSelect<'a>(&'a AtomicUsize);

impl Drop for PendingSelect<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<F: ?Sized, S: ScopedSource, St> fmt::Debug for SettingsPage<F, S, St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsPage")
            .field("state", &*self.state.lock())
            .field("controller", &self.controller)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl<F, S, St> SettingsPage<F, S, St>
where
    F: OptionFetcher + ?Sized,
    S: ScopedSource<Scope = ChainSnapshot>,
    St: RecordStore<Scope = ChainSnapshot>,
{
    /// Create page in `Idle`
    pub fn new(chain: SelectionChain, fetcher: Arc<F>, source: S, store: St) -> Self {
        let loader = Arc::new(ScopedDataLoader::new(source));
        Self {
            controller: CascadeController::new(chain, fetcher),
            submitter: Submitter::new(store, Arc::clone(&loader)),
            loader,
            state: Mutex::new(PageState::Idle),
            last_error: Mutex::new(None),
            loads: AtomicU64::new(0),
            selecting: AtomicUsize::new(0),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PageState {
        *self.state.lock()
    }

    /// Current records
    #[must_use]
    pub fn view(&self) -> Option<Arc<S::View>> {
        self.loader.view()
    }

    /// Last surfaced error (toast/banner text source)
    #[must_use]
    pub fn last_error(&self) -> Option<CascadeError> {
        self.last_error.lock().clone()
    }

    /// Location cascade
    #[inline]
    #[must_use]
    pub fn controller(&self) -> &CascadeController<F> {
        &self.controller
    }

    /// Scoped loader
    #[inline]
    #[must_use]
    pub fn loader(&self) -> &Arc<ScopedDataLoader<S>> {
        &self.loader
    }

    /// Load the first level's options
    ///
    /// # Errors
    /// Fetch failure (also recorded as the last error)
    pub async fn mount(&self) -> Result<FetchStatus, CascadeError> {
        let result = self.controller.mount().await;
        self.record(result)
    }

    /// Select (or clear) a level
    ///
    /// Completing the chain triggers a load; leaving it incomplete drops the
    /// current records.
    ///
    /// # Errors
    /// Chain violations (state unchanged), option fetch failures, load
    /// failures
    pub async fn select(&self, index: usize, node: Option<NodeId>) -> Result<PageState, CascadeError> {
        let _pending = self.begin_select()?;
        let selected = self.controller.select(index, node).await;
        let status = match selected {
            Err(e @ CascadeError::Chain(_)) => return Err(e),
            Err(e) => {
                self.settle_incomplete()?;
                return self.record(Err(e));
            }
            Ok(status) => status,
        };

        if status == FetchStatus::Unchanged {
            return Ok(self.state());
        }

        match self.controller.snapshot() {
            Ok(scope) => {
                self.transition(PageState::ChainComplete)?;
                self.load_scope(&scope).await
            }
            Err(_) => {
                self.settle_incomplete()?;
                Ok(self.state())
            }
        }
    }

    /// Reload records for the current scope
    ///
    /// # Errors
    /// `ChainError::Incomplete` if the chain is not complete, or the load error
    pub async fn reload(&self) -> Result<PageState, CascadeError> {
        let scope = self.controller.snapshot()?;
        self.load_scope(&scope).await
    }

    /// Validate and save a draft, then reload
    ///
    /// Validation failures leave the state untouched and send nothing.
    ///
    /// # Errors
    /// Validation, write or reload failures
    pub async fn submit(&self, draft: &FormDraft<St::Draft>) -> Result<PageState, CascadeError> {
        draft.fields.validate()?;
        let scope = self.controller.snapshot()?;

        self.enter_submitting()?;
        let result = self.submitter.submit(&scope, draft).await;
        self.finish_write(result.map(|_| ()))
    }

    /// Delete a record after confirmation, then reload
    ///
    /// # Errors
    /// Delete or reload failures
    pub async fn remove(
        &self,
        id: &str,
        confirmation: &dyn Confirmation,
    ) -> Result<PageState, CascadeError> {
        let scope = self.controller.snapshot()?;
        validate_transition(self.state(), PageState::Submitting)?;

        // enter Submitting only once the user agreed
        let refused = Mutex::new(None);
        let confirm_and_enter = |prompt: &str| {
            if !confirmation.confirm(prompt) {
                return false;
            }
            match self.enter_submitting() {
                Ok(()) => true,
                Err(e) => {
                    *refused.lock() = Some(e);
                    false
                }
            }
        };
        let outcome = self.submitter.remove(&scope, id, &confirm_and_enter).await;
        if let Some(e) = refused.into_inner() {
            return Err(e);
        }
        match outcome {
            Ok(RemoveOutcome::Cancelled) => Ok(self.state()),
            Ok(RemoveOutcome::Removed(_)) => self.finish_write(Ok(())),
            Err(e) => self.finish_write(Err(e)),
        }
    }

    async fn load_scope(&self, scope: &ChainSnapshot) -> Result<PageState, CascadeError> {
        let ticket = self.begin_load()?;
        let result = self.loader.load(scope).await;

        if self.loads.load(Ordering::SeqCst) != ticket {
            tracing::debug!(scope = %scope.describe(), "load superseded by a newer selection");
            return Ok(self.state());
        }
        match result {
            Ok(_) => {
                self.transition(PageState::Loaded)?;
                *self.last_error.lock() = None;
                tracing::info!(scope = %scope.describe(), "scoped records loaded");
                Ok(PageState::Loaded)
            }
            Err(e) => {
                self.transition(PageState::LoadError)?;
                self.record(Err(e))
            }
        }
    }

    fn finish_write(&self, result: Result<(), CascadeError>) -> Result<PageState, CascadeError> {
        match result {
            Ok(()) => {
                self.transition(PageState::Loaded)?;
                *self.last_error.lock() = None;
                Ok(PageState::Loaded)
            }
            Err(e @ CascadeError::Reload(_)) => {
                self.transition(PageState::LoadError)?;
                self.record(Err(e))
            }
            Err(e) => {
                self.transition(PageState::SubmitError)?;
                self.record(Err(e))
            }
        }
    }

    fn settle_incomplete(&self) -> Result<(), CascadeError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.loader.clear();
        let next = if self.controller.is_blank() {
            PageState::Idle
        } else {
            PageState::Selecting
        };
        self.transition(next)
    }

    fn begin_select(&self) -> Result<PendingSelect<'_>, CascadeError> {
        let state = self.state.lock();
        validate_transition(*state, PageState::Selecting)?;
        self.selecting.fetch_add(1, Ordering::SeqCst);
        Ok(PendingSelect(&self.selecting))
    }

    fn enter_submitting(&self) -> Result<(), CascadeError> {
        let mut state = self.state.lock();
        validate_transition(*state, PageState::Submitting)?;
        if self.selecting.load(Ordering::SeqCst) > 0 {
            return Err(CascadeError::SelectionPending);
        }
        tracing::trace!(from = ?*state, "page transition to Submitting");
        *state = PageState::Submitting;
        Ok(())
    }

    // the ticket is only taken once Loading was entered
    fn begin_load(&self) -> Result<u64, CascadeError> {
        let mut state = self.state.lock();
        validate_transition(*state, PageState::Loading)?;
        tracing::trace!(from = ?*state, "page transition to Loading");
        *state = PageState::Loading;
        Ok(self.loads.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn transition(&self, to: PageState) -> Result<(), CascadeError> {
        let mut state = self.state.lock();
        validate_transition(*state, to)?;
        tracing::trace!(from = ?*state, ?to, "page transition");
        *state = to;
        Ok(())
    }

    fn record<T>(&self, result: Result<T, CascadeError>) -> Result<T, CascadeError> {
        if let Err(e) = &result {
            *self.last_error.lock() = Some(e.clone());
        }
        result
    }
}

/// Toast text for a page error
#[must_use]
pub fn error_message(error: &CascadeError) -> String {
    match error.console() {
        Some(ConsoleError::Validation(v)) => v
            .first()
            .map_or_else(|| error.to_string(), |f| f.message.clone()),
        Some(e) => e.user_message(),
        None => error.to_string(),
    }
}
