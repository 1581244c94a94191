//! Scoped data loader
//!
//! Fetches the record set for a resolved scope and keeps the last good view
//! model. Failures never overwrite it; a load that finishes after a newer
//! one started is not applied.

use crate::error::CascadeError;
use async_trait::async_trait;
use console_core::ConsoleError;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of a scoped view model
///
/// Implementations may issue several requests concurrently; they must join
/// them all-or-nothing so a partial failure yields an error, not a partial
/// view.
#[async_trait]
pub trait ScopedSource: Send + Sync {
    /// Scope the records are filtered/created under
    type Scope: Clone + fmt::Debug + Send + Sync;
    /// Denormalized view model
    type View: Send + Sync;

    /// Fetch the full view for a scope
    async fn fetch(&self, scope: &Self::Scope) -> Result<Self::View, ConsoleError>;
}

struct LoaderState<Scope, View> {
    view: Option<Arc<View>>,
    scope: Option<Scope>,
    applied: u64,
}

/// Loader holding the last good view model
pub struct ScopedDataLoader<S: ScopedSource> {
    source: S,
    state: Mutex<LoaderState<S::Scope, S::View>>,
    generation: AtomicU64,
}

impl<S: ScopedSource> fmt::Debug for ScopedDataLoader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ScopedDataLoader")
            .field("scope", &state.scope)
            .field("loaded", &state.view.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: ScopedSource> ScopedDataLoader<S> {
    /// Create loader with no view
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(LoaderState {
                view: None,
                scope: None,
                applied: 0,
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Source the loader reads from
    #[inline]
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the view for `scope` and make it current
    ///
    /// # Errors
    /// The source's error; the previous view stays in place
    pub async fn load(&self, scope: &S::Scope) -> Result<Arc<S::View>, CascadeError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(?scope, generation, "loading scoped records");

        match self.source.fetch(scope).await {
            Ok(view) => {
                let view = Arc::new(view);
                let mut state = self.state.lock();
                if generation > state.applied {
                    state.view = Some(Arc::clone(&view));
                    state.scope = Some(scope.clone());
                    state.applied = generation;
                } else {
                    tracing::debug!(?scope, generation, "newer load already applied; discarding");
                }
                Ok(view)
            }
            Err(e) => {
                tracing::warn!(?scope, error = %e, "load failed; keeping previous records");
                Err(e.into())
            }
        }
    }

    /// Load the last successfully loaded scope again
    ///
    /// # Errors
    /// `CascadeError::NothingToReload` before the first successful load
    pub async fn reload(&self) -> Result<Arc<S::View>, CascadeError> {
        let scope = self
            .state
            .lock()
            .scope
            .clone()
            .ok_or(CascadeError::NothingToReload)?;
        self.load(&scope).await
    }

    /// Current view
    #[must_use]
    pub fn view(&self) -> Option<Arc<S::View>> {
        self.state.lock().view.clone()
    }

    /// Scope of the current view
    #[must_use]
    pub fn scope(&self) -> Option<S::Scope> {
        self.state.lock().scope.clone()
    }

    /// Drop the current view; in-flight loads will not be applied
    pub fn clear(&self) {
        let current = self.generation.load(Ordering::SeqCst);
        let mut state = self.state.lock();
        state.view = None;
        state.scope = None;
        state.applied = current;
    }
}
