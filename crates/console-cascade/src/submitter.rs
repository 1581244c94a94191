//! Edit/mutate submitter
//!
//! Validates a draft, writes it, then reloads the scoped loader. There is no
//! optimistic patching: every successful write is followed by a full reload.

use crate::error::CascadeError;
use crate::loader::{ScopedDataLoader, ScopedSource};
use async_trait::async_trait;
use console_core::{ConsoleError, Validate};
use std::fmt;
use std::sync::Arc;

/// Write side of a scoped record set
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Scope records are written under
    type Scope: Clone + fmt::Debug + Send + Sync;
    /// Editable form fields
    type Draft: Validate + Send + Sync;

    /// Create a record
    async fn create(&self, scope: &Self::Scope, draft: &Self::Draft) -> Result<(), ConsoleError>;

    /// Replace a record
    async fn update(
        &self,
        scope: &Self::Scope,
        id: &str,
        draft: &Self::Draft,
    ) -> Result<(), ConsoleError>;

    /// Delete a record
    async fn delete(&self, scope: &Self::Scope, id: &str) -> Result<(), ConsoleError>;
}

/// User confirmation capability
///
/// Supplied by the caller; the submitter never blocks on a dialog itself.
pub trait Confirmation: Send + Sync {
    /// Ask the user; `true` to proceed
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Uncommitted edits to one record (or a new-record form)
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft<D> {
    /// Record being edited; `None` for a new record
    pub record_id: Option<String>,
    /// Form fields
    pub fields: D,
}

impl<D> FormDraft<D> {
    /// Draft for a new record
    #[inline]
    pub fn new(fields: D) -> Self {
        Self {
            record_id: None,
            fields,
        }
    }

    /// Draft editing an existing record
    #[inline]
    pub fn editing(id: impl Into<String>, fields: D) -> Self {
        Self {
            record_id: Some(id.into()),
            fields,
        }
    }

    /// Check if this draft creates a record
    #[inline]
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.record_id.is_none()
    }
}

/// Outcome of [`Submitter::remove`]
#[derive(Debug)]
pub enum RemoveOutcome<V> {
    /// User declined; nothing was sent
    Cancelled,
    /// Deleted and reloaded
    Removed(Arc<V>),
}

/// Validating writer that reloads after every write
pub struct Submitter<St, S: ScopedSource> {
    store: St,
    loader: Arc<ScopedDataLoader<S>>,
}

impl<St, S: ScopedSource> fmt::Debug for Submitter<St, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl<St, S> Submitter<St, S>
where
    St: RecordStore,
    S: ScopedSource<Scope = St::Scope>,
{
    /// Create submitter reloading `loader`
    #[inline]
    pub fn new(store: St, loader: Arc<ScopedDataLoader<S>>) -> Self {
        Self { store, loader }
    }

    /// Write side
    #[inline]
    #[must_use]
    pub fn store(&self) -> &St {
        &self.store
    }

    /// Loader reloaded after writes
    #[inline]
    #[must_use]
    pub fn loader(&self) -> &Arc<ScopedDataLoader<S>> {
        &self.loader
    }

    /// Validate, create or update, then reload
    ///
    /// # Errors
    /// - `ConsoleError::Validation` with every violation; nothing is sent
    /// - the store's error if the write failed (previous view kept)
    /// - `CascadeError::Reload` if the write succeeded but the reload failed
    pub async fn submit(
        &self,
        scope: &St::Scope,
        draft: &FormDraft<St::Draft>,
    ) -> Result<Arc<S::View>, CascadeError> {
        draft.fields.validate()?;

        let written = match &draft.record_id {
            None => self.store.create(scope, &draft.fields).await,
            Some(id) => self.store.update(scope, id, &draft.fields).await,
        };
        if let Err(e) = written {
            tracing::warn!(?scope, record = ?draft.record_id, error = %e, "save failed");
            return Err(e.into());
        }
        tracing::info!(?scope, record = ?draft.record_id, "record saved");

        self.reload(scope).await
    }

    /// Ask for confirmation, delete, then reload
    ///
    /// # Errors
    /// - the store's error if the delete failed
    /// - `CascadeError::Reload` if the delete succeeded but the reload failed
    pub async fn remove(
        &self,
        scope: &St::Scope,
        id: &str,
        confirmation: &dyn Confirmation,
    ) -> Result<RemoveOutcome<S::View>, CascadeError> {
        if !confirmation.confirm(&format!("Delete record {id}? This cannot be undone.")) {
            tracing::debug!(id, "delete cancelled");
            return Ok(RemoveOutcome::Cancelled);
        }

        if let Err(e) = self.store.delete(scope, id).await {
            tracing::warn!(?scope, id, error = %e, "delete failed");
            return Err(e.into());
        }
        tracing::info!(?scope, id, "record deleted");

        self.reload(scope).await.map(RemoveOutcome::Removed)
    }

    async fn reload(&self, scope: &St::Scope) -> Result<Arc<S::View>, CascadeError> {
        self.loader.load(scope).await.map_err(|e| match e {
            CascadeError::Console(inner) => CascadeError::Reload(inner),
            other => other,
        })
    }
}
