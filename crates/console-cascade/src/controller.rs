//! Async driver for a [`SelectionChain`]
//!
//! Applies selections synchronously, then awaits the child fetch and
//! delivers its result. The chain lock is held only between awaits, so
//! rapid re-selection is safe: superseded results are discarded by tag.

use crate::chain::{ChainSnapshot, Delivery, FetchTicket, Selection, SelectionChain};
use crate::error::{CascadeError, ChainError};
use console_client::OptionFetcher;
use console_core::{LocationNode, NodeId};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Outcome of a selection or mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Options for `index` were loaded
    Loaded {
        /// Level that received options
        index: usize,
        /// Number of options
        count: usize,
    },
    /// No fetch needed
    Settled,
    /// Same-value reselection ignored by policy
    Unchanged,
    /// A newer selection superseded this fetch
    Stale,
}

/// Selection chain plus the fetcher that fills it
pub struct CascadeController<F: ?Sized> {
    chain: Mutex<SelectionChain>,
    fetcher: Arc<F>,
}

impl<F: ?Sized> fmt::Debug for CascadeController<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeController")
            .field("chain", &*self.chain.lock())
            .finish_non_exhaustive()
    }
}

impl<F: OptionFetcher + ?Sized> CascadeController<F> {
    /// Create controller
    #[inline]
    pub fn new(chain: SelectionChain, fetcher: Arc<F>) -> Self {
        Self {
            chain: Mutex::new(chain),
            fetcher,
        }
    }

    /// Load the first level's options
    ///
    /// # Errors
    /// Fetcher failures; the first level is left without options
    pub async fn mount(&self) -> Result<FetchStatus, CascadeError> {
        let ticket = self.chain.lock().begin_root_fetch();
        match ticket {
            Some(ticket) => self.run(ticket).await,
            None => Ok(FetchStatus::Settled),
        }
    }

    /// Select (or clear) a level and load the next level's options
    ///
    /// # Errors
    /// - `CascadeError::Chain` if the selection breaks a chain invariant
    ///   (nothing changes)
    /// - `CascadeError::Console` if the child fetch failed; the selection
    ///   stays applied and the child level has no options
    pub async fn select(
        &self,
        index: usize,
        node: Option<NodeId>,
    ) -> Result<FetchStatus, CascadeError> {
        let selection = self.chain.lock().select_at(index, node)?;
        match selection {
            Selection::Fetch(ticket) => self.run(ticket).await,
            Selection::Settled => Ok(FetchStatus::Settled),
            Selection::Unchanged => Ok(FetchStatus::Unchanged),
        }
    }

    async fn run(&self, ticket: FetchTicket) -> Result<FetchStatus, CascadeError> {
        let result = self
            .fetcher
            .fetch_children(&ticket.spec, ticket.parent.as_ref())
            .await;

        let mut chain = self.chain.lock();
        match result {
            Ok(options) => match chain.deliver(&ticket, options) {
                Delivery::Applied(count) => {
                    tracing::debug!(index = ticket.index, count, "options loaded");
                    Ok(FetchStatus::Loaded {
                        index: ticket.index,
                        count,
                    })
                }
                Delivery::Stale => {
                    tracing::debug!(index = ticket.index, tag = ticket.tag, "discarding stale options");
                    Ok(FetchStatus::Stale)
                }
            },
            Err(e) => match chain.fail(&ticket) {
                Delivery::Stale => {
                    tracing::debug!(index = ticket.index, error = %e, "ignoring failure of stale fetch");
                    Ok(FetchStatus::Stale)
                }
                Delivery::Applied(_) => {
                    tracing::warn!(
                        index = ticket.index,
                        level = %ticket.spec.level,
                        error = %e,
                        "failed to load options"
                    );
                    Err(e.into())
                }
            },
        }
    }

    /// Check if every level has a selection
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.chain.lock().is_complete()
    }

    /// Check if nothing is selected
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.chain.lock().is_blank()
    }

    /// Scope of the complete chain
    ///
    /// # Errors
    /// `ChainError::Incomplete` while any level is unselected
    pub fn snapshot(&self) -> Result<ChainSnapshot, ChainError> {
        self.chain.lock().snapshot()
    }

    /// Selection at index
    #[must_use]
    pub fn selected(&self, index: usize) -> Option<NodeId> {
        self.chain.lock().selected(index).cloned()
    }

    /// Options at index
    #[must_use]
    pub fn options(&self, index: usize) -> Vec<LocationNode> {
        self.chain.lock().options(index).to_vec()
    }

    /// Copy of the current chain
    #[must_use]
    pub fn chain(&self) -> SelectionChain {
        self.chain.lock().clone()
    }

    /// Number of levels
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.lock().len()
    }

    /// Chain has no levels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.lock().is_empty()
    }
}
