//! Error types for the cascade
//!
//! - Chain invariant violations (rejected before any state changes)
//! - Page state machine violations
//! - Collaborator failures carried through from `console-core`

use crate::page::PageState;
use console_core::{ConsoleError, NodeId};

/// Selection chain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// Level index outside the chain
    #[error("level {index} out of range (chain has {len} levels)")]
    LevelOutOfRange {
        /// Requested level
        index: usize,
        /// Levels in the chain
        len: usize,
    },

    /// Selection would leave a gap above it
    #[error("cannot select level {index}: level {missing} has no selection")]
    AncestorUnselected {
        /// Requested level
        index: usize,
        /// First unselected ancestor
        missing: usize,
    },

    /// Node is not among the level's loaded options
    #[error("'{id}' is not an option at level {index}")]
    UnknownOption {
        /// Requested level
        index: usize,
        /// Rejected node
        id: NodeId,
    },

    /// Scope requested before every level was selected
    #[error("chain incomplete: level {missing} has no selection")]
    Incomplete {
        /// First unselected level
        missing: usize,
    },
}

/// Main cascade error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CascadeError {
    /// Chain invariant violated
    #[error("selection error: {0}")]
    Chain(#[from] ChainError),

    /// Collaborator (network, server, validation) failure
    #[error(transparent)]
    Console(#[from] ConsoleError),

    /// Write succeeded but the follow-up reload failed
    #[error("saved, but reloading failed: {0}")]
    Reload(ConsoleError),

    /// Page state machine violation
    #[error("illegal page transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: PageState,
        /// Rejected target state
        to: PageState,
    },

    /// Write attempted while a selection change is still resolving
    #[error("a selection change is still in progress")]
    SelectionPending,

    /// Reload requested before anything was loaded
    #[error("nothing loaded yet")]
    NothingToReload,
}

impl CascadeError {
    /// Underlying collaborator error, if any
    #[inline]
    #[must_use]
    pub fn console(&self) -> Option<&ConsoleError> {
        match self {
            Self::Console(e) | Self::Reload(e) => Some(e),
            _ => None,
        }
    }

    /// Check if the error is a client-side validation failure
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Console(ConsoleError::Validation(_)))
    }
}
