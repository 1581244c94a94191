//! Console Cascade - cascading selection synchronizer
//!
//! A settings page is scoped by a chain of dependent location selections.
//! This crate keeps that chain consistent while its option lists load
//! asynchronously, loads the records for a complete chain, and writes
//! edits back.
//!
//! - [`SelectionChain`]: synchronous chain state (no gaps, downstream
//!   clearing, stale-response discard)
//! - [`CascadeController`]: drives the chain against an [`OptionFetcher`]
//! - [`ScopedDataLoader`]: last-good view model for a resolved scope
//! - [`Submitter`]: validate → write → reload
//! - [`SettingsPage`]: the page lifecycle tying them together
//!
//! [`OptionFetcher`]: console_client::OptionFetcher

#![warn(unreachable_pub)]

pub mod chain;
pub mod controller;
pub mod error;
pub mod loader;
pub mod page;
pub mod submitter;

pub use chain::{
    ChainLevel, ChainSnapshot, Delivery, FetchTicket, ScopeEntry, Selection, SelectionChain,
};
pub use controller::{CascadeController, FetchStatus};
pub use error::{CascadeError, ChainError};
pub use loader::{ScopedDataLoader, ScopedSource};
pub use page::{allowed_transitions, error_message, validate_transition, PageState, SettingsPage};
pub use submitter::{Confirmation, FormDraft, RecordStore, RemoveOutcome, Submitter};

/// Commonly used items
pub mod prelude {
    pub use crate::{
        CascadeController, CascadeError, ChainSnapshot, FormDraft, PageState, RecordStore,
        ScopedDataLoader, ScopedSource, SelectionChain, SettingsPage,
    };
}
