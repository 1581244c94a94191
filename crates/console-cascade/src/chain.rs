//! Selection chain state
//!
//! An ordered list of dependent levels (e.g. State → Cluster → District).
//! Invariants:
//! - no gaps: a selection at level `i` implies selections at every `j < i`
//! - changing level `i` nulls the selection and options of every level `> i`
//! - a level accepts options only from its latest pending fetch
//!
//! The chain is synchronous and never touches the network; it hands out
//! [`FetchTicket`]s and accepts their results through [`SelectionChain::deliver`].

use crate::error::ChainError;
use console_client::LevelSpec;
use console_core::{LocationLevel, LocationNode, NodeId, ReselectPolicy};

/// One level of the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLevel {
    spec: LevelSpec,
    selected: Option<NodeId>,
    options: Vec<LocationNode>,
    pending: Option<u64>,
}

impl ChainLevel {
    fn new(spec: LevelSpec) -> Self {
        Self {
            spec,
            selected: None,
            options: Vec::new(),
            pending: None,
        }
    }

    /// Level spec
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &LevelSpec {
        &self.spec
    }

    /// Current selection
    #[inline]
    #[must_use]
    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    /// Loaded options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &[LocationNode] {
        &self.options
    }

    /// Check if a fetch for this level is outstanding
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Selected node, resolved against the options
    #[must_use]
    pub fn selected_node(&self) -> Option<&LocationNode> {
        let id = self.selected.as_ref()?;
        self.options.iter().find(|o| &o.id == id)
    }

    fn clear(&mut self) {
        self.selected = None;
        self.options.clear();
        self.pending = None;
    }
}

/// A request for one level's options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Level the options are for
    pub index: usize,
    /// Spec of that level
    pub spec: LevelSpec,
    /// Parent selection scoping the fetch (`None` for the first level)
    pub parent: Option<NodeId>,
    /// Request tag; only the latest tag per level is accepted
    pub tag: u64,
}

/// Result of [`SelectionChain::select_at`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Next level's options must be fetched
    Fetch(FetchTicket),
    /// Nothing to fetch (cleared, or last level selected)
    Settled,
    /// Same value reselected under [`ReselectPolicy::Ignore`]
    Unchanged,
}

/// Result of delivering a fetch outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Options stored; number of options
    Applied(usize),
    /// Ticket superseded; result discarded
    Stale,
}

/// Ordered dependent selections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChain {
    levels: Vec<ChainLevel>,
    next_tag: u64,
    reselect: ReselectPolicy,
}

impl SelectionChain {
    /// Create empty chain from level specs
    #[must_use]
    pub fn new(specs: Vec<LevelSpec>) -> Self {
        Self {
            levels: specs.into_iter().map(ChainLevel::new).collect(),
            next_tag: 0,
            reselect: ReselectPolicy::default(),
        }
    }

    /// Create empty chain from an ordered list of levels
    #[inline]
    #[must_use]
    pub fn from_levels(levels: &[LocationLevel]) -> Self {
        Self::new(LevelSpec::chain(levels))
    }

    /// With reselect policy
    #[inline]
    #[must_use]
    pub fn with_reselect(mut self, policy: ReselectPolicy) -> Self {
        self.reselect = policy;
        self
    }

    /// Number of levels
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Chain has no levels
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level at index
    #[inline]
    #[must_use]
    pub fn level(&self, index: usize) -> Option<&ChainLevel> {
        self.levels.get(index)
    }

    /// All levels
    #[inline]
    #[must_use]
    pub fn levels(&self) -> &[ChainLevel] {
        &self.levels
    }

    /// Selection at index
    #[inline]
    #[must_use]
    pub fn selected(&self, index: usize) -> Option<&NodeId> {
        self.levels.get(index).and_then(ChainLevel::selected)
    }

    /// Options at index (empty when out of range)
    #[inline]
    #[must_use]
    pub fn options(&self, index: usize) -> &[LocationNode] {
        self.levels
            .get(index)
            .map(ChainLevel::options)
            .unwrap_or_default()
    }

    /// Reselect policy
    #[inline]
    #[must_use]
    pub fn reselect_policy(&self) -> ReselectPolicy {
        self.reselect
    }

    /// Ticket for the first level's options
    ///
    /// Returns `None` for an empty chain.
    pub fn begin_root_fetch(&mut self) -> Option<FetchTicket> {
        if self.levels.is_empty() {
            return None;
        }
        Some(self.issue(0, None))
    }

    /// Set (or clear, with `None`) the selection at `index`
    ///
    /// Every level above `index` loses its selection and options. Selecting
    /// a node yields a ticket for the next level unless `index` is the last.
    ///
    /// # Errors
    /// - `ChainError::LevelOutOfRange` if `index >= len`
    /// - `ChainError::AncestorUnselected` if selecting would leave a gap
    /// - `ChainError::UnknownOption` if the node is not a loaded option
    pub fn select_at(
        &mut self,
        index: usize,
        node: Option<NodeId>,
    ) -> Result<Selection, ChainError> {
        let len = self.levels.len();
        if index >= len {
            return Err(ChainError::LevelOutOfRange { index, len });
        }

        if let Some(id) = &node {
            if let Some(missing) = (0..index).find(|&j| self.levels[j].selected.is_none()) {
                return Err(ChainError::AncestorUnselected { index, missing });
            }
            let level = &self.levels[index];
            if !level.options.iter().any(|o| &o.id == id) {
                return Err(ChainError::UnknownOption {
                    index,
                    id: id.clone(),
                });
            }
            if self.reselect == ReselectPolicy::Ignore && level.selected.as_ref() == Some(id) {
                return Ok(Selection::Unchanged);
            }
        }

        self.levels[index].selected.clone_from(&node);
        for level in &mut self.levels[index + 1..] {
            level.clear();
        }

        match node {
            Some(id) if index + 1 < len => Ok(Selection::Fetch(self.issue(index + 1, Some(id)))),
            _ => Ok(Selection::Settled),
        }
    }

    /// Store the options fetched for a ticket
    pub fn deliver(&mut self, ticket: &FetchTicket, options: Vec<LocationNode>) -> Delivery {
        match self.take_pending(ticket) {
            Some(level) => {
                let count = options.len();
                level.options = options;
                Delivery::Applied(count)
            }
            None => Delivery::Stale,
        }
    }

    /// Record that a ticket's fetch failed; the level keeps no options
    pub fn fail(&mut self, ticket: &FetchTicket) -> Delivery {
        match self.take_pending(ticket) {
            Some(level) => {
                level.options.clear();
                Delivery::Applied(0)
            }
            None => Delivery::Stale,
        }
    }

    /// Check if every level has a selection
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.first_unselected().is_none()
    }

    /// Scope of a complete chain
    ///
    /// # Errors
    /// `ChainError::Incomplete` naming the first unselected level
    pub fn snapshot(&self) -> Result<ChainSnapshot, ChainError> {
        if let Some(missing) = self.first_unselected() {
            return Err(ChainError::Incomplete { missing });
        }
        let entries = self
            .levels
            .iter()
            .filter_map(|level| {
                let id = level.selected.clone()?;
                let name = level
                    .selected_node()
                    .map(|n| n.name.clone())
                    .unwrap_or_default();
                Some(ScopeEntry {
                    level: level.spec.level,
                    id,
                    name,
                })
            })
            .collect();
        Ok(ChainSnapshot { entries })
    }

    /// Check if nothing is selected
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.levels.iter().all(|l| l.selected.is_none())
    }

    /// Clear every selection and every option list below the first level
    pub fn reset(&mut self) {
        for (i, level) in self.levels.iter_mut().enumerate() {
            if i == 0 {
                level.selected = None;
            } else {
                level.clear();
            }
        }
    }

    fn first_unselected(&self) -> Option<usize> {
        self.levels.iter().position(|l| l.selected.is_none())
    }

    fn issue(&mut self, index: usize, parent: Option<NodeId>) -> FetchTicket {
        self.next_tag += 1;
        let tag = self.next_tag;
        let level = &mut self.levels[index];
        level.pending = Some(tag);
        level.options.clear();
        FetchTicket {
            index,
            spec: level.spec.clone(),
            parent,
            tag,
        }
    }

    fn take_pending(&mut self, ticket: &FetchTicket) -> Option<&mut ChainLevel> {
        let level = self.levels.get_mut(ticket.index)?;
        if level.pending != Some(ticket.tag) {
            return None;
        }
        level.pending = None;
        Some(level)
    }
}

/// One resolved level of a complete chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeEntry {
    /// Level
    pub level: LocationLevel,
    /// Selected node
    pub id: NodeId,
    /// Display name of the selected node
    pub name: String,
}

/// Immutable scope of a complete chain
///
/// Only [`SelectionChain::snapshot`] creates one, so holding a snapshot
/// proves the chain was complete.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainSnapshot {
    entries: Vec<ScopeEntry>,
}

impl ChainSnapshot {
    /// Resolved levels, broadest first
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[ScopeEntry] {
        &self.entries
    }

    /// Selected node at a level
    #[must_use]
    pub fn id_of(&self, level: LocationLevel) -> Option<&NodeId> {
        self.entries.iter().find(|e| e.level == level).map(|e| &e.id)
    }

    /// Narrowest level
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> Option<&ScopeEntry> {
        self.entries.last()
    }

    /// Query parameters scoping a request, e.g. `stateId=gj&clusterId=rk`
    #[must_use]
    pub fn query(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.level.param_name().to_string(), e.id.to_string()))
            .collect()
    }

    /// Human-readable path, e.g. `Gujarat / Rajkot`
    #[must_use]
    pub fn describe(&self) -> String {
        self.entries
            .iter()
            .map(|e| if e.name.is_empty() { e.id.as_str() } else { e.name.as_str() })
            .collect::<Vec<_>>()
            .join(" / ")
    }
}
