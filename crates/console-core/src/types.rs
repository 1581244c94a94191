//! Core types for the settings console
//!
//! Location hierarchy nodes and the identifiers shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend identifier of a location node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create new node ID
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Geographic scoping levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationLevel {
    /// Country (root)
    Country,
    /// State
    State,
    /// District
    District,
    /// Cluster
    Cluster,
    /// City
    City,
}

impl LocationLevel {
    /// Every level, broadest first
    pub const ALL: [LocationLevel; 5] = [
        LocationLevel::Country,
        LocationLevel::State,
        LocationLevel::District,
        LocationLevel::Cluster,
        LocationLevel::City,
    ];

    /// Wire name of the level
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationLevel::Country => "country",
            LocationLevel::State => "state",
            LocationLevel::District => "district",
            LocationLevel::Cluster => "cluster",
            LocationLevel::City => "city",
        }
    }

    /// Collection endpoint for nodes of this level
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self {
            LocationLevel::Country => "/countries",
            LocationLevel::State => "/states",
            LocationLevel::District => "/districts",
            LocationLevel::Cluster => "/clusters",
            LocationLevel::City => "/cities",
        }
    }

    /// Query parameter that scopes a request to a node of this level
    #[inline]
    #[must_use]
    pub fn param_name(&self) -> &'static str {
        match self {
            LocationLevel::Country => "countryId",
            LocationLevel::State => "stateId",
            LocationLevel::District => "districtId",
            LocationLevel::Cluster => "clusterId",
            LocationLevel::City => "cityId",
        }
    }
}

impl fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocationLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown location level: '{s}'"))
    }
}

/// A node of the location hierarchy
///
/// Maintained by the external location service; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationNode {
    /// Node ID
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Parent node, `None` for roots
    pub parent_id: Option<NodeId>,
    /// Level of this node
    pub level: LocationLevel,
}

impl LocationNode {
    /// Create new node
    #[inline]
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: LocationLevel) -> Self {
        Self {
            id: NodeId::new(id),
            name: name.into(),
            parent_id: None,
            level,
        }
    }

    /// With parent
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent_id = Some(parent);
        self
    }
}

/// What happens when a level is reselected with its current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReselectPolicy {
    /// Clear descendants and refetch (force refresh)
    #[default]
    Refresh,
    /// Treat as a no-op
    Ignore,
}
