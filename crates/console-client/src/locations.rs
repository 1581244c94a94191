//! Location option fetching
//!
//! Translates a parent selection into a child-collection request. The
//! location service is inconsistent about how a child names its parent
//! (`parentId`, `stateId`, or a populated `state` object), so nodes are
//! decoded from raw JSON rather than a fixed struct.

use crate::rest::RestClient;
use async_trait::async_trait;
use console_core::{ConsoleError, LocationLevel, LocationNode, NodeId, Result};
use serde_json::{Map, Value};

/// One level of a selection chain and how to fetch its options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSpec {
    /// Level whose nodes populate this step
    pub level: LocationLevel,
    /// Collection endpoint
    pub endpoint: String,
    /// Level of the preceding step, `None` for the first step
    pub parent_level: Option<LocationLevel>,
}

impl LevelSpec {
    /// First step of a chain
    #[inline]
    #[must_use]
    pub fn root(level: LocationLevel) -> Self {
        Self {
            level,
            endpoint: level.endpoint().to_string(),
            parent_level: None,
        }
    }

    /// Step scoped by a parent step
    #[inline]
    #[must_use]
    pub fn child_of(level: LocationLevel, parent: LocationLevel) -> Self {
        Self {
            level,
            endpoint: level.endpoint().to_string(),
            parent_level: Some(parent),
        }
    }

    /// Specs for an ordered list of levels
    #[must_use]
    pub fn chain(levels: &[LocationLevel]) -> Vec<LevelSpec> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| match i {
                0 => LevelSpec::root(level),
                _ => LevelSpec::child_of(level, levels[i - 1]),
            })
            .collect()
    }

    /// Query parameter naming the parent, e.g. `stateId`
    #[inline]
    #[must_use]
    pub fn parent_param(&self) -> Option<&'static str> {
        self.parent_level.map(|p| p.param_name())
    }
}

/// Child-collection lookups
#[async_trait]
pub trait OptionFetcher: Send + Sync {
    /// Fetch the options for `child`, limited to children of `parent`
    ///
    /// `parent` is `None` only for the first step of a chain. The returned
    /// future is one-shot; failures are not retried.
    ///
    /// # Errors
    /// - `ConsoleError::Network` if the request failed
    /// - `ConsoleError::NotFound` if the parent no longer exists
    async fn fetch_children(
        &self,
        child: &LevelSpec,
        parent: Option<&NodeId>,
    ) -> Result<Vec<LocationNode>>;
}

/// Option fetcher backed by the location endpoints
#[derive(Debug, Clone)]
pub struct LocationService {
    client: RestClient,
}

impl LocationService {
    /// Create service
    #[inline]
    #[must_use]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OptionFetcher for LocationService {
    async fn fetch_children(
        &self,
        child: &LevelSpec,
        parent: Option<&NodeId>,
    ) -> Result<Vec<LocationNode>> {
        let query = match (child.parent_param(), parent) {
            (Some(param), Some(id)) => vec![(param.to_string(), id.to_string())],
            _ => Vec::new(),
        };

        let raw: Vec<Value> = self
            .client
            .list_path(&child.endpoint, query)
            .await
            .map_err(|e| match (e, parent, child.parent_level) {
                (ConsoleError::NotFound(_), Some(id), Some(level)) => {
                    ConsoleError::NotFound(format!("{level} {id}"))
                }
                (e, ..) => e,
            })?;

        let total = raw.len();
        let mut nodes = Vec::with_capacity(total);
        for value in raw {
            let node = decode_node(value, child, parent)?;
            match (&node.parent_id, parent) {
                (Some(found), Some(wanted)) if found != wanted => continue,
                _ => nodes.push(node),
            }
        }

        if nodes.len() != total {
            tracing::debug!(
                level = %child.level,
                dropped = total - nodes.len(),
                "dropped options belonging to another parent"
            );
        }
        Ok(nodes)
    }
}

/// Decode one wire node
///
/// Missing parent references default to the requested parent.
pub fn decode_node(value: Value, child: &LevelSpec, parent: Option<&NodeId>) -> Result<LocationNode> {
    let Value::Object(map) = value else {
        return Err(ConsoleError::InvalidResponse(format!(
            "{} option is not an object",
            child.level
        )));
    };

    let id = map
        .get("_id")
        .or_else(|| map.get("id"))
        .and_then(id_of)
        .ok_or_else(|| ConsoleError::InvalidResponse(format!("{} option without id", child.level)))?;

    let name = map
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let parent_id = parent_reference(&map, child.parent_level).or_else(|| parent.cloned());

    Ok(LocationNode {
        id,
        name,
        parent_id,
        level: child.level,
    })
}

fn parent_reference(map: &Map<String, Value>, parent_level: Option<LocationLevel>) -> Option<NodeId> {
    if let Some(id) = map.get("parentId").and_then(id_of) {
        return Some(id);
    }
    let level = parent_level?;
    map.get(level.param_name())
        .or_else(|| map.get(level.as_str()))
        .and_then(id_of)
}

fn id_of(value: &Value) -> Option<NodeId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(NodeId::new(s.clone())),
        Value::Number(n) => Some(NodeId::new(n.to_string())),
        Value::Object(inner) => inner.get("_id").or_else(|| inner.get("id")).and_then(id_of),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockApiTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn service(mock: MockApiTransport) -> LocationService {
        LocationService::new(RestClient::new(Arc::new(mock)))
    }

    #[test]
    fn chain_specs_link_parents() {
        let specs = LevelSpec::chain(&[
            LocationLevel::State,
            LocationLevel::Cluster,
            LocationLevel::District,
        ]);
        assert_eq!(specs[0].parent_param(), None);
        assert_eq!(specs[1].parent_param(), Some("stateId"));
        assert_eq!(specs[2].parent_level, Some(LocationLevel::Cluster));
        assert_eq!(specs[2].endpoint, "/districts");
    }

    #[test]
    fn decode_accepts_populated_parent() {
        let spec = LevelSpec::child_of(LocationLevel::Cluster, LocationLevel::State);
        let node = decode_node(
            json!({ "_id": "c1", "name": "Rajkot", "state": { "_id": "gj", "name": "Gujarat" } }),
            &spec,
            None,
        )
        .unwrap();
        assert_eq!(node.parent_id, Some(NodeId::from("gj")));
        assert_eq!(node.level, LocationLevel::Cluster);
    }

    #[test]
    fn decode_requires_id() {
        let spec = LevelSpec::root(LocationLevel::State);
        assert!(decode_node(json!({ "name": "x" }), &spec, None).is_err());
        assert!(decode_node(json!("x"), &spec, None).is_err());
    }

    #[tokio::test]
    async fn fetch_children_scopes_and_filters() {
        let mut mock = MockApiTransport::new();
        mock.expect_send()
            .withf(|req| req.path == "/clusters" && req.query_param("stateId") == Some("gj"))
            .times(1)
            .returning(|_| {
                Ok(json!({ "success": true, "data": [
                    { "_id": "c1", "name": "Rajkot", "stateId": "gj" },
                    { "_id": "c2", "name": "Pune", "stateId": "mh" },
                    { "id": 3, "name": "Surat" }
                ]}))
            });

        let spec = LevelSpec::child_of(LocationLevel::Cluster, LocationLevel::State);
        let nodes = service(mock)
            .fetch_children(&spec, Some(&NodeId::from("gj")))
            .await
            .unwrap();

        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Rajkot", "Surat"]);
        assert_eq!(nodes[1].id, NodeId::from("3"));
        assert_eq!(nodes[1].parent_id, Some(NodeId::from("gj")));
    }

    #[tokio::test]
    async fn missing_parent_is_not_found() {
        let mut mock = MockApiTransport::new();
        mock.expect_send()
            .returning(|_| Err(ConsoleError::NotFound("/districts".into())));

        let spec = LevelSpec::child_of(LocationLevel::District, LocationLevel::Cluster);
        let err = service(mock)
            .fetch_children(&spec, Some(&NodeId::from("gone")))
            .await
            .unwrap_err();
        assert_eq!(err, ConsoleError::NotFound("cluster gone".into()));
    }
}
