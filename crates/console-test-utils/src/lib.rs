//! Testing utilities for the console workspace
//!
//! [`FakeBackend`] is an in-memory [`ApiTransport`]: JSON collections keyed
//! by path, query filtering on GET, `_id` assignment on POST, failure
//! injection, per-request delays and a request log.

#![allow(missing_docs)]

use async_trait::async_trait;
use console_client::{ApiRequest, ApiTransport, LevelSpec, LocationService, Method, RestClient};
use console_core::{ConsoleError, LocationLevel, Result};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct DelayRule {
    path: String,
    query: Vec<(String, String)>,
    delay: Duration,
}

impl DelayRule {
    fn matches(&self, request: &ApiRequest) -> bool {
        self.path == request.path
            && self
                .query
                .iter()
                .all(|(k, v)| request.query_param(k) == Some(v.as_str()))
    }
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Value>>,
    failures: HashMap<String, ConsoleError>,
    delays: Vec<DelayRule>,
    enveloped: bool,
    log: Vec<ApiRequest>,
    next_id: u64,
}

/// In-memory backend
#[derive(Default)]
pub struct FakeBackend {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for FakeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FakeBackend")
            .field("collections", &inner.collections.keys().collect::<Vec<_>>())
            .field("requests", &inner.log.len())
            .finish_non_exhaustive()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap every response in `{ success, data }`
    pub fn enveloped(self) -> Self {
        self.inner.lock().enveloped = true;
        self
    }

    /// Add a record to a collection
    pub fn insert(&self, path: &str, record: Value) {
        self.inner
            .lock()
            .collections
            .entry(path.to_string())
            .or_default()
            .push(record);
    }

    /// Records currently stored under a path
    pub fn records(&self, path: &str) -> Vec<Value> {
        self.inner
            .lock()
            .collections
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Fail every request to `path` until [`FakeBackend::recover`]
    pub fn fail(&self, path: &str, error: ConsoleError) {
        self.inner.lock().failures.insert(path.to_string(), error);
    }

    pub fn recover(&self, path: &str) {
        self.inner.lock().failures.remove(path);
    }

    /// Delay requests to `path` whose query contains every pair in `query`
    pub fn delay(&self, path: &str, query: &[(&str, &str)], delay: Duration) {
        self.inner.lock().delays.push(DelayRule {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            delay,
        });
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.inner.lock().log.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.inner
            .lock()
            .log
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn writes(&self) -> usize {
        self.inner
            .lock()
            .log
            .iter()
            .filter(|r| r.method != Method::Get)
            .count()
    }

    pub fn clear_log(&self) {
        self.inner.lock().log.clear();
    }

    /// Add a location node; `parent` becomes a `{level}Id` reference
    pub fn seed_location(
        &self,
        level: LocationLevel,
        id: &str,
        name: &str,
        parent: Option<(LocationLevel, &str)>,
    ) {
        let mut record = Map::new();
        record.insert("_id".into(), json!(id));
        record.insert("name".into(), json!(name));
        if let Some((parent_level, parent_id)) = parent {
            record.insert(parent_level.param_name().into(), json!(parent_id));
        }
        self.insert(level.endpoint(), Value::Object(record));
    }

    fn handle(&self, request: &ApiRequest) -> Result<Value> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.failures.get(&request.path) {
            return Err(error.clone());
        }

        let data = match request.method {
            Method::Get => inner.get(request),
            Method::Post => inner.post(request),
            Method::Put => inner.put(request)?,
            Method::Delete => inner.delete(request)?,
        };

        Ok(if inner.enveloped {
            json!({ "success": true, "data": data })
        } else {
            data
        })
    }
}

impl Inner {
    fn get(&self, request: &ApiRequest) -> Value {
        if let Some(records) = self.collections.get(&request.path) {
            let matching = records
                .iter()
                .filter(|record| {
                    request
                        .query
                        .iter()
                        .all(|(k, v)| record.get(k).and_then(scalar).as_deref() == Some(v.as_str()))
                })
                .cloned()
                .collect();
            return Value::Array(matching);
        }

        // unseeded collections read as empty
        match self.locate(&request.path) {
            Some((collection, index)) => self.collections[&collection][index].clone(),
            None => Value::Array(Vec::new()),
        }
    }

    fn post(&mut self, request: &ApiRequest) -> Value {
        self.next_id += 1;
        let mut record = request.body.clone().unwrap_or_else(|| json!({}));
        if let Value::Object(map) = &mut record {
            map.insert("_id".into(), json!(format!("rec-{}", self.next_id)));
        }
        self.collections
            .entry(request.path.clone())
            .or_default()
            .push(record.clone());
        record
    }

    fn put(&mut self, request: &ApiRequest) -> Result<Value> {
        let (collection, index) = self
            .locate(&request.path)
            .ok_or_else(|| not_found(&request.path))?;
        let slot = &mut self
            .collections
            .get_mut(&collection)
            .ok_or_else(|| not_found(&request.path))?[index];

        let id = slot.get("_id").cloned();
        let mut record = request.body.clone().unwrap_or_else(|| json!({}));
        if let (Value::Object(map), Some(id)) = (&mut record, id) {
            map.insert("_id".into(), id);
        }
        *slot = record.clone();
        Ok(record)
    }

    fn delete(&mut self, request: &ApiRequest) -> Result<Value> {
        let (collection, index) = self
            .locate(&request.path)
            .ok_or_else(|| not_found(&request.path))?;
        if let Some(records) = self.collections.get_mut(&collection) {
            records.remove(index);
        }
        Ok(json!({ "message": "deleted" }))
    }

    fn locate(&self, path: &str) -> Option<(String, usize)> {
        let (collection, id) = split_id(path)?;
        let index = self
            .collections
            .get(collection)?
            .iter()
            .position(|r| r.get("_id").and_then(scalar).as_deref() == Some(id))?;
        Some((collection.to_string(), index))
    }
}

fn split_id(path: &str) -> Option<(&str, &str)> {
    let (collection, id) = path.rsplit_once('/')?;
    (!collection.is_empty() && !id.is_empty()).then_some((collection, id))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn not_found(path: &str) -> ConsoleError {
    ConsoleError::NotFound(path.to_string())
}

#[async_trait]
impl ApiTransport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.log.push(request.clone());
            inner
                .delays
                .iter()
                .filter(|rule| rule.matches(&request))
                .map(|rule| rule.delay)
                .max()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.handle(&request);
        tracing::trace!(method = %request.method, path = %request.path, ok = result.is_ok(), "fake backend");
        result
    }
}

/// Gujarat and Maharashtra with clusters and districts beneath them
///
/// | state | clusters | districts |
/// |---|---|---|
/// | gj Gujarat | rk Rajkot, ahd Ahmedabad | rkc Rajkot City, amr Amreli (rk); ahc Ahmedabad City (ahd) |
/// | mh Maharashtra | pn Pune | pnc Pune City (pn) |
pub fn india() -> FakeBackend {
    use LocationLevel::{Cluster, District, State};

    let backend = FakeBackend::new();
    backend.seed_location(State, "gj", "Gujarat", None);
    backend.seed_location(State, "mh", "Maharashtra", None);
    backend.seed_location(Cluster, "rk", "Rajkot", Some((State, "gj")));
    backend.seed_location(Cluster, "ahd", "Ahmedabad", Some((State, "gj")));
    backend.seed_location(Cluster, "pn", "Pune", Some((State, "mh")));
    backend.seed_location(District, "rkc", "Rajkot City", Some((Cluster, "rk")));
    backend.seed_location(District, "amr", "Amreli", Some((Cluster, "rk")));
    backend.seed_location(District, "ahc", "Ahmedabad City", Some((Cluster, "ahd")));
    backend.seed_location(District, "pnc", "Pune City", Some((Cluster, "pn")));
    backend
}

/// Client and location service over a shared fake
pub fn services(backend: &Arc<FakeBackend>) -> (RestClient, Arc<LocationService>) {
    let client = RestClient::new(Arc::clone(backend) as Arc<dyn ApiTransport>);
    let locations = Arc::new(LocationService::new(client.clone()));
    (client, locations)
}

/// State → Cluster → District
pub fn default_levels() -> Vec<LevelSpec> {
    LevelSpec::chain(&[LocationLevel::State, LocationLevel::Cluster, LocationLevel::District])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_filters_by_query() {
        let backend = india();
        let body = backend
            .send(ApiRequest::get("/clusters").with_query(vec![("stateId".into(), "gj".into())]))
            .await
            .unwrap();
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn crud_round() {
        let backend = FakeBackend::new().enveloped();
        let created = backend
            .send(ApiRequest::post("/loan", json!({ "fieldName": "income" })))
            .await
            .unwrap();
        let id = created["data"]["_id"].as_str().unwrap().to_string();

        backend
            .send(ApiRequest::put(format!("/loan/{id}"), json!({ "fieldName": "salary" })))
            .await
            .unwrap();
        assert_eq!(backend.records("/loan")[0]["fieldName"], "salary");
        assert_eq!(backend.records("/loan")[0]["_id"], id.as_str());

        backend
            .send(ApiRequest::delete(format!("/loan/{id}")))
            .await
            .unwrap();
        assert!(backend.records("/loan").is_empty());
        assert_eq!(backend.writes(), 3);
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let backend = FakeBackend::new();
        backend.insert("/loan", json!({ "_id": "a" }));
        let err = backend.send(ApiRequest::delete("/loan/b")).await.unwrap_err();
        assert_eq!(err, ConsoleError::NotFound("/loan/b".into()));
    }

    #[tokio::test]
    async fn injected_failure_until_recovered() {
        let backend = india();
        backend.fail("/states", ConsoleError::Network("offline".into()));
        assert!(backend.send(ApiRequest::get("/states")).await.is_err());
        backend.recover("/states");
        assert!(backend.send(ApiRequest::get("/states")).await.is_ok());
        assert_eq!(backend.count(Method::Get, "/states"), 2);
    }
}
