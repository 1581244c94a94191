//! Typed CRUD over [`ApiTransport`]
//!
//! Every body goes through the normalization adapter, so callers see one
//! canonical shape whatever envelope the endpoint uses.

use crate::resources::Resource;
use crate::transport::{ApiRequest, ApiTransport};
use console_core::{normalize, normalize_list, unwrap_envelope, ConsoleError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Resource client
#[derive(Clone)]
pub struct RestClient {
    transport: Arc<dyn ApiTransport>,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient").finish_non_exhaustive()
    }
}

impl RestClient {
    /// Create client over a transport
    #[inline]
    #[must_use]
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Underlying transport
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn ApiTransport> {
        &self.transport
    }

    /// `GET` a collection, optionally scoped by query parameters
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: Vec<(String, String)>,
    ) -> Result<Vec<T>> {
        self.list_path(&resource.path(), query).await
    }

    /// `GET` a collection by raw path
    pub async fn list_path<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Vec<T>> {
        let body = self
            .transport
            .send(ApiRequest::get(path).with_query(query))
            .await?;
        normalize_list(body)
    }

    /// `GET` a single object
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        let body = self
            .transport
            .send(ApiRequest::get(resource.path()).with_query(query))
            .await?;
        normalize(body)
    }

    /// `POST` a new record; returns the normalized response data
    pub async fn create<B: Serialize + ?Sized>(&self, resource: Resource, body: &B) -> Result<Value> {
        let body = to_body(body)?;
        let response = self
            .transport
            .send(ApiRequest::post(resource.path(), body))
            .await?;
        tracing::debug!(%resource, "record created");
        unwrap_envelope(response)
    }

    /// `PUT /:id` with the full object
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        resource: Resource,
        id: &str,
        body: &B,
    ) -> Result<Value> {
        let body = to_body(body)?;
        let response = self
            .transport
            .send(ApiRequest::put(resource.record_path(id)?, body))
            .await?;
        tracing::debug!(%resource, id, "record updated");
        unwrap_envelope(response)
    }

    /// `DELETE /:id`
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<()> {
        let response = self
            .transport
            .send(ApiRequest::delete(resource.record_path(id)?))
            .await?;
        unwrap_envelope(response)?;
        tracing::debug!(%resource, id, "record deleted");
        Ok(())
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| ConsoleError::InvalidResponse(format!("encoding request body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockApiTransport};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Role {
        name: String,
    }

    fn client(mock: MockApiTransport) -> RestClient {
        RestClient::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn list_tolerates_both_shapes() {
        let mut mock = MockApiTransport::new();
        mock.expect_send()
            .withf(|req| req.path == "/masters/roles")
            .times(1)
            .returning(|_| Ok(json!([{ "name": "Admin" }])));
        mock.expect_send()
            .withf(|req| req.path == "/masters/departments")
            .times(1)
            .returning(|_| Ok(json!({ "success": true, "data": [{ "name": "Sales" }] })));

        let client = client(mock);
        let roles: Vec<Role> = client.list(Resource::Roles, vec![]).await.unwrap();
        let departments: Vec<Role> = client.list(Resource::Departments, vec![]).await.unwrap();
        assert_eq!(roles[0].name, "Admin");
        assert_eq!(departments[0].name, "Sales");
    }

    #[tokio::test]
    async fn update_puts_to_record_path() {
        let mut mock = MockApiTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == Method::Put
                    && req.path == "/loan/7"
                    && req.body == Some(json!({ "fieldName": "income" }))
            })
            .times(1)
            .returning(|req| Ok(req.body.unwrap_or_default()));

        let value = client(mock)
            .update(Resource::Loan, "7", &json!({ "fieldName": "income" }))
            .await
            .unwrap();
        assert_eq!(value["fieldName"], "income");
    }

    #[tokio::test]
    async fn delete_surfaces_rejection() {
        let mut mock = MockApiTransport::new();
        mock.expect_send()
            .returning(|_| Ok(json!({ "success": false, "message": "in use" })));

        let err = client(mock).delete(Resource::Roles, "r1").await.unwrap_err();
        assert_eq!(err, ConsoleError::Rejected("in use".into()));
    }

    #[tokio::test]
    async fn unsafe_ids_are_rejected_before_sending() {
        let mut mock = MockApiTransport::new();
        mock.expect_send().times(0);
        let client = client(mock);

        let err = client.delete(Resource::Users, "../masters/roles").await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
        let err = client
            .update(Resource::Loan, "7?admin=1", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let mut mock = MockApiTransport::new();
        mock.expect_send()
            .returning(|_| Err(ConsoleError::Network("connection refused".into())));

        let err = client(mock)
            .list::<Role>(Resource::Users, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Network(_)));
    }
}
