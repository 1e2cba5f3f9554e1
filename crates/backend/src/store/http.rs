//! HTTP client for the hosted document service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use super::{Document, DocumentStore, Query, StoreError, WriteOp};

const API_KEY_HEADER: &str = "x-api-key";

/// Read retries. Writes are never retried: the service does not give us
/// idempotency tokens, so a retried create could duplicate a document.
const MAX_READ_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// [`DocumentStore`] backed by the hosted service's REST API.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(serde::Deserialize)]
struct DocumentBody {
    id: String,
    data: Value,
}

#[derive(serde::Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(serde::Deserialize)]
struct IncrementResponse {
    value: i64,
}

impl HttpStore {
    /// Build a store client against `base_url`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed base URL or if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, StoreError> {
        url::Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(API_KEY_HEADER, self.api_key.expose_secret())
    }

    /// Send a read request, retrying transient failures with backoff.
    async fn send_read(
        &self,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, StoreError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.authed(build()).send().await;
            match result {
                Ok(response) if response.status().is_server_error() && attempt < MAX_READ_ATTEMPTS => {
                    tracing::debug!(attempt, status = %response.status(), "retrying read");
                }
                Ok(response) => return Ok(response),
                Err(err) if attempt < MAX_READ_ATTEMPTS && (err.is_timeout() || err.is_connect()) => {
                    tracing::debug!(attempt, error = %err, "retrying read");
                }
                Err(err) => return Err(err.into()),
            }
            tokio::time::sleep(RETRY_BASE_DELAY * 2_u32.pow(attempt - 1)).await;
        }
    }

    async fn send_write(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        Ok(self.authed(builder).send().await?)
    }
}

/// Map a non-success response to a [`StoreError`].
async fn error_for(collection: &str, id: &str, response: Response) -> StoreError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound {
            collection: collection.to_owned(),
            id: id.to_owned(),
        },
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => StoreError::PermissionDenied,
        StatusCode::CONFLICT => StoreError::Conflict(message),
        _ => StoreError::Backend {
            status: status.as_u16(),
            message,
        },
    }
}

fn write_op_body(op: &WriteOp) -> Value {
    match op {
        WriteOp::Create { collection, id, data } => json!({
            "op": "create",
            "collection": collection,
            "id": id,
            "data": data,
        }),
        WriteOp::Update { collection, id, data } => json!({
            "op": "update",
            "collection": collection,
            "id": id,
            "data": data,
        }),
        WriteOp::Delete { collection, id } => json!({
            "op": "delete",
            "collection": collection,
            "id": id,
        }),
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.url(&format!("{collection}/{id}"));
        let response = self.send_read(|| self.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_for(collection, id, response).await);
        }
        let body: DocumentBody = response.json().await?;
        Ok(Some(Document::new(body.id, body.data)))
    }

    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let url = self.url(&format!("{collection}:query"));
        let response = self
            .send_read(|| self.client.post(&url).json(query))
            .await?;

        if !response.status().is_success() {
            return Err(error_for(collection, "", response).await);
        }
        let bodies: Vec<DocumentBody> = response.json().await?;
        Ok(bodies
            .into_iter()
            .map(|b| Document::new(b.id, b.data))
            .collect())
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        let url = self.url(collection);
        let response = self.send_write(self.client.post(&url).json(&data)).await?;

        if !response.status().is_success() {
            return Err(error_for(collection, "", response).await);
        }
        let body: CreateResponse = response.json().await?;
        Ok(body.id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        let url = self.url(&format!("{collection}/{id}"));
        let response = self.send_write(self.client.put(&url).json(&data)).await?;

        if !response.status().is_success() {
            return Err(error_for(collection, id, response).await);
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        let url = self.url(&format!("{collection}/{id}"));
        let response = self.send_write(self.client.patch(&url).json(&data)).await?;

        if !response.status().is_success() {
            return Err(error_for(collection, id, response).await);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.url(&format!("{collection}/{id}"));
        let response = self.send_write(self.client.delete(&url)).await?;

        // Deleting an absent document is a no-op.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(error_for(collection, id, response).await);
        }
        Ok(())
    }

    async fn commit(&self, writes: Vec<WriteOp>) -> Result<(), StoreError> {
        let body: Vec<Value> = writes.iter().map(write_op_body).collect();
        let url = self.url("batch:commit");
        let response = self
            .send_write(self.client.post(&url).json(&json!({ "writes": body })))
            .await?;

        if !response.status().is_success() {
            return Err(error_for("batch", "", response).await);
        }
        Ok(())
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let url = self.url(&format!("{collection}/{id}:increment"));
        let response = self
            .send_write(
                self.client
                    .post(&url)
                    .json(&json!({ "field": field, "delta": delta })),
            )
            .await?;

        if !response.status().is_success() {
            return Err(error_for(collection, id, response).await);
        }
        let body: IncrementResponse = response.json().await?;
        Ok(body.value)
    }
}
