//! Reachability probe for the Knowcore knowledge base.
//!
//! One best-effort POST per call: no retry, no backoff, no caching.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::KnowcoreStatus;

/// Shown when the service answers without naming its knowledge base.
pub const DEFAULT_KC_NAME: &str = "TIMMYS BRAIN";
pub const DEFAULT_KC_ID: &str = "48650977-4344-46ab-859d-894dc876b65e";

#[derive(Debug, Error)]
pub enum KnowcoreError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Rendered as the generic message the dashboard shows for any non-2xx.
    #[error("API error")]
    Status(StatusCode),
}

#[derive(Debug, Clone)]
pub struct KnowcoreClient {
    url: String,
    api_key: Option<String>,
    client: Client,
}

impl KnowcoreClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
            client: Client::new(),
        }
    }

    /// Issues a trivial retrieval and reads identity and metrics from the reply.
    pub async fn probe(&self) -> Result<KnowcoreStatus, KnowcoreError> {
        let mut request = self.client.post(&self.url).json(&json!({
            "query": "test",
            "options": { "top_k": 1, "min_score": 0.1 }
        }));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(KnowcoreError::Status(status));
        }

        let body: Value = response.json().await?;
        Ok(status_from_body(&body))
    }

    /// Probe, folding every failure into a disconnected status.
    pub async fn status(&self) -> KnowcoreStatus {
        match self.probe().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Knowcore probe failed: {:?}", e);
                KnowcoreStatus::disconnected(e.to_string())
            }
        }
    }
}

fn non_empty_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Maps a retrieval reply to a connected status. Absent, empty or zero
/// fields fall back to the defaults.
pub fn status_from_body(body: &Value) -> KnowcoreStatus {
    KnowcoreStatus::connected(
        non_empty_str(body, "/kc/name")
            .unwrap_or(DEFAULT_KC_NAME)
            .to_string(),
        non_empty_str(body, "/kc/id").unwrap_or(DEFAULT_KC_ID).to_string(),
        body.pointer("/metadata/totalChunks")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        body.pointer("/metadata/latencyMs")
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.round() as u64)))
            .unwrap_or(0),
    )
}
