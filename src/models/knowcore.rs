use serde::{Deserialize, Serialize};

/// Reachability of the remote knowledge base.
///
/// A connected status carries the knowledge-base identity and probe metrics;
/// a disconnected one carries only `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowcoreStatus {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kc_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<u64>,
    /// Probe latency in milliseconds, as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KnowcoreStatus {
    pub fn connected(kc_name: String, kc_id: String, total_chunks: u64, latency: u64) -> Self {
        Self {
            connected: true,
            kc_name: Some(kc_name),
            kc_id: Some(kc_id),
            total_chunks: Some(total_chunks),
            latency: Some(latency),
            error: None,
        }
    }

    pub fn disconnected(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            kc_name: None,
            kc_id: None,
            total_chunks: None,
            latency: None,
            error: Some(error.into()),
        }
    }
}
