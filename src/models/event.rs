use serde::{Deserialize, Serialize};

/// Which dashboard view a pushed event refreshes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Tasks,
    Memory,
    Health,
    System,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Memory => "memory",
            Self::Health => "health",
            Self::System => "system",
        }
    }
}

/// The `{type, data, timestamp}` wrapper sent over the real-time channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BroadcastEnvelope {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: serde_json::Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}
