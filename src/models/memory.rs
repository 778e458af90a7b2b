use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A note in the memory directory.
///
/// The filesystem owns these entirely; the server only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryFile {
    pub name: String,
    /// Human readable size, e.g. `1.5 KB`.
    pub size: String,
    pub modified: DateTime<Utc>,
    /// First 200 characters with heading markers removed.
    pub preview: String,
}
