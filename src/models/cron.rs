use serde::{Deserialize, Serialize};

/// One active line of the user's crontab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CronJob {
    /// Position among the active lines.
    pub id: usize,
    pub command: String,
    pub description: String,
}
