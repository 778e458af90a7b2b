//! The user's crontab, as shown on the dashboard.

use tokio::process::Command;

use crate::error::StoreError;
use crate::models::CronJob;

#[derive(Debug, Clone)]
pub struct CronReader {
    program: String,
}

impl Default for CronReader {
    fn default() -> Self {
        Self::new("crontab")
    }
}

impl CronReader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Active crontab lines. A user without a crontab has no jobs.
    pub async fn list(&self) -> Result<Vec<CronJob>, StoreError> {
        let output = Command::new(&self.program)
            .arg("-l")
            .output()
            .await
            .map_err(|source| StoreError::Command {
                command: format!("{} -l", self.program),
                source,
            })?;

        if !output.status.success() {
            tracing::debug!("`{} -l` exited with {}", self.program, output.status);
            return Ok(Vec::new());
        }
        Ok(parse_crontab(&String::from_utf8_lossy(&output.stdout)))
    }

    pub async fn list_or_empty(&self) -> Vec<CronJob> {
        self.list().await.unwrap_or_else(|e| {
            tracing::warn!("Cron listing failed: {}", e);
            Vec::new()
        })
    }
}

/// Drops blank and comment lines; ids are positions among what remains.
pub fn parse_crontab(text: &str) -> Vec<CronJob> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .enumerate()
        .map(|(id, line)| CronJob {
            id,
            command: line.to_string(),
            description: describe(line).to_string(),
        })
        .collect()
}

fn describe(line: &str) -> &'static str {
    if line.contains("linkedin") {
        "LinkedIn automation startup"
    } else if line.contains("heartbeat") {
        "Health check heartbeat"
    } else {
        "Scheduled task"
    }
}
