//! The kanban task list, persisted as one pretty-printed JSON array.
//!
//! Every mutation is a read-modify-write of the whole file. Writers inside
//! this process are serialized by `write_lock`; anything else editing the
//! file concurrently can still lose updates (last write wins).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Map;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::*;

#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the collection. A missing file is an empty board.
    pub async fn load(&self) -> Result<Vec<Task>, StoreError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        serde_json::from_str(&data).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Reads the collection, treating an unreadable or malformed file as empty.
    pub async fn list(&self) -> Vec<Task> {
        self.load().await.unwrap_or_else(|e| {
            tracing::warn!("Task list unreadable, treating as empty: {}", e);
            Vec::new()
        })
    }

    /// Appends a new `todo` task and returns the updated collection.
    ///
    /// An unreadable file is an error here, never an empty board to write over.
    pub async fn add(&self, input: CreateTaskInput) -> Result<Vec<Task>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.load().await?;

        let now = now();
        tasks.push(Task {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            priority: input.priority,
            status: TaskStatus::Todo,
            created_at: Some(now),
            updated_at: Some(now),
            extra: Map::new(),
        });

        self.save(&tasks).await?;
        Ok(tasks)
    }

    /// Moves a task to `status` and returns the collection.
    ///
    /// An unknown id is not an error: nothing is written and the collection
    /// comes back unchanged.
    pub async fn set_status(
        &self,
        id: &str,
        status: TaskStatus,
    ) -> Result<Vec<Task>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.load().await?;

        match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.status = status;
                task.updated_at = Some(now());
                self.save(&tasks).await?;
            }
            None => tracing::debug!("Status change for unknown task {}", id),
        }
        Ok(tasks)
    }

    async fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(tasks).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

/// Current time at the precision the file stores.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
