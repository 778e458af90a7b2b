//! Push side of the dashboard: a health ticker and filesystem watchers that
//! re-read a view and hand it to the [`BroadcastHub`].
//!
//! Each source runs independently. Nothing orders these pushes against each
//! other or against HTTP-triggered writes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::health::HealthSampler;
use crate::hub::BroadcastHub;
use crate::memory::MemoryReader;
use crate::models::EventKind;
use crate::tasks::TaskStore;

/// Samples health every `period` and broadcasts it as a `health` event.
pub fn spawn_health_ticker(
    sampler: HealthSampler,
    hub: BroadcastHub,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; clients fetch on connect anyway.
        interval.tick().await;
        loop {
            interval.tick().await;
            if hub.subscriber_count() == 0 {
                continue;
            }
            hub.broadcast(EventKind::Health, &sampler.report().await);
        }
    })
}

/// Keeps the OS watches alive. Dropping it stops the change broadcasts.
pub struct ChangeWatchers {
    _watcher: RecommendedWatcher,
    handler: JoinHandle<()>,
}

impl Drop for ChangeWatchers {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Decides which view a changed path belongs to.
pub fn classify(path: &Path, task_file: &Path, memory_dir: &Path) -> Option<EventKind> {
    if path == task_file {
        Some(EventKind::Tasks)
    } else if path == memory_dir || path.parent() == Some(memory_dir) {
        Some(EventKind::Memory)
    } else {
        None
    }
}

/// Watches the task file and the memory directory.
///
/// The task file is watched through its parent directory so editors that
/// replace the file on save are still seen. Both directories are created if
/// they do not exist yet, so a board or note written later is still seen.
pub fn watch_changes(
    tasks: TaskStore,
    memory: MemoryReader,
    hub: BroadcastHub,
) -> notify::Result<ChangeWatchers> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let _ = tx.send(event);
        }
        Err(e) => warn!("Watch error: {:?}", e),
    })?;

    if let Some(kanban_dir) = tasks.path().parent() {
        ensure_dir(kanban_dir);
    }
    ensure_dir(memory.dir());

    // Watch events carry resolved paths.
    let memory_dir = resolve(memory.dir());
    let task_file = match (tasks.path().parent(), tasks.path().file_name()) {
        (Some(parent), Some(name)) => resolve(parent).join(name),
        _ => tasks.path().to_path_buf(),
    };

    if let Some(kanban_dir) = task_file.parent() {
        watch_if_present(&mut watcher, kanban_dir);
    }
    watch_if_present(&mut watcher, &memory_dir);

    let handler = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if event.kind.is_access() {
                continue;
            }

            let mut tasks_changed = false;
            let mut memory_changed = false;
            for path in &event.paths {
                match classify(path, &task_file, &memory_dir) {
                    Some(EventKind::Tasks) => tasks_changed = true,
                    Some(EventKind::Memory) => memory_changed = true,
                    _ => {}
                }
            }

            if tasks_changed {
                debug!("Task file changed on disk");
                hub.broadcast(EventKind::Tasks, &tasks.list().await);
            }
            if memory_changed {
                debug!("Memory directory changed");
                hub.broadcast(EventKind::Memory, &memory.list_or_empty().await);
            }
        }
    });

    Ok(ChangeWatchers {
        _watcher: watcher,
        handler,
    })
}

fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn ensure_dir(dir: &Path) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!("Failed to create {}: {}", dir.display(), e);
    }
}

fn watch_if_present(watcher: &mut RecommendedWatcher, dir: &Path) {
    if !dir.is_dir() {
        warn!("Not watching {}: directory does not exist", dir.display());
        return;
    }
    match watcher.watch(dir, RecursiveMode::NonRecursive) {
        Ok(()) => info!("Watching {}", dir.display()),
        Err(e) => warn!("Failed to watch {}: {}", dir.display(), e),
    }
}
