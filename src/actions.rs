//! Named one-shot operations triggered from the dashboard's quick actions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::models::EventKind;

/// Body returned by `POST /api/actions/{action}`. Failures are reported in
/// the body with `success: false`, never as an HTTP error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionOutcome {
    fn with_result<T: Serialize>(result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self {
                success: true,
                result: Some(value),
                message: None,
                error: None,
            },
            Err(e) => Self::failed(e.to_string()),
        }
    }

    fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            result: None,
            message: Some(message.into()),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Runs `action` by name. Known actions also announce themselves to live
/// dashboards with a `system` event.
pub async fn run(action: &str, state: &AppState) -> ActionOutcome {
    let outcome = match action {
        "health-check" => ActionOutcome::with_result(&state.health.report().await),
        "clear-logs" => clear_logs(state).await,
        "refresh-memory" => {
            let files = state.memory.list_or_empty().await;
            state.hub.broadcast(EventKind::Memory, &files);
            ActionOutcome::with_result(&files)
        }
        "check-knowcore" => ActionOutcome::with_result(&state.knowcore.status().await),
        _ => {
            tracing::warn!("Unknown action requested: {}", action);
            return ActionOutcome::failed("Unknown action");
        }
    };

    tracing::info!(action, success = outcome.success, "Action executed");
    state.hub.broadcast(
        EventKind::System,
        &json!({ "action": action, "success": outcome.success }),
    );
    outcome
}

async fn clear_logs(state: &AppState) -> ActionOutcome {
    let path = &state.settings.log_file;
    match tokio::fs::write(path, "").await {
        Ok(()) => ActionOutcome::with_message("Logs cleared"),
        Err(e) => {
            tracing::warn!("Failed to clear {}: {}", path.display(), e);
            ActionOutcome::failed(format!("{}: {}", path.display(), e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn state_in(dir: &std::path::Path) -> AppState {
        AppState::new(Settings::for_root(dir, "test-key"))
    }

    #[tokio::test]
    async fn unknown_action_is_rejected_without_broadcasting() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let mut sub = state.hub.subscribe();

        let outcome = run("launch-rockets", &state).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Unknown action"));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn clear_logs_truncates_the_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        std::fs::write(&state.settings.log_file, "lots\nof\nlines\n").unwrap();

        let outcome = run("clear-logs", &state).await;

        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("Logs cleared"));
        assert_eq!(std::fs::read_to_string(&state.settings.log_file).unwrap(), "");
    }

    #[tokio::test]
    async fn clear_logs_reports_failure_in_the_body() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::for_root(dir.path(), "test-key");
        settings.log_file = dir.path().join("missing").join("bot.log");
        let state = AppState::new(settings);

        let outcome = run("clear-logs", &state).await;

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn refresh_memory_pushes_memory_then_system_events() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("memory")).unwrap();
        std::fs::write(dir.path().join("memory").join("today.md"), "# Today\nwalked").unwrap();
        let state = state_in(dir.path());
        let mut sub = state.hub.subscribe();

        let outcome = run("refresh-memory", &state).await;
        assert!(outcome.success);
        assert_eq!(outcome.result.unwrap()[0]["name"], "today.md");

        let first: Value = serde_json::from_str(&sub.try_recv().unwrap()).unwrap();
        let second: Value = serde_json::from_str(&sub.try_recv().unwrap()).unwrap();
        assert_eq!(first["type"], "memory");
        assert_eq!(second["type"], "system");
        assert_eq!(second["data"]["action"], "refresh-memory");
    }
}
