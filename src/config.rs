//! Server configuration.
//!
//! Every setting can be given as a flag or an environment variable and falls
//! back to a development default, so `timmyos` starts with no arguments on a
//! dev box.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;

/// Development secret. Override with `TIMMYOS_API_KEY` anywhere that matters.
pub const DEFAULT_API_KEY: &str = "timmy-dev-key-change-in-production";

/// Knowledge-base retrieval endpoint probed by `/api/knowcore`.
pub const DEFAULT_KNOWCORE_URL: &str = "https://www.knowcore.ai/api/v1/retrieve";

#[derive(Args, Clone)]
pub struct Settings {
    /// Port for the HTTP API and real-time channel
    #[arg(short, long, env = "PORT", default_value_t = 3333)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "TIMMYOS_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Shared secret required in `X-API-Key` and on the real-time handshake
    #[arg(long, env = "TIMMYOS_API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    pub api_key: String,

    /// Assistant home holding `memory/`, `kanban/tasks.json` and `skills/` (default: ~/clawd)
    #[arg(long, env = "TIMMYOS_CLAWD_DIR")]
    pub clawd_dir: Option<PathBuf>,

    /// Directory with the built dashboard (must contain index.html)
    #[arg(long, env = "TIMMYOS_DIST_DIR", default_value = "web")]
    pub dist_dir: PathBuf,

    /// Knowledge-base retrieval endpoint
    #[arg(long, env = "KNOWCORE_URL", default_value = DEFAULT_KNOWCORE_URL)]
    pub knowcore_url: String,

    /// Bearer token for the knowledge base
    #[arg(long, env = "KNOWCORE_API_KEY", hide_env_values = true)]
    pub knowcore_key: Option<String>,

    /// Seconds between pushed health snapshots
    #[arg(long, env = "TIMMYOS_HEALTH_INTERVAL", default_value_t = 5)]
    pub health_interval_secs: u64,

    /// Log file truncated by the `clear-logs` action
    #[arg(long, env = "TIMMYOS_LOG_FILE", default_value = "/tmp/clawdbot/clawdbot.log")]
    pub log_file: PathBuf,
}

impl Settings {
    /// Settings rooted at a scratch directory, with everything else at its
    /// default. Used by tests and local experiments.
    pub fn for_root(root: impl AsRef<Path>, api_key: impl Into<String>) -> Self {
        let root = root.as_ref();
        Self {
            port: 0,
            bind: "127.0.0.1".to_string(),
            api_key: api_key.into(),
            clawd_dir: Some(root.to_path_buf()),
            dist_dir: root.join("dist"),
            knowcore_url: DEFAULT_KNOWCORE_URL.to_string(),
            knowcore_key: None,
            health_interval_secs: 5,
            log_file: root.join("clawdbot.log"),
        }
    }

    pub fn clawd_dir(&self) -> PathBuf {
        match &self.clawd_dir {
            Some(dir) => dir.clone(),
            None => dirs::home_dir()
                .map(|home| home.join("clawd"))
                .unwrap_or_else(|| PathBuf::from("clawd")),
        }
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.clawd_dir().join("memory")
    }

    pub fn task_file(&self) -> PathBuf {
        self.clawd_dir().join("kanban").join("tasks.json")
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.clawd_dir().join("skills")
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs.max(1))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn mask(secret: &str) -> String {
    let shown: String = secret.chars().take(4).collect();
    format!("{}****", shown)
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("listen", &self.listen_addr())
            .field("api_key", &mask(&self.api_key))
            .field("clawd_dir", &self.clawd_dir())
            .field("dist_dir", &self.dist_dir)
            .field("knowcore_url", &self.knowcore_url)
            .field("knowcore_key", &self.knowcore_key.as_deref().map(mask))
            .field("health_interval_secs", &self.health_interval_secs)
            .field("log_file", &self.log_file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_hang_off_the_clawd_dir() {
        let settings = Settings::for_root("/srv/clawd", "k");
        assert_eq!(settings.memory_dir(), PathBuf::from("/srv/clawd/memory"));
        assert_eq!(
            settings.task_file(),
            PathBuf::from("/srv/clawd/kanban/tasks.json")
        );
        assert_eq!(settings.skills_dir(), PathBuf::from("/srv/clawd/skills"));
    }

    #[test]
    fn debug_output_masks_secrets() {
        let mut settings = Settings::for_root("/tmp", "super-secret-key");
        settings.knowcore_key = Some("kc_live_abcdef".to_string());
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("super-secret-key"));
        assert!(!rendered.contains("kc_live_abcdef"));
        assert!(rendered.contains("supe****"));
    }

    #[test]
    fn health_interval_is_never_zero() {
        let mut settings = Settings::for_root("/tmp", "k");
        settings.health_interval_secs = 0;
        assert_eq!(settings.health_interval(), Duration::from_secs(1));
    }
}
