use serde::{Deserialize, Serialize};

/// Three-level classification of a health metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warning,
    Danger,
}

impl Severity {
    /// RAM usage: above 85% is danger, above 70% is warning.
    pub fn for_ram_percent(percent: u32) -> Self {
        Self::step(percent as f64, 70.0, 85.0)
    }

    /// Root filesystem usage: above 90% is danger, above 75% is warning.
    pub fn for_disk_percent(percent: u32) -> Self {
        Self::step(percent as f64, 75.0, 90.0)
    }

    /// CPU temperature in °C: above 70 is danger, above 55 is warning.
    pub fn for_cpu_temp(temp_c: f64) -> Self {
        Self::step(temp_c, 55.0, 70.0)
    }

    fn step(value: f64, warning: f64, danger: f64) -> Self {
        if value > danger {
            Self::Danger
        } else if value > warning {
            Self::Warning
        } else {
            Self::Good
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RamUsage {
    /// Human readable, e.g. `3.2 GB`.
    pub used: String,
    pub total: String,
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub percent: u32,
    pub status: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CpuReading {
    /// Temperature with one decimal, as the dashboard displays it.
    pub temp: String,
    pub temp_c: f64,
    pub status: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskUsage {
    /// Labels exactly as reported by `df -h`.
    pub used: String,
    pub total: String,
    pub percent: u32,
    pub status: Severity,
}

/// Point-in-time system health. Recomputed on every call, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthSnapshot {
    pub ram: RamUsage,
    pub cpu: CpuReading,
    pub disk: DiskUsage,
    pub uptime: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// What `/api/health` returns: a full snapshot, or a single error when any
/// underlying read failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HealthReport {
    Snapshot(HealthSnapshot),
    Failed { error: String },
}
