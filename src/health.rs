//! System health sampling.
//!
//! Every call re-reads `/proc/meminfo`, one thermal zone, `df -h` and
//! `uptime -p`. Nothing is cached. Any single failure fails the whole sample.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::process::Command;

use crate::models::*;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Exit { command: String, status: String },

    #[error("could not parse {what}: {detail}")]
    Parse { what: &'static str, detail: String },
}

fn parse_error(what: &'static str, detail: impl Into<String>) -> HealthError {
    HealthError::Parse {
        what,
        detail: detail.into(),
    }
}

#[derive(Debug, Clone)]
pub struct HealthSampler {
    meminfo: PathBuf,
    thermal_zone: PathBuf,
    mount_point: PathBuf,
}

impl Default for HealthSampler {
    fn default() -> Self {
        Self {
            meminfo: PathBuf::from("/proc/meminfo"),
            thermal_zone: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            mount_point: PathBuf::from("/"),
        }
    }
}

impl HealthSampler {
    /// Sampler reading from explicit locations instead of the live system files.
    pub fn with_paths(
        meminfo: impl Into<PathBuf>,
        thermal_zone: impl Into<PathBuf>,
        mount_point: impl Into<PathBuf>,
    ) -> Self {
        Self {
            meminfo: meminfo.into(),
            thermal_zone: thermal_zone.into(),
            mount_point: mount_point.into(),
        }
    }

    pub async fn sample(&self) -> Result<HealthSnapshot, HealthError> {
        let meminfo = read_text(&self.meminfo).await?;
        let (total_bytes, available_bytes) = parse_meminfo(&meminfo)?;
        let used_bytes = total_bytes.saturating_sub(available_bytes);
        let ram_percent = ((used_bytes as f64 / total_bytes as f64) * 100.0).round() as u32;

        let temp_c = parse_thermal(&read_text(&self.thermal_zone).await?)?;

        let mount = self.mount_point.to_string_lossy().into_owned();
        let df = run("df", &["-h", mount.as_str()]).await?;
        let (disk_total, disk_used, disk_percent) = parse_df(&df)?;

        let uptime = parse_uptime(&run("uptime", &["-p"]).await?);

        Ok(HealthSnapshot {
            ram: RamUsage {
                used: format_bytes(used_bytes),
                total: format_bytes(total_bytes),
                used_bytes,
                total_bytes,
                percent: ram_percent,
                status: Severity::for_ram_percent(ram_percent),
            },
            cpu: CpuReading {
                temp: format!("{:.1}", temp_c),
                temp_c,
                status: Severity::for_cpu_temp(temp_c),
            },
            disk: DiskUsage {
                used: disk_used,
                total: disk_total,
                percent: disk_percent,
                status: Severity::for_disk_percent(disk_percent),
            },
            uptime,
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    /// Sample, collapsing any failure into the `{error}` shape.
    pub async fn report(&self) -> HealthReport {
        match self.sample().await {
            Ok(snapshot) => HealthReport::Snapshot(snapshot),
            Err(e) => {
                tracing::warn!("Health sample failed: {}", e);
                HealthReport::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

async fn read_text(path: &Path) -> Result<String, HealthError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| HealthError::Read {
            path: path.to_path_buf(),
            source,
        })
}

async fn run(program: &str, args: &[&str]) -> Result<String, HealthError> {
    let command = format!("{} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|source| HealthError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(HealthError::Exit {
            command,
            status: output.status.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Returns `(total, available)` in bytes.
pub fn parse_meminfo(text: &str) -> Result<(u64, u64), HealthError> {
    let field = |name: &'static str| -> Result<u64, HealthError> {
        text.lines()
            .find_map(|line| line.strip_prefix(name)?.strip_prefix(':'))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|kb| kb.parse::<u64>().ok())
            .map(|kb| kb * 1024)
            .ok_or_else(|| parse_error("meminfo", format!("missing {}", name)))
    };

    let total = field("MemTotal")?;
    if total == 0 {
        return Err(parse_error("meminfo", "MemTotal is zero"));
    }
    Ok((total, field("MemAvailable")?))
}

/// Thermal zones report millidegrees Celsius.
pub fn parse_thermal(text: &str) -> Result<f64, HealthError> {
    text.trim()
        .parse::<i64>()
        .map(|milli| milli as f64 / 1000.0)
        .map_err(|e| parse_error("thermal zone", e.to_string()))
}

/// Parses the last line of `df -h` output into `(size, used, use%)`.
pub fn parse_df(output: &str) -> Result<(String, String, u32), HealthError> {
    let line = output
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| parse_error("df output", "empty"))?;
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() < 5 {
        return Err(parse_error("df output", line));
    }

    let percent = columns[4]
        .trim_end_matches('%')
        .parse::<u32>()
        .map_err(|e| parse_error("df use%", e.to_string()))?;
    Ok((columns[1].to_string(), columns[2].to_string(), percent))
}

/// `up 3 days, 4 hours` -> `3 days, 4 hours`
pub fn parse_uptime(output: &str) -> String {
    let trimmed = output.trim();
    trimmed.strip_prefix("up ").unwrap_or(trimmed).to_string()
}

/// Human readable byte count with at most one decimal, e.g. `1.5 KB`.
/// Whole values drop the decimal (`1 KB`, not `1.0 KB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 10.0).round() / 10.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:        8000000 kB\n\
                           MemFree:          500000 kB\n\
                           MemAvailable:    2000000 kB\n\
                           Buffers:          100000 kB\n";

    #[test]
    fn severity_thresholds_are_step_functions() {
        assert_eq!(Severity::for_ram_percent(86), Severity::Danger);
        assert_eq!(Severity::for_ram_percent(85), Severity::Warning);
        assert_eq!(Severity::for_ram_percent(75), Severity::Warning);
        assert_eq!(Severity::for_ram_percent(70), Severity::Good);
        assert_eq!(Severity::for_ram_percent(50), Severity::Good);

        assert_eq!(Severity::for_disk_percent(91), Severity::Danger);
        assert_eq!(Severity::for_disk_percent(80), Severity::Warning);
        assert_eq!(Severity::for_disk_percent(75), Severity::Good);

        assert_eq!(Severity::for_cpu_temp(72.0), Severity::Danger);
        assert_eq!(Severity::for_cpu_temp(60.0), Severity::Warning);
        assert_eq!(Severity::for_cpu_temp(40.0), Severity::Good);
    }

    #[test]
    fn meminfo_reports_bytes() {
        let (total, available) = parse_meminfo(MEMINFO).unwrap();
        assert_eq!(total, 8_000_000 * 1024);
        assert_eq!(available, 2_000_000 * 1024);
    }

    #[test]
    fn meminfo_without_available_is_an_error() {
        let err = parse_meminfo("MemTotal: 100 kB\n").unwrap_err();
        assert!(err.to_string().contains("MemAvailable"));
    }

    #[test]
    fn thermal_zone_is_millidegrees() {
        assert_eq!(parse_thermal("48312\n").unwrap(), 48.312);
        assert!(parse_thermal("hot").is_err());
    }

    #[test]
    fn df_takes_the_last_line() {
        let output = "Filesystem      Size  Used Avail Use% Mounted on\n\
                      /dev/mmcblk0p2  117G   41G   71G  37% /\n";
        let (total, used, percent) = parse_df(output).unwrap();
        assert_eq!(total, "117G");
        assert_eq!(used, "41G");
        assert_eq!(percent, 37);
    }

    #[test]
    fn uptime_prefix_is_stripped() {
        assert_eq!(parse_uptime("up 2 days, 3 hours\n"), "2 days, 3 hours");
        assert_eq!(parse_uptime("5 minutes"), "5 minutes");
    }

    #[test]
    fn bytes_are_formatted_like_the_dashboard_expects() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3 GB");
        assert_eq!(format_bytes(5000 * 1024 * 1024 * 1024), "5000 GB");
    }

    #[tokio::test]
    async fn missing_meminfo_fails_the_whole_sample() {
        let dir = tempfile::tempdir().unwrap();
        let sampler = HealthSampler::with_paths(
            dir.path().join("nope"),
            dir.path().join("temp"),
            dir.path(),
        );

        match sampler.report().await {
            HealthReport::Failed { error } => assert!(error.contains("nope")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
