//! Configuration vault: reads and writes `~/.prowl/config.toml`.

use prowl_runtime::config::SimConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How the end-of-run report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Persisted run configuration stored in `~/.prowl/config.toml`.
///
/// The `[simulation]` table is last so that the plain keys serialise first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Pause between ticks.  200 ms is five frames per second.
    #[serde(default = "default_tick_delay_ms")]
    pub tick_delay_ms: u64,

    /// Hard stop for runs that never end on their own.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    #[serde(default)]
    pub report_format: ReportFormat,

    /// Print every agent's memory and vision maps in the final report.
    #[serde(default)]
    pub show_maps: bool,

    #[serde(default)]
    pub simulation: SimConfig,
}

fn default_tick_delay_ms() -> u64 {
    200
}
fn default_max_ticks() -> u64 {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_delay_ms: default_tick_delay_ms(),
            max_ticks: default_max_ticks(),
            report_format: ReportFormat::default(),
            show_maps: false,
            simulation: SimConfig::default(),
        }
    }
}

/// Return the path to `~/.prowl/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".prowl").join("config.toml")
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.  Environment overrides are applied to what was read.
pub fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `PROWL_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `PROWL_SEED` | `simulation.seed` |
/// | `PROWL_WALL_DENSITY` | `simulation.wall_density` |
/// | `PROWL_MAX_TICKS` | `max_ticks` |
/// | `PROWL_TICK_DELAY_MS` | `tick_delay_ms` |
/// | `PROWL_REPORT_FORMAT` | `report_format` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("PROWL_SEED")
        && let Ok(seed) = v.trim().parse::<u64>()
    {
        cfg.simulation.seed = Some(seed);
    }
    if let Some(v) = lookup("PROWL_WALL_DENSITY")
        && let Ok(pct) = v.trim().parse::<u8>()
        && pct <= 100
    {
        cfg.simulation.wall_density = pct;
    }
    if let Some(v) = lookup("PROWL_MAX_TICKS")
        && let Ok(n) = v.trim().parse::<u64>()
    {
        cfg.max_ticks = n;
    }
    if let Some(v) = lookup("PROWL_TICK_DELAY_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.tick_delay_ms = ms;
    }
    if let Some(v) = lookup("PROWL_REPORT_FORMAT")
        && let Some(format) = ReportFormat::parse(&v)
    {
        cfg.report_format = format;
    }
}

/// First lines of every saved config file.
const HEADER: &str = "\
# prowl run configuration.
# Remove a key to fall back to its default; PROWL_* env-vars override any of them.
";

/// Save the config to a specific path, creating its directory if necessary.
///
/// The directory is made owner-only (`0o700`) and the file owner read/write
/// (`0o600`) on Unix.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    let body =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        prepare_config_dir(dir)?;
    }
    write_owner_only(path, &format!("{HEADER}\n{body}"))
        .map_err(|e| io_failure("write config", path, &e))
}

fn prepare_config_dir(dir: &Path) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| io_failure("create config directory", dir, &e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| io_failure("restrict config directory", dir, &e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn write_owner_only(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_owner_only(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)
}

/// Render an I/O failure, calling out permission problems explicitly since
/// `~/.prowl` is created owner-only.
fn io_failure(action: &str, path: &Path, err: &std::io::Error) -> String {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        format!(
            "Failed to {action} at {}: permission denied (prowl keeps its settings owner-only; check who owns this path)",
            path.display()
        )
    } else {
        format!("Failed to {action} at {}: {err}", path.display())
    }
}
