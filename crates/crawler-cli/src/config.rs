//! Tuning file – reads/writes `~/.crawler/config.toml`.
//!
//! The file holds a serialized [`CrawlerConfig`]; any field left out takes
//! its default. A handful of fields can be overridden from the environment
//! for quick experiments without editing the file.

use std::fs;
use std::path::{Path, PathBuf};

use crawler_types::CrawlerConfig;

/// Return the path to `~/.crawler/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".crawler").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<CrawlerConfig>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<CrawlerConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: CrawlerConfig =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    cfg.validate().map_err(|e| e.to_string())?;
    Ok(Some(cfg))
}

/// Apply `CRAWLER_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `CRAWLER_TIMEOUT_SECS` | `timeout_secs` |
/// | `CRAWLER_MIN_POWER` | `min_power` |
/// | `CRAWLER_LOOKAHEAD_M` | `follower.lookahead_m` |
/// | `CRAWLER_LOOP_PERIOD_MS` | `loop_period_ms` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut CrawlerConfig) {
    apply_overrides_from(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides_from(cfg: &mut CrawlerConfig, lookup: impl Fn(&str) -> Option<String>) {
    let float = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

    if let Some(v) = float("CRAWLER_TIMEOUT_SECS") {
        cfg.timeout_secs = v;
    }
    if let Some(v) = float("CRAWLER_MIN_POWER") {
        cfg.min_power = v;
    }
    if let Some(v) = float("CRAWLER_LOOKAHEAD_M") {
        cfg.follower.lookahead_m = v;
    }
    if let Some(v) = lookup("CRAWLER_LOOP_PERIOD_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.loop_period_ms = ms;
    }
}

/// Save the config to disk, creating `~/.crawler/` if necessary.
pub fn save(cfg: &CrawlerConfig) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &CrawlerConfig, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
