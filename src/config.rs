/// Configuration resolution
///
/// Settings come from four layers, highest precedence first: command-line
/// flags, the `CHERRY_BACKEND_URL` environment variable, an optional TOML
/// file, and built-in defaults.
use crate::api::DEFAULT_BASE_URL;
use crate::cli::CliArgs;
use crate::connectivity::DEFAULT_PROBE_INTERVAL;
use crate::console::{DEFAULT_CAPACITY, DEFAULT_EVICT_BATCH};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BACKEND_URL_ENV: &str = "CHERRY_BACKEND_URL";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub backend_url: Option<String>,
    pub probe_interval_secs: Option<u64>,
    pub console_capacity: Option<usize>,
    pub console_evict_batch: Option<usize>,
    pub export_dir: Option<PathBuf>,
    pub colors: Option<bool>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend_url: String,
    pub probe_interval: Duration,
    pub console_capacity: usize,
    pub console_evict_batch: usize,
    pub export_dir: PathBuf,
    pub use_colors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BASE_URL.to_string(),
            probe_interval: DEFAULT_PROBE_INTERVAL,
            console_capacity: DEFAULT_CAPACITY,
            console_evict_batch: DEFAULT_EVICT_BATCH,
            export_dir: PathBuf::from("."),
            use_colors: true,
        }
    }
}

/// Default config file location: ~/.config/vlan-cherry/config.toml on Linux
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vlan-cherry").join("config.toml"))
}

/// Resolve the configuration for this invocation
pub fn resolve_config(args: &CliArgs) -> Result<Config, String> {
    let file = match &args.config {
        // An explicitly named file must exist
        Some(path) => Some(load_config_file(path)?),
        None => match default_config_path() {
            Some(path) if path.exists() => Some(load_config_file(&path)?),
            _ => None,
        },
    };

    let env_url = std::env::var(BACKEND_URL_ENV).ok().filter(|s| !s.trim().is_empty());
    merge_config(args, file.unwrap_or_default(), env_url)
}

/// Read and parse a TOML config file
pub fn load_config_file(path: &Path) -> Result<FileConfig, String> {
    debug!("Loading config from {}", path.display());
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_config(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn parse_config(text: &str) -> Result<FileConfig, String> {
    toml::from_str(text).map_err(|e| format!("invalid config: {}", e))
}

/// Apply the layers over the defaults and validate the result
pub fn merge_config(args: &CliArgs, file: FileConfig, env_url: Option<String>) -> Result<Config, String> {
    let defaults = Config::default();

    let backend_url = args.backend_url.clone().or(env_url).or(file.backend_url).unwrap_or(defaults.backend_url);
    let backend_url = validate_backend_url(&backend_url)?;
    debug!("Backend URL: {}", backend_url);

    let probe_interval = match file.probe_interval_secs {
        Some(0) => return Err("probe_interval_secs must be at least 1".to_string()),
        Some(secs) => Duration::from_secs(secs),
        None => defaults.probe_interval,
    };

    let console_capacity = file.console_capacity.unwrap_or(defaults.console_capacity);
    let console_evict_batch = file.console_evict_batch.unwrap_or(defaults.console_evict_batch);
    if console_capacity == 0 {
        return Err("console_capacity must be greater than zero".to_string());
    }
    if console_evict_batch == 0 || console_evict_batch > console_capacity {
        return Err(format!(
            "console_evict_batch must be between 1 and console_capacity ({}), got {}",
            console_capacity, console_evict_batch
        ));
    }

    let export_dir = args.export_dir.clone().or(file.export_dir).unwrap_or(defaults.export_dir);
    let use_colors = !args.no_color && file.colors.unwrap_or(defaults.use_colors);

    Ok(Config { backend_url, probe_interval, console_capacity, console_evict_batch, export_dir, use_colors })
}

/// Accept http(s) URLs and strip trailing slashes
pub fn validate_backend_url(url: &str) -> Result<String, String> {
    let url = url.trim();
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| format!("Backend URL must start with http:// or https://, got '{}'", url))?;

    if rest.trim_matches('/').is_empty() {
        return Err(format!("Backend URL '{}' has no host", url));
    }

    Ok(url.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
