use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SHUSH_CONFIG";

/// Config file picked up from the current directory.
pub const LOCAL_CONFIG_FILE: &str = "shush.toml";

/// Get the default shush data directory: ~/.shush
pub fn get_shush_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".shush"))
}

/// Resolve and load the effective config.
///
/// Priority: `explicit` (the `--config` flag), `$SHUSH_CONFIG`, `~/.shush/config.toml`,
/// `./shush.toml`, built-in defaults. An explicit path that does not exist is an error;
/// the implicit locations are simply skipped.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let from_env = std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    let mut cfg = match explicit.map(Path::to_path_buf).or(from_env) {
        Some(path) => load_from_path(&path)?,
        None => {
            let home_config = get_shush_data_dir().map(|d| d.join("config.toml"));
            let local_config = Path::new(LOCAL_CONFIG_FILE);

            match home_config.filter(|p| p.exists()) {
                Some(p) => load_from_path(&p)?,
                None if local_config.exists() => load_from_path(local_config)?,
                None => AppConfig::default(),
            }
        }
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    validate(&cfg)?;
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    Ok(cfg)
}

// Environment variable overrides (highest priority).
fn apply_env_overrides<F>(cfg: &mut AppConfig, get: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = get("SHUSH_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v.trim().to_string();
        }
    }
    if let Some(v) = get("SHUSH_LOG_DIR") {
        if !v.trim().is_empty() {
            cfg.logging.directory = Some(shellexpand::tilde(v.trim()).into_owned());
            cfg.logging.file = true;
        }
    }
}

fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.runner.chunk_size == 0 {
        anyhow::bail!("runner.chunk_size must be greater than 0");
    }
    if cfg.runner.log_channel_capacity == 0 {
        anyhow::bail!("runner.log_channel_capacity must be greater than 0");
    }
    Ok(())
}
