use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MIN_TICK_MS: u64 = 50;

/// What a bare `punch` invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommandMode {
    #[default]
    Tui,
    Cli,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub command_mode: CommandMode,
    pub tick_ms: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from("punch.db"),
            command_mode: CommandMode::Tui,
            tick_ms: 1000,
            log_file: None,
        }
    }
}

impl Config {
    /// Relative database paths live in the data directory.
    pub fn resolve_db_path(&self, data_dir: &Path) -> PathBuf {
        if self.db_path.is_absolute() {
            self.db_path.clone()
        } else {
            data_dir.join(&self.db_path)
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(MIN_TICK_MS))
    }
}

#[derive(Debug, Clone)]
pub struct Dirs {
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
}

pub fn default_dirs() -> Result<Dirs> {
    let dirs = ProjectDirs::from("", "", "punch").context("locating config directory")?;
    Ok(Dirs {
        config_file: dirs.config_dir().join("config.yml"),
        data_dir: dirs.data_dir().to_path_buf(),
    })
}

/// Reads the config file, writing one with defaults on first run.
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        let config: Config = serde_yaml::from_str(&data).context("parsing config file")?;
        Ok(config)
    } else {
        let config = Config::default();
        save_config(path, &config)?;
        Ok(config)
    }
}

pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(())
}
