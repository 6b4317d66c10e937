use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use kanban_core::PersistMode;
use serde::Deserialize;

/// Directory name used under the home directory when none is configured.
pub const DEFAULT_DIR_NAME: &str = ".kanban";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application settings, read from an optional TOML file and `KANBAN_*`
/// environment variables (the environment wins).
#[derive(Debug, Deserialize, PartialEq)]
pub struct Settings {
    /// Where the database and log file live.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default)]
    pub persist_mode: PersistMode,
    /// `tracing` filter directive, e.g. `info` or `kanban_core=debug`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_bcrypt_cost() -> u32 {
    kanban_core::credentials::DEFAULT_COST
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Settings {
    /// Loads settings from `config_file` and the environment.
    ///
    /// A missing file is an error only when `required` is set.
    pub fn load(config_file: &Path, required: bool) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(File::from(config_file).required(required))
            .add_source(Environment::with_prefix("KANBAN").try_parsing(true));
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Picks the data directory: the command-line value, then the configured
    /// one, then `~/.kanban`.
    pub fn resolve_data_dir(&self, cli_override: Option<PathBuf>) -> PathBuf {
        cli_override
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(default_data_dir)
    }
}

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "KANBAN_DATA_DIR";

/// Picks the config file before any settings are loaded: `--config`, else
/// `config.toml` inside the `--data-dir`, `KANBAN_DATA_DIR` or default directory.
pub fn config_file_path(
    cli_config: Option<PathBuf>,
    cli_data_dir: Option<&Path>,
    env_data_dir: Option<PathBuf>,
) -> PathBuf {
    cli_config.unwrap_or_else(|| {
        cli_data_dir
            .map(Path::to_path_buf)
            .or(env_data_dir)
            .unwrap_or_else(default_data_dir)
            .join(CONFIG_FILE_NAME)
    })
}

/// `~/.kanban`, or [`fallback_data_dir`] when there is no home directory.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DIR_NAME))
        .unwrap_or_else(fallback_data_dir)
}

pub fn fallback_data_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DIR_NAME)
}

/// Whether `data_dir` ended up under the temp dir for lack of a home directory.
///
/// Checked after logging is up, since nothing is recorded before that.
pub fn is_fallback_data_dir(data_dir: &Path) -> bool {
    dirs::home_dir().is_none() && data_dir == fallback_data_dir()
}
