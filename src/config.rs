use std::path::{Path, PathBuf};

use clap::Args;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "snapbuy.yaml";

/// Prefix of configuration environment variables, e.g. `SNAPBUY_API__BASE_URL`.
pub const ENV_PREFIX: &str = "SNAPBUY";

/// Configuration flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// API root, e.g. http://localhost:8080/api
    #[arg(long, env = "SNAPBUY_API_BASE_URL", global = true)]
    pub api_base_url: Option<String>,

    /// Where tokens, cart and history are kept
    #[arg(long, env = "SNAPBUY_STORAGE_PATH", global = true)]
    pub storage_path: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Entry point the user is sent to when the session cannot be recovered.
    pub login_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub history_cap: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub page_size: u32,
}

fn default_storage_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(".snapbuy")
        .join("storage.json")
}

impl AppConfig {
    /// Layer defaults, config file, `SNAPBUY_` environment and flags.
    ///
    /// Priority: flag > environment > config file > defaults.
    pub fn load(args: &ConfigArgs) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.base_url", "http://localhost:8080/api")?
            .set_default("api.timeout_secs", 30)?
            .set_default("api.login_path", "/login")?
            .set_default(
                "storage.path",
                default_storage_path().to_string_lossy().into_owned(),
            )?
            .set_default("search.history_cap", 10)?
            .set_default("catalog.page_size", 12)?;

        // Explicit file must exist; the working-directory fallback is optional.
        if let Some(path) = &args.config {
            builder = builder.add_source(File::with_name(path).required(true));
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) = &args.api_base_url {
            builder = builder.set_override("api.base_url", url.as_str())?;
        }
        if let Some(path) = &args.storage_path {
            builder = builder.set_override("storage.path", path.to_string_lossy().into_owned())?;
        }
        if let Some(timeout) = args.timeout_secs {
            builder = builder.set_override("api.timeout_secs", timeout)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Message("api.base_url cannot be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "api.timeout_secs must be at least 1".into(),
            ));
        }
        if self.search.history_cap == 0 {
            return Err(ConfigError::Message(
                "search.history_cap must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
