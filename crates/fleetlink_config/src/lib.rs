//! Configuration for the Fleetlink command server.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. `{CONFIG_DIR}/default.*`
//! 2. `{CONFIG_DIR}/{RUN_ENV}.*` (`RUN_ENV` defaults to `debug`)
//! 3. environment variables prefixed with `FLEETLINK` and separated by `__`,
//!    e.g. `FLEETLINK__SERVER__PORT=9000`
//!
//! A `.env` file is loaded into the process environment once before the
//! sources are read.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod models;
pub use models::*;

/// Prefix for configuration environment variables
pub const ENV_PREFIX: &str = "FLEETLINK";

/// Separator for nested configuration keys in environment variables
pub const ENV_SEPARATOR: &str = "__";

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// `DOTENV_OVERRIDE` selects a different file than `.env`. Loading happens at
/// most once per process; a missing file is not an error.
///
/// Returns the path that was (or would have been) loaded.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

/// Loads the application configuration using `CONFIG_DIR` and `RUN_ENV`.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());

    load_config_from(Path::new(&config_dir), &run_env)
}

/// Loads the application configuration from an explicit directory and run environment.
///
/// Both files are optional; when neither exists and no environment variables
/// are set, the serde defaults apply except for `server`, which falls back to
/// [`ServerConfig::default`].
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, ConfigError> {
    let default_path: PathBuf = config_dir.join("default");
    let env_path: PathBuf = config_dir.join(run_env);

    debug!("Loading config from {}", default_path.display());
    debug!("Loading config from {}", env_path.display());

    let defaults = ServerConfig::default();
    let builder = Config::builder()
        .set_default("server.host", defaults.host)?
        .set_default("server.port", i64::from(defaults.port))?
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

    builder.build()?.try_deserialize()
}
