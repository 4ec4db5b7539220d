//! Configuration loading, env overrides and validation.
//!
//! Config files: `teambot.toml`, `teambot.yaml`, `teambot.yml` or
//! `teambot.json`, searched in `./` then `~/.config/teambot/`.
//!
//! `${ENV_VAR}` placeholders are substituted in the raw file. The legacy
//! environment variables (`SLACK_TOKEN`, `TEAM_DB_FILE`, ...) override file
//! values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{LoadedConfig, apply_env_overrides, config_dir, load, load_config, load_with},
    schema::{DirectoryConfig, RuntimeConfig, SlackConfig, TeambotConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
