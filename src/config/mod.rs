//! Configuration Management
//!
//! This module resolves the database connection used by the menu.
//!
//! # Sources
//! - CLI flags (`--host`, `--user`, ...)
//! - Process environment: `DB_ENGINE`, `DB_HOST`, `DB_PORT`, `DB_USER`,
//!   `DB_PASSWORD`, `DB_NAME`, `DB_FILE` (a local `.env` file is loaded first)
//! - Stored connection: `~/.config/orgchart/connection.json` (per-user)
//!
//! # Resolution Precedence
//! 1. CLI flags (highest priority)
//! 2. Environment variables
//! 3. Stored connection file
//! 4. Engine defaults (`localhost`, default port, empty password)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{ConnectionConfig, DatabaseType};
use crate::error::{OrgError, Result};

pub const ENV_ENGINE: &str = "DB_ENGINE";
pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_NAME: &str = "DB_NAME";
pub const ENV_FILE: &str = "DB_FILE";

/// Stored connection configuration
///
/// Similar to `ConnectionConfig` but supports an environment variable
/// reference for the password so the file can be kept free of secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConnection {
    /// Connection configuration
    #[serde(flatten)]
    pub config: ConnectionConfig,

    /// Environment variable name for password (if not storing password directly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl StoredConnection {
    /// Resolve the password reference and return a `ConnectionConfig`
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> Result<ConnectionConfig> {
        let mut config = self.config.clone();

        if let Some(env_var) = &self.password_env {
            match env(env_var) {
                Some(password) => config.password = Some(password),
                None => {
                    return Err(OrgError::config_error(format!(
                        "Environment variable {env_var} not found for password"
                    )));
                }
            }
        }

        Ok(config)
    }
}

/// Connection values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub engine: Option<DatabaseType>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub file: Option<PathBuf>,
}

/// Load `.env` from the current directory
///
/// Variables already present in the environment win over the file.
/// Returns the path that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded .env");
            Some(path)
        }
        Err(e) if e.not_found() => {
            tracing::debug!("no .env file found, using process environment only");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable .env file");
            None
        }
    }
}

/// Get path to the stored connection file (`~/.config/orgchart/connection.json`)
pub fn stored_connection_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| OrgError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("orgchart").join("connection.json"))
}

/// Load a stored connection, returning `None` if the file does not exist
pub fn load_stored_connection(path: &Path) -> Result<Option<StoredConnection>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| OrgError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str::<StoredConnection>(&contents)
        .map(Some)
        .map_err(|e| OrgError::config_error(format!("Invalid config file format: {e}")))
}

/// Resolve the connection from flags, environment and stored file
///
/// `env` looks up a variable by name; pass `|k| std::env::var(k).ok()` in
/// production.
pub fn resolve_connection(
    overrides: &ConnectionOverrides,
    env: impl Fn(&str) -> Option<String>,
    stored: Option<&StoredConnection>,
) -> Result<ConnectionConfig> {
    let engine = match (overrides.engine, env(ENV_ENGINE)) {
        (Some(engine), _) => engine,
        (None, Some(value)) => value.parse()?,
        (None, None) => stored.map_or(DatabaseType::MySQL, |s| s.config.engine),
    };

    // Stored values only apply when they describe the same engine
    let stored = stored.filter(|s| s.config.engine == engine);

    let pick = |flag: &Option<String>, key: &str, from_file: Option<&String>| {
        flag.clone().or_else(|| env(key)).or_else(|| from_file.cloned())
    };

    match engine {
        DatabaseType::SQLite => {
            let file = overrides
                .file
                .clone()
                .or_else(|| env(ENV_FILE).map(PathBuf::from))
                .or_else(|| stored.and_then(|s| s.config.file.clone()))
                .ok_or_else(|| {
                    OrgError::config_error(format!(
                        "Missing SQLite database file. Set {ENV_FILE} or pass --file"
                    ))
                })?;

            Ok(ConnectionConfig::sqlite(file))
        }
        DatabaseType::MySQL | DatabaseType::Postgres => {
            let host = pick(&overrides.host, ENV_HOST, stored.and_then(|s| s.config.host.as_ref()))
                .unwrap_or_else(|| "localhost".to_string());

            let port = match overrides.port {
                Some(port) => Some(port),
                None => match env(ENV_PORT) {
                    Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                        OrgError::config_error(format!("{ENV_PORT} must be a port number, got '{raw}'"))
                    })?),
                    None => stored.and_then(|s| s.config.port),
                },
            }
            .or_else(|| engine.default_port())
            .ok_or_else(|| OrgError::config_error(format!("Missing port. Set {ENV_PORT}")))?;

            let user = pick(&overrides.user, ENV_USER, stored.and_then(|s| s.config.user.as_ref()))
                .ok_or_else(|| {
                    OrgError::config_error(format!(
                        "Missing database user. Set {ENV_USER} or pass --user"
                    ))
                })?;

            // The stored password reference is only consulted as a last resort
            let password = match overrides.password.clone().or_else(|| env(ENV_PASSWORD)) {
                Some(password) => password,
                None => match stored {
                    Some(s) => s.resolve(&env)?.password.unwrap_or_default(),
                    None => String::new(),
                },
            };

            let database = pick(
                &overrides.database,
                ENV_NAME,
                stored.and_then(|s| s.config.database.as_ref()),
            )
            .ok_or_else(|| {
                OrgError::config_error(format!(
                    "Missing database name. Set {ENV_NAME} or pass --database"
                ))
            })?;

            Ok(if engine == DatabaseType::MySQL {
                ConnectionConfig::mysql(host, port, user, password, database)
            } else {
                ConnectionConfig::postgres(host, port, user, password, database)
            })
        }
    }
}
