//! Application configuration.
//!
//! Loaded from `config.toml` in the platform data directory, then overridden
//! by `KADERISASI_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Placeholder secret, used only when there is no config file and no
/// `KADERISASI_TOKEN_SECRET`.
pub const DEVELOPMENT_TOKEN_SECRET: &str = "development-only-token-secret";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// HTTP listener settings
    pub server: ServerSettings,
    /// Database settings
    pub database: DatabaseSettings,
    /// Object storage settings
    pub storage: StorageSettings,
    /// Session and reset token settings
    pub auth: AuthSettings,
    /// Outbound mail settings
    pub mail: MailSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes (multipart uploads included)
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3333,
            cors_origins: Vec::new(),
            body_limit_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file path; relative paths resolve against the data directory
    pub path: Option<PathBuf>,
}

/// Object storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory for stored objects; defaults to `<data_dir>/objects`
    pub root_dir: Option<PathBuf>,
    /// Public base URL that object keys are appended to
    pub public_base_url: Option<String>,
}

/// Session and reset token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Required whenever a config file is present
    pub token_secret: Option<String>,
    /// Session token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Password reset token lifetime in seconds
    pub reset_token_ttl_secs: i64,
    /// Frontend page that receives `?token=`
    pub reset_password_url: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_secs: 60 * 60,
            reset_token_ttl_secs: 30 * 60,
            reset_password_url: "http://localhost:3000/reset-password".to_string(),
        }
    }
}

/// Outbound mail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub from_address: String,
    pub from_name: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from_address: "noreply@localhost".to_string(),
            from_name: "Kaderisasi Masjid Salman ITB".to_string(),
        }
    }
}

impl AuthSettings {
    /// Signing secret; the development placeholder when unset.
    pub fn secret(&self) -> &str {
        self.token_secret.as_deref().unwrap_or(DEVELOPMENT_TOKEN_SECRET)
    }
}

impl AppConfig {
    /// Resolved SQLite path.
    pub fn database_path(&self) -> PathBuf {
        match &self.database.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.data_dir.join(path),
            None => self.data_dir.join("kaderisasi.db"),
        }
    }

    /// Resolved object storage root.
    pub fn storage_root(&self) -> PathBuf {
        self.storage
            .root_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("objects"))
    }

    /// Apply `KADERISASI_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("KADERISASI_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| ConfigError::InvalidValue("KADERISASI_PORT".to_string(), format!("{e}")))?;
        }
        if let Some(path) = lookup("KADERISASI_DATABASE") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup("KADERISASI_STORAGE_DIR") {
            self.storage.root_dir = Some(PathBuf::from(dir));
        }
        if let Some(secret) = lookup("KADERISASI_TOKEN_SECRET") {
            self.auth.token_secret = Some(secret);
        }
        Ok(())
    }

    /// Reject configurations that cannot run safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_secret.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::InvalidValue(
                "auth.token_secret".to_string(),
                "must not be empty".to_string(),
            ));
        }
        if self.auth.token_ttl_secs <= 0 || self.auth.reset_token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth".to_string(),
                "token lifetimes must be positive".to_string(),
            ));
        }
        if self.auth.secret() == DEVELOPMENT_TOKEN_SECRET {
            warn!("Using the development token secret; set KADERISASI_TOKEN_SECRET in production");
        }
        Ok(())
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("id", "salman-itb", "Kaderisasi")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from file and environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = get_config_path();

    let content = if path.exists() {
        Some(std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError(e.to_string()))?)
    } else {
        info!("{} not found, using defaults", path.display());
        None
    };

    let mut config = resolve_config(content.as_deref(), |key| std::env::var(key).ok())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Build the effective configuration from optional file content and an
/// environment lookup. A config file without a token secret is rejected
/// unless the environment supplies one.
fn resolve_config(
    file: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let mut config = match file {
        Some(content) => parse_config(content)?,
        None => AppConfig::default(),
    };
    config.apply_overrides(lookup)?;

    if file.is_some() && config.auth.token_secret.is_none() {
        return Err(ConfigError::InvalidValue(
            "auth.token_secret".to_string(),
            "required when a config file is present".to_string(),
        ));
    }

    config.validate()?;
    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3333);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.reset_token_ttl_secs, 1800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = parse_config(
            r#"
            [server]
            port = 8080

            [auth]
            token_secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.secret(), "s3cret");
        assert_eq!(config.auth.token_ttl_secs, 3600);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            parse_config("[server\nport = 1"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("KADERISASI_PORT", "9000"),
            ("KADERISASI_DATABASE", "/tmp/k.db"),
            ("KADERISASI_TOKEN_SECRET", "from-env"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/k.db"));
        assert_eq!(config.auth.secret(), "from-env");
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "KADERISASI_PORT").then(|| "not-a-port".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue(_, _))));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut config = AppConfig::default();
        config.auth.token_secret = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_without_secret_rejected() {
        let result = resolve_config(Some("[server]\nport = 8080\n"), |_| None);

        match result {
            Err(ConfigError::InvalidValue(field, _)) => assert_eq!(field, "auth.token_secret"),
            other => panic!("expected missing secret error, got {other:?}"),
        }
    }

    #[test]
    fn test_config_file_secret_from_env() {
        let config = resolve_config(Some("[server]\nport = 8080\n"), |key| {
            (key == "KADERISASI_TOKEN_SECRET").then(|| "from-env".to_string())
        })
        .unwrap();

        assert_eq!(config.auth.secret(), "from-env");
    }

    #[test]
    fn test_no_config_file_uses_development_secret() {
        let config = resolve_config(None, |_| None).unwrap();

        assert_eq!(config.auth.token_secret, None);
        assert_eq!(config.auth.secret(), DEVELOPMENT_TOKEN_SECRET);
    }

    #[test]
    fn test_relative_paths_resolve_against_data_dir() {
        let mut config = AppConfig {
            data_dir: PathBuf::from("/var/lib/kaderisasi"),
            ..Default::default()
        };
        assert_eq!(
            config.database_path(),
            PathBuf::from("/var/lib/kaderisasi/kaderisasi.db")
        );
        config.database.path = Some(PathBuf::from("db/main.db"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/var/lib/kaderisasi/db/main.db")
        );
        assert_eq!(
            config.storage_root(),
            PathBuf::from("/var/lib/kaderisasi/objects")
        );
    }
}
