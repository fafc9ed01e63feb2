//! Server configuration.
//!
//! Configuration merges a TOML file with `OPENCOURSE__`-prefixed environment
//! variables (double underscore as the section separator, e.g.
//! `OPENCOURSE__SERVER__PORT=9090`), then validates the result before the
//! server starts.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use opencourse_db_postgres::PostgresConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: PostgresConfig,
    /// Token signing and lifetimes
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Database validations
        if self.database.url.is_empty() {
            return Err("database.url must not be empty".into());
        }
        if self.database.pool_size == 0 {
            return Err("database.pool_size must be > 0".into());
        }
        // Auth validations
        if self.auth.jwt_secret.len() < 16 {
            return Err("auth.jwt_secret must be at least 16 characters".into());
        }
        if self.auth.access_token_lifetime_secs == 0 || self.auth.refresh_token_lifetime_secs == 0 {
            return Err("auth token lifetimes must be > 0".into());
        }
        if self.auth.access_token_lifetime_secs >= self.auth.refresh_token_lifetime_secs {
            return Err("auth.access_token_lifetime_secs must be < refresh_token_lifetime_secs".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body size.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HMAC secret for token signing.
    /// Prefer setting it via OPENCOURSE__AUTH__JWT_SECRET.
    #[serde(default)]
    pub jwt_secret: String,
    /// Issuer claim stamped into every token.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_lifetime")]
    pub access_token_lifetime_secs: i64,
    #[serde(default = "default_refresh_lifetime")]
    pub refresh_token_lifetime_secs: i64,
}

fn default_issuer() -> String {
    "opencourse".to_string()
}

fn default_access_lifetime() -> i64 {
    30 * 60
}

fn default_refresh_lifetime() -> i64 {
    7 * 24 * 60 * 60
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: default_issuer(),
            access_token_lifetime_secs: default_access_lifetime(),
            refresh_token_lifetime_secs: default_refresh_lifetime(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("opencourse.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., OPENCOURSE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("OPENCOURSE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        cfg.database.url = "postgres://localhost/opencourse".to_string();
        cfg
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_default_config_lacks_secret() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.contains("jwt_secret"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut cfg = valid_config();
        cfg.auth.jwt_secret = "short".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_access_lifetime_must_be_shorter() {
        let mut cfg = valid_config();
        cfg.auth.access_token_lifetime_secs = cfg.auth.refresh_token_lifetime_secs;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut cfg = valid_config();
        cfg.logging.level = "verbose".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_addr_falls_back_to_any() {
        let mut cfg = valid_config();
        cfg.server.host = "not-an-ip".to_string();
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_toml_round_trip() {
        let cfg = valid_config();
        let toml = toml::to_string(&cfg).unwrap();
        let parsed: AppConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.server.port, cfg.server.port);
        assert_eq!(parsed.auth.issuer, "opencourse");
    }
}
