//! Central module for application-wide configuration settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `FUNSHOP__SECTION__KEY` environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "FUNSHOP";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub catalog: CatalogConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file; `:memory:` keeps everything in RAM.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    /// Adds the `Secure` attribute to cookies (enable behind TLS).
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub page_size: u32,
}

/// Which mail transport to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    Log,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub backend: MailBackend,
    #[serde(default)]
    pub webhook_url: String,
    pub from: String,
    pub timeout_secs: u64,
}

/// Bootstrap administrator, created at startup when missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                path: PathBuf::from("funshop.db"),
            },
            session: SessionConfig {
                ttl_secs: 60 * 60 * 24 * 7,
                secure_cookie: false,
            },
            catalog: CatalogConfig { page_size: 12 },
            mail: MailConfig {
                backend: MailBackend::Log,
                webhook_url: String::new(),
                from: "FunShop <no-reply@funshop.local>".to_string(),
                timeout_secs: 5,
            },
            admin: AdminConfig::default(),
            log: LogConfig {
                filter: "funshop=info,tower_http=info".to_string(),
            },
        }
    }
}

impl Config {
    /// Load defaults, then `path` (if given and present), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.catalog.page_size == 0 {
            return Err(config::ConfigError::Message(
                "catalog.page_size must be positive".to_string(),
            ));
        }
        if self.mail.backend == MailBackend::Webhook && self.mail.webhook_url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "mail.webhook_url is required when mail.backend = \"webhook\"".to_string(),
            ));
        }
        if self.admin.email.is_some() != self.admin.password.is_some() {
            return Err(config::ConfigError::Message(
                "admin.email and admin.password must be set together".to_string(),
            ));
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, config::ConfigError> {
        let ip: IpAddr = self.server.host.parse().map_err(|_| {
            config::ConfigError::Message(format!("invalid server.host {:?}", self.server.host))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_secs)
    }
}
