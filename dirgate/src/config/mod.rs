//! Configuration Deserializer Types

use std::{fmt::Debug, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use dirgate_cli::LogLevel;
use serde::Deserialize;

use crate::auth::KeySource;
use crate::files::{transfer::DEFAULT_CHUNK_SIZE, upload::DEFAULT_UPLOAD_LIMIT};

/// Default port server listens on.
pub const DEFAULT_PORT: u16 = 8000;

/// Read server configuration from a YAML file.
pub fn read_config(path: &PathBuf) -> Result<ServerConfig> {
    let s = std::fs::read_to_string(path).context("failed to read config")?;
    let config: ServerConfig = serde_yaml::from_str(&s).context("invalid config")?;
    config.validate().with_context(|| format!("config: {path:?}"))?;
    Ok(config)
}

/// Server configuration settings.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Directory being served.
    ///
    /// Default is the current directory
    pub root: Option<PathBuf>,
    /// Listener binding for the server.
    pub listen: ListenCfg,
    /// Directory of unauthenticated static assets served under `/static`.
    ///
    /// Default is `<root>/static`
    pub static_dir: Option<PathBuf>,
    /// Number of bytes read per chunk when streaming downloads.
    ///
    /// Default is 4096
    pub chunk_size: Option<usize>,
    /// Sort directory listings by name.
    ///
    /// Default is true
    pub sort_entries: Option<bool>,
    /// Upload handling settings.
    pub upload: UploadCfg,
    /// Login session settings.
    pub session: SessionCfg,
    /// Request logging settings.
    pub logging: LoggingCfg,
}

impl ServerConfig {
    #[inline]
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }
    #[inline]
    pub fn sort_entries(&self) -> bool {
        self.sort_entries.unwrap_or(true)
    }

    /// Static asset directory, relative paths resolve against `root`.
    pub fn static_dir(&self, root: &std::path::Path) -> PathBuf {
        match self.static_dir.as_ref() {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.join("static"),
        }
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == Some(0) {
            return Err(anyhow!("chunk_size must be greater than zero"));
        }
        if self.upload.max_size == Some(0) {
            return Err(anyhow!("upload.max_size must be greater than zero"));
        }
        self.session.key_source().key().map(|_| ())
    }
}

/// Server listener binding.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenCfg {
    /// Host address server will bind to.
    ///
    /// Default is 0.0.0.0
    pub host: Option<String>,
    /// Port server will bind to.
    ///
    /// Default is 8000
    pub port: Option<u16>,
}

impl ListenCfg {
    #[inline]
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("0.0.0.0")
    }
    #[inline]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
    #[inline]
    pub fn address(&self) -> (String, u16) {
        (self.host().to_owned(), self.port())
    }
}

/// Upload handling settings.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadCfg {
    /// Max combined size in bytes of all files in one upload request.
    ///
    /// Default is 100MiB
    pub max_size: Option<usize>,
}

impl UploadCfg {
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size.unwrap_or(DEFAULT_UPLOAD_LIMIT)
    }
}

/// Login session cookie settings.
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionCfg {
    /// Cookie name associated with session.
    ///
    /// Default is `dirgate`
    pub cookie_name: Option<String>,
    /// Secret to derive the cookie signing key from (at least 32 bytes).
    ///
    /// A random key is generated on every start when unset,
    /// so restarting the server invalidates all sessions.
    pub secret: Option<String>,
    /// Encrypt the cookie content instead of only signing it.
    ///
    /// Default is false
    pub private: bool,
    /// Only send the cookie over HTTPS.
    ///
    /// Default is false
    pub secure: bool,
}

impl Debug for SessionCfg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCfg")
            .field("cookie_name", &self.cookie_name)
            .field("secret", &self.secret.as_ref().map(|_| ".."))
            .field("private", &self.private)
            .field("secure", &self.secure)
            .finish()
    }
}

impl SessionCfg {
    #[inline]
    pub fn cookie_name(&self) -> String {
        self.cookie_name
            .clone()
            .unwrap_or_else(|| "dirgate".to_owned())
    }

    /// Signing key provider selected by this config.
    pub fn key_source(&self) -> KeySource {
        match self.secret.as_ref() {
            Some(secret) => KeySource::Secret(secret.clone()),
            None => KeySource::Generated,
        }
    }
}

/// Request logging settings.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingCfg {
    /// Disable request logging.
    pub disable: bool,
    /// Level request logs are written at.
    ///
    /// Default is info
    pub log_level: Option<LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: ServerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.listen.address(), ("0.0.0.0".to_owned(), 8000));
        assert_eq!(config.chunk_size(), 4096);
        assert!(config.sort_entries());
        assert_eq!(config.upload.max_size(), DEFAULT_UPLOAD_LIMIT);
        assert_eq!(config.session.cookie_name(), "dirgate");
        assert!(matches!(config.session.key_source(), KeySource::Generated));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_config_parses() {
        let yaml = r#"
root: /srv
listen:
  host: 127.0.0.1
  port: 9000
static_dir: assets
chunk_size: 8192
sort_entries: false
upload:
  max_size: 1024
session:
  cookie_name: sid
  secret: 0123456789abcdef0123456789abcdef
  private: true
logging:
  log_level: debug
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listen.address(), ("127.0.0.1".to_owned(), 9000));
        assert_eq!(config.static_dir(&config.root()), PathBuf::from("/srv/assets"));
        assert_eq!(config.chunk_size(), 8192);
        assert!(!config.sort_entries());
        assert_eq!(config.upload.max_size(), 1024);
        assert!(config.session.private);
        assert!(matches!(config.session.key_source(), KeySource::Secret(_)));
        assert_eq!(config.logging.log_level.as_ref().unwrap().0, log::Level::Debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<ServerConfig>("prefix: /x").is_err());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let config: ServerConfig = serde_yaml::from_str("chunk_size: 0").unwrap();
        assert!(config.validate().is_err());
        let config: ServerConfig = serde_yaml::from_str("session: {secret: short}").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let config: ServerConfig =
            serde_yaml::from_str("session: {secret: 0123456789abcdef0123456789abcdef}").unwrap();
        assert!(!format!("{config:?}").contains("0123456789abcdef"));
    }
}
