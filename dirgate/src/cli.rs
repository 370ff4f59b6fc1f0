//! CLI overrides and [`ServerConfig`] compilation

use anyhow::Result;
use dirgate::{ServerConfig, config::read_config};
use dirgate_cli::Cli;

/// Build configuration from an optional config file and cli settings.
///
/// Explicit cli values win over the file.
pub fn build_config(cli: Cli) -> Result<ServerConfig> {
    let mut config = match cli.config.as_ref() {
        Some(path) => read_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(dir) = cli.dir {
        config.root = Some(dir);
    }
    if let Some(port) = cli.port {
        config.listen.port = Some(port);
    }
    if let Some(host) = cli.host {
        config.listen.host = Some(host);
    }
    if let Some(log) = cli.log {
        config.logging.disable = !log;
    }
    config.validate()?;
    Ok(config)
}
