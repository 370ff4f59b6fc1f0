use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use serde::de::Error;

/// Browse, download and upload files from a directory over HTTP,
/// behind a simple session login.
#[derive(Debug, Parser)]
#[clap(name = "dirgate")]
pub struct Cli {
    /// Directory from which to serve files [default: .]
    pub dir: Option<PathBuf>,
    /// Port on which to run the server
    #[clap(short, long)]
    pub port: Option<u16>,
    /// Host address the server will bind to
    #[clap(short = 'H', long)]
    pub host: Option<String>,
    /// Path of an optional YAML configuration to load
    #[clap(short, long)]
    pub config: Option<PathBuf>,
    /// Log requests if enabled
    #[clap(short, long)]
    pub log: Option<bool>,
    /// Open server in browser
    #[clap(long)]
    pub open: bool,
}

/// Log level parsed from a string.
///
/// Example: `debug`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLevel(pub log::Level);

impl Default for LogLevel {
    fn default() -> Self {
        Self(log::Level::Info)
    }
}

impl FromStr for LogLevel {
    type Err = log::ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(log::Level::from_str(s.trim())?))
    }
}

#[macro_export]
macro_rules! de_fromstr {
    ($s:ident) => {
        impl<'de> serde::Deserialize<'de> for $s {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s: String = serde::Deserialize::deserialize(deserializer)?;
                $s::from_str(&s).map_err(D::Error::custom)
            }
        }
    };
}

de_fromstr!(LogLevel);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_dir_and_port() {
        let cli = Cli::try_parse_from(["dirgate", "/srv", "-p", "9000"]).unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("/srv")));
        assert_eq!(cli.port, Some(9000));
        assert!(!cli.open);
    }

    #[test]
    fn no_dir_without_argument() {
        let cli = Cli::try_parse_from(["dirgate"]).unwrap();
        assert_eq!(cli.dir, None);
        assert_eq!(cli.port, None);
    }

    #[test]
    fn explicit_current_dir_is_kept() {
        let cli = Cli::try_parse_from(["dirgate", "."]).unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from(".")));
    }

    #[test]
    fn log_level_parses_case_insensitive() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap().0, log::Level::Debug);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
