//! Login gated file browser, download and upload server.
//!
//! Serves a single directory tree over HTTP. Requests are mapped onto the tree
//! by [`files::resolve`], which never lets a path climb out of the
//! [`files::ServerRoot`].

use std::path::PathBuf;

use anyhow::{Context, Result};

pub mod auth;
pub mod config;
pub mod error;
pub mod files;
pub mod handlers;
pub mod render;

pub use config::ServerConfig;
pub use error::ServeError;
pub use handlers::configure;

use crate::files::{ServerRoot, transfer::DEFAULT_CHUNK_SIZE, upload::DEFAULT_UPLOAD_LIMIT};

/// Application state shared across handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Root of the served tree.
    pub root: ServerRoot,
    /// Directory of public assets served under `/static`.
    pub static_dir: PathBuf,
    /// Bytes read per download chunk.
    pub chunk_size: usize,
    /// Sort listings by name.
    pub sort_entries: bool,
    /// Max combined bytes of one upload request.
    pub upload_limit: usize,
}

impl AppState {
    /// Create state for `root` with default settings.
    pub fn new(root: ServerRoot) -> Self {
        Self {
            static_dir: root.path().join("static"),
            root,
            chunk_size: DEFAULT_CHUNK_SIZE,
            sort_entries: true,
            upload_limit: DEFAULT_UPLOAD_LIMIT,
        }
    }

    /// Create state from a validated configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let root = config.root();
        let root = ServerRoot::new(&root)
            .with_context(|| format!("cannot serve directory {root:?}"))?;
        Ok(Self {
            static_dir: config.static_dir(root.path()),
            chunk_size: config.chunk_size(),
            sort_entries: config.sort_entries(),
            upload_limit: config.upload.max_size(),
            root,
        })
    }
}
