//! Filesystem Side of the Server
//!
//! Path resolution, directory listings, chunked downloads and uploads.
//! Every operation works on a [`ResolvedPath`] so nothing touches the
//! filesystem outside of the [`ServerRoot`].

use std::{io, path::Path};

use crate::error::ServeError;

pub mod listing;
pub mod resolve;
pub mod transfer;
pub mod upload;

pub use listing::{EntryKind, ListingDescriptor, ListingEntry};
pub use resolve::{ResolvedPath, ServerRoot, resolve};
pub use transfer::{FileChunks, FileTransfer};
pub use upload::UploadedPart;

/// What a resolved path points at, determined by a single stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Directory,
    File,
    Missing,
}

impl Target {
    /// Stat `path` once and classify it.
    ///
    /// Special files (sockets, fifos, devices) count as missing.
    pub async fn probe(path: &Path) -> Result<Self, ServeError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => Ok(Self::Directory),
            Ok(meta) if meta.is_file() => Ok(Self::File),
            Ok(_) => Ok(Self::Missing),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::Missing),
            Err(err) => Err(err.into()),
        }
    }
}
