//! Directory Listing

use std::path::Path;

use crate::error::ServeError;

/// Kind of a directory child as reported by the directory entry itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One direct child of a listed directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Structured listing handed to the page renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingDescriptor {
    /// `/`-separated path relative to the served root, empty at the root.
    pub current_path: String,
    pub entries: Vec<ListingEntry>,
    pub parent_link: bool,
}

impl ListingDescriptor {
    /// Path shown to the user, always starting with `/`.
    pub fn display_path(&self) -> String {
        format!("/{}", self.current_path)
    }

    /// Relative path of the parent directory, if there is one to navigate to.
    pub fn parent_path(&self) -> Option<&str> {
        if !self.parent_link {
            return None;
        }
        Some(
            self.current_path
                .rsplit_once('/')
                .map(|(parent, _)| parent)
                .unwrap_or_default(),
        )
    }
}

/// Enumerate the direct children of `dir`.
///
/// `relative` is the normalized request path of `dir`; the parent link is only
/// offered below the root. Symlinks are reported the way the OS reports them.
pub async fn list(dir: &Path, relative: &str, sort: bool) -> Result<ListingDescriptor, ServeError> {
    let mut reader = tokio::fs::read_dir(dir).await?;

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let kind = match entry.file_type().await {
            Ok(ft) if ft.is_dir() => EntryKind::Directory,
            Ok(_) => EntryKind::File,
            Err(err) => {
                log::debug!("unable to read type of {:?}: {err}", entry.path());
                EntryKind::File
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push(ListingEntry { name, kind });
    }
    if sort {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
    }

    log::debug!("listed {} entries in {dir:?}", entries.len());
    Ok(ListingDescriptor {
        current_path: relative.to_owned(),
        entries,
        parent_link: !relative.is_empty(),
    })
}
