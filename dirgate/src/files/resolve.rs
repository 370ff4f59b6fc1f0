//! Request Path to Filesystem Path Resolution

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use crate::error::ServeError;

/// Absolute, canonical root of the served subtree.
///
/// Established once at startup and shared read-only between requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerRoot(PathBuf);

impl ServerRoot {
    /// Canonicalize `path` into the served root.
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().canonicalize()?;
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{path:?} is not a directory"),
            ));
        }
        Ok(Self(path))
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Whether `path` is the root itself or one of its descendants.
    #[inline]
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.0)
    }
}

/// Filesystem location vetted to sit inside the [`ServerRoot`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    relative: String,
}

impl ResolvedPath {
    /// Absolute filesystem path.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalized `/`-separated path relative to the root, empty for the root.
    #[inline]
    pub fn relative(&self) -> &str {
        &self.relative
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }
}

/// Normalize an untrusted request path into its plain segments.
///
/// The path is percent-decoded once, split on both `/` and `\`, and `.`/`..`
/// are applied lexically. Climbing above the root is an error rather than
/// being clamped.
fn normalize(request_path: &str) -> Result<Vec<String>, ServeError> {
    let decoded = urlencoding::decode(request_path).map_err(|_| ServeError::PathEscape)?;
    if decoded.contains('\0') {
        return Err(ServeError::PathEscape);
    }

    let mut segments: Vec<String> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or(ServeError::PathEscape)?;
            }
            name => {
                // reject anything the platform would not treat as a plain name
                let mut components = Path::new(name).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => segments.push(name.to_owned()),
                    _ => return Err(ServeError::PathEscape),
                }
            }
        }
    }
    Ok(segments)
}

/// Resolve an untrusted request path against the served root.
///
/// Existence is not required. When the target does exist it is canonicalized
/// and checked again, which catches symlinks pointing out of the root.
pub fn resolve(root: &ServerRoot, request_path: &str) -> Result<ResolvedPath, ServeError> {
    let segments = normalize(request_path).inspect_err(|_| {
        log::warn!("rejected request path {request_path:?}: escapes root");
    })?;

    let path = segments
        .iter()
        .fold(root.path().to_path_buf(), |path, segment| path.join(segment));
    if !root.contains(&path) {
        log::warn!("rejected request path {request_path:?}: {path:?} outside root");
        return Err(ServeError::PathEscape);
    }

    let path = match path.canonicalize() {
        Ok(real) if root.contains(&real) => real,
        Ok(real) => {
            log::warn!("rejected request path {request_path:?}: links to {real:?}");
            return Err(ServeError::PathEscape);
        }
        Err(_) => path,
    };

    let relative = segments.join("/");
    log::trace!("resolved {request_path:?} to {path:?}");
    Ok(ResolvedPath { path, relative })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    fn root() -> (tempfile::TempDir, ServerRoot) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b.txt"), "hello").unwrap();
        let root = ServerRoot::new(dir.path()).unwrap();
        (dir, root)
    }

    #[test]
    fn empty_path_is_root() {
        let (_dir, root) = root();
        let resolved = resolve(&root, "").unwrap();
        assert_eq!(resolved.path(), root.path());
        assert!(resolved.is_root());
    }

    #[test]
    fn nested_path_joins_onto_root() {
        let (_dir, root) = root();
        let resolved = resolve(&root, "a/b.txt").unwrap();
        assert_eq!(resolved.path(), root.path().join("a").join("b.txt"));
        assert_eq!(resolved.relative(), "a/b.txt");
    }

    #[test]
    fn dot_segments_collapse() {
        let (_dir, root) = root();
        let resolved = resolve(&root, "a/./b/../b.txt").unwrap();
        assert_eq!(resolved.relative(), "a/b.txt");
        let resolved = resolve(&root, "a/..").unwrap();
        assert!(resolved.is_root());
        let resolved = resolve(&root, "//a//b/").unwrap();
        assert_eq!(resolved.relative(), "a/b");
    }

    #[test]
    fn missing_targets_still_resolve() {
        let (_dir, root) = root();
        let resolved = resolve(&root, "a/new.txt").unwrap();
        assert_eq!(resolved.path(), root.path().join("a/new.txt"));
    }

    #[test]
    fn traversal_is_rejected() {
        let (_dir, root) = root();
        let attempts = [
            "..",
            "../../etc/passwd",
            "a/../../etc/passwd",
            "a/b/../../../x",
            "..\\..\\etc\\passwd",
            "a\\..\\..\\x",
            "%2e%2e/%2e%2e/etc/passwd",
            "a%2F..%2F..%2Fetc",
            "%2E%2E%5C%2E%2E",
            "a/%00/b",
        ];
        for attempt in attempts {
            assert!(
                matches!(resolve(&root, attempt), Err(ServeError::PathEscape)),
                "{attempt:?} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let (_dir, root) = root();
        assert!(matches!(resolve(&root, "%ff%fe"), Err(ServeError::PathEscape)));
    }

    #[test]
    fn encoded_names_are_decoded() {
        let (_dir, root) = root();
        let resolved = resolve(&root, "a/my%20file.txt").unwrap();
        assert_eq!(resolved.relative(), "a/my file.txt");
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_root_is_rejected() {
        let (dir, root) = root();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("out")).unwrap();
        assert!(matches!(resolve(&root, "out"), Err(ServeError::PathEscape)));
    }

    #[test]
    fn root_must_be_a_directory() {
        let (dir, _root) = root();
        assert!(ServerRoot::new(dir.path().join("a/b.txt")).is_err());
        assert!(ServerRoot::new(dir.path().join("missing")).is_err());
    }
}
