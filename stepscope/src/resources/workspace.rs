//! Directory handles into the build workspace.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// A location inside the build workspace.
///
/// Resource resolution only ever touches the workspace through this trait,
/// so hosts with remote or virtual workspaces can supply their own handle.
#[cfg_attr(test, mockall::automock)]
pub trait WorkspacePath: Send + Sync {
    /// Returns the location for display and logging.
    fn location(&self) -> PathBuf;

    /// Resolves a child of this location.
    ///
    /// The relative string is appended verbatim, trailing separators included.
    fn child(&self, relative: &str) -> Box<dyn WorkspacePath>;

    /// Returns true if something exists at this location.
    fn exists(&self) -> bool;

    /// Returns true if this location is a directory.
    fn is_directory(&self) -> bool;

    /// Returns true if this location is a regular file.
    ///
    /// Directories, pipes, sockets and device nodes are not regular files.
    fn is_file(&self) -> bool;

    /// Returns a handle to the canonical location with every link resolved.
    fn canonical(&self) -> io::Result<Box<dyn WorkspacePath>>;

    /// Reads the entry's bytes.
    ///
    /// With a limit, at most `limit + 1` bytes are read so the caller can
    /// tell an oversized entry apart from one that is exactly at the limit.
    fn read_bytes(&self, limit: Option<u64>) -> io::Result<Vec<u8>>;
}

/// A [`WorkspacePath`] on the local filesystem.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalPath {
    path: PathBuf,
}

impl LocalPath {
    /// Creates a handle for a local path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the underlying path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for LocalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalPath").field(&self.path).finish()
    }
}

impl WorkspacePath for LocalPath {
    fn location(&self) -> PathBuf {
        self.path.clone()
    }

    fn child(&self, relative: &str) -> Box<dyn WorkspacePath> {
        Box::new(Self::new(self.path.join(relative)))
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn is_directory(&self) -> bool {
        self.path.is_dir()
    }

    fn is_file(&self) -> bool {
        fs::metadata(&self.path).is_ok_and(|meta| meta.is_file())
    }

    fn canonical(&self) -> io::Result<Box<dyn WorkspacePath>> {
        Ok(Box::new(Self::new(fs::canonicalize(&self.path)?)))
    }

    fn read_bytes(&self, limit: Option<u64>) -> io::Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        if !file.metadata()?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "entry is not a regular file",
            ));
        }

        let mut bytes = Vec::new();
        match limit {
            Some(limit) => {
                file.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
            }
            None => {
                file.read_to_end(&mut bytes)?;
            }
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_child_keeps_trailing_separator() {
        let root = LocalPath::new("/lib/res");
        let child = root.child("templates/a.txt/");

        assert!(child.location().to_string_lossy().ends_with("a.txt/"));
    }

    #[test]
    fn test_local_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let root = LocalPath::new(dir.path());
        let file = root.child("a.txt");

        assert!(file.exists());
        assert!(file.is_file());
        assert!(!file.is_directory());
        assert_eq!(file.read_bytes(None).unwrap(), b"hello");
        assert!(root.is_directory());
        assert!(!root.is_file());
    }

    #[test]
    fn test_local_path_read_stops_past_limit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "0123456789").unwrap();
        let file = LocalPath::new(dir.path()).child("a.txt");

        assert_eq!(file.read_bytes(Some(3)).unwrap(), b"0123");
        assert_eq!(file.read_bytes(Some(10)).unwrap(), b"0123456789");
    }

    #[test]
    fn test_local_path_canonical() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let root = LocalPath::new(dir.path());

        let canonical = root.child("sub/../sub").canonical().unwrap();
        assert_eq!(
            canonical.location(),
            fs::canonicalize(dir.path().join("sub")).unwrap()
        );
    }

    #[test]
    fn test_local_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = LocalPath::new(dir.path()).child("nope");

        assert!(!missing.exists());
        assert!(!missing.is_file());
        assert!(missing.canonical().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_local_path_fifo_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("pipe");
        let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());

        let entry = LocalPath::new(dir.path()).child("pipe");
        assert!(entry.exists());
        assert!(!entry.is_file());
        assert!(!entry.is_directory());
    }
}
