//! On-disk fixtures for resource tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::context::{StepContextBuilder, StepExecutionContext};
use crate::resources::{LocalPath, WorkspacePath};

/// A temporary workspace holding a library's resource directory.
///
/// Files can be placed inside the resource root or next to it, so tests can
/// check that a step cannot reach the latter. The tree is removed on drop.
#[derive(Debug)]
pub struct ResourceTree {
    workspace: TempDir,
    root: PathBuf,
}

impl ResourceTree {
    /// Creates an empty workspace with a `resources` directory inside it.
    pub fn new() -> io::Result<Self> {
        let workspace = tempfile::tempdir()?;
        let root = workspace.path().join("resources");
        fs::create_dir_all(&root)?;
        Ok(Self { workspace, root })
    }

    /// Writes a file below the resource root, creating parent directories.
    pub fn file(&self, relative: &str, contents: &str) -> io::Result<&Self> {
        write_file(&self.root.join(relative), contents)?;
        Ok(self)
    }

    /// Creates a directory below the resource root.
    pub fn dir(&self, relative: &str) -> io::Result<&Self> {
        fs::create_dir_all(self.root.join(relative))?;
        Ok(self)
    }

    /// Writes a file in the workspace, outside the resource root.
    pub fn outside_file(&self, relative: &str, contents: &str) -> io::Result<&Self> {
        write_file(&self.workspace.path().join(relative), contents)?;
        Ok(self)
    }

    /// Returns the resource root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the workspace directory containing the resource root.
    #[must_use]
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Returns a workspace handle for the resource root.
    #[must_use]
    pub fn handle(&self) -> Arc<dyn WorkspacePath> {
        Arc::new(LocalPath::new(&self.root))
    }

    /// Returns a context builder with the resource root already bound.
    #[must_use]
    pub fn builder(&self) -> StepContextBuilder {
        StepExecutionContext::builder().resource_root(self.handle())
    }

    /// Returns a context with only the resource root bound.
    #[must_use]
    pub fn context(&self) -> StepExecutionContext {
        self.builder().build()
    }
}

fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
