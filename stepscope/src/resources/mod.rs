//! Library resource access.
//!
//! This module provides:
//! - Directory handles into the build workspace
//! - A sandboxed resolver that only returns regular files beneath its root

mod resolver;
mod workspace;

pub use resolver::ResourceResolver;
pub use workspace::{LocalPath, WorkspacePath};

#[cfg(test)]
pub(crate) use workspace::MockWorkspacePath;
