//! Sandboxed resolution of library resource files.

use super::{LocalPath, WorkspacePath};
use crate::config::ResolverConfig;
use crate::errors::{ResourceError, StepError};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn, Span};

/// Reads resource files from beneath a single sandbox root.
///
/// A request is rejected when the path is absolute, when its `..` segments
/// climb above the root, or when its canonical location (after links are
/// resolved) is not a descendant of the canonical root. Only regular files
/// are returned, decoded as UTF-8. Nothing is cached.
#[derive(Clone)]
pub struct ResourceResolver {
    root: Arc<dyn WorkspacePath>,
    config: ResolverConfig,
}

impl ResourceResolver {
    /// Creates a resolver over a workspace directory handle.
    #[must_use]
    pub fn new(root: Arc<dyn WorkspacePath>) -> Self {
        Self {
            root,
            config: ResolverConfig::default(),
        }
    }

    /// Creates a resolver over a local directory.
    #[must_use]
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(LocalPath::new(root)))
    }

    /// Sets the resolver configuration.
    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the sandbox root.
    #[must_use]
    pub fn root(&self) -> &Arc<dyn WorkspacePath> {
        &self.root
    }

    /// Returns the resolver configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Reads the resource at `path`, relative to the sandbox root.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::SecurityViolation`] if `path` is absolute or resolves outside the root
    /// - [`ResourceError::NotFound`] if nothing exists at the resolved location
    /// - [`ResourceError::InvalidResourceType`] if the resolved location is not a regular file
    /// - [`ResourceError::Unreadable`] if the file is too large, not UTF-8, or the read fails
    pub fn resolve(&self, path: &str) -> Result<String, ResourceError> {
        if is_absolute(path) {
            return Err(self.violation(ResourceError::absolute_path(path)));
        }
        if climbs_above_root(path) {
            return Err(self.violation(ResourceError::outside_root(path)));
        }

        let candidate = self.root.child(path);
        if !candidate.exists() {
            return Err(ResourceError::not_found(path));
        }

        // Every later check and the read go through the verified location.
        let verified = self.check_containment(path, candidate.as_ref())?;

        if !verified.is_file() {
            return Err(ResourceError::invalid_type(path));
        }

        let limit = self.config.max_resource_bytes;
        let bytes = verified
            .read_bytes(limit)
            .map_err(|err| ResourceError::unreadable(path, err))?;

        if let Some(limit) = limit {
            if bytes.len() as u64 > limit {
                return Err(ResourceError::unreadable(
                    path,
                    format!("resource is larger than the limit of {limit} bytes"),
                ));
            }
        }

        let contents =
            String::from_utf8(bytes).map_err(|err| ResourceError::unreadable(path, err))?;

        debug!(
            resource = %path,
            bytes = contents.len(),
            "Resolved library resource"
        );

        Ok(contents)
    }

    /// Reads the resource at `path` on the blocking thread pool.
    ///
    /// Dropping the returned future abandons the wait; the read itself is
    /// not interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Resource`] for every failure [`Self::resolve`]
    /// reports, and [`StepError::Join`] if the blocking task did not finish.
    pub async fn resolve_async(&self, path: &str) -> Result<String, StepError> {
        let resolver = self.clone();
        let path = path.to_string();
        let span = Span::current();
        let contents = tokio::task::spawn_blocking(move || {
            let _entered = span.entered();
            resolver.resolve(&path)
        })
        .await??;
        Ok(contents)
    }

    fn check_containment(
        &self,
        path: &str,
        candidate: &dyn WorkspacePath,
    ) -> Result<Box<dyn WorkspacePath>, ResourceError> {
        let root_real = self
            .root
            .canonical()
            .map_err(|err| ResourceError::unreadable(path, err))?
            .location();
        let verified = candidate
            .canonical()
            .map_err(|err| ResourceError::unreadable(path, err))?;
        let candidate_real = verified.location();

        if !candidate_real.starts_with(&root_real) {
            return Err(self.violation(ResourceError::outside_root(path)));
        }

        if !self.config.follow_symlinks && candidate_real != root_real.join(normalize(path)) {
            return Err(self.violation(ResourceError::symlinked(path)));
        }

        Ok(verified)
    }

    fn violation(&self, err: ResourceError) -> ResourceError {
        warn!(
            resource = %err.path(),
            root = %self.root.location().display(),
            error = %err,
            "Rejected library resource request"
        );
        err
    }
}

impl fmt::Debug for ResourceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceResolver")
            .field("root", &self.root.location())
            .field("config", &self.config)
            .finish()
    }
}

/// Returns true if `path` names a root, a drive prefix, or starts with a separator.
fn is_absolute(path: &str) -> bool {
    path.starts_with(['/', '\\'])
        || Path::new(path)
            .components()
            .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}

/// Returns true if the `..` segments of `path` climb above its starting directory.
fn climbs_above_root(path: &str) -> bool {
    let mut depth = 0usize;
    for component in Path::new(path).components() {
        match component {
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return true,
            },
            Component::Normal(_) => depth += 1,
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    false
}

/// Lexically normalizes a relative path already known not to climb above its start.
fn normalize(path: &str) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    normalized
}
