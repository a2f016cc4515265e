//! The execution context attached to a single step invocation.

use super::{HookContext, StageContext};
use crate::config::ResolverConfig;
use crate::errors::{ResourceError, StepError};
use crate::resources::{ResourceResolver, WorkspacePath};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug_span, Instrument, Span};
use uuid::Uuid;

/// Library configuration handed to a step, in declaration order.
pub type StepConfiguration = Map<String, Value>;

/// The context a library step executes against.
///
/// The orchestration layer populates the context before the step runs and
/// hands the step body a shared reference for the rest of the invocation.
/// Mutating it after the step body has started is not supported. A context
/// backs exactly one invocation and is deliberately not `Clone`.
pub struct StepExecutionContext {
    /// Correlates log records of this invocation.
    invocation_id: Uuid,
    /// Merged library configuration for this step.
    configuration: StepConfiguration,
    /// The hook that triggered this step, or the empty sentinel.
    hook_context: HookContext,
    /// The active stage, or the empty sentinel.
    stage_context: StageContext,
    /// Resolver bound to the step's resource directory.
    resources: Option<ResourceResolver>,
    /// Settings applied when the resource root is bound.
    resolver_config: ResolverConfig,
}

impl Default for StepExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StepExecutionContext {
    /// Creates an empty context with no resource root bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            configuration: StepConfiguration::new(),
            hook_context: HookContext::default(),
            stage_context: StageContext::default(),
            resources: None,
            resolver_config: ResolverConfig::default(),
        }
    }

    /// Returns a builder for a fully populated context.
    #[must_use]
    pub fn builder() -> StepContextBuilder {
        StepContextBuilder::default()
    }

    /// Returns the invocation ID.
    #[must_use]
    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// Replaces the step configuration.
    pub fn set_configuration(&mut self, configuration: StepConfiguration) {
        self.configuration = configuration;
    }

    /// Returns the step configuration.
    #[must_use]
    pub fn configuration(&self) -> &StepConfiguration {
        &self.configuration
    }

    /// Returns a single configuration value.
    #[must_use]
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.configuration.get(key)
    }

    /// Deserializes a configuration value into a typed form.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn config_as<T>(&self, key: &str) -> Result<Option<T>, StepError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.configuration
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(StepError::from)
    }

    /// Replaces the hook metadata.
    pub fn set_hook_context(&mut self, hook_context: HookContext) {
        self.hook_context = hook_context;
    }

    /// Returns the hook metadata.
    #[must_use]
    pub fn hook_context(&self) -> &HookContext {
        &self.hook_context
    }

    /// Replaces the stage metadata.
    pub fn set_stage_context(&mut self, stage_context: StageContext) {
        self.stage_context = stage_context;
    }

    /// Returns the stage metadata.
    #[must_use]
    pub fn stage_context(&self) -> &StageContext {
        &self.stage_context
    }

    /// Sets the resolver configuration.
    ///
    /// Applies to a root that is already bound as well as to later bindings.
    pub fn set_resolver_config(&mut self, config: ResolverConfig) {
        if let Some(resolver) = self.resources.take() {
            self.resources = Some(resolver.with_config(config.clone()));
        }
        self.resolver_config = config;
    }

    /// Binds the directory resources are read from.
    ///
    /// The directory does not have to exist yet.
    pub fn set_resource_root(&mut self, root: Arc<dyn WorkspacePath>) {
        self.resources =
            Some(ResourceResolver::new(root).with_config(self.resolver_config.clone()));
    }

    /// Returns the bound resource root, if any.
    #[must_use]
    pub fn resource_root(&self) -> Option<&Arc<dyn WorkspacePath>> {
        self.resources.as_ref().map(ResourceResolver::root)
    }

    /// Reads a library resource relative to the bound root.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::PreconditionError`] if no root is bound, and
    /// otherwise every error [`ResourceResolver::resolve`] reports.
    pub fn resource(&self, path: &str) -> Result<String, ResourceError> {
        let _entered = self.resource_span().entered();
        self.resolver(path)?.resolve(path)
    }

    /// Reads a library resource without blocking the async executor.
    ///
    /// # Errors
    ///
    /// Same failures as [`Self::resource`], wrapped in [`StepError`].
    pub async fn resource_async(&self, path: &str) -> Result<String, StepError> {
        let resolver = self.resolver(path)?;
        resolver
            .resolve_async(path)
            .instrument(self.resource_span())
            .await
    }

    fn resource_span(&self) -> Span {
        debug_span!("step.resource", invocation_id = %self.invocation_id)
    }

    fn resolver(&self, path: &str) -> Result<&ResourceResolver, ResourceError> {
        self.resources
            .as_ref()
            .ok_or_else(|| ResourceError::root_not_bound(path))
    }
}

impl std::fmt::Debug for StepExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepExecutionContext")
            .field("invocation_id", &self.invocation_id)
            .field("configuration", &self.configuration)
            .field("hook_context", &self.hook_context)
            .field("stage_context", &self.stage_context)
            .field("resources", &self.resources)
            .finish()
    }
}

/// Builds a [`StepExecutionContext`] in one expression.
#[derive(Default)]
pub struct StepContextBuilder {
    configuration: StepConfiguration,
    hook_context: HookContext,
    stage_context: StageContext,
    resource_root: Option<Arc<dyn WorkspacePath>>,
    resolver_config: ResolverConfig,
}

impl StepContextBuilder {
    /// Sets the step configuration.
    #[must_use]
    pub fn configuration(mut self, configuration: StepConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Adds a single configuration entry.
    #[must_use]
    pub fn config_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.configuration.insert(key.into(), value);
        self
    }

    /// Sets the hook metadata.
    #[must_use]
    pub fn hook_context(mut self, hook_context: HookContext) -> Self {
        self.hook_context = hook_context;
        self
    }

    /// Sets the stage metadata.
    #[must_use]
    pub fn stage_context(mut self, stage_context: StageContext) -> Self {
        self.stage_context = stage_context;
        self
    }

    /// Sets the resource root.
    #[must_use]
    pub fn resource_root(mut self, root: Arc<dyn WorkspacePath>) -> Self {
        self.resource_root = Some(root);
        self
    }

    /// Sets the resolver configuration.
    #[must_use]
    pub fn resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver_config = config;
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> StepExecutionContext {
        let mut ctx = StepExecutionContext::new();
        ctx.set_resolver_config(self.resolver_config);
        ctx.set_configuration(self.configuration);
        ctx.set_hook_context(self.hook_context);
        ctx.set_stage_context(self.stage_context);
        if let Some(root) = self.resource_root {
            ctx.set_resource_root(root);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HookType;
    use crate::errors::ResourceErrorKind;
    use crate::resources::LocalPath;

    #[test]
    fn test_fresh_context_is_empty() {
        let ctx = StepExecutionContext::new();

        assert!(ctx.configuration().is_empty());
        assert!(ctx.hook_context().is_empty());
        assert!(ctx.stage_context().is_empty());
        assert!(ctx.resource_root().is_none());
    }

    #[test]
    fn test_resource_before_root_is_precondition_error() {
        let ctx = StepExecutionContext::new();

        let err = ctx.resource("templates/a.txt").unwrap_err();
        assert_eq!(err.kind(), ResourceErrorKind::Precondition);
        assert_eq!(err.path(), "templates/a.txt");
    }

    #[test]
    fn test_setters() {
        let mut ctx = StepExecutionContext::new();
        let mut config = StepConfiguration::new();
        config.insert("image".to_string(), serde_json::json!("alpine"));

        ctx.set_configuration(config);
        ctx.set_hook_context(HookContext::new(HookType::Init));
        ctx.set_stage_context(StageContext::new("build"));

        assert_eq!(ctx.config_value("image"), Some(&serde_json::json!("alpine")));
        assert_eq!(ctx.hook_context().hook_type, Some(HookType::Init));
        assert_eq!(ctx.stage_context().name.as_deref(), Some("build"));
    }

    #[test]
    fn test_config_as() {
        let ctx = StepExecutionContext::builder()
            .config_entry("retries", serde_json::json!(3))
            .config_entry("name", serde_json::json!("x"))
            .build();

        assert_eq!(ctx.config_as::<u32>("retries").unwrap(), Some(3));
        assert_eq!(ctx.config_as::<u32>("absent").unwrap(), None);
        assert!(matches!(
            ctx.config_as::<u32>("name"),
            Err(StepError::Serialization(_))
        ));
    }

    #[test]
    fn test_resolver_config_applies_to_bound_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.txt"), "0123456789").unwrap();

        let mut ctx = StepExecutionContext::new();
        ctx.set_resource_root(Arc::new(LocalPath::new(dir.path())));
        assert_eq!(ctx.resource("big.txt").unwrap(), "0123456789");

        ctx.set_resolver_config(ResolverConfig::new().with_max_resource_bytes(4));
        assert_eq!(
            ctx.resource("big.txt").unwrap_err().kind(),
            ResourceErrorKind::Unreadable
        );
    }

    #[test]
    fn test_invocation_ids_differ() {
        let a = StepExecutionContext::new();
        let b = StepExecutionContext::new();
        assert_ne!(a.invocation_id(), b.invocation_id());
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_resource_logs_carry_invocation_id() {
        let tree = crate::testing::ResourceTree::new().unwrap();
        tree.file("a.txt", "hello").unwrap();
        let ctx = tree.context();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(ctx.resource("a.txt").unwrap(), "hello");
            assert!(ctx.resource("../secrets.txt").is_err());
        });

        let output = logs.contents();
        let id = ctx.invocation_id().to_string();
        let resolved = output
            .lines()
            .find(|line| line.contains("Resolved library resource"))
            .unwrap();
        assert!(resolved.contains(&id), "{resolved}");
        let rejected = output
            .lines()
            .find(|line| line.contains("Rejected library resource request"))
            .unwrap();
        assert!(rejected.contains(&id), "{rejected}");
    }
}
