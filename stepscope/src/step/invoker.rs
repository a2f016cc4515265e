//! Runs steps against freshly built contexts.

use super::Step;
use crate::config::ResolverConfig;
use crate::context::{StepContextBuilder, StepExecutionContext};
use crate::errors::StepError;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};

/// Builds one context per invocation and runs a step against it.
///
/// Contexts are never pooled: hook and stage metadata belong to a single
/// invocation.
#[derive(Debug, Clone, Default)]
pub struct StepInvoker {
    resolver_config: ResolverConfig,
}

impl StepInvoker {
    /// Creates an invoker with the default resolver configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resolver configuration applied to every context.
    #[must_use]
    pub fn with_resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver_config = config;
        self
    }

    /// Returns the resolver configuration.
    #[must_use]
    pub fn resolver_config(&self) -> &ResolverConfig {
        &self.resolver_config
    }

    /// Builds the context for one invocation.
    #[must_use]
    pub fn prepare(&self, builder: StepContextBuilder) -> StepExecutionContext {
        builder.resolver_config(self.resolver_config.clone()).build()
    }

    /// Runs `step` once against a new context built from `builder`.
    ///
    /// Failures are returned to the caller unchanged; nothing is retried.
    pub async fn invoke(
        &self,
        step: &dyn Step,
        builder: StepContextBuilder,
    ) -> Result<serde_json::Value, StepError> {
        let ctx = self.prepare(builder);
        self.run(step, &ctx).await
    }

    /// Runs `step` against a context the caller already populated.
    pub async fn run(
        &self,
        step: &dyn Step,
        ctx: &StepExecutionContext,
    ) -> Result<serde_json::Value, StepError> {
        let hook = ctx.hook_context().hook_type.map(|h| h.as_str());
        let span = info_span!(
            "step.invoke",
            step = %step.name(),
            invocation_id = %ctx.invocation_id(),
            stage = ctx.stage_context().name.as_deref().unwrap_or(""),
            hook = hook.unwrap_or(""),
        );

        async move {
            let started = Instant::now();
            info!("Step started");

            let result = step.execute(ctx).await;
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

            match &result {
                Ok(_) => info!(duration_ms, "Step completed"),
                Err(err) => error!(duration_ms, error = %err, "Step failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{HookContext, HookType, StageContext};
    use crate::errors::ResourceErrorKind;
    use crate::step::FnStep;

    #[tokio::test]
    async fn test_invoke_passes_context() {
        let step = FnStep::new("describe", |ctx: &StepExecutionContext| {
            Ok(serde_json::json!({
                "stage": ctx.stage_context().name,
                "hook": ctx.hook_context().hook_type,
                "tool": ctx.config_value("tool"),
            }))
        });

        let builder = StepExecutionContext::builder()
            .config_entry("tool", serde_json::json!("gradle"))
            .stage_context(StageContext::new("ci"))
            .hook_context(HookContext::new(HookType::BeforeStep));

        let output = StepInvoker::new().invoke(&step, builder).await.unwrap();

        assert_eq!(
            output,
            serde_json::json!({"stage": "ci", "hook": "before_step", "tool": "gradle"})
        );
    }

    #[tokio::test]
    async fn test_invoke_surfaces_resource_failure() {
        let step = FnStep::new("reader", |ctx: &StepExecutionContext| {
            let text = ctx.resource("a.txt")?;
            Ok(serde_json::json!(text))
        });

        let err = StepInvoker::new()
            .invoke(&step, StepExecutionContext::builder())
            .await
            .unwrap_err();

        assert_eq!(
            err.as_resource().map(|e| e.kind()),
            Some(ResourceErrorKind::Precondition)
        );
    }

    #[test]
    fn test_prepare_applies_resolver_config() {
        let invoker =
            StepInvoker::new().with_resolver_config(ResolverConfig::new().with_follow_symlinks(false));
        let ctx = invoker.prepare(StepExecutionContext::builder());

        assert!(ctx.resource_root().is_none());
        assert!(!invoker.resolver_config().follow_symlinks);
    }
}
