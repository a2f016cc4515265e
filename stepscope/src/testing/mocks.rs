//! Mock steps for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::context::{HookContext, StageContext, StepConfiguration, StepExecutionContext};
use crate::errors::{ResourceError, StepError};
use crate::step::Step;

/// A step that records what it saw in each invocation.
#[derive(Debug)]
pub struct RecordingStep {
    name: String,
    resources: Vec<String>,
    invocations: Mutex<Vec<RecordedInvocation>>,
}

/// A recorded invocation.
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    /// Invocation ID of the context.
    pub invocation_id: Uuid,
    /// Configuration visible to the step.
    pub configuration: StepConfiguration,
    /// Hook metadata visible to the step.
    pub hook_context: HookContext,
    /// Stage metadata visible to the step.
    pub stage_context: StageContext,
    /// Result of each requested resource, in request order.
    pub resources: Vec<(String, Result<String, ResourceError>)>,
}

impl RecordingStep {
    /// Creates a new recording step.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Adds a resource the step reads on every invocation.
    #[must_use]
    pub fn reading(mut self, path: impl Into<String>) -> Self {
        self.resources.push(path.into());
        self
    }

    /// Returns all recorded invocations.
    #[must_use]
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.lock().clone()
    }

    /// Returns the number of invocations.
    #[must_use]
    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().len()
    }
}

#[async_trait]
impl Step for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &StepExecutionContext) -> Result<serde_json::Value, StepError> {
        let resources = self
            .resources
            .iter()
            .map(|path| (path.clone(), ctx.resource(path)))
            .collect();

        self.invocations.lock().push(RecordedInvocation {
            invocation_id: ctx.invocation_id(),
            configuration: ctx.configuration().clone(),
            hook_context: ctx.hook_context().clone(),
            stage_context: ctx.stage_context().clone(),
            resources,
        });

        Ok(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_step() {
        let step = RecordingStep::new("rec").reading("a.txt");
        let ctx = StepExecutionContext::builder()
            .config_entry("k", serde_json::json!("v"))
            .build();

        step.execute(&ctx).await.unwrap();

        assert_eq!(step.invocation_count(), 1);
        let recorded = &step.invocations()[0];
        assert_eq!(recorded.invocation_id, ctx.invocation_id());
        assert_eq!(recorded.configuration.get("k"), Some(&serde_json::json!("v")));
        assert_eq!(
            recorded.resources[0].1,
            Err(ResourceError::root_not_bound("a.txt"))
        );
    }
}
