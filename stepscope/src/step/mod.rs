//! Step trait and invocation.
//!
//! A step body never inherits from the host's script type. The host keeps
//! the [`StepExecutionContext`] and lends it to the body for one run.

mod invoker;

pub use invoker::StepInvoker;

use crate::context::StepExecutionContext;
use crate::errors::StepError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for library-provided steps.
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Returns the name of the step.
    fn name(&self) -> &str;

    /// Executes the step against its context.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The context built for this invocation only
    async fn execute(&self, ctx: &StepExecutionContext) -> Result<serde_json::Value, StepError>;
}

/// A simple function-based step.
pub struct FnStep<F>
where
    F: Fn(&StepExecutionContext) -> Result<serde_json::Value, StepError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStep<F>
where
    F: Fn(&StepExecutionContext) -> Result<serde_json::Value, StepError> + Send + Sync,
{
    /// Creates a new function-based step.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStep<F>
where
    F: Fn(&StepExecutionContext) -> Result<serde_json::Value, StepError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Step for FnStep<F>
where
    F: Fn(&StepExecutionContext) -> Result<serde_json::Value, StepError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &StepExecutionContext) -> Result<serde_json::Value, StepError> {
        (self.func)(ctx)
    }
}
