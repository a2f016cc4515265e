//! Execution context for library steps.
//!
//! This module provides:
//! - Hook and stage metadata injected by the orchestration layer
//! - The per-invocation context a step body reads configuration and resources from

mod execution;
mod hook;
mod stage;

pub use execution::{StepConfiguration, StepContextBuilder, StepExecutionContext};
pub use hook::{HookContext, HookType};
pub use stage::StageContext;
