//! Metadata about the lifecycle hook that triggered a step.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle point a hook is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    /// Runs before the pipeline starts, to validate inputs.
    Validate,
    /// Runs once the pipeline is initialized.
    Init,
    /// Runs before each step.
    BeforeStep,
    /// Runs after each step.
    AfterStep,
    /// Runs when the pipeline finishes.
    CleanUp,
    /// Runs after the pipeline result is known.
    Notify,
}

impl HookType {
    /// Returns the snake_case name of the hook type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Init => "init",
            Self::BeforeStep => "before_step",
            Self::AfterStep => "after_step",
            Self::CleanUp => "clean_up",
            Self::Notify => "notify",
        }
    }

    /// Returns true for hooks that wrap an individual step.
    #[must_use]
    pub const fn is_step_scoped(self) -> bool {
        matches!(self, Self::BeforeStep | Self::AfterStep)
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes the hook a step is running for.
///
/// The default value is the "not a hook" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookContext {
    /// The hook type, if the step runs as a hook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_type: Option<HookType>,

    /// The library contributing the step that triggered the hook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,

    /// The step that triggered the hook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,

    /// Whether the pipeline had already failed when the hook fired.
    #[serde(default)]
    pub exception_thrown: bool,
}

impl HookContext {
    /// Creates hook metadata for the given hook type.
    #[must_use]
    pub fn new(hook_type: HookType) -> Self {
        Self {
            hook_type: Some(hook_type),
            ..Default::default()
        }
    }

    /// Sets the triggering library.
    #[must_use]
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    /// Sets the triggering step.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Marks that the pipeline had failed before the hook fired.
    #[must_use]
    pub const fn with_exception_thrown(mut self, thrown: bool) -> Self {
        self.exception_thrown = thrown;
        self
    }

    /// Returns true for the "not a hook" sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
