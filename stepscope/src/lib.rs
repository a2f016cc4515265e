//! # Stepscope
//!
//! The execution context a pipeline-templating engine attaches to every
//! library step it runs.
//!
//! Each step invocation gets its own [`context::StepExecutionContext`] holding:
//!
//! - **Configuration**: the merged library configuration for the step
//! - **Hook metadata**: which lifecycle hook triggered the step, if any
//! - **Stage metadata**: the pipeline stage the step runs within
//! - **Resources**: sandboxed read access to files shipped with the library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepscope::prelude::*;
//!
//! let ctx = StepExecutionContext::builder()
//!     .config_entry("image", serde_json::json!("alpine"))
//!     .stage_context(StageContext::new("build"))
//!     .resource_root(Arc::new(LocalPath::new("/workspace/libraries/docker/resources")))
//!     .build();
//!
//! let output = StepInvoker::new().run(&my_step, &ctx).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod errors;
pub mod resources;
pub mod step;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::ResolverConfig;
    pub use crate::context::{
        HookContext, HookType, StageContext, StepConfiguration, StepContextBuilder,
        StepExecutionContext,
    };
    pub use crate::errors::{ResourceError, ResourceErrorKind, StepError, ERROR_TAG};
    pub use crate::resources::{LocalPath, ResourceResolver, WorkspacePath};
    pub use crate::step::{FnStep, Step, StepInvoker};
}
