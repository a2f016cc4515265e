//! Testing utilities for library steps.
//!
//! This module provides:
//! - Temporary resource trees
//! - A recording step
//! - Assertions for resource results

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_resource_contents, assert_resource_error, assert_resource_error_names,
};
pub use fixtures::ResourceTree;
pub use mocks::{RecordedInvocation, RecordingStep};
