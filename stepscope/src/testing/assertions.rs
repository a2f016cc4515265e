//! Test assertions for resource results.

use crate::errors::{ResourceError, ResourceErrorKind};

/// Asserts that a resource request failed with the expected kind.
pub fn assert_resource_error(result: &Result<String, ResourceError>, expected: ResourceErrorKind) {
    match result {
        Ok(contents) => panic!(
            "Expected {expected:?}, but the resource resolved to {} bytes",
            contents.len()
        ),
        Err(err) => assert_eq!(
            err.kind(),
            expected,
            "Expected {:?}, got {:?}: {}",
            expected,
            err.kind(),
            err
        ),
    }
}

/// Asserts that a resource request failed and the error names `path`.
pub fn assert_resource_error_names(result: &Result<String, ResourceError>, path: &str) {
    let err = result
        .as_ref()
        .expect_err("Expected the resource request to fail");
    assert_eq!(err.path(), path, "Error does not name the requested path: {err}");
    assert!(
        err.to_string().contains(path),
        "Message does not mention '{path}': {err}"
    );
}

/// Asserts that a resource request succeeded with the expected contents.
pub fn assert_resource_contents(result: &Result<String, ResourceError>, expected: &str) {
    match result {
        Ok(contents) => assert_eq!(contents, expected),
        Err(err) => panic!("Expected contents {expected:?}, got error: {err}"),
    }
}
