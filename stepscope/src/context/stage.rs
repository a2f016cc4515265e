//! Metadata about the pipeline stage a step runs within.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Describes the active stage.
///
/// The default value is the "not inside a stage" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageContext {
    /// The stage name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Arguments passed to the stage, in declaration order.
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl StageContext {
    /// Creates stage metadata for a named stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            args: Map::new(),
        }
    }

    /// Adds a stage argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    /// Returns a stage argument.
    #[must_use]
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// Returns true for the "not inside a stage" sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.args.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_context() {
        let stage = StageContext::new("continuous_integration")
            .with_arg("unit_test", serde_json::json!(true))
            .with_arg("archive", serde_json::json!("dist/"));

        assert_eq!(stage.name.as_deref(), Some("continuous_integration"));
        assert_eq!(stage.arg("unit_test"), Some(&serde_json::json!(true)));
        assert!(stage.arg("missing").is_none());
        assert!(!stage.is_empty());
        assert!(StageContext::default().is_empty());
    }

    #[test]
    fn test_args_keep_declaration_order() {
        let stage = StageContext::new("s")
            .with_arg("zeta", serde_json::json!(1))
            .with_arg("alpha", serde_json::json!(2));

        let json = serde_json::to_string(&stage).unwrap();
        assert_eq!(json, r#"{"name":"s","args":{"zeta":1,"alpha":2}}"#);
    }
}
