//! Port specifications and the checks run against values crossing a port.

use crate::{NodeError, PortValues, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Extra check run after the type check. `Err` carries the rejection reason.
pub type Validator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Primitive type tag of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Integer => "integer",
            DataType::Boolean => "boolean",
            DataType::Array => "array",
            DataType::Object => "object",
        }
    }

    /// `number` accepts integers as well as floats.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (DataType::String, Value::String(_)) => true,
            (DataType::Number, Value::Number(_) | Value::Integer(_)) => true,
            (DataType::Integer, Value::Integer(_)) => true,
            (DataType::Boolean, Value::Bool(_)) => true,
            (DataType::Array, Value::Array(_)) => true,
            (DataType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a node a value is crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

fn default_required() -> bool {
    true
}

/// A named, typed data slot on a node.
#[derive(Clone, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(skip)]
    pub validator: Option<Validator>,
}

impl PortSpec {
    /// A required port of the given type.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            description: None,
            required: true,
            default_value: None,
            validator: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Check a single value: type first, then the validator if any.
    pub fn check(&self, value: &Value, direction: PortDirection) -> Result<(), NodeError> {
        if !self.data_type.matches(value) {
            return Err(NodeError::InvalidType {
                port: self.name.clone(),
                direction,
                expected: self.data_type.to_string(),
                actual: value.type_name().to_string(),
            });
        }

        if let Some(validator) = &self.validator {
            let outcome = catch_unwind(AssertUnwindSafe(|| validator(value)))
                .unwrap_or_else(|_| Err("validator panicked".to_string()));
            if let Err(reason) = outcome {
                return Err(NodeError::Rejected {
                    port: self.name.clone(),
                    direction,
                    reason,
                });
            }
        }

        Ok(())
    }
}

impl fmt::Debug for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortSpec")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("required", &self.required)
            .field("default_value", &self.default_value)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Validate a whole port mapping against its declared specs.
///
/// Values for undeclared ports are ignored.
pub fn validate_ports(
    values: &PortValues,
    specs: &[PortSpec],
    direction: PortDirection,
) -> Result<(), NodeError> {
    for spec in specs {
        match values.get(&spec.name) {
            Some(value) => spec.check(value, direction)?,
            None if spec.required => {
                return Err(NodeError::MissingPort {
                    port: spec.name.clone(),
                    direction,
                })
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_accepts_integers_but_integer_rejects_floats() {
        let number = PortSpec::new("n", DataType::Number);
        let integer = PortSpec::new("i", DataType::Integer);

        assert!(number.check(&Value::Integer(3), PortDirection::Input).is_ok());
        assert!(number.check(&Value::Number(3.5), PortDirection::Input).is_ok());
        assert!(integer.check(&Value::Integer(3), PortDirection::Input).is_ok());

        let err = integer.check(&Value::Number(3.5), PortDirection::Output).unwrap_err();
        assert_eq!(
            err,
            NodeError::InvalidType {
                port: "i".into(),
                direction: PortDirection::Output,
                expected: "integer".into(),
                actual: "number".into(),
            }
        );
    }

    #[test]
    fn null_never_matches_a_type() {
        let spec = PortSpec::new("s", DataType::String);
        assert!(spec.check(&Value::Null, PortDirection::Input).is_err());
    }

    #[test]
    fn validator_runs_after_type_check() {
        let spec = PortSpec::new("prompt", DataType::String).with_validator(|v| match v.as_str() {
            Some(s) if !s.is_empty() => Ok(()),
            _ => Err("must not be empty".to_string()),
        });

        assert!(matches!(
            spec.check(&Value::Integer(1), PortDirection::Input),
            Err(NodeError::InvalidType { .. })
        ));
        assert_eq!(
            spec.check(&Value::from(""), PortDirection::Input),
            Err(NodeError::Rejected {
                port: "prompt".into(),
                direction: PortDirection::Input,
                reason: "must not be empty".into(),
            })
        );
        assert!(spec.check(&Value::from("hi"), PortDirection::Input).is_ok());
    }

    #[test]
    fn panicking_validator_is_a_rejection() {
        let spec = PortSpec::new("x", DataType::Integer).with_validator(|_| panic!("boom"));
        let err = spec.check(&Value::Integer(1), PortDirection::Input).unwrap_err();
        assert!(matches!(err, NodeError::Rejected { ref port, .. } if port == "x"));
    }

    #[test]
    fn missing_required_port_is_named() {
        let specs = vec![
            PortSpec::new("text", DataType::String),
            PortSpec::new("voice", DataType::String).optional(),
        ];
        let values = PortValues::new();

        let err = validate_ports(&values, &specs, PortDirection::Output).unwrap_err();
        assert_eq!(err.to_string(), "Required output port 'text' has no value");
    }

    #[test]
    fn optional_ports_may_be_absent() {
        let specs = vec![PortSpec::new("voice", DataType::String).optional()];
        assert!(validate_ports(&PortValues::new(), &specs, PortDirection::Input).is_ok());
    }

    #[test]
    fn port_spec_deserializes_with_required_default() {
        let spec: PortSpec =
            serde_json::from_str(r#"{"name": "max_tokens", "data_type": "integer", "default_value": 100}"#)
                .unwrap();
        assert!(spec.required);
        assert_eq!(spec.default_value, Some(Value::Integer(100)));
        assert!(spec.validator.is_none());
    }
}
