//! Parameter snapshots and validation against a field specification

use super::{MessageKind, MessageKindSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric value
    Number(f64),
    /// Token from an enumeration
    Token(String),
}

impl Value {
    /// Numeric value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Token(_) => None,
        }
    }

    /// Token text, if this is a token
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Token(t) => Some(t),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Token(t) => f.write_str(t),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(t: &str) -> Self {
        Self::Token(t.to_string())
    }
}

impl From<String> for Value {
    fn from(t: String) -> Self {
        Self::Token(t)
    }
}

/// Current parameter values keyed by field key.
///
/// Keys the active device does not declare are carried along and ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSnapshot {
    values: BTreeMap<String, Value>,
}

impl ParameterSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a value, returning the previous one
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.to_string(), value.into())
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the snapshot holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over key/value pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay another snapshot's values on top of this one
    #[must_use]
    pub fn merged(mut self, overrides: &ParameterSnapshot) -> Self {
        for (key, value) in &overrides.values {
            self.values.insert(key.clone(), value.clone());
        }
        self
    }
}

impl FromIterator<(String, Value)> for ParameterSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Why a value was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationReason {
    /// Required field absent from the snapshot
    #[error("required field is missing")]
    Missing,

    /// Token given where a number is expected
    #[error("expected a number, got '{0}'")]
    ExpectedNumber(String),

    /// Number given where a token is expected
    #[error("expected a token, got number {0}")]
    ExpectedToken(f64),

    /// Token outside the enumeration
    #[error("'{token}' is not one of {allowed:?}")]
    NotInEnumeration {
        /// Offending token
        token: String,
        /// Allowed tokens
        allowed: Vec<String>,
    },

    /// Number outside the range
    #[error("{value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Offending value
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// NaN or infinity
    #[error("value is not a finite number")]
    NotFinite,

    /// Key not declared by the device
    #[error("not a field of the {0} device")]
    UnknownField(MessageKind),

    /// Assignment text without `=`
    #[error("expected key=value")]
    Malformed,
}

/// A snapshot value failed its field specification
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid value for '{key}': {reason}")]
pub struct ValidationError {
    /// Field key
    pub key: String,
    /// What was wrong
    pub reason: ValidationReason,
}

/// Check every declared field of `spec` against `snapshot`.
///
/// Fields are checked in declaration order and the first failure is
/// returned. Keys not declared by `spec` are ignored.
pub fn validate(spec: &MessageKindSpec, snapshot: &ParameterSnapshot) -> Result<(), ValidationError> {
    for field in spec.fields {
        let value = snapshot.get(field.key).ok_or_else(|| ValidationError {
            key: field.key.to_string(),
            reason: ValidationReason::Missing,
        })?;
        field.domain.check(value).map_err(|reason| ValidationError {
            key: field.key.to_string(),
            reason,
        })?;
    }
    Ok(())
}
