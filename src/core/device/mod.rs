//! Simulated talker devices
//!
//! Each [`MessageKind`] owns a static [`MessageKindSpec`]: the ordered list of
//! input fields a caller must supply and the domain each value must lie in.
//! The registry is read-only process-wide configuration.

mod snapshot;

pub use snapshot::{validate, ParameterSnapshot, ValidationError, ValidationReason, Value};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of simulated device, one wire message per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Magnetic compass repeater, `$HCHDT` sentence
    #[default]
    Compass,
    /// Echo-sounder repeater, `$SDDBT` sentence
    Sonar,
    /// Orientation sensor, binary frame
    Sensor,
}

impl MessageKind {
    /// All kinds, in selection order
    pub fn all() -> &'static [MessageKind] {
        &[MessageKind::Compass, MessageKind::Sonar, MessageKind::Sensor]
    }

    /// Short identifier used in configuration and on the command line
    pub fn name(self) -> &'static str {
        match self {
            Self::Compass => "compass",
            Self::Sonar => "sonar",
            Self::Sensor => "sensor",
        }
    }

    /// Field specification of this kind
    pub fn spec(self) -> &'static MessageKindSpec {
        match self {
            Self::Compass => &COMPASS,
            Self::Sonar => &SONAR,
            Self::Sensor => &SENSOR,
        }
    }

    /// The kind after this one, wrapping around
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Compass => Self::Sonar,
            Self::Sonar => Self::Sensor,
            Self::Sensor => Self::Compass,
        }
    }

    /// Whether this kind produces a binary frame rather than a sentence
    pub fn is_binary(self) -> bool {
        matches!(self, Self::Sensor)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compass" | "kf1" | "hdt" => Ok(Self::Compass),
            "sonar" | "nel" | "dbt" => Ok(Self::Sonar),
            "sensor" | "hmr" => Ok(Self::Sensor),
            other => Err(format!(
                "unknown device '{other}' (expected compass, sonar or sensor)"
            )),
        }
    }
}

/// Valid values of a field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Domain {
    /// One of a fixed, ordered set of tokens
    Enumeration {
        /// Allowed tokens
        tokens: &'static [&'static str],
    },
    /// A number within `[min, max]`
    Range {
        /// Lower bound, inclusive
        min: f64,
        /// Upper bound, inclusive
        max: f64,
        /// Decimal places the value is edited with
        decimals: u32,
    },
}

impl Domain {
    /// Whether values of this domain carry a fractional part
    pub fn is_fractional(&self) -> bool {
        matches!(self, Self::Range { decimals, .. } if *decimals > 0)
    }

    /// Initial value shown for this domain: first token or range minimum
    pub fn initial_value(&self) -> Value {
        match self {
            Self::Enumeration { tokens } => Value::Token(tokens.first().copied().unwrap_or_default().to_string()),
            Self::Range { min, .. } => Value::Number(*min),
        }
    }

    /// Check a value against the domain
    pub fn check(&self, value: &Value) -> Result<(), ValidationReason> {
        match (self, value) {
            (Self::Enumeration { tokens }, Value::Token(token)) => {
                if tokens.contains(&token.as_str()) {
                    Ok(())
                } else {
                    Err(ValidationReason::NotInEnumeration {
                        token: token.clone(),
                        allowed: tokens.iter().map(|t| (*t).to_string()).collect(),
                    })
                }
            }
            (Self::Enumeration { .. }, Value::Number(n)) => {
                Err(ValidationReason::ExpectedToken(*n))
            }
            (Self::Range { min, max, .. }, Value::Number(n)) => {
                if !n.is_finite() {
                    Err(ValidationReason::NotFinite)
                } else if n < min || n > max {
                    Err(ValidationReason::OutOfRange {
                        value: *n,
                        min: *min,
                        max: *max,
                    })
                } else {
                    Ok(())
                }
            }
            (Self::Range { .. }, Value::Token(token)) => {
                Err(ValidationReason::ExpectedNumber(token.clone()))
            }
        }
    }

    /// Parse raw text (from a command line or form) into a value of this domain
    pub fn parse(&self, raw: &str) -> Result<Value, ValidationReason> {
        let raw = raw.trim();
        match self {
            Self::Enumeration { .. } => Ok(Value::Token(raw.to_string())),
            Self::Range { .. } => raw
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| ValidationReason::ExpectedNumber(raw.to_string())),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enumeration { tokens } => write!(f, "{{{}}}", tokens.join(", ")),
            Self::Range { min, max, decimals } => {
                let precision = *decimals as usize;
                write!(f, "[{min:.precision$} .. {max:.precision$}]")
            }
        }
    }
}

/// One input field of a device
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Snapshot key
    pub key: &'static str,
    /// Human-readable label
    pub label: &'static str,
    /// Valid values
    pub domain: Domain,
}

/// Field specification of one device kind
#[derive(Debug, PartialEq, Serialize)]
pub struct MessageKindSpec {
    /// Device kind
    pub kind: MessageKind,
    /// Display name
    pub name: &'static str,
    /// Input fields in declaration order; keys are unique
    pub fields: &'static [FieldSpec],
}

impl MessageKindSpec {
    /// Look up a field by key
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Field keys in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.key)
    }

    /// Validate a snapshot against this specification
    pub fn validate(&self, snapshot: &ParameterSnapshot) -> Result<(), ValidationError> {
        validate(self, snapshot)
    }

    /// Snapshot holding the initial value of every field
    pub fn default_snapshot(&self) -> ParameterSnapshot {
        self.fields
            .iter()
            .map(|f| (f.key.to_string(), f.domain.initial_value()))
            .collect()
    }

    /// Parse a `key=value` assignment for one of this kind's fields
    pub fn parse_assignment(&self, assignment: &str) -> Result<(String, Value), ValidationError> {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| ValidationError {
            key: assignment.to_string(),
            reason: ValidationReason::Malformed,
        })?;
        let key = key.trim();
        let field = self.field(key).ok_or_else(|| ValidationError {
            key: key.to_string(),
            reason: ValidationReason::UnknownField(self.kind),
        })?;
        let value = field.domain.parse(raw).map_err(|reason| ValidationError {
            key: key.to_string(),
            reason,
        })?;
        Ok((key.to_string(), value))
    }
}

const ANGLE_RANGE: Domain = Domain::Range {
    min: -90.0,
    max: 90.0,
    decimals: 1,
};

const HEADING_RANGE: Domain = Domain::Range {
    min: 0.0,
    max: 359.9,
    decimals: 1,
};

const FIELD_RANGE: Domain = Domain::Range {
    min: -75.0,
    max: 75.0,
    decimals: 1,
};

static COMPASS: MessageKindSpec = MessageKindSpec {
    kind: MessageKind::Compass,
    name: "KF1 compass repeater",
    fields: &[
        FieldSpec {
            key: "id",
            label: "identifier",
            domain: Domain::Enumeration { tokens: &["HCHDT"] },
        },
        FieldSpec {
            key: "heading",
            label: "heading, deg",
            domain: HEADING_RANGE,
        },
        FieldSpec {
            key: "power",
            label: "power",
            domain: Domain::Enumeration { tokens: &["T", "N"] },
        },
    ],
};

static SONAR: MessageKindSpec = MessageKindSpec {
    kind: MessageKind::Sonar,
    name: "NEL echo-sounder repeater",
    fields: &[
        FieldSpec {
            key: "id",
            label: "identifier",
            domain: Domain::Enumeration { tokens: &["SDDBT"] },
        },
        FieldSpec {
            key: "depth",
            label: "depth, m",
            domain: Domain::Range {
                min: 0.0,
                max: 9999.9,
                decimals: 1,
            },
        },
        FieldSpec {
            key: "danger",
            label: "danger depth, m",
            domain: Domain::Range {
                min: 0.0,
                max: 99.0,
                decimals: 0,
            },
        },
        FieldSpec {
            key: "accuracy",
            label: "status",
            domain: Domain::Enumeration { tokens: &["V", "A"] },
        },
    ],
};

static SENSOR: MessageKindSpec = MessageKindSpec {
    kind: MessageKind::Sensor,
    name: "HMR orientation sensor",
    fields: &[
        FieldSpec {
            key: "roll",
            label: "roll, deg",
            domain: ANGLE_RANGE,
        },
        FieldSpec {
            key: "pitch",
            label: "pitch, deg",
            domain: ANGLE_RANGE,
        },
        FieldSpec {
            key: "heading",
            label: "heading, deg",
            domain: HEADING_RANGE,
        },
        FieldSpec {
            key: "magc",
            label: "magnetic C",
            domain: FIELD_RANGE,
        },
        FieldSpec {
            key: "magb",
            label: "magnetic B",
            domain: FIELD_RANGE,
        },
        FieldSpec {
            key: "magz",
            label: "magnetic Z",
            domain: FIELD_RANGE,
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_unique_per_kind() {
        for kind in MessageKind::all() {
            let spec = kind.spec();
            let keys: HashSet<_> = spec.keys().collect();
            assert_eq!(keys.len(), spec.fields.len(), "duplicate key in {kind}");
            assert_eq!(spec.kind, *kind);
        }
    }

    #[test]
    fn test_next_cycles_through_all() {
        let mut kind = MessageKind::Compass;
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(kind);
            kind = kind.next();
        }
        assert_eq!(kind, MessageKind::Compass);
        assert_eq!(seen, MessageKind::all());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Compass".parse::<MessageKind>(), Ok(MessageKind::Compass));
        assert_eq!("dbt".parse::<MessageKind>(), Ok(MessageKind::Sonar));
        assert_eq!("hmr".parse::<MessageKind>(), Ok(MessageKind::Sensor));
        assert!("radar".parse::<MessageKind>().is_err());
    }

    #[test]
    fn test_default_snapshot_is_valid() {
        for kind in MessageKind::all() {
            let spec = kind.spec();
            let snapshot = spec.default_snapshot();
            assert_eq!(snapshot.len(), spec.fields.len());
            assert!(spec.validate(&snapshot).is_ok(), "{kind} defaults invalid");
        }
        let compass = MessageKind::Compass.spec().default_snapshot();
        assert_eq!(compass.get("id"), Some(&Value::from("HCHDT")));
        assert_eq!(compass.get("heading"), Some(&Value::Number(0.0)));
        assert_eq!(compass.get("power"), Some(&Value::from("T")));
    }

    #[test]
    fn test_parse_assignment() {
        let spec = MessageKind::Compass.spec();
        assert_eq!(
            spec.parse_assignment("heading=12.5").unwrap(),
            ("heading".to_string(), Value::Number(12.5))
        );
        assert_eq!(
            spec.parse_assignment("power = N").unwrap(),
            ("power".to_string(), Value::from("N"))
        );

        let err = spec.parse_assignment("heading=north").unwrap_err();
        assert_eq!(err.key, "heading");
        assert!(matches!(err.reason, ValidationReason::ExpectedNumber(_)));

        let err = spec.parse_assignment("depth=3").unwrap_err();
        assert!(matches!(err.reason, ValidationReason::UnknownField(MessageKind::Compass)));

        let err = spec.parse_assignment("heading").unwrap_err();
        assert_eq!(err.reason, ValidationReason::Malformed);
    }

    #[test]
    fn test_domain_display() {
        let spec = MessageKind::Sonar.spec();
        assert_eq!(spec.field("depth").unwrap().domain.to_string(), "[0.0 .. 9999.9]");
        assert_eq!(spec.field("danger").unwrap().domain.to_string(), "[0 .. 99]");
        assert_eq!(spec.field("accuracy").unwrap().domain.to_string(), "{V, A}");
    }

    #[test]
    fn test_fractional_domains() {
        let sonar = MessageKind::Sonar.spec();
        assert!(sonar.field("depth").unwrap().domain.is_fractional());
        assert!(!sonar.field("danger").unwrap().domain.is_fractional());
        assert!(!sonar.field("id").unwrap().domain.is_fractional());
    }
}
