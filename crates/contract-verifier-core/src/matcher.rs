// crates/contract-verifier-core/src/matcher.rs
// ============================================================================
// Module: Body Matchers
// Description: Field, shape, and array predicates over response bodies.
// Purpose: Turn a response body into a deterministic list of mismatches.
// Dependencies: serde, serde_json, bigdecimal
// ============================================================================

//! ## Overview
//! A [`BodyMatcher`] constrains a response body. Field matchers require each
//! declared field to be present with the declared value and ignore extra
//! fields. Shape predicates ([`BodyMatcher::Keys`]) only require key presence,
//! which is how templated values (random emails, cities, timestamps) are
//! checked. Evaluation never stops at the first problem: every mismatch is
//! reported with its location.
//!
//! Locations use a `$` root followed by RFC 6901 pointer segments, for example
//! `$/0/title` or `$/dynamicValues`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;

use crate::expectation::ExpectationError;
use crate::outcome::ResponseBody;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Predicate over a response body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyMatcher {
    /// No constraint on the body.
    #[default]
    Any,
    /// The body must be empty.
    Empty,
    /// Object containing each field with the given value; extra fields ignored.
    Fields {
        /// Required field values.
        fields: BTreeMap<String, Value>,
    },
    /// Object containing each key; values are unconstrained.
    Keys {
        /// Required keys.
        keys: Vec<String>,
    },
    /// Array, optionally of exact length, whose leading items match in order.
    Items {
        /// Exact array length, when constrained.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        len: Option<usize>,
        /// Matchers for the leading items.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        items: Vec<BodyMatcher>,
    },
    /// Nested matcher applied at a JSON pointer.
    At {
        /// RFC 6901 JSON pointer.
        pointer: String,
        /// Matcher applied to the value at `pointer`.
        matcher: Box<BodyMatcher>,
    },
    /// Every matcher must hold.
    All {
        /// Conjoined matchers.
        matchers: Vec<BodyMatcher>,
    },
}

/// A single body mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyMismatch {
    /// Location of the mismatch (`$` root plus pointer segments).
    pub location: String,
    /// Human-readable description.
    pub detail: String,
}

impl fmt::Display for BodyMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.detail)
    }
}

// ============================================================================
// SECTION: Constructors
// ============================================================================

impl BodyMatcher {
    /// Builds a field matcher from `(name, value)` pairs.
    #[must_use]
    pub fn fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Fields {
            fields: fields.into_iter().map(|(key, value)| (key.into(), value)).collect(),
        }
    }

    /// Builds a key-presence matcher.
    #[must_use]
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keys {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds an array matcher.
    #[must_use]
    pub const fn items(len: Option<usize>, items: Vec<Self>) -> Self {
        Self::Items {
            len,
            items,
        }
    }

    /// Applies `matcher` at the given JSON pointer.
    #[must_use]
    pub fn at(pointer: impl Into<String>, matcher: Self) -> Self {
        Self::At {
            pointer: pointer.into(),
            matcher: Box::new(matcher),
        }
    }

    /// Conjoins matchers.
    #[must_use]
    pub const fn all(matchers: Vec<Self>) -> Self {
        Self::All {
            matchers,
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl BodyMatcher {
    /// Validates pointers and array constraints recursively.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectationError`] when a pointer does not start with `/` or
    /// an exact length is smaller than the number of item matchers.
    pub fn validate(&self) -> Result<(), ExpectationError> {
        match self {
            Self::Any | Self::Empty | Self::Fields { .. } | Self::Keys { .. } => Ok(()),
            Self::Items {
                len,
                items,
            } => {
                if let Some(len) = len
                    && *len < items.len()
                {
                    return Err(ExpectationError::InconsistentItems {
                        len: *len,
                        items: items.len(),
                    });
                }
                items.iter().try_for_each(Self::validate)
            }
            Self::At {
                pointer,
                matcher,
            } => {
                if !pointer.is_empty() && !pointer.starts_with('/') {
                    return Err(ExpectationError::InvalidPointer(pointer.clone()));
                }
                matcher.validate()
            }
            Self::All {
                matchers,
            } => matchers.iter().try_for_each(Self::validate),
        }
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

impl BodyMatcher {
    /// Evaluates the matcher against a response body.
    ///
    /// Returns every mismatch found; an empty list means the body matched.
    #[must_use]
    pub fn evaluate(&self, body: &ResponseBody) -> Vec<BodyMismatch> {
        let mut mismatches = Vec::new();
        match (self, body) {
            (Self::Any, _) => {}
            (Self::Empty, ResponseBody::Empty) => {}
            (Self::Empty, _) => push(&mut mismatches, ROOT, "expected an empty body".to_string()),
            (_, ResponseBody::Json(value)) => self.evaluate_value(value, ROOT, &mut mismatches),
            (_, ResponseBody::Empty) => {
                let reason = "expected a JSON body, found an empty body".to_string();
                push(&mut mismatches, ROOT, reason);
            }
            (_, ResponseBody::Text(_)) => {
                let reason = "expected a JSON body, found non-JSON text".to_string();
                push(&mut mismatches, ROOT, reason);
            }
        }
        mismatches
    }

    /// Evaluates the matcher against a JSON value at `location`.
    fn evaluate_value(&self, value: &Value, location: &str, out: &mut Vec<BodyMismatch>) {
        match self {
            Self::Any => {}
            Self::Empty => {
                if !is_empty_value(value) {
                    push(out, location, format!("expected an empty value, found {value}"));
                }
            }
            Self::Fields {
                fields,
            } => {
                let Some(object) = value.as_object() else {
                    push(out, location, format!("expected an object, found {}", kind_of(value)));
                    return;
                };
                for (key, expected) in fields {
                    let field_location = child(location, key);
                    match object.get(key) {
                        None => push(out, &field_location, "missing field".to_string()),
                        Some(actual) if !json_equals(actual, expected) => push(
                            out,
                            &field_location,
                            format!("expected {expected}, found {actual}"),
                        ),
                        Some(_) => {}
                    }
                }
            }
            Self::Keys {
                keys,
            } => {
                let Some(object) = value.as_object() else {
                    push(out, location, format!("expected an object, found {}", kind_of(value)));
                    return;
                };
                for key in keys {
                    if !object.contains_key(key) {
                        push(out, &child(location, key), "missing key".to_string());
                    }
                }
            }
            Self::Items {
                len,
                items,
            } => {
                let Some(array) = value.as_array() else {
                    push(out, location, format!("expected an array, found {}", kind_of(value)));
                    return;
                };
                if let Some(len) = len
                    && array.len() != *len
                {
                    push(out, location, format!("expected {len} items, found {}", array.len()));
                }
                for (index, matcher) in items.iter().enumerate() {
                    let item_location = child(location, &index.to_string());
                    match array.get(index) {
                        Some(item) => matcher.evaluate_value(item, &item_location, out),
                        None => push(out, &item_location, "missing item".to_string()),
                    }
                }
            }
            Self::At {
                pointer,
                matcher,
            } => {
                let nested_location = format!("{location}{pointer}");
                match value.pointer(pointer) {
                    Some(nested) => matcher.evaluate_value(nested, &nested_location, out),
                    None => push(out, &nested_location, "missing value".to_string()),
                }
            }
            Self::All {
                matchers,
            } => {
                for matcher in matchers {
                    matcher.evaluate_value(value, location, out);
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Root location label.
const ROOT: &str = "$";

/// Appends a mismatch.
fn push(out: &mut Vec<BodyMismatch>, location: &str, detail: String) {
    out.push(BodyMismatch {
        location: location.to_string(),
        detail,
    });
}

/// Appends an escaped pointer segment to a location.
fn child(location: &str, segment: &str) -> String {
    let escaped = segment.replace('~', "~0").replace('/', "~1");
    format!("{location}/{escaped}")
}

/// Returns true for JSON values that count as empty.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Names the JSON type of a value for mismatch messages.
const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Structural JSON equality with decimal-aware number comparison.
#[must_use]
pub fn json_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(left), Value::Number(right)) => numbers_equal(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right).all(|(left, right)| json_equals(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, left)| {
                    right.get(key).is_some_and(|right| json_equals(left, right))
                })
        }
        _ => actual == expected,
    }
}

/// Compares two JSON numbers by decimal value, so `1` equals `1.0`.
fn numbers_equal(left: &Number, right: &Number) -> bool {
    if left == right {
        return true;
    }
    match (BigDecimal::from_str(&left.to_string()), BigDecimal::from_str(&right.to_string())) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}
