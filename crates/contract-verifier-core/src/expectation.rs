// crates/contract-verifier-core/src/expectation.rs
// ============================================================================
// Module: Contract Expectations
// Description: Validated description of a single HTTP contract check.
// Purpose: Reject malformed checks before any request is issued.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! An [`Expectation`] names one HTTP call (method, path, query) and what the
//! mock endpoint must answer (status, body shape, minimum latency). It is
//! built either through [`ExpectationBuilder`] or by deserializing an
//! [`ExpectationSpec`]; both paths share the same validation, so an invalid
//! expectation cannot exist as a value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::matcher::BodyMatcher;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Programmer errors in an expectation definition.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpectationError {
    /// Method was empty.
    #[error("expectation method is missing")]
    MissingMethod,
    /// Method is not a supported HTTP verb.
    #[error("unsupported http method: {0}")]
    InvalidMethod(String),
    /// Path was empty.
    #[error("expectation path is missing")]
    MissingPath,
    /// Path does not start with `/`.
    #[error("expectation path must start with '/': {0}")]
    RelativePath(String),
    /// Path carries its own query string or fragment.
    #[error("expectation path must not embed a query or fragment: {0}")]
    EmbeddedQuery(String),
    /// Expected status is outside the HTTP status range.
    #[error("expected status {0} is outside 100..=599")]
    InvalidStatus(u16),
    /// Minimum duration was zero.
    #[error("minimum duration must be greater than zero")]
    ZeroMinDuration,
    /// Request header name or value cannot be sent on the wire.
    #[error("invalid request header {name:?}: {reason}")]
    InvalidHeader {
        /// Header name as declared.
        name: String,
        /// Which rule the header broke.
        reason: &'static str,
    },
    /// JSON pointer in a body matcher is malformed.
    #[error("json pointer must be empty or start with '/': {0}")]
    InvalidPointer(String),
    /// Array length is smaller than the number of per-item matchers.
    #[error("item count {len} is smaller than the {items} item matchers")]
    InconsistentItems {
        /// Declared array length.
        len: usize,
        /// Number of per-item matchers.
        items: usize,
    },
}

// ============================================================================
// SECTION: HTTP Method
// ============================================================================

/// HTTP methods supported by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// Returns the canonical upper-case method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ExpectationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExpectationError::MissingMethod);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(ExpectationError::InvalidMethod(trimmed.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Wire Form
// ============================================================================

/// Unvalidated wire form of an expectation, as written in fixture tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectationSpec {
    /// Optional label used in reports; defaults to `METHOD path?query`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// HTTP method token.
    pub method: String,
    /// Request path relative to the mock endpoint base URL.
    pub path: String,
    /// Query parameters appended to the request URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    /// Extra request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Optional JSON request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Expected status code; any 2xx is accepted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Response body matcher.
    #[serde(default)]
    pub matcher: BodyMatcher,
    /// Minimum wall-clock duration of the call, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_ms: Option<u64>,
}

impl ExpectationSpec {
    /// Creates a wire form with the given method and path and no constraints.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: None,
            method: method.into(),
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
            status: None,
            matcher: BodyMatcher::Any,
            min_duration_ms: None,
        }
    }
}

// ============================================================================
// SECTION: Expectation
// ============================================================================

/// A validated, immutable HTTP contract check.
///
/// # Invariants
/// - `path` is non-empty, starts with `/`, and carries no query or fragment.
/// - `status`, when set, is within `100..=599`.
/// - `min_duration_ms`, when set, is greater than zero.
/// - The body matcher has passed [`BodyMatcher::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExpectationSpec", into = "ExpectationSpec")]
pub struct Expectation {
    /// Report label.
    name: String,
    /// HTTP method.
    method: HttpMethod,
    /// Request path.
    path: String,
    /// Query parameters.
    query: BTreeMap<String, String>,
    /// Extra request headers.
    headers: BTreeMap<String, String>,
    /// Optional JSON request body.
    body: Option<Value>,
    /// Expected status code.
    status: Option<u16>,
    /// Response body matcher.
    matcher: BodyMatcher,
    /// Minimum duration in milliseconds.
    min_duration_ms: Option<u64>,
}

impl Expectation {
    /// Starts building an expectation for the given method and path.
    #[must_use]
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            spec: ExpectationSpec::new(method.as_str(), path),
        }
    }

    /// Returns the report label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query parameters in deterministic order.
    #[must_use]
    pub const fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Returns the extra request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Returns the JSON request body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the expected status code, if declared.
    #[must_use]
    pub const fn expected_status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the response body matcher.
    #[must_use]
    pub const fn matcher(&self) -> &BodyMatcher {
        &self.matcher
    }

    /// Returns the minimum duration in milliseconds, if declared.
    #[must_use]
    pub const fn min_duration_ms(&self) -> Option<u64> {
        self.min_duration_ms
    }

    /// Returns `METHOD path?query` for logs and reports.
    #[must_use]
    pub fn target(&self) -> String {
        request_target(self.method, &self.path, &self.query)
    }
}

impl TryFrom<ExpectationSpec> for Expectation {
    type Error = ExpectationError;

    fn try_from(spec: ExpectationSpec) -> Result<Self, Self::Error> {
        let method = HttpMethod::from_str(&spec.method)?;
        validate_path(&spec.path)?;
        if let Some(status) = spec.status
            && !(100 ..= 599).contains(&status)
        {
            return Err(ExpectationError::InvalidStatus(status));
        }
        if spec.min_duration_ms == Some(0) {
            return Err(ExpectationError::ZeroMinDuration);
        }
        for (name, value) in &spec.headers {
            validate_header(name, value)?;
        }
        spec.matcher.validate()?;
        let name = match spec.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => request_target(method, &spec.path, &spec.query),
        };
        Ok(Self {
            name,
            method,
            path: spec.path,
            query: spec.query,
            headers: spec.headers,
            body: spec.body,
            status: spec.status,
            matcher: spec.matcher,
            min_duration_ms: spec.min_duration_ms,
        })
    }
}

impl From<Expectation> for ExpectationSpec {
    fn from(expectation: Expectation) -> Self {
        Self {
            name: Some(expectation.name),
            method: expectation.method.as_str().to_string(),
            path: expectation.path,
            query: expectation.query,
            headers: expectation.headers,
            body: expectation.body,
            status: expectation.status,
            matcher: expectation.matcher,
            min_duration_ms: expectation.min_duration_ms,
        }
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for [`Expectation`]; validation happens in [`Self::build`].
#[derive(Debug, Clone)]
pub struct ExpectationBuilder {
    /// Accumulated wire form.
    spec: ExpectationSpec,
}

impl ExpectationBuilder {
    /// Sets the report label.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.spec.name = Some(name.into());
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.query.insert(key.into(), value.into());
        self
    }

    /// Adds a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.headers.insert(name.into(), value.into());
        self
    }

    /// Sets a JSON request body.
    #[must_use]
    pub fn json_body(mut self, body: Value) -> Self {
        self.spec.body = Some(body);
        self
    }

    /// Sets the expected status code.
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.spec.status = Some(status);
        self
    }

    /// Sets the response body matcher.
    #[must_use]
    pub fn matcher(mut self, matcher: BodyMatcher) -> Self {
        self.spec.matcher = matcher;
        self
    }

    /// Sets the minimum call duration in milliseconds.
    #[must_use]
    pub fn min_duration_ms(mut self, millis: u64) -> Self {
        self.spec.min_duration_ms = Some(millis);
        self
    }

    /// Validates and builds the expectation.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectationError`] when the path, status, duration, a header,
    /// or the body matcher is malformed.
    pub fn build(self) -> Result<Expectation, ExpectationError> {
        Expectation::try_from(self.spec)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the request path shape.
fn validate_path(path: &str) -> Result<(), ExpectationError> {
    if path.trim().is_empty() {
        return Err(ExpectationError::MissingPath);
    }
    if !path.starts_with('/') {
        return Err(ExpectationError::RelativePath(path.to_string()));
    }
    if path.contains('?') || path.contains('#') {
        return Err(ExpectationError::EmbeddedQuery(path.to_string()));
    }
    Ok(())
}

/// Validates a header against the HTTP/1.1 field grammar.
///
/// Names must be non-empty tokens. Values may hold visible ASCII, spaces, and
/// tabs only, so no header can smuggle a line break into the request.
fn validate_header(name: &str, value: &str) -> Result<(), ExpectationError> {
    let invalid = |reason| ExpectationError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if !name.bytes().all(is_token_byte) {
        return Err(invalid("name is not an http token"));
    }
    if !value.bytes().all(|byte| byte == b'\t' || (0x20 ..= 0x7e).contains(&byte)) {
        return Err(invalid("value contains control or non-ascii characters"));
    }
    Ok(())
}

/// Returns true for bytes allowed in an HTTP token (`tchar`).
const fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

/// Renders `METHOD path?k=v&...` without percent-encoding.
fn request_target(method: HttpMethod, path: &str, query: &BTreeMap<String, String>) -> String {
    if query.is_empty() {
        return format!("{method} {path}");
    }
    let pairs: Vec<String> = query.iter().map(|(key, value)| format!("{key}={value}")).collect();
    format!("{method} {path}?{}", pairs.join("&"))
}
