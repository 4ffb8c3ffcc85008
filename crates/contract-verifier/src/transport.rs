// crates/contract-verifier/src/transport.rs
// ============================================================================
// Module: HTTP Transport
// Description: Blocking HTTP transport with bounded responses.
// Purpose: Issue one request per expectation and return raw status and bytes.
// Dependencies: reqwest, url, thiserror
// ============================================================================

//! ## Overview
//! [`HttpTransport`] is the seam between the verifier and the network. The
//! default [`ReqwestTransport`] uses a blocking `reqwest` client with a full
//! request timeout, redirects disabled by default, and a hard response-size
//! cap. Transport never retries: one call is one observation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use contract_verifier_core::HttpMethod;
use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

use crate::config::VerifierConfig;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Transport-level failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Request exceeded the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// Request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),
    /// Response body could not be read.
    #[error("failed to read response: {0}")]
    Read(String),
    /// Response body exceeded the size limit.
    #[error("response exceeds size limit of {0} bytes")]
    TooLarge(usize),
    /// Response body was shorter than its declared length.
    #[error("response truncated")]
    Truncated,
}

/// Fully resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Optional JSON request body.
    pub body: Option<Vec<u8>>,
}

/// Raw response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Status code.
    pub status: u16,
    /// Body bytes.
    pub body: Vec<u8>,
}

/// Sends prepared requests.
pub trait HttpTransport: Send + Sync {
    /// Sends a request and reads the full response body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the exchange does not complete.
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError>;
}

// ============================================================================
// SECTION: Reqwest Transport
// ============================================================================

/// Blocking `reqwest` transport.
///
/// # Invariants
/// - Every call is bounded by `timeout_ms`.
/// - Bodies larger than `max_response_bytes` fail closed.
pub struct ReqwestTransport {
    /// HTTP client used for outbound requests.
    client: Client,
    /// Maximum response size, in bytes.
    max_response_bytes: usize,
}

impl ReqwestTransport {
    /// Builds a transport from verifier configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] when the HTTP client cannot be created.
    pub fn new(config: &VerifierConfig) -> Result<Self, TransportError> {
        let redirect = if config.allow_redirects { Policy::limited(10) } else { Policy::none() };
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(redirect)
            .build()
            .map_err(|err| TransportError::Request(format!("http client build failed: {err}")))?;
        Ok(Self {
            client,
            max_response_bytes: config.max_response_bytes,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self.client.request(reqwest_method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body.clone());
        }
        let mut response = builder.send().map_err(|err| classify(&err))?;
        let status = response.status().as_u16();
        // HEAD responses advertise a length but never carry a body.
        let body = if request.method == HttpMethod::Head {
            Vec::new()
        } else {
            read_response_limited(&mut response, self.max_response_bytes)?
        };
        Ok(RawResponse {
            status,
            body,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps the verifier method onto a `reqwest` method.
fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
    }
}

/// Classifies a `reqwest` error.
fn classify(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, TransportError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| TransportError::Read("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(TransportError::TooLarge(max_bytes));
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle.read_to_end(&mut buf).map_err(|err| {
        if is_timeout(&err) {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Read(err.to_string())
        }
    })?;
    if buf.len() > max_bytes {
        return Err(TransportError::TooLarge(max_bytes));
    }
    if let Some(expected) = expected_len {
        let expected = usize::try_from(expected)
            .map_err(|_| TransportError::Read("invalid response length".to_string()))?;
        if buf.len() < expected {
            return Err(TransportError::Truncated);
        }
    }
    Ok(buf)
}

/// Returns true when an I/O error wraps a timeout.
fn is_timeout(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::TimedOut
        || err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout)
}
