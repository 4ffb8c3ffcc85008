// system-tests/src/library_mock.rs
// ============================================================================
// Module: Library API Mock
// Description: In-process HTTP fake serving the Library API contract.
// Purpose: Exercise contract suites without a container runtime.
// Dependencies: contract-verifier, tiny_http, serde_json, url
// ============================================================================

//! ## Overview
//! [`LibraryMockServer`] answers the same routes as the Library API mock
//! published by Microcks, under the same `/rest/Library+API/1.0.0` prefix:
//! - `GET /books` lists two books.
//! - `GET /books/{id}` returns book 1 or 2, or a 404 error body, after the
//!   configured operation delay.
//! - `DELETE /books/{id}` answers 204 for books 1 and 2.
//! - `GET /books/latest` returns a templated body whose values change per call.
//!
//! Requests are served one at a time on a background thread.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use contract_verifier::MockEndpointResolver;
use contract_verifier::ResolveError;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Method;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path prefix Microcks uses for the Library API 1.0.0 REST mock.
pub const LIBRARY_API_PREFIX: &str = "/rest/Library+API/1.0.0";

/// Delay configured on `GET /books/{id}`.
pub const BOOK_LOOKUP_DELAY: Duration = Duration::from_millis(3_000);

// ============================================================================
// SECTION: Server
// ============================================================================

/// In-process Library API mock.
///
/// # Invariants
/// - The worker thread stops when the server is dropped.
pub struct LibraryMockServer {
    /// Bound server.
    server: Arc<Server>,
    /// Mock base URL including the API prefix.
    base_url: Url,
    /// Worker thread.
    handle: Option<JoinHandle<()>>,
}

impl LibraryMockServer {
    /// Starts the mock with the contract's 3000 ms lookup delay.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Provider`] when no local port can be bound.
    pub fn start() -> Result<Self, ResolveError> {
        Self::start_with_delay(BOOK_LOOKUP_DELAY)
    }

    /// Starts the mock with a custom lookup delay.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Provider`] when no local port can be bound.
    pub fn start_with_delay(lookup_delay: Duration) -> Result<Self, ResolveError> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|err| ResolveError::Provider(format!("library mock bind failed: {err}")))?;
        let addr = server.server_addr().to_ip().ok_or_else(|| {
            ResolveError::Provider("library mock is not bound to an ip address".to_string())
        })?;
        let base_url = Url::parse(&format!("http://{addr}{LIBRARY_API_PREFIX}"))
            .map_err(|err| ResolveError::InvalidUrl(err.to_string()))?;
        let server = Arc::new(server);
        let worker = Arc::clone(&server);
        let handle = thread::spawn(move || serve(&worker, lookup_delay));
        Ok(Self {
            server,
            base_url,
            handle: Some(handle),
        })
    }

    /// Returns the mock base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl MockEndpointResolver for LibraryMockServer {
    fn resolve(&self) -> Result<Url, ResolveError> {
        Ok(self.base_url.clone())
    }
}

impl Drop for LibraryMockServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// ============================================================================
// SECTION: Routing
// ============================================================================

/// Canned reply.
enum Reply {
    /// JSON body with a status.
    Json(u16, Value),
    /// Status with no body.
    Empty(u16),
}

/// Serves requests until the server is unblocked.
fn serve(server: &Server, lookup_delay: Duration) {
    let counter = AtomicU64::new(0);
    for request in server.incoming_requests() {
        let reply = route(&request, lookup_delay, &counter);
        respond(request, reply);
    }
}

/// Resolves a request to its reply, sleeping for delayed operations.
fn route(request: &Request, lookup_delay: Duration, counter: &AtomicU64) -> Reply {
    let target = request.url();
    let path = target.split('?').next().unwrap_or(target);
    let Some(path) = path.strip_prefix(LIBRARY_API_PREFIX) else {
        return Reply::Empty(404);
    };
    match (request.method(), path) {
        (Method::Get, "/books") => Reply::Json(200, json!([book("1"), book("2")])),
        (Method::Get, "/books/latest") => {
            Reply::Json(200, latest_book(counter.fetch_add(1, Ordering::Relaxed)))
        }
        (Method::Get, path) if path.starts_with("/books/") => {
            thread::sleep(lookup_delay);
            match path.trim_start_matches("/books/") {
                id @ ("1" | "2") => Reply::Json(200, book(id)),
                _ => Reply::Json(404, json!({"message": "Book not found"})),
            }
        }
        (Method::Delete, path) if path.starts_with("/books/") => {
            match path.trim_start_matches("/books/") {
                "1" | "2" => Reply::Empty(204),
                _ => Reply::Json(404, json!({"message": "Book not found"})),
            }
        }
        _ => Reply::Empty(404),
    }
}

/// Writes a reply, ignoring clients that have gone away.
fn respond(request: Request, reply: Reply) {
    match reply {
        Reply::Json(status, body) => {
            let mut response = Response::from_string(body.to_string()).with_status_code(status);
            if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
                response = response.with_header(header);
            }
            let _ = request.respond(response);
        }
        Reply::Empty(status) => {
            let _ = request.respond(Response::empty(status));
        }
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Returns the catalogue entry for `id`.
fn book(id: &str) -> Value {
    match id {
        "1" => json!({"id": "1", "title": "The Hobbit", "author": "J.R.R. Tolkien", "year": 1937}),
        _ => json!({"id": "2", "title": "1984", "author": "George Orwell", "year": 1949}),
    }
}

/// Renders the templated `/books/latest` body.
fn latest_book(sequence: u64) -> Value {
    let now_ms = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    let cities = ["Brussels", "Ghent", "Antwerp", "Leuven"];
    let city = cities.get(usize::try_from(sequence % 4).unwrap_or(0)).copied().unwrap_or("Liege");
    json!({
        "id": format!("{now_ms:x}-{sequence}"),
        "author": "J.R.R. Tolkien",
        "serverTime": now_ms.to_string(),
        "dynamicValues": {
            "randomEmail": format!("reader{sequence}@library.test"),
            "randomCity": city,
            "randomPhoneNumber": format!("+32 470 {:06}", now_ms % 1_000_000),
            "randomBoolean": sequence % 2 == 0,
            "randomString": format!("{:016x}", now_ms.wrapping_mul(0x9e37_79b9_7f4a_7c15)),
        }
    })
}
