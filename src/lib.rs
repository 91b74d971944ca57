//! # mockwire
//!
//! Declarative HTTP request mocking with test-suite lifecycle integration.
//!
//! ## Overview
//!
//! A test file declares the endpoints it needs as a list of
//! [`HandlerSpec`]s — a path, an optional method (default `GET`), and a
//! responder producing the mock payload. The crate compiles that list into
//! a [`MockRequestRegistry`] and serves it from an [`InterceptionServer`]
//! on a random loopback port; the code under test takes the server's base
//! URL instead of a real endpoint.
//!
//! Test isolation is guaranteed by three lifecycle moments, expressed as
//! explicit guards rather than ambient hooks (see [`lifecycle`]):
//! interception starts before the first test needs it, every guard drop
//! resets the handler set to exactly the declared baseline (discarding ad
//! hoc overrides and call counters), and the server closes when the last
//! guard is gone.
//!
//! ## Quick start
//!
//! ```no_run
//! use mockwire::{HandlerSpec, mock_suite};
//! use serde_json::json;
//!
//! mock_suite! {
//!     fn api_server() {
//!         HandlerSpec::get("/api/user", |_req| {
//!             json!({"user": {"id": 3, "email": "a@b.com"}})
//!         })
//!         .expect("valid spec"),
//!         HandlerSpec::get("/api/repositories", |req| {
//!             let language = req
//!                 .query_param("q")
//!                 .and_then(|q| q.split_once("language:"))
//!                 .map(|(_, language)| language)
//!                 .unwrap_or("unknown");
//!             json!({"items": [{"id": 1, "full_name": format!("{language}_one")}]})
//!         })
//!         .expect("valid spec"),
//!     }
//! }
//!
//! #[tokio::test]
//! async fn fetches_the_mocked_user() {
//!     let server = api_server();
//!
//!     let body: serde_json::Value = reqwest::get(server.url("/api/user"))
//!         .await
//!         .unwrap()
//!         .json()
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(body["user"]["id"], 3);
//! }
//! ```
//!
//! ## Dispatch semantics
//!
//! Requests match registered specs by exact, case-sensitive (method, path)
//! equality; query strings never participate in matching and are handed to
//! the responder instead. Duplicate (method, path) registrations are legal
//! and the later declaration wins. Responders may be asynchronous; the
//! dispatch awaits them. A responder error surfaces as a `500` response
//! carrying the message. Requests nothing matches hit the registry's
//! [`UnmatchedPolicy`] — a hard `501` diagnostic by default, because a
//! test double that silently invents responses hides real bugs.
//!
//! ## Modules
//!
//! - [`handler`]: [`HandlerSpec`] and the [`Responder`] trait
//! - [`registry`]: [`MockRequestRegistry`], call records, unmatched policy
//! - [`server`]: [`InterceptionServer`] loopback serving
//! - [`lifecycle`]: suite guards and the [`mock_suite!`] macro
//! - [`request`] / [`response`]: the descriptor and payload types
//! - [`assertions`]: response, JSON, and call-count assertions
//! - [`logging`]: tracing setup for tests

pub mod assertions;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod logging;
pub mod registry;
pub mod request;
pub mod response;
pub mod server;

pub use error::{RegistryError, ResponderError};
pub use handler::{HandlerSpec, Responder};
pub use lifecycle::{ServerGuard, SuiteCell, SuiteSpecs, acquire_server};
pub use registry::{CallRecord, MockRequestRegistry, UnmatchedPolicy};
pub use request::RequestDescriptor;
pub use response::MockResponse;
pub use server::InterceptionServer;

/// Re-export of commonly used items for test files.
pub mod prelude {
	pub use super::assertions::{
		assert_called_times, assert_called_with_query, assert_has_header, assert_header_equals,
		assert_json_array_len, assert_json_field_eq, assert_json_matches, assert_status,
		extract_json,
	};
	pub use super::error::{RegistryError, ResponderError};
	pub use super::handler::{HandlerSpec, Responder};
	pub use super::lifecycle::{ServerGuard, SuiteCell, SuiteSpecs, acquire_server};
	pub use super::logging::init_test_logging;
	pub use super::registry::{CallRecord, MockRequestRegistry, UnmatchedPolicy};
	pub use super::request::RequestDescriptor;
	pub use super::response::MockResponse;
	pub use super::server::InterceptionServer;
}
