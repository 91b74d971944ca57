//! Suite lifecycle binding for the interception server
//!
//! Rust test harnesses have no ambient `beforeAll`/`afterEach`/`afterAll`
//! registrar, so the three lifecycle moments are an explicit capability:
//!
//! - **before-all**: the first [`acquire_server`] call in a file starts the
//!   server from the suite's declared specs;
//! - **after-each**: every [`ServerGuard`] resets the registry when it
//!   drops, discarding runtime overrides and call records even if the test
//!   panicked;
//! - **after-all**: when the last guard drops, the shared server is dropped
//!   and closed.
//!
//! The sharing mechanics use the `OnceLock + Weak` pattern so the server is
//! started once and torn down when the last concurrent user finishes. When
//! tests run strictly serially the suite server is re-created per test; the
//! isolation contract holds either way.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mockwire::lifecycle::{ServerGuard, SuiteCell, SuiteSpecs, acquire_server};
//! use mockwire::HandlerSpec;
//! use serde_json::json;
//! use std::sync::OnceLock;
//!
//! struct UserApi;
//!
//! impl SuiteSpecs for UserApi {
//!     fn specs() -> Vec<HandlerSpec> {
//!         vec![
//!             HandlerSpec::get("/api/user", |_req| {
//!                 json!({"user": {"id": 3, "email": "a@b.com"}})
//!             })
//!             .expect("valid spec"),
//!         ]
//!     }
//! }
//!
//! static SUITE: SuiteCell = OnceLock::new();
//!
//! fn server() -> ServerGuard {
//!     acquire_server::<UserApi>(&SUITE)
//! }
//!
//! #[tokio::test]
//! async fn fetches_the_mocked_user() {
//!     let server = server();
//!     let body: serde_json::Value = reqwest::get(server.url("/api/user"))
//!         .await
//!         .unwrap()
//!         .json()
//!         .await
//!         .unwrap();
//!     assert_eq!(body["user"]["id"], 3);
//! }
//! ```

use crate::handler::HandlerSpec;
use crate::registry::{MockRequestRegistry, UnmatchedPolicy};
use crate::server::InterceptionServer;
use std::ops::Deref;
use std::sync::{Arc, Mutex, OnceLock, Weak};

/// Declares a test file's handler set and unmatched-request policy.
///
/// The type is never instantiated; it only names the suite and supplies
/// its declarative registration list, like the handler config array passed
/// to a mock-server factory.
pub trait SuiteSpecs: 'static {
	/// The handler specs to register for this suite.
	fn specs() -> Vec<HandlerSpec>;

	/// The policy for requests no spec matches.
	fn policy() -> UnmatchedPolicy {
		UnmatchedPolicy::default()
	}
}

/// Storage cell for one suite's shared server. Declare one `static` per
/// test file.
pub type SuiteCell = OnceLock<Mutex<Weak<InterceptionServer>>>;

/// Guard over the suite's shared interception server.
///
/// Derefs to [`InterceptionServer`]. Dropping the guard resets the
/// registry to the declared baseline (after-each); dropping the last guard
/// closes the server (after-all).
pub struct ServerGuard {
	server: Arc<InterceptionServer>,
}

impl Deref for ServerGuard {
	type Target = InterceptionServer;

	fn deref(&self) -> &InterceptionServer {
		&self.server
	}
}

impl Drop for ServerGuard {
	fn drop(&mut self) {
		self.server.reset();
	}
}

/// Acquire the suite-wide interception server, starting it on first use.
///
/// Subsequent calls while any guard is alive return the same server;
/// the `Weak` reference lets the server shut down once the last guard is
/// gone.
///
/// # Panics
///
/// Panics if the server cannot bind its loopback listener or if a test
/// panicked while holding the suite lock. Both abort the suite, which is
/// the useful behavior in a test harness.
pub fn acquire_server<S: SuiteSpecs>(cell: &'static SuiteCell) -> ServerGuard {
	let mutex = cell.get_or_init(|| Mutex::new(Weak::new()));
	let mut weak = mutex
		.lock()
		.expect("suite server mutex poisoned - a test panicked while holding the lock");

	if let Some(existing) = weak.upgrade() {
		return ServerGuard { server: existing };
	}

	let registry = MockRequestRegistry::with_policy(S::specs(), S::policy());
	let server = Arc::new(
		InterceptionServer::start(registry).expect("failed to start interception server"),
	);
	*weak = Arc::downgrade(&server);

	ServerGuard { server }
}

/// Declare a suite server accessor from a handler spec list.
///
/// Expands to a function returning a [`ServerGuard`] backed by a
/// file-local [`SuiteCell`], mirroring the one-call mock-server setup the
/// declarative style is built around.
///
/// # Examples
///
/// ```rust,no_run
/// use mockwire::{HandlerSpec, mock_suite};
/// use serde_json::json;
///
/// mock_suite! {
///     fn api_server() {
///         HandlerSpec::get("/api/user", |_req| json!({"user": null})).expect("valid spec"),
///     }
/// }
///
/// #[tokio::test]
/// async fn sees_the_null_user() {
///     let server = api_server();
///     // request against server.url("/api/user") ...
/// }
/// ```
#[macro_export]
macro_rules! mock_suite {
	($vis:vis fn $name:ident() { $($spec:expr),* $(,)? }) => {
		$vis fn $name() -> $crate::lifecycle::ServerGuard {
			struct Suite;

			impl $crate::lifecycle::SuiteSpecs for Suite {
				fn specs() -> ::std::vec::Vec<$crate::HandlerSpec> {
					::std::vec![$($spec),*]
				}
			}

			static CELL: $crate::lifecycle::SuiteCell = ::std::sync::OnceLock::new();
			$crate::lifecycle::acquire_server::<Suite>(&CELL)
		}
	};
}
