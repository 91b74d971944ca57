//! The registration table and dispatch logic

use crate::handler::{HandlerSpec, Responder};
use crate::request::RequestDescriptor;
use crate::response::MockResponse;
use http::{Method, StatusCode};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

type RouteKey = (Method, String);

/// What to do with a request no spec matches.
///
/// A test double exists to keep tests off the real network, so the default
/// is a hard failure: a `501` diagnostic that makes the miss impossible to
/// overlook. Suites that want the code under test to see an ordinary
/// missing resource can opt into `NotFound`. The policy is fixed per
/// registry instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
	/// Respond `501 Not Implemented` with a diagnostic naming the request.
	#[default]
	Fail,
	/// Respond `404 Not Found` as a real server would.
	NotFound,
}

/// One recorded intercepted request.
///
/// Records accumulate across dispatches and are cleared by
/// [`MockRequestRegistry::reset`], so counts never leak between tests.
#[derive(Debug, Clone)]
pub struct CallRecord {
	/// Method of the intercepted request.
	pub method: Method,
	/// Path without the query component.
	pub path: String,
	/// Parsed query parameters.
	pub query: HashMap<String, String>,
	/// Request body decoded as UTF-8, if non-empty.
	pub body: Option<String>,
	/// When the request was dispatched.
	pub timestamp: Instant,
}

/// Translates a declarative list of [`HandlerSpec`]s into live request
/// dispatch and guarantees test isolation across a suite.
///
/// The declared list is compiled into a `(method, path)` table with
/// last-registration-wins override semantics and kept as an immutable
/// baseline. Tests may add ad hoc handlers through
/// [`override_handler`](Self::override_handler); [`reset`](Self::reset)
/// restores the table to exactly the baseline and clears call records.
///
/// # Examples
///
/// ```
/// use mockwire::{HandlerSpec, MockRequestRegistry};
/// use serde_json::json;
///
/// let registry = MockRequestRegistry::register(vec![
///     HandlerSpec::get("/api/user", |_req| json!({"user": {"id": 3}})).unwrap(),
/// ]);
/// assert_eq!(registry.handler_count(), 1);
/// ```
pub struct MockRequestRegistry {
	baseline: Vec<HandlerSpec>,
	active: RwLock<HashMap<RouteKey, Arc<dyn Responder>>>,
	calls: Mutex<Vec<CallRecord>>,
	policy: UnmatchedPolicy,
}

impl MockRequestRegistry {
	/// Compile a declarative spec list into a registry.
	///
	/// `specs` may be empty, in which case every request falls to the
	/// unmatched policy. Duplicate (method, path) pairs are not an error:
	/// the later-declared spec wins, mirroring router override semantics.
	pub fn register(specs: Vec<HandlerSpec>) -> Self {
		Self::with_policy(specs, UnmatchedPolicy::default())
	}

	/// Compile a registry with an explicit unmatched-request policy.
	pub fn with_policy(specs: Vec<HandlerSpec>, policy: UnmatchedPolicy) -> Self {
		let active = compile(&specs);
		Self {
			baseline: specs,
			active: RwLock::new(active),
			calls: Mutex::new(Vec::new()),
			policy,
		}
	}

	/// Add or replace a handler for the remainder of the current test.
	///
	/// Overrides are discarded by the next [`reset`](Self::reset); the
	/// originally declared baseline is never modified.
	///
	/// # Examples
	///
	/// ```
	/// use mockwire::{HandlerSpec, MockRequestRegistry};
	/// use serde_json::json;
	///
	/// let registry = MockRequestRegistry::register(vec![
	///     HandlerSpec::get("/api/user", |_req| json!({"user": {"id": 3}})).unwrap(),
	/// ]);
	///
	/// registry.override_handler(
	///     HandlerSpec::get("/api/user", |_req| json!({"user": null})).unwrap(),
	/// );
	///
	/// registry.reset();
	/// // The baseline handler is active again.
	/// ```
	pub fn override_handler(&self, spec: HandlerSpec) {
		let mut active = self.active.write().unwrap();
		active.insert(spec.route_key(), spec.responder());
	}

	/// Restore the active handler set to exactly the registered baseline
	/// and clear all call records. Idempotent.
	pub fn reset(&self) {
		let mut active = self.active.write().unwrap();
		*active = compile(&self.baseline);
		drop(active);

		self.calls.lock().unwrap().clear();
	}

	/// Number of distinct (method, path) routes currently active.
	pub fn handler_count(&self) -> usize {
		self.active.read().unwrap().len()
	}

	/// The unmatched-request policy this registry was built with.
	pub fn policy(&self) -> UnmatchedPolicy {
		self.policy
	}

	/// Dispatch one intercepted request.
	///
	/// Matches by exact, case-sensitive (method, path) equality. On match
	/// the responder is invoked and awaited; a responder error becomes a
	/// `500` response carrying the message. No match falls to the
	/// unmatched policy. Every dispatch is recorded exactly once.
	pub async fn dispatch(&self, request: RequestDescriptor) -> MockResponse {
		self.record(&request);

		let responder = {
			let active = self.active.read().unwrap();
			active
				.get(&(request.method().clone(), request.path().to_string()))
				.cloned()
		};

		match responder {
			Some(responder) => {
				tracing::debug!(
					method = %request.method(),
					path = request.path(),
					"dispatching intercepted request"
				);
				match responder.respond(request).await {
					Ok(response) => response,
					Err(err) => {
						tracing::error!(error = %err, "responder failed");
						MockResponse::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
					}
				}
			}
			None => self.unmatched(&request),
		}
	}

	fn unmatched(&self, request: &RequestDescriptor) -> MockResponse {
		tracing::warn!(
			method = %request.method(),
			path = request.path(),
			"no handler matches intercepted request"
		);
		match self.policy {
			UnmatchedPolicy::Fail => MockResponse::json(json!({
				"error": "unhandled request",
				"method": request.method().as_str(),
				"path": request.path(),
			}))
			.with_status(StatusCode::NOT_IMPLEMENTED),
			UnmatchedPolicy::NotFound => MockResponse::error(StatusCode::NOT_FOUND, "not found"),
		}
	}

	fn record(&self, request: &RequestDescriptor) {
		let body = if request.body().is_empty() {
			None
		} else {
			Some(request.body_str().into_owned())
		};

		self.calls.lock().unwrap().push(CallRecord {
			method: request.method().clone(),
			path: request.path().to_string(),
			query: request.query().clone(),
			body,
			timestamp: Instant::now(),
		});
	}

	/// All recorded calls since the last reset.
	pub fn calls(&self) -> Vec<CallRecord> {
		self.calls.lock().unwrap().clone()
	}

	/// Recorded calls to a specific path.
	pub fn calls_to(&self, path: &str) -> Vec<CallRecord> {
		self.calls
			.lock()
			.unwrap()
			.iter()
			.filter(|call| call.path == path)
			.cloned()
			.collect()
	}

	/// Number of recorded calls to a specific path.
	pub fn call_count(&self, path: &str) -> usize {
		self.calls
			.lock()
			.unwrap()
			.iter()
			.filter(|call| call.path == path)
			.count()
	}

	/// Whether any request to the path was intercepted since the last reset.
	pub fn was_called(&self, path: &str) -> bool {
		self.call_count(path) > 0
	}
}

fn compile(specs: &[HandlerSpec]) -> HashMap<RouteKey, Arc<dyn Responder>> {
	let mut table = HashMap::new();
	// Insertion order gives later-declared specs precedence.
	for spec in specs {
		table.insert(spec.route_key(), spec.responder());
	}
	table
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ResponderError;
	use async_trait::async_trait;
	use bytes::Bytes;
	use http::{HeaderMap, Uri};
	use rstest::rstest;
	use serde_json::{Value, json};

	fn request(method: Method, uri: &str) -> RequestDescriptor {
		RequestDescriptor::from_parts(
			method,
			uri.parse::<Uri>().unwrap(),
			HeaderMap::new(),
			Bytes::new(),
		)
	}

	fn body_of(response: &MockResponse) -> Value {
		serde_json::from_slice(response.body()).unwrap()
	}

	#[tokio::test]
	async fn last_registration_wins_for_duplicate_routes() {
		let registry = MockRequestRegistry::register(vec![
			HandlerSpec::get("/api/user", |_req| json!({"version": "first"})).unwrap(),
			HandlerSpec::get("/api/user", |_req| json!({"version": "second"})).unwrap(),
		]);
		assert_eq!(registry.handler_count(), 1);

		let response = registry.dispatch(request(Method::GET, "/api/user")).await;
		assert_eq!(body_of(&response)["version"], "second");
	}

	#[tokio::test]
	async fn method_discrimination_keeps_routes_independent() {
		let registry = MockRequestRegistry::register(vec![
			HandlerSpec::get("/x", |_req| json!({"via": "get"})).unwrap(),
			HandlerSpec::post("/x", |_req| json!({"via": "post"})).unwrap(),
		]);
		assert_eq!(registry.handler_count(), 2);

		let get = registry.dispatch(request(Method::GET, "/x")).await;
		assert_eq!(body_of(&get)["via"], "get");

		let post = registry.dispatch(request(Method::POST, "/x")).await;
		assert_eq!(body_of(&post)["via"], "post");
	}

	#[tokio::test]
	async fn unregistered_method_falls_to_the_policy() {
		let registry = MockRequestRegistry::register(vec![
			HandlerSpec::get("/x", |_req| json!({"ok": true})).unwrap(),
		]);

		let response = registry.dispatch(request(Method::POST, "/x")).await;
		assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
		assert_eq!(body_of(&response)["error"], "unhandled request");
		assert_eq!(body_of(&response)["method"], "POST");
	}

	#[rstest]
	#[case(UnmatchedPolicy::Fail, StatusCode::NOT_IMPLEMENTED)]
	#[case(UnmatchedPolicy::NotFound, StatusCode::NOT_FOUND)]
	#[tokio::test]
	async fn unmatched_status_follows_the_policy(
		#[case] policy: UnmatchedPolicy,
		#[case] expected: StatusCode,
	) {
		let registry = MockRequestRegistry::with_policy(vec![], policy);
		let response = registry.dispatch(request(Method::GET, "/missing")).await;
		assert_eq!(response.status(), expected);
	}

	#[tokio::test]
	async fn reset_restores_the_baseline_and_discards_overrides() {
		let registry = MockRequestRegistry::register(vec![
			HandlerSpec::get("/api/user", |_req| json!({"user": {"id": 3}})).unwrap(),
		]);

		registry
			.override_handler(HandlerSpec::get("/api/user", |_req| json!({"user": null})).unwrap());
		registry
			.override_handler(HandlerSpec::get("/api/extra", |_req| json!({"extra": 1})).unwrap());
		assert_eq!(registry.handler_count(), 2);

		let overridden = registry.dispatch(request(Method::GET, "/api/user")).await;
		assert_eq!(body_of(&overridden)["user"], Value::Null);

		registry.reset();
		assert_eq!(registry.handler_count(), 1);

		let restored = registry.dispatch(request(Method::GET, "/api/user")).await;
		assert_eq!(body_of(&restored)["user"]["id"], 3);

		let removed = registry.dispatch(request(Method::GET, "/api/extra")).await;
		assert_eq!(removed.status(), StatusCode::NOT_IMPLEMENTED);
	}

	#[tokio::test]
	async fn reset_is_idempotent() {
		let registry = MockRequestRegistry::register(vec![
			HandlerSpec::get("/a", |_req| json!(1)).unwrap(),
			HandlerSpec::post("/b", |_req| json!(2)).unwrap(),
		]);

		registry.reset();
		registry.reset();
		assert_eq!(registry.handler_count(), 2);
	}

	#[tokio::test]
	async fn calls_are_recorded_and_cleared_on_reset() {
		let registry = MockRequestRegistry::register(vec![
			HandlerSpec::get("/api/user", |_req| json!({})).unwrap(),
		]);

		registry.dispatch(request(Method::GET, "/api/user")).await;
		registry
			.dispatch(request(Method::GET, "/api/user?verbose=1"))
			.await;
		registry.dispatch(request(Method::GET, "/other")).await;

		assert_eq!(registry.call_count("/api/user"), 2);
		assert!(registry.was_called("/other"));
		assert_eq!(registry.calls().len(), 3);

		let verbose = &registry.calls_to("/api/user")[1];
		assert_eq!(verbose.query.get("verbose").map(String::as_str), Some("1"));

		registry.reset();
		assert_eq!(registry.calls().len(), 0);
		assert!(!registry.was_called("/api/user"));
	}

	#[tokio::test]
	async fn same_request_twice_yields_equal_responses() {
		let registry = MockRequestRegistry::register(vec![
			HandlerSpec::get("/api/user", |req| {
				json!({"page": req.query_param("page").unwrap_or("1")})
			})
			.unwrap(),
		]);

		let first = registry
			.dispatch(request(Method::GET, "/api/user?page=2"))
			.await;
		let second = registry
			.dispatch(request(Method::GET, "/api/user?page=2"))
			.await;
		assert_eq!(first.body(), second.body());
	}

	struct FailingResponder;

	#[async_trait]
	impl crate::handler::Responder for FailingResponder {
		async fn respond(
			&self,
			_request: RequestDescriptor,
		) -> Result<MockResponse, ResponderError> {
			Err(ResponderError::new("backing store unavailable"))
		}
	}

	#[tokio::test]
	async fn responder_errors_surface_as_failed_requests() {
		let registry = MockRequestRegistry::register(vec![
			HandlerSpec::with_responder(Method::GET, "/api/user", FailingResponder).unwrap(),
		]);

		let response = registry.dispatch(request(Method::GET, "/api/user")).await;
		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body_of(&response)["error"], "backing store unavailable");
	}
}
