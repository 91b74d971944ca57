//! Handler specs and the responder seam

use crate::error::{RegistryError, ResponderError};
use crate::request::RequestDescriptor;
use crate::response::MockResponse;
use async_trait::async_trait;
use http::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Produces a mock response for a matched request.
///
/// The common case is covered by the closure-taking [`HandlerSpec`]
/// constructors; implement this trait directly when a responder needs to
/// be asynchronous, fallible, or return something other than JSON.
///
/// Responders may suspend; dispatch awaits the result before completing
/// the intercepted request. A returned error surfaces as a failed request,
/// never as an empty success.
///
/// # Examples
///
/// ```
/// use mockwire::{Responder, RequestDescriptor, MockResponse};
/// use mockwire::error::ResponderError;
/// use async_trait::async_trait;
/// use serde_json::json;
///
/// struct UserResponder;
///
/// #[async_trait]
/// impl Responder for UserResponder {
///     async fn respond(
///         &self,
///         request: RequestDescriptor,
///     ) -> Result<MockResponse, ResponderError> {
///         let id = request
///             .query_param("id")
///             .ok_or_else(|| ResponderError::new("missing id parameter"))?;
///         Ok(MockResponse::json(json!({"user": {"id": id}})))
///     }
/// }
/// ```
#[async_trait]
pub trait Responder: Send + Sync {
	/// Produce the response for one intercepted request.
	async fn respond(&self, request: RequestDescriptor) -> Result<MockResponse, ResponderError>;
}

/// Adapts an infallible `Fn(RequestDescriptor) -> Value` closure, the
/// declarative `res:` shape.
struct JsonResponder<F> {
	res: F,
}

#[async_trait]
impl<F> Responder for JsonResponder<F>
where
	F: Fn(RequestDescriptor) -> Value + Send + Sync,
{
	async fn respond(&self, request: RequestDescriptor) -> Result<MockResponse, ResponderError> {
		Ok(MockResponse::json((self.res)(request)))
	}
}

/// One declarative registration entry: a validated (method, path) pair and
/// the responder invoked when a matching request is intercepted.
///
/// Validation happens here, at construction, so dispatch never sees a
/// malformed spec. Paths must start with `/`; a query component in the
/// registered path is stripped because matching is exact-path only.
///
/// # Examples
///
/// ```
/// use mockwire::HandlerSpec;
/// use serde_json::json;
///
/// let spec = HandlerSpec::get("/api/user", |_req| {
///     json!({"user": {"id": 3, "email": "a@b.com"}})
/// })
/// .unwrap();
///
/// assert_eq!(spec.path(), "/api/user");
/// assert_eq!(spec.method(), &http::Method::GET);
/// ```
#[derive(Clone)]
pub struct HandlerSpec {
	method: Method,
	path: String,
	responder: Arc<dyn Responder>,
}

impl HandlerSpec {
	/// Register a spec with the method given as a string, `"get"` style.
	///
	/// # Errors
	///
	/// Returns [`RegistryError::InvalidMethod`] for unrecognized verbs and
	/// [`RegistryError::InvalidPath`] for malformed paths.
	///
	/// # Examples
	///
	/// ```
	/// use mockwire::HandlerSpec;
	/// use serde_json::json;
	///
	/// let spec = HandlerSpec::new("post", "/api/users", |_req| json!({"ok": true})).unwrap();
	/// assert_eq!(spec.method(), &http::Method::POST);
	///
	/// assert!(HandlerSpec::new("fetch", "/api/users", |_req| json!(null)).is_err());
	/// ```
	pub fn new<F>(method: &str, path: &str, res: F) -> Result<Self, RegistryError>
	where
		F: Fn(RequestDescriptor) -> Value + Send + Sync + 'static,
	{
		Self::with_responder(parse_method(method)?, path, JsonResponder { res })
	}

	/// Register a `GET` spec with a JSON-producing closure.
	pub fn get<F>(path: &str, res: F) -> Result<Self, RegistryError>
	where
		F: Fn(RequestDescriptor) -> Value + Send + Sync + 'static,
	{
		Self::with_responder(Method::GET, path, JsonResponder { res })
	}

	/// Register a `POST` spec with a JSON-producing closure.
	pub fn post<F>(path: &str, res: F) -> Result<Self, RegistryError>
	where
		F: Fn(RequestDescriptor) -> Value + Send + Sync + 'static,
	{
		Self::with_responder(Method::POST, path, JsonResponder { res })
	}

	/// Register a `PUT` spec with a JSON-producing closure.
	pub fn put<F>(path: &str, res: F) -> Result<Self, RegistryError>
	where
		F: Fn(RequestDescriptor) -> Value + Send + Sync + 'static,
	{
		Self::with_responder(Method::PUT, path, JsonResponder { res })
	}

	/// Register a `DELETE` spec with a JSON-producing closure.
	pub fn delete<F>(path: &str, res: F) -> Result<Self, RegistryError>
	where
		F: Fn(RequestDescriptor) -> Value + Send + Sync + 'static,
	{
		Self::with_responder(Method::DELETE, path, JsonResponder { res })
	}

	/// Register a spec with a custom [`Responder`] implementation.
	///
	/// Use this for asynchronous or fallible responders, or responses that
	/// are not plain JSON.
	pub fn with_responder(
		method: Method,
		path: &str,
		responder: impl Responder + 'static,
	) -> Result<Self, RegistryError> {
		Ok(Self {
			method,
			path: normalize_path(path)?,
			responder: Arc::new(responder),
		})
	}

	/// The HTTP method this spec matches.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// The exact path this spec matches.
	pub fn path(&self) -> &str {
		&self.path
	}

	pub(crate) fn route_key(&self) -> (Method, String) {
		(self.method.clone(), self.path.clone())
	}

	pub(crate) fn responder(&self) -> Arc<dyn Responder> {
		Arc::clone(&self.responder)
	}
}

impl fmt::Debug for HandlerSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HandlerSpec")
			.field("method", &self.method)
			.field("path", &self.path)
			.finish_non_exhaustive()
	}
}

/// Recognized verbs; anything else is rejected at registration time.
fn parse_method(method: &str) -> Result<Method, RegistryError> {
	match method.to_ascii_uppercase().as_str() {
		"GET" => Ok(Method::GET),
		"POST" => Ok(Method::POST),
		"PUT" => Ok(Method::PUT),
		"PATCH" => Ok(Method::PATCH),
		"DELETE" => Ok(Method::DELETE),
		"HEAD" => Ok(Method::HEAD),
		"OPTIONS" => Ok(Method::OPTIONS),
		_ => Err(RegistryError::InvalidMethod(method.to_string())),
	}
}

fn normalize_path(path: &str) -> Result<String, RegistryError> {
	if path.is_empty() {
		return Err(RegistryError::InvalidPath {
			path: path.to_string(),
			reason: "must not be empty",
		});
	}
	if !path.starts_with('/') {
		return Err(RegistryError::InvalidPath {
			path: path.to_string(),
			reason: "must start with '/'",
		});
	}

	// Matching is exact-path; query inspection belongs to the responder.
	let path = path.split_once('?').map_or(path, |(p, _)| p);
	Ok(path.to_string())
}
