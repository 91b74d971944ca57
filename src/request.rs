//! Request descriptor handed to responders

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Immutable description of one intercepted request.
///
/// Built once per dispatch from the raw hyper parts. Exposes the method,
/// the full URL (path plus query string), a parsed single-valued query map,
/// the headers, and the raw body. Query extraction is deliberately lax:
/// whether an expected parameter is present is the responder's business,
/// not the router's.
///
/// # Examples
///
/// ```
/// use mockwire::request::RequestDescriptor;
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let descriptor = RequestDescriptor::from_parts(
///     Method::GET,
///     "/api/repositories?q=language:go".parse::<Uri>().unwrap(),
///     HeaderMap::new(),
///     Bytes::new(),
/// );
///
/// assert_eq!(descriptor.path(), "/api/repositories");
/// assert_eq!(descriptor.query_param("q"), Some("language:go"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	query: HashMap<String, String>,
	body: Bytes,
}

impl RequestDescriptor {
	/// Build a descriptor from raw request parts.
	///
	/// Duplicate query keys keep the last occurrence; the map is
	/// single-valued by contract.
	pub fn from_parts(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
		let query = uri
			.query()
			.map(parse_query)
			.unwrap_or_default();

		Self {
			method,
			uri,
			headers,
			query,
			body,
		}
	}

	/// The HTTP method of the intercepted request.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// The request path without the query component.
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// The full URL as received, including the query string.
	///
	/// # Examples
	///
	/// ```
	/// use mockwire::request::RequestDescriptor;
	/// use http::{HeaderMap, Method, Uri};
	/// use bytes::Bytes;
	///
	/// let descriptor = RequestDescriptor::from_parts(
	///     Method::GET,
	///     "/search?q=rust".parse::<Uri>().unwrap(),
	///     HeaderMap::new(),
	///     Bytes::new(),
	/// );
	/// assert_eq!(descriptor.url(), "/search?q=rust");
	/// ```
	pub fn url(&self) -> String {
		self.uri.to_string()
	}

	/// The raw query string, if any.
	pub fn query_string(&self) -> Option<&str> {
		self.uri.query()
	}

	/// The parsed query parameters (single-valued).
	pub fn query(&self) -> &HashMap<String, String> {
		&self.query
	}

	/// Look up one query parameter by name.
	pub fn query_param(&self, name: &str) -> Option<&str> {
		self.query.get(name).map(String::as_str)
	}

	/// The request headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// The raw request body.
	pub fn body(&self) -> &Bytes {
		&self.body
	}

	/// The request body decoded as UTF-8 (lossy).
	pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Deserialize the request body as JSON.
	///
	/// # Examples
	///
	/// ```
	/// use mockwire::request::RequestDescriptor;
	/// use http::{HeaderMap, Method, Uri};
	/// use bytes::Bytes;
	/// use serde_json::Value;
	///
	/// let descriptor = RequestDescriptor::from_parts(
	///     Method::POST,
	///     "/api/users".parse::<Uri>().unwrap(),
	///     HeaderMap::new(),
	///     Bytes::from_static(br#"{"name": "Alice"}"#),
	/// );
	///
	/// let body: Value = descriptor.json().unwrap();
	/// assert_eq!(body["name"], "Alice");
	/// ```
	pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
		serde_json::from_slice(&self.body)
	}
}

fn parse_query(raw: &str) -> HashMap<String, String> {
	// serde_urlencoded handles percent-decoding; later duplicates win.
	serde_urlencoded::from_str::<Vec<(String, String)>>(raw)
		.map(|pairs| pairs.into_iter().collect())
		.unwrap_or_default()
}
