//! Mock response construction

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use std::str::FromStr;

/// A response produced by a responder.
///
/// Built with the `json`/`text`/`error` constructors and refined with the
/// builder-style setters. Converted into a hyper response at the serving
/// boundary.
///
/// # Examples
///
/// ```
/// use mockwire::response::MockResponse;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let response = MockResponse::json(json!({"status": "ok"}));
/// assert_eq!(response.status(), StatusCode::OK);
///
/// let created = MockResponse::json(json!({"id": 7})).with_status(StatusCode::CREATED);
/// assert_eq!(created.status(), StatusCode::CREATED);
/// ```
#[derive(Debug, Clone)]
pub struct MockResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Bytes,
}

impl MockResponse {
	/// A `200 OK` response with a JSON-serialized body.
	pub fn json<T: Serialize>(data: T) -> Self {
		let body = serde_json::to_vec(&data).unwrap_or_default();
		let mut headers = HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Self {
			status: StatusCode::OK,
			headers,
			body: Bytes::from(body),
		}
	}

	/// A `200 OK` plain-text response.
	pub fn text(body: impl Into<String>) -> Self {
		let mut headers = HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

		Self {
			status: StatusCode::OK,
			headers,
			body: Bytes::from(body.into()),
		}
	}

	/// An error response with a JSON `{"error": message}` body.
	///
	/// # Examples
	///
	/// ```
	/// use mockwire::response::MockResponse;
	/// use http::StatusCode;
	///
	/// let response = MockResponse::error(StatusCode::NOT_FOUND, "no such user");
	/// assert_eq!(response.status(), StatusCode::NOT_FOUND);
	/// ```
	pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
		Self::json(serde_json::json!({ "error": message.into() })).with_status(status)
	}

	/// Override the status code.
	pub fn with_status(mut self, status: StatusCode) -> Self {
		self.status = status;
		self
	}

	/// Set a response header. Invalid names or values are ignored with a
	/// warning rather than failing the dispatch.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		match (HeaderName::from_str(name), HeaderValue::from_str(value)) {
			(Ok(name), Ok(value)) => {
				self.headers.insert(name, value);
			}
			_ => tracing::warn!(name, value, "ignoring invalid mock response header"),
		}
		self
	}

	/// The response status code.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// The response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// The response body bytes.
	pub fn body(&self) -> &Bytes {
		&self.body
	}

	pub(crate) fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
		let mut builder = hyper::Response::builder().status(self.status);
		for (name, value) in self.headers.iter() {
			builder = builder.header(name, value);
		}

		builder.body(Full::new(self.body)).unwrap_or_else(|_| {
			let mut fallback =
				hyper::Response::new(Full::new(Bytes::from_static(b"invalid mock response")));
			*fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
			fallback
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::{Value, json};

	#[test]
	fn json_response_carries_content_type_and_body() {
		let response = MockResponse::json(json!({"user": {"id": 3}}));

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(
			response.headers().get(CONTENT_TYPE).unwrap(),
			"application/json"
		);

		let body: Value = serde_json::from_slice(response.body()).unwrap();
		assert_eq!(body["user"]["id"], 3);
	}

	#[test]
	fn text_response_is_plain() {
		let response = MockResponse::text("Hello, World!");
		assert_eq!(response.body(), "Hello, World!");
		assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
	}

	#[test]
	fn error_response_wraps_the_message() {
		let response = MockResponse::error(StatusCode::NOT_FOUND, "no such user");
		assert_eq!(response.status(), StatusCode::NOT_FOUND);

		let body: Value = serde_json::from_slice(response.body()).unwrap();
		assert_eq!(body["error"], "no such user");
	}

	#[test]
	fn invalid_header_is_ignored() {
		let response = MockResponse::text("ok").with_header("bad name", "value");
		assert!(response.headers().get("bad name").is_none());
	}
}
