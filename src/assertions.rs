//! Assertion helpers for responses and recorded calls

use crate::registry::MockRequestRegistry;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Assert a response has the expected status code.
///
/// # Examples
///
/// ```no_run
/// use mockwire::assertions::assert_status;
/// use http::StatusCode;
///
/// # async fn example(response: reqwest::Response) {
/// assert_status(&response, StatusCode::OK);
/// # }
/// ```
pub fn assert_status(response: &reqwest::Response, expected: StatusCode) {
	assert_eq!(
		response.status(),
		expected,
		"expected status {expected}, got {}",
		response.status()
	);
}

/// Assert a response carries a header, regardless of value.
pub fn assert_has_header(response: &reqwest::Response, name: &str) {
	assert!(
		response.headers().contains_key(name),
		"expected header '{name}' to be present"
	);
}

/// Assert a response header has an exact value.
///
/// # Examples
///
/// ```no_run
/// use mockwire::assertions::assert_header_equals;
///
/// # async fn example(response: reqwest::Response) {
/// assert_header_equals(&response, "content-type", "application/json");
/// # }
/// ```
pub fn assert_header_equals(response: &reqwest::Response, name: &str, expected: &str) {
	let actual = response
		.headers()
		.get(name)
		.unwrap_or_else(|| panic!("expected header '{name}' to be present"));
	assert_eq!(
		actual, expected,
		"expected header '{name}' to equal {expected:?}, got {actual:?}"
	);
}

/// Extract and deserialize the JSON body of a response.
///
/// # Examples
///
/// ```no_run
/// use mockwire::assertions::extract_json;
/// use serde_json::Value;
///
/// # async fn example(response: reqwest::Response) {
/// let body: Value = extract_json(response).await.unwrap();
/// assert_eq!(body["user"]["id"], 3);
/// # }
/// ```
pub async fn extract_json<T: DeserializeOwned>(
	response: reqwest::Response,
) -> Result<T, reqwest::Error> {
	response.json().await
}

/// Assert that a JSON value has a field with a specific value.
pub fn assert_json_field_eq(json: &Value, field: &str, expected: &Value) {
	let actual = json.get(field);
	assert_eq!(
		actual,
		Some(expected),
		"expected field '{field}' to equal {expected:?}, got {actual:?}"
	);
}

/// Assert that a JSON value is an array of a specific length.
pub fn assert_json_array_len(json: &Value, expected_len: usize) {
	match json {
		Value::Array(items) => assert_eq!(
			items.len(),
			expected_len,
			"expected array of length {expected_len}, got {}",
			items.len()
		),
		other => panic!("expected JSON array, got {other:?}"),
	}
}

/// Assert that a JSON value matches a pattern by subset: every field in
/// the pattern must be present and equal in the actual value, extra fields
/// are ignored.
///
/// # Examples
///
/// ```
/// use mockwire::assertions::assert_json_matches;
/// use serde_json::json;
///
/// let actual = json!({"id": 1, "full_name": "go_one", "stars": 42});
/// assert_json_matches(&actual, &json!({"full_name": "go_one"}));
/// ```
pub fn assert_json_matches(actual: &Value, pattern: &Value) {
	match (actual, pattern) {
		(Value::Object(actual_map), Value::Object(pattern_map)) => {
			for (key, pattern_value) in pattern_map {
				match actual_map.get(key) {
					Some(actual_value) => assert_json_matches(actual_value, pattern_value),
					None => panic!("expected field '{key}' in {actual_map:?}"),
				}
			}
		}
		(Value::Array(actual_items), Value::Array(pattern_items)) => {
			assert_eq!(
				actual_items.len(),
				pattern_items.len(),
				"array length mismatch: expected {}, got {}",
				pattern_items.len(),
				actual_items.len()
			);
			for (actual_item, pattern_item) in actual_items.iter().zip(pattern_items) {
				assert_json_matches(actual_item, pattern_item);
			}
		}
		_ => assert_eq!(actual, pattern, "value mismatch"),
	}
}

/// Assert a path was intercepted an exact number of times since the last
/// reset.
///
/// # Examples
///
/// ```
/// use mockwire::assertions::assert_called_times;
/// use mockwire::{HandlerSpec, MockRequestRegistry};
/// use serde_json::json;
///
/// let registry = MockRequestRegistry::register(vec![
///     HandlerSpec::get("/api/user", |_req| json!(null)).unwrap(),
/// ]);
/// assert_called_times(&registry, "/api/user", 0);
/// ```
pub fn assert_called_times(registry: &MockRequestRegistry, path: &str, expected: usize) {
	let actual = registry.call_count(path);
	assert_eq!(
		actual, expected,
		"expected {expected} call(s) to '{path}' but received {actual}"
	);
}

/// Assert at least one intercepted call to the path carried the given
/// query parameter value.
pub fn assert_called_with_query(
	registry: &MockRequestRegistry,
	path: &str,
	param: &str,
	expected: &str,
) {
	let calls = registry.calls_to(path);
	let matched = calls
		.iter()
		.any(|call| call.query.get(param).map(String::as_str) == Some(expected));
	assert!(
		matched,
		"expected a call to '{path}' with {param}={expected:?}, recorded queries: {:?}",
		calls.iter().map(|call| call.query.clone()).collect::<Vec<_>>()
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn json_subset_matching_ignores_extra_fields() {
		let actual = json!({"name": "John", "age": 30, "city": "NYC"});
		assert_json_matches(&actual, &json!({"name": "John", "age": 30}));
	}

	#[test]
	#[should_panic(expected = "expected field 'email'")]
	fn json_subset_matching_reports_missing_fields() {
		assert_json_matches(&json!({"name": "John"}), &json!({"email": "a@b.com"}));
	}

	#[test]
	fn json_array_len_matches() {
		assert_json_array_len(&json!([1, 2, 3]), 3);
	}

	#[test]
	#[should_panic(expected = "expected JSON array")]
	fn json_array_len_rejects_non_arrays() {
		assert_json_array_len(&json!({"items": []}), 0);
	}

	#[test]
	fn json_field_eq_matches() {
		assert_json_field_eq(&json!({"id": 7}), "id", &json!(7));
	}

	#[tokio::test]
	#[should_panic(expected = "expected 2 call(s) to '/api/user' but received 1")]
	async fn call_count_mismatch_names_the_numbers() {
		use crate::handler::HandlerSpec;
		use crate::request::RequestDescriptor;

		let registry = MockRequestRegistry::register(vec![
			HandlerSpec::get("/api/user", |_req| json!(null)).unwrap(),
		]);
		registry
			.dispatch(RequestDescriptor::from_parts(
				http::Method::GET,
				"/api/user".parse().unwrap(),
				http::HeaderMap::new(),
				bytes::Bytes::new(),
			))
			.await;

		assert_called_times(&registry, "/api/user", 2);
	}
}
