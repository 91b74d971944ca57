//! Error types for registration and dispatch

use thiserror::Error;

/// Errors raised while registering handler specs or running the
/// interception server.
///
/// Registration problems are reported eagerly, when the [`HandlerSpec`]
/// is constructed, so a malformed spec never reaches dispatch.
///
/// [`HandlerSpec`]: crate::handler::HandlerSpec
#[derive(Debug, Error)]
pub enum RegistryError {
	/// The registered path was empty or did not start with `/`.
	#[error("invalid handler path {path:?}: {reason}")]
	InvalidPath {
		/// The path as it was passed in.
		path: String,
		/// Why it was rejected.
		reason: &'static str,
	},

	/// The method string did not name a recognized HTTP verb.
	#[error("unrecognized HTTP method {0:?}")]
	InvalidMethod(String),

	/// Binding or serving the loopback listener failed.
	#[error("interception server I/O error: {0}")]
	Io(#[from] std::io::Error),
}

/// Error produced by a [`Responder`] during dispatch.
///
/// Responder failures are never swallowed: the registry turns them into a
/// `500` response carrying this message, so a broken mock fails the test
/// that hit it instead of handing back an empty success.
///
/// [`Responder`]: crate::handler::Responder
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ResponderError {
	message: String,
}

impl ResponderError {
	/// Create a responder error with the given message.
	///
	/// # Examples
	///
	/// ```
	/// use mockwire::error::ResponderError;
	///
	/// let err = ResponderError::new("upstream record missing");
	/// assert_eq!(err.to_string(), "upstream record missing");
	/// ```
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

impl From<serde_json::Error> for ResponderError {
	fn from(err: serde_json::Error) -> Self {
		Self::new(format!("responder serialization failed: {err}"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn registry_error_messages_name_the_offending_input() {
		let err = RegistryError::InvalidPath {
			path: "api/user".to_string(),
			reason: "must start with '/'",
		};
		assert!(err.to_string().contains("api/user"));

		let err = RegistryError::InvalidMethod("FETCH".to_string());
		assert!(err.to_string().contains("FETCH"));
	}
}
