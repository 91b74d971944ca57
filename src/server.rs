//! The loopback interception server

use crate::error::RegistryError;
use crate::registry::MockRequestRegistry;
use crate::request::RequestDescriptor;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// An in-process HTTP server that intercepts requests and dispatches them
/// to a [`MockRequestRegistry`].
///
/// Binds `127.0.0.1:0` so every suite gets its own port; point the code
/// under test at [`url`](Self::url). The accept loop runs on a dedicated
/// thread with its own single-threaded runtime, so a suite-wide server
/// outlives any individual test's runtime.
///
/// [`close`](Self::close) tears the server down; it is idempotent and also
/// runs on drop. After close, nothing listens on the address and no
/// further dispatch can succeed.
///
/// # Examples
///
/// ```no_run
/// use mockwire::{HandlerSpec, InterceptionServer, MockRequestRegistry};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = MockRequestRegistry::register(vec![
///     HandlerSpec::get("/api/user", |_req| json!({"user": {"id": 3}})).unwrap(),
/// ]);
/// let server = InterceptionServer::start(registry)?;
///
/// let body: serde_json::Value = reqwest::get(server.url("/api/user")).await?.json().await?;
/// assert_eq!(body["user"]["id"], 3);
///
/// server.close();
/// # Ok(())
/// # }
/// ```
pub struct InterceptionServer {
	registry: Arc<MockRequestRegistry>,
	addr: SocketAddr,
	shutdown: Mutex<Option<oneshot::Sender<()>>>,
	thread: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl InterceptionServer {
	/// Start intercepting with the given registry.
	pub fn start(registry: MockRequestRegistry) -> Result<Self, RegistryError> {
		Self::start_shared(Arc::new(registry))
	}

	/// Start intercepting with a registry the caller keeps a handle to.
	pub fn start_shared(registry: Arc<MockRequestRegistry>) -> Result<Self, RegistryError> {
		let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
		listener.set_nonblocking(true)?;
		let addr = listener.local_addr()?;

		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_all()
			.build()?;

		let (shutdown_tx, shutdown_rx) = oneshot::channel();
		let accept_registry = Arc::clone(&registry);

		let thread = std::thread::Builder::new()
			.name("mockwire-server".to_string())
			.spawn(move || {
				runtime.block_on(accept_loop(listener, accept_registry, shutdown_rx));
			})?;

		tracing::debug!(%addr, "interception server listening");

		Ok(Self {
			registry,
			addr,
			shutdown: Mutex::new(Some(shutdown_tx)),
			thread: Mutex::new(Some(thread)),
		})
	}

	/// The bound loopback address.
	pub fn addr(&self) -> SocketAddr {
		self.addr
	}

	/// Absolute URL for a path on this server.
	///
	/// # Examples
	///
	/// ```no_run
	/// # use mockwire::{InterceptionServer, MockRequestRegistry};
	/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let server = InterceptionServer::start(MockRequestRegistry::register(vec![]))?;
	/// let url = server.url("/api/user");
	/// assert!(url.starts_with("http://127.0.0.1:"));
	/// # Ok(())
	/// # }
	/// ```
	pub fn url(&self, path: &str) -> String {
		format!("http://{}{}", self.addr, path)
	}

	/// The registry this server dispatches to.
	pub fn registry(&self) -> &MockRequestRegistry {
		&self.registry
	}

	/// Restore the handler set to the registered baseline and clear call
	/// records. Delegates to [`MockRequestRegistry::reset`].
	pub fn reset(&self) {
		self.registry.reset();
	}

	/// Stop listening and join the server thread. Idempotent; also runs on
	/// drop. In-flight connections are aborted.
	pub fn close(&self) {
		if let Some(tx) = self.shutdown.lock().unwrap().take() {
			let _ = tx.send(());
		}
		if let Some(handle) = self.thread.lock().unwrap().take() {
			if handle.join().is_err() {
				tracing::error!("interception server thread panicked");
			}
			tracing::debug!(addr = %self.addr, "interception server closed");
		}
	}
}

impl Drop for InterceptionServer {
	fn drop(&mut self) {
		self.close();
	}
}

async fn accept_loop(
	listener: std::net::TcpListener,
	registry: Arc<MockRequestRegistry>,
	mut shutdown_rx: oneshot::Receiver<()>,
) {
	let listener = match tokio::net::TcpListener::from_std(listener) {
		Ok(listener) => listener,
		Err(err) => {
			tracing::error!(error = %err, "failed to adopt interception listener");
			return;
		}
	};

	loop {
		tokio::select! {
			_ = &mut shutdown_rx => break,
			accepted = listener.accept() => match accepted {
				Ok((stream, _peer)) => {
					let registry = Arc::clone(&registry);
					tokio::spawn(async move {
						if let Err(err) = handle_connection(stream, registry).await {
							tracing::debug!(error = %err, "interception connection error");
						}
					});
				}
				Err(err) => {
					tracing::error!(error = %err, "error accepting interception connection");
					break;
				}
			},
		}
	}
}

async fn handle_connection(
	stream: tokio::net::TcpStream,
	registry: Arc<MockRequestRegistry>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let io = TokioIo::new(stream);
	let service = service_fn(move |request: hyper::Request<Incoming>| {
		let registry = Arc::clone(&registry);
		async move {
			let (parts, body) = request.into_parts();
			let body_bytes = body.collect().await?.to_bytes();

			let descriptor =
				RequestDescriptor::from_parts(parts.method, parts.uri, parts.headers, body_bytes);
			let response = registry.dispatch(descriptor).await;

			Ok::<_, hyper::Error>(response.into_hyper())
		}
	});

	hyper::server::conn::http1::Builder::new()
		.serve_connection(io, service)
		.await?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handler::HandlerSpec;
	use serde_json::json;

	#[test]
	fn distinct_servers_get_distinct_ports() {
		let first = InterceptionServer::start(MockRequestRegistry::register(vec![])).unwrap();
		let second = InterceptionServer::start(MockRequestRegistry::register(vec![])).unwrap();
		assert_ne!(first.addr(), second.addr());
	}

	#[test]
	fn close_is_idempotent() {
		let server = InterceptionServer::start(MockRequestRegistry::register(vec![
			HandlerSpec::get("/x", |_req| json!(1)).unwrap(),
		]))
		.unwrap();

		server.close();
		server.close();
	}

	#[test]
	fn url_includes_the_bound_address() {
		let server = InterceptionServer::start(MockRequestRegistry::register(vec![])).unwrap();
		let url = server.url("/api/user");
		assert_eq!(url, format!("http://{}/api/user", server.addr()));
	}
}
