//! Test logging setup

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize tracing output for tests (call once, safe to call often).
///
/// Dispatch emits `debug` events per matched request, `warn` per unmatched
/// request, and `error` on responder failures; run with
/// `RUST_LOG=mockwire=debug` to see them. Output goes through the test
/// writer so it is captured per test.
///
/// # Examples
///
/// ```
/// use mockwire::logging::init_test_logging;
///
/// init_test_logging();
/// ```
pub fn init_test_logging() {
	INIT.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::from_default_env())
			.with_test_writer()
			.try_init();
	});
}
