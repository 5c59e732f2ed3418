mod fixtures;
mod memory;

pub use fixtures::{ObjectFixture, TranslationFixture};
pub use memory::MemoryCollection;

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Installs an env-filtered subscriber once per test process; repeated calls
/// are no-ops.
pub fn init_logging() {
	INIT_LOGGING.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.try_init();
	});
}
