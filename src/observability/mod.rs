//! Observability
//!
//! Diagnostics go through `tracing`; each line carries an `event` field
//! naming an [`Event`]. The library never installs a subscriber. Binaries
//! call [`init_tracing`] once at startup.
//!
//! ```ignore
//! use antity::observability::Event;
//!
//! tracing::info!(event = %Event::FilterDropped, field = "age", "unknown field");
//! ```

mod events;

pub use events::Event;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "antity=info";

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Calling it twice is harmless; the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
