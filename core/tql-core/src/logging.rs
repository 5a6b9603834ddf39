//! Tracing subscriber setup for TQL.
//!
//! The facade emits `debug` spans per query operation (`txn`, `table` fields)
//! and `info` events for table lifecycle. Nothing is printed unless a
//! subscriber is installed, either by the host application or by the helpers
//! below (feature `logging`).

#[cfg(feature = "logging")]
use tracing_subscriber::{EnvFilter, fmt, fmt::format::FmtSpan};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "tql_core=info";

/// Install a global subscriber filtered by `RUST_LOG` (default `tql_core=info`).
///
/// Returns `false` if a global subscriber was already set.
///
/// ```rust
/// tql_core::logging::init();
/// ```
#[cfg(feature = "logging")]
pub fn init() -> bool {
    init_with_level(DEFAULT_FILTER)
}

/// Install a global subscriber with an explicit filter directive,
/// e.g. `"debug"` or `"tql_core::api=trace"`. `RUST_LOG` still wins.
#[cfg(feature = "logging")]
pub fn init_with_level(directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .try_init()
        .is_ok()
}

/// Subscriber for tests: debug level, captured by the test harness.
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("tql_core=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init() -> bool {
    false
}

#[cfg(not(feature = "logging"))]
pub fn init_with_level(_directive: &str) -> bool {
    false
}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}
