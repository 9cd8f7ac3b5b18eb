//! Telemetry helpers for structured logging and tracing.
//!
//! Grounded on the teacher's `util/telemetry.rs`, extended with a runtime
//! severity-reload handle so the ambient log level can change without a
//! restart — the same capability the teacher's `tracing-subscriber`
//! dependency already supports via its `reload` feature.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::{reload, EnvFilter};

static RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> = OnceLock::new();

/// Initializes tracing/telemetry. Installs a default env-based subscriber
/// if none is set yet; safe to call more than once (later calls are a
/// no-op once a dispatcher exists).
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::from_default_env();
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        let _ = RELOAD_HANDLE.set(handle);
    }
}

/// Reloads the active log filter to `directive` (e.g. `"debug"` or
/// `"parking_lot_core_async=trace,warn"`). Returns `false` if
/// [`init_tracing`] was never called or a custom subscriber was
/// installed instead, in which case there is no reload handle to use.
pub fn set_log_severity_filter(directive: &str) -> bool {
    let Some(handle) = RELOAD_HANDLE.get() else {
        return false;
    };
    handle.reload(EnvFilter::new(directive)).is_ok()
}
