//! Goroutine-style per-execution-context local storage, with termination
//! hooks synthesized from a runtime's own internals rather than requiring
//! cooperation from the code being monitored.
//!
//! # Performance-First Design Patterns:
//! - Sharded registry (fixed prime shard count) to bound lock contention
//! - Zero-cooperation identity probe: an OS thread mints its own id on
//!   first use, with no caller-side bookkeeping required
//! - Thread-local destructors as the termination trigger — no polling,
//!   no background sweep thread, no GC
//!
//! See `SPEC_FULL.md` for the full design and `DESIGN.md` for the
//! grounding ledger mapping each module back to the teacher crate this
//! one was built from.

pub mod api;
pub mod config;
pub mod detector;
pub mod error;
pub mod identity;
pub mod key;
pub mod metrics;
pub mod pprof;
pub mod record;
pub mod registry;

pub use api::{at_exit, del, get, id, is_enabled, reset, set, unload};
pub use config::GlsConfig;
pub use error::{set_error_log, GlsInitError};
pub use identity::{current_id, status, ContextId, Status, INVALID_CONTEXT_ID};
pub use key::{Closable, Data, Key};
pub use metrics::{GlsMetrics, MetricsSnapshot};

use tracing::info;

/// Initialize the GLS runtime: install a `tracing` subscriber and apply
/// `config` to the registry before it is first touched.
///
/// Like the teacher crate's `init()`, this is meant to be called once,
/// early in `main`. Calling it more than once, or after the registry has
/// already been materialized by an earlier GLS call, only affects the
/// logging subscriber installation (idempotent) — `config` is then
/// silently ignored, matching the "process-wide singleton... never
/// re-created" design note.
pub fn init(config: GlsConfig) -> Result<(), GlsInitError> {
    // `try_init` rather than `init`: a second call (e.g. from a test
    // harness that also installs its own subscriber) must not panic.
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let shard_count = config.shard_count;
    registry::configure(config);

    info!("GLS core v{} initialized", env!("CARGO_PKG_VERSION"));
    info!("registry shard count: {shard_count}");

    Ok(())
}
