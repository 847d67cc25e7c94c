//! Error taxonomy and the configurable error-log sink.
//!
//! Per the error handling design: the only *fatal* condition in this crate
//! is failure to stand up the context-identity probe at process start.
//! Every other failure (arming, a panicking callback, a panicking close) is
//! swallowed and routed through a single process-wide sink instead of being
//! propagated to the caller.

use std::sync::OnceLock;
use tracing::warn;

/// Fatal initialization failure: the context-identity probe could not be
/// stood up. In the original runtime this meant "could not locate the
/// offsets of the id/status/labels fields on the context descriptor"; here
/// it models the analogous (and, in practice, unreachable on any real
/// target) failure of the thread-local identity/label primitives.
#[derive(Debug, thiserror::Error)]
pub enum GlsInitError {
    #[error("context-identity probe could not be initialized: {0}")]
    ProbeUnavailable(String),
}

type ErrorSink = dyn Fn(&str) + Send + Sync + 'static;

static ERROR_SINK: OnceLock<Box<ErrorSink>> = OnceLock::new();

/// Install the sink that receives human-readable descriptions of swallowed
/// failures (arming failures, panicking `AtExit` callbacks, panicking
/// closes). Mirrors `SetErrorLog` from the public API surface.
///
/// Only the first call takes effect; subsequent calls are ignored, matching
/// the "process-wide singleton initialized at startup" treatment the rest
/// of this crate's global state receives. Call this before any other GLS
/// operation if you want to override the default `tracing::warn!` sink.
pub fn set_error_log<F>(sink: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    // OnceLock::set silently does nothing if already initialized; that is
    // the idempotent behavior we want rather than a panic on re-registration.
    let _ = ERROR_SINK.set(Box::new(sink));
}

/// Route a description of a swallowed failure to the configured sink,
/// defaulting to a `tracing::warn!` emission if none has been installed.
pub(crate) fn report(msg: impl AsRef<str>) {
    let msg = msg.as_ref();
    match ERROR_SINK.get() {
        Some(sink) => sink(msg),
        None => warn!(target: "gls", "{msg}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn report_falls_back_to_tracing_when_no_sink_installed() {
        // No sink installed in this process by default; report() must not panic.
        report("sanity check message");
    }

    #[test]
    fn init_error_display_contains_reason() {
        let err = GlsInitError::ProbeUnavailable("offsets not found".into());
        assert!(err.to_string().contains("offsets not found"));
    }

    // set_error_log can only meaningfully be exercised once per process
    // since OnceLock::set is a one-shot; this keeps the assertion narrow
    // (it either captures our sink, or a previous test already claimed it).
    #[test]
    fn set_error_log_is_idempotent_and_never_panics() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        set_error_log(move |msg| seen2.lock().unwrap().push(msg.to_string()));
        set_error_log(|_msg| panic!("second sink must never be installed"));
        report("after double registration");
        // Either our sink or an earlier test's sink absorbed the message;
        // both are acceptable, we only assert this didn't panic above.
    }
}
