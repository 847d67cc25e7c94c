//! The GLS record: one context's data map plus its ordered exit callbacks.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use crate::error;
use crate::key::KeyIdentity;
use crate::metrics;
use crate::Closable;

type ExitFn = Box<dyn FnOnce() + Send>;

/// Per-context payload. Owned by exactly one [`crate::ContextId`]; never
/// accessed from more than one OS thread at a time in this crate's model
/// (the owning thread performs all `Set`/`Get`/`Del`/`AtExit` calls, and
/// the sweep that eventually consumes it runs either inline via `Unload`
/// or during that same thread's own teardown).
pub(crate) struct GlsRecord {
    data: HashMap<KeyIdentity, Box<dyn Closable>>,
    exit_fns: Vec<ExitFn>,
    done: bool,
}

impl GlsRecord {
    pub(crate) fn new() -> Self {
        Self {
            data: HashMap::new(),
            exit_fns: Vec::new(),
            done: false,
        }
    }

    /// (I2): once `done`, new writes from any path are refused silently.
    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    pub(crate) fn set(&mut self, key: KeyIdentity, value: Box<dyn Closable>) {
        if self.done {
            return;
        }
        self.data.insert(key, value);
    }

    pub(crate) fn get(&self, key: KeyIdentity) -> Option<&dyn Closable> {
        self.data.get(&key).map(|boxed| boxed.as_ref())
    }

    pub(crate) fn del(&mut self, key: KeyIdentity) {
        self.data.remove(&key);
    }

    pub(crate) fn push_exit_fn(&mut self, f: ExitFn) {
        if self.done {
            return;
        }
        self.exit_fns.push(f);
    }

    /// `Reset`: close every stored value (best-effort, panics swallowed),
    /// then clear `data`. `exitFns` is left intact per the spec.
    pub(crate) fn reset_values(&mut self) {
        for (_, mut value) in self.data.drain() {
            close_one(value.as_mut());
        }
    }

    /// Termination sweep, steps 2–3 of §4.4: snapshot `exitFns`, clear the
    /// field, mark `done`, then return the snapshot so the caller can run
    /// it outside of any lock. Idempotent: a record already `done` yields
    /// an empty snapshot, so a re-entrant sweep (Scenario F) is a no-op.
    pub(crate) fn take_for_sweep(&mut self) -> Vec<ExitFn> {
        if self.done {
            return Vec::new();
        }
        self.done = true;
        std::mem::take(&mut self.exit_fns)
    }

    /// Step 5 of §4.4: close every remaining value in `data`, best-effort.
    pub(crate) fn close_all(&mut self) {
        for (_, mut value) in self.data.drain() {
            close_one(value.as_mut());
        }
    }
}

fn close_one(value: &mut dyn Closable) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| value.close()));
    if let Err(payload) = result {
        metrics::global().record_close_panic_swallowed();
        error::report(format!("GLS value close panicked: {}", describe_panic(&payload)));
    }
}

/// Run exit callbacks in strict LIFO (reverse registration) order, each
/// wrapped to swallow panics per (T3): one panicking callback must not
/// prevent the rest from running.
pub(crate) fn run_exit_fns_lifo(fns: Vec<ExitFn>) {
    for f in fns.into_iter().rev() {
        let result = panic::catch_unwind(AssertUnwindSafe(f));
        if let Err(payload) = result {
            metrics::global().record_callback_panic_swallowed();
            error::report(format!(
                "GLS AtExit callback panicked: {}",
                describe_panic(&payload)
            ));
        }
    }
}

fn describe_panic(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
