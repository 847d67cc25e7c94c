//! Public API Surface: `Set`, `Get`, `Del`, `AtExit`, `Reset`, `Unload`,
//! `ID`, `IsEnabled` — thin dispatch atop the identity probe, the
//! registry, and the termination detector.

use std::sync::{Arc, Mutex};

use crate::detector;
use crate::identity::{current_id, ContextId};
use crate::key::Key;
use crate::record::GlsRecord;
use crate::registry;
use crate::Closable;

fn get_or_install(id: ContextId) -> Arc<Mutex<GlsRecord>> {
    let record = registry::global().install(id);
    // Arming never fails in this crate's model (see `detector::arm`), so
    // the spec's "if arming fails the record is removed and the call
    // becomes a no-op" branch has no code path here; kept as a comment
    // for fidelity with the source design rather than dead code.
    detector::arm(id);
    record
}

/// `Set(key, value)`: insert or replace the binding for `key` in the
/// current context's record, creating the record (and arming the
/// termination detector) on first write.
pub fn set<C>(key: &'static Key, value: C)
where
    C: Closable + 'static,
{
    let record = get_or_install(current_id());
    let mut guard = record
        .lock()
        .expect("GLS record lock poisoned during set");
    guard.set(key.identity(), Box::new(value));
}

/// `Get(key) -> (value, present)`: read-only, never creates a record.
/// `T` must match whatever type the stored [`Closable::as_any`]
/// downcasts to — for [`crate::Data<T>`] that is `T` itself.
pub fn get<T>(key: &'static Key) -> Option<T>
where
    T: Clone + 'static,
{
    let record = registry::global().lookup(current_id())?;
    let guard = record
        .lock()
        .expect("GLS record lock poisoned during get");
    guard
        .get(key.identity())
        .and_then(|value| value.as_any().downcast_ref::<T>())
        .cloned()
}

/// `Del(key)`: removes the binding; does not destroy the record.
pub fn del(key: &'static Key) {
    if let Some(record) = registry::global().lookup(current_id()) {
        let mut guard = record
            .lock()
            .expect("GLS record lock poisoned during del");
        guard.del(key.identity());
    }
}

/// `AtExit(f)`: append `f` to the current context's exit callbacks,
/// creating the record (and arming the detector) if absent.
pub fn at_exit<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    let record = get_or_install(current_id());
    let mut guard = record
        .lock()
        .expect("GLS record lock poisoned during at_exit");
    guard.push_exit_fn(Box::new(f));
}

/// `Reset()`: close every stored value (best-effort) and clear `data`.
/// `exitFns` are left intact.
pub fn reset() {
    if let Some(record) = registry::global().lookup(current_id()) {
        let mut guard = record
            .lock()
            .expect("GLS record lock poisoned during reset");
        guard.reset_values();
    }
}

/// `Unload()`: runs the full termination sweep inline and unarms the
/// detector. Safe to call multiple times, and safe to call from within
/// an `AtExit` callback (Scenario F).
pub fn unload() {
    detector::unload(current_id());
}

/// `ID()`: the current context's id.
pub fn id() -> ContextId {
    current_id()
}

/// `IsEnabled(id)`: true iff a record is currently registered for `id`.
pub fn is_enabled(id: ContextId) -> bool {
    registry::global().contains(id)
}
