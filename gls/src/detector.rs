//! Termination Detector.
//!
//! The source runtime synthesizes a "context is dying" event out of a
//! garbage-collector finalizer attached to a sentinel object stored in the
//! context's own labels slot: when the context dies, the runtime drops its
//! last reference to that slot, the sentinel becomes unreachable, and the
//! finalizer fires.
//!
//! This crate has no garbage collector, but it does have an exact
//! same-thread analogue: a `thread_local!` destructor is guaranteed to run
//! exactly once, synchronously, when its owning thread tears down — and,
//! per this crate's `ContextId = OS thread` mapping (`SPEC_FULL.md` §2),
//! that is precisely the event the original detector is trying to
//! synthesize. [`Sentinel`] plays the role of the finalized heap object;
//! its [`Drop`] impl is the finalizer.
//!
//! **Divergence from the source design, documented**: the original
//! mechanism must distinguish "real death" from "our sentinel was merely
//! replaced by a profiler" *inside the finalizer*, because the finalizer
//! fires asynchronously and the two cases look identical from there. In
//! this crate, the one caller allowed to replace a thread's own sentinel
//! — [`crate::pprof`], simulating a profiler running inline on that same
//! thread — always runs synchronously on the owning thread and therefore
//! always knows, at the call site, which case it is in. So the branch
//! moves from the finalizer to the replace call site: [`Sentinel::drop`]
//! only ever has one meaning (real teardown) because every *other* path
//! that would drop a `Sentinel` first marks it `handled` and performs its
//! own explicit re-arm. The externally observable behavior — re-arm on
//! overwrite, sweep on real death — is unchanged; see `DESIGN.md`.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error;
use crate::identity::ContextId;
use crate::metrics;
use crate::record;
use crate::registry;

struct Sentinel {
    owner: ContextId,
    handled: Cell<bool>,
}

impl Drop for Sentinel {
    fn drop(&mut self) {
        if self.handled.replace(true) {
            return;
        }
        // The only path that reaches here with `handled == false` is the
        // thread's own `thread_local!` teardown — every explicit removal
        // (re-arm, `Unload`) marks `handled` before the `Sentinel` is
        // dropped. Real death; run the sweep.
        sweep(self.owner);
    }
}

thread_local! {
    static LABELS: RefCell<Option<Sentinel>> = const { RefCell::new(None) };
}

/// Bound on the tombstone ring buffer below. Only [`crate::identity::status`]
/// consumes this set — neither the detector's own re-arm/sweep logic nor the
/// registry reads it — so a bounded, eviction-on-overflow ring is sufficient:
/// `status()` degrades to reporting a reaped id as not-provably-dead once its
/// tombstone has scrolled off the back of the ring, rather than retaining one
/// entry per context for the life of the process.
const MAX_TOMBSTONES: usize = 4096;

/// A fixed-capacity FIFO set of dead [`ContextId`]s: evicts the oldest
/// member once `cap` is exceeded rather than growing without bound.
struct Tombstones {
    ring: VecDeque<ContextId>,
    cap: usize,
}

impl Tombstones {
    const fn new(cap: usize) -> Self {
        Self {
            ring: VecDeque::new(),
            cap,
        }
    }

    fn mark(&mut self, id: ContextId) {
        if self.ring.contains(&id) {
            return;
        }
        if self.ring.len() >= self.cap {
            self.ring.pop_front();
        }
        self.ring.push_back(id);
    }

    fn contains(&self, id: ContextId) -> bool {
        self.ring.contains(&id)
    }
}

static DEAD: Mutex<Tombstones> = Mutex::new(Tombstones::new(MAX_TOMBSTONES));

fn mark_dead(id: ContextId) {
    DEAD.lock().expect("GLS tombstone lock poisoned").mark(id);
}

/// Used by [`crate::identity::status`] to report [`crate::Status::Dead`].
///
/// Best-effort: an id swept more than [`MAX_TOMBSTONES`] sweeps ago may have
/// been evicted from the ring, in which case this returns `false` even
/// though the context did in fact die. `status()` documents the same
/// best-effort caveat.
pub(crate) fn is_known_dead(id: ContextId) -> bool {
    DEAD.lock()
        .expect("GLS tombstone lock poisoned")
        .contains(id)
}

/// Arm the detector for `owner`: attach a fresh [`Sentinel`] to the
/// thread's label slot. Idempotent — "Sentinel already present with
/// matching id: skip" (§4.4) — since `owner` is always the calling
/// thread's own id in this crate's model, a present `Sentinel` can only
/// ever belong to `owner` already.
///
/// There is no CAS-failure / retry hazard in this mapping: a thread can
/// only ever race with itself for its own label slot, and ordinary
/// sequential execution rules that out. `arm` therefore always succeeds;
/// `records_armed`/`arm_retries` are both tracked for metric fidelity
/// with the source design even though the retry counter can never move.
pub(crate) fn arm(owner: ContextId) {
    LABELS.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return; // already armed
        }
        *slot = Some(Sentinel {
            owner,
            handled: Cell::new(false),
        });
        metrics::global().record_armed();
    });
}

/// Invoked by [`crate::pprof`] when a third party (a profiler) replaces
/// the current thread's label slot while the thread is still alive and
/// running this very call. Detaches our sentinel without letting its
/// `Drop` fire the sweep, then immediately re-arms — matching the state
/// machine's `Armed -> (finalizer, context alive, labels replaced) ->
/// Arming (re-attach)` transition, done inline rather than "in a freshly
/// spawned execution unit" per the documented divergence in
/// `SPEC_FULL.md` §2 (a thread cannot populate another thread's TLS, so
/// only the owning thread itself can legally perform the re-attach, and
/// it is already the one making this call).
pub(crate) fn handle_profiler_overwrite(owner: ContextId) {
    take_and_suppress();
    metrics::global().record_profiler_rearm();
    arm(owner);
}

/// Explicit, synchronous teardown: `Unload`. Detaches the sentinel
/// (suppressing its `Drop`) and runs the sweep inline. Safe to call
/// multiple times, and safe to call from within an `AtExit` callback that
/// is itself running inside an in-progress sweep for the same context
/// (Scenario F): the sweep below reads the record's `done` flag and the
/// registry's presence, both of which make every step past the first
/// caller a no-op.
pub(crate) fn unload(owner: ContextId) {
    take_and_suppress();
    sweep(owner);
}

fn take_and_suppress() {
    // `try_with` rather than `with`: if this runs as a nested call from
    // within the real teardown path (`Unload` invoked by an `AtExit`
    // callback while the thread is actually exiting), the `LABELS` slot
    // may already be mid-destruction and inaccessible. That is not an
    // error here — there is nothing left to suppress.
    let _ = LABELS.try_with(|slot| {
        if let Ok(mut slot) = slot.try_borrow_mut() {
            if let Some(sentinel) = slot.take() {
                sentinel.handled.set(true);
            }
        }
    });
}

/// Termination sweep (§4.4 "resetAtExit"): look up the record, snapshot
/// and run exit callbacks in LIFO order outside of any lock, then remove
/// the record from the registry and close its remaining values.
///
/// Idempotent by construction: every step is a no-op on a record that
/// has already been swept or removed, which is what makes re-entrant
/// `Unload` (Scenario F) and a nested real-teardown sweep both safe.
pub(crate) fn sweep(owner: ContextId) {
    let _timer = metrics::SweepTimer::start();
    mark_dead(owner);

    let record = match registry::global().lookup(owner) {
        Some(record) => record,
        None => return,
    };

    let fns = {
        let mut guard = record
            .lock()
            .expect("GLS record lock poisoned during sweep");
        guard.take_for_sweep()
    };
    record::run_exit_fns_lifo(fns);

    if let Some(record) = registry::global().remove(owner) {
        let mut guard = record
            .lock()
            .expect("GLS record lock poisoned during sweep");
        guard.close_all();
    }
}
