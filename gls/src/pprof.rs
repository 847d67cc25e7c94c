//! Stand-in for the runtime's profiler — the "third party" that the
//! termination detector must tolerate overwriting its label slot.
//!
//! The source runtime's profiling subsystem (`pprof`) attaches arbitrary
//! string labels to a goroutine via the very same per-context pointer
//! slot the termination detector repurposes for its sentinel. This module
//! plays that role for Scenario E: replacing a thread's current GLS
//! sentinel the way an unrelated profiling call would, from code running
//! on that same thread.

use crate::detector;
use crate::identity::{current_id, ContextId};

/// Simulate a profiler call that overwrites the calling thread's label
/// slot with its own (GLS-unrelated) data, while the thread is still
/// alive. Exercises the detector's re-arm path (Scenario E); intended for
/// tests and diagnostics, not for production call sites, since a real
/// profiler integration would not route through this crate at all.
pub fn simulate_profiler_overwrite() {
    detector::handle_profiler_overwrite(current_id());
}

/// As [`simulate_profiler_overwrite`], but targeting an explicit id for
/// use from test helpers that captured it on another thread. Only
/// meaningful when called from the thread that owns `id`; calling it for
/// a foreign id is a no-op, since nothing on the calling thread's label
/// slot could belong to a different context in the first place.
pub fn simulate_profiler_overwrite_for(id: ContextId) {
    if id == current_id() {
        detector::handle_profiler_overwrite(id);
    }
}
