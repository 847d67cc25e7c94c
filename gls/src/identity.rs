//! Context-Identity Probe.
//!
//! The source runtime obtains a stable per-context identity and lifecycle
//! status by reflecting on the private layout of its own scheduler
//! descriptor — an id field, an atomic status word, and a labels pointer
//! — at offsets cached once during process start.
//!
//! This crate has no comparable runtime to reflect on, and per the design
//! notes that is expected: "a faithful reimplementation in a systems
//! language without a comparable runtime would instead require the
//! language's native task-local-storage primitive." The nearest such
//! primitive Rust offers is OS-thread-local storage, so a context here
//! *is* an OS thread, and its id is minted once, lazily, the first time
//! anything on that thread asks for it.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::detector;

/// Sentinel "invalid" id, returned when identity cannot be determined.
/// Reserved: the counter in [`NEXT_ID`] starts at 1, so no real context
/// is ever assigned 0.
pub const INVALID_CONTEXT_ID: ContextId = ContextId(0);

/// Opaque, comparable, hashable identifier for one execution context.
///
/// Stable for the lifetime of the owning thread; minted from a process-wide
/// monotonic counter, so — unlike the source runtime's goroutine ids, which
/// are drawn from a pool and can be reused — two ids are never equal unless
/// they name the same thread. This is a strictly stronger uniqueness
/// guarantee than the spec requires (distinctness among *live* contexts
/// only), adopted because it is the cheaper invariant to provide and
/// removes an entire hazard class (`§4.4`'s "sentinel present with
/// different id" case) from this implementation; see `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ContextId {
    pub(crate) fn is_valid(self) -> bool {
        self != INVALID_CONTEXT_ID
    }

    /// Test-only constructor for exercising consumers (e.g. the detector's
    /// tombstone ring) without spinning up one real OS thread per id.
    #[cfg(test)]
    pub(crate) fn from_raw(n: u64) -> Self {
        Self(n)
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_ID: Cell<Option<ContextId>> = const { Cell::new(None) };
}

/// Return the id of the caller's context, minting one on first use.
///
/// Mirrors `currentId()`: always succeeds for a live thread, so the
/// "returns a sentinel invalid value if it cannot be determined" branch of
/// the original contract is unreachable here — every OS thread can always
/// mint its own id.
pub fn current_id() -> ContextId {
    CURRENT_ID.with(|slot| {
        if let Some(id) = slot.get() {
            return id;
        }
        let id = ContextId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        slot.set(Some(id));
        id
    })
}

/// Runtime lifecycle status of a context.
///
/// Retained in full for API fidelity with the source's ten-state
/// scheduler vocabulary even though this crate can only actually
/// distinguish "dead" from "not provably dead" — see `status` below and
/// `SPEC_FULL.md` §2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Runnable,
    Running,
    Syscall,
    Waiting,
    Moribund,
    Dead,
    Enqueue,
    Copystack,
    Preempted,
}

/// Read the lifecycle status of `id`.
///
/// This crate has no way to observe another OS thread's scheduling
/// sub-state (there is no Rust equivalent of the runtime's per-context
/// status word), so only the one state the rest of this crate actually
/// branches on is ever reported precisely: [`Status::Dead`], once the
/// termination sweep for `id` has completed. Every other id — including
/// the caller's own — is reported as [`Status::Running`]; this is the
/// conservative choice, since treating a live context as dead would be
/// the unsafe direction to be wrong in.
///
/// Dead-id tracking is itself bounded (see `detector::MAX_TOMBSTONES`): an
/// id reaped long enough ago may have scrolled out of the tombstone ring,
/// in which case it too is reported as [`Status::Running`] rather than
/// [`Status::Dead`]. Nothing in this crate relies on `status()` staying
/// accurate for arbitrarily old ids; it exists for API fidelity with the
/// source runtime's status word, not as a durable death log.
pub fn status(id: ContextId) -> Status {
    if !id.is_valid() {
        return Status::Dead;
    }
    if id == current_id() {
        return Status::Running;
    }
    if detector::is_known_dead(id) {
        Status::Dead
    } else {
        Status::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_id_is_stable_within_a_thread() {
        let a = current_id();
        let b = current_id();
        assert_eq!(a, b);
    }

    #[test]
    fn current_id_differs_across_threads() {
        let main_id = current_id();
        let other_id = std::thread::spawn(current_id).join().unwrap();
        assert_ne!(main_id, other_id);
    }

    #[test]
    fn invalid_id_is_never_minted() {
        assert!(current_id().is_valid());
    }

    #[test]
    fn status_of_own_context_is_running() {
        assert_eq!(status(current_id()), Status::Running);
    }

    #[test]
    fn status_of_invalid_id_is_dead() {
        assert_eq!(status(INVALID_CONTEXT_ID), Status::Dead);
    }
}
