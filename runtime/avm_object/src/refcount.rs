//! Atomic reference counts.
//!
//! A count starts at 1 when its object is constructed. Reaching zero is the
//! trigger for release (destruction or recycling), never a state a live
//! owner observes. Decrements use `Release` ordering and the transition to
//! zero is followed by an `Acquire` fence, so every write made by any former
//! owner happens-before the release work.

use std::sync::atomic::{fence, AtomicU32, Ordering};

/// What a decrement did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Other owners remain; carries the new count.
    Shared(u32),
    /// This was the last owner.
    Released,
}

/// Ownership count of one scripted object.
#[derive(Debug)]
pub struct RefCount(AtomicU32);

impl RefCount {
    /// A fresh count owned by its creator.
    pub fn new() -> Self {
        RefCount(AtomicU32::new(1))
    }

    #[inline]
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop one owner. `None` means the count was already zero.
    pub fn decrement(&self) -> Option<Transition> {
        let previous = self
            .0
            .fetch_update(Ordering::Release, Ordering::Relaxed, |n| n.checked_sub(1))
            .ok()?;
        if previous == 1 {
            fence(Ordering::Acquire);
            Some(Transition::Released)
        } else {
            Some(Transition::Shared(previous - 1))
        }
    }

    /// Drop one owner without ever releasing.
    ///
    /// Used when a callee already handed its return value to the caller: the
    /// caller's reference is accounted for without a matching increment.
    /// `false` means the count was already zero.
    pub fn fake_decrement(&self) -> bool {
        self.0
            .fetch_update(Ordering::Release, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Re-arm a recycled count for its new owner.
    pub(crate) fn revive(&self) {
        self.0.store(1, Ordering::Release);
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}
