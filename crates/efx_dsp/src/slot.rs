//! Lock-Free Parameter Slot
//!
//! Hands a fixed-size group of `f32` values from the control thread to the
//! audio thread without locks on the reading side and without torn reads.
//!
//! # Protocol
//!
//! A sequence counter guards `N` atomic words (f32 bits):
//!
//! ```text
//! writer (control path)            reader (audio thread)
//! ─────────────────────            ─────────────────────
//! seq = seq + 1   (odd)            s1 = seq        (Acquire)
//! fence(Release)                   skip if s1 odd or s1 == seen
//! store words     (Relaxed)        load words      (Relaxed)
//! seq = seq + 1   (even, Release)  fence(Acquire)
//!                                  s2 = seq        (Relaxed)
//!                                  accept only if s1 == s2
//! ```
//!
//! The reader never spins: a read that overlaps a write is simply dropped and
//! retried the next time the audio thread looks. Writers are serialised by a
//! mutex, which only the control path ever touches.

use std::sync::atomic::{fence, AtomicU32, Ordering};

use parking_lot::Mutex;

/// A group of `N` values published as one unit
pub struct ParamSlot<const N: usize> {
    sequence: AtomicU32,
    values: [AtomicU32; N],
    writer: Mutex<()>,
}

impl<const N: usize> ParamSlot<N> {
    /// Create a slot holding `initial` at sequence 0
    pub fn new(initial: [f32; N]) -> Self {
        Self {
            sequence: AtomicU32::new(0),
            values: initial.map(|v| AtomicU32::new(v.to_bits())),
            writer: Mutex::new(()),
        }
    }

    /// Publish a new set of values (control path only, may block on other writers)
    pub fn store(&self, values: [f32; N]) {
        let _guard = self.writer.lock();

        let seq = self.sequence.load(Ordering::Relaxed);
        self.sequence.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        for (slot, value) in self.values.iter().zip(values) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }

        self.sequence.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Sequence of the last completed publish
    #[inline]
    pub fn sequence(&self) -> u32 {
        self.sequence.load(Ordering::Acquire) & !1
    }

    /// Read the values if a publish newer than `seen` has completed
    ///
    /// Returns the sequence number to remember alongside the values. Returns
    /// `None` when nothing changed, or when a write is in flight.
    ///
    /// # Real-time Safety
    /// Wait-free: a fixed number of atomic loads, no locks, no retries.
    #[inline]
    pub fn read_newer(&self, seen: u32) -> Option<(u32, [f32; N])> {
        let start = self.sequence.load(Ordering::Acquire);
        if start == seen || start & 1 == 1 {
            return None;
        }

        let values =
            core::array::from_fn(|i| f32::from_bits(self.values[i].load(Ordering::Relaxed)));

        fence(Ordering::Acquire);
        if self.sequence.load(Ordering::Relaxed) != start {
            return None;
        }

        Some((start, values))
    }

    /// Read the current values, waiting out any concurrent writer (control path)
    pub fn load(&self) -> [f32; N] {
        let _guard = self.writer.lock();
        core::array::from_fn(|i| f32::from_bits(self.values[i].load(Ordering::Relaxed)))
    }
}

impl<const N: usize> std::fmt::Debug for ParamSlot<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamSlot")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
