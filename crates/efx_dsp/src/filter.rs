//! Per-Channel Biquad Filter
//!
//! One instance per (band, channel). The coefficients are shared by every
//! channel of a band through a [`PendingCoefficients`] slot, while the delay
//! memory (x1, x2, y1, y2) belongs to this instance alone so that channels
//! never leak history into each other.
//!
//! # Coefficient handoff
//!
//! ```text
//! control thread                       audio thread (per sample)
//! ──────────────                       ─────────────────────────
//! set_design(coeffs) ──▶ slot ──▶ process(): newer set? adopt, keep state
//!                                          └─ DF-I recurrence
//! ```

use std::sync::Arc;

use biquad::{Biquad, Coefficients, DirectForm1};

use crate::coeffs::IDENTITY;
use crate::slot::ParamSlot;

/// Pending coefficient set for one EQ band, written by the control path
#[derive(Debug)]
pub struct PendingCoefficients {
    slot: ParamSlot<5>,
}

impl PendingCoefficients {
    pub fn new() -> Self {
        Self {
            slot: ParamSlot::new(to_words(&IDENTITY)),
        }
    }

    /// Publish a new design; every filter reading this slot adopts it on its next sample
    pub fn set_design(&self, coeffs: Coefficients<f32>) {
        self.slot.store(to_words(&coeffs));
    }

    /// The most recently published design (control path)
    pub fn design(&self) -> Coefficients<f32> {
        from_words(self.slot.load())
    }

    #[inline]
    fn read_newer(&self, seen: u32) -> Option<(u32, Coefficients<f32>)> {
        self.slot
            .read_newer(seen)
            .map(|(seq, words)| (seq, from_words(words)))
    }
}

impl Default for PendingCoefficients {
    fn default() -> Self {
        Self::new()
    }
}

fn to_words(c: &Coefficients<f32>) -> [f32; 5] {
    [c.b0, c.b1, c.b2, c.a1, c.a2]
}

fn from_words([b0, b1, b2, a1, a2]: [f32; 5]) -> Coefficients<f32> {
    Coefficients { a1, a2, b0, b1, b2 }
}

/// Second-order IIR filter for one channel of one EQ band
pub struct BiquadFilter {
    pending: Arc<PendingCoefficients>,
    /// Sequence number of the coefficients currently active
    adopted: u32,
    // Direct Form I keeps input and output history separately, so swapping
    // coefficients mid-stream never reinterprets stored state
    filter: DirectForm1<f32>,
    enabled: bool,
}

impl BiquadFilter {
    /// Create a filter reading its coefficients from `pending`
    ///
    /// Starts enabled with identity coefficients; whatever `pending` holds is
    /// adopted on the first processed sample.
    pub fn new(pending: Arc<PendingCoefficients>) -> Self {
        Self {
            pending,
            adopted: 0,
            filter: DirectForm1::<f32>::new(IDENTITY),
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Process one sample
    ///
    /// # Real-time Safety
    /// No allocations, no locks. Pending coefficients are adopted without
    /// clearing the delay memory to avoid clicks on parameter changes.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        if let Some((seq, coeffs)) = self.pending.read_newer(self.adopted) {
            self.filter.update_coefficients(coeffs);
            self.adopted = seq;
        }

        if !self.enabled {
            return sample;
        }

        self.filter.run(sample)
    }

    /// Clear the delay memory (x1, x2, y1, y2), keeping the coefficients
    pub fn reset(&mut self) {
        self.filter.reset_state();
    }
}
