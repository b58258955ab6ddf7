//! Schroeder Reverb Channel
//!
//! One instance per audio channel:
//!
//! ```text
//!               ┌─▶ [Comb 29.7ms] ─┐
//!               ├─▶ [Comb 37.1ms] ─┤
//! x ─▶ [Pre] ───┼─▶ [Comb 41.1ms] ─┼─▶ (×¼) ─▶ [AP 5.0ms] ─▶ [AP 1.7ms] ─▶ wet
//!               └─▶ [Comb 43.7ms] ─┘
//! ```
//!
//! The channel always returns the fully wet signal; the caller does the
//! wet/dry mix.
//!
//! All delay memory is sized when the channel is built: comb and allpass
//! lengths depend only on the sample rate, and the pre-delay line is
//! allocated for [`MAX_PRE_DELAY_MS`]. [`ReverbChannel::rebuild`] therefore
//! reinitialises the network in place without touching the allocator.

use serde::{Deserialize, Serialize};

use crate::coeffs::clamp_or;
use crate::delay::{ms_to_samples, AllpassFilter, CombFilter, DelayLine};
use crate::error::DspError;

pub const MIN_ROOM_SIZE: f32 = 0.2;
pub const MAX_ROOM_SIZE: f32 = 0.95;
pub const MAX_DAMPING: f32 = 0.7;
pub const MAX_PRE_DELAY_MS: f32 = 100.0;

/// Comb lengths (ms) and their feedback relative to room size
const COMBS: [(f32, f32); 4] = [(29.7, 0.77), (37.1, 0.80), (41.1, 0.84), (43.7, 0.88)];
/// Allpass lengths (ms)
const ALLPASSES: [f32; 2] = [5.0, 1.7];
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Reverb tuning shared by every channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbParams {
    /// Wet proportion in the output mix (0..1)
    pub wet: f32,
    /// Scales comb feedback (0.2..0.95)
    pub room_size: f32,
    /// High-frequency absorption in the comb loops (0..0.7)
    pub damping: f32,
    /// Delay before the reverb network (0..100 ms)
    pub pre_delay_ms: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            wet: 0.2,
            room_size: 0.7,
            damping: 0.3,
            pre_delay_ms: 20.0,
        }
    }
}

impl ReverbParams {
    /// Every field clamped to its documented range; NaN fields take the default
    pub fn clamped(self) -> Self {
        let fallback = Self::default();
        Self {
            wet: clamp_or(self.wet, 0.0, 1.0, fallback.wet),
            room_size: clamp_or(
                self.room_size,
                MIN_ROOM_SIZE,
                MAX_ROOM_SIZE,
                fallback.room_size,
            ),
            damping: clamp_or(self.damping, 0.0, MAX_DAMPING, fallback.damping),
            pre_delay_ms: clamp_or(
                self.pre_delay_ms,
                0.0,
                MAX_PRE_DELAY_MS,
                fallback.pre_delay_ms,
            ),
        }
    }

    /// Whether switching from `self` to `other` requires rebuilding the network
    ///
    /// The wet level is applied by the caller, so it never does.
    pub fn needs_rebuild(&self, other: &ReverbParams) -> bool {
        self.room_size != other.room_size
            || self.damping != other.damping
            || self.pre_delay_ms != other.pre_delay_ms
    }

    pub fn to_words(self) -> [f32; 4] {
        [self.wet, self.room_size, self.damping, self.pre_delay_ms]
    }

    pub fn from_words([wet, room_size, damping, pre_delay_ms]: [f32; 4]) -> Self {
        Self {
            wet,
            room_size,
            damping,
            pre_delay_ms,
        }
    }
}

/// Reverb network for one channel
pub struct ReverbChannel {
    sample_rate: u32,
    params: ReverbParams,
    pre_delay: DelayLine,
    combs: [CombFilter; 4],
    allpasses: [AllpassFilter; 2],
}

impl ReverbChannel {
    /// Build a channel for `sample_rate`, allocating all delay memory up front
    pub fn new(sample_rate: u32, params: ReverbParams) -> Result<Self, DspError> {
        if sample_rate == 0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        let params = params.clamped();

        let [c0, c1, c2, c3] = COMBS;
        let comb = |(ms, scale): (f32, f32)| {
            CombFilter::new(ms_to_samples(ms, sample_rate), scale * params.room_size)
        };
        let allpass =
            |ms: f32| AllpassFilter::new(ms_to_samples(ms, sample_rate), ALLPASS_FEEDBACK);

        let mut channel = Self {
            sample_rate,
            params,
            pre_delay: DelayLine::new(ms_to_samples(MAX_PRE_DELAY_MS, sample_rate))?,
            combs: [comb(c0)?, comb(c1)?, comb(c2)?, comb(c3)?],
            allpasses: [allpass(ALLPASSES[0])?, allpass(ALLPASSES[1])?],
        };
        channel.pre_delay.set_len(ms_to_samples(params.pre_delay_ms, sample_rate));
        Ok(channel)
    }

    pub fn params(&self) -> ReverbParams {
        self.params
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Pre-delay currently applied, in samples
    pub fn pre_delay_samples(&self) -> usize {
        self.pre_delay.len()
    }

    /// Reinitialise the network for new parameters
    ///
    /// Clears all delay memory and re-derives pre-delay length and comb
    /// feedback. Bounded time, no allocation.
    pub fn rebuild(&mut self, params: ReverbParams) {
        let params = params.clamped();
        self.params = params;

        self.pre_delay
            .set_len(ms_to_samples(params.pre_delay_ms, self.sample_rate));
        for (comb, (_, scale)) in self.combs.iter_mut().zip(COMBS) {
            comb.retune(scale * params.room_size);
        }
        for allpass in &mut self.allpasses {
            allpass.clear();
        }
    }

    /// Clear all delay memory, keeping the parameters
    pub fn reset(&mut self) {
        self.rebuild(self.params);
    }

    /// Process one sample and return the wet signal
    ///
    /// # Real-time Safety
    /// No allocations, no locks, O(1).
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let delayed = self.pre_delay.process(sample);
        let damping = self.params.damping;

        let mut sum = 0.0;
        for comb in &mut self.combs {
            sum += comb.process(delayed, damping);
        }
        let mut wet = sum * 0.25;

        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }
        wet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_tail(channel: &mut ReverbChannel, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| channel.process(if n == 0 { 1.0 } else { 0.0 }))
            .collect()
    }

    #[test]
    fn test_default_params_in_range() {
        let params = ReverbParams::default();
        assert_eq!(params, params.clamped());
    }

    #[test]
    fn test_clamping() {
        let params = ReverbParams {
            wet: 2.0,
            room_size: 0.0,
            damping: 1.0,
            pre_delay_ms: 500.0,
        }
        .clamped();
        assert_eq!(params.wet, 1.0);
        assert_eq!(params.room_size, MIN_ROOM_SIZE);
        assert_eq!(params.damping, MAX_DAMPING);
        assert_eq!(params.pre_delay_ms, MAX_PRE_DELAY_MS);
    }

    #[test]
    fn test_nan_fields_take_defaults() {
        let params = ReverbParams {
            wet: f32::NAN,
            room_size: f32::NAN,
            damping: f32::NAN,
            pre_delay_ms: f32::NAN,
        }
        .clamped();
        assert_eq!(params, ReverbParams::default());
    }

    #[test]
    fn test_nan_room_size_keeps_output_finite() {
        let mut channel = ReverbChannel::new(48000, ReverbParams::default()).unwrap();
        channel.rebuild(ReverbParams {
            room_size: f32::NAN,
            ..ReverbParams::default()
        });

        let tail = impulse_tail(&mut channel, 4800);
        assert!(tail.iter().all(|s| s.is_finite()));
        assert!(tail.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        assert!(ReverbChannel::new(0, ReverbParams::default()).is_err());
    }

    #[test]
    fn test_delay_lengths_scale_with_sample_rate() {
        let at_48k = ReverbChannel::new(48000, ReverbParams::default()).unwrap();
        let at_96k = ReverbChannel::new(96000, ReverbParams::default()).unwrap();

        for (a, b) in at_48k.combs.iter().zip(&at_96k.combs) {
            assert!((b.len() as i64 - 2 * a.len() as i64).abs() <= 1);
        }
        assert_eq!(at_48k.combs[0].len(), 1426);
        assert_eq!(at_48k.allpasses[0].len(), 240);
        assert_eq!(at_48k.pre_delay_samples(), 960);
    }

    #[test]
    fn test_silence_before_pre_delay_and_first_comb() {
        let mut channel = ReverbChannel::new(48000, ReverbParams::default()).unwrap();
        let tail = impulse_tail(&mut channel, 4000);

        // 20ms pre-delay + 29.7ms shortest comb = 2386 samples of silence
        let first = tail.iter().position(|&s| s != 0.0).unwrap();
        assert_eq!(first, 960 + 1426);
    }

    #[test]
    fn test_tail_decays() {
        let mut channel = ReverbChannel::new(48000, ReverbParams::default()).unwrap();
        let tail = impulse_tail(&mut channel, 48000 * 4);

        let peak_early = tail[..48000].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        let peak_late = tail[48000 * 3..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(peak_early > 0.01);
        assert!(peak_late < peak_early * 0.01);
        assert!(tail.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_larger_room_rings_longer() {
        let small = ReverbParams {
            room_size: MIN_ROOM_SIZE,
            ..ReverbParams::default()
        };
        let large = ReverbParams {
            room_size: MAX_ROOM_SIZE,
            ..ReverbParams::default()
        };

        let energy_after = |params| {
            let mut channel = ReverbChannel::new(48000, params).unwrap();
            let tail = impulse_tail(&mut channel, 48000);
            tail[24000..].iter().map(|s| s * s).sum::<f32>()
        };
        assert!(energy_after(large) > energy_after(small));
    }

    #[test]
    fn test_rebuild_applies_params_and_clears() {
        let mut channel = ReverbChannel::new(48000, ReverbParams::default()).unwrap();
        impulse_tail(&mut channel, 3000);

        let params = ReverbParams {
            pre_delay_ms: 0.0,
            ..ReverbParams::default()
        };
        channel.rebuild(params);
        assert_eq!(channel.params(), params);
        assert_eq!(channel.pre_delay_samples(), 1);

        // Nothing left from the previous impulse
        for _ in 0..2000 {
            assert_eq!(channel.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_reset_matches_fresh_channel() {
        let mut used = ReverbChannel::new(44100, ReverbParams::default()).unwrap();
        impulse_tail(&mut used, 5000);
        used.reset();

        let mut fresh = ReverbChannel::new(44100, ReverbParams::default()).unwrap();
        assert_eq!(impulse_tail(&mut used, 6000), impulse_tail(&mut fresh, 6000));
    }

    #[test]
    fn test_needs_rebuild_ignores_wet() {
        let base = ReverbParams::default();
        let wetter = ReverbParams { wet: 0.9, ..base };
        let bigger = ReverbParams {
            room_size: 0.9,
            ..base
        };
        assert!(!base.needs_rebuild(&wetter));
        assert!(base.needs_rebuild(&bigger));
    }

    #[test]
    fn test_words_roundtrip_order() {
        let params = ReverbParams {
            wet: 0.1,
            room_size: 0.5,
            damping: 0.2,
            pre_delay_ms: 42.0,
        };
        assert_eq!(params.to_words(), [0.1, 0.5, 0.2, 42.0]);
        assert_eq!(ReverbParams::from_words(params.to_words()), params);
    }
}
