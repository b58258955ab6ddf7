//! Delay-Line Primitives
//!
//! Circular buffers behind the reverb: a plain delay line (used for
//! pre-delay), a damped feedback comb and a Schroeder allpass.
//!
//! Buffers are allocated once, at construction, for the longest length the
//! unit will ever need. Changing the logical length or the feedback later
//! clears the memory but never reallocates, so reconfiguration can run on the
//! audio thread between blocks.

use crate::error::{zeroed_buffer, DspError};

/// Convert a duration to a sample count at `sample_rate`, rounding to nearest (min 1)
pub fn ms_to_samples(ms: f32, sample_rate: u32) -> usize {
    let samples = (ms * 0.001 * sample_rate as f32 + 0.5) as usize;
    samples.max(1)
}

/// Fixed-capacity delay line with an adjustable logical length
pub struct DelayLine {
    buffer: Vec<f32>,
    len: usize,
    index: usize,
}

impl DelayLine {
    /// Allocate room for up to `capacity` samples of delay
    pub fn new(capacity: usize) -> Result<Self, DspError> {
        let capacity = capacity.max(1);
        Ok(Self {
            buffer: zeroed_buffer(capacity)?,
            len: capacity,
            index: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Set the delay in samples (clamped to 1..=capacity) and clear the memory
    pub fn set_len(&mut self, len: usize) {
        self.len = len.clamp(1, self.buffer.len());
        self.clear();
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }

    /// Read the sample written `len` calls ago, then store `sample` in its place
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let out = self.buffer[self.index];
        self.buffer[self.index] = sample;
        self.index += 1;
        if self.index >= self.len {
            self.index = 0;
        }
        out
    }
}

/// Feedback comb filter with one-pole damping in the loop
///
/// ```text
/// y[n]     = buf[n - L]
/// lp[n]    = (1 - d) * y[n] + d * lp[n - 1]
/// buf[n]   = x[n] + g * lp[n]
/// ```
///
/// The return value is the stored sample *before* feedback is injected, so
/// the output lags the input by the buffer length.
pub struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damped: f32,
}

impl CombFilter {
    pub fn new(len: usize, feedback: f32) -> Result<Self, DspError> {
        Ok(Self {
            buffer: zeroed_buffer(len.max(1))?,
            index: 0,
            feedback,
            damped: 0.0,
        })
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Change the feedback gain; the echo memory is cleared with it
    pub fn retune(&mut self, feedback: f32) {
        self.feedback = feedback;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.damped = 0.0;
    }

    #[inline]
    pub fn process(&mut self, sample: f32, damping: f32) -> f32 {
        let out = self.buffer[self.index];

        self.damped = out * (1.0 - damping) + self.damped * damping;
        self.buffer[self.index] = sample + self.damped * self.feedback;

        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }

        out
    }
}

/// Schroeder allpass: flat magnitude, smeared phase
///
/// ```text
/// v[n] = x[n] - g * buf[n - L]
/// y[n] = buf[n - L] + g * v[n]
/// ```
pub struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(len: usize, feedback: f32) -> Result<Self, DspError> {
        Ok(Self {
            buffer: zeroed_buffer(len.max(1))?,
            index: 0,
            feedback,
        })
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let delayed = self.buffer[self.index];
        let v = sample - self.feedback * delayed;
        self.buffer[self.index] = v;

        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }

        delayed + self.feedback * v
    }
}
