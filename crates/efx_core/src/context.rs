//! DSP Context and Block Pipeline
//!
//! [`DspContext`] owns every piece of per-channel state (one biquad per band
//! and channel, one reverb channel per channel) and runs the fixed chain
//!
//! ```text
//! in ─▶ gain ─▶ EQ band 0 ─▶ … ─▶ EQ band 11 ─▶ reverb mix ─▶ limiter ─▶ out
//! ```
//!
//! over interleaved blocks. Disabled stages are skipped entirely.
//!
//! # Real-time Safety
//!
//! `process_block` and `process_in_place` never allocate, lock or log.
//! Parameter changes arrive through [`DspControls`] and are picked up at the
//! start of each block (flags, gain, reverb) or per sample (EQ coefficients).

use std::sync::Arc;

use efx_dsp::{
    soft_limit, try_with_capacity, AudioProcessor, BiquadFilter, DspError, FilterType,
    ProcessContext, ReverbChannel, ReverbParams,
};
use tracing::info;

use crate::config::EngineConfig;
use crate::control::DspControls;
use crate::error::EngineResult;
use crate::params::{DspParams, EQ_BANDS, MAX_CHANNELS};

/// Everything the pipeline needs for one block, read once at its start
#[derive(Debug, Clone, Copy)]
struct BlockState {
    gain: f32,
    limiter_enabled: bool,
    reverb_enabled: bool,
    wet: f32,
    active_bands: [usize; EQ_BANDS],
    active_count: usize,
}

/// A running effects chain for one stream format
pub struct DspContext {
    sample_rate: u32,
    channels: usize,
    controls: DspControls,
    /// Band-major: the filter for (band, channel) is at `band * channels + channel`
    filters: Vec<BiquadFilter>,
    reverbs: Vec<ReverbChannel>,
    /// Reverb tuning the channels were last built with, plus the live wet level
    reverb_params: ReverbParams,
    reverb_seen: u32,
    reverb_active: bool,
}

impl DspContext {
    /// Create a context with unity gain, every EQ band and the reverb
    /// disabled, and the limiter enabled
    ///
    /// `channels` must be in `1..=MAX_CHANNELS`. All filter and delay memory
    /// is allocated here; a failed allocation is returned as an error.
    pub fn new(sample_rate: u32, channels: usize) -> EngineResult<Self> {
        if sample_rate == 0 {
            return Err(DspError::InvalidSampleRate(sample_rate).into());
        }
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(DspError::InvalidChannelCount(channels).into());
        }

        let controls = DspControls::new(sample_rate);

        let mut filters = try_with_capacity(EQ_BANDS * channels)?;
        for band in 0..EQ_BANDS {
            let design = controls.band_design(band);
            for _ in 0..channels {
                let mut filter = BiquadFilter::new(Arc::clone(&design));
                filter.set_enabled(false);
                filters.push(filter);
            }
        }

        let reverb_seen = controls.reverb_slot().sequence();
        let reverb_params = ReverbParams::from_words(controls.reverb_slot().load());
        let mut reverbs = try_with_capacity(channels)?;
        for _ in 0..channels {
            reverbs.push(ReverbChannel::new(sample_rate, reverb_params)?);
        }

        info!(sample_rate, channels, "DSP context created");

        Ok(Self {
            sample_rate,
            channels,
            controls,
            filters,
            reverbs,
            reverb_params,
            reverb_seen,
            reverb_active: false,
        })
    }

    /// Create a context from a validated stream config and apply its initial parameters
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        config.stream.validate()?;
        let context = Self::new(config.stream.sample_rate, usize::from(config.stream.channels))?;
        context.apply_params(&config.params);
        Ok(context)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Control handle for changing parameters from another thread
    pub fn controls(&self) -> &DspControls {
        &self.controls
    }

    pub fn set_gain(&self, linear_gain: f32) {
        self.controls.set_gain(linear_gain);
    }

    pub fn set_eq_enabled(&self, band: usize, enabled: bool) -> EngineResult<()> {
        self.controls.set_eq_enabled(band, enabled)
    }

    pub fn set_eq_params(
        &self,
        band: usize,
        frequency: f32,
        q: f32,
        gain_db: f32,
    ) -> EngineResult<()> {
        self.controls.set_eq_params(band, frequency, q, gain_db)
    }

    pub fn set_eq_band(
        &self,
        band: usize,
        frequency: f32,
        q: f32,
        gain_db: f32,
        filter_type: FilterType,
    ) -> EngineResult<()> {
        self.controls
            .set_eq_band(band, frequency, q, gain_db, filter_type)
    }

    pub fn set_reverb_enabled(&self, enabled: bool) {
        self.controls.set_reverb_enabled(enabled);
    }

    pub fn set_reverb_params(&self, wet: f32, room_size: f32, damping: f32, pre_delay_ms: f32) {
        self.controls
            .set_reverb_params(wet, room_size, damping, pre_delay_ms);
    }

    pub fn set_limiter_enabled(&self, enabled: bool) {
        self.controls.set_limiter_enabled(enabled);
    }

    pub fn apply_params(&self, params: &DspParams) {
        self.controls.apply(params);
    }

    pub fn params(&self) -> DspParams {
        self.controls.params()
    }

    /// Clear all filter and reverb memory, keeping every parameter
    pub fn reset(&mut self) {
        if let Some((seq, words)) = self.controls.reverb_slot().read_newer(self.reverb_seen) {
            self.reverb_seen = seq;
            self.reverb_params = ReverbParams::from_words(words);
        }

        for filter in &mut self.filters {
            filter.reset();
        }
        for reverb in &mut self.reverbs {
            reverb.rebuild(self.reverb_params);
        }

        info!("DSP context reset");
    }

    /// Process `frames` interleaved frames from `input` into `output`
    ///
    /// A `channels` value other than the context's own degrades to a
    /// straight copy. Slices shorter than `frames * channels` are processed
    /// up to their last whole frame.
    pub fn process_block(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        frames: usize,
        channels: usize,
    ) {
        if frames == 0 {
            return;
        }
        if channels != self.channels {
            passthrough(input, output, frames, channels);
            return;
        }

        let block = self.begin_block();
        let frames_in = input.chunks_exact(channels);
        let frames_out = output.chunks_exact_mut(channels);

        for (frame_in, frame_out) in frames_in.zip(frames_out).take(frames) {
            for (channel, (&sample, out)) in frame_in.iter().zip(frame_out).enumerate() {
                *out = self.render(sample, channel, &block);
            }
        }
    }

    /// Process `frames` interleaved frames of `buffer` in place
    pub fn process_in_place(&mut self, buffer: &mut [f32], frames: usize, channels: usize) {
        if frames == 0 || channels != self.channels {
            return;
        }

        let block = self.begin_block();
        for frame in buffer.chunks_exact_mut(channels).take(frames) {
            for (channel, sample) in frame.iter_mut().enumerate() {
                *sample = self.render(*sample, channel, &block);
            }
        }
    }

    /// Snapshot the control state and adopt block-boundary changes
    fn begin_block(&mut self) -> BlockState {
        let controls = self.controls.block_controls();
        let channels = self.channels;

        let mut active_bands = [0; EQ_BANDS];
        let mut active_count = 0;
        for (band, &enabled) in controls.bands.iter().enumerate() {
            let filters = &mut self.filters[band * channels..(band + 1) * channels];
            if filters[0].is_enabled() != enabled {
                for filter in filters.iter_mut() {
                    // Re-enabled bands start from silence, not stale history
                    if enabled {
                        filter.reset();
                    }
                    filter.set_enabled(enabled);
                }
            }
            if enabled {
                active_bands[active_count] = band;
                active_count += 1;
            }
        }

        if let Some((seq, words)) = self.controls.reverb_slot().read_newer(self.reverb_seen) {
            self.reverb_seen = seq;
            let params = ReverbParams::from_words(words);
            if self.reverb_params.needs_rebuild(&params) {
                for reverb in &mut self.reverbs {
                    reverb.rebuild(params);
                }
            }
            self.reverb_params = params;
        }

        if controls.reverb_enabled && !self.reverb_active {
            for reverb in &mut self.reverbs {
                reverb.reset();
            }
        }
        self.reverb_active = controls.reverb_enabled;

        BlockState {
            gain: controls.gain,
            limiter_enabled: controls.limiter_enabled,
            reverb_enabled: controls.reverb_enabled,
            wet: self.reverb_params.wet,
            active_bands,
            active_count,
        }
    }

    #[inline]
    fn render(&mut self, sample: f32, channel: usize, block: &BlockState) -> f32 {
        let mut x = sample * block.gain;

        for &band in &block.active_bands[..block.active_count] {
            x = self.filters[band * self.channels + channel].process(x);
        }

        if block.reverb_enabled {
            let wet = self.reverbs[channel].process(x);
            x = (1.0 - block.wet) * x + block.wet * wet;
        }

        if block.limiter_enabled {
            x = soft_limit(x);
        }
        x
    }
}

/// Copy as much of `input` as fits, bounded by `frames * channels`
fn passthrough(input: &[f32], output: &mut [f32], frames: usize, channels: usize) {
    let len = frames
        .saturating_mul(channels)
        .min(input.len())
        .min(output.len());
    output[..len].copy_from_slice(&input[..len]);
}

impl AudioProcessor for DspContext {
    /// A context at another sample rate leaves `buffer` untouched, like a channel mismatch
    fn process(&mut self, buffer: &mut [f32], context: &ProcessContext) {
        if context.sample_rate != self.sample_rate {
            return;
        }
        self.process_in_place(buffer, context.frames, context.channels);
    }

    fn reset(&mut self) {
        DspContext::reset(self);
    }

    fn name(&self) -> &'static str {
        "Efx Chain"
    }
}

impl std::fmt::Debug for DspContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DspContext")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("reverb_params", &self.reverb_params)
            .finish_non_exhaustive()
    }
}
