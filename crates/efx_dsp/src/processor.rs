//! Audio Processor Trait
//!
//! The seam a host wrapper drives: one in-place call per real-time callback,
//! plus a reset for stream restarts.

/// Context passed to processors containing stream metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessContext {
    pub sample_rate: u32,
    pub channels: usize,
    pub frames: usize,
}

impl ProcessContext {
    pub fn new(sample_rate: u32, channels: usize, frames: usize) -> Self {
        Self {
            sample_rate,
            channels,
            frames,
        }
    }

    /// Number of interleaved samples covered by this context
    pub fn samples(&self) -> usize {
        self.frames * self.channels
    }
}

/// Trait for audio processors driven from the real-time callback
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks, no logging)
/// - NO unbounded loops
/// - Constant or O(n) time complexity where n = frames * channels
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait AudioProcessor: Send {
    /// Process audio buffer in-place
    ///
    /// Buffer format is interleaved: [L0, R0, L1, R1, ...]
    fn process(&mut self, buffer: &mut [f32], context: &ProcessContext);

    /// Reset internal state (delay lines, filter memory, etc.)
    ///
    /// Not real-time safe; call while the stream is stopped.
    fn reset(&mut self);

    /// Human-readable name for debugging/UI
    fn name(&self) -> &'static str;
}
