//! C ABI
//!
//! Opaque-handle surface for host wrappers written in C or C++:
//!
//! ```c
//! EfxContext *ctx = efx_create_context(48000, 2);
//! efx_set_gain(ctx, 0.8f);
//! efx_process_block(ctx, in, out, frames, 2);   // audio callback
//! efx_destroy_context(ctx);
//! ```
//!
//! Every function accepts a null handle and does nothing (processing
//! degrades to a copy). Nothing here reports errors to the caller; rejected
//! arguments are logged on the control path.

#![allow(clippy::not_unsafe_ptr_arg_deref)] // FFI functions receive raw pointers from C

use std::cell::UnsafeCell;
use std::ffi::{c_int, c_uint};
use std::ptr;

use efx_dsp::FilterType;
use tracing::warn;

use crate::context::DspContext;
use crate::control::DspControls;

/// Handle returned by [`efx_create_context`]
///
/// Setters go through the control handle; only [`efx_process_block`] and
/// [`efx_reset`] reach the engine itself.
pub struct EfxContext {
    controls: DspControls,
    engine: UnsafeCell<DspContext>,
}

fn band_index(band: c_int) -> Option<usize> {
    match usize::try_from(band) {
        Ok(band) => Some(band),
        Err(_) => {
            warn!(band, "Negative EQ band index ignored");
            None
        }
    }
}

fn filter_type(code: c_int) -> Option<FilterType> {
    match code {
        0 => Some(FilterType::Peaking),
        1 => Some(FilterType::LowShelf),
        2 => Some(FilterType::HighShelf),
        _ => None,
    }
}

/// Create a context, or return null if `sample_rate` is zero, `channels` is
/// outside `1..=MAX_CHANNELS`, or allocation fails
#[no_mangle]
pub extern "C" fn efx_create_context(sample_rate: c_uint, channels: c_uint) -> *mut EfxContext {
    match DspContext::new(sample_rate, channels as usize) {
        Ok(engine) => Box::into_raw(Box::new(EfxContext {
            controls: engine.controls().clone(),
            engine: UnsafeCell::new(engine),
        })),
        Err(e) => {
            warn!(sample_rate, channels, error = %e, "Context creation failed");
            ptr::null_mut()
        }
    }
}

/// Release a context
///
/// # Safety
/// `ctx` must be null or a pointer from [`efx_create_context`] that has not
/// been destroyed yet, and no other call may be using it.
#[no_mangle]
pub unsafe extern "C" fn efx_destroy_context(ctx: *mut EfxContext) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx));
    }
}

/// Clear all filter and reverb memory, keeping the parameters
///
/// # Safety
/// `ctx` must be null or a live handle, and [`efx_process_block`] must not
/// be running on it concurrently.
#[no_mangle]
pub unsafe extern "C" fn efx_reset(ctx: *mut EfxContext) {
    if let Some(ctx) = ctx.as_ref() {
        (*ctx.engine.get()).reset();
    }
}

/// Process `frames` interleaved frames; `input` and `output` may be the same buffer
///
/// With a null handle, or `channels` not matching the context, the input is
/// copied to the output unchanged.
///
/// # Safety
/// - `ctx` must be null or a live handle, driven by one thread at a time
/// - `input` and `output` must each be valid for `frames * channels` samples
///   and must either be identical or not overlap
#[no_mangle]
pub unsafe extern "C" fn efx_process_block(
    ctx: *mut EfxContext,
    input: *const f32,
    output: *mut f32,
    frames: usize,
    channels: c_uint,
) {
    if input.is_null() || output.is_null() || frames == 0 {
        return;
    }
    let channels = channels as usize;
    let samples = frames.saturating_mul(channels);

    let Some(ctx) = ctx.as_ref() else {
        if !ptr::eq(input, output) {
            ptr::copy(input, output, samples);
        }
        return;
    };
    let engine = &mut *ctx.engine.get();

    if ptr::eq(input, output) {
        let buffer = std::slice::from_raw_parts_mut(output, samples);
        engine.process_in_place(buffer, frames, channels);
    } else {
        let input = std::slice::from_raw_parts(input, samples);
        let output = std::slice::from_raw_parts_mut(output, samples);
        engine.process_block(input, output, frames, channels);
    }
}

/// # Safety
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn efx_set_gain(ctx: *const EfxContext, linear_gain: f32) {
    if let Some(ctx) = ctx.as_ref() {
        ctx.controls.set_gain(linear_gain);
    }
}

/// # Safety
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn efx_set_eq_enabled(ctx: *const EfxContext, band: c_int, enabled: bool) {
    let Some(ctx) = ctx.as_ref() else { return };
    let Some(band) = band_index(band) else { return };

    if let Err(e) = ctx.controls.set_eq_enabled(band, enabled) {
        warn!(error = %e, "EQ enable ignored");
    }
}

/// Retune a band, keeping its current filter type
///
/// # Safety
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn efx_set_eq_params(
    ctx: *const EfxContext,
    band: c_int,
    frequency: f32,
    q: f32,
    gain_db: f32,
) {
    let Some(ctx) = ctx.as_ref() else { return };
    let Some(band) = band_index(band) else { return };

    if let Err(e) = ctx.controls.set_eq_params(band, frequency, q, gain_db) {
        warn!(error = %e, "EQ params ignored");
    }
}

/// Retune a band with an explicit type: 0 = peaking, 1 = low shelf, 2 = high shelf
///
/// # Safety
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn efx_set_eq_band(
    ctx: *const EfxContext,
    band: c_int,
    frequency: f32,
    q: f32,
    gain_db: f32,
    filter_type_code: c_int,
) {
    let Some(ctx) = ctx.as_ref() else { return };
    let Some(band) = band_index(band) else { return };
    let Some(filter_type) = filter_type(filter_type_code) else {
        warn!(filter_type_code, "Unknown EQ filter type ignored");
        return;
    };

    if let Err(e) = ctx
        .controls
        .set_eq_band(band, frequency, q, gain_db, filter_type)
    {
        warn!(error = %e, "EQ band ignored");
    }
}

/// # Safety
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn efx_set_reverb_enabled(ctx: *const EfxContext, enabled: bool) {
    if let Some(ctx) = ctx.as_ref() {
        ctx.controls.set_reverb_enabled(enabled);
    }
}

/// Retune the reverb; the audio thread adopts it at its next block
///
/// # Safety
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn efx_set_reverb_params(
    ctx: *const EfxContext,
    wet: f32,
    room_size: f32,
    damping: f32,
    pre_delay_ms: f32,
) {
    if let Some(ctx) = ctx.as_ref() {
        ctx.controls
            .set_reverb_params(wet, room_size, damping, pre_delay_ms);
    }
}

/// # Safety
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn efx_set_limiter_enabled(ctx: *const EfxContext, enabled: bool) {
    if let Some(ctx) = ctx.as_ref() {
        ctx.controls.set_limiter_enabled(enabled);
    }
}
