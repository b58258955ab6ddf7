//! Control-thread changes racing the audio thread

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use efx_core::{DspContext, FilterType, EQ_BANDS};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("efx_core=info")
        .with_test_writer()
        .try_init();
}

#[test]
fn setters_while_processing_stay_finite_and_bounded() {
    init_logging();

    let mut context = DspContext::new(48000, 2).unwrap();
    let controls = context.controls().clone();
    let running = Arc::new(AtomicBool::new(true));

    let writer = {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut step = 0_usize;
            while running.load(Ordering::Relaxed) {
                let band = step % EQ_BANDS;
                let t = (step % 97) as f32 / 97.0;

                controls.set_gain(0.5 + t);
                controls
                    .set_eq_band(
                        band,
                        20.0 + t * 18000.0,
                        0.3 + t * 7.0,
                        -24.0 + t * 48.0,
                        match step % 3 {
                            0 => FilterType::Peaking,
                            1 => FilterType::LowShelf,
                            _ => FilterType::HighShelf,
                        },
                    )
                    .unwrap();
                controls.set_eq_enabled(band, step % 2 == 0).unwrap();
                controls.set_reverb_params(t, 0.2 + t * 0.75, t * 0.7, t * 100.0);
                controls.set_reverb_enabled(step % 5 != 0);
                step += 1;
            }
            step
        })
    };

    let input: Vec<f32> = (0..512)
        .map(|i| (i as f32 * 0.05).sin() * 0.9)
        .collect();
    let mut output = vec![0.0; input.len()];

    for _ in 0..2000 {
        context.process_block(&input, &mut output, 256, 2);
        assert!(output.iter().all(|s| s.is_finite() && s.abs() < 1.0));
    }

    running.store(false, Ordering::Relaxed);
    let steps = writer.join().unwrap();
    assert!(steps > 0);
}

#[test]
fn shared_controls_from_many_threads() {
    init_logging();

    let context = DspContext::new(44100, 1).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let controls = context.controls().clone();
            thread::spawn(move || {
                for n in 0..200 {
                    controls.set_gain(i as f32 + n as f32 * 0.001);
                    controls.set_eq_params(i, 500.0 * (i + 1) as f32, 1.0, 3.0).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let params = context.params();
    for i in 0..4 {
        assert_eq!(params.eq[i].frequency, 500.0 * (i + 1) as f32);
        assert_eq!(params.eq[i].gain_db, 3.0);
    }
}
