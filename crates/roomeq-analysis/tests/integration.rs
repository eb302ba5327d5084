//! Integration tests for roomeq-analysis crate.
//!
//! Run the transform pipeline the way a measurement does: stimulus,
//! spectrum, smoothing, correction curve, filter design, convolution.

use roomeq_analysis::{
    AverageMode, SineSweep, Window, convolve, db_to_gain, find_peaks, forward_transform,
    generate_correction_curve, generate_fir_filter, generate_minimum_phase_filter,
    inverse_transform, magnitudes, psychoacoustic_smooth, smooth, vector_average,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Amplitude spectrum of a real signal.
fn amplitude(signal: &[f32]) -> Vec<f32> {
    let spectrum = forward_transform(signal);
    magnitudes(&spectrum.real, &spectrum.imag)
}

/// Symmetric amplitude response with a resonance centered on `bin`.
fn resonant_response(n: usize, bin: usize, boost: f32) -> Vec<f32> {
    (0..n)
        .map(|k| {
            let k = k.min(n - k) as f32;
            let d = (k - bin as f32) / 8.0;
            1.0 + (boost - 1.0) * (-d * d).exp()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Correction pipeline
// ---------------------------------------------------------------------------

#[test]
fn correction_flattens_resonance() {
    let n = 4800;
    let sample_rate = 48000.0;
    // 10 Hz per bin, resonance at 1 kHz
    let room = resonant_response(n, 100, 2.0);

    let curves = generate_correction_curve(
        sample_rate,
        100.0,
        20000.0,
        db_to_gain(10.0),
        db_to_gain(-10.0),
        &[&room],
    );
    let corrected: Vec<f32> = room.iter().zip(&curves[0]).map(|(a, c)| a * c).collect();

    let band = &corrected[10..2000];
    let min = band.iter().copied().fold(f32::MAX, f32::min);
    let max = band.iter().copied().fold(f32::MIN, f32::max);
    assert!((max - min).abs() < 1e-3, "corrected band spans {min}..{max}");
}

#[test]
fn full_length_fir_reproduces_curve_magnitude() {
    let n = 1024;
    let curve = resonant_response(n, 64, 0.5);
    let fir = generate_fir_filter(&curve, n, Window::Rectangular);
    let response = amplitude(&fir);

    for k in 0..n / 2 {
        assert!(
            (response[k] - curve[k]).abs() < 1e-3,
            "bin {k}: {} vs {}",
            response[k],
            curve[k]
        );
    }
}

#[test]
fn minimum_phase_filter_front_loads_energy() {
    let n = 2048;
    let curve = resonant_response(n, 200, 3.0);
    let linear = generate_fir_filter(&curve, 512, Window::Hann);
    let minimum = generate_minimum_phase_filter(&curve, 512, Window::Hann);

    let energy = |taps: &[f32]| taps.iter().map(|x| x * x).sum::<f32>();
    assert!(energy(&minimum[..64]) > 0.9 * energy(&minimum));
    assert!(energy(&linear[..64]) < 0.1 * energy(&linear));
}

#[test]
fn smoothing_then_psychoacoustic_never_drops_below_input() {
    let room = resonant_response(2048, 300, 0.2);
    let smoothed = smooth(&room, 1.0 / 6.0, true);
    let guarded = psychoacoustic_smooth(&smoothed);
    assert!(guarded.iter().zip(&smoothed).all(|(g, s)| g >= s));
}

// ---------------------------------------------------------------------------
// Deconvolution and alignment
// ---------------------------------------------------------------------------

#[test]
fn sweep_deconvolution_recovers_delay() {
    let sweep = SineSweep::new(8000.0, 50.0, 3900.0, 0.5).generate();
    let n = sweep.len() * 2;

    let mut room = vec![0.0; n];
    room[37] = 0.5;
    let mut padded = sweep.clone();
    padded.resize(n, 0.0);
    let recorded = convolve(&padded, &room);

    let rec = forward_transform(&recorded);
    let reference = forward_transform(&padded);
    let (mut real, mut imag) = (vec![0.0; n], vec![0.0; n]);
    for k in 0..n {
        let (a, b) = (rec.real[k], rec.imag[k]);
        let (c, d) = (reference.real[k], reference.imag[k]);
        let denom = c * c + d * d;
        if denom > 1e-6 {
            real[k] = (a * c + b * d) / denom;
            imag[k] = (b * c - a * d) / denom;
        }
    }
    let ir = inverse_transform(&real, &imag);

    assert_eq!(find_peaks(1, &ir), vec![37]);
}

#[test]
fn impulses_over_noise_floor_in_time_order() {
    let mut state = 0x2545_f491u32;
    let mut recording: Vec<f32> = (0..8000)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            0.01 * (state as i32 as f32) / (i32::MAX as f32)
        })
        .collect();
    let starts = [500usize, 2500, 4500, 6500];
    for (i, &start) in starts.iter().enumerate() {
        recording[start] = 1.0 - 0.2 * i as f32;
    }

    assert_eq!(find_peaks(4, &recording), starts.to_vec());
}

#[test]
fn averaging_identical_spectra_is_lossless() {
    let spectrum = amplitude(&SineSweep::new(8000.0, 50.0, 3000.0, 0.25).generate());
    for mode in [AverageMode::Linear, AverageMode::Logarithmic] {
        let avg = vector_average(mode, &[&spectrum, &spectrum]);
        for (a, b) in avg.iter().zip(&spectrum) {
            assert!((a - b).abs() <= b.abs() * 1e-5 + 1e-9);
        }
    }
}
