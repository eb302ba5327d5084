//! Correction curve synthesis and FIR filter design.
//!
//! A correction curve is a per-bin linear gain that pulls a measured
//! amplitude response toward a flat target inside a frequency band. The FIR
//! designers turn such a curve into a filter kernel, either linear phase
//! (symmetric, peak centered) or minimum phase (energy at the front).

use crate::EPSILON;
use crate::fft::{Fft, Window, inverse_transform};
use rustfft::num_complex::Complex;

/// Convert decibels to linear gain
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear gain to decibels
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(EPSILON).log10()
}

/// Bin index for `hz` in an `len`-bin spectrum sampled at `sample_rate`.
fn frequency_bin(hz: f32, len: usize, sample_rate: f32) -> usize {
    if sample_rate <= 0.0 || hz <= 0.0 {
        return 0;
    }
    let bin = (f64::from(hz) * len as f64 / f64::from(sample_rate)).round();
    (bin as usize).min(len)
}

/// Geometric mean of `amp[start..end]`, accumulated in `f64`.
fn log_average(amp: &[f32], start: usize, end: usize) -> f64 {
    let band = &amp[start..end];
    let sum: f64 = band
        .iter()
        .map(|&a| f64::from(a.max(EPSILON)).ln())
        .sum();
    (sum / band.len() as f64).exp()
}

/// Build one correction curve per amplitude spectrum.
///
/// The band `[low_hz, high_hz)` maps to bins `round(hz * N / sample_rate)`,
/// clamped to the spectrum length. The target level is the arithmetic mean,
/// over all channels, of each channel's geometric-mean magnitude inside the
/// band. Inside the band every bin gets `target / amp` clamped to
/// `[max_cut, max_boost]` (linear gains); outside it stays at 1.0.
pub fn generate_correction_curve(
    sample_rate: f32,
    low_hz: f32,
    high_hz: f32,
    max_boost: f32,
    max_cut: f32,
    amps: &[&[f32]],
) -> Vec<Vec<f32>> {
    let bands: Vec<(usize, usize)> = amps
        .iter()
        .map(|amp| {
            let len = amp.len();
            (
                frequency_bin(low_hz, len, sample_rate),
                frequency_bin(high_hz, len, sample_rate),
            )
        })
        .collect();

    let levels: Vec<f64> = amps
        .iter()
        .zip(&bands)
        .filter(|(_, (lo, hi))| lo < hi)
        .map(|(amp, &(lo, hi))| log_average(amp, lo, hi))
        .collect();

    if levels.is_empty() {
        return amps.iter().map(|amp| vec![1.0; amp.len()]).collect();
    }
    let target = (levels.iter().sum::<f64>() / levels.len() as f64) as f32;

    let floor = max_cut.min(max_boost);
    let ceiling = max_cut.max(max_boost);

    amps.iter()
        .zip(&bands)
        .map(|(amp, &(lo, hi))| {
            let mut curve = vec![1.0; amp.len()];
            if lo < hi {
                for (c, &a) in curve[lo..hi].iter_mut().zip(&amp[lo..hi]) {
                    *c = (target / a.max(EPSILON)).clamp(floor, ceiling);
                }
            }
            curve
        })
        .collect()
}

/// Copy bins `1..=N/2` onto their conjugate positions so the spectrum
/// describes a real signal.
fn mirror_lower_half(amplitude: &[f32]) -> Vec<f32> {
    let n = amplitude.len();
    let mut full = amplitude.to_vec();
    for k in (n / 2 + 1)..n {
        full[k] = amplitude[n - k];
    }
    full
}

/// Zero-phase FIR design.
///
/// The amplitude response is made Hermitian, inverse transformed, circularly
/// shifted so the main tap sits at `length / 2`, cut to `length` taps and
/// windowed. Taps beyond the response length are zero.
pub fn generate_fir_filter(amplitude: &[f32], length: usize, window: Window) -> Vec<f32> {
    let n = amplitude.len();
    let mut taps = vec![0.0; length];
    if n == 0 || length == 0 {
        return taps;
    }

    let response = inverse_transform(&mirror_lower_half(amplitude), &[]);
    let half = (length / 2) as isize;
    let positive = n.div_ceil(2) as isize;
    let negative = (n / 2) as isize;

    for (i, tap) in taps.iter_mut().enumerate() {
        let j = i as isize - half;
        let source = if (0..positive).contains(&j) {
            Some(j as usize)
        } else if j < 0 && -j <= negative {
            Some((n as isize + j) as usize)
        } else {
            None
        };
        if let Some(idx) = source {
            *tap = response[idx];
        }
    }

    window.apply(&mut taps);
    taps
}

/// Minimum-phase FIR design through the real cepstrum.
///
/// The log magnitude is inverse transformed to the cepstrum, folded onto
/// positive quefrencies, transformed back and exponentiated; the resulting
/// spectrum has the requested magnitude with minimum phase. The first
/// `length` samples are kept and faded out with the trailing half of
/// `window`.
pub fn generate_minimum_phase_filter(amplitude: &[f32], length: usize, window: Window) -> Vec<f32> {
    let n = amplitude.len();
    if n == 0 || length == 0 {
        return vec![0.0; length];
    }

    let fft = Fft::new(n);
    let mut buffer: Vec<Complex<f32>> = mirror_lower_half(amplitude)
        .into_iter()
        .map(|a| Complex::new(a.max(EPSILON).ln(), 0.0))
        .collect();
    fft.inverse_complex(&mut buffer);

    // Fold: keep c[0] (and c[N/2] for even N), double the causal part,
    // drop the anticausal part.
    let mut folded = vec![Complex::new(0.0, 0.0); n];
    folded[0] = Complex::new(buffer[0].re, 0.0);
    for k in 1..n.div_ceil(2) {
        folded[k] = Complex::new(2.0 * buffer[k].re, 0.0);
    }
    if n % 2 == 0 && n > 1 {
        folded[n / 2] = Complex::new(buffer[n / 2].re, 0.0);
    }

    fft.forward_complex(&mut folded);
    for c in &mut folded {
        *c = c.exp();
    }
    fft.inverse_complex(&mut folded);

    let mut taps: Vec<f32> = folded.iter().take(length).map(|c| c.re).collect();
    taps.resize(length, 0.0);
    window.apply_fade_out(&mut taps);
    taps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::{forward_transform, magnitudes};

    #[test]
    fn test_db_conversion() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_gain(20.0) - 10.0).abs() < 1e-4);
        assert!((gain_to_db(0.1) + 20.0).abs() < 1e-4);
        assert!(gain_to_db(0.0).is_finite());
    }

    #[test]
    fn test_flat_input_gives_unity_correction() {
        let amp = vec![0.5; 1024];
        let curves = generate_correction_curve(48000.0, 100.0, 10000.0, 4.0, 0.25, &[&amp]);
        assert_eq!(curves.len(), 1);
        assert!(curves[0].iter().all(|&c| (c - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_correction_is_clamped_and_band_limited() {
        let n = 480;
        // Bin k corresponds to k * 100 Hz
        let mut amp = vec![1.0; n];
        amp[50] = 0.01;
        amp[60] = 100.0;
        let curves =
            generate_correction_curve(48000.0, 1000.0, 10000.0, db_to_gain(6.0), db_to_gain(-6.0), &[&amp]);
        let curve = &curves[0];

        assert_eq!(curve[5], 1.0);
        assert_eq!(curve[200], 1.0);
        assert!((curve[50] - db_to_gain(6.0)).abs() < 1e-5);
        assert!((curve[60] - db_to_gain(-6.0)).abs() < 1e-5);
    }

    #[test]
    fn test_target_averages_channel_levels() {
        let left = vec![1.0; 100];
        let right = vec![3.0; 100];
        let curves = generate_correction_curve(100.0, 10.0, 40.0, 10.0, 0.1, &[&left, &right]);
        assert!((curves[0][20] - 2.0).abs() < 1e-5);
        assert!((curves[1][20] - 2.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_band_is_unity() {
        let amp = vec![2.0; 64];
        let curves = generate_correction_curve(48000.0, 5000.0, 100.0, 10.0, 0.1, &[&amp]);
        assert!(curves[0].iter().all(|&c| c == 1.0));
    }

    #[test]
    fn test_flat_fir_is_centered_impulse() {
        let amp = vec![1.0; 2048];
        let fir = generate_fir_filter(&amp, 512, Window::Hann);
        assert_eq!(fir.len(), 512);
        assert!((fir[256] - 1.0).abs() < 1e-4);
        let rest: f32 = fir
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 256)
            .map(|(_, x)| x.abs())
            .sum();
        assert!(rest < 1e-3);
    }

    #[test]
    fn test_fir_is_symmetric() {
        let amp: Vec<f32> = (0..1024)
            .map(|k| 1.0 + 0.5 * (k as f32 * 0.05).sin())
            .collect();
        let fir = generate_fir_filter(&amp, 256, Window::Rectangular);
        let center = 128;
        for i in 1..128 {
            assert!((fir[center + i] - fir[center - i]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_fir_longer_than_response_is_zero_padded() {
        let amp = vec![1.0; 16];
        let fir = generate_fir_filter(&amp, 64, Window::Rectangular);
        assert!((fir[32] - 1.0).abs() < 1e-5);
        assert_eq!(fir[0], 0.0);
        assert_eq!(fir[63], 0.0);
    }

    #[test]
    fn test_flat_minimum_phase_is_leading_impulse() {
        let amp = vec![1.0; 1024];
        let fir = generate_minimum_phase_filter(&amp, 256, Window::Hann);
        assert!((fir[0] - 1.0).abs() < 1e-4);
        assert!(fir[1..].iter().all(|x| x.abs() < 1e-4));
    }

    #[test]
    fn test_minimum_phase_preserves_magnitude() {
        let n = 512;
        let amp: Vec<f32> = (0..n)
            .map(|k| {
                let k = k.min(n - k) as f32;
                1.0 / (1.0 + (k / 40.0).powi(2)).sqrt()
            })
            .collect();
        let fir = generate_minimum_phase_filter(&amp, n, Window::Rectangular);
        let spectrum = forward_transform(&fir);
        let mags = magnitudes(&spectrum.real, &spectrum.imag);
        for k in 0..n / 2 {
            assert!((mags[k] - amp[k]).abs() < 1e-2, "bin {k}: {} vs {}", mags[k], amp[k]);
        }
    }
}
