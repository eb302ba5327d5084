//! Fractional-octave smoothing of amplitude spectra.
//!
//! Bin `i` is replaced by the mean of bins `[floor(i / 2^f), floor(i * 2^f) + 1)`,
//! where `f` is the smoothing width in octaves. The window grows with
//! frequency, so high bins are smoothed over many more bins than low ones.
//! A prefix sum keeps the cost at O(1) per bin regardless of width.

use crate::EPSILON;

/// Smooth `amplitude` over a window `octaves` wide.
///
/// With `log_domain` the mean is taken over `log2` magnitudes (floored at a
/// tiny epsilon) and exponentiated back, which averages in dB rather than in
/// linear gain.
pub fn smooth(amplitude: &[f32], octaves: f32, log_domain: bool) -> Vec<f32> {
    let n = amplitude.len();
    if n == 0 {
        return Vec::new();
    }

    let multiplier = 2.0_f64.powf(f64::from(octaves.max(0.0)));

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &a in amplitude {
        acc += if log_domain {
            f64::from(a.max(EPSILON)).log2()
        } else {
            f64::from(a)
        };
        prefix.push(acc);
    }

    (0..n)
        .map(|i| {
            let start = ((i as f64 / multiplier).floor() as usize).min(i);
            let end = (((i as f64 * multiplier).floor() as usize) + 1)
                .max(i + 1)
                .min(n);
            let mean = (prefix[end] - prefix[start]) / (end - start) as f64;
            if log_domain {
                mean.exp2() as f32
            } else {
                mean as f32
            }
        })
        .collect()
}

/// One-octave linear smoothing that never lowers a bin.
///
/// Each bin becomes `max(original, smoothed)`, so narrow dips are filled in
/// while peaks survive. Feeding this to the correction curve keeps the
/// filter from boosting into nulls it cannot fix.
pub fn psychoacoustic_smooth(amplitude: &[f32]) -> Vec<f32> {
    smooth(amplitude, 1.0, false)
        .into_iter()
        .zip(amplitude)
        .map(|(s, &a)| s.max(a))
        .collect()
}
