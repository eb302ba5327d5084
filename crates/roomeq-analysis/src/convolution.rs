//! Convolution through the frequency domain.
//!
//! Both inputs are zero-padded to the longer of the two lengths, transformed,
//! multiplied bin by bin and transformed back. The result is the circular
//! convolution over the padded length; callers that need the full linear
//! convolution pad the inputs themselves.

use crate::fft::Fft;
use crate::vector::resize;
use rustfft::num_complex::Complex;

/// Convolve `a` with `b`.
///
/// Output length is `max(a.len(), b.len())`. The inverse transform is
/// normalized by `1/N`, so convolving with a unit impulse returns the other
/// signal unchanged.
pub fn convolve(a: &[f32], b: &[f32]) -> Vec<f32> {
    let len = a.len().max(b.len());
    if len == 0 {
        return Vec::new();
    }

    let fft = Fft::new(len);

    let mut buf_a: Vec<Complex<f32>> = resize(a, len)
        .into_iter()
        .map(|x| Complex::new(x, 0.0))
        .collect();
    let mut buf_b: Vec<Complex<f32>> = resize(b, len)
        .into_iter()
        .map(|x| Complex::new(x, 0.0))
        .collect();

    fft.forward_complex(&mut buf_a);
    fft.forward_complex(&mut buf_b);

    for (x, y) in buf_a.iter_mut().zip(buf_b.iter()) {
        *x *= *y;
    }

    fft.inverse_complex(&mut buf_a);
    buf_a.iter().map(|c| c.re).collect()
}

/// Pointwise product of any number of vectors.
///
/// The result has the length of the longest input; positions past the end
/// of a shorter vector are left unscaled by it. Returns an empty vector when
/// called with no inputs.
pub fn vector_multiply(vectors: &[&[f32]]) -> Vec<f32> {
    let len = vectors.iter().map(|v| v.len()).max().unwrap_or(0);
    let mut result = vec![1.0; len];
    for v in vectors {
        for (r, &x) in result.iter_mut().zip(v.iter()) {
            *r *= x;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convolve_with_unit_impulse() {
        let signal: Vec<f32> = (0..64).map(|i| (i as f32 * 0.37).sin()).collect();
        let mut impulse = vec![0.0; 16];
        impulse[0] = 1.0;

        let out = convolve(&signal, &impulse);
        assert_eq!(out.len(), 64);
        for (a, b) in signal.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_convolve_delays_by_shifted_impulse() {
        let signal = vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let delay = vec![0.0, 0.0, 1.0];

        let out = convolve(&signal, &delay);
        let expected = [0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0];
        for (a, b) in out.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-4, "{out:?}");
        }
    }

    #[test]
    fn test_convolve_is_circular_over_padded_length() {
        let signal = vec![0.0, 0.0, 0.0, 1.0];
        let delay = vec![0.0, 1.0];
        let out = convolve(&signal, &delay);
        assert!((out[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_convolve_empty() {
        assert!(convolve(&[], &[]).is_empty());
    }

    #[test]
    fn test_vector_multiply() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 2.0];
        assert_eq!(vector_multiply(&[&a, &b]), vec![2.0, 4.0, 3.0]);
        assert!(vector_multiply(&[]).is_empty());
    }
}
