//! FFT wrapper with windowing functions

use rustfft::{FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Window {
    /// Rectangular (no windowing)
    Rectangular,
    /// Hann window, `sin²(πn/N)`
    #[default]
    Hann,
    /// Hamming window
    Hamming,
    /// Blackman window
    Blackman,
}

impl Window {
    /// Window value at position `i` of an `n`-point window.
    fn value(self, i: usize, n: usize) -> f32 {
        let x = 2.0 * PI * i as f32 / n as f32;
        match self {
            Window::Rectangular => 1.0,
            Window::Hann => {
                let s = (PI * i as f32 / n as f32).sin();
                s * s
            }
            Window::Hamming => 0.54 - 0.46 * x.cos(),
            Window::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
        }
    }

    /// Apply window to a buffer
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample *= self.value(i, n);
        }
    }

    /// Apply only the trailing half of a window twice the buffer's length.
    ///
    /// Starts at the window's peak and tapers toward zero, which suits
    /// kernels whose energy sits at the front (minimum phase).
    pub fn apply_fade_out(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample *= self.value(n + i, 2 * n);
        }
    }

    /// Get window coefficients
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        let mut coeffs = vec![1.0; size];
        self.apply(&mut coeffs);
        coeffs
    }
}

/// Full-length complex spectrum split into real and imaginary parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    /// Real parts, one per bin
    pub real: Vec<f32>,
    /// Imaginary parts, one per bin
    pub imag: Vec<f32>,
}

impl Spectrum {
    /// Number of bins
    pub fn len(&self) -> usize {
        self.real.len()
    }

    /// True if the spectrum has no bins
    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    fn from_complex(buffer: &[Complex<f32>]) -> Self {
        let (real, imag) = buffer.iter().map(|c| (c.re, c.im)).unzip();
        Self { real, imag }
    }
}

/// FFT processor holding forward and inverse plans for one size
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    ifft: Arc<dyn rustfft::Fft<f32>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);

        Self { fft, ifft, size }
    }

    /// Get FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Perform forward FFT on real input
    ///
    /// The input is zero-padded or truncated to the FFT size. Returns all
    /// `size` bins (the upper half mirrors the lower half for real input).
    pub fn forward(&self, input: &[f32]) -> Spectrum {
        let mut buffer: Vec<Complex<f32>> = input
            .iter()
            .take(self.size)
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        self.forward_complex(&mut buffer);
        Spectrum::from_complex(&buffer)
    }

    /// Perform forward FFT on complex input (in-place)
    pub fn forward_complex(&self, buffer: &mut [Complex<f32>]) {
        if self.size > 0 {
            self.fft.process(buffer);
        }
    }

    /// Perform inverse FFT, normalized by `1/N`, and keep the real part
    pub fn inverse(&self, real: &[f32], imag: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = (0..self.size)
            .map(|k| {
                Complex::new(
                    real.get(k).copied().unwrap_or(0.0),
                    imag.get(k).copied().unwrap_or(0.0),
                )
            })
            .collect();

        self.inverse_complex(&mut buffer);
        buffer.iter().map(|c| c.re).collect()
    }

    /// Perform inverse FFT on complex buffer (in-place), normalized by `1/N`
    pub fn inverse_complex(&self, buffer: &mut [Complex<f32>]) {
        if self.size == 0 {
            return;
        }
        self.ifft.process(buffer);

        let scale = 1.0 / self.size as f32;
        for c in buffer.iter_mut() {
            *c *= scale;
        }
    }
}

/// Discrete Fourier transform of `samples`; output length equals input length.
pub fn forward_transform(samples: &[f32]) -> Spectrum {
    if samples.is_empty() {
        return Spectrum::default();
    }
    Fft::new(samples.len()).forward(samples)
}

/// Inverse transform of a full spectrum, normalized by `1/N`.
///
/// `N` is the length of `real`; a shorter `imag` is treated as zero-padded.
pub fn inverse_transform(real: &[f32], imag: &[f32]) -> Vec<f32> {
    if real.is_empty() {
        return Vec::new();
    }
    Fft::new(real.len()).inverse(real, imag)
}

/// Per-bin magnitude, `hypot(real, imag)`
pub fn magnitudes(real: &[f32], imag: &[f32]) -> Vec<f32> {
    real.iter().zip(imag).map(|(&re, &im)| re.hypot(im)).collect()
}

/// Per-bin phase using the single-quadrant arctangent `atan(imag/real)`.
///
/// Phases in the second and third quadrants fold onto the first and fourth.
/// An all-zero bin yields 0.
pub fn phases(real: &[f32], imag: &[f32]) -> Vec<f32> {
    real.iter()
        .zip(imag)
        .map(|(&re, &im)| {
            if re == 0.0 && im == 0.0 {
                0.0
            } else {
                (im / re).atan()
            }
        })
        .collect()
}

/// Compute magnitude spectrum in dB
pub fn magnitude_db(amplitude: &[f32]) -> Vec<f32> {
    amplitude
        .iter()
        .map(|&mag| 20.0 * mag.max(1e-10).log10())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_roundtrip() {
        let input: Vec<f32> = (0..256)
            .map(|i| (2.0 * PI * 10.0 * i as f32 / 256.0).sin())
            .collect();

        let spectrum = forward_transform(&input);
        assert_eq!(spectrum.len(), input.len());
        let reconstructed = inverse_transform(&spectrum.real, &spectrum.imag);

        for (a, b) in input.iter().zip(reconstructed.iter()) {
            assert!((a - b).abs() < 1e-4, "Mismatch: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_roundtrip_non_power_of_two() {
        let input: Vec<f32> = (0..1000).map(|i| ((i * 7) % 13) as f32 / 13.0 - 0.5).collect();
        let spectrum = forward_transform(&input);
        let reconstructed = inverse_transform(&spectrum.real, &spectrum.imag);
        for (a, b) in input.iter().zip(reconstructed.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_window_hann() {
        let mut buffer = vec![1.0; 100];
        Window::Hann.apply(&mut buffer);

        // Hann window should be 0 at the start, 1 at center
        assert!(buffer[0] < 0.01);
        assert!(buffer[99] < 0.01);
        assert!((buffer[50] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_window_rectangular_is_identity() {
        let mut buffer = vec![0.25; 16];
        Window::Rectangular.apply(&mut buffer);
        assert!(buffer.iter().all(|&x| x == 0.25));
    }

    #[test]
    fn test_fade_out_starts_at_unity() {
        let mut buffer = vec![1.0; 64];
        Window::Hann.apply_fade_out(&mut buffer);
        assert!((buffer[0] - 1.0).abs() < 1e-6);
        assert!(buffer[63] < 0.01);
        assert!(buffer.windows(2).all(|w| w[1] <= w[0] + 1e-6));
    }

    #[test]
    fn test_dc_detection() {
        let input = vec![1.0; 256];
        let spectrum = forward_transform(&input);
        let mags = magnitudes(&spectrum.real, &spectrum.imag);

        assert!((mags[0] - 256.0).abs() < 1e-3);
        let other: f32 = mags[1..].iter().sum();
        assert!(other < 1e-2);
    }

    #[test]
    fn test_single_quadrant_phase() {
        // 135 degrees folds onto -45 degrees
        let phase = phases(&[-1.0], &[1.0]);
        assert!((phase[0] + PI / 4.0).abs() < 1e-6);

        let zero = phases(&[0.0], &[0.0]);
        assert_eq!(zero[0], 0.0);
    }

    #[test]
    fn test_magnitude_is_hypot() {
        let mags = magnitudes(&[3.0, 0.0], &[4.0, -2.0]);
        assert_eq!(mags, vec![5.0, 2.0]);
    }

    #[test]
    fn test_empty_transform() {
        assert!(forward_transform(&[]).is_empty());
        assert!(inverse_transform(&[], &[]).is_empty());
    }
}
