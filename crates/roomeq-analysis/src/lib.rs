//! roomeq Analysis - Spectral transform pipeline for room measurement
//!
//! Pure numeric building blocks used by the measurement workflow:
//!
//! - [`fft`] - Forward/inverse transforms, magnitude and phase extraction, windows
//! - [`convolution`] - Time-domain convolution through the frequency domain
//! - [`smoothing`] - Fractional-octave smoothing (linear or log domain)
//! - [`correction`] - Correction curves and FIR filter synthesis
//! - [`vector`] - Fixed-length resizing and vector averaging
//! - [`signal`] - Test stimuli (logarithmic sine sweep, click)
//! - [`peaks`] - Greedy peak picking for delay estimation
//!
//! Nothing in this crate holds state between calls. Transform sizes are
//! arbitrary; `rustfft` plans non-power-of-two lengths directly.
//!
//! ## Example Workflow
//!
//! ```rust
//! use roomeq_analysis::{SineSweep, Window, correction, fft, smoothing};
//!
//! let sweep = SineSweep::new(48000.0, 20.0, 20000.0, 0.25).with_gain(0.8);
//! let samples = sweep.generate();
//!
//! let spectrum = fft::forward_transform(&samples);
//! let amplitude = fft::magnitudes(&spectrum.real, &spectrum.imag);
//! let smoothed = smoothing::smooth(&amplitude, 1.0 / 6.0, true);
//!
//! let curves = correction::generate_correction_curve(
//!     48000.0,
//!     30.0,
//!     18000.0,
//!     correction::db_to_gain(10.0),
//!     correction::db_to_gain(-10.0),
//!     &[&smoothed],
//! );
//! let fir = correction::generate_fir_filter(&curves[0], 512, Window::Hann);
//! assert_eq!(fir.len(), 512);
//! ```

pub mod convolution;
pub mod correction;
pub mod fft;
pub mod peaks;
pub mod signal;
pub mod smoothing;
pub mod vector;

// Re-export main types
pub use convolution::{convolve, vector_multiply};
pub use correction::{
    db_to_gain, gain_to_db, generate_correction_curve, generate_fir_filter,
    generate_minimum_phase_filter,
};
pub use fft::{Fft, Spectrum, Window, forward_transform, inverse_transform, magnitudes, phases};
pub use peaks::find_peaks;
pub use signal::{Click, SineSweep, impulse};
pub use smoothing::{psychoacoustic_smooth, smooth};
pub use vector::{AverageMode, resize, vector_average};

/// Floor applied before taking logarithms or dividing by magnitudes.
pub const EPSILON: f32 = 1e-12;
