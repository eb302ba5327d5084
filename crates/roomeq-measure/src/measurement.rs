//! Measurement data model.
//!
//! A [`Measurement`] is an ordered set of [`MeasurementChannel`]s captured or
//! derived at one sample rate. Each channel keeps its impulse response next
//! to the full complex spectrum and the amplitude and phase derived from it.

use roomeq_analysis::{EPSILON, forward_transform, inverse_transform, magnitudes, phases};
use std::fmt;

/// Identifier assigned by the [`Workspace`](crate::Workspace) on insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MeasurementId(pub u64);

impl fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One acquired or derived signal.
///
/// `real`, `imag`, `amplitude` and `phase` always have the same length. The
/// impulse response length is independent of it.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementChannel {
    impulse_response: Vec<f32>,
    real: Vec<f32>,
    imag: Vec<f32>,
    amplitude: Vec<f32>,
    phase: Vec<f32>,
}

impl MeasurementChannel {
    /// Channel from a time-domain signal.
    ///
    /// With a `reference`, the spectrum is divided by the reference spectrum
    /// (deconvolution) and the impulse response is rebuilt from the result.
    /// A reference of the same length divides bin by bin as complex numbers;
    /// otherwise only its magnitude divides, over the common length. Bins
    /// where the reference is effectively zero become zero.
    pub fn from_impulse_response(
        impulse_response: Vec<f32>,
        reference: Option<&MeasurementChannel>,
    ) -> Self {
        let spectrum = forward_transform(&impulse_response);

        let Some(reference) = reference else {
            let amplitude = magnitudes(&spectrum.real, &spectrum.imag);
            let phase = phases(&spectrum.real, &spectrum.imag);
            return Self {
                impulse_response,
                real: spectrum.real,
                imag: spectrum.imag,
                amplitude,
                phase,
            };
        };

        let mut real = spectrum.real;
        let mut imag = spectrum.imag;

        if reference.len() == real.len() {
            for k in 0..real.len() {
                let (c, d) = (reference.real[k], reference.imag[k]);
                let denom = c * c + d * d;
                if denom < EPSILON {
                    real[k] = 0.0;
                    imag[k] = 0.0;
                } else {
                    let (a, b) = (real[k], imag[k]);
                    real[k] = (a * c + b * d) / denom;
                    imag[k] = (b * c - a * d) / denom;
                }
            }
        } else {
            let common = reference.len().min(real.len());
            for k in 0..common {
                let scale = reference.amplitude[k];
                if scale < EPSILON {
                    real[k] = 0.0;
                    imag[k] = 0.0;
                } else {
                    real[k] /= scale;
                    imag[k] /= scale;
                }
            }
        }

        Self::from_spectrum(real, imag)
    }

    /// Channel from a complex spectrum; the impulse response is its inverse
    /// transform.
    ///
    /// `imag` is truncated or zero-padded to the length of `real`.
    pub fn from_spectrum(real: Vec<f32>, mut imag: Vec<f32>) -> Self {
        imag.resize(real.len(), 0.0);
        let impulse_response = inverse_transform(&real, &imag);
        let amplitude = magnitudes(&real, &imag);
        let phase = phases(&real, &imag);
        Self {
            impulse_response,
            real,
            imag,
            amplitude,
            phase,
        }
    }

    /// Zero-phase channel with the given magnitude response.
    pub fn from_amplitude(amplitude: Vec<f32>) -> Self {
        let imag = vec![0.0; amplitude.len()];
        Self::from_spectrum(amplitude, imag)
    }

    /// Time-domain signal
    pub fn impulse_response(&self) -> &[f32] {
        &self.impulse_response
    }

    /// Real parts of the spectrum
    pub fn real(&self) -> &[f32] {
        &self.real
    }

    /// Imaginary parts of the spectrum
    pub fn imag(&self) -> &[f32] {
        &self.imag
    }

    /// Magnitude per bin
    pub fn amplitude(&self) -> &[f32] {
        &self.amplitude
    }

    /// Single-quadrant phase per bin, in radians
    pub fn phase(&self) -> &[f32] {
        &self.phase
    }

    /// Number of spectral bins
    pub fn len(&self) -> usize {
        self.real.len()
    }

    /// True if the channel has no spectral bins
    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }
}

/// What a measurement is and which reference channels it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementKind {
    /// Direct capture. `sweep` is the stimulus the capture was deconvolved
    /// by; imported impulse responses have none.
    Raw {
        /// Stimulus spectrum.
        sweep: Option<MeasurementChannel>,
    },
    /// Result of averaging, smoothing or convolving other measurements.
    Combined {
        /// Magnitude-product previews of a convolution, one per channel.
        previews: Vec<MeasurementChannel>,
    },
    /// Target response.
    HouseCurve,
    /// Microphone calibration curve.
    MicCalibration,
    /// Correction filter.
    Correction {
        /// Correction curves the filters were designed from.
        curves: Vec<MeasurementChannel>,
    },
}

impl MeasurementKind {
    /// Short lowercase label
    pub fn label(&self) -> &'static str {
        match self {
            MeasurementKind::Raw { .. } => "raw",
            MeasurementKind::Combined { .. } => "combined",
            MeasurementKind::HouseCurve => "house-curve",
            MeasurementKind::MicCalibration => "mic-calibration",
            MeasurementKind::Correction { .. } => "correction",
        }
    }
}

/// A named set of channels at one sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Workspace identifier; zero until inserted.
    pub id: MeasurementId,
    /// Display name.
    pub name: String,
    /// Sample rate of every channel, in Hz.
    pub sample_rate: u32,
    /// Channels in output order.
    pub channels: Vec<MeasurementChannel>,
    /// Kind and reference channels.
    pub kind: MeasurementKind,
}

impl Measurement {
    /// Create a measurement that has not been inserted yet.
    pub fn new(
        name: impl Into<String>,
        sample_rate: u32,
        channels: Vec<MeasurementChannel>,
        kind: MeasurementKind,
    ) -> Self {
        Self {
            id: MeasurementId::default(),
            name: name.into(),
            sample_rate,
            channels,
            kind,
        }
    }

    /// Reference channels of the measurement's kind: the sweep of a raw
    /// capture, the previews of a combination, the curves of a correction.
    pub fn reference_channels(&self) -> &[MeasurementChannel] {
        match &self.kind {
            MeasurementKind::Raw { sweep } => sweep.as_slice(),
            MeasurementKind::Combined { previews } => previews,
            MeasurementKind::Correction { curves } => curves,
            MeasurementKind::HouseCurve | MeasurementKind::MicCalibration => &[],
        }
    }

    /// True for direct captures
    pub fn is_raw(&self) -> bool {
        matches!(self.kind, MeasurementKind::Raw { .. })
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
