//! Measurement stimuli: logarithmic sine sweep and alignment click

use std::f64::consts::PI;

/// Logarithmic sine sweep generator
///
/// The instantaneous frequency moves from `start_freq` to `end_freq` on a
/// log scale and the phase is accumulated sample by sample. Amplitude tapers
/// linearly from `gain` down to `gain / 2`, which puts more energy into the
/// bass where rooms are noisiest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineSweep {
    sample_rate: f32,
    start_freq: f32,
    end_freq: f32,
    duration_secs: f32,
    gain: f32,
}

impl SineSweep {
    /// Create a new sine sweep generator at unity gain
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `start_freq` - Start frequency in Hz
    /// * `end_freq` - End frequency in Hz
    /// * `duration_secs` - Sweep duration in seconds
    pub fn new(sample_rate: f32, start_freq: f32, end_freq: f32, duration_secs: f32) -> Self {
        Self {
            sample_rate,
            start_freq,
            end_freq,
            duration_secs,
            gain: 1.0,
        }
    }

    /// Set the peak amplitude
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Generate the sweep
    pub fn generate(&self) -> Vec<f32> {
        let num_samples = self.num_samples();
        let step = 2.0 * PI / f64::from(self.sample_rate);
        let from = f64::from(self.start_freq);
        let to = f64::from(self.end_freq);
        let gain = f64::from(self.gain);

        let mut phase = 0.0f64;
        (0..num_samples)
            .map(|i| {
                let t = i as f64 / num_samples as f64;
                let frequency = to.powf(t) * from.powf(1.0 - t);
                let taper = 1.0 - 0.5 * t;
                let sample = gain * taper * phase.sin();
                phase += step * frequency;
                sample as f32
            })
            .collect()
    }

    /// Get sweep duration in seconds
    pub fn duration(&self) -> f32 {
        self.duration_secs
    }

    /// Get number of samples
    pub fn num_samples(&self) -> usize {
        (self.duration_secs * self.sample_rate) as usize
    }

    /// Get the sample rate in Hz
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

/// Short decaying sine burst used to align playback and capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    sample_rate: f32,
    decay_secs: f32,
    freq_hz: f32,
}

impl Click {
    /// Click with the default 0.2 s decay at 800 Hz
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            decay_secs: 0.2,
            freq_hz: 800.0,
        }
    }

    /// Set the decay time in seconds (also the click length)
    pub fn with_decay(mut self, decay_secs: f32) -> Self {
        self.decay_secs = decay_secs;
        self
    }

    /// Set the sine frequency in Hz
    pub fn with_frequency(mut self, freq_hz: f32) -> Self {
        self.freq_hz = freq_hz;
        self
    }

    /// Number of samples in the click
    pub fn num_samples(&self) -> usize {
        (self.decay_secs * self.sample_rate) as usize
    }

    /// Generate the click
    ///
    /// The envelope falls linearly from 1 to 0 over the decay time, offset
    /// by a quarter period so the decay begins at the first sine peak.
    pub fn generate(&self) -> Vec<f32> {
        let decay = f64::from(self.decay_secs);
        let freq = f64::from(self.freq_hz);
        let offset = 0.25 / freq;

        (0..self.num_samples())
            .map(|i| {
                let t = i as f64 / f64::from(self.sample_rate);
                let envelope = ((decay - t) / decay + offset).clamp(0.0, 1.0);
                (envelope * (2.0 * PI * t * freq).sin()) as f32
            })
            .collect()
    }
}

/// Generate a simple impulse signal
pub fn impulse(length: usize) -> Vec<f32> {
    let mut signal = vec![0.0; length];
    if let Some(first) = signal.first_mut() {
        *first = 1.0;
    }
    signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::{forward_transform, magnitudes};

    #[test]
    fn test_sweep_length() {
        let sweep = SineSweep::new(48000.0, 20.0, 20000.0, 1.0);
        assert_eq!(sweep.num_samples(), 48000);
        assert_eq!(sweep.generate().len(), 48000);
    }

    #[test]
    fn test_sweep_amplitude_taper() {
        let samples = SineSweep::new(48000.0, 20.0, 20000.0, 1.0)
            .with_gain(0.8)
            .generate();

        let head = samples[..4800].iter().fold(0.0f32, |m, x| m.max(x.abs()));
        let tail = samples[43200..].iter().fold(0.0f32, |m, x| m.max(x.abs()));
        assert!(head <= 0.8 + 1e-6);
        assert!(head > 0.7);
        assert!(tail < 0.45);
    }

    #[test]
    fn test_sweep_covers_band() {
        let samples = SineSweep::new(8000.0, 100.0, 3000.0, 1.0).generate();
        let spectrum = forward_transform(&samples);
        let mags = magnitudes(&spectrum.real, &spectrum.imag);
        // 1 Hz per bin at this length
        let in_band: f32 = mags[200..2800].iter().sum::<f32>() / 2600.0;
        let above: f32 = mags[3600..4000].iter().sum::<f32>() / 400.0;
        assert!(in_band > 10.0 * above);
    }

    #[test]
    fn test_sweep_starts_at_zero() {
        let samples = SineSweep::new(48000.0, 20.0, 20000.0, 0.1).generate();
        assert_eq!(samples[0], 0.0);
    }

    #[test]
    fn test_click_shape() {
        let click = Click::new(48000.0).generate();
        assert_eq!(click.len(), 9600);
        let peak = click.iter().fold(0.0f32, |m, x| m.max(x.abs()));
        assert!((peak - 1.0).abs() < 1e-2);
        assert!(click[9590].abs() < 0.01);
    }

    #[test]
    fn test_impulse() {
        let imp = impulse(100);
        assert_eq!(imp.len(), 100);
        assert_eq!(imp[0], 1.0);
        assert!(imp[1..].iter().all(|&x| x == 0.0));
        assert!(impulse(0).is_empty());
    }
}
