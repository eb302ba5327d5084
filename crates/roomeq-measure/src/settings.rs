//! Measurement settings and their TOML file format.
//!
//! Every section and field has a default, so a settings file only needs to
//! name what it changes:
//!
//! ```toml
//! num_measurements = 3
//!
//! [sweep]
//! duration_seconds = 2.0
//!
//! [correction]
//! linear_phase = false
//! filter_length = 4096
//! window = "blackman"
//! ```
//!
//! # Platform Paths
//!
//! [`Settings::default_path`] resolves to `roomeq/settings.toml` under the
//! user configuration directory (`~/.config` on Linux,
//! `~/Library/Application Support` on macOS, `%APPDATA%` on Windows).

use crate::error::{MeasureError, Result};
use roomeq_analysis::{AverageMode, SineSweep, Window, db_to_gain};
use roomeq_io::backend::BackendStreamConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "roomeq";
const SETTINGS_FILE: &str = "settings.toml";

/// All tunables of a measurement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of capture rounds per measurement.
    pub num_measurements: usize,
    /// Sweep stimulus.
    pub sweep: SweepSettings,
    /// Correction filter synthesis.
    pub correction: CorrectionSettings,
    /// Fractional-octave smoothing.
    pub smoothing: SmoothingSettings,
    /// Averaging of repeated captures.
    pub averaging: AveragingSettings,
    /// Capture timing.
    pub capture: CaptureSettings,
    /// Audio device and stream layout.
    pub audio: AudioSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_measurements: 1,
            sweep: SweepSettings::default(),
            correction: CorrectionSettings::default(),
            smoothing: SmoothingSettings::default(),
            averaging: AveragingSettings::default(),
            capture: CaptureSettings::default(),
            audio: AudioSettings::default(),
        }
    }
}

/// Logarithmic sweep parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    /// Start frequency in Hz.
    pub start_frequency_hz: f32,
    /// End frequency in Hz.
    pub end_frequency_hz: f32,
    /// Sweep length in seconds.
    pub duration_seconds: f32,
    /// Peak amplitude, linear.
    pub gain: f32,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            start_frequency_hz: 20.0,
            end_frequency_hz: 20000.0,
            duration_seconds: 1.0,
            gain: 0.8,
        }
    }
}

impl SweepSettings {
    /// Sweep generator for `sample_rate`.
    pub fn sweep(&self, sample_rate: u32) -> SineSweep {
        SineSweep::new(
            sample_rate as f32,
            self.start_frequency_hz,
            self.end_frequency_hz,
            self.duration_seconds,
        )
        .with_gain(self.gain)
    }
}

/// Correction filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionSettings {
    /// Linear phase (symmetric) when true, minimum phase otherwise.
    pub linear_phase: bool,
    /// FIR length in taps.
    pub filter_length: usize,
    /// Lower edge of the corrected band in Hz.
    pub low_cutoff_hz: f32,
    /// Upper edge of the corrected band in Hz.
    pub high_cutoff_hz: f32,
    /// Largest boost in dB.
    pub max_boost_db: f32,
    /// Largest cut in dB (negative).
    pub max_cut_db: f32,
    /// Window applied to the filter kernel.
    pub window: Window,
    /// Psychoacoustically smooth the measurement before designing.
    pub psychoacoustic_smoothing: bool,
}

impl Default for CorrectionSettings {
    fn default() -> Self {
        Self {
            linear_phase: true,
            filter_length: 512,
            low_cutoff_hz: 30.0,
            high_cutoff_hz: 20000.0,
            max_boost_db: 10.0,
            max_cut_db: -10.0,
            window: Window::Hann,
            psychoacoustic_smoothing: true,
        }
    }
}

impl CorrectionSettings {
    /// Boost limit as linear gain.
    pub fn max_boost_gain(&self) -> f32 {
        db_to_gain(self.max_boost_db)
    }

    /// Cut limit as linear gain.
    pub fn max_cut_gain(&self) -> f32 {
        db_to_gain(self.max_cut_db)
    }
}

/// Smoothing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingSettings {
    /// Smoothing width as a fraction of an octave.
    pub octave_fraction: f32,
    /// Smooth in the log domain.
    pub log_domain: bool,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            octave_fraction: 1.0 / 6.0,
            log_domain: true,
        }
    }
}

/// Averaging parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AveragingSettings {
    /// Linear or logarithmic mean.
    pub mode: AverageMode,
}

/// Capture timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Delay between starting playback and starting the recording.
    pub pre_delay_seconds: f32,
    /// Clicks played on all channels before each round.
    pub alignment_clicks: usize,
    /// Spacing between alignment clicks.
    pub click_spacing_seconds: f32,
    /// Settling time after the stream starts, in milliseconds.
    pub settle_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            pre_delay_seconds: 0.3,
            alignment_clicks: 2,
            click_spacing_seconds: 1.0,
            settle_ms: 200,
        }
    }
}

/// Audio stream layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Block size in frames.
    pub buffer_size: u32,
    /// Output (loudspeaker) channels.
    pub channels: u16,
    /// Input (microphone) channels.
    pub input_channels: u16,
    /// Input device name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Output device name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            input_channels: 1,
            input_device: None,
            output_device: None,
        }
    }
}

impl AudioSettings {
    /// Stream configuration for the audio backend.
    pub fn to_stream_config(&self) -> BackendStreamConfig {
        BackendStreamConfig {
            sample_rate: self.sample_rate,
            buffer_size: self.buffer_size,
            channels: self.channels,
            input_channels: self.input_channels,
            output_device: self.output_device.clone(),
            input_device: self.input_device.clone(),
        }
    }
}

impl Settings {
    /// Default settings file location.
    ///
    /// Returns a path under the current directory if the user configuration
    /// directory cannot be determined.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join(SETTINGS_FILE)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| MeasureError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load from the default path, or defaults when no file exists there.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse settings from a TOML string and validate them.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| MeasureError::write_file(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| MeasureError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        fn check(ok: bool, name: &str, reason: &str) -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(MeasureError::invalid_setting(name, reason))
            }
        }

        let sweep = &self.sweep;
        let correction = &self.correction;
        let audio = &self.audio;

        check(self.num_measurements > 0, "num_measurements", "must be at least 1")?;
        check(
            sweep.start_frequency_hz > 0.0,
            "sweep.start_frequency_hz",
            "must be positive",
        )?;
        check(
            sweep.end_frequency_hz > sweep.start_frequency_hz,
            "sweep.end_frequency_hz",
            "must be above the start frequency",
        )?;
        check(
            sweep.duration_seconds > 0.0,
            "sweep.duration_seconds",
            "must be positive",
        )?;
        check(
            sweep.gain > 0.0 && sweep.gain <= 1.0,
            "sweep.gain",
            "must be in (0, 1]",
        )?;
        check(
            correction.filter_length > 0,
            "correction.filter_length",
            "must be at least 1",
        )?;
        check(
            correction.low_cutoff_hz < correction.high_cutoff_hz,
            "correction.low_cutoff_hz",
            "must be below the high cutoff",
        )?;
        check(
            correction.max_boost_db >= 0.0,
            "correction.max_boost_db",
            "must not be negative",
        )?;
        check(
            correction.max_cut_db <= 0.0,
            "correction.max_cut_db",
            "must not be positive",
        )?;
        check(
            self.smoothing.octave_fraction > 0.0,
            "smoothing.octave_fraction",
            "must be positive",
        )?;
        check(
            self.capture.pre_delay_seconds >= 0.0,
            "capture.pre_delay_seconds",
            "must not be negative",
        )?;
        check(
            self.capture.click_spacing_seconds > 0.0,
            "capture.click_spacing_seconds",
            "must be positive",
        )?;
        check(audio.sample_rate > 0, "audio.sample_rate", "must be positive")?;
        check(audio.buffer_size > 0, "audio.buffer_size", "must be positive")?;
        check(audio.channels > 0, "audio.channels", "must be at least 1")?;
        check(
            audio.input_channels > 0,
            "audio.input_channels",
            "must be at least 1",
        )?;
        Ok(())
    }
}
