//! Error types for measurement operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while measuring or composing measurements.
///
/// Every precondition failure is reported before anything is committed, so
/// the workspace is unchanged when one of these comes back.
#[derive(Debug, Error)]
pub enum MeasureError {
    /// The operation needs at least one measurement of the right kind
    #[error("no measurements available")]
    NoMeasurements,

    /// The operation needs a specific number of selected measurements
    #[error("expected {expected} selected measurement(s), found {found}")]
    SelectionCount {
        /// Number of selected measurements the operation needs.
        expected: usize,
        /// Number actually selected.
        found: usize,
    },

    /// Combined measurements disagree on sample rate
    #[error("sample rate mismatch: {0} Hz vs {1} Hz")]
    SampleRateMismatch(u32, u32),

    /// Combined measurements disagree on channel count
    #[error("channel count mismatch: {0} vs {1}")]
    ChannelCountMismatch(usize, usize),

    /// A calibration or house curve contained no usable points
    #[error("calibration data contains no frequency/gain points")]
    EmptyCalibration,

    /// Audio device or scheduler error
    #[error("audio error: {0}")]
    Audio(#[from] roomeq_io::Error),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A setting is out of its usable range
    #[error("invalid setting '{name}': {reason}")]
    InvalidSetting {
        /// Dotted path of the offending setting.
        name: String,
        /// Why the value cannot be used.
        reason: String,
    },
}

impl MeasureError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeasureError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeasureError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid setting error.
    pub fn invalid_setting(name: impl Into<String>, reason: impl Into<String>) -> Self {
        MeasureError::InvalidSetting {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Selection count error for an operation needing `expected` selections.
    pub fn selection(expected: usize, found: usize) -> Self {
        MeasureError::SelectionCount { expected, found }
    }
}

/// Result type for measurement operations.
pub type Result<T> = std::result::Result<T, MeasureError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = MeasureError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(err, MeasureError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path"))
        );
    }

    #[test]
    fn write_file_display() {
        let err = MeasureError::write_file("/a/ir.wav", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to write file"), "got: {msg}");
        assert!(msg.contains("/a/ir.wav"), "got: {msg}");
    }

    #[test]
    fn selection_count_display() {
        let err = MeasureError::selection(2, 1);
        assert_eq!(err.to_string(), "expected 2 selected measurement(s), found 1");
    }

    #[test]
    fn mismatch_display() {
        assert_eq!(
            MeasureError::SampleRateMismatch(48000, 44100).to_string(),
            "sample rate mismatch: 48000 Hz vs 44100 Hz"
        );
        assert_eq!(
            MeasureError::ChannelCountMismatch(2, 1).to_string(),
            "channel count mismatch: 2 vs 1"
        );
    }

    #[test]
    fn invalid_setting_display() {
        let err = MeasureError::invalid_setting("correction.filter_length", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid setting 'correction.filter_length': must be positive"
        );
    }

    #[test]
    fn audio_error_converts() {
        let err: MeasureError = roomeq_io::Error::Disconnected.into();
        assert!(matches!(err, MeasureError::Audio(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn read_file_source_is_some() {
        let err = MeasureError::read_file("/x", mock_io_err());
        assert!(err.source().is_some(), "ReadFile must expose I/O source");
    }

    #[test]
    fn toml_parse_converts() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: MeasureError = toml_err.into();
        assert!(err.to_string().starts_with("failed to parse TOML"));
    }
}
