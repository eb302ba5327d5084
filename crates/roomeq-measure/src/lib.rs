//! Measurement orchestration for roomeq.
//!
//! This crate ties the transform pipeline in `roomeq-analysis` to the audio
//! scheduler in `roomeq-io`:
//!
//! - **Data model**: [`Measurement`], [`MeasurementChannel`] and the
//!   [`MeasurementKind`] sum type
//! - **Workspace**: [`Workspace`] holds measurements in insertion order plus
//!   the set of selected ones
//! - **Session**: [`MeasurementSession`] owns a duplex stream and plays
//!   clicks, sweeps and delay probes through the scheduler
//! - **Workflows**: [`capture`], [`average`], [`smooth`],
//!   [`generate_correction`], [`convolve_selection`] and the curve and
//!   impulse response importers
//! - **Settings**: [`Settings`], loaded from and saved to TOML
//!
//! ## Example
//!
//! ```rust,ignore
//! use roomeq_io::backend::LoopbackBackend;
//! use roomeq_measure::{MeasurementSession, Settings, Workspace};
//! use std::time::Duration;
//!
//! let settings = Settings::load_or_default()?;
//! let session = MeasurementSession::start(
//!     &LoopbackBackend::new(),
//!     &settings.audio.to_stream_config(),
//!     Duration::from_millis(settings.capture.settle_ms),
//! )
//! .await?;
//!
//! let mut workspace = Workspace::new();
//! roomeq_measure::capture(&mut workspace, &session, &settings).await?;
//! session.stop();
//!
//! roomeq_measure::generate_correction(&mut workspace, &settings.correction)?;
//! ```

pub mod error;
pub mod measurement;
pub mod session;
pub mod settings;
pub mod workflow;
pub mod workspace;

pub use error::{MeasureError, Result};
pub use measurement::{Measurement, MeasurementChannel, MeasurementId, MeasurementKind};
pub use session::{DelayEstimate, DelayOptions, MeasurementSession};
pub use settings::Settings;
pub use workflow::{
    average, capture, convolve_selection, export_impulse_responses, generate_correction,
    import_calibration, import_house_curve, import_impulse_responses, smooth,
};
pub use workspace::Workspace;
