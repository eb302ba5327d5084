//! Measurement workflows.
//!
//! Each workflow reads measurements from a [`Workspace`], computes new ones
//! and commits them only when everything succeeded. Precondition failures
//! come back before the workspace is touched.

use crate::error::{MeasureError, Result};
use crate::measurement::{Measurement, MeasurementChannel, MeasurementId, MeasurementKind};
use crate::session::MeasurementSession;
use crate::settings::{CorrectionSettings, Settings};
use crate::workspace::Workspace;
use roomeq_analysis::{
    AverageMode, EPSILON, convolve, db_to_gain, generate_correction_curve, generate_fir_filter,
    generate_minimum_phase_filter, psychoacoustic_smooth, smooth as smooth_amplitude,
    vector_average, vector_multiply,
};
use roomeq_io::scheduler::Source;
use std::path::Path;
use std::sync::Arc;

/// Resolution of imported calibration and house curves: one bin per Hz.
pub const CURVE_SAMPLE_RATE: u32 = 48000;

/// Capture `settings.num_measurements` rounds of sweep measurements.
///
/// Each round plays the alignment clicks on all channels, then sweeps every
/// output channel in turn while recording input channel 0. Captures are
/// deconvolved by the sweep. With more than one round the raw captures are
/// averaged right away.
pub async fn capture(
    workspace: &mut Workspace,
    session: &MeasurementSession,
    settings: &Settings,
) -> Result<Vec<MeasurementId>> {
    settings.validate()?;
    let sample_rate = session.sample_rate();
    let channels = session.output_channels();
    let rounds = settings.num_measurements;

    let sweep = settings.sweep.sweep(sample_rate).generate();
    let reference = MeasurementChannel::from_impulse_response(sweep.clone(), None);
    let sweep: Arc<[f32]> = sweep.into();

    tracing::info!(
        rounds,
        channels,
        sweep_frames = sweep.len(),
        "starting capture"
    );

    let mut captured = Vec::with_capacity(rounds);
    for round in 0..rounds {
        session
            .play_clicks(
                settings.capture.alignment_clicks,
                settings.capture.click_spacing_seconds,
            )
            .await?;

        let mut measured = Vec::with_capacity(channels);
        for channel in 0..channels {
            let mut sources: Vec<Source> = vec![None; channels];
            sources[channel] = Some(Arc::clone(&sweep));
            let recording = session
                .play_and_record(sources, settings.capture.pre_delay_seconds)
                .await?;
            measured.push(MeasurementChannel::from_impulse_response(
                recording,
                Some(&reference),
            ));
        }

        tracing::debug!(round, "capture round finished");
        captured.push(Measurement::new(
            format!("measurement-{}", workspace.len() + round),
            sample_rate,
            measured,
            MeasurementKind::Raw {
                sweep: Some(reference.clone()),
            },
        ));
    }

    if rounds == 1 {
        let ids = workspace.insert_all(captured);
        workspace.select(ids[0]);
        return Ok(ids);
    }

    let averaged = {
        let raws: Vec<&Measurement> = workspace
            .iter()
            .filter(|m| m.is_raw())
            .chain(&captured)
            .collect();
        average_of(&raws, settings.averaging.mode)?
    };
    let ids = workspace.insert_all(captured);
    workspace.clear_selection();
    let id = workspace.insert(averaged);
    workspace.select(id);
    Ok(ids)
}

/// Average the amplitude responses of all raw measurements.
///
/// The result is a zero-phase `Combined` measurement named "Average" and
/// becomes the only selection.
pub fn average(workspace: &mut Workspace, mode: AverageMode) -> Result<MeasurementId> {
    let raws: Vec<&Measurement> = workspace.iter().filter(|m| m.is_raw()).collect();
    let averaged = average_of(&raws, mode)?;

    workspace.clear_selection();
    let id = workspace.insert(averaged);
    workspace.select(id);
    Ok(id)
}

fn average_of(raws: &[&Measurement], mode: AverageMode) -> Result<Measurement> {
    let first = raws.first().ok_or(MeasureError::NoMeasurements)?;
    check_compatible(first, &raws[1..])?;

    let channels = (0..first.channel_count())
        .map(|i| {
            let amps: Vec<&[f32]> = raws.iter().map(|m| m.channels[i].amplitude()).collect();
            MeasurementChannel::from_amplitude(vector_average(mode, &amps))
        })
        .collect();

    let averaged = Measurement::new(
        "Average",
        first.sample_rate,
        channels,
        MeasurementKind::Combined {
            previews: Vec::new(),
        },
    );
    tracing::debug!(inputs = raws.len(), ?mode, "averaging measurements");
    Ok(averaged)
}

/// Smooth every selected measurement by `octaves` of an octave.
///
/// The complex bins are scaled to the smoothed magnitude, keeping their
/// phase. Inputs are deselected and the smoothed copies selected.
pub fn smooth(workspace: &mut Workspace, octaves: f32, log_domain: bool) -> Result<Vec<MeasurementId>> {
    let selected = workspace.selected();
    if selected.is_empty() {
        return Err(MeasureError::selection(1, 0));
    }

    let smoothed: Vec<Measurement> = selected
        .iter()
        .map(|m| {
            let channels = m
                .channels
                .iter()
                .map(|c| smooth_channel(c, octaves, log_domain))
                .collect();
            Measurement::new(
                format!("{} ({})", m.name, octave_label(octaves)),
                m.sample_rate,
                channels,
                MeasurementKind::Combined {
                    previews: Vec::new(),
                },
            )
        })
        .collect();
    let inputs: Vec<MeasurementId> = selected.iter().map(|m| m.id).collect();

    for id in inputs {
        workspace.deselect(id);
    }
    let ids = workspace.insert_all(smoothed);
    for &id in &ids {
        workspace.select(id);
    }
    Ok(ids)
}

/// "1/N oct" when the width is a whole fraction of an octave, otherwise the
/// width itself.
fn octave_label(octaves: f32) -> String {
    let inverse = 1.0 / octaves;
    if octaves > 0.0 && (inverse - inverse.round()).abs() < 1e-3 {
        format!("1/{} oct", inverse.round())
    } else {
        format!("{octaves:.3} oct")
    }
}

fn smooth_channel(channel: &MeasurementChannel, octaves: f32, log_domain: bool) -> MeasurementChannel {
    let smoothed = smooth_amplitude(channel.amplitude(), octaves, log_domain);
    let (real, imag) = smoothed
        .iter()
        .zip(channel.amplitude())
        .zip(channel.real().iter().zip(channel.imag()))
        .map(|((&target, &original), (&re, &im))| {
            if original < EPSILON {
                (target, 0.0)
            } else {
                let scale = target / original;
                (re * scale, im * scale)
            }
        })
        .unzip();
    MeasurementChannel::from_spectrum(real, imag)
}

/// Design a correction filter for the single selected measurement.
///
/// Commits the `Correction` measurement and the source convolved with it
/// together; the convolution ends up selected.
pub fn generate_correction(
    workspace: &mut Workspace,
    settings: &CorrectionSettings,
) -> Result<(MeasurementId, MeasurementId)> {
    let source = single_selected(workspace, 1)?[0];

    let amps: Vec<Vec<f32>> = source
        .channels
        .iter()
        .map(|c| {
            if settings.psychoacoustic_smoothing {
                psychoacoustic_smooth(c.amplitude())
            } else {
                c.amplitude().to_vec()
            }
        })
        .collect();
    let amp_refs: Vec<&[f32]> = amps.iter().map(Vec::as_slice).collect();

    let curves = generate_correction_curve(
        source.sample_rate as f32,
        settings.low_cutoff_hz,
        settings.high_cutoff_hz,
        settings.max_boost_gain(),
        settings.max_cut_gain(),
        &amp_refs,
    );

    let filters = curves
        .iter()
        .map(|curve| {
            let taps = if settings.linear_phase {
                generate_fir_filter(curve, settings.filter_length, settings.window)
            } else {
                generate_minimum_phase_filter(curve, settings.filter_length, settings.window)
            };
            MeasurementChannel::from_impulse_response(taps, None)
        })
        .collect();

    let correction = Measurement::new(
        format!("Correction Filter {}", source.name),
        source.sample_rate,
        filters,
        MeasurementKind::Correction {
            curves: curves
                .into_iter()
                .map(MeasurementChannel::from_amplitude)
                .collect(),
        },
    );
    let corrected = convolve_pair(source, &correction)?;
    let source_id = source.id;

    tracing::info!(
        source = %source.name,
        taps = settings.filter_length,
        linear_phase = settings.linear_phase,
        "correction filter designed"
    );

    workspace.deselect(source_id);
    let correction_id = workspace.insert(correction);
    let corrected_id = workspace.insert(corrected);
    workspace.select(corrected_id);
    Ok((correction_id, corrected_id))
}

/// Convolve the two selected measurements channel by channel.
pub fn convolve_selection(workspace: &mut Workspace) -> Result<MeasurementId> {
    let selected = single_selected(workspace, 2)?;
    let combined = convolve_pair(selected[0], selected[1])?;
    let inputs = [selected[0].id, selected[1].id];

    for id in inputs {
        workspace.deselect(id);
    }
    let id = workspace.insert(combined);
    workspace.select(id);
    Ok(id)
}

fn convolve_pair(a: &Measurement, b: &Measurement) -> Result<Measurement> {
    check_compatible(a, std::slice::from_ref(&b))?;

    let mut channels = Vec::with_capacity(a.channel_count());
    let mut previews = Vec::new();
    for (x, y) in a.channels.iter().zip(&b.channels) {
        let ir = convolve(x.impulse_response(), y.impulse_response());
        channels.push(MeasurementChannel::from_impulse_response(ir, None));
        if x.amplitude().len() == y.amplitude().len() {
            let product = vector_multiply(&[x.amplitude(), y.amplitude()]);
            previews.push(MeasurementChannel::from_amplitude(product));
        }
    }

    Ok(Measurement::new(
        format!("{} x {}", a.name, b.name),
        a.sample_rate,
        channels,
        MeasurementKind::Combined { previews },
    ))
}

/// Import a microphone calibration file.
///
/// Each line holds a frequency in Hz and a gain in dB. Lines that do not
/// parse are skipped. The result has two identical zero-phase channels at
/// one bin per Hz and is selected.
pub fn import_calibration(workspace: &mut Workspace, name: &str, text: &str) -> Result<MeasurementId> {
    import_curve(workspace, name, text, MeasurementKind::MicCalibration)
}

/// Import a house (target) curve in the calibration file format.
pub fn import_house_curve(workspace: &mut Workspace, name: &str, text: &str) -> Result<MeasurementId> {
    import_curve(workspace, name, text, MeasurementKind::HouseCurve)
}

fn import_curve(
    workspace: &mut Workspace,
    name: &str,
    text: &str,
    kind: MeasurementKind,
) -> Result<MeasurementId> {
    let points = parse_curve_points(text);
    if points.is_empty() {
        return Err(MeasureError::EmptyCalibration);
    }

    let amplitude = dense_curve(&points, CURVE_SAMPLE_RATE as usize);
    let channel = MeasurementChannel::from_amplitude(amplitude);
    let measurement = Measurement::new(
        name,
        CURVE_SAMPLE_RATE,
        vec![channel.clone(), channel],
        kind,
    );
    tracing::debug!(curve = name, points = points.len(), "curve imported");

    let id = workspace.insert(measurement);
    workspace.select(id);
    Ok(id)
}

/// `(frequency_hz, gain_db)` pairs, sorted by frequency.
fn parse_curve_points(text: &str) -> Vec<(f32, f32)> {
    let mut points: Vec<(f32, f32)> = text
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let point = match (fields.next(), fields.next()) {
                (Some(freq), Some(gain)) => freq.parse::<f32>().ok().zip(gain.parse::<f32>().ok()),
                _ => None,
            }
            .filter(|(freq, gain)| freq.is_finite() && gain.is_finite());
            if point.is_none() && !line.trim().is_empty() {
                tracing::debug!(line, "skipping calibration line");
            }
            point
        })
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

/// Linear gain per bin of an `len`-bin spectrum at one Hz per bin.
///
/// dB values are interpolated linearly between points and held beyond the
/// ends. Bins above Nyquist mirror the lower half.
fn dense_curve(points: &[(f32, f32)], len: usize) -> Vec<f32> {
    let mut amplitude = vec![1.0; len];
    let half = len / 2;
    let mut segment = 0;
    for (k, value) in amplitude.iter_mut().enumerate().take(half + 1) {
        let freq = k as f32;
        while segment + 1 < points.len() && points[segment + 1].0 <= freq {
            segment += 1;
        }
        let (f0, g0) = points[segment];
        let db = match points.get(segment + 1) {
            Some(&(f1, g1)) if freq >= f0 => g0 + (g1 - g0) * (freq - f0) / (f1 - f0),
            _ => g0,
        };
        *value = db_to_gain(db);
    }
    for k in half + 1..len {
        amplitude[k] = amplitude[len - k];
    }
    amplitude
}

/// Wrap externally loaded impulse responses as a raw measurement without a
/// sweep reference. The new measurement becomes the only selection.
pub fn import_impulse_responses(
    workspace: &mut Workspace,
    name: &str,
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
) -> Result<MeasurementId> {
    if channels.is_empty() {
        return Err(MeasureError::NoMeasurements);
    }
    let channels = channels
        .into_iter()
        .map(|ir| MeasurementChannel::from_impulse_response(ir, None))
        .collect();
    let measurement = Measurement::new(name, sample_rate, channels, MeasurementKind::Raw { sweep: None });

    workspace.clear_selection();
    let id = workspace.insert(measurement);
    workspace.select(id);
    Ok(id)
}

/// Write a measurement's impulse responses as a multi-channel WAV file.
pub fn export_impulse_responses(measurement: &Measurement, path: impl AsRef<Path>) -> Result<()> {
    let channels: Vec<Vec<f32>> = measurement
        .channels
        .iter()
        .map(|c| c.impulse_response().to_vec())
        .collect();
    roomeq_io::write_wav_channels(path.as_ref(), &channels, measurement.sample_rate)?;
    Ok(())
}

fn single_selected(workspace: &Workspace, expected: usize) -> Result<Vec<&Measurement>> {
    let selected = workspace.selected();
    if selected.len() == expected {
        Ok(selected)
    } else {
        Err(MeasureError::selection(expected, selected.len()))
    }
}

fn check_compatible(first: &Measurement, others: &[&Measurement]) -> Result<()> {
    for other in others {
        if other.sample_rate != first.sample_rate {
            return Err(MeasureError::SampleRateMismatch(
                first.sample_rate,
                other.sample_rate,
            ));
        }
        if other.channel_count() != first.channel_count() {
            return Err(MeasureError::ChannelCountMismatch(
                first.channel_count(),
                other.channel_count(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomeq_analysis::impulse;

    fn raw(workspace: &mut Workspace, name: &str, sample_rate: u32, amps: &[&[f32]]) -> MeasurementId {
        let channels = amps
            .iter()
            .map(|a| MeasurementChannel::from_amplitude(a.to_vec()))
            .collect();
        workspace.insert(Measurement::new(
            name,
            sample_rate,
            channels,
            MeasurementKind::Raw { sweep: None },
        ))
    }

    fn gain_at(measurement: &Measurement, bin: usize) -> f32 {
        measurement.channels[0].amplitude()[bin]
    }

    #[test]
    fn test_average_identical_is_lossless() {
        let mut workspace = Workspace::new();
        let amp = [1.0, 2.0, 3.0, 2.0];
        for name in ["a", "b", "c"] {
            raw(&mut workspace, name, 48000, &[&amp, &amp]);
        }

        for mode in [AverageMode::Linear, AverageMode::Logarithmic] {
            let id = average(&mut workspace, mode).unwrap();
            let averaged = workspace.get(id).unwrap();
            assert_eq!(averaged.name, "Average");
            assert_eq!(averaged.channel_count(), 2);
            for (got, want) in averaged.channels[1].amplitude().iter().zip(&amp) {
                assert!((got - want).abs() < 1e-5);
            }
            assert_eq!(workspace.selected_ids(), vec![id]);
        }
    }

    #[test]
    fn test_average_requires_raw_measurements() {
        let mut workspace = Workspace::new();
        import_house_curve(&mut workspace, "target", "100 0").unwrap();
        let before = workspace.len();
        assert!(matches!(
            average(&mut workspace, AverageMode::Linear),
            Err(MeasureError::NoMeasurements)
        ));
        assert_eq!(workspace.len(), before);
    }

    #[test]
    fn test_average_rejects_mismatch() {
        let mut workspace = Workspace::new();
        raw(&mut workspace, "a", 48000, &[&[1.0; 4]]);
        raw(&mut workspace, "b", 44100, &[&[1.0; 4]]);
        assert!(matches!(
            average(&mut workspace, AverageMode::Linear),
            Err(MeasureError::SampleRateMismatch(48000, 44100))
        ));

        let mut workspace = Workspace::new();
        raw(&mut workspace, "a", 48000, &[&[1.0; 4]]);
        raw(&mut workspace, "b", 48000, &[&[1.0; 4], &[1.0; 4]]);
        assert!(matches!(
            average(&mut workspace, AverageMode::Linear),
            Err(MeasureError::ChannelCountMismatch(1, 2))
        ));
        assert_eq!(workspace.len(), 2);
    }

    #[test]
    fn test_smooth_requires_selection() {
        let mut workspace = Workspace::new();
        raw(&mut workspace, "a", 48000, &[&[1.0; 8]]);
        assert!(matches!(
            smooth(&mut workspace, 1.0 / 6.0, true),
            Err(MeasureError::SelectionCount { expected: 1, found: 0 })
        ));
        assert_eq!(workspace.len(), 1);
    }

    #[test]
    fn test_smooth_replaces_selection() {
        let mut workspace = Workspace::new();
        let a = raw(&mut workspace, "a", 48000, &[&[1.0, 4.0, 1.0, 4.0, 1.0, 4.0, 1.0, 4.0]]);
        let b = raw(&mut workspace, "b", 48000, &[&[2.0; 8]]);
        workspace.select(a);
        workspace.select(b);

        let ids = smooth(&mut workspace, 1.0, false).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(workspace.selected_ids(), ids);

        let flat = workspace.get(ids[1]).unwrap();
        assert!(flat.name.starts_with("b (1/1 oct)"));
        for &x in flat.channels[0].amplitude() {
            assert!((x - 2.0).abs() < 1e-5);
        }

        let rough = workspace.get(ids[0]).unwrap();
        let original = workspace.get(a).unwrap().channels[0].amplitude();
        let smoothed = rough.channels[0].amplitude();
        let spread = |v: &[f32]| {
            v.iter().copied().fold(f32::MIN, f32::max) - v.iter().copied().fold(f32::MAX, f32::min)
        };
        assert!(spread(smoothed) < spread(original));
    }

    #[test]
    fn test_smooth_zero_bin_takes_smoothed_value() {
        let channel = MeasurementChannel::from_amplitude(vec![2.0, 0.0, 2.0, 2.0]);
        let smoothed = smooth_channel(&channel, 2.0, false);
        assert!((smoothed.real()[1] - 1.5).abs() < 1e-6);
        assert_eq!(smoothed.imag()[1], 0.0);
    }

    #[test]
    fn test_smooth_keeps_phase() {
        let mut ir = vec![0.0; 16];
        ir[1] = 1.0;
        ir[2] = 0.5;
        let channel = MeasurementChannel::from_impulse_response(ir, None);
        assert!(channel.phase().iter().any(|p| p.abs() > 0.1));

        let smoothed = smooth_channel(&channel, 1.0, false);
        let expected = smooth_amplitude(channel.amplitude(), 1.0, false);
        for k in 0..channel.len() {
            assert!(
                (smoothed.amplitude()[k] - expected[k]).abs() < 1e-4,
                "amplitude bin {k}"
            );
            assert!(
                (smoothed.phase()[k] - channel.phase()[k]).abs() < 1e-4,
                "phase bin {k}"
            );
        }
    }

    #[test]
    fn test_octave_label() {
        assert_eq!(octave_label(1.0), "1/1 oct");
        assert_eq!(octave_label(1.0 / 6.0), "1/6 oct");
        assert_eq!(octave_label(0.4), "0.400 oct");
        assert_eq!(octave_label(0.0), "0.000 oct");
    }

    #[test]
    fn test_convolve_selection_requires_two() {
        let mut workspace = Workspace::new();
        let a = raw(&mut workspace, "a", 48000, &[&[1.0; 4]]);
        workspace.select(a);
        assert!(matches!(
            convolve_selection(&mut workspace),
            Err(MeasureError::SelectionCount { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_convolve_selection_with_impulse() {
        let mut workspace = Workspace::new();
        let signal = vec![0.5, -0.25, 0.125, 0.0];
        let a = import_impulse_responses(&mut workspace, "speaker", 48000, vec![signal.clone()]).unwrap();
        let b = import_impulse_responses(&mut workspace, "dirac", 48000, vec![impulse(4)]).unwrap();
        workspace.select(a);
        workspace.select(b);

        let id = convolve_selection(&mut workspace).unwrap();
        let result = workspace.get(id).unwrap();
        assert_eq!(result.name, "speaker x dirac");
        for (got, want) in result.channels[0].impulse_response().iter().zip(&signal) {
            assert!((got - want).abs() < 1e-5);
        }
        assert_eq!(result.reference_channels().len(), 1);
        assert_eq!(workspace.selected_ids(), vec![id]);
    }

    #[test]
    fn test_convolve_rejects_channel_mismatch() {
        let mut workspace = Workspace::new();
        let a = raw(&mut workspace, "a", 48000, &[&[1.0; 4]]);
        let b = raw(&mut workspace, "b", 48000, &[&[1.0; 4], &[1.0; 4]]);
        workspace.select(a);
        workspace.select(b);
        assert!(matches!(
            convolve_selection(&mut workspace),
            Err(MeasureError::ChannelCountMismatch(1, 2))
        ));
        assert_eq!(workspace.len(), 2);
        assert_eq!(workspace.selected_ids(), vec![a, b]);
    }

    #[test]
    fn test_generate_correction_commits_filter_and_result() {
        let mut workspace = Workspace::new();
        let mut ir = vec![0.0; 1024];
        ir[0] = 1.0;
        ir[3] = 0.5;
        let source = import_impulse_responses(&mut workspace, "room", 48000, vec![ir.clone(), ir]).unwrap();

        let settings = CorrectionSettings {
            filter_length: 256,
            ..CorrectionSettings::default()
        };
        let (filter, corrected) = generate_correction(&mut workspace, &settings).unwrap();

        let filter = workspace.get(filter).unwrap();
        assert_eq!(filter.name, "Correction Filter room");
        assert_eq!(filter.channel_count(), 2);
        assert_eq!(filter.channels[0].impulse_response().len(), 256);
        assert_eq!(filter.reference_channels().len(), 2);
        for &gain in filter.reference_channels()[0].amplitude() {
            assert!(gain <= settings.max_boost_gain() + 1e-4);
            assert!(gain >= settings.max_cut_gain() - 1e-4);
        }

        let corrected = workspace.get(corrected).unwrap();
        assert_eq!(corrected.name, "room x Correction Filter room");
        assert_eq!(workspace.selected_ids(), vec![corrected.id]);
        assert!(!workspace.is_selected(source));
    }

    #[test]
    fn test_generate_correction_minimum_phase() {
        let mut workspace = Workspace::new();
        import_impulse_responses(&mut workspace, "room", 48000, vec![impulse(512)]).unwrap();
        let settings = CorrectionSettings {
            linear_phase: false,
            psychoacoustic_smoothing: false,
            filter_length: 128,
            ..CorrectionSettings::default()
        };
        let (filter, _) = generate_correction(&mut workspace, &settings).unwrap();
        let taps = workspace.get(filter).unwrap().channels[0].impulse_response();
        let peak = taps
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(0));
    }

    #[test]
    fn test_generate_correction_needs_single_selection() {
        let mut workspace = Workspace::new();
        let a = raw(&mut workspace, "a", 48000, &[&[1.0; 4]]);
        let b = raw(&mut workspace, "b", 48000, &[&[1.0; 4]]);
        workspace.select(a);
        workspace.select(b);
        let result = generate_correction(&mut workspace, &CorrectionSettings::default());
        assert!(matches!(
            result,
            Err(MeasureError::SelectionCount { expected: 1, found: 2 })
        ));
        assert_eq!(workspace.len(), 2);
    }

    #[test]
    fn test_calibration_interpolates_in_db() {
        let mut workspace = Workspace::new();
        let id = import_calibration(&mut workspace, "mic", "100 0\n1000 6\n10000 0").unwrap();
        let cal = workspace.get(id).unwrap();

        assert_eq!(cal.sample_rate, 48000);
        assert_eq!(cal.channel_count(), 2);
        assert_eq!(cal.channels[0], cal.channels[1]);
        assert_eq!(cal.kind, MeasurementKind::MicCalibration);
        assert_eq!(cal.channels[0].len(), 48000);

        let db = |bin| 20.0 * gain_at(cal, bin).log10();
        assert!(db(20).abs() < 1e-4);
        assert!(db(100).abs() < 1e-4);
        assert!((db(550) - 3.0).abs() < 1e-3);
        assert!((db(1000) - 6.0).abs() < 1e-3);
        assert!((db(5500) - 3.0).abs() < 1e-3);
        assert!(db(10000).abs() < 1e-4);
        assert!(db(20000).abs() < 1e-4);
        assert_eq!(gain_at(cal, 48000 - 550), gain_at(cal, 550));
        assert!(cal.channels[0].imag().iter().all(|&x| x == 0.0));
        assert!(workspace.is_selected(id));
    }

    #[test]
    fn test_calibration_skips_malformed_lines() {
        let mut workspace = Workspace::new();
        let text = "\"Sens Factor =-1.2dB\"\n\n500 2.0\nfoo bar\n2000 -2.0 extra\n";
        let id = import_calibration(&mut workspace, "mic", text).unwrap();
        let cal = workspace.get(id).unwrap();
        assert!((20.0 * gain_at(cal, 100).log10() - 2.0).abs() < 1e-3);
        assert!((20.0 * gain_at(cal, 5000).log10() + 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_calibration_rejected() {
        let mut workspace = Workspace::new();
        assert!(matches!(
            import_calibration(&mut workspace, "mic", "no numbers here\n"),
            Err(MeasureError::EmptyCalibration)
        ));
        assert!(workspace.is_empty());
    }

    #[test]
    fn test_house_curve_kind() {
        let mut workspace = Workspace::new();
        let id = import_house_curve(&mut workspace, "target", "20 6\n200 0").unwrap();
        assert_eq!(workspace.get(id).unwrap().kind, MeasurementKind::HouseCurve);
    }

    #[test]
    fn test_import_impulse_responses_requires_channels() {
        let mut workspace = Workspace::new();
        assert!(import_impulse_responses(&mut workspace, "x", 48000, vec![]).is_err());
    }
}
