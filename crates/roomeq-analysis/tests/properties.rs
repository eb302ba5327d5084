//! Property-based tests for the roomeq-analysis transform pipeline.
//!
//! Checks transform round-trips, convolution identity and averaging
//! invariants over randomized inputs.

use proptest::prelude::*;
use roomeq_analysis::{
    AverageMode, convolve, forward_transform, impulse, inverse_transform, resize, smooth,
    vector_average,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The inverse of the forward transform reproduces any finite signal,
    /// power-of-two length or not.
    #[test]
    fn transform_roundtrip(signal in prop::collection::vec(-1.0f32..=1.0f32, 1..700)) {
        let spectrum = forward_transform(&signal);
        prop_assert_eq!(spectrum.len(), signal.len());

        let restored = inverse_transform(&spectrum.real, &spectrum.imag);
        for (i, (a, b)) in signal.iter().zip(&restored).enumerate() {
            prop_assert!((a - b).abs() < 1e-4, "sample {}: {} vs {}", i, a, b);
        }
    }

    /// Convolving with a unit impulse returns the signal, padded to the
    /// longer of the two lengths.
    #[test]
    fn convolution_identity(
        signal in prop::collection::vec(-1.0f32..=1.0f32, 1..500),
        impulse_len in 1usize..600,
    ) {
        let out = convolve(&signal, &impulse(impulse_len));
        let expected = resize(&signal, signal.len().max(impulse_len));
        prop_assert_eq!(out.len(), expected.len());
        for (a, b) in out.iter().zip(&expected) {
            prop_assert!((a - b).abs() < 1e-4);
        }
    }

    /// Averaging copies of one positive vector is the identity in both modes.
    #[test]
    fn average_of_copies_is_identity(
        values in prop::collection::vec(1e-3f32..100.0f32, 1..256),
        copies in 1usize..6,
    ) {
        let inputs: Vec<&[f32]> = (0..copies).map(|_| values.as_slice()).collect();
        for mode in [AverageMode::Linear, AverageMode::Logarithmic] {
            let avg = vector_average(mode, &inputs);
            for (a, b) in avg.iter().zip(&values) {
                prop_assert!((a - b).abs() <= b * 1e-5);
            }
        }
    }

    /// Smoothed values stay within the range of the input.
    #[test]
    fn smoothing_is_bounded(
        values in prop::collection::vec(1e-3f32..10.0f32, 1..512),
        octaves in 0.0f32..2.0f32,
        log_domain in any::<bool>(),
    ) {
        let min = values.iter().copied().fold(f32::MAX, f32::min);
        let max = values.iter().copied().fold(f32::MIN, f32::max);
        for s in smooth(&values, octaves, log_domain) {
            prop_assert!(s >= min * (1.0 - 1e-5) && s <= max * (1.0 + 1e-5));
        }
    }
}
