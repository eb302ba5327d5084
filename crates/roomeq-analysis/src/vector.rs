//! Fixed-length alignment and averaging of sample buffers.

/// How [`vector_average`] combines values at one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AverageMode {
    /// Arithmetic mean
    #[default]
    Linear,
    /// Geometric mean (mean of logarithms, exponentiated back)
    Logarithmic,
}

/// Truncate or zero-pad `data` to exactly `size` samples.
pub fn resize(data: &[f32], size: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(&data[..data.len().min(size)]);
    out.resize(size, 0.0);
    out
}

/// Average several vectors index by index.
///
/// The result is as long as the longest input. At each index only the
/// vectors that reach it take part, so shorter inputs do not drag the tail
/// toward zero. Accumulation runs in `f64`.
pub fn vector_average(mode: AverageMode, vectors: &[&[f32]]) -> Vec<f32> {
    let len = vectors.iter().map(|v| v.len()).max().unwrap_or(0);

    (0..len)
        .map(|i| {
            let mut sum = 0.0f64;
            let mut count = 0usize;
            for v in vectors {
                if let Some(&x) = v.get(i) {
                    sum += match mode {
                        AverageMode::Linear => f64::from(x),
                        AverageMode::Logarithmic => f64::from(x).max(f64::MIN_POSITIVE).ln(),
                    };
                    count += 1;
                }
            }

            let mean = sum / count as f64;
            match mode {
                AverageMode::Linear => mean as f32,
                AverageMode::Logarithmic => mean.exp() as f32,
            }
        })
        .collect()
}
