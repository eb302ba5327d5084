//! Peak picking for click-based delay estimation

/// Indices of the `n` largest absolute values in `recording`.
///
/// Greedy: each round takes the first sample whose magnitude is strictly
/// greater than every other sample not yet chosen. The returned indices are
/// sorted ascending, so they line up with clicks played in time order.
/// Asking for more peaks than samples returns every index.
pub fn find_peaks(n: usize, recording: &[f32]) -> Vec<usize> {
    let n = n.min(recording.len());
    let mut chosen = vec![false; recording.len()];
    let mut peaks = Vec::with_capacity(n);

    for _ in 0..n {
        let mut best: Option<(usize, f32)> = None;
        for (i, &x) in recording.iter().enumerate() {
            if chosen[i] {
                continue;
            }
            let magnitude = x.abs();
            match best {
                Some((_, m)) if magnitude <= m => {}
                _ => best = Some((i, magnitude)),
            }
        }

        if let Some((i, _)) = best {
            chosen[i] = true;
            peaks.push(i);
        }
    }

    peaks.sort_unstable();
    peaks
}
