/// Evenly spaced frame indices over `[0, frame_count - 1]`, rounded to the
/// nearest frame.
///
/// Always returns exactly `num_output_frames` entries. A single-frame source
/// yields all zeros.
pub fn sample_indices(frame_count: u64, num_output_frames: usize) -> Vec<u64> {
    let last = frame_count.saturating_sub(1);
    if num_output_frames <= 1 {
        return vec![0; num_output_frames];
    }

    let step = last as f64 / (num_output_frames - 1) as f64;
    (0..num_output_frames)
        .map(|i| ((i as f64 * step).round() as u64).min(last))
        .collect()
}

/// Per-source frame indices for every output frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePlan {
    indices: Vec<Vec<u64>>,
    num_output_frames: usize,
}

impl SamplePlan {
    pub fn new<I>(frame_counts: I, num_output_frames: usize) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let indices = frame_counts
            .into_iter()
            .map(|count| sample_indices(count, num_output_frames))
            .collect();

        Self {
            indices,
            num_output_frames,
        }
    }

    pub fn num_sources(&self) -> usize {
        self.indices.len()
    }

    pub fn num_output_frames(&self) -> usize {
        self.num_output_frames
    }

    /// Frame index to pull from `source` for output frame `k`.
    pub fn target(&self, source: usize, k: usize) -> Option<u64> {
        self.indices.get(source)?.get(k).copied()
    }

    pub fn indices(&self, source: usize) -> Option<&[u64]> {
        self.indices.get(source).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_frames_into_five() {
        assert_eq!(sample_indices(10, 5), vec![0, 2, 5, 7, 9]);
    }

    #[test]
    fn single_frame_source_is_all_zeros() {
        assert_eq!(sample_indices(1, 4), vec![0, 0, 0, 0]);
    }

    #[test]
    fn single_output_frame_starts_at_zero() {
        assert_eq!(sample_indices(300, 1), vec![0]);
    }

    #[test]
    fn upsampling_repeats_indices() {
        assert_eq!(sample_indices(3, 5), vec![0, 1, 1, 2, 2]);
    }

    #[test]
    fn length_order_and_bounds_hold() {
        for frame_count in 1..60u64 {
            for n in 1..40usize {
                let indices = sample_indices(frame_count, n);
                assert_eq!(indices.len(), n);
                assert!(indices.windows(2).all(|w| w[0] <= w[1]));
                assert!(indices.iter().all(|&i| i < frame_count));
                assert_eq!(indices[0], 0);
                if n > 1 {
                    assert_eq!(*indices.last().unwrap(), frame_count - 1);
                }
            }
        }
    }

    #[test]
    fn plan_keeps_one_sequence_per_source() {
        let plan = SamplePlan::new([10, 1, 100], 5);
        assert_eq!(plan.num_sources(), 3);
        assert_eq!(plan.num_output_frames(), 5);
        assert_eq!(plan.target(0, 2), Some(5));
        assert_eq!(plan.target(1, 4), Some(0));
        assert_eq!(plan.target(2, 4), Some(99));
        assert_eq!(plan.target(3, 0), None);
        assert_eq!(plan.target(0, 5), None);
    }
}
