use crate::{math::ScoreWidth, simd::SimdScore};
use std::simd::{prelude::*, Simd};

/// A target position awaiting its cell score, tagged with the lane it
/// belongs to. `score` stays at `i32::MIN` until the walk crosses `pos`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TargetCell {
    pub idx:   usize,
    pub pos:   usize,
    pub score: i32,
}

/// Per-lane best/second-best state for one read batch.
///
/// Updated by [`step`](LaneTracker::step) for every cell whose score is
/// reportable (each row in local mode, only the last row end-to-end). The
/// position slices alias the caller's results storage, so the final
/// positions, counts, and correctness flags land in place; only the biased
/// score vectors are copied out at the end of the batch.
///
/// A second-best candidate is only accepted when it ends more than a read
/// length away from the current best (`pos > max_pos + read_len`), so a
/// sliding window of cells along one true alignment can neither inflate the
/// occurrence counts nor masquerade as a distinct second hit.
pub(crate) struct LaneTracker<'r, T, const N: usize>
where
    T: ScoreWidth,
{
    read_len:  usize,
    pub max_score: Simd<T, N>,
    pub sub_score: Simd<T, N>,
    max_pos:   &'r mut [usize],
    sub_pos:   &'r mut [usize],
    max_count: &'r mut [i32],
    sub_count: &'r mut [i32],
    correct:   &'r mut [u8],
    lower:     &'r [usize],
    upper:     &'r [usize],
    /// Batch targets sorted by position, padded with unreachable sentinels.
    pub targets: Vec<TargetCell>,
}

impl<'r, T, const N: usize> LaneTracker<'r, T, N>
where
    T: ScoreWidth,
    Simd<T, N>: SimdScore<T, N>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        read_len: usize, targets: &[usize], max_pos: &'r mut [usize], sub_pos: &'r mut [usize],
        max_count: &'r mut [i32], sub_count: &'r mut [i32], correct: &'r mut [u8], lower: &'r [usize],
        upper: &'r [usize],
    ) -> Self {
        let mut cells = Vec::with_capacity(N + 1);
        for (idx, &pos) in targets.iter().enumerate() {
            cells.push(TargetCell {
                idx,
                pos,
                score: i32::MIN,
            });
        }
        // One extra sentinel so the consuming scan always terminates.
        cells.resize(
            N + 1,
            TargetCell {
                idx: 0,
                pos: usize::MAX,
                score: i32::MIN,
            },
        );
        cells.sort_unstable_by_key(|cell| cell.pos);

        LaneTracker {
            read_len,
            max_score: Simd::splat(T::MIN),
            sub_score: Simd::splat(T::MIN),
            max_pos,
            sub_pos,
            max_count,
            sub_count,
            correct,
            lower,
            upper,
            targets: cells,
        }
    }

    #[inline]
    fn in_window(&self, lane: usize, pos: usize) -> bool {
        pos >= self.lower[lane] && pos <= self.upper[lane]
    }

    /// Folds one finished cell column into the per-lane state.
    ///
    /// The four rules run in a fixed order that must not be reordered: the
    /// max vector is promoted before the demotion loop reads it, and the
    /// between-sub-and-max rule is what keeps repeats of the max from
    /// re-triggering as second-best candidates.
    pub fn step(&mut self, scores: Simd<T, N>, pos: usize) {
        // Another occurrence of the current best.
        let eq_max = scores.simd_eq(self.max_score);
        if eq_max.any() {
            for lane in 0..N {
                if eq_max.test(lane) {
                    if pos > self.max_pos[lane] + self.read_len {
                        self.max_count[lane] += 1;
                    }
                    self.max_pos[lane] = pos;
                    if self.in_window(lane, pos) {
                        self.correct[lane] = 1;
                    }
                }
            }
        }

        // A new best.
        let gt_max = scores.simd_gt(self.max_score);
        if gt_max.any() {
            self.max_score = scores.simd_max(self.max_score);
            for lane in 0..N {
                if gt_max.test(lane) {
                    // Demote the old best when the new one is far enough away.
                    if pos > self.max_pos[lane] + self.read_len {
                        self.sub_score[lane] = self.max_score[lane];
                        self.sub_pos[lane] = self.max_pos[lane];
                        self.sub_count[lane] = self.max_count[lane];
                        self.correct[lane] = if self.correct[lane] == 1 { 2 } else { 0 };
                    }
                    self.max_count[lane] = 1;
                    self.max_pos[lane] = pos;
                    if self.in_window(lane, pos) {
                        self.correct[lane] = 1;
                    } else if self.correct[lane] == 1 {
                        self.correct[lane] = 0;
                    }
                }
            }
        }

        // Another occurrence of the second-best, away from the best.
        let eq_sub = scores.simd_eq(self.sub_score);
        if eq_sub.any() {
            for lane in 0..N {
                if eq_sub.test(lane) && pos > self.max_pos[lane] + self.read_len {
                    self.sub_count[lane] += i32::from(pos > self.sub_pos[lane] + self.read_len);
                    self.sub_pos[lane] = pos;
                    if self.in_window(lane, pos) {
                        self.correct[lane] = 2;
                    }
                }
            }
        }

        // A new second-best, strictly between the old one and the best.
        let between = scores.simd_gt(self.sub_score) & scores.simd_lt(self.max_score);
        if between.any() {
            for lane in 0..N {
                if between.test(lane) && pos > self.max_pos[lane] + self.read_len {
                    self.sub_score[lane] = scores[lane];
                    self.sub_count[lane] = 1;
                    self.sub_pos[lane] = pos;
                    if self.in_window(lane, pos) {
                        self.correct[lane] = 2;
                    } else {
                        self.correct[lane] = u8::from(self.correct[lane] == 1);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const LANES: usize = 8;
    const READ_LEN: usize = 4;

    struct Storage {
        max_pos:   Vec<usize>,
        sub_pos:   Vec<usize>,
        max_count: Vec<i32>,
        sub_count: Vec<i32>,
        correct:   Vec<u8>,
        lower:     Vec<usize>,
        upper:     Vec<usize>,
    }

    impl Storage {
        fn with_window(lower: usize, upper: usize) -> Self {
            Storage {
                max_pos:   vec![0; LANES],
                sub_pos:   vec![0; LANES],
                max_count: vec![0; LANES],
                sub_count: vec![0; LANES],
                correct:   vec![0; LANES],
                lower:     vec![lower; LANES],
                upper:     vec![upper; LANES],
            }
        }

        fn tracker(&mut self, targets: &[usize]) -> LaneTracker<'_, i8, LANES> {
            LaneTracker::new(
                READ_LEN,
                targets,
                &mut self.max_pos,
                &mut self.sub_pos,
                &mut self.max_count,
                &mut self.sub_count,
                &mut self.correct,
                &self.lower,
                &self.upper,
            )
        }
    }

    #[test]
    fn non_overlapping_repeat_bumps_count() {
        let mut storage = Storage::with_window(usize::MAX, 0);
        let mut tracker = storage.tracker(&[]);

        tracker.step(Simd::splat(10), 5);
        tracker.step(Simd::splat(10), 6); // overlaps: position advances, count holds
        tracker.step(Simd::splat(10), 20);

        assert_eq!(storage.max_count[0], 2);
        assert_eq!(storage.max_pos[0], 20);
    }

    #[test]
    fn distant_lower_score_becomes_second_best() {
        let mut storage = Storage::with_window(19, 21);
        let mut tracker = storage.tracker(&[20; LANES]);

        tracker.step(Simd::splat(10), 4);
        tracker.step(Simd::splat(6), 20);

        assert_eq!(tracker.sub_score[0], 6);
        assert_eq!(storage.sub_pos[0], 20);
        assert_eq!(storage.sub_count[0], 1);
        assert_eq!(storage.correct[0], 2);
    }

    #[test]
    fn nearby_lower_score_is_suppressed() {
        let mut storage = Storage::with_window(usize::MAX, 0);
        let mut tracker = storage.tracker(&[]);

        tracker.step(Simd::splat(10), 8);
        tracker.step(Simd::splat(6), 9); // within a read length of the best

        assert_eq!(tracker.sub_score[0], i8::MIN);
        assert_eq!(storage.sub_pos[0], 0);
    }

    #[test]
    fn targets_sort_with_sentinels_last() {
        let mut storage = Storage::with_window(usize::MAX, 0);
        let tracker = storage.tracker(&[30, 10, 20]);

        let order: Vec<usize> = tracker.targets.iter().take(3).map(|c| c.pos).collect();
        assert_eq!(order, vec![10, 20, 30]);
        assert_eq!(tracker.targets.len(), LANES + 1);
        assert!(tracker.targets[3..].iter().all(|c| c.pos == usize::MAX));
    }
}
