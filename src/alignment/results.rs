use crate::alignment::profile::ScoreProfile;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Alignment results for a read list, stored as parallel vectors indexed in
/// read-input order.
///
/// Scores are true (unbiased) values; positions are 1-indexed on the
/// linearized reference coordinate, matching [`Node::end_pos`]. A score of 0
/// in local mode means no cell ever rose above the origin. `correct` is 1
/// when the best position fell within the tolerance window of the read's
/// target, 2 when only the second-best did, 0 otherwise.
///
/// [`Node::end_pos`]: crate::graph::Node::end_pos
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Results {
    /// Best score per read.
    pub max_score:    Vec<i32>,
    /// Second-best score per read, subject to the read-length suppression
    /// rule.
    pub sub_score:    Vec<i32>,
    /// End position of the best alignment.
    pub max_pos:      Vec<usize>,
    /// End position of the second-best alignment.
    pub sub_pos:      Vec<usize>,
    /// Number of non-overlapping occurrences of the best score.
    pub max_count:    Vec<i32>,
    /// Number of non-overlapping occurrences of the second-best score.
    pub sub_count:    Vec<i32>,
    /// Best cell score observed at the read's target position.
    pub target_score: Vec<i32>,
    /// Correctness flag per read: 0, 1, or 2.
    pub correct:      Vec<u8>,
    /// The scoring profile the alignment ran with.
    pub profile:      ScoreProfile,
}

impl Results {
    /// Creates an empty results record.
    #[must_use]
    pub fn new() -> Self {
        Results::default()
    }

    /// Number of reads recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.max_score.len()
    }

    /// True when no reads are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_score.is_empty()
    }

    /// Resets every vector to `len` zeroed entries.
    pub(crate) fn reset(&mut self, len: usize) {
        for scores in [
            &mut self.max_score,
            &mut self.sub_score,
            &mut self.target_score,
            &mut self.max_count,
            &mut self.sub_count,
        ] {
            scores.clear();
            scores.resize(len, 0);
        }
        for positions in [&mut self.max_pos, &mut self.sub_pos] {
            positions.clear();
            positions.resize(len, 0);
        }
        self.correct.clear();
        self.correct.resize(len, 0);
    }

    /// Crops the padding lanes of the final batch.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.max_score.truncate(len);
        self.sub_score.truncate(len);
        self.max_pos.truncate(len);
        self.sub_pos.truncate(len);
        self.max_count.truncate(len);
        self.sub_count.truncate(len);
        self.target_score.truncate(len);
        self.correct.truncate(len);
    }
}
