use crate::{
    alignment::{errors::AlignmentError, profile::ScoreProfile},
    graph::NodeId,
    math::ScoreWidth,
    simd::SimdScore,
};
use std::{
    collections::HashMap,
    simd::{prelude::*, Simd},
};

/// Ending columns from a filled node: the final score column and the final
/// read-gap column, both of length `read_len + 1`.
///
/// Every successor of a node reads its seed; row 0 always holds the bias.
#[derive(Clone, Debug)]
pub(crate) struct Seed<T, const N: usize>
where
    T: ScoreWidth,
{
    pub s_col: Vec<Simd<T, N>>,
    pub i_col: Vec<Simd<T, N>>,
}

impl<T, const N: usize> Seed<T, N>
where
    T: ScoreWidth,
{
    pub fn new(read_len: usize) -> Self {
        Seed {
            s_col: vec![Simd::splat(T::default()); read_len + 1],
            i_col: vec![Simd::splat(T::default()); read_len + 1],
        }
    }

    /// Resets this seed to the matrix origin for the start of a walk.
    ///
    /// Local mode seeds every row with the bias, so an alignment may begin at
    /// any read offset for free. End-to-end mode instead charges row `i` the
    /// affine cost of skipping the first `i` read bases, which forces the
    /// reported alignment to span the whole read.
    pub fn reset_origin(&mut self, bias: T, prof: &ScoreProfile) {
        let biases = Simd::splat(bias);
        for row in &mut self.s_col {
            *row = biases;
        }

        if prof.end_to_end {
            let floor = T::MIN.as_i64();
            for i in 0..self.s_col.len() - 1 {
                let charged =
                    bias.as_i64() - i64::from(prof.read_gopen) - (i as i64) * i64::from(prof.read_gext);
                self.s_col[i + 1] = Simd::splat(T::from_i64_clamped(charged.max(floor)));
            }
        }

        self.i_col.copy_from_slice(&self.s_col);
    }
}

/// Maps node identifiers to the seeds produced when they were filled.
///
/// The store owns every live seed. When the walk reaches a pinched node no
/// earlier seed can be read again, so the map is emptied to bound its size
/// to the frontier between two pinch points.
#[derive(Debug, Default)]
pub(crate) struct SeedStore<T, const N: usize>
where
    T: ScoreWidth,
{
    map: HashMap<NodeId, Seed<T, N>>,
}

impl<T, const N: usize> SeedStore<T, N>
where
    T: ScoreWidth,
    Simd<T, N>: SimdScore<T, N>,
{
    pub fn new() -> Self {
        SeedStore { map: HashMap::new() }
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn insert(&mut self, id: NodeId, seed: Seed<T, N>) {
        self.map.insert(id, seed);
    }

    /// Assembles the incoming seed for a node as the lanewise maximum over
    /// all predecessor seeds, row by row. Row 0 keeps the bias already in
    /// `seed`. With no predecessors every row resets to the bias.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError::GraphOrder`] when a predecessor has not been
    /// filled yet, meaning the walk is not topologically ordered.
    pub fn merge_into(&self, preds: &[NodeId], seed: &mut Seed<T, N>, bias: T) -> Result<(), AlignmentError> {
        let sources = preds
            .iter()
            .map(|id| self.map.get(id).ok_or(AlignmentError::GraphOrder(*id)))
            .collect::<Result<Vec<_>, _>>()?;

        let biases = Simd::splat(bias);
        for row in 1..seed.s_col.len() {
            let mut s = biases;
            let mut i = biases;
            for src in &sources {
                s = s.simd_max(src.s_col[row]);
                i = i.simd_max(src.i_col[row]);
            }
            seed.s_col[row] = s;
            seed.i_col[row] = i;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type S = Seed<i8, 8>;

    #[test]
    fn merge_takes_lanewise_max_over_predecessors() {
        let mut store = SeedStore::<i8, 8>::new();

        let mut left = S::new(2);
        let mut right = S::new(2);
        left.s_col[1] = Simd::splat(-10);
        right.s_col[1] = Simd::splat(-20);
        left.i_col[2] = Simd::from_array([-1, -2, -3, -4, -5, -6, -7, -8]);
        right.i_col[2] = Simd::splat(-4);
        store.insert(0, left);
        store.insert(1, right);

        let mut merged = S::new(2);
        store.merge_into(&[0, 1], &mut merged, i8::MIN).unwrap();

        assert_eq!(merged.s_col[1], Simd::splat(-10));
        assert_eq!(merged.i_col[2], Simd::from_array([-1, -2, -3, -4, -4, -4, -4, -4]));
    }

    #[test]
    fn merge_reports_missing_predecessor() {
        let store = SeedStore::<i8, 8>::new();
        let mut merged = S::new(2);
        assert_eq!(
            store.merge_into(&[7], &mut merged, i8::MIN),
            Err(AlignmentError::GraphOrder(7))
        );
    }

    #[test]
    fn end_to_end_origin_charges_read_prefix() {
        let prof = ScoreProfile {
            end_to_end: true,
            ..ScoreProfile::new(0, 6, 5, 3)
        };
        let mut seed = S::new(3);
        seed.reset_origin(i8::MAX, &prof);

        assert_eq!(seed.s_col[0], Simd::splat(i8::MAX));
        assert_eq!(seed.s_col[1], Simd::splat(i8::MAX - 5));
        assert_eq!(seed.s_col[2], Simd::splat(i8::MAX - 8));
        assert_eq!(seed.s_col[3], Simd::splat(i8::MAX - 11));
        assert_eq!(seed.i_col[3], seed.s_col[3]);
    }
}
