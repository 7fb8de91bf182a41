use crate::{
    data::{base_code, BASE_N},
    math::ScoreWidth,
};
use std::simd::Simd;

/// A packaged batch of up to N equal-length reads.
///
/// Reads are interleaved so each vector holds the same base position from
/// every read: lane `r` of `at(p)` is the `p`-th base of read `r`. Lanes
/// without a read are padded with N, which cannot raise any score above the
/// origin and so leaves the other lanes' results untouched.
#[derive(Clone, Debug)]
pub(crate) struct ReadBatch<T, const N: usize>
where
    T: ScoreWidth,
{
    packaged: Vec<Simd<T, N>>,
}

impl<T, const N: usize> ReadBatch<T, N>
where
    T: ScoreWidth,
{
    pub fn new(read_len: usize) -> Self {
        let ambiguous = Simd::splat(T::from_i64_clamped(i64::from(BASE_N)));
        ReadBatch {
            packaged: vec![ambiguous; read_len],
        }
    }

    /// Interleaves `reads` into the lane vectors, padding unused lanes with
    /// N. Each read must be exactly the packaged read length; the aligner
    /// checks this before loading.
    pub fn load<R: AsRef<[u8]>>(&mut self, reads: &[R]) {
        debug_assert!(reads.len() <= N);
        let ambiguous = T::from_i64_clamped(i64::from(BASE_N));

        for (p, vector) in self.packaged.iter_mut().enumerate() {
            for r in 0..N {
                vector[r] = match reads.get(r) {
                    Some(read) => T::from_i64_clamped(i64::from(base_code(read.as_ref()[p]))),
                    None => ambiguous,
                };
            }
        }
    }

    /// The vector of `p`-th bases across the batch.
    #[inline]
    pub fn at(&self, p: usize) -> Simd<T, N> {
        self.packaged[p]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interleaves_reads_and_pads_with_ambiguous() {
        let mut batch = ReadBatch::<i8, 8>::new(3);
        batch.load(&[b"ACG", b"TTT"]);

        assert_eq!(batch.at(0).as_array()[..3], [0, 3, 4]);
        assert_eq!(batch.at(1).as_array()[..3], [1, 3, 4]);
        assert_eq!(batch.at(2).as_array()[..3], [2, 3, 4]);
        assert!(batch.at(2).as_array()[2..].iter().all(|&b| b == 4));
    }
}
