use crate::{
    alignment::{
        batch::ReadBatch,
        errors::AlignmentError,
        profile::ScoreProfile,
        results::Results,
        seed::{Seed, SeedStore},
        tracker::LaneTracker,
    },
    data::{BASE_COUNT, BASE_N},
    graph::Node,
    math::ScoreWidth,
    simd::SimdScore,
};
use log::warn;
use std::{
    simd::{prelude::*, Simd},
    sync::Once,
};

/// Local aligner with 8-bit score cells and 32 lanes.
pub type Aligner = GraphAligner<i8, 32, false>;
/// Local aligner with 16-bit score cells and 16 lanes, for score ranges that
/// overflow 8 bits.
pub type WordAligner = GraphAligner<i16, 16, false>;
/// End-to-end aligner with 8-bit score cells and 32 lanes.
pub type AlignerEte = GraphAligner<i8, 32, true>;
/// End-to-end aligner with 16-bit score cells and 16 lanes.
pub type WordAlignerEte = GraphAligner<i16, 16, true>;

/// If the best position lands within read_len / this of the target, the
/// default tolerance counts the alignment as correct.
const DEFAULT_TOL_FACTOR: usize = 4;

static SATURATION_WARNING: Once = Once::new();

/// Aligns read batches against a topologically ordered reference DAG.
///
/// Up to `N` reads of a fixed length are interleaved into SIMD lanes and
/// scored simultaneously with affine-gap Smith-Waterman against every node of
/// the graph. Branches are handled by seeding each node's first matrix column
/// with the lanewise-best final columns of its predecessors, so every path
/// through the graph is scored without re-walking shared nodes.
///
/// Scores are tracked per lane as the walk progresses: the best and
/// second-best scores, their 1-indexed end positions, non-overlapping
/// occurrence counts, and a flag judging the positions against a per-read
/// target. In local mode (`ETE = false`) any cell may end the alignment; in
/// end-to-end mode only cells in the last read row are candidates and the
/// numeric bias shifts the (possibly negative) scores into the cell range.
///
/// The aligner owns its working buffers and reuses them across calls, so it
/// is cheap to keep alive but not shareable between threads. All scoring
/// state is overwritten by each call.
///
/// ```
/// use curlew::{Aligner, Graph};
///
/// // AAA -> { CCC | GGG } -> TTTA
/// let mut graph = Graph::new();
/// let a = graph.add_node(b"AAA", 3);
/// let c = graph.add_node(b"CCC", 6);
/// let g = graph.add_node(b"GGG", 6);
/// let t = graph.add_node(b"TTTA", 10);
/// graph.add_edge(a, c);
/// graph.add_edge(a, g);
/// graph.add_edge(c, t);
/// graph.add_edge(g, t);
///
/// let reads = vec![b"NNNGGTT".to_vec(), b"AAATTTA".to_vec()];
/// let mut aligner = Aligner::with_penalties(7, 2, 2, 3, 1).unwrap();
/// let res = aligner.align(&reads, &[8, 10], &graph).unwrap();
///
/// assert_eq!(res.max_score, [8, 8]);
/// assert_eq!(res.max_pos, [8, 10]);
/// assert_eq!(res.correct, [1, 1]);
/// ```
pub struct GraphAligner<T, const N: usize, const ETE: bool>
where
    T: ScoreWidth,
{
    read_len: usize,
    profile:  ScoreProfile,
    bias:     T,

    match_vec:            Simd<T, N>,
    mismatch_vec:         Simd<T, N>,
    ambig_vec:            Simd<T, N>,
    gap_open_extend_read: Simd<T, N>,
    gap_extend_read:      Simd<T, N>,
    gap_open_extend_ref:  Simd<T, N>,
    gap_extend_ref:       Simd<T, N>,
    base_vec:             [Simd<T, N>; BASE_COUNT],

    batch:    ReadBatch<T, N>,
    s_col:    Vec<Simd<T, N>>,
    d_col:    Vec<Simd<T, N>>,
    i_col:    Vec<Simd<T, N>>,
    seed_buf: Seed<T, N>,
    store:    SeedStore<T, N>,
}

impl<T, const N: usize, const ETE: bool> GraphAligner<T, N, ETE>
where
    T: ScoreWidth,
    Simd<T, N>: SimdScore<T, N>,
{
    /// Creates an aligner for reads of exactly `read_len` bases with the
    /// given scoring profile. The profile's `end_to_end` field is overridden
    /// by the aligner's mode.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError::InsufficientPrecision`] when the cell width
    /// cannot hold the worst-case score range for `read_len`.
    pub fn new(read_len: usize, prof: &ScoreProfile) -> Result<Self, AlignmentError> {
        let zeroes = Simd::splat(T::default());
        let mut base_vec = [zeroes; BASE_COUNT];
        for (code, vector) in base_vec.iter_mut().enumerate() {
            *vector = Simd::splat(T::from_i64_clamped(code as i64));
        }

        let mut aligner = GraphAligner {
            read_len,
            profile: prof.clone(),
            bias: T::MIN,
            match_vec: zeroes,
            mismatch_vec: zeroes,
            ambig_vec: zeroes,
            gap_open_extend_read: zeroes,
            gap_extend_read: zeroes,
            gap_open_extend_ref: zeroes,
            gap_extend_ref: zeroes,
            base_vec,
            batch: ReadBatch::new(read_len),
            s_col: vec![zeroes; read_len + 1],
            d_col: vec![zeroes; read_len + 1],
            i_col: vec![zeroes; read_len + 1],
            seed_buf: Seed::new(read_len),
            store: SeedStore::new(),
        };
        aligner.set_scores(prof)?;
        aligner.set_correctness_tolerance(read_len / DEFAULT_TOL_FACTOR);
        Ok(aligner)
    }

    /// Creates an aligner from the four basic penalties, applied to both gap
    /// directions.
    ///
    /// # Errors
    ///
    /// As for [`new`](GraphAligner::new).
    pub fn with_penalties(
        read_len: usize, match_score: u8, mismatch: u8, gopen: u8, gext: u8,
    ) -> Result<Self, AlignmentError> {
        Self::new(read_len, &ScoreProfile::new(match_score, mismatch, gopen, gext))
    }

    /// Replaces the scoring profile, recomputing the derived score vectors
    /// and the bias. May be called between alignments.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError::InsufficientPrecision`] as for construction.
    pub fn set_scores(&mut self, prof: &ScoreProfile) -> Result<(), AlignmentError> {
        let mut prof = prof.clone();
        prof.end_to_end = ETE;
        self.bias = compute_bias::<T>(self.read_len, &prof)?;

        let widened = |magnitude: u8| T::from_i64_clamped(i64::from(magnitude));
        self.match_vec = Simd::splat(widened(prof.match_score));
        self.mismatch_vec = Simd::splat(T::from_i64_clamped(-i64::from(prof.mismatch)));
        self.ambig_vec = Simd::splat(T::from_i64_clamped(-i64::from(prof.ambig)));
        self.gap_open_extend_read =
            Simd::splat(T::from_i64_clamped(i64::from(prof.read_gopen) + i64::from(prof.read_gext)));
        self.gap_extend_read = Simd::splat(widened(prof.read_gext));
        self.gap_open_extend_ref =
            Simd::splat(T::from_i64_clamped(i64::from(prof.ref_gopen) + i64::from(prof.ref_gext)));
        self.gap_extend_ref = Simd::splat(widened(prof.ref_gext));

        // Row 0 of the deletion column is pinned to the origin.
        self.d_col[0] = Simd::splat(self.bias);
        self.profile = prof;
        Ok(())
    }

    /// Replaces the scoring profile from the four basic penalties.
    ///
    /// # Errors
    ///
    /// As for [`set_scores`](GraphAligner::set_scores).
    pub fn set_scores_simple(&mut self, match_score: u8, mismatch: u8, gopen: u8, gext: u8) -> Result<(), AlignmentError> {
        self.set_scores(&ScoreProfile::new(match_score, mismatch, gopen, gext))
    }

    /// Sets the inclusive half-window within which a reported position
    /// counts as matching the read's target.
    pub fn set_correctness_tolerance(&mut self, tol: usize) {
        self.profile.tol = tol;
    }

    /// The current correctness tolerance.
    #[must_use]
    pub fn tolerance(&self) -> usize {
        self.profile.tol
    }

    /// The fixed read length this aligner was built for.
    #[must_use]
    pub fn read_len(&self) -> usize {
        self.read_len
    }

    /// The scoring profile currently in effect.
    #[must_use]
    pub fn profile(&self) -> &ScoreProfile {
        &self.profile
    }

    /// Maximum number of reads scored in one batch.
    #[must_use]
    pub const fn read_capacity() -> usize {
        N
    }

    /// Aligns `reads` against the graph walk, populating `aligns` in place.
    ///
    /// `targets` supplies one reference position per read for correctness
    /// judgement; 0 means "no target". `nodes` must yield the graph's nodes
    /// in topological order and is re-walked once per batch of `N` reads.
    ///
    /// # Errors
    ///
    /// - [`AlignmentError::BatchShape`] when a read is not of the aligner's
    ///   read length or `targets` does not match `reads` in length.
    /// - [`AlignmentError::GraphOrder`] when a node's predecessor has not
    ///   been walked yet. `aligns` is left in an unspecified state.
    pub fn align_into<'g, R, I>(
        &mut self, reads: &[R], targets: &[usize], nodes: I, aligns: &mut Results,
    ) -> Result<(), AlignmentError>
    where
        R: AsRef<[u8]>,
        I: IntoIterator<Item = &'g Node>,
        I::IntoIter: Clone, {
        if targets.len() != reads.len() {
            return Err(AlignmentError::BatchShape {
                expected: reads.len(),
                found:    targets.len(),
            });
        }
        for read in reads {
            let len = read.as_ref().len();
            if len != self.read_len {
                return Err(AlignmentError::BatchShape {
                    expected: self.read_len,
                    found:    len,
                });
            }
        }

        aligns.profile = self.profile.clone();
        if reads.is_empty() {
            aligns.reset(0);
            return Ok(());
        }

        let walk = nodes.into_iter();
        let num_groups = 1 + (reads.len() - 1) / N;
        let padded = num_groups * N;
        aligns.reset(padded);

        // Window bounds are computed with wrapping subtraction: a target of 0
        // ("no target") must produce an unsatisfiable window.
        let tol = self.profile.tol;
        let mut lower = Vec::with_capacity(padded);
        let mut upper = Vec::with_capacity(padded);
        for lane in 0..padded {
            let target = targets.get(lane).copied().unwrap_or(0);
            lower.push(target.wrapping_sub(tol));
            upper.push(target.saturating_add(tol));
        }

        for group in 0..num_groups {
            let beg = group * N;
            let end = (beg + N).min(reads.len());
            let len = end - beg;

            self.store.clear();
            self.batch.load(&reads[beg..end]);

            let mut tracker = LaneTracker::new(
                self.read_len,
                &targets[beg..end],
                &mut aligns.max_pos[beg..beg + N],
                &mut aligns.sub_pos[beg..beg + N],
                &mut aligns.max_count[beg..beg + N],
                &mut aligns.sub_count[beg..beg + N],
                &mut aligns.correct[beg..beg + N],
                &lower[beg..beg + N],
                &upper[beg..beg + N],
            );

            let mut nodes = walk.clone();
            if let Some(first) = nodes.next() {
                self.seed_buf.reset_origin(self.bias, &self.profile);
                let outgoing = fill_node(self, first, &mut tracker);
                self.store.insert(first.id(), outgoing);

                for node in nodes {
                    self.store.merge_into(node.incoming(), &mut self.seed_buf, self.bias)?;
                    // Nothing beyond a pinch point can reach earlier seeds.
                    if node.is_pinched() {
                        self.store.clear();
                    }
                    let outgoing = fill_node(self, node, &mut tracker);
                    self.store.insert(node.id(), outgoing);
                }
            }

            let bias = self.bias.as_i64();
            for lane in 0..len {
                aligns.max_score[beg + lane] = (tracker.max_score[lane].as_i64() - bias) as i32;
                aligns.sub_score[beg + lane] = (tracker.sub_score[lane].as_i64() - bias) as i32;
            }
            for cell in tracker.targets.iter().take(len) {
                let unbiased = (i64::from(cell.score) - bias).clamp(i64::from(i32::MIN), i64::from(i32::MAX));
                aligns.target_score[beg + cell.idx] = unbiased as i32;
            }
        }

        aligns.truncate(reads.len());
        Ok(())
    }

    /// Aligns `reads` against the graph walk, returning a fresh results
    /// record.
    ///
    /// # Errors
    ///
    /// As for [`align_into`](GraphAligner::align_into).
    pub fn align<'g, R, I>(&mut self, reads: &[R], targets: &[usize], nodes: I) -> Result<Results, AlignmentError>
    where
        R: AsRef<[u8]>,
        I: IntoIterator<Item = &'g Node>,
        I::IntoIter: Clone, {
        let mut aligns = Results::new();
        self.align_into(reads, targets, nodes, &mut aligns)?;
        Ok(aligns)
    }

    /// Aligns without targets: correctness flags stay 0 and no target scores
    /// are recorded.
    ///
    /// # Errors
    ///
    /// As for [`align_into`](GraphAligner::align_into).
    pub fn align_untargeted<'g, R, I>(&mut self, reads: &[R], nodes: I) -> Result<Results, AlignmentError>
    where
        R: AsRef<[u8]>,
        I: IntoIterator<Item = &'g Node>,
        I::IntoIter: Clone, {
        let targets = vec![0; reads.len()];
        self.align(reads, &targets, nodes)
    }
}

/// Fills the score matrix for one node against the packaged batch.
///
/// On entry `al.seed_buf` holds the node's incoming seed; the returned seed
/// carries the final score and read-gap columns for the node's successors.
/// An empty node (pure deletion) performs no work and forwards the seed.
#[cfg_attr(feature = "multiversion", multiversion::multiversion(targets = "simd"))]
fn fill_node<T, const N: usize, const ETE: bool>(
    al: &mut GraphAligner<T, N, ETE>, node: &Node, tracker: &mut LaneTracker<'_, T, N>,
) -> Seed<T, N>
where
    T: ScoreWidth,
    Simd<T, N>: SimdScore<T, N>,
{
    if node.seq().is_empty() {
        return al.seed_buf.clone();
    }

    let first_pos = node.end_pos() - node.seq().len() + 1;

    al.s_col.copy_from_slice(&al.seed_buf.s_col);
    al.i_col.copy_from_slice(&al.seed_buf.i_col);

    let mut csp = 0;
    while tracker.targets[csp].pos < first_pos {
        csp += 1;
    }

    for (offset, &ref_base) in node.seq().iter().enumerate() {
        let pos = first_pos + offset;
        let mut s_diag = Simd::splat(al.bias);

        for row in 1..=al.read_len {
            al.d_col[row] = al.d_col[row - 1]
                .saturating_sub(al.gap_extend_ref)
                .simd_max(al.s_col[row - 1].saturating_sub(al.gap_open_extend_ref));
            al.i_col[row] = al.i_col[row]
                .saturating_sub(al.gap_extend_read)
                .simd_max(al.s_col[row].saturating_sub(al.gap_open_extend_read));

            let read_bases = al.batch.at(row - 1);
            let weight = if ref_base == BASE_N {
                al.ambig_vec
            } else {
                // Both branches agree when read and reference are N.
                read_bases.simd_eq(al.base_vec[BASE_N as usize]).select(
                    al.ambig_vec,
                    read_bases
                        .simd_eq(al.base_vec[ref_base as usize])
                        .select(al.match_vec, al.mismatch_vec),
                )
            };
            let from_diag = s_diag.saturating_add(weight);

            s_diag = al.s_col[row];
            al.s_col[row] = al.i_col[row].simd_max(al.d_col[row].simd_max(from_diag));
            if !ETE {
                tracker.step(al.s_col[row], pos);
            }
        }
        // Only the final row spans the whole read.
        if ETE {
            tracker.step(al.s_col[al.read_len], pos);
        }

        while tracker.targets[csp].pos == pos {
            let start_row = if ETE { al.read_len } else { 1 };
            let cell = &mut tracker.targets[csp];
            for row in start_row..=al.read_len {
                cell.score = cell.score.max(al.s_col[row][cell.idx].as_i64() as i32);
            }
            csp += 1;
        }
    }

    Seed {
        s_col: al.s_col.clone(),
        i_col: al.i_col.clone(),
    }
}

/// Validates the cell width against the score range and derives the bias.
///
/// Local mode biases at the cell minimum. End-to-end scores may be negative,
/// so the bias moves to `MAX - read_len * match`: the largest reachable score
/// then sits exactly at the cell maximum. When the gap or mismatch bound can
/// still undershoot the representable range, a once-per-process diagnostic is
/// emitted and alignment proceeds with saturating arithmetic.
fn compute_bias<T: ScoreWidth>(read_len: usize, prof: &ScoreProfile) -> Result<T, AlignmentError> {
    let span = T::MAX.as_i64() - T::MIN.as_i64();
    let len = read_len as i64;
    if len * i64::from(prof.match_score) > span {
        return Err(AlignmentError::InsufficientPrecision {
            read_len,
            match_score: prof.match_score,
            bits: T::BITS,
        });
    }
    if !prof.end_to_end {
        return Ok(T::MIN);
    }

    let bias = T::MAX.as_i64() - len * i64::from(prof.match_score);
    let gap_bound = i64::from(prof.read_gopen) + i64::from(prof.read_gext) * (len - 1);
    if gap_bound > bias || len * i64::from(prof.mismatch) > bias {
        SATURATION_WARNING.call_once(|| {
            warn!(
                "possible score saturation in end-to-end mode: cell maximum {}, bias {bias}",
                T::MAX.as_i64()
            );
        });
    }
    Ok(T::from_i64_clamped(bias))
}
