//! ## Batched Smith-Waterman alignment over variant graphs.
//!
//! The aligner scores a batch of equal-length reads against every path of a
//! directed acyclic reference graph in a single topological walk, one read
//! per SIMD lane. Only scores and end positions are produced; traceback is a
//! non-goal.
//!
//! ### Usage Steps
//!
//! #### 1. Pick a cell width and mode
//!
//! Choose an integer width for the score cells and whether alignment is
//! local or end-to-end. [`Aligner`] (8-bit cells, 32 lanes, local) is the
//! usual starting point; [`WordAligner`] trades lanes for 16-bit headroom,
//! and [`AlignerEte`]/[`WordAlignerEte`] force the alignment to span the
//! whole read. Construction fails with
//! [`AlignmentError::InsufficientPrecision`] when the chosen width cannot
//! represent the score range for the read length, so picking the 8-bit
//! aligner first and falling back on the word aligner is safe.
//!
//! #### 2. Specify the scoring profile
//!
//! A [`ScoreProfile`] carries the match score and the mismatch, ambiguous
//! base, and affine gap penalties, with independent gap pricing for the read
//! and reference sides. Profiles round-trip through a compact string form
//! and can be derived from `bowtie2`/`HISAT2`/`bwa mem` command lines when
//! reproducing another mapper's scoring.
//!
//! #### 3. Walk the graph
//!
//! [`align`](GraphAligner::align) consumes any cloneable iterator over
//! [`Node`](crate::graph::Node)s in topological order, typically from
//! [`Graph`](crate::graph::Graph). Each read may carry a target position;
//! the reported `correct` flag says whether the best (1) or second-best (2)
//! alignment landed within the configured tolerance of it.
//!
//! ```
//! use curlew::{Aligner, Graph, ScoreProfile};
//!
//! let mut graph = Graph::new();
//! graph.add_node(b"AAAACCCCCCCCCCCCAAA", 19);
//! graph.mark_pinch_points();
//!
//! let mut aligner = Aligner::new(4, &ScoreProfile::default()).unwrap();
//! let res = aligner.align(&vec![b"AAAA".to_vec()], &[19], &graph).unwrap();
//!
//! // The best hit is the leading run of As; the trailing run is second-best
//! // and is the one near the target.
//! assert_eq!((res.max_score[0], res.max_pos[0]), (8, 4));
//! assert_eq!((res.sub_score[0], res.sub_pos[0]), (6, 19));
//! assert_eq!(res.correct[0], 2);
//! assert_eq!(res.target_score[0], 6);
//! ```

mod aligner;
mod batch;
mod errors;
mod profile;
mod results;
mod seed;
mod tracker;


pub use aligner::{Aligner, AlignerEte, GraphAligner, WordAligner, WordAlignerEte};
pub use errors::{AlignmentError, ProfileError};
pub use profile::ScoreProfile;
pub use results::Results;
