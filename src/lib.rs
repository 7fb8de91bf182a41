#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
#![cfg_attr(test, feature(test))]
#![feature(portable_simd)]

/// ## Alignment of read batches to variant graphs.
///
/// The [`GraphAligner`] walks a topologically ordered graph once per read
/// batch, filling a Smith-Waterman matrix for every node and carrying the
/// final score columns across edges. See the [module docs](crate::alignment)
/// for the full usage steps.
pub mod alignment;

/// ## The five-symbol base alphabet.
///
/// Bases are stored as integer codes (`A=0` through `N=4`); this module holds
/// the ASCII mapping tables and sequence encoding helpers.
pub mod data;

/// ## Minimal variant-graph container.
///
/// [`Graph`] stores nodes in topological order together with their incoming
/// edges and pinch flags. Building graphs from reference and variant data is
/// the responsibility of upstream tooling.
pub mod graph;

/// ## Integer widths usable as score cells.
pub mod math;

/// ## SIMD capability extensions for score vectors.
pub mod simd;

pub(crate) mod private {
    pub trait Sealed {}
    impl Sealed for i8 {}
    impl Sealed for i16 {}
}

pub use alignment::{
    Aligner, AlignerEte, AlignmentError, GraphAligner, ProfileError, Results, ScoreProfile, WordAligner, WordAlignerEte,
};
pub use graph::{Graph, Node, NodeId};
