use crate::graph::NodeId;
use std::{error::Error, fmt};

/// An enum representing errors that can happen while constructing an aligner
/// or aligning a read batch.
#[derive(PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum AlignmentError {
    /// The score cell width cannot represent the worst-case score range for
    /// the given read length and match score.
    InsufficientPrecision {
        read_len:    usize,
        match_score: u8,
        bits:        u32,
    },
    /// A node listed a predecessor that has not been walked yet; the node
    /// iterator is not in topological order.
    GraphOrder(NodeId),
    /// The reads are not all of the aligner's read length, or the target list
    /// does not match the read list.
    BatchShape { expected: usize, found: usize },
}

impl fmt::Display for AlignmentError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AlignmentError::InsufficientPrecision {
                read_len,
                match_score,
                bits,
            } => {
                write!(
                    f,
                    "A {bits}-bit score cell cannot hold the score range for read length {read_len} with match score {match_score}"
                )
            }
            AlignmentError::GraphOrder(id) => {
                write!(f, "Node {id} was referenced as a predecessor before being walked; the graph is not in topological order")
            }
            AlignmentError::BatchShape { expected, found } => {
                write!(f, "The read batch is malformed: expected a length of {expected} but found {found}")
            }
        }
    }
}

impl fmt::Debug for AlignmentError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Error for AlignmentError {}

/// An enum representing errors that can happen when parsing a scoring
/// profile from its string form or from another aligner's command line.
#[derive(PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum ProfileError {
    /// A token in the serialized profile was not a `KEY=VALUE` pair with an
    /// integer value.
    InvalidToken(String),
    /// A bowtie2/HISAT2 command line did not request unpaired alignment.
    UnpairedExpected,
    /// The command line did not name a supported program.
    UnsupportedProgram(String),
}

impl fmt::Display for ProfileError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProfileError::InvalidToken(tk) => write!(f, "Invalid profile token: {tk}"),
            ProfileError::UnpairedExpected => {
                write!(f, "Unpaired read alignment (-U) expected on the command line")
            }
            ProfileError::UnsupportedProgram(cl) => write!(f, "Unsupported program for profile derivation: {cl}"),
        }
    }
}

impl fmt::Debug for ProfileError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Error for ProfileError {}
