use crate::alignment::errors::ProfileError;
use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scoring parameters for graph alignment.
///
/// "Score" means something added, "penalty" something subtracted; every field
/// is given as a positive magnitude. Gap penalties are affine and kept
/// separate for the two gap directions: `read_gopen`/`read_gext` price a gap
/// in the read (a deletion from the reference), `ref_gopen`/`ref_gext` a gap
/// in the reference (an insertion into the read).
///
/// Profiles serialize to a compact `KEY=VALUE` list and parse back from it:
///
/// ```
/// # use curlew::ScoreProfile;
/// let prof = ScoreProfile::new(2, 6, 5, 3);
/// assert_eq!(prof.to_string().parse::<ScoreProfile>().unwrap(), prof);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreProfile {
    /// Score added for identical, unambiguous bases.
    pub match_score: u8,
    /// Penalty for distinct, unambiguous bases.
    pub mismatch:    u8,
    /// Penalty applied when either base is N.
    pub ambig:       u8,
    /// Open penalty for a gap in the read.
    pub read_gopen:  u8,
    /// Extend penalty for a gap in the read.
    pub read_gext:   u8,
    /// Open penalty for a gap in the reference.
    pub ref_gopen:   u8,
    /// Extend penalty for a gap in the reference.
    pub ref_gext:    u8,
    /// Force the alignment to span the entire read.
    pub end_to_end:  bool,
    /// Inclusive half-window for the correctness flag.
    pub tol:         usize,
}

impl Default for ScoreProfile {
    fn default() -> Self {
        ScoreProfile::new(2, 2, 3, 1)
    }
}

impl ScoreProfile {
    /// Creates a local-alignment profile with identical gap penalties on both
    /// sides and no ambiguous-base penalty.
    #[must_use]
    pub fn new(match_score: u8, mismatch: u8, gopen: u8, gext: u8) -> Self {
        Self::new_asymmetric(match_score, mismatch, gopen, gext, gopen, gext)
    }

    /// Creates a profile with distinct read-side and reference-side gap
    /// penalties.
    #[must_use]
    pub fn new_asymmetric(
        match_score: u8, mismatch: u8, read_gopen: u8, read_gext: u8, ref_gopen: u8, ref_gext: u8,
    ) -> Self {
        ScoreProfile {
            match_score,
            mismatch,
            ambig: 0,
            read_gopen,
            read_gext,
            ref_gopen,
            ref_gext,
            end_to_end: false,
            tol: 4,
        }
    }

    /// Derives a profile from a bowtie2 or HISAT2 command line.
    ///
    /// Recognizes `--local`, `-ma`, `-mp`, `-np`, `-rdg`, and `-rfg` with the
    /// same defaults those programs document. In end-to-end mode the match
    /// score is always 0.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::UnpairedExpected`] when `-U` is absent, or
    /// [`ProfileError::InvalidToken`] for malformed option values.
    pub fn from_bowtie2_cl(cl: &str) -> Result<Self, ProfileError> {
        let tokens = tokenize_cl(cl);
        if !tokens.iter().any(|t| t == "-U") {
            return Err(ProfileError::UnpairedExpected);
        }

        let mut prof = ScoreProfile {
            end_to_end: !tokens.iter().any(|t| t == "-local"),
            ..ScoreProfile::default()
        };

        prof.ambig = value_of(&tokens, "-np")?.unwrap_or(1);

        prof.match_score = 0;
        if !prof.end_to_end {
            prof.match_score = value_of(&tokens, "-ma")?.unwrap_or(2);
        }

        prof.mismatch = value_of(&tokens, "-mp")?.unwrap_or(6);

        (prof.ref_gopen, prof.ref_gext) = gap_pair_of(&tokens, "-rfg")?.unwrap_or((5, 3));
        (prof.read_gopen, prof.read_gext) = gap_pair_of(&tokens, "-rdg")?.unwrap_or((5, 3));

        Ok(prof)
    }

    /// Derives a profile from a `bwa mem` command line (`-A`, `-B`, `-O`).
    ///
    /// The extend penalty is pinned at 1 and the reference side mirrors the
    /// read side, matching the original tool's derivation.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidToken`] for malformed option values.
    pub fn from_bwa_mem_cl(cl: &str) -> Result<Self, ProfileError> {
        let tokens = tokenize_cl(cl);

        let gopen = value_of(&tokens, "-O")?.unwrap_or(6);
        Ok(ScoreProfile {
            match_score: value_of(&tokens, "-A")?.unwrap_or(1),
            mismatch: value_of(&tokens, "-B")?.unwrap_or(4),
            ambig: 0,
            read_gopen: gopen,
            read_gext: 1,
            ref_gopen: gopen,
            ref_gext: 1,
            end_to_end: false,
            ..ScoreProfile::default()
        })
    }

    /// Derives a profile by dispatching on the program named in the command
    /// line.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::UnsupportedProgram`] when no supported program
    /// is named, or the per-program errors otherwise.
    pub fn from_program_cl(cl: &str) -> Result<Self, ProfileError> {
        if cl.contains("bowtie2") || cl.contains("hisat2") {
            Self::from_bowtie2_cl(cl)
        } else if cl.contains("bwa mem") {
            Self::from_bwa_mem_cl(cl)
        } else {
            Err(ProfileError::UnsupportedProgram(cl.to_string()))
        }
    }
}

impl fmt::Display for ScoreProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "M={},MM={},GOD={},GED={},GOF={},GEF={},AMB={},ETE={},TOL={}",
            self.match_score,
            self.mismatch,
            self.read_gopen,
            self.read_gext,
            self.ref_gopen,
            self.ref_gext,
            self.ambig,
            u8::from(self.end_to_end),
            self.tol
        )
    }
}

impl FromStr for ScoreProfile {
    type Err = ProfileError;

    /// Parses the `KEY=VALUE,...` form written by [`fmt::Display`]. Whitespace
    /// is ignored and unrecognized keys are skipped, so profiles written by
    /// newer versions still parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut prof = ScoreProfile::default();
        let stripped: String = s.chars().filter(|c| !c.is_whitespace()).collect();

        for token in stripped.split(',').filter(|t| !t.is_empty()) {
            let Some((key, value)) = token.split_once('=') else {
                return Err(ProfileError::InvalidToken(token.to_string()));
            };
            let parse_u8 = || value.parse::<u8>().map_err(|_| ProfileError::InvalidToken(token.to_string()));
            match key {
                "M" => prof.match_score = parse_u8()?,
                "MM" => prof.mismatch = parse_u8()?,
                "GOD" => prof.read_gopen = parse_u8()?,
                "GED" => prof.read_gext = parse_u8()?,
                "GOF" => prof.ref_gopen = parse_u8()?,
                "GEF" => prof.ref_gext = parse_u8()?,
                "AMB" => prof.ambig = parse_u8()?,
                "ETE" => prof.end_to_end = value == "1",
                "TOL" => {
                    prof.tol = value.parse().map_err(|_| ProfileError::InvalidToken(token.to_string()))?;
                }
                _ => {}
            }
        }
        Ok(prof)
    }
}

/// Splits a command line into tokens, treating `=` like whitespace and
/// collapsing runs of dashes so `--local` and `-local` read the same.
fn tokenize_cl(cl: &str) -> Vec<String> {
    let mut collapsed = String::with_capacity(cl.len());
    let mut prev_dash = false;
    for ch in cl.chars() {
        let ch = if ch.is_whitespace() { ' ' } else { ch };
        if ch == '-' && prev_dash {
            continue;
        }
        prev_dash = ch == '-';
        collapsed.push(ch);
    }
    collapsed
        .split([' ', '='])
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Looks up the value following `flag`, parsed as `u8`.
fn value_of(tokens: &[String], flag: &str) -> Result<Option<u8>, ProfileError> {
    let Some(idx) = tokens.iter().position(|t| t == flag) else {
        return Ok(None);
    };
    tokens
        .get(idx + 1)
        .and_then(|v| v.parse().ok())
        .map(Some)
        .ok_or_else(|| ProfileError::InvalidToken(flag.to_string()))
}

/// Looks up a `open,extend` pair following `flag`.
fn gap_pair_of(tokens: &[String], flag: &str) -> Result<Option<(u8, u8)>, ProfileError> {
    let Some(idx) = tokens.iter().position(|t| t == flag) else {
        return Ok(None);
    };
    tokens
        .get(idx + 1)
        .and_then(|v| v.split_once(','))
        .and_then(|(open, extend)| Some((open.parse().ok()?, extend.parse().ok()?)))
        .map(Some)
        .ok_or_else(|| ProfileError::InvalidToken(flag.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn string_round_trip() {
        let mut prof = ScoreProfile::new_asymmetric(2, 6, 4, 1, 2, 1);
        prof.ambig = 3;
        prof.end_to_end = true;
        prof.tol = 7;
        let parsed: ScoreProfile = prof.to_string().parse().unwrap();
        assert_eq!(parsed, prof);
    }

    #[test]
    fn parse_ignores_whitespace_and_unknown_keys() {
        let parsed: ScoreProfile = " M=3, MM=5,\tXYZ=9, ETE=1 ".parse().unwrap();
        assert_eq!(parsed.match_score, 3);
        assert_eq!(parsed.mismatch, 5);
        assert!(parsed.end_to_end);
    }

    #[test]
    fn parse_rejects_bare_tokens() {
        assert_eq!(
            "M=2,bogus".parse::<ScoreProfile>(),
            Err(ProfileError::InvalidToken("bogus".to_string()))
        );
    }

    #[test]
    fn bowtie2_local_with_overrides() {
        let prof =
            ScoreProfile::from_bowtie2_cl("bowtie2 --local -U reads.fq -ma 3 -mp 5 -np 2 -rdg 4,2 -rfg 6,1").unwrap();
        assert!(!prof.end_to_end);
        assert_eq!(
            (prof.match_score, prof.mismatch, prof.ambig),
            (3, 5, 2)
        );
        assert_eq!((prof.read_gopen, prof.read_gext), (4, 2));
        assert_eq!((prof.ref_gopen, prof.ref_gext), (6, 1));
    }

    #[test]
    fn bowtie2_end_to_end_defaults() {
        let prof = ScoreProfile::from_bowtie2_cl("hisat2 -x idx -U reads.fq").unwrap();
        assert!(prof.end_to_end);
        assert_eq!((prof.match_score, prof.mismatch, prof.ambig), (0, 6, 1));
        assert_eq!((prof.read_gopen, prof.read_gext), (5, 3));
    }

    #[test]
    fn bowtie2_requires_unpaired() {
        assert_eq!(
            ScoreProfile::from_bowtie2_cl("bowtie2 -x idx -1 a.fq -2 b.fq"),
            Err(ProfileError::UnpairedExpected)
        );
    }

    #[test]
    fn bwa_mem_derivation() {
        let prof = ScoreProfile::from_bwa_mem_cl("bwa mem -A 2 -B 8 -O 12 -E 3 ref.fa reads.fq").unwrap();
        assert_eq!((prof.match_score, prof.mismatch), (2, 8));
        // The extend penalty is pinned regardless of -E.
        assert_eq!((prof.read_gopen, prof.read_gext), (12, 1));
        assert_eq!((prof.ref_gopen, prof.ref_gext), (12, 1));
    }

    #[test]
    fn program_dispatch() {
        assert!(ScoreProfile::from_program_cl("hisat2 -U r.fq").is_ok());
        assert!(ScoreProfile::from_program_cl("bwa mem ref.fa r.fq").is_ok());
        assert_eq!(
            ScoreProfile::from_program_cl("minimap2 ref.fa r.fq"),
            Err(ProfileError::UnsupportedProgram("minimap2 ref.fa r.fq".to_string()))
        );
    }
}
