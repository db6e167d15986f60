//! Flanking Region Module
//!
//! Converts one aligner hit and a signed offset into a flanking sequence
//! expressed in the marker's own 5'→3' orientation.
//!
//! # Offset Semantics
//! ```text
//! offset > 0   N bases downstream, starting at the marker's 5' end
//! offset < 0   N bases upstream, ending at the marker's 3' end
//! ```
//!
//! On a reverse-strand hit the marker's 5' end is the physical end of the
//! alignment on the genome, so the windows swap sides and the materialised
//! sequence is reverse-complemented.
//!
//! ```text
//! Forward (plus)                       Reverse (minus)
//!        lo      hi                           lo      hi
//!  ------[=marker=>]-------            ------[<=marker=]-------
//!        |---- +N ---->                 <---- +N ----|
//!   <---- -N ----|                             |---- -N ---->
//! ```

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

use crate::hits::RawHit;
use crate::rules::Rule;
use crate::seqio::Genome;

// ============================================================================
// Strand
// ============================================================================

/// Orientation of a hit relative to the genome's forward sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// Aligner label `plus`.
    Forward,
    /// Aligner label `minus`.
    Reverse,
}

impl Strand {
    /// Label used by the aligner and in output headers.
    pub fn label(&self) -> &'static str {
        match self {
            Strand::Forward => "plus",
            Strand::Reverse => "minus",
        }
    }
}

impl FromStr for Strand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plus" => Ok(Strand::Forward),
            "minus" => Ok(Strand::Reverse),
            _ => bail!("Unknown strand label '{}' (expected 'plus' or 'minus')", s),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Coordinates
// ============================================================================

/// Normalised 0-based, half-open interval `[lo, hi)` on the forward strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalInterval {
    pub lo: usize,
    pub hi: usize,
}

impl PhysicalInterval {
    /// Builds the interval from a 1-based inclusive start/end pair.
    ///
    /// The aligner reports `start > end` for some reverse-strand hits, so the
    /// pair is ordered before conversion.
    pub fn from_one_based(start: usize, end: usize) -> Self {
        Self {
            lo: start.min(end).saturating_sub(1),
            hi: start.max(end),
        }
    }

    pub fn len(&self) -> usize {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.hi == self.lo
    }
}

/// Region of the genome to materialise, always within `[0, genome_len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionWindow {
    pub lo: usize,
    pub hi: usize,
}

impl ExtractionWindow {
    /// Computes the clamped window for a hit interval, strand and offset.
    ///
    /// # Arguments
    /// * `interval` - Normalised hit coordinates
    /// * `strand` - Orientation of the hit
    /// * `offset` - Signed window length (must be non-zero)
    /// * `genome_len` - Length of the sequence the hit lies on
    pub fn compute(
        interval: PhysicalInterval,
        strand: Strand,
        offset: i64,
        genome_len: usize,
    ) -> Self {
        let magnitude = usize::try_from(offset.unsigned_abs()).unwrap_or(usize::MAX);
        let PhysicalInterval { lo, hi } = interval;

        let (start, end) = match (strand, offset > 0) {
            // Marker 5' end is lo; walk towards higher coordinates.
            (Strand::Forward, true) => (lo, lo.saturating_add(magnitude)),
            // Marker 3' end is hi; walk towards lower coordinates.
            (Strand::Forward, false) => (hi.saturating_sub(magnitude), hi),
            // Marker 5' end is hi; downstream is physically to the left.
            (Strand::Reverse, true) => (hi.saturating_sub(magnitude), hi),
            // Marker 3' end is lo; upstream is physically to the right.
            (Strand::Reverse, false) => (lo, lo.saturating_add(magnitude)),
        };

        let hi = end.min(genome_len);
        Self { lo: start.min(hi), hi }
    }
}

// ============================================================================
// Extracted Region
// ============================================================================

/// One FASTA record produced for a genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRegion {
    /// Header without the leading '>'.
    pub header: String,
    /// Flanking sequence in the marker's reading direction.
    pub sequence: String,
}

/// Output header: `{query_id}_extracted_{marker}_{offset}_{strand}`.
pub fn region_header(query_id: &str, marker: &str, offset: i64, strand: Strand) -> String {
    format!("{}_extracted_{}_{}_{}", query_id, marker, offset, strand.label())
}

/// Extracts the flanking region described by `rule` around `hit`.
///
/// # Returns
/// `None` when the hit's sequence id is not present in `genome`. A window
/// clamped to zero length still yields a region with an empty sequence.
pub fn extract_region(hit: &RawHit, rule: &Rule, genome: &Genome) -> Option<ExtractedRegion> {
    let full_seq = genome.get(&hit.query_id)?;

    let window = ExtractionWindow::compute(hit.interval(), hit.strand, rule.offset(), full_seq.len());
    let slice = &full_seq[window.lo..window.hi];

    let sequence = match hit.strand {
        Strand::Forward => slice.to_string(),
        Strand::Reverse => reverse_complement(slice),
    };

    Some(ExtractedRegion {
        header: region_header(&hit.query_id, rule.marker(), rule.offset(), hit.strand),
        sequence,
    })
}

// ============================================================================
// Sequence Utilities
// ============================================================================

/// Complements a single nucleotide, including IUPAC ambiguity codes.
///
/// Case is preserved; symbols without a complement (gaps, unknown letters)
/// are returned unchanged.
pub fn complement_base(base: u8) -> u8 {
    let comp = match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'S' | b'W' | b'N' => base.to_ascii_uppercase(),
        _ => return base,
    };
    if base.is_ascii_lowercase() {
        comp.to_ascii_lowercase()
    } else {
        comp
    }
}

pub fn reverse_complement(seq: &str) -> String {
    seq.bytes()
        .rev()
        .map(|b| complement_base(b) as char)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
