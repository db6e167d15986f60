//! BLAST Tabular Output Parser Module
//!
//! Parses the tabular (`-outfmt 6`) records requested from blastn.
//!
//! # Column Layout
//! ```text
//! Col  Type    Description
//! 1    string  Query sequence id (genome contig)
//! 2    string  Subject sequence id (marker name)
//! 3    int     Query start (1-based)
//! 4    int     Query end (1-based, may be < start)
//! 5    string  Subject strand: "plus" or "minus"
//! 6    float   Bit score (optional)
//! ```
//!
//! Records for a marker are expected in descending quality order, which is
//! how blastn reports them.
//!
//! # Example Usage
//! ```
//! use markerflank::blast::BlastRecord;
//!
//! let record = BlastRecord::parse_line("contig1\tNS1\t500\t520\tplus\t40.1").unwrap();
//! assert_eq!(record.marker_id, "NS1");
//! ```

use anyhow::{Context, Result};
use log::warn;

use crate::region::Strand;

/// Output columns passed to `-outfmt`.
pub const OUTFMT_COLUMNS: &str = "6 qseqid sseqid qstart qend sstrand bitscore";

const REQUIRED_FIELDS: usize = 5;

// ============================================================================
// BLAST Record
// ============================================================================

/// A single tabular alignment record.
#[derive(Debug, Clone, PartialEq)]
pub struct BlastRecord {
    /// Genome sequence id the marker aligned to (column 1).
    pub query_id: String,
    /// Marker name (column 2).
    pub marker_id: String,
    /// 1-based start (column 3).
    pub start: usize,
    /// 1-based end (column 4).
    pub end: usize,
    /// Orientation of the marker on the genome (column 5).
    pub strand: Strand,
    /// Bit score, when the sixth column is present.
    pub bit_score: Option<f64>,
}

impl BlastRecord {
    /// Parses a record from a tab-separated line.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The line has fewer than 5 fields
    /// - A coordinate is not a positive integer
    /// - The strand is neither `plus` nor `minus`
    /// - A sixth column is present but is not a number
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < REQUIRED_FIELDS {
            anyhow::bail!(
                "Invalid BLAST line: expected at least {} fields, found {}",
                REQUIRED_FIELDS,
                fields.len()
            );
        }

        let start = parse_coordinate(fields[2]).context("Invalid query start")?;
        let end = parse_coordinate(fields[3]).context("Invalid query end")?;
        let strand: Strand = fields[4].trim().parse()?;

        let bit_score = match fields.get(5).map(|f| f.trim()) {
            Some(f) if !f.is_empty() => Some(f.parse().context("Invalid bit score")?),
            _ => None,
        };

        Ok(Self {
            query_id: fields[0].to_string(),
            marker_id: fields[1].to_string(),
            start,
            end,
            strand,
            bit_score,
        })
    }
}

fn parse_coordinate(field: &str) -> Result<usize> {
    let value: usize = field.trim().parse()?;
    if value == 0 {
        anyhow::bail!("coordinate must be 1-based, got 0");
    }
    Ok(value)
}

/// Parses every record in a block of aligner output.
///
/// Blank lines are skipped. Malformed lines, including unknown strand
/// labels, are logged and rejected rather than guessed at.
pub fn parse_records(output: &str) -> Vec<BlastRecord> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match BlastRecord::parse_line(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Rejected aligner record '{}': {:#}", line, e);
                None
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
