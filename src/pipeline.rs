//! Batch Pipeline Module
//!
//! Drives a whole run: discovers genome files, aligns each one against the
//! marker database, resolves the extraction rules and writes one FASTA file
//! per extracted genome plus the missing log.
//!
//! # Per-genome flow
//! ```text
//! genome file → AlignmentOracle → HitSelector → RuleEngine → {stem}_region.fasta
//!                                                   └──────→ MissingTracker
//! ```
//!
//! Genomes are independent and run on the rayon pool; the only shared state
//! is the read-only rule set and the missing tracker.

use anyhow::{bail, Context, Result};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::aligner::AlignmentOracle;
use crate::config::RunConfig;
use crate::engine::{Outcome, RuleEngine};
use crate::hits::HitSelector;
use crate::missing::MissingTracker;
use crate::region::Strand;
use crate::seqio::{write_fasta_record, Genome};

// ============================================================================
// Genome discovery
// ============================================================================

/// A genome file scheduled for processing.
#[derive(Debug, Clone)]
pub struct GenomeFile {
    /// Position in the run (sorted by filename).
    pub index: usize,
    pub path: PathBuf,
    pub filename: String,
}

/// Lists genome files in `dir` whose name ends in one of `extensions`,
/// optionally followed by `.gz`, sorted by filename.
///
/// # Errors
/// Fails when the directory cannot be read or when two genome files share
/// an output stem (e.g. `g.fasta` and `g.fna`), since both would write the
/// same region file.
pub fn discover_genomes(dir: &Path, extensions: &[String]) -> Result<Vec<GenomeFile>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory: {}", dir.display()))?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            warn!("Skipping file with non UTF-8 name: {}", path.display());
            continue;
        };
        if has_genome_extension(&filename, extensions) {
            files.push((filename, path));
        }
    }

    files.sort();

    let mut stems: FxHashMap<&str, &str> = FxHashMap::default();
    for (filename, _) in &files {
        let stem = output_stem(filename);
        if let Some(first) = stems.insert(stem, filename) {
            bail!(
                "Genome files '{}' and '{}' would both be written to {}_region.fasta; rename one of them",
                first,
                filename,
                stem
            );
        }
    }

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(index, (filename, path))| GenomeFile { index, path, filename })
        .collect())
}

fn has_genome_extension(filename: &str, extensions: &[String]) -> bool {
    let name = filename.strip_suffix(".gz").unwrap_or(filename);
    extensions.iter().any(|ext| {
        name.strip_suffix(ext.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            .is_some_and(|stem| !stem.is_empty())
    })
}

/// Filename with a trailing `.gz` and then the last extension removed.
fn output_stem(filename: &str) -> &str {
    let name = filename.strip_suffix(".gz").unwrap_or(filename);
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

/// Output path for a genome: `{output_dir}/{stem}_region.fasta`.
pub fn output_path(output_dir: &Path, filename: &str) -> PathBuf {
    output_dir.join(format!("{}_region.fasta", output_stem(filename)))
}

// ============================================================================
// Processing
// ============================================================================

/// What happened to one genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenomeStatus {
    Extracted { marker: String, strand: Strand },
    Missing,
}

impl GenomeStatus {
    pub fn is_extracted(&self) -> bool {
        matches!(self, GenomeStatus::Extracted { .. })
    }
}

/// Processes one genome and writes its region file if a rule matched.
///
/// # Errors
/// Aligner failures and output write failures are returned and abort the
/// run. A genome that cannot be loaded is logged and reported as Missing.
pub fn process_genome<O: AlignmentOracle + ?Sized>(
    genome: &GenomeFile,
    oracle: &O,
    engine: &RuleEngine<'_>,
    output_dir: &Path,
) -> Result<GenomeStatus> {
    let mut selector = HitSelector::new();
    for record in oracle.align(&genome.path)? {
        selector.offer(record);
    }
    debug!(
        "[{}] {} lower-ranked hit(s) discarded, {} out of score order",
        genome.filename,
        selector.discarded(),
        selector.order_violations()
    );
    let hits = selector.finish();
    if hits.is_empty() {
        return Ok(GenomeStatus::Missing);
    }

    let sequences = match Genome::load(&genome.path) {
        Ok(sequences) => sequences,
        Err(e) => {
            error!("[{}] Failed to load genome: {:#}", genome.filename, e);
            return Ok(GenomeStatus::Missing);
        }
    };
    if sequences.is_empty() {
        warn!("[{}] Genome file contains no sequences", genome.filename);
        return Ok(GenomeStatus::Missing);
    }

    match engine.resolve(&hits, &sequences) {
        Outcome::Extracted { rule, strand, region } => {
            let path = output_path(output_dir, &genome.filename);
            write_fasta_record(&path, &region.header, &region.sequence)?;
            Ok(GenomeStatus::Extracted {
                marker: rule.marker().to_string(),
                strand,
            })
        }
        Outcome::Missing => Ok(GenomeStatus::Missing),
    }
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub extracted: usize,
    /// Missing genome filenames in run order.
    pub missing: Vec<String>,
}

/// Runs the full batch described by `config`.
///
/// Uses the global rayon pool; configure its size before calling.
pub fn run<O: AlignmentOracle + ?Sized>(config: &RunConfig, oracle: &O) -> Result<RunSummary> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory: {}", config.output_dir.display())
    })?;

    let genomes = discover_genomes(&config.input_dir, &config.extensions)?;
    info!("Total genomes found: {}", genomes.len());
    info!("Rules: {}", config.rules);

    let engine = RuleEngine::new(&config.rules);
    let tracker = MissingTracker::new();

    let statuses: Vec<GenomeStatus> = genomes
        .par_iter()
        .map(|genome| -> Result<GenomeStatus> {
            let status = process_genome(genome, oracle, &engine, &config.output_dir)?;
            match &status {
                GenomeStatus::Extracted { marker, strand } => {
                    info!("[{}] Found {} ({}) -> Extracted.", genome.filename, marker, strand);
                }
                GenomeStatus::Missing => {
                    info!("[{}] Target Missing.", genome.filename);
                    tracker.record(genome.index, genome.filename.as_str());
                }
            }
            Ok(status)
        })
        .collect::<Result<_>>()?;

    let extracted = statuses.iter().filter(|s| s.is_extracted()).count();
    tracker.write_log(&config.missing_log)?;

    info!("{}", "-".repeat(30));
    info!("Processing complete.");
    info!("Extracted: {}/{}", extracted, genomes.len());
    info!("Missing log saved to: {}", config.missing_log.display());

    Ok(RunSummary {
        total: genomes.len(),
        extracted,
        missing: tracker.names(),
    })
}
