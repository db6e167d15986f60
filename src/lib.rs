//! markerflank - Marker-anchored flanking region extraction
//!
//! Aligns a marker database against a batch of genomes with blastn and, for
//! each genome, extracts the flanking region named by the first matching
//! `MARKER:±N` rule, in the marker's own 5'→3' orientation.
//!
//! # Modules
//! - `seqio`: FASTA reading (plain or gzip), genome loading, FASTA writing
//! - `blast`: blastn tabular record parsing
//! - `aligner`: alignment oracle trait and blastn subprocess runner
//! - `hits`: first-hit-per-marker selection
//! - `region`: strand-aware window computation and reverse complement
//! - `rules`: `MARKER:±N` rule parsing
//! - `engine`: priority-ordered rule resolution
//! - `missing`: missing-genome tracking and log output
//! - `config`: run configuration
//! - `pipeline`: batch driver

pub mod seqio;
pub mod blast;
pub mod aligner;
pub mod hits;
pub mod region;
pub mod rules;
pub mod engine;
pub mod missing;
pub mod config;
pub mod pipeline;
