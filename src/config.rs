//! Run configuration consumed by the pipeline.

use std::path::PathBuf;

use crate::rules::RuleSet;

/// Extensions recognised as genome files when none are configured.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["fasta", "fna"];

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory scanned for genome files.
    pub input_dir: PathBuf,
    /// Directory receiving one `{stem}_region.fasta` per extracted genome.
    pub output_dir: PathBuf,
    /// File listing genomes without an extracted region.
    pub missing_log: PathBuf,
    pub rules: RuleSet,
    /// Genome file extensions without the leading dot; a trailing `.gz` is
    /// always accepted in addition.
    pub extensions: Vec<String>,
}

impl RunConfig {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, missing_log: PathBuf, rules: RuleSet) -> Self {
        Self {
            input_dir,
            output_dir,
            missing_log,
            rules,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }
}
