//! Missing-genome tracking.
//!
//! Collects the genomes for which no rule produced a region. The tracker
//! is shared by all workers; entries carry the genome's position in the run
//! so the log comes out in input order whatever order workers finish in.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Line written to the log when every genome was extracted.
pub const NO_MISSING_SENTINEL: &str = "No missing targets.";

#[derive(Debug, Default)]
pub struct MissingTracker {
    entries: Mutex<Vec<(usize, String)>>,
}

impl MissingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records genome `name`, found at position `index` of the run.
    pub fn record(&self, index: usize, name: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((index, name.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recorded names in run order.
    pub fn names(&self) -> Vec<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone();
        entries.sort_by_key(|(index, _)| *index);
        entries.into_iter().map(|(_, name)| name).collect()
    }

    /// Writes one name per line, or the sentinel line if nothing is missing.
    pub fn write_log(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create missing log: {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        let names = self.names();
        if names.is_empty() {
            writeln!(writer, "{}", NO_MISSING_SENTINEL)?;
        } else {
            for name in &names {
                writeln!(writer, "{}", name)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_names_in_run_order() {
        let tracker = MissingTracker::new();
        tracker.record(7, "g7.fna");
        tracker.record(2, "g2.fasta");
        tracker.record(4, "g4.fna");

        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.names(), vec!["g2.fasta", "g4.fna", "g7.fna"]);
    }

    #[test]
    fn test_concurrent_records() {
        let tracker = MissingTracker::new();
        std::thread::scope(|s| {
            for i in 0..8 {
                let tracker = &tracker;
                s.spawn(move || tracker.record(i, format!("genome_{}.fna", i)));
            }
        });
        let names = tracker.names();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "genome_0.fna");
        assert_eq!(names[7], "genome_7.fna");
    }

    #[test]
    fn test_write_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.txt");

        let tracker = MissingTracker::new();
        tracker.record(1, "b.fna");
        tracker.record(0, "a.fasta");
        tracker.write_log(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a.fasta\nb.fna\n");
    }

    #[test]
    fn test_write_sentinel_when_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.txt");

        let tracker = MissingTracker::new();
        assert!(tracker.is_empty());
        tracker.write_log(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "No missing targets.\n");
    }
}
