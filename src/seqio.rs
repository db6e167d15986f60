//! Sequence I/O Module
//!
//! Reads genome FASTA files (plain or gzip-compressed) into memory and
//! writes the single-record FASTA files produced for each genome.
//!
//! # Examples
//! ```no_run
//! use markerflank::seqio::{FastaFile, Genome};
//!
//! // Stream records
//! let mut reader = FastaFile::open("genome.fna.gz").unwrap();
//! while let Some(record) = reader.read_next().unwrap() {
//!     println!("{}: {} bp", record.name, record.seq.len());
//! }
//!
//! // Load a whole genome for random access
//! let genome = Genome::load("genome.fna").unwrap();
//! println!("{} sequences", genome.len());
//! ```

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

// ============================================================================
// FASTA Reading
// ============================================================================

/// A FASTA record containing sequence name and nucleotide sequence.
#[derive(Debug, Clone)]
pub struct FastaRecord {
    /// Sequence identifier (text after '>' up to the first whitespace).
    pub name: String,
    /// Nucleotide sequence (may contain IUPAC codes).
    pub seq: String,
}

/// Sequential FASTA reader over any byte source.
///
/// Handles multi-line sequences and strips line endings.
pub struct FastaReader<R: Read> {
    reader: BufReader<R>,
    line_buf: String,
    current_name: Option<String>,
}

impl FastaReader<File> {
    /// Opens a plain FASTA file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open FASTA: {}", path.as_ref().display()))?;
        Self::new(file)
    }
}

impl FastaReader<MultiGzDecoder<File>> {
    /// Opens a gzip-compressed FASTA file.
    pub fn open_gz<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open FASTA.gz: {}", path.as_ref().display()))?;
        Self::new(MultiGzDecoder::new(file))
    }
}

impl<R: Read> FastaReader<R> {
    /// Wraps a reader and consumes the first header line.
    pub fn new(source: R) -> Result<Self> {
        let mut reader = Self {
            reader: BufReader::with_capacity(1024 * 1024, source),
            line_buf: String::with_capacity(256),
            current_name: None,
        };

        // Skip anything before the first header
        loop {
            reader.line_buf.clear();
            if reader.reader.read_line(&mut reader.line_buf)? == 0 {
                break;
            }
            if let Some(header) = reader.line_buf.strip_prefix('>') {
                reader.current_name = Some(header_id(header));
                break;
            }
        }

        Ok(reader)
    }

    /// Reads the next FASTA record.
    ///
    /// # Returns
    /// - `Ok(Some(record))` - Successfully read a record
    /// - `Ok(None)` - End of input reached
    /// - `Err(e)` - I/O error occurred
    pub fn read_next(&mut self) -> Result<Option<FastaRecord>> {
        let name = match self.current_name.take() {
            Some(n) => n,
            None => return Ok(None),
        };

        let mut seq = String::with_capacity(10000);

        loop {
            self.line_buf.clear();
            if self.reader.read_line(&mut self.line_buf)? == 0 {
                break;
            }

            if let Some(header) = self.line_buf.strip_prefix('>') {
                self.current_name = Some(header_id(header));
                break;
            }
            seq.push_str(self.line_buf.trim());
        }

        Ok(Some(FastaRecord { name, seq }))
    }
}

impl<R: Read> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

fn header_id(header: &str) -> String {
    header.split_whitespace().next().unwrap_or("").to_string()
}

/// Auto-detecting FASTA file reader.
///
/// Files ending in `.gz` are treated as gzip-compressed.
pub enum FastaFile {
    Plain(FastaReader<File>),
    Gzipped(FastaReader<MultiGzDecoder<File>>),
}

impl FastaFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if is_gzipped(path) {
            Ok(FastaFile::Gzipped(FastaReader::open_gz(path)?))
        } else {
            Ok(FastaFile::Plain(FastaReader::open(path)?))
        }
    }

    pub fn read_next(&mut self) -> Result<Option<FastaRecord>> {
        match self {
            FastaFile::Plain(r) => r.read_next(),
            FastaFile::Gzipped(r) => r.read_next(),
        }
    }
}

/// True when the path carries a `.gz` extension.
pub fn is_gzipped(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

// ============================================================================
// Genome
// ============================================================================

/// All sequences of one genome file, keyed by sequence id.
///
/// Sequences are guaranteed ASCII so coordinates can index them directly.
#[derive(Debug, Clone, Default)]
pub struct Genome {
    records: FxHashMap<String, String>,
}

impl Genome {
    /// Loads every record of a FASTA file.
    ///
    /// # Errors
    /// Fails on I/O errors or when a sequence contains non-ASCII bytes.
    /// Duplicate ids keep the first record, as a dictionary load would.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = FastaFile::open(path)?;
        let mut records = FxHashMap::default();

        while let Some(record) = reader
            .read_next()
            .with_context(|| format!("Failed to read FASTA: {}", path.display()))?
        {
            if !record.seq.is_ascii() {
                anyhow::bail!(
                    "Invalid FASTA: non-ASCII sequence data in record '{}' of {}",
                    record.name,
                    path.display()
                );
            }
            records.entry(record.name).or_insert(record.seq);
        }

        Ok(Self { records })
    }

    /// Builds a genome from in-memory `(id, sequence)` pairs, with the same
    /// rules as [`Genome::load`].
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut map = FxHashMap::default();
        for (name, seq) in records {
            if !seq.is_ascii() {
                anyhow::bail!("Invalid sequence: non-ASCII data in record '{}'", name);
            }
            map.entry(name).or_insert(seq);
        }
        Ok(Self { records: map })
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.records.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// FASTA Writing
// ============================================================================

/// Writes a single-record FASTA file, replacing any existing content.
///
/// The sequence is written on one line.
pub fn write_fasta_record(path: &Path, header: &str, seq: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, ">{}", header)?;
    writeln!(writer, "{}", seq)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use tempfile::TempDir;

    const MULTI_FASTA: &str = ">contig_1 Escherichia coli chromosome\nACGT\nACGT\n>contig_2\r\nTTTT\r\n>contig_1 duplicate\nGGGG\n";

    #[test]
    fn test_read_multiline_records() {
        let records: Vec<FastaRecord> = FastaReader::new(MULTI_FASTA.as_bytes())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "contig_1");
        assert_eq!(records[0].seq, "ACGTACGT");
        assert_eq!(records[1].name, "contig_2");
        assert_eq!(records[1].seq, "TTTT");
    }

    #[test]
    fn test_empty_input() {
        let mut reader = FastaReader::new("".as_bytes()).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_genome_load_plain_and_gz() {
        let dir = TempDir::new().unwrap();

        let plain = dir.path().join("g.fna");
        std::fs::write(&plain, MULTI_FASTA).unwrap();

        let gz = dir.path().join("g.fna.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(MULTI_FASTA.as_bytes()).unwrap();
        encoder.finish().unwrap();

        for path in [&plain, &gz] {
            let genome = Genome::load(path).unwrap();
            assert_eq!(genome.len(), 2);
            // First record wins on duplicate ids
            assert_eq!(genome.get("contig_1"), Some("ACGTACGT"));
            assert_eq!(genome.get("contig_2"), Some("TTTT"));
            assert_eq!(genome.get("contig_3"), None);
        }
    }

    #[test]
    fn test_genome_rejects_non_ascii() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.fasta");
        std::fs::write(&path, ">x\nACGTÄ\n").unwrap();
        assert!(Genome::load(&path).is_err());

        let records = [("x".to_string(), "ACGTÄ".to_string())];
        assert!(Genome::from_records(records).is_err());
    }

    #[test]
    fn test_genome_from_records_keeps_first_duplicate() {
        let genome = Genome::from_records([
            ("chr".to_string(), "AAAA".to_string()),
            ("chr".to_string(), "CCCC".to_string()),
        ])
        .unwrap();
        assert_eq!(genome.len(), 1);
        assert_eq!(genome.get("chr"), Some("AAAA"));
    }

    #[test]
    fn test_genome_without_records_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.fna");
        std::fs::write(&path, "\n").unwrap();
        assert!(Genome::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_write_fasta_record_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.fasta");
        std::fs::write(&path, "stale content\nmore\n").unwrap();

        write_fasta_record(&path, "chr_extracted_NS1_300_plus", "ACGT").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, ">chr_extracted_NS1_300_plus\nACGT\n");
    }

    #[test]
    fn test_is_gzipped() {
        assert!(is_gzipped(Path::new("a/b.fna.gz")));
        assert!(!is_gzipped(Path::new("a/b.fna")));
    }
}
