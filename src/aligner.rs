//! Alignment Oracle Module
//!
//! Runs blastn for one genome against the marker database and returns its
//! tabular records. The genome is the query and the markers are the
//! database, so `qstart`/`qend` are genome coordinates.
//!
//! Failure policy:
//! - spawn failure or non-zero exit aborts the run
//! - a timeout kills the child and yields no hits for that genome

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use log::{debug, warn};
use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

use crate::blast::{self, BlastRecord, OUTFMT_COLUMNS};
use crate::seqio::is_gzipped;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Source of marker hits for a genome file.
///
/// Implementations must report records for each marker in descending
/// quality order; the first record per marker is the one used.
pub trait AlignmentOracle: Sync {
    fn align(&self, genome: &Path) -> Result<Vec<BlastRecord>>;
}

// ============================================================================
// blastn
// ============================================================================

#[derive(Debug, Clone)]
pub struct BlastnConfig {
    /// Resolved blastn executable.
    pub executable: PathBuf,
    /// BLAST database prefix built from the marker sequences.
    pub db: PathBuf,
    pub task: String,
    pub word_size: usize,
    pub max_target_seqs: usize,
    /// Upper bound on a single invocation; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

pub struct Blastn {
    config: BlastnConfig,
}

impl Blastn {
    pub fn new(config: BlastnConfig) -> Self {
        Self { config }
    }

    fn command(&self, query: &Path) -> Command {
        let mut cmd = Command::new(&self.config.executable);
        cmd.arg("-query")
            .arg(query)
            .arg("-db")
            .arg(&self.config.db)
            .args(["-outfmt", OUTFMT_COLUMNS])
            .args(["-task", &self.config.task])
            .args(["-max_target_seqs", &self.config.max_target_seqs.to_string()])
            .args(["-word_size", &self.config.word_size.to_string()]);
        cmd
    }
}

impl AlignmentOracle for Blastn {
    fn align(&self, genome: &Path) -> Result<Vec<BlastRecord>> {
        // blastn cannot read gzip input; stage a decompressed copy
        let staged = if is_gzipped(genome) {
            Some(decompress_to_temp(genome)?)
        } else {
            None
        };
        let query = staged.as_ref().map_or(genome, |f| f.path());

        let output = match run_with_timeout(self.command(query), self.config.timeout)
            .with_context(|| format!("Failed to run blastn on {}", genome.display()))?
        {
            Some(output) => output,
            None => {
                warn!(
                    "blastn timed out after {:?} on {}; treating as no hits",
                    self.config.timeout.unwrap_or_default(),
                    genome.display()
                );
                return Ok(Vec::new());
            }
        };

        if !output.status.success() {
            anyhow::bail!(
                "blastn failed on {} ({}): {}",
                genome.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = blast::parse_records(&stdout);
        debug!("blastn reported {} record(s) for {}", records.len(), genome.display());
        Ok(records)
    }
}

fn decompress_to_temp(path: &Path) -> Result<NamedTempFile> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open genome: {}", path.display()))?;
    let mut decoder = MultiGzDecoder::new(file);
    let mut staged = tempfile::Builder::new()
        .prefix("markerflank_")
        .suffix(".fasta")
        .tempfile()
        .context("Failed to create temporary query file")?;
    io::copy(&mut decoder, staged.as_file_mut())
        .with_context(|| format!("Failed to decompress {}", path.display()))?;
    Ok(staged)
}

// ============================================================================
// Process helpers
// ============================================================================

/// Runs a command to completion, killing it if `timeout` elapses.
///
/// # Returns
/// - `Ok(Some(output))` - The process exited (successfully or not)
/// - `Ok(None)` - The process was killed after the timeout
/// - `Err(e)` - The process could not be spawned or waited on
pub fn run_with_timeout(mut command: Command, timeout: Option<Duration>) -> Result<Option<Output>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to spawn process")?;

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let stdout_handle = thread::spawn(move || read_pipe(stdout_pipe));
    let stderr_handle = thread::spawn(move || read_pipe(stderr_pipe));

    let deadline = timeout.map(|t| Instant::now() + t);
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break Some(status);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            // The child may exit between try_wait and kill
            let _ = child.kill();
            child.wait()?;
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = stdout_handle
        .join()
        .map_err(|_| anyhow::anyhow!("stdout reader thread panicked"))??;
    let stderr = stderr_handle
        .join()
        .map_err(|_| anyhow::anyhow!("stderr reader thread panicked"))??;

    Ok(status.map(|status| Output { status, stdout, stderr }))
}

fn read_pipe<R: Read>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

/// Locates an executable by absolute path or on `PATH`.
pub fn find_executable(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    if path.components().count() > 1 {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        anyhow::bail!("{} not found", path.display());
    }

    if let Some(paths) = env::var_os("PATH") {
        for dir in env::split_paths(&paths) {
            let full_path = dir.join(name);
            if full_path.is_file() {
                return Ok(full_path);
            }
        }
    }

    anyhow::bail!("{} not found in PATH. Please install it or add it to your PATH.", name)
}
