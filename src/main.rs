use anyhow::Result;
use clap::Parser;
use log::{debug, Level};
use simple_logger::init_with_level;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use markerflank::aligner::{find_executable, Blastn, BlastnConfig};
use markerflank::config::RunConfig;
use markerflank::pipeline;
use markerflank::rules::{parse_rule, Rule, RuleSet};

#[derive(Parser)]
#[command(name = "markerflank")]
#[command(version)]
#[command(about = "Extract marker-anchored flanking regions from a batch of genomes")]
#[command(long_about = r#"
markerflank - flanking region extraction around BLAST-located markers

For every genome in the input directory:
  1. Align the genome against the marker database (blastn)
  2. Keep the first (best) hit reported for each marker
  3. Apply the rules in order; the first rule whose marker was hit wins
  4. Write the flanking region in the marker's own orientation

RULES (MARKER:±N):
  MARKER:+N   N bases downstream, starting at the marker's 5' end
  MARKER:-N   N bases upstream, ending at the marker's 3' end
  Minus-strand hits are handled so the output always reads 5'→3' relative
  to the marker (the extracted sequence is reverse-complemented).

OUTPUT FILES:
  {output-dir}/{genome}_region.fasta   One record per extracted genome
      >{seq_id}_extracted_{marker}_{offset}_{plus|minus}
  {missing-log}                        Genomes without any usable hit,
                                       or "No missing targets."

EXAMPLES:
  markerflank -i genomes/ -d db/primers -o regions/ -m missing.txt \
      -r NS1:+3000 LN7:-3000
"#)]
struct Args {
    #[arg(short = 'i', long = "input-dir", alias = "input_dir", value_name = "DIR", help_heading = "Input")]
    input_dir: PathBuf,

    /// Genome file extensions (a trailing .gz is also accepted)
    #[arg(short = 'e', long, value_name = "EXT", value_delimiter = ',', default_value = "fasta,fna", help_heading = "Input")]
    extensions: Vec<String>,

    /// BLAST database built from the marker sequences
    #[arg(short = 'd', long = "primer-db", alias = "primer_db", value_name = "DB", help_heading = "Database")]
    primer_db: PathBuf,

    #[arg(short = 'o', long = "output-dir", alias = "output_dir", value_name = "DIR", help_heading = "Output")]
    output_dir: PathBuf,

    #[arg(short = 'm', long = "missing-log", alias = "missing_log", value_name = "FILE", help_heading = "Output")]
    missing_log: PathBuf,

    /// Extraction rules in priority order (e.g. NS1:+3000 LN7:-3000)
    #[arg(short = 'r', long, value_name = "MARKER:±N", num_args = 1.., required = true,
          value_parser = parse_rule, help_heading = "Rules")]
    rules: Vec<Rule>,

    #[arg(long, value_name = "PATH", default_value = "blastn", help_heading = "Aligner")]
    blastn: String,

    #[arg(long, value_name = "TASK", default_value = "blastn-short", help_heading = "Aligner")]
    task: String,

    #[arg(long = "word-size", value_name = "NUM", default_value = "16", help_heading = "Aligner")]
    word_size: usize,

    #[arg(long = "max-target-seqs", value_name = "NUM", default_value = "1", help_heading = "Aligner")]
    max_target_seqs: usize,

    /// Per-genome blastn time limit; 0 disables it
    #[arg(long, value_name = "SECS", default_value = "600", help_heading = "Aligner")]
    timeout: u64,

    /// Worker threads (0 = all CPUs)
    #[arg(short = 't', long, value_name = "NUM", default_value = "0", help_heading = "Runtime")]
    threads: usize,

    #[arg(short = 'L', long, value_name = "LEVEL", default_value = "info", help_heading = "Runtime")]
    level: Level,
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    let start_time = Instant::now();

    init_with_level(args.level)?;

    if args.threads == 0 {
        args.threads = num_cpus::get();
    }

    let blastn = find_executable(&args.blastn)?;
    debug!("Found blastn: {}", blastn.display());

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .ok();

    let rules = RuleSet::new(args.rules).map_err(anyhow::Error::msg)?;
    let config = RunConfig::new(args.input_dir, args.output_dir, args.missing_log, rules)
        .with_extensions(&args.extensions);

    let oracle = Blastn::new(BlastnConfig {
        executable: blastn,
        db: args.primer_db,
        task: args.task,
        word_size: args.word_size,
        max_target_seqs: args.max_target_seqs,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
    });

    pipeline::run(&config, &oracle)?;

    debug!("Total time: {:.1}s", start_time.elapsed().as_secs_f64());
    Ok(())
}
