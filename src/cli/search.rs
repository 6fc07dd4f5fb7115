use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::core::palindrome::Palindrome;
use crate::core::types::SearchStrategy;
use crate::diagnostics::TracingDiagnostics;
use crate::parsing::InputOptions;
use crate::report::{write_tsv, write_tsv_file, OutputOptions, SearchSummary};
use crate::search::alignment::AlignerKind;
use crate::search::config::{
    SearchConfig, DEFAULT_BLAST_WORD_SIZE, DEFAULT_JOBS, DEFAULT_LENGTH_THRESHOLD,
    DEFAULT_MAX_NUM_MISMATCHES, DEFAULT_MIN_DISTANCE, DEFAULT_MIN_MISMATCH_DISTANCE_TO_FIRST_BASE,
    DEFAULT_MIN_PALINDROME_LENGTH, DEFAULT_NUM_THREADS,
};
use crate::search::store::SequenceResult;
use crate::search::PalindromeSearch;
use crate::utils::validation::parse_count;

#[derive(Args)]
pub struct SearchArgs {
    /// FASTA file to search (plain, .gz or .bgz)
    #[arg(long)]
    pub fasta: Option<PathBuf>,

    /// Tab-separated contigs table with `contig` and `sequence` columns
    #[arg(long)]
    pub contigs_table: Option<PathBuf>,

    /// Write the palindrome table here instead of stdout (must not exist)
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Minimum arm length
    #[arg(short = 'l', long, default_value_t = DEFAULT_MIN_PALINDROME_LENGTH, value_parser = parse_count)]
    pub min_palindrome_length: usize,

    /// Maximum mismatched positions between the arms
    #[arg(short = 'm', long, default_value_t = DEFAULT_MAX_NUM_MISMATCHES, value_parser = parse_count)]
    pub max_num_mismatches: usize,

    /// Minimum number of bases between the arms
    #[arg(short = 'd', long, default_value_t = DEFAULT_MIN_DISTANCE, value_parser = parse_count)]
    pub min_distance: usize,

    /// Mismatches must be at least this many positions (1-based) from either
    /// end of the arms; 1 allows them anywhere inside
    #[arg(long, default_value_t = DEFAULT_MIN_MISMATCH_DISTANCE_TO_FIRST_BASE, value_parser = parse_count)]
    pub min_mismatch_distance_to_first_base: usize,

    /// Seed word size for the alignment strategy
    #[arg(short = 'w', long, default_value_t = DEFAULT_BLAST_WORD_SIZE, value_parser = parse_count)]
    pub blast_word_size: usize,

    /// Threads given to the aligner
    #[arg(short = 't', long, default_value_t = DEFAULT_NUM_THREADS, value_parser = parse_count)]
    pub num_threads: usize,

    /// Sequences shorter than this are scanned, longer ones aligned
    #[arg(long, default_value_t = DEFAULT_LENGTH_THRESHOLD, value_parser = parse_count)]
    pub length_threshold: usize,

    /// Use one strategy for every sequence regardless of length
    #[arg(long, value_enum)]
    pub algorithm: Option<SearchStrategy>,

    /// Aligner used by the alignment strategy
    #[arg(long, value_enum, default_value = "builtin")]
    pub aligner: AlignerKind,

    /// Keep the temporary directories of external aligners
    #[arg(long)]
    pub keep_temp: bool,

    /// Sequences searched in parallel
    #[arg(short = 'j', long, default_value_t = DEFAULT_JOBS, value_parser = parse_count)]
    pub jobs: usize,
}

impl SearchArgs {
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            min_palindrome_length: self.min_palindrome_length,
            max_num_mismatches: self.max_num_mismatches,
            min_distance: self.min_distance,
            min_mismatch_distance_to_first_base: self.min_mismatch_distance_to_first_base,
            blast_word_size: self.blast_word_size,
            num_threads: self.num_threads,
            length_threshold: self.length_threshold,
            strategy: self.algorithm,
            jobs: self.jobs,
        }
    }

    fn input_options(&self) -> InputOptions {
        InputOptions {
            fasta: self.fasta.clone(),
            contigs_table: self.contigs_table.clone(),
        }
    }
}

/// Execute search subcommand
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the input cannot be
/// read, or an aligner fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: SearchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    // Validate everything before touching any sequence
    let config = args.search_config();
    let source = args.input_options().resolve()?;
    config.validate()?;
    let output = OutputOptions {
        output_file: args.output_file.clone(),
    };
    output.validate()?;

    let engine = PalindromeSearch::new(
        config,
        args.aligner.build(args.keep_temp),
        Arc::new(TracingDiagnostics),
    )?;

    if verbose {
        let c = engine.config();
        info!(
            min_palindrome_length = c.min_palindrome_length,
            max_num_mismatches = c.max_num_mismatches,
            min_distance = c.min_distance,
            min_mismatch_distance_to_first_base = c.min_mismatch_distance_to_first_base,
            blast_word_size = c.blast_word_size,
            num_threads = c.num_threads,
            length_threshold = c.length_threshold,
            aligner = engine.aligner_name(),
            "Search settings"
        );
    }

    let summary = engine.process(source.as_ref())?;
    let results = engine.results();

    if summary.num_palindromes == 0 {
        warn!(
            sequences = summary.num_sequences,
            "No palindromes found; no output written"
        );
        return Ok(());
    }

    log_summary(&summary);

    if let Some(path) = &output.output_file {
        write_tsv_file(path, &results)?;
        info!(path = %path.display(), "Palindromes written");
        return Ok(());
    }

    match format {
        OutputFormat::Text => print_text_results(&results),
        OutputFormat::Json => print_json_results(&summary, &results)?,
        OutputFormat::Tsv => write_tsv(std::io::stdout().lock(), &results)?,
    }

    Ok(())
}

fn log_summary(summary: &SearchSummary) {
    info!(
        sequences = summary.num_sequences,
        sequences_with_palindromes = summary.num_sequences_with_palindromes,
        palindromes = summary.num_palindromes,
        "Search complete"
    );
    if let Some(longest) = &summary.longest {
        info!(
            sequence = %longest.sequence_name,
            length = longest.length,
            "Longest palindrome"
        );
    }
    if let Some(distant) = &summary.most_distant {
        info!(
            sequence = %distant.sequence_name,
            distance = distant.distance,
            "Most distant palindrome"
        );
    }
}

fn print_text_results(results: &[SequenceResult]) {
    for result in results.iter().filter(|r| !r.palindromes.is_empty()) {
        println!(
            "{} ({} bp, {}): {} palindrome(s)",
            result.sequence_name,
            result.length,
            result.strategy,
            result.palindromes.len()
        );
        for palindrome in &result.palindromes {
            println!("  {palindrome}");
            println!("    {}", palindrome.first_sequence());
            println!("    {}", palindrome.midline());
            println!("    {}", palindrome.second_sequence());
        }
        println!();
    }
}

fn print_json_results(summary: &SearchSummary, results: &[SequenceResult]) -> anyhow::Result<()> {
    let palindromes: Vec<&Palindrome> = results.iter().flat_map(|r| &r.palindromes).collect();
    let output = serde_json::json!({
        "summary": summary,
        "palindromes": palindromes,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
