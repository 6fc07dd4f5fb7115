//! Command-line interface for palindrome-search.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **search**: Find palindromes in a FASTA file or contigs table
//! - **resolve-map**: Split a match/mismatch map into qualifying segments
//!
//! ## Usage
//!
//! ```text
//! # Palindromes of at least 15 bp with up to one mismatch
//! palindrome-search search --fasta contigs.fa --min-palindrome-length 15 --max-num-mismatches 1
//!
//! # Write the table to a file instead of stdout
//! palindrome-search search --contigs-table contigs.tsv -o palindromes.tsv
//!
//! # Force the alignment strategy and use NCBI BLAST+
//! palindrome-search search --fasta genome.fa.gz --algorithm alignment --aligner blastn
//!
//! # Inspect how a hit would be split
//! palindrome-search resolve-map ooxooooooooooooooooxoooxoxxoxxoxooooooooo --min-palindrome-length 5
//! ```

use clap::{Parser, Subcommand};

pub mod resolve;
pub mod search;

#[derive(Parser)]
#[command(name = "palindrome-search")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Find palindromes (inverted repeats) in nucleotide sequences")]
#[command(
    long_about = "palindrome-search finds inverted repeats: pairs of arms where the second arm is the reverse complement of the first, optionally separated by a spacer.\n\nShort sequences are scanned directly; long sequences are aligned against their own reverse complement and the hits are split into segments that meet the length and mismatch limits."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find palindromes in every sequence of a FASTA file or contigs table
    Search(search::SearchArgs),

    /// Resolve a match/mismatch map into the longest qualifying segments
    ResolveMap(resolve::ResolveMapArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
