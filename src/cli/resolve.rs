use clap::Args;

use crate::cli::OutputFormat;
use crate::search::segmenter::{resolve, MatchProfile, Segment};
use crate::utils::validation::parse_count;

#[derive(Args)]
pub struct ResolveMapArgs {
    /// Match map: `o` for a match, `x` for a mismatch, `-` for a gap
    #[arg(required = true)]
    pub map: String,

    /// Segments must be longer than this
    #[arg(short = 'l', long, default_value_t = 15, value_parser = parse_count)]
    pub min_palindrome_length: usize,

    /// Maximum mismatches inside a segment
    #[arg(short = 'm', long, default_value_t = 3, value_parser = parse_count)]
    pub max_num_mismatches: usize,
}

/// Execute resolve-map subcommand
///
/// # Errors
///
/// Returns an error if the map holds symbols other than `o`, `x` and `-`.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ResolveMapArgs, format: OutputFormat) -> anyhow::Result<()> {
    let profile = MatchProfile::parse(args.map.trim())?;
    let segments = resolve(&profile, args.min_palindrome_length, args.max_num_mismatches);

    match format {
        OutputFormat::Text => print_text(&profile, &segments),
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = segments
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "start": s.start,
                        "end": s.end,
                        "length": s.len(),
                        "num_mismatches": profile.mismatches_in(s.start, s.end),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Tsv => {
            println!("start\tend\tlength\tnum_mismatches");
            for s in &segments {
                println!(
                    "{}\t{}\t{}\t{}",
                    s.start,
                    s.end,
                    s.len(),
                    profile.mismatches_in(s.start, s.end)
                );
            }
        }
    }

    Ok(())
}

/// The map with the resolved segments drawn underneath
fn print_text(profile: &MatchProfile, segments: &[Segment]) {
    let mut track = vec![b' '; profile.len()];
    for s in segments {
        for c in &mut track[s.start..s.end] {
            *c = b'=';
        }
    }

    println!("{profile}");
    println!("{}", String::from_utf8_lossy(&track).trim_end());
    if segments.is_empty() {
        println!("No segments qualify.");
    }
    for s in segments {
        println!(
            "[{}, {}) length {}, {} mismatch(es)",
            s.start,
            s.end,
            s.len(),
            profile.mismatches_in(s.start, s.end)
        );
    }
}
