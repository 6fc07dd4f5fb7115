use clap::Parser;
use tracing_subscriber::EnvFilter;

use palindrome_search::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("palindrome_search=debug,info")
    } else {
        EnvFilter::new("palindrome_search=info")
    };

    // stdout carries the palindrome table
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Search(args) => {
            cli::search::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::ResolveMap(args) => {
            cli::resolve::run(args, cli.format)?;
        }
    }

    Ok(())
}
