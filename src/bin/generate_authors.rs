//! Prints an SQL seed script with generated authors for the `author` table.

use author_streams::data_generator::{generate_authors, sql_insert_script};
use clap::Parser;
use std::io::Write;

#[derive(Debug, Parser)]
#[command(name = "generate-authors", about = "Print an SQL insert script with fake authors")]
struct Args {
    /// Number of authors to generate.
    #[arg(long, default_value_t = 100_000)]
    count: usize,

    /// Generator seed.
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let authors = generate_authors(args.count, args.seed);
    tracing::info!(count = authors.len(), seed = args.seed, "generated authors");

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(sql_insert_script(&authors).as_bytes())?;
    stdout.flush()
}
