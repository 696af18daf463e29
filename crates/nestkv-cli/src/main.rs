//! NestKV query runner
//!
//! Reads one query per line from a script file (or stdin), runs each against
//! a single in-memory database and prints the outcome tag, followed by the
//! value for `get`.
//!
//! # Example
//!
//! ```bash
//! printf 'create_namespace(inventory)\ninsert(inventory, sku-1, Widget)\nget(inventory, sku-1)\n' \
//!   | nestkv --tier budget
//! OK
//! OK
//! OK Widget
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use nestkv_core::{Config, Database, QueryOutput, ResultKind, StoreResult};
use tracing::{debug, info};

/// Memory tier preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Tier {
    Server,
    Phone,
    Budget,
    Unbounded,
}

impl Tier {
    fn config(self) -> Config {
        match self {
            Tier::Server => Config::server(),
            Tier::Phone => Config::phone(),
            Tier::Budget => Config::budget(),
            Tier::Unbounded => Config::unbounded(),
        }
    }
}

/// Run nestkv queries, one per line
#[derive(Parser, Debug)]
#[command(name = "nestkv")]
#[command(about = "Run namespace key-value queries against an in-memory store")]
struct Args {
    /// Script with one query per line (defaults to stdin)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Memory tier preset
    #[arg(long, value_enum, default_value = "server", env = "NESTKV_TIER")]
    tier: Tier,

    /// Print store statistics and the content fingerprint after the last line
    #[arg(long)]
    stats: bool,

    /// Log store activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Format one query outcome the way it is printed.
fn render(result: &StoreResult<QueryOutput>) -> String {
    match result {
        Ok(QueryOutput::Value(value)) => format!("{} {}", ResultKind::Ok, value),
        Ok(QueryOutput::Done) => ResultKind::Ok.to_string(),
        Err(err) => err.kind().to_string(),
    }
}

/// Blank lines and `#` comments are not queries.
fn is_query(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#')
}

fn run<R: BufRead, W: Write>(db: &mut Database, input: R, mut out: W) -> Result<usize> {
    let mut executed = 0;
    for (lineno, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", lineno + 1))?;
        if !is_query(&line) {
            continue;
        }
        let result = db.execute_query(&line);
        if let Err(err) = &result {
            debug!(line = lineno + 1, error = %err, "query failed");
        }
        writeln!(out, "{}", render(&result)).context("failed to write result")?;
        executed += 1;
    }
    Ok(executed)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut db = Database::with_config(args.tier.config()).context("invalid tier configuration")?;

    let stdout = io::stdout();
    let out = stdout.lock();
    let executed = match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            run(&mut db, BufReader::new(file), out)?
        }
        None => run(&mut db, io::stdin().lock(), out)?,
    };
    info!(executed, "script finished");

    if args.stats {
        let stats = db.stats();
        println!(
            "namespaces={} sub_namespaces={} entries={} bytes={} fingerprint={:08x}",
            stats.namespaces,
            stats.sub_namespaces,
            stats.entries,
            stats.bytes_in_use,
            db.fingerprint()
        );
    }

    db.erase();
    Ok(())
}
