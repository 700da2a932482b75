use anyhow::{Context, Result};
use clap::Parser;
use engine::query::{self, SearchHit};
use engine::snapshot::{self, Snapshot};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;
use std::io::{self, BufRead, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "searcher")]
#[command(about = "Query a search snapshot from the command line", long_about = None)]
struct Args {
    /// Snapshot path as written by the indexer
    #[arg(long, default_value = "./index/snapshot.json")]
    index: String,
    /// Run one query and exit instead of prompting
    #[arg(long)]
    query: Option<String>,
    /// Print one-shot results as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Run every query in this file (one per line) and report timings
    #[arg(long)]
    queries: Option<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let snapshot = snapshot::load(&args.index)
        .with_context(|| format!("loading snapshot from {}", args.index))?;
    tracing::info!(
        total_documents = snapshot.total_documents,
        unique_words = snapshot.unique_words,
        "snapshot loaded"
    );

    if let Some(path) = args.queries {
        return run_batch(&path, &snapshot);
    }
    if let Some(q) = args.query {
        return run_one(&q, &snapshot, args.json);
    }
    run_interactive(&snapshot)
}

fn run_one(q: &str, snapshot: &Snapshot, json: bool) -> Result<()> {
    let hits = query::search(q, snapshot)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("no results");
        return Ok(());
    }
    print_hits(&hits);
    Ok(())
}

fn run_interactive(snapshot: &Snapshot) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "query> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line == "exit" {
            break;
        }
        match query::search(line, snapshot) {
            Ok(hits) if hits.is_empty() => println!("no results"),
            Ok(hits) => print_hits(&hits),
            Err(err) => println!("{err}"),
        }
    }
    Ok(())
}

/// One query per line, timed individually. Failed queries are reported
/// inline rather than aborting the run.
fn run_batch(path: &str, snapshot: &Snapshot) -> Result<()> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading query file {path}"))?;
    for q in raw.lines() {
        let q = q.trim();
        if q.is_empty() {
            continue;
        }
        let start = Instant::now();
        let outcome = query::search(q, snapshot);
        let elapsed = start.elapsed();
        match outcome {
            Ok(hits) => {
                println!("{q}: {} hits in {:.3}ms", hits.len(), elapsed.as_secs_f64() * 1000.0)
            }
            Err(err) => println!("{q}: {err}"),
        }
    }
    Ok(())
}

fn print_hits(hits: &[SearchHit]) {
    for (rank, hit) in hits.iter().enumerate() {
        println!("{}", format_hit(rank + 1, hit));
    }
}

fn format_hit(rank: usize, hit: &SearchHit) -> String {
    let summary = hit.summary.as_deref().unwrap_or("(no summary available)");
    format!(
        "{rank}. [doc {}] score {:.4}  {}\n   {}",
        hit.doc_id, hit.score, hit.url, summary
    )
}
