use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use engine::index::{self, Document};
use engine::pagerank::{self, LinkGraph, PageRankConfig};
use engine::snapshot::{self, Snapshot};
use engine::tokenizer;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// One corpus record as produced by a crawl: the page URL, its raw HTML and
/// the outgoing links recorded for it.
#[derive(Debug, Deserialize)]
struct CorpusDoc {
    url: String,
    content: String,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a search snapshot from a corpus of HTML documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the snapshot from a directory of corpus records
    Build {
        /// Corpus directory of .json records ({url, content, links})
        #[arg(long)]
        input: String,
        /// Snapshot output path
        #[arg(long, default_value = "./index/snapshot.json")]
        output: String,
        /// PageRank power-iteration count
        #[arg(long, default_value_t = 20)]
        pagerank_iterations: u32,
        /// PageRank damping factor
        #[arg(long, default_value_t = 0.85)]
        damping: f64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, pagerank_iterations, damping } => {
            let config = PageRankConfig { iterations: pagerank_iterations, damping };
            build_snapshot(&input, &output, &config)
        }
    }
}

fn build_snapshot(input: &str, output: &str, config: &PageRankConfig) -> Result<()> {
    // Outside [0, 1] the damped update no longer moves probability mass.
    if !(0.0..=1.0).contains(&config.damping) {
        bail!("damping must lie in [0, 1], got {}", config.damping);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(p.to_path_buf());
        }
    }
    // Doc ids are positional, so a stable file order keeps rebuilds comparable.
    files.sort();

    let total_files_read = files.len() as u32;
    let extractor = Extractor::new();
    let mut documents: Vec<Document> = Vec::new();
    let mut graph = LinkGraph::new();
    let mut skipped_unparseable = 0u32;
    let mut skipped_empty = 0u32;

    for file in files {
        let record = match read_record(&file) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(file = %file.display(), error = %err, "skipping unparseable corpus file");
                skipped_unparseable += 1;
                continue;
            }
        };

        let (regular, important) = extractor.extract(&record.content);
        let regular_tokens = tokenizer::tokenize(&regular);
        let important_tokens = tokenizer::tokenize(&important);
        if regular_tokens.is_empty() && important_tokens.is_empty() {
            tracing::warn!(url = %record.url, "skipping document with no indexable text");
            skipped_empty += 1;
            continue;
        }

        graph.insert(record.url.clone(), record.links);
        documents.push(Document { url: record.url, regular_tokens, important_tokens });

        if documents.len() % 100 == 0 {
            tracing::info!(ingested = documents.len(), "ingestion progress");
        }
    }

    if documents.is_empty() {
        bail!("corpus at {input} produced no indexable documents");
    }
    tracing::info!(
        documents = documents.len(),
        skipped_unparseable,
        skipped_empty,
        "corpus ingested"
    );

    let (index, lookup) = index::build(documents);
    let scores = pagerank::compute(&graph, config);
    let snapshot = Snapshot::new(index, lookup, scores, total_files_read);

    tracing::info!(
        total_documents = snapshot.total_documents,
        unique_words = snapshot.unique_words,
        "snapshot assembled"
    );
    snapshot::save(&snapshot, output).with_context(|| format!("saving snapshot to {output}"))?;
    tracing::info!(output, "index build complete");
    Ok(())
}

fn read_record(path: &Path) -> Result<CorpusDoc> {
    let file = File::open(path)?;
    let record = serde_json::from_reader(BufReader::new(file))?;
    Ok(record)
}

/// Pulls plain text out of an HTML page: the body text, plus the text of
/// title/heading/emphasis elements that gets double weight at index time.
/// Heading text shows up in both, which is what gives it the extra weight
/// on top of its regular count.
struct Extractor {
    body: Selector,
    important: Selector,
}

impl Extractor {
    fn new() -> Self {
        Self {
            body: Selector::parse("body").unwrap(),
            important: Selector::parse("title, h1, h2, h3, b, strong").unwrap(),
        }
    }

    fn extract(&self, html: &str) -> (String, String) {
        let document = Html::parse_document(html);

        let regular = document
            .select(&self.body)
            .next()
            .map(|node| node.text().collect::<String>())
            .unwrap_or_default();

        let important = document
            .select(&self.important)
            .map(|node| node.text().collect::<String>())
            .collect::<Vec<String>>()
            .join(" ");

        (regular, important)
    }
}
