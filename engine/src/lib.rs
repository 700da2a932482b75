//! Core of a small document search engine: tokenization, an inverted index
//! with weighted term frequencies, PageRank over the corpus link graph,
//! TF-IDF ranking blended with PageRank, and JSON snapshot persistence.
//!
//! The indexer binary builds a [`Snapshot`] from a corpus and saves it; the
//! searcher loads it and answers queries through [`query::search`].

pub mod index;
pub mod pagerank;
pub mod query;
pub mod score;
pub mod snapshot;
pub mod tokenizer;

pub use index::{DocId, DocLookup, Document, InvertedIndex, Posting, PostingList};
pub use pagerank::{LinkGraph, PageRankConfig, PageRankScores};
pub use query::{EmptyQueryError, SearchHit};
pub use snapshot::{LoadError, Snapshot};
