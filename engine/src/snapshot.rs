//! The persisted index snapshot: one JSON document holding the inverted
//! index, the doc_id -> URL lookup, PageRank scores and corpus counters.

use crate::index::{DocId, DocLookup, InvertedIndex};
use crate::pagerank::PageRankScores;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open snapshot at {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Covers corrupt JSON, missing required keys and posting columns of
    /// unequal length.
    #[error("snapshot is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("term {term:?} references doc_id {doc_id} absent from document_lookup")]
    DanglingDocId { term: String, doc_id: DocId },
}

/// Everything the searcher needs, as written by the indexer.
///
/// `index`, `document_lookup` and `total_documents` are required on load;
/// the remaining fields default when missing. `total_documents` is carried
/// explicitly rather than derived so IDF stays stable even if the lookup
/// is ever pruned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub total_files_read: u32,
    pub total_documents: u32,
    #[serde(default)]
    pub unique_words: u32,
    #[serde(default)]
    pub pagerank_scores: PageRankScores,
    pub index: InvertedIndex,
    pub document_lookup: DocLookup,
}

impl Snapshot {
    pub fn new(
        index: InvertedIndex,
        document_lookup: DocLookup,
        pagerank_scores: PageRankScores,
        total_files_read: u32,
    ) -> Self {
        let total_documents = document_lookup.len() as u32;
        let unique_words = index.unique_terms() as u32;
        Self {
            total_files_read,
            total_documents,
            unique_words,
            pagerank_scores,
            index,
            document_lookup,
        }
    }

    /// Every doc_id in every posting list must resolve in the lookup.
    fn validate(&self) -> Result<(), LoadError> {
        for (term, list) in self.index.iter() {
            for doc_id in list.doc_ids() {
                if !self.document_lookup.contains_key(&doc_id) {
                    return Err(LoadError::DanglingDocId { term: term.to_string(), doc_id });
                }
            }
        }
        Ok(())
    }
}

/// Write the snapshot as pretty-printed JSON, atomically.
///
/// The payload goes to a `.json.tmp` sibling first and is renamed into
/// place, so a crash mid-write never leaves a truncated snapshot behind.
pub fn save<P: AsRef<Path>>(snapshot: &Snapshot, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating snapshot directory {}", parent.display()))?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp)
            .with_context(|| format!("creating temporary snapshot {}", tmp.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, snapshot)
            .with_context(|| format!("serializing snapshot to {}", tmp.display()))?;
        writer.flush().context("flushing snapshot")?;
    }
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} into place", tmp.display()))?;
    Ok(())
}

/// Read a snapshot back and check its internal references.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Snapshot, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
    snapshot.validate()?;
    Ok(snapshot)
}
