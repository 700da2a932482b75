use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

pub type DocId = u32;

/// doc_id -> URL, built alongside the inverted index. Every doc_id referenced
/// by a posting list resolves here.
pub type DocLookup = HashMap<DocId, String>;

/// One tokenized input document. Tokens arrive already normalized and
/// stemmed; duplicates are allowed and counted.
#[derive(Debug, Clone)]
pub struct Document {
    pub url: String,
    pub regular_tokens: Vec<String>,
    pub important_tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    /// Weighted occurrence count: regular tokens count 1, important tokens 2.
    pub frequency: u32,
}

/// Per-term postings, one entry per document containing the term.
///
/// Kept in memory as (doc_id, frequency) pairs; the serialized form is the
/// snapshot's parallel-array record `{"documents": [...], "frequency": [...]}`.
/// Entries are in append order, consumers must not assume sorting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingList(Vec<Posting>);

impl PostingList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Posting> {
        self.0.iter()
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.0.iter().map(|p| p.doc_id)
    }

    pub fn frequency_of(&self, doc_id: DocId) -> Option<u32> {
        self.0.iter().find(|p| p.doc_id == doc_id).map(|p| p.frequency)
    }

    fn push(&mut self, posting: Posting) {
        self.0.push(posting)
    }
}

#[derive(Serialize, Deserialize)]
struct PostingColumns {
    documents: Vec<DocId>,
    frequency: Vec<u32>,
}

impl Serialize for PostingList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PostingColumns {
            documents: self.0.iter().map(|p| p.doc_id).collect(),
            frequency: self.0.iter().map(|p| p.frequency).collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PostingList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let columns = PostingColumns::deserialize(deserializer)?;
        if columns.documents.len() != columns.frequency.len() {
            return Err(D::Error::custom(format!(
                "posting list columns out of step: {} documents, {} frequencies",
                columns.documents.len(),
                columns.frequency.len()
            )));
        }
        let postings = columns
            .documents
            .into_iter()
            .zip(columns.frequency)
            .map(|(doc_id, frequency)| Posting { doc_id, frequency })
            .collect();
        Ok(PostingList(postings))
    }
}

/// Term -> posting list, plus a derived per-document length table (the sum of
/// recorded frequencies per doc_id, used by the scorer as `doc_length`).
///
/// The length table is rebuilt from postings on deserialize and never written
/// to disk; the serialized form is exactly the term -> columns map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    postings: HashMap<String, PostingList>,
    doc_lengths: HashMap<DocId, u32>,
}

impl InvertedIndex {
    fn from_postings(postings: HashMap<String, PostingList>) -> Self {
        let mut doc_lengths: HashMap<DocId, u32> = HashMap::new();
        for list in postings.values() {
            for posting in list.iter() {
                *doc_lengths.entry(posting.doc_id).or_insert(0) += posting.frequency;
            }
        }
        Self { postings, doc_lengths }
    }

    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.postings.get(term)
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    /// Number of distinct indexed terms.
    pub fn unique_terms(&self) -> usize {
        self.postings.len()
    }

    /// Sum of all frequencies recorded for this document; 0 when none are.
    pub fn doc_length(&self, doc_id: DocId) -> u32 {
        self.doc_lengths.get(&doc_id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PostingList)> {
        self.postings.iter().map(|(term, list)| (term.as_str(), list))
    }
}

impl Serialize for InvertedIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.postings.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InvertedIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let postings = HashMap::<String, PostingList>::deserialize(deserializer)?;
        Ok(InvertedIndex::from_postings(postings))
    }
}

/// Build the inverted index and document lookup for one batch of documents.
///
/// Doc ids are assigned by position in the batch (0-based, contiguous) and are
/// stable only within this build. Regular tokens count 1 each, important
/// tokens 2; a term appearing in both gets the sum. An empty batch yields
/// empty outputs; whether that is fatal is the caller's decision.
pub fn build(documents: Vec<Document>) -> (InvertedIndex, DocLookup) {
    let mut postings: HashMap<String, PostingList> = HashMap::new();
    let mut lookup = DocLookup::new();

    for (position, document) in documents.into_iter().enumerate() {
        let doc_id = position as DocId;
        let Document { url, regular_tokens, important_tokens } = document;
        lookup.insert(doc_id, url);

        let mut term_frequencies: HashMap<String, u32> = HashMap::new();
        for token in regular_tokens {
            *term_frequencies.entry(token).or_insert(0) += 1;
        }
        for token in important_tokens {
            *term_frequencies.entry(token).or_insert(0) += 2;
        }

        // Each document is visited exactly once, so plain appends keep doc_ids
        // unique within every posting list.
        for (term, frequency) in term_frequencies {
            postings.entry(term).or_default().push(Posting { doc_id, frequency });
        }
    }

    let index = InvertedIndex::from_postings(postings);
    tracing::debug!(
        documents = lookup.len(),
        unique_terms = index.unique_terms(),
        "inverted index built"
    );
    (index, lookup)
}
