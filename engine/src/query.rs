//! Query preprocessing, boolean candidate retrieval and ranked search.

use crate::index::{DocId, InvertedIndex};
use crate::score;
use crate::snapshot::Snapshot;
use crate::tokenizer;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use thiserror::Error;

/// Soft cap on the boolean candidate set; bounds work, not top-K quality.
pub const DEFAULT_MAX_CANDIDATES: usize = 100;

/// Number of hits returned per query.
pub const TOP_RESULTS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("query contains no indexable terms")]
pub struct EmptyQueryError;

/// One ranked search result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub url: String,
    pub summary: Option<String>,
}

/// Tokenize a query and drop repeated terms, keeping first-occurrence order.
pub fn preprocess(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenizer::tokenize(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Boolean AND retrieval over the posting lists.
///
/// Intersects smallest-list-first; after each intersection the loop stops
/// early once the running set is empty or holds `max_candidates` documents,
/// and the result is truncated to the cap. When the cap fires before the
/// last list the survivors are not checked against the remaining lists, and
/// which documents survive truncation is arbitrary with respect to score.
/// Any term absent from the index vetoes the whole conjunction.
pub fn candidates(
    query_terms: &[String],
    index: &InvertedIndex,
    max_candidates: usize,
) -> HashSet<DocId> {
    if query_terms.is_empty() {
        return HashSet::new();
    }

    let mut term_sets: Vec<HashSet<DocId>> = Vec::with_capacity(query_terms.len());
    for term in query_terms {
        match index.postings(term) {
            Some(list) => term_sets.push(list.doc_ids().collect()),
            // One unindexed term vetoes the whole conjunction.
            None => return HashSet::new(),
        }
    }
    term_sets.sort_by_key(|set| set.len());

    let mut sets = term_sets.into_iter();
    let mut matched = sets.next().unwrap_or_default();
    for set in sets {
        matched.retain(|doc_id| set.contains(doc_id));
        if matched.is_empty() || matched.len() >= max_candidates {
            break;
        }
    }

    if matched.len() > max_candidates {
        matched.into_iter().take(max_candidates).collect()
    } else {
        matched
    }
}

/// Run one query against a loaded snapshot and return the top hits.
///
/// Hits are ordered by combined score descending, ties broken by ascending
/// doc_id, and capped at [`TOP_RESULTS`]. A query that tokenizes to nothing
/// is an error; a query whose terms match no documents returns an empty list.
pub fn search(query: &str, snapshot: &Snapshot) -> Result<Vec<SearchHit>, EmptyQueryError> {
    let query_terms = preprocess(query);
    if query_terms.is_empty() {
        return Err(EmptyQueryError);
    }

    let matched = candidates(&query_terms, &snapshot.index, DEFAULT_MAX_CANDIDATES);
    if matched.is_empty() {
        return Ok(Vec::new());
    }

    let mut scored = score::combined_scores(&matched, &query_terms, snapshot);
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored.truncate(TOP_RESULTS);

    let mut hits = Vec::with_capacity(scored.len());
    for (doc_id, score) in scored {
        if let Some(url) = snapshot.document_lookup.get(&doc_id) {
            hits.push(SearchHit {
                doc_id,
                score,
                url: url.clone(),
                // Summaries come from an external collaborator; none is wired in.
                summary: None,
            });
        }
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{self, Document};
    use crate::pagerank::PageRankScores;

    fn doc(url: &str, regular: &[&str]) -> Document {
        Document {
            url: url.to_string(),
            regular_tokens: regular.iter().map(|s| s.to_string()).collect(),
            important_tokens: Vec::new(),
        }
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    fn snapshot_of(documents: Vec<Document>) -> Snapshot {
        let total = documents.len() as u32;
        let (index, lookup) = index::build(documents);
        Snapshot::new(index, lookup, PageRankScores::new(), total)
    }

    #[test]
    fn conjunction_keeps_only_docs_with_every_term() {
        let (index, _) = index::build(vec![
            doc("0", &["cat"]),
            doc("1", &["dog"]),
            doc("2", &["cat", "dog"]),
            doc("3", &["cat", "dog", "fish"]),
            doc("4", &["fish"]),
        ]);
        let matched = candidates(&terms(&["cat", "dog"]), &index, DEFAULT_MAX_CANDIDATES);
        let expected: HashSet<DocId> = [2, 3].into_iter().collect();
        assert_eq!(matched, expected);
    }

    #[test]
    fn no_terms_means_no_candidates() {
        let (index, _) = index::build(vec![doc("0", &["cat"])]);
        assert!(candidates(&[], &index, DEFAULT_MAX_CANDIDATES).is_empty());
    }

    #[test]
    fn unindexed_term_vetoes_the_conjunction() {
        let (index, _) = index::build(vec![doc("0", &["cat"])]);
        let matched = candidates(&terms(&["cat", "zebra"]), &index, DEFAULT_MAX_CANDIDATES);
        assert!(matched.is_empty());
    }

    #[test]
    fn candidate_set_is_capped() {
        let documents: Vec<Document> =
            (0..150).map(|i| doc(&format!("doc-{i}"), &["common"])).collect();
        let (index, _) = index::build(documents);
        let matched = candidates(&terms(&["common"]), &index, DEFAULT_MAX_CANDIDATES);
        assert_eq!(matched.len(), DEFAULT_MAX_CANDIDATES);
    }

    #[test]
    fn disjoint_terms_intersect_to_nothing_even_past_the_cap() {
        // Each term clears the cap on its own; no document holds both, so the
        // conjunction is empty rather than a capped slice of the first list.
        let documents: Vec<Document> = (0..240)
            .map(|i| {
                let term = if i < 120 { "cat" } else { "dog" };
                doc(&format!("doc-{i}"), &[term])
            })
            .collect();
        let snapshot = snapshot_of(documents);

        let matched = candidates(
            &terms(&["cat", "dog"]),
            &snapshot.index,
            DEFAULT_MAX_CANDIDATES,
        );
        assert!(matched.is_empty());
        assert_eq!(search("cat dog", &snapshot), Ok(Vec::new()));
    }

    #[test]
    fn cap_fire_skips_the_remaining_lists() {
        // cat: 0-149, dog: 0-159, fish: 140-379. The cat/dog intersection
        // holds 150 docs and trips the cap, so the fish list is never
        // intersected even though only ten docs carry all three terms.
        let documents: Vec<Document> = (0..380)
            .map(|i| {
                let mut tokens: Vec<&str> = Vec::new();
                if i < 150 {
                    tokens.push("cat");
                }
                if i < 160 {
                    tokens.push("dog");
                }
                if i >= 140 {
                    tokens.push("fish");
                }
                doc(&format!("doc-{i}"), &tokens)
            })
            .collect();
        let (index, _) = index::build(documents);

        let matched = candidates(&terms(&["cat", "dog", "fish"]), &index, DEFAULT_MAX_CANDIDATES);
        assert_eq!(matched.len(), DEFAULT_MAX_CANDIDATES);
        for doc_id in &matched {
            assert!(*doc_id < 150, "doc {doc_id} lacks cat or dog");
        }
    }

    #[test]
    fn preprocess_deduplicates_in_first_occurrence_order() {
        assert_eq!(preprocess("cat cat dog cat"), terms(&["cat", "dog"]));
    }

    #[test]
    fn blank_query_is_an_error() {
        let snapshot = snapshot_of(vec![doc("a", &["cat"])]);
        assert_eq!(search("", &snapshot), Err(EmptyQueryError));
        assert_eq!(search("!!! ...", &snapshot), Err(EmptyQueryError));
    }

    #[test]
    fn unmatched_query_returns_empty_hits() {
        let snapshot = snapshot_of(vec![doc("a", &["cat"])]);
        assert_eq!(search("zebra", &snapshot), Ok(Vec::new()));
    }

    #[test]
    fn results_are_ranked_and_capped_at_five() {
        // Seven identical docs tie on score, so doc_id breaks the tie.
        let documents: Vec<Document> =
            (0..7).map(|i| doc(&format!("doc-{i}"), &["cat"])).collect();
        let snapshot = snapshot_of(documents);
        let hits = search("cat", &snapshot).unwrap();
        assert_eq!(hits.len(), TOP_RESULTS);
        let ids: Vec<DocId> = hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn higher_scores_come_first() {
        let snapshot = snapshot_of(vec![
            doc("heavy", &["cat", "cat", "cat"]),
            doc("light", &["cat", "dog", "dog", "dog", "dog", "dog"]),
        ]);
        let hits = search("cat", &snapshot).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "heavy");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn query_goes_through_the_tokenizer() {
        // Uppercase and inflection in the query still match the stemmed index.
        let snapshot = snapshot_of(vec![doc("a", &["run"])]);
        let hits = search("Running", &snapshot).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "a");
    }
}
