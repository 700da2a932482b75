//! TF-IDF scoring and the blend with PageRank.

use crate::index::{DocId, InvertedIndex};
use crate::snapshot::Snapshot;
use std::collections::HashSet;

/// TF-IDF of one document against the query terms.
///
/// tf uses the weighted frequency over `doc_length + 1`; the +1 also covers
/// documents with no recorded terms. idf is `ln((N + 1) / (df + 1)) + 1`,
/// never negative for df <= N. Terms missing from the index or from this
/// document contribute nothing.
pub fn tf_idf(doc_id: DocId, query_terms: &[String], index: &InvertedIndex, total_docs: u32) -> f64 {
    let doc_length = index.doc_length(doc_id) as f64;
    let mut score = 0.0;
    for term in query_terms {
        if let Some(postings) = index.postings(term) {
            if let Some(frequency) = postings.frequency_of(doc_id) {
                let tf = frequency as f64 / (doc_length + 1.0);
                let df = postings.len() as f64;
                let idf = ((total_docs as f64 + 1.0) / (df + 1.0)).ln() + 1.0;
                score += tf * idf;
            }
        }
    }
    score
}

/// Score every candidate: TF-IDF plus a normalized PageRank contribution.
///
/// The PageRank term is scaled by `max_tf_idf / max_pagerank`, both taken
/// over this result set and the full score map respectively, so the two
/// signals land on comparable magnitudes. With no PageRank data (or all
/// zeros) the result is pure TF-IDF. Output order is unspecified.
pub fn combined_scores(
    candidates: &HashSet<DocId>,
    query_terms: &[String],
    snapshot: &Snapshot,
) -> Vec<(DocId, f64)> {
    let mut scored: Vec<(DocId, f64)> = candidates
        .iter()
        .map(|&doc_id| {
            (doc_id, tf_idf(doc_id, query_terms, &snapshot.index, snapshot.total_documents))
        })
        .collect();

    let max_tf_idf = scored.iter().fold(0.0_f64, |acc, &(_, s)| acc.max(s));
    let max_pagerank = snapshot
        .pagerank_scores
        .values()
        .fold(0.0_f64, |acc, &s| acc.max(s));

    if max_pagerank > 0.0 {
        let scale = max_tf_idf / max_pagerank;
        for (doc_id, score) in &mut scored {
            if let Some(url) = snapshot.document_lookup.get(doc_id) {
                if let Some(&pagerank) = snapshot.pagerank_scores.get(url) {
                    if pagerank > 0.0 {
                        *score += pagerank * scale;
                    }
                }
            }
        }
    }

    scored
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

    #[test]
    fn rarer_terms_score_higher_at_equal_tf() {
        // "rare" appears in one of four docs, "common" in all four.
        let (index, _) = index::build(vec![
            doc("a", &["rare", "common"]),
            doc("b", &["common"]),
            doc("c", &["common"]),
            doc("d", &["common"]),
        ]);
        let rare = tf_idf(0, &terms(&["rare"]), &index, 4);
        let common = tf_idf(0, &terms(&["common"]), &index, 4);
        assert!(rare > common);
    }

    #[test]
    fn tf_idf_matches_closed_form() {
        let (index, _) = index::build(vec![doc("a", &["cat", "cat", "dog"]), doc("b", &["dog"])]);
        // doc 0: freq(cat)=2, doc_length=3, df(cat)=1, N=2
        let expected = (2.0 / 4.0) * ((3.0_f64 / 2.0).ln() + 1.0);
        let got = tf_idf(0, &terms(&["cat"]), &index, 2);
        assert!((got - expected).abs() < 1e-9);
    }

    #[test]
    fn absent_terms_contribute_nothing() {
        let (index, _) = index::build(vec![doc("a", &["cat"])]);
        assert_eq!(tf_idf(0, &terms(&["dog"]), &index, 1), 0.0);
        assert_eq!(tf_idf(0, &[], &index, 1), 0.0);
    }

    #[test]
    fn empty_pagerank_map_leaves_tf_idf_untouched() {
        let (index, lookup) = index::build(vec![doc("a", &["cat"]), doc("b", &["cat"])]);
        let snapshot = Snapshot::new(index, lookup, PageRankScores::new(), 2);
        let candidates: HashSet<DocId> = [0, 1].into_iter().collect();
        let query = terms(&["cat"]);
        for (doc_id, score) in combined_scores(&candidates, &query, &snapshot) {
            let plain = tf_idf(doc_id, &query, &snapshot.index, snapshot.total_documents);
            assert!((score - plain).abs() < 1e-12);
        }
    }

    #[test]
    fn all_zero_pagerank_map_leaves_tf_idf_untouched() {
        let (index, lookup) = index::build(vec![doc("a", &["cat"])]);
        let mut pagerank = PageRankScores::new();
        pagerank.insert("a".to_string(), 0.0);
        let snapshot = Snapshot::new(index, lookup, pagerank, 1);
        let candidates: HashSet<DocId> = [0].into_iter().collect();
        let query = terms(&["cat"]);
        let scored = combined_scores(&candidates, &query, &snapshot);
        let plain = tf_idf(0, &query, &snapshot.index, 1);
        assert!((scored[0].1 - plain).abs() < 1e-12);
    }

    #[test]
    fn pagerank_contribution_is_scaled_to_tf_idf_range() {
        let (index, lookup) = index::build(vec![doc("a", &["cat"])]);
        let mut pagerank = PageRankScores::new();
        pagerank.insert("a".to_string(), 0.25);
        pagerank.insert("b".to_string(), 0.75);
        let snapshot = Snapshot::new(index, lookup, pagerank, 1);
        let candidates: HashSet<DocId> = [0].into_iter().collect();
        let query = terms(&["cat"]);

        let plain = tf_idf(0, &query, &snapshot.index, 1);
        let scored = combined_scores(&candidates, &query, &snapshot);
        // scale = plain / 0.75, contribution = 0.25 * scale
        let expected = plain + 0.25 * (plain / 0.75);
        assert!((scored[0].1 - expected).abs() < 1e-12);
    }
}
