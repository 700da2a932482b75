//! Text normalization shared by the indexer and the query path. Both sides
//! must agree exactly, or query terms stop matching indexed ones.

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid token regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// NFKC-normalize, lowercase, split on non-alphanumerics and stem.
///
/// Duplicates are preserved; counting them is the index builder's job.
/// Stopwords are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text.nfkc().collect::<String>().to_lowercase();
    TOKEN_RE
        .find_iter(&normalized)
        .map(|token| STEMMER.stem(token.as_str()).into_owned())
        .collect()
}
