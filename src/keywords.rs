//! Keyword prefilter for the search corpus.
//!
//! A vocabulary of salient words is drawn from the candidate corpus by
//! document frequency. Search documents that mention none of those words
//! are dropped before matching; the rest carry the words they matched.
//! This is a cheap recall-narrowing heuristic, not a relevance model.

use std::collections::{BTreeSet, HashMap, HashSet};

/// Common English words that never make useful keywords.
const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "also", "because", "been",
    "before", "being", "below", "between", "both", "but", "can't", "cannot",
    "could", "didn't", "does", "doesn't", "doing", "don't", "down", "during",
    "each", "even", "every", "from", "further", "have", "haven't", "having",
    "here", "into", "it's", "just", "like", "made", "make", "many", "more",
    "most", "much", "must", "only", "other", "over", "said", "same", "says",
    "should", "since", "some", "such", "than", "that", "that's", "their",
    "them", "then", "there", "these", "they", "this", "those", "through",
    "under", "until", "very", "want", "were", "what", "when", "where",
    "which", "while", "will", "with", "would", "your", "you're", "yours",
    "http", "https", "amp",
];

/// Tuning for keyword selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    /// Shortest token considered a word.
    pub min_word_len: usize,
    /// A keyword must occur in at least this many candidate documents.
    pub min_doc_freq: usize,
    /// A keyword may occur in at most this fraction of candidate documents.
    pub max_doc_ratio: f32,
    /// Upper bound on vocabulary size.
    pub max_keywords: usize,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            min_word_len: 4,
            min_doc_freq: 2,
            max_doc_ratio: 0.5,
            max_keywords: 200,
        }
    }
}

/// Search documents that survived filtering, with their keyword hits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredDocuments {
    pub documents: Vec<String>,
    /// Sorted keywords per kept document, parallel to `documents`.
    pub keywords: Vec<Vec<String>>,
    /// Position of each kept document in the unfiltered input.
    pub kept: Vec<usize>,
}

/// Split text into lowercase word tokens.
///
/// Tokens are runs of alphanumeric characters, with apostrophes allowed
/// between letters. Tokens shorter than `min_len` characters, stopwords,
/// and pure numbers are dropped.
pub fn tokenize(text: &str, min_len: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| t.chars().count() >= min_len)
        .filter(|t| !t.chars().all(|c| c.is_numeric() || c == '\''))
        .filter(|t| !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Derive the keyword vocabulary from the candidate corpus.
///
/// Words are ranked by the number of candidate documents containing them;
/// ties are broken alphabetically.
pub fn filtering_words(
    candidate_docs: &[String],
    params: &FilterParams,
) -> BTreeSet<String> {
    if candidate_docs.is_empty() {
        return BTreeSet::new();
    }

    let mut doc_freq: HashMap<String, usize> = HashMap::new();
    for doc in candidate_docs {
        let unique: HashSet<String> =
            tokenize(doc, params.min_word_len).into_iter().collect();
        for word in unique {
            *doc_freq.entry(word).or_default() += 1;
        }
    }

    let total = candidate_docs.len() as f32;
    let mut ranked: Vec<(String, usize)> = doc_freq
        .into_iter()
        .filter(|&(_, df)| df >= params.min_doc_freq)
        .filter(|&(_, df)| df as f32 / total <= params.max_doc_ratio)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(params.max_keywords);

    tracing::debug!(keywords = ranked.len(), "derived filtering vocabulary");
    ranked.into_iter().map(|(word, _)| word).collect()
}

/// Keep only the documents that contain at least one of `words`.
///
/// Matching is by token, using the same tokenizer as vocabulary
/// extraction; order of the kept documents is preserved.
pub fn filter_documents(
    docs: Vec<String>,
    words: &BTreeSet<String>,
    min_word_len: usize,
) -> FilteredDocuments {
    let mut filtered = FilteredDocuments::default();
    for (index, doc) in docs.into_iter().enumerate() {
        let hits: BTreeSet<String> = tokenize(&doc, min_word_len)
            .into_iter()
            .filter(|t| words.contains(t))
            .collect();
        if !hits.is_empty() {
            filtered.documents.push(doc);
            filtered.keywords.push(hits.into_iter().collect());
            filtered.kept.push(index);
        }
    }
    filtered
}
