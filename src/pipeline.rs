use std::path::PathBuf;

use crate::{
    config::Config,
    corpus::{self, CorpusKind},
    embedding::SentenceEncoder,
    error::Result,
    keywords,
    matcher::Matcher,
    report::{Report, RunInfo},
};

/// What to match against what.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub search_set: CorpusKind,
    pub candidate_set: CorpusKind,
    pub prune_duplicates: bool,
    pub filter: bool,
}

/// Run one matching pass end to end and return the report path.
///
/// 1. Load both corpora (deduplicated unless disabled)
/// 2. Optionally drop search documents sharing no keyword with the
///    candidates
/// 3. Encode and rank neighbors
/// 4. Write the report
pub fn run_match<E: SentenceEncoder + ?Sized>(
    request: &MatchRequest,
    config: &Config,
    encoder: &mut E,
) -> Result<PathBuf> {
    let pair = corpus::load_pair(
        request.search_set,
        request.candidate_set,
        request.prune_duplicates,
        config,
    )?;

    let (search_docs, keyword_hits, kept) = if request.filter {
        tracing::info!(documents = pair.search.len(), "filtering search documents");
        let words = keywords::filtering_words(&pair.candidate, &config.filter);
        let filtered = keywords::filter_documents(
            pair.search,
            &words,
            config.filter.min_word_len,
        );
        (filtered.documents, filtered.keywords, Some(filtered.kept))
    } else {
        (pair.search, Vec::new(), None)
    };

    tracing::info!(
        search = search_docs.len(),
        candidates = pair.candidate.len(),
        "retrieving nearest"
    );
    let mut matcher = Matcher::new(encoder, config.num_matches);
    let matches = match kept {
        // A filtered shared corpus no longer lines up index for index, so
        // self-exclusion goes through the kept positions.
        Some(kept) if pair.same_corpus => {
            matcher.find_matches_within(&pair.candidate, &kept)?
        }
        _ => matcher.find_matches(
            &search_docs,
            &pair.candidate,
            pair.same_corpus,
        )?,
    };

    let info = RunInfo {
        model: config.model.clone(),
        search_set: request.search_set.name().to_string(),
        candidate_set: request.candidate_set.name().to_string(),
        languages: config.languages.clone(),
    };
    let report = Report {
        info: &info,
        search_docs: &search_docs,
        candidate_docs: &pair.candidate,
        matches: &matches,
        keywords: &keyword_hits,
    };
    report.write_file(&config.output_dir, chrono::Local::now())
}
