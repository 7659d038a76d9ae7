use std::fmt;

use crate::{
    config::Config,
    error::{Error, Result},
    loaders,
};

/// The named document collections a run can search or match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum CorpusKind {
    /// Google Fact Check claims, one directory per language
    #[value(name = "google")]
    Google,
    /// NewsGuard descriptions
    #[value(name = "ng")]
    NewsGuard,
    /// Miscellaneous JSON claim dumps
    #[value(name = "misc_json")]
    MiscJson,
    /// Tweets stored locally as JSON Lines
    #[value(name = "local_tweets")]
    LocalTweets,
    /// Sentences listed in the config file (search set only)
    #[value(name = "manual")]
    Manual,
}

type Loader = fn(&Config) -> Result<Vec<String>>;

const LOADERS: [(CorpusKind, Loader); 5] = [
    (CorpusKind::Google, loaders::load_google_claims),
    (CorpusKind::NewsGuard, loaders::load_newsguard),
    (CorpusKind::MiscJson, loaders::load_misc_json),
    (CorpusKind::LocalTweets, loaders::load_local_tweets),
    (CorpusKind::Manual, loaders::load_manual),
];

impl CorpusKind {
    /// The name used on the command line and in report file names.
    pub fn name(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::NewsGuard => "ng",
            Self::MiscJson => "misc_json",
            Self::LocalTweets => "local_tweets",
            Self::Manual => "manual",
        }
    }

    pub fn can_be_candidate(self) -> bool {
        self != Self::Manual
    }

    fn loader(self) -> Loader {
        LOADERS
            .iter()
            .find_map(|&(kind, loader)| (kind == self).then_some(loader))
            .unwrap_or(loaders::load_manual)
    }

    /// Read every document of this corpus.
    pub fn load(self, config: &Config) -> Result<Vec<String>> {
        let docs = (self.loader())(config)?;
        tracing::info!(corpus = self.name(), documents = docs.len(), "loaded corpus");
        Ok(docs)
    }
}

impl fmt::Display for CorpusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The search and candidate corpora for one run.
#[derive(Debug, Clone)]
pub struct CorpusPair {
    pub search: Vec<String>,
    pub candidate: Vec<String>,
    /// Both roles draw from the same corpus.
    pub same_corpus: bool,
}

/// Load the corpora for a run, reading a shared corpus only once.
///
/// When `prune_duplicates` is set, repeated documents are removed from each
/// corpus, keeping first occurrences.
pub fn load_pair(
    search: CorpusKind,
    candidate: CorpusKind,
    prune_duplicates: bool,
    config: &Config,
) -> Result<CorpusPair> {
    if !candidate.can_be_candidate() {
        return Err(Error::InvalidCorpus(candidate.name()));
    }

    let same_corpus = search == candidate;
    let mut candidate_docs = candidate.load(config)?;
    let mut search_docs = if same_corpus {
        candidate_docs.clone()
    } else {
        search.load(config)?
    };

    if prune_duplicates {
        tracing::info!(
            documents = candidate_docs.len(),
            "pruning duplicate candidate documents"
        );
        candidate_docs = crate::text_util::dedup_preserving_order(candidate_docs);
        tracing::info!(
            documents = search_docs.len(),
            "pruning duplicate search documents"
        );
        search_docs = crate::text_util::dedup_preserving_order(search_docs);
    }

    Ok(CorpusPair {
        search: search_docs,
        candidate: candidate_docs,
        same_corpus,
    })
}
