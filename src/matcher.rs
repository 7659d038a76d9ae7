//! Nearest-neighbor matching between a search corpus and a candidate corpus.
//!
//! Every search document is compared against every candidate by cosine
//! distance over sentence embeddings. No index is built; each run is a
//! brute-force scan.

use rayon::prelude::*;

use crate::{
    distance::cosine_distance,
    embedding::{self, Embedding, SentenceEncoder},
    error::Result,
};

/// One candidate selected for a search document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the candidate within the candidate corpus.
    pub index: usize,
    pub distance: f32,
}

/// The nearest candidates for one search document, nearest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub neighbors: Vec<Neighbor>,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.neighbors.iter().map(|n| n.index)
    }

    pub fn distances(&self) -> Vec<f32> {
        self.neighbors.iter().map(|n| n.distance).collect()
    }
}

/// Encodes both corpora with a single encoder and ranks neighbors.
pub struct Matcher<'a, E: SentenceEncoder + ?Sized> {
    encoder: &'a mut E,
    num_matches: usize,
}

impl<'a, E: SentenceEncoder + ?Sized> Matcher<'a, E> {
    pub fn new(encoder: &'a mut E, num_matches: usize) -> Self {
        Self {
            encoder,
            num_matches,
        }
    }

    /// Find the `num_matches` nearest candidates for every search document.
    ///
    /// With `same_corpus` set, `candidate_docs` is ignored: the search corpus
    /// is encoded once, serves both roles, and each document is excluded
    /// from its own result.
    ///
    /// Returns one result per search document, in search order.
    pub fn find_matches(
        &mut self,
        search_docs: &[String],
        candidate_docs: &[String],
        same_corpus: bool,
    ) -> Result<Vec<MatchResult>> {
        if search_docs.is_empty() {
            return Ok(Vec::new());
        }

        let sets = embedding::encode_sets(
            &mut *self.encoder,
            search_docs,
            candidate_docs,
            same_corpus,
        )?;

        tracing::info!(
            search = sets.search.len(),
            candidates = sets.candidates().len(),
            num_matches = self.num_matches,
            "ranking candidates"
        );
        Ok(rank_all(
            &sets.search,
            sets.candidates(),
            same_corpus,
            self.num_matches,
        ))
    }

    /// Match a subset of a corpus against the whole corpus.
    ///
    /// `queries` holds positions in `corpus`; each query is excluded from its
    /// own result. The corpus is encoded once. Returns one result per entry
    /// of `queries`, in that order.
    pub fn find_matches_within(
        &mut self,
        corpus: &[String],
        queries: &[usize],
    ) -> Result<Vec<MatchResult>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let sets =
            embedding::encode_sets(&mut *self.encoder, corpus, &[], true)?;
        let candidates = sets.candidates();
        let num_matches = self.num_matches;

        Ok(queries
            .par_iter()
            .filter_map(|&i| candidates.get(i).map(|query| (i, query)))
            .map(|(i, query)| top_matches(query, candidates, Some(i), num_matches))
            .collect())
    }
}

/// Rank candidates for every search embedding.
///
/// Queries are independent, so they are ranked in parallel; the output
/// order matches `search`.
pub fn rank_all(
    search: &[Embedding],
    candidates: &[Embedding],
    same_corpus: bool,
    num_matches: usize,
) -> Vec<MatchResult> {
    search
        .par_iter()
        .enumerate()
        .map(|(i, query)| {
            let exclude = same_corpus.then_some(i);
            top_matches(query, candidates, exclude, num_matches)
        })
        .collect()
}

/// Return the `num_matches` candidates nearest to `query`.
///
/// Candidates are ordered by ascending distance with ties broken by
/// candidate index. The candidate at `exclude`, if any, is never returned.
pub fn top_matches(
    query: &[f32],
    candidates: &[Embedding],
    exclude: Option<usize>,
    num_matches: usize,
) -> MatchResult {
    if num_matches == 0 || candidates.is_empty() {
        return MatchResult::default();
    }

    let mut scored: Vec<Neighbor> = candidates
        .iter()
        .enumerate()
        .filter(|&(index, _)| Some(index) != exclude)
        .map(|(index, candidate)| Neighbor {
            index,
            distance: cosine_distance(query, candidate),
        })
        .collect();

    // Stable sort keeps index order among equal distances.
    scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    scored.truncate(num_matches);

    MatchResult { neighbors: scored }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(angle_deg: f32) -> Embedding {
        let r = angle_deg.to_radians();
        vec![r.cos(), r.sin()]
    }

    #[test]
    fn ranks_ascending_by_distance() {
        let candidates = vec![unit(90.0), unit(10.0), unit(45.0)];
        let result = top_matches(&unit(0.0), &candidates, None, 3);

        assert_eq!(result.indices().collect::<Vec<_>>(), vec![1, 2, 0]);
        for pair in result.neighbors.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn ties_break_by_candidate_index() {
        let candidates = vec![
            vec![0.8, 0.6],
            vec![0.8, -0.6],
            vec![0.8, 0.6],
            vec![1.0, 0.0],
        ];
        let result = top_matches(&[1.0, 0.0], &candidates, None, 4);

        assert_eq!(result.neighbors[0].index, 3);
        // candidates 0 and 2 are identical; 1 mirrors them across the query.
        let tied: Vec<usize> = result.indices().skip(1).collect();
        assert_eq!(tied, vec![0, 1, 2]);
    }

    #[test]
    fn excluded_index_is_never_returned() {
        let candidates = vec![unit(0.0), unit(5.0), unit(0.0)];
        let result = top_matches(&unit(0.0), &candidates, Some(0), 5);

        assert_eq!(result.indices().collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(result.neighbors[0].distance, 0.0);
    }

    #[test]
    fn zero_matches_requested() {
        let result = top_matches(&unit(0.0), &[unit(0.0)], None, 0);
        assert!(result.is_empty());
    }

    #[test]
    fn empty_candidates_give_empty_results() {
        let results = rank_all(&[unit(0.0), unit(1.0)], &[], false, 3);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(MatchResult::is_empty));
    }

    /// Embeds a text as the angle given by its first word, in degrees.
    struct AngleEncoder;

    impl SentenceEncoder for AngleEncoder {
        fn model_id(&self) -> &str {
            "angle"
        }

        fn encode(&mut self, texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let deg = t.split(' ').next().unwrap().parse().unwrap();
                    unit(deg)
                })
                .collect())
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn find_matches_across_corpora() {
        let mut encoder = AngleEncoder;
        let mut matcher = Matcher::new(&mut encoder, 1);
        let search = texts(&["0 east", "90 north"]);
        let candidates = texts(&["80 north-ish", "10 east-ish", "180 west"]);

        let results =
            matcher.find_matches(&search, &candidates, false).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].indices().collect::<Vec<_>>(), vec![1]);
        assert_eq!(results[1].indices().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn find_matches_with_empty_search() {
        let mut encoder = AngleEncoder;
        let mut matcher = Matcher::new(&mut encoder, 3);
        let results = matcher
            .find_matches(&[], &texts(&["0 a"]), false)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn find_matches_within_excludes_original_position() {
        let mut encoder = AngleEncoder;
        let mut matcher = Matcher::new(&mut encoder, 2);
        let corpus = texts(&["0 a", "20 b", "0 c", "90 d"]);

        let results = matcher.find_matches_within(&corpus, &[2, 3]).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(results[1].indices().collect::<Vec<_>>(), vec![1, 0]);
    }

    #[test]
    fn same_corpus_caps_at_other_documents() {
        let corpus = vec![unit(0.0), unit(40.0), unit(80.0)];
        let results = rank_all(&corpus, &corpus, true, 5);

        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.len(), 2);
            assert!(result.indices().all(|j| j != i));
        }
    }

    mod props {
        use proptest::prelude::*;

        use super::super::*;

        fn corpus() -> impl Strategy<Value = Vec<Embedding>> {
            prop::collection::vec(
                prop::collection::vec(-1.0f32..1.0, 4),
                0..12,
            )
        }

        proptest! {
            #[test]
            fn result_length_matches_formula(
                search in corpus(),
                candidates in corpus(),
                num_matches in 0usize..15,
            ) {
                let results = rank_all(&search, &candidates, false, num_matches);
                prop_assert_eq!(results.len(), search.len());
                for r in &results {
                    prop_assert_eq!(r.len(), num_matches.min(candidates.len()));
                }
            }

            #[test]
            fn self_matching_excludes_self(
                docs in corpus(),
                num_matches in 0usize..15,
            ) {
                let results = rank_all(&docs, &docs, true, num_matches);
                for (i, r) in results.iter().enumerate() {
                    let available = docs.len().saturating_sub(1);
                    prop_assert_eq!(r.len(), num_matches.min(available));
                    prop_assert!(r.indices().all(|j| j != i));
                }
            }

            #[test]
            fn distances_sorted_and_in_range(
                search in corpus(),
                candidates in corpus(),
            ) {
                for r in rank_all(&search, &candidates, false, 20) {
                    for n in &r.neighbors {
                        prop_assert!((0.0..=2.0).contains(&n.distance));
                    }
                    for pair in r.neighbors.windows(2) {
                        prop_assert!(pair[0].distance <= pair[1].distance);
                        if pair[0].distance == pair[1].distance {
                            prop_assert!(pair[0].index < pair[1].index);
                        }
                    }
                }
            }

            #[test]
            fn ranking_is_deterministic(
                search in corpus(),
                candidates in corpus(),
            ) {
                let first = rank_all(&search, &candidates, false, 5);
                let second = rank_all(&search, &candidates, false, 5);
                prop_assert_eq!(first, second);
            }
        }
    }
}
