use crate::error::{Error, Result};

/// One fixed-length sentence vector.
pub type Embedding = Vec<f32>;

/// Maps documents to sentence embeddings.
///
/// Implementations must preserve input order, return exactly one embedding
/// per document, and produce vectors of one fixed dimensionality.
pub trait SentenceEncoder {
    /// Identifier of the model producing the embeddings.
    fn model_id(&self) -> &str;

    /// Encode a batch of documents.
    fn encode(&mut self, texts: &[String]) -> Result<Vec<Embedding>>;
}

/// The two embedding sets consumed by the matcher.
///
/// In self-matching mode the corpus is encoded once and `candidate` is
/// `None`; both roles then read the same vectors.
#[derive(Debug)]
pub struct EncodedSets {
    pub search: Vec<Embedding>,
    pub candidate: Option<Vec<Embedding>>,
}

impl EncodedSets {
    pub fn candidates(&self) -> &[Embedding] {
        self.candidate.as_deref().unwrap_or(&self.search)
    }
}

/// Encode the search and candidate corpora with one encoder.
///
/// When `same_corpus` is set, `candidate_docs` is ignored and the search
/// corpus is encoded a single time.
pub fn encode_sets<E: SentenceEncoder + ?Sized>(
    encoder: &mut E,
    search_docs: &[String],
    candidate_docs: &[String],
    same_corpus: bool,
) -> Result<EncodedSets> {
    if same_corpus {
        tracing::info!(
            documents = search_docs.len(),
            "encoding search and candidate set"
        );
        let search = encode_checked(encoder, search_docs)?;
        return Ok(EncodedSets {
            search,
            candidate: None,
        });
    }

    tracing::info!(documents = search_docs.len(), "encoding search set");
    let search = encode_checked(encoder, search_docs)?;
    tracing::info!(documents = candidate_docs.len(), "encoding candidate set");
    let candidate = encode_checked(encoder, candidate_docs)?;

    if let (Some(s), Some(c)) = (search.first(), candidate.first())
        && s.len() != c.len()
    {
        return Err(Error::DimensionMismatch {
            search: s.len(),
            candidate: c.len(),
        });
    }

    Ok(EncodedSets {
        search,
        candidate: Some(candidate),
    })
}

fn encode_checked<E: SentenceEncoder + ?Sized>(
    encoder: &mut E,
    texts: &[String],
) -> Result<Vec<Embedding>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let embeddings = encoder.encode(texts)?;
    if embeddings.len() != texts.len() {
        return Err(Error::Encode(format!(
            "encoder returned {} embeddings for {} documents",
            embeddings.len(),
            texts.len()
        )));
    }
    Ok(embeddings)
}
