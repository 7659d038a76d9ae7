use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed JSON in {path} at line {line}: {source}")]
    JsonLine {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not load model '{model}': {reason}")]
    ModelLoad { model: String, reason: String },

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error(
        "embedding dimensions differ: search set has {search}, candidate set has {candidate}"
    )]
    DimensionMismatch { search: usize, candidate: usize },

    #[error("no {corpus} data found at {path}; fetch or place the data first")]
    MissingData { corpus: &'static str, path: PathBuf },

    #[error("secret error: {0}")]
    Secret(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fact-check API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("'{0}' cannot be used as a candidate set")]
    InvalidCorpus(&'static str),

    #[error("data directory does not exist and could not be created: {0}")]
    DataDir(PathBuf),
}

impl From<candle_core::Error> for Error {
    fn from(e: candle_core::Error) -> Self {
        Error::Encode(format!("tensor computation error: {e}"))
    }
}
