//! claimmatch - match short social-media posts to fact-checked claims.
//!
//! Two corpora (a *search* set and a *candidate* set) are encoded with a
//! pretrained sentence encoder, and every search document is paired with its
//! nearest candidates by cosine distance. Results land in a plain-text
//! report, one file per run.
//!
//! # Quick start
//!
//! ```no_run
//! use claimmatch::{Matcher, ModelManager};
//!
//! let search = vec!["garlic cures the virus".to_string()];
//! let candidates = vec![
//!     "Eating garlic does not prevent infection".to_string(),
//!     "Masks reduce transmission".to_string(),
//! ];
//!
//! let mut model = ModelManager::with_model_id(
//!     claimmatch::model_manager::DEFAULT_MODEL_ID.to_string(),
//! );
//! let mut matcher = Matcher::new(&mut model, 1);
//! let results = matcher.find_matches(&search, &candidates, false).unwrap();
//! for n in &results[0].neighbors {
//!     println!("{} ({:.3})", candidates[n.index], n.distance);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod corpus;
pub mod data_dir;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod fact_check;
pub mod keywords;
pub mod loaders;
pub mod matcher;
pub mod model_manager;
pub mod pipeline;
pub mod report;
pub mod text_util;

pub use config::Config;
pub use corpus::CorpusKind;
pub use data_dir::DataDir;
pub use embedding::SentenceEncoder;
pub use error::{Error, Result};
pub use matcher::{MatchResult, Matcher, Neighbor};
pub use model_manager::ModelManager;
