//! Run configuration.
//!
//! Values come from an optional TOML file layered under CLI overrides. The
//! resolved [`Config`] is immutable and handed by reference to each stage.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    data_dir::DataDir,
    error::{Error, Result},
    keywords::FilterParams,
    model_manager::{DEFAULT_BATCH_SIZE, DEFAULT_MODEL_ID, MODEL_ENV_VAR},
};

pub const CONFIG_ENV_VAR: &str = "CLAIMMATCH_CONFIG";

const DEFAULT_NUM_MATCHES: usize = 5;
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 60;

/// On-disk shape of `config.toml`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub model: Option<String>,
    pub num_matches: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub languages: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub sentences: Option<Vec<String>>,
    pub google_dir: Option<PathBuf>,
    pub ng_dir: Option<PathBuf>,
    pub json_dir: Option<PathBuf>,
    pub tweet_dir: Option<PathBuf>,
    pub tweet_files: Option<Vec<String>>,
    pub num_entries: Option<usize>,
    pub secret_loc: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub retry_interval_secs: Option<u64>,
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub filter: FilterSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    pub min_word_len: Option<usize>,
    pub min_doc_freq: Option<usize>,
    pub max_doc_ratio: Option<f32>,
    pub max_keywords: Option<usize>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read the config file from, in order of priority:
    /// 1. An explicit path (from --config), which must exist
    /// 2. The CLAIMMATCH_CONFIG environment variable, which must exist
    /// 3. `claimmatch/config.toml` under the XDG config home, if present
    ///
    /// Falls back to an empty file (all defaults) when nothing is found.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        let required = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

        if let Some(path) = required {
            return Self::read(&path);
        }

        let fallback = xdg::BaseDirectories::with_prefix("claimmatch")
            .get_config_home()
            .map(|home| home.join("config.toml"));
        match fallback {
            Some(path) if path.is_file() => Self::read(&path),
            _ => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::parse(&text)
    }
}

/// CLI values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub model: Option<String>,
    pub num_matches: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub num_matches: usize,
    pub output_dir: PathBuf,
    pub languages: Vec<String>,
    pub keywords: Vec<String>,
    pub sentences: Vec<String>,
    pub google_dir: PathBuf,
    pub ng_dir: PathBuf,
    pub json_dir: PathBuf,
    pub tweet_dir: PathBuf,
    pub tweet_files: Vec<String>,
    pub num_entries: usize,
    pub secret_loc: PathBuf,
    pub batch_size: usize,
    pub retry_interval_secs: u64,
    pub max_retries: u32,
    pub filter: FilterParams,
}

impl Config {
    pub fn resolve(
        file: ConfigFile,
        overrides: &Overrides,
        data_dir: &DataDir,
    ) -> Result<Self> {
        let model = overrides
            .model
            .clone()
            .or_else(|| std::env::var(MODEL_ENV_VAR).ok())
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        let path_or = |value: Option<PathBuf>, default: PathBuf| {
            value.map_or(default, |p| data_dir.join(&p))
        };

        let defaults = FilterParams::default();
        let filter = FilterParams {
            min_word_len: file.filter.min_word_len.unwrap_or(defaults.min_word_len),
            min_doc_freq: file.filter.min_doc_freq.unwrap_or(defaults.min_doc_freq),
            max_doc_ratio: file
                .filter
                .max_doc_ratio
                .unwrap_or(defaults.max_doc_ratio),
            max_keywords: file.filter.max_keywords.unwrap_or(defaults.max_keywords),
        };

        let config = Self {
            model,
            num_matches: overrides
                .num_matches
                .or(file.num_matches)
                .unwrap_or(DEFAULT_NUM_MATCHES),
            output_dir: overrides
                .output_dir
                .clone()
                .unwrap_or_else(|| {
                    path_or(file.output_dir, data_dir.output_dir())
                }),
            languages: file.languages.unwrap_or_else(|| vec!["en".to_string()]),
            keywords: file.keywords.unwrap_or_else(|| {
                vec!["coronavirus".to_string(), "covid".to_string()]
            }),
            sentences: file.sentences.unwrap_or_default(),
            google_dir: path_or(file.google_dir, data_dir.google_dir()),
            ng_dir: path_or(file.ng_dir, data_dir.newsguard_dir()),
            json_dir: path_or(file.json_dir, data_dir.misc_json_dir()),
            tweet_dir: path_or(file.tweet_dir, data_dir.tweet_dir()),
            tweet_files: file
                .tweet_files
                .unwrap_or_else(|| vec!["*.jsonl".to_string()]),
            num_entries: file.num_entries.unwrap_or(0),
            secret_loc: path_or(file.secret_loc, data_dir.secret_file()),
            batch_size: file.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            retry_interval_secs: file
                .retry_interval_secs
                .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS),
            max_retries: file.max_retries.unwrap_or(0),
            filter,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        if self.languages.is_empty() {
            return Err(Error::Config(
                "at least one language must be configured".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.filter.max_doc_ratio) {
            return Err(Error::Config(format!(
                "filter.max_doc_ratio must be within [0, 1], got {}",
                self.filter.max_doc_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_dir() -> (DataDir, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        (DataDir::resolve(Some(tmp.path())).unwrap(), tmp)
    }

    #[test]
    fn empty_file_yields_defaults() {
        let (dir, _tmp) = data_dir();
        let overrides = Overrides {
            model: Some("custom/model".into()),
            ..Default::default()
        };
        let config =
            Config::resolve(ConfigFile::parse("").unwrap(), &overrides, &dir)
                .unwrap();

        assert_eq!(config.model, "custom/model");
        assert_eq!(config.num_matches, DEFAULT_NUM_MATCHES);
        assert_eq!(config.languages, vec!["en"]);
        assert_eq!(config.output_dir, dir.output_dir());
        assert_eq!(config.google_dir, dir.google_dir());
        assert_eq!(config.tweet_files, vec!["*.jsonl"]);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn file_values_resolve_against_data_dir() {
        let (dir, _tmp) = data_dir();
        let file = ConfigFile::parse(
            r#"
            model = "file/model"
            num_matches = 3
            languages = ["en", "es"]
            google_dir = "claims"
            sentences = ["masks do not work"]

            [filter]
            min_doc_freq = 1
            "#,
        )
        .unwrap();
        let overrides = Overrides {
            model: Some("cli/model".into()),
            ..Default::default()
        };
        let config = Config::resolve(file, &overrides, &dir).unwrap();

        assert_eq!(config.model, "cli/model");
        assert_eq!(config.num_matches, 3);
        assert_eq!(config.languages, vec!["en", "es"]);
        assert_eq!(config.google_dir, dir.root().join("claims"));
        assert_eq!(config.sentences, vec!["masks do not work"]);
        assert_eq!(config.filter.min_doc_freq, 1);
        assert_eq!(
            config.filter.max_keywords,
            FilterParams::default().max_keywords
        );
    }

    #[test]
    fn cli_overrides_win_over_file() {
        let (dir, tmp) = data_dir();
        let file = ConfigFile::parse("num_matches = 3\noutput_dir = \"runs\"")
            .unwrap();
        let overrides = Overrides {
            model: Some("m".into()),
            num_matches: Some(10),
            output_dir: Some(tmp.path().join("elsewhere")),
        };
        let config = Config::resolve(file, &overrides, &dir).unwrap();

        assert_eq!(config.num_matches, 10);
        assert_eq!(config.output_dir, tmp.path().join("elsewhere"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            ConfigFile::parse("nonsense = 1"),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let (dir, _tmp) = data_dir();
        let file = ConfigFile::parse("batch_size = 0").unwrap();
        let overrides = Overrides {
            model: Some("m".into()),
            ..Default::default()
        };
        assert!(matches!(
            Config::resolve(file, &overrides, &dir),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(
            ConfigFile::locate(Some(&missing)),
            Err(Error::Config(_))
        ));
    }
}
