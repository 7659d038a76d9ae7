//! Readers for the on-disk corpora.
//!
//! Each loader returns the text field of every record it finds. Files are
//! visited in sorted path order so repeated runs see the same documents in
//! the same order.

use std::{
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;

use crate::{
    config::Config,
    error::{Error, Result},
};

const JSON_PATTERN: &str = "*.json";

pub fn load_google_claims(config: &Config) -> Result<Vec<String>> {
    let mut docs = Vec::new();
    for language in &config.languages {
        let dir = config.google_dir.join(language);
        let files = matching_files(&dir, &[JSON_PATTERN], "Google fact-check")?;
        for file in files {
            docs.extend(read_json_array_field(&file, "text")?);
        }
    }
    Ok(docs)
}

pub fn load_newsguard(config: &Config) -> Result<Vec<String>> {
    load_json_dir(&config.ng_dir, "description", "NewsGuard")
}

pub fn load_misc_json(config: &Config) -> Result<Vec<String>> {
    load_json_dir(&config.json_dir, "content", "misc JSON")
}

/// Read English tweets from the JSON Lines files in the tweet directory
/// whose names match one of the configured patterns.
///
/// Stops after `num_entries` tweets when that is non-zero.
pub fn load_local_tweets(config: &Config) -> Result<Vec<String>> {
    let patterns: Vec<&str> =
        config.tweet_files.iter().map(String::as_str).collect();
    let files = matching_files(&config.tweet_dir, &patterns, "tweet")?;
    tracing::debug!(?files, "tweet files matched");

    let limit = (config.num_entries > 0).then_some(config.num_entries);
    let mut tweets = Vec::new();
    for file in files {
        let reader = BufReader::new(std::fs::File::open(&file)?);
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let tweet: Value =
                serde_json::from_str(&line).map_err(|source| {
                    Error::JsonLine {
                        path: file.clone(),
                        line: idx + 1,
                        source,
                    }
                })?;

            if tweet.get("lang").and_then(Value::as_str) != Some("en") {
                continue;
            }
            let Some(text) = tweet.get("full_text").and_then(Value::as_str)
            else {
                tracing::debug!(path = %file.display(), line = idx + 1, "tweet without full_text");
                continue;
            };

            tweets.push(text.to_string());
            if limit == Some(tweets.len()) {
                return Ok(tweets);
            }
        }
    }
    Ok(tweets)
}

pub fn load_manual(config: &Config) -> Result<Vec<String>> {
    Ok(config.sentences.clone())
}

fn load_json_dir(
    dir: &Path,
    field: &str,
    corpus: &'static str,
) -> Result<Vec<String>> {
    let mut docs = Vec::new();
    for file in matching_files(dir, &[JSON_PATTERN], corpus)? {
        docs.extend(read_json_array_field(&file, field)?);
    }
    Ok(docs)
}

/// Parse a file holding a JSON array of objects and pull out one string
/// field from each. Records without the field are skipped.
fn read_json_array_field(path: &Path, field: &str) -> Result<Vec<String>> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    let records: Vec<Value> =
        serde_json::from_reader(reader).map_err(|source| Error::JsonLine {
            path: path.to_path_buf(),
            line: source.line(),
            source,
        })?;

    let total = records.len();
    let docs: Vec<String> = records
        .iter()
        .filter_map(|r| r.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    if docs.len() < total {
        tracing::debug!(
            path = %path.display(),
            skipped = total - docs.len(),
            field,
            "records without text field"
        );
    }
    Ok(docs)
}

/// List files directly inside `dir` whose names match any pattern.
///
/// A missing directory or a directory without matching files means the
/// corpus has not been set up, which is reported as missing data.
fn matching_files(
    dir: &Path,
    patterns: &[&str],
    corpus: &'static str,
) -> Result<Vec<PathBuf>> {
    let missing = || Error::MissingData {
        corpus,
        path: dir.to_path_buf(),
    };
    if !dir.is_dir() {
        return Err(missing());
    }

    let set = build_globset(patterns)?;
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if set.is_match(entry.file_name()) {
            files.push(entry.path());
        }
    }

    if files.is_empty() {
        return Err(missing());
    }
    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            Error::Config(format!("invalid file pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Config(format!("invalid file patterns: {e}")))
}
