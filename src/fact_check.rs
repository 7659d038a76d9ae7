//! Client for the Google Fact Check Tools claim search API.
//!
//! Claims are fetched per (keyword, language) pair, following page tokens
//! until the API stops returning one, and written to
//! `<google_dir>/<lang>/<lang>_<keyword>.json`.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::Config,
    error::{Error, Result},
};

pub const CLAIM_SEARCH_URL: &str =
    "https://factchecktools.googleapis.com/v1alpha1/claims:search";

/// Status the API answers with while rate limiting.
const RATE_LIMITED: u16 = 503;

/// Parameters for one page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest<'a> {
    pub query: &'a str,
    pub language: &'a str,
    pub page_token: Option<&'a str>,
}

/// One decoded API page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPage {
    #[serde(default)]
    pub claims: Vec<Value>,
    pub next_page_token: Option<String>,
}

/// Outcome of a single page request.
#[derive(Debug)]
pub enum PageResponse {
    Page(ClaimPage),
    RateLimited,
}

/// Transport for claim search pages.
pub trait ClaimSearch {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<PageResponse>;
}

/// Blocking HTTP transport against the public API.
pub struct HttpClaimSearch {
    client: reqwest::blocking::Client,
    api_key: String,
    url: String,
}

impl HttpClaimSearch {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            api_key,
            url: CLAIM_SEARCH_URL.to_string(),
        })
    }
}

impl ClaimSearch for HttpClaimSearch {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<PageResponse> {
        let mut query = vec![
            ("key", self.api_key.as_str()),
            ("query", request.query),
            ("languageCode", request.language),
        ];
        if let Some(token) = request.page_token {
            query.push(("pageToken", token));
        }

        let response = self.client.get(&self.url).query(&query).send()?;
        let status = response.status();
        if status.as_u16() == RATE_LIMITED {
            return Ok(PageResponse::RateLimited);
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(PageResponse::Page(response.json()?))
    }
}

#[derive(Debug, Deserialize)]
struct Secret {
    key: Option<String>,
}

/// Read the API key from a `{"key": "..."}` JSON file.
pub fn read_api_key(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::Secret(format!(
            "no secret file at {}; create it with an API key",
            path.display()
        )));
    }
    let secret: Secret = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    secret
        .key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::Secret(format!("'key' missing in {}", path.display())))
}

/// Pages through claim search results and writes them to disk.
pub struct Fetcher<S> {
    source: S,
    retry_interval: Duration,
    /// Zero means retry forever.
    max_retries: u32,
}

impl<S: ClaimSearch> Fetcher<S> {
    pub fn new(source: S, retry_interval: Duration, max_retries: u32) -> Self {
        Self {
            source,
            retry_interval,
            max_retries,
        }
    }

    /// Collect every claim for one keyword and language.
    pub fn fetch_all(&self, keyword: &str, language: &str) -> Result<Vec<Value>> {
        tracing::info!(keyword, language, "beginning claim search");
        let mut claims = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let request = PageRequest {
                query: keyword,
                language,
                page_token: token.as_deref(),
            };
            let page = self.fetch_with_retry(&request)?;
            claims.extend(page.claims);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => {
                    tracing::debug!(page_token = %next, "fetching next page");
                    token = Some(next);
                }
                None => break,
            }
        }

        tracing::info!(keyword, language, claims = claims.len(), "done fetching");
        Ok(claims)
    }

    fn fetch_with_retry(&self, request: &PageRequest<'_>) -> Result<ClaimPage> {
        let mut retries = 0u32;
        loop {
            match self.source.fetch_page(request)? {
                PageResponse::Page(page) => return Ok(page),
                PageResponse::RateLimited => {
                    retries += 1;
                    if self.max_retries != 0 && retries > self.max_retries {
                        return Err(Error::Api {
                            status: RATE_LIMITED,
                            body: format!(
                                "still rate limited after {} retries",
                                self.max_retries
                            ),
                        });
                    }
                    tracing::warn!(
                        wait_secs = self.retry_interval.as_secs(),
                        "rate limit hit, waiting"
                    );
                    std::thread::sleep(self.retry_interval);
                }
            }
        }
    }

    /// Fetch every configured keyword in every configured language and
    /// write one file per pair. Returns the paths written.
    pub fn fetch_to_dir(
        &self,
        keywords: &[String],
        languages: &[String],
        google_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for keyword in keywords {
            for language in languages {
                let claims = self.fetch_all(keyword, language)?;
                let dir = google_dir.join(language);
                std::fs::create_dir_all(&dir)?;
                let path = dir.join(format!("{language}_{keyword}.json"));
                std::fs::write(&path, serde_json::to_string_pretty(&claims)?)?;
                written.push(path);
            }
        }
        Ok(written)
    }
}

/// Fetch fact-check data for the configured keywords and languages.
pub fn write_fact_check_data(config: &Config) -> Result<Vec<PathBuf>> {
    let api_key = read_api_key(&config.secret_loc)?;
    let fetcher = Fetcher::new(
        HttpClaimSearch::new(api_key)?,
        Duration::from_secs(config.retry_interval_secs),
        config.max_retries,
    );
    fetcher.fetch_to_dir(&config.keywords, &config.languages, &config.google_dir)
}
