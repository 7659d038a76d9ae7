//! Plain-text match reports.
//!
//! One report file is written per run. The header records what was run; each
//! entry lists a search document followed by its nearest candidates.

use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};

use crate::{
    error::Result,
    matcher::MatchResult,
    text_util::{collapse_newlines, format_distances, format_string_list},
};

const SEPARATOR: &str = "----------------------------";
const TIMESTAMP_FORMAT: &str = "%m%d%y-%H%M%S";

/// Metadata printed at the top of a report.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub model: String,
    pub search_set: String,
    pub candidate_set: String,
    pub languages: Vec<String>,
}

/// Everything needed to render one report.
pub struct Report<'a> {
    pub info: &'a RunInfo,
    pub search_docs: &'a [String],
    pub candidate_docs: &'a [String],
    pub matches: &'a [MatchResult],
    /// Keyword hits per search document; empty when filtering was off.
    pub keywords: &'a [Vec<String>],
}

impl Report<'_> {
    /// Render the report into `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Model: {}", self.info.model)?;
        writeln!(out, "Search Set: {}", self.info.search_set)?;
        writeln!(out, "Candidate Set: {}", self.info.candidate_set)?;
        writeln!(
            out,
            "Languages: {}",
            format_string_list(&self.info.languages)
        )?;
        writeln!(out)?;

        for (i, (doc, result)) in
            self.search_docs.iter().zip(self.matches).enumerate()
        {
            let keywords = self.keywords.get(i).map(Vec::as_slice);
            self.write_entry(out, doc, result, keywords)?;
        }
        Ok(())
    }

    fn write_entry<W: Write>(
        &self,
        out: &mut W,
        doc: &str,
        result: &MatchResult,
        keywords: Option<&[String]>,
    ) -> Result<()> {
        writeln!(out, "Search set item:")?;
        writeln!(out, "{}", collapse_newlines(doc))?;
        writeln!(out, "{SEPARATOR}")?;
        if let Some(words) = keywords.filter(|w| !w.is_empty()) {
            writeln!(out, "Matching keywords: {}", format_string_list(words))?;
        }
        writeln!(
            out,
            "Distances to candidate: {}",
            format_distances(&result.distances())
        )?;
        writeln!(out, "Top candidate set matches (high to low):")?;
        for index in result.indices() {
            if let Some(candidate) = self.candidate_docs.get(index) {
                writeln!(out, "- {}", collapse_newlines(candidate))?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    /// Write the report to a new file in `output_dir`, creating the
    /// directory if needed. Returns the path written.
    pub fn write_file(
        &self,
        output_dir: &Path,
        now: DateTime<Local>,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;
        let stem = format!(
            "{}-{}-{}",
            self.info.search_set,
            self.info.candidate_set,
            now.format(TIMESTAMP_FORMAT)
        );

        let (path, file) = create_unique(output_dir, &stem)?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out)?;
        out.flush()?;

        tracing::info!(path = %path.display(), "wrote report");
        Ok(path)
    }
}

/// Create `<stem>.txt`, or `<stem>-N.txt` for the first free N, without
/// ever truncating an existing file.
fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, std::fs::File)> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{stem}.txt")
        } else {
            format!("{stem}-{attempt}.txt")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::matcher::Neighbor;

    fn info() -> RunInfo {
        RunInfo {
            model: "test-model".into(),
            search_set: "local_tweets".into(),
            candidate_set: "google".into(),
            languages: vec!["en".into(), "es".into()],
        }
    }

    fn result(pairs: &[(usize, f32)]) -> MatchResult {
        MatchResult {
            neighbors: pairs
                .iter()
                .map(|&(index, distance)| Neighbor { index, distance })
                .collect(),
        }
    }

    fn render(report: &Report<'_>) -> String {
        let mut buf = Vec::new();
        report.write_to(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn renders_header_and_entries() {
        let info = info();
        let search = vec!["garlic\ncures covid".to_string()];
        let candidates =
            vec!["Garlic does not\ncure COVID".to_string(), "other".to_string()];
        let matches = vec![result(&[(0, 0.125), (1, 0.5)])];
        let report = Report {
            info: &info,
            search_docs: &search,
            candidate_docs: &candidates,
            matches: &matches,
            keywords: &[],
        };

        let expected = "\
Model: test-model
Search Set: local_tweets
Candidate Set: google
Languages: [\"en\", \"es\"]

Search set item:
garlic cures covid
----------------------------
Distances to candidate: [0.125000, 0.500000]
Top candidate set matches (high to low):
- Garlic does not cure COVID
- other

";
        assert_eq!(render(&report), expected);
    }

    #[test]
    fn renders_keywords_when_present() {
        let info = info();
        let search = vec!["a".to_string(), "b".to_string()];
        let candidates = vec!["c".to_string()];
        let matches = vec![result(&[(0, 0.0)]), result(&[])];
        let keywords = vec![vec!["garlic".to_string()], vec![]];
        let report = Report {
            info: &info,
            search_docs: &search,
            candidate_docs: &candidates,
            matches: &matches,
            keywords: &keywords,
        };

        let text = render(&report);
        assert_eq!(text.matches("Matching keywords:").count(), 1);
        assert!(text.contains("Matching keywords: [\"garlic\"]\n"));
        assert!(text.contains("Distances to candidate: []\n"));
    }

    #[test]
    fn repeated_runs_never_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("output");
        let info = info();
        let report = Report {
            info: &info,
            search_docs: &[],
            candidate_docs: &[],
            matches: &[],
            keywords: &[],
        };
        let now = Local.with_ymd_and_hms(2020, 7, 14, 12, 34, 50).unwrap();

        let first = report.write_file(&out_dir, now).unwrap();
        let second = report.write_file(&out_dir, now).unwrap();

        assert_eq!(
            first.file_name().unwrap(),
            "local_tweets-google-071420-123450.txt"
        );
        assert_eq!(
            second.file_name().unwrap(),
            "local_tweets-google-071420-123450-1.txt"
        );
        assert!(
            std::fs::read_to_string(&first)
                .unwrap()
                .starts_with("Model: test-model\n")
        );
    }
}
