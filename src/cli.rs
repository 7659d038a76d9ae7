use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::corpus::CorpusKind;

#[derive(Debug, Parser)]
#[command(
    name = "claimmatch",
    about = "Match short posts to their nearest fact-checked claims"
)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the sentence encoder model ID or local model path
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find the nearest candidate documents for every search document
    Match(MatchArgs),
    /// Download fact-checked claims from the Google Fact Check API
    Fetch,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Match --

#[derive(Debug, Parser)]
pub struct MatchArgs {
    /// Documents to find matching claims for
    #[arg(short = 's', long, value_enum, default_value = "google")]
    pub search_set: CorpusKind,

    /// Documents used as potential matches for the search set
    #[arg(short = 'c', long, value_enum, default_value = "local_tweets")]
    pub candidate_set: CorpusKind,

    /// Number of matches to report per search document
    #[arg(short = 'n', long)]
    pub num_matches: Option<usize>,

    /// Directory the report is written to
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Retain duplicate documents instead of pruning them
    #[arg(short = 'd', long)]
    pub keep_duplicates: bool,

    /// Drop search documents sharing no keyword with the candidate set
    #[arg(short = 'f', long)]
    pub filter: bool,

    /// Fetch fact-check API data before matching
    #[arg(short = 'g', long)]
    pub fetch: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "claimmatch",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_match_defaults() {
        let cli = Cli::parse_from(["claimmatch", "match"]);
        match cli.command {
            Command::Match(args) => {
                assert_eq!(args.search_set, CorpusKind::Google);
                assert_eq!(args.candidate_set, CorpusKind::LocalTweets);
                assert_eq!(args.num_matches, None);
                assert!(!args.keep_duplicates);
                assert!(!args.filter);
                assert!(!args.fetch);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn parse_match_short_flags() {
        let cli = Cli::parse_from([
            "claimmatch", "match", "-s", "manual", "-c", "ng", "-n", "3", "-d",
            "-f", "-g",
        ]);
        match cli.command {
            Command::Match(args) => {
                assert_eq!(args.search_set, CorpusKind::Manual);
                assert_eq!(args.candidate_set, CorpusKind::NewsGuard);
                assert_eq!(args.num_matches, Some(3));
                assert!(args.keep_duplicates && args.filter && args.fetch);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "claimmatch",
            "fetch",
            "--model",
            "local/model",
            "-vv",
        ]);
        assert!(matches!(cli.command, Command::Fetch));
        assert_eq!(cli.model.as_deref(), Some("local/model"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn unknown_corpus_is_rejected() {
        assert!(
            Cli::try_parse_from(["claimmatch", "match", "-s", "tweets"]).is_err()
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
