use clap::Parser;
use tracing_subscriber::EnvFilter;

use claimmatch::{
    DataDir,
    ModelManager,
    cli::{Cli, Command, MatchArgs},
    config::{Config, ConfigFile, Overrides},
    error,
    fact_check,
    pipeline::{self, MatchRequest},
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("CLAIMMATCH_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let file = ConfigFile::locate(cli.config.as_deref())?;

    match cli.command {
        Command::Match(args) => {
            let overrides = Overrides {
                model: cli.model,
                num_matches: args.num_matches,
                output_dir: args.output_dir.clone(),
            };
            let config = Config::resolve(file, &overrides, &data_dir)?;
            cmd_match(&config, &args, cli.quiet)?;
        }
        Command::Fetch => {
            let overrides = Overrides {
                model: cli.model,
                ..Default::default()
            };
            let config = Config::resolve(file, &overrides, &data_dir)?;
            cmd_fetch(&config)?;
        }
        Command::Completions(_) => {}
    }

    Ok(())
}

fn cmd_match(
    config: &Config,
    args: &MatchArgs,
    quiet: bool,
) -> error::Result<()> {
    if args.fetch {
        cmd_fetch(config)?;
    }

    let request = MatchRequest {
        search_set: args.search_set,
        candidate_set: args.candidate_set,
        prune_duplicates: !args.keep_duplicates,
        filter: args.filter,
    };
    let mut model = ModelManager::with_model_id(config.model.clone())
        .with_batch_size(config.batch_size)
        .with_progress(!quiet);

    let path = pipeline::run_match(&request, config, &mut model)?;
    println!("{}", path.display());
    Ok(())
}

fn cmd_fetch(config: &Config) -> error::Result<()> {
    let written = fact_check::write_fact_check_data(config)?;
    eprintln!(
        "Fetched {} claim file(s) into {}",
        written.len(),
        config.google_dir.display()
    );
    Ok(())
}
