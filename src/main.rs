mod args;
mod sondages;

use crate::args::{Args, Command};
use crate::sondages::config_reader::{load_settings, Settings};
use crate::sondages::*;

use clap::Parser;
use env_logger::Env;
use log::debug;
use poll_merge::MismatchPolicy;
use std::path::{Path, PathBuf};

fn run(args: Args) -> SondagesResult<()> {
    let mut settings: Settings = load_settings(args.config.as_deref(), args.root.as_deref())?;
    debug!("settings: {:?}", settings);
    match args.command {
        Command::Merge {
            out,
            json,
            with_significance,
            reference,
            strict_hypotheses,
        } => {
            if strict_hypotheses {
                settings.rules.hypothesis_mismatch = MismatchPolicy::Fail;
            }
            let output = MergeOutput {
                out: out.map(PathBuf::from),
                json,
                with_significance,
                reference: reference.map(PathBuf::from),
            };
            run_merge(&settings, &output)?;
        }
        Command::Export {
            input,
            out,
            with_significance,
        } => {
            let input = input
                .map(PathBuf::from)
                .unwrap_or_else(|| settings.paths.output_csv.clone());
            let out = out
                .map(PathBuf::from)
                .unwrap_or_else(|| settings.paths.output_json.clone());
            let n = io_json::export_json(&input, &out, with_significance)?;
            println!("Wrote {} polls to {}", n, out.display());
        }
        Command::Intervals { z } => {
            let summary = intervals::run_intervals(&settings.paths, z.unwrap_or(settings.z))?;
            println!(
                "Updated {} polls ({} lines), skipped {}",
                summary.updated_polls,
                summary.updated_rows,
                summary.skipped.len()
            );
            for (poll_id, reason) in summary.skipped.iter() {
                println!("  {}: {}", poll_id, reason);
            }
        }
        Command::Badge { readme } => {
            let (count, changed) =
                badge::run_badge(&settings.paths, readme.as_deref().map(Path::new))?;
            if changed {
                println!("Badge updated to {} polls", count);
            } else {
                println!("Badge already shows {} polls", count);
            }
        }
        Command::CheckPolls {
            catalog_url,
            update_count,
        } => {
            catalog::run_check_polls(&settings.paths, catalog_url.as_deref(), update_count)?;
        }
        Command::Check => {
            health::run_check(&settings.paths)?;
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(s) = source {
            eprintln!("  caused by: {}", s);
            source = s.source();
        }
        std::process::exit(1);
    }
}
