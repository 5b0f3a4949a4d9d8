use log::{debug, info, warn};

use poll_merge::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use text_diff::print_diff;

pub mod badge;
pub mod catalog;
pub mod config_reader;
pub mod health;
pub mod intervals;
pub mod io_common;
pub mod io_csv;
pub mod io_json;
pub mod writer;

use crate::sondages::config_reader::*;
use crate::sondages::io_csv::*;

#[derive(Debug, Snafu)]
pub enum SondagesError {
    #[snafu(display("Error opening file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading a line of {path}"))]
    CsvLineParse { source: csv::Error, path: String },
    #[snafu(display("{path} is missing required columns: {missing:?}"))]
    Schema { path: String, missing: Vec<String> },
    #[snafu(display("Missing poll results file: {path}"))]
    MissingPollFile { path: String },
    #[snafu(display("Duplicate poll_id {poll_id} in {path}"))]
    DuplicatePollId { poll_id: String, path: String },
    #[snafu(display("Merge failed"))]
    Merge { source: MergeErrors },
    #[snafu(display("Error writing {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("I/O error on {path}"))]
    Io { source: std::io::Error, path: String },
    #[snafu(display("Error moving the output into place at {path}"))]
    PersistOutput {
        source: tempfile::PersistError,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing JSON to {path}"))]
    WritingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error fetching the poll catalog from {url}"))]
    Catalog { source: reqwest::Error, url: String },
    #[snafu(display("{path} differs from the reference {reference}"))]
    ReferenceMismatch { path: String, reference: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SondagesResult<T> = Result<T, SondagesError>;

/// Loads the candidate registry and the hypotheses table.
pub fn load_lookup_tables(
    paths: &DatasetPaths,
) -> SondagesResult<(CandidateRegistry, HypothesisTable)> {
    let candidates = read_candidates(&paths.candidates)?;
    let registry = CandidateRegistry::new(&candidates).context(MergeSnafu {})?;
    let records = read_hypotheses(&paths.hypotheses)?;
    let hypotheses = HypothesisTable::new(&records).context(MergeSnafu {})?;
    info!(
        "Loaded {} candidates and {} hypotheses",
        registry.len(),
        hypotheses.len()
    );
    Ok((registry, hypotheses))
}

/// Merges every poll of the index with its results file.
///
/// Nothing is written. The first structural problem (missing columns, missing
/// poll file, duplicate poll id) stops the merge.
pub fn merge_dataset(paths: &DatasetPaths, rules: &MergeRules) -> SondagesResult<MergeReport> {
    let (registry, hypotheses) = load_lookup_tables(paths)?;
    let metas = read_polls_metadata(&paths.polls)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut polls: Vec<(PollMetadata, Vec<PollResultRow>)> = Vec::with_capacity(metas.len());
    for meta in metas.into_iter() {
        let poll_id = meta.poll_id.trim().to_string();
        if poll_id.is_empty() {
            continue;
        }
        ensure!(
            !seen.contains(&poll_id),
            DuplicatePollIdSnafu {
                poll_id,
                path: paths.polls.display().to_string(),
            }
        );
        let results = read_poll_results(&paths.poll_file(&poll_id))?;
        debug!("merge_dataset: {}: {} results", poll_id, results.len());
        seen.insert(poll_id);
        polls.push((meta, results));
    }
    let report = merge_polls(&polls, &registry, &hypotheses, rules).context(MergeSnafu {})?;

    if let Some((poll_id, candidate_id)) = find_duplicate_pair(&report.rows) {
        whatever!(
            "Poll {} has more than one row for candidate {}",
            poll_id,
            candidate_id
        )
    }
    Ok(report)
}

/// Options of the merge command.
#[derive(Debug, Clone, Default)]
pub struct MergeOutput {
    /// Overrides the output path of the configuration.
    pub out: Option<PathBuf>,
    pub json: bool,
    pub with_significance: bool,
    /// A file the merged output must be identical to.
    pub reference: Option<PathBuf>,
}

pub fn run_merge(settings: &Settings, output: &MergeOutput) -> SondagesResult<MergeReport> {
    let report = merge_dataset(&settings.paths, &settings.rules)?;
    let out = output
        .out
        .clone()
        .unwrap_or_else(|| settings.paths.output_csv.clone());
    writer::write_merged_csv(&report.rows, &out)?;
    println!("Wrote {} rows to {}", report.rows.len(), out.display());
    print_report(&report);

    if output.json {
        let json_out = settings.paths.output_json.clone();
        let num_polls = io_json::export_json(&out, &json_out, output.with_significance)?;
        println!("Wrote {} polls to {}", num_polls, json_out.display());
    }

    if let Some(reference) = output.reference.as_ref() {
        compare_with_reference(&out, reference)?;
        println!("Output matches the reference {}", reference.display());
    }
    Ok(report)
}

/// Prints the data-quality findings of a merge.
pub fn print_report(report: &MergeReport) {
    if !report.unresolved.is_empty() {
        println!(
            "{} candidate name(s) not found in the registry:",
            report.unresolved.len()
        );
        for u in report.unresolved.iter() {
            println!("  {}: {:?} -> {}", u.poll_id, u.raw_name, u.synthetic_id);
        }
    }
    if !report.mismatches.is_empty() {
        println!(
            "{} poll(s) differ from their hypothesis:",
            report.mismatches.len()
        );
        for m in report.mismatches.iter() {
            println!(
                "  {} ({}): missing {:?}, unexpected {:?}",
                m.poll_id, m.hypothesis_id, m.missing, m.unexpected
            );
        }
    }
    for (poll_id, hyp) in report.unknown_hypotheses.iter() {
        println!("  {}: unknown hypothesis {}", poll_id, hyp);
    }
}

fn compare_with_reference(output: &Path, reference: &Path) -> SondagesResult<()> {
    let produced = fs::read_to_string(output).context(IoSnafu {
        path: output.display().to_string(),
    })?;
    let expected = fs::read_to_string(reference).context(IoSnafu {
        path: reference.display().to_string(),
    })?;
    if produced != expected {
        warn!("Found differences with the reference file");
        print_diff(expected.as_str(), produced.as_str(), "\n");
        return ReferenceMismatchSnafu {
            path: output.display().to_string(),
            reference: reference.display().to_string(),
        }
        .fail();
    }
    Ok(())
}
