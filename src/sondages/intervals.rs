// Fills the confidence intervals of the poll files.

use crate::sondages::{
    io_common::{read_raw_table, write_csv_atomic},
    *,
};

use poll_merge::stats::compute_interval;

const DECIMALS: i32 = 3;

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct IntervalsSummary {
    /// Number of poll files rewritten.
    pub updated_polls: usize,
    /// Number of result lines with an interval.
    pub updated_rows: usize,
    /// Polls left untouched, with the reason.
    pub skipped: Vec<(String, String)>,
}

fn format_bound(x: f64) -> String {
    format!("{}", x)
}

/// Rewrites the `erreur_inf` and `erreur_sup` columns of a poll file with the
/// bounds of the confidence interval of each intention.
///
/// The other columns are kept as they are. The bound columns are appended when absent.
/// Returns the number of lines that got an interval.
pub fn compute_poll_intervals(path: &Path, sample_size: f64, z: f64) -> SondagesResult<usize> {
    let table = read_raw_table(path)?;
    table.require_columns(&["candidat", "intentions"])?;

    let mut headers: Vec<String> = table.headers.iter().map(|h| h.to_string()).collect();
    for col in ["erreur_inf", "erreur_sup"] {
        if table.column(col).is_none() {
            headers.push(col.to_string());
        }
    }
    let idx = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let (intentions_idx, inf_idx, sup_idx) =
        (idx("intentions"), idx("erreur_inf"), idx("erreur_sup"));

    let mut updated = 0;
    let mut lines: Vec<Vec<String>> = Vec::with_capacity(table.records.len());
    for rec in table.records.iter() {
        let mut values: Vec<String> = rec.iter().map(|v| v.to_string()).collect();
        // Fields past the header are kept.
        if values.len() < headers.len() {
            values.resize(headers.len(), String::new());
        }
        let interval = values[intentions_idx]
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|pct| compute_interval(pct, sample_size, z))
            .map(|ci| ci.rounded(DECIMALS));
        match interval {
            Some(ci) => {
                values[inf_idx] = format_bound(ci.lower);
                values[sup_idx] = format_bound(ci.upper);
                updated += 1;
            }
            None => {
                values[inf_idx] = String::new();
                values[sup_idx] = String::new();
            }
        }
        lines.push(values);
    }

    let header_refs: Vec<&str> = headers.iter().map(|h| h.as_str()).collect();
    write_csv_atomic(
        path,
        &header_refs,
        lines
            .iter()
            .map(|l| l.iter().map(|v| v.as_str()).collect::<Vec<&str>>()),
    )?;
    debug!("compute_poll_intervals: {}: {} lines", path.display(), updated);
    Ok(updated)
}

/// Fills the intervals of every poll of the index.
///
/// Unlike the merge, this pass skips the polls it cannot process.
pub fn run_intervals(paths: &DatasetPaths, z: f64) -> SondagesResult<IntervalsSummary> {
    let metas = read_polls_metadata(&paths.polls)?;
    let mut summary = IntervalsSummary::default();
    for meta in metas.iter() {
        let file = paths.poll_file(&meta.poll_id);
        if !file.is_file() {
            warn!("{}: no results file, skipped", meta.poll_id);
            summary
                .skipped
                .push((meta.poll_id.clone(), "missing results file".to_string()));
            continue;
        }
        let sample_size = match meta.sample_size() {
            Some(n) => n,
            None => {
                warn!("{}: no usable sample size, skipped", meta.poll_id);
                summary
                    .skipped
                    .push((meta.poll_id.clone(), "no sample size".to_string()));
                continue;
            }
        };
        summary.updated_rows += compute_poll_intervals(&file, sample_size, z)?;
        summary.updated_polls += 1;
    }
    info!(
        "Intervals: {} polls updated, {} skipped",
        summary.updated_polls,
        summary.skipped.len()
    );
    Ok(summary)
}
