// Integrity checks of a dataset, without merging it.

use crate::sondages::{
    io_common::{read_raw_table, RawTable},
    *,
};

use std::collections::{BTreeSet, HashMap};

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct HealthReport {
    pub passed: Vec<String>,
    pub problems: Vec<String>,
    pub notes: Vec<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.problems.is_empty()
    }

    fn check(&mut self, ok: bool, passed: String, problem: String) {
        if ok {
            self.passed.push(passed);
        } else {
            self.problems.push(problem);
        }
    }
}

fn load(report: &mut HealthReport, path: &Path, required: &[&str]) -> Option<RawTable> {
    if !path.is_file() {
        report
            .problems
            .push(format!("{} does not exist", path.display()));
        return None;
    }
    match read_raw_table(path) {
        Ok(table) => {
            let missing = table.missing_columns(required);
            report.check(
                missing.is_empty(),
                format!("{}: {} lines", path.display(), table.records.len()),
                format!("{}: missing columns {:?}", path.display(), missing),
            );
            Some(table)
        }
        Err(e) => {
            report.problems.push(format!("{}: {}", path.display(), e));
            None
        }
    }
}

/// The values of a column that appear more than once, sorted. Blank values are ignored.
fn duplicates(table: &RawTable, column: &str) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for rec in table.records.iter() {
        let v = table.get(rec, column).trim();
        if !v.is_empty() {
            *counts.entry(v).or_insert(0) += 1;
        }
    }
    let dups: BTreeSet<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(v, _)| v.to_string())
        .collect();
    dups.into_iter().collect()
}

fn check_unique(report: &mut HealthReport, table: &RawTable, column: &str) {
    let dups = duplicates(table, column);
    report.check(
        dups.is_empty(),
        format!("{}: {} values are unique", table.path, column),
        format!("{}: duplicate {} {:?}", table.path, column, dups),
    );
}

fn is_numeric_or_blank(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.parse::<f64>().map_or(false, |x| x.is_finite())
}

fn check_poll_file(report: &mut HealthReport, path: &Path) {
    let table = match load(report, path, &RESULT_COLUMNS) {
        Some(t) => t,
        None => return,
    };
    if table.records.is_empty() {
        report
            .problems
            .push(format!("{}: no data lines", table.path));
    }
    for (i, rec) in table.records.iter().enumerate() {
        for col in ["intentions", "erreur_sup", "erreur_inf"] {
            let v = table.get(rec, col);
            if !is_numeric_or_blank(v) {
                report.problems.push(format!(
                    "{}: line {}: {} is not a number: {:?}",
                    table.path,
                    i + 2,
                    col,
                    v
                ));
            }
        }
    }
}

/// Checks the files of a dataset. Problems are collected, the check never stops early.
pub fn check_dataset(paths: &DatasetPaths) -> HealthReport {
    let mut report = HealthReport::default();

    if let Some(t) = load(&mut report, &paths.candidates, &CANDIDATE_COLUMNS) {
        check_unique(&mut report, &t, "candidate_id");
    }
    let hypotheses: BTreeSet<String> =
        match load(&mut report, &paths.hypotheses, &HYPOTHESIS_COLUMNS) {
            Some(t) => {
                check_unique(&mut report, &t, "id_hypothese");
                t.records
                    .iter()
                    .map(|r| t.get(r, "id_hypothese").trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            None => BTreeSet::new(),
        };

    let mut poll_ids: BTreeSet<String> = BTreeSet::new();
    if let Some(t) = load(&mut report, &paths.polls, &POLL_COLUMNS) {
        check_unique(&mut report, &t, "poll_id");
        for rec in t.records.iter() {
            let poll_id = t.get(rec, "poll_id").trim();
            if poll_id.is_empty() {
                continue;
            }
            poll_ids.insert(poll_id.to_string());
            let hyp = t.get(rec, "hypothese").trim();
            if !hyp.is_empty() && !hypotheses.contains(hyp) {
                report
                    .problems
                    .push(format!("{}: unknown hypothesis {}", poll_id, hyp));
            }
        }
    }

    if !paths.polls_dir.is_dir() {
        report
            .problems
            .push(format!("{} is not a directory", paths.polls_dir.display()));
        return report;
    }
    let mut files: BTreeSet<String> = BTreeSet::new();
    match fs::read_dir(&paths.polls_dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() && path.extension().map_or(false, |e| e == "csv") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        files.insert(stem.to_string());
                    }
                }
            }
        }
        Err(e) => report
            .problems
            .push(format!("{}: {}", paths.polls_dir.display(), e)),
    }
    report.passed.push(format!(
        "{}: {} poll files",
        paths.polls_dir.display(),
        files.len()
    ));

    for poll_id in poll_ids.difference(&files) {
        report
            .problems
            .push(format!("{}: no results file", poll_id));
    }
    for stem in files.difference(&poll_ids) {
        report
            .problems
            .push(format!("{}.csv is not listed in the poll index", stem));
    }
    for stem in files.iter() {
        check_poll_file(&mut report, &paths.poll_file(stem));
    }

    if paths.output_csv.is_file() {
        match read_raw_table(&paths.output_csv) {
            Ok(t) => report.notes.push(format!(
                "{}: {} rows",
                paths.output_csv.display(),
                t.records.len()
            )),
            Err(e) => report.notes.push(format!("{}: {}", paths.output_csv.display(), e)),
        }
    } else {
        report
            .notes
            .push(format!("{} not generated yet", paths.output_csv.display()));
    }
    report
}

pub fn print_health(report: &HealthReport) {
    for l in report.passed.iter() {
        println!("[ok] {}", l);
    }
    for l in report.notes.iter() {
        println!("[info] {}", l);
    }
    for l in report.problems.iter() {
        println!("[problem] {}", l);
    }
    println!(
        "{} checks passed, {} problems",
        report.passed.len(),
        report.problems.len()
    );
}

pub fn run_check(paths: &DatasetPaths) -> SondagesResult<HealthReport> {
    let report = check_dataset(paths);
    print_health(&report);
    if !report.is_healthy() {
        whatever!("The dataset has {} problem(s)", report.problems.len());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sondages::tests::{write_dataset, write_file};

    #[test]
    fn healthy_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path());
        let report = check_dataset(&paths);
        assert!(report.is_healthy(), "{:?}", report.problems);
        assert_eq!(report.notes.len(), 1);
        assert!(run_check(&paths).is_ok());
    }

    #[test]
    fn problems_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path());
        write_file(&paths.poll_file("orphan"), "candidat,intentions,erreur_sup,erreur_inf\n");
        write_file(
            &paths.poll_file("20240101_0102_if_A"),
            "candidat,intentions,erreur_sup,erreur_inf\nJean Martin,beaucoup,,\n",
        );
        write_file(
            &paths.hypotheses,
            "id_hypothese,hypothese_complete\nH1,A\nH1,B\n",
        );
        let report = check_dataset(&paths);
        let all = report.problems.join("\n");
        assert!(all.contains("orphan.csv is not listed"));
        assert!(all.contains("orphan.csv: no data lines"));
        assert!(all.contains("intentions is not a number"));
        assert!(all.contains("duplicate id_hypothese [\"H1\"]"));
        assert!(all.contains("unknown hypothesis H2"));
        assert!(run_check(&paths).is_err());
    }

    #[test]
    fn missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DatasetPaths::from_root(dir.path());
        let report = check_dataset(&paths);
        assert_eq!(report.problems.len(), 4);
    }
}
