mod config;
pub mod manual;
mod normalize;
mod registry;
pub mod stats;

use log::{debug, info, warn};

use std::collections::HashSet;

pub use crate::config::*;
pub use crate::normalize::{normalize, normalize_opt};
pub use crate::registry::*;

/// The outcome of merging a single poll.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollMerge {
    pub poll_id: String,
    pub hypothesis_id: String,
    pub rows: Vec<MergedRow>,
    pub unresolved: Vec<UnresolvedCandidate>,
    pub mismatch: Option<HypothesisMismatch>,
    /// The declared hypothesis is not blank but is not in the table.
    pub unknown_hypothesis: bool,
}

/// The accumulated outcome of a merge run.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MergeReport {
    pub polls: usize,
    pub rows: Vec<MergedRow>,
    pub mismatches: Vec<HypothesisMismatch>,
    pub unresolved: Vec<UnresolvedCandidate>,
    /// (poll id, hypothesis id) pairs referencing an unknown hypothesis.
    pub unknown_hypotheses: Vec<(String, String)>,
}

impl MergeReport {
    pub fn push(&mut self, mut pm: PollMerge) {
        self.polls += 1;
        if pm.unknown_hypothesis {
            self.unknown_hypotheses
                .push((pm.poll_id.clone(), pm.hypothesis_id.clone()));
        }
        if let Some(m) = pm.mismatch.take() {
            self.mismatches.push(m);
        }
        self.unresolved.append(&mut pm.unresolved);
        self.rows.append(&mut pm.rows);
    }
}

/// Builds a fallback id for a name that is not in the registry.
///
/// The id is made of the uppercased initials of the words of the name, words
/// being separated by whitespace or hyphens. A name without words uses the first
/// two characters of its name key.
///
/// ```
/// use poll_merge::synthetic_id;
///
/// assert_eq!(synthetic_id("Alice Dupont"), "AD");
/// assert_eq!(synthetic_id("jean-pierre  raffarin"), "JPR");
/// ```
pub fn synthetic_id(raw_name: &str) -> String {
    let initials: String = raw_name
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|w| w.chars().next())
        .collect();
    if initials.is_empty() {
        normalize(raw_name).chars().take(2).collect::<String>().to_uppercase()
    } else {
        initials.to_uppercase()
    }
}

/// Compares the candidates of a poll with those of its declared hypothesis.
///
/// Returns None when they match, or when the hypothesis is unknown or empty.
pub fn check_hypothesis(
    poll_id: &str,
    hypothesis_id: &str,
    candidate_names: &[&str],
    hypotheses: &HypothesisTable,
) -> Option<HypothesisMismatch> {
    let expected: HashSet<String> = hypotheses.lookup(hypothesis_id);
    if expected.is_empty() {
        return None;
    }
    let got: HashSet<String> = candidate_names
        .iter()
        .map(|name| normalize(name))
        .filter(|k| !k.is_empty())
        .collect();
    if got == expected {
        return None;
    }
    let mut missing: Vec<String> = expected.difference(&got).cloned().collect();
    let mut unexpected: Vec<String> = got.difference(&expected).cloned().collect();
    missing.sort();
    unexpected.sort();
    Some(HypothesisMismatch {
        poll_id: poll_id.to_string(),
        hypothesis_id: hypothesis_id.to_string(),
        missing,
        unexpected,
    })
}

/// Merges the results of one poll with its metadata and the registered candidates.
///
/// Arguments:
/// * `meta` the metadata of the poll
/// * `results` the rows of the poll file. Rows with a blank candidate name are ignored.
/// * `registry` the registered candidates
/// * `hypotheses` the candidate-set scenarios
/// * `rules` how to treat the data-quality problems
///
/// One merged row is produced per result row, in the same order. Registered
/// candidates are matched on their name key. The other names get a synthetic
/// candidate (see [synthetic_id]); when that id belongs to a registered candidate
/// or is already taken in this poll, a numeric suffix is appended. A poll never has
/// two rows with the same candidate id, and a synthetic id never names a registered
/// candidate.
pub fn merge_poll(
    meta: &PollMetadata,
    results: &[PollResultRow],
    registry: &CandidateRegistry,
    hypotheses: &HypothesisTable,
    rules: &MergeRules,
) -> Result<PollMerge, MergeErrors> {
    let poll_id = meta.poll_id.trim();
    let hypothesis_id = meta.hypothese.trim();
    let results: Vec<&PollResultRow> = results
        .iter()
        .filter(|r| !r.candidat.trim().is_empty())
        .collect();
    debug!(
        "merge_poll: poll {} hypothesis {:?}: {} results",
        poll_id,
        hypothesis_id,
        results.len()
    );

    let unknown_hypothesis = !hypothesis_id.is_empty() && !hypotheses.contains(hypothesis_id);
    if unknown_hypothesis {
        warn!(
            "Poll {} references unknown hypothesis {}",
            poll_id, hypothesis_id
        );
    }

    let names: Vec<&str> = results.iter().map(|r| r.candidat.as_str()).collect();
    let mismatch = check_hypothesis(poll_id, hypothesis_id, &names, hypotheses);
    if let Some(m) = mismatch.as_ref() {
        match rules.hypothesis_mismatch {
            MismatchPolicy::Fail => return Err(MergeErrors::HypothesisMismatch(m.clone())),
            MismatchPolicy::Warn => warn!(
                "Poll {} candidates differ from hypothesis {} (missing: {:?}, unexpected: {:?})",
                poll_id, hypothesis_id, m.missing, m.unexpected
            ),
        }
    }

    // Registered candidates first: their ids are fixed.
    let resolved: Vec<Option<&Candidate>> = results
        .iter()
        .map(|r| {
            let key = normalize(&r.candidat);
            let c = registry.resolve(&key).and_then(|cid| registry.by_id(cid));
            debug!("merge_poll: {} {:?} -> {:?}", poll_id, key, c.map(|c| &c.candidate_id));
            c
        })
        .collect();
    let mut used: HashSet<String> = HashSet::new();
    for c in resolved.iter().flatten() {
        if !used.insert(c.candidate_id.clone()) {
            return Err(MergeErrors::DuplicateCandidate {
                poll_id: poll_id.to_string(),
                candidate_id: c.candidate_id.clone(),
            });
        }
    }

    // Synthetic ids never reuse a registered id, even one absent from this poll.
    let mut taken: HashSet<String> = registry
        .candidates()
        .map(|c| c.candidate_id.clone())
        .collect();
    let mut unresolved: Vec<UnresolvedCandidate> = Vec::new();
    let mut rows: Vec<MergedRow> = Vec::with_capacity(results.len());
    for (r, c) in results.iter().zip(resolved) {
        match c {
            Some(c) => rows.push(MergedRow::new(meta, c, r)),
            None => {
                let base = synthetic_id(&r.candidat);
                let mut cid = base.clone();
                let mut suffix = 2;
                while taken.contains(&cid) {
                    cid = format!("{}{}", base, suffix);
                    suffix += 1;
                }
                taken.insert(cid.clone());
                warn!(
                    "Poll {}: candidate {:?} is not registered, using id {}",
                    poll_id, r.candidat, cid
                );
                unresolved.push(UnresolvedCandidate {
                    poll_id: poll_id.to_string(),
                    raw_name: r.candidat.clone(),
                    synthetic_id: cid.clone(),
                });
                let synthetic = Candidate::synthetic(&cid, &r.candidat);
                rows.push(MergedRow::new(meta, &synthetic, r));
            }
        }
    }

    Ok(PollMerge {
        poll_id: poll_id.to_string(),
        hypothesis_id: hypothesis_id.to_string(),
        rows,
        unresolved,
        mismatch,
        unknown_hypothesis,
    })
}

/// Finds the first (poll id, candidate id) pair that appears more than once.
pub fn find_duplicate_pair(rows: &[MergedRow]) -> Option<(String, String)> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    rows.iter()
        .find(|r| !seen.insert((r.poll_id.as_str(), r.candidate_id.as_str())))
        .map(|r| (r.poll_id.clone(), r.candidate_id.clone()))
}

/// Merges a collection of polls that are already loaded in memory.
///
/// Polls are processed in the given order. The first error stops the merge.
pub fn merge_polls(
    polls: &[(PollMetadata, Vec<PollResultRow>)],
    registry: &CandidateRegistry,
    hypotheses: &HypothesisTable,
    rules: &MergeRules,
) -> Result<MergeReport, MergeErrors> {
    info!(
        "Merging {} polls with {} candidates and {} hypotheses, rules: {:?}",
        polls.len(),
        registry.len(),
        hypotheses.len(),
        rules
    );
    let mut report = MergeReport::default();
    for (meta, results) in polls.iter() {
        if meta.poll_id.trim().is_empty() {
            continue;
        }
        report.push(merge_poll(meta, results, registry, hypotheses, rules)?);
    }
    info!(
        "Merged {} rows from {} polls ({} unresolved names, {} hypothesis mismatches)",
        report.rows.len(),
        report.polls,
        report.unresolved.len(),
        report.mismatches.len()
    );
    Ok(report)
}
