use log::{debug, warn};

use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::normalize::normalize;

/// The registered candidates, indexed by id and by name key.
///
/// When two candidates share a name key, the first one registered keeps it.
/// Later candidates are still reachable through their other keys and their id.
#[derive(Debug, Clone, Default)]
pub struct CandidateRegistry {
    by_id: HashMap<String, Candidate>,
    by_key: HashMap<String, String>,
    // Registration order, for stable listings.
    ids: Vec<String>,
}

impl CandidateRegistry {
    /// Builds the registry. Candidates with a blank id are skipped.
    pub fn new(candidates: &[Candidate]) -> Result<CandidateRegistry, MergeErrors> {
        let mut reg = CandidateRegistry::default();
        for c in candidates.iter() {
            if c.candidate_id.is_empty() {
                debug!("CandidateRegistry: skipping candidate without id: {:?}", c);
                continue;
            }
            if reg.by_id.contains_key(&c.candidate_id) {
                return Err(MergeErrors::DuplicateCandidateId(c.candidate_id.clone()));
            }
            let keys = c.keys();
            if keys.is_empty() {
                warn!(
                    "Candidate {} has no name: it can only be referenced by id",
                    c.candidate_id
                );
            }
            for k in keys {
                match reg.by_key.get(&k) {
                    Some(prev) if *prev != c.candidate_id => {
                        debug!(
                            "CandidateRegistry: key {:?} already taken by {}, ignored for {}",
                            k, prev, c.candidate_id
                        );
                    }
                    Some(_) => {}
                    None => {
                        reg.by_key.insert(k, c.candidate_id.clone());
                    }
                }
            }
            reg.ids.push(c.candidate_id.clone());
            reg.by_id.insert(c.candidate_id.clone(), c.clone());
        }
        Ok(reg)
    }

    /// The id of the candidate registered under this name key.
    pub fn resolve(&self, name_key: &str) -> Option<&str> {
        self.by_key.get(name_key).map(|s| s.as_str())
    }

    pub fn by_id(&self, candidate_id: &str) -> Option<&Candidate> {
        self.by_id.get(candidate_id)
    }

    /// The candidates, in registration order.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.ids.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A candidate-set scenario.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Hypothesis {
    pub id: String,
    /// The name keys of the candidates, in the order of the source.
    pub members: Vec<String>,
}

impl Hypothesis {
    /// Splits a comma-separated list of names into name keys. Empty names are dropped.
    pub fn parse(id: &str, hypothese_complete: &str) -> Hypothesis {
        let members = hypothese_complete
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(normalize)
            .filter(|k| !k.is_empty())
            .collect();
        Hypothesis {
            id: id.to_string(),
            members,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HypothesisTable {
    hypotheses: HashMap<String, Hypothesis>,
}

impl HypothesisTable {
    /// Builds the table. Records with a blank id are skipped.
    pub fn new(records: &[HypothesisRecord]) -> Result<HypothesisTable, MergeErrors> {
        let mut hypotheses: HashMap<String, Hypothesis> = HashMap::new();
        for r in records.iter() {
            let id = r.id_hypothese.trim();
            if id.is_empty() {
                continue;
            }
            if hypotheses.contains_key(id) {
                return Err(MergeErrors::DuplicateHypothesisId(id.to_string()));
            }
            let h = Hypothesis::parse(id, &r.hypothese_complete);
            debug!("HypothesisTable: {} -> {:?}", id, h.members);
            hypotheses.insert(id.to_string(), h);
        }
        Ok(HypothesisTable { hypotheses })
    }

    pub fn get(&self, hypothesis_id: &str) -> Option<&Hypothesis> {
        self.hypotheses.get(hypothesis_id)
    }

    /// The name keys of a hypothesis. Unknown hypotheses have no members.
    pub fn lookup(&self, hypothesis_id: &str) -> HashSet<String> {
        self.get(hypothesis_id)
            .map(|h| h.members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, hypothesis_id: &str) -> bool {
        self.hypotheses.contains_key(hypothesis_id)
    }

    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }
}
