// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use crate::normalize::normalize;

/// A registered candidate.
///
/// Candidates are loaded once from the registry and never modified. Names seen in
/// poll files that do not match any registered candidate are turned into transient
/// candidates with [Candidate::synthetic].
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    pub candidate_id: String,
    pub complete_name: String,
    pub name: String,
    pub surname: String,
    pub parti: String,
}

impl Candidate {
    /// The normalized name keys under which this candidate can be found.
    ///
    /// In order: the complete name, "name surname" and "surname name".
    /// Empty keys are dropped.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        if !self.complete_name.is_empty() {
            keys.push(normalize(&self.complete_name));
        }
        if !self.name.is_empty() || !self.surname.is_empty() {
            keys.push(normalize(&format!("{} {}", self.name, self.surname)));
            keys.push(normalize(&format!("{} {}", self.surname, self.name)));
        }
        keys.retain(|k| !k.is_empty());
        keys
    }

    /// A candidate that is not part of the registry. Only the id and the raw name are known.
    pub fn synthetic(candidate_id: &str, raw_name: &str) -> Candidate {
        Candidate {
            candidate_id: candidate_id.to_string(),
            complete_name: raw_name.to_string(),
            name: String::new(),
            surname: String::new(),
            parti: String::new(),
        }
    }
}

/// One line of the hypotheses table, before normalization.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HypothesisRecord {
    pub id_hypothese: String,
    pub hypothese_complete: String,
}

/// The metadata of a poll, as found in the poll index.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PollMetadata {
    pub poll_id: String,
    pub hypothese: String,
    pub nom_institut: String,
    pub commanditaire: String,
    pub debut_enquete: String,
    pub fin_enquete: String,
    pub echantillon: String,
    pub population: String,
    pub rolling: String,
    pub media: String,
    pub tour: String,
    pub filename: String,
    pub sous_echantillon1: String,
    pub sous_echantillon2: String,
    pub sous_echantillon3: String,
}

impl PollMetadata {
    /// The sample size that applies to the voting intentions of this poll.
    ///
    /// The sub-sample columns take precedence over the general sample size, the last
    /// sub-sample first. Blank and non-numeric values are skipped.
    pub fn sample_size(&self) -> Option<f64> {
        [
            &self.sous_echantillon3,
            &self.sous_echantillon2,
            &self.sous_echantillon1,
            &self.echantillon,
        ]
        .iter()
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .find(|n| n.is_finite() && *n > 0.0)
    }
}

/// The result of one candidate in one poll file. All the fields are kept verbatim.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PollResultRow {
    pub candidat: String,
    pub intentions: String,
    pub erreur_sup: String,
    pub erreur_inf: String,
}

// ******** Output data structures *********

/// A flattened row of the merged dataset: poll metadata, candidate and result.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MergedRow {
    pub poll_id: String,
    pub hypothese: String,
    pub nom_institut: String,
    pub commanditaire: String,
    pub debut_enquete: String,
    pub fin_enquete: String,
    pub echantillon: String,
    pub population: String,
    pub rolling: String,
    pub media: String,
    pub tour: String,
    pub filename: String,
    pub candidate_id: String,
    pub candidat: String,
    pub complete_name: String,
    pub name: String,
    pub surname: String,
    pub parti: String,
    pub intentions: String,
    pub erreur_sup: String,
    pub erreur_inf: String,
}

impl MergedRow {
    /// The columns of the merged dataset, in output order.
    pub const COLUMNS: [&'static str; 21] = [
        "poll_id",
        "hypothese",
        "nom_institut",
        "commanditaire",
        "debut_enquete",
        "fin_enquete",
        "echantillon",
        "population",
        "rolling",
        "media",
        "tour",
        "filename",
        "candidate_id",
        "candidat",
        "complete_name",
        "name",
        "surname",
        "parti",
        "intentions",
        "erreur_sup",
        "erreur_inf",
    ];

    pub fn new(meta: &PollMetadata, candidate: &Candidate, result: &PollResultRow) -> MergedRow {
        MergedRow {
            poll_id: meta.poll_id.trim().to_string(),
            hypothese: meta.hypothese.trim().to_string(),
            nom_institut: meta.nom_institut.clone(),
            commanditaire: meta.commanditaire.clone(),
            debut_enquete: meta.debut_enquete.clone(),
            fin_enquete: meta.fin_enquete.clone(),
            echantillon: meta.echantillon.clone(),
            population: meta.population.clone(),
            rolling: meta.rolling.clone(),
            media: meta.media.clone(),
            tour: meta.tour.clone(),
            filename: meta.filename.clone(),
            candidate_id: candidate.candidate_id.clone(),
            candidat: result.candidat.clone(),
            complete_name: candidate.complete_name.clone(),
            name: candidate.name.clone(),
            surname: candidate.surname.clone(),
            parti: candidate.parti.clone(),
            intentions: result.intentions.clone(),
            erreur_sup: result.erreur_sup.clone(),
            erreur_inf: result.erreur_inf.clone(),
        }
    }

    /// The values of this row, in the order of [MergedRow::COLUMNS].
    pub fn values(&self) -> [&str; 21] {
        [
            &self.poll_id,
            &self.hypothese,
            &self.nom_institut,
            &self.commanditaire,
            &self.debut_enquete,
            &self.fin_enquete,
            &self.echantillon,
            &self.population,
            &self.rolling,
            &self.media,
            &self.tour,
            &self.filename,
            &self.candidate_id,
            &self.candidat,
            &self.complete_name,
            &self.name,
            &self.surname,
            &self.parti,
            &self.intentions,
            &self.erreur_sup,
            &self.erreur_inf,
        ]
    }
}

/// The candidates of a poll that differ from its declared hypothesis.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HypothesisMismatch {
    pub poll_id: String,
    pub hypothesis_id: String,
    /// Expected by the hypothesis but absent from the poll (sorted name keys).
    pub missing: Vec<String>,
    /// Present in the poll but not expected by the hypothesis (sorted name keys).
    pub unexpected: Vec<String>,
}

/// A poll candidate that could not be found in the registry.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UnresolvedCandidate {
    pub poll_id: String,
    pub raw_name: String,
    pub synthetic_id: String,
}

/// Errors that prevent the merge from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MergeErrors {
    DuplicateCandidateId(String),
    DuplicateHypothesisId(String),
    /// The same registered candidate appears twice in one poll.
    DuplicateCandidate {
        poll_id: String,
        candidate_id: String,
    },
    HypothesisMismatch(HypothesisMismatch),
}

impl Error for MergeErrors {}

impl Display for MergeErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeErrors::DuplicateCandidateId(id) => {
                write!(f, "candidate id {} is registered more than once", id)
            }
            MergeErrors::DuplicateHypothesisId(id) => {
                write!(f, "hypothesis {} is defined more than once", id)
            }
            MergeErrors::DuplicateCandidate {
                poll_id,
                candidate_id,
            } => write!(
                f,
                "poll {} reports candidate {} more than once",
                poll_id, candidate_id
            ),
            MergeErrors::HypothesisMismatch(m) => write!(
                f,
                "poll {} candidates differ from hypothesis {} (missing: {:?}, unexpected: {:?})",
                m.poll_id, m.hypothesis_id, m.missing, m.unexpected
            ),
        }
    }
}

// ********* Configuration **********

/// What to do when the candidates of a poll differ from its declared hypothesis.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MismatchPolicy {
    /// Log a warning and keep merging.
    Warn,
    /// Abort the merge.
    Fail,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MergeRules {
    pub hypothesis_mismatch: MismatchPolicy,
}

impl MergeRules {
    pub const DEFAULT_RULES: MergeRules = MergeRules {
        hypothesis_mismatch: MismatchPolicy::Warn,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jean_martin() -> Candidate {
        Candidate {
            candidate_id: "JM".to_string(),
            complete_name: "Jean Martin".to_string(),
            name: "Jean".to_string(),
            surname: "Martin".to_string(),
            parti: "DVG".to_string(),
        }
    }

    #[test]
    fn keys_cover_both_name_orders() {
        assert_eq!(
            jean_martin().keys(),
            vec!["jean martin", "jean martin", "martin jean"]
        );
    }

    #[test]
    fn keys_skip_empty_parts() {
        let c = Candidate {
            complete_name: String::new(),
            name: String::new(),
            surname: "Lassalle".to_string(),
            ..jean_martin()
        };
        assert_eq!(c.keys(), vec!["lassalle", "lassalle"]);

        let nameless = Candidate::synthetic("XX", "");
        assert!(nameless.keys().is_empty());
    }

    #[test]
    fn sample_size_prefers_last_sub_sample() {
        let meta = PollMetadata {
            echantillon: "1500".to_string(),
            sous_echantillon1: "1200".to_string(),
            sous_echantillon2: " ".to_string(),
            sous_echantillon3: "n/a".to_string(),
            ..PollMetadata::default()
        };
        assert_eq!(meta.sample_size(), Some(1200.0));

        let meta = PollMetadata {
            echantillon: "1500".to_string(),
            ..PollMetadata::default()
        };
        assert_eq!(meta.sample_size(), Some(1500.0));
        assert_eq!(PollMetadata::default().sample_size(), None);
    }

    #[test]
    fn merged_row_values_follow_columns() {
        let meta = PollMetadata {
            poll_id: " 20240101_0102_if_A ".to_string(),
            hypothese: "H1".to_string(),
            ..PollMetadata::default()
        };
        let result = PollResultRow {
            candidat: "jean   martin".to_string(),
            intentions: "21".to_string(),
            ..PollResultRow::default()
        };
        let row = MergedRow::new(&meta, &jean_martin(), &result);
        let values = row.values();
        let idx = |c: &str| MergedRow::COLUMNS.iter().position(|x| *x == c).unwrap();
        assert_eq!(values[idx("poll_id")], "20240101_0102_if_A");
        assert_eq!(values[idx("candidate_id")], "JM");
        assert_eq!(values[idx("candidat")], "jean   martin");
        assert_eq!(values[idx("complete_name")], "Jean Martin");
        assert_eq!(values[idx("intentions")], "21");
    }
}
