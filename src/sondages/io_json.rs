// JSON export of the merged dataset, grouped by poll.

use crate::sondages::{
    io_common::{read_raw_table, write_atomic, RawTable},
    *,
};

use csv::StringRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// A number as found in the CSV: integers stay integers.
#[derive(PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn as_f64(&self) -> f64 {
        match self {
            Numeric::Int(i) => *i as f64,
            Numeric::Float(f) => *f,
        }
    }
}

/// Parses a CSV value. Blank, unparseable and non-finite values give None.
pub fn convert_to_int_or_float(value: &str) -> Option<Numeric> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if v.contains('.') {
        v.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Numeric::Float)
    } else {
        v.parse::<i64>().ok().map(Numeric::Int)
    }
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct CandidateJson {
    pub candidate_id: String,
    pub candidat: String,
    pub complete_name: String,
    pub name: String,
    pub surname: String,
    pub parti: String,
    pub intentions: Option<Numeric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erreur_sup: Option<Numeric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erreur_inf: Option<Numeric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significant: Option<bool>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct PollJson {
    pub candidats: Vec<CandidateJson>,
    pub poll_id: String,
    pub institut: String,
    pub commanditaire: String,
    pub debut_enquete: String,
    pub fin_enquete: String,
    pub echantillon: Option<Numeric>,
    pub population: String,
    pub hypothese: String,
    pub tour: String,
    pub rolling: String,
    pub media: String,
    pub filename: String,
}

fn poll_of(table: &RawTable, rec: &StringRecord) -> PollJson {
    let get = |name: &str| table.get(rec, name).to_string();
    PollJson {
        candidats: Vec::new(),
        poll_id: get("poll_id"),
        institut: get("nom_institut"),
        commanditaire: get("commanditaire"),
        debut_enquete: get("debut_enquete"),
        fin_enquete: get("fin_enquete"),
        echantillon: convert_to_int_or_float(table.get(rec, "echantillon")),
        population: get("population"),
        hypothese: get("hypothese"),
        tour: get("tour"),
        rolling: get("rolling"),
        media: get("media"),
        filename: get("filename"),
    }
}

fn candidate_of(
    table: &RawTable,
    rec: &StringRecord,
    echantillon: Option<Numeric>,
    with_significance: bool,
) -> CandidateJson {
    let get = |name: &str| table.get(rec, name).to_string();
    let intentions = convert_to_int_or_float(table.get(rec, "intentions"));
    let sig = match (with_significance, intentions, echantillon) {
        (true, Some(i), Some(n)) => stats::significance(i.as_f64(), n.as_f64()),
        _ => None,
    };
    CandidateJson {
        candidate_id: get("candidate_id"),
        candidat: get("candidat"),
        complete_name: get("complete_name"),
        name: get("name"),
        surname: get("surname"),
        parti: get("parti"),
        intentions,
        erreur_sup: convert_to_int_or_float(table.get(rec, "erreur_sup")),
        erreur_inf: convert_to_int_or_float(table.get(rec, "erreur_inf")),
        p_value: sig.map(|s| s.p_value),
        significant: sig.map(|s| s.significant),
    }
}

/// Groups the rows of a merged table by poll, sorted by poll id.
///
/// The poll fields are taken from the first row of each poll.
pub fn table_to_json(table: &RawTable, with_significance: bool) -> SondagesResult<Vec<PollJson>> {
    table.require_columns(&["poll_id", "candidate_id"])?;
    let mut polls: BTreeMap<String, PollJson> = BTreeMap::new();
    for rec in table.records.iter() {
        let poll_id = table.get(rec, "poll_id").trim();
        if poll_id.is_empty() {
            continue;
        }
        let poll = polls
            .entry(poll_id.to_string())
            .or_insert_with(|| poll_of(table, rec));
        let c = candidate_of(table, rec, poll.echantillon, with_significance);
        poll.candidats.push(c);
    }
    Ok(polls.into_values().collect())
}

pub fn csv_to_json(path: &Path, with_significance: bool) -> SondagesResult<Vec<PollJson>> {
    let table = read_raw_table(path)?;
    table_to_json(&table, with_significance)
}

pub fn write_json(polls: &[PollJson], out: &Path) -> SondagesResult<()> {
    write_atomic(out, |file| {
        serde_json::to_writer_pretty(file, polls).context(WritingJsonSnafu {
            path: out.display().to_string(),
        })
    })
}

/// Converts a merged CSV file to JSON and returns the number of polls.
pub fn export_json(input: &Path, out: &Path, with_significance: bool) -> SondagesResult<usize> {
    let polls = csv_to_json(input, with_significance)?;
    write_json(&polls, out)?;
    info!("Exported {} polls to {}", polls.len(), out.display());
    Ok(polls.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sondages::io_common::read_raw_from;

    const MERGED: &str = "poll_id,hypothese,nom_institut,commanditaire,debut_enquete,fin_enquete,echantillon,population,rolling,media,tour,filename,candidate_id,candidat,complete_name,name,surname,parti,intentions,erreur_sup,erreur_inf
P2,H1,Elabe,BFMTV,2024-02-03,2024-02-04,1500,Inscrits,,,Premier tour,b.pdf,EZ,Éric Zemmour,Éric Zemmour,Éric,Zemmour,REC,12.5,,
P1,H1,Ifop,Le Figaro,2024-01-01,2024-01-02,1000,Inscrits,,,Premier tour,a.pdf,JM,jean martin,Jean Martin,Jean,Martin,DVG,55,0.581,0.519
P1,H1,Ifop,Le Figaro,2024-01-01,2024-01-02,1000,Inscrits,,,Premier tour,a.pdf,AD,Alice Dupont,Alice Dupont,,,,n/a,,
";

    #[test]
    fn conversions() {
        assert_eq!(convert_to_int_or_float("12"), Some(Numeric::Int(12)));
        assert_eq!(convert_to_int_or_float(" 12.5 "), Some(Numeric::Float(12.5)));
        assert_eq!(convert_to_int_or_float(""), None);
        assert_eq!(convert_to_int_or_float("  "), None);
        assert_eq!(convert_to_int_or_float("abc"), None);
        assert_eq!(convert_to_int_or_float("1e5"), None);
        assert_eq!(convert_to_int_or_float("inf."), None);
    }

    #[test]
    fn grouped_and_sorted() {
        let table = read_raw_from(MERGED.as_bytes(), "mem").unwrap();
        let polls = table_to_json(&table, false).unwrap();
        let ids: Vec<&str> = polls.iter().map(|p| p.poll_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
        assert_eq!(polls[0].candidats.len(), 2);
        assert_eq!(polls[0].candidats[0].candidate_id, "JM");
        assert_eq!(polls[0].institut, "Ifop");
        assert_eq!(polls[0].echantillon, Some(Numeric::Int(1000)));
        assert_eq!(polls[0].candidats[1].intentions, None);
    }

    #[test]
    fn json_layout() {
        let table = read_raw_from(MERGED.as_bytes(), "mem").unwrap();
        let polls = table_to_json(&table, false).unwrap();
        let js = serde_json::to_value(&polls).unwrap();
        let jm = &js[0]["candidats"][0];
        assert_eq!(jm["intentions"], serde_json::json!(55));
        assert_eq!(jm["erreur_sup"], serde_json::json!(0.581));
        assert!(jm.get("p_value").is_none());
        let ad = &js[0]["candidats"][1];
        assert!(ad["intentions"].is_null());
        assert!(ad.get("erreur_sup").is_none());

        let text = serde_json::to_string_pretty(&polls).unwrap();
        assert!(text.contains("Éric Zemmour"));
        assert!(text.starts_with("[\n  {\n    \"candidats\""));
    }

    #[test]
    fn significance_is_optional() {
        let table = read_raw_from(MERGED.as_bytes(), "mem").unwrap();
        let polls = table_to_json(&table, true).unwrap();
        let jm = &polls[0].candidats[0];
        assert_eq!(jm.significant, Some(true));
        assert!(jm.p_value.unwrap() < 0.05);
        assert_eq!(polls[0].candidats[1].p_value, None);
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("merged.csv");
        let out = dir.path().join("merged.json");
        fs::write(&input, MERGED).unwrap();
        assert_eq!(export_json(&input, &out, false).unwrap(), 2);
        let js: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(js.as_array().unwrap().len(), 2);
    }
}
