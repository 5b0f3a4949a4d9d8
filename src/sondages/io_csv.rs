// Readers for the input tables of the dataset.

use crate::sondages::{io_common::read_raw_table, *};

use serde::Deserialize;

pub const CANDIDATE_COLUMNS: [&str; 5] =
    ["candidate_id", "complete_name", "name", "surname", "parti"];

pub const HYPOTHESIS_COLUMNS: [&str; 2] = ["id_hypothese", "hypothese_complete"];

pub const POLL_COLUMNS: [&str; 9] = [
    "poll_id",
    "hypothese",
    "nom_institut",
    "commanditaire",
    "debut_enquete",
    "fin_enquete",
    "echantillon",
    "population",
    "tour",
];

pub const RESULT_COLUMNS: [&str; 4] = ["candidat", "intentions", "erreur_sup", "erreur_inf"];

// ******** Lines, as found in the files ********

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CandidateLine {
    candidate_id: String,
    complete_name: String,
    name: String,
    surname: String,
    parti: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct HypothesisLine {
    id_hypothese: String,
    hypothese_complete: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PollLine {
    poll_id: String,
    hypothese: String,
    nom_institut: String,
    commanditaire: String,
    debut_enquete: String,
    fin_enquete: String,
    echantillon: String,
    population: String,
    rolling: String,
    media: String,
    tour: String,
    filename: String,
    sous_echantillon1: String,
    sous_echantillon2: String,
    sous_echantillon3: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ResultLine {
    candidat: String,
    intentions: String,
    erreur_sup: String,
    erreur_inf: String,
}

fn trimmed(s: String) -> String {
    let t = s.trim();
    if t.len() == s.len() {
        s
    } else {
        t.to_string()
    }
}

pub fn read_candidates(path: &Path) -> SondagesResult<Vec<Candidate>> {
    let table = read_raw_table(path)?;
    table.require_columns(&CANDIDATE_COLUMNS)?;
    let lines: Vec<CandidateLine> = table.deserialize()?;
    let res: Vec<Candidate> = lines
        .into_iter()
        .map(|l| Candidate {
            candidate_id: trimmed(l.candidate_id),
            complete_name: trimmed(l.complete_name),
            name: trimmed(l.name),
            surname: trimmed(l.surname),
            parti: trimmed(l.parti),
        })
        .collect();
    debug!("read_candidates: {} candidates", res.len());
    Ok(res)
}

pub fn read_hypotheses(path: &Path) -> SondagesResult<Vec<HypothesisRecord>> {
    let table = read_raw_table(path)?;
    table.require_columns(&HYPOTHESIS_COLUMNS)?;
    let lines: Vec<HypothesisLine> = table.deserialize()?;
    Ok(lines
        .into_iter()
        .map(|l| HypothesisRecord {
            id_hypothese: trimmed(l.id_hypothese),
            hypothese_complete: l.hypothese_complete,
        })
        .collect())
}

/// Reads the poll index. Lines with a blank `poll_id` are dropped.
pub fn read_polls_metadata(path: &Path) -> SondagesResult<Vec<PollMetadata>> {
    let table = read_raw_table(path)?;
    table.require_columns(&POLL_COLUMNS)?;
    let lines: Vec<PollLine> = table.deserialize()?;
    let mut res: Vec<PollMetadata> = Vec::with_capacity(lines.len());
    for l in lines {
        if l.poll_id.trim().is_empty() {
            debug!("read_polls_metadata: skipping a line without poll_id");
            continue;
        }
        res.push(PollMetadata {
            poll_id: trimmed(l.poll_id),
            hypothese: trimmed(l.hypothese),
            nom_institut: l.nom_institut,
            commanditaire: l.commanditaire,
            debut_enquete: l.debut_enquete,
            fin_enquete: l.fin_enquete,
            echantillon: l.echantillon,
            population: l.population,
            rolling: l.rolling,
            media: l.media,
            tour: l.tour,
            filename: l.filename,
            sous_echantillon1: l.sous_echantillon1,
            sous_echantillon2: l.sous_echantillon2,
            sous_echantillon3: l.sous_echantillon3,
        });
    }
    Ok(res)
}

/// Reads the results of a poll. Lines with a blank `candidat` are dropped.
pub fn read_poll_results(path: &Path) -> SondagesResult<Vec<PollResultRow>> {
    ensure!(
        path.is_file(),
        MissingPollFileSnafu {
            path: path.display().to_string(),
        }
    );
    let table = read_raw_table(path)?;
    table.require_columns(&RESULT_COLUMNS)?;
    let lines: Vec<ResultLine> = table.deserialize()?;
    Ok(lines
        .into_iter()
        .filter(|l| !l.candidat.trim().is_empty())
        .map(|l| PollResultRow {
            candidat: l.candidat,
            intentions: l.intentions,
            erreur_sup: l.erreur_sup,
            erreur_inf: l.erreur_inf,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sondages::tests::write_file;

    #[test]
    fn candidates_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("candidats.csv");
        write_file(
            &p,
            "candidate_id,complete_name,name,surname,parti,extra\n EM ,Emmanuel Macron ,Emmanuel,Macron,RE,x\n",
        );
        let cands = read_candidates(&p).unwrap();
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].candidate_id, "EM");
        assert_eq!(cands[0].complete_name, "Emmanuel Macron");
    }

    #[test]
    fn optional_poll_columns() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("polls.csv");
        write_file(
            &p,
            "poll_id,hypothese,nom_institut,commanditaire,debut_enquete,fin_enquete,echantillon,population,tour\n\
             P1 , H1,Ifop,X,2024-01-01,2024-01-02,1000,Inscrits,Premier tour\n\
             ,H1,Ifop,X,2024-01-01,2024-01-02,1000,Inscrits,Premier tour\n",
        );
        let polls = read_polls_metadata(&p).unwrap();
        assert_eq!(polls.len(), 1);
        assert_eq!(polls[0].poll_id, "P1");
        assert_eq!(polls[0].hypothese, "H1");
        assert_eq!(polls[0].media, "");
        assert_eq!(polls[0].sample_size(), Some(1000.0));
    }

    #[test]
    fn results_keep_values_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("P1.csv");
        write_file(
            &p,
            "candidat,intentions,erreur_sup,erreur_inf\nJean Martin, 20.5 ,1,-1\n  ,3,,\n",
        );
        let rows = read_poll_results(&p).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].intentions, " 20.5 ");
        assert_eq!(rows[0].erreur_inf, "-1");
    }

    #[test]
    fn missing_results_file() {
        let dir = tempfile::tempdir().unwrap();
        let res = read_poll_results(&dir.path().join("absent.csv"));
        assert!(matches!(res, Err(SondagesError::MissingPollFile { .. })));
    }

    #[test]
    fn results_schema() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("P1.csv");
        write_file(&p, "candidat,intentions\nJean Martin,20\n");
        match read_poll_results(&p) {
            Err(SondagesError::Schema { missing, .. }) => {
                assert_eq!(missing, vec!["erreur_sup", "erreur_inf"])
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn hypotheses_schema() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("hypotheses.csv");
        write_file(&p, "id_hypothese,hypotheses\nH1,\"Jean Martin, Alice Dupont\"\n");
        match read_hypotheses(&p) {
            Err(SondagesError::Schema { missing, .. }) => {
                assert_eq!(missing, vec!["hypothese_complete"])
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn polls_schema() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("polls.csv");
        write_file(
            &p,
            "poll_id,hypothese,nom_institut,debut_enquete,fin_enquete,population,rolling\n\
             P1,H1,Ifop,2024-01-01,2024-01-02,Inscrits,non\n",
        );
        match read_polls_metadata(&p) {
            Err(SondagesError::Schema { path, missing }) => {
                assert_eq!(path, p.display().to_string());
                assert_eq!(missing, vec!["commanditaire", "echantillon", "tour"])
            }
            x => panic!("unexpected {:?}", x),
        }
    }
}
