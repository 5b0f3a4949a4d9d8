use crate::sondages::{io_common::write_csv_atomic, *};

/// Writes the merged dataset.
///
/// The header is always written, even when there are no rows. The file is replaced
/// in one step, a failed run leaves the previous output in place.
pub fn write_merged_csv(rows: &[MergedRow], out: &Path) -> SondagesResult<()> {
    info!("Writing {} rows to {}", rows.len(), out.display());
    write_csv_atomic(
        out,
        &MergedRow::COLUMNS,
        rows.iter().map(|r| r.values().to_vec()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(poll_id: &str, candidat: &str) -> MergedRow {
        let meta = PollMetadata {
            poll_id: poll_id.to_string(),
            hypothese: "H1".to_string(),
            nom_institut: "Ifop, Fiducial".to_string(),
            ..PollMetadata::default()
        };
        let result = PollResultRow {
            candidat: candidat.to_string(),
            intentions: "12.5".to_string(),
            ..PollResultRow::default()
        };
        MergedRow::new(&meta, &Candidate::synthetic("JM", candidat), &result)
    }

    #[test]
    fn header_only() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        write_merged_csv(&[], &out).unwrap();
        let content = fs::read_to_string(&out).unwrap();
        assert_eq!(content, format!("{}\n", MergedRow::COLUMNS.join(",")));
    }

    #[test]
    fn rows_in_order_and_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sub").join("out.csv");
        write_merged_csv(&[row("P1", "Jean Martin"), row("P2", "Jean Martin")], &out).unwrap();
        let content = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("P1,H1,\"Ifop, Fiducial\","));
        assert!(lines[2].starts_with("P2,"));

        let mut rdr = csv::Reader::from_path(&out).unwrap();
        for rec in rdr.records() {
            assert_eq!(rec.unwrap().len(), MergedRow::COLUMNS.len());
        }
    }
}
