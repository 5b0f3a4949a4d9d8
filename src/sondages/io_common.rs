// Helpers shared by the readers and writers.

use crate::sondages::*;

use csv::StringRecord;
use serde::de::DeserializeOwned;
use std::fs::File;
use tempfile::NamedTempFile;

/// A CSV file loaded in memory, with cleaned-up headers.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub path: String,
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
}

impl RawTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// The value of a column, or "" if the column or the field is absent.
    pub fn get<'a>(&self, record: &'a StringRecord, name: &str) -> &'a str {
        self.column(name)
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
    }

    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| self.column(c).is_none())
            .map(|c| c.to_string())
            .collect()
    }

    /// Fails with a schema error naming all the missing columns.
    pub fn require_columns(&self, required: &[&str]) -> SondagesResult<()> {
        let missing = self.missing_columns(required);
        ensure!(
            missing.is_empty(),
            SchemaSnafu {
                path: self.path.clone(),
                missing,
            }
        );
        Ok(())
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> SondagesResult<Vec<T>> {
        let mut res: Vec<T> = Vec::with_capacity(self.records.len());
        for record in self.records.iter() {
            let x: T = record
                .deserialize(Some(&self.headers))
                .context(CsvLineParseSnafu {
                    path: self.path.clone(),
                })?;
            res.push(x);
        }
        Ok(res)
    }
}

fn clean_headers(headers: &StringRecord) -> StringRecord {
    headers
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let h = if idx == 0 {
                h.trim_start_matches('\u{feff}')
            } else {
                h
            };
            h.trim()
        })
        .collect()
}

pub fn read_raw_from<R: std::io::Read>(reader: R, path: &str) -> SondagesResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);
    let headers = clean_headers(rdr.headers().context(OpeningCsvSnafu { path })?);
    let mut records: Vec<StringRecord> = Vec::new();
    for line in rdr.records() {
        let record = line.context(CsvLineParseSnafu { path })?;
        records.push(record);
    }
    debug!(
        "read_raw_from: {}: {} columns, {} records",
        path,
        headers.len(),
        records.len()
    );
    Ok(RawTable {
        path: path.to_string(),
        headers,
        records,
    })
}

pub fn read_raw_table(path: &Path) -> SondagesResult<RawTable> {
    let p = path.display().to_string();
    let file = File::open(path).context(IoSnafu { path: p.clone() })?;
    read_raw_from(file, &p)
}

/// Writes a file through a temporary file in the same directory, then moves it into
/// place. The destination is left untouched if `fill` fails.
pub fn write_atomic<F>(path: &Path, fill: F) -> SondagesResult<()>
where
    F: FnOnce(&mut File) -> SondagesResult<()>,
{
    let p = path.display().to_string();
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).context(IoSnafu {
        path: dir.display().to_string(),
    })?;
    let mut tmp = NamedTempFile::new_in(&dir).context(IoSnafu { path: p.clone() })?;
    fill(tmp.as_file_mut())?;
    tmp.as_file_mut()
        .sync_all()
        .context(IoSnafu { path: p.clone() })?;
    tmp.persist(path).context(PersistOutputSnafu { path: p })?;
    Ok(())
}

/// Writes a header and records as CSV, atomically.
pub fn write_csv_atomic<'a, I>(path: &Path, headers: &[&str], records: I) -> SondagesResult<()>
where
    I: IntoIterator<Item = Vec<&'a str>>,
{
    let p = path.display().to_string();
    write_atomic(path, |file| {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
        wtr.write_record(headers)
            .context(WritingCsvSnafu { path: p.clone() })?;
        for record in records {
            wtr.write_record(&record)
                .context(WritingCsvSnafu { path: p.clone() })?;
        }
        wtr.flush().context(IoSnafu { path: p.clone() })?;
        Ok(())
    })
}
