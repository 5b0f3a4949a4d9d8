// Detection of new presidential polls in the catalog of the polling commission notices.

use crate::sondages::{io_common::read_raw_from, *};

use serde::Deserialize;

pub const CATALOG_URL: &str = "https://raw.githubusercontent.com/MieuxVoter/sondages-commission-index/refs/heads/main/notices_catalog.csv";
pub const CATALOG_REPO_URL: &str = "https://github.com/MieuxVoter/sondages-commission-index";

/// The count assumed when no count was ever recorded.
pub const DEFAULT_LAST_COUNT: usize = 261;

const PRESIDENTIAL_CATEGORY: &str = "Pres";
const MAX_DISPLAYED: usize = 10;

#[derive(PartialEq, Eq, Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub categorie: String,
    pub filename: String,
    pub name: String,
    pub year: String,
    #[serde(rename = "pdf creation-date")]
    pub creation_date: String,
    pub url: String,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct NewPolls {
    pub last_count: usize,
    pub current_count: usize,
    /// The newest entries of the catalog, oldest first.
    pub new: Vec<CatalogEntry>,
}

/// Parses the catalog and keeps the presidential polls, in catalog order.
pub fn parse_catalog(content: &str, source: &str) -> SondagesResult<Vec<CatalogEntry>> {
    let table = read_raw_from(content.as_bytes(), source)?;
    let entries: Vec<CatalogEntry> = table.deserialize()?;
    Ok(entries
        .into_iter()
        .filter(|e| e.categorie.trim() == PRESIDENTIAL_CATEGORY)
        .collect())
}

/// The entries added since the last count. The catalog only grows at the end.
pub fn detect_new_polls(entries: &[CatalogEntry], last_count: usize) -> NewPolls {
    let current_count = entries.len();
    let new = if current_count > last_count {
        entries[last_count..].to_vec()
    } else {
        Vec::new()
    };
    NewPolls {
        last_count,
        current_count,
        new,
    }
}

pub fn fetch_catalog(url: &str) -> SondagesResult<String> {
    info!("Fetching catalog from {}", url);
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .context(CatalogSnafu { url })?;
    response.text().context(CatalogSnafu { url })
}

pub fn read_last_count(path: &Path) -> SondagesResult<usize> {
    if !path.exists() {
        return Ok(DEFAULT_LAST_COUNT);
    }
    let content = fs::read_to_string(path).context(IoSnafu {
        path: path.display().to_string(),
    })?;
    let count = whatever!(
        content.trim().parse::<usize>(),
        "Invalid poll count in {}",
        path.display()
    );
    Ok(count)
}

pub fn save_last_count(path: &Path, count: usize) -> SondagesResult<()> {
    fs::write(path, count.to_string()).context(IoSnafu {
        path: path.display().to_string(),
    })
}

pub fn print_new_polls(found: &NewPolls) {
    println!("Last recorded poll count: {}", found.last_count);
    println!("Presidential polls in catalog: {}", found.current_count);
    if found.new.is_empty() {
        println!(
            "No new polls (was {}, now {})",
            found.last_count, found.current_count
        );
        return;
    }
    println!("New polls detected: {}", found.new.len());
    for (i, e) in found.new.iter().take(MAX_DISPLAYED).enumerate() {
        println!("{}. {}", i + 1, e.name);
        println!("     Year: {}", e.year);
        println!("     Filename: {}", e.filename);
        println!("     Date: {}", e.creation_date);
        println!("     PDF URL: {}", e.url);
    }
    if found.new.len() > MAX_DISPLAYED {
        println!("... and {} more polls", found.new.len() - MAX_DISPLAYED);
    }
    println!("Catalog: {}", CATALOG_REPO_URL);
}

pub fn run_check_polls(
    paths: &DatasetPaths,
    url: Option<&str>,
    update_count: bool,
) -> SondagesResult<NewPolls> {
    let url = url.unwrap_or(paths.catalog_url.as_str());
    let last_count = read_last_count(&paths.last_count_file)?;
    let content = fetch_catalog(url)?;
    let entries = parse_catalog(&content, url)?;
    if entries.is_empty() {
        whatever!("No presidential polls found in the catalog {}", url);
    }
    let found = detect_new_polls(&entries, last_count);
    print_new_polls(&found);
    if update_count && found.current_count > found.last_count {
        save_last_count(&paths.last_count_file, found.current_count)?;
        println!(
            "Updated counter from {} to {}",
            found.last_count, found.current_count
        );
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "categorie,filename,name,year,pdf creation-date,url
Pres,a.pdf,Ifop janvier,2024,2024-01-03,https://x/a.pdf
Euro,b.pdf,Elabe europeennes,2024,2024-01-04,https://x/b.pdf
Pres,c.pdf,Elabe fevrier,2024,2024-02-05,https://x/c.pdf
 Pres ,d.pdf,Ipsos mars,2024,2024-03-01,https://x/d.pdf
";

    #[test]
    fn presidential_only() {
        let entries = parse_catalog(CATALOG, "mem").unwrap();
        let files: Vec<&str> = entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(files, vec!["a.pdf", "c.pdf", "d.pdf"]);
        assert_eq!(entries[1].creation_date, "2024-02-05");
    }

    #[test]
    fn newest_entries() {
        let entries = parse_catalog(CATALOG, "mem").unwrap();
        let found = detect_new_polls(&entries, 1);
        assert_eq!(found.current_count, 3);
        assert_eq!(found.new.len(), 2);
        assert_eq!(found.new[0].filename, "c.pdf");

        assert!(detect_new_polls(&entries, 3).new.is_empty());
        assert!(detect_new_polls(&entries, 10).new.is_empty());
    }

    #[test]
    fn last_count_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join(".last_poll_count");
        assert_eq!(read_last_count(&p).unwrap(), DEFAULT_LAST_COUNT);
        save_last_count(&p, 270).unwrap();
        assert_eq!(read_last_count(&p).unwrap(), 270);
        fs::write(&p, "abc").unwrap();
        assert!(read_last_count(&p).is_err());
    }
}
