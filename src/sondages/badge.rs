use crate::sondages::*;

use regex::Regex;

const BADGE_PATTERN: &str =
    r"!\[Sondages agrégés\]\(https://img\.shields\.io/badge/sondages_agrégés-\d+-blue\)";

fn badge(count: usize) -> String {
    format!(
        "![Sondages agrégés](https://img.shields.io/badge/sondages_agrégés-{}-blue)",
        count
    )
}

/// Number of CSV files in the polls directory.
pub fn count_polls(polls_dir: &Path) -> SondagesResult<usize> {
    let p = polls_dir.display().to_string();
    let mut count = 0;
    for entry in fs::read_dir(polls_dir).context(IoSnafu { path: p.clone() })? {
        let entry = entry.context(IoSnafu { path: p.clone() })?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |e| e == "csv") {
            count += 1;
        }
    }
    Ok(count)
}

/// Replaces the count of every badge of the text.
pub fn replace_badge(content: &str, count: usize) -> SondagesResult<String> {
    let re = whatever!(Regex::new(BADGE_PATTERN), "Invalid badge pattern");
    Ok(re.replace_all(content, badge(count).as_str()).into_owned())
}

/// Updates the badge of the README. Returns true if the file changed.
pub fn update_readme_badge(readme: &Path, count: usize) -> SondagesResult<bool> {
    let p = readme.display().to_string();
    let content = fs::read_to_string(readme).context(IoSnafu { path: p.clone() })?;
    let updated = replace_badge(&content, count)?;
    if updated == content {
        debug!("update_readme_badge: {} unchanged", p);
        return Ok(false);
    }
    fs::write(readme, updated).context(IoSnafu { path: p })?;
    Ok(true)
}

pub fn run_badge(paths: &DatasetPaths, readme: Option<&Path>) -> SondagesResult<(usize, bool)> {
    let readme = readme.unwrap_or(paths.readme.as_path());
    let count = count_polls(&paths.polls_dir)?;
    let changed = update_readme_badge(readme, count)?;
    info!("{} polls, badge changed: {}", count, changed);
    Ok((count, changed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_count() {
        let text = "# Sondages\n![Sondages agrégés](https://img.shields.io/badge/sondages_agrégés-12-blue)\nfin\n";
        let updated = replace_badge(text, 345).unwrap();
        assert!(updated.contains("sondages_agrégés-345-blue"));
        assert!(updated.ends_with("fin\n"));
        assert_eq!(replace_badge("no badge", 3).unwrap(), "no badge");
    }

    #[test]
    fn readme_update() {
        let dir = tempfile::tempdir().unwrap();
        let polls = dir.path().join("polls");
        fs::create_dir_all(&polls).unwrap();
        fs::write(polls.join("a.csv"), "").unwrap();
        fs::write(polls.join("b.csv"), "").unwrap();
        fs::write(polls.join("notes.txt"), "").unwrap();
        let readme = dir.path().join("README.md");
        fs::write(
            &readme,
            "![Sondages agrégés](https://img.shields.io/badge/sondages_agrégés-1-blue)\n",
        )
        .unwrap();

        let paths = DatasetPaths::from_root(dir.path());
        assert_eq!(run_badge(&paths, None).unwrap(), (2, true));
        assert_eq!(run_badge(&paths, None).unwrap(), (2, false));
    }

    #[test]
    fn missing_readme() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("polls")).unwrap();
        let paths = DatasetPaths::from_root(dir.path());
        assert!(run_badge(&paths, None).is_err());
    }
}
