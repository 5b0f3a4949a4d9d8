use crate::sondages::*;

use poll_merge::stats::DEFAULT_Z;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CANDIDATES_FILE: &str = "candidats.csv";
pub const DEFAULT_HYPOTHESES_FILE: &str = "hypotheses.csv";
pub const DEFAULT_POLLS_FILE: &str = "polls.csv";
pub const DEFAULT_POLLS_DIRECTORY: &str = "polls";
pub const DEFAULT_OUTPUT_CSV: &str = "presidentielle2027.csv";
pub const DEFAULT_OUTPUT_JSON: &str = "presidentielle2027.json";
pub const DEFAULT_README: &str = "README.md";
pub const DEFAULT_LAST_COUNT_FILE: &str = ".last_poll_count";

/// The optional JSON configuration of a dataset.
///
/// `rootDirectory` is relative to the configuration file, the other paths to the root.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(rename = "rootDirectory")]
    pub root_directory: Option<String>,
    #[serde(rename = "candidatesFile")]
    pub candidates_file: Option<String>,
    #[serde(rename = "hypothesesFile")]
    pub hypotheses_file: Option<String>,
    #[serde(rename = "pollsFile")]
    pub polls_file: Option<String>,
    #[serde(rename = "pollsDirectory")]
    pub polls_directory: Option<String>,
    #[serde(rename = "outputCsv")]
    pub output_csv: Option<String>,
    #[serde(rename = "outputJson")]
    pub output_json: Option<String>,
    #[serde(rename = "readmeFile")]
    pub readme_file: Option<String>,
    #[serde(rename = "catalogUrl")]
    pub catalog_url: Option<String>,
    #[serde(rename = "lastCountFile")]
    pub last_count_file: Option<String>,
    #[serde(rename = "hypothesisMismatch")]
    pub hypothesis_mismatch: Option<String>,
    pub z: Option<f64>,
}

impl DatasetConfig {
    pub fn mismatch_policy(&self) -> SondagesResult<MismatchPolicy> {
        match self.hypothesis_mismatch.as_deref().map(|s| s.trim()) {
            None | Some("warn") => Ok(MismatchPolicy::Warn),
            Some("fail") => Ok(MismatchPolicy::Fail),
            Some(x) => whatever!(
                "Unknown value for hypothesisMismatch: {:?} (expected \"warn\" or \"fail\")",
                x
            ),
        }
    }
}

/// The resolved locations of the files of a dataset.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct DatasetPaths {
    pub root: PathBuf,
    pub candidates: PathBuf,
    pub hypotheses: PathBuf,
    pub polls: PathBuf,
    pub polls_dir: PathBuf,
    pub output_csv: PathBuf,
    pub output_json: PathBuf,
    pub readme: PathBuf,
    pub last_count_file: PathBuf,
    pub catalog_url: String,
}

impl DatasetPaths {
    /// The default layout under a root directory.
    pub fn from_root(root: &Path) -> DatasetPaths {
        DatasetPaths {
            root: root.to_path_buf(),
            candidates: root.join(DEFAULT_CANDIDATES_FILE),
            hypotheses: root.join(DEFAULT_HYPOTHESES_FILE),
            polls: root.join(DEFAULT_POLLS_FILE),
            polls_dir: root.join(DEFAULT_POLLS_DIRECTORY),
            output_csv: root.join(DEFAULT_OUTPUT_CSV),
            output_json: root.join(DEFAULT_OUTPUT_JSON),
            readme: root.join(DEFAULT_README),
            last_count_file: root.join(DEFAULT_LAST_COUNT_FILE),
            catalog_url: catalog::CATALOG_URL.to_string(),
        }
    }

    /// The results file of a poll.
    pub fn poll_file(&self, poll_id: &str) -> PathBuf {
        self.polls_dir.join(format!("{}.csv", poll_id))
    }
}

/// Everything a command needs to run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub paths: DatasetPaths,
    pub rules: MergeRules,
    pub z: f64,
}

pub fn read_config(path: &Path) -> SondagesResult<DatasetConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.display().to_string(),
    })?;
    let config: DatasetConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

fn resolve_path(base: &Path, value: &Option<String>, default: &str) -> PathBuf {
    base.join(value.as_deref().unwrap_or(default))
}

/// Resolves the paths of a configuration.
///
/// Arguments:
/// * `config` the configuration, if any
/// * `config_dir` the directory of the configuration file
/// * `root_override` the root given on the command line, which wins over `rootDirectory`
pub fn resolve_paths(
    config: &DatasetConfig,
    config_dir: &Path,
    root_override: Option<&Path>,
) -> DatasetPaths {
    let root = match (root_override, config.root_directory.as_ref()) {
        (Some(r), _) => r.to_path_buf(),
        (None, Some(r)) => config_dir.join(r),
        (None, None) => config_dir.to_path_buf(),
    };
    DatasetPaths {
        candidates: resolve_path(&root, &config.candidates_file, DEFAULT_CANDIDATES_FILE),
        hypotheses: resolve_path(&root, &config.hypotheses_file, DEFAULT_HYPOTHESES_FILE),
        polls: resolve_path(&root, &config.polls_file, DEFAULT_POLLS_FILE),
        polls_dir: resolve_path(&root, &config.polls_directory, DEFAULT_POLLS_DIRECTORY),
        output_csv: resolve_path(&root, &config.output_csv, DEFAULT_OUTPUT_CSV),
        output_json: resolve_path(&root, &config.output_json, DEFAULT_OUTPUT_JSON),
        readme: resolve_path(&root, &config.readme_file, DEFAULT_README),
        last_count_file: resolve_path(&root, &config.last_count_file, DEFAULT_LAST_COUNT_FILE),
        catalog_url: config
            .catalog_url
            .clone()
            .unwrap_or_else(|| catalog::CATALOG_URL.to_string()),
        root,
    }
}

/// Builds the settings from the optional configuration file and the root given on
/// the command line.
pub fn load_settings(config_path: Option<&str>, root: Option<&str>) -> SondagesResult<Settings> {
    let (config, config_dir) = match config_path {
        Some(p) => {
            let path = Path::new(p);
            let dir = path
                .parent()
                .map(|d| d.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            (read_config(path)?, dir)
        }
        None => (DatasetConfig::default(), PathBuf::from(".")),
    };
    let paths = resolve_paths(&config, &config_dir, root.map(Path::new));
    let z = config.z.unwrap_or(DEFAULT_Z);
    if !(z.is_finite() && z > 0.0) {
        whatever!("Invalid z value in the configuration: {}", z);
    }
    let rules = MergeRules {
        hypothesis_mismatch: config.mismatch_policy()?,
    };
    info!("Dataset root: {}", paths.root.display());
    Ok(Settings { paths, rules, z })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let p = DatasetPaths::from_root(Path::new("/data"));
        assert_eq!(p.polls, PathBuf::from("/data/polls.csv"));
        assert_eq!(p.poll_file("X_1"), PathBuf::from("/data/polls/X_1.csv"));
        assert_eq!(p, resolve_paths(&DatasetConfig::default(), Path::new("/data"), None));
    }

    #[test]
    fn config_paths_are_relative() {
        let config: DatasetConfig = serde_json::from_str(
            r#"{"rootDirectory": "dataset", "pollsDirectory": "sondages", "outputCsv": "out/merged.csv"}"#,
        )
        .unwrap();
        let p = resolve_paths(&config, Path::new("/etc/conf"), None);
        assert_eq!(p.root, PathBuf::from("/etc/conf/dataset"));
        assert_eq!(p.polls_dir, PathBuf::from("/etc/conf/dataset/sondages"));
        assert_eq!(p.output_csv, PathBuf::from("/etc/conf/dataset/out/merged.csv"));

        let p = resolve_paths(&config, Path::new("/etc/conf"), Some(Path::new("/other")));
        assert_eq!(p.candidates, PathBuf::from("/other/candidats.csv"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("conf.json");
        fs::write(&conf, r#"{"hypothesisMismatch": "fail", "z": 2.576}"#).unwrap();
        let s = load_settings(conf.to_str(), None).unwrap();
        assert_eq!(s.rules.hypothesis_mismatch, MismatchPolicy::Fail);
        assert_eq!(s.z, 2.576);
        assert_eq!(s.paths.root, dir.path().to_path_buf());
    }

    #[test]
    fn bad_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("conf.json");
        fs::write(&conf, r#"{"hypothesisMismatch": "maybe"}"#).unwrap();
        assert!(load_settings(conf.to_str(), None).is_err());
        fs::write(&conf, r#"{"z": -1}"#).unwrap();
        assert!(load_settings(conf.to_str(), None).is_err());
        fs::write(&conf, "{").unwrap();
        assert!(matches!(
            load_settings(conf.to_str(), None),
            Err(SondagesError::ParsingJson { .. })
        ));
    }
}
