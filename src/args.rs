use clap::{Parser, Subcommand};

/// Aggregates the polls of the French presidential election into a single dataset.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the layout of the dataset.
    /// Relative paths in this file are resolved against its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, optional) The root of the dataset. Setting this option overrides the
    /// rootDirectory that may be specified with the --config option.
    #[clap(long, value_parser)]
    pub root: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Merges the poll index, the poll files and the candidates into one CSV file.
    Merge {
        /// (file path) Where to write the merged dataset. Overrides outputCsv.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// Also writes the JSON export of the merged dataset.
        #[clap(long, takes_value = false)]
        json: bool,
        /// Adds the p-value of each intention to the JSON export.
        #[clap(long, takes_value = false)]
        with_significance: bool,
        /// (file path) A reference file. If provided, the merged output must be identical to it.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
        /// Fails when the candidates of a poll differ from its hypothesis.
        #[clap(long, takes_value = false)]
        strict_hypotheses: bool,
    },
    /// Converts a merged CSV file to JSON, grouped by poll.
    Export {
        /// (file path) The merged CSV file. Defaults to outputCsv.
        #[clap(short, long, value_parser)]
        input: Option<String>,
        /// (file path) The JSON file to write. Defaults to outputJson.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        #[clap(long, takes_value = false)]
        with_significance: bool,
    },
    /// Computes the confidence intervals of every poll file, in place.
    Intervals {
        /// (default 1.96) The critical value of the intervals.
        #[clap(long, value_parser)]
        z: Option<f64>,
    },
    /// Updates the poll count badge of the README.
    Badge {
        #[clap(long, value_parser)]
        readme: Option<String>,
    },
    /// Looks for new presidential polls in the catalog of the polling commission.
    CheckPolls {
        #[clap(long, value_parser)]
        catalog_url: Option<String>,
        /// Records the current count of the catalog.
        #[clap(long, takes_value = false)]
        update_count: bool,
    },
    /// Checks the integrity of the dataset.
    Check,
}
