// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `inspect` and `scores`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::inspect_use_case::InspectConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the configured datasets and print encoded samples
    Inspect(InspectArgs),

    /// Print the soft answer scores for a list of human answers
    Scores(ScoresArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Run config JSON listing the datasets to concatenate
    #[arg(long)]
    pub config: PathBuf,

    /// First global sample index to print
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// Number of samples to print
    #[arg(long, default_value_t = 1)]
    pub count: usize,

    /// Append oracle metrics rows to <DIR>/metrics.csv
    #[arg(long, value_name = "DIR")]
    pub metrics_dir: Option<PathBuf>,
}

/// The application layer never sees clap types.
impl From<InspectArgs> for InspectConfig {
    fn from(a: InspectArgs) -> Self {
        InspectConfig {
            config_path: a.config,
            start:       a.index,
            count:       a.count,
            metrics_dir: a.metrics_dir,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScoresArgs {
    /// Answer vocabulary file, one answer per line
    #[arg(long)]
    pub vocab: PathBuf,

    /// Human answers, e.g. --answers cat --answers cat --answers dog
    #[arg(long, required = true, num_args = 1..)]
    pub answers: Vec<String>,
}
