// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `inspect` — builds datasets from a run config and prints samples
//   2. `scores`  — prints the soft scores for a list of answers
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, ScoresArgs};

#[derive(Parser, Debug)]
#[command(
    name = "vqa-data",
    version = "0.1.0",
    about = "Load, encode and inspect VQA datasets."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Inspect(args) => run_inspect(args),
            Commands::Scores(args)  => run_scores(args),
        }
    }
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    tracing::info!("Inspecting datasets from: {}", args.config.display());

    let report = InspectUseCase::new(args.into()).execute()?;

    println!("Dataset: {} ({} samples, {} answers)", report.dataset, report.total, report.answer_space);
    for sample in &report.samples {
        println!("{}", serde_json::to_string(sample)?);
    }
    if let Some(oracle) = &report.oracle {
        println!();
        for entry in &report.oracle_by_dataset {
            println!(
                "Oracle [{}] over {} samples: loss {:.4}, accuracy {:.4}",
                entry.dataset, entry.report.samples, entry.report.loss, entry.report.accuracy
            );
        }
        println!(
            "Oracle over {} samples: loss {:.4}, accuracy {:.4}",
            oracle.samples, oracle.loss, oracle.accuracy
        );
    }
    Ok(())
}

fn run_scores(args: ScoresArgs) -> Result<()> {
    use crate::application::scores_use_case::ScoresUseCase;

    let scored = ScoresUseCase::new(&args.vocab)?.execute(&args.answers);
    if scored.is_empty() {
        println!("No answer is in the vocabulary.");
    }
    for s in scored {
        println!("{:>8.4}  {} (id {})", s.score, s.answer, s.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::inspect_use_case::InspectConfig;
    use std::path::PathBuf;

    #[test]
    fn test_parses_scores_answers() {
        let cli = Cli::try_parse_from([
            "vqa-data", "scores", "--vocab", "a.txt", "--answers", "cat", "cat", "dog",
        ])
        .unwrap();
        let Commands::Scores(args) = cli.command else { panic!("expected scores") };
        assert_eq!(args.answers, vec!["cat", "cat", "dog"]);
    }

    #[test]
    fn test_inspect_defaults() {
        let cli = Cli::try_parse_from(["vqa-data", "inspect", "--config", "run.json"]).unwrap();
        let Commands::Inspect(args) = cli.command else { panic!("expected inspect") };
        assert_eq!((args.index, args.count), (0, 1));
        assert!(args.metrics_dir.is_none());
    }

    #[test]
    fn test_inspect_metrics_dir_reaches_config() {
        let cli = Cli::try_parse_from([
            "vqa-data", "inspect", "--config", "run.json", "--metrics-dir", "out",
        ])
        .unwrap();
        let Commands::Inspect(args) = cli.command else { panic!("expected inspect") };
        let config: InspectConfig = args.into();
        assert_eq!(config.metrics_dir, Some(PathBuf::from("out")));
    }
}
