// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface.
//
//   slipcheck analyze ~/Downloads/payment.png --pretty
//   slipcheck report 20260301101500_a1b2c3.pdf
//   slipcheck history --limit 5
//   slipcheck history --digest 5d41402abc4b2a76b9719d911017c592

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use slipcheck_core::error::Result;
use slipcheck_core::types::Verdict;

use crate::services::analysis_service::AnalysisService;
use crate::services::data_dir;

/// Exit status for an analysis that ended with an `Error` verdict.
const ERROR_VERDICT_EXIT: u8 = 2;

/// Slipcheck - classify payment screenshots as Real or Fake
#[derive(Parser, Debug)]
#[command(name = "slipcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (default: slipcheck.json in the data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding uploads, reports and the ledger
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store and analyse a screenshot, then print the result as JSON
    Analyze {
        /// Image to analyse
        image: PathBuf,

        /// File name shown in the report (default: the image's own name)
        #[arg(long)]
        name: Option<String>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print the path of a stored report
    Report {
        /// Report file name, as it appears at the end of `report_url`
        name: String,
    },
    /// Print recent analyses as JSON
    History {
        /// Number of rows to show
        #[arg(short, long, default_value = "20")]
        limit: u32,

        /// Only analyses of uploads with this MD5 content digest
        #[arg(long)]
        digest: Option<String>,
    },
}

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<ExitCode> {
    let dir = data_dir::data_dir(cli.data_dir.as_deref())?;
    let service = AnalysisService::init(&dir, cli.config.as_deref())?;
    tracing::debug!(
        uploads = %service.config().upload_dir.display(),
        reports = %service.config().reports_dir.display(),
        "storage areas ready"
    );

    match cli.command {
        Commands::Analyze {
            image,
            name,
            pretty,
        } => {
            let response = service.submit(&image, name.as_deref())?;
            print_json(&response, pretty)?;
            Ok(if response.result == Verdict::Error {
                ExitCode::from(ERROR_VERDICT_EXIT)
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Report { name } => {
            let path = service.resolve_report(&name)?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::History { limit, digest } => {
            let entries = match digest {
                Some(digest) => service.history_for_digest(&digest)?,
                None => service.recent(limit)?,
            };
            print_json(&entries, true)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_accepts_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "slipcheck",
            "analyze",
            "slip.png",
            "--name",
            "payment.png",
            "--pretty",
            "--data-dir",
            "/tmp/sc",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/sc")));
        match cli.command {
            Commands::Analyze {
                image,
                name,
                pretty,
            } => {
                assert_eq!(image, PathBuf::from("slip.png"));
                assert_eq!(name.as_deref(), Some("payment.png"));
                assert!(pretty);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn history_limit_defaults_to_twenty() {
        let cli = Cli::try_parse_from(["slipcheck", "history"]).unwrap();
        assert!(matches!(cli.command, Commands::History { limit: 20, digest: None }));
    }

    #[test]
    fn analyze_requires_an_image() {
        assert!(Cli::try_parse_from(["slipcheck", "analyze"]).is_err());
    }

    #[test]
    fn report_of_unknown_name_fails() {
        let data = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "slipcheck",
            "--data-dir",
            data.path().to_str().unwrap(),
            "report",
            "missing.pdf",
        ])
        .unwrap();
        assert!(run(cli).is_err());
    }
}
