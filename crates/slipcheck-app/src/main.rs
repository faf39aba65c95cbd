// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Slipcheck — payment screenshot forensics
//
// Entry point. Parses the command line, initialises logging and hands off to
// the command runner.

mod cli;
mod services;

use std::process::ExitCode;

use clap::Parser;
use slipcheck_core::human_errors::humanize_error;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the JSON output.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    tracing::debug!("Slipcheck starting");

    match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, stage = e.stage(), "command failed");
            eprintln!("slipcheck: {}", humanize_error(&e));
            ExitCode::FAILURE
        }
    }
}
