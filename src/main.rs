// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! hydrac - compiles ESTree syntax trees into Hydra IR modules.
//!
//! ```text
//! hydrac compile main.js.json util.js.json --out-dir build
//! hydrac inspect build/main.ir
//! ```

mod cli;
mod config;
mod driver;

use clap::Parser;
use cli::{Cli, Commands, CompileArgs};
use config::Config;
use owo_colors::OwoColorize;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("hydra=debug,hydra_compiler=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hydra=info,hydra_compiler=warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = match &cli.command {
        Commands::Compile(args) => run_compile(args, &cli),
        Commands::Inspect(args) => driver::inspect(&args.file).map(|listing| {
            print!("{listing}");
            ExitCode::SUCCESS
        }),
    };
    result.unwrap_or_else(|e| {
        eprintln!("{}: {e:#}", "error".red().bold());
        ExitCode::FAILURE
    })
}

fn run_compile(args: &CompileArgs, cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply(args);

    let outcomes = driver::compile_files(&args.inputs, &config)?;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(written) => {
                let written: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
                println!(
                    "{} {} -> {}",
                    "compiled".green().bold(),
                    outcome.input.display(),
                    written.join(", ").dimmed()
                );
            }
            Err(e) => {
                failed += 1;
                let category = e
                    .downcast_ref::<hydra_compiler::Error>()
                    .map(|e| format!(" [{:?}]", e.category()))
                    .unwrap_or_default();
                eprintln!("{}{}: {e:#}", "error".red().bold(), category.yellow());
            }
        }
    }

    if failed > 0 {
        eprintln!(
            "{} {failed} of {} files failed",
            "summary:".white().bold(),
            outcomes.len()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
