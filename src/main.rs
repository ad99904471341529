mod cli;
mod console;
mod logging;

use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use colored::*;
use console::CliReporter;
use dotenv::dotenv;
use project_ingest::naming::NameVerdict;
use project_ingest::{AppConfig, IngestEngine, RunSummary};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return ExitCode::SUCCESS;
    };

    let config = match project_ingest::config::load_configuration(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Commands::Process => run_process(&config),
        Commands::Preview => run_preview(&config).map(|_| ExitCode::SUCCESS),
        Commands::PrintConfig => {
            println!("Configuration: {:#?}", config);
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn build_engine(config: &AppConfig) -> anyhow::Result<IngestEngine> {
    let compiled = config.compile().context("Invalid configuration")?;
    info!("Source: {}", compiled.source_dir.display());
    info!("Destination: {}", compiled.destination_dir.display());
    info!("Log: {}", compiled.excel_log_path.display());
    Ok(IngestEngine::new(compiled))
}

fn run_process(config: &AppConfig) -> anyhow::Result<ExitCode> {
    let engine = build_engine(config)?;
    let reporter = CliReporter::new();
    let summary = engine.run(&reporter)?;

    println!();
    println!("{}", summary.table());
    log_messages(&summary);

    if summary.has_errors() {
        info!("Processing finished with {} errors", summary.errors.len());
        println!(
            "{} {} errors",
            "Finished with".red(),
            format!("{}", summary.errors.len()).red()
        );
        Ok(ExitCode::FAILURE)
    } else {
        info!(
            "Processing complete: {} moved, {} skipped",
            summary.folders_moved, summary.folders_skipped
        );
        println!(
            "{} {} moved, {} skipped",
            "Complete:".green(),
            format!("{}", summary.folders_moved).green(),
            format!("{}", summary.folders_skipped).cyan(),
        );
        Ok(ExitCode::SUCCESS)
    }
}

/// Warnings and errors go to the log as plain text; colour is only for the
/// terminal lines printed around them.
fn log_messages(summary: &RunSummary) {
    for warning in &summary.warnings {
        warn!("{}", warning);
    }
    for err in &summary.errors {
        error!("{}", err);
    }
}

fn run_preview(config: &AppConfig) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let rules = engine.config();
    println!("Folder pattern: {}", rules.folder_pattern.as_str());
    println!("File pattern:   {}", rules.file_rules.as_str());
    println!(
        "Extensions:     {}",
        rules
            .file_rules
            .extensions()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let plans = engine.preview()?;

    if plans.is_empty() {
        println!("No subfolders found in source directory.");
    }

    for plan in &plans {
        let name = match &plan.verdict {
            NameVerdict::Valid(name) => format!("{} [{}]", name, "OK".green()),
            NameVerdict::Repaired { original, repaired } => {
                format!("{} -> {} [{}]", original, repaired, "OK".green())
            }
            NameVerdict::Unrepairable(original) => format!("{} [{}]", original, "X".red()),
        };

        if let Some(reason) = &plan.skip {
            println!("{} {} ({:?})", "skip".yellow(), name, reason);
            continue;
        }

        println!("{} {}", "move".green(), name);
        for file in &plan.files {
            let verdict = match file.verdict {
                Some(verdict) => format!("{:?}", verdict),
                None => "AlreadyFlagged".to_string(),
            };
            println!("    {:<22} {}", verdict, file.record.relative_path.display());
        }
    }

    Ok(())
}
