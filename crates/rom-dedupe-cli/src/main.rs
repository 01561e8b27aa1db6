mod commands;
mod logging;
mod progress;
mod report;

use std::io::{self, Write};
use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, Verbosity};
use dotenv::dotenv;
use progress::CliReporter;
use report::Detail;
use rom_dedupe_core::config::load_configuration;
use rom_dedupe_core::{ApplyOptions, DedupeEngine, OnConflict};
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let args = Cli::parse();
    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return;
    };

    let _guard = logging::init_logger(args.debug, command.verbosity().quiet);

    let result = match command {
        Commands::Scan {
            path,
            verbosity,
            config,
            csv,
        } => run_scan(
            &path,
            config.as_deref(),
            csv.as_deref(),
            detail(verbosity, args.debug),
        ),
        Commands::Apply {
            path,
            hard,
            yes,
            skip_uncertain,
            verbosity,
            config,
        } => run_apply(
            &path,
            config.as_deref(),
            ApplyOptions {
                hard,
                skip_uncertain,
            },
            yes,
            verbosity,
        ),
        Commands::Restore {
            path,
            on_conflict,
            verbosity,
        } => run_restore(&path, on_conflict.into(), verbosity),
        Commands::PrintConfig { path, config } => run_print_config(&path, config.as_deref()),
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn detail(verbosity: Verbosity, debug: bool) -> Detail {
    if verbosity.quiet {
        Detail::Summary
    } else if debug {
        Detail::Debug
    } else {
        Detail::Groups
    }
}

fn build_engine(path: &Path, config_path: Option<&Path>) -> Result<DedupeEngine> {
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    let config = load_configuration(path, config_path)
        .with_context(|| format!("loading configuration for {}", path.display()))?;
    Ok(DedupeEngine::new(path, config))
}

fn run_scan(
    path: &Path,
    config_path: Option<&Path>,
    csv_path: Option<&Path>,
    detail: Detail,
) -> Result<()> {
    let engine = build_engine(path, config_path)?;
    let report = engine.dry_run()?;

    print!("{}", report::format_report(&report, detail, engine.policy()));
    info!(
        "Scan: {}",
        format!("{:.2}s", report.scan_duration.as_secs_f64()).green()
    );

    if let Some(csv_path) = csv_path {
        report::write_csv(&report, path, csv_path)
            .with_context(|| format!("writing {}", csv_path.display()))?;
        info!("Wrote {}", csv_path.display());
    }
    Ok(())
}

fn run_apply(
    path: &Path,
    config_path: Option<&Path>,
    options: ApplyOptions,
    yes: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let engine = build_engine(path, config_path)?;
    let report = engine.dry_run()?;
    if report.groups.is_empty() {
        println!("{}", "No duplicates found".green());
        return Ok(());
    }

    if options.hard && !yes {
        let prompt = format!(
            "Send {} file(s) to the trash? This cannot be undone with restore.",
            report.total_to_remove
        );
        if !prompt_confirm(&prompt, Some(false))? {
            warn!("Aborted, nothing removed");
            return Ok(());
        }
    }

    let reporter = CliReporter::new(verbosity.quiet);
    let outcome = engine.apply(&report, options, &reporter)?;

    if verbosity.verbose {
        for removed in &outcome.removed {
            println!(
                "{} {}",
                "Removed:".dimmed(),
                report::display_relative(path, removed)
            );
        }
    }
    if outcome.skipped_groups > 0 {
        println!(
            "Skipped {} uncertain group(s)",
            outcome.skipped_groups.to_string().yellow()
        );
    }
    println!(
        "{}",
        format!(
            "Removed {} duplicate(s), {} saved",
            outcome.files,
            report::format_bytes(outcome.bytes)
        )
        .green()
    );
    Ok(())
}

fn run_restore(path: &Path, on_conflict: OnConflict, verbosity: Verbosity) -> Result<()> {
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    let engine = DedupeEngine::new(path, Default::default());
    let reporter = CliReporter::new(verbosity.quiet);
    let outcome = engine.restore(on_conflict, &reporter)?;

    println!(
        "{}",
        format!("Restored {} file(s)", outcome.restored).green()
    );
    if outcome.discarded > 0 {
        println!("Discarded {} staged file(s)", outcome.discarded);
    }
    if outcome.unresolved() > 0 {
        println!(
            "{}",
            format!(
                "{} record(s) left in the manifest: {} conflict(s), {} missing, {} rejected",
                outcome.unresolved(),
                outcome.conflicts,
                outcome.missing,
                outcome.rejected
            )
            .yellow()
        );
    }
    Ok(())
}

fn run_print_config(path: &Path, config_path: Option<&Path>) -> Result<()> {
    let engine = build_engine(path, config_path)?;
    println!("Configuration: {:#?}", engine.config());
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
