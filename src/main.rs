mod cli;
mod config;
mod gateway;
mod logging;
mod modules;
mod orchestrator;
mod privilege;
mod runner;
mod schema;
mod signal;
mod ui;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cli::Cli;
use config::RunConfiguration;
use gateway::SystemGateway;
use privilege::Privilege;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            // Flags were not parsed, so the log goes to its default location
            let _ = logging::init(Path::new(config::DEFAULT_LOG_FILE), false);
            log::error!("{}", usage_message(&e));
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let config = RunConfiguration::from_cli(cli);
    if let Err(e) = logging::init(&config.log_destination, config.verbose) {
        ui::warn(&format!("{e:#}"));
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ui::error(&format!("{e:#}"));
            if let Some(provision::Error::Usage(_)) = e.downcast_ref::<provision::Error>() {
                println!();
                let _ = Cli::command().print_help();
            }
            ExitCode::FAILURE
        }
    }
}

/// First meaningful line of a clap error, without usage or help hints
fn usage_message(e: &clap::Error) -> String {
    e.to_string()
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("invalid command line")
        .to_string()
}

fn run(config: &RunConfiguration) -> Result<()> {
    log::info!(
        "hostprep {} starting (dry_run={}, verbose={}, force={})",
        env!("CARGO_PKG_VERSION"),
        config.dry_run,
        config.verbose,
        config.force
    );

    let settings = config::load_settings(config.config_path.as_deref())?;
    signal::install()?;

    let mut gateway = SystemGateway::new(config.dry_run, config.verbose);
    let mut observer = ui::StepObserver;

    if config.dry_run {
        ui::info("Dry run: no changes will be made");
    }

    let outcome = orchestrator::run(
        config,
        &settings,
        Privilege::current(),
        &mut gateway,
        &mut observer,
    )?;

    let stats = gateway.stats();
    log::debug!(
        "Gateway totals: {} performed, {} simulated, {} probes",
        stats.performed,
        stats.simulated,
        stats.probes
    );
    ui::header("Host");
    ui::kv("Distribution", outcome.profile.display_name());
    ui::kv("Package family", &outcome.profile.family.to_string());
    ui::kv("Log", &config.log_destination.display().to_string());
    ui::print_summary(
        &outcome.summary,
        stats.performed,
        stats.simulated,
        config.dry_run,
    );

    Ok(())
}
