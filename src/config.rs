use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::modules::ModuleId;
use crate::schema::Settings;
use provision::RunOptions;

/// Default run log, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "logs/hostprep.log";

/// Settings file consulted when `--config` is not given
pub const SYSTEM_CONFIG: &str = "/etc/hostprep/config.toml";

/// Everything decided on the command line. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub dry_run: bool,
    pub verbose: bool,
    pub force: bool,
    /// Module names in execution order, first occurrence kept
    pub selected_modules: Vec<String>,
    pub log_destination: PathBuf,
    pub config_path: Option<PathBuf>,
    pub os_release: PathBuf,
    pub distro_override: Option<String>,
}

impl RunConfiguration {
    pub fn from_cli(cli: Cli) -> Self {
        let selected_modules = if cli.all {
            ModuleId::CANONICAL
                .iter()
                .map(|id| id.as_str().to_string())
                .collect()
        } else {
            normalize_selection(&cli.modules)
        };

        Self {
            dry_run: cli.dry_run,
            verbose: cli.verbose,
            force: cli.force,
            selected_modules,
            log_destination: cli.log_file,
            config_path: cli.config,
            os_release: cli.os_release,
            distro_override: cli.distro,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            verbose: self.verbose,
            force: self.force,
        }
    }
}

/// Trim, lower-case, drop empties and repeated names (first position wins).
/// Unknown names are kept so the runner can report them.
fn normalize_selection(raw: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() || selected.contains(&name) {
            continue;
        }
        selected.push(name);
    }
    selected
}

/// Load module settings.
///
/// An explicit path must exist. Without one, the system file is used when
/// present and built-in defaults otherwise.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let system = PathBuf::from(SYSTEM_CONFIG);
            if !system.exists() {
                log::debug!("No settings file at {SYSTEM_CONFIG}, using defaults");
                return Ok(Settings::default());
            }
            system
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Could not read settings file: {}", path.display()))?;
    let settings: Settings = toml::from_str(&content)
        .with_context(|| format!("Invalid TOML in settings file: {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;

    log::info!("Loaded settings from {}", path.display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> RunConfiguration {
        let mut argv = vec!["hostprep"];
        argv.extend_from_slice(args);
        RunConfiguration::from_cli(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_all_selects_canonical_order() {
        let config = parse(&["--all"]);
        assert_eq!(
            config.selected_modules,
            vec!["packages", "users", "hardening", "ssh", "firewall"]
        );
    }

    #[test]
    fn test_all_wins_over_modules() {
        let config = parse(&["--all", "--modules=ssh"]);
        assert_eq!(config.selected_modules.len(), 5);
    }

    #[test]
    fn test_selection_keeps_order_and_unknowns() {
        let config = parse(&["--modules=Firewall, packages,,bogus,users,packages"]);
        assert_eq!(
            config.selected_modules,
            vec!["firewall", "packages", "bogus", "users"]
        );
    }

    #[test]
    fn test_no_selection_is_empty() {
        let config = parse(&["--dry-run"]);
        assert!(config.selected_modules.is_empty());
        assert!(config.run_options().dry_run);
    }

    #[test]
    fn test_load_explicit_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[users]\nname = \"ops\"\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.users.name, "ops");
    }

    #[test]
    fn test_missing_explicit_settings_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ssh]\nservices = []\n").unwrap();
        assert!(load_settings(Some(&path)).is_err());
    }
}
