//! Baseline package installation

use log::warn;
use provision::{Action, ApplyContext, ApplyResult, Error, Module, PackageFamily, Probe, Result};

use crate::schema::PackagesSettings;

/// Refreshes the package index and installs the baseline toolset
#[derive(Debug, Clone)]
pub struct Packages {
    settings: PackagesSettings,
}

impl Packages {
    pub fn new(settings: PackagesSettings) -> Self {
        Self { settings }
    }

    fn list(&self, family: PackageFamily) -> &[String] {
        match family {
            PackageFamily::Apt => &self.settings.apt,
            PackageFamily::Dnf => &self.settings.dnf,
            PackageFamily::Pacman => &self.settings.pacman,
            PackageFamily::Unknown => &[],
        }
    }

    /// Index refresh followed by the install, for one family
    fn actions(&self, family: PackageFamily) -> Vec<Action> {
        let list = self.list(family);
        let mut actions = Vec::with_capacity(2);

        match family {
            PackageFamily::Apt => {
                actions.push(apt("Refresh package index", ["update"]));
                if !list.is_empty() {
                    let mut args = vec!["install".to_string(), "-y".to_string()];
                    args.extend(list.iter().cloned());
                    actions.push(apt("Install baseline packages", args));
                }
            }
            PackageFamily::Dnf => {
                actions.push(Action::command("Refresh package metadata", "dnf", ["makecache"]));
                if !list.is_empty() {
                    let mut args = vec!["install".to_string(), "-y".to_string()];
                    args.extend(list.iter().cloned());
                    actions.push(Action::command("Install baseline packages", "dnf", args));
                }
            }
            PackageFamily::Pacman => {
                actions.push(Action::command(
                    "Synchronise package databases",
                    "pacman",
                    ["-Sy", "--noconfirm"],
                ));
                if !list.is_empty() {
                    let mut args = vec![
                        "-S".to_string(),
                        "--noconfirm".to_string(),
                        "--needed".to_string(),
                    ];
                    args.extend(list.iter().cloned());
                    actions.push(Action::command("Install baseline packages", "pacman", args));
                }
            }
            PackageFamily::Unknown => {}
        }

        actions
    }
}

/// apt-get with a non-interactive frontend
fn apt<I, S>(label: &str, args: I) -> Action
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut full = vec![
        "DEBIAN_FRONTEND=noninteractive".to_string(),
        "apt-get".to_string(),
    ];
    full.extend(args.into_iter().map(Into::into));
    Action::command(label, "env", full)
}

impl Module for Packages {
    fn name(&self) -> &'static str {
        "packages"
    }

    fn description(&self) -> String {
        "Install the baseline toolset".to_string()
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
        let family = ctx.require_family(self.name())?;

        if let Some(manager) = family.manager()
            && !ctx.probe(&Probe::CommandExists(manager.to_string()))
        {
            if !ctx.is_simulation() {
                return Err(Error::ActionFailed {
                    label: "Locate package manager".to_string(),
                    output: format!("{manager} not found on PATH"),
                });
            }
            warn!("{manager} not found on PATH; a real run would fail here");
        }

        if self.list(family).is_empty() {
            warn!("No baseline packages configured for {family}; refreshing index only");
        }
        for action in self.actions(family) {
            ctx.run(action)?;
        }

        Ok(ApplyResult::Modified)
    }
}
