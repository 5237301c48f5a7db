//! SSH daemon lockdown

use log::warn;
use provision::{Action, ApplyContext, ApplyResult, Error, GatewayExt, Module, Probe, Result};

use crate::schema::SshSettings;

const ROOT_LOGIN_PATTERN: &str = r"^\s*#?\s*PermitRootLogin\b";
const ROOT_LOGIN_LINE: &str = "PermitRootLogin no";
/// Directives after the first `Match` line only apply inside that block
const MATCH_BLOCK_PATTERN: &str = r"^\s*Match\b";

/// Backs up the daemon configuration, disables root login and reloads
/// the daemon under whichever service name the host uses.
#[derive(Debug, Clone)]
pub struct Ssh {
    settings: SshSettings,
}

impl Ssh {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }

    fn reload_candidates(&self) -> Vec<Action> {
        self.settings
            .services
            .iter()
            .map(|service| {
                Action::command(
                    format!("Reload {service}"),
                    "systemctl",
                    ["reload", service.as_str()],
                )
            })
            .collect()
    }
}

impl Module for Ssh {
    fn name(&self) -> &'static str {
        "ssh"
    }

    fn description(&self) -> String {
        "Disable root login over SSH".to_string()
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
        let config = &self.settings.config_path;

        if !ctx.probe(&Probe::PathExists(config.clone())) {
            if !ctx.is_simulation() {
                return Err(Error::ActionFailed {
                    label: "Locate SSH daemon configuration".to_string(),
                    output: format!("{} does not exist", config.display()),
                });
            }
            warn!(
                "{} does not exist; a real run would fail here",
                config.display()
            );
        }

        ctx.run(Action::copy_file(
            format!("Back up {}", config.display()),
            config,
            &self.settings.backup_path,
        ))?;
        ctx.run(
            Action::set_line("Disable root login", config, ROOT_LOGIN_PATTERN, ROOT_LOGIN_LINE)
                .insert_before(MATCH_BLOCK_PATTERN),
        )?;
        ctx.gateway.run_first_success(self.reload_candidates())?;

        Ok(ApplyResult::Modified)
    }
}
