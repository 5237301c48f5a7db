//! Host firewall setup

use provision::{Action, ApplyContext, ApplyResult, Module, PackageFamily, Result};

use crate::schema::FirewallSettings;

/// Opens SSH and enables the family's firewall
#[derive(Debug, Clone)]
pub struct Firewall {
    settings: FirewallSettings,
}

impl Firewall {
    pub fn new(settings: FirewallSettings) -> Self {
        Self { settings }
    }

    fn ufw_rule(&self, default: &str) -> String {
        self.settings
            .ufw_rule
            .clone()
            .unwrap_or_else(|| default.to_string())
    }

    fn actions(&self, family: PackageFamily) -> Vec<Action> {
        match family {
            PackageFamily::Apt => {
                let rule = self.ufw_rule("OpenSSH");
                vec![
                    Action::command(format!("Allow {rule}"), "ufw", ["allow", rule.as_str()]),
                    Action::command("Enable ufw", "ufw", ["--force", "enable"]),
                ]
            }
            PackageFamily::Dnf => {
                let service = self.settings.firewalld_service.as_deref().unwrap_or("ssh");
                vec![
                    Action::command(
                        "Enable firewalld",
                        "systemctl",
                        ["enable", "--now", "firewalld"],
                    ),
                    Action::command(
                        format!("Open {service} service"),
                        "firewall-cmd",
                        ["--permanent".to_string(), format!("--add-service={service}")],
                    ),
                    Action::command("Reload firewalld", "firewall-cmd", ["--reload"]),
                ]
            }
            PackageFamily::Pacman => {
                let rule = self.ufw_rule("SSH");
                vec![
                    Action::command(
                        "Install ufw",
                        "pacman",
                        ["-S", "--noconfirm", "--needed", "ufw"],
                    ),
                    Action::command(format!("Allow {rule}"), "ufw", ["allow", rule.as_str()]),
                    Action::command("Enable ufw", "ufw", ["--force", "enable"]),
                ]
            }
            PackageFamily::Unknown => Vec::new(),
        }
    }
}

impl Module for Firewall {
    fn name(&self) -> &'static str {
        "firewall"
    }

    fn description(&self) -> String {
        "Allow SSH and enable the firewall".to_string()
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
        let family = ctx.require_family(self.name())?;
        for action in self.actions(family) {
            ctx.run(action)?;
        }
        Ok(ApplyResult::Modified)
    }
}
