//! Operational account creation

use log::{info, warn};
use provision::{Action, ApplyContext, ApplyResult, Module, PackageFamily, Probe, Result};

use crate::schema::UsersSettings;

/// Creates the operational account and its `.ssh` directory.
///
/// Installing a public key is deliberately left to the operator.
#[derive(Debug, Clone)]
pub struct Users {
    settings: UsersSettings,
}

impl Users {
    pub fn new(settings: UsersSettings) -> Self {
        Self { settings }
    }

    /// Group granting administrative rights on this family, if any
    fn admin_group(&self, family: PackageFamily) -> Option<&'static str> {
        if !self.settings.admin {
            return None;
        }
        match family {
            PackageFamily::Apt => Some("sudo"),
            PackageFamily::Dnf | PackageFamily::Pacman => Some("wheel"),
            PackageFamily::Unknown => None,
        }
    }
}

impl Module for Users {
    fn name(&self) -> &'static str {
        "users"
    }

    fn description(&self) -> String {
        format!("Create operational account '{}'", self.settings.name)
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
        let name = &self.settings.name;

        if ctx.probe(&Probe::UserExists(name.clone())) {
            info!("User '{name}' already exists, nothing to do");
            return Ok(ApplyResult::NoChange);
        }

        let mut args = vec![
            "-m".to_string(),
            "-d".to_string(),
            self.settings.home_root.join(name).display().to_string(),
            "-s".to_string(),
            self.settings.shell.clone(),
        ];
        if let Some(group) = self.admin_group(ctx.profile.family) {
            args.extend(["-G".to_string(), group.to_string()]);
        }
        args.push(name.clone());
        ctx.run(Action::command(format!("Create user {name}"), "useradd", args))?;

        let ssh_dir = self.settings.ssh_dir();
        ctx.run(Action::create_dir(
            format!("Create {}", ssh_dir.display()),
            &ssh_dir,
            0o700,
        ))?;
        ctx.run(Action::command(
            format!("Give {name} ownership of {}", ssh_dir.display()),
            "chown",
            [format!("{name}:{name}"), ssh_dir.display().to_string()],
        ))?;

        warn!(
            "Install a public key for '{name}' in {}/authorized_keys \
             before disabling password logins",
            ssh_dir.display()
        );
        Ok(ApplyResult::Created)
    }
}
