//! Kernel parameter hardening

use provision::{Action, ApplyContext, ApplyResult, Module, Result};
use regex::escape;

use crate::schema::HardeningSettings;

/// Writes sysctl directives to a drop-in file and reloads them
#[derive(Debug, Clone)]
pub struct Hardening {
    settings: HardeningSettings,
}

impl Hardening {
    pub fn new(settings: HardeningSettings) -> Self {
        Self { settings }
    }
}

/// Pattern matching an existing assignment of `key`, commented or not
fn directive_pattern(key: &str) -> String {
    format!(r"^\s*#?\s*{}\s*=", escape(key))
}

impl Module for Hardening {
    fn name(&self) -> &'static str {
        "hardening"
    }

    fn description(&self) -> String {
        format!(
            "Apply {} kernel parameter(s) via {}",
            self.settings.directives.len(),
            self.settings.sysctl_file.display()
        )
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
        let file = &self.settings.sysctl_file;

        for (key, value) in &self.settings.directives {
            ctx.run(Action::set_line(
                format!("Set {key}"),
                file,
                directive_pattern(key),
                format!("{key} = {value}"),
            ))?;
        }

        ctx.run(Action::command(
            "Reload kernel parameters",
            "sysctl",
            ["--system"],
        ))?;

        Ok(ApplyResult::Modified)
    }
}
