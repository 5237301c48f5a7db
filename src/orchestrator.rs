//! Top-level run: selection, privilege, detection, then the module runner

use log::info;
use provision::{
    ApplyContext, DistributionProfile, DistroResolver, Error, Gateway, Result, RunObserver,
    RunSummary, run_all,
};

use crate::config::RunConfiguration;
use crate::modules::Registry;
use crate::privilege::Privilege;
use crate::schema::Settings;

/// What a finished run produced
#[derive(Debug)]
pub struct Outcome {
    pub profile: DistributionProfile,
    pub summary: RunSummary,
}

/// Run the selected modules against `gateway`.
///
/// Nothing is executed unless a module is selected and the process is
/// privileged; both are checked before the distribution is detected.
pub fn run(
    config: &RunConfiguration,
    settings: &Settings,
    privilege: Privilege,
    gateway: &mut dyn Gateway,
    observer: &mut dyn RunObserver,
) -> Result<Outcome> {
    if config.selected_modules.is_empty() {
        return Err(Error::Usage(
            "no modules selected; pass --modules=<ids> or --all".to_string(),
        ));
    }
    privilege.require_root()?;

    let profile = DistroResolver::new(&config.os_release)
        .with_override(config.distro_override.clone())
        .resolve()?;
    info!(
        "Detected distribution: {} (package family: {})",
        profile.display_name(),
        profile.family
    );

    let options = config.run_options();
    info!(
        "Run mode: {}; force={}; modules: {}",
        if options.dry_run { "dry-run" } else { "apply" },
        options.force,
        config.selected_modules.join(",")
    );

    let registry = Registry::new(settings);
    let mut ctx = ApplyContext::new(&options, &profile, gateway);
    let summary = run_all(&config.selected_modules, &registry, &mut ctx, observer)?;

    info!(
        "Provisioning complete; log written to {}",
        config.log_destination.display()
    );
    Ok(Outcome { profile, summary })
}
