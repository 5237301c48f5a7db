//! Apply context and provider traits
//!
//! These traits keep the engine independent of how effects are performed
//! and how progress is shown. The binary supplies a gateway that runs real
//! commands; tests supply fakes.

use crate::distro::{DistributionProfile, PackageFamily};
use crate::error::{Error, Result};
use crate::types::{Action, ApplyResult, ExecutionResult, Probe, RunOptions};

/// The single mediation point for externally-mutating actions.
///
/// Modules never touch the host directly: every effect is an [`Action`]
/// handed to `execute`. In simulation mode an implementation must record the
/// action and return [`ExecutionResult::simulated`] without performing it.
pub trait Gateway {
    /// Perform (or simulate) an action.
    ///
    /// A failed effect is an `Ok` result with `succeeded == false`. `Err` is
    /// reserved for conditions that end the run regardless of the action,
    /// such as an interruption signal.
    fn execute(&mut self, action: &Action) -> Result<ExecutionResult>;

    /// Answer a read-only question about the host. Runs in every mode.
    fn probe(&mut self, probe: &Probe) -> bool;

    /// Whether actions are being simulated
    fn is_simulation(&self) -> bool;

    /// Signal number if the run has been interrupted
    fn interrupted(&self) -> Option<i32> {
        None
    }
}

/// Convenience methods on top of [`Gateway`]
pub trait GatewayExt: Gateway {
    /// Execute an action and turn a failed result into [`Error::ActionFailed`]
    fn run(&mut self, action: Action) -> Result<ExecutionResult> {
        let result = self.execute(&action)?;
        if result.succeeded {
            Ok(result)
        } else {
            Err(Error::ActionFailed {
                label: action.label,
                output: result.output.trim().to_string(),
            })
        }
    }

    /// Try each action in turn until one succeeds.
    ///
    /// Returns the failure of the last candidate when none succeed.
    fn run_first_success(&mut self, candidates: Vec<Action>) -> Result<ExecutionResult> {
        let mut last = None;
        for action in candidates {
            let result = self.execute(&action)?;
            if result.succeeded {
                return Ok(result);
            }
            log::debug!("'{}' failed, trying next candidate", action.label);
            last = Some((action.label, result.output));
        }

        let (label, output) =
            last.unwrap_or_else(|| ("(no candidates)".to_string(), String::new()));
        Err(Error::ActionFailed {
            label,
            output: output.trim().to_string(),
        })
    }
}

impl<G: Gateway + ?Sized> GatewayExt for G {}

/// Progress callback for a run
///
/// Implement this trait to receive progress updates while modules run.
pub trait RunObserver {
    /// Called before a module's `apply` (index is zero-based)
    fn on_module_start(&mut self, index: usize, total: usize, name: &str);

    /// Called after a module's `apply` succeeded
    fn on_module_complete(&mut self, name: &str, result: &ApplyResult);

    /// Called when a name does not resolve to a module
    fn on_module_unknown(&mut self, name: &str);
}

/// No-op observer
pub struct NoObserver;

impl RunObserver for NoObserver {
    fn on_module_start(&mut self, _index: usize, _total: usize, _name: &str) {}
    fn on_module_complete(&mut self, _name: &str, _result: &ApplyResult) {}
    fn on_module_unknown(&mut self, _name: &str) {}
}

/// Context passed to module apply operations
pub struct ApplyContext<'a> {
    /// Run flags
    pub options: &'a RunOptions,
    /// Resolved host identity
    pub profile: &'a DistributionProfile,
    /// Where every effect goes
    pub gateway: &'a mut dyn Gateway,
}

impl<'a> ApplyContext<'a> {
    pub fn new(
        options: &'a RunOptions,
        profile: &'a DistributionProfile,
        gateway: &'a mut dyn Gateway,
    ) -> Self {
        Self {
            options,
            profile,
            gateway,
        }
    }

    /// Get the package family, or error if the distribution is unrecognized
    pub fn require_family(&self, module: &str) -> Result<PackageFamily> {
        match self.profile.family {
            PackageFamily::Unknown => Err(Error::UnsupportedFamily {
                module: module.to_string(),
                distro: self.profile.id.clone(),
            }),
            family => Ok(family),
        }
    }

    /// Execute an action, failing on an unsuccessful result
    pub fn run(&mut self, action: Action) -> Result<ExecutionResult> {
        self.gateway.run(action)
    }

    pub fn probe(&mut self, probe: &Probe) -> bool {
        self.gateway.probe(probe)
    }

    pub fn is_simulation(&self) -> bool {
        self.gateway.is_simulation()
    }

    /// Fail with [`Error::Interrupted`] if a signal is pending
    pub fn check_interrupt(&self) -> Result<()> {
        match self.gateway.interrupted() {
            Some(signal) => Err(Error::Interrupted { signal }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Gateway whose `Run` actions succeed only for listed programs
    struct ScriptedGateway {
        succeed: Vec<&'static str>,
        seen: Vec<String>,
    }

    impl Gateway for ScriptedGateway {
        fn execute(&mut self, action: &Action) -> Result<ExecutionResult> {
            let program = action.program().unwrap_or_default().to_string();
            self.seen.push(action.label.clone());
            if self.succeed.contains(&program.as_str()) {
                Ok(ExecutionResult::success("ok"))
            } else {
                Ok(ExecutionResult::failure(format!("{program}: not found\n")))
            }
        }

        fn probe(&mut self, _probe: &Probe) -> bool {
            false
        }

        fn is_simulation(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_run_turns_failure_into_error() {
        let mut gw = ScriptedGateway {
            succeed: vec![],
            seen: vec![],
        };
        let err = gw
            .run(Action::command("Reload sysctl", "sysctl", ["--system"]))
            .unwrap_err();
        match err {
            Error::ActionFailed { label, output } => {
                assert_eq!(label, "Reload sysctl");
                assert_eq!(output, "sysctl: not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_run_first_success_falls_back() {
        let mut gw = ScriptedGateway {
            succeed: vec!["second"],
            seen: vec![],
        };
        let result = gw
            .run_first_success(vec![
                Action::command("first", "first", Vec::<String>::new()),
                Action::command("second", "second", Vec::<String>::new()),
                Action::command("third", "third", Vec::<String>::new()),
            ])
            .unwrap();
        assert!(result.succeeded);
        assert_eq!(gw.seen, vec!["first", "second"]);
    }

    #[test]
    fn test_run_first_success_reports_last_failure() {
        let mut gw = ScriptedGateway {
            succeed: vec![],
            seen: vec![],
        };
        let err = gw
            .run_first_success(vec![
                Action::command("reload sshd", "a", Vec::<String>::new()),
                Action::command("reload ssh", "b", Vec::<String>::new()),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::ActionFailed { ref label, .. } if label == "reload ssh"));
    }

    #[test]
    fn test_require_family_rejects_unknown() {
        let mut gw = ScriptedGateway {
            succeed: vec![],
            seen: vec![],
        };
        let options = RunOptions::default();
        let profile = DistributionProfile::from_id("gentoo");
        let ctx = ApplyContext::new(&options, &profile, &mut gw);
        let err = ctx.require_family("packages").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFamily { ref distro, .. } if distro == "gentoo"));
    }
}
