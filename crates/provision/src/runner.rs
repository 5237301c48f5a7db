//! Module runner - applies selected modules strictly in order

use crate::context::{ApplyContext, RunObserver};
use crate::error::Result;
use crate::module::ModuleResolver;
use crate::types::RunSummary;
use log::{info, warn};

/// Run every named module in the given order.
///
/// Unknown names are reported to the observer, logged and skipped. The first
/// module error stops the run immediately and is returned wrapped with the
/// module's name; modules already applied are not rolled back. A pending
/// interruption is checked before each module and once after the last.
pub fn run_all<S, R, O>(
    names: &[S],
    resolver: &R,
    ctx: &mut ApplyContext<'_>,
    observer: &mut O,
) -> Result<RunSummary>
where
    S: AsRef<str>,
    R: ModuleResolver + ?Sized,
    O: RunObserver + ?Sized,
{
    let total = names.len();
    let mut summary = RunSummary::default();

    for (index, name) in names.iter().enumerate() {
        let name = name.as_ref();
        ctx.check_interrupt()?;

        let Some(module) = resolver.resolve(name) else {
            warn!("Unknown module '{name}', skipping");
            observer.on_module_unknown(name);
            summary.unknown.push(name.to_string());
            continue;
        };

        info!("Running module: {} - {}", module.name(), module.description());
        observer.on_module_start(index, total, module.name());

        let result = module.apply(ctx).map_err(|e| e.in_module(module.name()))?;

        info!("Module {} finished: {}", module.name(), result);
        observer.on_module_complete(module.name(), &result);
        summary.completed.push((module.name().to_string(), result));
    }
    ctx.check_interrupt()?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Gateway, NoObserver};
    use crate::distro::DistributionProfile;
    use crate::error::Error;
    use crate::module::{BoxedModule, Module};
    use crate::types::{Action, ApplyResult, ExecutionResult, Probe, RunOptions};
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<String>>>;

    struct NullGateway;

    impl Gateway for NullGateway {
        fn execute(&mut self, _action: &Action) -> crate::Result<ExecutionResult> {
            Ok(ExecutionResult::simulated())
        }
        fn probe(&mut self, _probe: &Probe) -> bool {
            false
        }
        fn is_simulation(&self) -> bool {
            true
        }
    }

    /// Delivers a signal while answering the first lookup
    #[derive(Default)]
    struct SignalDuringLookup {
        pending: Option<i32>,
    }

    impl Gateway for SignalDuringLookup {
        fn execute(&mut self, _action: &Action) -> crate::Result<ExecutionResult> {
            Ok(ExecutionResult::success(""))
        }
        fn probe(&mut self, _probe: &Probe) -> bool {
            self.pending = Some(15);
            true
        }
        fn is_simulation(&self) -> bool {
            false
        }
        fn interrupted(&self) -> Option<i32> {
            self.pending
        }
    }

    #[derive(Debug)]
    struct FakeModule {
        name: &'static str,
        fail: bool,
        calls: CallLog,
    }

    impl Module for FakeModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> String {
            format!("fake {}", self.name)
        }

        fn apply(&self, ctx: &mut ApplyContext<'_>) -> crate::Result<ApplyResult> {
            self.calls.borrow_mut().push(self.name.to_string());
            if ctx.probe(&Probe::UserExists(self.name.to_string())) {
                return Ok(ApplyResult::NoChange);
            }
            if self.fail {
                return Err(Error::ActionFailed {
                    label: format!("{} step", self.name),
                    output: "exit status 1".into(),
                });
            }
            Ok(ApplyResult::Modified)
        }
    }

    struct FakeResolver {
        known: Vec<&'static str>,
        failing: Vec<&'static str>,
        calls: CallLog,
    }

    impl FakeResolver {
        fn new(known: &[&'static str]) -> Self {
            Self {
                known: known.to_vec(),
                failing: Vec::new(),
                calls: Rc::default(),
            }
        }

        fn failing(mut self, name: &'static str) -> Self {
            self.failing.push(name);
            self
        }
    }

    impl ModuleResolver for FakeResolver {
        fn resolve(&self, name: &str) -> Option<BoxedModule> {
            let name = self.known.iter().copied().find(|k| *k == name)?;
            Some(Box::new(FakeModule {
                name,
                fail: self.failing.contains(&name),
                calls: Rc::clone(&self.calls),
            }))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Vec<String>,
    }

    impl RunObserver for RecordingObserver {
        fn on_module_start(&mut self, index: usize, total: usize, name: &str) {
            self.events.push(format!("start {name} {}/{total}", index + 1));
        }
        fn on_module_complete(&mut self, name: &str, _result: &ApplyResult) {
            self.events.push(format!("done {name}"));
        }
        fn on_module_unknown(&mut self, name: &str) {
            self.events.push(format!("unknown {name}"));
        }
    }

    fn run(names: &[&str], resolver: &FakeResolver) -> crate::Result<RunSummary> {
        let options = RunOptions::default();
        let profile = DistributionProfile::from_id("debian");
        let mut gateway = NullGateway;
        let mut ctx = ApplyContext::new(&options, &profile, &mut gateway);
        run_all(names, resolver, &mut ctx, &mut NoObserver)
    }

    const ALL: [&str; 5] = ["packages", "users", "hardening", "ssh", "firewall"];

    #[test]
    fn test_runs_in_given_order() {
        let resolver = FakeResolver::new(&ALL);
        let summary = run(&["firewall", "packages", "users"], &resolver).unwrap();

        assert_eq!(*resolver.calls.borrow(), vec!["firewall", "packages", "users"]);
        assert_eq!(summary.module_names(), vec!["firewall", "packages", "users"]);
    }

    #[test]
    fn test_halts_on_first_failure() {
        let resolver = FakeResolver::new(&ALL).failing("users");
        let err = run(&["packages", "users", "hardening", "ssh"], &resolver).unwrap_err();

        assert_eq!(*resolver.calls.borrow(), vec!["packages", "users"]);
        assert_eq!(err.module(), Some("users"));
        assert!(matches!(err.root_cause(), Error::ActionFailed { .. }));
    }

    #[test]
    fn test_unknown_module_is_skipped() {
        let resolver = FakeResolver::new(&ALL);
        let summary = run(&["packages", "bogus", "users"], &resolver).unwrap();

        assert_eq!(*resolver.calls.borrow(), vec!["packages", "users"]);
        assert_eq!(summary.unknown, vec!["bogus"]);
    }

    #[test]
    fn test_duplicates_run_once_per_occurrence() {
        let resolver = FakeResolver::new(&ALL);
        run(&["ssh", "ssh"], &resolver).unwrap();
        assert_eq!(*resolver.calls.borrow(), vec!["ssh", "ssh"]);
    }

    #[test]
    fn test_observer_sees_every_step() {
        let resolver = FakeResolver::new(&ALL);
        let options = RunOptions::default();
        let profile = DistributionProfile::from_id("debian");
        let mut gateway = NullGateway;
        let mut ctx = ApplyContext::new(&options, &profile, &mut gateway);
        let mut observer = RecordingObserver::default();

        run_all(&["users", "nope", "ssh"], &resolver, &mut ctx, &mut observer).unwrap();

        assert_eq!(
            observer.events,
            vec![
                "start users 1/3",
                "done users",
                "unknown nope",
                "start ssh 3/3",
                "done ssh",
            ]
        );
    }

    #[test]
    fn test_signal_during_lookup_stops_next_module() {
        let resolver = FakeResolver::new(&ALL);
        let options = RunOptions::default();
        let profile = DistributionProfile::from_id("debian");
        let mut gateway = SignalDuringLookup::default();
        let mut ctx = ApplyContext::new(&options, &profile, &mut gateway);

        let err = run_all(&["users", "ssh"], &resolver, &mut ctx, &mut NoObserver).unwrap_err();

        assert!(matches!(err, Error::Interrupted { signal: 15 }));
        assert_eq!(*resolver.calls.borrow(), vec!["users"]);
    }

    #[test]
    fn test_signal_after_last_module_is_reported() {
        let resolver = FakeResolver::new(&ALL);
        let options = RunOptions::default();
        let profile = DistributionProfile::from_id("debian");
        let mut gateway = SignalDuringLookup::default();
        let mut ctx = ApplyContext::new(&options, &profile, &mut gateway);

        let err = run_all(&["users"], &resolver, &mut ctx, &mut NoObserver).unwrap_err();
        assert!(matches!(err, Error::Interrupted { signal: 15 }));
    }

    #[test]
    fn test_empty_selection_is_empty_summary() {
        let resolver = FakeResolver::new(&ALL);
        let summary = run(&[], &resolver).unwrap();
        assert!(summary.completed.is_empty());
        assert!(resolver.calls.borrow().is_empty());
    }
}
