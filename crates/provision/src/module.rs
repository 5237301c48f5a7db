//! Module trait for capability providers
//!
//! A Module is one independently selectable configuration step. It owns
//! its domain data (package lists, paths, account names) and expresses its
//! effects as actions on the gateway in the [`ApplyContext`].

use crate::context::ApplyContext;
use crate::error::Result;
use crate::types::ApplyResult;
use std::fmt;

/// Core trait for capability providers
///
/// Implementations must be idempotent: applying twice leaves the host in the
/// same state as applying once, and the second run should report
/// [`ApplyResult::NoChange`] where it can tell.
pub trait Module: fmt::Debug {
    /// Stable name used for selection (e.g. "packages")
    fn name(&self) -> &'static str;

    /// Human-readable description of what this module does
    fn description(&self) -> String;

    /// Bring the host to the module's desired state
    ///
    /// Every action goes through `ctx.gateway`. Any error aborts the run.
    fn apply(&self, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult>;
}

/// A boxed module for type-erased storage
pub type BoxedModule = Box<dyn Module>;

/// Maps user-supplied names to modules
pub trait ModuleResolver {
    /// Resolve a name, or `None` if it is not a known module
    fn resolve(&self, name: &str) -> Option<BoxedModule>;
}
