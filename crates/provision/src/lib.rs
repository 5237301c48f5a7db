//! # Provision
//!
//! The module orchestration engine behind `hostprep`.
//!
//! ## Core Concepts
//!
//! - **DistributionProfile**: the host's distribution id and package family,
//!   resolved once from os-release
//! - **Action**: one structured, externally-mutating operation
//! - **Gateway**: the single chokepoint every action passes through; a
//!   simulating gateway makes a whole run side-effect free
//! - **Module**: an idempotent capability provider with an `apply` contract
//! - **run_all**: applies modules strictly in order, halting on the first
//!   failure
//!
//! ## Example
//!
//! ```ignore
//! use provision::{
//!     Action, ApplyContext, ApplyResult, DistroResolver, Module, NoObserver,
//!     RunOptions, run_all,
//! };
//!
//! #[derive(Debug)]
//! struct Motd;
//!
//! impl Module for Motd {
//!     fn name(&self) -> &'static str { "motd" }
//!     fn description(&self) -> String { "Set the login banner".into() }
//!
//!     fn apply(&self, ctx: &mut ApplyContext<'_>) -> provision::Result<ApplyResult> {
//!         ctx.run(Action::set_line("Banner", "/etc/motd", "^Welcome", "Welcome"))?;
//!         Ok(ApplyResult::Modified)
//!     }
//! }
//!
//! let profile = DistroResolver::default().resolve()?;
//! let mut ctx = ApplyContext::new(&RunOptions::default(), &profile, &mut gateway);
//! let summary = run_all(&["motd"], &registry, &mut ctx, &mut NoObserver)?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`Gateway`]: performs or simulates actions and answers probes
//! - [`ModuleResolver`]: maps selected names to modules
//! - [`RunObserver`]: receives progress updates

pub mod context;
pub mod distro;
pub mod error;
pub mod module;
pub mod runner;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, Gateway, GatewayExt, NoObserver, RunObserver};
pub use distro::{DistributionProfile, DistroResolver, PackageFamily};
pub use error::{Error, Result};
pub use module::{BoxedModule, Module, ModuleResolver};
pub use runner::run_all;
pub use types::{
    Action, ActionKind, ApplyResult, ExecutionResult, Probe, RunOptions, RunSummary,
};
