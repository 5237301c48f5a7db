//! Capability providers, one per selectable module
//!
//! Every provider implements [`provision::Module`] and expresses its effects
//! as actions on the gateway, so simulation mode covers all of them.

use std::fmt;
use std::str::FromStr;

use crate::schema::Settings;
use provision::{BoxedModule, ModuleResolver};

pub mod firewall;
pub mod hardening;
pub mod packages;
pub mod ssh;
pub mod users;

pub use firewall::Firewall;
pub use hardening::Hardening;
pub use packages::Packages;
pub use ssh::Ssh;
pub use users::Users;

/// The closed set of modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleId {
    Packages,
    Users,
    Hardening,
    Ssh,
    Firewall,
}

impl ModuleId {
    /// Order used by `--all`
    pub const CANONICAL: [Self; 5] = [
        Self::Packages,
        Self::Users,
        Self::Hardening,
        Self::Ssh,
        Self::Firewall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Packages => "packages",
            Self::Users => "users",
            Self::Hardening => "hardening",
            Self::Ssh => "ssh",
            Self::Firewall => "firewall",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CANONICAL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown module '{s}'"))
    }
}

/// Builds providers from the loaded settings
pub struct Registry<'a> {
    settings: &'a Settings,
}

impl<'a> Registry<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    pub fn provider(&self, id: ModuleId) -> BoxedModule {
        let s = self.settings;
        match id {
            ModuleId::Packages => Box::new(Packages::new(s.packages.clone())),
            ModuleId::Users => Box::new(Users::new(s.users.clone())),
            ModuleId::Hardening => Box::new(Hardening::new(s.hardening.clone())),
            ModuleId::Ssh => Box::new(Ssh::new(s.ssh.clone())),
            ModuleId::Firewall => Box::new(Firewall::new(s.firewall.clone())),
        }
    }
}

impl ModuleResolver for Registry<'_> {
    fn resolve(&self, name: &str) -> Option<BoxedModule> {
        name.parse::<ModuleId>().ok().map(|id| self.provider(id))
    }
}
