use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ============================================================================
// Main Settings Schema
// ============================================================================

/// Domain data consumed by the modules. Every field has a default, so an
/// empty file (or no file at all) yields a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Baseline package lists per family
    #[serde(default)]
    pub packages: PackagesSettings,

    /// Operational account
    #[serde(default)]
    pub users: UsersSettings,

    /// Kernel parameters
    #[serde(default)]
    pub hardening: HardeningSettings,

    /// SSH daemon lockdown
    #[serde(default)]
    pub ssh: SshSettings,

    /// Firewall rules
    #[serde(default)]
    pub firewall: FirewallSettings,
}

impl Settings {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.users.validate()?;
        require_absolute("hardening.sysctl_file", &self.hardening.sysctl_file)?;
        require_absolute("ssh.config_path", &self.ssh.config_path)?;
        require_absolute("ssh.backup_path", &self.ssh.backup_path)?;

        if self.ssh.config_path == self.ssh.backup_path {
            bail!("ssh.backup_path must differ from ssh.config_path");
        }
        if self.ssh.services.is_empty() {
            bail!("ssh.services must name at least one service");
        }
        if self.hardening.directives.is_empty() {
            bail!("hardening.directives must not be empty");
        }
        Ok(())
    }
}

fn require_absolute(field: &str, path: &Path) -> Result<()> {
    if !path.is_absolute() {
        bail!("{field} must be an absolute path, got '{}'", path.display());
    }
    Ok(())
}

// ============================================================================
// Packages
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackagesSettings {
    #[serde(default = "default_apt_packages")]
    pub apt: Vec<String>,

    #[serde(default = "default_dnf_packages")]
    pub dnf: Vec<String>,

    #[serde(default = "default_pacman_packages")]
    pub pacman: Vec<String>,
}

impl Default for PackagesSettings {
    fn default() -> Self {
        Self {
            apt: default_apt_packages(),
            dnf: default_dnf_packages(),
            pacman: default_pacman_packages(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_apt_packages() -> Vec<String> {
    strings(&["curl", "git", "vim", "htop", "ufw", "ca-certificates"])
}

fn default_dnf_packages() -> Vec<String> {
    strings(&["curl", "git", "vim-enhanced", "firewalld", "ca-certificates"])
}

fn default_pacman_packages() -> Vec<String> {
    strings(&["curl", "git", "vim", "htop", "ca-certificates"])
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsersSettings {
    /// Account to create
    #[serde(default = "default_user")]
    pub name: String,

    /// Login shell
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Parent of home directories
    #[serde(default = "default_home_root")]
    pub home_root: PathBuf,

    /// Add the account to the distribution's admin group (sudo/wheel)
    #[serde(default = "default_true")]
    pub admin: bool,
}

impl Default for UsersSettings {
    fn default() -> Self {
        Self {
            name: default_user(),
            shell: default_shell(),
            home_root: default_home_root(),
            admin: true,
        }
    }
}

impl UsersSettings {
    fn validate(&self) -> Result<()> {
        let valid = !self.name.is_empty()
            && self.name.len() <= 32
            && !self.name.starts_with('-')
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !valid {
            bail!("users.name '{}' is not a valid account name", self.name);
        }
        require_absolute("users.home_root", &self.home_root)
    }

    /// `<home_root>/<name>/.ssh`
    pub fn ssh_dir(&self) -> PathBuf {
        self.home_root.join(&self.name).join(".ssh")
    }
}

fn default_user() -> String {
    "deploy".to_string()
}

fn default_shell() -> String {
    "/bin/bash".to_string()
}

fn default_home_root() -> PathBuf {
    PathBuf::from("/home")
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Hardening
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HardeningSettings {
    /// Drop-in file the directives are written to
    #[serde(default = "default_sysctl_file")]
    pub sysctl_file: PathBuf,

    /// Kernel parameters, key → value
    #[serde(default = "default_directives")]
    pub directives: BTreeMap<String, String>,
}

impl Default for HardeningSettings {
    fn default() -> Self {
        Self {
            sysctl_file: default_sysctl_file(),
            directives: default_directives(),
        }
    }
}

fn default_sysctl_file() -> PathBuf {
    PathBuf::from("/etc/sysctl.d/99-hostprep.conf")
}

fn default_directives() -> BTreeMap<String, String> {
    BTreeMap::from([("net.ipv4.ip_forward".to_string(), "0".to_string())])
}

// ============================================================================
// SSH
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshSettings {
    #[serde(default = "default_sshd_config")]
    pub config_path: PathBuf,

    #[serde(default = "default_sshd_backup")]
    pub backup_path: PathBuf,

    /// Service names tried in order when reloading the daemon
    #[serde(default = "default_ssh_services")]
    pub services: Vec<String>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            config_path: default_sshd_config(),
            backup_path: default_sshd_backup(),
            services: default_ssh_services(),
        }
    }
}

fn default_sshd_config() -> PathBuf {
    PathBuf::from("/etc/ssh/sshd_config")
}

fn default_sshd_backup() -> PathBuf {
    PathBuf::from("/etc/ssh/sshd_config.bak")
}

fn default_ssh_services() -> Vec<String> {
    strings(&["sshd", "ssh"])
}

// ============================================================================
// Firewall
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FirewallSettings {
    /// ufw rule allowing SSH; defaults to the family's application profile
    /// ("OpenSSH" on Debian-likes, "SSH" on Arch)
    #[serde(default)]
    pub ufw_rule: Option<String>,

    /// firewalld service name; defaults to "ssh"
    #[serde(default)]
    pub firewalld_service: Option<String>,
}
