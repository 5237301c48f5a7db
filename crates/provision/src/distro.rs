//! Distribution detection.
//!
//! Reads an os-release style descriptor and maps the distribution id onto a
//! package-manager family. Resolution never fails on an unrecognized id: the
//! family is [`PackageFamily::Unknown`] and modules that need a concrete
//! family reject it when they run.
//!
//! # Example
//!
//! ```
//! use provision::distro::{PackageFamily, parse_os_release};
//!
//! let profile = parse_os_release("ID=ubuntu\nNAME=\"Ubuntu\"\n").unwrap();
//! assert_eq!(profile.family, PackageFamily::Apt);
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default identity file on Linux hosts.
pub const OS_RELEASE: &str = "/etc/os-release";

/// Package-management toolchain of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageFamily {
    /// Debian and derivatives (apt-get)
    Apt,
    /// Red Hat and derivatives (dnf)
    Dnf,
    /// Arch Linux (pacman)
    Pacman,
    /// Not in the lookup table
    Unknown,
}

impl PackageFamily {
    /// Map a distribution id to its family.
    ///
    /// | ID                                         | Family |
    /// |--------------------------------------------|--------|
    /// | debian, ubuntu                             | Apt    |
    /// | rhel, centos, fedora, rocky, almalinux     | Dnf    |
    /// | arch                                       | Pacman |
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "debian" | "ubuntu" => Self::Apt,
            "rhel" | "centos" | "fedora" | "rocky" | "almalinux" => Self::Dnf,
            "arch" => Self::Pacman,
            _ => Self::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Name of the package manager binary
    pub fn manager(&self) -> Option<&'static str> {
        match self {
            Self::Apt => Some("apt-get"),
            Self::Dnf => Some("dnf"),
            Self::Pacman => Some("pacman"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for PackageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Identity of the host, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionProfile {
    /// Lower-cased `ID` value
    pub id: String,
    /// `NAME` (or `PRETTY_NAME`) when present
    pub name: Option<String>,
    /// Resolved package family
    pub family: PackageFamily,
}

impl DistributionProfile {
    /// Build a profile straight from a distribution id.
    pub fn from_id(id: &str) -> Self {
        let id = id.trim().to_ascii_lowercase();
        Self {
            family: PackageFamily::from_id(&id),
            id,
            name: None,
        }
    }

    /// Name for display: `NAME` if known, else the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Resolves the [`DistributionProfile`] for this host.
#[derive(Debug, Clone)]
pub struct DistroResolver {
    os_release: PathBuf,
    override_id: Option<String>,
}

impl Default for DistroResolver {
    fn default() -> Self {
        Self::new(OS_RELEASE)
    }
}

impl DistroResolver {
    pub fn new(os_release: impl Into<PathBuf>) -> Self {
        Self {
            os_release: os_release.into(),
            override_id: None,
        }
    }

    /// Use `id` instead of reading the identity file
    pub fn with_override(mut self, id: Option<String>) -> Self {
        self.override_id = id.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn resolve(&self) -> Result<DistributionProfile> {
        if let Some(id) = &self.override_id {
            log::debug!("Distribution overridden to '{id}'");
            return Ok(DistributionProfile::from_id(id));
        }

        let content = read_identity(&self.os_release)?;
        parse_os_release(&content).ok_or_else(|| Error::Detection {
            path: self.os_release.clone(),
            reason: "no ID field".to_string(),
        })
    }
}

fn read_identity(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::Detection {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Parse os-release content. Returns `None` when there is no `ID`.
///
/// When `ID` is not in the lookup table, `ID_LIKE` entries are tried in
/// order; the profile keeps the real `ID` either way.
pub fn parse_os_release(content: &str) -> Option<DistributionProfile> {
    let id = field(content, "ID").filter(|v| !v.is_empty())?;
    let mut profile = DistributionProfile::from_id(&id);
    profile.name = field(content, "NAME").or_else(|| field(content, "PRETTY_NAME"));

    if !profile.family.is_known()
        && let Some(like) = field(content, "ID_LIKE")
    {
        profile.family = like
            .split_whitespace()
            .map(PackageFamily::from_id)
            .find(PackageFamily::is_known)
            .unwrap_or(PackageFamily::Unknown);
    }

    Some(profile)
}

/// Extract a value, handling `KEY=value`, `KEY="value"` and `KEY='value'`
fn field(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim().trim_matches('"').trim_matches('\'').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_family_table() {
        for id in ["debian", "ubuntu"] {
            assert_eq!(PackageFamily::from_id(id), PackageFamily::Apt, "{id}");
        }
        for id in ["rhel", "centos", "fedora", "rocky", "almalinux"] {
            assert_eq!(PackageFamily::from_id(id), PackageFamily::Dnf, "{id}");
        }
        assert_eq!(PackageFamily::from_id("arch"), PackageFamily::Pacman);
    }

    #[test]
    fn test_unknown_ids_do_not_fail() {
        for id in ["gentoo", "nixos", "opensuse-leap", "", "alpine"] {
            assert_eq!(PackageFamily::from_id(id), PackageFamily::Unknown, "{id}");
        }
        let profile = parse_os_release("ID=gentoo\n").unwrap();
        assert_eq!(profile.family, PackageFamily::Unknown);
        assert_eq!(profile.id, "gentoo");
    }

    #[test]
    fn test_parse_quoted_values() {
        let content = r#"
NAME="Rocky Linux"
VERSION="9.3 (Blue Onyx)"
ID="rocky"
ID_LIKE="rhel centos fedora"
"#;
        let profile = parse_os_release(content).unwrap();
        assert_eq!(profile.id, "rocky");
        assert_eq!(profile.name.as_deref(), Some("Rocky Linux"));
        assert_eq!(profile.family, PackageFamily::Dnf);
    }

    #[test]
    fn test_id_like_fallback() {
        let content = "NAME=\"Linux Mint\"\nID=linuxmint\nID_LIKE=\"ubuntu debian\"\n";
        let profile = parse_os_release(content).unwrap();
        assert_eq!(profile.id, "linuxmint");
        assert_eq!(profile.family, PackageFamily::Apt);
    }

    #[test]
    fn test_version_id_is_not_id() {
        let content = "VERSION_ID=\"12\"\nID=debian\n";
        assert_eq!(parse_os_release(content).unwrap().id, "debian");
    }

    #[test]
    fn test_missing_id() {
        assert!(parse_os_release("NAME=Something\n").is_none());
        assert!(parse_os_release("# ID=ubuntu\n").is_none());
    }

    #[test]
    fn test_resolver_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PRETTY_NAME=\"Arch Linux\"\nID=arch").unwrap();

        let profile = DistroResolver::new(file.path()).resolve().unwrap();
        assert_eq!(profile.family, PackageFamily::Pacman);
        assert_eq!(profile.display_name(), "Arch Linux");
    }

    #[test]
    fn test_resolver_missing_file_is_detection_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DistroResolver::new(dir.path().join("os-release"))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::Detection { .. }));
    }

    #[test]
    fn test_resolver_override_skips_file() {
        let profile = DistroResolver::new("/nonexistent/os-release")
            .with_override(Some("Fedora".into()))
            .resolve()
            .unwrap();
        assert_eq!(profile.id, "fedora");
        assert_eq!(profile.family, PackageFamily::Dnf);
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let err = DistroResolver::new("/nonexistent/os-release")
            .with_override(Some("  ".into()))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::Detection { .. }));
    }
}
