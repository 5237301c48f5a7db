//! Administrative privilege check
//!
//! Every module mutates system state, so the whole run requires an
//! effective uid of 0. The check happens once, before any module executes.

use provision::{Error, Result};

/// Privilege state of the current process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Privilege {
    euid: u32,
}

impl Privilege {
    /// Read the effective uid of this process
    pub fn current() -> Self {
        #[allow(unsafe_code)]
        // SAFETY: geteuid has no preconditions and cannot fail
        let euid = unsafe { libc::geteuid() };
        Self { euid }
    }

    pub fn from_euid(euid: u32) -> Self {
        Self { euid }
    }

    pub fn is_root(&self) -> bool {
        self.euid == 0
    }

    /// Fail with a privilege error unless running as root
    pub fn require_root(&self) -> Result<()> {
        if self.is_root() {
            Ok(())
        } else {
            Err(Error::Privilege { euid: self.euid })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_passes() {
        assert!(Privilege::from_euid(0).require_root().is_ok());
    }

    #[test]
    fn test_non_root_is_privilege_error() {
        let err = Privilege::from_euid(1000).require_root().unwrap_err();
        assert!(matches!(err, Error::Privilege { euid: 1000 }));
        assert_eq!(err.to_string(), "must be run as root (effective uid is 1000)");
    }

    #[test]
    fn test_current_matches_libc() {
        #[allow(unsafe_code)]
        // SAFETY: geteuid has no preconditions
        let euid = unsafe { libc::geteuid() };
        assert_eq!(Privilege::current().is_root(), euid == 0);
    }
}
