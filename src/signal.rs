//! Interruption handling
//!
//! SIGINT, SIGTERM and SIGHUP only record the signal number in an atomic.
//! The gateway checks it around every action and turns it into
//! `Error::Interrupted`, which ends the run through the normal error path.

use anyhow::{Result, bail};
use std::sync::atomic::{AtomicI32, Ordering};

/// Last signal received, 0 if none
static SIGNAL_RECEIVED: AtomicI32 = AtomicI32::new(0);

const HANDLED: [libc::c_int; 3] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP];

/// Async-signal-safe handler: a single atomic store, nothing else
extern "C" fn record_signal(signal: libc::c_int) {
    SIGNAL_RECEIVED.store(signal, Ordering::SeqCst);
}

/// Install handlers. Call once from `main` before any module runs.
pub fn install() -> Result<()> {
    for signal in HANDLED {
        #[allow(unsafe_code)]
        // SAFETY: the handler only performs an atomic store; the sigaction
        // struct is zero-initialised and fully set before use.
        let rc = unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = record_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&raw mut action.sa_mask);
            libc::sigaction(signal, &raw const action, std::ptr::null_mut())
        };
        if rc != 0 {
            bail!(
                "Failed to install handler for signal {signal}: {}",
                std::io::Error::last_os_error()
            );
        }
    }
    log::debug!("Signal handlers installed (SIGINT, SIGTERM, SIGHUP)");
    Ok(())
}

/// Signal number if one has been delivered
pub fn received() -> Option<i32> {
    match SIGNAL_RECEIVED.load(Ordering::SeqCst) {
        0 => None,
        signal => Some(signal),
    }
}
