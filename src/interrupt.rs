//! Cooperative cancellation.
//!
//! Long runs poll an [`Interrupt`] between files. The signal handler only
//! flips a flag; the walker and transform driver notice it, clean up and
//! return [`Interrupted`]. A second Ctrl+C exits immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::Interrupted;

/// Flag shared with the signal handler
static SIGNALLED: OnceLock<Arc<AtomicBool>> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    /// A token nothing but [`Interrupt::trigger`] will set
    pub fn new() -> Self {
        Self::default()
    }

    /// A token set by SIGINT or SIGTERM
    pub fn install() -> Self {
        let flag = SIGNALLED.get_or_init(|| Arc::new(AtomicBool::new(false)));
        register_handler();
        Self {
            flag: Arc::clone(flag),
        }
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` once triggered
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_set() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

#[cfg(unix)]
fn register_handler() {
    unsafe {
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
fn register_handler() {}

#[cfg(unix)]
extern "C" fn signal_handler(_: libc::c_int) {
    if let Some(flag) = SIGNALLED.get() {
        if !flag.swap(true, Ordering::SeqCst) {
            return;
        }
    }
    unsafe { libc::_exit(130) }
}
