//! One-time native vision runtime probe
//!
//! The underlying vision library is probed once per process before the
//! first frame is analyzed. The guard uses double-checked locking: a single
//! acquire load on the hot path, and a mutex plus a re-check only for the
//! race on first use. The release store pairs with the acquire load so the
//! probe happens-before any call that observed the flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{Result, VerifyError};

static RUNTIME_READY: AtomicBool = AtomicBool::new(false);
static RUNTIME_GUARD: Mutex<()> = Mutex::new(());

/// Ensure the native vision runtime is reachable, at most once per process.
pub(crate) fn ensure_runtime() -> Result<()> {
    if RUNTIME_READY.load(Ordering::Acquire) {
        return Ok(());
    }

    let _guard = RUNTIME_GUARD
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if !RUNTIME_READY.load(Ordering::Acquire) {
        let info = opencv::core::get_build_information()
            .map_err(|e| VerifyError::opencv("query vision runtime build information", e))?;
        let summary = info
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("unknown build");
        log::debug!("vision runtime ready: {summary}");
        RUNTIME_READY.store(true, Ordering::Release);
    }
    Ok(())
}
