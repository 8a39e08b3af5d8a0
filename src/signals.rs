//! Ctrl+C handling
//!
//! The first interrupt cancels the running chain; the second exits at once.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

use crate::status::ExitStatus;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Check if the application was interrupted (Ctrl+C pressed)
#[inline]
pub fn was_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Marks the process interrupted and cancels `cancel`.
/// Returns `true` if it had already been interrupted.
pub fn interrupt(cancel: &CancellationToken) -> bool {
    let again = INTERRUPTED.swap(true, Ordering::SeqCst);
    cancel.cancel();
    again
}

/// Installs the process-wide Ctrl+C handler.
pub fn install_handler(cancel: CancellationToken) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted");
        if interrupt(&cancel) {
            std::process::exit(ExitStatus::Interrupted as i32);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_cancels_and_reports_repeat() {
        INTERRUPTED.store(false, Ordering::SeqCst);
        let cancel = CancellationToken::new();

        assert!(!interrupt(&cancel));
        assert!(cancel.is_cancelled());
        assert!(was_interrupted());
        assert!(interrupt(&cancel));

        INTERRUPTED.store(false, Ordering::SeqCst);
    }
}
