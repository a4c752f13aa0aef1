//! Scoped raw-mode acquisition for the physical terminal.
//!
//! [`TerminalGuard`] enables raw mode and the alternate screen on
//! construction and restores the terminal on [`Drop`], on an explicit
//! [`TerminalGuard::release`], and from a panic hook. Restoration is
//! idempotent: a process-wide flag records whether raw mode is active.

use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{info, warn};

/// Set while raw mode is active. The panic hook checks it.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

static PANIC_HOOK: Once = Once::new();

/// RAII guard over raw mode and the alternate screen.
#[derive(Debug)]
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen.
    ///
    /// On partial failure whatever was set up is restored before the error
    /// is returned.
    pub fn acquire() -> io::Result<Self> {
        install_panic_hook();

        enable_raw_mode()?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);

        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = restore_terminal();
            return Err(e);
        }

        info!("terminal acquired");
        Ok(Self { _private: () })
    }

    /// Restore the terminal. Safe to call more than once.
    pub fn release(&mut self) -> io::Result<()> {
        restore_terminal()
    }

    /// Returns true while raw mode is held by this process.
    pub fn is_active() -> bool {
        RAW_MODE_ACTIVE.load(Ordering::SeqCst)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = restore_terminal() {
            warn!(error = %e, "failed to restore terminal");
        }
    }
}

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            // Restore first so the panic message lands on a sane terminal.
            let _ = restore_terminal();
            original_hook(info);
        }));
    });
}

/// Leave the alternate screen and disable raw mode if they are active.
///
/// Both steps are attempted even if the first fails; the first error is
/// returned.
pub fn restore_terminal() -> io::Result<()> {
    if !RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
        return Ok(());
    }

    let mut stdout = io::stdout();
    let screen = execute!(stdout, LeaveAlternateScreen, Show);
    let raw = disable_raw_mode();
    let _ = stdout.flush();
    info!("terminal released");

    screen.and(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_without_acquire_is_noop() {
        assert!(!TerminalGuard::is_active());
        assert!(restore_terminal().is_ok());
        assert!(restore_terminal().is_ok());
        assert!(!TerminalGuard::is_active());
    }
}
