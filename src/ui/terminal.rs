//! Terminal session management with panic-safe cleanup.

use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use std::io;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set while a guard owns the terminal, so the panic hook knows to restore it.
static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Raw mode, alternate screen, hidden cursor and focus reporting for as
/// long as the guard lives. Restored on drop and on panic.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        enable_raw_mode()?;
        TERMINAL_ACTIVE.store(true, Ordering::SeqCst);
        let mut guard = Self { active: true };
        if let Err(e) = crossterm::execute!(io::stdout(), EnterAlternateScreen, Hide, EnableFocusChange) {
            guard.exit()?;
            return Err(e);
        }
        Ok(guard)
    }

    /// Restore the terminal now. Drop becomes a no-op afterwards.
    pub fn exit(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        TERMINAL_ACTIVE.store(false, Ordering::SeqCst);
        let restored = crossterm::execute!(io::stdout(), DisableFocusChange, Show, LeaveAlternateScreen);
        disable_raw_mode()?;
        restored
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Errors here have nowhere to go.
        let _ = self.exit();
    }
}

fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);
    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if TERMINAL_ACTIVE.swap(false, Ordering::SeqCst) {
            let _ = crossterm::execute!(io::stdout(), DisableFocusChange, Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
        original_hook(info);
    }));
}
