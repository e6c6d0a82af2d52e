//! Clipboard capability
//!
//! Copy buttons write the pane text to the system clipboard. The clipboard
//! is probed once at startup; when it is missing the copy action is a no-op.

use cli_clipboard::{ClipboardContext, ClipboardProvider};
use tracing::debug;

use crate::shared::error::{AppError, AppResult};

pub trait ClipboardWriter: Send {
    fn write_text(&mut self, text: &str) -> AppResult<()>;
}

/// System clipboard through `cli-clipboard`
pub struct SystemClipboard;

impl SystemClipboard {
    /// Returns `None` when no clipboard is reachable (headless session, no
    /// display server, ...).
    pub fn probe() -> Option<Self> {
        match ClipboardContext::new() {
            Ok(_) => Some(Self),
            Err(e) => {
                debug!(error = %e, "Clipboard unavailable");
                None
            }
        }
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> AppResult<()> {
        let mut ctx = ClipboardContext::new()
            .map_err(|e| AppError::Clipboard(format!("Failed to open clipboard: {}", e)))?;
        ctx.set_contents(text.to_owned())
            .map_err(|e| AppError::Clipboard(format!("Failed to write to clipboard: {}", e)))
    }
}
