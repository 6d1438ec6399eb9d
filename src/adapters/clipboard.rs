use arboard::Clipboard;
use parking_lot::Mutex;
use tracing::debug;

use crate::domain::error::DomainError;
use crate::ports::TextOutput;

/// Clipboard sink backed by arboard.
///
/// Replaces the user's clipboard content with the transcript; the previous
/// content is not restored.
pub struct ArboardClipboard {
    clipboard: Mutex<Clipboard>,
}

impl ArboardClipboard {
    /// Create a new ArboardClipboard.
    pub fn new() -> Result<Self, DomainError> {
        let clipboard = Clipboard::new()
            .map_err(|e| DomainError::Clipboard(format!("failed to initialize clipboard: {}", e)))?;

        Ok(Self {
            clipboard: Mutex::new(clipboard),
        })
    }
}

impl TextOutput for ArboardClipboard {
    fn copy(&self, text: &str) -> Result<(), DomainError> {
        let mut clipboard = self.clipboard.lock();
        clipboard
            .set_text(text)
            .map_err(|e| DomainError::Clipboard(format!("failed to set clipboard text: {}", e)))?;
        debug!(chars = text.len(), "copied transcript to clipboard");
        Ok(())
    }
}
