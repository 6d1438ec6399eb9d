use crate::domain::error::DomainError;

/// Port for delivering the finished transcript to the user.
///
/// The application's contract ends at the clipboard: place the text there and
/// let the user paste it wherever they want.
pub trait TextOutput: Send + Sync {
    /// Put the text on the system clipboard.
    fn copy(&self, text: &str) -> Result<(), DomainError>;
}
