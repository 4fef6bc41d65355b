// Screenplay export: line classifier, page cursor layout, PDF serialization.
// Formatting is pure and synchronous; handlers offload it with spawn_blocking.

pub mod classifier;
pub mod formatter;
pub mod handlers;
pub mod layout;
pub mod page_setup;
pub mod pdf;
pub mod staging;

use thiserror::Error;

// Re-export the public API consumed by routes and state.
pub use formatter::{ScreenplayFormatter, ScreenplayInput};
pub use page_setup::default_page_setup;

/// Fatal formatting failures. Either one aborts the whole document.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Character {character:?} is outside the Latin-1 range of the document font")]
    Encoding { character: char },

    #[error("Image I/O error: {0}")]
    ImageIo(String),
}
