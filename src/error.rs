/// Error taxonomy.
///
/// Every variant here is fatal: layout and art problems are detected at
/// construction and stop start-up. A missing audio device is not an error
/// at all (see `sim::audio`).

use std::io;

pub type ForgeResult<T> = Result<T, ForgeError>;

#[derive(thiserror::Error, Debug)]
pub enum ForgeError {
    #[error("layout error: {0}")]
    Layout(String),

    #[error("region error: {0}")]
    Region(String),

    #[error("art error in '{product}': {reason}")]
    Art { product: String, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ForgeError {
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn region(msg: impl Into<String>) -> Self {
        Self::Region(msg.into())
    }

    pub fn art(product: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Art { product: product.into(), reason: reason.into() }
    }
}
