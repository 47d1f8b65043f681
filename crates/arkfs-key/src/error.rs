//! Errors raised while obtaining a key.

use thiserror::Error;

/// Key retrieval errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Prompting was cancelled, either by the user right now or by a cached
    /// earlier cancellation. Terminal until the provider is reset.
    #[error("key prompting has been cancelled")]
    PromptingCancelled,

    /// The key could not be obtained for some other reason.
    #[error("unknown key: {0}")]
    Unknown(String),

    /// Like [`KeyError::Unknown`], but raising it from a read prompt caches
    /// a cancellation on the provider.
    #[error("unknown key: {0}")]
    CacheableUnknown(String),

    /// A controller operation was used outside the prompt it belongs to, or
    /// is not available on this controller flavor.
    #[error("operation is not legal in the controller's current state")]
    IllegalControllerState,
}
