//! Registry errors.

use thiserror::Error;

/// Errors from [`super::Registry`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Auto-update was started before any subscriber was attached.
    #[error("auto-update needs at least one subscriber")]
    NoSubscriber,
}
