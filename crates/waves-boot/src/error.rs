//! Bootstrap errors

use core::fmt;

use waves_hal::ProviderError;

use crate::state::BootState;

/// Errors returned by [`Bootstrapper::bootstrap`](crate::Bootstrapper::bootstrap)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootError {
    /// The provider settled with an error, or the host slot refused the
    /// handle. Nothing was published.
    InitializationFailure(ProviderError),
    /// `bootstrap()` was already invoked; carries the state observed at the
    /// time of the rejected call
    AlreadyStarted(BootState),
}

impl BootError {
    /// The provider error behind an initialization failure, if any
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            BootError::InitializationFailure(err) => Some(err),
            BootError::AlreadyStarted(_) => None,
        }
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::InitializationFailure(err) => {
                write!(f, "module initialization failed: {}", err)
            }
            BootError::AlreadyStarted(state) => {
                write!(f, "bootstrap already invoked (state: {})", state)
            }
        }
    }
}

impl std::error::Error for BootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootError::InitializationFailure(err) => Some(err),
            BootError::AlreadyStarted(_) => None,
        }
    }
}

impl From<ProviderError> for BootError {
    fn from(err: ProviderError) -> Self {
        BootError::InitializationFailure(err)
    }
}
