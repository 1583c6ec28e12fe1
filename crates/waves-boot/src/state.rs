//! Bootstrap lifecycle states

use core::fmt;

/// Lifecycle of a [`Bootstrapper`](crate::Bootstrapper)
///
/// ```text
/// NotStarted ──bootstrap()──▶ Pending ──Ok──▶ Published
///                                     └─Err─▶ Failed
/// ```
///
/// `Published` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BootState {
    /// `bootstrap()` has not been called
    NotStarted = 0,
    /// Instantiation is in flight
    Pending = 1,
    /// Handle published to the cell
    Published = 2,
    /// Instantiation or publication failed
    Failed = 3,
}

impl BootState {
    /// Decode from the atomic representation
    ///
    /// Unknown values map to `Failed`.
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => BootState::NotStarted,
            1 => BootState::Pending,
            2 => BootState::Published,
            _ => BootState::Failed,
        }
    }

    /// Whether no further transition can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, BootState::Published | BootState::Failed)
    }

    /// Stable snake_case name, as exposed to page code
    pub fn as_str(self) -> &'static str {
        match self {
            BootState::NotStarted => "not_started",
            BootState::Pending => "pending",
            BootState::Published => "published",
            BootState::Failed => "failed",
        }
    }
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_u8() {
        for state in [
            BootState::NotStarted,
            BootState::Pending,
            BootState::Published,
            BootState::Failed,
        ] {
            assert_eq!(BootState::from_u8(state as u8), state);
        }
        assert_eq!(BootState::from_u8(42), BootState::Failed);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!BootState::NotStarted.is_terminal());
        assert!(!BootState::Pending.is_terminal());
        assert!(BootState::Published.is_terminal());
        assert!(BootState::Failed.is_terminal());
    }
}
