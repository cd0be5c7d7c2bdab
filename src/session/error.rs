use thiserror::Error;

/// Reasons a brew session cannot be started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The method has no steps to walk through
    #[error("brewing method '{0}' has no steps")]
    NoSteps(String),

    /// Cup count outside `1..=max_cups`
    #[error("cup count {cups} is outside 1..={max_cups} for brewing method '{method_id}'")]
    InvalidCupCount {
        method_id: String,
        cups: u32,
        max_cups: u32,
    },
}
