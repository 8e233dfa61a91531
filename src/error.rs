use thiserror::Error;

/// Recoverable failures returned by every pet operation.
///
/// Operations validate first and mutate second, so a returned error always
/// means the pet is exactly as it was before the call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PetError {
    /// Not enough energy, health or coins, asleep, already owned, etc.
    #[error("{0}")]
    PreconditionFailed(String),

    /// Unknown catalog id, unknown slot, or an item the pet does not own.
    #[error("{0}")]
    InvalidReference(String),

    /// A minigame input arrived with no running session.
    #[error("no minigame is running")]
    SessionInactive,
}

impl PetError {
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::PreconditionFailed(reason.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidReference(reason.into())
    }

    pub fn asleep() -> Self {
        Self::precondition("Shh! Your pet is asleep.")
    }

    /// Human-readable reason, suitable for a toast.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

pub type PetResult<T> = Result<T, PetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_is_the_bare_message() {
        let e = PetError::precondition("Too tired! Rest first.");
        assert_eq!(e.reason(), "Too tired! Rest first.");
        assert_eq!(PetError::SessionInactive.reason(), "no minigame is running");
    }
}
