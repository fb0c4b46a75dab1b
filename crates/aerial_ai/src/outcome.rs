//! Result of a best-effort world mutation.

use engine_core::WorldError;

/// What happened to a mutation the AI asked the world for. Failures are
/// never propagated; they are classified so callers and tests can tell a
/// vanished entity from a transient host fault.
///
/// Ordered by severity so several mutations in one pass can be folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    Applied,
    /// The host refused or could not answer this time.
    TransientFault,
    /// The entity involved is gone or invalid.
    InvalidTarget,
}

impl Outcome {
    /// Fold `next` into an optional running outcome, keeping the worse one.
    pub fn fold(acc: Option<Outcome>, next: Outcome) -> Option<Outcome> {
        Some(acc.map_or(next, |prev| prev.max(next)))
    }
}

impl From<Result<(), WorldError>> for Outcome {
    fn from(result: Result<(), WorldError>) -> Self {
        match result {
            Ok(()) => Outcome::Applied,
            Err(e) if e.is_invalid_entity() => {
                log::debug!("Mutation skipped: {}", e);
                Outcome::InvalidTarget
            }
            Err(e) => {
                log::debug!("Mutation failed: {}", e);
                Outcome::TransientFault
            }
        }
    }
}
