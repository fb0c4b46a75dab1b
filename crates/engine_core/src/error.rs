//! Failure taxonomy for interactions with the world collaborator.

use crate::{DimensionId, EntityId};
use thiserror::Error;

/// Errors surfaced by world queries and mutations. None of these are fatal to
/// a scheduler pass; callers degrade to empty results or no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("entity {0} does not exist")]
    NoSuchEntity(EntityId),
    #[error("entity {0} is no longer valid")]
    InvalidEntity(EntityId),
    #[error("unknown dimension `{0}`")]
    UnknownDimension(DimensionId),
    #[error("world query unavailable: {0}")]
    Unavailable(String),
    #[error("mutation rejected: {0}")]
    Rejected(String),
}

impl WorldError {
    /// The entity involved is gone or invalid (as opposed to a transient fault).
    pub fn is_invalid_entity(&self) -> bool {
        matches!(self, WorldError::NoSuchEntity(_) | WorldError::InvalidEntity(_))
    }
}
