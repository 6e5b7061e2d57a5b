//! # ECS Error Types

use thiserror::Error;

use super::entity::EntityId;

/// Errors that can occur when operating on the ECS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity id is out of range or refers to a destroyed slot.
    #[error("invalid entity: {0}")]
    InvalidEntity(EntityId),

    /// Every slot the registry may allocate is live.
    #[error("entity limit of {limit} live entities reached")]
    EntityLimitReached {
        /// Registry slot limit.
        limit: u32,
    },

    /// A component type declared an index that does not fit in the mask.
    #[error("component {name} declares index {id}, masks hold only {max} types")]
    ComponentIdOutOfRange {
        /// Rust type name of the offending component.
        name: &'static str,
        /// The declared index.
        id: u8,
        /// Mask width.
        max: usize,
    },

    /// Two distinct component types declared the same index.
    #[error("component index {id} already bound to {existing}, cannot bind {requested}")]
    ComponentIdConflict {
        /// The contested index.
        id: u8,
        /// Type already registered under the index.
        existing: &'static str,
        /// Type that tried to claim it.
        requested: &'static str,
    },

    /// The mask and the stores disagree (reported by coherence audits).
    #[error("mask/store mismatch for {entity}: component index {id} (mask says {in_mask})")]
    IncoherentMask {
        /// Entity whose state diverged.
        entity: EntityId,
        /// Component index that diverged.
        id: u8,
        /// Whether the mask bit was set.
        in_mask: bool,
    },
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
