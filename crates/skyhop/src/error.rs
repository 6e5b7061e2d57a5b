//! # Game Error Types
//!
//! All errors that can occur outside the ECS core.

use std::path::PathBuf;

use skyhop_core::EcsError;
use thiserror::Error;

/// Errors that can occur in the game crate.
#[derive(Error, Debug)]
pub enum GameError {
    /// An ECS operation failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`SimulationConfig`](crate::SimulationConfig).
    #[error("invalid config syntax: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A model could not be produced for a path.
    #[error("cannot load model {path}: {reason}")]
    AssetLoad {
        /// Requested model path.
        path: String,
        /// Why loading failed.
        reason: String,
    },
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
