//! # SKYHOP
//!
//! The game crate: a small 3D platformer simulated on `skyhop_core`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               App                                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  InputSource ──> InputSnapshot (once per frame)                         │
//! │                        │                                                │
//! │                        v                                                │
//! │  FixedTimestep ──> MovementSystem ──> PhysicsSystem ──> fall check      │
//! │   (N ticks)              │                 │               │            │
//! │                          └──── World <─────┘         reset + populate   │
//! │                                  │                                      │
//! │                                  v                                      │
//! │                         Presenter::present (read-only)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML-driven tunables
//! - `input`: key snapshots and scripted input
//! - `systems`: movement and physics
//! - `assets`: model loading
//! - `scene`: level population
//! - `presentation`: presenter contract, render cache, headless presenter
//! - `game_loop`: fixed timestep, `App`, frame statistics

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod assets;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod input;
pub mod presentation;
pub mod scene;
pub mod systems;

// Re-export the ECS
pub use skyhop_core as core;

// Re-export commonly used types
pub use assets::{MeshData, ModelLoader, ProceduralModelLoader};
pub use config::{MovementConfig, PhysicsConfig, SceneConfig, SimulationConfig, TimingConfig};
pub use error::{GameError, GameResult};
pub use game_loop::{App, FixedTimestep, FrameStats, SessionStats};
pub use input::{InputScript, InputSnapshot, InputSource, Key};
pub use presentation::{Camera, FrameCollector, GpuMesh, InstanceData, Presenter, RenderCache};
pub use scene::SceneHandles;
pub use systems::{Aabb, MovementSystem, PhysicsSystem};
