//! # Constellation
//!
//! A bounded cloud of drifting particles, with a line drawn between every pair
//! that comes closer than a threshold.
//!
//! Constellation is the simulation half of the effect: it moves the
//! particles, keeps them inside a convex volume and works out the line
//! segments each frame. Drawing, camera control and UI belong to the host,
//! which reads the per-frame buffers and pushes setting changes in between
//! ticks.
//!
//! ## Quick Start
//!
//! ```ignore
//! use constellation::prelude::*;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let mut sim = Simulation::new(SimConfig::cylinder())?;
//!     for _ in 0..600 {
//!         let frame = sim.advance();
//!         // Upload to the GPU as-is:
//!         let points: Vec<PointVertex> = frame.point_vertices();
//!         let lines: Vec<LineVertex> = frame.line_vertices();
//!         let _bytes: &[u8] = bytemuck::cast_slice(&lines);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Volumes
//!
//! The cloud lives in a [`Cylinder`] or a [`Tetrahedron`], chosen once through
//! [`Shape`]. Each shape bounces particles its own way; see [`volume`].
//!
//! ### Connections
//!
//! Every tick the pairs are scanned in ascending index order and connected
//! when closer than `min_distance`, optionally capped at `max_connections`
//! per particle. See [`graph`] for the exact policy and [`spatial`] for the
//! opt-in grid search that produces the same edges faster.
//!
//! ### Colors
//!
//! Each particle picks a color at random from the enabled entries of the
//! [`Palette`], and picks again whenever the palette changes.
//!
//! ## Feature Overview
//!
//! | Category | Items |
//! |----------|-------|
//! | Driver | [`Simulation`], [`Frame`] |
//! | Shapes | [`Cylinder`], [`Tetrahedron`], [`BoundaryMode`] |
//! | Graph | [`ConnectionParams`], [`Edge`], [`NeighborSearch`] |
//! | Config | [`SimConfig`], [`Palette`] |

mod config;
mod error;
mod frame;
pub mod graph;
pub mod palette;
mod simulation;
pub mod spatial;
mod spawn;
mod store;
pub mod volume;

pub use bytemuck;
pub use config::{ConfigDiff, HotSwapChange, SimConfig};
pub use error::ConfigError;
pub use frame::{Frame, LineVertex, PointVertex};
pub use glam::Vec3;
pub use graph::{build_edges, ConnectionParams, Edge};
pub use palette::Palette;
pub use simulation::Simulation;
pub use spatial::{NeighborSearch, SpatialGrid};
pub use spawn::SpawnContext;
pub use store::ParticleStore;
pub use volume::{BoundaryMode, Cylinder, Shape, Tetrahedron, Volume};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use constellation::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::SimConfig;
    pub use crate::error::ConfigError;
    pub use crate::frame::{Frame, LineVertex, PointVertex};
    pub use crate::graph::{ConnectionParams, Edge};
    pub use crate::palette::Palette;
    pub use crate::simulation::Simulation;
    pub use crate::spatial::NeighborSearch;
    pub use crate::volume::{BoundaryMode, Shape, Volume};
    pub use crate::Vec3;
}
