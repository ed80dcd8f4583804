//! Simulation configuration.
//!
//! [`SimConfig`] holds every tunable the control surface can change. It can
//! be saved to and loaded from JSON, and two configs can be diffed to find
//! what a running [`Simulation`](crate::Simulation) has to update.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::graph::ConnectionParams;
use crate::palette::Palette;
use crate::spatial::NeighborSearch;
use crate::volume::{BoundaryMode, Shape};

/// Complete simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Number of particle slots, fixed for the life of a simulation.
    pub capacity: usize,
    /// How many slots are simulated; clamped to `capacity`.
    pub active_count: usize,
    /// Per-axis bound for freshly drawn velocities.
    pub velocity_scale: f32,
    /// Pairs strictly closer than this are connected.
    pub min_distance: f32,
    pub limit_connections: bool,
    pub max_connections: u32,
    pub palette: Palette,
    pub shape: Shape,
    pub boundary: BoundaryMode,
    pub neighbor_search: NeighborSearch,
    /// Fixed RNG seed for reproducible runs; clock-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::cylinder()
    }
}

impl SimConfig {
    /// Cylinder of radius 500 and height 700, capped connections.
    pub fn cylinder() -> Self {
        Self {
            capacity: 1000,
            active_count: 700,
            velocity_scale: 1.0,
            min_distance: 150.0,
            limit_connections: true,
            max_connections: 20,
            palette: Palette::default(),
            shape: Shape::default(),
            boundary: BoundaryMode::default(),
            neighbor_search: NeighborSearch::default(),
            seed: None,
        }
    }

    /// Regular tetrahedron, uncapped connections.
    pub fn tetrahedron() -> Self {
        Self {
            active_count: 500,
            min_distance: 100.0,
            limit_connections: false,
            shape: Shape::tetrahedron(),
            ..Self::cylinder()
        }
    }

    /// Builder-style seed override.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            min_distance: self.min_distance,
            limit_connections: self.limit_connections,
            max_connections: self.max_connections,
        }
    }

    /// Reject values the simulation cannot run with.
    ///
    /// A `min_distance` of zero or less is allowed and simply produces no
    /// edges; an `active_count` above capacity is clamped, not rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be at least 1".into()));
        }
        if !(self.velocity_scale.is_finite() && self.velocity_scale >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "velocity scale must be finite and non-negative, got {}",
                self.velocity_scale
            )));
        }
        if self.min_distance.is_nan() {
            return Err(ConfigError::Invalid("min distance is NaN".into()));
        }
        if self.palette.colors().len() != self.palette.enabled().len() {
            return Err(ConfigError::PaletteMismatch {
                colors: self.palette.colors().len(),
                enabled: self.palette.enabled().len(),
            });
        }
        self.shape.validate().map_err(ConfigError::Invalid)
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields take their cylinder-preset defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Compare this config with another to find what a running simulation
    /// must change to match `other`.
    pub fn diff(&self, other: &SimConfig) -> ConfigDiff {
        let mut hot_swappable = Vec::new();

        if self.active_count != other.active_count {
            hot_swappable.push(HotSwapChange::ActiveCount(other.active_count));
        }
        if self.velocity_scale != other.velocity_scale {
            hot_swappable.push(HotSwapChange::VelocityScale(other.velocity_scale));
        }
        if self.connection_params() != other.connection_params() {
            hot_swappable.push(HotSwapChange::Connections(other.connection_params()));
        }
        if self.palette != other.palette {
            hot_swappable.push(HotSwapChange::Palette(other.palette.clone()));
        }
        if self.boundary != other.boundary {
            hot_swappable.push(HotSwapChange::Boundary(other.boundary));
        }
        if self.neighbor_search != other.neighbor_search {
            hot_swappable.push(HotSwapChange::NeighborSearch(other.neighbor_search));
        }

        let needs_rebuild = self.capacity != other.capacity
            || self.shape != other.shape
            || self.seed != other.seed;

        ConfigDiff {
            needs_rebuild,
            hot_swappable,
        }
    }
}

/// Result of comparing two `SimConfig`s.
#[derive(Debug, Clone)]
pub struct ConfigDiff {
    /// Capacity, shape or seed changed; those are fixed at construction and
    /// need a new simulation.
    pub needs_rebuild: bool,

    /// Changes that can be applied between ticks.
    pub hot_swappable: Vec<HotSwapChange>,
}

impl ConfigDiff {
    /// Returns true if no changes are needed.
    pub fn is_empty(&self) -> bool {
        !self.needs_rebuild && self.hot_swappable.is_empty()
    }

    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }
}

/// A change a running simulation can take between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum HotSwapChange {
    ActiveCount(usize),
    /// New velocity bound; velocities are re-drawn.
    VelocityScale(f32),
    Connections(ConnectionParams),
    /// New palette; colors are re-drawn.
    Palette(Palette),
    Boundary(BoundaryMode),
    NeighborSearch(NeighborSearch),
}
