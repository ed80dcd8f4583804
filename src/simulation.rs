//! Simulation driver.
//!
//! [`Simulation`] owns the particles, the containment volume and the edge
//! buffer. The host calls [`Simulation::advance`] once per displayed frame and
//! applies control changes between calls.

use crate::config::{ConfigDiff, HotSwapChange, SimConfig};
use crate::error::ConfigError;
use crate::frame::Frame;
use crate::graph::{ConnectionParams, Edge};
use crate::palette::Palette;
use crate::spatial::{NeighborSearch, SpatialGrid};
use crate::spawn::SpawnContext;
use crate::store::ParticleStore;
use crate::volume::{BoundaryMode, Volume};
use crate::Vec3;

/// A running particle cloud.
///
/// ```ignore
/// let mut sim = Simulation::new(SimConfig::cylinder())?;
/// loop {
///     let frame = sim.advance();
///     renderer.draw(frame.point_vertices(), frame.line_vertices());
/// }
/// ```
pub struct Simulation {
    config: SimConfig,
    volume: Box<dyn Volume>,
    store: ParticleStore,
    edges: Vec<Edge>,
    grid: SpatialGrid,
    ctx: SpawnContext,
    frame: u64,
}

impl Simulation {
    /// Validate `config`, seed every slot and assign initial colors.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut ctx = SpawnContext::new(config.seed);
        let volume = config.shape.build();
        let mut store = ParticleStore::seed(
            config.capacity,
            volume.as_ref(),
            config.velocity_scale,
            &mut ctx,
        );
        store.set_active_count(config.active_count);
        store.resample_colors(&config.palette, &mut ctx);

        tracing::info!(
            volume = volume.name(),
            capacity = config.capacity,
            active = store.active_count(),
            "simulation created"
        );

        Ok(Self {
            edges: Vec::with_capacity(config.connection_params().max_edges(store.active_count())),
            config,
            volume,
            store,
            grid: SpatialGrid::new(),
            ctx,
            frame: 0,
        })
    }

    /// Run one tick: move every active particle, enforce the boundary, then
    /// rebuild the proximity graph.
    pub fn advance(&mut self) -> Frame<'_> {
        self.store.integrate(self.volume.as_ref(), self.config.boundary);
        self.rebuild_edges();
        self.frame += 1;

        tracing::trace!(
            frame = self.frame,
            active = self.store.active_count(),
            edges = self.edges.len(),
            "tick"
        );

        self.frame()
    }

    /// Rebuild the edge list from the current positions without moving.
    pub fn rebuild_edges(&mut self) {
        let params = self.config.connection_params();
        let (positions, colors, connections) = self.store.graph_parts();
        self.config.neighbor_search.build_edges(
            &mut self.grid,
            positions,
            colors,
            connections,
            params,
            &mut self.edges,
        );
    }

    /// View of the state after the last tick.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            number: self.frame,
            positions: self.store.positions(),
            colors: self.store.colors(),
            connections: self.store.connections(),
            edges: &self.edges,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn volume(&self) -> &dyn Volume {
        self.volume.as_ref()
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Mutable particle access for staging scenarios between ticks.
    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn active_count(&self) -> usize {
        self.store.active_count()
    }

    /// Wireframe outline of the containment volume.
    pub fn outline(&self) -> Vec<(Vec3, Vec3)> {
        self.volume.outline()
    }

    // ========== Control surface ==========

    /// Resize the simulated subset, clamped to capacity. Returns the applied count.
    pub fn set_active_count(&mut self, count: usize) -> usize {
        let applied = self.store.set_active_count(count);
        self.config.active_count = applied;
        applied
    }

    /// Store a new velocity bound. Existing velocities keep their values until
    /// [`resample_velocities`](Self::resample_velocities) is called.
    pub fn set_velocity_scale(&mut self, scale: f32) {
        if !scale.is_finite() {
            tracing::warn!(scale, "ignoring non-finite velocity scale");
            return;
        }
        self.config.velocity_scale = scale.max(0.0);
    }

    /// Draw fresh velocities for every active particle from the current bound.
    pub fn resample_velocities(&mut self) {
        self.store.resample_velocities(
            self.volume.as_ref(),
            self.config.velocity_scale,
            &mut self.ctx,
        );
    }

    pub fn set_min_distance(&mut self, min_distance: f32) {
        self.config.min_distance = min_distance;
    }

    pub fn set_connection_limit(&mut self, limit_connections: bool, max_connections: u32) {
        self.config.limit_connections = limit_connections;
        self.config.max_connections = max_connections;
    }

    pub fn set_connection_params(&mut self, params: ConnectionParams) {
        self.config.min_distance = params.min_distance;
        self.config.limit_connections = params.limit_connections;
        self.config.max_connections = params.max_connections;
    }

    /// Replace the palette and re-draw every particle's color.
    pub fn set_palette(&mut self, palette: Palette) {
        self.config.palette = palette;
        self.resample_colors();
    }

    /// Change one palette color; colors are re-drawn if anything changed.
    pub fn set_color(&mut self, index: usize, color: Vec3) -> bool {
        let changed = self.config.palette.set_color(index, color);
        if changed {
            self.resample_colors();
        }
        changed
    }

    /// Toggle one palette color; colors are re-drawn if anything changed.
    pub fn set_color_enabled(&mut self, index: usize, enabled: bool) -> bool {
        let changed = self.config.palette.set_enabled(index, enabled);
        if changed {
            self.resample_colors();
        }
        changed
    }

    /// Re-draw every slot's color from the current palette.
    pub fn resample_colors(&mut self) {
        self.store.resample_colors(&self.config.palette, &mut self.ctx);
    }

    pub fn set_boundary_mode(&mut self, mode: BoundaryMode) {
        self.config.boundary = mode;
    }

    pub fn set_neighbor_search(&mut self, search: NeighborSearch) {
        self.config.neighbor_search = search;
    }

    /// Bring the live settings in line with `target`.
    ///
    /// `target` is validated first and nothing changes if it is rejected.
    /// Everything hot-swappable is applied. Capacity, shape and seed are
    /// fixed at construction; if those differ the returned diff reports
    /// `needs_rebuild` and they are left unchanged.
    pub fn apply(&mut self, target: &SimConfig) -> Result<ConfigDiff, ConfigError> {
        if let Err(e) = target.validate() {
            tracing::warn!(error = %e, "rejected config update");
            return Err(e);
        }
        let diff = self.config.diff(target);

        for change in &diff.hot_swappable {
            match change {
                HotSwapChange::ActiveCount(count) => {
                    self.set_active_count(*count);
                }
                HotSwapChange::VelocityScale(scale) => {
                    self.set_velocity_scale(*scale);
                    self.resample_velocities();
                }
                HotSwapChange::Connections(params) => self.set_connection_params(*params),
                HotSwapChange::Palette(palette) => self.set_palette(palette.clone()),
                HotSwapChange::Boundary(mode) => self.set_boundary_mode(*mode),
                HotSwapChange::NeighborSearch(search) => self.set_neighbor_search(*search),
            }
        }

        if diff.needs_rebuild() {
            tracing::warn!(
                shape = target.shape.name(),
                capacity = target.capacity,
                "capacity, shape and seed are fixed at construction; rebuild the simulation to change them"
            );
        }

        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(seed: u64) -> SimConfig {
        SimConfig {
            capacity: 50,
            active_count: 40,
            ..SimConfig::cylinder()
        }
        .with_seed(seed)
    }

    #[test]
    fn test_new_rejects_invalid() {
        let mut config = small(1);
        config.capacity = 0;
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn test_new_clamps_active_count() {
        let mut config = small(1);
        config.active_count = 80;
        let sim = Simulation::new(config).unwrap();
        assert_eq!(sim.active_count(), 50);
        assert_eq!(sim.config().active_count, 50);
    }

    #[test]
    fn test_advance_counts_frames() {
        let mut sim = Simulation::new(small(2)).unwrap();
        assert_eq!(sim.frame().frame_number(), 0);
        sim.advance();
        let frame = sim.advance();
        assert_eq!(frame.frame_number(), 2);
        assert_eq!(frame.positions().len(), 40);
        assert_eq!(frame.draw_range(), frame.edges().len() * 2);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = Simulation::new(small(3)).unwrap();
        let mut b = Simulation::new(small(3)).unwrap();
        for _ in 0..20 {
            let fa = a.advance();
            let fb = b.advance();
            assert_eq!(fa.positions(), fb.positions());
            assert_eq!(fa.edges(), fb.edges());
        }
    }

    #[test]
    fn test_velocity_scale_applies_on_resample() {
        let mut sim = Simulation::new(small(4)).unwrap();
        let before = sim.store().velocities().to_vec();
        sim.set_velocity_scale(0.0);
        assert_eq!(sim.store().velocities(), &before[..]);
        sim.resample_velocities();
        assert!(sim.store().velocities().iter().all(|v| *v == Vec3::ZERO));
    }

    #[test]
    fn test_disabling_all_colors_turns_white() {
        let mut sim = Simulation::new(small(5)).unwrap();
        for i in 0..3 {
            assert!(sim.set_color_enabled(i, false));
        }
        assert!(sim.store().colors().iter().all(|c| *c == Vec3::ONE));
    }

    #[test]
    fn test_apply_hot_swaps() {
        let mut sim = Simulation::new(small(6)).unwrap();
        let mut target = sim.config().clone();
        target.active_count = 10;
        target.velocity_scale = 0.0;
        target.min_distance = 1.0e6;
        target.limit_connections = false;

        let diff = sim.apply(&target).unwrap();
        assert!(!diff.needs_rebuild());
        assert_eq!(sim.active_count(), 10);
        assert!(sim.store().velocities().iter().all(|v| *v == Vec3::ZERO));

        let frame = sim.advance();
        assert_eq!(frame.edges().len(), 45);
    }

    #[test]
    fn test_apply_reports_rebuild() {
        let mut sim = Simulation::new(small(7)).unwrap();
        let diff = sim.apply(&SimConfig::tetrahedron().with_seed(7)).unwrap();
        assert!(diff.needs_rebuild());
        assert_eq!(sim.volume().name(), "cylinder");
        assert_eq!(sim.capacity(), 50);
    }

    #[test]
    fn test_apply_rejects_invalid_target() {
        let mut sim = Simulation::new(small(8)).unwrap();
        let before = sim.store().velocities().to_vec();

        for scale in [f32::NAN, -1.0, f32::INFINITY] {
            let mut target = sim.config().clone();
            target.velocity_scale = scale;
            target.active_count = 5;
            assert!(sim.apply(&target).is_err());
        }

        assert_eq!(sim.active_count(), 40);
        assert_eq!(sim.store().velocities(), &before[..]);
        let current = sim.config().clone();
        assert!(sim.apply(&current).unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_velocity_scale_ignored() {
        let mut sim = Simulation::new(small(9)).unwrap();
        let scale = sim.config().velocity_scale;
        sim.set_velocity_scale(f32::INFINITY);
        sim.set_velocity_scale(f32::NAN);
        assert_eq!(sim.config().velocity_scale, scale);
    }
}
