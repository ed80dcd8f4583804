//! Fixed-capacity particle storage.
//!
//! Particles live in parallel arrays indexed by slot. Only the first
//! `active_count` slots are simulated and exposed; the rest keep stale data
//! until they become active again.

use crate::palette::Palette;
use crate::spawn::SpawnContext;
use crate::volume::{BoundaryMode, Volume};
use crate::Vec3;

/// Structure-of-arrays particle state.
#[derive(Debug, Clone)]
pub struct ParticleStore {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    colors: Vec<Vec3>,
    /// Edges each particle took part in during the last graph build.
    connections: Vec<u32>,
    active: usize,
}

impl ParticleStore {
    /// Seed every slot with a position inside `volume` and a random velocity
    /// bounded by `velocity_scale` per axis. Colors start white.
    pub fn seed(
        capacity: usize,
        volume: &dyn Volume,
        velocity_scale: f32,
        ctx: &mut SpawnContext,
    ) -> Self {
        let mut positions = Vec::with_capacity(capacity);
        let mut velocities = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            positions.push(volume.sample(ctx));
            velocities.push(ctx.random_velocity(velocity_scale));
        }

        tracing::debug!(capacity, volume = volume.name(), velocity_scale, "seeded particles");

        Self {
            positions,
            velocities,
            colors: vec![Vec3::ONE; capacity],
            connections: vec![0; capacity],
            active: capacity,
        }
    }

    /// Build directly from positions and velocities, all active.
    ///
    /// Useful for replaying a captured state or for hand-placed scenarios.
    ///
    /// # Panics
    ///
    /// Panics if `positions` and `velocities` differ in length.
    pub fn from_parts(positions: Vec<Vec3>, velocities: Vec<Vec3>) -> Self {
        assert_eq!(
            positions.len(),
            velocities.len(),
            "positions and velocities must have the same length"
        );
        let capacity = positions.len();
        Self {
            positions,
            velocities,
            colors: vec![Vec3::ONE; capacity],
            connections: vec![0; capacity],
            active: capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Set how many slots are simulated, clamped into `[0, capacity]`.
    ///
    /// Returns the count actually applied.
    pub fn set_active_count(&mut self, count: usize) -> usize {
        let clamped = count.min(self.capacity());
        if clamped != count {
            tracing::warn!(
                requested = count,
                capacity = self.capacity(),
                "active count clamped to capacity"
            );
        }
        self.active = clamped;
        clamped
    }

    /// Positions of the active particles.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions[..self.active]
    }

    /// Velocities of the active particles.
    #[inline]
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities[..self.active]
    }

    /// Colors of the active particles.
    #[inline]
    pub fn colors(&self) -> &[Vec3] {
        &self.colors[..self.active]
    }

    /// Connection counts of the active particles from the last graph build.
    #[inline]
    pub fn connections(&self) -> &[u32] {
        &self.connections[..self.active]
    }

    /// Split borrow for the graph builder: active positions and colors
    /// read-only, active connection counters writable.
    pub(crate) fn graph_parts(&mut self) -> (&[Vec3], &[Vec3], &mut [u32]) {
        let n = self.active;
        (
            &self.positions[..n],
            &self.colors[..n],
            &mut self.connections[..n],
        )
    }

    /// Move every active particle by its velocity and enforce the boundary.
    pub fn integrate(&mut self, volume: &dyn Volume, mode: BoundaryMode) {
        let n = self.active;
        for (position, velocity) in self.positions[..n]
            .iter_mut()
            .zip(&mut self.velocities[..n])
        {
            mode.step(volume, position, velocity);
        }
    }

    /// Overwrite every active particle's velocity with a fresh draw.
    ///
    /// A particle caught outside `volume` mid-bounce loses the velocity that
    /// was carrying it home, so it is settled back onto the volume first.
    pub fn resample_velocities(
        &mut self,
        volume: &dyn Volume,
        velocity_scale: f32,
        ctx: &mut SpawnContext,
    ) {
        let n = self.active;
        let mut settled = 0usize;
        for (position, velocity) in self.positions[..n]
            .iter_mut()
            .zip(&mut self.velocities[..n])
        {
            if !volume.contains(*position) {
                volume.settle(position);
                settled += 1;
            }
            *velocity = ctx.random_velocity(velocity_scale);
        }
        tracing::debug!(active = n, velocity_scale, settled, "resampled velocities");
    }

    /// Re-roll the color of every slot, active or not, from `palette`.
    pub fn resample_colors(&mut self, palette: &Palette, ctx: &mut SpawnContext) {
        for color in &mut self.colors {
            *color = palette.sample(ctx);
        }
        tracing::debug!(
            capacity = self.capacity(),
            enabled = palette.enabled_colors().len(),
            "resampled colors"
        );
    }

    /// Overwrite one slot. Used to stage scenarios and by tests.
    ///
    /// Returns `false` and leaves the store untouched if `index` is past
    /// capacity.
    pub fn set_particle(&mut self, index: usize, position: Vec3, velocity: Vec3) -> bool {
        match (self.positions.get_mut(index), self.velocities.get_mut(index)) {
            (Some(p), Some(v)) => {
                *p = position;
                *v = velocity;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{Cylinder, Tetrahedron};

    #[test]
    fn test_seed_inside_volume() {
        let mut ctx = SpawnContext::from_seed(21);
        let volume = Tetrahedron::default();
        let store = ParticleStore::seed(300, &volume, 2.0, &mut ctx);

        assert_eq!(store.capacity(), 300);
        assert_eq!(store.active_count(), 300);
        assert!(store.positions().iter().all(|p| volume.contains(*p)));
        assert!(store
            .velocities()
            .iter()
            .all(|v| v.abs().max_element() <= 2.0));
    }

    #[test]
    fn test_active_count_clamps() {
        let mut ctx = SpawnContext::from_seed(1);
        let mut store = ParticleStore::seed(10, &Cylinder::default(), 1.0, &mut ctx);
        assert_eq!(store.set_active_count(4), 4);
        assert_eq!(store.positions().len(), 4);
        assert_eq!(store.set_active_count(50), 10);
        assert_eq!(store.set_active_count(0), 0);
        assert!(store.positions().is_empty());
    }

    #[test]
    fn test_integrate_only_moves_active() {
        let mut store = ParticleStore::from_parts(
            vec![Vec3::ZERO, Vec3::ZERO],
            vec![Vec3::X, Vec3::Y],
        );
        store.set_active_count(1);
        store.integrate(&Cylinder::default(), BoundaryMode::Reflect);
        store.set_active_count(2);

        assert_eq!(store.positions()[0], Vec3::X);
        assert_eq!(store.positions()[1], Vec3::ZERO);
    }

    #[test]
    fn test_resample_velocities_only_active() {
        let mut ctx = SpawnContext::from_seed(8);
        let mut store = ParticleStore::from_parts(vec![Vec3::ZERO; 4], vec![Vec3::splat(9.0); 4]);
        store.set_active_count(2);
        store.resample_velocities(&Cylinder::default(), 0.5, &mut ctx);
        store.set_active_count(4);

        assert!(store.velocities()[..2]
            .iter()
            .all(|v| v.abs().max_element() <= 0.5));
        assert_eq!(store.velocities()[3], Vec3::splat(9.0));
    }

    #[test]
    fn test_resample_velocities_settles_outside_particles() {
        let mut ctx = SpawnContext::from_seed(9);
        let volume = Tetrahedron::default();
        let outside = Vec3::splat(290.0);
        let mut store = ParticleStore::from_parts(
            vec![outside, Vec3::ZERO, outside],
            vec![Vec3::splat(-3.0); 3],
        );
        store.set_active_count(2);
        store.resample_velocities(&volume, 5.0, &mut ctx);

        assert!(volume.contains(store.positions()[0]));
        assert_eq!(store.positions()[1], Vec3::ZERO);
        store.set_active_count(3);
        assert_eq!(store.positions()[2], outside);
    }

    #[test]
    fn test_set_particle_out_of_range() {
        let mut store = ParticleStore::from_parts(vec![Vec3::ZERO; 2], vec![Vec3::ZERO; 2]);
        assert!(store.set_particle(1, Vec3::X, Vec3::Y));
        assert!(!store.set_particle(2, Vec3::X, Vec3::Y));
        assert_eq!(store.positions(), &[Vec3::ZERO, Vec3::X]);
        assert_eq!(store.velocities(), &[Vec3::ZERO, Vec3::Y]);
    }

    #[test]
    fn test_resample_colors_covers_inactive_slots() {
        let mut ctx = SpawnContext::from_seed(8);
        let mut store = ParticleStore::from_parts(vec![Vec3::ZERO; 5], vec![Vec3::ZERO; 5]);
        store.set_active_count(1);
        let palette = Palette::new(vec![Vec3::X], vec![true]).unwrap();
        store.resample_colors(&palette, &mut ctx);
        store.set_active_count(5);

        assert!(store.colors().iter().all(|c| *c == Vec3::X));
    }
}
