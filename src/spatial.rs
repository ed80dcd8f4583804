//! Spatial hashing using Morton encoding (Z-order curve).
//!
//! An opt-in replacement for the pairwise scan. Particles are bucketed into
//! cubic cells as wide as the connection threshold, so only the 27 cells
//! around a particle can hold partners. For each particle the candidates are
//! visited in ascending index order and fed through the same cap logic as
//! [`build_edges`](crate::graph::build_edges), so the edge list comes out
//! identical, order included.

use crate::graph::{build_edges, ConnectionParams, Edge, EdgeScan};
use crate::Vec3;
use serde::{Deserialize, Serialize};

/// Cells per axis. 10 bits per axis gives 30-bit Morton codes.
pub const GRID_RESOLUTION: u32 = 1024;

/// How the graph builder finds nearby pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSearch {
    /// Check every pair. `O(n²)`.
    #[default]
    BruteForce,
    /// Check only pairs in neighbouring grid cells.
    Grid,
}

/// Expand a 10-bit integer to 30 bits by inserting 2 zeros between each bit.
#[inline]
fn expand_bits(v: u32) -> u32 {
    let mut x = v & 0x0000_03FF;
    x = (x | (x << 16)) & 0x0300_00FF;
    x = (x | (x << 8)) & 0x0300_F00F;
    x = (x | (x << 4)) & 0x030C_30C3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

/// 30-bit Morton code for a cell (each coordinate 0-1023).
#[inline]
pub fn morton_encode(x: u32, y: u32, z: u32) -> u32 {
    expand_bits(x) | (expand_bits(y) << 1) | (expand_bits(z) << 2)
}

/// Compact 30 bits back to 10 by keeping every third bit.
#[inline]
fn compact_bits(v: u32) -> u32 {
    let mut x = v & 0x0924_9249;
    x = (x | (x >> 2)) & 0x030C_30C3;
    x = (x | (x >> 4)) & 0x0300_F00F;
    x = (x | (x >> 8)) & 0x0300_00FF;
    x = (x | (x >> 16)) & 0x0000_03FF;
    x
}

/// Decode a Morton code back to cell coordinates.
#[inline]
pub fn morton_decode(code: u32) -> [u32; 3] {
    [compact_bits(code), compact_bits(code >> 1), compact_bits(code >> 2)]
}

/// World position to cell coordinates, grid centred on the origin.
///
/// Positions past the edge of the grid are clamped into the border cells.
#[inline]
fn pos_to_cell(pos: Vec3, cell_size: f32) -> [i32; 3] {
    let half_grid = GRID_RESOLUTION as f32 * cell_size * 0.5;
    let normalized = (pos + Vec3::splat(half_grid)) / cell_size;
    let clamped = normalized
        .floor()
        .clamp(Vec3::ZERO, Vec3::splat((GRID_RESOLUTION - 1) as f32));
    [clamped.x as i32, clamped.y as i32, clamped.z as i32]
}

#[inline]
fn cell_code(cell: [i32; 3]) -> Option<u32> {
    let in_range = |c: i32| (0..GRID_RESOLUTION as i32).contains(&c);
    if cell.iter().all(|c| in_range(*c)) {
        Some(morton_encode(cell[0] as u32, cell[1] as u32, cell[2] as u32))
    } else {
        None
    }
}

/// Reusable buffers for grid-accelerated graph builds.
#[derive(Debug, Default, Clone)]
pub struct SpatialGrid {
    /// `(morton_code, particle_index)` sorted by code, then index.
    entries: Vec<(u32, u32)>,
    candidates: Vec<usize>,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn rebuild(&mut self, positions: &[Vec3], cell_size: f32) {
        self.entries.clear();
        self.entries.extend(positions.iter().enumerate().map(|(i, p)| {
            let [x, y, z] = pos_to_cell(*p, cell_size);
            (morton_encode(x as u32, y as u32, z as u32), i as u32)
        }));
        self.entries.sort_unstable();
    }

    /// Indices stored under `code`.
    fn cell(&self, code: u32) -> &[(u32, u32)] {
        let start = self.entries.partition_point(|(c, _)| *c < code);
        let end = start + self.entries[start..].partition_point(|(c, _)| *c == code);
        &self.entries[start..end]
    }

    /// Same contract as [`build_edges`], using the grid to skip far pairs.
    pub fn build_edges(
        &mut self,
        positions: &[Vec3],
        colors: &[Vec3],
        connections: &mut [u32],
        params: ConnectionParams,
        out: &mut Vec<Edge>,
    ) {
        let cell_size = params.min_distance;
        if !cell_size.is_finite() {
            build_edges(positions, colors, connections, params, out);
            return;
        }
        let Some(mut scan) = EdgeScan::begin(positions, colors, connections, params, out) else {
            return;
        };

        self.rebuild(scan.positions(), cell_size);

        for i in 0..scan.len() {
            if !scan.is_open(i) {
                continue;
            }

            let [cx, cy, cz] = pos_to_cell(scan.positions()[i], cell_size);
            let mut candidates = std::mem::take(&mut self.candidates);
            candidates.clear();
            for dz in -1..=1 {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let Some(code) = cell_code([cx + dx, cy + dy, cz + dz]) else {
                            continue;
                        };
                        candidates.extend(
                            self.cell(code)
                                .iter()
                                .map(|(_, j)| *j as usize)
                                .filter(|j| *j > i),
                        );
                    }
                }
            }
            candidates.sort_unstable();

            scan.scan_from(i, candidates.iter().copied());
            self.candidates = candidates;
        }
    }
}

impl NeighborSearch {
    /// Rebuild `out` with this search strategy.
    pub fn build_edges(
        self,
        grid: &mut SpatialGrid,
        positions: &[Vec3],
        colors: &[Vec3],
        connections: &mut [u32],
        params: ConnectionParams,
        out: &mut Vec<Edge>,
    ) {
        match self {
            NeighborSearch::BruteForce => build_edges(positions, colors, connections, params, out),
            NeighborSearch::Grid => grid.build_edges(positions, colors, connections, params, out),
        }
    }
}
