//! Proximity graph: which particles get a connecting line this tick.
//!
//! Every tick the edge list is rebuilt from scratch. Pairs `(i, j)` with
//! `i < j` are scanned in ascending `i`, then ascending `j`, and a pair is
//! connected when the particles are closer than `min_distance` and neither
//! has used up its connection cap. Because the scan order is fixed, lower
//! indices win when caps run out and the result is deterministic for a given
//! snapshot.

use crate::Vec3;

/// Thresholds for connecting particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionParams {
    /// Pairs strictly closer than this are connected.
    pub min_distance: f32,
    /// Whether `max_connections` is enforced.
    pub limit_connections: bool,
    /// Per-particle edge cap when `limit_connections` is set.
    pub max_connections: u32,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            min_distance: 150.0,
            limit_connections: true,
            max_connections: 20,
        }
    }
}

impl ConnectionParams {
    /// Squared threshold, or `None` when nothing can connect.
    #[inline]
    pub fn threshold_squared(&self) -> Option<f32> {
        // Also rejects NaN.
        if self.min_distance > 0.0 {
            Some(self.min_distance * self.min_distance)
        } else {
            None
        }
    }

    /// Whether a particle with `count` edges can take no more.
    #[inline]
    pub fn is_capped(&self, count: u32) -> bool {
        self.limit_connections && count >= self.max_connections
    }

    /// Upper bound on the edge count for `active` particles.
    pub fn max_edges(&self, active: usize) -> usize {
        let all_pairs = active * active.saturating_sub(1) / 2;
        if self.limit_connections {
            // Each edge uses two connection slots.
            all_pairs.min(active * self.max_connections as usize / 2)
        } else {
            all_pairs
        }
    }
}

/// A connecting segment, valid for the tick that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Lower particle index.
    pub a: u32,
    /// Higher particle index.
    pub b: u32,
    pub color_a: Vec3,
    pub color_b: Vec3,
}

/// Per-tick scan state shared by the brute-force and grid searches.
pub(crate) struct EdgeScan<'a> {
    positions: &'a [Vec3],
    colors: &'a [Vec3],
    connections: &'a mut [u32],
    params: ConnectionParams,
    threshold_squared: f32,
    out: &'a mut Vec<Edge>,
}

impl<'a> EdgeScan<'a> {
    /// Reset the counters and the output. Returns `None` when the threshold
    /// admits no edges, leaving both empty.
    pub(crate) fn begin(
        positions: &'a [Vec3],
        colors: &'a [Vec3],
        connections: &'a mut [u32],
        params: ConnectionParams,
        out: &'a mut Vec<Edge>,
    ) -> Option<Self> {
        debug_assert_eq!(positions.len(), colors.len());
        debug_assert_eq!(positions.len(), connections.len());

        out.clear();
        connections.fill(0);
        let threshold_squared = params.threshold_squared()?;

        Some(Self {
            positions,
            colors,
            connections,
            params,
            threshold_squared,
            out,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub(crate) fn positions(&self) -> &[Vec3] {
        self.positions
    }

    /// Whether particle `i` can still start pairs.
    #[inline]
    pub(crate) fn is_open(&self, i: usize) -> bool {
        !self.params.is_capped(self.connections[i])
    }

    /// Try to connect `i` with each candidate, in the order given.
    ///
    /// Candidates must be ascending and greater than `i`. Stops as soon as
    /// `i` reaches its cap; a capped `j` is skipped.
    pub(crate) fn scan_from(&mut self, i: usize, candidates: impl IntoIterator<Item = usize>) {
        let origin = self.positions[i];
        for j in candidates {
            if self.params.is_capped(self.connections[i]) {
                break;
            }
            if self.params.is_capped(self.connections[j]) {
                continue;
            }
            if origin.distance_squared(self.positions[j]) < self.threshold_squared {
                self.connections[i] += 1;
                self.connections[j] += 1;
                self.out.push(Edge {
                    a: i as u32,
                    b: j as u32,
                    color_a: self.colors[i],
                    color_b: self.colors[j],
                });
            }
        }
    }
}

/// Rebuild the edge list with the full pairwise scan.
///
/// `connections` is reset and then holds each particle's degree in the
/// produced graph. Runs in `O(n²)` for `n = positions.len()`.
pub fn build_edges(
    positions: &[Vec3],
    colors: &[Vec3],
    connections: &mut [u32],
    params: ConnectionParams,
    out: &mut Vec<Edge>,
) {
    let Some(mut scan) = EdgeScan::begin(positions, colors, connections, params, out) else {
        return;
    };

    let n = scan.len();
    for i in 0..n {
        if !scan.is_open(i) {
            continue;
        }
        scan.scan_from(i, i + 1..n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(positions: &[Vec3], params: ConnectionParams) -> (Vec<Edge>, Vec<u32>) {
        let colors = vec![Vec3::ONE; positions.len()];
        let mut connections = vec![7; positions.len()];
        let mut edges = Vec::new();
        build_edges(positions, &colors, &mut connections, params, &mut edges);
        (edges, connections)
    }

    fn uncapped(min_distance: f32) -> ConnectionParams {
        ConnectionParams {
            min_distance,
            limit_connections: false,
            max_connections: 0,
        }
    }

    #[test]
    fn test_two_particles_connect() {
        let (edges, connections) = run(
            &[Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0)],
            uncapped(100.0),
        );
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].a, edges[0].b), (0, 1));
        assert_eq!(connections, vec![1, 1]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let (edges, connections) = run(&[Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)], uncapped(100.0));
        assert!(edges.is_empty());
        assert_eq!(connections, vec![0, 0]);
    }

    #[test]
    fn test_cap_of_one_keeps_lowest_pair() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let params = ConnectionParams {
            min_distance: 10.0,
            limit_connections: true,
            max_connections: 1,
        };
        let (edges, connections) = run(&positions, params);
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].a, edges[0].b), (0, 1));
        assert_eq!(connections, vec![1, 1, 0]);
    }

    #[test]
    fn test_uncapped_cluster_is_complete() {
        let positions: Vec<Vec3> = (0..6).map(|i| Vec3::splat(i as f32)).collect();
        let (edges, connections) = run(&positions, uncapped(100.0));
        assert_eq!(edges.len(), 15);
        assert!(connections.iter().all(|c| *c == 5));
    }

    #[test]
    fn test_zero_cap_means_no_edges() {
        let params = ConnectionParams {
            min_distance: 10.0,
            limit_connections: true,
            max_connections: 0,
        };
        let (edges, _) = run(&[Vec3::ZERO, Vec3::X], params);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_degenerate_threshold_means_no_edges() {
        for min_distance in [0.0, -5.0, f32::NAN] {
            let (edges, connections) = run(&[Vec3::ZERO, Vec3::ZERO], uncapped(min_distance));
            assert!(edges.is_empty());
            assert_eq!(connections, vec![0, 0]);
        }
    }

    #[test]
    fn test_edges_carry_endpoint_colors() {
        let positions = [Vec3::ZERO, Vec3::X];
        let colors = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)];
        let mut connections = [0; 2];
        let mut edges = Vec::new();
        build_edges(&positions, &colors, &mut connections, uncapped(2.0), &mut edges);
        assert_eq!(edges[0].color_a, colors[0]);
        assert_eq!(edges[0].color_b, colors[1]);
    }

    #[test]
    fn test_capped_particle_still_joins_later_pairs_as_second() {
        // 0 and 1 are near each other; 2 is near only 1.
        let positions = [Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)];
        let params = ConnectionParams {
            min_distance: 6.0,
            limit_connections: true,
            max_connections: 2,
        };
        let (edges, connections) = run(&positions, params);
        let pairs: Vec<(u32, u32)> = edges.iter().map(|e| (e.a, e.b)).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
        assert_eq!(connections, vec![1, 2, 1]);
    }

    #[test]
    fn test_max_edges_bound() {
        let params = ConnectionParams {
            min_distance: 1.0,
            limit_connections: true,
            max_connections: 3,
        };
        assert_eq!(params.max_edges(100), 150);
        assert_eq!(params.max_edges(2), 1);
        assert_eq!(uncapped(1.0).max_edges(100), 4950);
        assert_eq!(uncapped(1.0).max_edges(0), 0);
    }
}
