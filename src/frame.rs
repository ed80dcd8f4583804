//! Per-tick output handed to the renderer.
//!
//! A [`Frame`] borrows the simulation immutably, so the buffers cannot change
//! while the renderer reads them; the next tick needs `&mut Simulation`.

use bytemuck::{Pod, Zeroable};

use crate::graph::Edge;
use crate::Vec3;

/// Vertex for drawing a particle as a point.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Vertex for drawing connections as disjoint line segments (two per edge).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Read-only view of one tick's result.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub(crate) number: u64,
    pub(crate) positions: &'a [Vec3],
    pub(crate) colors: &'a [Vec3],
    pub(crate) connections: &'a [u32],
    pub(crate) edges: &'a [Edge],
}

impl<'a> Frame<'a> {
    /// Ticks completed, this one included.
    #[inline]
    pub fn frame_number(&self) -> u64 {
        self.number
    }

    /// Active particle positions.
    #[inline]
    pub fn positions(&self) -> &'a [Vec3] {
        self.positions
    }

    /// Active particle colors.
    #[inline]
    pub fn colors(&self) -> &'a [Vec3] {
        self.colors
    }

    /// Edges per active particle.
    #[inline]
    pub fn connections(&self) -> &'a [u32] {
        self.connections
    }

    #[inline]
    pub fn edges(&self) -> &'a [Edge] {
        self.edges
    }

    /// Number of line vertices to draw: two per edge.
    #[inline]
    pub fn draw_range(&self) -> usize {
        self.edges.len() * 2
    }

    /// Edges as endpoint segments `(pos_a, pos_b, color_a, color_b)`.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3, Vec3, Vec3)> + 'a {
        let positions = self.positions;
        let edges = self.edges;
        edges.iter().map(move |e| {
            (
                positions[e.a as usize],
                positions[e.b as usize],
                e.color_a,
                e.color_b,
            )
        })
    }

    pub fn point_vertices(&self) -> Vec<PointVertex> {
        self.positions
            .iter()
            .zip(self.colors)
            .map(|(p, c)| PointVertex {
                position: p.to_array(),
                color: c.to_array(),
            })
            .collect()
    }

    /// Flat segment list, ready for `bytemuck::cast_slice`.
    pub fn line_vertices(&self) -> Vec<LineVertex> {
        let mut vertices = Vec::with_capacity(self.draw_range());
        for (pa, pb, ca, cb) in self.segments() {
            vertices.push(LineVertex {
                position: pa.to_array(),
                color: ca.to_array(),
            });
            vertices.push(LineVertex {
                position: pb.to_array(),
                color: cb.to_array(),
            });
        }
        vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<PointVertex>(), 24);
        assert_eq!(std::mem::size_of::<LineVertex>(), 24);
    }

    #[test]
    fn test_line_vertices_follow_edges() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let colors = [Vec3::ONE, Vec3::ZERO, Vec3::Z];
        let edges = [Edge {
            a: 0,
            b: 2,
            color_a: colors[0],
            color_b: colors[2],
        }];
        let frame = Frame {
            number: 1,
            positions: &positions,
            colors: &colors,
            connections: &[1, 0, 1],
            edges: &edges,
        };

        assert_eq!(frame.draw_range(), 2);
        let lines = frame.line_vertices();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(lines[1].position, [0.0, 1.0, 0.0]);
        assert_eq!(lines[1].color, [0.0, 0.0, 1.0]);

        let bytes: &[u8] = bytemuck::cast_slice(&lines);
        assert_eq!(bytes.len(), 48);
        assert_eq!(frame.point_vertices().len(), 3);
    }
}
