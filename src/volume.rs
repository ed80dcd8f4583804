//! Containment volumes that keep the particle cloud bounded.
//!
//! A [`Volume`] answers two questions for a point: is it inside, and if not,
//! how should the particle bounce. The two shapes bounce differently on
//! purpose:
//!
//! - [`Cylinder`] reflects axis by axis. Leaving through the top or bottom
//!   flips `velocity.y` only; leaving through the side clamps `(x, z)` back
//!   onto the wall and flips `velocity.x` and `velocity.z`.
//! - [`Tetrahedron`] has no axis-aligned faces, so any violation reverses the
//!   whole velocity and leaves the position where it is.
//!
//! Neither bounce clamps every coordinate, so a particle can spend the tick in
//! which it crossed the wall slightly outside. A particle that is outside but
//! already heading back in is left to drift home rather than bounced again.
//! [`BoundaryMode::Confine`] restores the previous position instead.

use crate::spawn::SpawnContext;
use crate::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Number of segments around the cylinder outline.
const OUTLINE_RADIAL_SEGMENTS: u32 = 32;
/// Number of stacked rings along the cylinder outline height.
const OUTLINE_HEIGHT_SEGMENTS: u32 = 10;
/// Fraction of the way to the wall a settled tetrahedron point stops at.
const SETTLE_MARGIN: f32 = 1.0 - 1e-5;

/// A convex region particles are kept inside.
pub trait Volume: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether `point` lies inside the volume (boundary included).
    fn contains(&self, point: Vec3) -> bool;

    /// Bounce a particle that is outside the volume.
    ///
    /// Only called when `!self.contains(*position)`.
    fn reflect(&self, position: &mut Vec3, velocity: &mut Vec3);

    /// Whether `velocity` moves an outside `position` back toward every wall
    /// it has crossed.
    fn heading_inward(&self, position: Vec3, velocity: Vec3) -> bool;

    /// Move an outside point onto the volume, leaving inside points alone.
    fn settle(&self, position: &mut Vec3);

    /// Draw a random interior point for seeding.
    fn sample(&self, ctx: &mut SpawnContext) -> Vec3;

    /// Wireframe outline of the volume as line segments.
    fn outline(&self) -> Vec<(Vec3, Vec3)>;
}

/// Upright cylinder centred on the origin, axis along Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    pub radius: f32,
    pub half_height: f32,
    /// Spawn with uniform area density instead of the raw radius draw.
    pub uniform_density: bool,
}

impl Cylinder {
    pub fn new(radius: f32, half_height: f32) -> Self {
        Self {
            radius,
            half_height,
            uniform_density: false,
        }
    }

    /// Distance from the Y axis.
    #[inline]
    pub fn radial_distance(point: Vec3) -> f32 {
        (point.x * point.x + point.z * point.z).sqrt()
    }
}

impl Default for Cylinder {
    fn default() -> Self {
        Self::new(500.0, 350.0)
    }
}

impl Volume for Cylinder {
    fn name(&self) -> &'static str {
        "cylinder"
    }

    fn contains(&self, point: Vec3) -> bool {
        Self::radial_distance(point) <= self.radius
            && point.y >= -self.half_height
            && point.y <= self.half_height
    }

    fn reflect(&self, position: &mut Vec3, velocity: &mut Vec3) {
        // Height: flip only, the position is left past the cap.
        if position.y < -self.half_height || position.y > self.half_height {
            velocity.y = -velocity.y;
        }

        if Self::radial_distance(*position) > self.radius {
            let angle = position.z.atan2(position.x);
            position.x = angle.cos() * self.radius;
            position.z = angle.sin() * self.radius;
            velocity.x = -velocity.x;
            velocity.z = -velocity.z;
        }
    }

    fn heading_inward(&self, position: Vec3, velocity: Vec3) -> bool {
        let above = position.y > self.half_height && velocity.y >= 0.0;
        let below = position.y < -self.half_height && velocity.y <= 0.0;
        let beside = Self::radial_distance(position) > self.radius
            && position.x * velocity.x + position.z * velocity.z >= 0.0;
        !(above || below || beside)
    }

    fn settle(&self, position: &mut Vec3) {
        position.y = position.y.clamp(-self.half_height, self.half_height);
        let r = Self::radial_distance(*position);
        if r > self.radius {
            let scale = self.radius / r;
            position.x *= scale;
            position.z *= scale;
        }
    }

    fn sample(&self, ctx: &mut SpawnContext) -> Vec3 {
        ctx.random_in_cylinder(self.radius, self.half_height, self.uniform_density)
    }

    fn outline(&self) -> Vec<(Vec3, Vec3)> {
        let ring_point = |segment: u32, y: f32| {
            let angle = segment as f32 / OUTLINE_RADIAL_SEGMENTS as f32 * TAU;
            Vec3::new(angle.cos() * self.radius, y, angle.sin() * self.radius)
        };

        let mut lines = Vec::new();
        for ring in 0..=OUTLINE_HEIGHT_SEGMENTS {
            let t = ring as f32 / OUTLINE_HEIGHT_SEGMENTS as f32;
            let y = -self.half_height + t * self.half_height * 2.0;
            for segment in 0..OUTLINE_RADIAL_SEGMENTS {
                lines.push((ring_point(segment, y), ring_point(segment + 1, y)));
            }
        }
        for segment in 0..OUTLINE_RADIAL_SEGMENTS {
            lines.push((
                ring_point(segment, -self.half_height),
                ring_point(segment, self.half_height),
            ));
        }
        lines
    }
}

/// One face of a tetrahedron as a half-space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Face {
    origin: Vec3,
    /// Unit normal pointing into the solid.
    normal: Vec3,
}

impl Face {
    #[inline]
    fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point - self.origin)
    }
}

/// Tetrahedron given by its four corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tetrahedron {
    vertices: [Vec3; 4],
    faces: [Face; 4],
}

impl Tetrahedron {
    /// Faces as vertex index triples; each winding points its normal inward
    /// for the default vertex layout.
    const FACES: [[usize; 3]; 4] = [[0, 1, 2], [0, 3, 1], [1, 3, 2], [2, 3, 0]];

    /// Build from four corners.
    ///
    /// Each face normal is oriented toward the centroid, so either vertex
    /// winding works.
    pub fn new(vertices: [Vec3; 4]) -> Self {
        let centroid = (vertices[0] + vertices[1] + vertices[2] + vertices[3]) * 0.25;
        let faces = Self::FACES.map(|[a, b, c]| {
            let origin = vertices[a];
            let mut normal = (vertices[b] - origin)
                .cross(vertices[c] - origin)
                .normalize_or_zero();
            if normal.dot(centroid - origin) < 0.0 {
                normal = -normal;
            }
            Face { origin, normal }
        });

        Self { vertices, faces }
    }

    /// Regular tetrahedron inscribed in the cube `[-s, s]^3`.
    pub fn regular(s: f32) -> Self {
        Self::new(default_tetrahedron_vertices(s))
    }

    pub fn vertices(&self) -> &[Vec3; 4] {
        &self.vertices
    }

    pub fn centroid(&self) -> Vec3 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2] + self.vertices[3]) * 0.25
    }

    /// Smallest signed distance to any face; negative means outside.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.faces
            .iter()
            .map(|face| face.signed_distance(point))
            .fold(f32::INFINITY, f32::min)
    }
}

impl Default for Tetrahedron {
    fn default() -> Self {
        Self::regular(285.0)
    }
}

impl Volume for Tetrahedron {
    fn name(&self) -> &'static str {
        "tetrahedron"
    }

    fn contains(&self, point: Vec3) -> bool {
        self.faces.iter().all(|face| face.signed_distance(point) >= 0.0)
    }

    fn reflect(&self, _position: &mut Vec3, velocity: &mut Vec3) {
        *velocity = -*velocity;
    }

    fn heading_inward(&self, position: Vec3, velocity: Vec3) -> bool {
        self.faces
            .iter()
            .filter(|face| face.signed_distance(position) < 0.0)
            .all(|face| face.normal.dot(velocity) > 0.0)
    }

    fn settle(&self, position: &mut Vec3) {
        // Walk back toward the centroid until every face is satisfied.
        let centroid = self.centroid();
        let t = self
            .faces
            .iter()
            .filter_map(|face| {
                let outside = face.signed_distance(*position);
                let inside = face.signed_distance(centroid);
                (outside < 0.0).then(|| inside / (inside - outside))
            })
            .fold(1.0f32, f32::min);
        if t < 1.0 {
            *position = centroid + (*position - centroid) * (t * SETTLE_MARGIN);
        }
    }

    fn sample(&self, ctx: &mut SpawnContext) -> Vec3 {
        ctx.random_in_tetrahedron(&self.vertices)
    }

    fn outline(&self) -> Vec<(Vec3, Vec3)> {
        let v = &self.vertices;
        vec![
            (v[0], v[1]),
            (v[0], v[2]),
            (v[0], v[3]),
            (v[1], v[2]),
            (v[1], v[3]),
            (v[2], v[3]),
        ]
    }
}

fn default_tetrahedron_vertices(s: f32) -> [Vec3; 4] {
    [
        Vec3::new(s, s, s),
        Vec3::new(-s, -s, s),
        Vec3::new(-s, s, -s),
        Vec3::new(s, -s, -s),
    ]
}

/// Serializable shape description, fixed for the life of a simulation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Cylinder {
        radius: f32,
        half_height: f32,
        #[serde(default)]
        uniform_density: bool,
    },
    Tetrahedron { vertices: [Vec3; 4] },
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Cylinder {
            radius: 500.0,
            half_height: 350.0,
            uniform_density: false,
        }
    }
}

impl Shape {
    /// Default tetrahedron with corners at `(±285, ±285, ±285)`.
    pub fn tetrahedron() -> Self {
        Shape::Tetrahedron {
            vertices: default_tetrahedron_vertices(285.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Cylinder { .. } => "cylinder",
            Shape::Tetrahedron { .. } => "tetrahedron",
        }
    }

    /// Check the dimensions describe a non-degenerate volume.
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            Shape::Cylinder { radius, half_height, .. } => {
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(format!("cylinder radius must be positive, got {radius}"));
                }
                if !(half_height.is_finite() && *half_height > 0.0) {
                    return Err(format!("cylinder half height must be positive, got {half_height}"));
                }
            }
            Shape::Tetrahedron { vertices } => {
                if !vertices.iter().all(|v| v.is_finite()) {
                    return Err("tetrahedron vertices must be finite".into());
                }
                let [a, b, c, d] = *vertices;
                let signed_volume = (b - a).cross(c - a).dot(d - a);
                if signed_volume.abs() <= f32::EPSILON {
                    return Err("tetrahedron vertices are coplanar".into());
                }
            }
        }
        Ok(())
    }

    /// Build the containment policy for this shape.
    pub fn build(&self) -> Box<dyn Volume> {
        match *self {
            Shape::Cylinder {
                radius,
                half_height,
                uniform_density,
            } => Box::new(Cylinder {
                radius,
                half_height,
                uniform_density,
            }),
            Shape::Tetrahedron { vertices } => Box::new(Tetrahedron::new(vertices)),
        }
    }
}

/// What happens to a particle the bounce leaves outside the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Keep the bounced position, even if it is still outside. The reversed
    /// velocity carries the particle back on the next tick, and a particle
    /// already heading back in is not bounced again.
    #[default]
    Reflect,
    /// Restore the pre-step position when the bounce leaves the particle
    /// outside, so it is inside at the end of every tick.
    Confine,
}

impl BoundaryMode {
    /// Advance one particle by one unit step and enforce the boundary.
    #[inline]
    pub fn step(self, volume: &dyn Volume, position: &mut Vec3, velocity: &mut Vec3) {
        let previous = *position;
        *position += *velocity;

        if volume.contains(*position) {
            return;
        }

        match self {
            BoundaryMode::Reflect => {
                if !volume.heading_inward(*position, *velocity) {
                    volume.reflect(position, velocity);
                }
            }
            BoundaryMode::Confine => {
                volume.reflect(position, velocity);
                if !volume.contains(*position) {
                    *position = previous;
                }
            }
        }
    }
}
