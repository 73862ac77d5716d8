// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers: boxes, rays, hit records.

use core::fmt::Debug;

use glam::{Vec2, Vec3};

/// One of the three coordinate axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    /// The x axis.
    #[default]
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Index of the axis (`0`, `1` or `2`).
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Axis for an index; indices above `2` map to [`Axis::Z`].
    #[inline]
    pub const fn from_index(i: usize) -> Self {
        match i {
            0 => Self::X,
            1 => Self::Y,
            _ => Self::Z,
        }
    }
}

/// Axis-aligned bounding box in 3D.
///
/// The empty box is represented with `min = +inf` and `max = -inf`, so that
/// [`Aabb3::union`] with any other box yields that box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb3 {
    /// The empty box; identity for [`Aabb3::union`].
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create a new AABB from min/max corners.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing both points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box centered at `center` extending `half` along each axis.
    pub fn from_center_half_extent(center: Vec3, half: Vec3) -> Self {
        let half = half.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box containing every point of the iterator. Empty if there are none.
    pub fn from_iter_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, Self::grow)
    }

    /// Union of two boxes.
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// This box grown to contain `p`.
    #[inline]
    pub fn grow(self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// The intersection of two boxes. May be empty.
    #[inline]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Return true if the box is inverted. Flat boxes (zero extent on an axis) are not empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Whether both corners are finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Whether this box contains the point (boundary inclusive).
    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Whether this box fully contains `other`. An empty `other` is always contained.
    pub fn contains_aabb(&self, other: &Self) -> bool {
        other.is_empty() || (other.min.cmpge(self.min).all() && other.max.cmple(self.max).all())
    }

    /// Center of the box.
    #[inline]
    pub fn centroid(&self) -> Vec3 {
        0.5 * (self.min + self.max)
    }

    /// Size of the box along each axis; zero for an empty box.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Surface area of the box; zero for an empty box.
    #[inline]
    pub fn surface_area(&self) -> f32 {
        let e = self.extent();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }

    /// Axis of largest extent. Ties resolve toward the lower axis.
    pub fn largest_axis(&self) -> Axis {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            Axis::X
        } else if e.y >= e.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Relative position of `p` inside the box, `0` at `min` and `1` at `max`.
    ///
    /// Axes with zero extent report `0`.
    pub fn offset(&self, p: Vec3) -> Vec3 {
        let mut o = p - self.min;
        let e = self.extent();
        for a in 0..3 {
            o[a] = if e[a] > 0.0 { o[a] / e[a] } else { 0.0 };
        }
        o
    }

    /// Nearest point inside the box.
    pub fn clamp_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }
}

/// Shutter window `[open, close]` for motion-blurred primitives.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Shutter {
    /// Time at which the shutter opens.
    pub open: f32,
    /// Time at which the shutter closes.
    pub close: f32,
}

impl Default for Shutter {
    fn default() -> Self {
        Self {
            open: 0.0,
            close: 1.0,
        }
    }
}

impl Shutter {
    /// Create a shutter window. The bounds are reordered if given reversed.
    pub fn new(open: f32, close: f32) -> Self {
        if close < open {
            Self {
                open: close,
                close: open,
            }
        } else {
            Self { open, close }
        }
    }
}

/// Bounding box(es) of a primitive over a shutter window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MotionBounds {
    /// The primitive does not move; one box covers the whole window.
    Static(Aabb3),
    /// Boxes at the shutter open and close times.
    Sampled {
        /// Box at shutter open.
        open: Aabb3,
        /// Box at shutter close.
        close: Aabb3,
    },
}

impl MotionBounds {
    /// A single box covering the whole window (for linear motion).
    pub fn union(&self) -> Aabb3 {
        match *self {
            Self::Static(b) => b,
            Self::Sampled { open, close } => open.union(close),
        }
    }
}

/// A ray with a valid parameter interval `[t_min, t_max]` and a sample time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Origin.
    pub origin: Vec3,
    /// Direction; need not be normalized. Distances are in units of this vector.
    pub direction: Vec3,
    /// Component-wise reciprocal of `direction`.
    pub inv_direction: Vec3,
    /// Lower bound of the valid interval.
    pub t_min: f32,
    /// Upper bound of the valid interval.
    pub t_max: f32,
    /// Sample time for motion-blurred primitives.
    pub time: f32,
}

impl Ray {
    /// Create a ray with interval `[0, inf)` at time `0`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
            t_min: 0.0,
            t_max: f32::INFINITY,
            time: 0.0,
        }
    }

    /// This ray with a different valid interval.
    #[must_use]
    pub fn with_interval(self, t_min: f32, t_max: f32) -> Self {
        Self {
            t_min,
            t_max,
            ..self
        }
    }

    /// This ray at a different sample time.
    #[must_use]
    pub fn with_time(self, time: f32) -> Self {
        Self { time, ..self }
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Whether `t` lies inside the valid interval.
    #[inline]
    pub fn accepts(&self, t: f32) -> bool {
        t >= self.t_min && t <= self.t_max
    }

    /// Slab test against a box. Returns the entry/exit parameters clipped to the valid interval.
    pub fn intersect_aabb(&self, b: &Aabb3) -> Option<(f32, f32)> {
        self.slabs(b, self.t_min, self.t_max)
    }

    /// Entry and exit parameters of the infinite line through the ray, ignoring the valid interval.
    pub fn slab_interval(&self, b: &Aabb3) -> Option<(f32, f32)> {
        self.slabs(b, f32::NEG_INFINITY, f32::INFINITY)
    }

    fn slabs(&self, b: &Aabb3, mut t0: f32, mut t1: f32) -> Option<(f32, f32)> {
        for a in 0..3 {
            let inv = self.inv_direction[a];
            let mut near = (b.min[a] - self.origin[a]) * inv;
            let mut far = (b.max[a] - self.origin[a]) * inv;
            if inv < 0.0 {
                core::mem::swap(&mut near, &mut far);
            }
            // NaN (origin on a slab plane of a parallel ray) leaves the interval untouched.
            if near > t0 {
                t0 = near;
            }
            if far < t1 {
                t1 = far;
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

/// Geometric result of intersecting one primitive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfaceHit {
    /// Ray parameter of the hit.
    pub t: f32,
    /// Geometric normal at the hit (unit length where defined).
    pub normal: Vec3,
    /// Texture coordinates at the hit.
    pub uv: Vec2,
}

/// Nearest-hit record returned by ray queries.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// Ray parameter of the hit.
    pub t: f32,
    /// Holder index of the hit primitive.
    pub primitive: usize,
    /// Back-reference to the originating higher-level object, for holders that carry one.
    pub extra: Option<usize>,
    /// World-space hit point.
    pub point: Vec3,
    /// Geometric normal.
    pub normal: Vec3,
    /// Texture coordinates.
    pub uv: Vec2,
}

impl RayHit {
    /// Assemble a hit record from a primitive-level result.
    pub fn from_surface(ray: &Ray, primitive: usize, surface: SurfaceHit) -> Self {
        Self {
            t: surface.t,
            primitive,
            extra: None,
            point: ray.at(surface.t),
            normal: surface.normal,
            uv: surface.uv,
        }
    }

    /// Attach a back-reference.
    #[must_use]
    pub fn with_extra(self, extra: usize) -> Self {
        Self {
            extra: Some(extra),
            ..self
        }
    }
}

/// Progressive selection result for interactive picking.
///
/// Level `0` selections come from bounding boxes alone; higher levels run exact tests.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Selection {
    /// Holder index of the selected primitive.
    pub primitive: usize,
    /// Ray parameter: box entry for inexact selections, surface hit otherwise.
    pub t: f32,
    /// Refinement level this selection was computed at.
    pub level: u32,
    /// Whether an exact primitive test confirmed the selection.
    pub exact: bool,
}
