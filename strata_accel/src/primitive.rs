// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive kinds and the [`Primitive`] trait the object holders test against.

use glam::{Vec2, Vec3};

use crate::types::{Aabb3, MotionBounds, Ray, Shutter, SurfaceHit};

/// A geometric primitive that can be bounded and intersected by rays.
pub trait Primitive: Send + Sync {
    /// Conservative bounds of the primitive (over its whole motion range, if it moves).
    fn bounds(&self) -> Aabb3;

    /// Bounds over a shutter window.
    fn motion_bounds(&self, _shutter: Shutter) -> MotionBounds {
        MotionBounds::Static(self.bounds())
    }

    /// Bounds of the part of the primitive inside `clip`, or `None` if it lies outside.
    fn clipped_bounds(&self, clip: &Aabb3) -> Option<Aabb3> {
        let b = self.bounds().intersect(clip);
        (!b.is_empty()).then_some(b)
    }

    /// Nearest intersection inside the ray's valid interval.
    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit>;

    /// Whether any intersection lies inside the ray's valid interval.
    fn occludes(&self, ray: &Ray) -> bool {
        self.intersect(ray).is_some()
    }
}

impl<P: Primitive + ?Sized> Primitive for &P {
    fn bounds(&self) -> Aabb3 {
        (**self).bounds()
    }
    fn motion_bounds(&self, shutter: Shutter) -> MotionBounds {
        (**self).motion_bounds(shutter)
    }
    fn clipped_bounds(&self, clip: &Aabb3) -> Option<Aabb3> {
        (**self).clipped_bounds(clip)
    }
    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        (**self).intersect(ray)
    }
    fn occludes(&self, ray: &Ray) -> bool {
        (**self).occludes(ray)
    }
}

/// Sphere given by center and radius.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    /// Center.
    pub center: Vec3,
    /// Radius.
    pub radius: f32,
}

impl Sphere {
    /// Create a sphere.
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Both roots of the ray/sphere quadratic, ascending.
fn sphere_roots(center: Vec3, radius: f32, ray: &Ray) -> Option<(f32, f32)> {
    let oc = ray.origin - center;
    let a = ray.direction.length_squared();
    if a == 0.0 {
        return None;
    }
    let half_b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let disc = half_b * half_b - a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    Some(((-half_b - sq) / a, (-half_b + sq) / a))
}

fn sphere_hit(center: Vec3, radius: f32, ray: &Ray) -> Option<SurfaceHit> {
    let (t0, t1) = sphere_roots(center, radius, ray)?;
    let t = if ray.accepts(t0) {
        t0
    } else if ray.accepts(t1) {
        t1
    } else {
        return None;
    };
    let normal = (ray.at(t) - center).normalize_or_zero();
    Some(SurfaceHit {
        t,
        normal,
        uv: spherical_uv(normal),
    })
}

/// Longitude/latitude parameterization of a unit direction.
fn spherical_uv(n: Vec3) -> Vec2 {
    let u = 0.5 + n.z.atan2(n.x) / core::f32::consts::TAU;
    let v = 0.5 - n.y.clamp(-1.0, 1.0).asin() / core::f32::consts::PI;
    Vec2::new(u, v)
}

impl Primitive for Sphere {
    fn bounds(&self) -> Aabb3 {
        Aabb3::from_center_half_extent(self.center, Vec3::splat(self.radius))
    }

    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        sphere_hit(self.center, self.radius, ray)
    }

    fn occludes(&self, ray: &Ray) -> bool {
        sphere_roots(self.center, self.radius, ray)
            .is_some_and(|(t0, t1)| ray.accepts(t0) || ray.accepts(t1))
    }
}

/// Solid axis-aligned box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisBox {
    /// Extent of the box.
    pub bounds: Aabb3,
}

impl AxisBox {
    /// Box centered at `center` with the given full `size`.
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self {
            bounds: Aabb3::from_center_half_extent(center, 0.5 * size),
        }
    }

    /// First face crossing inside the valid interval: the entry face, or the
    /// exit face when the interval starts inside the box.
    fn surface_t(&self, ray: &Ray) -> Option<f32> {
        let (entry, exit) = ray.slab_interval(&self.bounds)?;
        let t = if entry >= ray.t_min { entry } else { exit };
        (t.is_finite() && ray.accepts(t)).then_some(t)
    }

    /// Outward normal and face coordinates for a point on the surface.
    fn face_at(&self, p: Vec3) -> (Vec3, Vec2) {
        let b = &self.bounds;
        let rel = b.offset(p);
        let mut best = 0;
        let mut best_d = f32::INFINITY;
        let mut sign = 1.0;
        for a in 0..3 {
            let d_min = (p[a] - b.min[a]).abs();
            let d_max = (b.max[a] - p[a]).abs();
            if d_min < best_d {
                best_d = d_min;
                best = a;
                sign = -1.0;
            }
            if d_max < best_d {
                best_d = d_max;
                best = a;
                sign = 1.0;
            }
        }
        let mut normal = Vec3::ZERO;
        normal[best] = sign;
        let (u, v) = match best {
            0 => (rel.z, rel.y),
            1 => (rel.x, rel.z),
            _ => (rel.x, rel.y),
        };
        (normal, Vec2::new(u, v))
    }
}

impl Primitive for AxisBox {
    fn bounds(&self) -> Aabb3 {
        self.bounds
    }

    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let t = self.surface_t(ray)?;
        let (normal, uv) = self.face_at(ray.at(t));
        Some(SurfaceHit { t, normal, uv })
    }

    fn occludes(&self, ray: &Ray) -> bool {
        self.surface_t(ray).is_some()
    }
}

/// Triangle with per-vertex texture coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    /// Vertex positions.
    pub positions: [Vec3; 3],
    /// Vertex texture coordinates.
    pub uvs: [Vec2; 3],
}

impl Triangle {
    /// Triangle with default texture coordinates `(0,0)`, `(1,0)`, `(0,1)`.
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            positions: [a, b, c],
            uvs: [Vec2::ZERO, Vec2::X, Vec2::Y],
        }
    }

    /// Triangle with explicit texture coordinates.
    pub const fn with_uvs(positions: [Vec3; 3], uvs: [Vec2; 3]) -> Self {
        Self { positions, uvs }
    }
}

/// Möller–Trumbore test. Returns `(t, b1, b2)` with barycentrics of vertices 1 and 2.
pub(crate) fn intersect_triangle(p: &[Vec3; 3], ray: &Ray) -> Option<(f32, f32, f32)> {
    const EPS: f32 = 1e-9;
    let e1 = p[1] - p[0];
    let e2 = p[2] - p[0];
    let pvec = ray.direction.cross(e2);
    let det = e1.dot(pvec);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = ray.origin - p[0];
    let b1 = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&b1) {
        return None;
    }
    let qvec = tvec.cross(e1);
    let b2 = ray.direction.dot(qvec) * inv_det;
    if b2 < 0.0 || b1 + b2 > 1.0 {
        return None;
    }
    let t = e2.dot(qvec) * inv_det;
    ray.accepts(t).then_some((t, b1, b2))
}

/// Bounds of the triangle clipped to `clip` (Sutherland–Hodgman against the six planes).
pub(crate) fn clip_triangle_bounds(p: &[Vec3; 3], clip: &Aabb3) -> Option<Aabb3> {
    let mut poly: Vec<Vec3> = p.to_vec();
    for axis in 0..3 {
        for (bound, keep_above) in [(clip.min[axis], true), (clip.max[axis], false)] {
            if poly.is_empty() {
                return None;
            }
            let inside = |v: Vec3| {
                if keep_above {
                    v[axis] >= bound
                } else {
                    v[axis] <= bound
                }
            };
            let mut next = Vec::with_capacity(poly.len() + 2);
            for i in 0..poly.len() {
                let a = poly[i];
                let b = poly[(i + 1) % poly.len()];
                let (ia, ib) = (inside(a), inside(b));
                if ia {
                    next.push(a);
                }
                if ia != ib {
                    let s = (bound - a[axis]) / (b[axis] - a[axis]);
                    let mut q = a + (b - a) * s;
                    q[axis] = bound;
                    next.push(q);
                }
            }
            poly = next;
        }
    }
    if poly.is_empty() {
        None
    } else {
        Some(Aabb3::from_iter_points(poly))
    }
}

pub(crate) fn triangle_hit(positions: &[Vec3; 3], uvs: &[Vec2; 3], ray: &Ray) -> Option<SurfaceHit> {
    let (t, b1, b2) = intersect_triangle(positions, ray)?;
    let b0 = 1.0 - b1 - b2;
    let normal = (positions[1] - positions[0])
        .cross(positions[2] - positions[0])
        .normalize_or_zero();
    Some(SurfaceHit {
        t,
        normal,
        uv: uvs[0] * b0 + uvs[1] * b1 + uvs[2] * b2,
    })
}

impl Primitive for Triangle {
    fn bounds(&self) -> Aabb3 {
        Aabb3::from_iter_points(self.positions)
    }

    fn clipped_bounds(&self, clip: &Aabb3) -> Option<Aabb3> {
        clip_triangle_bounds(&self.positions, clip)
    }

    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        triangle_hit(&self.positions, &self.uvs, ray)
    }

    fn occludes(&self, ray: &Ray) -> bool {
        intersect_triangle(&self.positions, ray).is_some()
    }
}

/// Sphere moving linearly from `center0` at `time0` to `center1` at `time1`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MovingSphere {
    /// Center at `time0`.
    pub center0: Vec3,
    /// Center at `time1`.
    pub center1: Vec3,
    /// Start of the motion.
    pub time0: f32,
    /// End of the motion.
    pub time1: f32,
    /// Radius.
    pub radius: f32,
}

impl MovingSphere {
    /// Center at `time`, clamped to the motion range.
    pub fn center_at(&self, time: f32) -> Vec3 {
        let span = self.time1 - self.time0;
        if span <= 0.0 {
            return self.center0;
        }
        let s = ((time - self.time0) / span).clamp(0.0, 1.0);
        self.center0.lerp(self.center1, s)
    }

    fn bounds_at(&self, time: f32) -> Aabb3 {
        Aabb3::from_center_half_extent(self.center_at(time), Vec3::splat(self.radius))
    }
}

impl Primitive for MovingSphere {
    fn bounds(&self) -> Aabb3 {
        self.bounds_at(self.time0).union(self.bounds_at(self.time1))
    }

    fn motion_bounds(&self, shutter: Shutter) -> MotionBounds {
        MotionBounds::Sampled {
            open: self.bounds_at(shutter.open),
            close: self.bounds_at(shutter.close),
        }
    }

    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        sphere_hit(self.center_at(ray.time), self.radius, ray)
    }
}

/// Point sample rendered as a ray-facing disc.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointSplat {
    /// Sample position.
    pub position: Vec3,
    /// Disc radius.
    pub radius: f32,
}

impl Primitive for PointSplat {
    fn bounds(&self) -> Aabb3 {
        Aabb3::from_center_half_extent(self.position, Vec3::splat(self.radius))
    }

    fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let len2 = ray.direction.length_squared();
        if len2 == 0.0 {
            return None;
        }
        let t = (self.position - ray.origin).dot(ray.direction) / len2;
        if !ray.accepts(t) {
            return None;
        }
        let d = ray.at(t) - self.position;
        if d.length_squared() > self.radius * self.radius {
            return None;
        }
        let normal = -ray.direction / len2.sqrt();
        let uv = if self.radius > 0.0 {
            Vec2::splat(0.5) + 0.5 * Vec2::new(d.x, d.y) / self.radius
        } else {
            Vec2::splat(0.5)
        };
        Some(SurfaceHit { t, normal, uv })
    }
}
