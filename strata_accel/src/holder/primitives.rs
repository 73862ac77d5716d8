// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Holders over [`Primitive`] values: borrowed references, owned values, and a zero-copy slice view.

use core::fmt::Debug;

use crate::holder::ObjectHolder;
use crate::primitive::Primitive;
use crate::types::{Aabb3, MotionBounds, Ray, RayHit, Shutter};

/// Borrowed references to primitives owned elsewhere.
pub struct RefHolder<'a, P: Primitive> {
    objects: Vec<&'a P>,
}

impl<P: Primitive> Default for RefHolder<'_, P> {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
        }
    }
}

impl<P: Primitive> Debug for RefHolder<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RefHolder")
            .field("objects", &self.objects.len())
            .finish()
    }
}

impl<'a, P: Primitive> RefHolder<'a, P> {
    /// Hold the given references.
    pub fn new(objects: Vec<&'a P>) -> Self {
        Self { objects }
    }

    /// Hold a reference to every element of `objects`.
    pub fn from_slice(objects: &'a [P]) -> Self {
        Self {
            objects: objects.iter().collect(),
        }
    }

    /// Append a reference.
    pub fn push(&mut self, object: &'a P) {
        self.objects.push(object);
    }

    /// The held reference at `index`.
    pub fn get(&self, index: usize) -> Option<&'a P> {
        self.objects.get(index).copied()
    }
}

/// Owned primitive values.
pub struct ValueHolder<P: Primitive> {
    objects: Vec<P>,
}

impl<P: Primitive> Default for ValueHolder<P> {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
        }
    }
}

impl<P: Primitive> Debug for ValueHolder<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ValueHolder")
            .field("objects", &self.objects.len())
            .finish()
    }
}

impl<P: Primitive> ValueHolder<P> {
    /// Take ownership of `objects`.
    pub fn new(objects: Vec<P>) -> Self {
        Self { objects }
    }

    /// Append an object.
    pub fn push(&mut self, object: P) {
        self.objects.push(object);
    }

    /// The owned objects, in holder index order.
    pub fn objects(&self) -> &[P] {
        &self.objects
    }
}

impl<P: Primitive> From<Vec<P>> for ValueHolder<P> {
    fn from(objects: Vec<P>) -> Self {
        Self::new(objects)
    }
}

/// Zero-copy view of a primitive slice. Object `i` is element `i` of the slice.
pub struct IndexHolder<'a, P: Primitive> {
    objects: &'a [P],
}

impl<P: Primitive> Default for IndexHolder<'_, P> {
    fn default() -> Self {
        Self { objects: &[] }
    }
}

impl<P: Primitive> Debug for IndexHolder<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IndexHolder")
            .field("objects", &self.objects.len())
            .finish()
    }
}

impl<'a, P: Primitive> IndexHolder<'a, P> {
    /// View `objects` without copying.
    pub fn new(objects: &'a [P]) -> Self {
        Self { objects }
    }
}

/// Shared per-object plumbing for the three primitive-backed holders.
///
/// Each holder supplies `object`, `release` and `bytes` as inherent helpers.
macro_rules! primitive_holder {
    ($holder:ty) => {
        impl<P: Primitive> ObjectHolder for $holder {
            fn size(&self) -> usize {
                self.objects.len()
            }

            fn object_bounds(&self, index: usize) -> Aabb3 {
                self.object(index).bounds()
            }

            fn object_motion_bounds(&self, index: usize, shutter: Shutter) -> MotionBounds {
                self.object(index).motion_bounds(shutter)
            }

            fn object_clipped_bounds(&self, index: usize, clip: &Aabb3) -> Option<Aabb3> {
                self.object(index).clipped_bounds(clip)
            }

            fn did_hit_object(&self, index: usize, ray: &Ray) -> Option<RayHit> {
                let surface = self.object(index).intersect(ray)?;
                Some(RayHit::from_surface(ray, index, surface))
            }

            fn does_occlude(&self, index: usize, ray: &Ray) -> bool {
                self.object(index).occludes(ray)
            }

            fn clear(&mut self) {
                self.release();
            }

            fn memory_usage(&self) -> usize {
                self.bytes()
            }
        }
    };
}

impl<P: Primitive> RefHolder<'_, P> {
    #[inline]
    fn object(&self, index: usize) -> &P {
        self.objects[index]
    }

    fn release(&mut self) {
        self.objects = Vec::new();
    }

    fn bytes(&self) -> usize {
        size_of_val(self.objects.as_slice())
    }
}

impl<P: Primitive> ValueHolder<P> {
    #[inline]
    fn object(&self, index: usize) -> &P {
        &self.objects[index]
    }

    fn release(&mut self) {
        self.objects = Vec::new();
    }

    fn bytes(&self) -> usize {
        size_of_val(self.objects.as_slice())
    }
}

impl<P: Primitive> IndexHolder<'_, P> {
    #[inline]
    fn object(&self, index: usize) -> &P {
        &self.objects[index]
    }

    fn release(&mut self) {
        self.objects = &[];
    }

    // Borrowed storage.
    fn bytes(&self) -> usize {
        0
    }
}

primitive_holder!(RefHolder<'_, P>);
primitive_holder!(ValueHolder<P>);
primitive_holder!(IndexHolder<'_, P>);
