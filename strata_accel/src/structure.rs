// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structure trait: the construction algorithm and traversal behind an [`Accel`](crate::Accel).

use core::fmt::Debug;

use crate::config::BuildConfig;
use crate::holder::ObjectHolder;
use crate::stats::TreeStats;
use crate::texture::OpacityTexture;
use crate::types::{Aabb3, Ray, RayHit, Selection};

bitflags::bitflags! {
    /// Queries a structure answers for real rather than through the conservative defaults.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Nearest-hit queries.
        const NEAREST     = 0b0000_0001;
        /// Any-hit occlusion queries.
        const OCCLUSION   = 0b0000_0010;
        /// Alpha-tested queries.
        const ALPHA       = 0b0000_0100;
        /// Progressive selection for picking.
        const LAZY        = 0b0000_1000;
        /// Builds over shutter-window bounds.
        const MOTION_BLUR = 0b0001_0000;
    }
}

/// Spatial structure over the objects of an [`ObjectHolder`].
///
/// Structures never own the holder; the [`Accel`](crate::Accel) pairs the two
/// and passes the holder into every call. Holder methods are resolved
/// statically, so per-candidate tests inline into the traversal loop.
///
/// The alpha and lazy queries default to the conservative "no hit" answer;
/// callers distinguish "unsupported" from "missed" through [`Structure::capabilities`].
pub trait Structure: Default + Debug + Send + Sync {
    /// Queries this structure implements.
    fn capabilities(&self) -> Capabilities;

    /// Build over every object of `holder`, replacing any previous contents.
    fn build<H: ObjectHolder>(&mut self, holder: &H, config: &BuildConfig);

    /// Drop the built contents.
    fn clear(&mut self);

    /// Bounds of everything the structure covers.
    fn bounds(&self) -> Aabb3;

    /// Nearest hit along `ray`.
    fn did_hit_object<H: ObjectHolder>(&self, holder: &H, ray: &Ray) -> Option<RayHit>;

    /// Whether anything blocks `ray`.
    fn does_occlude<H: ObjectHolder>(&self, holder: &H, ray: &Ray) -> bool;

    /// Nearest alpha-tested hit along `ray`.
    fn did_hit_object_alpha<H: ObjectHolder, X: OpacityTexture + ?Sized>(
        &self,
        _holder: &H,
        _ray: &Ray,
        _texture: &X,
    ) -> Option<RayHit> {
        None
    }

    /// Whether anything opaque in `texture` blocks `ray`.
    fn does_occlude_alpha<H: ObjectHolder, X: OpacityTexture + ?Sized>(
        &self,
        _holder: &H,
        _ray: &Ray,
        _texture: &X,
    ) -> bool {
        false
    }

    /// Nearest progressive selection along `ray` at refinement level `sub_level`.
    fn hit_object_lazy<H: ObjectHolder>(
        &self,
        _holder: &H,
        _ray: &Ray,
        _sub_level: u32,
    ) -> Option<Selection> {
        None
    }

    /// Shape summary of the built contents.
    fn stats(&self) -> TreeStats;

    /// Bytes owned by the structure; `0` if unknown.
    fn memory_usage(&self) -> usize {
        0
    }
}
