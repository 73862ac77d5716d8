// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opacity textures sampled by alpha-tested queries.

use glam::Vec2;

/// Hits with opacity below this value are treated as transparent.
pub const ALPHA_CUTOFF: f32 = 0.5;

/// A texture that reports opacity in `[0, 1]` at texture coordinates.
pub trait OpacityTexture: Sync {
    /// Opacity at `uv`.
    fn opacity(&self, uv: Vec2) -> f32;

    /// Whether a hit at `uv` lets the ray pass through.
    fn is_transparent(&self, uv: Vec2) -> bool {
        self.opacity(uv) < ALPHA_CUTOFF
    }
}

/// The same opacity everywhere.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConstantOpacity(pub f32);

impl OpacityTexture for ConstantOpacity {
    fn opacity(&self, _uv: Vec2) -> f32 {
        self.0
    }
}

/// Row-major grid of opacity texels, sampled nearest-texel with wrap-around.
#[derive(Clone, Debug, PartialEq)]
pub struct AlphaMask {
    width: usize,
    height: usize,
    texels: Vec<f32>,
}

impl AlphaMask {
    /// Create a mask. Missing texels are filled with full opacity; extra texels are dropped.
    pub fn new(width: usize, height: usize, mut texels: Vec<f32>) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        texels.resize(width * height, 1.0);
        Self {
            width,
            height,
            texels,
        }
    }

    /// Mask of `width`×`height` texels produced by `f(x, y)`.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut texels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                texels.push(f(x, y));
            }
        }
        Self::new(width, height, texels)
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Wrapped texel coordinates are in [0, size) before the cast."
    )]
    fn texel_index(&self, uv: Vec2) -> usize {
        let u = uv.x - uv.x.floor();
        let v = uv.y - uv.y.floor();
        let x = ((u * self.width as f32) as usize).min(self.width - 1);
        let y = ((v * self.height as f32) as usize).min(self.height - 1);
        y * self.width + x
    }
}

impl OpacityTexture for AlphaMask {
    fn opacity(&self, uv: Vec2) -> f32 {
        if uv.is_finite() {
            self.texels[self.texel_index(uv)]
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_cutoff() {
        assert!(ConstantOpacity(0.0).is_transparent(Vec2::ZERO));
        assert!(!ConstantOpacity(1.0).is_transparent(Vec2::ZERO));
    }

    #[test]
    fn mask_samples_nearest_and_wraps() {
        let m = AlphaMask::from_fn(2, 1, |x, _| if x == 0 { 0.0 } else { 1.0 });
        assert!(m.is_transparent(Vec2::new(0.25, 0.5)));
        assert!(!m.is_transparent(Vec2::new(0.75, 0.5)));
        assert!(m.is_transparent(Vec2::new(1.25, 0.5)));
        assert!(!m.is_transparent(Vec2::new(-0.25, 0.5)));
    }

    #[test]
    fn short_texel_buffer_is_padded_opaque() {
        let m = AlphaMask::new(2, 2, vec![0.0]);
        assert!(m.is_transparent(Vec2::new(0.1, 0.1)));
        assert!(!m.is_transparent(Vec2::new(0.9, 0.9)));
    }
}
