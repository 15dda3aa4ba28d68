//! Site initialization strategies.
//!
//! This module defines the [`SiteInitializer`] trait used by the relaxation driver to place
//! the initial sites, plus the concrete strategies:
//! - [`RejectionSampling`]: density-biased rejection sampling (darker pixels accepted more often).
//! - [`UniformSiteSampling`]: density-blind uniform placement.
//!
//! Positions are returned in field pixel space, `[0, W) x [0, H)`.
use mint::Vector2;
use rand::Rng;

use crate::error::Result;
use crate::field::{DensityField, WeightMapping};

pub mod rejection;
pub mod uniform;

pub use rejection::RejectionSampling;
pub use uniform::UniformSiteSampling;

/// Trait for initial site placement.
pub trait SiteInitializer: Send + Sync {
    /// Number of sites this initializer produces.
    fn count(&self) -> usize;

    fn initialize(
        &self,
        field: &dyn DensityField,
        mapping: WeightMapping,
        rng: &mut dyn Rng,
    ) -> Result<Vec<Vector2<f32>>>;
}

/// Generate a random float in the range [0, 1].
#[inline]
pub(crate) fn rand01(rng: &mut dyn Rng) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Picks a pixel index in `[0, extent)`.
#[inline]
pub(crate) fn rand_index(rng: &mut dyn Rng, extent: u32) -> u32 {
    ((rand01(rng) * extent as f32) as u32).min(extent.saturating_sub(1))
}

/// Uniform position inside pixel `(px, py)`, kept strictly below the pixel's far edges.
#[inline]
pub(crate) fn jitter_in_pixel(rng: &mut dyn Rng, px: u32, py: u32) -> Vector2<f32> {
    let x0 = px as f32;
    let y0 = py as f32;
    let x = (x0 + rand01(rng)).clamp(x0, next_down(x0 + 1.0));
    let y = (y0 + rand01(rng)).clamp(y0, next_down(y0 + 1.0));
    Vector2 { x, y }
}

/// Largest `f32` strictly below `val`; keeps clamped coordinates inside `[0, extent)`.
#[inline]
pub(crate) fn next_down(val: f32) -> f32 {
    if val.is_nan() || val == f32::NEG_INFINITY {
        val
    } else if val == f32::INFINITY {
        f32::MAX
    } else if val == 0.0 {
        -f32::MIN_POSITIVE
    } else if val > 0.0 {
        f32::from_bits(val.to_bits() - 1)
    } else {
        f32::from_bits(val.to_bits() + 1)
    }
}
