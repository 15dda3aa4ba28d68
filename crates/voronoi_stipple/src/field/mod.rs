//! Density fields sampled by the initializer and the reduction pipeline.
//!
//! This module defines how external 2D inputs feed the engine:
//! - Define custom sources by implementing [`DensityField`].
//! - Use [`LuminanceGrid`] for owned row-major buffers, [`UniformField`] for constants,
//!   or [`FnField`] to wrap a closure.
//! - Map samples to ink weight with [`WeightMapping`] and resample them to the
//!   supersampled grid with [`WeightRaster`].
//!
//! Samples are luminance-like: `0.0` is black (maximum weight), `1.0` is white.
use crate::error::{Error, Result};

pub mod weights;

pub use weights::{WeightMapping, WeightRaster};

/// Trait for read-only 2D density fields addressed by integer pixel coordinates.
pub trait DensityField: Send + Sync {
    /// Field dimensions `(width, height)` in pixels.
    fn size(&self) -> (u32, u32);

    /// Sample at pixel `(x, y)`, in `[0, 1]`.
    fn sample(&self, x: u32, y: u32) -> f32;
}

impl<T: DensityField + ?Sized> DensityField for &T {
    fn size(&self) -> (u32, u32) {
        (**self).size()
    }

    fn sample(&self, x: u32, y: u32) -> f32 {
        (**self).sample(x, y)
    }
}

/// An owned row-major grid of samples.
#[derive(Clone, Debug, PartialEq)]
pub struct LuminanceGrid {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl LuminanceGrid {
    /// Creates a grid from row-major samples. Values are clamped to `[0, 1]`; NaN becomes `1.0`.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!(
                "density field must be non-empty, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "density field {width}x{height} needs {expected} samples, got {}",
                data.len()
            )));
        }
        let data = data.into_iter().map(sanitize).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a grid by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Result<Self> {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    /// Builds a grid from 8-bit gray values (`0` black, `255` white).
    pub fn from_luma8(width: u32, height: u32, luma: &[u8]) -> Result<Self> {
        Self::new(
            width,
            height,
            luma.iter().map(|&v| v as f32 / 255.0).collect(),
        )
    }

    /// Row-major samples.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl DensityField for LuminanceGrid {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn sample(&self, x: u32, y: u32) -> f32 {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        self.data[y * self.width as usize + x]
    }
}

/// A field with the same sample everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformField {
    pub width: u32,
    pub height: u32,
    pub value: f32,
}

impl UniformField {
    pub fn new(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            value: sanitize(value),
        }
    }
}

impl DensityField for UniformField {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn sample(&self, _x: u32, _y: u32) -> f32 {
        self.value
    }
}

/// A field that forwards to a user-provided closure.
pub struct FnField<F>
where
    F: Fn(u32, u32) -> f32 + Send + Sync,
{
    width: u32,
    height: u32,
    f: F,
}

impl<F> FnField<F>
where
    F: Fn(u32, u32) -> f32 + Send + Sync,
{
    pub fn new(width: u32, height: u32, f: F) -> Self {
        Self { width, height, f }
    }
}

impl<F> DensityField for FnField<F>
where
    F: Fn(u32, u32) -> f32 + Send + Sync,
{
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn sample(&self, x: u32, y: u32) -> f32 {
        sanitize((self.f)(
            x.min(self.width.saturating_sub(1)),
            y.min(self.height.saturating_sub(1)),
        ))
    }
}

/// Ensures a field has a usable size.
pub(crate) fn validate_field(field: &dyn DensityField) -> Result<(u32, u32)> {
    let (w, h) = field.size();
    if w == 0 || h == 0 {
        return Err(Error::InvalidConfig(format!(
            "density field must be non-empty, got {w}x{h}"
        )));
    }
    Ok((w, h))
}

#[inline]
fn sanitize(v: f32) -> f32 {
    if v.is_nan() {
        1.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
