//! Ink weights derived from density samples.
//!
//! Stores one weight per cell of the supersampled grid. Built once per run because the
//! field is immutable while the engine relaxes.
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::field::DensityField;

/// Maps a density sample to an ink weight: `floor + (1 - floor) * (1 - sample)`.
///
/// The mapping is monotonically decreasing in the sample. A positive `floor` keeps white
/// regions from producing zero-weight cells.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightMapping {
    pub floor: f32,
}

impl WeightMapping {
    /// Creates a mapping with the given floor in `[0, 1)`.
    pub fn new(floor: f32) -> Self {
        Self { floor }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.floor) {
            return Err(Error::InvalidConfig(format!(
                "weight floor must be in [0, 1), got {}",
                self.floor
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn weight(&self, sample: f32) -> f32 {
        self.floor + (1.0 - self.floor) * (1.0 - sample.clamp(0.0, 1.0))
    }
}

impl Default for WeightMapping {
    fn default() -> Self {
        Self { floor: 0.0 }
    }
}

/// Weights resampled to the supersampled grid with nearest lookup.
#[derive(Clone, Debug)]
pub struct WeightRaster {
    width: usize,
    height: usize,
    supersampling: u32,
    data: Vec<f32>,
}

impl WeightRaster {
    /// Builds the raster for `field` at `supersampling` cells per pixel and axis.
    /// Cell `(x', y')` reads field pixel `(x' / S, y' / S)`.
    pub fn build(field: &dyn DensityField, supersampling: u32, mapping: WeightMapping) -> Self {
        debug_assert!(supersampling >= 1, "supersampling must be >= 1");
        let (fw, fh) = field.size();
        let s = supersampling.max(1);
        let width = (fw * s) as usize;
        let height = (fh * s) as usize;

        let mut data = vec![0.0f32; width * height];
        data.par_chunks_mut(width.max(1))
            .enumerate()
            .for_each(|(y, row)| {
                let fy = y as u32 / s;
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = mapping.weight(field.sample(x as u32 / s, fy));
                }
            });

        Self {
            width,
            height,
            supersampling: s,
            data,
        }
    }

    /// Size `(width, height)` of the supersampled grid.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn supersampling(&self) -> u32 {
        self.supersampling
    }

    /// Weights of grid row `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::LuminanceGrid;

    #[test]
    fn default_mapping_inverts_luminance() {
        let m = WeightMapping::default();
        assert_eq!(m.weight(0.0), 1.0);
        assert_eq!(m.weight(1.0), 0.0);
        assert_eq!(m.weight(0.25), 0.75);
    }

    #[test]
    fn floor_keeps_white_positive() {
        let m = WeightMapping::new(0.1);
        assert!((m.weight(1.0) - 0.1).abs() < 1e-6);
        assert_eq!(m.weight(0.0), 1.0);
        assert!(m.validate().is_ok());
        assert!(WeightMapping::new(1.0).validate().is_err());
        assert!(WeightMapping::new(-0.5).validate().is_err());
    }

    #[test]
    fn raster_replicates_pixels_when_supersampled() {
        let field = LuminanceGrid::new(2, 1, vec![0.0, 1.0]).unwrap();
        let raster = WeightRaster::build(&field, 2, WeightMapping::default());
        assert_eq!(raster.size(), (4, 2));
        assert_eq!(raster.row(0), &[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(raster.row(1), &[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(raster.get(3, 1), 0.0);
    }
}
