//! Density-blind uniform site placement.
use mint::Vector2;
use rand::Rng;

use crate::error::{Error, Result};
use crate::field::{validate_field, DensityField, WeightMapping};
use crate::sampling::{jitter_in_pixel, rand_index, SiteInitializer};

/// Uniform i.i.d. placement over the field rectangle, ignoring density.
#[derive(Debug, Clone)]
pub struct UniformSiteSampling {
    /// Number of sites to generate.
    pub count: usize,
}

impl UniformSiteSampling {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl SiteInitializer for UniformSiteSampling {
    fn count(&self) -> usize {
        self.count
    }

    fn initialize(
        &self,
        field: &dyn DensityField,
        _mapping: WeightMapping,
        rng: &mut dyn Rng,
    ) -> Result<Vec<Vector2<f32>>> {
        let (w, h) = validate_field(field)?;
        if self.count == 0 {
            return Err(Error::InvalidConfig("sample count must be > 0".into()));
        }

        Ok((0..self.count)
            .map(|_| {
                let px = rand_index(rng, w);
                let py = rand_index(rng, h);
                jitter_in_pixel(rng, px, py)
            })
            .collect())
    }
}
