//! Density-biased rejection sampling of initial sites.
use mint::Vector2;
use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::field::{validate_field, DensityField, WeightMapping};
use crate::sampling::{jitter_in_pixel, rand01, rand_index, SiteInitializer};

/// Rejection sampling over the field's pixels.
///
/// Draws a uniformly random pixel and accepts it with probability `weight / max_weight`,
/// until exactly `count` pixels were accepted. The same pixel may be accepted more than
/// once; each accepted site is placed uniformly inside its pixel.
#[derive(Debug, Clone)]
pub struct RejectionSampling {
    /// Number of sites to generate.
    pub count: usize,
}

impl RejectionSampling {
    /// Create a new rejection sampler that generates `count` sites.
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl SiteInitializer for RejectionSampling {
    fn count(&self) -> usize {
        self.count
    }

    fn initialize(
        &self,
        field: &dyn DensityField,
        mapping: WeightMapping,
        rng: &mut dyn Rng,
    ) -> Result<Vec<Vector2<f32>>> {
        let (w, h) = validate_field(field)?;
        if self.count == 0 {
            return Err(Error::InvalidConfig("sample count must be > 0".into()));
        }

        let mut max_weight = 0.0f32;
        for y in 0..h {
            for x in 0..w {
                max_weight = max_weight.max(mapping.weight(field.sample(x, y)));
            }
        }
        // No pixel could ever be accepted.
        if max_weight <= 0.0 {
            return Err(Error::InvalidConfig(
                "density field has zero weight everywhere; cannot place sites".into(),
            ));
        }

        let mut out = Vec::with_capacity(self.count);
        let mut attempts = 0usize;
        while out.len() < self.count {
            attempts += 1;
            let px = rand_index(rng, w);
            let py = rand_index(rng, h);
            let weight = mapping.weight(field.sample(px, py));
            if rand01(rng) * max_weight < weight {
                out.push(jitter_in_pixel(rng, px, py));
            }
        }

        debug!(
            "Rejection sampling placed {} sites in {} attempts.",
            out.len(),
            attempts
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::field::{FnField, LuminanceGrid, UniformField};

    #[test]
    fn produces_exact_count_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let field = UniformField::new(16, 8, 0.5);
        let pts = RejectionSampling::new(100)
            .initialize(&field, WeightMapping::default(), &mut rng)
            .unwrap();
        assert_eq!(pts.len(), 100);
        for p in pts {
            assert!(p.x >= 0.0 && p.x < 16.0);
            assert!(p.y >= 0.0 && p.y < 8.0);
        }
    }

    #[test]
    fn all_white_field_is_a_configuration_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let field = UniformField::new(8, 8, 1.0);
        let err = RejectionSampling::new(4)
            .initialize(&field, WeightMapping::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn zero_count_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let field = UniformField::new(8, 8, 0.0);
        assert!(RejectionSampling::new(0)
            .initialize(&field, WeightMapping::default(), &mut rng)
            .is_err());
    }

    #[test]
    fn white_pixels_are_never_accepted() {
        let mut rng = StdRng::seed_from_u64(7);
        // Left half black, right half white.
        let field = FnField::new(16, 16, |x, _| if x < 8 { 0.0 } else { 1.0 });
        let pts = RejectionSampling::new(200)
            .initialize(&field, WeightMapping::default(), &mut rng)
            .unwrap();
        assert!(pts.iter().all(|p| p.x < 8.0));
    }

    #[test]
    fn darker_regions_receive_more_sites() {
        let mut rng = StdRng::seed_from_u64(99);
        let field =
            LuminanceGrid::from_fn(32, 32, |x, _| if x < 16 { 0.1 } else { 0.8 }).unwrap();
        let pts = RejectionSampling::new(2000)
            .initialize(&field, WeightMapping::default(), &mut rng)
            .unwrap();
        let dark = pts.iter().filter(|p| p.x < 16.0).count();
        // Expected ratio 0.9 : 0.2.
        assert!(dark > 1400, "only {dark} sites in the dark half");
    }

    #[test]
    fn determinism_for_same_seed() {
        let field = UniformField::new(10, 10, 0.3);
        let s = RejectionSampling::new(32);
        let mut rng_a = StdRng::seed_from_u64(123);
        let mut rng_b = StdRng::seed_from_u64(123);
        let pa = s
            .initialize(&field, WeightMapping::default(), &mut rng_a)
            .unwrap();
        let pb = s
            .initialize(&field, WeightMapping::default(), &mut rng_b)
            .unwrap();
        assert_eq!(pa, pb);
    }
}
