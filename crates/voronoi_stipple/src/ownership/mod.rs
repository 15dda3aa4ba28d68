//! Nearest-site ownership assignment over the supersampled grid.
//!
//! Every cell `(x, y)` of the `W*S x H*S` grid is owned by the site whose scaled position
//! `position * S` is closest to the cell centre `(x + 0.5, y + 0.5)`. Ties go to the lowest
//! site id. Backends differ only in how they find that site:
//! - [`BruteForceRasterizer`]: scans every site per cell.
//! - [`BucketGridRasterizer`]: queries a uniform bucket index with a certified ring search.
//! - [`ConeRasterizer`]: splats one distance cone per site into a depth buffer in id order.
//!
//! All backends compute distances with [`distance_sq`], so they agree cell for cell.
use glam::Vec2;

use crate::error::{Error, Result};
use crate::site::Site;

pub mod brute_force;
pub mod bucket_grid;
pub mod cone;
pub mod grid;

pub use brute_force::BruteForceRasterizer;
pub use bucket_grid::BucketGridRasterizer;
pub use cone::ConeRasterizer;
pub use grid::OwnershipGrid;

/// Trait for ownership backends.
pub trait OwnershipRasterizer: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Overwrites every cell of `grid` with its owner's id.
    ///
    /// `sites` must be ordered by id with dense ids `0..N`.
    fn rasterize(&self, sites: &[Site], grid: &mut OwnershipGrid) -> Result<()>;
}

/// Selects one of the built-in backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RasterBackend {
    BruteForce,
    #[default]
    BucketGrid,
    Cone,
}

impl RasterBackend {
    pub fn build(self) -> Box<dyn OwnershipRasterizer> {
        match self {
            RasterBackend::BruteForce => Box::new(BruteForceRasterizer),
            RasterBackend::BucketGrid => Box::new(BucketGridRasterizer::default()),
            RasterBackend::Cone => Box::new(ConeRasterizer),
        }
    }
}

/// Squared distance from the centre of cell `(x, y)` to `p`.
#[inline]
pub fn distance_sq(x: usize, y: usize, p: Vec2) -> f32 {
    let dx = (x as f32 + 0.5) - p.x;
    let dy = (y as f32 + 0.5) - p.y;
    dx * dx + dy * dy
}

/// Site positions in grid space, indexed by id.
pub(crate) fn scaled_positions(sites: &[Site], supersampling: u32) -> Result<Vec<Vec2>> {
    if sites.is_empty() {
        return Err(Error::EmptySiteSet);
    }
    let s = supersampling as f32;
    Ok(sites.iter().map(|site| site.position * s).collect())
}

#[cfg(test)]
pub(crate) mod test_support {
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::site::Site;

    pub fn random_sites(n: usize, w: f32, h: f32, seed: u64) -> Vec<Site> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let u = crate::sampling::rand01(&mut rng);
                let v = crate::sampling::rand01(&mut rng);
                Site::new(i as u32, Vec2::new(u * w * 0.999, v * h * 0.999))
            })
            .collect()
    }

    /// Reference assignment with the tie rule spelled out.
    pub fn reference_owner(x: usize, y: usize, scaled: &[Vec2]) -> u32 {
        let mut best = 0usize;
        let mut best_d = f32::INFINITY;
        for (i, p) in scaled.iter().enumerate() {
            let d = distance_sq(x, y, *p);
            if d < best_d || (d == best_d && i < best) {
                best = i;
                best_d = d;
            }
        }
        best as u32
    }

    pub fn assert_matches_reference(
        rasterizer: &dyn OwnershipRasterizer,
        sites: &[Site],
        grid: &mut OwnershipGrid,
    ) {
        rasterizer.rasterize(sites, grid).unwrap();
        let scaled = scaled_positions(sites, grid.supersampling()).unwrap();
        let (w, h) = grid.size();
        for y in 0..h {
            for x in 0..w {
                assert_eq!(
                    grid.get(x, y),
                    reference_owner(x, y, &scaled),
                    "{} disagrees at ({x}, {y})",
                    rasterizer.name()
                );
            }
        }
        grid.validate(sites.len()).unwrap();
    }
}
