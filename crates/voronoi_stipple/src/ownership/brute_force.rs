//! Per-cell scan over every site.
use rayon::prelude::*;

use crate::error::Result;
use crate::ownership::{distance_sq, scaled_positions, OwnershipGrid, OwnershipRasterizer};
use crate::site::Site;

/// Exhaustive nearest-site search, `O(N)` per cell. Rows run in parallel.
#[derive(Clone, Copy, Debug, Default)]
pub struct BruteForceRasterizer;

impl OwnershipRasterizer for BruteForceRasterizer {
    fn name(&self) -> &'static str {
        "brute_force"
    }

    fn rasterize(&self, sites: &[Site], grid: &mut OwnershipGrid) -> Result<()> {
        let points = scaled_positions(sites, grid.supersampling())?;
        let (width, _) = grid.size();
        if width == 0 {
            return Ok(());
        }

        grid.owners_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, owner) in row.iter_mut().enumerate() {
                    let mut best = 0usize;
                    let mut best_d = f32::INFINITY;
                    for (i, p) in points.iter().enumerate() {
                        let d = distance_sq(x, y, *p);
                        // Strict comparison keeps the lowest id on ties.
                        if d < best_d {
                            best_d = d;
                            best = i;
                        }
                    }
                    *owner = sites[best].id;
                }
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::ownership::test_support::{assert_matches_reference, random_sites};

    #[test]
    fn matches_reference_assignment() {
        let sites = random_sites(20, 16.0, 12.0, 5);
        let mut grid = OwnershipGrid::new(16, 12, 1);
        assert_matches_reference(&BruteForceRasterizer, &sites, &mut grid);
    }

    #[test]
    fn single_site_owns_everything() {
        let sites = vec![Site::new(0, Vec2::new(3.0, 1.0))];
        let mut grid = OwnershipGrid::new(5, 4, 3);
        BruteForceRasterizer.rasterize(&sites, &mut grid).unwrap();
        assert!(grid.owners().iter().all(|&id| id == 0));
        assert_eq!(grid.counts(1), vec![15 * 12]);
    }
}
