//! Lower envelope of distance cones.
//!
//! Each site is drawn as a cone whose depth at a cell equals the distance to the site.
//! Cones are composited in id order with a strict less-than depth test, so the surviving
//! fragment at every cell is the nearest site and ties keep the earlier (lower) id.
//! Depth is stored squared; the ordering is the same.
use rayon::prelude::*;

use crate::error::Result;
use crate::ownership::{distance_sq, scaled_positions, OwnershipGrid, OwnershipRasterizer};
use crate::site::Site;

/// Depth-buffer backend. Rows are composited in parallel, each with its own depth row.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConeRasterizer;

impl OwnershipRasterizer for ConeRasterizer {
    fn name(&self) -> &'static str {
        "cone"
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
            .for_each_init(
                || vec![f32::INFINITY; width],
                |depth, (y, row)| {
                    depth.fill(f32::INFINITY);
                    let cy = y as f32 + 0.5;
                    let mut row_max = f32::INFINITY;

                    for (i, p) in points.iter().enumerate() {
                        // The cone's lowest point on this row already lies above the envelope.
                        let dy = cy - p.y;
                        if dy * dy >= row_max {
                            continue;
                        }

                        let mut new_max = 0.0f32;
                        for (x, (d, owner)) in depth.iter_mut().zip(row.iter_mut()).enumerate() {
                            let z = distance_sq(x, y, *p);
                            if z < *d {
                                *d = z;
                                *owner = sites[i].id;
                            }
                            new_max = new_max.max(*d);
                        }
                        row_max = new_max;
                    }
                },
            );
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
        let sites = random_sites(50, 20.0, 20.0, 3);
        let mut grid = OwnershipGrid::new(20, 20, 2);
        assert_matches_reference(&ConeRasterizer, &sites, &mut grid);
    }

    #[test]
    fn overwrites_stale_owners() {
        let mut grid = OwnershipGrid::new(4, 4, 1);
        let many = random_sites(6, 4.0, 4.0, 2);
        ConeRasterizer.rasterize(&many, &mut grid).unwrap();
        let one = vec![Site::new(0, Vec2::new(1.0, 1.0))];
        ConeRasterizer.rasterize(&one, &mut grid).unwrap();
        assert!(grid.owners().iter().all(|&id| id == 0));
    }
}
