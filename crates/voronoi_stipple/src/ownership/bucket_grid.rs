//! Nearest-site queries through a uniform bucket index.
//!
//! Sites are binned into square buckets sized for a few sites each. A cell query visits
//! buckets in growing Chebyshev rings around the cell's own bucket and stops once every
//! unvisited bucket is provably farther than the best candidate found so far.
use glam::Vec2;
use rayon::prelude::*;

use crate::error::Result;
use crate::ownership::{distance_sq, scaled_positions, OwnershipGrid, OwnershipRasterizer};
use crate::site::Site;

/// Slack subtracted from the ring reach to absorb rounding in bucket assignment.
const REACH_SLACK: f32 = 0.01;

/// Spatial-index backend. Exact, with the same tie rule as the brute-force scan.
#[derive(Clone, Copy, Debug)]
pub struct BucketGridRasterizer {
    /// Target average number of sites per bucket.
    pub sites_per_bucket: f32,
}

impl BucketGridRasterizer {
    pub fn new(sites_per_bucket: f32) -> Self {
        Self {
            sites_per_bucket: sites_per_bucket.max(0.25),
        }
    }
}

impl Default for BucketGridRasterizer {
    fn default() -> Self {
        Self {
            sites_per_bucket: 2.0,
        }
    }
}

impl OwnershipRasterizer for BucketGridRasterizer {
    fn name(&self) -> &'static str {
        "bucket_grid"
    }

    fn rasterize(&self, sites: &[Site], grid: &mut OwnershipGrid) -> Result<()> {
        let points = scaled_positions(sites, grid.supersampling())?;
        let (width, height) = grid.size();
        if width == 0 || height == 0 {
            return Ok(());
        }
        let index = BucketIndex::build(&points, width, height, self.sites_per_bucket);

        grid.owners_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, owner) in row.iter_mut().enumerate() {
                    *owner = sites[index.nearest(x, y, &points)].id;
                }
            });
        Ok(())
    }
}

/// Bucketed site indices in compressed rows: bucket `b` holds `items[starts[b]..starts[b + 1]]`.
struct BucketIndex {
    cell: f32,
    cols: usize,
    rows: usize,
    starts: Vec<usize>,
    items: Vec<usize>,
}

impl BucketIndex {
    fn build(points: &[Vec2], width: usize, height: usize, sites_per_bucket: f32) -> Self {
        let area = (width * height) as f32;
        let cell = (area * sites_per_bucket / points.len() as f32).sqrt().max(1.0);
        let cols = ((width as f32 / cell).ceil() as usize).max(1);
        let rows = ((height as f32 / cell).ceil() as usize).max(1);

        let mut index = Self {
            cell,
            cols,
            rows,
            starts: vec![0; cols * rows + 1],
            items: vec![0; points.len()],
        };

        let buckets: Vec<usize> = points.iter().map(|p| index.bucket_of(*p)).collect();
        for &b in &buckets {
            index.starts[b + 1] += 1;
        }
        for b in 0..cols * rows {
            index.starts[b + 1] += index.starts[b];
        }
        // Filling in id order keeps each bucket sorted by id.
        let mut cursor = index.starts.clone();
        for (i, &b) in buckets.iter().enumerate() {
            index.items[cursor[b]] = i;
            cursor[b] += 1;
        }
        index
    }

    #[inline]
    fn bucket_coords(&self, p: Vec2) -> (usize, usize) {
        let bx = ((p.x / self.cell).floor().max(0.0) as usize).min(self.cols - 1);
        let by = ((p.y / self.cell).floor().max(0.0) as usize).min(self.rows - 1);
        (bx, by)
    }

    #[inline]
    fn bucket_of(&self, p: Vec2) -> usize {
        let (bx, by) = self.bucket_coords(p);
        by * self.cols + bx
    }

    fn nearest(&self, x: usize, y: usize, points: &[Vec2]) -> usize {
        let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let (bx, by) = self.bucket_coords(centre);

        let mut best = usize::MAX;
        let mut best_d = f32::INFINITY;
        let max_ring = self.cols.max(self.rows);
        for r in 0..=max_ring {
            self.for_each_in_ring(bx, by, r, |i| {
                let d = distance_sq(x, y, points[i]);
                if d < best_d || (d == best_d && i < best) {
                    best_d = d;
                    best = i;
                }
            });

            // Anything outside ring r is at least r buckets away.
            let reach = (r as f32 * self.cell - REACH_SLACK).max(0.0);
            if best != usize::MAX && best_d < reach * reach {
                break;
            }
        }
        best
    }

    fn for_each_in_ring(&self, bx: usize, by: usize, r: usize, mut f: impl FnMut(usize)) {
        let (bx, by, r) = (bx as isize, by as isize, r as isize);
        let mut visit = |i: isize, j: isize| {
            if i < 0 || j < 0 || i >= self.cols as isize || j >= self.rows as isize {
                return;
            }
            let b = j as usize * self.cols + i as usize;
            for &item in &self.items[self.starts[b]..self.starts[b + 1]] {
                f(item);
            }
        };

        if r == 0 {
            visit(bx, by);
            return;
        }
        for i in (bx - r)..=(bx + r) {
            visit(i, by - r);
            visit(i, by + r);
        }
        for j in (by - r + 1)..=(by + r - 1) {
            visit(bx - r, j);
            visit(bx + r, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::test_support::{assert_matches_reference, random_sites};

    #[test]
    fn matches_reference_for_many_sites() {
        let sites = random_sites(200, 40.0, 30.0, 21);
        let mut grid = OwnershipGrid::new(40, 30, 1);
        assert_matches_reference(&BucketGridRasterizer::default(), &sites, &mut grid);
    }

    #[test]
    fn matches_reference_with_clustered_sites() {
        // All sites crowd one corner, so most queries need wide rings.
        let mut sites = random_sites(30, 4.0, 4.0, 8);
        for s in &mut sites {
            s.position += Vec2::new(0.1, 0.1);
        }
        let mut grid = OwnershipGrid::new(32, 32, 2);
        assert_matches_reference(&BucketGridRasterizer::new(1.0), &sites, &mut grid);
    }

    #[test]
    fn index_buckets_are_sorted_by_id() {
        let points: Vec<Vec2> = (0..10).map(|i| Vec2::new(0.5, i as f32 * 0.1)).collect();
        let index = BucketIndex::build(&points, 8, 8, 4.0);
        let b = index.bucket_of(points[0]);
        let bucket = &index.items[index.starts[b]..index.starts[b + 1]];
        assert!(bucket.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(index.starts[index.cols * index.rows], 10);
    }
}
