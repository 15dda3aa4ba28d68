//! Two-stage reduction of ownership and weights into per-site weighted centroids.
//!
//! Stage A ([`reduce_rows`]) produces one [`Accumulator`] per (site, row) in an
//! [`IntermediateGrid`]. Stage B ([`reduce_columns`]) sums each site's column into its final
//! accumulator. [`centroid::extract_centroids`] turns final accumulators into centroids,
//! optionally through the packed channel transport.
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::field::WeightRaster;
use crate::ownership::OwnershipGrid;

pub mod centroid;

pub use centroid::{extract_centroids, CentroidTransport, SiteCentroid};

/// Weighted position sums of a set of cells.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Accumulator {
    /// Sum of `(x + 0.5) * w`.
    pub sum_x: f64,
    /// Sum of `(y + 0.5) * w`.
    pub sum_y: f64,
    /// Sum of `w`.
    pub weight: f64,
    /// Number of cells.
    pub count: u64,
}

impl Accumulator {
    #[inline]
    pub fn add_cell(&mut self, x: usize, y: usize, w: f32) {
        let w = w as f64;
        self.sum_x += (x as f64 + 0.5) * w;
        self.sum_y += (y as f64 + 0.5) * w;
        self.weight += w;
        self.count += 1;
    }
}

impl AddAssign for Accumulator {
    fn add_assign(&mut self, rhs: Self) {
        self.sum_x += rhs.sum_x;
        self.sum_y += rhs.sum_y;
        self.weight += rhs.weight;
        self.count += rhs.count;
    }
}

impl Add for Accumulator {
    type Output = Accumulator;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for Accumulator {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Accumulator::default(), Add::add)
    }
}

/// How stage A visits the ownership grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReductionStrategy {
    /// One pass per row, each cell added to its owner's accumulator.
    ///
    /// Stage A still holds `N x H'` accumulators (32 bytes each), so memory grows with
    /// sites times supersampled rows.
    #[default]
    Scatter,
    /// Every (site, row) output rescans the whole row and keeps only its own cells.
    RedundantScan,
}

/// Stage A output: `sites x rows` accumulators, stored row-major by grid row.
#[derive(Clone, Debug, Default)]
pub struct IntermediateGrid {
    sites: usize,
    rows: usize,
    cells: Vec<Accumulator>,
}

impl IntermediateGrid {
    pub fn new(sites: usize, rows: usize) -> Self {
        Self {
            sites,
            rows,
            cells: vec![Accumulator::default(); sites * rows],
        }
    }

    /// Resizes to `sites x rows` without clearing. The allocation is reused when the
    /// shape is unchanged; stage A zeroes each row before filling it.
    fn reshape(&mut self, sites: usize, rows: usize) {
        self.sites = sites;
        self.rows = rows;
        self.cells.resize(sites * rows, Accumulator::default());
    }

    /// Size `(sites, rows)`.
    pub fn size(&self) -> (usize, usize) {
        (self.sites, self.rows)
    }

    /// Accumulator of site `c` over grid row `r`.
    #[inline]
    pub fn get(&self, c: usize, r: usize) -> Accumulator {
        self.cells[r * self.sites + c]
    }
}

/// Stage A: reduces each grid row into per-site accumulators.
pub fn reduce_rows(
    ownership: &OwnershipGrid,
    weights: &WeightRaster,
    sites: usize,
    strategy: ReductionStrategy,
    out: &mut IntermediateGrid,
) -> Result<()> {
    if sites == 0 {
        return Err(Error::EmptySiteSet);
    }
    if ownership.size() != weights.size() {
        return Err(Error::InvalidState(format!(
            "ownership grid {:?} does not match weight raster {:?}",
            ownership.size(),
            weights.size()
        )));
    }

    let (_, rows) = ownership.size();
    out.reshape(sites, rows);

    let cells = out.cells.par_chunks_mut(sites).enumerate();
    match strategy {
        ReductionStrategy::Scatter => cells.for_each(|(r, accs)| {
            accs.fill(Accumulator::default());
            let owners = ownership.row(r);
            let ws = weights.row(r);
            for (x, (&owner, &w)) in owners.iter().zip(ws).enumerate() {
                debug_assert!((owner as usize) < sites, "cell ({x}, {r}) is unowned");
                if let Some(acc) = accs.get_mut(owner as usize) {
                    acc.add_cell(x, r, w);
                }
            }
        }),
        ReductionStrategy::RedundantScan => cells.for_each(|(r, accs)| {
            accs.fill(Accumulator::default());
            let owners = ownership.row(r);
            let ws = weights.row(r);
            for (c, acc) in accs.iter_mut().enumerate() {
                for (x, (&owner, &w)) in owners.iter().zip(ws).enumerate() {
                    if owner as usize == c {
                        acc.add_cell(x, r, w);
                    }
                }
            }
        }),
    }
    Ok(())
}

/// Stage B: sums every site's column of row accumulators.
pub fn reduce_columns(intermediate: &IntermediateGrid, out: &mut Vec<Accumulator>) {
    let (sites, rows) = intermediate.size();
    (0..sites)
        .into_par_iter()
        .map(|c| (0..rows).map(|r| intermediate.get(c, r)).sum())
        .collect_into_vec(out);
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::field::{FnField, WeightMapping};
    use crate::ownership::test_support::random_sites;
    use crate::ownership::{BruteForceRasterizer, OwnershipRasterizer};
    use crate::site::Site;

    fn setup(sites: &[Site], w: u32, h: u32, s: u32) -> (OwnershipGrid, WeightRaster) {
        let field = FnField::new(w, h, |x, y| ((x * 7 + y * 3) % 10) as f32 / 10.0);
        let weights = WeightRaster::build(&field, s, WeightMapping::default());
        let mut grid = OwnershipGrid::new(w, h, s);
        BruteForceRasterizer.rasterize(sites, &mut grid).unwrap();
        (grid, weights)
    }

    #[test]
    fn accumulator_adds_cell_centres() {
        let mut acc = Accumulator::default();
        acc.add_cell(2, 3, 0.5);
        assert_eq!(acc.sum_x, 1.25);
        assert_eq!(acc.sum_y, 1.75);
        assert_eq!(acc.weight, 0.5);
        assert_eq!(acc.count, 1);
    }

    #[test]
    fn strategies_produce_identical_sums() {
        let sites = random_sites(9, 12.0, 10.0, 4);
        let (grid, weights) = setup(&sites, 12, 10, 2);

        let mut scatter = IntermediateGrid::default();
        let mut redundant = IntermediateGrid::default();
        reduce_rows(&grid, &weights, 9, ReductionStrategy::Scatter, &mut scatter).unwrap();
        reduce_rows(&grid, &weights, 9, ReductionStrategy::RedundantScan, &mut redundant).unwrap();
        assert_eq!(scatter.size(), (9, 20));
        assert_eq!(scatter.cells, redundant.cells);
    }

    #[test]
    fn final_counts_partition_the_grid() {
        let sites = random_sites(7, 16.0, 8.0, 12);
        let (grid, weights) = setup(&sites, 16, 8, 1);

        let mut intermediate = IntermediateGrid::default();
        reduce_rows(&grid, &weights, 7, ReductionStrategy::Scatter, &mut intermediate).unwrap();
        let mut finals = Vec::new();
        reduce_columns(&intermediate, &mut finals);

        assert_eq!(finals.len(), 7);
        let counts: Vec<u64> = finals.iter().map(|a| a.count).collect();
        assert_eq!(counts, grid.counts(7));
        assert_eq!(counts.iter().sum::<u64>(), 16 * 8);

        let total_weight: f64 = finals.iter().map(|a| a.weight).sum();
        let expected: f64 = weights.data().iter().map(|&w| w as f64).sum();
        assert!((total_weight - expected).abs() < 1e-9);
    }

    #[test]
    fn reused_intermediate_matches_fresh_one() {
        let first = random_sites(9, 12.0, 10.0, 4);
        let second = random_sites(9, 12.0, 10.0, 5);
        let (grid_a, weights) = setup(&first, 12, 10, 1);
        let (grid_b, _) = setup(&second, 12, 10, 1);

        let mut reused = IntermediateGrid::default();
        reduce_rows(&grid_a, &weights, 9, ReductionStrategy::Scatter, &mut reused).unwrap();
        reduce_rows(&grid_b, &weights, 9, ReductionStrategy::Scatter, &mut reused).unwrap();

        let mut fresh = IntermediateGrid::default();
        reduce_rows(&grid_b, &weights, 9, ReductionStrategy::Scatter, &mut fresh).unwrap();
        assert_eq!(reused.cells, fresh.cells);

        reduce_rows(&grid_a, &weights, 9, ReductionStrategy::RedundantScan, &mut reused).unwrap();
        let mut fresh_a = IntermediateGrid::default();
        reduce_rows(&grid_a, &weights, 9, ReductionStrategy::Scatter, &mut fresh_a).unwrap();
        assert_eq!(reused.cells, fresh_a.cells);
    }

    #[test]
    fn stage_a_rejects_mismatched_inputs() {
        let sites = vec![Site::new(0, Vec2::new(1.0, 1.0))];
        let (grid, _) = setup(&sites, 4, 4, 1);
        let other = WeightRaster::build(
            &FnField::new(5, 4, |_, _| 0.0),
            1,
            WeightMapping::default(),
        );
        let mut out = IntermediateGrid::default();
        assert!(reduce_rows(&grid, &other, 1, ReductionStrategy::Scatter, &mut out).is_err());
        assert!(matches!(
            reduce_rows(&grid, &other, 0, ReductionStrategy::Scatter, &mut out),
            Err(Error::EmptySiteSet)
        ));
    }
}
