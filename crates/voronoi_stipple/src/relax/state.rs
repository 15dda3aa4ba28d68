//! Per-run buffers shared by the relaxation stages.
use crate::error::Result;
use crate::field::{DensityField, WeightRaster};
use crate::ownership::{OwnershipGrid, OwnershipRasterizer};
use crate::reduce::{
    extract_centroids, reduce_columns, reduce_rows, Accumulator, IntermediateGrid, SiteCentroid,
};
use crate::relax::config::RelaxConfig;
use crate::site::Site;

/// Grids owned by the driver and overwritten every iteration.
///
/// The weight raster is built once; the ownership grid and both accumulator buffers are
/// recomputed from scratch on each step.
pub struct EngineState {
    weights: WeightRaster,
    ownership: OwnershipGrid,
    intermediate: IntermediateGrid,
    finals: Vec<Accumulator>,
}

impl EngineState {
    pub fn new(field: &dyn DensityField, config: &RelaxConfig) -> Self {
        let (w, h) = field.size();
        let weights = WeightRaster::build(field, config.supersampling, config.weight_mapping);
        Self {
            weights,
            ownership: OwnershipGrid::new(w, h, config.supersampling),
            intermediate: IntermediateGrid::default(),
            finals: Vec::new(),
        }
    }

    pub fn weights(&self) -> &WeightRaster {
        &self.weights
    }

    /// Ownership computed by the most recent step.
    pub fn ownership(&self) -> &OwnershipGrid {
        &self.ownership
    }

    pub fn intermediate(&self) -> &IntermediateGrid {
        &self.intermediate
    }

    pub fn finals(&self) -> &[Accumulator] {
        &self.finals
    }

    /// Rasterizes ownership for `sites` and checks that every cell got an owner.
    pub(crate) fn assign(
        &mut self,
        sites: &[Site],
        rasterizer: &dyn OwnershipRasterizer,
    ) -> Result<()> {
        self.ownership.clear();
        rasterizer.rasterize(sites, &mut self.ownership)?;
        self.ownership.validate(sites.len())
    }

    /// Runs ownership, both reduction stages and centroid transport for one iteration.
    pub(crate) fn centroids(
        &mut self,
        sites: &[Site],
        rasterizer: &dyn OwnershipRasterizer,
        config: &RelaxConfig,
    ) -> Result<Vec<SiteCentroid>> {
        self.assign(sites, rasterizer)?;
        reduce_rows(
            &self.ownership,
            &self.weights,
            sites.len(),
            config.reduction,
            &mut self.intermediate,
        )?;
        reduce_columns(&self.intermediate, &mut self.finals);
        extract_centroids(&self.finals, config.transport)
    }

    /// Weighted squared distance from every cell to its owner, in field pixel units.
    ///
    /// Uses the ownership of the last [`EngineState::assign`].
    pub fn quantization_energy(&self, sites: &[Site]) -> f64 {
        let (width, height) = self.ownership.size();
        let s = self.ownership.supersampling() as f64;
        let mut energy = 0.0f64;
        for y in 0..height {
            let owners = self.ownership.row(y);
            let ws = self.weights.row(y);
            for x in 0..width {
                let Some(site) = sites.get(owners[x] as usize) else {
                    continue;
                };
                let dx = (x as f64 + 0.5) / s - site.position.x as f64;
                let dy = (y as f64 + 0.5) / s - site.position.y as f64;
                energy += ws[x] as f64 * (dx * dx + dy * dy);
            }
        }
        energy
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::field::UniformField;
    use crate::ownership::BruteForceRasterizer;

    #[test]
    fn centroids_of_two_halves() {
        let field = UniformField::new(8, 4, 0.0);
        let config = RelaxConfig::new(2, 1);
        let mut state = EngineState::new(&field, &config);
        let sites = vec![
            Site::new(0, Vec2::new(1.0, 2.0)),
            Site::new(1, Vec2::new(7.0, 2.0)),
        ];
        let out = state
            .centroids(&sites, &BruteForceRasterizer, &config)
            .unwrap();
        assert_eq!(out[0].centroid, Some(Vec2::new(2.0, 2.0)));
        assert_eq!(out[1].centroid, Some(Vec2::new(6.0, 2.0)));
        assert_eq!(out[0].mean_weight, 255.0);
        assert_eq!(state.finals().len(), 2);
        assert_eq!(state.intermediate().size(), (2, 4));
    }

    #[test]
    fn energy_is_zero_weighted_for_white_field() {
        let field = UniformField::new(4, 4, 1.0);
        let config = RelaxConfig::new(1, 1);
        let mut state = EngineState::new(&field, &config);
        let sites = vec![Site::new(0, Vec2::new(0.5, 0.5))];
        state.assign(&sites, &BruteForceRasterizer).unwrap();
        assert_eq!(state.quantization_energy(&sites), 0.0);
    }
}
