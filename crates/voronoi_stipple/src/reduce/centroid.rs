//! Centroid extraction from final accumulators.
use glam::Vec2;
use rayon::prelude::*;

use crate::codec::PackedCentroid;
use crate::error::Result;
use crate::reduce::Accumulator;
use crate::site::WEIGHT_SCALE;

/// How centroids travel from the reduction to the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CentroidTransport {
    /// Full floating-point precision.
    #[default]
    Full,
    /// Through [`PackedCentroid`]: `1/256` coordinate resolution, 8-bit weight,
    /// grid sides limited to 4096 cells.
    Packed,
}

/// Reduced result for one site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SiteCentroid {
    /// Weighted centroid in grid space; `None` when the owned weight is zero.
    pub centroid: Option<Vec2>,
    /// Mean weight of the owned cells on the `0..=255` scale.
    pub mean_weight: f32,
}

impl Accumulator {
    /// Weighted centroid, or `None` when no weight was accumulated.
    pub fn centroid(&self) -> Option<Vec2> {
        if self.weight > 0.0 {
            Some(Vec2::new(
                (self.sum_x / self.weight) as f32,
                (self.sum_y / self.weight) as f32,
            ))
        } else {
            None
        }
    }

    /// Mean cell weight in `[0, 1]`; zero for an empty accumulator.
    pub fn mean_weight(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.weight / self.count as f64
        }
    }
}

/// Converts final accumulators into centroids through `transport`.
pub fn extract_centroids(
    finals: &[Accumulator],
    transport: CentroidTransport,
) -> Result<Vec<SiteCentroid>> {
    finals
        .par_iter()
        .map(|acc| {
            let centroid = acc.centroid();
            let mean_weight = (acc.mean_weight() * WEIGHT_SCALE as f64) as f32;
            match transport {
                CentroidTransport::Full => Ok(SiteCentroid {
                    centroid,
                    mean_weight,
                }),
                CentroidTransport::Packed => {
                    let (centroid, mean_weight) =
                        PackedCentroid::pack(centroid, mean_weight)?.unpack()?;
                    Ok(SiteCentroid {
                        centroid,
                        mean_weight,
                    })
                }
            }
        })
        .collect()
}
