#![forbid(unsafe_code)]
//! voronoi_stipple: Weighted centroidal Voronoi stippling with data-parallel Lloyd relaxation.
//!
//! Modules:
//! - codec: bounded-channel packing of integers, coordinate pairs and fixed-point values
//! - field: density fields and their supersampled weight rasters
//! - sampling: initial site placement (density-biased rejection sampling)
//! - ownership: nearest-site rasterization over the supersampled grid (several backends)
//! - reduce: two-stage weighted reduction and centroid extraction
//! - relax: relaxation driver, configuration, run events
//! - present: weighted disks and a coverage canvas for relaxed sites
//!
//! For examples, see the `voronoi_stipple_examples` crate.
pub mod codec;
pub mod error;
pub mod field;
pub mod ownership;
pub mod present;
pub mod reduce;
pub mod relax;
pub mod sampling;
pub mod site;

/// Convenient re-exports for common types. Import with `use voronoi_stipple::prelude::*;`.
pub mod prelude {
    pub use crate::codec::{ChannelFormat, PackedCentroid};
    pub use crate::error::{Error, Result};
    pub use crate::field::{
        DensityField, FnField, LuminanceGrid, UniformField, WeightMapping, WeightRaster,
    };
    pub use crate::ownership::{
        BruteForceRasterizer, BucketGridRasterizer, ConeRasterizer, OwnershipGrid,
        OwnershipRasterizer, RasterBackend,
    };
    pub use crate::present::{Disk, PresentConfig, StippleCanvas, StipplePresenter};
    pub use crate::reduce::{Accumulator, CentroidTransport, ReductionStrategy, SiteCentroid};
    pub use crate::relax::{
        relax, CancellationToken, EventSink, FnSink, IterationReport, MultiSink, ProgressSink,
        RelaxConfig, RelaxEvent, RelaxEventKind, RelaxPhase, RelaxResult, StippleEngine,
        VecSink, DAMPED_ALPHA, FULL_STEP_ALPHA,
    };
    pub use crate::sampling::{RejectionSampling, SiteInitializer, UniformSiteSampling};
    pub use crate::site::{sites_from_positions, Site, SiteId, WEIGHT_SCALE};
}
