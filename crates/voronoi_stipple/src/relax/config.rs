//! Relaxation run configuration.
use crate::codec::centroid::PACKED_COORD_LIMIT;
use crate::error::{Error, Result};
use crate::field::WeightMapping;
use crate::ownership::RasterBackend;
use crate::reduce::{CentroidTransport, ReductionStrategy};

/// Full replacement of each site by its centroid.
pub const FULL_STEP_ALPHA: f32 = 1.0;

/// Damped blending used by the smoother variant of the update policy.
pub const DAMPED_ALPHA: f32 = 0.25;

/// Configuration for a relaxation run.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelaxConfig {
    /// Number of sites `N`.
    pub samples: usize,
    /// Fixed iteration budget `K`.
    pub iterations: u32,
    /// Cells per field pixel and axis in the ownership grid (`S >= 1`).
    pub supersampling: u32,
    /// Update blend: `new = alpha * centroid + (1 - alpha) * old`, in `(0, 1]`.
    pub alpha: f32,
    /// Maps density samples to ink weights.
    pub weight_mapping: WeightMapping,
    /// Ownership backend.
    pub backend: RasterBackend,
    /// Stage A traversal.
    pub reduction: ReductionStrategy,
    /// Centroid transport precision.
    pub transport: CentroidTransport,
    /// Worker threads; `None` uses the rayon default.
    pub threads: Option<usize>,
}

impl Default for RelaxConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            iterations: 50,
            supersampling: 1,
            alpha: FULL_STEP_ALPHA,
            weight_mapping: WeightMapping::default(),
            backend: RasterBackend::default(),
            reduction: ReductionStrategy::default(),
            transport: CentroidTransport::default(),
            threads: None,
        }
    }
}

impl RelaxConfig {
    /// Creates a new [`RelaxConfig`] with `samples` sites and `iterations` Lloyd steps.
    pub fn new(samples: usize, iterations: u32) -> Self {
        Self {
            samples,
            iterations,
            ..Default::default()
        }
    }

    /// Sets the supersampling factor.
    pub fn with_supersampling(mut self, supersampling: u32) -> Self {
        self.supersampling = supersampling;
        self
    }

    /// Sets the update blend factor.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the density-to-weight mapping.
    pub fn with_weight_mapping(mut self, weight_mapping: WeightMapping) -> Self {
        self.weight_mapping = weight_mapping;
        self
    }

    /// Sets the ownership backend.
    pub fn with_backend(mut self, backend: RasterBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the stage A traversal.
    pub fn with_reduction(mut self, reduction: ReductionStrategy) -> Self {
        self.reduction = reduction;
        self
    }

    /// Sets the centroid transport.
    pub fn with_transport(mut self, transport: CentroidTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(Error::InvalidConfig("samples must be > 0".into()));
        }
        if self.samples > u32::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "samples must be <= {}",
                u32::MAX
            )));
        }
        if self.iterations == 0 {
            return Err(Error::InvalidConfig("iterations must be > 0".into()));
        }
        if self.supersampling == 0 {
            return Err(Error::InvalidConfig("supersampling must be >= 1".into()));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig(
                "threads must be >= 1 when set".into(),
            ));
        }
        self.weight_mapping.validate()
    }

    /// Validates the grid this configuration implies for a `width x height` field.
    pub fn validate_for_field(&self, width: u32, height: u32) -> Result<(usize, usize)> {
        let gw = width.checked_mul(self.supersampling);
        let gh = height.checked_mul(self.supersampling);
        let (Some(gw), Some(gh)) = (gw, gh) else {
            return Err(Error::InvalidConfig(format!(
                "supersampled grid {width}x{height} * {} overflows",
                self.supersampling
            )));
        };
        if self.transport == CentroidTransport::Packed
            && (gw > PACKED_COORD_LIMIT || gh > PACKED_COORD_LIMIT)
        {
            return Err(Error::InvalidConfig(format!(
                "packed transport supports grids up to {PACKED_COORD_LIMIT} cells per side, got {gw}x{gh}"
            )));
        }
        Ok((gw as usize, gh as usize))
    }
}
