//! Relaxation driver: owns the sites, the per-run buffers and the worker pool.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec2;
use mint::Vector2;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::field::{validate_field, DensityField};
use crate::ownership::OwnershipRasterizer;
use crate::relax::config::RelaxConfig;
use crate::relax::events::{EventSink, ProgressSink, RelaxEvent, RelaxEventKind};
use crate::relax::state::EngineState;
use crate::sampling::{next_down, RejectionSampling, SiteInitializer};
use crate::site::{sites_from_positions, Site};

/// Lifecycle of a [`StippleEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelaxPhase {
    /// No sites yet.
    Initializing,
    /// Sites exist and `remaining` iterations are left.
    Iterating { remaining: u32 },
    /// The iteration budget is exhausted.
    Done,
}

/// Summary of one completed iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationReport {
    /// 1-based index of the iteration.
    pub iteration: u32,
    /// Iterations left after this one.
    pub remaining: u32,
    /// Sites whose owned weight was zero and kept their position.
    pub frozen_sites: usize,
    /// Largest distance any site moved, in field pixels.
    pub max_displacement: f32,
}

/// Final output of [`StippleEngine::run_with_events`].
#[derive(Clone, Debug, Default)]
pub struct RelaxResult {
    pub sites: Vec<Site>,
    /// Iterations completed.
    pub iterations: u32,
    /// `true` if the run stopped on a cancellation request.
    pub cancelled: bool,
}

/// Shared flag that asks a running relaxation to stop at the next iteration boundary.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Lloyd relaxation over one density field.
///
/// Every iteration rasterizes ownership, runs both reduction stages, transports the
/// centroids and applies the update policy `new = alpha * centroid + (1 - alpha) * old`.
/// Sites with zero owned weight keep their position.
pub struct StippleEngine<'a> {
    config: RelaxConfig,
    field: &'a dyn DensityField,
    field_size: (u32, u32),
    grid_size: (usize, usize),
    rasterizer: Box<dyn OwnershipRasterizer>,
    initializer: Box<dyn SiteInitializer>,
    pool: rayon::ThreadPool,
    state: EngineState,
    sites: Vec<Site>,
    phase: RelaxPhase,
    completed: u32,
}

impl<'a> StippleEngine<'a> {
    /// Validates `config` against `field` and builds the worker pool and buffers.
    pub fn try_new(config: RelaxConfig, field: &'a dyn DensityField) -> Result<Self> {
        config.validate()?;
        let field_size = validate_field(field)?;
        let grid_size = config.validate_for_field(field_size.0, field_size.1)?;
        let pool = build_thread_pool(config.threads)?;
        let state = pool.install(|| EngineState::new(field, &config));

        Ok(Self {
            rasterizer: config.backend.build(),
            initializer: Box::new(RejectionSampling::new(config.samples)),
            config,
            field,
            field_size,
            grid_size,
            pool,
            state,
            sites: Vec::new(),
            phase: RelaxPhase::Initializing,
            completed: 0,
        })
    }

    /// Replaces the ownership backend selected by the configuration.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn OwnershipRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Replaces the default rejection sampler.
    pub fn with_initializer(mut self, initializer: Box<dyn SiteInitializer>) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn config(&self) -> &RelaxConfig {
        &self.config
    }

    pub fn phase(&self) -> RelaxPhase {
        self.phase
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn into_sites(self) -> Vec<Site> {
        self.sites
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Field size `(width, height)` in pixels.
    pub fn field_size(&self) -> (u32, u32) {
        self.field_size
    }

    /// Places the initial sites with the configured initializer and restarts the budget.
    pub fn initialize(&mut self, rng: &mut impl Rng) -> Result<()> {
        if self.initializer.count() != self.config.samples {
            return Err(Error::InvalidConfig(format!(
                "initializer produces {} sites but the configuration asks for {}",
                self.initializer.count(),
                self.config.samples
            )));
        }
        let positions = self
            .initializer
            .initialize(self.field, self.config.weight_mapping, rng)?;
        self.seed_sites(positions)
    }

    /// Uses explicit positions as the initial sites and restarts the budget.
    ///
    /// Positions must be finite and inside `[0, W) x [0, H)`. Their count may differ
    /// from the configured sample count.
    pub fn seed_sites<P>(&mut self, positions: impl IntoIterator<Item = P>) -> Result<()>
    where
        P: Into<Vector2<f32>>,
    {
        let sites = sites_from_positions(positions);
        if sites.is_empty() {
            return Err(Error::InvalidConfig("at least one site is required".into()));
        }
        if sites.len() > u32::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "at most {} sites are supported",
                u32::MAX
            )));
        }
        let (w, h) = self.field_size;
        if let Some(bad) = sites.iter().find(|s| {
            let p = s.position;
            !(p.is_finite() && p.x >= 0.0 && p.y >= 0.0 && p.x < w as f32 && p.y < h as f32)
        }) {
            return Err(Error::InvalidConfig(format!(
                "site {} at {} lies outside the {w}x{h} field",
                bad.id, bad.position
            )));
        }

        self.sites = sites;
        self.completed = 0;
        self.phase = RelaxPhase::Iterating {
            remaining: self.config.iterations,
        };
        Ok(())
    }

    /// Runs one Lloyd iteration.
    pub fn step(&mut self) -> Result<IterationReport> {
        let remaining = match self.phase {
            RelaxPhase::Iterating { remaining } => remaining,
            RelaxPhase::Initializing => {
                return Err(Error::InvalidState(
                    "step() called before sites were initialized".into(),
                ))
            }
            RelaxPhase::Done => {
                return Err(Error::InvalidState(
                    "step() called after the iteration budget was exhausted".into(),
                ))
            }
        };

        let s = self.config.supersampling as f32;
        let alpha = self.config.alpha;
        let upper = Vec2::new(
            next_down(self.field_size.0 as f32),
            next_down(self.field_size.1 as f32),
        );

        let Self {
            config,
            rasterizer,
            pool,
            state,
            sites,
            ..
        } = self;
        let centroids = pool.install(|| state.centroids(sites, &**rasterizer, config))?;

        let mut frozen_sites = 0usize;
        let mut max_displacement = 0.0f32;
        for (site, reduced) in sites.iter_mut().zip(&centroids) {
            site.weight = reduced.mean_weight;
            let Some(centroid) = reduced.centroid else {
                frozen_sites += 1;
                continue;
            };
            let target = centroid / s;
            let next = if alpha >= 1.0 {
                target
            } else {
                target * alpha + site.position * (1.0 - alpha)
            };
            let next = next.clamp(Vec2::ZERO, upper);
            max_displacement = max_displacement.max(next.distance(site.position));
            site.position = next;
        }

        self.completed += 1;
        let remaining = remaining - 1;
        self.phase = if remaining == 0 {
            RelaxPhase::Done
        } else {
            RelaxPhase::Iterating { remaining }
        };

        let report = IterationReport {
            iteration: self.completed,
            remaining,
            frozen_sites,
            max_displacement,
        };
        debug!(
            "Iteration {} done: {} remaining, {} frozen, max displacement {:.4}.",
            report.iteration, report.remaining, report.frozen_sites, report.max_displacement
        );
        Ok(report)
    }

    /// Initializes if needed and iterates to the end of the budget.
    ///
    /// Calls `on_iterate(remaining)` after every iteration and once more with `0` when done.
    pub fn run(
        &mut self,
        rng: &mut impl Rng,
        on_iterate: impl FnMut(u32),
    ) -> Result<Vec<Site>> {
        let mut sink = ProgressSink::new(on_iterate);
        let result = self.run_with_events(rng, &mut sink, None)?;
        Ok(result.sites)
    }

    /// Like [`StippleEngine::run`], reporting to `sink` and honouring `cancel` between
    /// iterations.
    pub fn run_with_events(
        &mut self,
        rng: &mut impl Rng,
        sink: &mut dyn EventSink,
        cancel: Option<&CancellationToken>,
    ) -> Result<RelaxResult> {
        if self.phase == RelaxPhase::Done {
            return Err(Error::InvalidState(
                "run called after the iteration budget was exhausted".into(),
            ));
        }

        if sink.wants(RelaxEventKind::RunStarted) {
            sink.send(RelaxEvent::RunStarted {
                config: self.config.clone(),
                field_size: self.field_size,
                grid_size: self.grid_size,
            });
        }

        if self.phase == RelaxPhase::Initializing {
            self.initialize(rng)?;
        }
        info!(
            "Relaxing {} sites over a {}x{} field (S = {}, K = {}, backend = {}).",
            self.sites.len(),
            self.field_size.0,
            self.field_size.1,
            self.config.supersampling,
            self.config.iterations,
            self.rasterizer.name()
        );
        if sink.wants(RelaxEventKind::SitesInitialized) {
            sink.send(RelaxEvent::SitesInitialized {
                count: self.sites.len(),
            });
        }

        let mut cancelled = false;
        while let RelaxPhase::Iterating { .. } = self.phase {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                cancelled = true;
                break;
            }
            let report = self.step()?;
            if report.frozen_sites > 0 {
                let message = format!(
                    "{} sites own no weight and kept their position",
                    report.frozen_sites
                );
                warn!("Iteration {}: {}.", report.iteration, message);
                if sink.wants(RelaxEventKind::Warning) {
                    sink.send(RelaxEvent::Warning {
                        context: format!("iteration:{}", report.iteration),
                        message,
                    });
                }
            }
            if sink.wants(RelaxEventKind::IterationFinished) {
                sink.send(RelaxEvent::IterationFinished { report });
            }
            std::thread::yield_now();
        }

        if cancelled {
            warn!(
                "Relaxation cancelled after {} of {} iterations.",
                self.completed, self.config.iterations
            );
        } else {
            info!("Relaxation finished after {} iterations.", self.completed);
        }
        if sink.wants(RelaxEventKind::RunFinished) {
            sink.send(RelaxEvent::RunFinished {
                iterations: self.completed,
                cancelled,
            });
        }

        Ok(RelaxResult {
            sites: self.sites.clone(),
            iterations: self.completed,
            cancelled,
        })
    }

    /// Weighted quantization energy of the current sites over the supersampled grid.
    ///
    /// Recomputes ownership for the current positions.
    pub fn energy(&mut self) -> Result<f64> {
        if self.sites.is_empty() {
            return Err(Error::InvalidState(
                "energy() called before sites were initialized".into(),
            ));
        }
        let Self {
            rasterizer,
            pool,
            state,
            sites,
            ..
        } = self;
        pool.install(|| {
            state.assign(sites, &**rasterizer)?;
            Ok(state.quantization_energy(sites))
        })
    }
}

/// Initializes sites with rejection sampling and relaxes them for `config.iterations` steps.
pub fn relax(
    field: &dyn DensityField,
    config: RelaxConfig,
    rng: &mut impl Rng,
    on_iterate: impl FnMut(u32),
) -> Result<Vec<Site>> {
    StippleEngine::try_new(config, field)?.run(rng, on_iterate)
}

fn build_thread_pool(threads: Option<usize>) -> Result<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(Error::InvalidConfig(
            "threads must be >= 1 when set".into(),
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| Error::Capability(format!("failed to build rayon thread pool: {e}")))
}
