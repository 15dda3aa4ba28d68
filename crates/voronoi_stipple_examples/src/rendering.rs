use std::path::Path;

use anyhow::Context as _;
use clap::Args;
use tracing::info;
use voronoi_stipple::prelude::*;

/// Installs a `fmt` subscriber; a second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

/// Relaxation and presentation flags shared by the example binaries.
#[derive(Args, Debug, Clone)]
pub struct StippleArgs {
    /// Number of stipples.
    #[arg(long, default_value_t = 4000)]
    pub stipples: usize,

    /// Lloyd iterations.
    #[arg(long, default_value_t = 50)]
    pub iterations: u32,

    /// Ownership grid cells per pixel and axis.
    #[arg(long, default_value_t = 1)]
    pub supersampling: u32,

    /// Update blend factor in (0, 1].
    #[arg(long, default_value_t = FULL_STEP_ALPHA)]
    pub alpha: f32,

    /// Output pixels per field pixel.
    #[arg(long, default_value_t = 4.0)]
    pub scale: f32,

    /// Disk radius before scaling.
    #[arg(long, default_value_t = 1.0)]
    pub radius: f32,

    /// Route centroids through the 8-bit packed transport.
    #[arg(long, default_value_t = false)]
    pub packed: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    pub threads: Option<usize>,

    /// RNG seed.
    #[arg(long, default_value_t = 2025)]
    pub seed: u64,
}

impl StippleArgs {
    pub fn relax_config(&self) -> RelaxConfig {
        let mut config = RelaxConfig::new(self.stipples, self.iterations)
            .with_supersampling(self.supersampling)
            .with_alpha(self.alpha);
        if self.packed {
            config = config.with_transport(CentroidTransport::Packed);
        }
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        config
    }

    pub fn present_config(&self) -> PresentConfig {
        PresentConfig::default()
            .with_scale(self.scale)
            .with_base_radius(self.radius)
    }
}

/// Loads a PNG and converts it to a luminance field.
pub fn load_luminance_png(path: &Path) -> anyhow::Result<LuminanceGrid> {
    let img = image::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .to_luma8();
    let (w, h) = img.dimensions();
    info!("Loaded {} ({}x{}).", path.display(), w, h);
    Ok(LuminanceGrid::from_luma8(w, h, img.as_raw())?)
}

/// Horizontal gradient from black on the left to white on the right, with a dark disk.
pub fn gradient_field(width: u32, height: u32) -> anyhow::Result<LuminanceGrid> {
    let cx = width as f32 * 0.7;
    let cy = height as f32 * 0.5;
    let r = width.min(height) as f32 * 0.2;
    let grid = LuminanceGrid::from_fn(width, height, |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy < r * r {
            0.1
        } else {
            x as f32 / width.max(1) as f32
        }
    })?;
    Ok(grid)
}

/// Progress callback logging roughly every tenth iteration.
pub fn progress_logger(iterations: u32) -> impl FnMut(u32) {
    let every = (iterations / 10).max(1);
    move |remaining| {
        if remaining % every == 0 {
            info!("{} iterations remaining", remaining);
        }
    }
}

/// Renders `sites` and writes black stipples on white paper to `path`.
pub fn save_canvas_png(
    sites: &[Site],
    field_size: (u32, u32),
    config: PresentConfig,
    path: &Path,
) -> anyhow::Result<()> {
    let presenter = StipplePresenter::try_new(config)?;
    let canvas = presenter.render(sites, field_size);
    let visible = presenter.disks(sites).len();
    let img = image::GrayImage::from_raw(canvas.width, canvas.height, canvas.to_luma8())
        .context("canvas buffer does not match its dimensions")?;
    img.save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        "Wrote {} ({}x{}, {} of {} stipples visible).",
        path.display(),
        canvas.width,
        canvas.height,
        visible,
        sites.len()
    );
    Ok(())
}
