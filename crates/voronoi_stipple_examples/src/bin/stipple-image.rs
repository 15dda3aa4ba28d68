use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use voronoi_stipple::prelude::*;
use voronoi_stipple_examples::{
    init_tracing, load_luminance_png, progress_logger, save_canvas_png, StippleArgs,
};

/// Stipple a PNG image.
#[derive(Parser, Debug)]
#[command(name = "stipple-image", version)]
struct Cli {
    /// Input PNG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long, default_value = "stipples.png")]
    out: PathBuf,

    #[command(flatten)]
    stipple: StippleArgs,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let field = load_luminance_png(&cli.in_path)?;
    let mut rng = StdRng::seed_from_u64(cli.stipple.seed);
    let mut engine = StippleEngine::try_new(cli.stipple.relax_config(), &field)?;
    let sites = engine.run(&mut rng, progress_logger(cli.stipple.iterations))?;

    save_canvas_png(
        &sites,
        engine.field_size(),
        cli.stipple.present_config(),
        &cli.out,
    )
}
