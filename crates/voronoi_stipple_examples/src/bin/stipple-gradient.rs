use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use voronoi_stipple::prelude::*;
use voronoi_stipple_examples::{gradient_field, init_tracing, save_canvas_png, StippleArgs};

/// Stipple a synthetic gradient, logging every iteration.
#[derive(Parser, Debug)]
#[command(name = "stipple-gradient", version)]
struct Cli {
    /// Output PNG path.
    #[arg(long, default_value = "stipple-gradient.png")]
    out: PathBuf,

    /// Field width in pixels.
    #[arg(long, default_value_t = 256)]
    width: u32,

    /// Field height in pixels.
    #[arg(long, default_value_t = 192)]
    height: u32,

    #[command(flatten)]
    stipple: StippleArgs,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let field = gradient_field(cli.width, cli.height)?;
    let mut rng = StdRng::seed_from_u64(cli.stipple.seed);
    let mut engine = StippleEngine::try_new(cli.stipple.relax_config(), &field)?;

    let mut sink = FnSink::new(|event| {
        if let RelaxEvent::IterationFinished { report } = event {
            tracing::info!(
                "iteration {:>3}: max displacement {:.3}, {} frozen",
                report.iteration,
                report.max_displacement,
                report.frozen_sites
            );
        }
    });
    let result = engine.run_with_events(&mut rng, &mut sink, None)?;

    save_canvas_png(
        &result.sites,
        engine.field_size(),
        cli.stipple.present_config(),
        &cli.out,
    )
}
