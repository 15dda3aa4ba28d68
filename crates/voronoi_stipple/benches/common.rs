#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use voronoi_stipple::field::FnField;
use voronoi_stipple::site::Site;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub const FIELD_SIZES: [u32; 3] = [128, 256, 512];
pub const SITE_COUNTS: [usize; 3] = [256, 1024, 4096];

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Radial gradient: dark centre, light corners.
pub fn radial_field(size: u32) -> FnField<impl Fn(u32, u32) -> f32 + Send + Sync> {
    let c = size as f32 * 0.5;
    FnField::new(size, size, move |x, y| {
        let d = Vec2::new(x as f32 + 0.5 - c, y as f32 + 0.5 - c).length();
        (d / c).min(1.0)
    })
}

pub fn random_sites(n: usize, size: u32, seed: u64) -> Vec<Site> {
    let mut rng = StdRng::seed_from_u64(seed);
    let extent = size as f32 * 0.999;
    let mut unit = move || (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0);
    (0..n)
        .map(|i| Site::new(i as u32, Vec2::new(unit() * extent, unit() * extent)))
        .collect()
}
