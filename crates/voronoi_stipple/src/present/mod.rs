//! Turns relaxed sites into drawable stipples.
//!
//! A site is drawn when its weight exceeds the visibility threshold, as a filled disk
//! centred at `position * scale` with radius `base_radius * scale * (0.4 + 0.01 * weight / 255)`.
//! [`StipplePresenter::render`] rasterizes the disks into a [`StippleCanvas`].
use glam::Vec2;

use crate::error::{Error, Result};
use crate::site::{Site, WEIGHT_SCALE};

/// Presentation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PresentConfig {
    /// Output pixels per field pixel.
    pub scale: f32,
    /// Disk radius before scaling and weight modulation.
    pub base_radius: f32,
    /// Sites with `weight <= visibility_threshold` are not drawn.
    pub visibility_threshold: f32,
}

impl Default for PresentConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            base_radius: 1.0,
            visibility_threshold: 10.0,
        }
    }
}

impl PresentConfig {
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_base_radius(mut self, base_radius: f32) -> Self {
        self.base_radius = base_radius;
        self
    }

    pub fn with_visibility_threshold(mut self, threshold: f32) -> Self {
        self.visibility_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "scale must be finite and > 0, got {}",
                self.scale
            )));
        }
        if !(self.base_radius.is_finite() && self.base_radius >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "base_radius must be finite and >= 0, got {}",
                self.base_radius
            )));
        }
        if self.visibility_threshold.is_nan() {
            return Err(Error::InvalidConfig("visibility_threshold is NaN".into()));
        }
        Ok(())
    }
}

/// A filled circle in output pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Disk {
    pub center: Vec2,
    pub radius: f32,
}

/// Single-channel ink coverage, row-major; `255` is ink, `0` is paper.
#[derive(Clone, Debug, PartialEq)]
pub struct StippleCanvas {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl StippleCanvas {
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Number of inked pixels.
    pub fn coverage(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0).count()
    }

    /// Luminance image with black stipples on white paper.
    pub fn to_luma8(&self) -> Vec<u8> {
        self.data.iter().map(|&v| 255 - v).collect()
    }
}

/// Maps sites to disks and draws them.
#[derive(Clone, Copy, Debug, Default)]
pub struct StipplePresenter {
    pub config: PresentConfig,
}

impl StipplePresenter {
    pub fn try_new(config: PresentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn is_visible(&self, site: &Site) -> bool {
        site.weight > self.config.visibility_threshold
    }

    pub fn radius(&self, weight: f32) -> f32 {
        self.config.base_radius * self.config.scale * (0.4 + 0.01 * weight / WEIGHT_SCALE)
    }

    /// Disks of all visible sites, in site order.
    pub fn disks(&self, sites: &[Site]) -> Vec<Disk> {
        sites
            .iter()
            .filter(|s| self.is_visible(s))
            .map(|s| Disk {
                center: s.position * self.config.scale,
                radius: self.radius(s.weight),
            })
            .collect()
    }

    /// Rasterizes the visible disks into a canvas of `field_size * scale` pixels.
    ///
    /// A pixel is inked when its centre lies inside a disk.
    pub fn render(&self, sites: &[Site], field_size: (u32, u32)) -> StippleCanvas {
        let width = (field_size.0 as f32 * self.config.scale).ceil() as u32;
        let height = (field_size.1 as f32 * self.config.scale).ceil() as u32;
        let mut data = vec![0u8; (width as usize) * (height as usize)];
        if data.is_empty() {
            return StippleCanvas {
                width,
                height,
                data,
            };
        }

        let w_i = width as i64;
        let h_i = height as i64;
        for disk in self.disks(sites) {
            let r = disk.radius;
            let r2 = r * r;
            let start_x = ((disk.center.x - r).floor() as i64).max(0);
            let end_x = ((disk.center.x + r).ceil() as i64).min(w_i - 1);
            let start_y = ((disk.center.y - r).floor() as i64).max(0);
            let end_y = ((disk.center.y + r).ceil() as i64).min(h_i - 1);

            for py in start_y..=end_y {
                let row = (py as usize) * (width as usize);
                let dy = py as f32 + 0.5 - disk.center.y;
                for px in start_x..=end_x {
                    let dx = px as f32 + 0.5 - disk.center.x;
                    if dx * dx + dy * dy <= r2 {
                        data[row + px as usize] = 255;
                    }
                }
            }
        }

        StippleCanvas {
            width,
            height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: u32, x: f32, y: f32, weight: f32) -> Site {
        Site::new(id, Vec2::new(x, y)).with_weight(weight)
    }

    #[test]
    fn hides_light_sites() {
        let presenter = StipplePresenter::default();
        let sites = [site(0, 1.0, 1.0, 10.0), site(1, 2.0, 2.0, 10.5)];
        let disks = presenter.disks(&sites);
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].center, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn radius_follows_weight_and_scale() {
        let presenter =
            StipplePresenter::try_new(PresentConfig::default().with_scale(4.0).with_base_radius(2.0))
                .unwrap();
        assert!((presenter.radius(0.0) - 3.2).abs() < 1e-6);
        assert!((presenter.radius(255.0) - 3.28).abs() < 1e-5);

        let disks = presenter.disks(&[site(0, 1.5, 2.0, 255.0)]);
        assert_eq!(disks[0].center, Vec2::new(6.0, 8.0));
    }

    #[test]
    fn render_stamps_disks_by_pixel_centre() {
        let presenter =
            StipplePresenter::try_new(PresentConfig::default().with_scale(10.0)).unwrap();
        // radius = 10 * 0.41 = 4.1
        let canvas = presenter.render(&[site(0, 2.0, 2.0, 255.0)], (4, 3));
        assert_eq!((canvas.width, canvas.height), (40, 30));
        assert_eq!(canvas.get(20, 20), 255);
        assert_eq!(canvas.get(23, 20), 255);
        assert_eq!(canvas.get(24, 20), 0);
        assert_eq!(canvas.get(0, 0), 0);
        assert!(canvas.coverage() > 40 && canvas.coverage() < 64);
        assert_eq!(canvas.to_luma8()[0], 255);
    }

    #[test]
    fn render_clips_at_edges() {
        let presenter =
            StipplePresenter::try_new(PresentConfig::default().with_scale(3.0)).unwrap();
        let canvas = presenter.render(&[site(0, 0.0, 0.0, 200.0)], (2, 2));
        assert_eq!(canvas.get(0, 0), 255);
        assert_eq!(canvas.data.len(), 36);
    }

    #[test]
    fn rejects_bad_config() {
        assert!(StipplePresenter::try_new(PresentConfig::default().with_scale(0.0)).is_err());
        assert!(StipplePresenter::try_new(PresentConfig::default().with_base_radius(-1.0)).is_err());
        assert!(
            StipplePresenter::try_new(PresentConfig::default().with_visibility_threshold(f32::NAN))
                .is_err()
        );
    }
}
