//! Packed per-site centroid record for bounded-width transport.
//!
//! Layout, two RGBA8 texels per site:
//!
//! | texel | R | G | B | A |
//! |---|---|---|---|---|
//! | 0 | x integer low 8 bits | y integer low 8 bits | x high nibble, y high nibble | mean weight (0..255) |
//! | 1 | x fraction | y fraction | unused | valid flag |
//!
//! Coordinates are grid-space values in `[0, 4096)` with a resolution of `1/256`.
use glam::Vec2;

use crate::codec::{decode_pair_interleaved, encode_pair_interleaved, Channel, ChannelFormat};
use crate::error::{Error, Result};

const FORMAT: ChannelFormat = ChannelFormat::RGBA8;
const VALID: u8 = 255;

/// Exclusive upper bound of packed grid coordinates.
pub const PACKED_COORD_LIMIT: u32 = 4096;

/// One site's centroid and mean weight packed into two RGBA8 texels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedCentroid {
    pub texels: [[u8; 4]; 2],
}

impl PackedCentroid {
    /// Packs a grid-space centroid and a mean weight on the 0..255 scale.
    ///
    /// `None` marks a site whose accumulated weight was zero; only the weight is stored.
    pub fn pack(centroid: Option<Vec2>, mean_weight: f32) -> Result<Self> {
        let weight = if mean_weight.is_finite() {
            mean_weight.round().clamp(0.0, 255.0) as u8
        } else {
            0
        };

        let Some(c) = centroid else {
            return Ok(Self {
                texels: [[0, 0, 0, weight], [0, 0, 0, 0]],
            });
        };

        let (ix, fx) = quantize_axis(c.x)?;
        let (iy, fy) = quantize_axis(c.y)?;
        let [x_lo, y_lo, hi] = encode_pair_interleaved(ix, iy, FORMAT)?;

        Ok(Self {
            texels: [
                [x_lo as u8, y_lo as u8, hi as u8, weight],
                [fx, fy, 0, VALID],
            ],
        })
    }

    /// Recovers the centroid (if any) and the mean weight.
    pub fn unpack(&self) -> Result<(Option<Vec2>, f32)> {
        let [t0, t1] = self.texels;
        let weight = t0[3] as f32;
        if t1[3] != VALID {
            return Ok((None, weight));
        }

        let channels: [Channel; 3] = [t0[0] as Channel, t0[1] as Channel, t0[2] as Channel];
        let (ix, iy) = decode_pair_interleaved(channels, FORMAT)?;
        let scale = FORMAT.epsilon();
        let x = ix as f32 + t1[0] as f32 * scale;
        let y = iy as f32 + t1[1] as f32 * scale;
        Ok((Some(Vec2::new(x, y)), weight))
    }

    /// Largest absolute coordinate error introduced by packing.
    pub fn coordinate_epsilon() -> f32 {
        FORMAT.epsilon()
    }
}

fn quantize_axis(v: f32) -> Result<(u32, u8)> {
    if !v.is_finite() || v < 0.0 || v >= PACKED_COORD_LIMIT as f32 {
        return Err(Error::Codec(format!(
            "centroid coordinate {v} outside [0, {PACKED_COORD_LIMIT})"
        )));
    }
    let levels = FORMAT.levels() as f64;
    let max_q = PACKED_COORD_LIMIT as u64 * FORMAT.levels() - 1;
    let q = ((v as f64 * levels).round() as u64).min(max_q);
    Ok(((q >> FORMAT.bits()) as u32, (q & FORMAT.max_value() as u64) as u8))
}
