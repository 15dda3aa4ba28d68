//! Fixed-width channel packing for values that exceed a single channel.
//!
//! Two packing modes are provided:
//! - [`encode`]/[`decode`]: little-endian base-`2^bits` splitting of an integer
//!   across several channels (`v mod 256`, `v / 256 mod 256`, ... for 8-bit channels).
//! - [`encode_pair_interleaved`]/[`decode_pair_interleaved`]: two coordinates share a
//!   third channel, x's high bits in its low half and y's high bits in its high half.
//!
//! [`encode_fixed`]/[`decode_fixed`] extend integer packing with one trailing fractional
//! channel for continuous coordinates. [`centroid::PackedCentroid`] combines both modes
//! into the per-site record used by the reduction pipeline.
use crate::error::{Error, Result};

pub mod centroid;

pub use centroid::PackedCentroid;

/// Channel word type. Formats wider than 16 bits are rejected.
pub type Channel = u16;

/// Width of a single channel in bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelFormat {
    bits: u32,
}

impl ChannelFormat {
    /// 8-bit channels, as found in RGBA8 render targets.
    pub const RGBA8: ChannelFormat = ChannelFormat { bits: 8 };

    /// Largest supported channel width.
    pub const MAX_BITS: u32 = Channel::BITS;

    /// Creates a format with `bits` bits per channel (`1..=16`).
    pub fn new(bits: u32) -> Result<Self> {
        if bits == 0 || bits > Self::MAX_BITS {
            return Err(Error::Codec(format!(
                "channel width must be in 1..={}, got {bits}",
                Self::MAX_BITS
            )));
        }
        Ok(Self { bits })
    }

    /// Bits per channel.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Largest value a single channel can hold.
    #[inline]
    pub fn max_value(&self) -> Channel {
        ((1u32 << self.bits) - 1) as Channel
    }

    /// Number of distinct values per channel (`2^bits`).
    #[inline]
    pub fn levels(&self) -> u64 {
        1u64 << self.bits
    }

    /// Quantization step of one fractional channel, `1 / 2^bits`.
    #[inline]
    pub fn epsilon(&self) -> f32 {
        1.0 / self.levels() as f32
    }

    /// Exclusive upper bound of integers representable in `num_channels` channels.
    /// Returns `None` when the bound does not fit in a `u64` (all values representable).
    pub fn capacity(&self, num_channels: usize) -> Option<u64> {
        let total = (num_channels as u64).saturating_mul(self.bits as u64);
        if total >= 64 {
            None
        } else {
            Some(1u64 << total)
        }
    }

    fn check_channel(&self, value: Channel) -> Result<()> {
        if value > self.max_value() {
            return Err(Error::Codec(format!(
                "channel value {value} exceeds {}-bit range",
                self.bits
            )));
        }
        Ok(())
    }
}

impl Default for ChannelFormat {
    fn default() -> Self {
        Self::RGBA8
    }
}

/// Splits `value` across `num_channels` channels, least significant first.
pub fn encode(value: u64, num_channels: usize, format: ChannelFormat) -> Result<Vec<Channel>> {
    if num_channels == 0 {
        return Err(Error::Codec("at least one channel is required".into()));
    }
    if (num_channels as u64) * (format.bits as u64) > 64 {
        return Err(Error::Codec(format!(
            "{num_channels} channels of {} bits exceed 64 bits",
            format.bits
        )));
    }
    if let Some(cap) = format.capacity(num_channels) {
        if value >= cap {
            return Err(Error::Codec(format!(
                "value {value} does not fit in {num_channels} channels of {} bits",
                format.bits
            )));
        }
    }

    let mask = format.max_value() as u64;
    let mut rest = value;
    let mut out = Vec::with_capacity(num_channels);
    for _ in 0..num_channels {
        out.push((rest & mask) as Channel);
        rest = rest.checked_shr(format.bits).unwrap_or(0);
    }
    Ok(out)
}

/// Reassembles a value produced by [`encode`].
pub fn decode(channels: &[Channel], format: ChannelFormat) -> Result<u64> {
    if channels.is_empty() {
        return Err(Error::Codec("at least one channel is required".into()));
    }
    if (channels.len() as u64) * (format.bits as u64) > 64 {
        return Err(Error::Codec(format!(
            "{} channels of {} bits exceed 64 bits",
            channels.len(),
            format.bits
        )));
    }

    let mut value = 0u64;
    for (i, &c) in channels.iter().enumerate() {
        format.check_channel(c)?;
        value |= (c as u64) << (i as u32 * format.bits);
    }
    Ok(value)
}

/// Exclusive upper bound per axis for [`encode_pair_interleaved`].
pub fn interleaved_capacity(format: ChannelFormat) -> u32 {
    1u32 << (format.bits + format.bits / 2)
}

/// Packs two coordinates into three channels.
///
/// Channel 0 and 1 hold the low `bits` of x and y. Channel 2 holds the remaining high
/// bits: x in the low half, y in the high half. With 8-bit channels each axis covers
/// `[0, 4096)`.
pub fn encode_pair_interleaved(x: u32, y: u32, format: ChannelFormat) -> Result<[Channel; 3]> {
    if format.bits % 2 != 0 {
        return Err(Error::Codec(format!(
            "interleaved packing needs an even channel width, got {}",
            format.bits
        )));
    }
    let cap = interleaved_capacity(format);
    if x >= cap || y >= cap {
        return Err(Error::Codec(format!(
            "coordinate pair ({x}, {y}) exceeds interleaved range {cap}"
        )));
    }

    let half = format.bits / 2;
    let low_mask = format.max_value() as u32;
    let x_hi = x >> format.bits;
    let y_hi = y >> format.bits;
    Ok([
        (x & low_mask) as Channel,
        (y & low_mask) as Channel,
        (x_hi | (y_hi << half)) as Channel,
    ])
}

/// Inverse of [`encode_pair_interleaved`].
pub fn decode_pair_interleaved(channels: [Channel; 3], format: ChannelFormat) -> Result<(u32, u32)> {
    if format.bits % 2 != 0 {
        return Err(Error::Codec(format!(
            "interleaved packing needs an even channel width, got {}",
            format.bits
        )));
    }
    for c in channels {
        format.check_channel(c)?;
    }

    let half = format.bits / 2;
    let half_mask = (1u32 << half) - 1;
    let shared = channels[2] as u32;
    let x = channels[0] as u32 | ((shared & half_mask) << format.bits);
    let y = channels[1] as u32 | ((shared >> half) << format.bits);
    Ok((x, y))
}

/// Encodes a non-negative continuous value as `int_channels` integer channels followed by
/// one fractional channel. The round-trip error is at most [`ChannelFormat::epsilon`].
pub fn encode_fixed(value: f32, int_channels: usize, format: ChannelFormat) -> Result<Vec<Channel>> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Codec(format!(
            "fixed-point value must be finite and >= 0, got {value}"
        )));
    }
    let quantized = (value as f64 * format.levels() as f64).round() as u64;
    let frac = (quantized & format.max_value() as u64) as Channel;
    let whole = quantized >> format.bits;

    let mut out = encode(whole, int_channels, format)?;
    out.push(frac);
    Ok(out)
}

/// Inverse of [`encode_fixed`].
pub fn decode_fixed(channels: &[Channel], format: ChannelFormat) -> Result<f32> {
    let Some((&frac, whole)) = channels.split_last() else {
        return Err(Error::Codec("fixed-point value needs a fractional channel".into()));
    };
    format.check_channel(frac)?;
    let whole = decode(whole, format)?;
    Ok((whole as f64 + frac as f64 / format.levels() as f64) as f32)
}
