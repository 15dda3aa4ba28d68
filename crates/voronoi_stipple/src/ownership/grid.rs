//! Ownership grid storage.
use crate::error::{Error, Result};
use crate::site::SiteId;

/// Marker for cells not yet written by a rasterizer.
pub const UNOWNED: SiteId = SiteId::MAX;

/// Row-major grid of owning site ids at `S` cells per field pixel and axis.
#[derive(Clone, Debug)]
pub struct OwnershipGrid {
    width: usize,
    height: usize,
    supersampling: u32,
    owners: Vec<SiteId>,
}

impl OwnershipGrid {
    /// Creates the grid for a `field_width x field_height` field, all cells [`UNOWNED`].
    pub fn new(field_width: u32, field_height: u32, supersampling: u32) -> Self {
        debug_assert!(supersampling >= 1, "supersampling must be >= 1");
        let s = supersampling.max(1);
        let width = (field_width * s) as usize;
        let height = (field_height * s) as usize;
        Self {
            width,
            height,
            supersampling: s,
            owners: vec![UNOWNED; width * height],
        }
    }

    /// Size `(width, height)` in cells.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn supersampling(&self) -> u32 {
        self.supersampling
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> SiteId {
        self.owners[y * self.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[SiteId] {
        let start = y * self.width;
        &self.owners[start..start + self.width]
    }

    pub fn owners(&self) -> &[SiteId] {
        &self.owners
    }

    /// Mutable row-major storage for backends.
    pub fn owners_mut(&mut self) -> &mut [SiteId] {
        &mut self.owners
    }

    /// Resets every cell to [`UNOWNED`].
    pub fn clear(&mut self) {
        self.owners.fill(UNOWNED);
    }

    /// Number of cells owned by each of the `n` sites.
    pub fn counts(&self, n: usize) -> Vec<u64> {
        let mut counts = vec![0u64; n];
        for &id in &self.owners {
            if let Some(c) = counts.get_mut(id as usize) {
                *c += 1;
            }
        }
        counts
    }

    /// Checks the partition invariant: every cell holds an id in `[0, n)`.
    pub fn validate(&self, n: usize) -> Result<()> {
        if let Some(i) = self.owners.iter().position(|&id| id as usize >= n) {
            return Err(Error::InvalidState(format!(
                "cell ({}, {}) owned by {} outside [0, {n})",
                i % self.width.max(1),
                i / self.width.max(1),
                self.owners[i]
            )));
        }
        Ok(())
    }
}
