//! Weighted point sites relaxed by the engine.
use glam::Vec2;
use mint::Vector2;

/// Scale of [`Site::weight`]: a site covering only black pixels reaches this value.
pub const WEIGHT_SCALE: f32 = 255.0;

/// Site identifier, dense in `0..N` and stable for a run.
pub type SiteId = u32;

/// A weighted point owning a region of the density field.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Site {
    pub id: SiteId,
    /// Position in field pixel space, `[0, W) x [0, H)`.
    pub position: Vec2,
    /// Mean ink weight of the owned region on the `0..=255` scale.
    pub weight: f32,
}

impl Site {
    pub fn new(id: SiteId, position: Vec2) -> Self {
        Self {
            id,
            position,
            weight: 0.0,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }
}

/// Builds sites with dense ids from raw positions.
pub fn sites_from_positions<P>(positions: impl IntoIterator<Item = P>) -> Vec<Site>
where
    P: Into<Vector2<f32>>,
{
    positions
        .into_iter()
        .enumerate()
        .map(|(i, p)| Site::new(i as SiteId, Vec2::from(p.into())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_input_order() {
        let sites = sites_from_positions([
            Vector2 { x: 1.0, y: 2.0 },
            Vector2 { x: 3.0, y: 4.0 },
        ]);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].id, 0);
        assert_eq!(sites[1].id, 1);
        assert_eq!(sites[1].position, Vec2::new(3.0, 4.0));
        assert_eq!(sites[1].weight, 0.0);
    }
}
