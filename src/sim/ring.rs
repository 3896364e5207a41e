//! Banded annulus particle layout
//!
//! Scatters a fixed particle count over `[inner_radius, outer_radius]`,
//! split into equal-width density bands with a gap margin on both edges of
//! every band. Most particles are ice or rock; every `highlight_stride`-th
//! index is a highlight slot coloured after a featured category.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Base colour plus bounded per-channel jitter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub base: Vec3,
    /// Each channel gains `U[0, jitter)` on top of `base`
    pub jitter: Vec3,
}

impl Palette {
    /// Bluish white
    pub const ICE: Palette = Palette {
        base: Vec3::new(0.9, 0.95, 1.0),
        jitter: Vec3::new(0.1, 0.05, 0.0),
    };

    /// Brownish dust
    pub const ROCK: Palette = Palette {
        base: Vec3::new(0.6, 0.4, 0.2),
        jitter: Vec3::new(0.2, 0.2, 0.1),
    };

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        self.base
            + Vec3::new(
                rng.random::<f32>() * self.jitter.x,
                rng.random::<f32>() * self.jitter.y,
                rng.random::<f32>() * self.jitter.z,
            )
    }
}

/// A featured item shown as a highlight particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: Vec3,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: Vec3) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color,
        }
    }

    /// Build from a `#RRGGBB` colour string
    pub fn from_hex(id: &str, name: &str, hex: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(id, name, parse_hex_color(hex)?))
    }
}

/// Parse `#RRGGBB` (leading `#` optional) into 0..1 RGB
pub fn parse_hex_color(hex: &str) -> Result<Vec3, ConfigError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(ConfigError::InvalidColor(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| ConfigError::InvalidColor(hex.to_string()))
    };
    Ok(Vec3::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Layout parameters for one ring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingParams {
    pub count: usize,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub band_count: u32,
    /// Margin kept clear on both edges of each band
    pub band_gap: f32,
    /// Total vertical spread, centred on y = 0
    pub vertical_jitter: f32,
    /// Probability that a regular particle is ice rather than rock
    pub ice_fraction: f32,
    /// Every `highlight_stride`-th index is a highlight slot
    pub highlight_stride: usize,
    /// Indices from each slot on that join its cluster (0 = slot only)
    pub cluster_size: usize,
}

impl Default for RingParams {
    fn default() -> Self {
        Self {
            count: 10_000,
            inner_radius: 4.5,
            outer_radius: 5.5,
            band_count: 3,
            band_gap: RING_BAND_GAP,
            vertical_jitter: RING_VERTICAL_JITTER,
            ice_fraction: RING_ICE_FRACTION,
            highlight_stride: RING_HIGHLIGHT_STRIDE,
            cluster_size: RING_CLUSTER_SIZE,
        }
    }
}

impl RingParams {
    /// Radial width of one density band
    pub fn band_width(&self) -> f32 {
        (self.outer_radius - self.inner_radius) / self.band_count.max(1) as f32
    }

    /// Reject configurations that would sample from an empty interval
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (inner, outer) = (self.inner_radius, self.outer_radius);
        if !inner.is_finite() || !outer.is_finite() || inner < 0.0 || outer <= inner {
            return Err(ConfigError::InvalidRadii { inner, outer });
        }
        if self.band_count == 0 {
            return Err(ConfigError::ZeroBands);
        }
        let band_width = self.band_width();
        if !(self.band_gap >= 0.0 && self.band_gap < band_width / 2.0) {
            return Err(ConfigError::DegenerateBandGap {
                gap: self.band_gap,
                band_width,
            });
        }
        if self.highlight_stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        if !(0.0..=1.0).contains(&self.ice_fraction) {
            return Err(ConfigError::FractionOutOfRange {
                field: "ice_fraction",
                value: self.ice_fraction,
            });
        }
        Ok(())
    }

    /// Radial interval particles in `band` are drawn from
    pub fn band_interval(&self, band: u32) -> (f32, f32) {
        let start = self.inner_radius + band as f32 * self.band_width();
        (start + self.band_gap, start + self.band_width() - self.band_gap)
    }
}

/// Parallel per-particle buffers for one ring
#[derive(Debug, Clone, Default)]
pub struct RingLayout {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub sizes: Vec<f32>,
    /// Density band each particle was placed in
    pub bands: Vec<u32>,
}

impl RingLayout {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions as a flat `[x, y, z, ...]` buffer
    pub fn flat_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colours as a flat `[r, g, b, ...]` buffer
    pub fn flat_colors(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// Highlight cluster being filled in after its slot
struct Cluster {
    color: Vec3,
    angle: f32,
    radius: f32,
    band: u32,
    remaining: usize,
}

fn highlight_size<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    0.02 + rng.random::<f32>() * 0.01
}

/// Lay out `params.count` particles
///
/// Every index receives exactly one position, colour, size and band. The
/// indices right after a highlight slot are clustered around it in the
/// slot's colour, clamped to the slot's band and cut off at `count`. The
/// random source is injected so a seeded RNG reproduces the layout.
pub fn generate<R: Rng + ?Sized>(
    params: &RingParams,
    categories: &[Category],
    rng: &mut R,
) -> Result<RingLayout, ConfigError> {
    params.validate()?;

    let count = params.count;
    let mut layout = RingLayout {
        positions: Vec::with_capacity(count),
        colors: Vec::with_capacity(count),
        sizes: Vec::with_capacity(count),
        bands: Vec::with_capacity(count),
    };

    let mut cluster: Option<Cluster> = None;

    for i in 0..count {
        let mut angle = rng.random::<f32>() * std::f32::consts::TAU;
        let mut band = rng.random_range(0..params.band_count);
        let (lo, hi) = params.band_interval(band);
        let mut radius = lo + rng.random::<f32>() * (hi - lo);
        let y = (rng.random::<f32>() - 0.5) * params.vertical_jitter;

        let (color, size) = if i % params.highlight_stride == 0 && !categories.is_empty() {
            let category = &categories[(i / params.highlight_stride) % categories.len()];
            cluster = Some(Cluster {
                color: category.color,
                angle,
                radius,
                band,
                remaining: params.cluster_size.saturating_sub(1),
            });
            (category.color, highlight_size(rng))
        } else if let Some(c) = cluster.as_mut().filter(|c| c.remaining > 0) {
            c.remaining -= 1;
            let (lo, hi) = params.band_interval(c.band);
            angle = c.angle + (rng.random::<f32>() - 0.5) * RING_CLUSTER_ANGLE_SPREAD;
            radius = (c.radius + (rng.random::<f32>() - 0.5) * RING_CLUSTER_RADIUS_SPREAD)
                .clamp(lo, hi);
            band = c.band;
            (c.color, highlight_size(rng))
        } else {
            let palette = if rng.random::<f32>() < params.ice_fraction {
                Palette::ICE
            } else {
                Palette::ROCK
            };
            (palette.sample(rng), 0.005 + rng.random::<f32>() * 0.015)
        };

        layout
            .positions
            .push(Vec3::new(angle.cos() * radius, y, angle.sin() * radius));
        layout.colors.push(color);
        layout.sizes.push(size);
        layout.bands.push(band);
    }

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn tools() -> Vec<Category> {
        vec![
            Category::from_hex("rust", "Rust", "#000000").unwrap(),
            Category::from_hex("go", "Go", "#00ADD8").unwrap(),
        ]
    }

    #[test]
    fn test_parse_hex_color() {
        let c = parse_hex_color("#FF8000").unwrap();
        assert!((c - Vec3::new(1.0, 128.0 / 255.0, 0.0)).length() < 1e-6);
        assert!(parse_hex_color("00ADD8").is_ok());
        assert!(parse_hex_color("#FFF").is_err());
        assert!(parse_hex_color("#GG0000").is_err());
    }

    #[test]
    fn test_rejects_degenerate_gap() {
        let params = RingParams {
            inner_radius: 1.0,
            outer_radius: 2.0,
            band_count: 2,
            band_gap: 0.25, // exactly half of 0.5
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(matches!(
            generate(&params, &[], &mut rng),
            Err(ConfigError::DegenerateBandGap { .. })
        ));

        let params = RingParams {
            band_gap: -0.01,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_radii_and_counts() {
        let bad = [
            RingParams { inner_radius: 5.0, outer_radius: 5.0, ..Default::default() },
            RingParams { inner_radius: -1.0, ..Default::default() },
            RingParams { band_count: 0, ..Default::default() },
            RingParams { highlight_stride: 0, ..Default::default() },
            RingParams { ice_fraction: 1.5, ..Default::default() },
        ];
        for params in &bad {
            assert!(params.validate().is_err(), "{params:?} should be rejected");
        }
    }

    #[test]
    fn test_zero_count_is_empty() {
        let params = RingParams { count: 0, ..Default::default() };
        let layout = generate(&params, &tools(), &mut Pcg32::seed_from_u64(3)).unwrap();
        assert!(layout.is_empty());
        assert!(layout.flat_positions().is_empty());
    }

    #[test]
    fn test_seeded_layout_is_reproducible() {
        let params = RingParams { count: 2000, ..Default::default() };
        let a = generate(&params, &tools(), &mut Pcg32::seed_from_u64(42)).unwrap();
        let b = generate(&params, &tools(), &mut Pcg32::seed_from_u64(42)).unwrap();
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.colors, b.colors);
        assert_eq!(a.bands, b.bands);
    }

    #[test]
    fn test_highlight_slots_cycle_categories() {
        let params = RingParams {
            count: 50,
            highlight_stride: 10,
            cluster_size: 0,
            ..Default::default()
        };
        let cats = tools();
        let layout = generate(&params, &cats, &mut Pcg32::seed_from_u64(7)).unwrap();

        for (slot, i) in (0..50).step_by(10).enumerate() {
            assert_eq!(layout.colors[i], cats[slot % cats.len()].color);
            assert!(layout.sizes[i] >= 0.02);
        }
        assert!(layout.sizes[1] < 0.02);
    }

    #[test]
    fn test_clusters_gather_around_their_slot() {
        let params = RingParams {
            count: 2050,
            highlight_stride: 1000,
            ..Default::default()
        };
        let cats = tools();
        let layout = generate(&params, &cats, &mut Pcg32::seed_from_u64(5)).unwrap();
        assert_eq!(layout.len(), 2050);

        for (slot, start) in [0usize, 1000, 2000].into_iter().enumerate() {
            let color = cats[slot % cats.len()].color;
            let center = layout.positions[start];
            let center_angle = center.z.atan2(center.x);
            let center_radius = center.x.hypot(center.z);

            for i in start..start + RING_CLUSTER_SIZE {
                assert_eq!(layout.colors[i], color, "index {i}");
                assert!(layout.sizes[i] >= 0.02);
                assert_eq!(layout.bands[i], layout.bands[start]);

                let p = layout.positions[i];
                let mut d_angle = (p.z.atan2(p.x) - center_angle).abs();
                if d_angle > std::f32::consts::PI {
                    d_angle = std::f32::consts::TAU - d_angle;
                }
                assert!(d_angle <= RING_CLUSTER_ANGLE_SPREAD / 2.0 + 1e-4);
                assert!((p.x.hypot(p.z) - center_radius).abs() <= RING_CLUSTER_RADIUS_SPREAD / 2.0 + 1e-4);
            }
        }
        // Cluster ends after RING_CLUSTER_SIZE indices
        assert!(layout.sizes[RING_CLUSTER_SIZE] < 0.02);
    }

    #[test]
    fn test_zero_cluster_size_highlights_slot_only() {
        let params = RingParams {
            count: 100,
            cluster_size: 0,
            ..Default::default()
        };
        let layout = generate(&params, &tools(), &mut Pcg32::seed_from_u64(6)).unwrap();
        assert!(layout.sizes[0] >= 0.02);
        assert!(layout.sizes[1..].iter().all(|&s| s < 0.02));
    }

    #[test]
    fn test_flat_buffers_are_three_floats_per_particle() {
        let params = RingParams { count: 123, ..Default::default() };
        let layout = generate(&params, &[], &mut Pcg32::seed_from_u64(9)).unwrap();
        assert_eq!(layout.flat_positions().len(), 369);
        assert_eq!(layout.flat_colors().len(), 369);
        assert_eq!(layout.sizes.len(), 123);
        assert_eq!(layout.flat_positions()[3], layout.positions[1].x);
    }

    #[test]
    fn test_regular_colors_come_from_palettes() {
        let params = RingParams {
            count: 500,
            highlight_stride: usize::MAX,
            cluster_size: 0,
            ..Default::default()
        };
        let layout = generate(&params, &tools(), &mut Pcg32::seed_from_u64(11)).unwrap();
        let within = |c: Vec3, p: Palette| {
            c.cmpge(p.base).all() && c.cmple(p.base + p.jitter).all()
        };
        // index 0 is still a highlight slot
        for &c in &layout.colors[1..] {
            assert!(within(c, Palette::ICE) || within(c, Palette::ROCK), "{c:?}");
        }
    }

    proptest! {
        #[test]
        fn prop_every_particle_lands_in_its_band(
            count in 0usize..400,
            inner in 0.0f32..10.0,
            width in 0.1f32..10.0,
            band_count in 1u32..8,
            gap_frac in 0.0f32..0.98,
            seed in any::<u64>(),
        ) {
            let band_width = width / band_count as f32;
            let params = RingParams {
                count,
                inner_radius: inner,
                outer_radius: inner + width,
                band_count,
                band_gap: gap_frac * band_width / 2.0,
                ..Default::default()
            };
            let layout = generate(&params, &tools(), &mut Pcg32::seed_from_u64(seed)).unwrap();

            prop_assert_eq!(layout.positions.len(), count);
            prop_assert_eq!(layout.colors.len(), count);
            prop_assert_eq!(layout.sizes.len(), count);
            prop_assert_eq!(layout.bands.len(), count);

            let eps = 1e-3 * (inner + width).max(1.0);
            for (p, &band) in layout.positions.iter().zip(&layout.bands) {
                prop_assert!(band < band_count);
                let r = (p.x * p.x + p.z * p.z).sqrt();
                prop_assert!(r >= inner - eps && r <= inner + width + eps);
                let (lo, hi) = params.band_interval(band);
                prop_assert!(r >= lo - eps && r <= hi + eps);
                prop_assert!(p.y.abs() <= params.vertical_jitter / 2.0 + 1e-6);
            }
        }
    }
}
