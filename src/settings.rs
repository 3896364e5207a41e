//! Scene settings and quality presets
//!
//! Loaded from JSON; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::crane::CraneConfig;
use crate::sim::dust::DustConfig;
use crate::sim::saturn::{RingConfig, default_rings};
use crate::sim::tether::TetherConfig;
use crate::sim::wall::WallConfig;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Fraction of the configured dust pool actually allocated
    pub fn dust_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 0.5,
            QualityPreset::High => 1.0,
        }
    }

    /// Fraction of the configured ring particles actually laid out
    pub fn ring_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.1,
            QualityPreset::Medium => 0.4,
            QualityPreset::High => 1.0,
        }
    }
}

/// Everything a scene needs to be built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityPreset,
    /// Fixed seed for reproducible runs (random when absent)
    pub seed: Option<u64>,
    pub crane: CraneConfig,
    pub tether: TetherConfig,
    pub wall: WallConfig,
    pub dust: DustConfig,
    pub rings: Vec<RingConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::default(),
            seed: None,
            crane: CraneConfig::default(),
            tether: TetherConfig::default(),
            wall: WallConfig::default(),
            dust: DustConfig::default(),
            rings: default_rings(),
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Default::default()
        }
    }

    /// Dust pool size after the quality preset is applied
    pub fn effective_dust(&self) -> DustConfig {
        DustConfig {
            count: (self.dust.count as f32 * self.quality.dust_scale()).round() as usize,
            ..self.dust.clone()
        }
    }

    /// Check everything that would otherwise fail later at build time
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.crane.validate()?;
        self.tether.validate()?;
        self.wall.validate()?;
        self.dust.validate()?;
        for (index, ring) in self.rings.iter().enumerate() {
            // A drawn band count is at most 4, the narrowest bands it can get
            let bands = ring.band_count.unwrap_or(4);
            ring.params(bands, self.quality.ring_scale())
                .validate()
                .inspect_err(|e| log::warn!("Ring {index} rejected: {e}"))?;
        }
        Ok(())
    }

    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!(
            "Loaded settings from {} ({} quality)",
            path.display(),
            settings.quality.as_str()
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("LOW"), Some(QualityPreset::Low));
        assert_eq!(QualityPreset::parse("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
    }

    #[test]
    fn test_default_has_three_rings() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings.rings.len(), 3);
        assert_eq!(settings.quality, QualityPreset::High);
        assert_eq!(settings.wall.layout.brick_count(), 120);
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{
            "quality": "low",
            "seed": 7,
            "dust": { "count": 400 },
            "wall": { "layout": { "rows": 3 } }
        }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.quality, QualityPreset::Low);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.effective_dust().count, 100);
        assert_eq!(settings.wall.layout.rows, 3);
        assert_eq!(settings.wall.layout.columns, 4);
        assert_eq!(settings.dust.spawn_radius, 2.0);
    }

    #[test]
    fn test_degenerate_ring_is_rejected() {
        let json = r#"{ "rings": [ { "band_count": 2, "band_gap": 0.3 } ] }"#;
        assert!(matches!(
            Settings::from_json(json),
            Err(ConfigError::DegenerateBandGap { .. })
        ));
    }

    #[test]
    fn test_zero_cable_length_is_rejected() {
        let json = r#"{ "tether": { "cable_reference_length": 0 } }"#;
        assert!(matches!(
            Settings::from_json(json),
            Err(ConfigError::InvalidValue { field: "tether.cable_reference_length", .. })
        ));
    }

    #[test]
    fn test_negative_times_and_radii_are_rejected() {
        for json in [
            r#"{ "dust": { "active_secs": -1 } }"#,
            r#"{ "dust": { "spawn_radius": -0.5 } }"#,
            r#"{ "wall": { "destroy_delay_secs": -5 } }"#,
            r#"{ "tether": { "ball_radius": 0 } }"#,
            r#"{ "crane": { "rotation_range": -1 } }"#,
        ] {
            assert!(
                matches!(Settings::from_json(json), Err(ConfigError::InvalidValue { .. })),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            Settings::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings::from_preset(QualityPreset::Medium);
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Settings::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
