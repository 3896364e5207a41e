//! Error types
//!
//! Construction paths return these; per-frame stepping is infallible.

use thiserror::Error;

use crate::sim::physics::BodyHandle;

/// Rejected configuration (never silently clamped)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Gap margin leaves an empty or negative sampling interval inside a band
    #[error("band gap {gap} must be >= 0 and < half the band width ({band_width})")]
    DegenerateBandGap {
        /// Configured gap margin
        gap: f32,
        /// Width of one density band
        band_width: f32,
    },

    /// Ring radii are not an ordered, finite, non-negative pair
    #[error("invalid ring radii: inner {inner}, outer {outer}")]
    InvalidRadii { inner: f32, outer: f32 },

    #[error("band count must be at least 1")]
    ZeroBands,

    #[error("highlight stride must be at least 1")]
    ZeroStride,

    /// A probability/fraction field outside [0, 1]
    #[error("{field} must be within [0, 1], got {value}")]
    FractionOutOfRange { field: &'static str, value: f32 },

    #[error("invalid hex colour {0:?}")]
    InvalidColor(String),

    /// A tunable that must be finite and within bounds
    #[error("{field} must be {expected}, got {value}")]
    InvalidValue {
        field: &'static str,
        value: f32,
        expected: &'static str,
    },

    /// Wall grid with a zero dimension or non-positive brick size
    #[error("invalid wall layout: {0}")]
    InvalidWall(String),

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Reject zero, negative and non-finite values
    pub fn check_positive(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue { field, value, expected: "finite and > 0" })
        }
    }

    /// Reject negative and non-finite values
    pub fn check_non_negative(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue { field, value, expected: "finite and >= 0" })
        }
    }
}

/// Failures reported by the physics backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Backend cannot allocate another body
    #[error("physics world is full ({limit} bodies)")]
    CapacityExhausted { limit: usize },

    #[error("unknown body {0:?}")]
    UnknownBody(BodyHandle),
}

/// Failure while building a scene or one of its components
#[derive(Error, Debug)]
pub enum SceneError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Physics(#[from] PhysicsError),
}
