//! Crane rotation source
//!
//! Turns the pointer's horizontal position into a smoothed jib rotation.
//! The crane freezes once the ball is released.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::lerp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraneConfig {
    /// Rotation at pointer_x = ±1 (radians)
    pub rotation_range: f32,
    /// Lerp rate toward the target (per second)
    pub smoothing: f32,
}

impl Default for CraneConfig {
    fn default() -> Self {
        Self {
            rotation_range: CRANE_ROTATION_RANGE,
            smoothing: CRANE_SMOOTHING,
        }
    }
}

impl CraneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("crane.rotation_range", self.rotation_range)?;
        ConfigError::check_non_negative("crane.smoothing", self.smoothing)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CraneController {
    config: CraneConfig,
    rotation: f32,
    target: f32,
    frozen: bool,
}

impl CraneController {
    pub fn new(config: CraneConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Current smoothed rotation (radians about +Y)
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Stop tracking the pointer
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Ease toward the pointer. `pointer_x` is normalized to [-1, 1].
    pub fn update(&mut self, pointer_x: Option<f32>, dt: f32) -> f32 {
        if self.frozen {
            return self.rotation;
        }
        if let Some(x) = pointer_x {
            self.target = x.clamp(-1.0, 1.0) * self.config.rotation_range;
        }
        let t = (dt * self.config.smoothing).clamp(0.0, 1.0);
        self.rotation = lerp(self.rotation, self.target, t);
        self.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eases_toward_pointer() {
        let mut crane = CraneController::new(CraneConfig::default());
        let first = crane.update(Some(1.0), 1.0 / 60.0);
        assert!(first > 0.0 && first < CRANE_ROTATION_RANGE);

        for _ in 0..600 {
            crane.update(None, 1.0 / 60.0);
        }
        assert!((crane.rotation() - CRANE_ROTATION_RANGE).abs() < 1e-3);
    }

    #[test]
    fn test_pointer_is_clamped() {
        let mut crane = CraneController::new(CraneConfig::default());
        crane.update(Some(-5.0), 1.0);
        assert!((crane.target() + CRANE_ROTATION_RANGE).abs() < 1e-6);
    }

    #[test]
    fn test_large_dt_does_not_overshoot() {
        let mut crane = CraneController::new(CraneConfig::default());
        let r = crane.update(Some(0.5), 10.0);
        assert!((r - 0.5 * CRANE_ROTATION_RANGE).abs() < 1e-6);
    }

    #[test]
    fn test_config_rejects_negative_smoothing() {
        let config = CraneConfig { smoothing: -1.0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "crane.smoothing", .. })
        ));
        assert!(CraneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_frozen_crane_ignores_input() {
        let mut crane = CraneController::new(CraneConfig::default());
        crane.update(Some(1.0), 0.1);
        let held = crane.rotation();
        crane.freeze();
        crane.update(Some(-1.0), 0.1);
        assert_eq!(crane.rotation(), held);
    }
}
