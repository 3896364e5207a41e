//! Dust burst particles
//!
//! A fixed pool of point particles stored as parallel arrays. `emit` throws
//! the whole pool out of an impact point; `step` integrates it with floaty
//! gravity, air resistance and a ground clamp. The field has no notion of
//! being active: the owner decides when to call `step`.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Tunables for a dust field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DustConfig {
    pub count: usize,
    /// Horizontal distance from the impact particles spawn within
    pub spawn_radius: f32,
    /// Height band above the impact particles spawn within
    pub spawn_height: f32,
    /// Seconds an impact keeps the field stepping
    pub active_secs: f32,
    /// Rendered point size
    pub point_size: f32,
}

impl Default for DustConfig {
    fn default() -> Self {
        Self {
            count: DUST_COUNT,
            spawn_radius: DUST_SPAWN_RADIUS,
            spawn_height: DUST_SPAWN_HEIGHT,
            active_secs: DUST_ACTIVE_SECS,
            point_size: 0.15,
        }
    }
}

impl DustConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("dust.spawn_radius", self.spawn_radius)?;
        ConfigError::check_non_negative("dust.spawn_height", self.spawn_height)?;
        ConfigError::check_non_negative("dust.active_secs", self.active_secs)?;
        ConfigError::check_non_negative("dust.point_size", self.point_size)
    }
}

/// Pool of dust particles
#[derive(Debug, Clone)]
pub struct DustField {
    spawn_radius: f32,
    spawn_height: f32,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    colors: Vec<Vec3>,
}

impl DustField {
    /// Allocate `config.count` particles resting over a wide patch of ground
    pub fn new<R: Rng + ?Sized>(config: &DustConfig, rng: &mut R) -> Self {
        let count = config.count;
        let mut positions = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);

        for _ in 0..count {
            positions.push(Vec3::new(
                (rng.random::<f32>() - 0.5) * 20.0,
                rng.random::<f32>() * 0.5,
                (rng.random::<f32>() - 0.5) * 20.0,
            ));
            velocities.push(Vec3::new(
                (rng.random::<f32>() - 0.5) * 0.2,
                rng.random::<f32>() * 0.5 + 0.1,
                (rng.random::<f32>() - 0.5) * 0.2,
            ));
            // Dusty brown with brightness variation
            let brightness = 0.6 + rng.random::<f32>() * 0.4;
            colors.push(Vec3::new(0.8, 0.7, 0.5) * brightness);
        }

        Self {
            spawn_radius: config.spawn_radius,
            spawn_height: config.spawn_height,
            positions,
            velocities,
            colors,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    /// Positions as a flat `[x, y, z, ...]` buffer
    pub fn flat_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colours as a flat `[r, g, b, ...]` buffer
    pub fn flat_colors(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn spawn_radius(&self) -> f32 {
        self.spawn_radius
    }

    pub fn spawn_height(&self) -> f32 {
        self.spawn_height
    }

    /// Throw every particle out of `origin`
    ///
    /// Overwrites all positions and velocities; nothing from a previous
    /// burst carries over.
    pub fn emit<R: Rng + ?Sized>(&mut self, origin: Vec3, rng: &mut R) {
        for (pos, vel) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            let spawn_angle = rng.random::<f32>() * std::f32::consts::TAU;
            let spawn_dist = rng.random::<f32>().sqrt() * self.spawn_radius;
            *pos = origin
                + Vec3::new(
                    spawn_angle.cos() * spawn_dist,
                    rng.random::<f32>() * self.spawn_height,
                    spawn_angle.sin() * spawn_dist,
                );

            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let speed = rng.random::<f32>() * 0.5 + 0.2;
            *vel = Vec3::new(
                angle.cos() * speed,
                rng.random::<f32>() * 1.5 + 0.5,
                angle.sin() * speed,
            );
        }
    }

    /// Integrate one frame of `dt` seconds
    pub fn step(&mut self, dt: f32) {
        let gravity = GRAVITY * dt * DUST_GRAVITY_SCALE;
        for (pos, vel) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            // Velocities are in units per 60 Hz frame
            *pos += *vel * dt * DUST_FRAME_RATE;
            vel.y -= gravity;
            *vel *= DUST_AIR_RESISTANCE;

            // Resting particles stay put: y = 0 is a fixed point
            if pos.y <= 0.0 {
                pos.y = 0.0;
                vel.y = 0.0;
            }
        }
    }
}
