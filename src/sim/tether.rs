//! Wrecking ball on a cable
//!
//! A kinematic anchor follows the crane jib tip while the ball hangs from it
//! on a spherical joint. Releasing the ball freezes the anchor; from then on
//! only the joint and gravity move the ball.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::physics::{
    BodyDesc, BodyHandle, ColliderShape, CollisionEvent, JointHandle, PhysicsWorld,
};
use crate::consts::*;
use crate::error::{ConfigError, PhysicsError};
use crate::{ground_projection, polar_to_xz};

/// Tether phase - a one-way latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TetherPhase {
    /// Anchor follows the rotation input every tick
    Attached,
    /// Anchor frozen, ball swings freely
    Released,
}

/// Tunables for the wrecking ball rig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    pub arm_length: f32,
    pub anchor_height: f32,
    pub ball_start: Vec3,
    pub ball_radius: f32,
    pub ball_mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Joint attachment relative to the ball centre
    pub joint_offset: Vec3,
    /// Unscaled cable mesh length
    pub cable_reference_length: f32,
    /// Collisions above this force are reported as impacts
    pub impact_threshold: f32,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            arm_length: JIB_LENGTH,
            anchor_height: ANCHOR_HEIGHT,
            ball_start: BALL_START,
            ball_radius: BALL_RADIUS,
            ball_mass: BALL_MASS,
            linear_damping: 0.05,
            angular_damping: 0.1,
            joint_offset: BALL_JOINT_OFFSET,
            cable_reference_length: CABLE_REFERENCE_LENGTH,
            impact_threshold: BALL_IMPACT_THRESHOLD,
        }
    }
}

impl TetherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("tether.arm_length", self.arm_length)?;
        ConfigError::check_non_negative("tether.anchor_height", self.anchor_height)?;
        ConfigError::check_positive("tether.ball_radius", self.ball_radius)?;
        ConfigError::check_positive("tether.ball_mass", self.ball_mass)?;
        ConfigError::check_non_negative("tether.linear_damping", self.linear_damping)?;
        ConfigError::check_non_negative("tether.angular_damping", self.angular_damping)?;
        ConfigError::check_positive("tether.cable_reference_length", self.cable_reference_length)?;
        ConfigError::check_non_negative("tether.impact_threshold", self.impact_threshold)?;
        if !self.ball_start.is_finite() || !self.joint_offset.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "tether.ball_start/joint_offset",
                value: f32::NAN,
                expected: "finite",
            });
        }
        Ok(())
    }

    /// Anchor position for a crane rotation (radians)
    pub fn anchor_for(&self, rotation: f32) -> Vec3 {
        polar_to_xz(self.arm_length, -rotation, self.anchor_height)
    }
}

/// Render transform for the cable mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CableTransform {
    /// Midpoint between anchor and ball
    pub position: Vec3,
    /// Orients the mesh's local Y axis along the cable
    pub rotation: Quat,
    /// Scale along local Y (distance / reference length)
    pub length_scale: f32,
}

impl CableTransform {
    pub fn between(anchor: Vec3, ball: Vec3, reference_length: f32) -> Self {
        let span = anchor - ball;
        let length = span.length();
        let rotation = if length > 1e-6 {
            Quat::from_rotation_arc(Vec3::Y, span / length)
        } else {
            Quat::IDENTITY
        };
        Self {
            position: (anchor + ball) * 0.5,
            rotation,
            length_scale: length / reference_length,
        }
    }
}

/// Ball + anchor rig driven by an external rotation
#[derive(Debug, Clone)]
pub struct SwingingTether {
    config: TetherConfig,
    anchor: BodyHandle,
    ball: BodyHandle,
    joint: JointHandle,
    phase: TetherPhase,
    anchor_position: Vec3,
    cable: CableTransform,
    /// Anchor writes issued, for inspection
    anchor_writes: u64,
}

impl SwingingTether {
    /// Create the anchor, ball and joint in `world`
    pub fn new<W: PhysicsWorld + ?Sized>(
        world: &mut W,
        config: TetherConfig,
    ) -> Result<Self, PhysicsError> {
        let anchor_position = config.anchor_for(0.0);
        let anchor = world.create_body(&BodyDesc::kinematic(anchor_position))?;
        let ball = world
            .create_body(
                &BodyDesc::dynamic(config.ball_start)
                    .with_mass(config.ball_mass)
                    .with_damping(config.linear_damping, config.angular_damping)
                    .with_collider(ColliderShape::Ball {
                        radius: config.ball_radius,
                    }),
            )
            .inspect_err(|_| world.remove_body(anchor))?;
        let joint = world
            .create_spherical_joint(anchor, ball, Vec3::ZERO, config.joint_offset)
            .inspect_err(|_| {
                world.remove_body(ball);
                world.remove_body(anchor);
            })?;

        let cable = CableTransform::between(
            anchor_position,
            config.ball_start,
            config.cable_reference_length,
        );
        log::info!(
            "Wrecking ball rigged: anchor {:?}, ball {:?}",
            anchor_position,
            config.ball_start
        );

        Ok(Self {
            config,
            anchor,
            ball,
            joint,
            phase: TetherPhase::Attached,
            anchor_position,
            cable,
            anchor_writes: 0,
        })
    }

    pub fn phase(&self) -> TetherPhase {
        self.phase
    }

    pub fn is_released(&self) -> bool {
        self.phase == TetherPhase::Released
    }

    pub fn anchor_handle(&self) -> BodyHandle {
        self.anchor
    }

    pub fn ball_handle(&self) -> BodyHandle {
        self.ball
    }

    pub fn joint_handle(&self) -> JointHandle {
        self.joint
    }

    /// Last anchor position written (or the spawn position)
    pub fn anchor_position(&self) -> Vec3 {
        self.anchor_position
    }

    pub fn cable(&self) -> CableTransform {
        self.cable
    }

    pub fn anchor_writes(&self) -> u64 {
        self.anchor_writes
    }

    pub fn config(&self) -> &TetherConfig {
        &self.config
    }

    /// Drop the ball. Returns true only on the first call.
    pub fn release(&mut self) -> bool {
        match self.phase {
            TetherPhase::Attached => {
                self.phase = TetherPhase::Released;
                log::info!("Wrecking ball released at anchor {:?}", self.anchor_position);
                true
            }
            TetherPhase::Released => false,
        }
    }

    /// Drive the anchor from `rotation` (while attached)
    ///
    /// Call before the physics step so the kinematic target lands this tick.
    pub fn drive<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, rotation: f32) {
        if self.phase == TetherPhase::Attached {
            self.anchor_position = self.config.anchor_for(rotation);
            world.set_next_kinematic_translation(self.anchor, self.anchor_position);
            self.anchor_writes += 1;
        }
    }

    /// Refresh the cable transform from the engine's body positions
    pub fn update_cable<W: PhysicsWorld + ?Sized>(&mut self, world: &W) {
        let (Some(anchor), Some(ball)) = (world.translation(self.anchor), world.translation(self.ball))
        else {
            return;
        };
        self.cable = CableTransform::between(anchor, ball, self.config.cable_reference_length);
    }

    /// Ball world position
    pub fn ball_position<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Option<Vec3> {
        world.translation(self.ball)
    }

    /// Ground-projected impact point for a qualifying ball collision
    ///
    /// Not debounced: repeated contacts each report.
    pub fn impact_point<W: PhysicsWorld + ?Sized>(
        &self,
        world: &W,
        event: &CollisionEvent,
    ) -> Option<Vec3> {
        if event.body != self.ball || event.total_force_magnitude <= self.config.impact_threshold {
            return None;
        }
        let point = ground_projection(world.translation(self.ball)?);
        log::debug!(
            "Ball impact {:.0} at {:?}",
            event.total_force_magnitude,
            point
        );
        Some(point)
    }
}
