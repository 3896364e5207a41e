//! Hero Sim - simulation cores behind the 3D hero scenes
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rings, dust, tether, debris wall, scene loop)
//! - `platform`: Browser bindings exposing flat buffers to the renderer
//! - `settings`: Quality presets and serializable scene configuration
//! - `error`: Configuration and physics error types

pub mod error;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, PhysicsError, SceneError};
pub use settings::{QualityPreset, Settings};

use glam::Vec3;

/// Simulation configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (60 Hz, matches the frame normalization)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta the driver will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// World gravity (m/s²)
    pub const GRAVITY: f32 = 9.81;

    /// Dust particles: velocities are expressed per 60 Hz frame
    pub const DUST_FRAME_RATE: f32 = 60.0;
    /// Gravity scale for dust, keeps it floaty
    pub const DUST_GRAVITY_SCALE: f32 = 0.1;
    /// Per-step multiplicative damping on all three axes
    pub const DUST_AIR_RESISTANCE: f32 = 0.98;
    /// Default dust pool size
    pub const DUST_COUNT: usize = 1000;
    /// Horizontal spawn radius around an impact
    pub const DUST_SPAWN_RADIUS: f32 = 2.0;
    /// Vertical spawn band above an impact
    pub const DUST_SPAWN_HEIGHT: f32 = 2.0;
    /// How long an impact keeps the dust field active (seconds)
    pub const DUST_ACTIVE_SECS: f32 = 3.0;

    /// Crane jib length (anchor distance from the mast)
    pub const JIB_LENGTH: f32 = 16.0;
    /// Height of the cable anchor under the jib tip
    pub const ANCHOR_HEIGHT: f32 = 18.0;
    /// Wrecking ball spawn position
    pub const BALL_START: Vec3 = Vec3::new(16.0, 10.0, 0.0);
    pub const BALL_RADIUS: f32 = 1.5;
    pub const BALL_MASS: f32 = 200.0;
    /// Joint offset on the ball body (cable attaches 8 units above centre)
    pub const BALL_JOINT_OFFSET: Vec3 = Vec3::new(0.0, 8.0, 0.0);
    /// Unscaled height of the cable mesh
    pub const CABLE_REFERENCE_LENGTH: f32 = 8.0;
    /// Ball collisions above this force emit an impact
    pub const BALL_IMPACT_THRESHOLD: f32 = 500.0;
    /// Minimum gap between accepted ball impacts (seconds)
    pub const IMPACT_COOLDOWN_SECS: f32 = 0.25;

    /// Pointer x (-1..1) maps to ±0.3π crane rotation
    pub const CRANE_ROTATION_RANGE: f32 = std::f32::consts::PI * 0.3;
    /// Lerp rate toward the target rotation (per second)
    pub const CRANE_SMOOTHING: f32 = 2.0;

    /// Destructible wall defaults
    pub const WALL_ORIGIN: Vec3 = Vec3::new(13.0, 0.0, -9.0);
    pub const WALL_ROWS: u32 = 15;
    pub const WALL_COLUMNS: u32 = 4;
    pub const WALL_LAYERS: u32 = 2;
    pub const BRICK_SIZE: Vec3 = Vec3::new(2.0, 1.0, 1.0);
    pub const BRICK_MASS: f32 = 10.0;
    /// Brick collisions at or above this force blow the brick out
    pub const BRICK_IMPACT_THRESHOLD: f32 = 1000.0;
    /// Debris falls this long before it is removed (seconds)
    pub const BRICK_DESTROY_DELAY_SECS: f32 = 5.0;
    /// Horizontal explosion impulse range (±half)
    pub const BRICK_KICK_HORIZONTAL: f32 = 100.0;
    /// Upward explosion impulse range
    pub const BRICK_KICK_VERTICAL: f32 = 50.0;

    /// Ring particle layout
    pub const RING_BAND_GAP: f32 = 0.05;
    pub const RING_VERTICAL_JITTER: f32 = 0.1;
    pub const RING_HIGHLIGHT_STRIDE: usize = 1000;
    pub const RING_ICE_FRACTION: f32 = 0.7;
    /// Indices per highlight cluster, slot included
    pub const RING_CLUSTER_SIZE: usize = 50;
    /// Full angular spread of a cluster around its slot (radians)
    pub const RING_CLUSTER_ANGLE_SPREAD: f32 = 0.1;
    /// Full radial spread of a cluster around its slot
    pub const RING_CLUSTER_RADIUS_SPREAD: f32 = 0.2;
}

/// Convert seconds to whole simulation ticks (rounded up, at least one)
#[inline]
pub fn secs_to_ticks(secs: f32) -> u64 {
    ((secs / consts::SIM_DT).ceil() as u64).max(1)
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Point on the ground plane at polar (r, theta), lifted to `height`
///
/// Uses the scene convention `(cos θ · r, h, sin θ · r)`.
#[inline]
pub fn polar_to_xz(r: f32, theta: f32, height: f32) -> Vec3 {
    Vec3::new(r * theta.cos(), height, r * theta.sin())
}

/// Project a point onto the ground plane (y = 0)
#[inline]
pub fn ground_projection(pos: Vec3) -> Vec3 {
    Vec3::new(pos.x, 0.0, pos.z)
}
