//! Deterministic simulation module
//!
//! All scene logic lives here. Rules for this module:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by brick / particle index)
//! - Rigid bodies only through the `PhysicsWorld` trait
//! - No rendering or platform dependencies

pub mod crane;
pub mod dust;
pub mod physics;
pub mod ring;
pub mod saturn;
pub mod scene;
pub mod tether;
pub mod wall;

pub use crane::{CraneConfig, CraneController};
pub use dust::{DustConfig, DustField};
pub use physics::{
    BodyDesc, BodyHandle, BodyKind, ColliderShape, CollisionEvent, HeadlessWorld, JointHandle,
    PhysicsWorld,
};
pub use ring::{Category, Palette, RingLayout, RingParams};
pub use saturn::{DEVELOPER_TOOLS, DeveloperTool, RingConfig, RingSystem, ToolCategory, default_rings};
pub use scene::{ConstructionScene, FrameInput, ImpactListener, SceneEvent};
pub use tether::{CableTransform, SwingingTether, TetherConfig, TetherPhase};
pub use wall::{BrickId, BrickRender, BrickState, DebrisElement, DebrisField, WallConfig, WallLayout};
