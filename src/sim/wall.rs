//! Destructible brick wall
//!
//! Bricks are laid out in a running-bond grid (`layers × rows × columns`,
//! odd rows shifted by half a brick). A hard enough hit kicks the brick out
//! with a random impulse and schedules its removal a fixed number of ticks
//! later, so the debris is seen falling before it disappears.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::physics::{BodyDesc, BodyHandle, ColliderShape, CollisionEvent, PhysicsWorld};
use crate::consts::*;
use crate::error::{ConfigError, SceneError};
use crate::secs_to_ticks;

/// Brick identity: `brick-{layer}-{row}-{column}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrickId {
    pub layer: u32,
    pub row: u32,
    pub column: u32,
}

impl BrickId {
    pub fn new(layer: u32, row: u32, column: u32) -> Self {
        Self { layer, row, column }
    }

    /// Parse the `brick-L-R-C` form
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.strip_prefix("brick-")?.split('-');
        let layer = parts.next()?.parse().ok()?;
        let row = parts.next()?.parse().ok()?;
        let column = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(layer, row, column))
    }
}

impl fmt::Display for BrickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "brick-{}-{}-{}", self.layer, self.row, self.column)
    }
}

/// Grid dimensions and brick size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallLayout {
    pub rows: u32,
    pub columns: u32,
    pub layers: u32,
    /// Width (x), height (y), depth (z)
    pub brick_size: Vec3,
}

impl Default for WallLayout {
    fn default() -> Self {
        Self {
            rows: WALL_ROWS,
            columns: WALL_COLUMNS,
            layers: WALL_LAYERS,
            brick_size: BRICK_SIZE,
        }
    }
}

impl WallLayout {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.columns == 0 || self.layers == 0 {
            return Err(ConfigError::InvalidWall(format!(
                "{} rows x {} columns x {} layers",
                self.rows, self.columns, self.layers
            )));
        }
        if !self.brick_size.is_finite() || self.brick_size.min_element() <= 0.0 {
            return Err(ConfigError::InvalidWall(format!(
                "brick size {:?}",
                self.brick_size
            )));
        }
        Ok(())
    }

    pub fn brick_count(&self) -> usize {
        self.rows as usize * self.columns as usize * self.layers as usize
    }

    /// Rest position of a brick centre
    ///
    /// Centred on `origin` in x and z; the bottom row sits on `origin.y`.
    pub fn rest_position(&self, id: BrickId, origin: Vec3) -> Vec3 {
        let size = self.brick_size;
        let bond_offset = if id.row % 2 == 0 { 0.0 } else { size.x / 2.0 };
        Vec3::new(
            origin.x + (id.column as f32 + 0.5) * size.x + bond_offset
                - self.columns as f32 * size.x / 2.0,
            origin.y + id.row as f32 * size.y + size.y / 2.0,
            origin.z + (id.layer as f32 + 0.5) * size.z - self.layers as f32 * size.z / 2.0,
        )
    }

    /// Every brick in layer, row, column order
    pub fn generate(&self, origin: Vec3) -> Vec<(BrickId, Vec3)> {
        let mut bricks = Vec::with_capacity(self.brick_count());
        for layer in 0..self.layers {
            for row in 0..self.rows {
                for column in 0..self.columns {
                    let id = BrickId::new(layer, row, column);
                    bricks.push((id, self.rest_position(id, origin)));
                }
            }
        }
        bricks
    }
}

/// Everything tunable about the wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    pub layout: WallLayout,
    pub brick_mass: f32,
    pub restitution: f32,
    pub friction: f32,
    /// Hits at or above this force blow a brick out
    pub impact_threshold: f32,
    /// Seconds between the kick and removal
    pub destroy_delay_secs: f32,
    /// Horizontal kick spans ±half this value
    pub kick_horizontal: f32,
    /// Upward kick spans [0, this value)
    pub kick_vertical: f32,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            layout: WallLayout::default(),
            brick_mass: BRICK_MASS,
            restitution: 0.4,
            friction: 0.8,
            impact_threshold: BRICK_IMPACT_THRESHOLD,
            destroy_delay_secs: BRICK_DESTROY_DELAY_SECS,
            kick_horizontal: BRICK_KICK_HORIZONTAL,
            kick_vertical: BRICK_KICK_VERTICAL,
        }
    }
}

impl WallConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        ConfigError::check_positive("wall.brick_mass", self.brick_mass)?;
        ConfigError::check_non_negative("wall.restitution", self.restitution)?;
        ConfigError::check_non_negative("wall.friction", self.friction)?;
        ConfigError::check_non_negative("wall.impact_threshold", self.impact_threshold)?;
        ConfigError::check_non_negative("wall.destroy_delay_secs", self.destroy_delay_secs)?;
        ConfigError::check_non_negative("wall.kick_horizontal", self.kick_horizontal)?;
        ConfigError::check_non_negative("wall.kick_vertical", self.kick_vertical)
    }
}

/// Brick base colours: saddle brown, sienna, rosy brown, peru
const BRICK_COLORS: [Vec3; 4] = [
    Vec3::new(0.54, 0.27, 0.07),
    Vec3::new(0.63, 0.32, 0.18),
    Vec3::new(0.74, 0.56, 0.56),
    Vec3::new(0.80, 0.52, 0.25),
];

/// Lightness jitter applied to brick colours (±half)
const BRICK_LIGHTNESS_JITTER: f32 = 0.1;

fn brick_color<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let base = BRICK_COLORS[rng.random_range(0..BRICK_COLORS.len())];
    let hsl = rgb_to_hsl(base);
    let lightness = hsl.z + (rng.random::<f32>() - 0.5) * BRICK_LIGHTNESS_JITTER;
    hsl_to_rgb(Vec3::new(hsl.x, hsl.y, lightness.clamp(0.0, 1.0)))
}

/// RGB in [0, 1] to (hue, saturation, lightness), hue in [0, 1)
fn rgb_to_hsl(rgb: Vec3) -> Vec3 {
    let max = rgb.max_element();
    let min = rgb.min_element();
    let l = (max + min) / 2.0;
    let d = max - min;
    if d <= f32::EPSILON {
        return Vec3::new(0.0, 0.0, l);
    }
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == rgb.x {
        (rgb.y - rgb.z) / d + if rgb.y < rgb.z { 6.0 } else { 0.0 }
    } else if max == rgb.y {
        (rgb.z - rgb.x) / d + 2.0
    } else {
        (rgb.x - rgb.y) / d + 4.0
    };
    Vec3::new(h / 6.0, s, l)
}

fn hsl_to_rgb(hsl: Vec3) -> Vec3 {
    let (h, s, l) = (hsl.x, hsl.y, hsl.z);
    if s <= 0.0 {
        return Vec3::splat(l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    Vec3::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

/// Lifecycle of a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrickState {
    /// Part of the wall, ordinary rigid body
    Intact,
    /// Kicked out, removed once the tick counter reaches `destroy_at_tick`
    Falling { destroy_at_tick: u64 },
    /// Gone for good
    Destroyed,
}

/// One brick
#[derive(Debug, Clone)]
pub struct DebrisElement {
    pub id: BrickId,
    pub rest_position: Vec3,
    pub rest_rotation: Vec3,
    pub color: Vec3,
    body: Option<BodyHandle>,
    state: BrickState,
}

impl DebrisElement {
    pub fn state(&self) -> BrickState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == BrickState::Destroyed
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }
}

/// What the renderer needs for one brick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrickRender {
    pub id: BrickId,
    pub position: Vec3,
    pub rotation: Vec3,
    pub color: Vec3,
    pub visible: bool,
}

/// The wall and its pending demolitions
#[derive(Debug, Clone)]
pub struct DebrisField {
    config: WallConfig,
    origin: Vec3,
    elements: Vec<DebrisElement>,
    by_body: HashMap<BodyHandle, usize>,
    tick: u64,
    destroy_delay_ticks: u64,
    destroyed: usize,
}

impl DebrisField {
    /// Build the wall around `origin`, one sleeping body per brick
    pub fn new<W: PhysicsWorld + ?Sized, R: Rng + ?Sized>(
        world: &mut W,
        origin: Vec3,
        config: WallConfig,
        rng: &mut R,
    ) -> Result<Self, SceneError> {
        config.validate()?;

        let half_extents = config.layout.brick_size / 2.0;
        let bricks = config.layout.generate(origin);
        let mut elements = Vec::with_capacity(bricks.len());
        let mut by_body = HashMap::with_capacity(bricks.len());

        for (id, position) in bricks {
            let created = world.create_body(
                &BodyDesc::dynamic(position)
                    .with_mass(config.brick_mass)
                    .with_material(config.restitution, config.friction)
                    .with_collider(ColliderShape::Cuboid { half_extents })
                    .asleep(),
            );
            let body = match created {
                Ok(body) => body,
                Err(e) => {
                    // Leave the world as we found it
                    for body in elements.iter().filter_map(DebrisElement::body) {
                        world.remove_body(body);
                    }
                    log::warn!("Wall construction failed after {} bricks: {}", elements.len(), e);
                    return Err(e.into());
                }
            };
            by_body.insert(body, elements.len());
            elements.push(DebrisElement {
                id,
                rest_position: position,
                rest_rotation: Vec3::ZERO,
                color: brick_color(rng),
                body: Some(body),
                state: BrickState::Intact,
            });
        }

        log::info!(
            "Wall built at {:?}: {} bricks ({}x{}x{})",
            origin,
            elements.len(),
            config.layout.layers,
            config.layout.rows,
            config.layout.columns
        );

        let destroy_delay_ticks = secs_to_ticks(config.destroy_delay_secs);
        Ok(Self {
            config,
            origin,
            elements,
            by_body,
            tick: 0,
            destroy_delay_ticks,
            destroyed: 0,
        })
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn config(&self) -> &WallConfig {
        &self.config
    }

    /// Ticks elapsed since construction
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn destroy_delay_ticks(&self) -> u64 {
        self.destroy_delay_ticks
    }

    pub fn elements(&self) -> &[DebrisElement] {
        &self.elements
    }

    pub fn element(&self, id: BrickId) -> Option<&DebrisElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_by_body(&self, body: BodyHandle) -> Option<&DebrisElement> {
        self.by_body.get(&body).map(|&i| &self.elements[i])
    }

    /// Bricks still drawn and simulated
    pub fn rendered(&self) -> impl Iterator<Item = &DebrisElement> {
        self.elements.iter().filter(|e| !e.is_destroyed())
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    /// Bricks kicked out and waiting for removal
    pub fn falling_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e.state, BrickState::Falling { .. }))
            .count()
    }

    /// React to a collision on one of the wall's bodies
    ///
    /// Returns the impulse applied when the hit blows the brick out. Weak
    /// hits, foreign bodies and bricks already falling or gone are ignored.
    pub fn handle_collision<W: PhysicsWorld + ?Sized, R: Rng + ?Sized>(
        &mut self,
        world: &mut W,
        event: &CollisionEvent,
        rng: &mut R,
    ) -> Option<Vec3> {
        let &index = self.by_body.get(&event.body)?;
        if event.total_force_magnitude < self.config.impact_threshold {
            return None;
        }

        let element = &mut self.elements[index];
        if element.state != BrickState::Intact {
            log::debug!("{} hit again while {:?}", element.id, element.state);
            return None;
        }
        let body = element.body?;

        let impulse = Vec3::new(
            (rng.random::<f32>() - 0.5) * self.config.kick_horizontal,
            rng.random::<f32>() * self.config.kick_vertical,
            (rng.random::<f32>() - 0.5) * self.config.kick_horizontal,
        );
        world.apply_impulse(body, impulse);

        let destroy_at_tick = self.tick + self.destroy_delay_ticks;
        element.state = BrickState::Falling { destroy_at_tick };
        log::debug!(
            "{} blown out (force {:.0}), removal at tick {}",
            element.id,
            event.total_force_magnitude,
            destroy_at_tick
        );
        Some(impulse)
    }

    /// Advance the tick counter and remove bricks whose delay has run out
    ///
    /// Returns the bricks destroyed on this tick.
    pub fn step<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Vec<BrickId> {
        self.tick += 1;
        let mut removed = Vec::new();

        for element in &mut self.elements {
            let BrickState::Falling { destroy_at_tick } = element.state else {
                continue;
            };
            if destroy_at_tick > self.tick {
                continue;
            }
            element.state = BrickState::Destroyed;
            if let Some(body) = element.body.take() {
                world.remove_body(body);
                self.by_body.remove(&body);
            }
            self.destroyed += 1;
            removed.push(element.id);
        }

        if !removed.is_empty() {
            log::info!(
                "Removed {} bricks ({}/{} destroyed)",
                removed.len(),
                self.destroyed,
                self.elements.len()
            );
        }
        removed
    }

    /// Render snapshot, reading live positions from the engine
    pub fn snapshot<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Vec<BrickRender> {
        self.elements
            .iter()
            .map(|e| BrickRender {
                id: e.id,
                position: e
                    .body
                    .and_then(|b| world.translation(b))
                    .unwrap_or(e.rest_position),
                rotation: e.rest_rotation,
                color: e.color,
                visible: !e.is_destroyed(),
            })
            .collect()
    }
}
