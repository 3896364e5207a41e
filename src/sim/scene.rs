//! Construction scene loop
//!
//! Wires the crane, wrecking ball, brick wall and dust together. Each tick
//! runs in a fixed order: input sampling, physics step (which raises the
//! collision events), component reactions, then the buffers are ready to be
//! read by the renderer.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::crane::CraneController;
use super::dust::DustField;
use super::physics::{CollisionEvent, HeadlessWorld, PhysicsWorld};
use super::tether::{CableTransform, SwingingTether};
use super::wall::{BrickId, BrickRender, DebrisField};
use crate::consts::*;
use crate::error::SceneError;
use crate::secs_to_ticks;
use crate::settings::Settings;

/// Input sampled once per tick
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Pointer x normalized to [-1, 1]
    pub pointer_x: Option<f32>,
    /// Release the ball (click/space)
    pub release: bool,
}

/// Something worth telling the shell about
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SceneEvent {
    Released,
    /// Ball hit hard enough to raise dust, at this ground point
    Impact(Vec3),
    BrickBlasted(BrickId),
    BrickDestroyed(BrickId),
}

/// Receives ground-projected impact points
pub trait ImpactListener {
    fn on_impact(&mut self, point: Vec3);
}

impl<F: FnMut(Vec3)> ImpactListener for F {
    fn on_impact(&mut self, point: Vec3) {
        self(point)
    }
}

/// The wrecking ball scene
pub struct ConstructionScene<W: PhysicsWorld = HeadlessWorld> {
    world: W,
    crane: CraneController,
    tether: SwingingTether,
    wall: DebrisField,
    dust: DustField,
    rng: Pcg32,
    seed: u64,
    tick: u64,
    accumulator: f32,
    /// Ticks of dust stepping left (0 = inactive)
    dust_ticks_left: u64,
    dust_active_ticks: u64,
    impact_cooldown_ticks: u64,
    last_impact_tick: Option<u64>,
    collisions: Vec<CollisionEvent>,
    events: Vec<SceneEvent>,
    listener: Option<Box<dyn ImpactListener>>,
}

impl ConstructionScene<HeadlessWorld> {
    /// Scene on the built-in headless physics backend
    pub fn headless(settings: &Settings) -> Result<Self, SceneError> {
        Self::new(HeadlessWorld::new(), settings)
    }
}

impl<W: PhysicsWorld> ConstructionScene<W> {
    /// Build every component inside `world`
    pub fn new(mut world: W, settings: &Settings) -> Result<Self, SceneError> {
        settings.validate()?;

        let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = Pcg32::seed_from_u64(seed);

        let tether = SwingingTether::new(&mut world, settings.tether.clone())?;
        let wall = DebrisField::new(&mut world, WALL_ORIGIN, settings.wall.clone(), &mut rng)?;
        let dust_config = settings.effective_dust();
        let dust = DustField::new(&dust_config, &mut rng);

        log::info!(
            "Construction scene ready (seed {}, {} quality, {} dust particles)",
            seed,
            settings.quality.as_str(),
            dust.len()
        );

        Ok(Self {
            world,
            crane: CraneController::new(settings.crane.clone()),
            tether,
            wall,
            dust,
            rng,
            seed,
            tick: 0,
            accumulator: 0.0,
            dust_ticks_left: 0,
            dust_active_ticks: secs_to_ticks(dust_config.active_secs),
            impact_cooldown_ticks: secs_to_ticks(IMPACT_COOLDOWN_SECS),
            last_impact_tick: None,
            collisions: Vec::new(),
            events: Vec::new(),
            listener: None,
        })
    }

    /// Called with every accepted ball impact
    pub fn set_impact_listener(&mut self, listener: impl ImpactListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Release the ball and freeze the crane (no-op after the first call)
    pub fn release(&mut self) {
        if self.tether.release() {
            self.crane.freeze();
            self.events.push(SceneEvent::Released);
        }
    }

    /// Run as many fixed ticks as `frame_dt` covers
    ///
    /// One-shot input (release) is consumed by the first tick. Returns the
    /// number of ticks run.
    pub fn advance(&mut self, input: &FrameInput, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut input = input.clone();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.tick(&input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
            input.release = false;
        }
        substeps
    }

    /// Advance the scene by one tick of `dt`
    pub fn tick(&mut self, input: &FrameInput, dt: f32) {
        // Input
        if input.release {
            self.release();
        }
        let rotation = self.crane.update(input.pointer_x, dt);
        self.tether.drive(&mut self.world, rotation);

        // Physics
        let mut collisions = std::mem::take(&mut self.collisions);
        self.world.step(dt, &mut collisions);

        // Reactions
        self.tether.update_cable(&self.world);
        for event in collisions.drain(..) {
            if let Some(point) = self.tether.impact_point(&self.world, &event) {
                self.on_ball_impact(point);
            }
            if self
                .wall
                .handle_collision(&mut self.world, &event, &mut self.rng)
                .is_some()
            {
                if let Some(brick) = self.wall.element_by_body(event.body) {
                    self.events.push(SceneEvent::BrickBlasted(brick.id));
                }
            }
        }
        self.collisions = collisions;

        for id in self.wall.step(&mut self.world) {
            self.events.push(SceneEvent::BrickDestroyed(id));
        }

        if self.dust_ticks_left > 0 {
            self.dust.step(dt);
            self.dust_ticks_left -= 1;
        }

        self.tick += 1;
    }

    fn on_ball_impact(&mut self, point: Vec3) {
        if let Some(last) = self.last_impact_tick {
            if self.tick - last < self.impact_cooldown_ticks {
                return;
            }
        }
        self.last_impact_tick = Some(self.tick);

        log::info!("Impact at ({:.2}, {:.2}), raising dust", point.x, point.z);
        self.dust.emit(point, &mut self.rng);
        self.dust_ticks_left = self.dust_active_ticks;
        self.events.push(SceneEvent::Impact(point));
        if let Some(listener) = self.listener.as_mut() {
            listener.on_impact(point);
        }
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_released(&self) -> bool {
        self.tether.is_released()
    }

    pub fn is_dust_active(&self) -> bool {
        self.dust_ticks_left > 0
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn crane(&self) -> &CraneController {
        &self.crane
    }

    pub fn tether(&self) -> &SwingingTether {
        &self.tether
    }

    pub fn wall(&self) -> &DebrisField {
        &self.wall
    }

    pub fn dust(&self) -> &DustField {
        &self.dust
    }

    pub fn ball_position(&self) -> Option<Vec3> {
        self.tether.ball_position(&self.world)
    }

    pub fn anchor_position(&self) -> Vec3 {
        self.tether.anchor_position()
    }

    pub fn cable(&self) -> CableTransform {
        self.tether.cable()
    }

    /// Brick transforms and visibility for the renderer
    pub fn bricks(&self) -> Vec<BrickRender> {
        self.wall.snapshot(&self.world)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::physics::BodyHandle;

    fn scene() -> ConstructionScene {
        let settings = Settings {
            seed: Some(1234),
            ..Default::default()
        };
        ConstructionScene::headless(&settings).unwrap()
    }

    fn collide(scene: &mut ConstructionScene, body: BodyHandle, force: f32) {
        scene.world_mut().queue_collision(CollisionEvent {
            body,
            other: None,
            total_force_magnitude: force,
        });
    }

    #[test]
    fn test_brick_hit_end_to_end() {
        let mut scene = scene();
        assert_eq!(scene.wall().origin(), Vec3::new(13.0, 0.0, -9.0));
        assert_eq!(scene.wall().elements().len(), 120);

        let id = BrickId::parse("brick-0-0-0").unwrap();
        let body = scene.wall().element(id).unwrap().body().unwrap();
        collide(&mut scene, body, 1500.0);

        scene.tick(&FrameInput::default(), SIM_DT);
        assert!(scene.drain_events().contains(&SceneEvent::BrickBlasted(id)));
        assert!(!scene.world().is_sleeping(body));

        for _ in 0..secs_to_ticks(BRICK_DESTROY_DELAY_SECS) {
            scene.tick(&FrameInput::default(), SIM_DT);
        }
        assert!(scene.wall().element(id).unwrap().is_destroyed());
        assert!(scene.wall().rendered().all(|e| e.id != id));
        assert!(scene.drain_events().contains(&SceneEvent::BrickDestroyed(id)));
        assert!(!scene.bricks().iter().any(|b| b.id == id && b.visible));
    }

    #[test]
    fn test_ball_impact_raises_dust_and_notifies() {
        let mut scene = scene();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        scene.set_impact_listener(move |p: Vec3| sink.borrow_mut().push(p));

        let ball = scene.tether().ball_handle();
        collide(&mut scene, ball, 800.0);
        scene.tick(&FrameInput::default(), SIM_DT);

        assert!(scene.is_dust_active());
        let points = seen.borrow().clone();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].y, 0.0);

        // Particles were thrown out of the impact point
        let origin = points[0];
        let near = scene
            .dust()
            .positions()
            .iter()
            .filter(|p| Vec3::new(p.x - origin.x, 0.0, p.z - origin.z).length() < 3.0)
            .count();
        assert_eq!(near, scene.dust().len());
    }

    #[test]
    fn test_weak_ball_contact_is_ignored() {
        let mut scene = scene();
        let ball = scene.tether().ball_handle();
        collide(&mut scene, ball, 500.0);
        scene.tick(&FrameInput::default(), SIM_DT);
        assert!(!scene.is_dust_active());
    }

    #[test]
    fn test_repeated_impacts_are_debounced() {
        let mut scene = scene();
        let ball = scene.tether().ball_handle();

        for _ in 0..5 {
            collide(&mut scene, ball, 2000.0);
            scene.tick(&FrameInput::default(), SIM_DT);
        }
        let impacts = scene
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SceneEvent::Impact(_)))
            .count();
        assert_eq!(impacts, 1);

        for _ in 0..secs_to_ticks(IMPACT_COOLDOWN_SECS) {
            scene.tick(&FrameInput::default(), SIM_DT);
        }
        collide(&mut scene, ball, 2000.0);
        scene.tick(&FrameInput::default(), SIM_DT);
        assert!(scene
            .drain_events()
            .iter()
            .any(|e| matches!(e, SceneEvent::Impact(_))));
    }

    #[test]
    fn test_dust_stops_after_active_window() {
        let mut scene = scene();
        let ball = scene.tether().ball_handle();
        collide(&mut scene, ball, 900.0);
        scene.tick(&FrameInput::default(), SIM_DT);

        for _ in 0..secs_to_ticks(DUST_ACTIVE_SECS) {
            scene.tick(&FrameInput::default(), SIM_DT);
        }
        assert!(!scene.is_dust_active());

        let frozen = scene.dust().positions().to_vec();
        scene.tick(&FrameInput::default(), SIM_DT);
        assert_eq!(scene.dust().positions(), frozen.as_slice());
    }

    #[test]
    fn test_release_freezes_crane_and_anchor() {
        let mut scene = scene();
        let steer = FrameInput {
            pointer_x: Some(1.0),
            ..Default::default()
        };
        for _ in 0..30 {
            scene.tick(&steer, SIM_DT);
        }
        let writes = scene.tether().anchor_writes();
        assert_eq!(writes, 30);

        let release = FrameInput {
            pointer_x: Some(-1.0),
            release: true,
        };
        scene.tick(&release, SIM_DT);
        scene.tick(&release, SIM_DT);
        scene.release();
        assert!(scene.is_released());
        assert_eq!(scene.tether().anchor_writes(), writes);

        let anchor = scene.anchor_position();
        let rotation = scene.crane().rotation();
        for _ in 0..60 {
            scene.tick(&steer, SIM_DT);
        }
        assert_eq!(scene.anchor_position(), anchor);
        assert_eq!(scene.crane().rotation(), rotation);

        let released = scene
            .drain_events()
            .iter()
            .filter(|e| **e == SceneEvent::Released)
            .count();
        assert_eq!(released, 1);
    }

    #[test]
    fn test_drain_empties_the_event_queue() {
        let mut scene = scene();
        let ball = scene.tether().ball_handle();
        collide(&mut scene, ball, 800.0);
        scene.advance(&FrameInput { pointer_x: None, release: true }, SIM_DT);

        let events = scene.drain_events();
        assert_eq!(events.len(), 2);
        assert!(scene.drain_events().is_empty());

        let json = serde_json::to_string(&events).unwrap();
        assert!(json.contains(r#""kind":"released""#));
        assert!(json.contains(r#""kind":"impact""#));
    }

    #[test]
    fn test_advance_runs_fixed_substeps() {
        let mut scene = scene();
        let input = FrameInput {
            release: true,
            ..Default::default()
        };
        assert_eq!(scene.advance(&input, 3.0 * SIM_DT + 0.001), 3);
        assert_eq!(scene.tick_count(), 3);
        assert!(scene.is_released());

        // Oversized frames are clamped
        assert_eq!(scene.advance(&FrameInput::default(), 5.0), 6);
    }

    #[test]
    fn test_same_seed_same_scene() {
        let mut a = scene();
        let mut b = scene();
        let inputs = [
            FrameInput { pointer_x: Some(0.4), release: false },
            FrameInput { pointer_x: Some(0.9), release: false },
            FrameInput { pointer_x: None, release: true },
        ];
        for input in inputs.iter().cycle().take(90) {
            a.tick(input, SIM_DT);
            b.tick(input, SIM_DT);
        }
        let ball_a = a.tether().ball_handle();
        let ball_b = b.tether().ball_handle();
        collide(&mut a, ball_a, 1000.0);
        collide(&mut b, ball_b, 1000.0);
        a.tick(&FrameInput::default(), SIM_DT);
        b.tick(&FrameInput::default(), SIM_DT);

        assert_eq!(a.ball_position(), b.ball_position());
        assert_eq!(a.dust().positions(), b.dust().positions());
        assert_eq!(a.cable(), b.cable());
    }
}
