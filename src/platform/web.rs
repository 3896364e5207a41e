//! Browser bindings
//!
//! The page owns the renderer and the animation frame loop; it calls into
//! these handles once per frame and uploads the returned buffers.

use js_sys::{Float32Array, Function};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::prelude::*;

use crate::settings::Settings;
use crate::sim::{ConstructionScene, FrameInput, RingSystem, SceneEvent};

/// Floats per brick in `HeroScene::brick_buffer`: position, euler rotation, color, visible
pub const BRICK_STRIDE: usize = 10;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Already initialized on hot reload
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("hero-sim {} loaded", env!("CARGO_PKG_VERSION"));
}

fn settings_from(json: Option<String>) -> Result<Settings, JsError> {
    match json {
        Some(json) => Ok(Settings::from_json(&json)?),
        None => Ok(Settings::default()),
    }
}

/// Wrecking ball scene handle
#[wasm_bindgen]
pub struct HeroScene {
    scene: ConstructionScene,
    input: FrameInput,
    /// Events raised during the last `frame` call
    frame_events: Vec<SceneEvent>,
}

#[wasm_bindgen]
impl HeroScene {
    /// Build the scene from optional settings JSON
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<HeroScene, JsError> {
        let settings = settings_from(settings_json)?;
        let scene = ConstructionScene::headless(&settings)?;
        Ok(Self {
            scene,
            input: FrameInput::default(),
            frame_events: Vec::new(),
        })
    }

    /// Pointer x normalized to [-1, 1]
    pub fn set_pointer(&mut self, x: f32) {
        self.input.pointer_x = Some(x);
    }

    pub fn release(&mut self) {
        self.input.release = true;
    }

    /// Called as `callback(x, y, z)` for every accepted ball impact
    pub fn set_impact_callback(&mut self, callback: Function) {
        self.scene.set_impact_listener(move |p: glam::Vec3| {
            if let Err(e) = callback.call3(&JsValue::NULL, &p.x.into(), &p.y.into(), &p.z.into()) {
                log::warn!("Impact callback threw: {:?}", e);
            }
        });
    }

    /// Advance by one animation frame; returns the ticks run
    pub fn frame(&mut self, dt: f32) -> u32 {
        let ticks = self.scene.advance(&self.input, dt);
        if ticks > 0 {
            self.input.release = false;
        }
        self.frame_events = self.scene.drain_events();
        ticks
    }

    /// Events from the last frame as a JSON array of `{kind, data}`
    pub fn frame_events(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.frame_events)?)
    }

    pub fn is_released(&self) -> bool {
        self.scene.is_released()
    }

    pub fn dust_active(&self) -> bool {
        self.scene.is_dust_active()
    }

    pub fn bricks_destroyed(&self) -> usize {
        self.scene.wall().destroyed_count()
    }

    /// [x, y, z] of the anchor
    pub fn anchor_position(&self) -> Float32Array {
        Float32Array::from(self.scene.anchor_position().to_array().as_slice())
    }

    /// [x, y, z] of the ball (empty if the engine lost it)
    pub fn ball_position(&self) -> Float32Array {
        match self.scene.ball_position() {
            Some(p) => Float32Array::from(p.to_array().as_slice()),
            None => Float32Array::new_with_length(0),
        }
    }

    /// [px, py, pz, qx, qy, qz, qw, length_scale]
    pub fn cable(&self) -> Float32Array {
        let cable = self.scene.cable();
        let mut out = [0.0; 8];
        out[..3].copy_from_slice(&cable.position.to_array());
        out[3..7].copy_from_slice(&cable.rotation.to_array());
        out[7] = cable.length_scale;
        Float32Array::from(out.as_slice())
    }

    /// `BRICK_STRIDE` floats per brick, in wall order
    pub fn brick_buffer(&self) -> Float32Array {
        let bricks = self.scene.bricks();
        let mut out = Vec::with_capacity(bricks.len() * BRICK_STRIDE);
        for brick in &bricks {
            out.extend_from_slice(&brick.position.to_array());
            out.extend_from_slice(&brick.rotation.to_array());
            out.extend_from_slice(&brick.color.to_array());
            out.push(if brick.visible { 1.0 } else { 0.0 });
        }
        Float32Array::from(out.as_slice())
    }

    pub fn dust_positions(&self) -> Float32Array {
        Float32Array::from(self.scene.dust().flat_positions())
    }

    pub fn dust_colors(&self) -> Float32Array {
        Float32Array::from(self.scene.dust().flat_colors())
    }
}

/// Saturn ring system handle
#[wasm_bindgen]
pub struct SaturnRings {
    system: RingSystem,
}

#[wasm_bindgen]
impl SaturnRings {
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<SaturnRings, JsError> {
        let settings = settings_from(settings_json)?;
        let mut rng = match settings.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };
        let system = RingSystem::new(&settings.rings, settings.quality.ring_scale(), &mut rng)?;
        Ok(Self { system })
    }

    pub fn ring_count(&self) -> usize {
        self.system.rings().len()
    }

    pub fn particle_count(&self) -> usize {
        self.system.particle_count()
    }

    pub fn step(&mut self, dt: f32) {
        self.system.step(dt);
    }

    pub fn positions(&self, ring: usize) -> Option<Float32Array> {
        let ring = self.system.rings().get(ring)?;
        Some(Float32Array::from(ring.layout.flat_positions()))
    }

    pub fn colors(&self, ring: usize) -> Option<Float32Array> {
        let ring = self.system.rings().get(ring)?;
        Some(Float32Array::from(ring.layout.flat_colors()))
    }

    pub fn sizes(&self, ring: usize) -> Option<Float32Array> {
        let ring = self.system.rings().get(ring)?;
        Some(Float32Array::from(ring.layout.sizes.as_slice()))
    }

    /// Spin angle about +Y (radians)
    pub fn rotation(&self, ring: usize) -> Option<f32> {
        self.system.rings().get(ring).map(|r| r.rotation)
    }

    pub fn opacity(&self, ring: usize) -> Option<f32> {
        self.system.rings().get(ring).map(|r| r.config.opacity)
    }
}
