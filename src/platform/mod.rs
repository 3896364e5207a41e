//! Platform abstraction layer
//!
//! The simulation cores are platform independent; this layer only exposes
//! them to the browser renderer:
//! - Logger and panic hook setup
//! - Handle types wrapping the scene, ring system and dust field
//! - Flat `Float32Array` buffers for GPU upload

#[cfg(target_arch = "wasm32")]
pub mod web;
