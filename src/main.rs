//! Hero Sim entry point
//!
//! The browser build is driven from JS through `platform::web`. Natively this
//! runs the construction scene headless: swing the crane toward the wall,
//! drop the ball, and report what came down.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use hero_sim::Settings;
    use hero_sim::consts::*;
    use hero_sim::sim::{ConstructionScene, FrameInput, RingSystem, SceneEvent};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    env_logger::init();
    log::info!("Hero Sim (native, headless) starting...");

    let mut settings = match std::env::args().nth(1) {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Failed to load settings from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    let seed = *settings.seed.get_or_insert(42);

    let mut scene = match ConstructionScene::headless(&settings) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Failed to build scene: {}", e);
            std::process::exit(1);
        }
    };
    let impacts = std::rc::Rc::new(std::cell::Cell::new(0u32));
    let counter = impacts.clone();
    scene.set_impact_listener(move |_| counter.set(counter.get() + 1));

    // Aim the jib at the wall, let the swing build, then drop
    let aim = 0.48;
    let frame_dt = 1.0 / 60.0;
    let mut input = FrameInput::default();
    for frame in 0..(14.0 / frame_dt) as u32 {
        let t = frame as f32 * frame_dt;
        input.pointer_x = (t < 4.0).then(|| aim * (t / 2.0).min(1.0));
        input.release = frame == (4.0 / frame_dt) as u32;
        scene.advance(&input, frame_dt);

        for event in scene.drain_events() {
            match event {
                SceneEvent::Released => log::info!("t={:.2}s released", t),
                SceneEvent::Impact(p) => log::info!("t={:.2}s impact at ({:.1}, {:.1})", t, p.x, p.z),
                SceneEvent::BrickBlasted(id) => log::debug!("t={:.2}s {} blasted", t, id),
                SceneEvent::BrickDestroyed(id) => log::debug!("t={:.2}s {} removed", t, id),
            }
        }
    }

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut rings = match RingSystem::new(&settings.rings, settings.quality.ring_scale(), &mut rng) {
        Ok(rings) => rings,
        Err(e) => {
            eprintln!("Failed to lay out rings: {}", e);
            std::process::exit(1);
        }
    };
    rings.step(SIM_DT);

    println!("\nSeed {} ({} quality)", seed, settings.quality.as_str());
    println!("  ticks:            {}", scene.tick_count());
    println!("  ball impacts:     {}", impacts.get());
    println!(
        "  bricks destroyed: {}/{}",
        scene.wall().destroyed_count(),
        scene.wall().elements().len()
    );
    println!("  bricks falling:   {}", scene.wall().falling_count());
    println!("  dust active:      {}", scene.is_dust_active());
    println!(
        "  ring particles:   {} in {} rings",
        rings.particle_count(),
        rings.rings().len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
