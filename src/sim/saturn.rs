//! Saturn ring system
//!
//! Three concentric particle rings, each laid out once with the banded ring
//! generator and then spun about +Y every frame. Highlight particles in each
//! ring take the colours of the developer tools assigned to it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ring::{self, Category, RingLayout, RingParams};
use crate::consts::*;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Language,
    Frontend,
    Backend,
    Cloud,
    Tool,
    Database,
}

/// A featured tool shown in one of the rings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperTool {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ToolCategory,
    /// `#RRGGBB`
    pub color: &'static str,
    pub ring_index: usize,
}

const fn tool(
    id: &'static str,
    name: &'static str,
    category: ToolCategory,
    color: &'static str,
    ring_index: usize,
) -> DeveloperTool {
    DeveloperTool {
        id,
        name,
        category,
        color,
        ring_index,
    }
}

use ToolCategory::*;

/// Tools by ring: languages inside, frameworks in the middle, cloud and data outside
pub const DEVELOPER_TOOLS: &[DeveloperTool] = &[
    tool("javascript", "JavaScript", Language, "#F7DF1E", 0),
    tool("typescript", "TypeScript", Language, "#3178C6", 0),
    tool("python", "Python", Language, "#3776AB", 0),
    tool("rust", "Rust", Language, "#000000", 0),
    tool("go", "Go", Language, "#00ADD8", 0),
    tool("java", "Java", Language, "#007396", 0),
    tool("cpp", "C++", Language, "#00599C", 0),
    tool("ruby", "Ruby", Language, "#CC342D", 0),
    tool("php", "PHP", Language, "#777BB4", 0),
    tool("swift", "Swift", Language, "#FA7343", 0),
    tool("react", "React", Frontend, "#61DAFB", 1),
    tool("nextjs", "Next.js", Frontend, "#000000", 1),
    tool("vue", "Vue.js", Frontend, "#4FC08D", 1),
    tool("angular", "Angular", Frontend, "#DD0031", 1),
    tool("svelte", "Svelte", Frontend, "#FF3E00", 1),
    tool("nodejs", "Node.js", Backend, "#339933", 1),
    tool("claude", "Claude", Tool, "#D97706", 1),
    tool("github", "GitHub", Tool, "#181717", 1),
    tool("git", "Git", Tool, "#F05032", 1),
    tool("docker", "Docker", Tool, "#2496ED", 1),
    tool("kubernetes", "Kubernetes", Tool, "#326CE5", 1),
    tool("vscode", "VS Code", Tool, "#007ACC", 1),
    tool("vim", "Vim", Tool, "#019733", 1),
    tool("aws", "AWS", Cloud, "#FF9900", 2),
    tool("gcp", "Google Cloud", Cloud, "#4285F4", 2),
    tool("azure", "Azure", Cloud, "#0078D4", 2),
    tool("vercel", "Vercel", Cloud, "#000000", 2),
    tool("netlify", "Netlify", Cloud, "#00D9FF", 2),
    tool("cloudflare", "Cloudflare", Cloud, "#F38020", 2),
    tool("postgresql", "PostgreSQL", Database, "#4169E1", 2),
    tool("mongodb", "MongoDB", Database, "#47A248", 2),
    tool("redis", "Redis", Database, "#DC382D", 2),
    tool("graphql", "GraphQL", Backend, "#E10098", 2),
    tool("rest", "REST API", Backend, "#008000", 2),
];

/// Highlight categories for one ring
pub fn categories_for_ring(ring_index: usize) -> Result<Vec<Category>, ConfigError> {
    DEVELOPER_TOOLS
        .iter()
        .filter(|t| t.ring_index == ring_index)
        .map(|t| Category::from_hex(t.id, t.name, t.color))
        .collect()
}

/// One ring of the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub name: String,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub particles: usize,
    /// Spin about +Y (radians per second)
    pub rotation_speed: f32,
    pub opacity: f32,
    /// Fixed band count, or 2..=4 drawn at build time
    pub band_count: Option<u32>,
    pub band_gap: f32,
    pub vertical_jitter: f32,
    pub ice_fraction: f32,
    pub highlight_stride: usize,
    /// Indices clustered around each highlight slot
    pub cluster_size: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            inner_radius: 4.5,
            outer_radius: 5.5,
            particles: 200_000,
            rotation_speed: 0.015,
            opacity: 0.9,
            band_count: None,
            band_gap: RING_BAND_GAP,
            vertical_jitter: RING_VERTICAL_JITTER,
            ice_fraction: RING_ICE_FRACTION,
            highlight_stride: RING_HIGHLIGHT_STRIDE,
            cluster_size: RING_CLUSTER_SIZE,
        }
    }
}

impl RingConfig {
    /// Layout parameters with the particle count scaled by `particle_scale`
    pub fn params(&self, band_count: u32, particle_scale: f32) -> RingParams {
        RingParams {
            count: (self.particles as f32 * particle_scale).round() as usize,
            inner_radius: self.inner_radius,
            outer_radius: self.outer_radius,
            band_count,
            band_gap: self.band_gap,
            vertical_jitter: self.vertical_jitter,
            ice_fraction: self.ice_fraction,
            highlight_stride: self.highlight_stride,
            cluster_size: self.cluster_size,
        }
    }
}

/// Languages, frameworks, cloud & data
pub fn default_rings() -> Vec<RingConfig> {
    vec![
        RingConfig {
            name: "Inner Ring - Languages".into(),
            ..Default::default()
        },
        RingConfig {
            name: "Middle Ring - Frameworks".into(),
            inner_radius: 6.0,
            outer_radius: 7.5,
            particles: 350_000,
            rotation_speed: 0.012,
            opacity: 0.85,
            ..Default::default()
        },
        RingConfig {
            name: "Outer Ring - Cloud & Data".into(),
            inner_radius: 8.0,
            outer_radius: 10.0,
            particles: 500_000,
            rotation_speed: 0.008,
            opacity: 0.8,
            ..Default::default()
        },
    ]
}

/// A laid-out, spinning ring
#[derive(Debug, Clone)]
pub struct Ring {
    pub config: RingConfig,
    pub band_count: u32,
    pub layout: RingLayout,
    /// Current spin angle about +Y (radians)
    pub rotation: f32,
}

/// All rings of the planet
#[derive(Debug, Clone, Default)]
pub struct RingSystem {
    rings: Vec<Ring>,
}

impl RingSystem {
    /// Lay out every ring. `particle_scale` comes from the quality preset.
    pub fn new<R: Rng + ?Sized>(
        configs: &[RingConfig],
        particle_scale: f32,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let mut rings = Vec::with_capacity(configs.len());
        for (index, config) in configs.iter().enumerate() {
            let band_count = config
                .band_count
                .unwrap_or_else(|| rng.random_range(2..=4));
            let params = config.params(band_count, particle_scale);
            let categories = categories_for_ring(index)?;
            let layout = ring::generate(&params, &categories, rng)?;
            let highlights = if categories.is_empty() {
                0
            } else {
                layout.len().div_ceil(params.highlight_stride)
            };
            log::info!(
                "Ring {} ({:?}): {} particles in {} bands, {} highlights",
                index,
                config.name,
                layout.len(),
                band_count,
                highlights
            );
            rings.push(Ring {
                config: config.clone(),
                band_count,
                layout,
                rotation: 0.0,
            });
        }
        Ok(Self { rings })
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn particle_count(&self) -> usize {
        self.rings.iter().map(|r| r.layout.len()).sum()
    }

    /// Spin every ring
    pub fn step(&mut self, dt: f32) {
        for ring in &mut self.rings {
            ring.rotation = (ring.rotation + dt * ring.config.rotation_speed)
                .rem_euclid(std::f32::consts::TAU);
        }
    }
}
