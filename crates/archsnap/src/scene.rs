//! Scene assembly.
//!
//! The [`SceneAssembler`] is the last pipeline stage: it merges synthesized
//! primitives with the layout bounds, frames them with a camera, adds a light
//! rig and render hints, and produces the [`SceneDescriptor`] handed to the
//! renderer. Primitives pass through unchanged.
//!
//! An assembler is bound to one [`GraphModel`] and can be used once. Reusing
//! it, or feeding it stage outputs computed from another model, fails with
//! [`StaleLayoutError`].

mod camera;
mod lighting;

pub use camera::{Camera, CameraPreset};
pub use lighting::{Light, LightKind, LightingPreset};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use archsnap_core::{
    color::Color,
    geometry::{Bounds, Point},
};

use crate::{
    config::{AppConfig, SceneConfig},
    layout::GraphBounds,
    structure::{GraphModel, ModelToken},
    synthesis::{Geometry, PrimitiveDescriptor},
};

/// Misuse of the scene assembler across pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StaleLayoutError {
    #[error("scene assembler for {token} has already produced a scene")]
    AlreadyAssembled { token: ModelToken },

    #[error("stage output from {found} cannot be used with {expected}")]
    ForeignInput {
        expected: ModelToken,
        found: ModelToken,
    },
}

/// Speed versus fidelity preference passed on to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderQuality {
    /// Fast rasterized preview.
    #[default]
    Preview,
    /// Slower, physically based final render.
    Final,
}

/// Render target settings for the external renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderHints {
    /// Edge length of the square render target in pixels.
    resolution: u32,
    background: Color,
    quality: RenderQuality,
}

impl RenderHints {
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn quality(&self) -> RenderQuality {
        self.quality
    }
}

/// A ten-tick scale bar along +X at the front-left corner of the bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleBar {
    tick: f32,
    ticks: u32,
    label: String,
    origin: Point,
}

impl ScaleBar {
    const TICKS: u32 = 10;

    fn for_bounds(bounds: &Bounds) -> Self {
        let size = bounds.to_size();
        let largest = size.width().max(size.height()).max(size.depth());
        let tick = round_to_one_significant_digit(largest / Self::TICKS as f32);
        Self {
            tick,
            ticks: Self::TICKS,
            label: tick_label(tick),
            origin: bounds.min_point().with_z(bounds.max_z()),
        }
    }

    /// Length of one tick in scene units.
    pub fn tick(&self) -> f32 {
        self.tick
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Tick length as displayed next to the bar.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn origin(&self) -> Point {
        self.origin
    }
}

/// Rounds to one significant digit, halves to even (250 -> 200, 350 -> 400).
fn round_to_one_significant_digit(value: f32) -> f32 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    let magnitude = 10f32.powf(value.log10().floor());
    (value / magnitude).round_ties_even() * magnitude
}

/// Whole ticks print without decimals, others with up to four.
fn tick_label(tick: f32) -> String {
    if tick.fract() == 0.0 {
        format!("{tick:.0}")
    } else {
        let text = format!("{tick:.4}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Scene name and provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneMetadata {
    name: String,
    generator: &'static str,
    version: &'static str,
    primitives: usize,
}

impl SceneMetadata {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generator(&self) -> &str {
        self.generator
    }

    pub fn version(&self) -> &str {
        self.version
    }

    /// Number of primitives in the scene.
    pub fn primitives(&self) -> usize {
        self.primitives
    }
}

/// Flat, serializable description of a complete scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDescriptor {
    metadata: SceneMetadata,
    bounds: Bounds,
    camera: Camera,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    views: Vec<Camera>,
    lights: Vec<Light>,
    render_hints: RenderHints,
    scale_bar: ScaleBar,
    primitives: Vec<PrimitiveDescriptor>,
}

impl SceneDescriptor {
    pub fn metadata(&self) -> &SceneMetadata {
        &self.metadata
    }

    /// Bounds strictly containing every primitive.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The main camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Orthogonal snapshot cameras; empty unless enabled.
    pub fn views(&self) -> &[Camera] {
        &self.views
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn render_hints(&self) -> &RenderHints {
        &self.render_hints
    }

    pub fn scale_bar(&self) -> &ScaleBar {
        &self.scale_bar
    }

    pub fn primitives(&self) -> &[PrimitiveDescriptor] {
        &self.primitives
    }
}

/// Single-use assembler bound to one graph model.
///
/// # Examples
///
/// ```
/// use archsnap::{config::AppConfig, layout, scene::SceneAssembler, structure::GraphModel, synthesis};
/// use archsnap::semantic::ComponentSpec;
///
/// let config = AppConfig::default();
/// let graph = GraphModel::build(&[ComponentSpec::new("api", "service")], &[], &[]).unwrap();
/// let layout = layout::layout(&graph, &config).unwrap();
/// let geometry = synthesis::synthesize(&graph, &layout, config.style()).unwrap();
///
/// let mut assembler = SceneAssembler::new(&graph, &config);
/// let scene = assembler.assemble(geometry.clone(), layout.graph_bounds()).unwrap();
/// assert_eq!(scene.primitives().len(), 1);
///
/// // A second scene from the same assembler is refused.
/// assert!(assembler.assemble(geometry, layout.graph_bounds()).is_err());
/// ```
#[derive(Debug)]
pub struct SceneAssembler<'a> {
    token: ModelToken,
    scene: &'a SceneConfig,
    background: Option<Color>,
    used: bool,
}

impl<'a> SceneAssembler<'a> {
    pub fn new(graph: &GraphModel, config: &'a AppConfig) -> Self {
        Self {
            token: graph.token(),
            scene: config.scene(),
            background: config.style().background_color(),
            used: false,
        }
    }

    fn check_token(&self, found: ModelToken) -> Result<(), StaleLayoutError> {
        if found != self.token {
            return Err(StaleLayoutError::ForeignInput {
                expected: self.token,
                found,
            });
        }
        Ok(())
    }

    /// Composes the final scene.
    ///
    /// # Errors
    ///
    /// Returns [`StaleLayoutError::AlreadyAssembled`] on any call after a
    /// successful one, and [`StaleLayoutError::ForeignInput`] when `geometry`
    /// or `graph_bounds` stem from a different model than the assembler's.
    pub fn assemble(
        &mut self,
        geometry: Geometry,
        graph_bounds: GraphBounds,
    ) -> Result<SceneDescriptor, StaleLayoutError> {
        if self.used {
            return Err(StaleLayoutError::AlreadyAssembled { token: self.token });
        }
        self.check_token(geometry.token())?;
        self.check_token(graph_bounds.token())?;
        info!(token:% = self.token; "Assembling scene");

        let content = geometry
            .bounds()
            .map_or(graph_bounds.bounds(), |bounds| bounds.merge(&graph_bounds.bounds()));
        let bounds = content.add_padding(self.scene.bounds_margin());

        let custom = (self.scene.camera_elevation(), self.scene.camera_azimuth());
        let frame = |preset: CameraPreset| {
            Camera::frame(
                preset,
                preset.angles(custom),
                &bounds,
                self.scene.field_of_view(),
                self.scene.framing_margin(),
            )
        };
        let camera = frame(self.scene.camera_preset());
        let views = if self.scene.orthogonal_views() {
            CameraPreset::ORTHOGONAL.into_iter().map(frame).collect()
        } else {
            Vec::new()
        };
        debug!(preset:? = camera.preset(), views = views.len(); "Cameras framed");

        let lights = self.scene.lighting_preset().lights(&bounds);
        let primitives = geometry.into_primitives();

        let scene = SceneDescriptor {
            metadata: SceneMetadata {
                name: self.scene.name().to_string(),
                generator: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
                primitives: primitives.len(),
            },
            bounds,
            camera,
            views,
            lights,
            render_hints: RenderHints {
                resolution: self.scene.resolution(),
                background: self
                    .background
                    .unwrap_or_else(|| Color::new("white").unwrap_or_default()),
                quality: self.scene.render_quality(),
            },
            scale_bar: ScaleBar::for_bounds(&bounds),
            primitives,
        };
        self.used = true;

        info!(primitives = scene.primitives.len(); "Scene assembled");
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use archsnap_core::semantic::{ComponentSpec, RelationshipSpec};

    use super::*;
    use crate::{layout, synthesis};

    struct Run {
        graph: GraphModel,
        geometry: Geometry,
        graph_bounds: GraphBounds,
    }

    fn run(config: &AppConfig) -> Run {
        let graph = GraphModel::build(
            &[
                ComponentSpec::new("sc_a", "service"),
                ComponentSpec::new("sc_b", "database"),
            ],
            &[],
            &[RelationshipSpec::new("sc_a", "sc_b", "sync-call")],
        )
        .unwrap();
        let layout = layout::layout(&graph, config).unwrap();
        let geometry = synthesis::synthesize(&graph, &layout, config.style()).unwrap();
        Run {
            graph_bounds: layout.graph_bounds(),
            graph,
            geometry,
        }
    }

    #[test]
    fn test_round_to_one_significant_digit() {
        assert_approx_eq!(f32, round_to_one_significant_digit(375.0), 400.0, epsilon = 1e-3);
        assert_approx_eq!(f32, round_to_one_significant_digit(325.0), 300.0, epsilon = 1e-3);
        assert_approx_eq!(f32, round_to_one_significant_digit(2.5), 2.0, epsilon = 1e-5);
        assert_approx_eq!(f32, round_to_one_significant_digit(3.5), 4.0, epsilon = 1e-5);
        assert_approx_eq!(f32, round_to_one_significant_digit(2.37), 2.0, epsilon = 1e-5);
        assert_approx_eq!(f32, round_to_one_significant_digit(0.96), 1.0, epsilon = 1e-5);
        assert_approx_eq!(f32, round_to_one_significant_digit(0.0123), 0.01, epsilon = 1e-6);
        assert_eq!(round_to_one_significant_digit(0.0), 0.0);
    }

    #[test]
    fn test_tick_label() {
        assert_eq!(tick_label(400.0), "400");
        assert_eq!(tick_label(0.5), "0.5");
        assert_eq!(tick_label(0.02), "0.02");
    }

    #[test]
    fn test_bounds_strictly_contain_primitives() {
        let config = AppConfig::default();
        let run = run(&config);
        let mut assembler = SceneAssembler::new(&run.graph, &config);
        let scene = assembler.assemble(run.geometry, run.graph_bounds).unwrap();

        for primitive in scene.primitives() {
            assert!(scene.bounds().strictly_contains(&primitive.bounds()));
            assert!(scene.bounds().strictly_contains_point(primitive.anchor()));
            assert!(scene.camera().sees(primitive.anchor()));
        }
        assert_eq!(scene.metadata().name(), "snapshot");
        assert_eq!(scene.metadata().primitives(), scene.primitives().len());
    }

    #[test]
    fn test_second_assembly_is_stale() {
        let config = AppConfig::default();
        let run = run(&config);
        let mut assembler = SceneAssembler::new(&run.graph, &config);
        assembler
            .assemble(run.geometry.clone(), run.graph_bounds)
            .unwrap();

        let err = assembler.assemble(run.geometry, run.graph_bounds).unwrap_err();
        assert_eq!(
            err,
            StaleLayoutError::AlreadyAssembled {
                token: run.graph.token()
            }
        );
    }

    #[test]
    fn test_foreign_inputs_are_stale() {
        let config = AppConfig::default();
        let first = run(&config);
        let second = run(&config);

        let mut assembler = SceneAssembler::new(&first.graph, &config);
        let err = assembler
            .assemble(second.geometry, first.graph_bounds)
            .unwrap_err();
        assert!(matches!(err, StaleLayoutError::ForeignInput { .. }));

        // A rejected call does not consume the assembler.
        let err = assembler
            .assemble(first.geometry.clone(), second.graph_bounds)
            .unwrap_err();
        assert!(matches!(err, StaleLayoutError::ForeignInput { .. }));
        assert!(assembler.assemble(first.geometry, first.graph_bounds).is_ok());
    }

    #[test]
    fn test_final_quality_reaches_render_hints() {
        let config = AppConfig::default()
            .with_scene(SceneConfig::default().with_render_quality(RenderQuality::Final));
        let run = run(&config);
        let scene = SceneAssembler::new(&run.graph, &config)
            .assemble(run.geometry, run.graph_bounds)
            .unwrap();

        assert_eq!(scene.render_hints().quality(), RenderQuality::Final);
    }

    #[test]
    fn test_orthogonal_views_and_render_hints() {
        let config = AppConfig::default().with_scene(
            SceneConfig::default()
                .with_orthogonal_views(true)
                .with_lighting_preset(LightingPreset::Flat)
                .with_name("views"),
        );
        let run = run(&config);
        let scene = SceneAssembler::new(&run.graph, &config)
            .assemble(run.geometry, run.graph_bounds)
            .unwrap();

        let presets: Vec<CameraPreset> = scene.views().iter().map(Camera::preset).collect();
        assert_eq!(presets, CameraPreset::ORTHOGONAL);
        assert_eq!(scene.lights().len(), 1);
        assert_eq!(scene.render_hints().resolution(), 1920);
        assert_eq!(scene.render_hints().background(), Color::new("white").unwrap());
        assert_eq!(scene.render_hints().quality(), RenderQuality::Preview);
        assert_eq!(scene.metadata().name(), "views");
        assert_eq!(scene.scale_bar().ticks(), 10);
        assert!(scene.scale_bar().tick() > 0.0);
    }
}
