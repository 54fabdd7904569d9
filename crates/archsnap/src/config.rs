//! Configuration types for archsnap snapshot generation.
//!
//! This module provides configuration structures that control how
//! architecture graphs are laid out, styled and framed. All types implement
//! [`serde::Deserialize`] with field-level defaults, so a configuration file
//! only needs to mention the values it overrides.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the three sections.
//! - [`LayoutConfig`] - Spacing, relaxation and routing parameters.
//! - [`StyleConfig`] - Category lookup table, weight clamp and colors.
//! - [`SceneConfig`] - Camera, lighting and render hints.
//!
//! Every section is an immutable value handed to the stage that reads it.
//!
//! # Example
//!
//! ```
//! # use archsnap::config::AppConfig;
//! let config: AppConfig = toml::from_str(r#"
//!     [layout]
//!     max_layout_iterations = 50
//!
//!     [scene]
//!     camera_preset = "top"
//! "#).unwrap();
//!
//! assert_eq!(config.layout().max_layout_iterations(), 50);
//! assert!(config.validate().is_ok());
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use archsnap_core::{color::Color, geometry::Size, semantic::Category};

use crate::{
    scene::{CameraPreset, LightingPreset, RenderQuality},
    synthesis::ShapeKind,
};

/// An invalid configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: String, value: f32 },

    #[error("`{field}` must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: String,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("weight clamp is inverted: min {min} is greater than max {max}")]
    InvertedClamp { min: f32, max: f32 },
}

fn ensure_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    // Written negated so NaN is rejected as well.
    if !(value > 0.0) {
        return Err(ConfigError::NonPositive {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn ensure_range(field: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn palette(hex: &str) -> Color {
    Color::new(hex).unwrap_or_default()
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Scene configuration section.
    #[serde(default)]
    scene: SceneConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its three sections.
    pub fn new(layout: LayoutConfig, style: StyleConfig, scene: SceneConfig) -> Self {
        Self {
            layout,
            style,
            scene,
        }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the scene configuration.
    pub fn scene(&self) -> &SceneConfig {
        &self.scene
    }

    /// Replaces the scene section, keeping the others.
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }

    /// Checks every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        self.style.validate()?;
        self.scene.validate()
    }
}

/// Layout engine parameters.
///
/// Distances are in scene units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    max_layout_iterations: usize,
    overlap_epsilon: f32,
    relaxation_strength: f32,
    layer_spacing: f32,
    node_spacing: f32,
    group_padding: f32,
    parallel_edge_spacing: f32,
    route_clearance: f32,
    self_loop_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_layout_iterations: 200,
            overlap_epsilon: 0.01,
            relaxation_strength: 0.55,
            layer_spacing: 4.0,
            node_spacing: 2.0,
            group_padding: 0.75,
            parallel_edge_spacing: 0.4,
            route_clearance: 0.5,
            self_loop_height: 1.0,
        }
    }
}

impl LayoutConfig {
    /// Upper bound on overlap relaxation iterations.
    pub fn max_layout_iterations(&self) -> usize {
        self.max_layout_iterations
    }

    /// Largest penetration depth still considered "no overlap".
    pub fn overlap_epsilon(&self) -> f32 {
        self.overlap_epsilon
    }

    /// Fraction of the penetration depth resolved per relaxation step.
    pub fn relaxation_strength(&self) -> f32 {
        self.relaxation_strength
    }

    /// Gap between consecutive layers along X.
    pub fn layer_spacing(&self) -> f32 {
        self.layer_spacing
    }

    /// Gap between neighbouring nodes of a layer along Z.
    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    /// Margin between a group volume and its contents.
    pub fn group_padding(&self) -> f32 {
        self.group_padding
    }

    /// Perpendicular distance between parallel connectors.
    pub fn parallel_edge_spacing(&self) -> f32 {
        self.parallel_edge_spacing
    }

    /// Minimum distance between a detoured connector and an obstruction.
    pub fn route_clearance(&self) -> f32 {
        self.route_clearance
    }

    /// Height of a self-loop above the top face of its node.
    pub fn self_loop_height(&self) -> f32 {
        self.self_loop_height
    }

    pub fn with_max_layout_iterations(mut self, iterations: usize) -> Self {
        self.max_layout_iterations = iterations;
        self
    }

    pub fn with_overlap_epsilon(mut self, epsilon: f32) -> Self {
        self.overlap_epsilon = epsilon;
        self
    }

    pub fn with_relaxation_strength(mut self, strength: f32) -> Self {
        self.relaxation_strength = strength;
        self
    }

    pub fn with_layer_spacing(mut self, spacing: f32) -> Self {
        self.layer_spacing = spacing;
        self
    }

    pub fn with_node_spacing(mut self, spacing: f32) -> Self {
        self.node_spacing = spacing;
        self
    }

    pub fn with_group_padding(mut self, padding: f32) -> Self {
        self.group_padding = padding;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("layout.overlap_epsilon", self.overlap_epsilon)?;
        ensure_range(
            "layout.relaxation_strength",
            self.relaxation_strength,
            f32::EPSILON,
            1.0,
        )?;
        ensure_positive("layout.layer_spacing", self.layer_spacing)?;
        ensure_positive("layout.node_spacing", self.node_spacing)?;
        ensure_positive("layout.group_padding", self.group_padding)?;
        ensure_positive("layout.parallel_edge_spacing", self.parallel_edge_spacing)?;
        ensure_positive("layout.route_clearance", self.route_clearance)?;
        ensure_positive("layout.self_loop_height", self.self_loop_height)
    }
}

/// Visual style of one component category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryStyle {
    shape: ShapeKind,
    base_size: Size,
    color: Color,
}

impl CategoryStyle {
    pub fn new(shape: ShapeKind, base_size: Size, color: Color) -> Self {
        Self {
            shape,
            base_size,
            color,
        }
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Dimensions at weight 1.0.
    pub fn base_size(&self) -> Size {
        self.base_size
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

/// Inclusive range applied to component weights before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WeightClamp {
    pub min: f32,
    pub max: f32,
}

impl Default for WeightClamp {
    fn default() -> Self {
        Self { min: 0.5, max: 3.0 }
    }
}

impl WeightClamp {
    /// Scale factor for an optional weight; absent weights scale by 1.0.
    pub fn apply(self, weight: Option<f32>) -> f32 {
        weight.unwrap_or(1.0).max(self.min).min(self.max)
    }
}

/// Styling of synthesized geometry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Lookup table keyed by category. Categories missing from a
    /// user-supplied table use the fallback style.
    category_styles: BTreeMap<Category, CategoryStyle>,
    weight_clamp: WeightClamp,
    /// Color of the fallback style.
    default_color: Color,
    group_color: Color,
    group_opacity: f32,
    connector_radius: f32,
    connector_color: Color,
    background_color: Option<Color>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let category_styles = BTreeMap::from([
            (
                Category::Service,
                CategoryStyle::new(ShapeKind::Box, Size::new(2.0, 1.5, 2.0), palette("#4e79a7")),
            ),
            (
                Category::Database,
                CategoryStyle::new(
                    ShapeKind::Cylinder,
                    Size::new(1.6, 2.0, 1.6),
                    palette("#f28e2b"),
                ),
            ),
            (
                Category::Queue,
                CategoryStyle::new(
                    ShapeKind::Capsule,
                    Size::new(2.4, 1.0, 1.0),
                    palette("#59a14f"),
                ),
            ),
            (
                Category::Cache,
                CategoryStyle::new(ShapeKind::Sphere, Size::uniform(1.4), palette("#e15759")),
            ),
            (
                Category::External,
                CategoryStyle::new(ShapeKind::Cone, Size::new(1.8, 2.0, 1.8), palette("#b07aa1")),
            ),
            (
                Category::Client,
                CategoryStyle::new(ShapeKind::Box, Size::new(1.6, 1.0, 1.2), palette("#76b7b2")),
            ),
        ]);

        Self {
            category_styles,
            weight_clamp: WeightClamp::default(),
            default_color: Color::default(),
            group_color: palette("#9aa5b1"),
            group_opacity: 0.12,
            connector_radius: 0.05,
            connector_color: palette("#3b3b3b"),
            background_color: None,
        }
    }
}

impl StyleConfig {
    /// Style for a category, or the fallback style when the table has no entry.
    pub fn category_style(&self, category: Category) -> CategoryStyle {
        self.category_styles
            .get(&category)
            .cloned()
            .unwrap_or_else(|| self.fallback_style())
    }

    /// Box shaped, unit-ish style in the default color.
    pub fn fallback_style(&self) -> CategoryStyle {
        CategoryStyle::new(ShapeKind::Box, Size::uniform(1.5), self.default_color)
    }

    /// Dimensions of a component: base size times its clamped weight.
    ///
    /// Layout and synthesis both call this, so layout boxes and shapes agree.
    pub fn footprint(&self, category: Category, weight: Option<f32>) -> Size {
        self.category_style(category)
            .base_size()
            .scale(self.weight_clamp.apply(weight))
    }

    pub fn weight_clamp(&self) -> WeightClamp {
        self.weight_clamp
    }

    pub fn group_color(&self) -> Color {
        self.group_color
    }

    pub fn group_opacity(&self) -> f32 {
        self.group_opacity
    }

    pub fn connector_radius(&self) -> f32 {
        self.connector_radius
    }

    pub fn connector_color(&self) -> Color {
        self.connector_color
    }

    /// Background for render hints; `None` leaves the choice to the scene.
    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    pub fn with_category_style(mut self, category: Category, style: CategoryStyle) -> Self {
        self.category_styles.insert(category, style);
        self
    }

    pub fn without_category_style(mut self, category: Category) -> Self {
        self.category_styles.remove(&category);
        self
    }

    pub fn with_weight_clamp(mut self, min: f32, max: f32) -> Self {
        self.weight_clamp = WeightClamp { min, max };
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let WeightClamp { min, max } = self.weight_clamp;
        ensure_positive("style.weight_clamp.min", min)?;
        if min > max {
            return Err(ConfigError::InvertedClamp { min, max });
        }
        for (category, style) in &self.category_styles {
            let size = style.base_size;
            for (axis, value) in [
                ("width", size.width()),
                ("height", size.height()),
                ("depth", size.depth()),
            ] {
                ensure_positive(
                    &format!("style.category_styles.{category}.base_size.{axis}"),
                    value,
                )?;
            }
        }
        ensure_range("style.group_opacity", self.group_opacity, 0.0, 1.0)?;
        ensure_positive("style.connector_radius", self.connector_radius)
    }
}

/// Framing and render hints for the assembled scene.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    name: String,
    camera_preset: CameraPreset,
    /// Elevation in degrees, used by [`CameraPreset::Custom`].
    camera_elevation: f32,
    /// Azimuth in degrees, used by [`CameraPreset::Custom`].
    camera_azimuth: f32,
    field_of_view: f32,
    framing_margin: f32,
    bounds_margin: f32,
    lighting_preset: LightingPreset,
    orthogonal_views: bool,
    resolution: u32,
    render_quality: RenderQuality,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "snapshot".to_string(),
            camera_preset: CameraPreset::default(),
            camera_elevation: 30.0,
            camera_azimuth: 45.0,
            field_of_view: 45.0,
            framing_margin: 1.1,
            bounds_margin: 0.5,
            lighting_preset: LightingPreset::default(),
            orthogonal_views: false,
            resolution: 1920,
            render_quality: RenderQuality::default(),
        }
    }
}

impl SceneConfig {
    /// Scene name recorded in the descriptor metadata.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn camera_preset(&self) -> CameraPreset {
        self.camera_preset
    }

    pub fn camera_elevation(&self) -> f32 {
        self.camera_elevation
    }

    pub fn camera_azimuth(&self) -> f32 {
        self.camera_azimuth
    }

    /// Vertical field of view in degrees.
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// Multiplier (at least 1) on the distance that fits the bounding sphere.
    pub fn framing_margin(&self) -> f32 {
        self.framing_margin
    }

    /// Margin added around the merged scene bounds.
    pub fn bounds_margin(&self) -> f32 {
        self.bounds_margin
    }

    pub fn lighting_preset(&self) -> LightingPreset {
        self.lighting_preset
    }

    /// Whether the six orthogonal snapshot views are emitted.
    pub fn orthogonal_views(&self) -> bool {
        self.orthogonal_views
    }

    /// Edge length of the square render target in pixels.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn render_quality(&self) -> RenderQuality {
        self.render_quality
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_camera_preset(mut self, preset: CameraPreset) -> Self {
        self.camera_preset = preset;
        self
    }

    pub fn with_custom_camera(mut self, elevation: f32, azimuth: f32) -> Self {
        self.camera_preset = CameraPreset::Custom;
        self.camera_elevation = elevation;
        self.camera_azimuth = azimuth;
        self
    }

    pub fn with_lighting_preset(mut self, preset: LightingPreset) -> Self {
        self.lighting_preset = preset;
        self
    }

    pub fn with_orthogonal_views(mut self, enabled: bool) -> Self {
        self.orthogonal_views = enabled;
        self
    }

    pub fn with_render_quality(mut self, quality: RenderQuality) -> Self {
        self.render_quality = quality;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_range("scene.camera_elevation", self.camera_elevation, -90.0, 90.0)?;
        ensure_range("scene.field_of_view", self.field_of_view, 1.0, 179.0)?;
        ensure_range("scene.framing_margin", self.framing_margin, 1.0, 10.0)?;
        ensure_positive("scene.bounds_margin", self.bounds_margin)?;
        ensure_positive("scene.resolution", self.resolution as f32)
    }
}
