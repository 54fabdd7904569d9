//! Lighting presets.
//!
//! Lights are placed relative to the scene bounds so that the same preset
//! works for any scene size.

use serde::{Deserialize, Serialize};

use archsnap_core::{
    color::Color,
    geometry::{Bounds, Point},
};

/// Named light rig.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightingPreset {
    /// Three-point rig: key, fill and rim.
    #[default]
    Studio,
    /// One broad area light overhead plus ambient fill.
    Soft,
    /// Ambient only, for diagram-like renders.
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LightKind {
    Point,
    Area,
    Ambient,
}

/// A light aimed at the scene center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Light {
    name: &'static str,
    kind: LightKind,
    position: Point,
    target: Point,
    intensity: f32,
    color: Color,
}

impl Light {
    fn new(name: &'static str, kind: LightKind, position: Point, target: Point, intensity: f32) -> Self {
        Self {
            name,
            kind,
            position,
            target,
            intensity,
            color: Color::new("white").unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn target(&self) -> Point {
        self.target
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

impl LightingPreset {
    /// Builds the rig for a scene occupying `bounds`.
    pub fn lights(self, bounds: &Bounds) -> Vec<Light> {
        let center = bounds.center();
        let reach = bounds.bounding_radius().max(1.0) * 2.0;
        let at = |x: f32, y: f32, z: f32| center.add_point(Point::new(x, y, z).scale(reach));

        match self {
            LightingPreset::Studio => vec![
                Light::new("key", LightKind::Area, at(-0.6, 0.8, 0.8), center, 1.0),
                Light::new("fill", LightKind::Area, at(0.8, 0.4, 0.6), center, 0.45),
                Light::new("rim", LightKind::Point, at(0.0, 0.9, -1.0), center, 0.7),
            ],
            LightingPreset::Soft => vec![
                Light::new("overhead", LightKind::Area, at(0.0, 1.0, 0.0), center, 0.8),
                Light::new("ambient", LightKind::Ambient, center, center, 0.4),
            ],
            LightingPreset::Flat => vec![Light::new("ambient", LightKind::Ambient, center, center, 1.0)],
        }
    }
}

#[cfg(test)]
mod tests {
    use archsnap_core::geometry::Size;

    use super::*;

    fn bounds() -> Bounds {
        Bounds::new_from_center(Point::new(5.0, 1.0, 0.0), Size::new(10.0, 2.0, 6.0))
    }

    #[test]
    fn test_studio_is_three_point() {
        let lights = LightingPreset::Studio.lights(&bounds());
        let names: Vec<&str> = lights.iter().map(Light::name).collect();
        assert_eq!(names, ["key", "fill", "rim"]);
        for light in &lights {
            assert!(!bounds().contains_point(light.position()));
            assert_eq!(light.target(), bounds().center());
        }
    }

    #[test]
    fn test_soft_and_flat() {
        assert_eq!(LightingPreset::Soft.lights(&bounds()).len(), 2);
        let flat = LightingPreset::Flat.lights(&bounds());
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].kind(), LightKind::Ambient);
    }

    #[test]
    fn test_key_light_is_brightest() {
        let lights = LightingPreset::Studio.lights(&bounds());
        let key = lights[0].intensity();
        assert!(lights.iter().all(|light| light.intensity() <= key));
    }
}
