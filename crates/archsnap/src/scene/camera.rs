//! Camera presets and framing.
//!
//! Angles are in degrees. Azimuth turns from +Z towards +X around the Y
//! axis, elevation lifts the camera above the ground plane. A camera at
//! azimuth 0 and elevation 0 sits on the +Z side looking back at the scene.

use serde::{Deserialize, Serialize};

use archsnap_core::geometry::{Bounds, Point};

/// Named camera placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraPreset {
    #[default]
    Isometric,
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
    /// Uses the configured elevation and azimuth.
    Custom,
}

impl CameraPreset {
    /// The six axis-aligned views emitted as orthogonal snapshots.
    pub const ORTHOGONAL: [CameraPreset; 6] = [
        CameraPreset::Top,
        CameraPreset::Bottom,
        CameraPreset::Left,
        CameraPreset::Right,
        CameraPreset::Front,
        CameraPreset::Back,
    ];

    /// `(elevation, azimuth)` in degrees; `custom` is used by [`Self::Custom`].
    pub fn angles(self, custom: (f32, f32)) -> (f32, f32) {
        match self {
            // Elevation of the cube diagonal: atan(1 / sqrt(2)).
            CameraPreset::Isometric => (35.264_39, 45.0),
            CameraPreset::Front => (0.0, 0.0),
            CameraPreset::Back => (0.0, 180.0),
            CameraPreset::Left => (0.0, -90.0),
            CameraPreset::Right => (0.0, 90.0),
            CameraPreset::Top => (90.0, 0.0),
            CameraPreset::Bottom => (-90.0, 0.0),
            CameraPreset::Custom => custom,
        }
    }
}

/// A perspective camera aimed at the scene center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    preset: CameraPreset,
    position: Point,
    target: Point,
    up: Point,
    field_of_view: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Places a camera so the bounding sphere of `bounds` fits a vertical
    /// field of view of `field_of_view` degrees, with the fitting distance
    /// multiplied by `framing_margin`.
    pub fn frame(
        preset: CameraPreset,
        (elevation, azimuth): (f32, f32),
        bounds: &Bounds,
        field_of_view: f32,
        framing_margin: f32,
    ) -> Self {
        let target = bounds.center();
        let radius = bounds.bounding_radius().max(f32::EPSILON);
        let half_fov = (field_of_view / 2.0).to_radians();
        let distance = radius / half_fov.sin() * framing_margin;

        let (el, az) = (elevation.to_radians(), azimuth.to_radians());
        let direction = Point::new(el.cos() * az.sin(), el.sin(), el.cos() * az.cos());
        let position = target.add_point(direction.scale(distance));

        // Straight up or down the default up vector is degenerate; use the
        // azimuth direction on the ground instead.
        let up = if elevation.abs() >= 89.9 {
            Point::new(-az.sin(), 0.0, -az.cos()).scale(elevation.signum())
        } else {
            Point::new(0.0, 1.0, 0.0)
        };

        Self {
            preset,
            position,
            target,
            up,
            field_of_view,
            near: (distance - radius).max(0.01),
            far: distance + radius,
        }
    }

    pub fn preset(&self) -> CameraPreset {
        self.preset
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn target(&self) -> Point {
        self.target
    }

    pub fn up(&self) -> Point {
        self.up
    }

    /// Vertical field of view in degrees.
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// True when `point` lies inside the cone of the field of view.
    pub fn sees(&self, point: Point) -> bool {
        let forward = self.target.sub_point(self.position).normalize();
        let toward = point.sub_point(self.position).normalize();
        match (forward, toward) {
            (Some(forward), Some(toward)) => {
                let angle = forward.dot(toward).clamp(-1.0, 1.0).acos().to_degrees();
                angle <= self.field_of_view / 2.0
            }
            _ => false,
        }
    }
}
