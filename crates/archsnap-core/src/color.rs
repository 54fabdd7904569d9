//! Color handling for archsnap scenes
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. Configuration accepts any CSS color string; the scene
//! descriptor carries colors as linear RGBA quadruples in `0.0..=1.0`, the
//! representation renderers consume directly.

use std::{
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::{DynamicColor, Srgb};
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeSeq};

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a string
    /// This will parse CSS color strings such as "#ff0000", "rgb(255, 0, 0)", "red", etc.
    ///
    /// # Examples
    ///
    /// ```
    /// use archsnap_core::color::Color;
    ///
    /// let grey = Color::new("#808080").unwrap();
    /// let blue = Color::new("blue").unwrap();
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Creates a new color with the specified alpha (transparency) value.
    ///
    /// # Examples
    ///
    /// ```
    /// use archsnap_core::color::Color;
    ///
    /// let red = Color::new("red").unwrap();
    /// let glass = red.with_alpha(0.25);
    /// assert_eq!(glass.alpha(), 0.25);
    /// ```
    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    /// Returns the alpha (transparency) component of this color.
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }

    /// Returns the color as sRGB `[r, g, b, a]` components in `0.0..=1.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use archsnap_core::color::Color;
    ///
    /// let rgba = Color::new("#ff0000").unwrap().rgba();
    /// assert_eq!(rgba, [1.0, 0.0, 0.0, 1.0]);
    /// ```
    pub fn rgba(&self) -> [f32; 4] {
        self.color.to_alpha_color::<Srgb>().components
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("#808080").expect("'#808080' is a valid CSS color")
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rgba = self.rgba();
        let mut seq = serializer.serialize_seq(Some(rgba.len()))?;
        for component in rgba {
            seq.serialize_element(&component)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::new(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_color_new() {
        assert!(Color::new("#ff0000").is_ok());
        assert!(Color::new("not-a-color").is_err());
    }

    #[test]
    fn test_color_default_is_neutral_grey() {
        let [r, g, b, a] = Color::default().rgba();
        assert_approx_eq!(f32, r, 128.0 / 255.0, epsilon = 1e-4);
        assert_approx_eq!(f32, g, 128.0 / 255.0, epsilon = 1e-4);
        assert_approx_eq!(f32, b, 128.0 / 255.0, epsilon = 1e-4);
        assert_approx_eq!(f32, a, 1.0);
    }

    #[test]
    fn test_with_alpha_keeps_rgb() {
        let base = Color::new("#336699").unwrap();
        let faded = base.with_alpha(0.2);

        let [r1, g1, b1, _] = base.rgba();
        let [r2, g2, b2, a2] = faded.rgba();
        assert_approx_eq!(f32, r1, r2, epsilon = 1e-5);
        assert_approx_eq!(f32, g1, g2, epsilon = 1e-5);
        assert_approx_eq!(f32, b1, b2, epsilon = 1e-5);
        assert_approx_eq!(f32, a2, 0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_named_color_rgba() {
        let rgba = Color::new("white").unwrap().rgba();
        for component in rgba {
            assert_approx_eq!(f32, component, 1.0, epsilon = 1e-5);
        }
    }
}
