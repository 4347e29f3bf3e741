/// Pan and zoom parameters for displaying a stored image
///
/// Admins reposition product, category and hero images without re-uploading
/// them. The values are stored next to the owning row and applied at display
/// time as a CSS transform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const POSITION_MIN: f64 = -50.0;
pub const POSITION_MAX: f64 = 50.0;
pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 3.0;

/// Offset applied by one press of an arrow control (percent)
pub const POSITION_STEP: f64 = 5.0;
/// Change applied by one press of a zoom button
pub const ZOOM_STEP: f64 = 0.1;

/// Clamp a position offset into [-50, 50]; NaN becomes 0
pub fn clamp_position(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(POSITION_MIN, POSITION_MAX)
}

/// Clamp a zoom factor into [0.5, 3.0]; NaN becomes 1
pub fn clamp_zoom(value: f64) -> f64 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(ZOOM_MIN, ZOOM_MAX)
}

/// Position and zoom of an image inside its display frame
///
/// Every mutator clamps, so a `Transform` built through this API is always
/// in range. Values read back from storage should go through [`Transform::new`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Horizontal offset in percent (-50 to +50)
    pub position_x: f64,
    /// Vertical offset in percent (-50 to +50)
    pub position_y: f64,
    /// Scale factor (0.5 to 3.0)
    pub zoom: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Transform {
    pub fn new(position_x: f64, position_y: f64, zoom: f64) -> Self {
        Self {
            position_x,
            position_y,
            zoom,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            position_x: clamp_position(self.position_x),
            position_y: clamp_position(self.position_y),
            zoom: clamp_zoom(self.zoom),
        }
    }

    /// Move by a delta (arrow controls)
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        self.set_position(self.position_x + dx, self.position_y + dy);
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position_x = clamp_position(x);
        self.position_y = clamp_position(y);
    }

    pub fn reset_position(&mut self) {
        self.position_x = 0.0;
        self.position_y = 0.0;
    }

    /// Zoom in or out by a delta (zoom buttons)
    pub fn zoom_by(&mut self, delta: f64) {
        self.set_zoom(self.zoom + delta);
    }

    /// Set the zoom directly (slider)
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// CSS transform applied to the image element, e.g. `scale(1.5) translate(10%, -5%)`
    pub fn css_transform(&self) -> String {
        format!(
            "scale({}) translate({}%, {}%)",
            self.zoom, self.position_x, self.position_y
        )
    }
}

/// How the image fills its frame before the transform is applied
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    Contain,
    #[default]
    Cover,
    Fill,
}

impl ImageFit {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFit::Contain => "contain",
            ImageFit::Cover => "cover",
            ImageFit::Fill => "fill",
        }
    }
}

impl fmt::Display for ImageFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown image fit: {0}")]
pub struct UnknownFit(pub String);

impl FromStr for ImageFit {
    type Err = UnknownFit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contain" => Ok(ImageFit::Contain),
            "cover" => Ok(ImageFit::Cover),
            "fill" => Ok(ImageFit::Fill),
            other => Err(UnknownFit(other.to_string())),
        }
    }
}
