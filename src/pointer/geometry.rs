//! Screen-space geometry shared by the clamper, hit test and focus machine.

use serde::{Deserialize, Serialize};

/// Screen dimensions in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScreenSize {
    pub width: f32,
    pub height: f32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// Pointer location in screen pixels, always inside the screen rectangle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Square of side `size` centered on `position`.
    pub fn centered_on(position: PointerPosition, size: f32) -> Self {
        let half = size.max(0.0) / 2.0;
        Self::new(
            position.x - half,
            position.y - half,
            position.x + half,
            position.y + half,
        )
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> PointerPosition {
        PointerPosition {
            x: self.left + self.width() / 2.0,
            y: self.top + self.height() / 2.0,
        }
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: PointerPosition) -> bool {
        self.left < self.right
            && self.top < self.bottom
            && point.x >= self.left
            && point.x < self.right
            && point.y >= self.top
            && point.y < self.bottom
    }
}

/// Bounds a raw tracking coordinate to `[0, width] × [0, height]`.
pub fn clamp_to_screen(x: f32, y: f32, screen: ScreenSize) -> PointerPosition {
    PointerPosition {
        x: clamp_axis(x, screen.width),
        y: clamp_axis(y, screen.height),
    }
}

fn clamp_axis(value: f32, max: f32) -> f32 {
    let max = max.max(0.0);
    // NaN compares false everywhere, so it lands on 0.
    if value.is_nan() || value < 0.0 {
        0.0
    } else if value > max {
        max
    } else {
        value
    }
}
