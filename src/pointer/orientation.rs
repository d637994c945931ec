//! Display rotation tracking.
//!
//! A 180° flip keeps the hosting screen alive, so the tracking source keeps
//! its old camera pose and has to be reset explicitly. Quarter turns go
//! through a normal relayout and are ignored here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parses a surface rotation index (0..=3).
    pub fn from_index(value: i32) -> Option<Self> {
        match value {
            0 => Some(Rotation::Deg0),
            1 => Some(Rotation::Deg90),
            2 => Some(Rotation::Deg180),
            3 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn from_degrees(value: i32) -> Option<Self> {
        match value {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg180,
            Rotation::Deg90 => Rotation::Deg270,
            Rotation::Deg180 => Rotation::Deg0,
            Rotation::Deg270 => Rotation::Deg90,
        }
    }
}

/// Request to recreate the tracking source for a new rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    /// Unique per target rotation, e.g. `"180"`.
    pub tag: String,
    pub rotation: Rotation,
}

#[derive(Debug, Default)]
pub struct OrientationMonitor {
    current: Rotation,
    active_tag: Option<String>,
}

impl OrientationMonitor {
    pub fn new(initial: Rotation) -> Self {
        Self {
            current: initial,
            active_tag: None,
        }
    }

    pub fn current(&self) -> Rotation {
        self.current
    }

    /// Feeds a raw rotation reading in degrees.
    ///
    /// Unknown values are ignored and keep the last known rotation.
    pub fn on_display_changed(&mut self, degrees: i32) -> Option<ResetRequest> {
        let next = Rotation::from_degrees(degrees)?;
        let previous = std::mem::replace(&mut self.current, next);

        if next != previous.opposite() {
            return None;
        }

        let tag = next.degrees().to_string();
        if self.active_tag.as_deref() == Some(tag.as_str()) {
            return None;
        }
        self.active_tag = Some(tag.clone());

        Some(ResetRequest {
            tag,
            rotation: next,
        })
    }
}
