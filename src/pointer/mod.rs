pub mod controller;
pub mod dwell;
pub mod engine;
pub mod focus;
pub mod geometry;
pub mod hit_test;
pub mod loop_worker;
pub mod orientation;
pub mod registry;
pub mod tracking;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::TrackingController;
pub use dwell::{DwellButton, ElementAction, Selection};
pub use engine::{EngineConfig, PointerEngine, PointerSnapshot};
pub use focus::{FocusState, FocusTransition};
pub use geometry::{clamp_to_screen, PointerPosition, Rect, ScreenSize};
pub use orientation::{OrientationMonitor, ResetRequest, Rotation};
pub use tracking::{tracking_channel, RawPointer, TrackingFeed, TrackingSignals, TrackingSource};
pub use view::{InteractiveElement, Panel, ViewHierarchy, ViewNode};
