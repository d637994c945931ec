use std::sync::Arc;

use log::debug;
use serde::Serialize;

use super::focus::{FocusState, FocusTransition};
use super::geometry::{clamp_to_screen, PointerPosition, Rect, ScreenSize};
use super::registry::ElementRegistry;
use super::view::ViewHierarchy;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub screen: ScreenSize,
    /// Side of the square pointer hit area, in pixels.
    pub pointer_size: f32,
    pub head_tracking_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            screen: ScreenSize::default(),
            pointer_size: 40.0,
            head_tracking_enabled: true,
        }
    }
}

/// What the UI needs to draw the cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerSnapshot {
    pub position: Option<PointerPosition>,
    pub visible: bool,
    pub suspended: bool,
    pub focused: Option<String>,
}

/// Turns raw tracking coordinates into focus changes on the view hierarchy.
///
/// Every method takes `&mut self`; the caller drives it from a single task
/// so pointer updates are never processed concurrently.
pub struct PointerEngine {
    config: EngineConfig,
    hierarchy: Arc<dyn ViewHierarchy>,
    registry: ElementRegistry,
    focus: FocusState,
    position: Option<PointerPosition>,
    paused: bool,
    tracking_lost: bool,
}

impl PointerEngine {
    pub fn new(config: EngineConfig, hierarchy: Arc<dyn ViewHierarchy>) -> Self {
        Self {
            config,
            hierarchy,
            registry: ElementRegistry::new(),
            focus: FocusState::NoFocus,
            position: None,
            paused: false,
            tracking_lost: false,
        }
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn position(&self) -> Option<PointerPosition> {
        self.position
    }

    /// Any gate that suppresses focus search.
    pub fn is_suspended(&self) -> bool {
        self.paused || self.tracking_lost || !self.config.head_tracking_enabled
    }

    pub fn pointer_visible(&self) -> bool {
        self.config.head_tracking_enabled && !self.tracking_lost
    }

    pub fn snapshot(&self) -> PointerSnapshot {
        PointerSnapshot {
            position: self.position,
            visible: self.pointer_visible(),
            suspended: self.is_suspended(),
            focused: self.focus.focused().map(|e| e.id().to_string()),
        }
    }

    pub fn update_pointer(&mut self, x: f32, y: f32) -> FocusTransition {
        let position = clamp_to_screen(x, y, self.config.screen);
        self.position = Some(position);

        let pointer_rect = Rect::centered_on(position, self.config.pointer_size);
        let elements = self.registry.elements(self.hierarchy.as_ref());
        let suspended = self.is_suspended();

        let (next, transition) = std::mem::take(&mut self.focus).advance(
            position,
            pointer_rect,
            &elements,
            suspended,
        );
        self.focus = next;

        if !transition.is_empty() {
            debug!(
                "focus transition at ({:.0}, {:.0}): exited={:?} entered={:?}",
                position.x, position.y, transition.exited, transition.entered
            );
        }
        transition
    }

    /// App-level pause, e.g. backgrounded or covered by a settings screen.
    pub fn set_paused(&mut self, paused: bool) -> FocusTransition {
        self.paused = paused;
        self.release_if_suspended()
    }

    /// Tracking confidence signal. `true` hides the pointer and stops focus
    /// search until confidence returns.
    pub fn show_error(&mut self, error: bool) -> FocusTransition {
        self.tracking_lost = error;
        self.release_if_suspended()
    }

    pub fn set_head_tracking_enabled(&mut self, enabled: bool) -> FocusTransition {
        self.config.head_tracking_enabled = enabled;
        self.release_if_suspended()
    }

    pub fn on_layout_changed(&mut self) {
        self.registry.invalidate();
    }

    /// Releases focus for teardown.
    pub fn shutdown(&mut self) -> FocusTransition {
        let elements = self.registry.elements(self.hierarchy.as_ref());
        let (next, transition) = std::mem::take(&mut self.focus).release(&elements);
        self.focus = next;
        transition
    }

    fn release_if_suspended(&mut self) -> FocusTransition {
        if self.is_suspended() {
            self.shutdown()
        } else {
            FocusTransition::default()
        }
    }
}
