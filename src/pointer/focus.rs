//! Single-focus state machine.
//!
//! The state is a plain value: [`FocusState::advance`] consumes the current
//! state and returns the next one together with the callbacks it fired, so
//! transitions can be exercised without a live UI.

use std::fmt;
use std::sync::{Arc, Weak};

use serde::Serialize;

use super::geometry::{PointerPosition, Rect};
use super::hit_test::{find_intersecting, still_over};
use super::view::{same_element, InteractiveElement};

#[derive(Clone, Default)]
pub enum FocusState {
    #[default]
    NoFocus,
    FocusedOn(Weak<dyn InteractiveElement>),
}

/// Callbacks fired by one step, by element id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusTransition {
    pub exited: Option<String>,
    pub entered: Option<String>,
}

impl FocusTransition {
    pub fn is_empty(&self) -> bool {
        self.exited.is_none() && self.entered.is_none()
    }
}

impl FocusState {
    pub fn is_focused(&self) -> bool {
        matches!(self, FocusState::FocusedOn(_))
    }

    /// The focused element, if it is still alive.
    pub fn focused(&self) -> Option<Arc<dyn InteractiveElement>> {
        match self {
            FocusState::NoFocus => None,
            FocusState::FocusedOn(weak) => weak.upgrade(),
        }
    }

    /// Processes one pointer position.
    ///
    /// `elements` is the current registry content; a focused element that
    /// is no longer in it, or has been dropped, is treated as stale and its
    /// exit callback is skipped.
    pub fn advance(
        self,
        pointer: PointerPosition,
        pointer_rect: Rect,
        elements: &[Arc<dyn InteractiveElement>],
        paused: bool,
    ) -> (FocusState, FocusTransition) {
        let current = match &self {
            FocusState::NoFocus => None,
            FocusState::FocusedOn(weak) => live_member(weak, elements),
        };

        if let Some(current) = &current {
            if !paused && still_over(current.as_ref(), pointer) {
                return (self, FocusTransition::default());
            }
        }

        let candidate = find_intersecting(pointer_rect, elements, paused);

        // Re-selecting the element we already hold would exit and re-enter it
        // on every frame; keep it instead.
        if let (Some(current), Some(candidate)) = (&current, &candidate) {
            if same_element(current, candidate) {
                return (self, FocusTransition::default());
            }
        }

        let mut transition = FocusTransition::default();
        if let Some(current) = current {
            current.on_pointer_exit();
            transition.exited = Some(current.id().to_string());
        }

        let next = match candidate {
            Some(element) => {
                element.on_pointer_enter();
                transition.entered = Some(element.id().to_string());
                FocusState::FocusedOn(Arc::downgrade(&element))
            }
            None => FocusState::NoFocus,
        };

        (next, transition)
    }

    /// Drops focus, firing the exit that is due. Stale elements are judged
    /// as in [`FocusState::advance`] and get no exit.
    pub fn release(self, elements: &[Arc<dyn InteractiveElement>]) -> (FocusState, FocusTransition) {
        let current = match &self {
            FocusState::NoFocus => None,
            FocusState::FocusedOn(weak) => live_member(weak, elements),
        };

        let mut transition = FocusTransition::default();
        if let Some(element) = current {
            element.on_pointer_exit();
            transition.exited = Some(element.id().to_string());
        }
        (FocusState::NoFocus, transition)
    }
}

impl fmt::Debug for FocusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusState::NoFocus => f.write_str("NoFocus"),
            FocusState::FocusedOn(weak) => match weak.upgrade() {
                Some(element) => write!(f, "FocusedOn({})", element.id()),
                None => f.write_str("FocusedOn(<dropped>)"),
            },
        }
    }
}

fn live_member(
    weak: &Weak<dyn InteractiveElement>,
    elements: &[Arc<dyn InteractiveElement>],
) -> Option<Arc<dyn InteractiveElement>> {
    let element = weak.upgrade()?;
    elements
        .iter()
        .any(|candidate| same_element(candidate, &element))
        .then_some(element)
}
