use std::sync::Arc;

use super::geometry::{PointerPosition, Rect};
use super::view::InteractiveElement;

/// Finds the element the pointer should focus.
///
/// An element qualifies when it is enabled, visible and the center of its
/// bounds lies inside `pointer_rect`. Testing the element center against the
/// pointer area favours elements near the middle of the pointer over ones it
/// merely grazes. The first qualifying element in traversal order wins.
pub fn find_intersecting(
    pointer_rect: Rect,
    elements: &[Arc<dyn InteractiveElement>],
    paused: bool,
) -> Option<Arc<dyn InteractiveElement>> {
    if paused {
        return None;
    }

    elements
        .iter()
        .find(|element| {
            element.is_enabled()
                && element.is_visible()
                && pointer_rect.contains(element.bounds().center())
        })
        .cloned()
}

/// Whether an already focused element should keep focus at `pointer`.
pub fn still_over(element: &dyn InteractiveElement, pointer: PointerPosition) -> bool {
    element.bounds().contains(pointer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::testing::{AsNode, FakeElement};

    fn pointer_at(x: f32, y: f32) -> Rect {
        Rect::centered_on(PointerPosition { x, y }, 40.0)
    }

    #[test]
    fn returns_element_whose_center_is_under_pointer() {
        let a = FakeElement::new("a", Rect::from_origin_size(0.0, 0.0, 100.0, 100.0));
        let b = FakeElement::new("b", Rect::from_origin_size(200.0, 0.0, 100.0, 100.0));
        let elements = vec![a.dyn_ref(), b.dyn_ref()];

        let hit = find_intersecting(pointer_at(250.0, 50.0), &elements, false).unwrap();
        assert_eq!(hit.id(), "b");
    }

    #[test]
    fn overlap_without_center_is_not_a_hit() {
        // Pointer sits inside `a` but far from its center.
        let a = FakeElement::new("a", Rect::from_origin_size(0.0, 0.0, 400.0, 400.0));
        let elements = vec![a.dyn_ref()];
        assert!(find_intersecting(pointer_at(10.0, 10.0), &elements, false).is_none());
    }

    #[test]
    fn first_in_order_wins_regardless_of_area() {
        let full = FakeElement::new("full", Rect::from_origin_size(0.0, 0.0, 800.0, 600.0));
        let small = FakeElement::new("small", Rect::from_origin_size(390.0, 290.0, 20.0, 20.0));
        let elements = vec![full.dyn_ref(), small.dyn_ref()];

        let hit = find_intersecting(pointer_at(400.0, 300.0), &elements, false).unwrap();
        assert_eq!(hit.id(), "full");
    }

    #[test]
    fn later_element_wins_when_first_center_is_outside() {
        let full = FakeElement::new("full", Rect::from_origin_size(0.0, 0.0, 800.0, 600.0));
        let small = FakeElement::new("small", Rect::from_origin_size(90.0, 90.0, 20.0, 20.0));
        let elements = vec![full.dyn_ref(), small.dyn_ref()];

        let hit = find_intersecting(pointer_at(100.0, 100.0), &elements, false).unwrap();
        assert_eq!(hit.id(), "small");
    }

    #[test]
    fn skips_disabled_and_hidden_elements() {
        let disabled = FakeElement::new("disabled", Rect::from_origin_size(0.0, 0.0, 20.0, 20.0));
        let hidden = FakeElement::new("hidden", Rect::from_origin_size(0.0, 0.0, 20.0, 20.0));
        let shown = FakeElement::new("shown", Rect::from_origin_size(0.0, 0.0, 20.0, 20.0));
        disabled.set_enabled(false);
        hidden.set_visible(false);
        let elements = vec![disabled.dyn_ref(), hidden.dyn_ref(), shown.dyn_ref()];

        let hit = find_intersecting(pointer_at(10.0, 10.0), &elements, false).unwrap();
        assert_eq!(hit.id(), "shown");
    }

    #[test]
    fn paused_gate_returns_none() {
        let a = FakeElement::new("a", Rect::from_origin_size(0.0, 0.0, 20.0, 20.0));
        assert!(find_intersecting(pointer_at(10.0, 10.0), &[a.dyn_ref()], true).is_none());
    }

    #[test]
    fn keep_check_uses_pointer_center_inside_element() {
        let a = FakeElement::new("a", Rect::from_origin_size(0.0, 0.0, 400.0, 400.0));
        assert!(still_over(a.as_ref(), PointerPosition { x: 10.0, y: 10.0 }));
        assert!(!still_over(a.as_ref(), PointerPosition { x: 401.0, y: 10.0 }));
    }
}
