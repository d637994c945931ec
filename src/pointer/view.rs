//! The view hierarchy as seen by the pointer engine.
//!
//! Nodes are produced by the host UI; the engine only reads geometry and
//! flags through [`InteractiveElement`] and never keeps strong references
//! past a single query.

use std::sync::Arc;

use super::geometry::Rect;

/// A UI node that can take pointer focus.
pub trait InteractiveElement: Send + Sync {
    /// Stable identifier, used for logging and snapshots.
    fn id(&self) -> &str;

    /// Current screen-space bounds. Must reflect the live layout.
    fn bounds(&self) -> Rect;

    fn is_enabled(&self) -> bool;

    fn is_visible(&self) -> bool;

    fn on_pointer_enter(&self);

    fn on_pointer_exit(&self);
}

/// One node of the live view tree.
#[derive(Clone)]
pub enum ViewNode {
    /// Pure container, traversed but never focused.
    Group(Vec<ViewNode>),
    /// Node exposing the pointer capability.
    Element(Arc<dyn InteractiveElement>),
    /// Leaf without pointer capability.
    Static,
}

impl ViewNode {
    pub fn group(children: impl IntoIterator<Item = ViewNode>) -> Self {
        ViewNode::Group(children.into_iter().collect())
    }

    pub fn element(element: Arc<dyn InteractiveElement>) -> Self {
        ViewNode::Element(element)
    }
}

/// An independently managed sub-screen with its own tree.
pub trait Panel: Send + Sync {
    fn root(&self) -> ViewNode;
}

/// Query interface over the host's view hierarchy.
pub trait ViewHierarchy: Send + Sync {
    fn root(&self) -> ViewNode;

    /// Panels in display order. Their trees are walked after the main root.
    fn panels(&self) -> Vec<Arc<dyn Panel>> {
        Vec::new()
    }
}

/// Compares two elements by allocation, ignoring vtable identity.
pub fn same_element(a: &Arc<dyn InteractiveElement>, b: &Arc<dyn InteractiveElement>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
