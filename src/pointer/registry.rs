use std::sync::{Arc, Weak};

use super::view::{InteractiveElement, ViewHierarchy, ViewNode};

/// Flattened, lazily rebuilt list of focusable elements.
///
/// Holds weak references only; the view hierarchy owns the elements.
#[derive(Default)]
pub struct ElementRegistry {
    cache: Option<Vec<Weak<dyn InteractiveElement>>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the cached flattening. Call on every layout change.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Returns the live elements in traversal order, rebuilding if needed.
    ///
    /// Entries whose element has been dropped since the last rebuild are
    /// skipped.
    pub fn elements(&mut self, hierarchy: &dyn ViewHierarchy) -> Vec<Arc<dyn InteractiveElement>> {
        let cache = self.cache.get_or_insert_with(|| collect_all(hierarchy));
        cache.iter().filter_map(Weak::upgrade).collect()
    }
}

fn collect_all(hierarchy: &dyn ViewHierarchy) -> Vec<Weak<dyn InteractiveElement>> {
    let mut out = Vec::new();
    collect(&hierarchy.root(), &mut out);
    for panel in hierarchy.panels() {
        collect(&panel.root(), &mut out);
    }
    out
}

fn collect(node: &ViewNode, out: &mut Vec<Weak<dyn InteractiveElement>>) {
    match node {
        ViewNode::Element(element) => out.push(Arc::downgrade(element)),
        ViewNode::Group(children) => {
            for child in children {
                collect(child, out);
            }
        }
        ViewNode::Static => {}
    }
}
