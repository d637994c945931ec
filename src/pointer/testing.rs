//! Test doubles for the view hierarchy.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use super::geometry::Rect;
use super::view::{InteractiveElement, Panel, ViewHierarchy, ViewNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Enter(String),
    Exit(String),
}

pub type CallbackLog = Arc<Mutex<Vec<Callback>>>;

pub struct FakeElement {
    id: String,
    bounds: Mutex<Rect>,
    enabled: AtomicBool,
    visible: AtomicBool,
    enters: AtomicUsize,
    exits: AtomicUsize,
    log: Option<CallbackLog>,
}

impl FakeElement {
    pub fn new(id: &str, bounds: Rect) -> Arc<Self> {
        Self::build(id, bounds, None)
    }

    pub fn logged(id: &str, bounds: Rect, log: &CallbackLog) -> Arc<Self> {
        Self::build(id, bounds, Some(log.clone()))
    }

    fn build(id: &str, bounds: Rect, log: Option<CallbackLog>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            bounds: Mutex::new(bounds),
            enabled: AtomicBool::new(true),
            visible: AtomicBool::new(true),
            enters: AtomicUsize::new(0),
            exits: AtomicUsize::new(0),
            log,
        })
    }

    pub fn set_bounds(&self, bounds: Rect) {
        *self.bounds.lock().unwrap() = bounds;
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn enters(&self) -> usize {
        self.enters.load(Ordering::SeqCst)
    }

    pub fn exits(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

impl InteractiveElement for FakeElement {
    fn id(&self) -> &str {
        &self.id
    }

    fn bounds(&self) -> Rect {
        *self.bounds.lock().unwrap()
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn on_pointer_enter(&self) {
        self.enters.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().unwrap().push(Callback::Enter(self.id.clone()));
        }
    }

    fn on_pointer_exit(&self) {
        self.exits.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().unwrap().push(Callback::Exit(self.id.clone()));
        }
    }
}

pub trait AsNode {
    fn node(&self) -> ViewNode;
    fn dyn_ref(&self) -> Arc<dyn InteractiveElement>;
}

impl AsNode for Arc<FakeElement> {
    fn node(&self) -> ViewNode {
        ViewNode::Element(self.dyn_ref())
    }

    fn dyn_ref(&self) -> Arc<dyn InteractiveElement> {
        self.clone()
    }
}

pub struct FakePanel(pub ViewNode);

impl Panel for FakePanel {
    fn root(&self) -> ViewNode {
        self.0.clone()
    }
}

pub struct FakeHierarchy {
    root: Mutex<ViewNode>,
    panels: Mutex<Vec<Arc<dyn Panel>>>,
}

impl FakeHierarchy {
    pub fn new(root: ViewNode) -> Self {
        Self {
            root: Mutex::new(root),
            panels: Mutex::new(Vec::new()),
        }
    }

    pub fn with_panels(self, panels: Vec<Arc<dyn Panel>>) -> Self {
        *self.panels.lock().unwrap() = panels;
        self
    }

    pub fn set_root(&self, root: ViewNode) {
        *self.root.lock().unwrap() = root;
    }
}

impl ViewHierarchy for FakeHierarchy {
    fn root(&self) -> ViewNode {
        self.root.lock().unwrap().clone()
    }

    fn panels(&self) -> Vec<Arc<dyn Panel>> {
        self.panels.lock().unwrap().clone()
    }
}
