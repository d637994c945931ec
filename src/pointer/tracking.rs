//! Boundary with the head-tracking source.
//!
//! State signals travel over `watch` channels: a slow consumer only ever
//! sees the newest value, so stale pointer positions are dropped instead of
//! queued. Display rotations are discrete events and are queued in order,
//! since skipping an intermediate quarter turn would look like a flip.

use anyhow::Result;
use tokio::sync::{mpsc, watch};

use super::orientation::Rotation;

/// The external component producing head-derived coordinates.
pub trait TrackingSource: Send + Sync {
    /// Recreates the source for a new display orientation. `tag` is unique
    /// to the target rotation.
    fn reset(&self, tag: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPointer {
    pub x: f32,
    pub y: f32,
}

/// Receiving half, consumed by the tracking loop.
pub struct TrackingSignals {
    pub(crate) pointer: watch::Receiver<Option<RawPointer>>,
    pub(crate) show_error: watch::Receiver<bool>,
    pub(crate) initial_rotation: Rotation,
    pub(crate) rotation: mpsc::UnboundedReceiver<i32>,
    pub(crate) layout: watch::Receiver<u64>,
    pub(crate) paused: watch::Receiver<bool>,
    pub(crate) head_tracking: watch::Receiver<bool>,
}

/// Sending half, held by the tracking source and the host UI.
pub struct TrackingFeed {
    pointer: watch::Sender<Option<RawPointer>>,
    show_error: watch::Sender<bool>,
    rotation: mpsc::UnboundedSender<i32>,
    layout: watch::Sender<u64>,
    paused: watch::Sender<bool>,
    head_tracking: watch::Sender<bool>,
}

pub fn tracking_channel(initial: Rotation, head_tracking_enabled: bool) -> (TrackingFeed, TrackingSignals) {
    let (pointer_tx, pointer_rx) = watch::channel(None);
    let (error_tx, error_rx) = watch::channel(false);
    let (rotation_tx, rotation_rx) = mpsc::unbounded_channel();
    let (layout_tx, layout_rx) = watch::channel(0);
    let (paused_tx, paused_rx) = watch::channel(false);
    let (head_tx, head_rx) = watch::channel(head_tracking_enabled);

    (
        TrackingFeed {
            pointer: pointer_tx,
            show_error: error_tx,
            rotation: rotation_tx,
            layout: layout_tx,
            paused: paused_tx,
            head_tracking: head_tx,
        },
        TrackingSignals {
            pointer: pointer_rx,
            show_error: error_rx,
            initial_rotation: initial,
            rotation: rotation_rx,
            layout: layout_rx,
            paused: paused_rx,
            head_tracking: head_rx,
        },
    )
}

impl TrackingFeed {
    pub fn push_pointer(&self, x: f32, y: f32) {
        self.pointer.send_replace(Some(RawPointer { x, y }));
    }

    pub fn show_error(&self, error: bool) {
        self.show_error.send_if_modified(|current| {
            let changed = *current != error;
            *current = error;
            changed
        });
    }

    /// Raw display rotation in degrees. Every reading is delivered, in
    /// order, even repeated ones.
    pub fn rotate(&self, degrees: i32) {
        // Only fails once the loop is gone.
        let _ = self.rotation.send(degrees);
    }

    pub fn layout_changed(&self) {
        self.layout.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.send_replace(paused);
    }

    pub fn set_head_tracking_enabled(&self, enabled: bool) {
        self.head_tracking.send_replace(enabled);
    }
}
