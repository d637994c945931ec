//! Dwell-to-select buttons.
//!
//! Resting the pointer on a [`DwellButton`] for the configured dwell time
//! selects it. Leaving early cancels the pending selection.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, RwLock,
};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::geometry::Rect;
use super::view::InteractiveElement;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementAction {
    SpeakPhrase(i64),
    OpenCategory(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub element_id: String,
    pub action: ElementAction,
}

pub struct DwellButton {
    id: String,
    action: ElementAction,
    bounds: RwLock<Rect>,
    enabled: AtomicBool,
    visible: AtomicBool,
    dwell: Duration,
    selections: mpsc::UnboundedSender<Selection>,
    pending: Mutex<Option<CancellationToken>>,
}

impl DwellButton {
    pub fn new(
        id: impl Into<String>,
        action: ElementAction,
        bounds: Rect,
        dwell: Duration,
        selections: mpsc::UnboundedSender<Selection>,
    ) -> Self {
        Self {
            id: id.into(),
            action,
            bounds: RwLock::new(bounds),
            enabled: AtomicBool::new(true),
            visible: AtomicBool::new(true),
            dwell,
            selections,
            pending: Mutex::new(None),
        }
    }

    pub fn action(&self) -> &ElementAction {
        &self.action
    }

    pub fn set_bounds(&self, bounds: Rect) {
        let mut guard = match self.bounds.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = bounds;
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn is_dwelling(&self) -> bool {
        self.lock_pending()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl InteractiveElement for DwellButton {
    fn id(&self) -> &str {
        &self.id
    }

    fn bounds(&self) -> Rect {
        match self.bounds.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    fn on_pointer_enter(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log_warn!("no async runtime, dwell on {} ignored", self.id);
            return;
        };

        let token = CancellationToken::new();
        if let Some(previous) = self.lock_pending().replace(token.clone()) {
            previous.cancel();
        }

        let dwell = self.dwell;
        let selection = Selection {
            element_id: self.id.clone(),
            action: self.action.clone(),
        };
        let selections = self.selections.clone();

        runtime.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(dwell) => {
                    // Exit may race the timer; the token decides.
                    if token.is_cancelled() {
                        return;
                    }
                    token.cancel();
                    log_info!("dwell completed on {}", selection.element_id);
                    if selections.send(selection).is_err() {
                        log_warn!("selection receiver dropped");
                    }
                }
                _ = token.cancelled() => {}
            }
        });
    }

    fn on_pointer_exit(&self) {
        if let Some(token) = self.lock_pending().take() {
            token.cancel();
        }
    }
}

impl Drop for DwellButton {
    // A button torn down by a relayout gets no exit callback, so its pending
    // dwell must not outlive it.
    fn drop(&mut self) {
        if let Some(token) = self.lock_pending().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DWELL: Duration = Duration::from_millis(1000);

    fn button() -> (DwellButton, mpsc::UnboundedReceiver<Selection>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let button = DwellButton::new(
            "phrase-1",
            ElementAction::SpeakPhrase(1),
            Rect::from_origin_size(0.0, 0.0, 100.0, 100.0),
            DWELL,
            tx,
        );
        (button, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_button_never_selects() {
        let (button, mut rx) = button();
        button.on_pointer_enter();
        tokio::time::sleep(DWELL / 2).await;

        drop(button);
        tokio::time::sleep(DWELL * 2).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn selects_after_full_dwell() {
        let (button, mut rx) = button();
        button.on_pointer_enter();
        assert!(button.is_dwelling());

        tokio::time::sleep(DWELL + Duration::from_millis(10)).await;
        let selection = rx.try_recv().expect("selection");
        assert_eq!(selection.action, ElementAction::SpeakPhrase(1));
        assert_eq!(selection.element_id, "phrase-1");
        assert!(!button.is_dwelling());

        // Staying on the button does not select again.
        tokio::time::sleep(DWELL * 3).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn early_exit_cancels_selection() {
        let (button, mut rx) = button();
        button.on_pointer_enter();
        tokio::time::sleep(DWELL / 2).await;
        button.on_pointer_exit();
        assert!(!button.is_dwelling());

        tokio::time::sleep(DWELL * 2).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn reentering_restarts_the_timer() {
        let (button, mut rx) = button();
        button.on_pointer_enter();
        tokio::time::sleep(DWELL / 2).await;
        button.on_pointer_exit();
        button.on_pointer_enter();

        tokio::time::sleep(DWELL * 3 / 4).await;
        assert!(rx.try_recv().is_err());
        tokio::time::sleep(DWELL / 2).await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn enter_without_runtime_is_ignored() {
        let (button, mut rx) = button();
        button.on_pointer_enter();
        assert!(!button.is_dwelling());
        assert!(rx.try_recv().is_err());
    }
}
