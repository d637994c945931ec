use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::engine::{PointerEngine, PointerSnapshot};
use super::orientation::OrientationMonitor;
use super::tracking::{TrackingSignals, TrackingSource};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub async fn tracking_loop(
    mut engine: PointerEngine,
    mut signals: TrackingSignals,
    source: Arc<dyn TrackingSource>,
    snapshot_tx: Arc<watch::Sender<PointerSnapshot>>,
    cancel_token: CancellationToken,
) {
    let mut monitor = OrientationMonitor::new(signals.initial_rotation);

    // Gates may have been set before the loop started.
    engine.set_head_tracking_enabled(*signals.head_tracking.borrow_and_update());
    engine.set_paused(*signals.paused.borrow_and_update());
    engine.show_error(*signals.show_error.borrow_and_update());
    snapshot_tx.send_replace(engine.snapshot());

    loop {
        // Gates and layout are handled before pointer movement so a position
        // is never applied against an outdated tree or a lifted pause.
        let closed = tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                log_info!("tracking loop shutting down");
                break;
            }
            changed = signals.show_error.changed() => {
                let error = *signals.show_error.borrow_and_update();
                engine.show_error(error);
                changed.is_err()
            }
            changed = signals.head_tracking.changed() => {
                let enabled = *signals.head_tracking.borrow_and_update();
                engine.set_head_tracking_enabled(enabled);
                changed.is_err()
            }
            changed = signals.paused.changed() => {
                let paused = *signals.paused.borrow_and_update();
                engine.set_paused(paused);
                changed.is_err()
            }
            changed = signals.layout.changed() => {
                let _ = signals.layout.borrow_and_update();
                engine.on_layout_changed();
                changed.is_err()
            }
            reading = signals.rotation.recv() => match reading {
                Some(degrees) => {
                    if let Some(request) = monitor.on_display_changed(degrees) {
                        log_info!("display flipped to {}°, resetting tracking source", request.rotation.degrees());
                        if let Err(err) = source.reset(&request.tag) {
                            log_error!("tracking source reset ({}) failed: {err:?}", request.tag);
                        }
                    }
                    false
                }
                None => true,
            },
            changed = signals.pointer.changed() => {
                let latest = *signals.pointer.borrow_and_update();
                if let Some(raw) = latest {
                    engine.update_pointer(raw.x, raw.y);
                }
                changed.is_err()
            }
        };

        if closed {
            log_info!("tracking feed closed, stopping loop");
            break;
        }

        snapshot_tx.send_replace(engine.snapshot());
    }

    engine.shutdown();
    snapshot_tx.send_replace(engine.snapshot());
}
