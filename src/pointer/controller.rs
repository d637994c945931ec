use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::engine::{PointerEngine, PointerSnapshot};
use super::loop_worker::tracking_loop;
use super::tracking::{TrackingSignals, TrackingSource};

/// Owns the tracking loop task for one hosting screen.
pub struct TrackingController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    snapshot_tx: Arc<watch::Sender<PointerSnapshot>>,
}

impl TrackingController {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(PointerSnapshot::default());
        Self {
            handle: None,
            cancel_token: None,
            snapshot_tx: Arc::new(snapshot_tx),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Latest cursor state, updated after every processed signal.
    pub fn subscribe(&self) -> watch::Receiver<PointerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn start(
        &mut self,
        engine: PointerEngine,
        signals: TrackingSignals,
        source: Arc<dyn TrackingSource>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("tracking already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(tracking_loop(
            engine,
            signals,
            source,
            self.snapshot_tx.clone(),
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("tracking loop started");
        Ok(())
    }

    /// Unregisters from the tracking source and waits for the loop to exit.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("tracking loop task failed to join")
        } else {
            Ok(())
        }
    }
}

impl Default for TrackingController {
    fn default() -> Self {
        Self::new()
    }
}
