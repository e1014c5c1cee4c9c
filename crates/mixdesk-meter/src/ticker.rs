//! Fixed-interval meter task.

use mixdesk_session::MixerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::source::{MeterFrame, MeterSource};

/// Runs a [`MeterSource`] on a timer against the latest published state.
///
/// The ticker holds only a state *receiver*, so it cannot change the
/// console. Its task is aborted by [`MeterTicker::stop`] or on drop.
pub struct MeterTicker {
    handle: JoinHandle<()>,
    frames: watch::Receiver<Arc<MeterFrame>>,
}

impl MeterTicker {
    /// Start ticking every `interval`. Must be called inside a tokio runtime.
    pub fn spawn<S>(
        mut state: watch::Receiver<Arc<MixerState>>,
        mut source: S,
        interval: Duration,
    ) -> Self
    where
        S: MeterSource + 'static,
    {
        let (tx, frames) = watch::channel(Arc::new(MeterFrame::default()));
        let interval = interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick = 0u64;
            loop {
                timer.tick().await;
                if state.has_changed().is_err() {
                    debug!("State publisher gone, meter ticker exiting");
                    break;
                }
                let current = Arc::clone(&state.borrow_and_update());
                tick += 1;
                let readings = source.read(&current);
                tx.send_replace(Arc::new(MeterFrame { tick, readings }));
            }
        });
        info!(interval_ms = interval.as_millis() as u64, "Meter ticker started");
        Self { handle, frames }
    }

    /// Receiver for published frames.
    pub fn frames(&self) -> watch::Receiver<Arc<MeterFrame>> {
        self.frames.clone()
    }

    /// The most recent frame.
    pub fn latest(&self) -> Arc<MeterFrame> {
        Arc::clone(&self.frames.borrow())
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the timer. Equivalent to dropping the ticker.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for MeterTicker {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Meter ticker stopped");
    }
}
