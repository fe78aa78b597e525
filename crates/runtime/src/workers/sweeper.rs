//! Tick-driven sweeper for expired reservations and finished cooldowns.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use arbiter_core::Tick;

use crate::engine::ArbitrationEngine;

/// Sweeps the engine every `interval` ticks.
///
/// The worker wakes on tick changes only; it never sleeps on wall-clock
/// time. It stops when the shutdown signal fires or the tick sender is
/// dropped.
pub struct SweeperWorker {
    engine: Arc<ArbitrationEngine>,
    ticks: watch::Receiver<Tick>,
    shutdown: oneshot::Receiver<()>,
    interval: Tick,
    last_sweep: Tick,
}

impl SweeperWorker {
    pub fn new(
        engine: Arc<ArbitrationEngine>,
        ticks: watch::Receiver<Tick>,
        shutdown: oneshot::Receiver<()>,
        interval: Tick,
    ) -> Self {
        let last_sweep = *ticks.borrow();
        Self {
            engine,
            ticks,
            shutdown,
            interval: interval.max(1),
            last_sweep,
        }
    }

    pub async fn run(mut self) {
        info!(interval = self.interval, "sweeper started");
        loop {
            tokio::select! {
                _ = &mut self.shutdown => break,
                changed = self.ticks.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let now = *self.ticks.borrow_and_update();
                    self.on_tick(now);
                }
            }
        }
        info!("sweeper stopped");
    }

    fn on_tick(&mut self, now: Tick) {
        if now.saturating_sub(self.last_sweep) < self.interval {
            return;
        }
        let report = self.engine.sweep();
        debug!(now, reservations = report.reservations, cooldowns = report.cooldowns, "sweep finished");
        self.last_sweep = now;
    }
}
