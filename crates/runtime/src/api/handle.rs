//! Cloneable façade over a running engine.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use arbiter_core::Tick;

use crate::api::{Result, RuntimeError};
use crate::engine::ArbitrationEngine;
use crate::events::{Event, EventBus, Topic};

/// Handle shared by every caller of the engine.
///
/// The hooks are synchronous and called straight on [`ArbitrationEngine`];
/// the handle adds tick distribution to the sweeper and event subscription.
#[derive(Clone)]
pub struct RuntimeHandle {
    engine: Arc<ArbitrationEngine>,
    ticks: Arc<watch::Sender<Tick>>,
}

impl RuntimeHandle {
    pub(crate) fn new(engine: Arc<ArbitrationEngine>, ticks: Arc<watch::Sender<Tick>>) -> Self {
        Self { engine, ticks }
    }

    pub fn engine(&self) -> &Arc<ArbitrationEngine> {
        &self.engine
    }

    pub fn events(&self) -> &EventBus {
        self.engine.events()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.engine.events().subscribe(topic)
    }

    /// Advances the engine clock and wakes the sweeper.
    pub fn advance_tick(&self, delta: Tick) -> Result<Tick> {
        let now = self.engine.advance_tick(delta);
        self.ticks
            .send(now)
            .map_err(|_| RuntimeError::SweeperStopped)?;
        Ok(now)
    }

    pub fn current_tick(&self) -> Tick {
        self.engine.current_tick()
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("tick", &self.engine.current_tick())
            .finish()
    }
}
