//! Shared fixtures for runtime integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use arbiter_core::{
    ActorDirectory, ActorId, ArbiterConfig, CallerSystem, CooldownCategory, InMemoryPool,
    ManualClock, ResourcePool, StaticCategoryMapper,
};
use runtime::{
    ArbitrationEngine, EquipmentTable, InMemoryFallbackStore, InMemoryLedger, RuntimeBuilder,
};

pub const PLAYER: ActorId = ActorId(7);
pub const ADMIN: ActorId = ActorId(99);

pub struct Admins;

impl ActorDirectory for Admins {
    fn is_unrestricted(&self, actor: ActorId) -> bool {
        actor == ADMIN
    }
}

/// Collaborators kept by the test so balances can be inspected.
pub struct Fixture {
    pub pool_a: Arc<InMemoryPool>,
    pub pool_b: Arc<InMemoryPool>,
    pub ledger: Arc<InMemoryLedger>,
    pub store: Arc<InMemoryFallbackStore>,
    pub equipment: Arc<EquipmentTable>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            pool_a: Arc::new(InMemoryPool::new(100.0)),
            pool_b: Arc::new(InMemoryPool::new(100.0)),
            ledger: Arc::new(InMemoryLedger::new()),
            store: Arc::new(InMemoryFallbackStore::new(20.0)),
            equipment: Arc::new(EquipmentTable::new()),
            clock: Arc::new(ManualClock::new(0)),
        };
        fixture.pool_a.insert(PLAYER, 100.0, 100.0);
        fixture.pool_b.insert(PLAYER, 100.0, 100.0);
        fixture
    }

    pub fn builder(&self, config: ArbiterConfig) -> RuntimeBuilder {
        self.builder_without_b(config).pool_b(self.pool_b.clone())
    }

    pub fn builder_without_b(&self, config: ArbiterConfig) -> RuntimeBuilder {
        RuntimeBuilder::default()
            .arbiter_config(config)
            .pool_a(self.pool_a.clone())
            .alternate_ledger(self.ledger.clone())
            .fallback_store(self.store.clone())
            .equipment(self.equipment.clone())
            .clock(self.clock.clone())
            .actor_directory(Arc::new(Admins))
            .category_mapper(CallerSystem::A, Arc::new(movement_table("sys_a:glyph_blink")))
            .category_mapper(CallerSystem::B, Arc::new(movement_table("sys_b:blink")))
    }

    pub fn engine(&self, config: ArbiterConfig) -> ArbitrationEngine {
        self.builder(config).build_engine().unwrap()
    }

    pub fn balances(&self) -> (f64, f64) {
        (self.pool_a.get(PLAYER), self.pool_b.get(PLAYER))
    }
}

pub fn movement_table(action_id: &str) -> StaticCategoryMapper {
    [(action_id, CooldownCategory::Movement)].into_iter().collect()
}

pub fn config_with_mode(mode: &str) -> ArbiterConfig {
    ArbiterConfig {
        mode: mode.to_owned(),
        ..ArbiterConfig::default()
    }
}
