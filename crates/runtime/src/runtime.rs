//! High-level runtime orchestrator.
//!
//! The runtime assembles the engine from registered collaborators, owns the
//! sweeper worker, and exposes a builder-based API for hosts.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::info;

use arbiter_content::{CategoryTableLoader, ContentFactory};
use arbiter_core::{
    ActorDirectory, AlternateCurrencyAdapter, AlternateLedger, ArbiterConfig, BridgeArbiter,
    CallerSystem, CategoryMapper, Clock, CooldownLedger, CostReservationLedger, DiscountPipeline,
    DiscountSource, EquipmentBonusCache, EquipmentBonusSupplier, EquipmentView, FallbackStore,
    NoUnrestrictedActors, Notifier, ResourcePool, SystemClock,
};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::engine::{ArbitrationEngine, EngineParts};
use crate::events::{Event, EventBus, Topic};
use crate::hooks::{HookRegistry, ResolutionHook};
use crate::memory::EquipmentTable;
use crate::notify::BusNotifier;
use crate::workers::SweeperWorker;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub arbiter: ArbiterConfig,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            arbiter: ArbiterConfig::default(),
            event_buffer_size: 100,
        }
    }
}

/// Main runtime: the engine plus its sweeper.
///
/// [`RuntimeHandle`] provides a cloneable façade for callers.
pub struct Runtime {
    handle: RuntimeHandle,
    shutdown: oneshot::Sender<()>,
    sweeper_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn engine(&self) -> &Arc<ArbitrationEngine> {
        self.handle.engine()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Stops the sweeper and waits for it.
    pub async fn shutdown(self) -> Result<()> {
        // The sweeper may already be gone; joining reports why.
        let _ = self.shutdown.send(());
        self.sweeper_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;
        Ok(())
    }
}

/// Builder for [`Runtime`] with plugin-style registration of collaborators.
///
/// Only pool A is required. Everything else has a neutral default: no
/// unrestricted actors, nothing worn, no alternate ledger or fallback store,
/// the embedded category tables, bus notices and the default hooks.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    pool_a: Option<Arc<dyn ResourcePool>>,
    pool_b: Option<Arc<dyn ResourcePool>>,
    directory: Option<Arc<dyn ActorDirectory>>,
    equipment: Option<Arc<dyn EquipmentView>>,
    bonus_supplier: Option<Arc<dyn EquipmentBonusSupplier>>,
    alternate_ledger: Option<Arc<dyn AlternateLedger>>,
    fallback_store: Option<Arc<dyn FallbackStore>>,
    mappers: HashMap<CallerSystem, Arc<dyn CategoryMapper>>,
    discount_sources: Vec<Arc<dyn DiscountSource>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    hooks: Option<HookRegistry>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            pool_a: None,
            pool_b: None,
            directory: None,
            equipment: None,
            bonus_supplier: None,
            alternate_ledger: None,
            fallback_store: None,
            mappers: HashMap::new(),
            discount_sources: Vec::new(),
            notifier: None,
            clock: None,
            hooks: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override arbitration configuration only
    pub fn arbiter_config(mut self, config: ArbiterConfig) -> Self {
        self.config.arbiter = config;
        self
    }

    /// Loads configuration and category tables from a data directory.
    ///
    /// Mappers registered afterwards still override the loaded tables.
    pub fn content(mut self, factory: &ContentFactory) -> Result<Self> {
        self.config.arbiter = factory.load_config()?;
        for system in [CallerSystem::A, CallerSystem::B] {
            let table = factory.load_categories(system)?;
            self.mappers.insert(system, Arc::new(table));
        }
        Ok(self)
    }

    /// Set the required pool A (native pool of system A)
    pub fn pool_a(mut self, pool: Arc<dyn ResourcePool>) -> Self {
        self.pool_a = Some(pool);
        self
    }

    /// Set pool B; without it the mode degrades to pool A only
    pub fn pool_b(mut self, pool: Arc<dyn ResourcePool>) -> Self {
        self.pool_b = Some(pool);
        self
    }

    pub fn actor_directory(mut self, directory: Arc<dyn ActorDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn equipment(mut self, equipment: Arc<dyn EquipmentView>) -> Self {
        self.equipment = Some(equipment);
        self
    }

    pub fn equipment_bonus_supplier(mut self, supplier: Arc<dyn EquipmentBonusSupplier>) -> Self {
        self.bonus_supplier = Some(supplier);
        self
    }

    pub fn alternate_ledger(mut self, ledger: Arc<dyn AlternateLedger>) -> Self {
        self.alternate_ledger = Some(ledger);
        self
    }

    pub fn fallback_store(mut self, store: Arc<dyn FallbackStore>) -> Self {
        self.fallback_store = Some(store);
        self
    }

    /// Register the category table of one calling system
    pub fn category_mapper(mut self, system: CallerSystem, mapper: Arc<dyn CategoryMapper>) -> Self {
        self.mappers.insert(system, mapper);
        self
    }

    /// Add a discount source after the standard ones
    pub fn discount_source(mut self, source: Arc<dyn DiscountSource>) -> Self {
        self.discount_sources.push(source);
        self
    }

    /// Replace bus notices with a custom notifier
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replace the wall clock used for reservation and cache TTLs
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set custom resolution hooks, replacing the defaults.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Adds hooks to the default hook set.
    ///
    /// Note: this discards hooks set earlier with `with_hooks()`.
    pub fn add_hooks(mut self, hooks: Vec<Arc<dyn ResolutionHook>>) -> Self {
        self.hooks = Some(HookRegistry::with_defaults(hooks));
        self
    }

    /// Assembles the engine without starting the sweeper.
    pub fn build_engine(self) -> Result<ArbitrationEngine> {
        let (engine, _) = self.assemble()?;
        Ok(engine)
    }

    fn assemble(self) -> Result<(ArbitrationEngine, RuntimeConfig)> {
        let mut runtime_config = self.config;
        runtime_config.arbiter.sanitize();
        let config = runtime_config.arbiter.clone();

        let pool_a = self.pool_a.ok_or(RuntimeError::MissingPool)?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let events = EventBus::with_capacity(runtime_config.event_buffer_size);

        let mut equipment_cache =
            EquipmentBonusCache::new(config.equipment_cache_ttl_ms, Arc::clone(&clock));
        if let Some(supplier) = self.bonus_supplier {
            equipment_cache = equipment_cache.with_supplier(supplier);
        }
        let equipment_cache = Arc::new(equipment_cache);

        let bridge = Arc::new(
            BridgeArbiter::new(&config, pool_a, self.pool_b)
                .with_equipment_cache(Arc::clone(&equipment_cache)),
        );
        let reservations = Arc::new(CostReservationLedger::new(
            config.reservation_ttl_ms(),
            Arc::clone(&clock),
        ));
        let alternate = Arc::new(AlternateCurrencyAdapter::new(
            &config,
            self.alternate_ledger,
            self.fallback_store,
        ));

        let equipment = self
            .equipment
            .unwrap_or_else(|| Arc::new(EquipmentTable::new()) as Arc<dyn EquipmentView>);
        let discounts = self
            .discount_sources
            .into_iter()
            .fold(DiscountPipeline::from_config(&config, equipment), |p, s| {
                p.with_source(s)
            });

        let mut mappers = self.mappers;
        for system in [CallerSystem::A, CallerSystem::B] {
            if !mappers.contains_key(&system) {
                let table = CategoryTableLoader::embedded(system)?;
                mappers.insert(system, Arc::new(table));
            }
        }

        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(BusNotifier::new(events.clone())) as Arc<dyn Notifier>);

        let engine = ArbitrationEngine::new(EngineParts {
            directory: self
                .directory
                .unwrap_or_else(|| Arc::new(NoUnrestrictedActors) as Arc<dyn ActorDirectory>),
            bridge,
            reservations,
            alternate,
            discounts,
            cooldowns: Arc::new(CooldownLedger::new(&config)),
            mappers,
            equipment_cache,
            notifier,
            hooks: self.hooks.unwrap_or_default(),
            events,
            config,
        });
        info!(?engine, "arbitration engine assembled");
        Ok((engine, runtime_config))
    }

    /// Build the runtime and start the sweeper.
    pub async fn build(self) -> Result<Runtime> {
        let (engine, config) = self.assemble()?;
        let engine = Arc::new(engine);

        let (tick_tx, tick_rx) = watch::channel(engine.current_tick());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let sweeper = SweeperWorker::new(
            Arc::clone(&engine),
            tick_rx,
            shutdown_rx,
            config.arbiter.sweep_interval_ticks,
        );
        let sweeper_handle = tokio::spawn(async move {
            sweeper.run().await;
        });

        Ok(Runtime {
            handle: RuntimeHandle::new(engine, Arc::new(tick_tx)),
            shutdown: shutdown_tx,
            sweeper_handle,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
