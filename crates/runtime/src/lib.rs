//! Runtime orchestration for the resource arbitration engine.
//!
//! This crate wires the synchronous arbitration rules of `arbiter-core` into
//! an embeddable engine with explicit hook entry points, a topic event bus
//! and a tick-driven sweeper. Hosts embed [`Runtime`] (or just an
//! [`ArbitrationEngine`]) and call its hooks from their own code paths.
//!
//! Modules are organized by responsibility:
//! - [`engine`] hosts the cost-calculation, authorization and resolution hooks
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`hooks`] provides the post-resolution hook system
//! - [`memory`] offers in-process collaborators for hosts and tests
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod engine;
pub mod events;
pub mod hooks;
pub mod logging;
pub mod memory;
pub mod notify;
pub mod runtime;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use engine::{ArbitrationEngine, CostQuote, EngineParts, Funding, SweepReport};
pub use events::{CooldownEvent, Event, EventBus, LedgerEvent, ResolutionOutcome, Topic};
pub use hooks::{CooldownHook, HookContext, HookRegistry, ResolutionHook, ResolutionJournalHook};
pub use logging::{LoggingConfig, init_logging};
pub use memory::{EquipmentTable, InMemoryFallbackStore, InMemoryLedger};
pub use notify::BusNotifier;
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
