//! Resource arbitration rules shared by the runtime and content loaders.
//!
//! `arbiter-core` decides whether a costed action can be paid and from where:
//! which pool funds it under the active [`UnificationMode`], whether the cost
//! is rerouted to an alternate currency through a staged reservation, how
//! equipment discounts compose, and whether a cooldown blocks the action.
//! Everything here is synchronous; per-actor state lives in concurrent maps so
//! the simulation thread, request handlers and the sweeper can share it.
//!
//! Host systems plug in through traits: [`ResourcePool`], [`AlternateLedger`],
//! [`FallbackStore`], [`EquipmentView`], [`ActorDirectory`], [`Notifier`] and
//! [`CategoryMapper`].
pub mod action;
pub mod actor;
pub mod alternate;
pub mod bridge;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod discount;
pub mod equipment;
pub mod error;
pub mod gate;
pub mod pool;
pub mod reservation;
pub mod school;

pub use action::{ActionMetadata, CastRequest, SpellRarity};
pub use actor::{ActorDirectory, ActorId, CallerSystem, NoUnrestrictedActors};
pub use alternate::{
    AlternateCostFormula, AlternateCurrencyAdapter, AlternateLedger, FallbackStore, SourceOrder,
};
pub use bridge::{BridgeArbiter, ModeFlags, UnificationMode};
pub use clock::{Clock, ManualClock, SystemClock, Tick, Timestamp};
pub use config::{ArbiterConfig, ConfigAdjustment};
pub use cooldown::{
    CategoryMapper, CooldownCategory, CooldownLedger, CooldownMirror, CooldownSync, Namespace,
    StaticCategoryMapper,
};
pub use discount::{
    DiscountFactor, DiscountPipeline, DiscountSource, EquipmentView, FlatEquipmentDiscount,
    SchoolAffinityDiscount,
};
pub use equipment::{
    EquipmentBonus, EquipmentBonusCache, EquipmentBonusSnapshot, EquipmentBonusSupplier,
};
pub use error::{ArbiterError, DenyReason, ErrorSeverity};
pub use gate::{
    CastGate, GateDecision, Notice, NoticeKind, Notifier, ShortfallAction, ShortfallPolicy,
};
pub use pool::{InMemoryPool, PoolBalance, PoolId, ResourcePool};
pub use reservation::{CostReservation, CostReservationLedger, ReservationKind};
pub use school::SpellSchool;
