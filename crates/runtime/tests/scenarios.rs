//! End-to-end arbitration through the engine hooks.

mod common;

use arbiter_core::{
    ActionMetadata, AlternateLedger, ArbiterConfig, CallerSystem, CastRequest, DenyReason,
    FallbackStore, GateDecision, Notice, NoticeKind, ResourcePool, SpellSchool, UnificationMode,
};
use arbiter_content::ContentFactory;
use proptest::prelude::*;
use runtime::{Event, Funding, ResolutionOutcome, Topic};
use tokio::sync::broadcast;

use common::{ADMIN, Fixture, PLAYER, config_with_mode};

fn drain_notices(rx: &mut broadcast::Receiver<Event>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Notice(notice) = event {
            out.push(notice);
        }
    }
    out
}

fn glyph(id: &str) -> ActionMetadata {
    ActionMetadata::new(CallerSystem::A, id)
}

fn alternate_config(order: &str) -> ArbiterConfig {
    ArbiterConfig {
        alternate_source_order: order.to_owned(),
        ..ArbiterConfig::default()
    }
}

#[test]
fn single_pool_denial_leaves_balance_untouched() {
    let fx = Fixture::new();
    fx.pool_a.insert(PLAYER, 15.0, 100.0);
    let engine = fx.engine(config_with_mode("a_primary"));
    let mut notices = engine.events().subscribe(Topic::Notice);

    let meta = glyph("sys_a:glyph_projectile");
    let quote = engine.on_cost_calculation(PLAYER, 20.0, &meta);
    assert_eq!(quote.cost, 20.0);
    assert_eq!(quote.funding, Funding::Pools);

    let request = CastRequest::new(meta, quote.cost);
    let decision = engine.authorize(PLAYER, &request);
    assert_eq!(
        decision,
        GateDecision::Deny(DenyReason::InsufficientResource {
            needed: 20.0,
            available: 15.0,
        })
    );
    assert_eq!(fx.pool_a.get(PLAYER), 15.0);

    let sent = drain_notices(&mut notices);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message, "Not enough power: need 20, have 15");
}

#[test]
fn dual_cost_never_debits_one_side() {
    let fx = Fixture::new();
    fx.pool_a.insert(PLAYER, 60.0, 100.0);
    fx.pool_b.insert(PLAYER, 40.0, 100.0);
    let engine = fx.engine(config_with_mode("separate"));

    let request = CastRequest::new(glyph("sys_a:glyph_projectile"), 100.0);
    let decision = engine.authorize(PLAYER, &request);
    assert!(matches!(
        decision.reason(),
        Some(DenyReason::InsufficientDualShare { .. })
    ));
    assert_eq!(fx.balances(), (60.0, 40.0));

    // A host that resolves anyway still cannot produce a partial debit.
    let outcome = engine.on_resolution(PLAYER, &request, true);
    assert!(matches!(outcome, ResolutionOutcome::Shortfall { .. }));
    assert_eq!(fx.balances(), (60.0, 40.0));
}

#[test]
fn dual_cost_debits_both_shares() {
    let fx = Fixture::new();
    let engine = fx.engine(config_with_mode("separate"));

    let request = CastRequest::new(glyph("sys_a:glyph_projectile"), 40.0);
    assert!(engine.authorize(PLAYER, &request).is_allowed());
    assert_eq!(
        engine.on_resolution(PLAYER, &request, true),
        ResolutionOutcome::Charged { amount: 40.0 }
    );
    assert_eq!(fx.balances(), (80.0, 80.0));
}

#[test]
fn alternate_cost_drains_primary_then_fallback() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 10);
    fx.store.set(PLAYER, 5.0);
    fx.equipment.set_alternate_currency(PLAYER, true);
    let engine = fx.engine(alternate_config("primary_then_fallback"));
    let mut notices = engine.events().subscribe(Topic::Notice);

    let meta = glyph("sys_a:glyph_projectile").with_tier(1);
    let quote = engine.on_cost_calculation(PLAYER, 20.0, &meta);
    assert_eq!(quote.cost, 0.0);
    assert_eq!(quote.funding, Funding::Alternate { amount: 30 });

    let request = CastRequest::new(meta, quote.cost);
    assert!(engine.authorize(PLAYER, &request).is_allowed());
    assert_eq!(
        engine.on_resolution(PLAYER, &request, true),
        ResolutionOutcome::Committed { amount: 30 }
    );
    assert_eq!(fx.ledger.balance(PLAYER), 0);
    assert_eq!(fx.store.current(PLAYER), 3.0);
    // The normal pools were never charged.
    assert_eq!(fx.balances(), (100.0, 100.0));

    // A repeated resolution hook is a no-op.
    assert_eq!(
        engine.on_resolution(PLAYER, &request, true),
        ResolutionOutcome::Skipped
    );
    assert_eq!(fx.store.current(PLAYER), 3.0);

    let sent = drain_notices(&mut notices);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NoticeKind::Consumed);
}

#[test]
fn cost_messages_can_be_silenced() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 100);
    fx.equipment.set_alternate_currency(PLAYER, true);
    let engine = fx.engine(ArbiterConfig {
        show_cost_messages: false,
        ..ArbiterConfig::default()
    });
    let mut notices = engine.events().subscribe(Topic::Notice);

    let meta = glyph("sys_a:glyph_projectile");
    let quote = engine.on_cost_calculation(PLAYER, 10.0, &meta);
    let request = CastRequest::new(meta, quote.cost);
    assert!(engine.authorize(PLAYER, &request).is_allowed());
    assert!(matches!(
        engine.on_resolution(PLAYER, &request, true),
        ResolutionOutcome::Committed { amount: 15 }
    ));
    assert!(drain_notices(&mut notices).is_empty());
}

#[test]
fn expired_reservation_is_swept_and_cannot_commit() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 100);
    fx.equipment.set_alternate_currency(PLAYER, true);
    let engine = fx.engine(ArbiterConfig::default());

    let meta = glyph("sys_a:glyph_projectile");
    let quote = engine.on_cost_calculation(PLAYER, 20.0, &meta);
    assert!(engine.reservations().peek(PLAYER, CallerSystem::A).is_some());

    fx.clock.advance(6_000);
    assert_eq!(engine.sweep().reservations, 1);
    assert!(engine.reservations().peek(PLAYER, CallerSystem::A).is_none());

    let request = CastRequest::new(meta, quote.cost);
    assert_eq!(
        engine.on_resolution(PLAYER, &request, true),
        ResolutionOutcome::Skipped
    );
    assert_eq!(fx.ledger.balance(PLAYER), 100);
}

#[test]
fn expired_reservation_commit_fails_before_sweep() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 100);
    fx.equipment.set_alternate_currency(PLAYER, true);
    let engine = fx.engine(ArbiterConfig::default());

    let meta = glyph("sys_a:glyph_projectile");
    let quote = engine.on_cost_calculation(PLAYER, 20.0, &meta);
    fx.clock.advance(6_000);

    let request = CastRequest::new(meta, quote.cost);
    assert_eq!(
        engine.on_resolution(PLAYER, &request, true),
        ResolutionOutcome::Discarded
    );
    assert_eq!(fx.ledger.balance(PLAYER), 100);
}

#[test]
fn safe_policy_denies_with_small_penalty() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 5);
    fx.equipment.set_alternate_currency(PLAYER, true);
    let engine = fx.engine(ArbiterConfig::default());
    let mut notices = engine.events().subscribe(Topic::Notice);

    let meta = glyph("sys_a:glyph_projectile");
    let quote = engine.on_cost_calculation(PLAYER, 20.0, &meta);
    let request = CastRequest::new(meta, quote.cost);

    let decision = engine.authorize(PLAYER, &request);
    assert_eq!(
        decision,
        GateDecision::Deny(DenyReason::InsufficientAlternate {
            needed: 30,
            available: 5,
        })
    );
    assert_eq!(fx.store.current(PLAYER), 18.0);
    assert_eq!(fx.ledger.balance(PLAYER), 5);
    assert!(engine.reservations().peek(PLAYER, CallerSystem::A).is_none());
    assert_eq!(drain_notices(&mut notices).len(), 1);
}

#[test]
fn terminal_policy_allows_and_punishes_at_resolution() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 5);
    fx.equipment.set_alternate_currency(PLAYER, true);
    let engine = fx.engine(ArbiterConfig {
        death_on_insufficient_alternate: true,
        ..ArbiterConfig::default()
    });
    let mut notices = engine.events().subscribe(Topic::Notice);

    let meta = glyph("sys_a:glyph_projectile");
    let quote = engine.on_cost_calculation(PLAYER, 20.0, &meta);
    let request = CastRequest::new(meta, quote.cost);

    assert!(engine.authorize(PLAYER, &request).is_allowed());
    let outcome = engine.on_resolution(PLAYER, &request, true);
    assert!(matches!(outcome, ResolutionOutcome::TerminalPenalty { .. }));
    assert_eq!(fx.store.current(PLAYER), 0.0);
    assert_eq!(fx.ledger.balance(PLAYER), 5);

    let sent = drain_notices(&mut notices);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NoticeKind::TerminalPenalty);
}

#[test]
fn failed_action_discards_reservation() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 100);
    fx.equipment.set_alternate_currency(PLAYER, true);
    let engine = fx.engine(ArbiterConfig::default());

    let meta = glyph("sys_a:glyph_projectile");
    let quote = engine.on_cost_calculation(PLAYER, 20.0, &meta);
    let request = CastRequest::new(meta, quote.cost);

    assert_eq!(
        engine.on_resolution(PLAYER, &request, false),
        ResolutionOutcome::Discarded
    );
    assert_eq!(fx.ledger.balance(PLAYER), 100);
    assert!(engine.reservations().is_empty());
}

#[test]
fn school_match_lowers_alternate_cost() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 1_000);
    fx.equipment.set_alternate_currency(PLAYER, true);
    fx.equipment.set_affinities(PLAYER, vec![SpellSchool::Fire]);
    let engine = fx.engine(ArbiterConfig::default());

    // 500 * 1.0 * 2.5 = 1250, matched: max(100, round(1250 * 0.15)) = 188
    let meta = glyph("sys_a:glyph_fire_damage").with_tier(3);
    let quote = engine.on_cost_calculation(PLAYER, 500.0, &meta);
    assert_eq!(quote.funding, Funding::Alternate { amount: 188 });
}

#[test]
fn equipment_discount_applies_to_normal_costs() {
    let fx = Fixture::new();
    fx.equipment.set_flat_discount(PLAYER, true);
    let engine = fx.engine(ArbiterConfig::default());

    let quote = engine.on_cost_calculation(PLAYER, 40.0, &glyph("sys_a:glyph_projectile"));
    assert_eq!(quote, runtime::CostQuote { cost: 32.0, funding: Funding::Pools });

    let admin = engine.on_cost_calculation(ADMIN, 40.0, &glyph("sys_a:glyph_projectile"));
    assert_eq!(admin.cost, 40.0);
    assert_eq!(admin.funding, Funding::Unrestricted);
}

#[test]
fn unrestricted_actors_bypass_everything() {
    let fx = Fixture::new();
    let engine = fx.engine(config_with_mode("a_primary"));

    let request = CastRequest::new(glyph("sys_a:glyph_blink"), 1_000.0);
    assert!(engine.authorize(ADMIN, &request).is_allowed());
    assert_eq!(
        engine.on_resolution(ADMIN, &request, true),
        ResolutionOutcome::Skipped
    );
    assert_eq!(engine.cooldown_remaining(ADMIN, CallerSystem::A, "sys_a:glyph_blink"), 0);
}

#[test]
fn cancelled_alternate_cast_starts_no_cooldown() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 100);
    fx.equipment.set_alternate_currency(PLAYER, true);
    let engine = fx.engine(ArbiterConfig::default());

    let meta = glyph("sys_a:glyph_blink");
    let quote = engine.on_cost_calculation(PLAYER, 20.0, &meta);
    let request = CastRequest::new(meta, quote.cost);
    assert!(engine.authorize(PLAYER, &request).is_allowed());

    // The ledger is drained elsewhere before the effect resolves.
    fx.ledger.set_balance(PLAYER, 0);
    let outcome = engine.on_resolution(PLAYER, &request, true);
    assert!(matches!(outcome, ResolutionOutcome::Cancelled { .. }));
    assert_eq!(fx.store.current(PLAYER), 18.0);
    assert_eq!(engine.cooldown_remaining(PLAYER, CallerSystem::A, "sys_a:glyph_blink"), 0);
}

#[test]
fn pool_shortfall_at_resolution_starts_no_cooldown() {
    let fx = Fixture::new();
    let engine = fx.engine(config_with_mode("a_primary"));

    let request = CastRequest::new(glyph("sys_a:glyph_blink"), 20.0);
    assert!(engine.authorize(PLAYER, &request).is_allowed());

    fx.pool_a.set(PLAYER, 5.0);
    let outcome = engine.on_resolution(PLAYER, &request, true);
    assert!(matches!(outcome, ResolutionOutcome::Shortfall { .. }));
    assert_eq!(engine.cooldown_remaining(PLAYER, CallerSystem::A, "sys_a:glyph_blink"), 0);

    fx.pool_a.set(PLAYER, 100.0);
    assert_eq!(
        engine.on_resolution(PLAYER, &request, true),
        ResolutionOutcome::Charged { amount: 20.0 }
    );
    assert_eq!(engine.cooldown_remaining(PLAYER, CallerSystem::A, "sys_a:glyph_blink"), 100);
}

#[test]
fn cooldowns_are_isolated_per_namespace() {
    let fx = Fixture::new();
    let engine = fx.engine(ArbiterConfig::default());

    let blink_a = CastRequest::new(glyph("sys_a:glyph_blink"), 0.0);
    let blink_b = CastRequest::new(ActionMetadata::new(CallerSystem::B, "sys_b:blink"), 0.0);

    assert!(engine.authorize(PLAYER, &blink_a).is_allowed());
    engine.on_resolution(PLAYER, &blink_a, true);

    engine.advance_tick(50);
    assert_eq!(
        engine.authorize(PLAYER, &blink_a),
        GateDecision::Deny(DenyReason::OnCooldown {
            category: "MOVEMENT".to_owned(),
            remaining_ticks: 50,
        })
    );
    assert!(engine.authorize(PLAYER, &blink_b).is_allowed());

    engine.advance_tick(100);
    assert!(engine.authorize(PLAYER, &blink_a).is_allowed());
}

#[test]
fn cross_namespace_cooldown_is_shorter() {
    let fx = Fixture::new();
    let engine = fx.engine(ArbiterConfig {
        cross_namespace_cooldowns: true,
        ..ArbiterConfig::default()
    });

    let blink_a = CastRequest::new(glyph("sys_a:glyph_blink"), 0.0);
    engine.on_resolution(PLAYER, &blink_a, true);

    assert_eq!(engine.cooldown_remaining(PLAYER, CallerSystem::A, "sys_a:glyph_blink"), 100);
    assert_eq!(engine.cooldown_remaining(PLAYER, CallerSystem::B, "sys_b:blink"), 50);
}

#[test]
fn cooldown_reduction_is_capped() {
    let fx = Fixture::new();
    let engine = fx.engine(ArbiterConfig::default());

    let meta = glyph("sys_a:glyph_blink").with_cooldown_reduction(0.95);
    engine.on_resolution(PLAYER, &CastRequest::new(meta, 0.0), true);
    assert_eq!(engine.cooldown_remaining(PLAYER, CallerSystem::A, "sys_a:glyph_blink"), 20);
}

#[test]
fn missing_pool_b_degrades_mode() {
    let fx = Fixture::new();
    let engine = fx
        .builder_without_b(config_with_mode("separate"))
        .build_engine()
        .unwrap();
    assert_eq!(engine.bridge().resolve_mode(), UnificationMode::APrimary);

    let request = CastRequest::new(ActionMetadata::new(CallerSystem::B, "sys_b:fireball"), 30.0);
    assert!(engine.authorize(PLAYER, &request).is_allowed());
    engine.on_resolution(PLAYER, &request, true);
    assert_eq!(fx.pool_a.get(PLAYER), 70.0);
}

#[test]
fn forgetting_an_actor_drops_ephemeral_state() {
    let fx = Fixture::new();
    fx.ledger.set_balance(PLAYER, 100);
    fx.equipment.set_alternate_currency(PLAYER, true);
    let engine = fx.engine(ArbiterConfig::default());

    let spark = ActionMetadata::new(CallerSystem::B, "sys_b:spark");
    engine.on_cost_calculation(PLAYER, 20.0, &spark);
    engine.on_resolution(PLAYER, &CastRequest::new(glyph("sys_a:glyph_blink"), 0.0), true);
    assert_eq!(engine.reservations().len(), 1);
    assert_eq!(engine.cooldowns().tracked_actors(), 1);

    engine.forget_actor(PLAYER);
    assert!(engine.reservations().is_empty());
    assert_eq!(engine.cooldowns().tracked_actors(), 0);
}

#[test]
fn builder_requires_pool_a() {
    let err = runtime::RuntimeBuilder::default().build_engine().unwrap_err();
    assert!(matches!(err, runtime::RuntimeError::MissingPool));
}

#[test]
fn content_directory_configures_engine() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "mode = \"a_primary\"\n").unwrap();

    let fx = Fixture::new();
    let engine = runtime::RuntimeBuilder::default()
        .content(&ContentFactory::new(dir.path()))
        .unwrap()
        .pool_a(fx.pool_a.clone())
        .pool_b(fx.pool_b.clone())
        .build_engine()
        .unwrap();

    assert_eq!(engine.bridge().resolve_mode(), UnificationMode::APrimary);
    // Embedded tables are used when the directory has none.
    let fireball = CastRequest::new(ActionMetadata::new(CallerSystem::B, "sys_b:fireball"), 5.0);
    engine.on_resolution(PLAYER, &fireball, true);
    assert_eq!(engine.cooldown_remaining(PLAYER, CallerSystem::B, "sys_b:fireball"), 100);
}

#[test]
fn effective_max_includes_converted_bonus() {
    let fx = Fixture::new();
    let engine = fx.engine(ArbiterConfig {
        conversion_rate_a_to_b: 2.0,
        ..ArbiterConfig::default()
    });
    engine.record_equipment_bonus(
        PLAYER,
        arbiter_core::PoolId::A,
        arbiter_core::EquipmentBonus::new(30.0, 1.5),
    );

    assert_eq!(engine.effective_max(PLAYER, CallerSystem::B), 160.0);
    assert_eq!(engine.effective_regen(PLAYER, CallerSystem::B, 1.0), 4.0);

    engine.equipment_changed(PLAYER);
    assert_eq!(engine.effective_max(PLAYER, CallerSystem::B), 100.0);
}

proptest! {
    #[test]
    fn pools_stay_in_bounds_through_engine(
        costs in prop::collection::vec(-10.0f64..80.0, 1..20),
        mode in prop::sample::select(vec!["a_primary", "b_primary", "hybrid", "separate", "disabled"]),
    ) {
        let fx = Fixture::new();
        let engine = fx.engine(config_with_mode(mode));
        for cost in costs {
            let request = CastRequest::new(glyph("sys_a:glyph_projectile"), cost);
            if engine.authorize(PLAYER, &request).is_allowed() {
                engine.on_resolution(PLAYER, &request, true);
            }
            let (a, b) = fx.balances();
            prop_assert!((0.0..=100.0).contains(&a));
            prop_assert!((0.0..=100.0).contains(&b));
        }
    }
}
