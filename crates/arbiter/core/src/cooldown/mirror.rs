use dashmap::DashMap;

use super::{CooldownCategory, CooldownSync, Namespace};
use crate::actor::ActorId;
use crate::clock::Tick;

/// Read replica of cooldown end ticks, fed by [`CooldownSync`] notices.
///
/// Lets a display layer show remaining cooldowns without a round trip to the
/// authoritative ledger. It never decides whether an action may run.
#[derive(Debug, Default)]
pub struct CooldownMirror {
    ends: DashMap<(ActorId, Namespace, CooldownCategory), Tick>,
}

impl CooldownMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_sync(&self, sync: &CooldownSync) {
        self.ends
            .insert((sync.actor, sync.namespace.clone(), sync.category), sync.ends_at);
    }

    pub fn remaining(
        &self,
        actor: ActorId,
        namespace: &Namespace,
        category: CooldownCategory,
        now: Tick,
    ) -> Tick {
        self.ends
            .get(&(actor, namespace.clone(), category))
            .map_or(0, |ends_at| ends_at.saturating_sub(now))
    }

    pub fn is_on_cooldown(
        &self,
        actor: ActorId,
        namespace: &Namespace,
        category: CooldownCategory,
        now: Tick,
    ) -> bool {
        self.remaining(actor, namespace, category, now) > 0
    }

    /// Fraction of `total` still remaining, for progress overlays.
    pub fn progress(
        &self,
        actor: ActorId,
        namespace: &Namespace,
        category: CooldownCategory,
        total: Tick,
        now: Tick,
    ) -> f32 {
        if total == 0 {
            return 0.0;
        }
        let remaining = self.remaining(actor, namespace, category, now).min(total);
        remaining as f32 / total as f32
    }

    pub fn clear(&self, actor: ActorId) {
        self.ends.retain(|(owner, _, _), _| *owner != actor);
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_follows_syncs() {
        let mirror = CooldownMirror::new();
        let ns = Namespace::new("a");
        mirror.apply_sync(&CooldownSync {
            actor: ActorId(1),
            namespace: ns.clone(),
            category: CooldownCategory::Defensive,
            ends_at: 120,
            cross: false,
        });

        assert!(mirror.is_on_cooldown(ActorId(1), &ns, CooldownCategory::Defensive, 20));
        assert_eq!(mirror.remaining(ActorId(1), &ns, CooldownCategory::Defensive, 20), 100);
        assert_eq!(
            mirror.progress(ActorId(1), &ns, CooldownCategory::Defensive, 100, 70),
            0.5
        );

        mirror.clear(ActorId(1));
        assert!(mirror.is_empty());
    }
}
