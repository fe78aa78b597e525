//! Two-phase cost reservations.
//!
//! The cost-calculation hook and the resolution hook of an action fire at
//! different times. A reservation carries the alternate-currency amount from
//! the first to the second: it is staged while the normal cost is zeroed,
//! read by the gate, and committed (funds moved) or discarded exactly once.
//!
//! At most one reservation exists per actor and kind; staging again replaces
//! it. Committed entries stay flagged until swept so a repeated resolution
//! hook cannot debit twice.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::actor::{ActorId, CallerSystem};
use crate::clock::{Clock, Timestamp};
use crate::error::ArbiterError;

/// Reservation slot; one per calling system.
pub type ReservationKind = CallerSystem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostReservation {
    pub actor: ActorId,
    pub kind: ReservationKind,
    /// Amount in alternate-currency units.
    pub amount: u64,
    pub created_at: Timestamp,
    pub ttl_ms: u64,
    pub committed: bool,
}

impl CostReservation {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.saturating_sub(self.created_at) > self.ttl_ms
    }

    /// Staged, not committed and not expired.
    pub fn is_pending(&self, now: Timestamp) -> bool {
        !self.committed && !self.is_expired(now)
    }
}

pub struct CostReservationLedger {
    entries: DashMap<(ActorId, ReservationKind), CostReservation>,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl CostReservationLedger {
    pub fn new(ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms,
            clock,
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now_ms()
    }

    /// Records the intended alternate amount, replacing any earlier stage.
    pub fn stage(&self, actor: ActorId, kind: ReservationKind, amount: u64) -> CostReservation {
        let reservation = CostReservation {
            actor,
            kind,
            amount,
            created_at: self.clock.now_ms(),
            ttl_ms: self.ttl_ms,
            committed: false,
        };
        match self.entries.insert((actor, kind), reservation) {
            Some(previous) if !previous.committed => {
                debug!(%actor, %kind, previous = previous.amount, amount, "reservation overwritten");
            }
            _ => {}
        }
        reservation
    }

    /// Current reservation, unless it expired.
    pub fn peek(&self, actor: ActorId, kind: ReservationKind) -> Option<CostReservation> {
        let now = self.clock.now_ms();
        self.entries
            .get(&(actor, kind))
            .map(|r| *r)
            .filter(|r| !r.is_expired(now))
    }

    /// Reservation the gate still has to honour.
    pub fn pending(&self, actor: ActorId, kind: ReservationKind) -> Option<CostReservation> {
        let now = self.clock.now_ms();
        self.peek(actor, kind).filter(|r| r.is_pending(now))
    }

    /// Commits the reservation, moving funds through `debit`.
    ///
    /// The entry stays locked while `debit` runs, so concurrent commits for
    /// the same actor and kind serialise and only one of them debits. On a
    /// debit failure the reservation is left uncommitted.
    pub fn try_commit<F>(
        &self,
        actor: ActorId,
        kind: ReservationKind,
        debit: F,
    ) -> Result<u64, ArbiterError>
    where
        F: FnOnce(u64) -> Result<(), ArbiterError>,
    {
        let now = self.clock.now_ms();
        let key = (actor, kind);

        {
            let Some(mut entry) = self.entries.get_mut(&key) else {
                return Err(ArbiterError::ReservationMissing { actor, kind });
            };
            if entry.committed {
                warn!(%actor, %kind, "second commit of a reservation ignored");
                return Err(ArbiterError::DoubleCommitAttempt { actor, kind });
            }
            if !entry.is_expired(now) {
                debit(entry.amount)?;
                entry.committed = true;
                return Ok(entry.amount);
            }
        }

        // Expired: the guard is released before removing.
        self.entries
            .remove_if(&key, |_, r| !r.committed && r.is_expired(now));
        Err(ArbiterError::ReservationExpired { actor, kind })
    }

    /// `try_commit` reduced to success or failure.
    pub fn commit<F>(&self, actor: ActorId, kind: ReservationKind, debit: F) -> bool
    where
        F: FnOnce(u64) -> Result<(), ArbiterError>,
    {
        self.try_commit(actor, kind, debit).is_ok()
    }

    /// Removes the reservation without moving funds.
    pub fn discard(&self, actor: ActorId, kind: ReservationKind) -> Option<CostReservation> {
        self.entries.remove(&(actor, kind)).map(|(_, r)| r)
    }

    /// Removes every reservation of `actor`.
    pub fn discard_actor(&self, actor: ActorId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(owner, _), _| *owner != actor);
        before.saturating_sub(self.entries.len())
    }

    /// Drops entries older than their TTL. Returns how many were removed.
    pub fn sweep_expired(&self, now: Timestamp) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, r| {
            let keep = !r.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            debug!(removed, "expired reservations swept");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CostReservationLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostReservationLedger")
            .field("entries", &self.entries.len())
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}
