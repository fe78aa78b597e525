use arbiter_core::{ActorId, CastRequest, CategoryMapper, CooldownLedger, Namespace, Tick};

use crate::events::ResolutionOutcome;

/// Everything a hook may look at for one resolution.
pub struct HookContext<'a> {
    pub actor: ActorId,
    pub request: &'a CastRequest,
    /// The caller reported that the action's effect ran.
    pub succeeded: bool,
    pub outcome: &'a ResolutionOutcome,
    pub tick: Tick,
    pub cooldowns: &'a CooldownLedger,
    /// Category table of the request's namespace, if one is registered.
    pub mapper: Option<&'a dyn CategoryMapper>,
    pub cross_namespace_factor: f64,
}

impl HookContext<'_> {
    pub fn namespace(&self) -> Namespace {
        Namespace::from(self.request.system())
    }

    pub fn action_id(&self) -> &str {
        &self.request.metadata.action_id
    }

    /// The effect ran and the resolution did not cancel it.
    pub fn effect_stands(&self) -> bool {
        self.succeeded && self.outcome.lets_effect_stand()
    }
}
