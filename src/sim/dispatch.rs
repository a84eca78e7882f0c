use crate::sim::effect::{
    ActionRef, EffectBehavior, EffectId, Modifier, Notice, Owner, Stat, StatModifier,
};
use crate::sim::field::{Battlefield, EffectContext};
use phf::phf_map;

/// Combine semantics of one event name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Combine {
    /// Left fold with early exit: the first truthy handler short-circuits the
    /// pass, so side effects of earlier handlers land before later ones are
    /// skipped.
    Veto,
    /// Every live active handler runs; non-null results are collected in
    /// enumeration order.
    Collect,
    /// Every live active handler runs; results are discarded.
    Notify,
}

/// Event-name to combine-semantics table, shared verbatim with content and
/// the surrounding engine.
pub static EVENT_SEMANTICS: phf::Map<&'static str, Combine> = phf_map! {
    "beginTick" => Combine::Notify,
    "tick" => Combine::Notify,
    "endTick" => Combine::Notify,
    "vetoSelection" => Combine::Veto,
    "vetoExecution" => Combine::Veto,
    "modifier" => Combine::Collect,
    "statModifier" => Combine::Collect,
    "inherentPriority" => Combine::Collect,
    "informSpeedSort" => Combine::Collect,
    "informWeatherEffects" => Combine::Veto,
    "informApplyWeather" => Combine::Collect,
    "informRainHealing" => Combine::Notify,
    "informWeatherHealing" => Combine::Veto,
    "informSandDamage" => Combine::Veto,
    "informHailDamage" => Combine::Veto,
    "informSunDamage" => Combine::Veto,
    "informUproarStarted" => Combine::Notify,
    "informUproarStopped" => Combine::Notify,
};

/// A named event broadcast to a registry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    BeginTick,
    Tick,
    EndTick,
    VetoSelection {
        user: usize,
        action: ActionRef,
    },
    VetoExecution {
        user: usize,
        target: Option<usize>,
        action: ActionRef,
    },
    Modifier {
        user: usize,
        target: usize,
        action: ActionRef,
        critical: bool,
    },
    StatModifier {
        stat: Stat,
        subject: usize,
        target: Option<usize>,
    },
    InherentPriority,
    SpeedSort,
    Notice(Notice),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::BeginTick => "beginTick",
            Event::Tick => "tick",
            Event::EndTick => "endTick",
            Event::VetoSelection { .. } => "vetoSelection",
            Event::VetoExecution { .. } => "vetoExecution",
            Event::Modifier { .. } => "modifier",
            Event::StatModifier { .. } => "statModifier",
            Event::InherentPriority => "inherentPriority",
            Event::SpeedSort => "informSpeedSort",
            Event::Notice(notice) => notice.name(),
        }
    }

    /// Names missing from the table (content-defined notices) default to
    /// collect semantics.
    pub fn semantics(&self) -> Combine {
        EVENT_SEMANTICS
            .get(self.name())
            .copied()
            .unwrap_or(Combine::Collect)
    }
}

/// Value returned by a single handler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HookValue {
    Bool(bool),
    Int(i32),
    Damage(Modifier),
    Stat(StatModifier),
}

impl HookValue {
    fn truthy(&self) -> bool {
        match self {
            HookValue::Bool(value) => *value,
            HookValue::Int(value) => *value != 0,
            HookValue::Damage(_) | HookValue::Stat(_) => true,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            HookValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

/// One collected contribution, tagged with its source effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contribution {
    pub source: EffectId,
    pub value: HookValue,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    /// A veto-semantics dispatch stopped at this handler.
    ShortCircuit(EffectId),
    /// A veto-semantics dispatch ran to completion with no truthy answer.
    Passed,
    Collected(Vec<Contribution>),
    /// A notify-semantics dispatch completed.
    Done,
}

impl DispatchOutcome {
    pub fn short_circuited(&self) -> bool {
        matches!(self, DispatchOutcome::ShortCircuit(_))
    }

    pub fn contributions(self) -> Vec<Contribution> {
        match self {
            DispatchOutcome::Collected(contributions) => contributions,
            _ => Vec::new(),
        }
    }
}

fn invoke(
    behavior: &mut dyn EffectBehavior,
    ctx: &mut EffectContext<'_>,
    event: &Event,
) -> Option<HookValue> {
    match *event {
        Event::BeginTick => {
            behavior.begin_tick();
            None
        }
        Event::Tick => {
            behavior.tick(ctx);
            None
        }
        Event::EndTick => {
            behavior.end_tick(ctx);
            None
        }
        Event::VetoSelection { user, action } => {
            Some(HookValue::Bool(behavior.veto_selection(ctx, user, action)))
        }
        Event::VetoExecution {
            user,
            target,
            action,
        } => Some(HookValue::Bool(
            behavior.veto_execution(ctx, user, target, action),
        )),
        Event::Modifier {
            user,
            target,
            action,
            critical,
        } => behavior
            .modifier(ctx, user, target, action, critical)
            .map(HookValue::Damage),
        Event::StatModifier {
            stat,
            subject,
            target,
        } => behavior
            .stat_modifier(ctx, stat, subject, target)
            .map(HookValue::Stat),
        Event::InherentPriority => behavior.inherent_priority(ctx).map(HookValue::Int),
        Event::SpeedSort => behavior.speed_sort_ascending().map(HookValue::Bool),
        Event::Notice(notice) => behavior.inform(ctx, notice).map(HookValue::Int),
    }
}

impl Battlefield {
    /// Broadcast `event` to every effect in `owner`'s registry.
    ///
    /// The enumeration list is snapshotted before the first handler runs:
    /// effects inserted mid-pass are not invoked, and effects removed before
    /// the cursor reaches them are skipped. Deactivated effects are skipped
    /// for all behavioral hooks.
    pub fn dispatch(&mut self, owner: Owner, event: Event) -> DispatchOutcome {
        let semantics = event.semantics();
        let mut snapshot = self.registry(owner).snapshot();
        if matches!(event, Event::VetoExecution { .. }) {
            snapshot.sort_by_key(|&(serial, _)| self.registry(owner).veto_tier(serial));
        }

        let mut collected = Vec::new();
        for (serial, id) in snapshot {
            let Some(mut behavior) = self.registry_mut(owner).checkout(serial) else {
                continue;
            };
            if !behavior.is_active(&*self, owner) {
                self.registry_mut(owner).restore(serial, behavior);
                continue;
            }
            let value = {
                let mut ctx = EffectContext {
                    field: self,
                    owner,
                    effect: id,
                };
                invoke(behavior.as_mut(), &mut ctx, &event)
            };
            self.return_behavior(owner, serial, behavior);
            match semantics {
                Combine::Veto => {
                    if value.map_or(false, |v| v.truthy()) {
                        return DispatchOutcome::ShortCircuit(id);
                    }
                }
                Combine::Collect => {
                    if let Some(value) = value {
                        collected.push(Contribution { source: id, value });
                    }
                }
                Combine::Notify => {}
            }
        }

        match semantics {
            Combine::Veto => DispatchOutcome::Passed,
            Combine::Collect => DispatchOutcome::Collected(collected),
            Combine::Notify => DispatchOutcome::Done,
        }
    }

    /// Broadcast to several registries in order, under the event's combine
    /// semantics.
    pub fn dispatch_all(&mut self, owners: &[Owner], event: Event) -> DispatchOutcome {
        match event.semantics() {
            Combine::Veto => {
                for &owner in owners {
                    if let DispatchOutcome::ShortCircuit(id) = self.dispatch(owner, event) {
                        return DispatchOutcome::ShortCircuit(id);
                    }
                }
                DispatchOutcome::Passed
            }
            Combine::Collect => {
                let mut all = Vec::new();
                for &owner in owners {
                    all.extend(self.dispatch(owner, event).contributions());
                }
                DispatchOutcome::Collected(all)
            }
            Combine::Notify => {
                for &owner in owners {
                    self.dispatch(owner, event);
                }
                DispatchOutcome::Done
            }
        }
    }

    /// Put a checked-out behavior back, or finalize it if removal was
    /// requested while its hook ran. Finalization still precedes detachment.
    pub(crate) fn return_behavior(
        &mut self,
        owner: Owner,
        serial: u64,
        mut behavior: Box<dyn EffectBehavior>,
    ) {
        if self.registry(owner).is_doomed(serial) {
            {
                let mut ctx = EffectContext {
                    field: self,
                    owner,
                    effect: behavior.id(),
                };
                behavior.inform_finished(&mut ctx);
            }
            self.registry_mut(owner).detach(serial);
        } else {
            self.registry_mut(owner).restore(serial, behavior);
        }
    }

    /// Action-selection veto over the field's and the user's effects.
    pub fn veto_selection(&mut self, user: usize, action: ActionRef) -> bool {
        self.dispatch_all(
            &[Owner::Field, Owner::Participant(user)],
            Event::VetoSelection { user, action },
        )
        .short_circuited()
    }

    /// Execution-time veto over the field's, the target's, and the user's
    /// effects, each registry visited in ascending veto tier.
    pub fn veto_execution(
        &mut self,
        user: usize,
        target: Option<usize>,
        action: ActionRef,
    ) -> bool {
        let mut owners = vec![Owner::Field];
        if let Some(target) = target {
            owners.push(Owner::Participant(target));
        }
        if target != Some(user) {
            owners.push(Owner::Participant(user));
        }
        self.dispatch_all(
            &owners,
            Event::VetoExecution {
                user,
                target,
                action,
            },
        )
        .short_circuited()
    }
}
