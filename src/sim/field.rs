use crate::field_log::FieldLog;
use crate::sim::dispatch::Event;
use crate::sim::effect::{
    EffectBehavior, EffectHandle, EffectId, EffectState, EffectView, Element, Notice, Owner,
};
use crate::sim::global::GlobalEffectController;
use crate::sim::registry::{Doom, EffectRegistry};

/// Public state of one battle participant. The full creature model (stats,
/// moves, abilities) lives in the surrounding engine; the runtime keeps only
/// what its own effects read.
pub struct Participant {
    pub name: String,
    pub base_speed: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub elements: Vec<Element>,
    pub(crate) effects: EffectRegistry,
}

impl Participant {
    pub fn new(name: &str, base_speed: u32, hp: u32, elements: Vec<Element>) -> Self {
        Self {
            name: name.to_string(),
            base_speed,
            hp,
            max_hp: hp,
            elements,
            effects: EffectRegistry::new(),
        }
    }

    pub fn has_element(&self, element: Element) -> bool {
        self.elements.contains(&element)
    }

    pub fn has_any_element(&self, elements: &[Element]) -> bool {
        elements.iter().any(|e| self.has_element(*e))
    }
}

/// One battle instance: participants, their effect registries, the field's
/// own registry, and the global-effect controller. Everything an effect hook
/// can reach goes through here; there is no ambient state.
pub struct Battlefield {
    pub participants: Vec<Participant>,
    pub log: FieldLog,
    pub turn: u32,
    pub(crate) field_effects: EffectRegistry,
    pub(crate) controller: GlobalEffectController,
}

impl std::fmt::Debug for Battlefield {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battlefield")
            .field("turn", &self.turn)
            .finish_non_exhaustive()
    }
}

/// Context handed to every hook invocation: mutable access to the world plus
/// the identity of the effect being invoked.
pub struct EffectContext<'a> {
    pub field: &'a mut Battlefield,
    pub owner: Owner,
    pub effect: EffectId,
}

impl EffectContext<'_> {
    /// Remaining turn counter of the invoked effect.
    pub fn turns(&self) -> Option<i32> {
        self.field.registry(self.owner).turns(self.effect)
    }

    /// Overwrite the invoked effect's turn counter (`-1` for indefinite).
    pub fn set_turns(&mut self, turns: i32) {
        let owner = self.owner;
        let id = self.effect;
        self.field.registry_mut(owner).set_turns(id, turns);
    }
}

impl Battlefield {
    pub fn new() -> Self {
        Self {
            participants: Vec::new(),
            log: FieldLog::new(),
            turn: 0,
            field_effects: EffectRegistry::new(),
            controller: GlobalEffectController::new(),
        }
    }

    pub fn add_participant(&mut self, participant: Participant) -> usize {
        self.participants.push(participant);
        self.participants.len() - 1
    }

    pub(crate) fn registry(&self, owner: Owner) -> &EffectRegistry {
        match owner {
            Owner::Field => &self.field_effects,
            Owner::Participant(idx) => &self.participants[idx].effects,
        }
    }

    pub(crate) fn registry_mut(&mut self, owner: Owner) -> &mut EffectRegistry {
        match owner {
            Owner::Field => &mut self.field_effects,
            Owner::Participant(idx) => &mut self.participants[idx].effects,
        }
    }

    fn all_owners(&self) -> Vec<Owner> {
        let mut owners = vec![Owner::Field];
        owners.extend((0..self.participants.len()).map(Owner::Participant));
        owners
    }

    /// Apply an effect to an owner. Returns `None` when the uniqueness
    /// invariant rejects the insertion or the effect's own `apply_effect`
    /// aborts it; in both cases nothing is stored.
    pub fn apply(
        &mut self,
        owner: Owner,
        behavior: Box<dyn EffectBehavior>,
    ) -> Option<EffectHandle> {
        self.apply_induced(owner, behavior, None)
    }

    /// Like [`Battlefield::apply`], naming the participant whose action
    /// caused the insertion; the actor is handed to `inform_applied` and is
    /// the dispatch target for application-time queries.
    pub fn apply_induced(
        &mut self,
        owner: Owner,
        mut behavior: Box<dyn EffectBehavior>,
        actor: Option<usize>,
    ) -> Option<EffectHandle> {
        let id = behavior.id();
        if behavior.singleton() && self.registry(owner).contains(id) {
            return None;
        }
        let accepted = {
            let mut ctx = EffectContext {
                field: self,
                owner,
                effect: id,
            };
            behavior.apply_effect(&mut ctx)
        };
        if !accepted {
            return None;
        }
        let turns = behavior.initial_turns();
        let serial = self.registry_mut(owner).insert(behavior, turns);
        // The applied notification runs with the effect already inserted, so
        // the hook can adjust its own registry entry.
        if let Some(mut behavior) = self.registry_mut(owner).checkout(serial) {
            {
                let mut ctx = EffectContext {
                    field: self,
                    owner,
                    effect: id,
                };
                behavior.inform_applied(&mut ctx, actor);
            }
            self.return_behavior(owner, serial, behavior);
        }
        Some(EffectHandle { owner, id, serial })
    }

    /// Remove an effect by id. The finalize hook always runs before the
    /// registry stops reporting the effect. Unknown ids are treated as
    /// already removed.
    pub fn remove(&mut self, owner: Owner, id: &str) -> bool {
        match self.registry_mut(owner).doom(id) {
            Doom::NotFound => false,
            Doom::Deferred => true,
            Doom::TakeNow(serial, mut behavior) => {
                {
                    let mut ctx = EffectContext {
                        field: self,
                        owner,
                        effect: behavior.id(),
                    };
                    behavior.inform_finished(&mut ctx);
                }
                self.registry_mut(owner).detach(serial);
                true
            }
        }
    }

    /// Remove through a handle; stale handles are not-found.
    pub fn remove_handle(&mut self, handle: EffectHandle) -> bool {
        let live = self
            .registry(handle.owner)
            .slot(handle.id)
            .map_or(false, |slot| slot.serial == handle.serial);
        if !live {
            return false;
        }
        self.remove(handle.owner, handle.id)
    }

    /// Snapshot view of one effect; `None` means removed or never applied.
    pub fn query(&self, owner: Owner, id: &str) -> Option<EffectView> {
        let slot = self.registry(owner).slot(id)?;
        let state = match slot.behavior.as_deref() {
            Some(behavior) if !behavior.is_active(self, owner) => EffectState::Deactivated,
            _ => EffectState::Active,
        };
        Some(EffectView {
            id: slot.id,
            kind: slot.kind,
            state,
            turns: slot.turns,
        })
    }

    /// Handle-based query; stale handles are not-found.
    pub fn query_handle(&self, handle: EffectHandle) -> Option<EffectView> {
        let slot = self.registry(handle.owner).slot(handle.id)?;
        if slot.serial != handle.serial {
            return None;
        }
        self.query(handle.owner, handle.id)
    }

    /// Advance one turn: begin-tick, tick, and end-tick passes over the
    /// field's and every participant's registry, then the countdown pass.
    pub fn run_tick(&mut self) {
        self.turn += 1;
        self.log.log_turn(self.turn);
        let owners = self.all_owners();
        for &owner in &owners {
            self.dispatch(owner, Event::BeginTick);
        }
        for &owner in &owners {
            self.dispatch(owner, Event::Tick);
        }
        for &owner in &owners {
            self.dispatch(owner, Event::EndTick);
        }
        for &owner in &owners {
            self.run_countdown(owner);
        }
    }

    /// Countdown pass: every active effect with a positive counter is ticked
    /// down exactly once; reaching zero removes it (finalize first). A `-1`
    /// counter is indefinite and never expires here.
    fn run_countdown(&mut self, owner: Owner) {
        let entries: Vec<(u64, EffectId, i32)> = self
            .registry(owner)
            .snapshot()
            .into_iter()
            .filter_map(|(serial, id)| {
                let slot = self.registry(owner).slot_by_serial(serial)?;
                slot.turns.map(|turns| (serial, id, turns))
            })
            .collect();
        for (serial, id, turns) in entries {
            if turns <= 0 {
                continue;
            }
            let active = self
                .registry(owner)
                .behavior_ref(serial)
                .map_or(false, |behavior| behavior.is_active(self, owner));
            if !active {
                continue;
            }
            let remaining = turns - 1;
            self.registry_mut(owner).set_turns_by_serial(serial, remaining);
            if remaining == 0 {
                self.remove(owner, id);
            }
        }
    }

    /// A participant leaves the field: cull the effects that do not survive
    /// a switch, running each one's finalize hook.
    pub fn switch_out(&mut self, participant: usize) {
        let snapshot = self.participants[participant].effects.snapshot();
        for (serial, id) in snapshot {
            let survives = self.participants[participant]
                .effects
                .behavior_ref(serial)
                .map_or(true, |behavior| behavior.survives_switch());
            if !survives {
                self.remove(Owner::Participant(participant), id);
            }
        }
    }

    /// Field-level query: is weather currently suppressed? Any active effect
    /// anywhere may answer.
    pub fn weather_suppressed(&mut self) -> bool {
        let owners = self.all_owners();
        self.dispatch_all(&owners, Event::Notice(Notice::WeatherSuppression))
            .short_circuited()
    }
}

impl Default for Battlefield {
    fn default() -> Self {
        Self::new()
    }
}
