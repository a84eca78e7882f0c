use crate::sim::dispatch::Event;
use crate::sim::effect::{
    ActionRef, EffectBehavior, EffectHandle, EffectId, EffectKind, Element, Modifier, Notice,
    Owner, Stat, StatModifier,
};
use crate::sim::field::{Battlefield, EffectContext};
use crate::text::{effect_text, TextPhase};

/// The eight mutually-tracked global-effect categories. The first five form
/// the weather exclusivity group.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum GlobalSlot {
    Rain,
    Sand,
    Sun,
    Hail,
    Fog,
    Uproar,
    Gravity,
    TrickRoom,
}

pub const GLOBAL_EFFECT_IDS: [EffectId; 8] = [
    "RainEffect",
    "SandEffect",
    "SunEffect",
    "HailEffect",
    "FogEffect",
    "UproarEffect",
    "GravityEffect",
    "TrickRoomEffect",
];

impl GlobalSlot {
    pub const ALL: [GlobalSlot; 8] = [
        GlobalSlot::Rain,
        GlobalSlot::Sand,
        GlobalSlot::Sun,
        GlobalSlot::Hail,
        GlobalSlot::Fog,
        GlobalSlot::Uproar,
        GlobalSlot::Gravity,
        GlobalSlot::TrickRoom,
    ];

    pub fn index(self) -> usize {
        match self {
            GlobalSlot::Rain => 0,
            GlobalSlot::Sand => 1,
            GlobalSlot::Sun => 2,
            GlobalSlot::Hail => 3,
            GlobalSlot::Fog => 4,
            GlobalSlot::Uproar => 5,
            GlobalSlot::Gravity => 6,
            GlobalSlot::TrickRoom => 7,
        }
    }

    pub fn effect_id(self) -> EffectId {
        GLOBAL_EFFECT_IDS[self.index()]
    }

    pub fn is_weather(self) -> bool {
        self.index() <= GlobalSlot::Fog.index()
    }

    pub fn from_name(name: &str) -> Option<GlobalSlot> {
        let normalized: String = name
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let slot = match normalized.as_str() {
            "rain" | "raineffect" => GlobalSlot::Rain,
            "sand" | "sandstorm" | "sandeffect" => GlobalSlot::Sand,
            "sun" | "suneffect" => GlobalSlot::Sun,
            "hail" | "haileffect" => GlobalSlot::Hail,
            "fog" | "fogeffect" => GlobalSlot::Fog,
            "uproar" | "uproareffect" => GlobalSlot::Uproar,
            "gravity" | "gravityeffect" => GlobalSlot::Gravity,
            "trickroom" | "trickroomeffect" => GlobalSlot::TrickRoom,
            _ => return None,
        };
        Some(slot)
    }
}

/// Per-field exclusivity bitset over the eight global-effect slots. The
/// controller is the sole writer: a flag is raised when the controller
/// applies the corresponding effect and lowered when the effect finalizes.
#[derive(Clone, Debug, Default)]
pub struct GlobalEffectController {
    flags: [bool; 8],
}

impl GlobalEffectController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw bitset, without the weather-suppression view applied.
    pub fn raw_flags(&self) -> [bool; 8] {
        self.flags
    }

    pub fn is_set(&self, slot: GlobalSlot) -> bool {
        self.flags[slot.index()]
    }

    pub(crate) fn set_flag(&mut self, slot: GlobalSlot) {
        self.flags[slot.index()] = true;
    }

    pub(crate) fn clear_flag(&mut self, slot: GlobalSlot) {
        self.flags[slot.index()] = false;
    }
}

const GRAVITY_FORBIDDEN: [&str; 6] = [
    "Fly",
    "Bounce",
    "Magnet Rise",
    "Hi Jump Kick",
    "Splash",
    "Jump Kick",
];

/// Behavior of one global effect. One closed variant per category; the
/// capability set differs per slot but the lifecycle plumbing is shared.
pub struct GlobalEffect {
    slot: GlobalSlot,
    /// Guards the field-level action so it runs exactly once per turn even
    /// when several tick dispatches reach this effect.
    ticked: bool,
    /// Uproar only: number of participants currently keeping it up.
    users: u32,
}

impl GlobalEffect {
    pub fn new(slot: GlobalSlot) -> Self {
        Self {
            slot,
            ticked: false,
            users: 0,
        }
    }

    fn tick_field(&mut self, ctx: &mut EffectContext<'_>) {
        if !self.slot.is_weather() {
            return;
        }
        if let Some(text) = effect_text(self.slot.effect_id(), TextPhase::Upkeep) {
            ctx.field.log.print(text);
        }
        ctx.field.log.log_weather_upkeep(self.slot.effect_id());
        if ctx.field.weather_suppressed() {
            return;
        }
        for idx in 0..ctx.field.participants.len() {
            self.residual_damage(ctx, idx);
        }
    }

    fn residual_damage(&mut self, ctx: &mut EffectContext<'_>, idx: usize) {
        let owner = Owner::Participant(idx);
        if ctx
            .field
            .dispatch(owner, Event::Notice(Notice::WeatherHealing))
            .short_circuited()
        {
            return;
        }
        let damage = match self.slot {
            GlobalSlot::Rain => {
                ctx.field.dispatch(owner, Event::Notice(Notice::RainHealing));
                return;
            }
            GlobalSlot::Sand => {
                if ctx
                    .field
                    .dispatch(owner, Event::Notice(Notice::SandImmunity))
                    .short_circuited()
                {
                    return;
                }
                if ctx.field.participants[idx].has_any_element(&[
                    Element::Ground,
                    Element::Rock,
                    Element::Steel,
                ]) {
                    return;
                }
                (ctx.field.participants[idx].max_hp / 16).max(1)
            }
            GlobalSlot::Hail => {
                if ctx
                    .field
                    .dispatch(owner, Event::Notice(Notice::HailImmunity))
                    .short_circuited()
                {
                    return;
                }
                if ctx.field.participants[idx].has_element(Element::Ice) {
                    return;
                }
                (ctx.field.participants[idx].max_hp / 16).max(1)
            }
            GlobalSlot::Sun => {
                // Harsh sunlight only hurts participants whose own effects
                // opt in (ability-induced damage), at a steeper fraction.
                if !ctx
                    .field
                    .dispatch(owner, Event::Notice(Notice::SunDamage))
                    .short_circuited()
                {
                    return;
                }
                (ctx.field.participants[idx].max_hp / 8).max(1)
            }
            _ => return,
        };
        let participant = &mut ctx.field.participants[idx];
        participant.hp = participant.hp.saturating_sub(damage);
        let name = participant.name.clone();
        let hp = participant.hp;
        let max_hp = participant.max_hp;
        ctx.field
            .log
            .log_weather_damage(&name, self.slot.effect_id(), hp, max_hp);
    }
}

impl EffectBehavior for GlobalEffect {
    fn id(&self) -> EffectId {
        self.slot.effect_id()
    }

    fn kind(&self) -> EffectKind {
        if self.slot.is_weather() {
            EffectKind::GlobalWeather
        } else {
            EffectKind::GlobalField
        }
    }

    fn initial_turns(&self) -> Option<i32> {
        match self.slot {
            GlobalSlot::Uproar => None,
            _ => Some(5),
        }
    }

    fn survives_switch(&self) -> bool {
        true
    }

    fn apply_effect(&mut self, ctx: &mut EffectContext<'_>) -> bool {
        if self.slot == GlobalSlot::Gravity {
            // Gravity grounds everyone: airborne statuses end immediately.
            for idx in 0..ctx.field.participants.len() {
                ctx.field.remove(Owner::Participant(idx), "MagnetRiseEffect");
            }
        }
        true
    }

    fn inform_applied(&mut self, ctx: &mut EffectContext<'_>, actor: Option<usize>) {
        if let Some(text) = effect_text(self.slot.effect_id(), TextPhase::Start) {
            ctx.field.log.print(text);
        }
        ctx.field.log.log_field_start(self.slot.effect_id());
        if self.slot.is_weather() {
            if let Some(actor) = actor {
                // A held item on the applying participant may stretch the
                // duration.
                let contributions = ctx
                    .field
                    .dispatch(
                        Owner::Participant(actor),
                        Event::Notice(Notice::ApplyWeather(self.slot)),
                    )
                    .contributions();
                if let Some(turns) = contributions.first().and_then(|c| c.value.as_int()) {
                    ctx.set_turns(turns);
                }
            }
        }
    }

    fn inform_finished(&mut self, ctx: &mut EffectContext<'_>) {
        ctx.field.controller.clear_flag(self.slot);
        // Fog lifting and an uproar dying down print nothing.
        if !matches!(self.slot, GlobalSlot::Fog | GlobalSlot::Uproar) {
            if let Some(text) = effect_text(self.slot.effect_id(), TextPhase::End) {
                ctx.field.log.print(text);
            }
        }
        ctx.field.log.log_field_end(self.slot.effect_id());
    }

    fn begin_tick(&mut self) {
        self.ticked = false;
    }

    fn tick(&mut self, ctx: &mut EffectContext<'_>) {
        if !self.ticked {
            self.ticked = true;
            self.tick_field(ctx);
        }
    }

    fn end_tick(&mut self, ctx: &mut EffectContext<'_>) {
        if !self.ticked {
            self.ticked = true;
            self.tick_field(ctx);
        }
    }

    fn modifier(
        &mut self,
        ctx: &mut EffectContext<'_>,
        _user: usize,
        _target: usize,
        action: ActionRef,
        _critical: bool,
    ) -> Option<Modifier> {
        let (boosted, dampened, group) = match self.slot {
            GlobalSlot::Rain => (Element::Water, Element::Fire, 3),
            GlobalSlot::Sun => (Element::Fire, Element::Water, 4),
            _ => return None,
        };
        if ctx.field.weather_suppressed() {
            return None;
        }
        if action.element == boosted {
            Some(Modifier {
                tier: 1,
                multiplier: 1.5,
                group,
            })
        } else if action.element == dampened {
            Some(Modifier {
                tier: 1,
                multiplier: 0.5,
                group,
            })
        } else {
            None
        }
    }

    fn stat_modifier(
        &mut self,
        ctx: &mut EffectContext<'_>,
        stat: Stat,
        subject: usize,
        _target: Option<usize>,
    ) -> Option<StatModifier> {
        match self.slot {
            GlobalSlot::Sand => {
                if ctx.field.weather_suppressed() {
                    return None;
                }
                if stat != Stat::SpDefense {
                    return None;
                }
                if !ctx.field.participants[subject].has_element(Element::Rock) {
                    return None;
                }
                Some(StatModifier {
                    multiplier: 1.5,
                    group: 3,
                })
            }
            GlobalSlot::Fog => {
                if ctx.field.weather_suppressed() {
                    return None;
                }
                if stat != Stat::Accuracy {
                    return None;
                }
                Some(StatModifier {
                    multiplier: 0.6,
                    group: 5,
                })
            }
            GlobalSlot::Gravity => {
                if stat != Stat::Accuracy {
                    return None;
                }
                Some(StatModifier {
                    multiplier: 1.6,
                    group: 12,
                })
            }
            _ => None,
        }
    }

    fn veto_selection(
        &mut self,
        _ctx: &mut EffectContext<'_>,
        _user: usize,
        action: ActionRef,
    ) -> bool {
        self.slot == GlobalSlot::Gravity && GRAVITY_FORBIDDEN.contains(&action.name)
    }

    fn veto_execution(
        &mut self,
        ctx: &mut EffectContext<'_>,
        user: usize,
        target: Option<usize>,
        action: ActionRef,
    ) -> bool {
        if self.slot != GlobalSlot::Gravity {
            return false;
        }
        if target.is_some() {
            return false;
        }
        if !GRAVITY_FORBIDDEN.contains(&action.name) {
            return false;
        }
        let user = ctx.field.participants[user].name.clone();
        ctx.field.log.log_veto(&user, action.name, self.slot.effect_id());
        true
    }

    fn speed_sort_ascending(&mut self) -> Option<bool> {
        if self.slot == GlobalSlot::TrickRoom {
            Some(true)
        } else {
            None
        }
    }

    fn inform(&mut self, ctx: &mut EffectContext<'_>, notice: Notice) -> Option<i32> {
        if self.slot != GlobalSlot::Uproar {
            return None;
        }
        match notice {
            Notice::UproarStarted => {
                self.users += 1;
                None
            }
            Notice::UproarStopped => {
                self.users = self.users.saturating_sub(1);
                if self.users == 0 {
                    ctx.field.remove_global_effect(GlobalSlot::Uproar);
                }
                None
            }
            _ => None,
        }
    }
}

impl Battlefield {
    /// Raise a slot's flag and insert its effect. The flag is raised before
    /// insertion and not rolled back on refusal, matching the legacy
    /// controller exactly (the overflow-recovery path depends on it).
    pub fn apply_global_effect(
        &mut self,
        actor: Option<usize>,
        slot: GlobalSlot,
    ) -> Option<EffectHandle> {
        self.controller.set_flag(slot);
        self.apply_induced(Owner::Field, Box::new(GlobalEffect::new(slot)), actor)
    }

    /// Apply a weather effect, enforcing the at-most-one-active-weather
    /// invariant transactionally: the request fails if `slot` is already the
    /// flagged weather, otherwise every active weather is removed (finalize
    /// hooks run) before the new effect is inserted and announced.
    pub fn apply_weather(&mut self, actor: usize, slot: GlobalSlot) -> Option<EffectHandle> {
        let mut flagged: Vec<usize> = GlobalSlot::ALL
            .iter()
            .filter(|s| s.is_weather() && self.controller.is_set(**s))
            .map(|s| s.index())
            .collect();
        // Defensive legacy behavior: a corrupted bitset with several weather
        // flags raised discards the surplus before the membership test.
        if flagged.len() > 1 {
            flagged.pop();
        }
        if flagged.contains(&slot.index()) {
            return None;
        }
        for weather in GlobalSlot::ALL.iter().filter(|s| s.is_weather()) {
            self.remove_global_effect(*weather);
        }
        self.apply_global_effect(Some(actor), slot)
    }

    /// Remove a global effect. Idempotent: a clear flag is a no-op and the
    /// finalize hook never runs twice.
    pub fn remove_global_effect(&mut self, slot: GlobalSlot) -> bool {
        if !self.controller.is_set(slot) {
            return false;
        }
        self.controller.clear_flag(slot);
        self.remove(Owner::Field, slot.effect_id());
        true
    }

    /// Legacy recovery quirk, preserved bit for bit: when flag corruption is
    /// detected, every global effect indexed strictly before the first
    /// flagged slot is forcibly applied with indefinite duration. Do not
    /// "fix" this; content relies on the reproduced behavior.
    pub fn simulate_buffer_overflow(&mut self) {
        let flags = self.controller.raw_flags();
        let Some(first) = flags.iter().position(|flag| *flag) else {
            return;
        };
        for slot in &GlobalSlot::ALL[..first] {
            let handle = self.apply_global_effect(None, *slot);
            if let Some(handle) = handle {
                self.registry_mut(handle.owner).set_turns(handle.id, -1);
            }
        }
    }

    /// View of the flag bitset. While weather is suppressed the five weather
    /// slots read as false; the independent slots always pass through.
    pub fn global_flags(&mut self) -> [bool; 8] {
        let mut flags = self.controller.raw_flags();
        if self.weather_suppressed() {
            for slot in GlobalSlot::ALL.iter().filter(|s| s.is_weather()) {
                flags[slot.index()] = false;
            }
        }
        flags
    }
}
