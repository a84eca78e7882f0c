use crate::sim::field::{Battlefield, EffectContext};
use serde::Serialize;

/// Stable identity of an effect. Ids are unique per registry at any instant
/// unless the behavior opts out of singleton insertion.
pub type EffectId = &'static str;

/// Host of an effect registry: the field itself or one of its participants.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Owner {
    Field,
    Participant(usize),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum EffectKind {
    Status,
    GlobalWeather,
    GlobalField,
    HeldItem,
}

/// `Deactivated` is derived on read from [`EffectBehavior::is_active`];
/// `Removed` is terminal and the registry no longer holds the effect.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum EffectState {
    Active,
    Deactivated,
    Removed,
}

/// Elemental tag carried by participants and actions. Only the slice of the
/// full type chart the runtime-owned effects consult.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Element {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Ground,
    Rock,
    Steel,
    Flying,
}

impl Element {
    pub fn from_name(name: &str) -> Option<Element> {
        let normalized: String = name
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let element = match normalized.as_str() {
            "normal" => Element::Normal,
            "fire" => Element::Fire,
            "water" => Element::Water,
            "electric" => Element::Electric,
            "grass" => Element::Grass,
            "ice" => Element::Ice,
            "ground" => Element::Ground,
            "rock" => Element::Rock,
            "steel" => Element::Steel,
            "flying" => Element::Flying,
            _ => return None,
        };
        Some(element)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Stat {
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    Speed,
    Accuracy,
    Evasion,
}

/// Opaque descriptor of an action (move) owned by the external engine. The
/// runtime only ever reads the name and element.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ActionRef {
    pub name: &'static str,
    pub element: Element,
}

impl ActionRef {
    pub fn new(name: &'static str, element: Element) -> Self {
        Self { name, element }
    }
}

/// Damage-modifier contribution: `tier` is the application point in the host's
/// damage formula, `group` the ordering key contributions are combined under.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Modifier {
    pub tier: u8,
    pub multiplier: f32,
    pub group: i32,
}

/// Stat-modifier contribution, narrower than [`Modifier`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatModifier {
    pub multiplier: f32,
    pub group: i32,
}

/// Free-form notification hooks. Named after the messages the original wire
/// protocol used; [`Notice::name`] keys the combine-semantics table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Notice {
    /// Field-level query: are weather effects currently suppressed?
    WeatherSuppression,
    /// A weather effect is being applied; an answering effect may override
    /// its duration (held-item style).
    ApplyWeather(crate::sim::global::GlobalSlot),
    /// Fired for each participant during rain upkeep.
    RainHealing,
    /// A truthy answer consumes the weather upkeep for this participant.
    WeatherHealing,
    /// A truthy answer exempts the participant from sandstorm damage.
    SandImmunity,
    /// A truthy answer exempts the participant from hail damage.
    HailImmunity,
    /// A truthy answer opts the participant into harsh-sunlight damage.
    SunDamage,
    UproarStarted,
    UproarStopped,
    /// Escape hatch for content-defined events.
    Custom(&'static str),
}

impl Notice {
    pub fn name(&self) -> &'static str {
        match self {
            Notice::WeatherSuppression => "informWeatherEffects",
            Notice::ApplyWeather(_) => "informApplyWeather",
            Notice::RainHealing => "informRainHealing",
            Notice::WeatherHealing => "informWeatherHealing",
            Notice::SandImmunity => "informSandDamage",
            Notice::HailImmunity => "informHailDamage",
            Notice::SunDamage => "informSunDamage",
            Notice::UproarStarted => "informUproarStarted",
            Notice::UproarStopped => "informUproarStopped",
            Notice::Custom(name) => name,
        }
    }
}

/// Capability set of an effect. Every hook has a no-op default; content
/// implements the sparse subset it needs.
///
/// Hooks run synchronously and may mutate the world through the context,
/// including applying or removing other effects. The dispatcher snapshots the
/// enumeration order up front, so mid-broadcast mutation never invalidates an
/// in-flight pass.
pub trait EffectBehavior {
    fn id(&self) -> EffectId;

    fn kind(&self) -> EffectKind {
        EffectKind::Status
    }

    /// Singleton effects reject a second insertion under the same id.
    fn singleton(&self) -> bool {
        true
    }

    /// Starting value for the registry-owned turn countdown. `Some(-1)` is
    /// indefinite; `None` means no countdown at all.
    fn initial_turns(&self) -> Option<i32> {
        None
    }

    /// Re-evaluated on read; a false answer makes the effect `Deactivated`:
    /// behavioral hooks are skipped but state queries still see it.
    fn is_active(&self, _field: &Battlefield, _owner: Owner) -> bool {
        true
    }

    /// Whether the effect outlives its owner leaving the field.
    fn survives_switch(&self) -> bool {
        false
    }

    /// Execution-veto dispatch visits effects in ascending veto tier.
    fn veto_tier(&self) -> i32 {
        0
    }

    /// Called once before insertion; returning false aborts it and the
    /// effect is never stored.
    fn apply_effect(&mut self, _ctx: &mut EffectContext<'_>) -> bool {
        true
    }

    /// Fired exactly once, after successful insertion.
    fn inform_applied(&mut self, _ctx: &mut EffectContext<'_>, _actor: Option<usize>) {}

    /// Fired exactly once, before the effect is detached from its registry.
    fn inform_finished(&mut self, _ctx: &mut EffectContext<'_>) {}

    fn begin_tick(&mut self) {}

    fn tick(&mut self, _ctx: &mut EffectContext<'_>) {}

    fn end_tick(&mut self, _ctx: &mut EffectContext<'_>) {}

    fn modifier(
        &mut self,
        _ctx: &mut EffectContext<'_>,
        _user: usize,
        _target: usize,
        _action: ActionRef,
        _critical: bool,
    ) -> Option<Modifier> {
        None
    }

    fn stat_modifier(
        &mut self,
        _ctx: &mut EffectContext<'_>,
        _stat: Stat,
        _subject: usize,
        _target: Option<usize>,
    ) -> Option<StatModifier> {
        None
    }

    fn veto_selection(
        &mut self,
        _ctx: &mut EffectContext<'_>,
        _user: usize,
        _action: ActionRef,
    ) -> bool {
        false
    }

    fn veto_execution(
        &mut self,
        _ctx: &mut EffectContext<'_>,
        _user: usize,
        _target: Option<usize>,
        _action: ActionRef,
    ) -> bool {
        false
    }

    /// Priority override consulted by the resolver; recomputed every
    /// evaluation, never cached by the runtime.
    fn inherent_priority(&mut self, _ctx: &mut EffectContext<'_>) -> Option<i32> {
        None
    }

    /// `Some(true)` inverts the speed leg of the turn-order comparator.
    fn speed_sort_ascending(&mut self) -> Option<bool> {
        None
    }

    /// Free-form notification hook; the optional return value is consumed by
    /// the caller according to the event's combine semantics.
    fn inform(&mut self, _ctx: &mut EffectContext<'_>, _notice: Notice) -> Option<i32> {
        None
    }
}

/// Stable reference to an applied effect. Stale handles (the effect was
/// removed, or replaced under the same id) resolve to not-found.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EffectHandle {
    pub owner: Owner,
    pub id: EffectId,
    pub(crate) serial: u64,
}

/// Read-only snapshot of one registry entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EffectView {
    pub id: EffectId,
    pub kind: EffectKind,
    pub state: EffectState,
    pub turns: Option<i32>,
}
