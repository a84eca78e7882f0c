use crate::sim::dispatch::{DispatchOutcome, Event, HookValue};
use crate::sim::effect::Owner;
use crate::sim::field::Battlefield;
use rand::rngs::SmallRng;
use rand::Rng;

/// Base ordering inputs for one actor, supplied by the external engine for
/// the current evaluation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ActorSeed {
    pub participant: usize,
    /// Base priority tier of the selected action.
    pub priority: i32,
    /// Effective speed, already past the engine's own stat pipeline.
    pub speed: u32,
}

/// Compute the execution order for a turn.
///
/// Each actor's priority tier may be replaced by an `inherentPriority`
/// override from its own or the field's active effects; overrides are
/// re-collected on every call, never cached by the resolver (an effect that
/// wants a stable value for the rest of an action memoizes it itself). Ties
/// on the resolved tier fall back to speed, then to a coin flip from the
/// external random source.
pub fn resolve_order(
    field: &mut Battlefield,
    seeds: &[ActorSeed],
    rng: &mut SmallRng,
) -> Vec<usize> {
    let ascending = speed_sort_ascending(field);

    let mut keyed: Vec<(i32, u32, u32, usize)> = seeds
        .iter()
        .map(|seed| {
            let resolved = inherent_priority(field, seed.participant).unwrap_or(seed.priority);
            let coin: u32 = rng.gen();
            (resolved, seed.speed, coin, seed.participant)
        })
        .collect();

    keyed.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| if ascending { a.1.cmp(&b.1) } else { b.1.cmp(&a.1) })
            .then_with(|| a.2.cmp(&b.2))
    });
    keyed.into_iter().map(|(_, _, _, participant)| participant).collect()
}

/// Strongest override wins by magnitude, so a negative override (lagging
/// effects) still beats the absence of one.
fn inherent_priority(field: &mut Battlefield, participant: usize) -> Option<i32> {
    let owners = [Owner::Participant(participant), Owner::Field];
    let mut best: Option<i32> = None;
    for contribution in field
        .dispatch_all(&owners, Event::InherentPriority)
        .contributions()
    {
        if let HookValue::Int(value) = contribution.value {
            if best.map_or(true, |current| value.abs() > current.abs()) {
                best = Some(value);
            }
        }
    }
    best
}

/// Consult the field's active effects for a sort-direction override. Any
/// effect answering true flips the speed leg of the comparator to ascending.
fn speed_sort_ascending(field: &mut Battlefield) -> bool {
    match field.dispatch(Owner::Field, Event::SpeedSort) {
        DispatchOutcome::Collected(contributions) => contributions
            .iter()
            .any(|c| matches!(c.value, HookValue::Bool(true))),
        _ => false,
    }
}
