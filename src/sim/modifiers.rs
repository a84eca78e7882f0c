use crate::sim::dispatch::{Event, HookValue};
use crate::sim::effect::{ActionRef, EffectId, Owner, Stat};
use crate::sim::field::Battlefield;
use std::collections::HashSet;

/// One collected multiplicative contribution, tagged with the effect that
/// proposed it. Contributions sharing a source tag never stack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModifierContribution {
    pub source: EffectId,
    pub group: i32,
    pub multiplier: f32,
}

/// Combined factor of one group, in ascending group order. The host applies
/// these one group at a time (flooring between groups if its numeric
/// semantics call for it); the runtime never does battle arithmetic itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupFactor {
    pub group: i32,
    pub factor: f32,
}

/// Partition contributions by group and combine each group into a single
/// factor. Within a group simultaneous contributions multiply together;
/// across groups the output is ordered ascending so the host applies them
/// deterministically. Duplicate source tags keep the first (dispatch-ordered)
/// contribution only.
pub fn aggregate(contributions: &[ModifierContribution]) -> Vec<GroupFactor> {
    let mut seen: HashSet<EffectId> = HashSet::new();
    let mut deduped: Vec<ModifierContribution> = Vec::new();
    for contribution in contributions {
        if seen.insert(contribution.source) {
            deduped.push(*contribution);
        }
    }
    deduped.sort_by_key(|contribution| contribution.group);

    let mut factors: Vec<GroupFactor> = Vec::new();
    for contribution in deduped {
        match factors.last_mut() {
            Some(last) if last.group == contribution.group => {
                last.factor *= contribution.multiplier;
            }
            _ => factors.push(GroupFactor {
                group: contribution.group,
                factor: contribution.multiplier,
            }),
        }
    }
    factors
}

impl Battlefield {
    /// Collect damage-modifier contributions for one application point
    /// (`tier`) of the host's damage formula, from the user's, the target's,
    /// and the field's active effects.
    pub fn collect_damage_modifiers(
        &mut self,
        user: usize,
        target: usize,
        action: ActionRef,
        critical: bool,
        tier: u8,
    ) -> Vec<ModifierContribution> {
        let mut owners = vec![Owner::Participant(user)];
        if target != user {
            owners.push(Owner::Participant(target));
        }
        owners.push(Owner::Field);
        let event = Event::Modifier {
            user,
            target,
            action,
            critical,
        };
        self.dispatch_all(&owners, event)
            .contributions()
            .into_iter()
            .filter_map(|contribution| match contribution.value {
                HookValue::Damage(modifier) if modifier.tier == tier => {
                    Some(ModifierContribution {
                        source: contribution.source,
                        group: modifier.group,
                        multiplier: modifier.multiplier,
                    })
                }
                _ => None,
            })
            .collect()
    }

    /// Collect stat-modifier contributions from the subject's and the
    /// field's active effects.
    pub fn collect_stat_modifiers(
        &mut self,
        stat: Stat,
        subject: usize,
        target: Option<usize>,
    ) -> Vec<ModifierContribution> {
        let owners = [Owner::Participant(subject), Owner::Field];
        let event = Event::StatModifier {
            stat,
            subject,
            target,
        };
        self.dispatch_all(&owners, event)
            .contributions()
            .into_iter()
            .filter_map(|contribution| match contribution.value {
                HookValue::Stat(modifier) => Some(ModifierContribution {
                    source: contribution.source,
                    group: modifier.group,
                    multiplier: modifier.multiplier,
                }),
                _ => None,
            })
            .collect()
    }

    /// Convenience: collect and aggregate in one call.
    pub fn stat_modifier_factors(
        &mut self,
        stat: Stat,
        subject: usize,
        target: Option<usize>,
    ) -> Vec<GroupFactor> {
        let contributions = self.collect_stat_modifiers(stat, subject, target);
        aggregate(&contributions)
    }
}
