use crate::sim::effect::{EffectBehavior, EffectId, EffectKind};
use std::collections::HashMap;

/// One entry of a registry. The boxed behavior is taken out of the slot while
/// one of its hooks runs ("checked out"), so a hook can freely mutate the rest
/// of the world without aliasing itself.
pub(crate) struct Slot {
    pub(crate) serial: u64,
    pub(crate) id: EffectId,
    pub(crate) kind: EffectKind,
    pub(crate) turns: Option<i32>,
    /// Removal was requested while the behavior was checked out; the
    /// dispatcher finalizes and detaches once the hook returns.
    pub(crate) doomed: bool,
    pub(crate) behavior: Option<Box<dyn EffectBehavior>>,
}

pub(crate) enum Doom {
    NotFound,
    /// Behavior was live; run the finalize hook and then call
    /// [`EffectRegistry::detach`].
    TakeNow(u64, Box<dyn EffectBehavior>),
    /// Behavior is checked out; the in-flight dispatch finalizes it.
    Deferred,
}

/// Ordered collection of the effects applied to one owner. Insertion order is
/// the stable enumeration order; membership is indexed by id.
#[derive(Default)]
pub struct EffectRegistry {
    slots: Vec<Slot>,
    index: HashMap<EffectId, usize>,
    next_serial: u64,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Ids in insertion order; includes entries pending removal.
    pub fn ids(&self) -> Vec<EffectId> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    pub(crate) fn insert(
        &mut self,
        behavior: Box<dyn EffectBehavior>,
        turns: Option<i32>,
    ) -> u64 {
        self.next_serial += 1;
        let serial = self.next_serial;
        let slot = Slot {
            serial,
            id: behavior.id(),
            kind: behavior.kind(),
            turns,
            doomed: false,
            behavior: Some(behavior),
        };
        self.index.insert(slot.id, self.slots.len());
        self.slots.push(slot);
        serial
    }

    pub(crate) fn slot(&self, id: &str) -> Option<&Slot> {
        self.index.get(id).map(|&pos| &self.slots[pos])
    }

    pub(crate) fn slot_by_serial(&self, serial: u64) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.serial == serial)
    }

    fn slot_by_serial_mut(&mut self, serial: u64) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.serial == serial)
    }

    /// Snapshot of (serial, id) pairs for a dispatch pass. Serials make the
    /// snapshot immune to an id being removed and re-applied mid-pass.
    pub(crate) fn snapshot(&self) -> Vec<(u64, EffectId)> {
        self.slots
            .iter()
            .map(|slot| (slot.serial, slot.id))
            .collect()
    }

    /// Take the behavior out for a hook invocation. Fails for entries that
    /// are gone, pending removal, or already checked out.
    pub(crate) fn checkout(&mut self, serial: u64) -> Option<Box<dyn EffectBehavior>> {
        let slot = self.slot_by_serial_mut(serial)?;
        if slot.doomed {
            return None;
        }
        slot.behavior.take()
    }

    pub(crate) fn restore(&mut self, serial: u64, behavior: Box<dyn EffectBehavior>) {
        if let Some(slot) = self.slot_by_serial_mut(serial) {
            slot.behavior = Some(behavior);
        }
    }

    /// Begin removal. The caller owns running the finalize hook; see [`Doom`].
    pub(crate) fn doom(&mut self, id: &str) -> Doom {
        let Some(&pos) = self.index.get(id) else {
            return Doom::NotFound;
        };
        let slot = &mut self.slots[pos];
        if slot.doomed {
            return Doom::NotFound;
        }
        slot.doomed = true;
        match slot.behavior.take() {
            Some(behavior) => Doom::TakeNow(slot.serial, behavior),
            None => Doom::Deferred,
        }
    }

    /// Physically remove a doomed entry and re-key the id index.
    pub(crate) fn detach(&mut self, serial: u64) {
        let Some(pos) = self.slots.iter().position(|slot| slot.serial == serial) else {
            return;
        };
        self.slots.remove(pos);
        self.index.clear();
        for (pos, slot) in self.slots.iter().enumerate() {
            self.index.insert(slot.id, pos);
        }
    }

    pub(crate) fn is_doomed(&self, serial: u64) -> bool {
        self.slot_by_serial(serial).map_or(false, |slot| slot.doomed)
    }

    pub(crate) fn behavior_ref(&self, serial: u64) -> Option<&dyn EffectBehavior> {
        self.slot_by_serial(serial)?.behavior.as_deref()
    }

    pub(crate) fn veto_tier(&self, serial: u64) -> i32 {
        self.behavior_ref(serial).map_or(0, |b| b.veto_tier())
    }

    pub fn turns(&self, id: &str) -> Option<i32> {
        self.slot(id).and_then(|slot| slot.turns)
    }

    pub(crate) fn set_turns(&mut self, id: &str, turns: i32) {
        if let Some(&pos) = self.index.get(id) {
            self.slots[pos].turns = Some(turns);
        }
    }

    pub(crate) fn set_turns_by_serial(&mut self, serial: u64, turns: i32) {
        if let Some(slot) = self.slot_by_serial_mut(serial) {
            slot.turns = Some(turns);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effect::EffectId;

    struct Dummy {
        id: EffectId,
    }

    impl EffectBehavior for Dummy {
        fn id(&self) -> EffectId {
            self.id
        }
    }

    #[test]
    fn insert_and_lookup_by_id() {
        let mut registry = EffectRegistry::new();
        registry.insert(Box::new(Dummy { id: "BurnEffect" }), None);
        registry.insert(Box::new(Dummy { id: "LeechSeedEffect" }), Some(5));
        assert!(registry.contains("BurnEffect"));
        assert_eq!(registry.turns("LeechSeedEffect"), Some(5));
        assert_eq!(registry.ids(), vec!["BurnEffect", "LeechSeedEffect"]);
    }

    #[test]
    fn checkout_blocks_double_invocation() {
        let mut registry = EffectRegistry::new();
        let serial = registry.insert(Box::new(Dummy { id: "BurnEffect" }), None);
        let behavior = registry.checkout(serial).expect("first checkout");
        assert!(registry.checkout(serial).is_none());
        registry.restore(serial, behavior);
        assert!(registry.checkout(serial).is_some());
    }

    #[test]
    fn doom_while_checked_out_is_deferred() {
        let mut registry = EffectRegistry::new();
        let serial = registry.insert(Box::new(Dummy { id: "BurnEffect" }), None);
        let _behavior = registry.checkout(serial).expect("checkout");
        assert!(matches!(registry.doom("BurnEffect"), Doom::Deferred));
        // a second removal request is a no-op
        assert!(matches!(registry.doom("BurnEffect"), Doom::NotFound));
        assert!(registry.is_doomed(serial));
    }

    #[test]
    fn detach_rekeys_the_index() {
        let mut registry = EffectRegistry::new();
        let first = registry.insert(Box::new(Dummy { id: "BurnEffect" }), None);
        registry.insert(Box::new(Dummy { id: "LeechSeedEffect" }), None);
        match registry.doom("BurnEffect") {
            Doom::TakeNow(serial, _behavior) => {
                assert_eq!(serial, first);
                registry.detach(serial);
            }
            _ => panic!("expected a live removal"),
        }
        assert!(!registry.contains("BurnEffect"));
        assert!(registry.contains("LeechSeedEffect"));
        assert_eq!(registry.len(), 1);
    }
}
