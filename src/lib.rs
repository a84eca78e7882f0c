//! Effect/status runtime for a turn-based battle simulator.
//!
//! The main entry point is [`sim::field::Battlefield`], which owns the
//! per-owner effect registries, the event dispatcher, and the global-effect
//! exclusivity controller.

pub mod field_log;
pub mod parser;
pub mod sim;
pub mod text;

pub use parser::parse_field_setup;

/// Commonly used exports for external consumers.
pub mod prelude {
    pub use crate::parser::{parse_field_setup, FieldSetup};
    pub use crate::sim::dispatch::{Combine, DispatchOutcome, Event, HookValue};
    pub use crate::sim::effect::{
        ActionRef, EffectBehavior, EffectHandle, EffectKind, EffectState, EffectView, Element,
        Modifier, Notice, Owner, Stat, StatModifier,
    };
    pub use crate::sim::field::{Battlefield, EffectContext, Participant};
    pub use crate::sim::global::{GlobalSlot, GLOBAL_EFFECT_IDS};
    pub use crate::sim::modifiers::{aggregate, GroupFactor, ModifierContribution};
    pub use crate::sim::priority::{resolve_order, ActorSeed};
}
