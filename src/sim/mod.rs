pub mod dispatch;
pub mod effect;
pub mod field;
pub mod global;
pub mod modifiers;
pub mod priority;
pub mod registry;

pub use field::{Battlefield, Participant};
