//! Message templates for the runtime-owned global effects.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize)]
struct Texts {
    effects: HashMap<String, EffectText>,
}

#[derive(Deserialize)]
struct EffectText {
    start: Option<String>,
    upkeep: Option<String>,
    end: Option<String>,
}

static TEXTS: Lazy<Texts> = Lazy::new(|| {
    let json_str = include_str!("../texts/en.json");
    serde_json::from_str(json_str).expect("Failed to parse texts/en.json")
});

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextPhase {
    Start,
    Upkeep,
    End,
}

/// Template for an effect id and lifecycle phase; `None` for silent phases.
pub fn effect_text(effect: &str, phase: TextPhase) -> Option<&'static str> {
    let texts: &'static Texts = &TEXTS;
    let entry = texts.effects.get(effect)?;
    let text = match phase {
        TextPhase::Start => entry.start.as_ref(),
        TextPhase::Upkeep => entry.upkeep.as_ref(),
        TextPhase::End => entry.end.as_ref(),
    };
    text.map(|s| s.as_str())
}
