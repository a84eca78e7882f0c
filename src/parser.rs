use crate::sim::effect::Element;
use crate::sim::field::{Battlefield, Participant};
use crate::sim::global::GlobalSlot;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// Declarative battlefield setup, typically loaded from JSON.
#[derive(Clone, Debug, Deserialize)]
pub struct FieldSetup {
    #[serde(default)]
    pub seed: u64,
    pub participants: Vec<ParticipantSetup>,
    #[serde(default)]
    pub weather: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ParticipantSetup {
    pub name: String,
    pub speed: u32,
    pub hp: u32,
    #[serde(default)]
    pub elements: Vec<String>,
}

/// Parse a JSON field setup and build the battlefield it describes.
pub fn parse_field_setup(json: &str) -> Result<Battlefield> {
    let setup: FieldSetup = serde_json::from_str(json).context("invalid field setup")?;
    build_field(&setup)
}

pub fn build_field(setup: &FieldSetup) -> Result<Battlefield> {
    if setup.participants.is_empty() {
        return Err(anyhow!("field setup needs at least one participant"));
    }
    let mut field = Battlefield::new();
    for participant in &setup.participants {
        let elements = participant
            .elements
            .iter()
            .map(|name| {
                Element::from_name(name).ok_or_else(|| anyhow!("unknown element '{}'", name))
            })
            .collect::<Result<Vec<_>>>()?;
        field.add_participant(Participant::new(
            &participant.name,
            participant.speed,
            participant.hp,
            elements,
        ));
    }
    if let Some(weather) = &setup.weather {
        let slot = GlobalSlot::from_name(weather)
            .ok_or_else(|| anyhow!("unknown global effect '{}'", weather))?;
        if !slot.is_weather() {
            return Err(anyhow!("'{}' is not a weather effect", weather));
        }
        let _ = field.apply_weather(0, slot);
    }
    Ok(field)
}
