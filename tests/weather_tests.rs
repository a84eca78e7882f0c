use battle_effect_core::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

struct DampRock;

impl EffectBehavior for DampRock {
    fn id(&self) -> &'static str {
        "DampRockEffect"
    }

    fn kind(&self) -> EffectKind {
        EffectKind::HeldItem
    }

    fn survives_switch(&self) -> bool {
        true
    }

    fn inform(&mut self, _ctx: &mut EffectContext<'_>, notice: Notice) -> Option<i32> {
        match notice {
            Notice::ApplyWeather(GlobalSlot::Rain) => Some(8),
            _ => None,
        }
    }
}

struct AirLock;

impl EffectBehavior for AirLock {
    fn id(&self) -> &'static str {
        "AirLockEffect"
    }

    fn inform(&mut self, _ctx: &mut EffectContext<'_>, notice: Notice) -> Option<i32> {
        match notice {
            Notice::WeatherSuppression => Some(1),
            _ => None,
        }
    }
}

struct Floating {
    finished: Rc<Cell<u32>>,
}

impl EffectBehavior for Floating {
    fn id(&self) -> &'static str {
        "MagnetRiseEffect"
    }

    fn inform_finished(&mut self, _ctx: &mut EffectContext<'_>) {
        self.finished.set(self.finished.get() + 1);
    }
}

fn desert_field() -> Battlefield {
    let mut field = Battlefield::new();
    field.add_participant(Participant::new(
        "Tyranitar",
        61,
        160,
        vec![Element::Rock, Element::Ground],
    ));
    field.add_participant(Participant::new("Starmie", 115, 120, vec![Element::Water]));
    field
}

fn weather_flag_count(field: &mut Battlefield) -> usize {
    field.global_flags()[..5].iter().filter(|flag| **flag).count()
}

#[test]
fn at_most_one_weather_is_active_across_any_sequence() {
    let mut field = desert_field();
    let sequence = [
        GlobalSlot::Rain,
        GlobalSlot::Sun,
        GlobalSlot::Sun,
        GlobalSlot::Hail,
        GlobalSlot::Rain,
        GlobalSlot::Fog,
        GlobalSlot::Sand,
    ];
    for slot in sequence {
        let _ = field.apply_weather(0, slot);
        assert_eq!(weather_flag_count(&mut field), 1);
    }
    assert!(field.global_flags()[GlobalSlot::Sand.index()]);
}

#[test]
fn reapplying_the_active_weather_is_refused() {
    let mut field = desert_field();
    assert!(field.apply_weather(0, GlobalSlot::Sun).is_some());
    assert!(field.apply_weather(0, GlobalSlot::Sun).is_none());
    assert_eq!(field.log.count_lines("|-fieldstart|SunEffect"), 1);
}

#[test]
fn replacing_rain_with_sun_finalizes_rain_first() {
    let mut field = desert_field();
    field.apply_weather(0, GlobalSlot::Rain).expect("rain applied");
    field.apply_weather(0, GlobalSlot::Sun).expect("sun applied");

    assert_eq!(field.log.count_lines("|-fieldstart|RainEffect"), 1);
    assert_eq!(field.log.count_lines("|-fieldend|RainEffect"), 1);
    assert_eq!(field.log.count_lines("|-fieldstart|SunEffect"), 1);
    let lines = field.log.log_lines();
    let rain_end = lines
        .iter()
        .position(|line| line == "|-fieldend|RainEffect")
        .expect("rain ended");
    let sun_start = lines
        .iter()
        .position(|line| line == "|-fieldstart|SunEffect")
        .expect("sun started");
    assert!(rain_end < sun_start);

    assert!(field.query(Owner::Field, "RainEffect").is_none());
    let flags = field.global_flags();
    assert!(flags[GlobalSlot::Sun.index()]);
    assert!(!flags[GlobalSlot::Rain.index()]);
}

#[test]
fn removing_a_global_effect_is_idempotent() {
    let mut field = desert_field();
    field.apply_weather(0, GlobalSlot::Rain).expect("rain applied");
    assert!(field.remove_global_effect(GlobalSlot::Rain));
    assert!(!field.remove_global_effect(GlobalSlot::Rain));
    assert_eq!(field.log.count_lines("|-fieldend|RainEffect"), 1);
}

#[test]
fn damp_rock_stretches_rain_duration() {
    let mut field = desert_field();
    field
        .apply(Owner::Participant(1), Box::new(DampRock))
        .expect("applied");
    field.apply_weather(1, GlobalSlot::Rain).expect("rain applied");
    let view = field.query(Owner::Field, "RainEffect").expect("present");
    assert_eq!(view.turns, Some(8));
    // the item only answers for rain
    field.apply_weather(1, GlobalSlot::Sun).expect("sun applied");
    let view = field.query(Owner::Field, "SunEffect").expect("present");
    assert_eq!(view.turns, Some(5));
}

#[test]
fn weather_expires_after_five_turns() {
    let mut field = desert_field();
    field.apply_weather(0, GlobalSlot::Rain).expect("rain applied");
    for _ in 0..5 {
        field.run_tick();
    }
    assert!(field.query(Owner::Field, "RainEffect").is_none());
    assert_eq!(weather_flag_count(&mut field), 0);
    assert_eq!(field.log.count_lines("|-weather|RainEffect|upkeep"), 5);
    assert_eq!(field.log.count_lines("|-fieldend|RainEffect"), 1);
}

#[test]
fn sandstorm_spares_immune_elements() {
    let mut field = desert_field();
    field.apply_weather(0, GlobalSlot::Sand).expect("sand applied");
    field.run_tick();
    assert_eq!(field.participants[0].hp, 160);
    assert_eq!(field.participants[1].hp, 120 - 120 / 16);
    assert_eq!(field.log.count_lines("|-damage|Starmie"), 1);
}

#[test]
fn hail_spares_ice_types() {
    let mut field = Battlefield::new();
    field.add_participant(Participant::new("Glalie", 80, 160, vec![Element::Ice]));
    field.add_participant(Participant::new("Snorlax", 30, 160, vec![Element::Normal]));
    field.apply_weather(0, GlobalSlot::Hail).expect("hail applied");
    field.run_tick();
    assert_eq!(field.participants[0].hp, 160);
    assert_eq!(field.participants[1].hp, 160 - 160 / 16);
}

#[test]
fn suppression_masks_weather_flags_but_not_state() {
    let mut field = desert_field();
    field.apply_weather(0, GlobalSlot::Rain).expect("rain applied");
    field
        .apply(Owner::Participant(0), Box::new(AirLock))
        .expect("applied");

    let flags = field.global_flags();
    assert!(!flags[GlobalSlot::Rain.index()]);
    assert!(field.query(Owner::Field, "RainEffect").is_some());

    field.remove(Owner::Participant(0), "AirLockEffect");
    assert!(field.global_flags()[GlobalSlot::Rain.index()]);
}

#[test]
fn suppressed_sandstorm_deals_no_damage() {
    let mut field = desert_field();
    field
        .apply(Owner::Participant(0), Box::new(AirLock))
        .expect("applied");
    field.apply_weather(0, GlobalSlot::Sand).expect("sand applied");
    field.run_tick();
    assert_eq!(field.participants[1].hp, 120);
    assert_eq!(field.log.count_lines("|-damage"), 0);
}

#[test]
fn rain_boosts_water_and_dampens_fire() {
    let mut field = desert_field();
    field.apply_weather(0, GlobalSlot::Rain).expect("rain applied");

    let surf = ActionRef::new("Surf", Element::Water);
    let boosted = field.collect_damage_modifiers(1, 0, surf, false, 1);
    assert_eq!(
        boosted,
        vec![ModifierContribution {
            source: "RainEffect",
            group: 3,
            multiplier: 1.5,
        }]
    );

    let flamethrower = ActionRef::new("Flamethrower", Element::Fire);
    let dampened = field.collect_damage_modifiers(1, 0, flamethrower, false, 1);
    assert_eq!(dampened[0].multiplier, 0.5);

    let tackle = ActionRef::new("Tackle", Element::Normal);
    assert!(field.collect_damage_modifiers(1, 0, tackle, false, 1).is_empty());

    // suppression silences the modifier without removing the weather
    field
        .apply(Owner::Participant(0), Box::new(AirLock))
        .expect("applied");
    assert!(field.collect_damage_modifiers(1, 0, surf, false, 1).is_empty());
}

#[test]
fn sandstorm_raises_rock_special_defense() {
    let mut field = desert_field();
    field.apply_weather(0, GlobalSlot::Sand).expect("sand applied");
    let factors = field.stat_modifier_factors(Stat::SpDefense, 0, None);
    assert_eq!(factors, vec![GroupFactor { group: 3, factor: 1.5 }]);
    assert!(field.stat_modifier_factors(Stat::SpDefense, 1, None).is_empty());
}

#[test]
fn gravity_vetoes_airborne_actions() {
    let mut field = desert_field();
    field
        .apply_global_effect(None, GlobalSlot::Gravity)
        .expect("gravity applied");
    let fly = ActionRef::new("Fly", Element::Flying);
    let surf = ActionRef::new("Surf", Element::Water);
    assert!(field.veto_selection(0, fly));
    assert!(!field.veto_selection(0, surf));
    assert!(field.veto_execution(0, None, fly));
    assert_eq!(field.log.count_lines("|-activate|GravityEffect|veto"), 1);
    // a resolved target means the action is already past its airborne stage
    assert!(!field.veto_execution(0, Some(1), fly));
}

#[test]
fn gravity_grounds_magnet_rise() {
    let mut field = desert_field();
    let finished = Rc::new(Cell::new(0));
    field
        .apply(
            Owner::Participant(1),
            Box::new(Floating {
                finished: Rc::clone(&finished),
            }),
        )
        .expect("applied");
    field
        .apply_global_effect(None, GlobalSlot::Gravity)
        .expect("gravity applied");
    assert!(field.query(Owner::Participant(1), "MagnetRiseEffect").is_none());
    assert_eq!(finished.get(), 1);
}

#[test]
fn gravity_sharpens_accuracy() {
    let mut field = desert_field();
    field
        .apply_global_effect(None, GlobalSlot::Gravity)
        .expect("gravity applied");
    let factors = field.stat_modifier_factors(Stat::Accuracy, 0, Some(1));
    assert_eq!(factors, vec![GroupFactor { group: 12, factor: 1.6 }]);
}

#[test]
fn uproar_ends_when_the_last_singer_stops() {
    let mut field = desert_field();
    field
        .apply_global_effect(Some(0), GlobalSlot::Uproar)
        .expect("uproar applied");
    field.dispatch(Owner::Field, Event::Notice(Notice::UproarStarted));
    field.dispatch(Owner::Field, Event::Notice(Notice::UproarStarted));

    field.dispatch(Owner::Field, Event::Notice(Notice::UproarStopped));
    assert!(field.query(Owner::Field, "UproarEffect").is_some());

    field.dispatch(Owner::Field, Event::Notice(Notice::UproarStopped));
    assert!(field.query(Owner::Field, "UproarEffect").is_none());
    assert!(!field.global_flags()[GlobalSlot::Uproar.index()]);
}

#[test]
fn uproar_never_expires_on_its_own() {
    let mut field = desert_field();
    field
        .apply_global_effect(Some(0), GlobalSlot::Uproar)
        .expect("uproar applied");
    field.dispatch(Owner::Field, Event::Notice(Notice::UproarStarted));
    for _ in 0..10 {
        field.run_tick();
    }
    assert!(field.query(Owner::Field, "UproarEffect").is_some());
}
