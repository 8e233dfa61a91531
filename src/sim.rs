use crate::model::{clamp_meter, Meters, Mood, Pet, Rules, METER_MAX};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub fell_sick: bool,
    pub woke_up: bool,
}

/// One decay tick. Hunger, fun and happiness drift every tick, asleep or not;
/// energy drains while awake and regenerates while asleep.
pub fn decay_tick<R: Rng + ?Sized>(pet: &mut Pet, rules: &Rules, rng: &mut R) -> TickReport {
    let mut report = TickReport::default();
    let d = rules.decay;
    let m = &mut pet.meters;

    m.hunger = clamp_meter(m.hunger + d.hunger);
    m.energy = if pet.flags.sleeping {
        clamp_meter(m.energy + d.energy_regen)
    } else {
        clamp_meter(m.energy - d.energy_drain)
    };
    m.fun = clamp_meter(m.fun - d.fun);
    m.happiness = clamp_meter(m.happiness - d.happiness);

    if !pet.flags.sick {
        if m.hunger > rules.sick_hunger_threshold && rng.gen_bool(rules.sick_chance) {
            pet.flags.sick = true;
            m.health = clamp_meter(m.health - rules.sick_onset_damage);
            report.fell_sick = true;
            log::info!("{} fell sick (hunger {:.0})", pet.name, m.hunger);
        }
    } else {
        m.health = clamp_meter(m.health - rules.sick_drain);
        m.happiness = clamp_meter(m.happiness - rules.sick_drain);
    }

    if pet.flags.sleeping && m.energy >= METER_MAX {
        pet.flags.sleeping = false;
        report.woke_up = true;
    }

    report
}

/// Display mood. Derived on demand, never stored.
pub fn classify_mood(pet: &Pet) -> Mood {
    mood_for(&pet.meters, pet.flags.sick)
}

fn mood_for(m: &Meters, sick: bool) -> Mood {
    if sick {
        return Mood::Sick;
    }
    if m.hunger > 90.0 {
        return Mood::Angry;
    }
    if m.happiness < 30.0 {
        return Mood::Sad;
    }
    if m.happiness > 80.0 {
        return Mood::Happy;
    }
    Mood::Normal
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchupSummary {
    pub ticks_simulated: u64,
    pub became_sick: bool,
    pub woke_up: bool,
    pub hunger_max: f32,
    pub happiness_min: f32,
    pub health_min: f32,
}

impl CatchupSummary {
    pub fn new(pet: &Pet) -> Self {
        Self {
            ticks_simulated: 0,
            became_sick: false,
            woke_up: false,
            hunger_max: pet.meters.hunger,
            happiness_min: pet.meters.happiness,
            health_min: pet.meters.health,
        }
    }

    pub fn has_anything(&self) -> bool {
        self.ticks_simulated > 0
            && (self.became_sick
                || self.woke_up
                || self.hunger_max > 70.0
                || self.happiness_min < 40.0
                || self.health_min < 60.0)
    }

    fn record(&mut self, pet: &Pet, report: TickReport) {
        self.ticks_simulated += 1;
        self.hunger_max = self.hunger_max.max(pet.meters.hunger);
        self.happiness_min = self.happiness_min.min(pet.meters.happiness);
        self.health_min = self.health_min.min(pet.meters.health);
        self.became_sick |= report.fell_sick;
        self.woke_up |= report.woke_up;
    }
}

/// Replays the decay ticks that would have run between `last_seen` and `now`,
/// capped at `rules.catchup_max_secs`.
pub fn catch_up<R: Rng + ?Sized>(
    pet: &mut Pet,
    last_seen: DateTime<Utc>,
    now: DateTime<Utc>,
    rules: &Rules,
    rng: &mut R,
) -> CatchupSummary {
    let elapsed = now - last_seen;
    let max_elapsed = ChronoDuration::seconds(rules.catchup_max_secs.max(0));
    let elapsed = elapsed.clamp(ChronoDuration::zero(), max_elapsed);

    let mut summary = CatchupSummary::new(pet);
    let ticks = elapsed.num_seconds().max(0) as u64 / rules.tick_secs.max(1);
    for _ in 0..ticks {
        let report = decay_tick(pet, rules, rng);
        summary.record(pet, report);
    }
    if ticks > 0 {
        log::info!("caught up {} offline ticks", ticks);
    }
    summary
}
