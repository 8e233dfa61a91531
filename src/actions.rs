use crate::error::{PetError, PetResult};
use crate::leveling::{add_xp, LevelUp};
use crate::model::{clamp_meter, Pet};
use std::fmt;
use std::str::FromStr;

pub const HEAL_COST: u32 = 20;
const HEAL_AMOUNT: f32 = 30.0;
const REST_SICK_HEAL: f32 = 5.0;
const RECOVERY_HEALTH: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Feed,
    Play,
    Rest,
    Train,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionEffect {
    pub hunger: f32,
    pub energy: f32,
    pub fun: f32,
    pub happiness: f32,
    pub xp: u32,
    pub coins: u32,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Feed,
        ActionKind::Play,
        ActionKind::Rest,
        ActionKind::Train,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ActionKind::Feed => "feed",
            ActionKind::Play => "play",
            ActionKind::Rest => "rest",
            ActionKind::Train => "train",
        }
    }

    pub fn effect(self) -> ActionEffect {
        let (hunger, energy, fun, happiness, xp, coins) = match self {
            ActionKind::Feed => (-30.0, -5.0, 5.0, 10.0, 10, 5),
            ActionKind::Play => (10.0, -15.0, 25.0, 20.0, 15, 8),
            ActionKind::Rest => (5.0, 30.0, -10.0, 5.0, 5, 2),
            ActionKind::Train => (15.0, -20.0, 10.0, -5.0, 25, 10),
        };
        ActionEffect {
            hunger,
            energy,
            fun,
            happiness,
            xp,
            coins,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ActionKind::Feed => "Yum! +5 coins",
            ActionKind::Play => "Fun! +8 coins",
            ActionKind::Rest => "Rest! +2 coins",
            ActionKind::Train => "Train! +10 coins",
        }
    }

    /// Precondition check; touches nothing.
    pub fn check(self, pet: &Pet) -> PetResult<()> {
        let m = &pet.meters;
        let asleep = pet.flags.sleeping;
        match self {
            ActionKind::Feed => {
                if asleep {
                    return Err(PetError::asleep());
                }
                if m.hunger <= 10.0 {
                    return Err(PetError::precondition("Not hungry right now."));
                }
            }
            ActionKind::Play => {
                if asleep {
                    return Err(PetError::asleep());
                }
                if m.energy < 10.0 {
                    return Err(PetError::precondition("Too tired! Rest first."));
                }
                if m.health < 30.0 {
                    return Err(PetError::precondition("Too sick to play."));
                }
            }
            // Resting is allowed while asleep.
            ActionKind::Rest => {
                if m.energy >= 90.0 {
                    return Err(PetError::precondition("Already well rested."));
                }
            }
            ActionKind::Train => {
                if asleep {
                    return Err(PetError::asleep());
                }
                if m.energy < 20.0 {
                    return Err(PetError::precondition("Too tired! Rest first."));
                }
                if m.health < 50.0 {
                    return Err(PetError::precondition("Too sick to train."));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ActionKind {
    type Err = PetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.id() == s)
            .ok_or_else(|| PetError::invalid(format!("Unknown action '{s}'")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub level_up: Option<LevelUp>,
    pub cured: bool,
}

pub fn perform(pet: &mut Pet, kind: ActionKind) -> PetResult<ActionOutcome> {
    kind.check(pet)?;

    let e = kind.effect();
    let m = &mut pet.meters;
    m.hunger = clamp_meter(m.hunger + e.hunger);
    m.energy = clamp_meter(m.energy + e.energy);
    m.fun = clamp_meter(m.fun + e.fun);
    m.happiness = clamp_meter(m.happiness + e.happiness);

    let mut cured = false;
    if kind == ActionKind::Rest {
        pet.consecutive_plays = 0;
        if pet.flags.sick {
            m.health = clamp_meter(m.health + REST_SICK_HEAL);
            if m.health >= RECOVERY_HEALTH {
                pet.flags.sick = false;
                cured = true;
            }
        }
    }

    pet.coins = pet.coins.saturating_add(e.coins);
    let level_up = add_xp(pet, e.xp);
    log::debug!("{} performed {}", pet.name, kind);
    Ok(ActionOutcome {
        kind,
        level_up,
        cured,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealOutcome {
    pub cured: bool,
}

pub fn heal(pet: &mut Pet) -> PetResult<HealOutcome> {
    if pet.flags.sleeping {
        return Err(PetError::asleep());
    }
    if pet.coins < HEAL_COST {
        return Err(PetError::precondition("Not enough coins!"));
    }
    pet.coins -= HEAL_COST;
    pet.meters.health = clamp_meter(pet.meters.health + HEAL_AMOUNT);
    let cured = pet.flags.sick && pet.meters.health >= RECOVERY_HEALTH;
    if cured {
        pet.flags.sick = false;
        log::info!("{} was cured", pet.name);
    }
    Ok(HealOutcome { cured })
}

/// Flips sleep. Returns the new sleeping state.
pub fn toggle_sleep(pet: &mut Pet, minigame_running: bool) -> PetResult<bool> {
    if minigame_running {
        return Err(PetError::precondition("Finish the game first."));
    }
    pet.flags.sleeping = !pet.flags.sleeping;
    if pet.flags.sleeping {
        pet.consecutive_plays = 0;
    }
    Ok(pet.flags.sleeping)
}
