use serde::{Deserialize, Serialize};

pub const METER_MIN: f32 = 0.0;
pub const METER_MAX: f32 = 100.0;
pub const NAME_MAX: usize = 18;

pub(crate) fn clamp_meter(v: f32) -> f32 {
    v.clamp(METER_MIN, METER_MAX)
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Bear,
    Dog,
    Elephant,
    Cat,
    Bunny,
}

impl Species {
    pub const ALL: [Species; 5] = [
        Species::Bear,
        Species::Dog,
        Species::Elephant,
        Species::Cat,
        Species::Bunny,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Species::Bear => "bear",
            Species::Dog => "dog",
            Species::Elephant => "elephant",
            Species::Cat => "cat",
            Species::Bunny => "bunny",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn default_name(self) -> &'static str {
        match self {
            Species::Bear => "Beruang",
            Species::Dog => "Guguk",
            Species::Elephant => "Gajah",
            Species::Cat => "Kucing",
            Species::Bunny => "Kelinci",
        }
    }
}

/// The five bounded attributes. Hunger is inverted: 100 is starving.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Meters {
    pub happiness: f32,
    pub hunger: f32,
    pub energy: f32,
    pub fun: f32,
    pub health: f32,
}

impl Default for Meters {
    fn default() -> Self {
        Self {
            happiness: 80.0,
            hunger: 50.0,
            energy: 80.0,
            fun: 70.0,
            health: 100.0,
        }
    }
}

impl Meters {
    pub fn clamp_all(&mut self) {
        self.happiness = clamp_meter(self.happiness);
        self.hunger = clamp_meter(self.hunger);
        self.energy = clamp_meter(self.energy);
        self.fun = clamp_meter(self.fun);
        self.health = clamp_meter(self.health);
    }

    pub fn in_bounds(&self) -> bool {
        [self.happiness, self.hunger, self.energy, self.fun, self.health]
            .iter()
            .all(|v| (METER_MIN..=METER_MAX).contains(v))
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flags {
    pub sick: bool,
    pub sleeping: bool,
}

/// Apparel attachment point. Shirts have their own slot; accessories are
/// further split by where they sit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Shirt,
    Hat,
    Bow,
    Glasses,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Shirt, Slot::Hat, Slot::Bow, Slot::Glasses];

    pub fn id(self) -> &'static str {
        match self {
            Slot::Shirt => "shirt",
            Slot::Hat => "hat",
            Slot::Bow => "bow",
            Slot::Glasses => "glasses",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

/// A purchased, single-use food item.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnedFood {
    pub id: u32,
    pub name: String,
    pub cost: u32,
    pub icon: String,
    pub happy: i32,
    pub heal: i32,
    pub fill: i32,
    /// Unix milliseconds.
    pub bought_at: i64,
}

/// A purchased, reusable clothing item.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Apparel {
    pub id: u32,
    pub name: String,
    pub cost: u32,
    pub icon: String,
    pub color: String,
    #[serde(rename = "type")]
    pub slot: Slot,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inventory {
    pub foods: Vec<OwnedFood>,
    pub clothes: Vec<Apparel>,
    pub equipped: Vec<Apparel>,
}

impl Inventory {
    pub fn owns(&self, id: u32) -> bool {
        self.foods.iter().any(|f| f.id == id) || self.clothes.iter().any(|c| c.id == id)
    }

    pub fn equipped_in(&self, slot: Slot) -> Option<&Apparel> {
        self.equipped.iter().find(|a| a.slot == slot)
    }

    pub fn is_equipped(&self, id: u32) -> bool {
        self.equipped.iter().any(|a| a.id == id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pet {
    pub species: Species,
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub meters: Meters,
    pub flags: Flags,
    pub coins: u32,
    pub inventory: Inventory,
    pub consecutive_plays: u32,
}

impl Default for Pet {
    fn default() -> Self {
        Self {
            species: Species::Bear,
            name: "Mochi".to_string(),
            level: 1,
            xp: 0,
            xp_to_next: crate::leveling::BASE_THRESHOLD,
            meters: Meters::default(),
            flags: Flags::default(),
            coins: 100,
            inventory: Inventory::default(),
            consecutive_plays: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Sick,
    Angry,
    Sad,
    Happy,
    Normal,
}

impl Mood {
    pub fn label(self) -> &'static str {
        match self {
            Mood::Sick => "Sick",
            Mood::Angry => "Angry",
            Mood::Sad => "Sad",
            Mood::Happy => "Happy",
            Mood::Normal => "Okay",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DecayRates {
    pub hunger: f32,
    pub energy_drain: f32,
    pub energy_regen: f32,
    pub fun: f32,
    pub happiness: f32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            hunger: 1.0,
            energy_drain: 0.3,
            energy_regen: 1.0,
            fun: 2.0,
            happiness: 0.5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Rules {
    pub tick_secs: u64,
    pub catchup_max_secs: i64,
    pub decay: DecayRates,
    pub sick_hunger_threshold: f32,
    pub sick_chance: f64,
    pub sick_onset_damage: f32,
    pub sick_drain: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            tick_secs: 3,
            catchup_max_secs: 7 * 24 * 3600,
            decay: DecayRates::default(),
            sick_hunger_threshold: 85.0,
            sick_chance: 0.03,
            sick_onset_damage: 10.0,
            sick_drain: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_ids_round_trip() {
        for s in Species::ALL {
            assert_eq!(Species::from_id(s.id()), Some(s));
        }
        assert_eq!(Species::from_id("dragon"), None);
    }

    #[test]
    fn slot_ids_round_trip() {
        for s in Slot::ALL {
            assert_eq!(Slot::from_id(s.id()), Some(s));
        }
        assert_eq!(Slot::from_id("cape"), None);
    }

    #[test]
    fn clamp_all_pulls_meters_back_in_range() {
        let mut m = Meters {
            happiness: 120.0,
            hunger: -4.0,
            energy: 50.0,
            fun: 101.0,
            health: -0.5,
        };
        m.clamp_all();
        assert!(m.in_bounds());
        assert_eq!(m.happiness, 100.0);
        assert_eq!(m.hunger, 0.0);
    }
}
