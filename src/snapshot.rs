//! The persisted form of a pet. Field names and nesting match the save format
//! the web client used, so old saves load unchanged.

use crate::leveling::threshold_for_level;
use crate::model::{Apparel, Flags, Inventory, Meters, OwnedFood, Pet, Slot, Species, NAME_MAX};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    #[serde(rename = "type")]
    pub species: Species,
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub happiness: f32,
    pub hunger: f32,
    pub energy: f32,
    pub fun: f32,
    pub health: f32,
    pub coins: u32,
    pub is_sick: bool,
    pub is_sleeping: bool,
    pub foods: Vec<OwnedFood>,
    pub clothes: Vec<Apparel>,
    pub equipped_clothes: Vec<Apparel>,
    pub consecutive_plays: u32,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot::from(&Pet::default())
    }
}

impl From<&Pet> for Snapshot {
    fn from(pet: &Pet) -> Self {
        let m = pet.meters;
        Self {
            species: pet.species,
            name: pet.name.clone(),
            level: pet.level,
            xp: pet.xp,
            xp_to_next: pet.xp_to_next,
            happiness: m.happiness,
            hunger: m.hunger,
            energy: m.energy,
            fun: m.fun,
            health: m.health,
            coins: pet.coins,
            is_sick: pet.flags.sick,
            is_sleeping: pet.flags.sleeping,
            foods: pet.inventory.foods.clone(),
            clothes: pet.inventory.clothes.clone(),
            equipped_clothes: pet.inventory.equipped.clone(),
            consecutive_plays: pet.consecutive_plays,
        }
    }
}

impl Snapshot {
    /// Rebuilds a pet, repairing anything a hand-edited or older save could
    /// get wrong: meters are clamped, duplicate ids dropped, equipped items
    /// must be owned and unique per slot, the xp threshold is recomputed from
    /// the level, and xp past that threshold is dropped rather than paid out.
    pub fn into_pet(self) -> Pet {
        let mut meters = Meters {
            happiness: finite_or(self.happiness, 0.0),
            hunger: finite_or(self.hunger, 0.0),
            energy: finite_or(self.energy, 0.0),
            fun: finite_or(self.fun, 0.0),
            health: finite_or(self.health, 0.0),
        };
        meters.clamp_all();

        let mut seen = HashSet::new();
        let foods: Vec<OwnedFood> = self
            .foods
            .into_iter()
            .filter(|f| seen.insert(f.id))
            .collect();
        let clothes: Vec<Apparel> = self
            .clothes
            .into_iter()
            .filter(|c| seen.insert(c.id))
            .collect();
        let mut slots: HashSet<Slot> = HashSet::new();
        let equipped: Vec<Apparel> = self
            .equipped_clothes
            .into_iter()
            .filter(|e| clothes.iter().any(|c| c.id == e.id) && slots.insert(e.slot))
            .collect();

        let mut name: String = self.name.trim().chars().take(NAME_MAX).collect();
        if name.is_empty() {
            name = self.species.default_name().to_string();
        }

        let level = self.level.max(1);
        let xp_to_next = threshold_for_level(level);
        if self.xp_to_next != xp_to_next || self.xp >= xp_to_next {
            log::warn!(
                "save has xp {}/{} at level {}, repairing to at most {}",
                self.xp,
                self.xp_to_next,
                level,
                xp_to_next
            );
        }

        Pet {
            species: self.species,
            name,
            level,
            xp: self.xp.min(xp_to_next - 1),
            xp_to_next,
            meters,
            flags: Flags {
                sick: self.is_sick,
                sleeping: self.is_sleeping,
            },
            coins: self.coins,
            inventory: Inventory {
                foods,
                clothes,
                equipped,
            },
            consecutive_plays: self.consecutive_plays,
        }
    }
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

/// Parses a saved pet. Corrupt input falls back to a fresh default pet rather
/// than failing the caller.
pub fn decode(data: &str) -> Pet {
    match serde_json::from_str::<Snapshot>(data.trim_start_matches('\0')) {
        Ok(snap) => snap.into_pet(),
        Err(e) => {
            log::warn!("save data unreadable, starting fresh: {}", e);
            Pet::default()
        }
    }
}

pub fn encode(pet: &Pet) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Snapshot::from(pet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy;
    use chrono::Utc;

    fn dressed_pet() -> Pet {
        let mut pet = Pet {
            coins: 1_000,
            ..Pet::default()
        };
        economy::purchase(&mut pet, 2, Utc::now()).unwrap();
        economy::purchase(&mut pet, 104, Utc::now()).unwrap();
        economy::equip(&mut pet, 104).unwrap();
        pet.meters.energy = 33.7;
        pet.consecutive_plays = 2;
        pet
    }

    #[test]
    fn json_uses_wire_names() {
        let json = encode(&dressed_pet()).unwrap();
        for key in [
            "\"type\": \"bear\"",
            "\"xpToNext\"",
            "\"isSick\"",
            "\"isSleeping\"",
            "\"equippedClothes\"",
            "\"consecutivePlays\"",
            "\"boughtAt\"",
            "\"type\": \"hat\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn round_trip_is_exact() {
        let pet = dressed_pet();
        let back = decode(&encode(&pet).unwrap());
        assert_eq!(back, pet);
    }

    #[test]
    fn garbage_fails_closed() {
        assert_eq!(decode("{not json"), Pet::default());
        assert_eq!(decode(r#"{"type":"dragon"}"#), Pet::default());
    }

    #[test]
    fn partial_save_merges_over_defaults() {
        let pet = decode(r#"{"type":"dog","name":"Rex","coins":7}"#);
        assert_eq!(pet.species, Species::Dog);
        assert_eq!(pet.name, "Rex");
        assert_eq!(pet.coins, 7);
        assert_eq!(pet.xp_to_next, 100);
    }

    #[test]
    fn repairs_out_of_range_values() {
        let pet = decode(
            r##"{"hunger":140,"health":-3,"level":0,"xp":30,"xpToNext":100,
                "clothes":[{"id":103,"name":"Party Hat","cost":50,"icon":"x","color":"#f00","type":"hat"}],
                "equippedClothes":[
                    {"id":103,"name":"Party Hat","cost":50,"icon":"x","color":"#f00","type":"hat"},
                    {"id":104,"name":"Crown","cost":200,"icon":"x","color":"#ff0","type":"hat"}
                ]}"##,
        );
        assert!(pet.meters.in_bounds());
        assert_eq!(pet.level, 1);
        assert_eq!(pet.xp, 30);
        assert_eq!(pet.inventory.equipped.len(), 1);
        assert_eq!(pet.inventory.equipped[0].id, 103);
    }

    #[test]
    fn tampered_xp_does_not_pay_out() {
        let pet = decode(r#"{"xp":50000000,"xpToNext":1,"coins":0}"#);
        assert_eq!(pet.level, 1);
        assert_eq!(pet.xp, 99);
        assert_eq!(pet.xp_to_next, 100);
        assert_eq!(pet.coins, 0);

        // a threshold that does not match the level is recomputed
        let pet = decode(r#"{"level":3,"xp":10,"xpToNext":7}"#);
        assert_eq!(pet.level, 3);
        assert_eq!(pet.xp, 10);
        assert_eq!(pet.xp_to_next, 225);
    }
}
