//! Shop catalogs, coin spending and the pet's wardrobe.

use crate::error::{PetError, PetResult};
use crate::model::{clamp_meter, Apparel, OwnedFood, Pet, Slot};
use chrono::{DateTime, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoodSpec {
    pub id: u32,
    pub name: &'static str,
    pub cost: u32,
    pub icon: &'static str,
    pub fill: i32,
    pub happy: i32,
    pub heal: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApparelSpec {
    pub id: u32,
    pub name: &'static str,
    pub cost: u32,
    pub icon: &'static str,
    pub color: &'static str,
    pub slot: Slot,
}

/// Catalog entries are either eaten once or worn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogItem {
    Consumable(&'static FoodSpec),
    Apparel(&'static ApparelSpec),
}

impl CatalogItem {
    pub fn id(&self) -> u32 {
        match self {
            CatalogItem::Consumable(f) => f.id,
            CatalogItem::Apparel(a) => a.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CatalogItem::Consumable(f) => f.name,
            CatalogItem::Apparel(a) => a.name,
        }
    }

    pub fn cost(&self) -> u32 {
        match self {
            CatalogItem::Consumable(f) => f.cost,
            CatalogItem::Apparel(a) => a.cost,
        }
    }
}

// Food ids live below 100 and apparel ids from 100 up, so one id resolves to
// exactly one catalog.
pub static FOOD_CATALOG: [FoodSpec; 6] = [
    FoodSpec { id: 1, name: "Apple", cost: 15, icon: "🍎", fill: 15, happy: 10, heal: 0 },
    FoodSpec { id: 2, name: "Cookie", cost: 20, icon: "🍪", fill: 10, happy: 20, heal: 0 },
    FoodSpec { id: 3, name: "Fried Rice", cost: 30, icon: "🍛", fill: 40, happy: 5, heal: 5 },
    FoodSpec { id: 4, name: "Grilled Fish", cost: 35, icon: "🐟", fill: 35, happy: 10, heal: 10 },
    FoodSpec { id: 5, name: "Warm Soup", cost: 45, icon: "🍲", fill: 25, happy: 5, heal: 30 },
    FoodSpec { id: 6, name: "Birthday Cake", cost: 60, icon: "🎂", fill: 20, happy: 35, heal: 0 },
];

pub static APPAREL_CATALOG: [ApparelSpec; 7] = [
    ApparelSpec { id: 101, name: "Red Shirt", cost: 40, icon: "👕", color: "#ef4444", slot: Slot::Shirt },
    ApparelSpec { id: 102, name: "Striped Shirt", cost: 60, icon: "👕", color: "#3b82f6", slot: Slot::Shirt },
    ApparelSpec { id: 103, name: "Party Hat", cost: 50, icon: "🎉", color: "#f59e0b", slot: Slot::Hat },
    ApparelSpec { id: 104, name: "Crown", cost: 200, icon: "👑", color: "#facc15", slot: Slot::Hat },
    ApparelSpec { id: 105, name: "Pink Bow", cost: 35, icon: "🎀", color: "#ec4899", slot: Slot::Bow },
    ApparelSpec { id: 106, name: "Round Glasses", cost: 45, icon: "👓", color: "#6b7280", slot: Slot::Glasses },
    ApparelSpec { id: 107, name: "Sunglasses", cost: 70, icon: "🕶️", color: "#111827", slot: Slot::Glasses },
];

pub fn lookup(id: u32) -> Option<CatalogItem> {
    FOOD_CATALOG
        .iter()
        .find(|f| f.id == id)
        .map(CatalogItem::Consumable)
        .or_else(|| {
            APPAREL_CATALOG
                .iter()
                .find(|a| a.id == id)
                .map(CatalogItem::Apparel)
        })
}

pub fn catalog() -> impl Iterator<Item = CatalogItem> {
    FOOD_CATALOG
        .iter()
        .map(CatalogItem::Consumable)
        .chain(APPAREL_CATALOG.iter().map(CatalogItem::Apparel))
}

impl FoodSpec {
    fn to_owned_food(self, bought_at: DateTime<Utc>) -> OwnedFood {
        OwnedFood {
            id: self.id,
            name: self.name.to_string(),
            cost: self.cost,
            icon: self.icon.to_string(),
            happy: self.happy,
            heal: self.heal,
            fill: self.fill,
            bought_at: bought_at.timestamp_millis(),
        }
    }
}

impl ApparelSpec {
    fn to_apparel(self) -> Apparel {
        Apparel {
            id: self.id,
            name: self.name.to_string(),
            cost: self.cost,
            icon: self.icon.to_string(),
            color: self.color.to_string(),
            slot: self.slot,
        }
    }
}

pub fn purchase(pet: &mut Pet, catalog_id: u32, now: DateTime<Utc>) -> PetResult<CatalogItem> {
    let item = lookup(catalog_id)
        .ok_or_else(|| PetError::invalid(format!("No shop item with id {catalog_id}")))?;
    if pet.inventory.owns(catalog_id) {
        return Err(PetError::precondition("Already owned!"));
    }
    if pet.coins < item.cost() {
        return Err(PetError::precondition("Not enough coins!"));
    }

    pet.coins -= item.cost();
    match item {
        CatalogItem::Consumable(spec) => pet.inventory.foods.push(spec.to_owned_food(now)),
        CatalogItem::Apparel(spec) => pet.inventory.clothes.push(spec.to_apparel()),
    }
    log::info!("bought {} for {} coins ({} left)", item.name(), item.cost(), pet.coins);
    Ok(item)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Meal {
    pub food: OwnedFood,
    pub cured: bool,
}

pub fn consume_food(pet: &mut Pet, food_id: u32) -> PetResult<Meal> {
    let idx = pet
        .inventory
        .foods
        .iter()
        .position(|f| f.id == food_id)
        .ok_or_else(|| PetError::invalid("You don't have that food."))?;
    if pet.flags.sleeping {
        return Err(PetError::asleep());
    }

    let food = pet.inventory.foods.remove(idx);
    let m = &mut pet.meters;
    m.hunger = clamp_meter(m.hunger - food.fill as f32);
    m.happiness = clamp_meter(m.happiness + food.happy as f32);
    m.health = clamp_meter(m.health + food.heal as f32);

    let cured = pet.flags.sick && food.heal > 0 && m.health >= 50.0;
    if cured {
        pet.flags.sick = false;
        log::info!("{} recovered after eating {}", pet.name, food.name);
    }
    Ok(Meal { food, cured })
}

/// Wears an owned item, returning whatever it displaced from the same slot.
pub fn equip(pet: &mut Pet, apparel_id: u32) -> PetResult<Option<Apparel>> {
    let item = pet
        .inventory
        .clothes
        .iter()
        .find(|c| c.id == apparel_id)
        .cloned()
        .ok_or_else(|| PetError::invalid("You don't own that outfit."))?;
    if pet.inventory.is_equipped(apparel_id) {
        return Err(PetError::precondition("Already wearing that!"));
    }

    let replaced = pet
        .inventory
        .equipped
        .iter()
        .position(|a| a.slot == item.slot)
        .map(|i| pet.inventory.equipped.remove(i));
    pet.inventory.equipped.push(item);
    Ok(replaced)
}

pub fn unequip(pet: &mut Pet, slot: Slot) -> PetResult<Apparel> {
    let idx = pet
        .inventory
        .equipped
        .iter()
        .position(|a| a.slot == slot)
        .ok_or_else(|| PetError::precondition(format!("Nothing worn on {}.", slot.id())))?;
    Ok(pet.inventory.equipped.remove(idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich() -> Pet {
        Pet {
            coins: 1_000,
            ..Pet::default()
        }
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<u32> = catalog().map(|i| i.id()).collect();
        let n = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), n);
    }

    #[test]
    fn purchase_debits_and_dedups() {
        let mut pet = rich();
        purchase(&mut pet, 1, Utc::now()).unwrap();
        assert_eq!(pet.coins, 985);
        assert_eq!(pet.inventory.foods.len(), 1);

        let err = purchase(&mut pet, 1, Utc::now()).unwrap_err();
        assert_eq!(err, PetError::precondition("Already owned!"));
        assert_eq!(pet.coins, 985);
    }

    #[test]
    fn purchase_rejects_poor_and_unknown() {
        let mut pet = Pet {
            coins: 10,
            ..Pet::default()
        };
        let before = pet.clone();
        assert!(matches!(
            purchase(&mut pet, 104, Utc::now()),
            Err(PetError::PreconditionFailed(_))
        ));
        assert!(matches!(
            purchase(&mut pet, 999, Utc::now()),
            Err(PetError::InvalidReference(_))
        ));
        assert_eq!(pet, before);
    }

    #[test]
    fn food_is_used_exactly_once() {
        let mut pet = rich();
        pet.meters.hunger = 60.0;
        purchase(&mut pet, 3, Utc::now()).unwrap();
        let meal = consume_food(&mut pet, 3).unwrap();
        assert_eq!(meal.food.name, "Fried Rice");
        assert_eq!(pet.meters.hunger, 20.0);
        assert!(pet.inventory.foods.is_empty());
        assert!(matches!(
            consume_food(&mut pet, 3),
            Err(PetError::InvalidReference(_))
        ));
    }

    #[test]
    fn healing_food_can_cure() {
        let mut pet = rich();
        pet.flags.sick = true;
        pet.meters.health = 30.0;
        purchase(&mut pet, 5, Utc::now()).unwrap();
        let meal = consume_food(&mut pet, 5).unwrap();
        assert!(meal.cured);
        assert!(!pet.flags.sick);
        assert_eq!(pet.meters.health, 60.0);
    }

    #[test]
    fn equipping_replaces_same_slot_only() {
        let mut pet = rich();
        for id in [103, 104, 105] {
            purchase(&mut pet, id, Utc::now()).unwrap();
        }
        assert_eq!(equip(&mut pet, 103).unwrap(), None);
        assert_eq!(equip(&mut pet, 105).unwrap(), None);
        let replaced = equip(&mut pet, 104).unwrap().unwrap();
        assert_eq!(replaced.id, 103);
        assert_eq!(pet.inventory.equipped.len(), 2);
        assert_eq!(pet.inventory.equipped_in(Slot::Hat).unwrap().id, 104);
    }

    #[test]
    fn equip_requires_ownership() {
        let mut pet = rich();
        assert!(matches!(
            equip(&mut pet, 101),
            Err(PetError::InvalidReference(_))
        ));
    }

    #[test]
    fn unequip_empty_slot_fails() {
        let mut pet = rich();
        assert!(unequip(&mut pet, Slot::Bow).is_err());
        purchase(&mut pet, 105, Utc::now()).unwrap();
        equip(&mut pet, 105).unwrap();
        assert_eq!(unequip(&mut pet, Slot::Bow).unwrap().id, 105);
        assert!(pet.inventory.equipped.is_empty());
        assert_eq!(pet.inventory.clothes.len(), 1);
    }
}
