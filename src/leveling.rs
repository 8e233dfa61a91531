use crate::model::{Pet, METER_MAX};

pub const LEVEL_UP_COINS: u32 = 50;
/// Xp needed to leave level 1.
pub const BASE_THRESHOLD: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelUp {
    pub levels: u32,
    pub new_level: u32,
}

/// Next threshold: floor(current * 1.5), and always at least one more than
/// `current` so small thresholds still grow.
pub fn next_threshold(current: u32) -> u32 {
    let current = current as u64;
    ((current * 3) / 2).max(current + 1).min(u32::MAX as u64) as u32
}

/// The threshold a pet at `level` is working towards.
pub fn threshold_for_level(level: u32) -> u32 {
    let mut threshold = BASE_THRESHOLD;
    for _ in 1..level {
        if threshold == u32::MAX {
            break;
        }
        threshold = next_threshold(threshold);
    }
    threshold
}

pub fn add_xp(pet: &mut Pet, amount: u32) -> Option<LevelUp> {
    pet.xp = pet.xp.saturating_add(amount);
    resolve_level_ups(pet)
}

/// Applies every level-up the current xp pays for. Carried-over xp can cover
/// more than one threshold, so this loops until `xp < xp_to_next`.
fn resolve_level_ups(pet: &mut Pet) -> Option<LevelUp> {
    pet.xp_to_next = pet.xp_to_next.max(1);
    let mut levels = 0;
    while pet.xp >= pet.xp_to_next {
        pet.xp -= pet.xp_to_next;
        pet.level = pet.level.saturating_add(1);
        pet.xp_to_next = next_threshold(pet.xp_to_next);
        pet.coins = pet.coins.saturating_add(LEVEL_UP_COINS);
        pet.meters.health = METER_MAX;
        levels += 1;
    }
    if levels == 0 {
        return None;
    }
    log::info!("{} reached level {} (+{} levels)", pet.name, pet.level, levels);
    Some(LevelUp {
        levels,
        new_level: pet.level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carry_over_level_up() {
        let mut pet = Pet {
            xp: 90,
            coins: 0,
            ..Pet::default()
        };
        pet.meters.health = 40.0;
        let up = add_xp(&mut pet, 30).unwrap();
        assert_eq!(up, LevelUp { levels: 1, new_level: 2 });
        assert_eq!(pet.xp, 20);
        assert_eq!(pet.xp_to_next, 150);
        assert_eq!(pet.coins, 50);
        assert_eq!(pet.meters.health, 100.0);
    }

    #[test]
    fn cascades_until_below_threshold() {
        let mut pet = Pet::default();
        // 100 + 150 + 225 = 475
        let up = add_xp(&mut pet, 480).unwrap();
        assert_eq!(up.levels, 3);
        assert_eq!(pet.level, 4);
        assert_eq!(pet.xp, 5);
        assert_eq!(pet.xp_to_next, 337);
        assert_eq!(pet.coins, 100 + 150);
    }

    #[test]
    fn below_threshold_is_a_no_op() {
        let mut pet = Pet::default();
        assert!(add_xp(&mut pet, 99).is_none());
        assert_eq!(pet.level, 1);
        assert_eq!(pet.xp, 99);
    }

    #[test]
    fn threshold_floors() {
        assert_eq!(next_threshold(100), 150);
        assert_eq!(next_threshold(225), 337);
    }

    #[test]
    fn threshold_always_grows() {
        assert_eq!(next_threshold(0), 1);
        assert_eq!(next_threshold(1), 2);
        assert_eq!(next_threshold(u32::MAX), u32::MAX);

        let mut pet = Pet {
            xp_to_next: 1,
            coins: 0,
            ..Pet::default()
        };
        // 1 + 2 + 3 + 4 = 10
        let up = add_xp(&mut pet, 10).unwrap();
        assert_eq!(up.levels, 4);
        assert_eq!(pet.xp, 0);
        assert_eq!(pet.xp_to_next, 5);
    }

    #[test]
    fn threshold_by_level() {
        assert_eq!(threshold_for_level(0), BASE_THRESHOLD);
        assert_eq!(threshold_for_level(1), BASE_THRESHOLD);
        assert_eq!(threshold_for_level(2), 150);
        assert_eq!(threshold_for_level(4), 337);
        assert_eq!(threshold_for_level(u32::MAX), u32::MAX);
    }
}
