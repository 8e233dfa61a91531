mod common;

use common::setup_game;
use pocketpal::actions::ActionKind;
use pocketpal::economy;
use pocketpal::game::Game;
use pocketpal::leveling::{add_xp, LEVEL_UP_COINS};
use pocketpal::minigame::MinigameKind;
use pocketpal::model::{Pet, Slot};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Clone, Debug)]
enum Op {
    Act(ActionKind),
    Heal,
    Sleep,
    Buy(u32),
    Eat(u32),
    Wear(u32),
    TakeOff(Slot),
    Wait(u64),
    Start(MinigameKind),
    Tick,
    Flip(usize),
    Whack(usize),
    Resolve,
    Cancel,
}

fn catalog_ids() -> Vec<u32> {
    economy::catalog().map(|i| i.id()).collect()
}

fn arb_op() -> impl Strategy<Value = Op> {
    let ids = catalog_ids();
    prop_oneof![
        prop::sample::select(ActionKind::ALL.to_vec()).prop_map(Op::Act),
        Just(Op::Heal),
        Just(Op::Sleep),
        prop::sample::select(ids.clone()).prop_map(Op::Buy),
        prop::sample::select(ids.clone()).prop_map(Op::Eat),
        prop::sample::select(ids).prop_map(Op::Wear),
        prop::sample::select(vec![Slot::Shirt, Slot::Hat, Slot::Bow, Slot::Glasses])
            .prop_map(Op::TakeOff),
        (0u64..20_000).prop_map(Op::Wait),
        prop::sample::select(MinigameKind::ALL.to_vec()).prop_map(Op::Start),
        Just(Op::Tick),
        (0usize..8).prop_map(Op::Flip),
        (0usize..9).prop_map(Op::Whack),
        Just(Op::Resolve),
        Just(Op::Cancel),
    ]
}

prop_compose! {
    fn arb_pet()(
        coins in 0u32..2_000,
        hunger in 0.0f32..=100.0,
        energy in 0.0f32..=100.0,
        health in 0.0f32..=100.0,
        sick in any::<bool>(),
    ) -> Pet {
        let mut pet = Pet { coins, ..Pet::default() };
        pet.meters.hunger = hunger;
        pet.meters.energy = energy;
        pet.meters.health = health;
        pet.flags.sick = sick;
        pet
    }
}

fn apply(game: &mut Game, op: &Op) {
    // Rejections are fine here; only the invariants matter.
    let _ = match *op {
        Op::Act(kind) => game.perform_action(kind).map(|_| ()),
        Op::Heal => game.heal().map(|_| ()),
        Op::Sleep => game.toggle_sleep().map(|_| ()),
        Op::Buy(id) => game.purchase(id).map(|_| ()),
        Op::Eat(id) => game.consume_food(id).map(|_| ()),
        Op::Wear(id) => game.equip(id).map(|_| ()),
        Op::TakeOff(slot) => game.unequip(slot.id()).map(|_| ()),
        Op::Wait(ms) => {
            game.advance(Duration::from_millis(ms));
            Ok(())
        }
        Op::Start(kind) => game.start_minigame(kind).map(|_| ()),
        Op::Tick => game.tick_minigame().map(|_| ()),
        Op::Flip(i) => game.flip_card(i).map(|_| ()),
        Op::Whack(i) => game.whack(i).map(|_| ()),
        Op::Resolve => game.resolve_minigame().map(|_| ()),
        Op::Cancel => game.cancel_minigame(),
    };
}

fn check_invariants(pet: &Pet) -> Result<(), TestCaseError> {
    prop_assert!(pet.meters.in_bounds(), "meters out of range: {:?}", pet.meters);
    prop_assert!(pet.level >= 1);
    prop_assert!(pet.xp < pet.xp_to_next, "xp {} >= {}", pet.xp, pet.xp_to_next);

    let mut ids = HashSet::new();
    for id in pet
        .inventory
        .foods
        .iter()
        .map(|f| f.id)
        .chain(pet.inventory.clothes.iter().map(|c| c.id))
    {
        prop_assert!(ids.insert(id), "item {} owned twice", id);
    }

    let mut slots = HashSet::new();
    for worn in &pet.inventory.equipped {
        prop_assert!(slots.insert(worn.slot), "two items in {:?}", worn.slot);
        prop_assert!(pet.inventory.clothes.iter().any(|c| c.id == worn.id));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_any_op_sequence_keeps_pet_valid(
        pet in arb_pet(),
        seed in any::<u64>(),
        ops in prop::collection::vec(arb_op(), 1..80),
    ) {
        let (mut game, _) = setup_game(pet, StdRng::seed_from_u64(seed));
        for op in &ops {
            apply(&mut game, op);
            check_invariants(game.pet())?;
        }
    }

    #[test]
    fn test_rejected_ops_change_nothing(
        pet in arb_pet(),
        seed in any::<u64>(),
        op in arb_op(),
    ) {
        let (mut game, store) = setup_game(pet, StdRng::seed_from_u64(seed));
        let before = game.snapshot();
        let failed = match op {
            Op::Act(kind) => game.perform_action(kind).is_err(),
            Op::Buy(id) => game.purchase(id).is_err(),
            Op::Eat(id) => game.consume_food(id).is_err(),
            Op::Wear(id) => game.equip(id).is_err(),
            _ => false,
        };
        if failed {
            prop_assert_eq!(game.snapshot(), before);
            prop_assert_eq!(store.writes(), 0);
        }
    }

    #[test]
    fn test_level_cascade_settles(start_xp in 0u32..100, gain in 0u32..50_000) {
        let mut pet = Pet { xp: start_xp, coins: 0, ..Pet::default() };
        let up = add_xp(&mut pet, gain);

        prop_assert!(pet.xp < pet.xp_to_next);
        prop_assert_eq!(pet.coins, (pet.level - 1) * LEVEL_UP_COINS);
        match up {
            Some(up) => prop_assert_eq!(up.new_level, pet.level),
            None => prop_assert_eq!(pet.level, 1),
        }
    }
}
