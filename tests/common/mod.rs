#![allow(dead_code)]

use pocketpal::game::Game;
use pocketpal::minigame::memory::Face;
use pocketpal::minigame::whack::{Hole, HOLES};
use pocketpal::minigame::Board;
use pocketpal::model::{Pet, Rules};
use pocketpal::storage::MemoryStore;
use rand::rngs::mock::StepRng;
use rand::RngCore;

/// Every roll succeeds and every range yields its low end.
pub fn lucky() -> StepRng {
    StepRng::new(0, 0)
}

/// Every roll fails. Only safe where no `gen_range` is reached, so never for
/// a memory game (the deal shuffles) or a whack step that spawns.
pub fn unlucky() -> StepRng {
    StepRng::new(u64::MAX, 0)
}

pub fn setup_game(pet: Pet, rng: impl RngCore + Send + 'static) -> (Game, MemoryStore) {
    let store = MemoryStore::new();
    let game = Game::new(pet, Rules::default(), Box::new(rng), Box::new(store.clone()));
    (game, store)
}

/// Indices of the two cards carrying each symbol, in board order.
pub fn memory_pairs(game: &Game) -> Vec<(usize, usize)> {
    let Some(Board::Memory(board)) = game.session().map(|s| &s.board) else {
        panic!("no memory game running");
    };
    let mut pairs = Vec::new();
    for (i, a) in board.cards.iter().enumerate() {
        if let Some(j) = (i + 1..board.cards.len()).find(|&j| board.cards[j].symbol == a.symbol) {
            pairs.push((i, j));
        }
    }
    pairs
}

pub fn memory_faces(game: &Game) -> Vec<Face> {
    match game.session().map(|s| &s.board) {
        Some(Board::Memory(board)) => board.cards.iter().map(|c| c.face).collect(),
        _ => Vec::new(),
    }
}

pub fn whack_holes(game: &Game) -> Option<[Hole; HOLES]> {
    match game.session().map(|s| &s.board) {
        Some(Board::Whack(board)) => Some(board.holes),
        _ => None,
    }
}

pub fn active_hole(game: &Game) -> Option<usize> {
    whack_holes(game)?
        .iter()
        .position(|h| matches!(h, Hole::Active { .. }))
}
