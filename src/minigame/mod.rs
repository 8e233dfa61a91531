//! The three minigames and the reward they feed back into the pet.
//!
//! Each board is a plain state machine driven by explicit inputs (`step`,
//! `hit`, `flip`, `settle`). `Session` wraps one board with its countdown and
//! outcome; wiring the inputs to timers is the job of [`crate::game::Game`].

pub mod catch;
pub mod memory;
pub mod whack;

use crate::error::{PetError, PetResult};
use crate::leveling::{add_xp, LevelUp};
use crate::model::{clamp_meter, Pet};
use crate::scheduler::TimerHandle;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use catch::CatchGame;
pub use memory::MemoryGame;
pub use whack::WhackGame;

pub const CLOCK_PERIOD: Duration = Duration::from_secs(1);
pub const CATCH_STEP: Duration = Duration::from_millis(250);
pub const WHACK_STEP: Duration = Duration::from_millis(600);

pub const WIN_XP: u32 = 25;
pub const WIN_COINS: u32 = 20;
pub const WIN_HAPPINESS: f32 = 20.0;
pub const WIN_FUN: f32 = 25.0;
pub const LOSS_HAPPINESS: f32 = 5.0;
pub const INJURY_CHANCE: f64 = 0.2;
pub const INJURY_HAPPINESS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MinigameKind {
    Catch,
    Whack,
    Memory,
}

impl MinigameKind {
    pub const ALL: [MinigameKind; 3] = [
        MinigameKind::Catch,
        MinigameKind::Whack,
        MinigameKind::Memory,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MinigameKind::Catch => "catch",
            MinigameKind::Whack => "whack",
            MinigameKind::Memory => "memory",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MinigameKind::Catch => "Catch the Treats",
            MinigameKind::Whack => "Whack-a-Mole",
            MinigameKind::Memory => "Memory Match",
        }
    }

    /// Seconds on the clock, or None for untimed games.
    pub fn time_budget(self) -> Option<u32> {
        match self {
            MinigameKind::Catch => Some(catch::TIME_BUDGET),
            MinigameKind::Whack => Some(whack::TIME_BUDGET),
            MinigameKind::Memory => None,
        }
    }

    /// Cadence of the board's own step, distinct from the countdown.
    pub fn step_period(self) -> Option<Duration> {
        match self {
            MinigameKind::Catch => Some(CATCH_STEP),
            MinigameKind::Whack => Some(WHACK_STEP),
            MinigameKind::Memory => None,
        }
    }
}

impl fmt::Display for MinigameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MinigameKind {
    type Err = PetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| PetError::invalid(format!("Unknown minigame '{s}'")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Win,
    Lose,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Board {
    Catch(CatchGame),
    Whack(WhackGame),
    Memory(MemoryGame),
}

#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub kind: MinigameKind,
    pub board: Board,
    pub time_remaining: Option<u32>,
    outcome: Outcome,
    pub(crate) timers: Vec<TimerHandle>,
}

impl Session {
    pub fn start<R: Rng + ?Sized>(id: u64, kind: MinigameKind, rng: &mut R) -> Self {
        let board = match kind {
            MinigameKind::Catch => Board::Catch(CatchGame::new()),
            MinigameKind::Whack => Board::Whack(WhackGame::new()),
            MinigameKind::Memory => Board::Memory(MemoryGame::new(rng)),
        };
        Self {
            id,
            kind,
            board,
            time_remaining: kind.time_budget(),
            outcome: Outcome::Pending,
            timers: Vec::new(),
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_pending(&self) -> bool {
        self.outcome == Outcome::Pending
    }

    pub fn score(&self) -> u32 {
        match &self.board {
            Board::Catch(g) => g.score,
            Board::Whack(g) => g.score,
            Board::Memory(g) => g.matched() as u32 / 2,
        }
    }

    pub fn moves(&self) -> u32 {
        match &self.board {
            Board::Memory(g) => g.moves,
            _ => 0,
        }
    }

    /// One countdown second. Running out of time with the board unsolved
    /// loses.
    pub fn tick_clock(&mut self) -> Outcome {
        if !self.is_pending() {
            return self.outcome;
        }
        if let Some(t) = self.time_remaining.as_mut() {
            *t = t.saturating_sub(1);
            if *t == 0 {
                self.outcome = Outcome::Lose;
            }
        }
        self.outcome
    }

    /// Re-reads the board's terminal condition after an input.
    pub(crate) fn check_board(&mut self) -> Outcome {
        if self.is_pending() {
            let won = match &self.board {
                Board::Catch(g) => g.is_won(),
                Board::Whack(g) => g.is_won(),
                Board::Memory(g) => g.is_complete(),
            };
            if won {
                self.outcome = Outcome::Win;
            }
        }
        self.outcome
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reward {
    Won { level_up: Option<LevelUp> },
    Lost { injury: Option<u32> },
}

/// Applies a finished session's result. Pending outcomes pay nothing.
pub fn apply_reward<R: Rng + ?Sized>(
    pet: &mut Pet,
    outcome: Outcome,
    rng: &mut R,
) -> PetResult<Reward> {
    match outcome {
        Outcome::Pending => Err(PetError::precondition("The game is still running.")),
        Outcome::Win => {
            let m = &mut pet.meters;
            m.happiness = clamp_meter(m.happiness + WIN_HAPPINESS);
            m.fun = clamp_meter(m.fun + WIN_FUN);
            pet.coins = pet.coins.saturating_add(WIN_COINS);
            let level_up = add_xp(pet, WIN_XP);
            Ok(Reward::Won { level_up })
        }
        Outcome::Lose => {
            let m = &mut pet.meters;
            m.happiness = clamp_meter(m.happiness - LOSS_HAPPINESS);
            let mut injury = None;
            if rng.gen_bool(INJURY_CHANCE) {
                let damage: u32 = rng.gen_range(3..=13);
                m.health = clamp_meter(m.health - damage as f32);
                m.happiness = clamp_meter(m.happiness - INJURY_HAPPINESS);
                injury = Some(damage);
                log::info!("{} got hurt playing (-{} health)", pet.name, damage);
            }
            Ok(Reward::Lost { injury })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn clock_runs_out_to_a_loss() {
        let mut s = Session::start(1, MinigameKind::Catch, &mut StepRng::new(0, 0));
        for _ in 0..19 {
            assert_eq!(s.tick_clock(), Outcome::Pending);
        }
        assert_eq!(s.tick_clock(), Outcome::Lose);
        assert_eq!(s.time_remaining, Some(0));
    }

    #[test]
    fn memory_has_no_clock() {
        let mut s = Session::start(1, MinigameKind::Memory, &mut StepRng::new(0, 0));
        for _ in 0..500 {
            s.tick_clock();
        }
        assert!(s.is_pending());
        assert_eq!(s.time_remaining, None);
    }

    #[test]
    fn win_is_sticky() {
        let mut s = Session::start(1, MinigameKind::Whack, &mut StepRng::new(0, 0));
        if let Board::Whack(g) = &mut s.board {
            g.score = whack::TARGET_SCORE;
        }
        assert_eq!(s.check_board(), Outcome::Win);
        for _ in 0..30 {
            s.tick_clock();
        }
        assert_eq!(s.outcome(), Outcome::Win);
    }

    #[test]
    fn win_reward() {
        let mut pet = Pet::default();
        pet.meters.happiness = 50.0;
        pet.meters.fun = 50.0;
        let r = apply_reward(&mut pet, Outcome::Win, &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(r, Reward::Won { level_up: None });
        assert_eq!(pet.xp, 25);
        assert_eq!(pet.coins, 120);
        assert_eq!(pet.meters.happiness, 70.0);
        assert_eq!(pet.meters.fun, 75.0);
    }

    #[test]
    fn loss_with_and_without_injury() {
        let mut pet = Pet::default();
        let r = apply_reward(&mut pet, Outcome::Lose, &mut StepRng::new(u64::MAX, 0)).unwrap();
        assert_eq!(r, Reward::Lost { injury: None });
        assert_eq!(pet.meters.happiness, 75.0);

        let r = apply_reward(&mut pet, Outcome::Lose, &mut StepRng::new(0, 0)).unwrap();
        let Reward::Lost { injury: Some(dmg) } = r else {
            panic!("expected an injury, got {r:?}");
        };
        assert!((3..=13).contains(&dmg));
        assert_eq!(pet.meters.health, 100.0 - dmg as f32);
        assert_eq!(pet.meters.happiness, 60.0);
    }

    #[test]
    fn pending_pays_nothing() {
        let mut pet = Pet::default();
        let before = pet.clone();
        assert!(apply_reward(&mut pet, Outcome::Pending, &mut StepRng::new(0, 0)).is_err());
        assert_eq!(pet, before);
    }

    #[test]
    fn kinds_parse() {
        assert_eq!("memory".parse::<MinigameKind>().unwrap(), MinigameKind::Memory);
        assert!("chess".parse::<MinigameKind>().is_err());
    }
}
