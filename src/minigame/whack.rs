use crate::error::{PetError, PetResult};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

pub const GRID_SIDE: usize = 3;
pub const HOLES: usize = GRID_SIDE * GRID_SIDE;
pub const MAX_ACTIVE: usize = 3;
pub const SPAWN_CHANCE: f64 = 0.5;
pub const MOLE_LIFETIME: Duration = Duration::from_millis(1200);
pub const TARGET_SCORE: u32 = 5;
pub const TIME_BUDGET: u32 = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hole {
    Idle,
    /// `serial` tells a fresh activation apart from an older one at the same
    /// hole, so a late expiry cannot hide the new mole.
    Active { serial: u32 },
    Hit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Popped {
    pub hole: usize,
    pub serial: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhackGame {
    pub holes: [Hole; HOLES],
    pub score: u32,
    next_serial: u32,
}

impl Default for WhackGame {
    fn default() -> Self {
        Self::new()
    }
}

impl WhackGame {
    pub fn new() -> Self {
        Self {
            holes: [Hole::Idle; HOLES],
            score: 0,
            next_serial: 0,
        }
    }

    pub fn active_count(&self) -> usize {
        self.holes
            .iter()
            .filter(|h| matches!(h, Hole::Active { .. }))
            .count()
    }

    /// With `SPAWN_CHANCE`, pops up one to three idle holes while keeping at
    /// most `MAX_ACTIVE` up at once. Hit holes never come back.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Popped> {
        if !rng.gen_bool(SPAWN_CHANCE) {
            return Vec::new();
        }
        let room = MAX_ACTIVE.saturating_sub(self.active_count());
        let idle: Vec<usize> = (0..HOLES).filter(|&i| self.holes[i] == Hole::Idle).collect();
        if room == 0 || idle.is_empty() {
            return Vec::new();
        }
        let n = rng.gen_range(1..=MAX_ACTIVE).min(room).min(idle.len());
        let picked: Vec<usize> = idle.choose_multiple(rng, n).copied().collect();
        picked
            .into_iter()
            .map(|hole| {
                let serial = self.next_serial;
                self.next_serial = self.next_serial.wrapping_add(1);
                self.holes[hole] = Hole::Active { serial };
                Popped { hole, serial }
            })
            .collect()
    }

    /// Ducks a mole back down if it is still the activation that scheduled
    /// this expiry.
    pub fn expire(&mut self, popped: Popped) -> bool {
        match self.holes.get(popped.hole) {
            Some(Hole::Active { serial }) if *serial == popped.serial => {
                self.holes[popped.hole] = Hole::Idle;
                true
            }
            _ => false,
        }
    }

    /// Ok(true) on a hit, Ok(false) on a whiff.
    pub fn hit(&mut self, hole: usize) -> PetResult<bool> {
        let slot = self
            .holes
            .get_mut(hole)
            .ok_or_else(|| PetError::invalid(format!("No hole {hole}")))?;
        if let Hole::Active { .. } = slot {
            *slot = Hole::Hit;
            self.score += 1;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn is_won(&self) -> bool {
        self.score >= TARGET_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn never_more_than_three_up() {
        let mut g = WhackGame::new();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            g.step(&mut rng);
            assert!(g.active_count() <= MAX_ACTIVE);
        }
    }

    #[test]
    fn failed_roll_spawns_nothing() {
        let mut g = WhackGame::new();
        assert!(g.step(&mut StepRng::new(u64::MAX, 0)).is_empty());
    }

    #[test]
    fn hit_consumes_the_hole() {
        let mut g = WhackGame::new();
        g.holes[4] = Hole::Active { serial: 0 };
        assert!(g.hit(4).unwrap());
        assert_eq!(g.holes[4], Hole::Hit);
        assert!(!g.hit(4).unwrap());
        assert!(!g.hit(0).unwrap());
        assert_eq!(g.score, 1);
        assert!(g.hit(9).is_err());
    }

    #[test]
    fn stale_expiry_is_ignored() {
        let mut g = WhackGame::new();
        g.holes[2] = Hole::Active { serial: 5 };
        assert!(!g.expire(Popped { hole: 2, serial: 4 }));
        assert!(g.expire(Popped { hole: 2, serial: 5 }));
        assert_eq!(g.holes[2], Hole::Idle);
    }

    #[test]
    fn hit_moles_are_not_reactivated() {
        let mut g = WhackGame::new();
        for i in 0..HOLES {
            g.holes[i] = Hole::Hit;
        }
        g.holes[8] = Hole::Idle;
        let popped = g.step(&mut StepRng::new(0, 0));
        assert_eq!(popped, vec![Popped { hole: 8, serial: 0 }]);
    }
}
