//! The owned pet container and the operations the front-end calls.
//!
//! `Game` is the only thing that mutates the pet. It owns the scheduler, the
//! random source and the persistence backend; every successful mutation is
//! followed by a full snapshot write.

use crate::actions::{self, ActionKind};
use crate::economy;
use crate::error::{PetError, PetResult};
use crate::minigame::memory::Flip;
use crate::minigame::whack::{Popped, MOLE_LIFETIME};
use crate::minigame::{
    apply_reward, Board, MinigameKind, Outcome, Reward, Session, CLOCK_PERIOD,
};
use crate::model::{Mood, Pet, Rules, Slot, Species, NAME_MAX};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::sim::{self, CatchupSummary};
use crate::snapshot::Snapshot;
use crate::storage::{load_pet, save_pet, SnapshotStore};
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::time::Duration;

pub const NOTICE_TTL: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Timer {
    Decay,
    Clock(u64),
    Step(u64),
    MoleDown { session: u64, popped: Popped },
    SettlePair(u64),
    ClearNotice,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub kind: MinigameKind,
    pub outcome: Outcome,
    pub score: u32,
    pub moves: u32,
    pub reward: Reward,
    pub snapshot: Snapshot,
}

pub struct Game {
    pet: Pet,
    rules: Rules,
    rng: Box<dyn RngCore + Send>,
    scheduler: Scheduler<Timer>,
    store: Box<dyn SnapshotStore>,
    session: Option<Session>,
    next_session_id: u64,
    notice: Option<String>,
    notice_timer: Option<TimerHandle>,
    ticks: u64,
}

impl Game {
    pub fn new(
        pet: Pet,
        rules: Rules,
        rng: Box<dyn RngCore + Send>,
        store: Box<dyn SnapshotStore>,
    ) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.every(Duration::from_secs(rules.tick_secs.max(1)), Timer::Decay);
        Self {
            pet,
            rules,
            rng,
            scheduler,
            store,
            session: None,
            next_session_id: 1,
            notice: None,
            notice_timer: None,
            ticks: 0,
        }
    }

    /// Loads the stored pet (or a fresh one) and reports when it was saved.
    pub fn load(
        store: Box<dyn SnapshotStore>,
        rules: Rules,
        rng: Box<dyn RngCore + Send>,
    ) -> (Self, Option<DateTime<Utc>>) {
        let (pet, saved_at) = load_pet(store.as_ref());
        log::info!("loaded {} (level {})", pet.name, pet.level);
        (Self::new(pet, rules, rng, store), saved_at)
    }

    pub fn pet(&self) -> &Pet {
        &self.pet
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(&self.pet)
    }

    pub fn mood(&self) -> Mood {
        sim::classify_mood(&self.pet)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Decay ticks applied since this game was created.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn clock(&self) -> Duration {
        self.scheduler.now()
    }

    /* -----------------------------
       Time
    ------------------------------ */

    /// Lets `dt` of game time pass, firing decay, minigame and notice timers
    /// in order.
    pub fn advance(&mut self, dt: Duration) {
        let deadline = self.scheduler.now() + dt;
        while let Some(timer) = self.scheduler.fire_next(deadline) {
            self.dispatch(timer);
        }
        self.scheduler.settle(deadline);
    }

    pub fn catch_up(&mut self, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> CatchupSummary {
        let summary = sim::catch_up(&mut self.pet, last_seen, now, &self.rules, self.rng.as_mut());
        if summary.ticks_simulated > 0 {
            self.commit();
        }
        summary
    }

    fn dispatch(&mut self, timer: Timer) {
        match timer {
            Timer::Decay => self.decay(),
            Timer::Clock(id) => {
                if let Some(s) = self.live_session(id) {
                    s.tick_clock();
                }
                self.wrap_up_if_done();
            }
            Timer::Step(id) => {
                self.step_board(id);
                self.wrap_up_if_done();
            }
            Timer::MoleDown { session, popped } => {
                if let Some(s) = self.live_session(session) {
                    if let Board::Whack(g) = &mut s.board {
                        g.expire(popped);
                    }
                }
            }
            Timer::SettlePair(id) => {
                if let Some(s) = self.live_session(id) {
                    if let Board::Memory(g) = &mut s.board {
                        g.settle();
                    }
                    s.check_board();
                }
                self.wrap_up_if_done();
            }
            Timer::ClearNotice => {
                self.notice = None;
                self.notice_timer = None;
            }
        }
    }

    fn decay(&mut self) {
        let report = sim::decay_tick(&mut self.pet, &self.rules, self.rng.as_mut());
        self.ticks += 1;
        if report.fell_sick {
            self.notify(format!("{} is feeling sick!", self.pet.name));
        }
        if report.woke_up {
            self.notify(format!("{} woke up refreshed.", self.pet.name));
        }
        self.commit();
    }

    fn step_board(&mut self, id: u64) {
        let Some(session) = self.session.as_mut().filter(|s| s.id == id && s.is_pending()) else {
            return;
        };
        match &mut session.board {
            Board::Catch(g) => {
                g.step(self.rng.as_mut());
            }
            Board::Whack(g) => {
                for popped in g.step(self.rng.as_mut()) {
                    let handle = self
                        .scheduler
                        .after(MOLE_LIFETIME, Timer::MoleDown { session: id, popped });
                    session.timers.push(handle);
                }
            }
            Board::Memory(_) => {}
        }
        session.check_board();
    }

    /* -----------------------------
       Pet care
    ------------------------------ */

    pub fn perform_action(&mut self, kind: ActionKind) -> PetResult<Snapshot> {
        let out = actions::perform(&mut self.pet, kind)?;
        self.notify(kind.message());
        if out.cured {
            self.notify(format!("{} feels better!", self.pet.name));
        }
        if out.level_up.is_some() {
            self.announce_level_up();
        }
        Ok(self.commit())
    }

    pub fn heal(&mut self) -> PetResult<Snapshot> {
        let out = actions::heal(&mut self.pet)?;
        self.notify(if out.cured {
            "Medicine worked, all better!"
        } else {
            "Healed! -20 coins"
        });
        Ok(self.commit())
    }

    pub fn toggle_sleep(&mut self) -> PetResult<Snapshot> {
        let asleep = actions::toggle_sleep(&mut self.pet, self.session.is_some())?;
        self.notify(if asleep { "Good night! Zzz" } else { "Rise and shine!" });
        Ok(self.commit())
    }

    pub fn rename(&mut self, name: &str) -> PetResult<Snapshot> {
        self.ensure_awake()?;
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PetError::precondition("Name can't be empty."));
        }
        self.pet.name = trimmed.chars().take(NAME_MAX).collect();
        self.notify(format!("Say hi to {}!", self.pet.name));
        Ok(self.commit())
    }

    pub fn change_species(&mut self, id: &str) -> PetResult<Snapshot> {
        self.ensure_awake()?;
        let species = Species::from_id(id)
            .ok_or_else(|| PetError::invalid(format!("Unknown pet type '{id}'")))?;
        self.pet.species = species;
        self.pet.name = species.default_name().to_string();
        self.notify(format!("Pet changed to {}!", self.pet.name));
        Ok(self.commit())
    }

    /// Starts over with a default pet. Any running minigame is dropped.
    pub fn reset(&mut self) {
        if let Some(s) = self.session.take() {
            self.cancel_timers(s);
        }
        self.pet = Pet::default();
        log::info!("pet reset to defaults");
        self.commit();
    }

    /* -----------------------------
       Shop and wardrobe
    ------------------------------ */

    pub fn purchase(&mut self, catalog_id: u32) -> PetResult<Snapshot> {
        self.ensure_awake()?;
        let item = economy::purchase(&mut self.pet, catalog_id, Utc::now())?;
        self.notify(format!("Bought {}!", item.name()));
        Ok(self.commit())
    }

    pub fn consume_food(&mut self, food_id: u32) -> PetResult<Snapshot> {
        let meal = economy::consume_food(&mut self.pet, food_id)?;
        self.notify(if meal.cured {
            format!("{} hit the spot, feeling better!", meal.food.name)
        } else {
            format!("Yum, {}!", meal.food.name)
        });
        Ok(self.commit())
    }

    pub fn equip(&mut self, apparel_id: u32) -> PetResult<Snapshot> {
        self.ensure_awake()?;
        economy::equip(&mut self.pet, apparel_id)?;
        Ok(self.commit())
    }

    pub fn unequip(&mut self, slot: &str) -> PetResult<Snapshot> {
        self.ensure_awake()?;
        let slot =
            Slot::from_id(slot).ok_or_else(|| PetError::invalid(format!("Unknown slot '{slot}'")))?;
        economy::unequip(&mut self.pet, slot)?;
        Ok(self.commit())
    }

    /* -----------------------------
       Minigames
    ------------------------------ */

    pub fn start_minigame(&mut self, kind: MinigameKind) -> PetResult<Snapshot> {
        self.ensure_awake()?;
        if self.session.is_some() {
            return Err(PetError::precondition("Already playing a game."));
        }

        let id = self.next_session_id;
        self.next_session_id += 1;
        let mut session = Session::start(id, kind, self.rng.as_mut());
        if kind.time_budget().is_some() {
            session
                .timers
                .push(self.scheduler.every(CLOCK_PERIOD, Timer::Clock(id)));
        }
        if let Some(period) = kind.step_period() {
            session
                .timers
                .push(self.scheduler.every(period, Timer::Step(id)));
        }
        log::info!("minigame {} started (session {})", kind, id);
        self.session = Some(session);
        Ok(self.snapshot())
    }

    /// Lets one countdown second pass and reports where the session stands.
    pub fn tick_minigame(&mut self) -> PetResult<Outcome> {
        let id = self.pending_session()?.id;
        self.advance(CLOCK_PERIOD);
        match &self.session {
            Some(s) if s.id == id => Ok(s.outcome()),
            _ => Err(PetError::SessionInactive),
        }
    }

    pub fn move_catcher(&mut self, dx: i32) -> PetResult<()> {
        match &mut self.pending_session_mut()?.board {
            Board::Catch(g) => {
                g.move_catcher(dx);
                Ok(())
            }
            _ => Err(PetError::precondition("Not a catch game.")),
        }
    }

    pub fn whack(&mut self, hole: usize) -> PetResult<bool> {
        let session = self.pending_session_mut()?;
        let hit = match &mut session.board {
            Board::Whack(g) => g.hit(hole)?,
            _ => return Err(PetError::precondition("Not a whack-a-mole game.")),
        };
        session.check_board();
        self.wrap_up_if_done();
        Ok(hit)
    }

    pub fn flip_card(&mut self, idx: usize) -> PetResult<Flip> {
        let session = self.pending_session_mut()?;
        let id = session.id;
        let flip = match &mut session.board {
            Board::Memory(g) => g.flip(idx)?,
            _ => return Err(PetError::precondition("Not a memory game.")),
        };
        if let Some(delay) = flip.reveal_delay() {
            let handle = self.scheduler.after(delay, Timer::SettlePair(id));
            if let Some(s) = self.session.as_mut() {
                s.timers.push(handle);
            }
        }
        Ok(flip)
    }

    /// Consumes a finished session and pays out its reward exactly once.
    pub fn resolve_minigame(&mut self) -> PetResult<Resolution> {
        match self.session.as_ref().map(Session::outcome) {
            None => return Err(PetError::SessionInactive),
            Some(Outcome::Pending) => {
                return Err(PetError::precondition("The game is still running."))
            }
            Some(_) => {}
        }
        let Some(session) = self.session.take() else {
            return Err(PetError::SessionInactive);
        };
        let (kind, outcome, score, moves) =
            (session.kind, session.outcome(), session.score(), session.moves());
        self.cancel_timers(session);

        let reward = apply_reward(&mut self.pet, outcome, self.rng.as_mut())?;
        self.pet.consecutive_plays = self.pet.consecutive_plays.saturating_add(1);
        match reward {
            Reward::Won { level_up } => {
                self.notify("You won! +25 XP, +20 coins");
                if level_up.is_some() {
                    self.announce_level_up();
                }
            }
            Reward::Lost { injury: Some(dmg) } => {
                self.notify(format!("Ouch! {} got hurt (-{dmg} health)", self.pet.name))
            }
            Reward::Lost { injury: None } => self.notify("So close! Try again."),
        }
        log::info!("minigame {} resolved: {:?} (score {})", kind, outcome, score);
        let snapshot = self.commit();
        Ok(Resolution {
            kind,
            outcome,
            score,
            moves,
            reward,
            snapshot,
        })
    }

    /// Abandons the session: no reward, no penalty, no timers left behind.
    pub fn cancel_minigame(&mut self) -> PetResult<()> {
        let session = self.session.take().ok_or(PetError::SessionInactive)?;
        log::info!("minigame {} abandoned", session.kind);
        self.cancel_timers(session);
        Ok(())
    }

    /// A sleeping pet only decays, wakes, or rests.
    fn ensure_awake(&self) -> PetResult<()> {
        if self.pet.flags.sleeping {
            return Err(PetError::asleep());
        }
        Ok(())
    }

    fn pending_session(&self) -> PetResult<&Session> {
        self.session
            .as_ref()
            .filter(|s| s.is_pending())
            .ok_or(PetError::SessionInactive)
    }

    fn pending_session_mut(&mut self) -> PetResult<&mut Session> {
        self.session
            .as_mut()
            .filter(|s| s.is_pending())
            .ok_or(PetError::SessionInactive)
    }

    fn live_session(&mut self, id: u64) -> Option<&mut Session> {
        self.session
            .as_mut()
            .filter(|s| s.id == id && s.is_pending())
    }

    /// Once a session has an outcome its timers have nothing left to do.
    fn wrap_up_if_done(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_pending() || session.timers.is_empty() {
            return;
        }
        for handle in session.timers.drain(..) {
            self.scheduler.cancel(handle);
        }
        let msg = match session.outcome() {
            Outcome::Win => "You did it! Collect your prize.",
            _ => "Time's up!",
        };
        log::debug!("session {} finished: {:?}", session.id, session.outcome());
        self.notify(msg);
    }

    fn cancel_timers(&mut self, mut session: Session) {
        for handle in session.timers.drain(..) {
            self.scheduler.cancel(handle);
        }
    }

    /* -----------------------------
       Notices and persistence
    ------------------------------ */

    fn notify(&mut self, msg: impl Into<String>) {
        if let Some(h) = self.notice_timer.take() {
            self.scheduler.cancel(h);
        }
        self.notice = Some(msg.into());
        self.notice_timer = Some(self.scheduler.after(NOTICE_TTL, Timer::ClearNotice));
    }

    fn announce_level_up(&mut self) {
        self.notify(format!("Level up! Now level {}. +50 coins", self.pet.level));
    }

    fn commit(&mut self) -> Snapshot {
        if let Err(e) = save_pet(self.store.as_mut(), &self.pet) {
            log::warn!("save failed: {:#}", e);
        }
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rand::rngs::mock::StepRng;

    fn game_with(pet: Pet, rng: StepRng) -> (Game, MemoryStore) {
        let store = MemoryStore::new();
        let game = Game::new(
            pet,
            Rules::default(),
            Box::new(rng),
            Box::new(store.clone()),
        );
        (game, store)
    }

    fn quiet() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn decay_runs_on_the_tick_period() {
        let (mut game, store) = game_with(Pet::default(), quiet());
        game.advance(Duration::from_millis(2_999));
        assert_eq!(game.ticks(), 0);
        game.advance(Duration::from_millis(1));
        assert_eq!(game.ticks(), 1);
        assert_eq!(game.pet().meters.hunger, 51.0);
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn notice_clears_after_ttl_and_restarts_on_new_notice() {
        let (mut game, _) = game_with(Pet::default(), quiet());
        game.perform_action(ActionKind::Feed).unwrap();
        assert_eq!(game.notice(), Some("Yum! +5 coins"));
        game.advance(Duration::from_millis(1_500));
        game.perform_action(ActionKind::Play).unwrap();
        game.advance(Duration::from_millis(1_500));
        assert_eq!(game.notice(), Some("Fun! +8 coins"));
        game.advance(Duration::from_millis(500));
        assert_eq!(game.notice(), None);
    }

    #[test]
    fn failed_action_saves_nothing() {
        let mut pet = Pet::default();
        pet.meters.energy = 5.0;
        let (mut game, store) = game_with(pet, quiet());
        assert!(game.perform_action(ActionKind::Play).is_err());
        assert_eq!(store.writes(), 0);
        assert_eq!(game.notice(), None);
    }

    #[test]
    fn cancelling_leaves_only_background_timers() {
        let (mut game, _) = game_with(Pet::default(), quiet());
        let baseline = game.scheduler.pending();
        game.start_minigame(MinigameKind::Whack).unwrap();
        assert!(game.scheduler.pending() > baseline);
        game.cancel_minigame().unwrap();
        assert_eq!(game.scheduler.pending(), baseline);
        assert_eq!(game.cancel_minigame(), Err(PetError::SessionInactive));
    }

    #[test]
    fn sleep_is_refused_mid_game() {
        let (mut game, _) = game_with(Pet::default(), StepRng::new(0, 0));
        game.start_minigame(MinigameKind::Memory).unwrap();
        assert!(matches!(
            game.toggle_sleep(),
            Err(PetError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn sleeping_pet_cannot_shop_dress_or_be_renamed() {
        let pet = Pet {
            coins: 500,
            ..Pet::default()
        };
        let (mut game, store) = game_with(pet, quiet());
        game.purchase(103).unwrap();
        game.equip(103).unwrap();
        game.toggle_sleep().unwrap();
        let before = game.snapshot();
        let writes = store.writes();

        for result in [
            game.purchase(104),
            game.equip(103),
            game.unequip("hat"),
            game.rename("Biscuit"),
            game.change_species("cat"),
            game.start_minigame(MinigameKind::Catch),
        ] {
            assert_eq!(result, Err(PetError::asleep()));
        }
        assert_eq!(game.snapshot(), before);
        assert_eq!(store.writes(), writes);

        game.toggle_sleep().unwrap();
        assert!(game.unequip("hat").is_ok());
    }

    #[test]
    fn rename_trims_and_caps() {
        let (mut game, _) = game_with(Pet::default(), quiet());
        assert!(game.rename("   ").is_err());
        let snap = game.rename("  A very long pet name indeed  ").unwrap();
        assert_eq!(snap.name.chars().count(), NAME_MAX);
        assert_eq!(snap.name, "A very long pet na");
    }

    #[test]
    fn species_change_uses_default_name() {
        let (mut game, _) = game_with(Pet::default(), quiet());
        let snap = game.change_species("elephant").unwrap();
        assert_eq!(snap.species, Species::Elephant);
        assert_eq!(snap.name, "Gajah");
        assert!(matches!(
            game.change_species("dragon"),
            Err(PetError::InvalidReference(_))
        ));
    }
}
