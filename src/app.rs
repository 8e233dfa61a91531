use crate::input::{collect_input_nonblocking, map_event_to_command, Command};
use crate::render::{
    draw_center_box, draw_footer, draw_list, draw_pet, draw_session, draw_status, pet_bounce,
    Terminal,
};
use chrono::Utc;
use crossterm::style::Color;
use pocketpal::config::{save_settings_atomic, Paths, Settings};
use pocketpal::economy;
use pocketpal::error::{PetError, PetResult};
use pocketpal::game::{Game, NOTICE_TTL};
use pocketpal::minigame::memory::CARDS;
use pocketpal::minigame::{Board, MinigameKind, Outcome};
use pocketpal::model::{Inventory, Rules, Slot, Species, NAME_MAX};
use pocketpal::sim::CatchupSummary;
use pocketpal::storage::JsonFileStore;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::cmp::{max, min};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Main,
    Shop,
    Pantry,
    Wardrobe,
    Games,
    Minigame,
    Species,
    Rename,
    Help,
    Recap,
    ConfirmReset,
}

const MEMORY_COLS: usize = 4;

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    game: Game,
    term: Terminal,
    scene: Scene,
    help_behind: Option<Scene>,
    cursor: usize,
    name_edit: String,
    recap: Option<CatchupSummary>,
    flash: Option<(String, Instant)>,
    should_quit: bool,
}

impl App {
    fn init(paths: Paths, settings: Settings, reset: bool) -> anyhow::Result<Self> {
        let rules = Rules {
            tick_secs: settings.tick_secs.max(1),
            ..Rules::default()
        };
        let rng: Box<dyn RngCore + Send> = if settings.seed == 0 {
            Box::new(StdRng::from_entropy())
        } else {
            Box::new(StdRng::seed_from_u64(settings.seed))
        };
        let store = Box::new(JsonFileStore::new(paths.save_path.clone()));
        let (mut game, saved_at) = Game::load(store, rules, rng);

        let mut scene = Scene::Main;
        let mut recap = None;
        if reset {
            game.reset();
        } else if let Some(last_seen) = saved_at {
            let summary = game.catch_up(last_seen, Utc::now());
            log::info!("caught up {} ticks since {}", summary.ticks_simulated, last_seen);
            if summary.has_anything() {
                recap = Some(summary);
                scene = Scene::Recap;
            }
        }

        let term = Terminal::begin(!settings.enable_color)?;

        Ok(Self {
            settings,
            paths,
            game,
            term,
            scene,
            help_behind: None,
            cursor: 0,
            name_edit: String::new(),
            recap,
            flash: None,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            let _resized = self.term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(cmd) = map_event_to_command(&self.scene, ev) {
                    self.handle(cmd);
                }
                if self.should_quit {
                    break;
                }
            }

            // game time follows the wall clock
            let now = Instant::now();
            let real_dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            self.game.advance(real_dt);

            if self.scene == Scene::Minigame && self.game.session().is_none() {
                self.scene = Scene::Main;
            }
            if matches!(&self.flash, Some((_, at)) if at.elapsed() >= NOTICE_TTL) {
                self.flash = None;
            }

            self.render_frame()?;
            spin_sleep(frame_dt, now);
        }

        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }

    fn handle(&mut self, cmd: Command) {
        if let Err(e) = self.apply(cmd) {
            log::debug!("{:?} rejected: {}", cmd, e);
            self.flash = Some((e.reason(), Instant::now()));
        }
    }

    fn apply(&mut self, cmd: Command) -> PetResult<()> {
        match cmd {
            Command::Quit => self.should_quit = true,
            Command::Back => self.back()?,
            Command::HelpToggle => {
                (self.scene, self.help_behind) = toggle_help(self.scene, self.help_behind);
            }
            Command::Act(kind) => {
                self.game.perform_action(kind)?;
            }
            Command::Heal => {
                self.game.heal()?;
            }
            Command::SleepToggle => {
                self.game.toggle_sleep()?;
            }
            Command::Open(scene) => {
                self.cursor = 0;
                self.scene = match scene {
                    Scene::Games if self.game.session().is_some() => Scene::Minigame,
                    Scene::Rename => {
                        self.name_edit = self.game.pet().name.clone();
                        Scene::Rename
                    }
                    other => other,
                };
            }
            Command::ResetAsk => self.scene = Scene::ConfirmReset,
            Command::ResetConfirm => {
                self.game.reset();
                self.scene = Scene::Main;
            }
            Command::Dismiss => {
                self.recap = None;
                self.scene = Scene::Main;
            }
            Command::CursorMove(d) => self.cursor_move(d)?,
            Command::CursorJump(d) => {
                if self.is_memory_board() {
                    self.cursor = wrap(self.cursor, d * MEMORY_COLS as i32, CARDS);
                }
            }
            Command::Select => self.select()?,
            Command::Pick(hole) => {
                if self.scene == Scene::Minigame {
                    self.game.whack(hole)?;
                }
            }
            Command::Unequip => {
                let inv = &self.game.pet().inventory;
                if self.cursor < inv.clothes.len() {
                    let slot = worn_slot(inv, self.cursor)
                        .ok_or_else(|| PetError::precondition("Not wearing that."))?;
                    self.game.unequip(slot.id())?;
                }
            }
            Command::RenameChar(ch) => {
                if self.name_edit.chars().count() < NAME_MAX {
                    self.name_edit.push(ch);
                }
            }
            Command::RenameBackspace => {
                self.name_edit.pop();
            }
        }
        Ok(())
    }

    fn back(&mut self) -> PetResult<()> {
        if self.scene == Scene::Help {
            (self.scene, self.help_behind) = toggle_help(self.scene, self.help_behind);
            return Ok(());
        }
        if self.scene == Scene::Minigame {
            match self.game.session().map(|s| s.outcome()) {
                Some(Outcome::Pending) => self.game.cancel_minigame()?,
                Some(_) => {
                    self.game.resolve_minigame()?;
                }
                None => {}
            }
        }
        self.scene = Scene::Main;
        Ok(())
    }

    fn select(&mut self) -> PetResult<()> {
        match self.scene {
            Scene::Shop => {
                if let Some(item) = economy::catalog().nth(self.cursor) {
                    self.game.purchase(item.id())?;
                }
            }
            Scene::Pantry => {
                let id = self.game.pet().inventory.foods.get(self.cursor).map(|f| f.id);
                if let Some(id) = id {
                    self.game.consume_food(id)?;
                    self.cursor = self.cursor.min(self.list_len().saturating_sub(1));
                }
            }
            Scene::Wardrobe => {
                let id = self.game.pet().inventory.clothes.get(self.cursor).map(|c| c.id);
                if let Some(id) = id {
                    self.game.equip(id)?;
                }
            }
            Scene::Games => {
                if let Some(&kind) = MinigameKind::ALL.get(self.cursor) {
                    self.game.start_minigame(kind)?;
                    self.cursor = 0;
                    self.scene = Scene::Minigame;
                }
            }
            Scene::Species => {
                if let Some(s) = Species::ALL.get(self.cursor) {
                    self.game.change_species(s.id())?;
                    self.scene = Scene::Main;
                }
            }
            Scene::Rename => {
                self.game.rename(&self.name_edit)?;
                self.scene = Scene::Main;
            }
            Scene::Minigame => {
                let outcome = self.game.session().map(|s| s.outcome());
                match outcome {
                    Some(Outcome::Pending) if self.is_memory_board() => {
                        self.game.flip_card(self.cursor)?;
                    }
                    Some(Outcome::Win) | Some(Outcome::Lose) => {
                        self.game.resolve_minigame()?;
                        self.scene = Scene::Main;
                    }
                    _ => {}
                }
            }
            Scene::Main | Scene::Help | Scene::Recap | Scene::ConfirmReset => {}
        }
        Ok(())
    }

    fn cursor_move(&mut self, d: i32) -> PetResult<()> {
        if self.scene == Scene::Minigame {
            let catching = matches!(
                self.game.session().map(|s| &s.board),
                Some(Board::Catch(_))
            );
            if catching {
                self.game.move_catcher(d)?;
            } else if self.is_memory_board() {
                self.cursor = wrap(self.cursor, d, CARDS);
            }
            return Ok(());
        }
        let len = self.list_len();
        if len > 0 {
            self.cursor = (self.cursor as i32 + d).clamp(0, len as i32 - 1) as usize;
        }
        Ok(())
    }

    fn is_memory_board(&self) -> bool {
        matches!(
            self.game.session().map(|s| &s.board),
            Some(Board::Memory(_))
        )
    }

    fn list_len(&self) -> usize {
        self.list_rows().len()
    }

    fn list_rows(&self) -> Vec<String> {
        let pet = self.game.pet();
        let inv = &pet.inventory;
        match self.scene {
            Scene::Shop => economy::catalog()
                .map(|item| {
                    let owned = if inv.owns(item.id()) { "owned" } else { "" };
                    format!("{:<14} {:>4}c  {}", item.name(), item.cost(), owned)
                })
                .collect(),
            Scene::Pantry => inv
                .foods
                .iter()
                .map(|f| format!("{:<14} fill {:>2}  happy {:>2}  heal {:>2}", f.name, f.fill, f.happy, f.heal))
                .collect(),
            Scene::Wardrobe => inv
                .clothes
                .iter()
                .map(|c| {
                    let worn = if inv.is_equipped(c.id) { "[worn]" } else { "" };
                    format!("{:<14} {:<8} {}", c.name, c.slot.id(), worn)
                })
                .collect(),
            Scene::Games => MinigameKind::ALL
                .iter()
                .map(|k| k.title().to_string())
                .collect(),
            Scene::Species => Species::ALL
                .iter()
                .map(|s| format!("{:<9} ({})", s.id(), s.default_name()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let rows = self.list_rows();
        let title = match self.scene {
            Scene::Shop => format!("Shop  ({} coins)", self.game.pet().coins),
            Scene::Pantry => "Pantry".to_string(),
            Scene::Wardrobe => "Wardrobe".to_string(),
            Scene::Games => "Minigames".to_string(),
            Scene::Species => "Choose a pet".to_string(),
            _ => String::new(),
        };

        let cols = self.term.cols as i32;
        let term_rows = self.term.rows as i32;
        let panel_w = min(max(44, cols / 3), cols - 10).max(0);
        let right_w = cols - panel_w;

        let buf = &mut self.term.cur;
        buf.clear(Color::Black);
        let flash = self.flash.as_ref().map(|(m, _)| m.as_str());
        draw_status(buf, &self.game, flash);

        let base = match self.scene {
            Scene::Help => self.help_behind.unwrap_or(Scene::Main),
            other => other,
        };
        match base {
            Scene::Shop | Scene::Pantry | Scene::Wardrobe | Scene::Games | Scene::Species => {
                draw_list(buf, panel_w as u16, 1, &title, &rows, self.cursor);
            }
            Scene::Minigame => {
                if let Some(session) = self.game.session() {
                    draw_session(buf, session, self.cursor, panel_w, 1);
                }
            }
            _ => {
                let cx = panel_w + right_w / 2;
                let cy = term_rows / 2 + pet_bounce(&self.game);
                draw_pet(buf, self.game.pet(), self.game.mood(), cx, cy);
            }
        }

        match self.scene {
            Scene::Recap => {
                if let Some(s) = &self.recap {
                    draw_center_box(
                        buf,
                        "While you were away",
                        &format!(
                            "{} decay ticks passed.\n\nHungriest: {:.1}\nLowest happiness: {:.1}\nLowest health: {:.1}\nGot sick: {}\nWoke up: {}\n\nPress any key",
                            s.ticks_simulated,
                            s.hunger_max,
                            s.happiness_min,
                            s.health_min,
                            if s.became_sick { "yes" } else { "no" },
                            if s.woke_up { "yes" } else { "no" },
                        ),
                    );
                }
            }
            Scene::Help => draw_center_box(
                buf,
                "How to play",
                "Keep the meters healthy. Hunger climbs over time;\n\
    a starving pet can fall sick.\n\n\
    F feed  P play  R rest  T train: each earns coins and XP.\n\
    M medicine costs 20 coins and restores health.\n\
    S sleep: regain energy; only resting works until morning.\n\n\
    B shop for food and clothes, I eat from the pantry,\n\
    W dress up, G play minigames for bigger rewards.\n\
    K change pet, N rename, X start over.\n\n\
    Esc or H to close help.",
            ),
            Scene::Rename => {
                let mut preview = self.name_edit.clone();
                if preview.chars().count() < NAME_MAX {
                    preview.push('_');
                }
                draw_center_box(
                    buf,
                    "Rename pet",
                    &format!(
                        "Type a name (max {NAME_MAX} chars).\n\nName: {preview}\n\nEnter save | Esc cancel | Backspace delete"
                    ),
                );
            }
            Scene::ConfirmReset => draw_center_box(
                buf,
                "Start over?",
                "Your pet, coins and items will be replaced\nby a brand new pet.\n\nPress Y to confirm, any other key to cancel.",
            ),
            _ => {}
        }

        draw_footer(buf, &self.scene);
        self.term.present(true)?;
        Ok(())
    }
}

fn wrap(cursor: usize, d: i32, len: usize) -> usize {
    (cursor as i32 + d).rem_euclid(len as i32) as usize
}

pub(crate) fn run(paths: Paths, settings: Settings, reset: bool) -> anyhow::Result<()> {
    let mut app = App::init(paths, settings, reset)?;
    app.run()?;
    Ok(())
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

/// Help overlays whatever was showing and closes back onto it.
fn toggle_help(scene: Scene, behind: Option<Scene>) -> (Scene, Option<Scene>) {
    match scene {
        Scene::Help => (behind.unwrap_or(Scene::Main), None),
        other => (Scene::Help, Some(other)),
    }
}

/// The slot to clear for a wardrobe row, if that row is the item being worn.
fn worn_slot(inv: &Inventory, idx: usize) -> Option<Slot> {
    inv.clothes
        .get(idx)
        .filter(|c| inv.is_equipped(c.id))
        .map(|c| c.slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketpal::model::Pet;

    #[test]
    fn help_closes_back_onto_the_game() {
        let (scene, behind) = toggle_help(Scene::Minigame, None);
        assert_eq!(scene, Scene::Help);
        assert_eq!(toggle_help(scene, behind), (Scene::Minigame, None));
        assert_eq!(toggle_help(Scene::Help, None), (Scene::Main, None));
    }

    #[test]
    fn only_the_worn_item_comes_off() {
        let mut pet = Pet {
            coins: 500,
            ..Pet::default()
        };
        economy::purchase(&mut pet, 103, Utc::now()).unwrap();
        economy::purchase(&mut pet, 104, Utc::now()).unwrap();
        economy::equip(&mut pet, 104).unwrap();

        let inv = &pet.inventory;
        let party_hat = inv.clothes.iter().position(|c| c.id == 103).unwrap();
        let crown = inv.clothes.iter().position(|c| c.id == 104).unwrap();
        assert_eq!(worn_slot(inv, party_hat), None);
        assert_eq!(worn_slot(inv, crown), Some(Slot::Hat));
        assert_eq!(worn_slot(inv, 99), None);
    }
}
