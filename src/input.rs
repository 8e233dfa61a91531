use crate::app::Scene;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use pocketpal::actions::ActionKind;
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Quit,
    Back,
    HelpToggle,
    Act(ActionKind),
    Heal,
    SleepToggle,
    Open(Scene),
    ResetAsk,
    ResetConfirm,
    CursorMove(i32),
    CursorJump(i32),
    Select,
    Pick(usize),
    Unequip,
    RenameChar(char),
    RenameBackspace,
    Dismiss,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_command(scene: &Scene, ev: InputEvent) -> Option<Command> {
    if ev.mods.contains(KeyModifiers::CONTROL) && ev.key == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match scene {
        Scene::Rename => {
            return match ev.key {
                KeyCode::Enter => Some(Command::Select),
                KeyCode::Esc => Some(Command::Back),
                KeyCode::Backspace => Some(Command::RenameBackspace),
                KeyCode::Char(ch) if !ch.is_control() => Some(Command::RenameChar(ch)),
                _ => None,
            };
        }
        Scene::Recap => return Some(Command::Dismiss),
        Scene::ConfirmReset => {
            return match ev.key {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(Command::ResetConfirm),
                _ => Some(Command::Back),
            };
        }
        _ => {}
    }

    // Global
    match ev.key {
        KeyCode::Char('h') | KeyCode::Char('H') => return Some(Command::HelpToggle),
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Command::Quit),
        KeyCode::Esc => return Some(Command::Back),
        _ => {}
    }

    match scene {
        Scene::Main => match ev.key {
            KeyCode::Char('f') | KeyCode::Char('F') => Some(Command::Act(ActionKind::Feed)),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::Act(ActionKind::Play)),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Act(ActionKind::Rest)),
            KeyCode::Char('t') | KeyCode::Char('T') => Some(Command::Act(ActionKind::Train)),
            KeyCode::Char('m') | KeyCode::Char('M') => Some(Command::Heal),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::SleepToggle),
            KeyCode::Char('b') | KeyCode::Char('B') => Some(Command::Open(Scene::Shop)),
            KeyCode::Char('i') | KeyCode::Char('I') => Some(Command::Open(Scene::Pantry)),
            KeyCode::Char('w') | KeyCode::Char('W') => Some(Command::Open(Scene::Wardrobe)),
            KeyCode::Char('g') | KeyCode::Char('G') => Some(Command::Open(Scene::Games)),
            KeyCode::Char('k') | KeyCode::Char('K') => Some(Command::Open(Scene::Species)),
            KeyCode::Char('n') | KeyCode::Char('N') => Some(Command::Open(Scene::Rename)),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(Command::ResetAsk),
            _ => None,
        },
        Scene::Shop | Scene::Pantry | Scene::Games | Scene::Species | Scene::Wardrobe => {
            match ev.key {
                KeyCode::Up => Some(Command::CursorMove(-1)),
                KeyCode::Down => Some(Command::CursorMove(1)),
                KeyCode::Enter => Some(Command::Select),
                KeyCode::Char('u') | KeyCode::Char('U') if matches!(scene, Scene::Wardrobe) => {
                    Some(Command::Unequip)
                }
                _ => None,
            }
        }
        Scene::Minigame => match ev.key {
            KeyCode::Left | KeyCode::Char('a') => Some(Command::CursorMove(-1)),
            KeyCode::Right | KeyCode::Char('d') => Some(Command::CursorMove(1)),
            KeyCode::Up => Some(Command::CursorJump(-1)),
            KeyCode::Down => Some(Command::CursorJump(1)),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Command::Select),
            KeyCode::Char(c @ '1'..='9') => Some(Command::Pick(c as usize - '1' as usize)),
            _ => None,
        },
        Scene::Help => None,
        Scene::Rename | Scene::Recap | Scene::ConfirmReset => None,
    }
}
