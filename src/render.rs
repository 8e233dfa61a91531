use crate::app::Scene;
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use pocketpal::game::Game;
use pocketpal::minigame::catch::{CATCH_ROW, LANE_HEIGHT, LANE_WIDTH};
use pocketpal::minigame::memory::Face;
use pocketpal::minigame::whack::{Hole, GRID_SIDE};
use pocketpal::minigame::{Board, Outcome, Session};
use pocketpal::model::{Mood, Pet, Slot, Species};
use std::cmp::min;
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
    /// Monochrome mode: every foreground collapses to white.
    pub(crate) mono: bool,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16, mono: bool) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
            mono,
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, mut c: Cell) {
        if x < self.w && y < self.h {
            if self.mono {
                c.fg = Color::White;
            }
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            c.ch = ' ';
            c.fg = Color::White;
            c.bg = bg;
            c.bold = false;
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    mono: bool,
}

impl Terminal {
    pub(crate) fn begin(mono: bool) -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows, mono),
            cur: CellBuffer::new(cols, rows, mono),
            mono,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r, self.mono);
        self.cur = CellBuffer::new(c, r, self.mono);
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Text primitives
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        );
    }
}

fn draw_text_i(buf: &mut CellBuffer, x: i32, y: i32, s: &str, fg: Color) {
    if y < 0 || y >= buf.h as i32 {
        return;
    }
    for (i, ch) in s.chars().enumerate() {
        let xx = x + i as i32;
        if xx < 0 || ch == ' ' {
            continue;
        }
        buf.set(
            xx as u16,
            y as u16,
            Cell {
                ch,
                fg,
                bg: Color::Black,
                bold: false,
            },
        );
    }
}

fn bar(value01: f32, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f32 + 0.5) as usize;
    let mut s = String::new();
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '#' } else { '.' });
    }
    s.push(']');
    s
}

/// Green when the meter is in a good place, red when it needs attention.
/// Hunger reads the other way round.
fn meter_color(value: f32, inverted: bool) -> Color {
    let good = if inverted { 100.0 - value } else { value };
    if good >= 60.0 {
        Color::Green
    } else if good >= 30.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub(crate) fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let w = buf.w;
    let h = buf.h;
    let bw = min(60, w.saturating_sub(4));
    let bh = min(18, h.saturating_sub(4));
    if bw < 4 || bh < 4 {
        return;
    }
    let x0 = (w - bw) / 2;
    let y0 = (h - bh) / 2;

    let fg = Color::White;
    let bg = Color::Black;
    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            let ch = match (x == x0, x == x0 + bw - 1, y == y0, y == y0 + bh - 1) {
                (true, _, true, _) | (_, true, true, _) | (true, _, _, true) | (_, true, _, true) => '+',
                (true, _, _, _) | (_, true, _, _) => '|',
                (_, _, true, _) | (_, _, _, true) => '-',
                _ => ' ',
            };
            buf.set(
                x,
                y,
                Cell {
                    ch,
                    fg,
                    bg,
                    bold: false,
                },
            );
        }
    }

    draw_text(buf, x0 + 2, y0 + 1, title, Color::Yellow, bg);
    let mut yy = y0 + 3;
    for line in body.lines() {
        if yy >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, yy, line, fg, bg);
        yy += 1;
    }
}

/* -----------------------------
   Status panel
------------------------------ */

pub(crate) fn draw_status(buf: &mut CellBuffer, game: &Game, flash: Option<&str>) {
    let bg = Color::Black;
    let fg = Color::White;
    let pet = game.pet();
    let mood = game.mood();

    let title = format!(
        "PocketPal  |  {} the {}  |  Lv {}  |  Mood: {}",
        pet.name,
        species_label(pet.species),
        pet.level,
        mood.label()
    );
    draw_text(buf, 1, 0, &title, Color::Cyan, bg);

    let m = pet.meters;
    let lines = [
        ("Happy ", m.happiness, false),
        ("Hunger", m.hunger, true),
        ("Energy", m.energy, false),
        ("Fun   ", m.fun, false),
        ("Health", m.health, false),
    ];
    for (i, (name, val, inverted)) in lines.iter().enumerate() {
        let s = format!("{name} {} {:>5.1}", bar(*val / 100.0, 14), val);
        draw_text(buf, 1, 2 + i as u16, &s, meter_color(*val, *inverted), bg);
    }

    let xp = format!(
        "XP     {} {}/{}",
        bar(pet.xp as f32 / pet.xp_to_next.max(1) as f32, 14),
        pet.xp,
        pet.xp_to_next
    );
    draw_text(buf, 1, 8, &xp, Color::Magenta, bg);
    draw_text(buf, 1, 9, &format!("Coins  {}", pet.coins), Color::Yellow, bg);

    let mut status = Vec::new();
    if pet.flags.sleeping {
        status.push("sleeping");
    }
    if pet.flags.sick {
        status.push("sick");
    }
    if !status.is_empty() {
        draw_text(buf, 1, 10, &format!("Status {}", status.join(", ")), fg, bg);
    }

    if let Some(msg) = flash {
        draw_text(buf, 1, 12, msg, Color::Red, bg);
    } else if let Some(msg) = game.notice() {
        draw_text(buf, 1, 12, msg, Color::Green, bg);
    }
}

pub(crate) fn draw_footer(buf: &mut CellBuffer, scene: &Scene) {
    let help = match scene {
        Scene::Main => {
            "f feed | p play | r rest | t train | m medicine | s sleep | b shop | i pantry | w wardrobe | g games | k kind | n name | h help | q quit"
        }
        Scene::Shop | Scene::Pantry | Scene::Games | Scene::Species => {
            "up/down select | enter choose | esc back"
        }
        Scene::Wardrobe => "up/down select | enter wear | u take off | esc back",
        Scene::Minigame => "arrows move | 1-9 whack | enter flip/collect | esc quit game",
        Scene::Rename => "type a name | enter save | esc cancel",
        Scene::Help => "esc back | h close",
        Scene::Recap => "any key to continue",
        Scene::ConfirmReset => "y start over | any other key cancels",
    };
    draw_text(buf, 1, buf.h.saturating_sub(1), help, Color::DarkGrey, Color::Black);
}

pub(crate) fn draw_list(buf: &mut CellBuffer, x: u16, y: u16, title: &str, rows: &[String], cursor: usize) {
    draw_text(buf, x, y, title, Color::Cyan, Color::Black);
    for (i, row) in rows.iter().enumerate() {
        let selected = i == cursor;
        let line = format!("{} {}", if selected { ">" } else { " " }, row);
        let fg = if selected { Color::Yellow } else { Color::White };
        draw_text(buf, x, y + 2 + i as u16, &line, fg, Color::Black);
    }
    if rows.is_empty() {
        draw_text(buf, x, y + 2, "  (nothing here yet)", Color::DarkGrey, Color::Black);
    }
}

/* -----------------------------
   Pet sprite
------------------------------ */

fn species_label(s: Species) -> &'static str {
    match s {
        Species::Bear => "Bear",
        Species::Dog => "Dog",
        Species::Elephant => "Elephant",
        Species::Cat => "Cat",
        Species::Bunny => "Bunny",
    }
}

fn sprite(s: Species) -> [&'static str; 5] {
    match s {
        Species::Bear => [
            "  _       _  ",
            " ( \\_____/ ) ",
            "  /  o o  \\  ",
            " (    w    ) ",
            "  \\_______/  ",
        ],
        Species::Dog => [
            "  __     __  ",
            " /  \\___/  \\ ",
            " \\_  o o  _/ ",
            "   \\  w  /   ",
            "    \\___/    ",
        ],
        Species::Elephant => [
            "   _______   ",
            "  /       \\__",
            " |  o o   __)",
            "  \\______/ | ",
            "   |_|  |_|  ",
        ],
        Species::Cat => [
            "  /\\_____/\\  ",
            " (  o   o  ) ",
            " (   =w=   ) ",
            "  (       )  ",
            "   \"\"   \"\"   ",
        ],
        Species::Bunny => [
            "   () ()     ",
            "   (\\_/)     ",
            "  ( o o )    ",
            "  (  w  )    ",
            "  (\")_(\")    ",
        ],
    }
}

fn mood_color(mood: Mood) -> Color {
    match mood {
        Mood::Happy => Color::Green,
        Mood::Normal => Color::White,
        Mood::Sad => Color::Blue,
        Mood::Angry => Color::Red,
        Mood::Sick => Color::DarkGreen,
    }
}

/// Small sway so the pet looks alive; frozen while asleep.
pub(crate) fn pet_bounce(game: &Game) -> i32 {
    if game.pet().flags.sleeping {
        return 0;
    }
    let t = game.clock().as_secs_f32() * 2.0;
    t.sin().round() as i32
}

pub(crate) fn draw_pet(buf: &mut CellBuffer, pet: &Pet, mood: Mood, cx: i32, cy: i32) {
    let (eye, mouth) = if pet.flags.sleeping {
        ('-', '_')
    } else {
        match mood {
            Mood::Sick => ('x', '~'),
            Mood::Angry => ('>', 'n'),
            Mood::Sad => ('.', 'n'),
            Mood::Happy => ('^', 'w'),
            Mood::Normal => ('o', '-'),
        }
    };
    let glasses = pet.inventory.equipped_in(Slot::Glasses).is_some();
    let fg = mood_color(mood);

    let art = sprite(pet.species);
    let w = art[0].chars().count() as i32;
    let x0 = cx - w / 2;
    let y0 = cy - art.len() as i32 / 2;

    for (row, line) in art.iter().enumerate() {
        let line: String = line
            .chars()
            .map(|c| match c {
                'o' if glasses => '0',
                'o' => eye,
                'w' => mouth,
                c => c,
            })
            .collect();
        draw_text_i(buf, x0, y0 + row as i32, &line, fg);
    }

    if let Some(hat) = pet.inventory.equipped_in(Slot::Hat) {
        let top = if hat.name.contains("Crown") { "\\/\\/\\/" } else { " /\\ " };
        draw_text_i(buf, cx - top.len() as i32 / 2, y0 - 1, top, Color::Yellow);
    }
    if pet.inventory.equipped_in(Slot::Bow).is_some() {
        draw_text_i(buf, x0 + w - 3, y0, "><", Color::Magenta);
    }
    if let Some(shirt) = pet.inventory.equipped_in(Slot::Shirt) {
        let pattern = if shirt.name.contains("Striped") { "=====" } else { "#####" };
        draw_text_i(buf, cx - 2, y0 + art.len() as i32, pattern, Color::Red);
    }
    if pet.flags.sleeping {
        draw_text_i(buf, x0 + w, y0 - 1, "z Z", Color::Cyan);
    }
    if pet.flags.sick {
        draw_text_i(buf, x0 - 2, y0, "+", Color::Red);
    }
}

/* -----------------------------
   Minigame boards
------------------------------ */

pub(crate) fn draw_session(buf: &mut CellBuffer, session: &Session, cursor: usize, x: i32, y: i32) {
    let header = match session.time_remaining {
        Some(t) => format!("{}   score {}   time {:>2}s", session.kind.title(), session.score(), t),
        None => format!("{}   pairs {}   moves {}", session.kind.title(), session.score(), session.moves()),
    };
    draw_text_i(buf, x, y, &header, Color::Cyan);

    let top = y + 2;
    match &session.board {
        Board::Catch(g) => {
            for row in 0..LANE_HEIGHT {
                draw_text_i(buf, x, top + row, "|", Color::DarkGrey);
                draw_text_i(buf, x + LANE_WIDTH + 1, top + row, "|", Color::DarkGrey);
            }
            for o in &g.objects {
                draw_text_i(buf, x + 1 + o.x, top + o.y, "@", Color::Yellow);
            }
            draw_text_i(buf, x + g.catcher_x, top + CATCH_ROW, "\\_/", Color::Green);
        }
        Board::Whack(g) => {
            for (i, hole) in g.holes.iter().enumerate() {
                let (gx, gy) = ((i % GRID_SIDE) as i32, (i / GRID_SIDE) as i32);
                let (label, fg) = match hole {
                    Hole::Idle => ("( )", Color::DarkGrey),
                    Hole::Active { .. } => ("(M)", Color::Yellow),
                    Hole::Hit => ("(*)", Color::Red),
                };
                draw_text_i(buf, x + gx * 6, top + gy * 2, label, fg);
                draw_text_i(buf, x + gx * 6 + 4, top + gy * 2, &(i + 1).to_string(), Color::DarkGrey);
            }
        }
        Board::Memory(g) => {
            for (i, card) in g.cards.iter().enumerate() {
                let (gx, gy) = ((i % 4) as i32, (i / 4) as i32);
                let face = match card.face {
                    Face::Down => "[?]".to_string(),
                    Face::Up => format!("[{}]", card.symbol),
                    Face::Matched => format!(" {} ", card.symbol),
                };
                let fg = if i == cursor {
                    Color::Yellow
                } else if card.face == Face::Matched {
                    Color::Green
                } else {
                    Color::White
                };
                draw_text_i(buf, x + gx * 5, top + gy * 2, &face, fg);
            }
        }
    }

    let result = match session.outcome() {
        Outcome::Pending => return,
        Outcome::Win => "You won! Press enter to collect.",
        Outcome::Lose => "Time's up! Press enter to continue.",
    };
    draw_text_i(buf, x, top + LANE_HEIGHT + 1, result, Color::Magenta);
}
