use crate::error::{PetError, PetResult};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

pub const SYMBOLS: [char; 4] = ['*', '@', '#', '%'];
pub const CARDS: usize = SYMBOLS.len() * 2;
pub const MATCH_REVEAL: Duration = Duration::from_millis(500);
pub const MISMATCH_REVEAL: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Down,
    Up,
    Matched,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Card {
    pub symbol: char,
    pub face: Face,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flip {
    /// First card of a pair.
    Opened,
    /// Second card; the pair settles after the matching reveal delay.
    PairUp { matched: bool },
}

impl Flip {
    pub fn reveal_delay(self) -> Option<Duration> {
        match self {
            Flip::Opened => None,
            Flip::PairUp { matched: true } => Some(MATCH_REVEAL),
            Flip::PairUp { matched: false } => Some(MISMATCH_REVEAL),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryGame {
    pub cards: Vec<Card>,
    face_up: Vec<usize>,
    pub moves: u32,
}

impl MemoryGame {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards: Vec<Card> = SYMBOLS
            .iter()
            .chain(SYMBOLS.iter())
            .map(|&symbol| Card {
                symbol,
                face: Face::Down,
            })
            .collect();
        cards.shuffle(rng);
        Self {
            cards,
            face_up: Vec::with_capacity(2),
            moves: 0,
        }
    }

    pub fn flip(&mut self, idx: usize) -> PetResult<Flip> {
        let card = self
            .cards
            .get(idx)
            .ok_or_else(|| PetError::invalid(format!("No card {idx}")))?;
        match card.face {
            Face::Matched => return Err(PetError::precondition("That pair is already matched.")),
            Face::Up => return Err(PetError::precondition("That card is already face up.")),
            Face::Down => {}
        }
        if self.face_up.len() >= 2 {
            return Err(PetError::precondition("Wait for the cards to turn back."));
        }

        self.cards[idx].face = Face::Up;
        self.face_up.push(idx);
        if self.face_up.len() < 2 {
            return Ok(Flip::Opened);
        }
        self.moves += 1;
        let (a, b) = (self.face_up[0], self.face_up[1]);
        Ok(Flip::PairUp {
            matched: self.cards[a].symbol == self.cards[b].symbol,
        })
    }

    /// Resolves a face-up pair: matched cards stay, others turn back down.
    /// Returns None when no pair was waiting.
    pub fn settle(&mut self) -> Option<bool> {
        if self.face_up.len() < 2 {
            return None;
        }
        let (a, b) = (self.face_up[0], self.face_up[1]);
        self.face_up.clear();
        let matched = self.cards[a].symbol == self.cards[b].symbol;
        let face = if matched { Face::Matched } else { Face::Down };
        self.cards[a].face = face;
        self.cards[b].face = face;
        Some(matched)
    }

    pub fn matched(&self) -> usize {
        self.cards.iter().filter(|c| c.face == Face::Matched).count()
    }

    pub fn is_complete(&self) -> bool {
        self.matched() == CARDS
    }
}
