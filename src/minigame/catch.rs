use rand::Rng;

pub const LANE_WIDTH: i32 = 9;
pub const LANE_HEIGHT: i32 = 8;
pub const CATCH_ROW: i32 = LANE_HEIGHT - 1;
pub const CATCH_TOLERANCE: i32 = 1;
pub const MAX_IN_FLIGHT: usize = 4;
pub const SPAWN_CHANCE: f64 = 0.4;
pub const TARGET_SCORE: u32 = 5;
pub const TIME_BUDGET: u32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Falling {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatchGame {
    pub catcher_x: i32,
    pub objects: Vec<Falling>,
    pub score: u32,
    pub missed: u32,
}

impl Default for CatchGame {
    fn default() -> Self {
        Self::new()
    }
}

impl CatchGame {
    pub fn new() -> Self {
        Self {
            catcher_x: LANE_WIDTH / 2,
            objects: Vec::with_capacity(MAX_IN_FLIGHT),
            score: 0,
            missed: 0,
        }
    }

    pub fn move_catcher(&mut self, dx: i32) {
        self.catcher_x = (self.catcher_x + dx).clamp(0, LANE_WIDTH - 1);
    }

    /// Spawn roll, then every object falls one row. Objects reaching the catch
    /// row are either caught or lost. Returns how many were caught.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u32 {
        if self.objects.len() < MAX_IN_FLIGHT && rng.gen_bool(SPAWN_CHANCE) {
            self.objects.push(Falling {
                x: rng.gen_range(0..LANE_WIDTH),
                y: 0,
            });
        }

        let catcher = self.catcher_x;
        let mut caught = 0;
        let mut missed = 0;
        self.objects.retain_mut(|o| {
            o.y += 1;
            if o.y < CATCH_ROW {
                return true;
            }
            if (o.x - catcher).abs() <= CATCH_TOLERANCE {
                caught += 1;
            } else {
                missed += 1;
            }
            false
        });
        self.score += caught;
        self.missed += missed;
        caught
    }

    pub fn is_won(&self) -> bool {
        self.score >= TARGET_SCORE
    }
}
