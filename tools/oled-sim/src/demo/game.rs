//! Scripted endless-runner
//!
//! The player jumps on a fixed period and turns around every few seconds;
//! obstacles come from a xorshift generator. Nothing here draws: the state
//! is turned into actors by [`Game::actors`].

use ssd1331_display::scene::Actor;
use ssd1331_display::{Rect, Rgb565, Sprite, WIDTH};

use super::sprites;

/// Top of the ground line
pub const GROUND_Y: i32 = 54;
/// Obstacle slots
pub const MAX_OBSTACLES: usize = 4;
/// Actor slots: player, obstacles, banner
pub const ACTOR_SLOTS: usize = MAX_OBSTACLES + 2;

const START_X: i32 = 10;
const JUMP_VELOCITY: i32 = -9;
const MAX_SPEED: i32 = 6;
const SPEEDUP_TICKS: u32 = 200;
const TURN_TICKS: u32 = 150;
const WALK_MIN_X: i32 = 4;
const WALK_MAX_X: i32 = 40;
const FIRST_SPAWN: u32 = 40;
const RESTART_TICKS: u32 = 30;
const BANNER_X: i32 = 10;
const BANNER_Y: i32 = 10;

/// One xorshift32 step
pub fn xorshift(mut x: u32) -> u32 {
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    x
}

/// Colours the actors are drawn in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb565,
    pub foreground: Rgb565,
    pub accent: Rgb565,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObstacleKind {
    Cactus,
    Bird,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub x: i32,
    pub y: i32,
    /// Wing position for birds
    pub flap: bool,
}

impl Obstacle {
    pub fn sprite(&self) -> &'static Sprite {
        match (self.kind, self.flap) {
            (ObstacleKind::Cactus, _) => &sprites::CACTUS,
            (ObstacleKind::Bird, true) => &sprites::BIRD_UP,
            (ObstacleKind::Bird, false) => &sprites::BIRD_DOWN,
        }
    }

    pub fn rect(&self) -> Rect {
        self.sprite().bounds_at(self.x, self.y)
    }
}

/// Runner state
#[derive(Clone, Debug)]
pub struct Game {
    pub x: i32,
    pub y: i32,
    vy: i32,
    on_ground: bool,
    facing_left: bool,
    pub obstacles: [Option<Obstacle>; MAX_OBSTACLES],
    scroll_speed: i32,
    initial_speed: i32,
    pub tick: u32,
    pub score: u32,
    next_spawn: u32,
    game_over: bool,
    over_ticks: u32,
    seed: u32,
    jump_period: u32,
    /// Completed rounds
    pub rounds: u32,
}

impl Game {
    pub fn new(scroll_speed: i32, seed: u32, jump_period: u32) -> Self {
        let mut game = Self {
            x: START_X,
            y: 0,
            vy: 0,
            on_ground: true,
            facing_left: false,
            obstacles: [None; MAX_OBSTACLES],
            scroll_speed,
            initial_speed: scroll_speed,
            tick: 0,
            score: 0,
            next_spawn: FIRST_SPAWN,
            game_over: false,
            over_ticks: 0,
            seed,
            jump_period: jump_period.max(1),
            rounds: 0,
        };
        game.reset();
        game
    }

    fn floor_y() -> i32 {
        GROUND_Y - sprites::DINO_RIGHT.height as i32
    }

    fn reset(&mut self) {
        self.x = START_X;
        self.y = Self::floor_y();
        self.vy = 0;
        self.on_ground = true;
        self.facing_left = false;
        self.obstacles = [None; MAX_OBSTACLES];
        self.scroll_speed = self.initial_speed;
        self.score = 0;
        self.next_spawn = self.tick + FIRST_SPAWN;
        self.game_over = false;
        self.over_ticks = 0;
    }

    pub fn is_over(&self) -> bool {
        self.game_over
    }

    pub fn scroll_speed(&self) -> i32 {
        self.scroll_speed
    }

    pub fn player_sprite(&self) -> &'static Sprite {
        if self.game_over {
            &sprites::DINO_DEAD
        } else if self.facing_left {
            &sprites::DINO_LEFT
        } else {
            &sprites::DINO_RIGHT
        }
    }

    pub fn player_rect(&self) -> Rect {
        self.player_sprite().bounds_at(self.x, self.y)
    }

    /// Advance one frame
    pub fn update(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        if self.game_over {
            self.over_ticks += 1;
            if self.over_ticks >= RESTART_TICKS {
                self.rounds += 1;
                self.reset();
            }
            return;
        }
        self.score += 1;

        self.script_input();

        if !self.on_ground {
            self.vy += 1;
            self.y += self.vy;
            if self.y >= Self::floor_y() {
                self.y = Self::floor_y();
                self.vy = 0;
                self.on_ground = true;
            }
        }

        if self.tick >= self.next_spawn {
            self.spawn();
        }

        let speed = self.scroll_speed;
        let tick = self.tick;
        for slot in self.obstacles.iter_mut() {
            if let Some(obstacle) = slot {
                obstacle.x -= speed;
                if obstacle.kind == ObstacleKind::Bird && tick & 3 == 0 {
                    obstacle.flap = !obstacle.flap;
                }
                if obstacle.x + obstacle.sprite().width as i32 <= 0 {
                    *slot = None;
                }
            }
        }

        let player = self.player_rect();
        if self.obstacles.iter().flatten().any(|o| o.rect().overlaps(&player)) {
            log::debug!("game: collision at tick {} (score {})", self.tick, self.score);
            self.game_over = true;
        }

        if self.tick % SPEEDUP_TICKS == 0 && self.scroll_speed < MAX_SPEED {
            self.scroll_speed += 1;
        }
    }

    fn script_input(&mut self) {
        if self.tick % self.jump_period == 0 && self.on_ground {
            self.vy = JUMP_VELOCITY;
            self.on_ground = false;
        }
        if self.tick % TURN_TICKS == 0 {
            self.facing_left = !self.facing_left;
        }
        let step = if self.facing_left { -1 } else { 1 };
        self.x = (self.x + step).clamp(WALK_MIN_X, WALK_MAX_X);
    }

    fn spawn(&mut self) {
        let Some(slot) = self.obstacles.iter().position(Option::is_none) else {
            return;
        };
        let r = xorshift(self.tick.wrapping_add(self.score.wrapping_mul(17)) ^ self.seed);
        let kind = if r & 3 != 0 {
            ObstacleKind::Cactus
        } else {
            ObstacleKind::Bird
        };
        let y = match kind {
            ObstacleKind::Cactus => GROUND_Y - sprites::CACTUS.height as i32,
            ObstacleKind::Bird if r & 0x10 != 0 => 30,
            ObstacleKind::Bird => 40,
        };
        self.obstacles[slot] = Some(Obstacle {
            kind,
            x: WIDTH as i32 + 2,
            y,
            flap: false,
        });
        self.next_spawn = self.tick + 28 + (r & 31);
    }

    /// Actor for every slot: player, obstacles, banner
    pub fn actors(&self, palette: &Palette) -> [Actor; ACTOR_SLOTS] {
        let hidden = Actor {
            visible: false,
            ..Actor::new(&sprites::CACTUS, 0, 0, palette.foreground)
        };
        let mut actors = [hidden; ACTOR_SLOTS];

        let player_color = if self.game_over {
            palette.accent
        } else {
            palette.foreground
        };
        actors[0] = Actor::new(self.player_sprite(), self.x, self.y, player_color);

        for (i, slot) in self.obstacles.iter().enumerate() {
            if let Some(o) = slot {
                actors[i + 1] = Actor::new(o.sprite(), o.x, o.y, palette.foreground);
            }
        }

        actors[ACTOR_SLOTS - 1] = Actor {
            visible: self.game_over,
            ..Actor::new(&sprites::BANNER, BANNER_X, BANNER_Y, palette.accent)
        };
        actors
    }
}
