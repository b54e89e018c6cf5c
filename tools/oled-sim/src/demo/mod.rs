//! Demo scene driven through the rendering core
//!
//! Binds the runner [`game`] to a [`Scene`] and presents each frame in one
//! of three ways:
//!
//! - **full**: redraw and send the whole framebuffer
//! - **dirty**: redraw, send previous + current actor rectangles
//! - **accelerated**: panel-side copy for plain moves, dirty flush for
//!   sprite swaps and (dis)appearances, full redraw when a copy is unsafe

pub mod game;
pub mod sprites;

use clap::ValueEnum;
use ssd1331_display::scene::{Actor, ActorId, MoveOutcome, Scene};
use ssd1331_display::{Display, DisplayResult, FlushStats, Rect, Transport};

use game::{Game, Palette, ACTOR_SLOTS, GROUND_Y};

/// How frames reach the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Full,
    Dirty,
    Accelerated,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Full, Mode::Dirty, Mode::Accelerated];

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Full => "full",
            Mode::Dirty => "dirty",
            Mode::Accelerated => "accelerated",
        }
    }
}

/// What one frame cost
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCost {
    pub flush: FlushStats,
    /// Panel-side copies issued
    pub copies: usize,
    /// Copies abandoned for a full redraw
    pub fallbacks: usize,
}

/// Game plus the scene it renders into
pub struct Demo {
    pub game: Game,
    scene: Scene,
    palette: Palette,
    ids: [ActorId; ACTOR_SLOTS],
}

impl Demo {
    pub fn new(game: Game, palette: Palette) -> Self {
        let mut scene = Scene::new(palette.background);
        // capacity is known to fit
        let _ = scene.add_scenery(Rect::new(0, GROUND_Y, 96, 2), palette.foreground);

        let actors = game.actors(&palette);
        let ids = actors.map(|actor| match scene.add_actor(actor) {
            Ok(id) => id,
            Err(_) => unreachable!("scene holds {} actors", ACTOR_SLOTS),
        });

        Self {
            game,
            scene,
            palette,
            ids,
        }
    }

    /// Draw and send the first frame
    pub fn present_first<T: Transport>(&self, display: &mut Display<T>) -> DisplayResult<FlushStats> {
        self.scene.present_full(display)
    }

    /// Advance the game and present the result
    pub fn step<T: Transport>(&mut self, display: &mut Display<T>, mode: Mode) -> DisplayResult<FrameCost> {
        self.game.update();
        let next = self.game.actors(&self.palette);

        match mode {
            Mode::Full => {
                self.apply_all(&next);
                Ok(FrameCost {
                    flush: self.scene.present_full(display)?,
                    ..FrameCost::default()
                })
            }
            Mode::Dirty => {
                let previous = self.scene.snapshot();
                self.apply_all(&next);
                Ok(FrameCost {
                    flush: self.scene.present(display, &previous)?,
                    ..FrameCost::default()
                })
            }
            Mode::Accelerated => self.step_accelerated(display, &next),
        }
    }

    fn apply_all(&mut self, next: &[Actor; ACTOR_SLOTS]) {
        for (id, actor) in self.ids.iter().zip(next) {
            if let Some(slot) = self.scene.actor_mut(*id) {
                *slot = *actor;
            }
        }
    }

    fn step_accelerated<T: Transport>(
        &mut self,
        display: &mut Display<T>,
        next: &[Actor; ACTOR_SLOTS],
    ) -> DisplayResult<FrameCost> {
        let mut cost = FrameCost::default();
        let mut moves: Vec<(ActorId, i32, i32)> = Vec::with_capacity(ACTOR_SLOTS);
        let mut dirty: Vec<Rect> = Vec::new();

        // sprite swaps and visibility changes go through a dirty flush first
        for (id, target) in self.ids.iter().zip(next) {
            let Some(current) = self.scene.actor(*id).copied() else {
                continue;
            };
            if current == *target {
                continue;
            }
            let plain_move = current.visible
                && target.visible
                && current.sprite == target.sprite
                && current.color == target.color;
            if plain_move {
                moves.push((*id, target.x, target.y));
            } else {
                dirty.push(current.rect());
                dirty.push(target.rect());
                if let Some(slot) = self.scene.actor_mut(*id) {
                    *slot = *target;
                }
            }
        }
        if !dirty.is_empty() {
            self.scene.render(display.framebuffer_mut());
            cost.flush.merge(display.flush_dirty(&dirty)?);
        }

        for (id, x, y) in moves {
            match self.scene.move_actor(display, id, x, y)? {
                MoveOutcome::Copied => cost.copies += 1,
                MoveOutcome::FullRedraw(stats) => {
                    cost.fallbacks += 1;
                    cost.flush.merge(stats);
                }
            }
        }
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssd1331_display::sim::SimPanel;
    use ssd1331_display::Rgb565;

    fn palette(background: Rgb565) -> Palette {
        Palette {
            background,
            foreground: Rgb565::WHITE,
            accent: Rgb565::RED,
        }
    }

    fn run(mode: Mode, background: Rgb565, frames: u32) -> (Display<SimPanel>, FrameCost) {
        let mut display = Display::new(SimPanel::new());
        display.initialize().unwrap();
        let mut demo = Demo::new(Game::new(3, 7, 23), palette(background));
        demo.present_first(&mut display).unwrap();

        let mut total = FrameCost::default();
        for frame in 0..frames {
            let cost = demo.step(&mut display, mode).unwrap();
            total.flush.merge(cost.flush);
            total.copies += cost.copies;
            total.fallbacks += cost.fallbacks;
            assert_eq!(
                display.transport().gddram(),
                display.framebuffer().as_slice(),
                "{} mode diverged at frame {}",
                mode.name(),
                frame
            );
        }
        (display, total)
    }

    #[test]
    fn test_every_mode_keeps_panel_in_sync() {
        for mode in Mode::ALL {
            run(mode, Rgb565::BLACK, 250);
        }
    }

    #[test]
    fn test_dirty_sends_less_than_full() {
        let (_, full) = run(Mode::Full, Rgb565::BLACK, 120);
        let (_, dirty) = run(Mode::Dirty, Rgb565::BLACK, 120);
        assert_eq!(full.flush.bytes, 120 * 96 * 64 * 2);
        assert!(dirty.flush.bytes < full.flush.bytes / 2);
    }

    #[test]
    fn test_accelerated_on_coloured_background_always_falls_back() {
        let (_, cost) = run(Mode::Accelerated, Rgb565(0x0008), 60);
        assert_eq!(cost.copies, 0);
        assert!(cost.fallbacks > 0);
    }
}
