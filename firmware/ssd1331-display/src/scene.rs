//! Actors and the per-frame caller loop
//!
//! A [`Scene`] is a background colour, a few static scenery rectangles and
//! a fixed-capacity set of sprite actors. Each tick the caller:
//!
//! 1. takes a [`Scene::snapshot`] of actor rectangles,
//! 2. mutates actor positions and sprites,
//! 3. calls [`Scene::present`], which redraws the whole framebuffer and
//!    flushes the previous and current actor rectangles.
//!
//! [`Scene::move_actor`] is the alternative for a single actor: a panel-side
//! copy plus clear, used only when it provably leaves the panel identical to
//! the framebuffer, and a full redraw otherwise.

use heapless::Vec;
use log::debug;

use crate::display::{Display, FlushStats, Framebuffer, Rgb565, Sprite, HEIGHT, WIDTH};
use crate::error::{DisplayError, DisplayResult};
use crate::geometry::{Rect, Window};
use crate::hal::Transport;

/// Actor slots per scene
pub const MAX_ACTORS: usize = 8;
/// Scenery rectangles per scene
pub const MAX_SCENERY: usize = 4;
/// Dirty rectangles per frame: every actor before and after
pub const MAX_DIRTY: usize = MAX_ACTORS * 2;

/// Actor rectangles at one instant
pub type Snapshot = Vec<Rect, MAX_ACTORS>;
/// Rectangles to flush for one frame
pub type DirtyList = Vec<Rect, MAX_DIRTY>;

/// Index of an actor within its scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActorId(usize);

/// A positioned sprite
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub sprite: &'static Sprite,
    pub x: i32,
    pub y: i32,
    pub color: Rgb565,
    pub visible: bool,
}

impl Actor {
    pub const fn new(sprite: &'static Sprite, x: i32, y: i32, color: Rgb565) -> Self {
        Self {
            sprite,
            x,
            y,
            color,
            visible: true,
        }
    }

    /// Bounding rectangle; empty when hidden
    pub fn rect(&self) -> Rect {
        if self.visible {
            self.sprite.bounds_at(self.x, self.y)
        } else {
            Rect::default()
        }
    }
}

/// Result of [`Scene::move_actor`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Moved on the panel with copy + clear
    Copied,
    /// Acceleration was unsafe; the whole frame was redrawn and flushed
    FullRedraw(FlushStats),
}

/// Static solid rectangle drawn under the actors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scenery {
    pub rect: Rect,
    pub color: Rgb565,
}

/// Background, scenery and actors of one screen
pub struct Scene {
    background: Rgb565,
    scenery: Vec<Scenery, MAX_SCENERY>,
    actors: Vec<Actor, MAX_ACTORS>,
}

impl Scene {
    /// Empty scene over a solid background
    pub const fn new(background: Rgb565) -> Self {
        Self {
            background,
            scenery: Vec::new(),
            actors: Vec::new(),
        }
    }

    pub fn background(&self) -> Rgb565 {
        self.background
    }

    /// Add a static rectangle; gives it back if the scene is full
    pub fn add_scenery(&mut self, rect: Rect, color: Rgb565) -> Result<(), Scenery> {
        self.scenery.push(Scenery { rect, color })
    }

    /// Add an actor; gives it back if all slots are taken
    pub fn add_actor(&mut self, actor: Actor) -> Result<ActorId, Actor> {
        self.actors.push(actor)?;
        Ok(ActorId(self.actors.len() - 1))
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.0)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id.0)
    }

    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.actors.iter().enumerate().map(|(i, a)| (ActorId(i), a))
    }

    /// Rectangles of every visible actor, in slot order
    pub fn snapshot(&self) -> Snapshot {
        let mut rects = Snapshot::new();
        for actor in self.actors.iter().filter(|a| a.visible) {
            // capacity equals the actor capacity
            let _ = rects.push(actor.rect());
        }
        rects
    }

    /// Redraw background, scenery and visible actors
    pub fn render(&self, fb: &mut Framebuffer) {
        fb.clear(self.background);
        for s in &self.scenery {
            fb.fill_rect(s.rect.x, s.rect.y, s.rect.w, s.rect.h, s.color);
        }
        for actor in self.actors.iter().filter(|a| a.visible) {
            fb.blit_sprite(actor.sprite, actor.x, actor.y, actor.color);
        }
    }

    /// Every non-empty previous rectangle, then every non-empty current one
    ///
    /// `None` when the candidates do not fit in a [`DirtyList`].
    pub fn dirty_rects(previous: &[Rect], current: &[Rect]) -> Option<DirtyList> {
        let mut dirty = DirtyList::new();
        for rect in previous.iter().chain(current).filter(|r| !r.is_empty()) {
            dirty.push(*rect).ok()?;
        }
        Some(dirty)
    }

    /// Redraw and flush the regions actors left and now cover
    ///
    /// `previous` may hold any number of rectangles; all of them are sent.
    pub fn present<T: Transport>(
        &self,
        display: &mut Display<T>,
        previous: &[Rect],
    ) -> DisplayResult<FlushStats> {
        self.render(display.framebuffer_mut());
        let current = self.snapshot();
        display.sync_actors(previous, &current)
    }

    /// Redraw and flush the whole frame
    pub fn present_full<T: Transport>(&self, display: &mut Display<T>) -> DisplayResult<FlushStats> {
        self.render(display.framebuffer_mut());
        display.flush_full_frame()
    }

    /// Move one actor, using the panel's copy/clear when that is exact
    ///
    /// Acceleration needs a black background (clear-window writes black),
    /// source and destination fully on the panel and disjoint, and no
    /// scenery or other actor under either rectangle. Otherwise the scene
    /// is re-rendered and flushed in full. An id from another scene is
    /// [`DisplayError::OutOfBounds`].
    pub fn move_actor<T: Transport>(
        &mut self,
        display: &mut Display<T>,
        id: ActorId,
        x: i32,
        y: i32,
    ) -> DisplayResult<MoveOutcome> {
        let actor = self.actors.get(id.0).copied().ok_or(DisplayError::OutOfBounds)?;
        let from = actor.rect();
        let to = from.moved_to(x, y);

        match self.copy_windows(id, from, to) {
            Some((src, dst)) => {
                display.copy_window(&src, dst.x0, dst.y0)?;
                display.clear_window(&src)?;
                self.place(id, x, y);
                self.render(display.framebuffer_mut());
                Ok(MoveOutcome::Copied)
            }
            None => {
                debug!("scene: actor {} move falls back to full redraw", id.0);
                self.place(id, x, y);
                match self.present_full(display) {
                    Ok(stats) => Ok(MoveOutcome::FullRedraw(stats)),
                    Err(e) => {
                        // panel still shows the old position
                        self.place(id, actor.x, actor.y);
                        Err(e)
                    }
                }
            }
        }
    }

    fn place(&mut self, id: ActorId, x: i32, y: i32) {
        if let Some(actor) = self.actors.get_mut(id.0) {
            actor.x = x;
            actor.y = y;
        }
    }

    fn copy_windows(&self, id: ActorId, from: Rect, to: Rect) -> Option<(Window, Window)> {
        if self.background != Rgb565::BLACK || from.is_empty() || from == to || from.overlaps(&to) {
            return None;
        }
        let src = on_panel(from)?;
        let dst = on_panel(to)?;

        let covered = |r: &Rect| r.overlaps(&from) || r.overlaps(&to);
        let scenery_hit = self.scenery.iter().any(|s| covered(&s.rect));
        let actor_hit = self
            .actors
            .iter()
            .enumerate()
            .any(|(i, a)| i != id.0 && covered(&a.rect()));
        if scenery_hit || actor_hit {
            return None;
        }
        Some((src, dst))
    }
}

/// Window of a rectangle that lies entirely on the panel
fn on_panel(rect: Rect) -> Option<Window> {
    let window = rect.clip(WIDTH, HEIGHT)?;
    (window.to_rect() == rect).then_some(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Event, SimPanel};

    static BLOCK_DATA: [u8; 8] = [0xFF; 8];
    static BLOCK: Sprite = Sprite::new(8, 8, &BLOCK_DATA);

    fn display() -> Display<SimPanel> {
        let mut display = Display::new(SimPanel::new());
        display.initialize().unwrap();
        display.transport_mut().clear_log();
        display
    }

    fn assert_panel_matches(display: &Display<SimPanel>) {
        assert_eq!(display.transport().gddram(), display.framebuffer().as_slice());
    }

    #[test]
    fn test_dirty_rects_order_and_skip() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(10, 0, 4, 4);
        let dirty = Scene::dirty_rects(&[a, Rect::default()], &[b]).unwrap();
        assert_eq!(dirty.as_slice(), &[a, b]);
        assert!(Scene::dirty_rects(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_dirty_rects_overflow_is_reported() {
        let previous = [Rect::new(0, 0, 1, 1); MAX_DIRTY];
        assert!(Scene::dirty_rects(&previous, &[]).is_some());
        assert!(Scene::dirty_rects(&previous, &[Rect::new(50, 50, 8, 8)]).is_none());
    }

    #[test]
    fn test_present_sends_current_after_long_previous_list() {
        let mut display = display();
        let mut scene = Scene::new(Rgb565::BLACK);
        scene.present_full(&mut display).unwrap();
        scene.add_actor(Actor::new(&BLOCK, 50, 50, Rgb565::WHITE)).unwrap();

        let previous = [Rect::new(0, 0, 1, 1); MAX_DIRTY + 1];
        let stats = scene.present(&mut display, &previous).unwrap();
        assert_eq!(stats.transfers, MAX_DIRTY + 2);
        assert_panel_matches(&display);
    }

    #[test]
    fn test_snapshot_skips_hidden() {
        let mut scene = Scene::new(Rgb565::BLACK);
        let a = scene.add_actor(Actor::new(&BLOCK, 0, 0, Rgb565::WHITE)).unwrap();
        scene.add_actor(Actor::new(&BLOCK, 20, 0, Rgb565::WHITE)).unwrap();
        scene.actor_mut(a).unwrap().visible = false;
        assert_eq!(scene.snapshot().as_slice(), &[Rect::new(20, 0, 8, 8)]);
    }

    #[test]
    fn test_actor_capacity() {
        let mut scene = Scene::new(Rgb565::BLACK);
        for i in 0..MAX_ACTORS {
            scene.add_actor(Actor::new(&BLOCK, i as i32, 0, Rgb565::WHITE)).unwrap();
        }
        assert!(scene.add_actor(Actor::new(&BLOCK, 0, 0, Rgb565::WHITE)).is_err());
    }

    #[test]
    fn test_present_keeps_panel_in_sync() {
        let mut display = display();
        let mut scene = Scene::new(Rgb565(0x0010));
        scene.add_scenery(Rect::new(0, 54, 96, 2), Rgb565::WHITE).unwrap();
        let id = scene.add_actor(Actor::new(&BLOCK, 10, 40, Rgb565::RED)).unwrap();
        scene.present_full(&mut display).unwrap();

        for step in 1..25 {
            let prev = scene.snapshot();
            let actor = scene.actor_mut(id).unwrap();
            actor.x += 3;
            actor.y = 40 - (step % 7) * 3;
            let stats = scene.present(&mut display, &prev).unwrap();
            assert_eq!(stats.transfers, 2);
            assert_panel_matches(&display);
        }
    }

    #[test]
    fn test_move_actor_copies_when_disjoint() {
        let mut display = display();
        let mut scene = Scene::new(Rgb565::BLACK);
        let id = scene.add_actor(Actor::new(&BLOCK, 0, 0, Rgb565::GREEN)).unwrap();
        scene.present_full(&mut display).unwrap();
        display.transport_mut().clear_log();

        assert_eq!(scene.move_actor(&mut display, id, 20, 10).unwrap(), MoveOutcome::Copied);
        let events = display.transport().events();
        assert!(!events.iter().any(|e| matches!(e, Event::Data(_))));
        assert_panel_matches(&display);
    }

    #[test]
    fn test_move_actor_failure_keeps_old_position() {
        let mut display = Display::new(SimPanel::new());
        let mut scene = Scene::new(Rgb565::BLACK);
        let id = scene.add_actor(Actor::new(&BLOCK, 0, 0, Rgb565::GREEN)).unwrap();

        // disjoint move takes the copy path, overlapping one the redraw path
        assert_eq!(
            scene.move_actor(&mut display, id, 20, 10),
            Err(DisplayError::NotInitialized)
        );
        assert_eq!(scene.actor(id).unwrap().rect(), Rect::new(0, 0, 8, 8));
        assert_eq!(
            scene.move_actor(&mut display, id, 2, 0),
            Err(DisplayError::NotInitialized)
        );
        assert_eq!(scene.actor(id).unwrap().rect(), Rect::new(0, 0, 8, 8));
    }

    #[test]
    fn test_move_actor_overlap_falls_back() {
        let mut display = display();
        let mut scene = Scene::new(Rgb565::BLACK);
        let id = scene.add_actor(Actor::new(&BLOCK, 10, 10, Rgb565::GREEN)).unwrap();
        scene.present_full(&mut display).unwrap();

        let outcome = scene.move_actor(&mut display, id, 13, 10).unwrap();
        assert_eq!(outcome, MoveOutcome::FullRedraw(FlushStats::window(96 * 64)));
        assert_panel_matches(&display);
    }

    #[test]
    fn test_move_actor_non_black_background_falls_back() {
        let mut display = display();
        let mut scene = Scene::new(Rgb565::BLUE);
        let id = scene.add_actor(Actor::new(&BLOCK, 0, 0, Rgb565::GREEN)).unwrap();
        scene.present_full(&mut display).unwrap();

        let outcome = scene.move_actor(&mut display, id, 40, 40).unwrap();
        assert!(matches!(outcome, MoveOutcome::FullRedraw(_)));
        assert_panel_matches(&display);
    }

    #[test]
    fn test_move_actor_off_panel_or_over_scenery_falls_back() {
        let mut display = display();
        let mut scene = Scene::new(Rgb565::BLACK);
        scene.add_scenery(Rect::new(0, 60, 96, 4), Rgb565::WHITE).unwrap();
        let id = scene.add_actor(Actor::new(&BLOCK, 0, 0, Rgb565::GREEN)).unwrap();
        scene.present_full(&mut display).unwrap();

        let outcome = scene.move_actor(&mut display, id, 40, 56).unwrap();
        assert!(matches!(outcome, MoveOutcome::FullRedraw(_)));
        let outcome = scene.move_actor(&mut display, id, 92, 20).unwrap();
        assert!(matches!(outcome, MoveOutcome::FullRedraw(_)));
        assert_panel_matches(&display);
    }
}
