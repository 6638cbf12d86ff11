//! Tick-based sprite-sheet animation.
//!
//! A clip is one atlas row of equally sized frames. Timing is counted in
//! update ticks rather than wall time, so the on-screen rate follows the
//! loop's achieved frame rate. An [`Entity`] owns its clips and drives the
//! source crop of its sprite from whichever clip is active.

use std::fmt;

use crate::rect::Rect;
use crate::sprite::{Drawable, Placed, SpriteObject};

/// Stable index of a clip registered on an [`Entity`]. Clips are never
/// removed, so a handle stays valid for the entity's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClipHandle(usize);

impl ClipHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationClip {
    /// Zero-based atlas row.
    pub row: u32,
    pub frame_width: i32,
    pub frame_height: i32,
    pub frame_count: u32,
    /// A frame is held while the tick accumulator is `<= speed`.
    pub speed: u32,
    pub current_frame: u32,
}

impl AnimationClip {
    /// Atlas crop of the frame currently shown.
    pub fn source_rect(&self) -> Rect {
        Rect::new(
            self.frame_width * self.current_frame as i32,
            self.frame_height * self.row as i32,
            self.frame_width,
            self.frame_height,
        )
    }
}

/// A sprite with a registry of animation clips.
pub struct Entity<T> {
    sprite: SpriteObject<T>,
    clips: Vec<AnimationClip>,
    active: ClipHandle,
    tick_accumulator: u32,
}

impl<T> Entity<T> {
    pub fn new(sprite: SpriteObject<T>) -> Self {
        Self {
            sprite,
            clips: Vec::new(),
            active: ClipHandle::default(),
            tick_accumulator: 0,
        }
    }

    /// Register a clip. `row` is 1-based, as authored in the sprite sheet.
    pub fn register_clip(
        &mut self,
        row: u32,
        frame_width: i32,
        frame_height: i32,
        frame_count: u32,
        speed: u32,
    ) -> ClipHandle {
        if row == 0 {
            log::warn!("Animation rows are 1-based; clamping row 0 to the first row");
        }
        if frame_count == 0 {
            log::warn!("Animation clip registered with zero frames; using one frame");
        }
        self.clips.push(AnimationClip {
            row: row.saturating_sub(1),
            frame_width,
            frame_height,
            frame_count: frame_count.max(1),
            speed,
            current_frame: 0,
        });
        ClipHandle(self.clips.len() - 1)
    }

    /// Make `handle` the active clip and restart the tick count. The clip's
    /// own frame position is left where it was.
    pub fn set_active_clip(&mut self, handle: ClipHandle) {
        self.tick_accumulator = 0;
        self.active = handle;
    }

    pub fn active_clip(&self) -> ClipHandle {
        self.active
    }

    pub fn clip(&self, handle: ClipHandle) -> Option<&AnimationClip> {
        self.clips.get(handle.0)
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn tick_accumulator(&self) -> u32 {
        self.tick_accumulator
    }

    /// Advance the active clip by one update tick and refresh the sprite's
    /// source crop.
    ///
    /// The crop is taken *before* the frame counter moves, so the frame a
    /// tick advances to is first shown on the following tick.
    pub fn advance(&mut self) {
        let Some(clip) = self.clips.get_mut(self.active.0) else {
            log::warn!(
                "Active clip {} is not registered ({} clips); animation skipped",
                self.active.0,
                self.clips.len()
            );
            return;
        };

        self.sprite.set_src(clip.source_rect());

        if self.tick_accumulator > clip.speed {
            clip.current_frame += 1;
            self.tick_accumulator = 0;
        }

        self.tick_accumulator += 1;

        if clip.current_frame >= clip.frame_count {
            clip.current_frame = 0;
        }
    }

    pub fn sprite(&self) -> &SpriteObject<T> {
        &self.sprite
    }

    pub fn sprite_mut(&mut self) -> &mut SpriteObject<T> {
        &mut self.sprite
    }

    pub fn set_dest(&mut self, dest: Rect) {
        self.sprite.set_dest(dest);
    }

    /// Move horizontally by `dx` pixels.
    pub fn translate_x(&mut self, dx: i32) {
        let dest = self.sprite.dest().translated(dx, 0);
        self.sprite.set_dest(dest);
    }
}

impl<T> Placed for Entity<T> {
    fn dest(&self) -> Rect {
        self.sprite.dest()
    }
}

impl<T> Drawable for Entity<T> {
    type Texture = T;

    fn src(&self) -> Rect {
        self.sprite.src()
    }

    fn texture(&self) -> Option<&T> {
        self.sprite.texture()
    }
}

impl<T> fmt::Debug for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("sprite", &self.sprite)
            .field("clips", &self.clips)
            .field("active", &self.active)
            .field("tick_accumulator", &self.tick_accumulator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    type TestEntity = Entity<()>;

    fn entity() -> TestEntity {
        Entity::new(SpriteObject::default())
    }

    fn current_frame(e: &TestEntity) -> u32 {
        e.clip(e.active_clip()).expect("active clip").current_frame
    }

    /// Run the first `speed + 1` ticks after a switch, after which the clip
    /// advances exactly once every `speed + 1` ticks.
    fn prime(e: &mut TestEntity, speed: u32) {
        for _ in 0..=speed {
            e.advance();
        }
    }

    #[test]
    fn register_clip_stores_zero_based_row_and_returns_sequential_handles() {
        let mut e = entity();
        let idle = e.register_clip(1, 24, 26, 4, 20);
        let run = e.register_clip(2, 24, 26, 5, 10);
        assert_eq!(idle.index(), 0);
        assert_eq!(run.index(), 1);
        assert_eq!(e.clip(idle).map(|c| c.row), Some(0));
        assert_eq!(e.clip(run).map(|c| c.row), Some(1));
        assert_eq!(e.clip(run).map(|c| c.current_frame), Some(0));
    }

    #[test]
    fn duplicate_clips_are_not_merged() {
        let mut e = entity();
        let a = e.register_clip(1, 24, 26, 4, 20);
        let b = e.register_clip(1, 24, 26, 4, 20);
        assert_ne!(a, b);
        assert_eq!(e.clip_count(), 2);
    }

    #[test]
    fn zero_frame_count_is_clamped() {
        let mut e = entity();
        let h = e.register_clip(0, 8, 8, 0, 1);
        let clip = e.clip(h).expect("clip");
        assert_eq!(clip.frame_count, 1);
        assert_eq!(clip.row, 0);
    }

    #[test]
    fn advance_sets_source_rect_from_active_clip() {
        let mut e = entity();
        let _idle = e.register_clip(1, 24, 26, 4, 20);
        let run = e.register_clip(3, 24, 26, 5, 10);
        e.set_active_clip(run);
        e.advance();
        assert_eq!(e.src(), Rect::new(0, 52, 24, 26));
    }

    #[test]
    fn first_frame_after_switch_is_held_speed_plus_two_ticks() {
        let mut e = entity();
        let h = e.register_clip(1, 10, 10, 3, 2);
        e.set_active_clip(h);
        for _ in 0..3 {
            e.advance();
            assert_eq!(current_frame(&e), 0);
        }
        e.advance();
        assert_eq!(current_frame(&e), 1);
        // The crop lags the counter by one tick.
        assert_eq!(e.src().x, 0);
        e.advance();
        assert_eq!(e.src().x, 10);
    }

    #[test]
    fn frame_wraps_to_zero() {
        let mut e = entity();
        let h = e.register_clip(1, 10, 10, 2, 0);
        e.set_active_clip(h);
        let seen: Vec<u32> = (0..6)
            .map(|_| {
                e.advance();
                current_frame(&e)
            })
            .collect();
        assert_eq!(seen, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn switching_clips_resets_ticks_but_keeps_frame_progress() {
        let mut e = entity();
        let idle = e.register_clip(1, 24, 26, 4, 1);
        let run = e.register_clip(2, 24, 26, 5, 1);
        e.set_active_clip(idle);
        for _ in 0..5 {
            e.advance();
        }
        let idle_frame = current_frame(&e);
        assert!(idle_frame > 0);

        e.set_active_clip(run);
        assert_eq!(e.tick_accumulator(), 0);
        e.advance();

        e.set_active_clip(idle);
        assert_eq!(current_frame(&e), idle_frame);
    }

    #[test]
    fn unregistered_active_clip_is_ignored() {
        let mut other = entity();
        other.register_clip(1, 8, 8, 1, 0);
        let foreign = other.register_clip(1, 8, 8, 1, 0);

        let mut e = entity();
        e.register_clip(1, 8, 8, 1, 0);
        e.set_dest(Rect::new(1, 2, 3, 4));
        e.set_active_clip(foreign);
        e.advance();
        assert_eq!(e.src(), Rect::default());
        assert_eq!(e.dest(), Rect::new(1, 2, 3, 4));
    }

    #[test]
    fn translate_x_moves_only_horizontally() {
        let mut e = entity();
        e.set_dest(Rect::new(100, 375, 72, 78));
        e.translate_x(-5);
        assert_eq!(e.dest(), Rect::new(95, 375, 72, 78));
    }

    proptest! {
        #[test]
        fn speed_plus_one_ticks_advance_one_frame(
            frame_count in 1u32..12,
            speed in 0u32..30,
            warmup in 0usize..64,
        ) {
            let mut e = entity();
            let h = e.register_clip(1, 16, 16, frame_count, speed);
            e.set_active_clip(h);
            prime(&mut e, speed);
            for _ in 0..warmup {
                e.advance();
            }
            let before = current_frame(&e);
            for _ in 0..=speed {
                e.advance();
            }
            prop_assert_eq!(current_frame(&e), (before + 1) % frame_count);
        }

        #[test]
        fn full_cycle_returns_to_start(
            frame_count in 1u32..12,
            speed in 0u32..30,
            warmup in 0usize..64,
        ) {
            let mut e = entity();
            let h = e.register_clip(2, 16, 16, frame_count, speed);
            e.set_active_clip(h);
            prime(&mut e, speed);
            for _ in 0..warmup {
                e.advance();
            }
            let start = current_frame(&e);
            for _ in 0..frame_count * (speed + 1) {
                e.advance();
                prop_assert!(current_frame(&e) < frame_count);
            }
            prop_assert_eq!(current_frame(&e), start);
        }
    }
}
