//! Test doubles for the renderer and clock contracts.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use crate::rect::Rect;
use crate::render::{Renderer, Rgba};
use crate::time::Clock;

/// Texture stand-in that counts how often it has been released.
#[derive(Debug)]
pub struct TrackedTexture {
    pub name: String,
    drops: Rc<Cell<usize>>,
}

impl Drop for TrackedTexture {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    Clear(Rgba),
    Rect { texture: String, src: Rect, dest: Rect },
    Text { text: String, x: i32, y: i32 },
    Present,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<DrawCall>,
    pub fail_textures: bool,
    drops: Rc<Cell<usize>>,
}

impl RecordingRenderer {
    /// Shared counter of released textures created by this renderer.
    pub fn drop_counter(&self) -> Rc<Cell<usize>> {
        self.drops.clone()
    }

    pub fn frames(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Present))
            .count()
    }

    /// Destination rects drawn with `texture`, in draw order.
    pub fn rects_for(&self, texture: &str) -> Vec<Rect> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Rect {
                    texture: name,
                    dest,
                    ..
                } if name == texture => Some(*dest),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    type Texture = TrackedTexture;

    fn load_texture(&mut self, path: &Path) -> Result<TrackedTexture, String> {
        if self.fail_textures {
            return Err("texture loading disabled".to_string());
        }
        Ok(TrackedTexture {
            name: path.to_string_lossy().to_string(),
            drops: self.drops.clone(),
        })
    }

    fn clear(&mut self, color: Rgba) {
        self.calls.push(DrawCall::Clear(color));
    }

    fn draw_rect(&mut self, texture: &TrackedTexture, src: Rect, dest: Rect) {
        self.calls.push(DrawCall::Rect {
            texture: texture.name.clone(),
            src,
            dest,
        });
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, _color: Rgba) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn present(&mut self) {
        self.calls.push(DrawCall::Present);
    }
}

/// Clock that only moves when told to. Sleeping advances it.
#[derive(Debug, Default)]
pub struct ManualClock {
    pub now: u64,
    pub sleeps: Vec<u64>,
}

impl ManualClock {
    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now
    }

    fn sleep_millis(&mut self, ms: u64) {
        self.sleeps.push(ms);
        self.now += ms;
    }
}
