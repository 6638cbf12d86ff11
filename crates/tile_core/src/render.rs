//! Renderer contract consumed by the game loop.
//!
//! The loop only ever clears, blits atlas crops, draws one text label and
//! presents. Texture objects are owned by the game side behind `Rc`, so a
//! backend releases its GPU resources in `Drop` for `Self::Texture`.

use std::path::Path;

use serde::Deserialize;

use crate::rect::Rect;

/// 8-bit RGBA color.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Normalized `[r, g, b, a]` in `0.0..=1.0`.
    pub fn to_f32_array(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

const fn opaque() -> u8 {
    255
}

pub trait Renderer {
    type Texture;

    /// Load an image file into a texture. Errors are reported, never fatal.
    fn load_texture(&mut self, path: &Path) -> Result<Self::Texture, String>;

    fn clear(&mut self, color: Rgba);

    /// Blit the `src` crop of `texture` into the `dest` world rectangle.
    fn draw_rect(&mut self, texture: &Self::Texture, src: Rect, dest: Rect);

    /// Draw a single line of text with its top-left corner at `(x, y)`.
    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Rgba);

    fn present(&mut self);
}
