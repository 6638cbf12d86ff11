//! Sprite atlas objects and the drawable/placed capabilities shared by tiles
//! and the player.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use crate::rect::Rect;
use crate::render::Renderer;

/// Anything that occupies a world-space rectangle.
pub trait Placed {
    fn dest(&self) -> Rect;
}

/// Anything that can be blitted from an atlas.
pub trait Drawable: Placed {
    type Texture;

    fn src(&self) -> Rect;

    /// `None` when the texture failed to load. Such objects are skipped by
    /// the renderer but still take part in collision.
    fn texture(&self) -> Option<&Self::Texture>;
}

/// A source crop in an atlas texture plus a destination in the world.
///
/// The texture is reference counted so every tile of a level can share one
/// atlas; it is released when the last object holding it is dropped.
pub struct SpriteObject<T> {
    src: Rect,
    dest: Rect,
    texture: Option<Rc<T>>,
}

impl<T> SpriteObject<T> {
    pub fn new(texture: Option<Rc<T>>) -> Self {
        Self {
            src: Rect::default(),
            dest: Rect::default(),
            texture,
        }
    }

    pub fn with_rects(texture: Option<Rc<T>>, src: Rect, dest: Rect) -> Self {
        Self { src, dest, texture }
    }

    pub fn set_src(&mut self, src: Rect) {
        self.src = src;
    }

    pub fn set_dest(&mut self, dest: Rect) {
        self.dest = dest;
    }

    pub fn shared_texture(&self) -> Option<&Rc<T>> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Option<Rc<T>>) {
        self.texture = texture;
    }

    pub fn is_drawable(&self) -> bool {
        self.texture.is_some()
    }

    /// Replace the texture with one loaded from `path`. On failure the object
    /// keeps no texture and becomes non-drawable.
    pub fn load_image<R>(&mut self, renderer: &mut R, path: &Path) -> bool
    where
        R: Renderer<Texture = T>,
    {
        self.texture = load_shared_texture(renderer, path);
        self.texture.is_some()
    }
}

impl<T> Default for SpriteObject<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T> Clone for SpriteObject<T> {
    fn clone(&self) -> Self {
        Self {
            src: self.src,
            dest: self.dest,
            texture: self.texture.clone(),
        }
    }
}

impl<T> fmt::Debug for SpriteObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteObject")
            .field("src", &self.src)
            .field("dest", &self.dest)
            .field("drawable", &self.is_drawable())
            .finish()
    }
}

impl<T> Placed for SpriteObject<T> {
    fn dest(&self) -> Rect {
        self.dest
    }
}

impl<T> Drawable for SpriteObject<T> {
    type Texture = T;

    fn src(&self) -> Rect {
        self.src
    }

    fn texture(&self) -> Option<&T> {
        self.texture.as_deref()
    }
}

/// Load a texture that may be shared between several objects.
pub fn load_shared_texture<R: Renderer>(renderer: &mut R, path: &Path) -> Option<Rc<R::Texture>> {
    match renderer.load_texture(path) {
        Ok(texture) => Some(Rc::new(texture)),
        Err(err) => {
            log::warn!(
                "Failed to load texture '{}': {}. Object will not be drawn.",
                path.display(),
                err
            );
            None
        }
    }
}

/// Draw one object if it has a texture. Returns whether anything was drawn.
pub fn draw_object<R, D>(renderer: &mut R, object: &D) -> bool
where
    R: Renderer,
    D: Drawable<Texture = R::Texture>,
{
    match object.texture() {
        Some(texture) => {
            renderer.draw_rect(texture, object.src(), object.dest());
            true
        }
        None => false,
    }
}
