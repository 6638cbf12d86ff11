//! Tile-based side-scroller core: sprites, clip animation, level maps,
//! horizontal tile collision and the frame-paced game loop.
//!
//! Nothing in this crate touches a window or a GPU. The front end plugs in
//! through three small traits: [`render::Renderer`], [`input::InputSource`]
//! and [`time::Clock`].

pub mod animation;
pub mod collision;
pub mod config;
pub mod game;
pub mod input;
pub mod rect;
pub mod render;
pub mod sprite;
pub mod tilemap;
pub mod time;
pub mod watch;

#[cfg(test)]
mod replay;
#[cfg(test)]
mod testing;

pub use animation::{AnimationClip, ClipHandle, Entity};
pub use collision::{is_move_blocked, is_move_blocked_by};
pub use config::GameConfig;
pub use game::{GameLoop, GameState};
pub use input::{InputEvent, InputQueue, InputSource, Key};
pub use rect::Rect;
pub use render::{Renderer, Rgba};
pub use sprite::{Drawable, Placed, SpriteObject};
pub use tilemap::{LoadError, TileGeometry, TileMap};
pub use time::{Clock, FramePacer, SystemClock};
