//! Horizontal move gating against the world bounds and static tiles.
//!
//! Only the x axis is tested: the displaced rectangle's horizontal span is
//! checked together with the *unmoved* vertical span. There is no gravity
//! and no vertical resolution; a move is either taken whole or refused.

use crate::rect::{spans_overlap, Rect};
use crate::sprite::Placed;

/// Returns `true` when moving `moving` by `dx` would leave `[0, world_width]`
/// horizontally or overlap any of `tiles`.
///
/// Bounds are inclusive: a rectangle flush with `x = 0` or with its right
/// edge at `world_width` is allowed. Tile overlap uses half-open spans, so
/// touching a tile's edge is not a collision.
pub fn is_move_blocked<I>(moving: Rect, dx: i32, world_width: i32, tiles: I) -> bool
where
    I: IntoIterator<Item = Rect>,
{
    let left = moving.x + dx;
    let right = left + moving.w;
    if left < 0 || right > world_width {
        return true;
    }

    tiles.into_iter().any(|tile| {
        spans_overlap(left, right, tile.x, tile.right())
            && spans_overlap(moving.y, moving.bottom(), tile.y, tile.bottom())
    })
}

/// [`is_move_blocked`] over any placed objects (tiles, other sprites).
pub fn is_move_blocked_by<P: Placed>(
    moving: Rect,
    dx: i32,
    world_width: i32,
    obstacles: &[P],
) -> bool {
    let blocked = is_move_blocked(moving, dx, world_width, obstacles.iter().map(Placed::dest));
    if blocked {
        log::trace!("Move of {dx}px from x={} blocked", moving.x);
    }
    blocked
}
