use serde::Deserialize;

/// Integer pixel rectangle. Used both for atlas-space source crops and
/// world-space destinations. `x`/`y` is the top-left corner.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub const fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            w: self.w,
            h: self.h,
        }
    }

    /// Half-open overlap test on both axes. Rectangles that only share an
    /// edge do not overlap.
    pub const fn overlaps(&self, other: &Rect) -> bool {
        spans_overlap(self.x, self.right(), other.x, other.right())
            && spans_overlap(self.y, self.bottom(), other.y, other.bottom())
    }
}

/// `[a0, a1)` and `[b0, b1)` share at least one point.
pub(crate) const fn spans_overlap(a0: i32, a1: i32, b0: i32, b1: i32) -> bool {
    a0 < b1 && a1 > b0
}
