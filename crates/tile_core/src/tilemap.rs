//! Level maps built from a plain-text tile grid.
//!
//! Format (whitespace-separated integers):
//!
//! ```text
//! columns rows originX originY
//! c00 c01 ... c0n
//! ...
//! ```
//!
//! Each cell is a 1-based index into a tile atlas laid out `atlas_columns`
//! tiles wide; `0` is an empty cell and produces no tile. Tiles are scaled by
//! `scale` and placed on a uniform grid offset by the origin.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use serde::Deserialize;

use crate::rect::Rect;
use crate::sprite::{Placed, SpriteObject};

#[derive(Debug, Clone)]
pub enum LoadError {
    /// The level file could not be opened or read.
    Unreadable { path: PathBuf, reason: String },
    /// The level text does not follow the grid format.
    Malformed { line: usize, reason: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Unreadable { path, reason } => {
                write!(f, "Failed to read level {}: {}", path.display(), reason)
            }
            LoadError::Malformed { line, reason } => {
                write!(f, "Malformed level (line {}): {}", line, reason)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Pixel size of atlas tiles and how they are scaled into the world.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TileGeometry {
    pub tile_width: i32,
    pub tile_height: i32,
    /// Atlas width in tiles.
    pub atlas_columns: u32,
    pub scale: i32,
}

impl Default for TileGeometry {
    fn default() -> Self {
        Self {
            tile_width: 16,
            tile_height: 16,
            atlas_columns: 8,
            scale: 3,
        }
    }
}

impl TileGeometry {
    /// Atlas crop for a 1-based tile index, or `None` when the crop falls
    /// outside the `i32` pixel space.
    pub fn source_rect(&self, index: u32) -> Option<Rect> {
        let zero_based = index.saturating_sub(1);
        let columns = self.atlas_columns.max(1);
        let grid_x = i32::try_from(zero_based % columns).ok()?;
        let grid_y = i32::try_from(zero_based / columns).ok()?;
        checked_rect(
            grid_x.checked_mul(self.tile_width)?,
            grid_y.checked_mul(self.tile_height)?,
            self.tile_width,
            self.tile_height,
        )
    }

    /// World placement for the cell at `(column, row)`, or `None` when it
    /// lands outside the `i32` world.
    pub fn dest_rect(&self, column: u32, row: u32, origin_x: i32, origin_y: i32) -> Option<Rect> {
        let w = self.tile_width.checked_mul(self.scale)?;
        let h = self.tile_height.checked_mul(self.scale)?;
        let x = i32::try_from(column).ok()?.checked_mul(w)?.checked_add(origin_x)?;
        let y = i32::try_from(row).ok()?.checked_mul(h)?.checked_add(origin_y)?;
        checked_rect(x, y, w, h)
    }
}

// Far edges must stay representable so collision can take `right()`.
fn checked_rect(x: i32, y: i32, w: i32, h: i32) -> Option<Rect> {
    x.checked_add(w)?;
    y.checked_add(h)?;
    Some(Rect::new(x, y, w, h))
}

/// Static level tiles. Immutable once built; reloading replaces the map.
pub struct TileMap<T> {
    pub origin_x: i32,
    pub origin_y: i32,
    pub columns: u32,
    pub rows: u32,
    tiles: Vec<SpriteObject<T>>,
}

impl<T> TileMap<T> {
    pub fn empty() -> Self {
        Self {
            origin_x: 0,
            origin_y: 0,
            columns: 0,
            rows: 0,
            tiles: Vec::new(),
        }
    }

    pub fn load(
        path: &Path,
        atlas: Option<Rc<T>>,
        geometry: &TileGeometry,
    ) -> Result<Self, LoadError> {
        let raw = fs::read_to_string(path).map_err(|e| LoadError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let map = Self::from_source(&raw, atlas, geometry)?;
        log::info!(
            "Level loaded: {} ({}x{} cells, {} tiles)",
            path.display(),
            map.columns,
            map.rows,
            map.tiles.len()
        );
        Ok(map)
    }

    pub fn from_source(
        source: &str,
        atlas: Option<Rc<T>>,
        geometry: &TileGeometry,
    ) -> Result<Self, LoadError> {
        let mut tokens = Tokens::new(source);
        let columns: u32 = tokens.next_number("column count")?;
        let rows: u32 = tokens.next_number("row count")?;
        let origin_x: i32 = tokens.next_number("origin x")?;
        let origin_y: i32 = tokens.next_number("origin y")?;

        let mut tiles = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                let index: u32 = tokens.next_number("tile index")?;
                if index == 0 {
                    continue;
                }
                let rects = geometry
                    .source_rect(index)
                    .zip(geometry.dest_rect(column, row, origin_x, origin_y));
                let Some((src, dest)) = rects else {
                    return Err(LoadError::Malformed {
                        line: tokens.line_of_previous(),
                        reason: format!(
                            "tile index/origin out of range (index {index} at column {column}, row {row})"
                        ),
                    });
                };
                tiles.push(SpriteObject::with_rects(atlas.clone(), src, dest));
            }
        }

        let extra = tokens.remaining();
        if extra > 0 {
            log::warn!(
                "Level has {} tokens after the {}x{} grid; ignoring them",
                extra,
                columns,
                rows
            );
        }

        Ok(Self {
            origin_x,
            origin_y,
            columns,
            rows,
            tiles,
        })
    }

    /// Tiles in row-major grid order.
    pub fn tiles(&self) -> &[SpriteObject<T>] {
        &self.tiles
    }

    pub fn tile_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.tiles.iter().map(Placed::dest)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl<T> Default for TileMap<T> {
    fn default() -> Self {
        Self::empty()
    }
}

struct Tokens<'a> {
    items: Vec<(usize, &'a str)>,
    cursor: usize,
    last_line: usize,
}

impl<'a> Tokens<'a> {
    fn new(source: &'a str) -> Self {
        let items: Vec<(usize, &str)> = source
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |t| (i + 1, t)))
            .collect();
        Self {
            items,
            cursor: 0,
            last_line: source.lines().count().max(1),
        }
    }

    fn next_number<N: FromStr>(&mut self, what: &str) -> Result<N, LoadError> {
        let Some(&(line, token)) = self.items.get(self.cursor) else {
            return Err(LoadError::Malformed {
                line: self.last_line,
                reason: format!("unexpected end of level, expected {what}"),
            });
        };
        self.cursor += 1;
        token.parse().map_err(|_| LoadError::Malformed {
            line,
            reason: format!("invalid {what} '{token}'"),
        })
    }

    /// Line of the token most recently consumed.
    fn line_of_previous(&self) -> usize {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.items.get(i))
            .map_or(self.last_line, |&(line, _)| line)
    }

    fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::Drawable;
    use proptest::prelude::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tile_level_test_{}_{}_{}.level",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn parse(source: &str) -> Result<TileMap<()>, LoadError> {
        TileMap::from_source(source, None, &TileGeometry::default())
    }

    #[test]
    fn two_tile_row_places_tiles_side_by_side() {
        let map = parse("2 1 0 0\n1 2\n").expect("level should parse");
        let tiles = map.tiles();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].dest(), Rect::new(0, 0, 48, 48));
        assert_eq!(tiles[0].src(), Rect::new(0, 0, 16, 16));
        assert_eq!(tiles[1].dest(), Rect::new(48, 0, 48, 48));
        assert_eq!(tiles[1].src(), Rect::new(16, 0, 16, 16));
    }

    #[test]
    fn empty_cells_are_skipped_and_origin_applies() {
        let map = parse("3 2 10 400\n0 9 0\n1 0 16\n").expect("level should parse");
        assert_eq!(map.columns, 3);
        assert_eq!(map.rows, 2);
        let rects: Vec<Rect> = map.tile_rects().collect();
        assert_eq!(
            rects,
            vec![
                Rect::new(58, 400, 48, 48),
                Rect::new(10, 448, 48, 48),
                Rect::new(106, 448, 48, 48),
            ]
        );
        // Index 9 wraps to the second atlas row, 16 is the end of it.
        assert_eq!(map.tiles()[0].src(), Rect::new(0, 16, 16, 16));
        assert_eq!(map.tiles()[2].src(), Rect::new(112, 16, 16, 16));
    }

    #[test]
    fn grid_layout_does_not_depend_on_line_breaks() {
        let a = parse("2 2 0 0\n1 2\n3 4\n").expect("parse");
        let b = parse("2 2 0 0 1 2 3 4").expect("parse");
        let ra: Vec<Rect> = a.tile_rects().collect();
        let rb: Vec<Rect> = b.tile_rects().collect();
        assert_eq!(ra, rb);
    }

    #[test]
    fn negative_origin_is_allowed() {
        let map = parse("1 1 -24 -8\n1").expect("parse");
        assert_eq!(map.tiles()[0].dest(), Rect::new(-24, -8, 48, 48));
    }

    #[test]
    fn all_zero_grid_yields_empty_map() {
        let map = parse("2 2 0 0\n0 0\n0 0").expect("parse");
        assert!(map.is_empty());
        assert_eq!(map.columns, 2);
    }

    #[test]
    fn short_grid_is_malformed() {
        let err = parse("2 2 0 0\n1 2\n3").err().expect("short grid should fail");
        match err {
            LoadError::Malformed { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("unexpected end"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_numeric_token_is_malformed() {
        let err = parse("2 1 0 0\n1 x\n").err().expect("bad token should fail");
        assert!(matches!(err, LoadError::Malformed { line: 2, .. }));
        assert!(err.to_string().contains("invalid tile index 'x'"));
    }

    #[test]
    fn negative_counts_and_indices_are_malformed() {
        assert!(matches!(
            parse("-1 1 0 0\n1"),
            Err(LoadError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            parse("1 1 0 0\n-3"),
            Err(LoadError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn huge_tile_index_is_malformed() {
        let err = parse("1 1 0 0\n1100000000")
            .err()
            .expect("index past the i32 atlas should fail");
        match err {
            LoadError::Malformed { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("out of range"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            parse(&format!("1 1 0 0\n{}", u32::MAX)),
            Err(LoadError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn huge_origin_is_malformed() {
        // The first column fits; the second pushes past i32::MAX.
        assert!(matches!(
            parse("2 1 2147483647 0\n0 1"),
            Err(LoadError::Malformed { line: 2, .. })
        ));
        // A lone tile at the very edge still has no representable right side.
        assert!(matches!(
            parse("1 1 2147483647 0\n1"),
            Err(LoadError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse("1 2 0 2147483600\n0\n\n7"),
            Err(LoadError::Malformed { line: 4, .. })
        ));
    }

    #[test]
    fn empty_cells_far_out_are_not_range_checked() {
        let map = parse("2 1 2147483647 0\n0 0").expect("empty cells place nothing");
        assert!(map.is_empty());
    }

    #[test]
    fn trailing_tokens_are_ignored() {
        let map = parse("1 1 0 0\n1\n5 6 7").expect("parse");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let path = temp_file_path("missing");
        let err = TileMap::<()>::load(&path, None, &TileGeometry::default())
            .err()
            .expect("missing file should fail");
        assert!(matches!(err, LoadError::Unreadable { .. }));
        assert!(err.to_string().starts_with("Failed to read level"));
    }

    #[test]
    fn load_reads_file_and_shares_atlas() {
        let path = temp_file_path("valid");
        fs::write(&path, "3 1 0 0\n1 0 2\n").expect("write temp file");
        let atlas = Rc::new(());
        let map = TileMap::load(&path, Some(atlas.clone()), &TileGeometry::default())
            .expect("level should load");
        assert_eq!(map.len(), 2);
        assert!(map.tiles().iter().all(|t| t.is_drawable()));
        // Two tiles plus the local handle.
        assert_eq!(Rc::strong_count(&atlas), 3);
        drop(map);
        assert_eq!(Rc::strong_count(&atlas), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn custom_geometry_scales_tiles() {
        let geometry = TileGeometry {
            tile_width: 8,
            tile_height: 12,
            atlas_columns: 4,
            scale: 2,
        };
        let map = TileMap::<()>::from_source("2 1 5 5\n0 6", None, &geometry).expect("parse");
        assert_eq!(map.tiles()[0].dest(), Rect::new(21, 5, 16, 24));
        assert_eq!(map.tiles()[0].src(), Rect::new(8, 12, 8, 12));
    }

    proptest! {
        #[test]
        fn source_rect_follows_atlas_grid(index in 1u32..512) {
            let g = TileGeometry::default();
            let expected = Rect::new(
                ((index - 1) % 8) as i32 * 16,
                ((index - 1) / 8) as i32 * 16,
                16,
                16,
            );
            prop_assert_eq!(g.source_rect(index), Some(expected));

            let map = parse(&format!("1 1 0 0\n{index}")).expect("parse");
            prop_assert_eq!(map.tiles()[0].src(), expected);
        }

        #[test]
        fn any_index_or_origin_loads_or_is_malformed(
            index in 1u32..=u32::MAX,
            origin_x in any::<i32>(),
            origin_y in any::<i32>(),
        ) {
            let source = format!("2 2 {origin_x} {origin_y}\n{index} {index}\n{index} 0");
            match parse(&source) {
                Ok(map) => {
                    prop_assert_eq!(map.len(), 3);
                    for rect in map.tile_rects() {
                        prop_assert!(rect.x.checked_add(rect.w).is_some());
                        prop_assert!(rect.y.checked_add(rect.h).is_some());
                    }
                }
                Err(LoadError::Malformed { line, reason }) => {
                    prop_assert!(line == 2 || line == 3);
                    prop_assert!(reason.contains("out of range"));
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
