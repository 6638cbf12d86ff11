//! Game configuration, loaded from JSON with every field optional.
//!
//! Defaults reproduce the stock sample: an 800x600 window, a 24x26 player
//! sheet drawn at 3x, three clips (idle, run right, run left) and a 60 FPS
//! frame cap.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::rect::Rect;
use crate::render::Rgba;
use crate::tilemap::TileGeometry;
use crate::time::DEFAULT_FRAME_BUDGET_MS;
use crate::watch::DEFAULT_SETTLE_MS;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub background: Rgba,
    pub label: LabelConfig,
    pub level_path: PathBuf,
    pub tile_atlas_path: PathBuf,
    pub player_texture_path: PathBuf,
    pub tiles: TileGeometry,
    pub player: PlayerConfig,
    pub frame_budget_ms: u64,
    /// Quiet period before an edited level file is reloaded.
    pub level_settle_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Wait for vblank on present in addition to the frame cap.
    pub vsync: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LabelConfig {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub color: Rgba,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial world rectangle (already scaled).
    pub start: Rect,
    /// Horizontal pixels per update tick.
    pub speed: i32,
    pub frame_width: i32,
    pub frame_height: i32,
    pub idle: ClipConfig,
    pub run_right: ClipConfig,
    pub run_left: ClipConfig,
}

/// One animation row of the player sheet.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ClipConfig {
    /// 1-based sheet row.
    pub row: u32,
    pub frames: u32,
    pub speed: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            background: Rgba::rgb(126, 192, 238),
            label: LabelConfig::default(),
            level_path: PathBuf::from("assets/levels/1.level"),
            tile_atlas_path: PathBuf::from("assets/textures/map_tile.png"),
            player_texture_path: PathBuf::from("assets/textures/player.png"),
            tiles: TileGeometry::default(),
            player: PlayerConfig::default(),
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            level_settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "GAME".to_string(),
            width: 800,
            height: 600,
            vsync: true,
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            text: "DAC example application".to_string(),
            x: 170,
            y: 100,
            color: Rgba::WHITE,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start: Rect::new(100, 375, 24 * 3, 26 * 3),
            speed: 5,
            frame_width: 24,
            frame_height: 26,
            idle: ClipConfig {
                row: 1,
                frames: 4,
                speed: 20,
            },
            run_right: ClipConfig {
                row: 2,
                frames: 5,
                speed: 10,
            },
            run_left: ClipConfig {
                row: 3,
                frames: 5,
                speed: 10,
            },
        }
    }
}

impl GameConfig {
    /// Horizontal extent the player is confined to.
    /// Widths past `i32::MAX` are rejected on load; a hand-built config
    /// saturates instead of wrapping.
    pub fn world_width(&self) -> i32 {
        i32::try_from(self.window.width).unwrap_or(i32::MAX)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.window.width == 0 || config.window.height == 0 {
        return Err("Config validation failed: window width and height must be > 0".to_string());
    }
    if i32::try_from(config.window.width).is_err() || i32::try_from(config.window.height).is_err()
    {
        return Err(format!(
            "Config validation failed: window size {}x{} exceeds {}",
            config.window.width,
            config.window.height,
            i32::MAX
        ));
    }
    let tiles = &config.tiles;
    if tiles.tile_width <= 0 || tiles.tile_height <= 0 || tiles.scale <= 0 {
        return Err("Config validation failed: tile size and scale must be > 0".to_string());
    }
    if tiles.atlas_columns == 0 {
        return Err("Config validation failed: atlas_columns must be > 0".to_string());
    }
    let player = &config.player;
    if player.frame_width <= 0 || player.frame_height <= 0 {
        return Err("Config validation failed: player frame size must be > 0".to_string());
    }
    if player.speed < 0 {
        return Err("Config validation failed: player speed must be >= 0".to_string());
    }
    if player.start.w < 0 || player.start.h < 0 {
        return Err("Config validation failed: player start size must be >= 0".to_string());
    }
    for (name, clip) in [
        ("idle", player.idle),
        ("run_right", player.run_right),
        ("run_left", player.run_left),
    ] {
        if clip.row == 0 {
            return Err(format!(
                "Config validation failed: clip '{name}' row is 1-based"
            ));
        }
        if clip.frames == 0 {
            return Err(format!("Config validation failed: clip '{name}' has no frames"));
        }
    }
    Ok(())
}
