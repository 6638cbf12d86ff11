//! Game state and the frame loop.
//!
//! Every iteration runs three phases in a fixed order, **render → poll input
//! → update**, followed by the pacing wait. Because rendering comes first,
//! the frame shown in iteration *N* reflects the update of iteration *N-1*
//! (one frame of input latency). The loop ends only when a quit event clears
//! the running flag; the flag is checked once per iteration.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::animation::{ClipHandle, Entity};
use crate::collision::is_move_blocked_by;
use crate::config::{GameConfig, LabelConfig};
use crate::input::{Direction, InputEvent, InputSource, Key, MovementIntent};
use crate::render::{Renderer, Rgba};
use crate::sprite::{draw_object, load_shared_texture, Placed, SpriteObject};
use crate::tilemap::{LoadError, TileGeometry, TileMap};
use crate::time::{Clock, FramePacer};

/// Handles of the player's clips, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerClips {
    pub idle: ClipHandle,
    pub run_right: ClipHandle,
    pub run_left: ClipHandle,
}

impl PlayerClips {
    fn running(&self, direction: Direction) -> ClipHandle {
        match direction {
            Direction::Left => self.run_left,
            Direction::Right => self.run_right,
        }
    }
}

/// Everything the loop mutates, owned in one place and handed to each phase.
pub struct GameState<T> {
    running: bool,
    pub player: Entity<T>,
    pub clips: PlayerClips,
    pub intent: MovementIntent,
    pub player_speed: i32,
    pub world_width: i32,

    tile_map: TileMap<T>,
    tile_atlas: Option<Rc<T>>,
    tile_geometry: TileGeometry,
    level_path: PathBuf,
    reload_requested: bool,

    background: Rgba,
    label: LabelConfig,
}

impl<T> GameState<T> {
    /// Build the player and the level. Missing textures and an unreadable or
    /// malformed level are logged and tolerated.
    pub fn new<R>(config: &GameConfig, renderer: &mut R) -> Self
    where
        R: Renderer<Texture = T>,
    {
        let mut sprite = SpriteObject::default();
        sprite.load_image(renderer, &config.player_texture_path);
        sprite.set_dest(config.player.start);

        let p = &config.player;
        let mut player = Entity::new(sprite);
        let idle = player.register_clip(
            p.idle.row,
            p.frame_width,
            p.frame_height,
            p.idle.frames,
            p.idle.speed,
        );
        let run_right = player.register_clip(
            p.run_right.row,
            p.frame_width,
            p.frame_height,
            p.run_right.frames,
            p.run_right.speed,
        );
        let run_left = player.register_clip(
            p.run_left.row,
            p.frame_width,
            p.frame_height,
            p.run_left.frames,
            p.run_left.speed,
        );
        player.set_active_clip(idle);

        let tile_atlas = load_shared_texture(renderer, &config.tile_atlas_path);
        let tile_map = match TileMap::load(&config.level_path, tile_atlas.clone(), &config.tiles)
        {
            Ok(map) => map,
            Err(err) => {
                log::error!("{err}. Continuing with an empty level.");
                TileMap::empty()
            }
        };

        Self {
            running: true,
            player,
            clips: PlayerClips {
                idle,
                run_right,
                run_left,
            },
            intent: MovementIntent::default(),
            player_speed: p.speed,
            world_width: config.world_width(),
            tile_map,
            tile_atlas,
            tile_geometry: config.tiles,
            level_path: config.level_path.clone(),
            reload_requested: false,
            background: config.background,
            label: config.label.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn tile_map(&self) -> &TileMap<T> {
        &self.tile_map
    }

    pub fn level_path(&self) -> &Path {
        &self.level_path
    }

    /// Ask for the level to be rebuilt from disk at the start of the next
    /// update.
    pub fn request_level_reload(&mut self) {
        self.reload_requested = true;
    }

    /// Rebuild the tile map from the level file. On failure the current map
    /// is kept.
    pub fn reload_level(&mut self) -> Result<(), LoadError> {
        match TileMap::load(&self.level_path, self.tile_atlas.clone(), &self.tile_geometry) {
            Ok(map) => {
                self.tile_map = map;
                log::info!("Level reloaded: {}", self.level_path.display());
                Ok(())
            }
            Err(err) => {
                log::error!("Level reload failed: {err}");
                Err(err)
            }
        }
    }

    fn step_player(&mut self, direction: Direction) {
        let clip = self.clips.running(direction);
        if self.player.active_clip() != clip {
            log::debug!("Player clip -> {:?}", direction);
            self.player.set_active_clip(clip);
        }

        let dx = match direction {
            Direction::Left => -self.player_speed,
            Direction::Right => self.player_speed,
        };
        if !is_move_blocked_by(
            self.player.dest(),
            dx,
            self.world_width,
            self.tile_map.tiles(),
        ) {
            self.player.translate_x(dx);
        }
    }
}

/// Clear, draw every tile in load order, the player, the label, present.
pub fn render<R: Renderer>(state: &GameState<R::Texture>, renderer: &mut R) {
    renderer.clear(state.background);
    for tile in state.tile_map.tiles() {
        draw_object(renderer, tile);
    }
    draw_object(renderer, &state.player);
    renderer.draw_text(
        &state.label.text,
        state.label.x,
        state.label.y,
        state.label.color,
    );
    renderer.present();
}

/// Drain every pending event into the movement intent.
pub fn poll_input<T, I: InputSource>(state: &mut GameState<T>, input: &mut I) {
    while let Some(event) = input.poll_event() {
        match event {
            InputEvent::Quit => {
                log::info!("Quit requested");
                state.running = false;
            }
            InputEvent::KeyDown(key) => match key.direction() {
                Some(direction) => state.intent.press(direction),
                None if key == Key::R => state.request_level_reload(),
                None => {}
            },
            InputEvent::KeyUp(key) => {
                if let Some(direction) = key.direction() {
                    state.intent.release(direction);
                    state.player.set_active_clip(state.clips.idle);
                }
            }
        }
    }
}

/// Apply a pending reload, move the player along its intent, then advance
/// the animation regardless of movement.
pub fn update<T>(state: &mut GameState<T>) {
    if state.reload_requested {
        state.reload_requested = false;
        if state.reload_level().is_err() {
            log::warn!("Keeping the previous level after a failed reload");
        }
    }

    if state.intent.left {
        state.step_player(Direction::Left);
    }
    if state.intent.right {
        state.step_player(Direction::Right);
    }

    state.player.advance();
}

pub struct GameLoop<T> {
    pub state: GameState<T>,
    pacer: FramePacer,
}

impl<T> GameLoop<T> {
    pub fn new<C: Clock>(state: GameState<T>, frame_budget_ms: u64, clock: &C) -> Self {
        Self {
            state,
            pacer: FramePacer::new(frame_budget_ms, clock),
        }
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    /// One full iteration. Returns whether the loop should keep going.
    pub fn iterate<R, I, C>(&mut self, renderer: &mut R, input: &mut I, clock: &mut C) -> bool
    where
        R: Renderer<Texture = T>,
        I: InputSource,
        C: Clock,
    {
        render(&self.state, renderer);
        poll_input(&mut self.state, input);
        update(&mut self.state);
        self.pacer.end_frame(clock);
        self.state.is_running()
    }

    /// Iterate until a quit event arrives.
    pub fn run<R, I, C>(&mut self, renderer: &mut R, input: &mut I, clock: &mut C)
    where
        R: Renderer<Texture = T>,
        I: InputSource,
        C: Clock,
    {
        log::info!("Game loop started");
        while self.iterate(renderer, input, clock) {}
        log::info!("Game loop stopped after {} frames", self.pacer.frame_count);
    }
}
