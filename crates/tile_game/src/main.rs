//! Tile runner -- desktop entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Window events are
//! translated into `tile_core` input events and queued; every
//! `RedrawRequested` runs exactly one game loop iteration (render, poll
//! input, update, pace). The loop owns its own frame pacing, so the event
//! loop runs in `Poll` mode and requests a redraw whenever it goes idle.
//!
//! Hot reload: once an edited level file has settled it is rebuilt at the
//! start of the next update. `R` forces the same reload.

mod renderer;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use renderer::{SpriteTexture, WgpuRenderer};
use tile_core::config::load_config_from_path;
use tile_core::watch::{LevelChange, LevelWatcher};
use tile_core::{
    Clock, GameConfig, GameLoop, GameState, InputEvent, InputQueue, Key, Placed, SystemClock,
};
use tile_devtools::OverlayStats;
use tile_platform::{create_window, PlatformConfig};

const DEFAULT_CONFIG_PATH: &str = "assets/config/game.json";

/// Everything that needs a live window. Built in `resumed`.
struct Session {
    renderer: WgpuRenderer,
    game: GameLoop<SpriteTexture>,
    input: InputQueue,
    clock: SystemClock,
    level_watcher: LevelWatcher,
}

impl Session {
    fn new(event_loop: &ActiveEventLoop, config: &GameConfig) -> Result<Self, String> {
        let window = create_window(event_loop, &PlatformConfig::from(&config.window))?;
        let world_size = (config.window.width, config.window.height);
        let mut renderer = WgpuRenderer::new(window, world_size, config.window.vsync)?;
        let state = GameState::new(config, &mut renderer);
        let clock = SystemClock::new();
        let game = GameLoop::new(state, config.frame_budget_ms, &clock);
        let level_watcher = LevelWatcher::new(config.level_path.clone(), config.level_settle_ms);

        Ok(Self {
            renderer,
            game,
            input: InputQueue::new(),
            clock,
            level_watcher,
        })
    }

    fn overlay_stats(&self) -> OverlayStats {
        let pacer = self.game.pacer();
        let state = &self.game.state;
        let player = state.player.dest();
        OverlayStats {
            fps: pacer.smoothed_fps,
            frame_time_ms: pacer.smoothed_frame_time_ms,
            frame_count: pacer.frame_count,
            last_sleep_ms: pacer.last_sleep_ms,
            tile_count: state.tile_map().len() as u32,
            player_x: player.x,
            player_y: player.y,
            level_path: state.level_path().display().to_string(),
            level_changes: self.level_watcher.changes(),
            level_saved_secs_ago: self.level_watcher.last_modified().map(|modified| {
                SystemTime::now()
                    .duration_since(modified)
                    .map_or(0, |age| age.as_secs())
            }),
            ..OverlayStats::default()
        }
    }

    /// One game loop iteration. Returns whether the game is still running.
    fn frame(&mut self) -> bool {
        match self.level_watcher.poll(self.clock.now_millis()) {
            Some(LevelChange::Modified) => {
                log::info!(
                    "Level file changed: {}",
                    self.level_watcher.path().display()
                );
                self.game.state.request_level_reload();
            }
            Some(LevelChange::Removed) => {
                log::warn!(
                    "Level file removed: {}; keeping the loaded level",
                    self.level_watcher.path().display()
                );
            }
            None => {}
        }
        self.renderer.stats = Some(self.overlay_stats());
        self.game
            .iterate(&mut self.renderer, &mut self.input, &mut self.clock)
    }
}

struct App {
    config: GameConfig,
    session: Option<Session>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        match Session::new(event_loop, &self.config) {
            Ok(session) => self.session = Some(session),
            Err(err) => {
                log::error!("Startup failed: {err}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &self.session {
            session.renderer.window().request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let session = match self.session.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = session.renderer.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                // Handled by the game loop on its next input poll.
                session.input.push(InputEvent::Quit);
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    session.renderer.resize(w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                let PhysicalKey::Code(key_code) = event.physical_key else {
                    return;
                };
                if key_code == KeyCode::F3 {
                    if event.state == ElementState::Pressed && !event.repeat {
                        session.renderer.hud.toggle_debug();
                    }
                    return;
                }
                if let Some(key) = map_key(key_code) {
                    session.input.push(match event.state {
                        ElementState::Pressed => InputEvent::KeyDown(key),
                        ElementState::Released => InputEvent::KeyUp(key),
                    });
                }
            }

            WindowEvent::RedrawRequested => {
                if !session.frame() {
                    log::info!("Exiting.");
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

/// Config from the first CLI argument, else the default path if it exists,
/// else built-in defaults. A broken config is reported and replaced by
/// defaults.
fn load_config(cli_path: Option<PathBuf>) -> GameConfig {
    let path = match cli_path {
        Some(path) => path,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if !default_path.exists() {
                log::info!("No config at {DEFAULT_CONFIG_PATH}, using defaults");
                return GameConfig::default();
            }
            default_path.to_path_buf()
        }
    };

    match load_config_from_path(&path) {
        Ok(config) => {
            log::info!("Config loaded: {}", path.display());
            config
        }
        Err(err) => {
            log::error!("{err}. Using default config.");
            GameConfig::default()
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Tile runner starting...");

    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from));

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).expect("Event loop error");
}
