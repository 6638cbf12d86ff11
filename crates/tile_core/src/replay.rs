use crate::game::GameLoop;
use crate::input::{InputEvent, InputQueue};
use crate::render::Renderer;
use crate::time::Clock;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Scripted input fed to the game loop one iteration at a time.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    /// Delivered before the first repetition of this frame.
    #[serde(default)]
    pub events: Vec<InputEvent>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    /// Drive `game` through every frame. Stops early once the loop quits and
    /// returns the number of iterations run.
    pub fn play<T, R, C>(&self, game: &mut GameLoop<T>, renderer: &mut R, clock: &mut C) -> usize
    where
        R: Renderer<Texture = T>,
        C: Clock,
    {
        let mut input = InputQueue::new();
        let mut iterations = 0;
        for frame in &self.frames {
            input.extend(frame.events.iter().copied());
            for _ in 0..frame.repeat.max(1) {
                iterations += 1;
                if !game.iterate(renderer, &mut input, clock) {
                    return iterations;
                }
            }
        }
        iterations
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::GameState;
    use crate::sprite::Placed;
    use crate::testing::{ManualClock, RecordingRenderer, TrackedTexture};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    // One wall tile at x = 336..384, level with the player.
    const WALL_LEVEL: &str = "16 1 0 375\n0 0 0 0 0 0 0 1 0 0 0 0 0 0 0 0\n";

    const WALK_INTO_WALL: &str = r#"{
      "frames": [
        { "events": [{ "KeyDown": "Right" }], "repeat": 40 },
        { "events": [{ "KeyUp": "Right" }, { "KeyDown": "Left" }], "repeat": 10 },
        { "events": ["Quit"] },
        { "repeat": 100 }
      ]
    }"#;

    fn temp_file_path(name_hint: &str, ext: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tile_replay_test_{}_{}_{}.{}",
            name_hint,
            std::process::id(),
            nanos,
            ext
        ))
    }

    fn game_for_level(
        level_path: &Path,
        clock: &ManualClock,
    ) -> (GameLoop<TrackedTexture>, RecordingRenderer) {
        let config = GameConfig {
            level_path: level_path.to_path_buf(),
            ..GameConfig::default()
        };
        let mut renderer = RecordingRenderer::default();
        let state = GameState::new(&config, &mut renderer);
        (
            GameLoop::new(state, config.frame_budget_ms, clock),
            renderer,
        )
    }

    #[test]
    fn replay_file_parses_events_and_repeats() {
        let path = temp_file_path("parse", "json");
        fs::write(&path, WALK_INTO_WALL).expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        assert_eq!(replay.frames.len(), 4);
        assert_eq!(replay.frames[0].repeat, 40);
        assert_eq!(replay.frames[2].events, vec![InputEvent::Quit]);
        assert_eq!(replay.frames[2].repeat, 1);
        assert!(replay.frames[3].events.is_empty());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty", "json");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn walking_into_a_wall_stops_flush_against_it() {
        let level = temp_file_path("wall", "level");
        fs::write(&level, WALL_LEVEL).expect("write level file");
        let replay: ReplaySequence = serde_json::from_str(WALK_INTO_WALL).expect("parse replay");

        let mut clock = ManualClock::default();
        let (mut game, mut renderer) = game_for_level(&level, &clock);
        let iterations = replay.play(&mut game, &mut renderer, &mut clock);

        // 40 right, 10 left, then the quitting iteration.
        assert_eq!(iterations, 51);
        assert!(!game.state.is_running());
        // Blocked at x = 260 (right edge 332), then 10 steps left plus one
        // more in the quitting iteration.
        assert_eq!(game.state.player.dest().x, 205);
        assert_eq!(game.state.player.active_clip(), game.state.clips.run_left);
        assert_eq!(renderer.frames(), 51);

        let _ = fs::remove_file(level);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let level = temp_file_path("deterministic", "level");
        fs::write(&level, WALL_LEVEL).expect("write level file");
        let replay: ReplaySequence = serde_json::from_str(WALK_INTO_WALL).expect("parse replay");

        let mut clock_a = ManualClock::default();
        let (mut run_a, mut renderer_a) = game_for_level(&level, &clock_a);
        replay.play(&mut run_a, &mut renderer_a, &mut clock_a);

        let mut clock_b = ManualClock::default();
        let (mut run_b, mut renderer_b) = game_for_level(&level, &clock_b);
        replay.play(&mut run_b, &mut renderer_b, &mut clock_b);

        assert_eq!(renderer_a.calls, renderer_b.calls);
        assert_eq!(run_a.state.player.dest(), run_b.state.player.dest());
        assert_eq!(
            run_a.state.player.tick_accumulator(),
            run_b.state.player.tick_accumulator()
        );
        assert_eq!(clock_a.sleeps, clock_b.sleeps);

        let _ = fs::remove_file(level);
    }
}
