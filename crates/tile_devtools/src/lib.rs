pub mod debug_overlay;

pub use debug_overlay::{HudOverlay, OverlayStats, TextLabel};
