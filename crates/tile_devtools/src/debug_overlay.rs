//! egui layer drawn on top of the sprite pass: the screen text labels and
//! an F3-toggled debug window.
//!
//! egui needs the same split render as any wgpu pass that outlives the
//! encoder borrow:
//!
//!   1. `prepare()` -- run the UI, tessellate
//!   2. `upload()`  -- push textures and buffers (borrows the encoder)
//!   3. `paint()`   -- draw into a pass created with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui dropped

use tile_core::Rgba;
use winit::window::Window;

const LABEL_FONT_SIZE: f32 = 24.0;

/// Text queued for this frame, positioned in window pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLabel {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub color: Rgba,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub fps: f64,
    pub frame_time_ms: f64,
    pub frame_count: u64,
    pub last_sleep_ms: u64,
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub tile_count: u32,
    pub player_x: i32,
    pub player_y: i32,
    pub level_path: String,
    /// Settled edits picked up by hot reload.
    pub level_changes: u32,
    pub level_saved_secs_ago: Option<u64>,
}

impl OverlayStats {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("FPS: {:.1}", self.fps),
            format!("Frame time: {:.2} ms", self.frame_time_ms),
            format!("Slept: {} ms", self.last_sleep_ms),
            format!("Frame: {}", self.frame_count),
            format!("Draw calls: {}", self.draw_calls),
            format!("Texture binds: {}", self.texture_binds),
            format!("Tiles: {}", self.tile_count),
            format!("Player: ({}, {})", self.player_x, self.player_y),
            format!("Level: {}", self.level_path),
            match self.level_saved_secs_ago {
                Some(secs) => format!("Level edits: {} (saved {}s ago)", self.level_changes, secs),
                None => format!("Level edits: {} (file missing)", self.level_changes),
            },
        ]
    }
}

pub struct HudOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl HudOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!(
            "Debug overlay: {}",
            if self.debug_visible { "ON" } else { "OFF" }
        );
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        labels: &[TextLabel],
        stats: Option<&OverlayStats>,
    ) -> (Vec<egui::ClippedPrimitive>, egui::TexturesDelta) {
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let pixels_per_point = window.scale_factor() as f32;
        let debug_visible = self.debug_visible;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            for (i, label) in labels.iter().enumerate() {
                egui::Area::new(egui::Id::new(("hud_label", i)))
                    .fixed_pos(label_position(label, pixels_per_point))
                    .interactable(false)
                    .show(ctx, |ui| {
                        ui.label(
                            egui::RichText::new(&label.text)
                                .size(LABEL_FONT_SIZE / pixels_per_point)
                                .color(label_color(label.color)),
                        );
                    });
            }

            if debug_visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 10.0])
                    .show(ctx, |ui| match stats {
                        Some(stats) => {
                            for line in stats.lines() {
                                ui.label(line);
                            }
                        }
                        None => {
                            ui.label("No stats yet");
                        }
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn label_color(color: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// egui lays out in points; labels are authored in physical pixels.
fn label_position(label: &TextLabel, pixels_per_point: f32) -> egui::Pos2 {
    let ppp = if pixels_per_point > 0.0 {
        pixels_per_point
    } else {
        1.0
    };
    egui::pos2(label.x as f32 / ppp, label.y as f32 / ppp)
}
