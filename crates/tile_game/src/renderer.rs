//! wgpu implementation of the game's drawing contract.
//!
//! Between `clear` and `present` every `draw_rect` is appended to a
//! [`SpriteBatch`] and every `draw_text` to the HUD label list; `present`
//! uploads the batch, draws it in one pass and composites the egui HUD on
//! top.

use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use tile_core::{Rect, Renderer, Rgba};
use tile_devtools::{HudOverlay, OverlayStats, TextLabel};
use tile_render::{GpuContext, ScreenCamera, SpriteBatch, SpritePipeline, SpriteVertex, Texture};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A loaded texture and its bind group, shared by every sprite using it.
pub struct SpriteTexture {
    id: u64,
    texture: Texture,
    bind_group: Rc<wgpu::BindGroup>,
}

impl SpriteTexture {
    pub fn size(&self) -> (u32, u32) {
        self.texture.size()
    }
}

pub struct WgpuRenderer {
    window: Arc<Window>,
    gpu: GpuContext,
    pipeline: SpritePipeline,
    camera: ScreenCamera,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    // Grows by powers of two, never shrinks.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,

    batch: SpriteBatch<Rc<wgpu::BindGroup>>,
    labels: Vec<TextLabel>,
    clear_color: wgpu::Color,
    next_texture_id: u64,

    pub hud: HudOverlay,
    pub stats: Option<OverlayStats>,
}

impl WgpuRenderer {
    /// `world_size` is the playfield in pixels; it stays fixed when the
    /// surface is resized.
    pub fn new(window: Arc<Window>, world_size: (u32, u32), vsync: bool) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone(), vsync)?;
        let pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let hud = HudOverlay::new(&gpu.device, gpu.surface_format, &window);

        let camera = ScreenCamera::new(world_size.0, world_size.1);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group = pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        Ok(Self {
            window,
            gpu,
            pipeline,
            camera,
            camera_buffer,
            camera_bind_group,
            vertex_buffer,
            index_buffer,
            vertex_capacity: 1,
            index_capacity: 1,
            batch: SpriteBatch::new(),
            labels: Vec::new(),
            clear_color: wgpu::Color::BLACK,
            next_texture_id: 0,
            hud,
            stats: None,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        log::info!(
            "Surface resized to {}x{} (playfield {}x{})",
            width,
            height,
            self.camera.viewport.0,
            self.camera.viewport.1
        );
    }

    pub fn handle_window_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.hud.handle_window_event(&self.window, event)
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.vertex_capacity {
            self.vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.index_capacity {
            self.index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.index_capacity);
        }
    }

    fn upload_batch(&mut self) {
        self.ensure_mesh_capacity(self.batch.vertices().len(), self.batch.indices().len());
        if self.batch.is_empty() {
            return;
        }
        self.gpu.queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(self.batch.vertices()),
        );
        self.gpu.queue.write_buffer(
            &self.index_buffer,
            0,
            bytemuck::cast_slice(self.batch.indices()),
        );
    }

    fn render_frame(&mut self) {
        if !self.gpu.can_present() {
            return;
        }

        self.upload_batch();
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        if let Some(stats) = self.stats.as_mut() {
            stats.draw_calls = self.batch.draw_calls().len() as u32;
            stats.texture_binds = self.batch.texture_binds() as u32;
        }
        let (egui_primitives, egui_textures_delta) =
            self.hud
                .prepare(&self.window, &self.labels, self.stats.as_ref());
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if !self.batch.is_empty() {
                render_pass.set_pipeline(&self.pipeline.render_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                let mut last_bound = None;
                for draw in self.batch.draw_calls() {
                    if last_bound != Some(draw.texture_id) {
                        render_pass.set_bind_group(1, &*draw.binding, &[]);
                        last_bound = Some(draw.texture_id);
                    }
                    render_pass.draw_indexed(
                        draw.index_start..(draw.index_start + draw.index_count),
                        0,
                        0..1,
                    );
                }
            }
        }

        self.hud.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.hud
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.hud.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

impl Renderer for WgpuRenderer {
    type Texture = SpriteTexture;

    fn load_texture(&mut self, path: &Path) -> Result<SpriteTexture, String> {
        let texture = Texture::from_path(&self.gpu.device, &self.gpu.queue, path)?;
        let bind_group = self
            .pipeline
            .create_texture_bind_group(&self.gpu.device, &texture);
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        log::info!(
            "Texture loaded: {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );
        Ok(SpriteTexture {
            id,
            texture,
            bind_group: Rc::new(bind_group),
        })
    }

    fn clear(&mut self, color: Rgba) {
        self.clear_color = clear_color(color, self.gpu.surface_format.is_srgb());
        self.batch.clear();
        self.labels.clear();
    }

    fn draw_rect(&mut self, texture: &SpriteTexture, src: Rect, dest: Rect) {
        let corners = SpriteVertex::quad(src, dest, texture.size(), WHITE);
        self.batch
            .push_quad(texture.id, texture.bind_group.clone(), corners);
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Rgba) {
        self.labels.push(TextLabel {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }

    fn present(&mut self) {
        self.render_frame();
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Clear values are linear; an sRGB surface re-encodes them on write.
fn clear_color(color: Rgba, srgb_surface: bool) -> wgpu::Color {
    let [r, g, b, a] = color.to_f32_array();
    let encode = |c: f32| -> f64 {
        let c = c as f64;
        if !srgb_surface {
            c
        } else if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: encode(r),
        g: encode(g),
        b: encode(b),
        a: a as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_color_is_passed_through_for_linear_surfaces() {
        let color = clear_color(Rgba::rgb(255, 0, 51), false);
        assert!((color.r - 1.0).abs() < 1e-6);
        assert!(color.g.abs() < 1e-6);
        assert!((color.b - 0.2).abs() < 1e-6);
        assert!((color.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clear_color_is_linearized_for_srgb_surfaces() {
        let color = clear_color(Rgba::rgb(126, 192, 238), true);
        // Mid-range sRGB values darken once linearized; the extremes stay put.
        assert!(color.r < 126.0 / 255.0);
        assert!(color.b < 238.0 / 255.0);
        let white = clear_color(Rgba::WHITE, true);
        assert!((white.r - 1.0).abs() < 1e-6);
        let black = clear_color(Rgba::rgb(0, 0, 0), true);
        assert!(black.g.abs() < 1e-9);
    }
}
