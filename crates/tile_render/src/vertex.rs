use tile_core::Rect;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl SpriteVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, position) as wgpu::BufferAddress,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // tex_coords
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, tex_coords) as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // color
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(SpriteVertex, color) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }

    /// Corners of a pixel-space quad sampling `src` out of a
    /// `texture_size` image, in top-left, top-right, bottom-right,
    /// bottom-left order.
    pub fn quad(src: Rect, dest: Rect, texture_size: (u32, u32), color: [f32; 4]) -> [Self; 4] {
        let tw = texture_size.0.max(1) as f32;
        let th = texture_size.1.max(1) as f32;
        let u0 = src.x as f32 / tw;
        let v0 = src.y as f32 / th;
        let u1 = src.right() as f32 / tw;
        let v1 = src.bottom() as f32 / th;

        let x0 = dest.x as f32;
        let y0 = dest.y as f32;
        let x1 = dest.right() as f32;
        let y1 = dest.bottom() as f32;

        [
            Self {
                position: [x0, y0],
                tex_coords: [u0, v0],
                color,
            },
            Self {
                position: [x1, y0],
                tex_coords: [u1, v0],
                color,
            },
            Self {
                position: [x1, y1],
                tex_coords: [u1, v1],
                color,
            },
            Self {
                position: [x0, y1],
                tex_coords: [u0, v1],
                color,
            },
        ]
    }
}
