//! CPU-side quad batching. Quads arrive in draw order; consecutive quads that
//! share a texture collapse into a single indexed draw.

use crate::vertex::SpriteVertex;

/// A contiguous run of indices drawn with one texture binding.
#[derive(Debug, Clone)]
pub struct DrawCall<K> {
    pub texture_id: u64,
    pub binding: K,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug)]
pub struct SpriteBatch<K> {
    vertices: Vec<SpriteVertex>,
    indices: Vec<u32>,
    draw_calls: Vec<DrawCall<K>>,
}

impl<K> Default for SpriteBatch<K> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            draw_calls: Vec::new(),
        }
    }
}

impl<K> SpriteBatch<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all queued quads, keeping the allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
    }

    pub fn push_quad(&mut self, texture_id: u64, binding: K, corners: [SpriteVertex; 4]) {
        let base_index = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);

        push_draw_call(&mut self.draw_calls, texture_id, binding, draw_start, 6);
    }

    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draw_calls(&self) -> &[DrawCall<K>] {
        &self.draw_calls
    }

    /// Texture switches needed to submit the batch in order.
    pub fn texture_binds(&self) -> usize {
        let mut binds = 0usize;
        let mut current = None;
        for draw in &self.draw_calls {
            if current != Some(draw.texture_id) {
                current = Some(draw.texture_id);
                binds += 1;
            }
        }
        binds
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Append a draw call, merging with the previous one when the texture matches
/// and the indices are contiguous.
fn push_draw_call<K>(
    draw_calls: &mut Vec<DrawCall<K>>,
    texture_id: u64,
    binding: K,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if last.texture_id == texture_id && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture_id,
        binding,
        index_start,
        index_count,
    });
}
