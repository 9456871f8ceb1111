use bytemuck::{Pod, Zeroable};
use gl::types::*;
use std::mem::{offset_of, size_of};
use std::rc::Rc;

use crate::render::gl_api::GlApi;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], color: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            color,
            tex_coord,
        }
    }

    /// (location, component count, byte offset) for each attribute.
    pub const ATTRIBUTES: [(GLuint, GLint, usize); 3] = [
        (0, 3, offset_of!(Vertex, position)),
        (1, 3, offset_of!(Vertex, color)),
        (2, 2, offset_of!(Vertex, tex_coord)),
    ];
}

pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex::new([0.5, 0.5, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0]), // top right
    Vertex::new([0.5, -0.5, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0]), // bottom right
    Vertex::new([-0.5, -0.5, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]), // bottom left
    Vertex::new([-0.5, 0.5, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0]), // top left
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Static indexed geometry: one vertex array with its vertex and element
/// buffers. All three objects are deleted on drop.
pub struct QuadMesh {
    gl: Rc<dyn GlApi>,
    vao: GLuint,
    vbo: GLuint,
    ebo: GLuint,
    index_count: usize,
}

impl QuadMesh {
    pub fn quad(gl: Rc<dyn GlApi>) -> Self {
        Self::upload(gl, &QUAD_VERTICES, &QUAD_INDICES)
    }

    pub fn upload(gl: Rc<dyn GlApi>, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vao = gl.gen_vertex_array();
        let vbo = gl.gen_buffer();
        let ebo = gl.gen_buffer();

        gl.bind_vertex_array(vao);

        gl.bind_buffer(gl::ARRAY_BUFFER, vbo);
        gl.buffer_data(gl::ARRAY_BUFFER, bytemuck::cast_slice(vertices));

        gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, ebo);
        gl.buffer_data(gl::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(indices));

        for (location, components, offset) in Vertex::ATTRIBUTES {
            gl.vertex_attrib_pointer(location, components, size_of::<Vertex>(), offset);
            gl.enable_vertex_attrib_array(location);
        }

        // The element buffer binding is part of the VAO; only the array
        // buffer may be unbound here.
        gl.bind_buffer(gl::ARRAY_BUFFER, 0);
        gl.bind_vertex_array(0);

        Self {
            gl,
            vao,
            vbo,
            ebo,
            index_count: indices.len(),
        }
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn draw(&self) {
        self.gl.bind_vertex_array(self.vao);
        self.gl.draw_elements(self.index_count);
    }
}

impl Drop for QuadMesh {
    fn drop(&mut self) {
        self.gl.delete_vertex_array(self.vao);
        self.gl.delete_buffer(self.vbo);
        self.gl.delete_buffer(self.ebo);
    }
}
