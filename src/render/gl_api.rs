use gl::types::*;
use std::ffi::{c_void, CStr};
use std::ptr;

use crate::render::shaders::ShaderStage;
use crate::render::texture::PixelFormat;

/// Size of the buffer used to read shader and program info logs.
pub const INFO_LOG_CAPACITY: usize = 1024;

/// The OpenGL entry points this crate uses.
///
/// Every call must happen on the thread that owns the current GL context.
/// Owners hold the API as `Rc<dyn GlApi>`, which keeps them on that thread.
pub trait GlApi {
    // Shaders and programs
    fn create_shader(&self, stage: ShaderStage) -> GLuint;
    fn shader_source(&self, shader: GLuint, source: &CStr);
    fn compile_shader(&self, shader: GLuint);
    fn shader_compiled(&self, shader: GLuint) -> bool;
    fn shader_info_log(&self, shader: GLuint) -> String;
    fn delete_shader(&self, shader: GLuint);
    fn create_program(&self) -> GLuint;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn link_program(&self, program: GLuint);
    fn program_linked(&self, program: GLuint) -> bool;
    fn program_info_log(&self, program: GLuint) -> String;
    fn use_program(&self, program: GLuint);
    fn delete_program(&self, program: GLuint);

    // Uniforms
    fn uniform_location(&self, program: GLuint, name: &CStr) -> GLint;
    fn uniform_1i(&self, location: GLint, value: i32);
    fn uniform_1f(&self, location: GLint, value: f32);
    fn get_uniform_i(&self, program: GLuint, location: GLint) -> i32;
    fn get_uniform_f(&self, program: GLuint, location: GLint) -> f32;

    // Textures
    fn gen_texture(&self) -> GLuint;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, texture: GLuint);
    fn tex_parameter(&self, pname: GLenum, value: GLint);
    fn unpack_alignment(&self, alignment: GLint);
    fn tex_image_2d(&self, format: PixelFormat, width: u32, height: u32, pixels: &[u8]);
    fn generate_mipmap(&self);
    fn delete_texture(&self, texture: GLuint);

    // Geometry
    fn gen_vertex_array(&self) -> GLuint;
    fn bind_vertex_array(&self, vao: GLuint);
    fn delete_vertex_array(&self, vao: GLuint);
    fn gen_buffer(&self) -> GLuint;
    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    fn buffer_data(&self, target: GLenum, data: &[u8]);
    fn delete_buffer(&self, buffer: GLuint);
    fn vertex_attrib_pointer(&self, index: GLuint, size: GLint, stride: usize, offset: usize);
    fn enable_vertex_attrib_array(&self, index: GLuint);

    // Frame
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, mask: GLbitfield);
    fn draw_elements(&self, count: usize);
    fn get_error(&self) -> GLenum;
}

/// Converts the bytes written into an info log buffer to text.
pub fn info_log_text(mut buffer: Vec<u8>, written: GLsizei) -> String {
    buffer.truncate((written.max(0) as usize).min(INFO_LOG_CAPACITY));
    String::from_utf8_lossy(&buffer).trim_end().to_string()
}

/// Forwards to the function pointers loaded into the `gl` crate.
pub struct NativeGl {
    _private: (),
}

impl NativeGl {
    /// Loads every GL function through `loader`. The context the loader
    /// belongs to must be current on this thread.
    pub fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Self { _private: () }
    }
}

impl GlApi for NativeGl {
    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        unsafe { gl::CreateShader(stage.gl_enum()) }
    }

    fn shader_source(&self, shader: GLuint, source: &CStr) {
        unsafe {
            gl::ShaderSource(shader, 1, &source.as_ptr(), ptr::null());
        }
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) }
    }

    fn shader_compiled(&self, shader: GLuint) -> bool {
        let mut success = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
        }
        success != 0
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let mut buffer = vec![0u8; INFO_LOG_CAPACITY];
        let mut written = 0;
        unsafe {
            gl::GetShaderInfoLog(
                shader,
                INFO_LOG_CAPACITY as GLsizei,
                &mut written,
                buffer.as_mut_ptr() as *mut GLchar,
            );
        }
        info_log_text(buffer, written)
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) }
    }

    fn program_linked(&self, program: GLuint) -> bool {
        let mut success = 0;
        unsafe {
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
        }
        success != 0
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut buffer = vec![0u8; INFO_LOG_CAPACITY];
        let mut written = 0;
        unsafe {
            gl::GetProgramInfoLog(
                program,
                INFO_LOG_CAPACITY as GLsizei,
                &mut written,
                buffer.as_mut_ptr() as *mut GLchar,
            );
        }
        info_log_text(buffer, written)
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) }
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn uniform_location(&self, program: GLuint, name: &CStr) -> GLint {
        unsafe { gl::GetUniformLocation(program, name.as_ptr()) }
    }

    fn uniform_1i(&self, location: GLint, value: i32) {
        unsafe { gl::Uniform1i(location, value) }
    }

    fn uniform_1f(&self, location: GLint, value: f32) {
        unsafe { gl::Uniform1f(location, value) }
    }

    fn get_uniform_i(&self, program: GLuint, location: GLint) -> i32 {
        let mut value = 0;
        unsafe {
            gl::GetUniformiv(program, location, &mut value);
        }
        value
    }

    fn get_uniform_f(&self, program: GLuint, location: GLint) -> f32 {
        let mut value = 0.0;
        unsafe {
            gl::GetUniformfv(program, location, &mut value);
        }
        value
    }

    fn gen_texture(&self) -> GLuint {
        let mut id = 0;
        unsafe {
            gl::GenTextures(1, &mut id);
        }
        id
    }

    fn active_texture(&self, unit: u32) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, texture: GLuint) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, texture) }
    }

    fn tex_parameter(&self, pname: GLenum, value: GLint) {
        unsafe { gl::TexParameteri(gl::TEXTURE_2D, pname, value) }
    }

    fn unpack_alignment(&self, alignment: GLint) {
        unsafe { gl::PixelStorei(gl::UNPACK_ALIGNMENT, alignment) }
    }

    fn tex_image_2d(&self, format: PixelFormat, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                format.gl_enum() as GLint,
                width as GLsizei,
                height as GLsizei,
                0,
                format.gl_enum(),
                gl::UNSIGNED_BYTE,
                pixels.as_ptr() as *const c_void,
            );
        }
    }

    fn generate_mipmap(&self) {
        unsafe { gl::GenerateMipmap(gl::TEXTURE_2D) }
    }

    fn delete_texture(&self, texture: GLuint) {
        unsafe { gl::DeleteTextures(1, &texture) }
    }

    fn gen_vertex_array(&self) -> GLuint {
        let mut vao = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
        }
        vao
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        unsafe { gl::BindVertexArray(vao) }
    }

    fn delete_vertex_array(&self, vao: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, &vao) }
    }

    fn gen_buffer(&self) -> GLuint {
        let mut buffer = 0;
        unsafe {
            gl::GenBuffers(1, &mut buffer);
        }
        buffer
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        unsafe { gl::BindBuffer(target, buffer) }
    }

    fn buffer_data(&self, target: GLenum, data: &[u8]) {
        unsafe {
            gl::BufferData(
                target,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );
        }
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) }
    }

    fn vertex_attrib_pointer(&self, index: GLuint, size: GLint, stride: usize, offset: usize) {
        unsafe {
            gl::VertexAttribPointer(
                index,
                size,
                gl::FLOAT,
                gl::FALSE,
                stride as GLsizei,
                offset as *const c_void,
            );
        }
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::EnableVertexAttribArray(index) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { gl::Viewport(x, y, width, height) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { gl::ClearColor(r, g, b, a) }
    }

    fn clear(&self, mask: GLbitfield) {
        unsafe { gl::Clear(mask) }
    }

    fn draw_elements(&self, count: usize) {
        unsafe {
            gl::DrawElements(
                gl::TRIANGLES,
                count as GLsizei,
                gl::UNSIGNED_INT,
                ptr::null(),
            );
        }
    }

    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }
}
