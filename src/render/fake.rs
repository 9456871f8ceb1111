//! In-memory stand-in for a GL context, used by unit tests.
//!
//! Compilation succeeds when a source has a `void main` and no `#error`.
//! Linking succeeds when one compiled vertex and one compiled fragment stage
//! are attached and no source carries the unresolved-symbol marker. Every
//! `uniform <type> <name>;` line of the attached sources becomes an active
//! uniform with its own location.

use gl::types::*;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::CStr;

use crate::render::gl_api::GlApi;
use crate::render::shaders::ShaderStage;
use crate::render::texture::PixelFormat;

pub const PASS_THROUGH_VERTEX: &str = r#"
    #version 330 core
    layout (location = 0) in vec3 aPos;
    void main() {
        gl_Position = vec4(aPos, 1.0);
    }
"#;

pub const PASS_THROUGH_FRAGMENT: &str = r#"
    #version 330 core
    out vec4 FragColor;
    void main() {
        FragColor = vec4(1.0, 0.5, 0.2, 1.0);
    }
"#;

const UNRESOLVED_MARKER: &str = "shade_unresolved";

pub const UNLINKABLE_FRAGMENT: &str = r#"
    #version 330 core
    out vec4 FragColor;
    vec4 shade_unresolved();
    void main() {
        FragColor = shade_unresolved();
    }
"#;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ClearColor([f32; 4]),
    Clear(GLbitfield),
    ActiveTexture(u32),
    BindTexture(GLuint),
    TexParameter(GLenum, GLint),
    UseProgram(GLuint),
    BindVertexArray(GLuint),
    DrawElements(usize),
    Viewport(i32, i32, i32, i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub texture: GLuint,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UniformValue {
    Int(i32),
    Float(f32),
}

struct FakeShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
}

#[derive(Default)]
struct FakeProgram {
    attached: Vec<GLuint>,
    linked: bool,
    log: String,
    locations: BTreeMap<String, GLint>,
    values: HashMap<GLint, UniformValue>,
}

#[derive(Default)]
struct State {
    next_id: GLuint,
    shaders: HashMap<GLuint, FakeShader>,
    deleted_shaders: usize,
    programs: HashMap<GLuint, FakeProgram>,
    link_attempts: usize,
    location_lookups: usize,
    current_program: GLuint,
    textures: HashSet<GLuint>,
    bound_texture: GLuint,
    uploads: Vec<Upload>,
    mipmaps: usize,
    vertex_arrays: HashSet<GLuint>,
    buffers: HashMap<GLuint, Vec<u8>>,
    bound_buffers: HashMap<GLenum, GLuint>,
    enabled_attributes: Vec<GLuint>,
    calls: Vec<Call>,
    error: GLenum,
}

impl State {
    fn alloc(&mut self) -> GLuint {
        self.next_id += 1;
        self.next_id
    }

    fn raise(&mut self, code: GLenum) {
        if self.error == gl::NO_ERROR {
            self.error = code;
        }
    }
}

pub struct FakeGl {
    state: RefCell<State>,
}

impl FakeGl {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::default()),
        }
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn deleted_shaders(&self) -> usize {
        self.state.borrow().deleted_shaders
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn program_exists(&self, program: GLuint) -> bool {
        self.state.borrow().programs.contains_key(&program)
    }

    pub fn link_attempts(&self) -> usize {
        self.state.borrow().link_attempts
    }

    pub fn location_lookups(&self) -> usize {
        self.state.borrow().location_lookups
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.borrow().uploads.clone()
    }

    pub fn mipmaps(&self) -> usize {
        self.state.borrow().mipmaps
    }

    pub fn texture_exists(&self, texture: GLuint) -> bool {
        self.state.borrow().textures.contains(&texture)
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn buffer_len(&self, buffer: GLuint) -> Option<usize> {
        self.state.borrow().buffers.get(&buffer).map(Vec::len)
    }

    pub fn enabled_attributes(&self) -> Vec<GLuint> {
        self.state.borrow().enabled_attributes.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn draw_calls(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::DrawElements(_)))
            .count()
    }
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("uniform "))
        .filter_map(|line| line.trim_end_matches(';').split_whitespace().last())
        .map(str::to_string)
}

impl GlApi for FakeGl {
    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.shaders.insert(
            id,
            FakeShader {
                stage,
                source: String::new(),
                compiled: false,
            },
        );
        id
    }

    fn shader_source(&self, shader: GLuint, source: &CStr) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(entry) => entry.source = source.to_string_lossy().into_owned(),
            None => state.raise(gl::INVALID_VALUE),
        }
    }

    fn compile_shader(&self, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(entry) => {
                entry.compiled =
                    entry.source.contains("void main") && !entry.source.contains("#error");
            }
            None => state.raise(gl::INVALID_VALUE),
        }
    }

    fn shader_compiled(&self, shader: GLuint) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map_or(false, |s| s.compiled)
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let state = self.state.borrow();
        match state.shaders.get(&shader) {
            Some(s) if s.compiled => String::new(),
            Some(s) if s.source.trim().is_empty() => "0:1(1): error: no main function".into(),
            Some(_) => "0:1(1): error: syntax error, unexpected token".into(),
            None => String::new(),
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader).is_some() {
            state.deleted_shaders += 1;
        }
    }

    fn create_program(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.programs.insert(id, FakeProgram::default());
        id
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        match state.programs.get_mut(&program) {
            Some(p) => p.attached.push(shader),
            None => state.raise(gl::INVALID_VALUE),
        }
    }

    fn link_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        state.link_attempts += 1;
        let Some(attached) = state.programs.get(&program).map(|p| p.attached.clone()) else {
            state.raise(gl::INVALID_VALUE);
            return;
        };

        let stages: Vec<&FakeShader> = attached
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .collect();
        let has = |stage: ShaderStage| stages.iter().any(|s| s.stage == stage && s.compiled);
        let all_compiled = stages.iter().all(|s| s.compiled);
        let unresolved = stages.iter().any(|s| s.source.contains(UNRESOLVED_MARKER));

        let log = if !all_compiled {
            Some("error: linking with uncompiled shader")
        } else if !has(ShaderStage::Vertex) || !has(ShaderStage::Fragment) {
            Some("error: program lacks a vertex or fragment stage")
        } else if unresolved {
            Some("error: unresolved function reference")
        } else {
            None
        };

        let mut locations = BTreeMap::new();
        if log.is_none() {
            for name in stages.iter().flat_map(|s| declared_uniforms(&s.source)) {
                let next = locations.len() as GLint;
                locations.entry(name).or_insert(next);
            }
        }

        if let Some(p) = state.programs.get_mut(&program) {
            p.linked = log.is_none();
            p.log = log.unwrap_or_default().to_string();
            p.values = locations.values().map(|l| (*l, UniformValue::Int(0))).collect();
            p.locations = locations;
        }
    }

    fn program_linked(&self, program: GLuint) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(false, |p| p.linked)
    }

    fn program_info_log(&self, program: GLuint) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::UseProgram(program));
        match state.programs.get(&program) {
            Some(p) if p.linked => state.current_program = program,
            _ => state.raise(gl::INVALID_OPERATION),
        }
    }

    fn delete_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current_program == program {
            state.current_program = 0;
        }
    }

    fn uniform_location(&self, program: GLuint, name: &CStr) -> GLint {
        let mut state = self.state.borrow_mut();
        state.location_lookups += 1;
        let name = name.to_string_lossy();
        state
            .programs
            .get(&program)
            .and_then(|p| p.locations.get(name.as_ref()).copied())
            .unwrap_or(-1)
    }

    fn uniform_1i(&self, location: GLint, value: i32) {
        let mut state = self.state.borrow_mut();
        if location == -1 {
            return;
        }
        let current = state.current_program;
        match state.programs.get_mut(&current) {
            Some(p) if p.values.contains_key(&location) => {
                p.values.insert(location, UniformValue::Int(value));
            }
            _ => state.raise(gl::INVALID_OPERATION),
        }
    }

    fn uniform_1f(&self, location: GLint, value: f32) {
        let mut state = self.state.borrow_mut();
        if location == -1 {
            return;
        }
        let current = state.current_program;
        match state.programs.get_mut(&current) {
            Some(p) if p.values.contains_key(&location) => {
                p.values.insert(location, UniformValue::Float(value));
            }
            _ => state.raise(gl::INVALID_OPERATION),
        }
    }

    fn get_uniform_i(&self, program: GLuint, location: GLint) -> i32 {
        let state = self.state.borrow();
        match state.programs.get(&program).and_then(|p| p.values.get(&location)) {
            Some(UniformValue::Int(v)) => *v,
            Some(UniformValue::Float(v)) => *v as i32,
            None => 0,
        }
    }

    fn get_uniform_f(&self, program: GLuint, location: GLint) -> f32 {
        let state = self.state.borrow();
        match state.programs.get(&program).and_then(|p| p.values.get(&location)) {
            Some(UniformValue::Int(v)) => *v as f32,
            Some(UniformValue::Float(v)) => *v,
            None => 0.0,
        }
    }

    fn gen_texture(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.textures.insert(id);
        id
    }

    fn active_texture(&self, unit: u32) {
        self.state.borrow_mut().calls.push(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, texture: GLuint) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::BindTexture(texture));
        if texture != 0 && !state.textures.contains(&texture) {
            state.raise(gl::INVALID_OPERATION);
        }
        state.bound_texture = texture;
    }

    fn tex_parameter(&self, pname: GLenum, value: GLint) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::TexParameter(pname, value));
        if state.bound_texture == 0 {
            state.raise(gl::INVALID_OPERATION);
        }
    }

    fn unpack_alignment(&self, _alignment: GLint) {}

    fn tex_image_2d(&self, format: PixelFormat, width: u32, height: u32, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        let texture = state.bound_texture;
        if texture == 0 {
            state.raise(gl::INVALID_OPERATION);
            return;
        }
        state.uploads.push(Upload {
            texture,
            format,
            width,
            height,
            bytes: pixels.len(),
        });
    }

    fn generate_mipmap(&self) {
        self.state.borrow_mut().mipmaps += 1;
    }

    fn delete_texture(&self, texture: GLuint) {
        self.state.borrow_mut().textures.remove(&texture);
    }

    fn gen_vertex_array(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.vertex_arrays.insert(id);
        id
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        self.state.borrow_mut().calls.push(Call::BindVertexArray(vao));
    }

    fn delete_vertex_array(&self, vao: GLuint) {
        self.state.borrow_mut().vertex_arrays.remove(&vao);
    }

    fn gen_buffer(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.buffers.insert(id, Vec::new());
        id
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.state.borrow_mut().bound_buffers.insert(target, buffer);
    }

    fn buffer_data(&self, target: GLenum, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let bound = state.bound_buffers.get(&target).copied().unwrap_or(0);
        match state.buffers.get_mut(&bound) {
            Some(buffer) => *buffer = data.to_vec(),
            None => state.raise(gl::INVALID_OPERATION),
        }
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.state.borrow_mut().buffers.remove(&buffer);
    }

    fn vertex_attrib_pointer(&self, _index: GLuint, _size: GLint, _stride: usize, _offset: usize) {}

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        self.state.borrow_mut().enabled_attributes.push(index);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::Viewport(x, y, width, height));
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().calls.push(Call::ClearColor([r, g, b, a]));
    }

    fn clear(&self, mask: GLbitfield) {
        self.state.borrow_mut().calls.push(Call::Clear(mask));
    }

    fn draw_elements(&self, count: usize) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::DrawElements(count));
        if state.current_program == 0 {
            state.raise(gl::INVALID_OPERATION);
        }
    }

    fn get_error(&self) -> GLenum {
        std::mem::replace(&mut self.state.borrow_mut().error, gl::NO_ERROR)
    }
}
