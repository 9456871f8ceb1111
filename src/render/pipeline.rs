// pipeline.rs - One-time setup and the per-frame draw sequence

use log::{error, info};
use std::rc::Rc;

use crate::config::core::{AppConfig, TextureSlot};
use crate::render::gl_api::GlApi;
use crate::render::mesh::QuadMesh;
use crate::render::shaders::{ShaderError, ShaderProgram};
use crate::render::texture::Texture;

const MAX_DRAINED_ERRORS: usize = 16;
const MIX_FACTOR_UNIFORM: &str = "mixFactor";

struct BoundTexture {
    texture: Texture,
    unit: u32,
}

/// Owns everything drawn each frame. Fields drop in declaration order, all
/// while the GL context is still alive.
pub struct RenderPipeline {
    gl: Rc<dyn GlApi>,
    shader: ShaderProgram,
    textures: Vec<BoundTexture>,
    mesh: QuadMesh,
    clear_color: [f32; 4],
}

impl RenderPipeline {
    /// Builds the shader, loads the textures and uploads the quad. Each
    /// sampler uniform is pointed at its texture unit and `mixFactor` is set
    /// from the rendering config.
    ///
    /// Only a strict shader policy can make this fail.
    pub fn new(gl: Rc<dyn GlApi>, config: &AppConfig) -> Result<Self, ShaderError> {
        let shader = ShaderProgram::build(
            Rc::clone(&gl),
            &config.shaders.sources(),
            config.shaders.policy,
        )?;

        let options = config.rendering.texture_options();
        let textures = config
            .textures
            .iter()
            .map(|TextureSlot { path, unit, .. }| BoundTexture {
                texture: Texture::from_file(Rc::clone(&gl), path, options),
                unit: *unit,
            })
            .collect();

        let mesh = QuadMesh::quad(Rc::clone(&gl));

        shader.activate();
        for slot in &config.textures {
            shader.set_int(&slot.uniform, slot.unit as i32);
        }
        shader.set_float(MIX_FACTOR_UNIFORM, config.rendering.mix_factor);

        info!(
            "Render pipeline ready: program {}, {} texture(s), {} indices",
            shader.id(),
            config.textures.len(),
            mesh.index_count()
        );

        Ok(Self {
            gl,
            shader,
            textures,
            mesh,
            clear_color: config.rendering.clear_color,
        })
    }

    pub fn shader(&self) -> &ShaderProgram {
        &self.shader
    }

    pub fn render_frame(&self) {
        let [r, g, b, a] = self.clear_color;
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(gl::COLOR_BUFFER_BIT);

        for bound in &self.textures {
            bound.texture.bind(bound.unit);
        }

        self.shader.activate();
        self.mesh.draw();
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    /// Logs and returns every pending GL error code.
    pub fn drain_errors(&self) -> Vec<u32> {
        let mut errors = Vec::new();
        // A lost context keeps reporting the same code.
        for _ in 0..MAX_DRAINED_ERRORS {
            let code = self.gl.get_error();
            if code == gl::NO_ERROR {
                break;
            }
            error!("OpenGL error 0x{:04X}", code);
            errors.push(code);
        }
        errors
    }
}
