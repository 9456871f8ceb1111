pub mod gl_api;
pub mod mesh;
pub mod pipeline;
pub mod shaders;
pub mod texture;

#[cfg(test)]
pub(crate) mod fake;

pub use gl_api::{GlApi, NativeGl};
pub use mesh::{QuadMesh, Vertex};
pub use pipeline::RenderPipeline;
pub use shaders::{BuildPolicy, ShaderError, ShaderProgram, ShaderSources, ShaderStage};
pub use texture::{PixelFormat, Texture, TextureError, TextureOptions};
