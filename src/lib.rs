pub mod config;
pub mod input;
pub mod render;

// Re-export commonly used types
pub use config::core::AppConfig;
pub use input::InputState;
pub use render::pipeline::RenderPipeline;
pub use render::shaders::ShaderProgram;
pub use render::texture::Texture;
