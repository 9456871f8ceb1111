pub mod core;
pub mod loader;
pub mod rendering;

pub use self::core::{AppConfig, ShaderConfig, TextureSlot, WindowConfig};
pub use loader::{load_config, load_or_create_config};
pub use rendering::RenderConfig;
