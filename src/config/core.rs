use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::rendering::RenderConfig;
use crate::render::shaders::{BuildPolicy, ShaderSources};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "LearnOpenGL".to_string(),
            width: 800,
            height: 600,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
    pub policy: BuildPolicy,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("assets/shaders/quad.vert"),
            fragment: PathBuf::from("assets/shaders/quad.frag"),
            policy: BuildPolicy::Lenient,
        }
    }
}

impl ShaderConfig {
    pub fn sources(&self) -> ShaderSources {
        ShaderSources::from_files(&self.vertex, &self.fragment)
    }
}

/// One texture, the sampler uniform that reads it and the unit it binds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureSlot {
    pub path: PathBuf,
    pub uniform: String,
    pub unit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub window: WindowConfig,
    pub shaders: ShaderConfig,
    pub textures: Vec<TextureSlot>,
    pub rendering: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            shaders: ShaderConfig::default(),
            textures: vec![
                TextureSlot {
                    path: PathBuf::from("assets/textures/wood_texture.png"),
                    uniform: "texture1".to_string(),
                    unit: 0,
                },
                TextureSlot {
                    path: PathBuf::from("assets/textures/awesomeface_texture.png"),
                    uniform: "texture2".to_string(),
                    unit: 1,
                },
            ],
            rendering: RenderConfig::default(),
        }
    }
}

impl AppConfig {
    /// The configured log level, `Info` when the name is not recognised.
    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}
