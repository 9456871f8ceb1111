use serde::{Deserialize, Serialize};

use crate::render::texture::{TextureFilter, TextureOptions, TextureWrap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clear_color: [f32; 4],
    /// Weight of the second texture in the fragment shader's blend.
    pub mix_factor: f32,
    pub wrap: TextureWrap,
    pub filter: TextureFilter,
    pub flip_vertically: bool,
    pub generate_mipmaps: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.2, 0.3, 0.3, 1.0],
            mix_factor: 0.2,
            wrap: TextureWrap::Repeat,
            filter: TextureFilter::Linear,
            flip_vertically: true,
            generate_mipmaps: true,
        }
    }
}

impl RenderConfig {
    pub fn texture_options(&self) -> TextureOptions {
        TextureOptions {
            wrap: self.wrap,
            filter: self.filter,
            flip_vertically: self.flip_vertically,
            generate_mipmaps: self.generate_mipmaps,
        }
    }
}
