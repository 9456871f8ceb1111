use gl::types::*;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

use crate::render::gl_api::GlApi;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Failed to decode image at {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u8),
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Pixel layout declared to GL for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn from_channels(channels: u8) -> Result<Self, TextureError> {
        match channels {
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            other => Err(TextureError::UnsupportedChannels(other)),
        }
    }

    pub fn channels(self) -> u8 {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub fn gl_enum(self) -> GLenum {
        match self {
            Self::Rgb => gl::RGB,
            Self::Rgba => gl::RGBA,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureWrap {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

impl TextureWrap {
    fn gl_enum(self) -> GLenum {
        match self {
            Self::Repeat => gl::REPEAT,
            Self::MirroredRepeat => gl::MIRRORED_REPEAT,
            Self::ClampToEdge => gl::CLAMP_TO_EDGE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

impl TextureFilter {
    fn gl_enum(self) -> GLenum {
        match self {
            Self::Nearest => gl::NEAREST,
            Self::Linear => gl::LINEAR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureOptions {
    pub wrap: TextureWrap,
    pub filter: TextureFilter,
    pub flip_vertically: bool,
    pub generate_mipmaps: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            wrap: TextureWrap::Repeat,
            filter: TextureFilter::Linear,
            flip_vertically: true,
            generate_mipmaps: true,
        }
    }
}

/// Raw, tightly packed pixels plus the shape GL needs to read them.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn format(&self) -> Result<PixelFormat, TextureError> {
        let format = PixelFormat::from_channels(self.channels)?;
        let expected = self.width as usize * self.height as usize * format.channels() as usize;
        if self.pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(format)
    }
}

/// Decodes `path` into RGB8 or RGBA8 depending on whether it has alpha.
pub fn decode_image<P: AsRef<Path>>(path: P, flip_vertically: bool) -> Result<DecodedImage, TextureError> {
    let path = path.as_ref();
    let mut img = image::open(path).map_err(|source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    if flip_vertically {
        img = img.flipv();
    }

    let (width, height) = (img.width(), img.height());
    let (channels, pixels) = if img.color().has_alpha() {
        (4, img.to_rgba8().into_raw())
    } else {
        (3, img.to_rgb8().into_raw())
    };

    Ok(DecodedImage {
        width,
        height,
        channels,
        pixels,
    })
}

/// A 2D texture object, deleted when dropped.
pub struct Texture {
    gl: Rc<dyn GlApi>,
    id: GLuint,
    options: TextureOptions,
    size: Option<(u32, u32)>,
}

impl Texture {
    pub fn new(gl: Rc<dyn GlApi>, options: TextureOptions) -> Self {
        let id = gl.gen_texture();
        gl.bind_texture(id);

        let wrap = options.wrap.gl_enum() as GLint;
        let filter = options.filter.gl_enum() as GLint;
        gl.tex_parameter(gl::TEXTURE_WRAP_S, wrap);
        gl.tex_parameter(gl::TEXTURE_WRAP_T, wrap);
        gl.tex_parameter(gl::TEXTURE_MIN_FILTER, filter);
        gl.tex_parameter(gl::TEXTURE_MAG_FILTER, filter);

        Self {
            gl,
            id,
            options,
            size: None,
        }
    }

    /// Creates the texture and fills it from `path`. A file that fails to
    /// decode is logged and leaves the texture empty.
    pub fn from_file<P: AsRef<Path>>(gl: Rc<dyn GlApi>, path: P, options: TextureOptions) -> Self {
        let mut texture = Self::new(gl, options);
        let result = decode_image(path.as_ref(), options.flip_vertically)
            .and_then(|image| texture.upload(&image));
        if let Err(e) = result {
            error!("Failed to load texture {:?}: {}", path.as_ref(), e);
        }
        texture
    }

    pub fn upload(&mut self, image: &DecodedImage) -> Result<(), TextureError> {
        let format = image.format()?;

        self.gl.bind_texture(self.id);
        self.gl.unpack_alignment(1);
        self.gl
            .tex_image_2d(format, image.width, image.height, &image.pixels);
        if self.options.generate_mipmaps {
            self.gl.generate_mipmap();
        }

        debug!(
            "Uploaded {}x{} {:?} image to texture {}",
            image.width, image.height, format, self.id
        );
        self.size = Some((image.width, image.height));
        Ok(())
    }

    pub fn bind(&self, unit: u32) {
        self.gl.active_texture(unit);
        self.gl.bind_texture(self.id);
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    /// Dimensions of the last successful upload.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.gl.delete_texture(self.id);
    }
}
