use std::path::Path;

use anyhow::{ensure, Context as _};
use log::debug;

use super::context::{
    constants, SharedContext, TextureHandle, TextureParameter, UniformValue,
};
use super::error::{GlError, GlResult};
use super::uniform::UniformBinding;

/// Number of texture image units every WebGL2 implementation offers.
pub const MAX_TEXTURE_UNITS: u32 = 32;

/// RGBA8 pixels ready for upload, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageSource {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> anyhow::Result<Self> {
        ensure!(width > 0 && height > 0, "image has zero area ({width}x{height})");
        let expected = width as usize * height as usize * 4;
        ensure!(
            pixels.len() == expected,
            "expected {expected} bytes of RGBA data for {width}x{height}, got {}",
            pixels.len()
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Square image of `cells` x `cells` alternating squares.
    pub fn checkerboard(size: u32, cells: u32, even: [u8; 4], odd: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let color = if (x / cell + y / cell) % 2 == 0 { even } else { odd };
                pixels.extend_from_slice(&color);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// Decodes a PNG or JPEG file.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("failed to load image {}", path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.into_raw())
    }

    pub fn from_memory(bytes: &[u8]) -> anyhow::Result<Self> {
        let image = image::load_from_memory(bytes)
            .context("failed to decode image data")?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// A 2D texture tied to one texture unit.
pub struct Texture {
    context: SharedContext,
    texture: TextureHandle,
    unit: u32,
}

impl Texture {
    pub(crate) fn new(context: SharedContext, unit: u32) -> GlResult<Self> {
        if unit >= MAX_TEXTURE_UNITS {
            return Err(GlError::InvalidTextureUnit(unit));
        }
        let texture = context.create_texture().ok_or(GlError::TextureCreation)?;
        Ok(Self {
            context,
            texture,
            unit,
        })
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }

    pub fn handle(&self) -> TextureHandle {
        self.texture
    }

    /// Uploads `image` with the first row at the bottom, clamps at the edges
    /// and samples with nearest filtering.
    pub fn bind_image(&self, image: &ImageSource) {
        let context = &self.context;
        context.pixel_store_flip_y(true);
        context.active_texture(self.unit);
        context.bind_texture(Some(self.texture));
        context.tex_image_2d(image.width, image.height, &image.pixels);
        context.tex_parameter(TextureParameter::WrapS, constants::CLAMP_TO_EDGE);
        context.tex_parameter(TextureParameter::WrapT, constants::CLAMP_TO_EDGE);
        context.tex_parameter(TextureParameter::MinFilter, constants::NEAREST);
        context.tex_parameter(TextureParameter::MagFilter, constants::NEAREST);
        context.pixel_store_flip_y(false);
        debug!(
            "uploaded {}x{} image to texture unit {}",
            image.width, image.height, self.unit
        );
    }

    /// Points a sampler uniform at this texture's unit.
    pub fn bind_to_uniform(&self, sampler: &UniformBinding) {
        sampler.set(UniformValue::Int(self.unit as i32));
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.context.delete_texture(self.texture);
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("texture", &self.texture)
            .field("unit", &self.unit)
            .finish()
    }
}
