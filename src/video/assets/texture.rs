//! Two-dimensional textures, sampled by programs or used as render targets.

use std::borrow::Cow;

use byteorder::{ByteOrder, NativeEndian};
use serde::{Deserialize, Serialize};

use crate::video::errors::*;

impl_handle!(TextureHandle);

/// List of all the texture formats that can be used.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    R8,
    RGB8,
    RGBA8,
    RGBA32F,
    Depth16,
    Depth24,
    Depth32F,
}

impl TextureFormat {
    /// Returns the number of components per pixel.
    pub fn components(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::RGB8 => 3,
            TextureFormat::RGBA8 | TextureFormat::RGBA32F => 4,
            TextureFormat::Depth16 | TextureFormat::Depth24 | TextureFormat::Depth32F => 1,
        }
    }

    pub fn is_color(self) -> bool {
        !self.is_depth()
    }

    pub fn is_depth(self) -> bool {
        match self {
            TextureFormat::Depth16 | TextureFormat::Depth24 | TextureFormat::Depth32F => true,
            _ => false,
        }
    }

    /// Returns true if the pixels are stored as 32-bit floats.
    pub fn is_float(self) -> bool {
        match self {
            TextureFormat::RGBA32F | TextureFormat::Depth32F => true,
            _ => false,
        }
    }
}

/// Sampling filter applied for minification and magnification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Wrap mode applied to both texture coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureWrap {
    Repeat,
    Mirror,
    Clamp,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureParams {
    pub format: TextureFormat,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    pub dimensions: (u32, u32),
}

impl Default for TextureParams {
    fn default() -> Self {
        TextureParams {
            format: TextureFormat::RGBA8,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::Clamp,
            dimensions: (0, 0),
        }
    }
}

impl TextureParams {
    pub fn new(format: TextureFormat, dimensions: (u32, u32)) -> Self {
        TextureParams {
            format,
            dimensions,
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: TextureFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_wrap(mut self, wrap: TextureWrap) -> Self {
        self.wrap = wrap;
        self
    }

    /// Number of components expected for a full upload.
    pub fn components(&self) -> usize {
        (self.dimensions.0 as usize) * (self.dimensions.1 as usize) * self.format.components()
    }

    /// Validates `data` as the full content of a texture described by `self`.
    pub fn validate(&self, data: &TextureData) -> Result<()> {
        if self.dimensions.0 == 0 || self.dimensions.1 == 0 {
            return Err(invalid("textures can not have zero dimensions"));
        }

        if self.format.is_depth() {
            return Err(invalid("depth textures only serve as render targets"));
        }

        match *data {
            TextureData::U8(_) if self.format.is_float() => {
                return Err(invalid(format!("{:?} expects f32 pixels", self.format)));
            }
            TextureData::F32(_) if !self.format.is_float() => {
                return Err(invalid(format!("{:?} expects u8 pixels", self.format)));
            }
            _ => {}
        }

        if data.len() != self.components() {
            return Err(invalid(format!(
                "expects {} components, got {}",
                self.components(),
                data.len()
            )));
        }

        if let Some(index) = data.first_non_finite() {
            return Err(Error::DataIntegrity { index });
        }

        Ok(())
    }
}

fn invalid<T: Into<String>>(reason: T) -> Error {
    Error::InvalidData {
        resource: "texture".into(),
        reason: reason.into(),
    }
}

/// Pixel data uploaded into a texture.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureData<'a> {
    U8(Cow<'a, [u8]>),
    F32(Cow<'a, [f32]>),
}

impl<'a> From<&'a [u8]> for TextureData<'a> {
    fn from(v: &'a [u8]) -> Self {
        TextureData::U8(Cow::Borrowed(v))
    }
}

impl<'a> From<Vec<u8>> for TextureData<'a> {
    fn from(v: Vec<u8>) -> Self {
        TextureData::U8(Cow::Owned(v))
    }
}

impl<'a> From<&'a [f32]> for TextureData<'a> {
    fn from(v: &'a [f32]) -> Self {
        TextureData::F32(Cow::Borrowed(v))
    }
}

impl<'a> From<Vec<f32>> for TextureData<'a> {
    fn from(v: Vec<f32>) -> Self {
        TextureData::F32(Cow::Owned(v))
    }
}

impl<'a> TextureData<'a> {
    /// Number of components.
    pub fn len(&self) -> usize {
        match *self {
            TextureData::U8(ref v) => v.len(),
            TextureData::F32(ref v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first_non_finite(&self) -> Option<usize> {
        match *self {
            TextureData::F32(ref v) => v.iter().position(|e| !e.is_finite()),
            TextureData::U8(_) => None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            TextureData::U8(ref v) => v.to_vec(),
            TextureData::F32(ref v) => {
                let mut bytes = vec![0; v.len() * 4];
                for (i, e) in v.iter().enumerate() {
                    NativeEndian::write_f32(&mut bytes[i * 4..], *e);
                }
                bytes
            }
        }
    }
}
