//! Resources owned by a `Context` and the plain data describing them.

pub mod buffer;
pub mod framebuffer;
pub mod program;
pub mod render_state;
pub mod texture;

use std::fmt;

pub mod prelude {
    pub use super::buffer::{
        BufferData, BufferHandle, BufferParams, BufferTarget, BufferUsage, ElementType,
    };
    pub use super::framebuffer::{FramebufferHandle, FramebufferParams, RenderTarget};
    pub use super::program::{codes, ActiveVariable, ProgramHandle, ShaderStage, UniformType};
    pub use super::render_state::{Blend, BlendFactor, BlendValue, Equation, Viewport};
    pub use super::texture::{
        TextureData, TextureFilter, TextureFormat, TextureHandle, TextureParams, TextureWrap,
    };
    pub use super::Resource;
}

use self::prelude::*;

/// Any resource owned by a `Context`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Buffer(BufferHandle),
    Texture(TextureHandle),
    Framebuffer(FramebufferHandle),
    Program(ProgramHandle),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Resource::Buffer(h) => write!(f, "{}", h),
            Resource::Texture(h) => write!(f, "{}", h),
            Resource::Framebuffer(h) => write!(f, "{}", h),
            Resource::Program(h) => write!(f, "{}", h),
        }
    }
}

impl From<BufferHandle> for Resource {
    fn from(h: BufferHandle) -> Self {
        Resource::Buffer(h)
    }
}

impl From<TextureHandle> for Resource {
    fn from(h: TextureHandle) -> Self {
        Resource::Texture(h)
    }
}

impl From<FramebufferHandle> for Resource {
    fn from(h: FramebufferHandle) -> Self {
        Resource::Framebuffer(h)
    }
}

impl From<ProgramHandle> for Resource {
    fn from(h: ProgramHandle) -> Self {
        Resource::Program(h)
    }
}
