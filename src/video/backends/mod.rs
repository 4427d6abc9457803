//! The backend of the context, which should be responsible for only one thing:
//! issuing low-level graphics calls. It keeps no state besides native object
//! tables; redundant-call elimination happens in the `Context`.

pub mod capabilities;
pub mod headless;

#[cfg(not(target_arch = "wasm32"))]
pub mod gl;

use super::assets::prelude::*;
use super::errors::*;
use super::layout::AttributePointer;
use super::uniform::UniformData;
use crate::utils::Color;

pub use self::capabilities::{Capabilities, Version};

/// The name of a native object.
pub type NativeId = u32;

/// Index format of indexed draws.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
}

pub trait Visitor {
    fn capabilities(&self) -> &Capabilities;

    unsafe fn create_buffer(
        &mut self,
        target: BufferTarget,
        usage: BufferUsage,
        bytes: &[u8],
    ) -> Result<NativeId>;

    /// Re-specifies the whole storage of a buffer.
    unsafe fn upload_buffer(
        &mut self,
        id: NativeId,
        target: BufferTarget,
        usage: BufferUsage,
        bytes: &[u8],
    ) -> Result<()>;

    /// Overwrites a byte range of a buffer.
    unsafe fn update_buffer(
        &mut self,
        id: NativeId,
        target: BufferTarget,
        offset: usize,
        bytes: &[u8],
    ) -> Result<()>;

    unsafe fn delete_buffer(&mut self, id: NativeId) -> Result<()>;

    unsafe fn create_texture(
        &mut self,
        params: &TextureParams,
        bytes: Option<&[u8]>,
    ) -> Result<NativeId>;

    unsafe fn update_texture(
        &mut self,
        id: NativeId,
        params: &TextureParams,
        bytes: &[u8],
    ) -> Result<()>;

    unsafe fn delete_texture(&mut self, id: NativeId) -> Result<()>;

    unsafe fn create_framebuffer(
        &mut self,
        colors: &[NativeId],
        depth: Option<NativeId>,
    ) -> Result<NativeId>;

    unsafe fn delete_framebuffer(&mut self, id: NativeId) -> Result<()>;

    unsafe fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<NativeId>;

    unsafe fn delete_shader(&mut self, id: NativeId) -> Result<()>;

    /// Links `shaders` into a program, binding each `(location, name)`
    /// attribute before linking.
    unsafe fn link_program(
        &mut self,
        shaders: &[NativeId],
        bindings: &[(u32, &str)],
    ) -> Result<NativeId>;

    unsafe fn active_uniforms(&mut self, program: NativeId) -> Result<Vec<ActiveVariable>>;

    unsafe fn active_attributes(&mut self, program: NativeId) -> Result<Vec<ActiveVariable>>;

    /// Queries the location of `name`, which might address one element of an
    /// array uniform.
    unsafe fn uniform_location(&mut self, program: NativeId, name: &str) -> Result<Option<i32>>;

    unsafe fn delete_program(&mut self, id: NativeId) -> Result<()>;

    /// Binds a framebuffer, `None` binds the backbuffer.
    unsafe fn bind_framebuffer(&mut self, id: Option<NativeId>) -> Result<()>;

    unsafe fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    unsafe fn clear(&mut self, color: Option<Color>, depth: Option<f32>) -> Result<()>;

    unsafe fn set_depth_test(&mut self, enable: bool) -> Result<()>;

    unsafe fn set_blend(&mut self, blend: Blend) -> Result<()>;

    unsafe fn use_program(&mut self, id: NativeId) -> Result<()>;

    /// Writes into a uniform location of the program in use.
    unsafe fn set_uniform(&mut self, location: i32, data: &UniformData) -> Result<()>;

    unsafe fn bind_texture(&mut self, unit: u32, id: NativeId) -> Result<()>;

    unsafe fn bind_buffer(&mut self, target: BufferTarget, id: NativeId) -> Result<()>;

    /// Enables the attribute array at `location`, reading the buffer bound
    /// to `BufferTarget::Vertex`.
    unsafe fn vertex_attribute(&mut self, location: u32, pointer: AttributePointer) -> Result<()>;

    /// Draws triangles from the bound index buffer. `offset` is in bytes.
    unsafe fn draw_elements(&mut self, count: u32, format: IndexFormat, offset: usize)
        -> Result<()>;

    /// Blocks until all execution is complete.
    unsafe fn flush(&mut self) -> Result<()>;
}
