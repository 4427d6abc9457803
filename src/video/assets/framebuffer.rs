//! Offscreen render targets made of texture attachments.

use smallvec::SmallVec;

use super::texture::TextureHandle;

impl_handle!(FramebufferHandle);

/// Attachments of a framebuffer. Every attachment must share the same
/// dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FramebufferParams {
    pub colors: SmallVec<[TextureHandle; 4]>,
    pub depth: Option<TextureHandle>,
}

impl FramebufferParams {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_color(mut self, texture: TextureHandle) -> Self {
        self.colors.push(texture);
        self
    }

    pub fn with_depth(mut self, texture: TextureHandle) -> Self {
        self.depth = Some(texture);
        self
    }

    /// Iterates over every attached texture, colors first.
    pub fn attachments<'a>(&'a self) -> impl Iterator<Item = TextureHandle> + 'a {
        self.colors.iter().cloned().chain(self.depth)
    }
}

/// Where the output of a command goes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The default framebuffer of the window.
    Backbuffer,
    Framebuffer(FramebufferHandle),
}

impl Default for RenderTarget {
    fn default() -> Self {
        RenderTarget::Backbuffer
    }
}

impl From<FramebufferHandle> for RenderTarget {
    fn from(handle: FramebufferHandle) -> Self {
        RenderTarget::Framebuffer(handle)
    }
}
