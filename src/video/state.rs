//! The inherited state of nested submissions and the cache of what has been
//! applied to the graphics API.

use smallvec::SmallVec;

use super::assets::prelude::*;
use super::command::Fields;
use super::layout::VertexLayout;
use super::uniform::Uniforms;

/// One entry of the state stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub framebuffer: RenderTarget,
    pub viewport: Viewport,
    pub program: Option<ProgramHandle>,
    pub depth_enable: bool,
    pub blend: Blend,
    /// The union of every ancestor's uniforms, nearer ones winning.
    pub uniforms: Uniforms,
    pub vertex_layout: Option<VertexLayout>,
}

impl Frame {
    /// The root frame of a drawable area of `dimensions`.
    pub fn new(dimensions: (u32, u32)) -> Self {
        Frame {
            framebuffer: RenderTarget::Backbuffer,
            viewport: Viewport::full(dimensions),
            program: None,
            depth_enable: false,
            blend: Blend::Disabled,
            uniforms: Uniforms::new(),
            vertex_layout: None,
        }
    }

    /// The state in effect for a command with `fields` submitted below this
    /// frame. Clear values and draw payloads are not part of a frame.
    pub fn merge(&self, fields: &Fields) -> Frame {
        Frame {
            framebuffer: fields.framebuffer.unwrap_or(self.framebuffer),
            viewport: fields.viewport.unwrap_or(self.viewport),
            program: fields.program.or(self.program),
            depth_enable: fields.depth_enable.unwrap_or(self.depth_enable),
            blend: fields.blend.unwrap_or(self.blend),
            uniforms: self.uniforms.merge(&fields.uniforms),
            vertex_layout: fields
                .vertex_layout
                .clone()
                .or_else(|| self.vertex_layout.clone()),
        }
    }
}

/// The values last issued to the graphics API. `None` means unknown, which
/// forces the next application.
#[derive(Debug, Clone, Default)]
pub struct Applied {
    pub framebuffer: Option<RenderTarget>,
    pub viewport: Option<Viewport>,
    pub depth_enable: Option<bool>,
    pub blend: Option<Blend>,
    pub program: Option<ProgramHandle>,
    pub textures: SmallVec<[Option<TextureHandle>; 16]>,
}

impl Applied {
    pub fn invalidate(&mut self) {
        *self = Applied::default();
    }

    pub fn invalidate_textures(&mut self) {
        self.textures.clear();
    }

    /// Forgets every cached binding of `resource`.
    pub fn evict(&mut self, resource: Resource) {
        match resource {
            Resource::Framebuffer(h) => {
                if self.framebuffer == Some(RenderTarget::Framebuffer(h)) {
                    self.framebuffer = None;
                }
            }
            Resource::Program(h) => {
                if self.program == Some(h) {
                    self.program = None;
                }
            }
            Resource::Texture(h) => {
                for v in self.textures.iter_mut() {
                    if *v == Some(h) {
                        *v = None;
                    }
                }
            }
            Resource::Buffer(_) => {}
        }
    }

    /// Returns the texture bound to `unit`, if known.
    pub fn texture(&self, unit: usize) -> Option<TextureHandle> {
        self.textures.get(unit).cloned().and_then(|v| v)
    }

    pub fn set_texture(&mut self, unit: usize, texture: TextureHandle) {
        if self.textures.len() <= unit {
            self.textures.resize(unit + 1, None);
        }

        self.textures[unit] = Some(texture);
    }
}
