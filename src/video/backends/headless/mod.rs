//! A visitor without any native context. It records every call into a
//! `CallLog` and emulates shader compilation, linking and introspection by
//! scanning the GLSL text.

pub mod glsl;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Capabilities, IndexFormat, NativeId, Visitor};
use crate::utils::Color;
use crate::video::assets::prelude::*;
use crate::video::errors::*;
use crate::video::layout::AttributePointer;
use crate::video::uniform::UniformData;

use self::glsl::{Qualifier, Shader};

/// A recorded graphics call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer {
        id: NativeId,
        target: BufferTarget,
        usage: BufferUsage,
        size: usize,
    },
    UploadBuffer {
        id: NativeId,
        size: usize,
    },
    UpdateBuffer {
        id: NativeId,
        offset: usize,
        size: usize,
    },
    DeleteBuffer(NativeId),
    CreateTexture {
        id: NativeId,
        params: TextureParams,
        allocated: bool,
    },
    UpdateTexture(NativeId),
    DeleteTexture(NativeId),
    CreateFramebuffer {
        id: NativeId,
        colors: Vec<NativeId>,
        depth: Option<NativeId>,
    },
    DeleteFramebuffer(NativeId),
    CompileShader {
        id: NativeId,
        stage: ShaderStage,
    },
    DeleteShader(NativeId),
    LinkProgram {
        id: NativeId,
        bindings: Vec<(u32, String)>,
    },
    DeleteProgram(NativeId),
    BindFramebuffer(Option<NativeId>),
    SetViewport(Viewport),
    Clear {
        color: Option<Color>,
        depth: Option<f32>,
    },
    SetDepthTest(bool),
    SetBlend(Blend),
    UseProgram(NativeId),
    SetUniform {
        location: i32,
        data: UniformData,
    },
    BindTexture {
        unit: u32,
        id: NativeId,
    },
    BindBuffer {
        target: BufferTarget,
        id: NativeId,
    },
    VertexAttribute {
        location: u32,
        pointer: AttributePointer,
    },
    DrawElements {
        count: u32,
        format: IndexFormat,
        offset: usize,
    },
    Flush,
}

impl Call {
    /// Returns true if the call creates a native object.
    pub fn is_creation(&self) -> bool {
        match *self {
            Call::CreateBuffer { .. }
            | Call::CreateTexture { .. }
            | Call::CreateFramebuffer { .. }
            | Call::CompileShader { .. }
            | Call::LinkProgram { .. } => true,
            _ => false,
        }
    }

    pub fn is_draw(&self) -> bool {
        match *self {
            Call::DrawElements { .. } => true,
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<Call>,
    buffers: HashMap<NativeId, Vec<u8>>,
}

/// A shareable handle to the calls recorded by a `HeadlessVisitor`.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    recorder: Rc<RefCell<Recorder>>,
}

impl CallLog {
    /// Returns a copy of every call recorded so far.
    pub fn calls(&self) -> Vec<Call> {
        self.recorder.borrow().calls.clone()
    }

    pub fn len(&self) -> usize {
        self.recorder.borrow().calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets the recorded calls. Buffer contents are kept.
    pub fn clear(&self) {
        self.recorder.borrow_mut().calls.clear();
    }

    pub fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Call) -> bool,
    {
        self.recorder
            .borrow()
            .calls
            .iter()
            .filter(|v| predicate(v))
            .count()
    }

    pub fn draws(&self) -> Vec<Call> {
        self.recorder
            .borrow()
            .calls
            .iter()
            .filter(|v| v.is_draw())
            .cloned()
            .collect()
    }

    /// The current bytes stored in a native buffer.
    pub fn buffer(&self, id: NativeId) -> Option<Vec<u8>> {
        self.recorder.borrow().buffers.get(&id).cloned()
    }

    fn push(&self, call: Call) {
        trace!("[headless] {:?}", call);
        self.recorder.borrow_mut().calls.push(call);
    }
}

#[derive(Debug, Clone)]
struct LinkedProgram {
    uniforms: Vec<ActiveVariable>,
    attributes: Vec<ActiveVariable>,
}

pub struct HeadlessVisitor {
    log: CallLog,
    capabilities: Capabilities,
    next: NativeId,
    shaders: HashMap<NativeId, Shader>,
    programs: HashMap<NativeId, LinkedProgram>,
}

impl Default for HeadlessVisitor {
    fn default() -> Self {
        HeadlessVisitor::new()
    }
}

impl HeadlessVisitor {
    pub fn new() -> Self {
        HeadlessVisitor::with_capabilities(Capabilities::headless())
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        HeadlessVisitor {
            log: CallLog::default(),
            capabilities,
            next: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
        }
    }

    /// Returns a handle to the recorded calls, which stays valid after the
    /// visitor is moved into a `Context`.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn allocate(&mut self) -> NativeId {
        let id = self.next;
        self.next += 1;
        id
    }

    fn link(&self, shaders: &[NativeId], bindings: &[(u32, &str)]) -> Result<LinkedProgram> {
        let mut stages = Vec::new();
        for id in shaders {
            let shader = self
                .shaders
                .get(id)
                .ok_or_else(|| Error::Backend(format!("shader {} does not exist", id)))?;
            stages.push(shader);
        }

        let vs = stages.iter().find(|v| v.stage == ShaderStage::Vertex);
        let fs = stages.iter().find(|v| v.stage == ShaderStage::Fragment);
        let (vs, fs) = match (vs, fs) {
            (Some(vs), Some(fs)) => (vs, fs),
            _ => {
                return Err(Error::ProgramLink {
                    log: "ERROR: a vertex and a fragment shader are required".into(),
                })
            }
        };

        for d in &fs.declarations {
            if d.qualifier == Qualifier::Varying
                && fs.uses(&d.name)
                && !vs.declared(Qualifier::Varying, &d.name)
            {
                return Err(Error::ProgramLink {
                    log: format!(
                        "ERROR: Varying `{}` is read by the fragment shader but never written.",
                        d.name
                    ),
                });
            }
        }

        let mut uniforms: Vec<ActiveVariable> = Vec::new();
        let mut location = 0;
        for shader in &[vs, fs] {
            for d in &shader.declarations {
                if d.qualifier != Qualifier::Uniform || uniforms.iter().any(|u| u.name == d.name)
                {
                    continue;
                }

                if !vs.uses(&d.name) && !fs.uses(&d.name) {
                    continue;
                }

                let size = d.size.unwrap_or(1);
                let name = match d.size {
                    Some(_) => format!("{}[0]", d.name),
                    None => d.name.clone(),
                };

                uniforms.push(ActiveVariable {
                    name,
                    code: d.code(),
                    size,
                    location,
                });

                location += size as i32;
            }
        }

        let mut attributes = Vec::new();
        for d in &vs.declarations {
            if d.qualifier != Qualifier::Attribute || !vs.uses(&d.name) {
                continue;
            }

            let location = match bindings.iter().find(|v| v.1 == d.name) {
                Some(v) => v.0,
                None => (0..)
                    .find(|l| {
                        !bindings.iter().any(|v| v.0 == *l)
                            && !attributes.iter().any(|v: &ActiveVariable| v.location == *l as i32)
                    })
                    .unwrap_or(0),
            };

            attributes.push(ActiveVariable {
                name: d.name.clone(),
                code: d.code(),
                size: 1,
                location: location as i32,
            });
        }

        Ok(LinkedProgram {
            uniforms,
            attributes,
        })
    }

    fn program(&self, id: NativeId) -> Result<&LinkedProgram> {
        self.programs
            .get(&id)
            .ok_or_else(|| Error::Backend(format!("program {} does not exist", id)))
    }
}

impl Visitor for HeadlessVisitor {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    unsafe fn create_buffer(
        &mut self,
        target: BufferTarget,
        usage: BufferUsage,
        bytes: &[u8],
    ) -> Result<NativeId> {
        let id = self.allocate();
        self.log.push(Call::CreateBuffer {
            id,
            target,
            usage,
            size: bytes.len(),
        });

        self.log
            .recorder
            .borrow_mut()
            .buffers
            .insert(id, bytes.to_vec());
        Ok(id)
    }

    unsafe fn upload_buffer(
        &mut self,
        id: NativeId,
        _: BufferTarget,
        _: BufferUsage,
        bytes: &[u8],
    ) -> Result<()> {
        self.log.push(Call::UploadBuffer {
            id,
            size: bytes.len(),
        });

        self.log
            .recorder
            .borrow_mut()
            .buffers
            .insert(id, bytes.to_vec());
        Ok(())
    }

    unsafe fn update_buffer(
        &mut self,
        id: NativeId,
        _: BufferTarget,
        offset: usize,
        bytes: &[u8],
    ) -> Result<()> {
        self.log.push(Call::UpdateBuffer {
            id,
            offset,
            size: bytes.len(),
        });

        let mut recorder = self.log.recorder.borrow_mut();
        let buf = recorder
            .buffers
            .get_mut(&id)
            .ok_or_else(|| Error::Backend(format!("buffer {} does not exist", id)))?;

        if offset + bytes.len() > buf.len() {
            return Err(Error::OutOfBounds);
        }

        buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    unsafe fn delete_buffer(&mut self, id: NativeId) -> Result<()> {
        self.log.push(Call::DeleteBuffer(id));
        self.log.recorder.borrow_mut().buffers.remove(&id);
        Ok(())
    }

    unsafe fn create_texture(
        &mut self,
        params: &TextureParams,
        bytes: Option<&[u8]>,
    ) -> Result<NativeId> {
        let id = self.allocate();
        self.log.push(Call::CreateTexture {
            id,
            params: *params,
            allocated: bytes.is_some(),
        });
        Ok(id)
    }

    unsafe fn update_texture(&mut self, id: NativeId, _: &TextureParams, _: &[u8]) -> Result<()> {
        self.log.push(Call::UpdateTexture(id));
        Ok(())
    }

    unsafe fn delete_texture(&mut self, id: NativeId) -> Result<()> {
        self.log.push(Call::DeleteTexture(id));
        Ok(())
    }

    unsafe fn create_framebuffer(
        &mut self,
        colors: &[NativeId],
        depth: Option<NativeId>,
    ) -> Result<NativeId> {
        if colors.is_empty() && depth.is_none() {
            return Err(Error::FramebufferIncomplete(
                "the framebuffer has no attachments".into(),
            ));
        }

        let id = self.allocate();
        self.log.push(Call::CreateFramebuffer {
            id,
            colors: colors.to_vec(),
            depth,
        });
        Ok(id)
    }

    unsafe fn delete_framebuffer(&mut self, id: NativeId) -> Result<()> {
        self.log.push(Call::DeleteFramebuffer(id));
        Ok(())
    }

    unsafe fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<NativeId> {
        let shader = Shader::compile(stage, source).map_err(|log| Error::ShaderCompile {
            stage,
            log,
            source: source.to_owned(),
        })?;

        let id = self.allocate();
        self.shaders.insert(id, shader);
        self.log.push(Call::CompileShader { id, stage });
        Ok(id)
    }

    unsafe fn delete_shader(&mut self, id: NativeId) -> Result<()> {
        self.shaders.remove(&id);
        self.log.push(Call::DeleteShader(id));
        Ok(())
    }

    unsafe fn link_program(
        &mut self,
        shaders: &[NativeId],
        bindings: &[(u32, &str)],
    ) -> Result<NativeId> {
        let program = self.link(shaders, bindings)?;
        let id = self.allocate();
        self.programs.insert(id, program);

        self.log.push(Call::LinkProgram {
            id,
            bindings: bindings.iter().map(|v| (v.0, v.1.to_owned())).collect(),
        });

        Ok(id)
    }

    unsafe fn active_uniforms(&mut self, program: NativeId) -> Result<Vec<ActiveVariable>> {
        Ok(self.program(program)?.uniforms.clone())
    }

    unsafe fn active_attributes(&mut self, program: NativeId) -> Result<Vec<ActiveVariable>> {
        Ok(self.program(program)?.attributes.clone())
    }

    unsafe fn uniform_location(&mut self, program: NativeId, name: &str) -> Result<Option<i32>> {
        let program = self.program(program)?;

        for u in &program.uniforms {
            if u.name == name {
                return Ok(Some(u.location));
            }

            if u.name.ends_with("[0]") {
                let base = &u.name[..u.name.len() - 3];
                if name == base {
                    return Ok(Some(u.location));
                }

                if name.starts_with(base) && name[base.len()..].starts_with('[') {
                    let index = name[base.len() + 1..].trim_end_matches(']').parse::<u32>();
                    if let Ok(index) = index {
                        if index < u.size {
                            return Ok(Some(u.location + index as i32));
                        }
                    }
                }
            }
        }

        Ok(None)
    }

    unsafe fn delete_program(&mut self, id: NativeId) -> Result<()> {
        self.programs.remove(&id);
        self.log.push(Call::DeleteProgram(id));
        Ok(())
    }

    unsafe fn bind_framebuffer(&mut self, id: Option<NativeId>) -> Result<()> {
        self.log.push(Call::BindFramebuffer(id));
        Ok(())
    }

    unsafe fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.log.push(Call::SetViewport(viewport));
        Ok(())
    }

    unsafe fn clear(&mut self, color: Option<Color>, depth: Option<f32>) -> Result<()> {
        self.log.push(Call::Clear { color, depth });
        Ok(())
    }

    unsafe fn set_depth_test(&mut self, enable: bool) -> Result<()> {
        self.log.push(Call::SetDepthTest(enable));
        Ok(())
    }

    unsafe fn set_blend(&mut self, blend: Blend) -> Result<()> {
        self.log.push(Call::SetBlend(blend));
        Ok(())
    }

    unsafe fn use_program(&mut self, id: NativeId) -> Result<()> {
        self.program(id)?;
        self.log.push(Call::UseProgram(id));
        Ok(())
    }

    unsafe fn set_uniform(&mut self, location: i32, data: &UniformData) -> Result<()> {
        self.log.push(Call::SetUniform {
            location,
            data: *data,
        });
        Ok(())
    }

    unsafe fn bind_texture(&mut self, unit: u32, id: NativeId) -> Result<()> {
        self.log.push(Call::BindTexture { unit, id });
        Ok(())
    }

    unsafe fn bind_buffer(&mut self, target: BufferTarget, id: NativeId) -> Result<()> {
        self.log.push(Call::BindBuffer { target, id });
        Ok(())
    }

    unsafe fn vertex_attribute(&mut self, location: u32, pointer: AttributePointer) -> Result<()> {
        self.log.push(Call::VertexAttribute { location, pointer });
        Ok(())
    }

    unsafe fn draw_elements(
        &mut self,
        count: u32,
        format: IndexFormat,
        offset: usize,
    ) -> Result<()> {
        self.log.push(Call::DrawElements {
            count,
            format,
            offset,
        });
        Ok(())
    }

    unsafe fn flush(&mut self) -> Result<()> {
        self.log.push(Call::Flush);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const VS: &str = "attribute vec2 aPosition;\nattribute vec2 aUnused;\nuniform mat4 uMatrix;\nuniform float uWeights[3];\nvarying vec2 vUv;\nvoid main() { vUv = aPosition * uWeights[1]; gl_Position = uMatrix * vec4(aPosition, 0.0, 1.0); }";
    const FS: &str = "uniform vec4 uColor;\nuniform float uIgnored;\nvarying vec2 vUv;\nvoid main() { gl_FragColor = uColor * vUv.x; }";

    #[test]
    fn introspection() {
        let mut visitor = HeadlessVisitor::new();
        let log = visitor.log();

        unsafe {
            let vs = visitor.compile_shader(ShaderStage::Vertex, VS).unwrap();
            let fs = visitor.compile_shader(ShaderStage::Fragment, FS).unwrap();
            let program = visitor.link_program(&[vs, fs], &[(3, "aPosition")]).unwrap();

            let uniforms = visitor.active_uniforms(program).unwrap();
            let names: Vec<_> = uniforms.iter().map(|v| v.name.as_str()).collect();
            assert_eq!(names, vec!["uMatrix", "uWeights[0]", "uColor"]);
            assert_eq!(uniforms[1].size, 3);

            let attributes = visitor.active_attributes(program).unwrap();
            assert_eq!(attributes.len(), 1);
            assert_eq!(attributes[0].location, 3);

            let base = uniforms[1].location;
            assert_eq!(visitor.uniform_location(program, "uWeights[2]").unwrap(), Some(base + 2));
            assert_eq!(visitor.uniform_location(program, "uWeights[3]").unwrap(), None);
            assert_eq!(visitor.uniform_location(program, "uIgnored").unwrap(), None);
        }

        assert_eq!(log.count(|v| v.is_creation()), 3);
    }

    #[test]
    fn link_failure() {
        let mut visitor = HeadlessVisitor::new();
        let fs = "varying vec3 vNormal;\nvoid main() { gl_FragColor = vec4(vNormal, 1.0); }";

        unsafe {
            let vs = visitor.compile_shader(ShaderStage::Vertex, VS).unwrap();
            let fs = visitor.compile_shader(ShaderStage::Fragment, fs).unwrap();
            match visitor.link_program(&[vs, fs], &[]) {
                Err(Error::ProgramLink { log }) => assert!(log.contains("vNormal")),
                other => panic!("unexpected {:?}", other),
            }
        }
    }
}
