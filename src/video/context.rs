//! The `Context` owns every resource, validates commands and executes
//! submissions against a stack of inherited state.

use std::mem;

use super::assets::prelude::*;
use super::backends::{Capabilities, IndexFormat, NativeId, Visitor};
use super::command::{Command, CommandDescriptor, CommandId, Fields, Override};
use super::debug::Graph;
use super::errors::*;
use super::layout::{AttributePointer, Elements, VertexAttributes, VertexLayout};
use super::params::ContextParams;
use super::program::{Program, UniformWrite};
use super::state::{Applied, Frame};
use super::uniform::{UniformData, UniformValue, Uniforms};
use crate::utils::ObjectPool;

/// Counters of the graphics calls issued since the last `Context::advance`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub drawcalls: u32,
    /// Framebuffer, viewport, depth test, blend, program and texture binds.
    pub state_changes: u32,
    pub clears: u32,
}

/// New contents of a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceData<'a> {
    Buffer(BufferData<'a>),
    Texture(TextureData<'a>),
}

impl<'a> From<BufferData<'a>> for ResourceData<'a> {
    fn from(data: BufferData<'a>) -> Self {
        ResourceData::Buffer(data)
    }
}

impl<'a> From<TextureData<'a>> for ResourceData<'a> {
    fn from(data: TextureData<'a>) -> Self {
        ResourceData::Texture(data)
    }
}

/// The partial commands applied by one `Context::dispatch`.
#[derive(Debug, Copy, Clone)]
pub enum Overrides<'a> {
    None,
    One(&'a Override),
    /// Submits once per override, in order.
    Batches(&'a [Override]),
}

/// The type of an absent sub-command closure.
pub type NoSub = fn(&mut Context) -> Result<()>;

#[derive(Debug, Clone, Copy)]
struct BufferObject {
    id: NativeId,
    params: BufferParams,
}

#[derive(Debug, Clone, Copy)]
struct TextureObject {
    id: NativeId,
    params: TextureParams,
}

#[derive(Debug, Clone, Copy)]
struct FramebufferObject {
    id: NativeId,
}

pub struct Context {
    visitor: Box<dyn Visitor>,
    params: ContextParams,
    max_texture_units: u32,

    buffers: ObjectPool<BufferHandle, BufferObject>,
    textures: ObjectPool<TextureHandle, TextureObject>,
    framebuffers: ObjectPool<FramebufferHandle, FramebufferObject>,
    programs: ObjectPool<ProgramHandle, Program>,

    root: Frame,
    stack: Vec<Frame>,
    applied: Applied,
    commands: u32,

    debug: bool,
    graph: Graph,
    info: FrameInfo,
}

impl Drop for Context {
    fn drop(&mut self) {
        let released = self.buffers.len()
            + self.textures.len()
            + self.framebuffers.len()
            + self.programs.len();

        let result = unsafe { self.release() };
        if let Err(err) = result {
            warn!("Failed to release native objects. {}", err);
        }

        debug!("Context dropped, {} resources released.", released);
    }
}

impl Context {
    /// Deletes the native objects of every live resource, framebuffers
    /// first.
    unsafe fn release(&mut self) -> Result<()> {
        for v in self.framebuffers.drain() {
            self.visitor.delete_framebuffer(v.id)?;
        }

        for v in self.programs.drain() {
            self.visitor.delete_program(v.id)?;
        }

        for v in self.textures.drain() {
            self.visitor.delete_texture(v.id)?;
        }

        for v in self.buffers.drain() {
            self.visitor.delete_buffer(v.id)?;
        }

        Ok(())
    }

    /// Creates a context issuing its calls through `visitor`.
    pub fn new(visitor: Box<dyn Visitor>, params: ContextParams) -> Result<Self> {
        params.validate()?;

        let capabilities = visitor.capabilities().clone();
        let max_texture_units = match params.max_texture_units {
            Some(cap) => cap.min(capabilities.max_texture_units),
            None => capabilities.max_texture_units,
        };

        info!(
            "Context {:?} ({}) with {:?}, {} texture units.",
            capabilities.version, capabilities.renderer, params.dimensions, max_texture_units
        );

        Ok(Context {
            visitor,
            max_texture_units,
            buffers: ObjectPool::new(),
            textures: ObjectPool::new(),
            framebuffers: ObjectPool::new(),
            programs: ObjectPool::new(),
            root: Frame::new(params.dimensions),
            stack: Vec::new(),
            applied: Applied::default(),
            commands: 0,
            debug: params.debug,
            graph: Graph::new(),
            info: FrameInfo::default(),
            params,
        })
    }

    #[inline]
    pub fn capabilities(&self) -> &Capabilities {
        self.visitor.capabilities()
    }

    #[inline]
    pub fn params(&self) -> &ContextParams {
        &self.params
    }

    /// The metadata of a buffer, which tracks its current length.
    pub fn buffer_params(&self, handle: BufferHandle) -> Option<BufferParams> {
        self.buffers.get(handle).map(|v| v.params)
    }

    pub fn texture_params(&self, handle: TextureHandle) -> Option<TextureParams> {
        self.textures.get(handle).map(|v| v.params)
    }

    /// The uniform and attribute tables of a linked program.
    pub fn program(&self, handle: ProgramHandle) -> Option<&Program> {
        self.programs.get(handle)
    }

    /// Number of frames pushed by the submissions in progress.
    #[inline]
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Turns the recording of the debug graph on or off. The graph recorded
    /// so far is kept.
    pub fn debug(&mut self, enable: bool) {
        self.debug = enable;
    }

    #[inline]
    pub fn debug_graph(&self) -> &Graph {
        &self.graph
    }

    /// Takes the recorded graph, leaving an empty one.
    pub fn take_debug_graph(&mut self) -> Graph {
        mem::replace(&mut self.graph, Graph::new())
    }

    /// Finishes a frame. Blocks until every issued call completes, and returns
    /// the counters of the frame.
    pub fn advance(&mut self) -> Result<FrameInfo> {
        unsafe {
            self.visitor.flush()?;
        }

        Ok(mem::replace(&mut self.info, FrameInfo::default()))
    }
}

impl Context {
    /// Creates a buffer holding a copy of `data`. The element type of the
    /// buffer is the one of `data`.
    pub fn create_buffer<'a, T>(
        &mut self,
        target: BufferTarget,
        data: T,
        usage: BufferUsage,
    ) -> Result<BufferHandle>
    where
        T: Into<BufferData<'a>>,
    {
        let data = data.into();
        let params = BufferParams {
            target,
            usage,
            element: data.element_type(),
            len: data.len(),
        };

        if target == BufferTarget::Index && params.element != ElementType::U16 {
            return Err(Error::InvalidData {
                resource: "index buffer".into(),
                reason: format!("expects U16 indices, got {:?}", params.element),
            });
        }

        params.validate(&data)?;

        let id = unsafe { self.visitor.create_buffer(target, usage, &data.to_bytes())? };
        let handle = self.buffers.create(BufferObject { id, params });

        debug!("Created {} with {:?}.", handle, params);
        self.record(handle.into());
        Ok(handle)
    }

    /// Creates a 2D texture. Without `data` the storage is left uninitialized,
    /// which is meant for render targets.
    pub fn create_texture_2d<'a>(
        &mut self,
        data: Option<TextureData<'a>>,
        params: TextureParams,
    ) -> Result<TextureHandle> {
        let bytes = match data {
            Some(ref data) => {
                params.validate(data)?;
                Some(data.to_bytes())
            }
            None => {
                if params.dimensions.0 == 0 || params.dimensions.1 == 0 {
                    return Err(Error::InvalidData {
                        resource: "texture".into(),
                        reason: "textures can not have zero dimensions".into(),
                    });
                }

                None
            }
        };

        let id = unsafe {
            self.visitor
                .create_texture(&params, bytes.as_ref().map(|v| v.as_slice()))?
        };

        // Creation binds the texture to the active unit.
        self.applied.invalidate_textures();

        let handle = self.textures.create(TextureObject { id, params });
        debug!("Created {} with {:?}.", handle, params);
        self.record(handle.into());
        Ok(handle)
    }

    /// Creates a framebuffer rendering into the attached textures.
    pub fn create_framebuffer(&mut self, params: FramebufferParams) -> Result<FramebufferHandle> {
        let limit = self.capabilities().max_color_attachments;
        if params.colors.len() as u32 > limit {
            return Err(Error::TooManyColorAttachments(limit));
        }

        let mut dimensions = None;
        let mut colors = Vec::with_capacity(params.colors.len());
        for &texture in &params.colors {
            let obj = self.texture(texture)?;
            if !obj.params.format.is_color() {
                return Err(Error::FramebufferIncomplete(format!(
                    "color attachment {} has the depth format {:?}",
                    texture, obj.params.format
                )));
            }

            check_dimensions(&mut dimensions, obj.params.dimensions)?;
            colors.push(obj.id);
        }

        let depth = match params.depth {
            Some(texture) => {
                let obj = self.texture(texture)?;
                if !obj.params.format.is_depth() {
                    return Err(Error::FramebufferIncomplete(format!(
                        "depth attachment {} has the color format {:?}",
                        texture, obj.params.format
                    )));
                }

                check_dimensions(&mut dimensions, obj.params.dimensions)?;
                Some(obj.id)
            }
            None => None,
        };

        if dimensions.is_none() {
            return Err(Error::FramebufferIncomplete(
                "no images are attached to the framebuffer".into(),
            ));
        }

        let id = unsafe { self.visitor.create_framebuffer(&colors, depth)? };

        // Creation changes the framebuffer binding.
        self.applied.framebuffer = None;

        let handle = self.framebuffers.create(FramebufferObject { id });
        debug!("Created {} with {:?}.", handle, dimensions);
        self.record(handle.into());
        Ok(handle)
    }

    /// Compiles and links a program, binding `attributes[i]` to location `i`.
    pub fn create_program<T: AsRef<str>>(
        &mut self,
        vs: &str,
        fs: &str,
        attributes: &[T],
    ) -> Result<ProgramHandle> {
        let bindings: Vec<(u32, &str)> = attributes
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u32, v.as_ref()))
            .collect();

        self.build_program(vs, fs, &bindings)
    }

    /// Relinks a program from new sources. The program is left untouched if
    /// anything fails.
    pub fn update_program<T: AsRef<str>>(
        &mut self,
        handle: ProgramHandle,
        vs: &str,
        fs: &str,
        attributes: &[T],
    ) -> Result<()> {
        if !self.programs.is_alive(handle) {
            return Err(Error::ProgramHandleInvalid(handle));
        }

        let bindings: Vec<(u32, &str)> = attributes
            .iter()
            .enumerate()
            .map(|(i, v)| (i as u32, v.as_ref()))
            .collect();

        let program = unsafe { Program::build(&mut *self.visitor, vs, fs, &bindings)? };
        let prev = match self.programs.get_mut(handle) {
            Some(v) => mem::replace(v, program),
            None => return Err(Error::ProgramHandleInvalid(handle)),
        };

        unsafe {
            self.visitor.delete_program(prev.id)?;
        }

        self.applied.evict(handle.into());
        debug!("Relinked {}.", handle);
        Ok(())
    }

    /// Re-uploads the whole contents of `resource`.
    pub fn update(&mut self, resource: Resource, data: ResourceData) -> Result<()> {
        match (resource, data) {
            (Resource::Buffer(h), ResourceData::Buffer(data)) => self.update_buffer(h, data),
            (Resource::Texture(h), ResourceData::Texture(data)) => self.update_texture(h, data),
            (resource, ResourceData::Buffer(_)) => Err(Error::InvalidData {
                resource: format!("{}", resource),
                reason: "can not be updated with buffer data".into(),
            }),
            (resource, ResourceData::Texture(_)) => Err(Error::InvalidData {
                resource: format!("{}", resource),
                reason: "can not be updated with texture data".into(),
            }),
        }
    }

    pub fn update_buffer<'a, T>(&mut self, handle: BufferHandle, data: T) -> Result<()>
    where
        T: Into<BufferData<'a>>,
    {
        let data = data.into();
        let obj = self.buffer(handle)?;
        obj.params.validate(&data)?;

        unsafe {
            self.visitor.upload_buffer(
                obj.id,
                obj.params.target,
                obj.params.usage,
                &data.to_bytes(),
            )?;
        }

        if let Some(obj) = self.buffers.get_mut(handle) {
            obj.params.len = data.len();
        }

        Ok(())
    }

    /// Overwrites the elements of a buffer starting at the element `offset`.
    pub fn update_buffer_range<'a, T>(
        &mut self,
        handle: BufferHandle,
        offset: usize,
        data: T,
    ) -> Result<()>
    where
        T: Into<BufferData<'a>>,
    {
        let data = data.into();
        let obj = self.buffer(handle)?;
        obj.params.validate(&data)?;

        match offset.checked_add(data.len()) {
            Some(end) if end <= obj.params.len => {}
            _ => return Err(Error::OutOfBounds),
        }

        unsafe {
            self.visitor.update_buffer(
                obj.id,
                obj.params.target,
                offset * obj.params.element.size(),
                &data.to_bytes(),
            )
        }
    }

    pub fn update_texture(&mut self, handle: TextureHandle, data: TextureData) -> Result<()> {
        let obj = self.texture(handle)?;
        obj.params.validate(&data)?;

        unsafe {
            self.visitor
                .update_texture(obj.id, &obj.params, &data.to_bytes())?;
        }

        self.applied.invalidate_textures();
        Ok(())
    }

    /// Deletes a resource. Commands referring to it fail when submitted.
    pub fn delete<T: Into<Resource>>(&mut self, resource: T) -> Result<()> {
        let resource = resource.into();
        match resource {
            Resource::Buffer(h) => {
                let obj = self.buffers.free(h).ok_or(Error::BufferHandleInvalid(h))?;
                unsafe { self.visitor.delete_buffer(obj.id)? };
            }
            Resource::Texture(h) => {
                let obj = self.textures.free(h).ok_or(Error::TextureHandleInvalid(h))?;
                unsafe { self.visitor.delete_texture(obj.id)? };
            }
            Resource::Framebuffer(h) => {
                let obj = self
                    .framebuffers
                    .free(h)
                    .ok_or(Error::FramebufferHandleInvalid(h))?;
                unsafe { self.visitor.delete_framebuffer(obj.id)? };
            }
            Resource::Program(h) => {
                let obj = self.programs.free(h).ok_or(Error::ProgramHandleInvalid(h))?;
                unsafe { self.visitor.delete_program(obj.id)? };
            }
        }

        self.applied.evict(resource);
        debug!("Deleted {}.", resource);
        Ok(())
    }

    /// Sets a uniform of `program` right away, binding the program if needed.
    pub fn set_uniform<T1, T2>(&mut self, program: ProgramHandle, name: T1, value: T2) -> Result<()>
    where
        T1: AsRef<str>,
        T2: Into<UniformValue>,
    {
        let writes = self
            .programs
            .get(program)
            .ok_or(Error::ProgramHandleInvalid(program))?
            .resolve(name.as_ref(), &value.into())?;

        self.bind_program(program)?;

        let mut unit = 0;
        self.write_uniforms(writes, &mut unit)
    }
}

impl Context {
    /// Validates `desc` and builds a command out of it. Shader sources are
    /// compiled right away.
    pub fn command(&mut self, desc: CommandDescriptor) -> Result<Command> {
        desc.check()?;

        let CommandDescriptor {
            name,
            vert,
            frag,
            mut fields,
            ..
        } = desc;

        let sources = match (vert, frag) {
            (Some(vs), Some(fs)) => Some((vs, fs)),
            (Some(_), None) => return Err(Error::MissingShaderStage(ShaderStage::Fragment)),
            (None, Some(_)) => return Err(Error::MissingShaderStage(ShaderStage::Vertex)),
            (None, None) => None,
        };

        if sources.is_some() {
            if fields.program.is_some() {
                return Err(Error::InvalidCommandField {
                    key: "program".into(),
                    expected: "no program handle alongside shader sources",
                });
            }

            if fields.vertex_layout.is_none() && fields.attributes.is_none() {
                return Err(Error::MissingVertexLayout);
            }
        }

        self.validate(&fields)?;

        if let Some((vs, fs)) = sources {
            let bindings = bindings(&fields)?;
            let program = self.build_program(&vs, &fs, &bindings)?;

            let layout = match fields.vertex_layout {
                Some(_) => None,
                None => match self.derive_layout(program, &bindings) {
                    Ok(layout) => Some(layout),
                    Err(err) => {
                        self.delete(program)?;
                        return Err(err);
                    }
                },
            };

            if layout.is_some() {
                fields.vertex_layout = layout;
            }

            fields.program = Some(program);
        }

        self.commands += 1;
        let cmd = Command {
            id: CommandId(self.commands),
            name,
            fields,
        };

        debug!("Built command {} {:?}.", cmd.id, cmd.name);
        Ok(cmd)
    }

    /// Submits a command without children.
    pub fn submit(&mut self, cmd: &Command) -> Result<()> {
        self.dispatch::<NoSub>(cmd, Overrides::None, None)
    }

    /// Submits a command, and runs `sub` with the command's state inherited
    /// by everything it submits.
    pub fn submit_with<F>(&mut self, cmd: &Command, mut sub: F) -> Result<()>
    where
        F: FnMut(&mut Context) -> Result<()>,
    {
        self.dispatch(cmd, Overrides::None, Some(&mut sub))
    }

    pub fn submit_override(&mut self, cmd: &Command, over: &Override) -> Result<()> {
        self.dispatch::<NoSub>(cmd, Overrides::One(over), None)
    }

    pub fn submit_override_with<F>(&mut self, cmd: &Command, over: &Override, mut sub: F) -> Result<()>
    where
        F: FnMut(&mut Context) -> Result<()>,
    {
        self.dispatch(cmd, Overrides::One(over), Some(&mut sub))
    }

    /// Submits `cmd` once per batch, each time merged with the batch.
    pub fn submit_batches(&mut self, cmd: &Command, batches: &[Override]) -> Result<()> {
        self.dispatch::<NoSub>(cmd, Overrides::Batches(batches), None)
    }

    pub fn submit_batches_with<F>(
        &mut self,
        cmd: &Command,
        batches: &[Override],
        mut sub: F,
    ) -> Result<()>
    where
        F: FnMut(&mut Context) -> Result<()>,
    {
        self.dispatch(cmd, Overrides::Batches(batches), Some(&mut sub))
    }

    /// The single entry point of every submission.
    pub fn dispatch<F>(
        &mut self,
        cmd: &Command,
        overrides: Overrides,
        mut sub: Option<&mut F>,
    ) -> Result<()>
    where
        F: FnMut(&mut Context) -> Result<()>,
    {
        match overrides {
            Overrides::None => self.execute(cmd, sub),
            Overrides::One(over) => {
                self.validate_override(over)?;
                self.execute(&cmd.with_override(over), sub)
            }
            Overrides::Batches(batches) => {
                for over in batches {
                    self.validate_override(over)?;
                }

                for over in batches {
                    let sub = sub.as_mut().map(|f| &mut **f);
                    self.execute(&cmd.with_override(over), sub)?;
                }

                Ok(())
            }
        }
    }
}

impl Context {
    fn execute<F>(&mut self, cmd: &Command, sub: Option<&mut F>) -> Result<()>
    where
        F: FnMut(&mut Context) -> Result<()>,
    {
        let frame = self.top().merge(&cmd.fields);

        if self.debug {
            self.graph.begin(cmd);
        }

        let result = self.execute_in(cmd, frame, sub);

        if self.debug {
            self.graph.end();
        }

        result
    }

    fn execute_in<F>(&mut self, cmd: &Command, frame: Frame, sub: Option<&mut F>) -> Result<()>
    where
        F: FnMut(&mut Context) -> Result<()>,
    {
        trace!("Submit {} with {:?}.", cmd.id, frame);
        let fields = &cmd.fields;

        self.apply_target(&frame)?;

        if fields.clear_color.is_some() || fields.clear_depth.is_some() {
            unsafe {
                self.visitor.clear(fields.clear_color, fields.clear_depth)?;
            }

            self.info.clears += 1;
        }

        self.apply_pipeline(&frame)?;

        if let Some(program) = frame.program {
            self.upload_uniforms(program, &frame.uniforms, &fields.uniforms)?;
        }

        if fields.draws() {
            self.draw(cmd, &frame)?;
        }

        if let Some(sub) = sub {
            self.stack.push(frame);
            let result = (*sub)(self);
            self.stack.pop();
            result?;

            let parent = self.top().clone();
            self.apply_target(&parent)?;
            self.apply_pipeline(&parent)?;
        }

        Ok(())
    }

    fn top(&self) -> &Frame {
        self.stack.last().unwrap_or(&self.root)
    }

    fn apply_target(&mut self, frame: &Frame) -> Result<()> {
        if self.applied.framebuffer != Some(frame.framebuffer) {
            let id = match frame.framebuffer {
                RenderTarget::Backbuffer => None,
                RenderTarget::Framebuffer(h) => Some(
                    self.framebuffers
                        .get(h)
                        .ok_or(Error::FramebufferHandleInvalid(h))?
                        .id,
                ),
            };

            unsafe { self.visitor.bind_framebuffer(id)? };
            self.applied.framebuffer = Some(frame.framebuffer);
            self.info.state_changes += 1;
        }

        if self.applied.viewport != Some(frame.viewport) {
            unsafe { self.visitor.set_viewport(frame.viewport)? };
            self.applied.viewport = Some(frame.viewport);
            self.info.state_changes += 1;
        }

        Ok(())
    }

    fn apply_pipeline(&mut self, frame: &Frame) -> Result<()> {
        if self.applied.depth_enable != Some(frame.depth_enable) {
            unsafe { self.visitor.set_depth_test(frame.depth_enable)? };
            self.applied.depth_enable = Some(frame.depth_enable);
            self.info.state_changes += 1;
        }

        if self.applied.blend != Some(frame.blend) {
            unsafe { self.visitor.set_blend(frame.blend)? };
            self.applied.blend = Some(frame.blend);
            self.info.state_changes += 1;
        }

        if let Some(program) = frame.program {
            self.bind_program(program)?;
        }

        Ok(())
    }

    fn bind_program(&mut self, handle: ProgramHandle) -> Result<()> {
        if self.applied.program != Some(handle) {
            let id = self
                .programs
                .get(handle)
                .ok_or(Error::ProgramHandleInvalid(handle))?
                .id;

            unsafe { self.visitor.use_program(id)? };
            self.applied.program = Some(handle);
            self.info.state_changes += 1;
        }

        Ok(())
    }

    /// Uniforms of the command itself must exist in the program. Inherited
    /// ones are skipped unless the program declares them.
    fn upload_uniforms(
        &mut self,
        handle: ProgramHandle,
        merged: &Uniforms,
        own: &Uniforms,
    ) -> Result<()> {
        let mut writes = Vec::new();
        {
            let program = self
                .programs
                .get(handle)
                .ok_or(Error::ProgramHandleInvalid(handle))?;

            for (name, value) in merged.iter() {
                if !own.contains(name) && !program.declares(name) {
                    continue;
                }

                writes.extend(program.resolve(name, value)?);
            }
        }

        let mut unit = 0;
        self.write_uniforms(writes, &mut unit)
    }

    fn write_uniforms(&mut self, writes: Vec<UniformWrite>, unit: &mut u32) -> Result<()> {
        for write in writes {
            match write {
                UniformWrite::Data(location, data) => unsafe {
                    self.visitor.set_uniform(location, &data)?;
                },
                UniformWrite::Texture(location, texture) => {
                    if *unit >= self.max_texture_units {
                        return Err(Error::TooManyTextureUnits(self.max_texture_units));
                    }

                    let id = self.texture(texture)?.id;
                    if self.applied.texture(*unit as usize) != Some(texture) {
                        unsafe { self.visitor.bind_texture(*unit, id)? };
                        self.applied.set_texture(*unit as usize, texture);
                        self.info.state_changes += 1;
                    }

                    unsafe {
                        self.visitor
                            .set_uniform(location, &UniformData::I32(*unit as i32))?;
                    }

                    *unit += 1;
                }
            }
        }

        Ok(())
    }

    fn draw(&mut self, cmd: &Command, frame: &Frame) -> Result<()> {
        if frame.program.is_none() {
            return Err(Error::NoActiveProgram(cmd.id));
        }

        let fields = &cmd.fields;
        let (attributes, elements) = match (&fields.attributes, &fields.elements) {
            (Some(attributes), Some(elements)) => (attributes, elements),
            (None, _) => {
                return Err(Error::IncompleteDraw {
                    id: cmd.id,
                    missing: "attributes",
                })
            }
            (_, None) => {
                return Err(Error::IncompleteDraw {
                    id: cmd.id,
                    missing: "elements",
                })
            }
        };

        let layout = frame
            .vertex_layout
            .as_ref()
            .ok_or(Error::MissingVertexLayout)?;

        self.bind_vertex_data(layout, attributes, elements)
    }

    fn bind_vertex_data(
        &mut self,
        layout: &VertexLayout,
        attributes: &VertexAttributes,
        elements: &Elements,
    ) -> Result<()> {
        for (i, entry) in layout.iter().enumerate() {
            let attribute = attributes
                .resolve(i, &entry.name)
                .ok_or_else(|| Error::MissingVertexData(entry.name.clone()))?;

            let obj = self.buffer(attribute.buffer)?;
            let pointer = AttributePointer {
                size: entry.size,
                element: obj.params.element,
                normalized: attribute.normalized,
                stride: attribute.stride,
                offset: attribute.offset,
            };

            unsafe {
                self.visitor.bind_buffer(BufferTarget::Vertex, obj.id)?;
                self.visitor.vertex_attribute(entry.location, pointer)?;
            }
        }

        let obj = self.buffer(elements.buffer)?;
        let offset = elements.offset as usize;
        let count = match elements.count {
            Some(count) => count as usize,
            None => obj.params.len.saturating_sub(offset),
        };

        if offset + count > obj.params.len {
            return Err(Error::OutOfBounds);
        }

        unsafe {
            self.visitor.bind_buffer(BufferTarget::Index, obj.id)?;
            self.visitor.draw_elements(
                count as u32,
                IndexFormat::U16,
                offset * ElementType::U16.size(),
            )?;
        }

        self.info.drawcalls += 1;
        Ok(())
    }
}

impl Context {
    fn buffer(&self, handle: BufferHandle) -> Result<BufferObject> {
        self.buffers
            .get(handle)
            .cloned()
            .ok_or(Error::BufferHandleInvalid(handle))
    }

    fn texture(&self, handle: TextureHandle) -> Result<TextureObject> {
        self.textures
            .get(handle)
            .cloned()
            .ok_or(Error::TextureHandleInvalid(handle))
    }

    fn build_program(
        &mut self,
        vs: &str,
        fs: &str,
        bindings: &[(u32, &str)],
    ) -> Result<ProgramHandle> {
        let program = unsafe { Program::build(&mut *self.visitor, vs, fs, bindings)? };
        let handle = self.programs.create(program);
        debug!("Created {}.", handle);
        self.record(handle.into());
        Ok(handle)
    }

    /// Lays out the attributes a program was linked with, sizing each one by
    /// the type the program declares for it.
    fn derive_layout(
        &self,
        program: ProgramHandle,
        bindings: &[(u32, &str)],
    ) -> Result<VertexLayout> {
        let program = self
            .programs
            .get(program)
            .ok_or(Error::ProgramHandleInvalid(program))?;

        let mut builder = VertexLayout::build();
        for &(location, name) in bindings {
            let size = program
                .attribute(name)
                .and_then(|v| UniformType::from_code(v.code))
                .and_then(|v| v.components())
                .ok_or_else(|| Error::MalformedAttribute {
                    name: name.to_owned(),
                    reason: "its type has no vertex layout size".into(),
                })?;

            builder = builder.with(name, location, size);
        }

        let layout = builder.finish();
        layout.validate()?;
        Ok(layout)
    }

    fn record(&mut self, resource: Resource) {
        if self.debug {
            self.graph.resource(resource);
        }
    }

    fn validate_override(&self, over: &Override) -> Result<()> {
        over.check()?;
        self.validate(&over.fields)
    }

    /// Checks the fields of a command or an override before anything is
    /// created or submitted.
    fn validate(&self, fields: &Fields) -> Result<()> {
        if let Some(ref layout) = fields.vertex_layout {
            layout.validate()?;
        }

        if let Some(ref attributes) = fields.attributes {
            for (i, (name, attribute)) in attributes.iter().enumerate() {
                let name = match name {
                    Some("") => {
                        return Err(Error::MalformedAttribute {
                            name: format!("#{}", i),
                            reason: "the name is empty".into(),
                        })
                    }
                    Some(name) => name.to_owned(),
                    None => format!("#{}", i),
                };

                let obj = self.buffer(attribute.buffer)?;
                if obj.params.target != BufferTarget::Vertex {
                    return Err(Error::MalformedAttribute {
                        name,
                        reason: format!("{} is not a vertex buffer", attribute.buffer),
                    });
                }
            }
        }

        if let Some(ref elements) = fields.elements {
            let obj = self.buffer(elements.buffer)?;
            if obj.params.target != BufferTarget::Index {
                return Err(Error::InvalidCommandField {
                    key: "elements".into(),
                    expected: "an index buffer of U16 indices",
                });
            }
        }

        if let Some(program) = fields.program {
            if !self.programs.is_alive(program) {
                return Err(Error::ProgramHandleInvalid(program));
            }
        }

        if let Some(RenderTarget::Framebuffer(fb)) = fields.framebuffer {
            if !self.framebuffers.is_alive(fb) {
                return Err(Error::FramebufferHandleInvalid(fb));
            }
        }

        for (_, value) in fields.uniforms.iter() {
            for texture in value.textures() {
                self.texture(texture)?;
            }
        }

        Ok(())
    }
}

/// The attribute locations of a program compiled for a command: the ones of
/// its vertex layout, else the positions of its named attributes.
fn bindings(fields: &Fields) -> Result<Vec<(u32, &str)>> {
    if let Some(ref layout) = fields.vertex_layout {
        return Ok(layout
            .iter()
            .map(|e| (e.location, e.name.as_str()))
            .collect());
    }

    match fields.attributes.as_ref().and_then(|v| v.names()) {
        Some(names) => Ok(names
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as u32, v))
            .collect()),
        None => Err(Error::MissingVertexLayout),
    }
}

fn check_dimensions(dimensions: &mut Option<(u32, u32)>, rhs: (u32, u32)) -> Result<()> {
    match *dimensions {
        Some(v) if v != rhs => Err(Error::FramebufferIncomplete(format!(
            "attachments have different dimensions {:?} and {:?}",
            v, rhs
        ))),
        _ => {
            *dimensions = Some(rhs);
            Ok(())
        }
    }
}
