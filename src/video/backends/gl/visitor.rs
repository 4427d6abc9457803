use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;

use gl;
use gl::types::*;

use super::super::capabilities::Version;
use super::super::{Capabilities, IndexFormat, NativeId, Visitor};
use super::capabilities;
use super::types;
use crate::utils::Color;
use crate::video::assets::prelude::*;
use crate::video::errors::*;
use crate::video::layout::AttributePointer;
use crate::video::uniform::UniformData;

pub struct GLVisitor {
    capabilities: Capabilities,
    vao: GLuint,
}

impl GLVisitor {
    /// Creates a visitor over the current context, whose functions must have
    /// been loaded with `gl::load_with`.
    pub unsafe fn new() -> Result<Self> {
        let capabilities = capabilities::parse()?;
        info!("GLVisitor {:#?}", capabilities);
        capabilities::check(&capabilities)?;

        // Core profiles refuse vertex attribute calls without a bound vertex
        // array object.
        let mut vao = 0;
        if capabilities.version >= Version::GL(3, 0) || capabilities.version >= Version::ES(3, 0)
        {
            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);
        }

        Self::reset_render_state()?;
        Ok(GLVisitor { capabilities, vao })
    }

    /// Loads the GL functions with `loader` before creating the visitor.
    pub unsafe fn with_loader<F>(loader: F) -> Result<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Self::new()
    }

    unsafe fn reset_render_state() -> Result<()> {
        gl::Disable(gl::CULL_FACE);
        gl::Disable(gl::DEPTH_TEST);
        gl::DepthMask(gl::TRUE);
        gl::DepthFunc(gl::LESS);
        gl::Disable(gl::BLEND);
        gl::ColorMask(1, 1, 1, 1);
        gl::Disable(gl::SCISSOR_TEST);
        gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        check()
    }
}

impl Drop for GLVisitor {
    fn drop(&mut self) {
        if self.vao != 0 {
            unsafe {
                gl::DeleteVertexArrays(1, &self.vao);
            }
        }
    }
}

impl Visitor for GLVisitor {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    unsafe fn create_buffer(
        &mut self,
        target: BufferTarget,
        usage: BufferUsage,
        bytes: &[u8],
    ) -> Result<NativeId> {
        let mut id = 0;
        gl::GenBuffers(1, &mut id);
        if id == 0 {
            return Err(Error::Backend("[GL] Failed to generate buffer.".into()));
        }

        self.upload_buffer(id, target, usage, bytes)?;
        Ok(id)
    }

    unsafe fn upload_buffer(
        &mut self,
        id: NativeId,
        target: BufferTarget,
        usage: BufferUsage,
        bytes: &[u8],
    ) -> Result<()> {
        let target: GLenum = target.into();
        gl::BindBuffer(target, id);

        let value = if bytes.is_empty() {
            ptr::null()
        } else {
            bytes.as_ptr() as *const c_void
        };

        gl::BufferData(target, bytes.len() as isize, value, usage.into());
        check()
    }

    unsafe fn update_buffer(
        &mut self,
        id: NativeId,
        target: BufferTarget,
        offset: usize,
        bytes: &[u8],
    ) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        let target: GLenum = target.into();
        gl::BindBuffer(target, id);
        gl::BufferSubData(
            target,
            offset as isize,
            bytes.len() as isize,
            bytes.as_ptr() as *const c_void,
        );
        check()
    }

    unsafe fn delete_buffer(&mut self, id: NativeId) -> Result<()> {
        gl::DeleteBuffers(1, &id);
        check()
    }

    unsafe fn create_texture(
        &mut self,
        params: &TextureParams,
        bytes: Option<&[u8]>,
    ) -> Result<NativeId> {
        let mut id = 0;
        gl::GenTextures(1, &mut id);
        if id == 0 {
            return Err(Error::Backend("[GL] Failed to generate texture.".into()));
        }

        gl::BindTexture(gl::TEXTURE_2D, id);

        let wrap: GLenum = params.wrap.into();
        let filter: GLenum = params.filter.into();
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter as GLint);

        let (internal_format, format, pixel_type) =
            types::texture_format(params.format, &self.capabilities);

        let value = match bytes {
            Some(v) if !v.is_empty() => v.as_ptr() as *const c_void,
            _ => ptr::null(),
        };

        gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            internal_format as GLint,
            params.dimensions.0 as GLsizei,
            params.dimensions.1 as GLsizei,
            0,
            format,
            pixel_type,
            value,
        );

        check()?;
        Ok(id)
    }

    unsafe fn update_texture(
        &mut self,
        id: NativeId,
        params: &TextureParams,
        bytes: &[u8],
    ) -> Result<()> {
        let (_, format, pixel_type) = types::texture_format(params.format, &self.capabilities);

        gl::BindTexture(gl::TEXTURE_2D, id);
        gl::TexSubImage2D(
            gl::TEXTURE_2D,
            0,
            0,
            0,
            params.dimensions.0 as GLsizei,
            params.dimensions.1 as GLsizei,
            format,
            pixel_type,
            bytes.as_ptr() as *const c_void,
        );

        check()
    }

    unsafe fn delete_texture(&mut self, id: NativeId) -> Result<()> {
        gl::DeleteTextures(1, &id);
        check()
    }

    unsafe fn create_framebuffer(
        &mut self,
        colors: &[NativeId],
        depth: Option<NativeId>,
    ) -> Result<NativeId> {
        let mut id = 0;
        gl::GenFramebuffers(1, &mut id);
        if id == 0 {
            return Err(Error::Backend("[GL] Failed to generate framebuffer.".into()));
        }

        gl::BindFramebuffer(gl::FRAMEBUFFER, id);

        let mut buffers = Vec::with_capacity(colors.len());
        for (i, texture) in colors.iter().enumerate() {
            let location = gl::COLOR_ATTACHMENT0 + i as u32;
            gl::FramebufferTexture2D(gl::FRAMEBUFFER, location, gl::TEXTURE_2D, *texture, 0);
            buffers.push(location);
        }

        if let Some(texture) = depth {
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::DEPTH_ATTACHMENT,
                gl::TEXTURE_2D,
                texture,
                0,
            );
        }

        if buffers.len() > 1 {
            gl::DrawBuffers(buffers.len() as GLsizei, buffers.as_ptr());
        }

        let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);

        let reason = match status {
            gl::FRAMEBUFFER_COMPLETE => None,
            gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => Some(
                "Not all framebuffer attachment points are framebuffer attachment complete.",
            ),
            gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => {
                Some("No images are attached to the framebuffer.")
            }
            gl::FRAMEBUFFER_UNSUPPORTED => Some(
                "The combination of internal formats of the attached images violates an \
                 implementation-dependent set of restrictions.",
            ),
            _ => Some("Unknown framebuffer status."),
        };

        if let Some(reason) = reason {
            gl::DeleteFramebuffers(1, &id);
            return Err(Error::FramebufferIncomplete(reason.into()));
        }

        check()?;
        Ok(id)
    }

    unsafe fn delete_framebuffer(&mut self, id: NativeId) -> Result<()> {
        gl::DeleteFramebuffers(1, &id);
        check()
    }

    unsafe fn compile_shader(&mut self, stage: ShaderStage, src: &str) -> Result<NativeId> {
        let c_str = CString::new(src.as_bytes()).map_err(|_| Error::ShaderCompile {
            stage,
            log: "shader source contains a nul byte".into(),
            source: src.to_owned(),
        })?;

        let shader = gl::CreateShader(stage.into());
        gl::ShaderSource(shader, 1, &c_str.as_ptr(), ptr::null());
        gl::CompileShader(shader);

        let mut status = GLint::from(gl::FALSE);
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);

        if status != GLint::from(gl::TRUE) {
            let mut len = 0;
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetShaderInfoLog(
                shader,
                len,
                ptr::null_mut(),
                buf.as_mut_ptr() as *mut GLchar,
            );
            gl::DeleteShader(shader);

            return Err(Error::ShaderCompile {
                stage,
                log: info_log(buf),
                source: src.to_owned(),
            });
        }

        Ok(shader)
    }

    unsafe fn delete_shader(&mut self, id: NativeId) -> Result<()> {
        gl::DeleteShader(id);
        check()
    }

    unsafe fn link_program(
        &mut self,
        shaders: &[NativeId],
        bindings: &[(u32, &str)],
    ) -> Result<NativeId> {
        let program = gl::CreateProgram();
        for shader in shaders {
            gl::AttachShader(program, *shader);
        }

        for &(location, name) in bindings {
            let c_name = CString::new(name.as_bytes())
                .map_err(|_| Error::AttributeUndefined(name.to_owned()))?;
            gl::BindAttribLocation(program, location, c_name.as_ptr());
        }

        gl::LinkProgram(program);

        let mut status = GLint::from(gl::FALSE);
        gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

        if status != GLint::from(gl::TRUE) {
            let mut len: GLint = 0;
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetProgramInfoLog(
                program,
                len,
                ptr::null_mut(),
                buf.as_mut_ptr() as *mut GLchar,
            );
            gl::DeleteProgram(program);

            return Err(Error::ProgramLink { log: info_log(buf) });
        }

        for shader in shaders {
            gl::DetachShader(program, *shader);
        }

        check()?;
        Ok(program)
    }

    unsafe fn active_uniforms(&mut self, program: NativeId) -> Result<Vec<ActiveVariable>> {
        let mut num = 0;
        let mut max_len = 0;
        gl::GetProgramiv(program, gl::ACTIVE_UNIFORMS, &mut num);
        gl::GetProgramiv(program, gl::ACTIVE_UNIFORM_MAX_LENGTH, &mut max_len);

        let mut variables = Vec::with_capacity(num as usize);
        for i in 0..num {
            let mut buf = vec![0u8; max_len.max(1) as usize];
            let mut len = 0;
            let mut size = 0;
            let mut tp = 0;

            gl::GetActiveUniform(
                program,
                i as GLuint,
                max_len,
                &mut len,
                &mut size,
                &mut tp,
                buf.as_mut_ptr() as *mut GLchar,
            );

            buf.truncate(len as usize);
            let name = String::from_utf8_lossy(&buf).into_owned();
            let location = match self.uniform_location(program, &name)? {
                Some(v) => v,
                None => continue,
            };

            variables.push(ActiveVariable {
                name,
                code: tp,
                size: size as u32,
                location,
            });
        }

        check()?;
        Ok(variables)
    }

    unsafe fn active_attributes(&mut self, program: NativeId) -> Result<Vec<ActiveVariable>> {
        let mut num = 0;
        let mut max_len = 0;
        gl::GetProgramiv(program, gl::ACTIVE_ATTRIBUTES, &mut num);
        gl::GetProgramiv(program, gl::ACTIVE_ATTRIBUTE_MAX_LENGTH, &mut max_len);

        let mut variables = Vec::with_capacity(num as usize);
        for i in 0..num {
            let mut buf = vec![0u8; max_len.max(1) as usize];
            let mut len = 0;
            let mut size = 0;
            let mut tp = 0;

            gl::GetActiveAttrib(
                program,
                i as GLuint,
                max_len,
                &mut len,
                &mut size,
                &mut tp,
                buf.as_mut_ptr() as *mut GLchar,
            );

            buf.truncate(len as usize);
            let name = String::from_utf8_lossy(&buf).into_owned();
            let c_name = CString::new(name.as_bytes())
                .map_err(|_| Error::AttributeUndefined(name.clone()))?;
            let location = gl::GetAttribLocation(program, c_name.as_ptr());

            variables.push(ActiveVariable {
                name,
                code: tp,
                size: size as u32,
                location,
            });
        }

        check()?;
        Ok(variables)
    }

    unsafe fn uniform_location(&mut self, program: NativeId, name: &str) -> Result<Option<i32>> {
        let c_name = match CString::new(name.as_bytes()) {
            Ok(v) => v,
            Err(_) => return Ok(None),
        };

        let location = gl::GetUniformLocation(program, c_name.as_ptr());
        check()?;

        if location < 0 {
            Ok(None)
        } else {
            Ok(Some(location))
        }
    }

    unsafe fn delete_program(&mut self, id: NativeId) -> Result<()> {
        gl::DeleteProgram(id);
        check()
    }

    unsafe fn bind_framebuffer(&mut self, id: Option<NativeId>) -> Result<()> {
        gl::BindFramebuffer(gl::FRAMEBUFFER, id.unwrap_or(0));
        check()
    }

    unsafe fn set_viewport(&mut self, vp: Viewport) -> Result<()> {
        gl::Viewport(vp.x, vp.y, vp.width as i32, vp.height as i32);
        check()
    }

    unsafe fn clear(&mut self, color: Option<Color>, depth: Option<f32>) -> Result<()> {
        let mut bits = 0;
        if let Some(v) = color {
            bits |= gl::COLOR_BUFFER_BIT;
            gl::ClearColor(v.0, v.1, v.2, v.3);
        }

        if let Some(v) = depth {
            bits |= gl::DEPTH_BUFFER_BIT;
            gl::ClearDepth(f64::from(v));
        }

        if bits != 0 {
            gl::Clear(bits);
            check()
        } else {
            Ok(())
        }
    }

    unsafe fn set_depth_test(&mut self, enable: bool) -> Result<()> {
        if enable {
            gl::Enable(gl::DEPTH_TEST);
        } else {
            gl::Disable(gl::DEPTH_TEST);
        }

        check()
    }

    unsafe fn set_blend(&mut self, blend: Blend) -> Result<()> {
        match blend {
            Blend::Enabled { equation, src, dst } => {
                gl::Enable(gl::BLEND);
                gl::BlendFunc(src.into(), dst.into());
                gl::BlendEquation(equation.into());
            }
            Blend::Disabled => gl::Disable(gl::BLEND),
        }

        check()
    }

    unsafe fn use_program(&mut self, id: NativeId) -> Result<()> {
        gl::UseProgram(id);
        check()
    }

    unsafe fn set_uniform(&mut self, location: i32, data: &UniformData) -> Result<()> {
        match *data {
            UniformData::I32(v) => gl::Uniform1i(location, v),
            UniformData::F32(v) => gl::Uniform1f(location, v),
            UniformData::Vector2i(v) => gl::Uniform2i(location, v[0], v[1]),
            UniformData::Vector3i(v) => gl::Uniform3i(location, v[0], v[1], v[2]),
            UniformData::Vector4i(v) => gl::Uniform4i(location, v[0], v[1], v[2], v[3]),
            UniformData::Vector2f(v) => gl::Uniform2f(location, v[0], v[1]),
            UniformData::Vector3f(v) => gl::Uniform3f(location, v[0], v[1], v[2]),
            UniformData::Vector4f(v) => gl::Uniform4f(location, v[0], v[1], v[2], v[3]),
            UniformData::Matrix2f(v) => gl::UniformMatrix2fv(location, 1, gl::FALSE, v.as_ptr()),
            UniformData::Matrix3f(v) => gl::UniformMatrix3fv(location, 1, gl::FALSE, v.as_ptr()),
            UniformData::Matrix4f(v) => gl::UniformMatrix4fv(location, 1, gl::FALSE, v.as_ptr()),
        }

        check()
    }

    unsafe fn bind_texture(&mut self, unit: u32, id: NativeId) -> Result<()> {
        gl::ActiveTexture(gl::TEXTURE0 + unit);
        gl::BindTexture(gl::TEXTURE_2D, id);
        check()
    }

    unsafe fn bind_buffer(&mut self, target: BufferTarget, id: NativeId) -> Result<()> {
        gl::BindBuffer(target.into(), id);
        check()
    }

    unsafe fn vertex_attribute(&mut self, location: u32, pointer: AttributePointer) -> Result<()> {
        gl::EnableVertexAttribArray(location);
        gl::VertexAttribPointer(
            location,
            GLint::from(pointer.size),
            pointer.element.into(),
            pointer.normalized as GLboolean,
            pointer.stride as GLsizei,
            pointer.offset as usize as *const c_void,
        );

        check()
    }

    unsafe fn draw_elements(
        &mut self,
        count: u32,
        format: IndexFormat,
        offset: usize,
    ) -> Result<()> {
        gl::DrawElements(
            gl::TRIANGLES,
            count as GLsizei,
            format.into(),
            offset as *const c_void,
        );

        check()
    }

    unsafe fn flush(&mut self) -> Result<()> {
        gl::Finish();
        check()
    }
}

fn info_log(mut buf: Vec<u8>) -> String {
    while buf.last() == Some(&0) {
        buf.pop();
    }

    String::from_utf8_lossy(&buf).into_owned()
}

unsafe fn check() -> Result<()> {
    let reason = match gl::GetError() {
        gl::NO_ERROR => return Ok(()),
        gl::INVALID_ENUM => "[GL] An unacceptable value is specified for an enumerated argument.",
        gl::INVALID_VALUE => "[GL] A numeric argument is out of range.",
        gl::INVALID_OPERATION => {
            "[GL] The specified operation is not allowed in the current state."
        }
        gl::INVALID_FRAMEBUFFER_OPERATION => {
            "[GL] The command is trying to render to or read from the framebuffer while the \
             currently bound framebuffer is not framebuffer complete."
        }
        gl::OUT_OF_MEMORY => "[GL] There is not enough memory left to execute the command.",
        _ => "[GL] Oops, Unknown OpenGL error.",
    };

    Err(Error::Backend(reason.into()))
}
