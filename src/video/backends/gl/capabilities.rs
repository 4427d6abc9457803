use std::ffi;

use gl;
use gl::types::*;

use super::super::capabilities::{Capabilities, Version};
use crate::video::errors::*;

/// Obtains the capabilities of the current context using the loaded functions.
///
/// # Unsafe
///
/// You must ensure that the functions belong to the current context, otherwise you will get
/// an undefined behavior.
pub unsafe fn parse() -> Result<Capabilities> {
    let version = parse_version()?;
    let extensions = parse_extensions(version)?;

    Ok(Capabilities {
        version,
        renderer: parse_str(gl::RENDERER)?,
        max_texture_units: parse_integer(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, 2),
        max_color_attachments: parse_color_attachments(version, &extensions),
        max_vertex_attributes: parse_integer(gl::MAX_VERTEX_ATTRIBS, 8),
        extensions,
    })
}

/// Checks that the context supports everything the visitor relies on.
pub fn check(caps: &Capabilities) -> Result<()> {
    if caps.version < Version::GL(2, 0) && caps.version < Version::ES(2, 0) {
        return Err(Error::Backend(
            "The OpenGL implementation does not supports shader objects.".into(),
        ));
    }

    if caps.version < Version::GL(3, 0)
        && caps.version < Version::ES(2, 0)
        && !caps.has_extension("GL_EXT_framebuffer_object")
        && !caps.has_extension("GL_ARB_framebuffer_object")
    {
        return Err(Error::Backend(
            "The OpenGL implementation does not supports framebuffer objects.".into(),
        ));
    }

    Ok(())
}

unsafe fn parse_version() -> Result<Version> {
    let desc = parse_str(gl::VERSION)?;

    let (es, desc) = if desc.starts_with("OpenGL ES-") {
        (true, &desc[13..])
    } else if desc.starts_with("OpenGL ES ") {
        (true, &desc[10..])
    } else {
        (false, &desc[..])
    };

    let malformed = || Error::Backend(format!("[GL] Version string {:?} is malformed.", desc));
    let desc = desc.split(' ').next().ok_or_else(malformed)?;

    let mut iter = desc.split('.');
    let major = iter
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(malformed)?;
    let minor = iter
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(malformed)?;

    if es {
        Ok(Version::ES(major, minor))
    } else {
        Ok(Version::GL(major, minor))
    }
}

unsafe fn parse_extensions(version: Version) -> Result<Vec<String>> {
    if version >= Version::GL(3, 0) || version >= Version::ES(3, 0) {
        let mut num = 0;
        gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut num);

        let mut extensions = Vec::with_capacity(num as usize);
        for i in 0..num {
            let ext = gl::GetStringi(gl::EXTENSIONS, i as GLuint);
            if !ext.is_null() {
                let ext = ffi::CStr::from_ptr(ext as *const _);
                extensions.push(ext.to_string_lossy().into_owned());
            }
        }

        Ok(extensions)
    } else {
        Ok(parse_str(gl::EXTENSIONS)?
            .split(' ')
            .filter(|v| !v.is_empty())
            .map(|v| v.to_owned())
            .collect())
    }
}

unsafe fn parse_str(id: GLenum) -> Result<String> {
    let s = gl::GetString(id);
    if s.is_null() {
        return Err(Error::Backend(format!("[GL] String of {} is null.", id)));
    }

    String::from_utf8(ffi::CStr::from_ptr(s as *const _).to_bytes().to_vec())
        .map_err(|_| Error::Backend(format!("[GL] String of {} is unformaled.", id)))
}

unsafe fn parse_integer(id: GLenum, fallback: GLint) -> u32 {
    let mut val = fallback;
    gl::GetIntegerv(id, &mut val);
    val.max(0) as u32
}

unsafe fn parse_color_attachments(version: Version, extensions: &[String]) -> u32 {
    let has = |name: &str| extensions.iter().any(|v| v == name);

    if version >= Version::GL(3, 0)
        || version >= Version::ES(3, 0)
        || has("GL_ARB_framebuffer_object")
        || has("GL_EXT_framebuffer_object")
        || has("GL_NV_fbo_color_attachments")
    {
        parse_integer(gl::MAX_COLOR_ATTACHMENTS, 4)
    } else if version >= Version::ES(2, 0) {
        1
    } else {
        0
    }
}
