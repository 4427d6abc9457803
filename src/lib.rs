//! # Pastel
//!
//! A thin declarative command layer over immediate-mode GL.
//!
//! Resources (buffers, textures, framebuffers and programs) are created once
//! through a `Context`. Rendering is described as validated `Command`s which
//! are submitted against the context; the context keeps a stack of inherited
//! state, merges every command with the top of that stack, and only issues
//! the graphics calls whose values differ from what is currently bound.
//!
//! ```rust,ignore
//! let draw = ctx.command(
//!     CommandDescriptor::new()
//!         .vert(VERT)
//!         .frag(FRAG)
//!         .vertex_layout(VertexLayout::build().with("aPosition", 0, 2).finish())
//!         .attributes(VertexAttributes::new().with("aPosition", positions))
//!         .elements(Elements::new(indices))
//!         .uniform("uColor", [1.0, 0.0, 0.0, 1.0]),
//! )?;
//!
//! ctx.submit_with(&pass, |ctx| ctx.submit(&draw))?;
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate byteorder;
extern crate cgmath;
extern crate gl;
extern crate serde;
extern crate serde_json;
extern crate smallvec;

#[macro_use]
pub mod utils;
pub mod video;

pub mod prelude;
