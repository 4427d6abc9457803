//! A declarative command layer over immediate-mode graphics APIs.
//!
//! # Resources
//!
//! Buffers, textures, framebuffers and programs are created through a
//! `Context` and addressed with typed handles afterwards. Every update is
//! validated before anything is uploaded, so a rejected update leaves the
//! previous contents untouched.
//!
//! # Commands
//!
//! A `Command` is built once from a `CommandDescriptor` and submitted every
//! frame. Submitting a command merges it with the state inherited from the
//! enclosing submissions; commands submitted from the closure of
//! `Context::submit_with` inherit the framebuffer, viewport, program, render
//! state, vertex layout and uniforms of their parent. Clear values are never
//! inherited.
//!
//! The context remembers what has been bound, and only issues the graphics
//! calls whose values differ.
//!
//! # Backends
//!
//! Calls are issued through a `Visitor`. `backends::gl::GLVisitor` talks to a
//! current OpenGL context, while `backends::headless::HeadlessVisitor` records
//! the calls for inspection.

pub mod assets;
pub mod backends;
pub mod command;
pub mod context;
pub mod debug;
pub mod errors;
pub mod layout;
pub mod params;
pub mod program;
pub mod state;
pub mod uniform;

pub mod prelude {
    pub use super::assets::prelude::*;
    pub use super::backends::headless::{Call, CallLog, HeadlessVisitor};
    pub use super::backends::{Capabilities, IndexFormat, NativeId, Visitor};
    pub use super::command::{Command, CommandDescriptor, CommandId, FieldValue, Key, Override};
    pub use super::context::{Context, FrameInfo, Overrides, ResourceData};
    pub use super::debug::Graph;
    pub use super::errors::{Error, Result};
    pub use super::layout::{Elements, VertexAttribute, VertexAttributes, VertexLayout};
    pub use super::params::ContextParams;
    pub use super::uniform::{UniformValue, Uniforms};
}

pub use self::context::Context;
pub use self::params::ContextParams;
