//! A visitor issuing calls into a current OpenGL context through the `gl` crate.

pub mod capabilities;
pub mod types;
pub mod visitor;

pub use self::visitor::GLVisitor;
