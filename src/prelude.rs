pub use crate::utils;
pub use crate::utils::Color;

pub use crate::video;
pub use crate::video::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
pub use crate::video::backends::gl::GLVisitor;
