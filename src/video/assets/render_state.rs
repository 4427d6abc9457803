//! Fixed-function pipeline state carried by commands.

use serde::{Deserialize, Serialize};

/// The viewport relative to the bottom-left corner of the render target, in
/// pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Viewport {
            x,
            y,
            width,
            height,
        }
    }

    /// A viewport covering a whole target of `dimensions`.
    pub fn full(dimensions: (u32, u32)) -> Self {
        Viewport::new(0, 0, dimensions.0, dimensions.1)
    }
}

/// Specify how incoming RGBA values (source) and the RGBA in framebuffer
/// (destination) are combined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Equation {
    /// Adds source and destination. Source and destination are multiplied
    /// by blending parameters before addition.
    Add,
    /// Subtracts destination from source. Source and destination are
    /// multiplied by blending parameters before subtraction.
    Subtract,
    /// Subtracts source from destination. Source and destination are
    /// multiplied by blending parameters before subtraction.
    ReverseSubtract,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendValue {
    SourceColor,
    SourceAlpha,
    DestinationColor,
    DestinationAlpha,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    Value(BlendValue),
    OneMinusValue(BlendValue),
}

/// Color blending of a command.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Blend {
    Disabled,
    Enabled {
        equation: Equation,
        src: BlendFactor,
        dst: BlendFactor,
    },
}

impl Default for Blend {
    fn default() -> Self {
        Blend::Disabled
    }
}

impl Blend {
    /// The common `src * alpha + dst * (1 - alpha)` blending.
    pub fn alpha() -> Self {
        Blend::Enabled {
            equation: Equation::Add,
            src: BlendFactor::Value(BlendValue::SourceAlpha),
            dst: BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
        }
    }
}

impl From<bool> for Blend {
    fn from(enable: bool) -> Self {
        if enable {
            Blend::alpha()
        } else {
            Blend::Disabled
        }
    }
}
