//! Linked shader programs and the GLSL types they expose.

use std::fmt;

use serde::{Deserialize, Serialize};

impl_handle!(ProgramHandle);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// The type codes drivers report for active program variables.
pub mod codes {
    pub const FLOAT: u32 = 0x1406;
    pub const FLOAT_VEC2: u32 = 0x8B50;
    pub const FLOAT_VEC3: u32 = 0x8B51;
    pub const FLOAT_VEC4: u32 = 0x8B52;
    pub const INT: u32 = 0x1404;
    pub const INT_VEC2: u32 = 0x8B53;
    pub const INT_VEC3: u32 = 0x8B54;
    pub const INT_VEC4: u32 = 0x8B55;
    pub const BOOL: u32 = 0x8B56;
    pub const BOOL_VEC2: u32 = 0x8B57;
    pub const BOOL_VEC3: u32 = 0x8B58;
    pub const BOOL_VEC4: u32 = 0x8B59;
    pub const FLOAT_MAT2: u32 = 0x8B5A;
    pub const FLOAT_MAT3: u32 = 0x8B5B;
    pub const FLOAT_MAT4: u32 = 0x8B5C;
    pub const SAMPLER_2D: u32 = 0x8B5E;
    pub const SAMPLER_CUBE: u32 = 0x8B60;
    pub const SAMPLER_2D_SHADOW: u32 = 0x8B62;
}

/// The declared GLSL type of a uniform or attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Bool,
    BVec2,
    BVec3,
    BVec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    SamplerCube,
    Sampler2DShadow,
}

impl UniformType {
    /// Decodes a driver type code. Returns `None` for types without a setter.
    pub fn from_code(code: u32) -> Option<UniformType> {
        let tp = match code {
            codes::FLOAT => UniformType::Float,
            codes::FLOAT_VEC2 => UniformType::Vec2,
            codes::FLOAT_VEC3 => UniformType::Vec3,
            codes::FLOAT_VEC4 => UniformType::Vec4,
            codes::INT => UniformType::Int,
            codes::INT_VEC2 => UniformType::IVec2,
            codes::INT_VEC3 => UniformType::IVec3,
            codes::INT_VEC4 => UniformType::IVec4,
            codes::BOOL => UniformType::Bool,
            codes::BOOL_VEC2 => UniformType::BVec2,
            codes::BOOL_VEC3 => UniformType::BVec3,
            codes::BOOL_VEC4 => UniformType::BVec4,
            codes::FLOAT_MAT2 => UniformType::Mat2,
            codes::FLOAT_MAT3 => UniformType::Mat3,
            codes::FLOAT_MAT4 => UniformType::Mat4,
            codes::SAMPLER_2D => UniformType::Sampler2D,
            codes::SAMPLER_CUBE => UniformType::SamplerCube,
            codes::SAMPLER_2D_SHADOW => UniformType::Sampler2DShadow,
            _ => return None,
        };

        Some(tp)
    }

    pub fn code(self) -> u32 {
        match self {
            UniformType::Float => codes::FLOAT,
            UniformType::Vec2 => codes::FLOAT_VEC2,
            UniformType::Vec3 => codes::FLOAT_VEC3,
            UniformType::Vec4 => codes::FLOAT_VEC4,
            UniformType::Int => codes::INT,
            UniformType::IVec2 => codes::INT_VEC2,
            UniformType::IVec3 => codes::INT_VEC3,
            UniformType::IVec4 => codes::INT_VEC4,
            UniformType::Bool => codes::BOOL,
            UniformType::BVec2 => codes::BOOL_VEC2,
            UniformType::BVec3 => codes::BOOL_VEC3,
            UniformType::BVec4 => codes::BOOL_VEC4,
            UniformType::Mat2 => codes::FLOAT_MAT2,
            UniformType::Mat3 => codes::FLOAT_MAT3,
            UniformType::Mat4 => codes::FLOAT_MAT4,
            UniformType::Sampler2D => codes::SAMPLER_2D,
            UniformType::SamplerCube => codes::SAMPLER_CUBE,
            UniformType::Sampler2DShadow => codes::SAMPLER_2D_SHADOW,
        }
    }

    /// Component count of a scalar or vector type, as fed through one vertex
    /// attribute.
    pub fn components(self) -> Option<u8> {
        match self {
            UniformType::Float | UniformType::Int | UniformType::Bool => Some(1),
            UniformType::Vec2 | UniformType::IVec2 | UniformType::BVec2 => Some(2),
            UniformType::Vec3 | UniformType::IVec3 | UniformType::BVec3 => Some(3),
            UniformType::Vec4 | UniformType::IVec4 | UniformType::BVec4 => Some(4),
            _ => None,
        }
    }

    /// Parses a GLSL type keyword.
    pub fn from_glsl(keyword: &str) -> Option<UniformType> {
        let tp = match keyword {
            "float" => UniformType::Float,
            "vec2" => UniformType::Vec2,
            "vec3" => UniformType::Vec3,
            "vec4" => UniformType::Vec4,
            "int" => UniformType::Int,
            "ivec2" => UniformType::IVec2,
            "ivec3" => UniformType::IVec3,
            "ivec4" => UniformType::IVec4,
            "bool" => UniformType::Bool,
            "bvec2" => UniformType::BVec2,
            "bvec3" => UniformType::BVec3,
            "bvec4" => UniformType::BVec4,
            "mat2" => UniformType::Mat2,
            "mat3" => UniformType::Mat3,
            "mat4" => UniformType::Mat4,
            "sampler2D" => UniformType::Sampler2D,
            "samplerCube" => UniformType::SamplerCube,
            "sampler2DShadow" => UniformType::Sampler2DShadow,
            _ => return None,
        };

        Some(tp)
    }

    pub fn is_sampler(self) -> bool {
        match self {
            UniformType::Sampler2D | UniformType::SamplerCube | UniformType::Sampler2DShadow => {
                true
            }
            _ => false,
        }
    }
}

/// An active uniform or attribute as reported by the driver after linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveVariable {
    pub name: String,
    /// Driver type code, see `codes`.
    pub code: u32,
    /// Number of array elements, 1 for plain variables.
    pub size: u32,
    pub location: i32,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes() {
        for keyword in &["float", "vec3", "ivec4", "bool", "mat4", "sampler2D"] {
            let tp = UniformType::from_glsl(keyword).unwrap();
            assert_eq!(UniformType::from_code(tp.code()), Some(tp));
        }

        assert_eq!(UniformType::from_glsl("mat2x3"), None);
        assert_eq!(UniformType::from_code(0), None);
    }

    #[test]
    fn components() {
        assert_eq!(UniformType::Float.components(), Some(1));
        assert_eq!(UniformType::Vec3.components(), Some(3));
        assert_eq!(UniformType::IVec2.components(), Some(2));
        assert_eq!(UniformType::Mat4.components(), None);
        assert_eq!(UniformType::Sampler2D.components(), None);
    }
}
