//! Uniform values carried by commands and the typed payloads handed to the
//! graphics API.

use std::fmt;
use std::rc::Rc;

use cgmath;
use smallvec::SmallVec;

use super::assets::prelude::*;
use crate::utils::Color;

/// A uniform value as declared on a command.
#[derive(Clone)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    Vector(SmallVec<[f32; 4]>),
    /// Column-major matrix components.
    Matrix(SmallVec<[f32; 16]>),
    Texture(TextureHandle),
    /// A sequence, either feeding a GLSL array uniform element by element, or
    /// flattened into one vector/matrix uniform.
    Array(Vec<UniformValue>),
    /// Evaluated once per submit.
    Computed(Rc<dyn Fn() -> UniformValue>),
}

impl UniformValue {
    /// Wraps a closure that is invoked every time the value is submitted.
    pub fn computed<F, V>(func: F) -> Self
    where
        F: Fn() -> V + 'static,
        V: Into<UniformValue>,
    {
        UniformValue::Computed(Rc::new(move || -> UniformValue { func().into() }))
    }

    /// A short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match *self {
            UniformValue::Int(_) => "int",
            UniformValue::Float(_) => "float",
            UniformValue::Bool(_) => "bool",
            UniformValue::Vector(_) => "vector",
            UniformValue::Matrix(_) => "matrix",
            UniformValue::Texture(_) => "texture",
            UniformValue::Array(_) => "array",
            UniformValue::Computed(_) => "computed",
        }
    }

    /// Evaluates computed values, recursively.
    pub fn resolve(&self) -> UniformValue {
        match *self {
            UniformValue::Computed(ref func) => func().resolve(),
            UniformValue::Array(ref items) => {
                UniformValue::Array(items.iter().map(|v| v.resolve()).collect())
            }
            ref v => v.clone(),
        }
    }

    /// Collects every scalar component. Returns `None` if a texture (or an
    /// unresolved computed value) is found.
    pub fn components(&self) -> Option<SmallVec<[f32; 16]>> {
        let mut out = SmallVec::new();
        if self.collect_components(&mut out) {
            Some(out)
        } else {
            None
        }
    }

    fn collect_components(&self, out: &mut SmallVec<[f32; 16]>) -> bool {
        match *self {
            UniformValue::Int(v) => out.push(v as f32),
            UniformValue::Float(v) => out.push(v),
            UniformValue::Bool(v) => out.push(if v { 1.0 } else { 0.0 }),
            UniformValue::Vector(ref v) => out.extend(v.iter().cloned()),
            UniformValue::Matrix(ref v) => out.extend(v.iter().cloned()),
            UniformValue::Array(ref items) => {
                for v in items {
                    if !v.collect_components(out) {
                        return false;
                    }
                }
            }
            UniformValue::Texture(_) | UniformValue::Computed(_) => return false,
        }

        true
    }

    /// Returns the texture handles referenced by this value.
    pub fn textures(&self) -> Vec<TextureHandle> {
        match *self {
            UniformValue::Texture(h) => vec![h],
            UniformValue::Array(ref items) => items.iter().flat_map(|v| v.textures()).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            UniformValue::Int(v) => write!(f, "Int({})", v),
            UniformValue::Float(v) => write!(f, "Float({})", v),
            UniformValue::Bool(v) => write!(f, "Bool({})", v),
            UniformValue::Vector(ref v) => write!(f, "Vector({:?})", &v[..]),
            UniformValue::Matrix(ref v) => write!(f, "Matrix({:?})", &v[..]),
            UniformValue::Texture(h) => write!(f, "Texture({})", h),
            UniformValue::Array(ref v) => write!(f, "Array({:?})", v),
            UniformValue::Computed(_) => write!(f, "Computed"),
        }
    }
}

impl PartialEq for UniformValue {
    fn eq(&self, rhs: &Self) -> bool {
        match (self, rhs) {
            (&UniformValue::Int(a), &UniformValue::Int(b)) => a == b,
            (&UniformValue::Float(a), &UniformValue::Float(b)) => a == b,
            (&UniformValue::Bool(a), &UniformValue::Bool(b)) => a == b,
            (&UniformValue::Vector(ref a), &UniformValue::Vector(ref b)) => a == b,
            (&UniformValue::Matrix(ref a), &UniformValue::Matrix(ref b)) => a == b,
            (&UniformValue::Texture(a), &UniformValue::Texture(b)) => a == b,
            (&UniformValue::Array(ref a), &UniformValue::Array(ref b)) => a == b,
            (&UniformValue::Computed(ref a), &UniformValue::Computed(ref b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::Int(v as i32)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<f64> for UniformValue {
    fn from(v: f64) -> Self {
        UniformValue::Float(v as f32)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(v)
    }
}

impl From<TextureHandle> for UniformValue {
    fn from(v: TextureHandle) -> Self {
        UniformValue::Texture(v)
    }
}

impl From<Color> for UniformValue {
    fn from(v: Color) -> Self {
        let v: [f32; 4] = v.into();
        v.into()
    }
}

impl<T: Into<UniformValue>> From<Vec<T>> for UniformValue {
    fn from(v: Vec<T>) -> Self {
        UniformValue::Array(v.into_iter().map(|e| e.into()).collect())
    }
}

macro_rules! impl_vector {
    ($($len:expr),*) => {
        $(
            impl From<[f32; $len]> for UniformValue {
                fn from(v: [f32; $len]) -> Self {
                    UniformValue::Vector(v.iter().cloned().collect())
                }
            }

            impl From<[f64; $len]> for UniformValue {
                fn from(v: [f64; $len]) -> Self {
                    UniformValue::Vector(v.iter().map(|e| *e as f32).collect())
                }
            }
        )*
    };
}

impl_vector!(2, 3, 4);

impl From<[f32; 9]> for UniformValue {
    fn from(v: [f32; 9]) -> Self {
        UniformValue::Matrix(v.iter().cloned().collect())
    }
}

impl From<[f32; 16]> for UniformValue {
    fn from(v: [f32; 16]) -> Self {
        UniformValue::Matrix(v.iter().cloned().collect())
    }
}

macro_rules! impl_matrix_columns {
    ($($len:expr),*) => {
        $(
            impl From<[[f32; $len]; $len]> for UniformValue {
                fn from(v: [[f32; $len]; $len]) -> Self {
                    UniformValue::Matrix(v.iter().flat_map(|c| c.iter().cloned()).collect())
                }
            }
        )*
    };
}

impl_matrix_columns!(2, 3, 4);

impl From<cgmath::Vector2<f32>> for UniformValue {
    fn from(v: cgmath::Vector2<f32>) -> Self {
        let v: [f32; 2] = v.into();
        v.into()
    }
}

impl From<cgmath::Vector3<f32>> for UniformValue {
    fn from(v: cgmath::Vector3<f32>) -> Self {
        let v: [f32; 3] = v.into();
        v.into()
    }
}

impl From<cgmath::Vector4<f32>> for UniformValue {
    fn from(v: cgmath::Vector4<f32>) -> Self {
        let v: [f32; 4] = v.into();
        v.into()
    }
}

impl From<cgmath::Matrix2<f32>> for UniformValue {
    fn from(v: cgmath::Matrix2<f32>) -> Self {
        let v: [[f32; 2]; 2] = v.into();
        v.into()
    }
}

impl From<cgmath::Matrix3<f32>> for UniformValue {
    fn from(v: cgmath::Matrix3<f32>) -> Self {
        let v: [[f32; 3]; 3] = v.into();
        v.into()
    }
}

impl From<cgmath::Matrix4<f32>> for UniformValue {
    fn from(v: cgmath::Matrix4<f32>) -> Self {
        let v: [[f32; 4]; 4] = v.into();
        v.into()
    }
}

/// An ordered name to value map. Setting an existing name replaces the value
/// in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniforms {
    entries: Vec<(String, UniformValue)>,
}

impl Uniforms {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with<T1, T2>(mut self, name: T1, value: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<UniformValue>,
    {
        self.set(name, value);
        self
    }

    pub fn set<T1, T2>(&mut self, name: T1, value: T2)
    where
        T1: Into<String>,
        T2: Into<UniformValue>,
    {
        let name = name.into();
        let value = value.into();

        if let Some(entry) = self.entries.iter_mut().find(|e| e.0 == name) {
            entry.1 = value;
            return;
        }

        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries.iter().find(|e| e.0 == name).map(|e| &e.1)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.entries.iter().map(|e| (e.0.as_str(), &e.1))
    }

    /// The union of `self` and `rhs`, with values of `rhs` winning.
    pub fn merge(&self, rhs: &Uniforms) -> Uniforms {
        let mut merged = self.clone();
        for (name, value) in rhs.iter() {
            merged.set(name, value.clone());
        }

        merged
    }
}

/// A resolved value ready to be written into a uniform location.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformData {
    I32(i32),
    F32(f32),
    Vector2i([i32; 2]),
    Vector3i([i32; 3]),
    Vector4i([i32; 4]),
    Vector2f([f32; 2]),
    Vector3f([f32; 3]),
    Vector4f([f32; 4]),
    Matrix2f([f32; 4]),
    Matrix3f([f32; 9]),
    Matrix4f([f32; 16]),
}
