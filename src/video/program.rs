//! Linked programs and their name-keyed uniform and attribute tables.

use std::collections::HashMap;

use super::assets::prelude::*;
use super::backends::{NativeId, Visitor};
use super::errors::*;
use super::uniform::{UniformData, UniformValue};

/// The typed setter of a uniform, chosen once from its declared type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Setter {
    /// `int`, `bool`, samplers and their vectors, with the component count.
    Int(usize),
    /// `float` and its vectors, with the component count.
    Float(usize),
    /// Square matrix of `n * n` components.
    Matrix(usize),
}

impl Setter {
    pub fn from_type(tp: UniformType) -> Self {
        match tp {
            UniformType::Int | UniformType::Bool => Setter::Int(1),
            UniformType::IVec2 | UniformType::BVec2 => Setter::Int(2),
            UniformType::IVec3 | UniformType::BVec3 => Setter::Int(3),
            UniformType::IVec4 | UniformType::BVec4 => Setter::Int(4),
            UniformType::Sampler2D | UniformType::SamplerCube | UniformType::Sampler2DShadow => {
                Setter::Int(1)
            }
            UniformType::Float => Setter::Float(1),
            UniformType::Vec2 => Setter::Float(2),
            UniformType::Vec3 => Setter::Float(3),
            UniformType::Vec4 => Setter::Float(4),
            UniformType::Mat2 => Setter::Matrix(2),
            UniformType::Mat3 => Setter::Matrix(3),
            UniformType::Mat4 => Setter::Matrix(4),
        }
    }

    /// Number of scalar components one value takes.
    pub fn arity(self) -> usize {
        match self {
            Setter::Int(n) | Setter::Float(n) => n,
            Setter::Matrix(n) => n * n,
        }
    }

    fn data(self, v: &[f32]) -> UniformData {
        let i = |n: usize| v[n] as i32;
        match self {
            Setter::Int(1) => UniformData::I32(i(0)),
            Setter::Int(2) => UniformData::Vector2i([i(0), i(1)]),
            Setter::Int(3) => UniformData::Vector3i([i(0), i(1), i(2)]),
            Setter::Int(_) => UniformData::Vector4i([i(0), i(1), i(2), i(3)]),
            Setter::Float(1) => UniformData::F32(v[0]),
            Setter::Float(2) => UniformData::Vector2f([v[0], v[1]]),
            Setter::Float(3) => UniformData::Vector3f([v[0], v[1], v[2]]),
            Setter::Float(_) => UniformData::Vector4f([v[0], v[1], v[2], v[3]]),
            Setter::Matrix(2) => UniformData::Matrix2f([v[0], v[1], v[2], v[3]]),
            Setter::Matrix(3) => {
                let mut m = [0.0; 9];
                m.copy_from_slice(&v[..9]);
                UniformData::Matrix3f(m)
            }
            Setter::Matrix(_) => {
                let mut m = [0.0; 16];
                m.copy_from_slice(&v[..16]);
                UniformData::Matrix4f(m)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformInfo {
    pub name: String,
    pub tp: UniformType,
    pub location: i32,
    /// Number of array elements, 1 for plain uniforms and array elements.
    pub size: u32,
    pub setter: Setter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    /// Driver type code.
    pub code: u32,
    pub location: i32,
}

/// One write produced by resolving a uniform value against a program.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformWrite {
    Data(i32, UniformData),
    /// A sampler, to be bound to a texture unit whose index is then written
    /// into the location.
    Texture(i32, TextureHandle),
}

/// A linked program.
#[derive(Debug, Clone)]
pub struct Program {
    pub id: NativeId,
    uniforms: HashMap<String, UniformInfo>,
    attributes: HashMap<String, AttributeInfo>,
    bindings: Vec<(u32, String)>,
}

impl Program {
    /// Compiles both stages, binds every `(location, name)` attribute, links
    /// and introspects the result. Every native object created on the way is
    /// released if any step fails.
    pub unsafe fn build<T: AsRef<str>>(
        visitor: &mut dyn Visitor,
        vs: &str,
        fs: &str,
        bindings: &[(u32, T)],
    ) -> Result<Program> {
        let vs = visitor.compile_shader(ShaderStage::Vertex, vs)?;
        let fs = match visitor.compile_shader(ShaderStage::Fragment, fs) {
            Ok(fs) => fs,
            Err(err) => {
                visitor.delete_shader(vs)?;
                return Err(err);
            }
        };

        let locations: Vec<(u32, &str)> = bindings.iter().map(|v| (v.0, v.1.as_ref())).collect();

        let id = visitor.link_program(&[vs, fs], &locations);
        visitor.delete_shader(vs)?;
        visitor.delete_shader(fs)?;
        let id = id?;

        match Self::introspect(visitor, id, &locations) {
            Ok(program) => {
                debug!(
                    "Linked program {} with uniforms {:?} and attributes {:?}.",
                    id,
                    program.uniforms.keys().collect::<Vec<_>>(),
                    program.attributes.keys().collect::<Vec<_>>()
                );
                Ok(program)
            }
            Err(err) => {
                visitor.delete_program(id)?;
                Err(err)
            }
        }
    }

    unsafe fn introspect(
        visitor: &mut dyn Visitor,
        id: NativeId,
        bindings: &[(u32, &str)],
    ) -> Result<Program> {
        let mut uniforms = HashMap::new();
        for v in visitor.active_uniforms(id)? {
            let tp = UniformType::from_code(v.code).ok_or_else(|| {
                Error::UnsupportedUniformType {
                    name: v.name.clone(),
                    code: v.code,
                }
            })?;

            let setter = Setter::from_type(tp);

            // Arrays are reported once as `name[0]`. Register the base name
            // and every element, each with its own location.
            if v.name.ends_with("[0]") {
                let base = &v.name[..v.name.len() - 3];
                for i in 0..v.size {
                    let name = format!("{}[{}]", base, i);
                    let location = match visitor.uniform_location(id, &name)? {
                        Some(location) => location,
                        None => v.location + i as i32,
                    };

                    uniforms.insert(
                        name.clone(),
                        UniformInfo {
                            name,
                            tp,
                            location,
                            size: 1,
                            setter,
                        },
                    );
                }

                uniforms.insert(
                    base.to_owned(),
                    UniformInfo {
                        name: base.to_owned(),
                        tp,
                        location: v.location,
                        size: v.size,
                        setter,
                    },
                );
            } else {
                uniforms.insert(
                    v.name.clone(),
                    UniformInfo {
                        name: v.name,
                        tp,
                        location: v.location,
                        size: 1,
                        setter,
                    },
                );
            }
        }

        let mut attributes = HashMap::new();
        for v in visitor.active_attributes(id)? {
            attributes.insert(
                v.name.clone(),
                AttributeInfo {
                    name: v.name,
                    code: v.code,
                    location: v.location,
                },
            );
        }

        for &(_, name) in bindings {
            if !attributes.contains_key(name) {
                return Err(Error::AttributeUndefined(name.to_owned()));
            }
        }

        Ok(Program {
            id,
            uniforms,
            attributes,
            bindings: bindings.iter().map(|v| (v.0, v.1.to_owned())).collect(),
        })
    }

    #[inline]
    pub fn uniform(&self, name: &str) -> Option<&UniformInfo> {
        self.uniforms.get(name)
    }

    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.get(name)
    }

    pub fn uniforms(&self) -> impl Iterator<Item = &UniformInfo> {
        self.uniforms.values()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attributes.values()
    }

    /// Attribute locations bound at link time.
    #[inline]
    pub fn bindings(&self) -> &[(u32, String)] {
        &self.bindings
    }

    /// Returns true if `name` addresses an active uniform, or an active
    /// array through its elements.
    pub fn declares(&self, name: &str) -> bool {
        self.uniforms.contains_key(name) || self.uniforms.contains_key(&format!("{}[0]", name))
    }

    /// Resolves `value` into the writes needed to set the uniform `name`.
    pub fn resolve(&self, name: &str, value: &UniformValue) -> Result<Vec<UniformWrite>> {
        let value = value.resolve();

        if let Some(info) = self.uniforms.get(name) {
            return match value {
                UniformValue::Array(ref items) if info.size > 1 => {
                    self.resolve_elements(name, items)
                }
                _ => Ok(vec![Self::write(info, &value)?]),
            };
        }

        if let UniformValue::Array(ref items) = value {
            if !self.uniforms.contains_key(&format!("{}[0]", name)) {
                warn!(
                    "Uniform array \"{}\" is not active in program {}, skipped.",
                    name, self.id
                );
                return Ok(Vec::new());
            }

            return self.resolve_elements(name, items);
        }

        Err(Error::UnknownUniform(name.to_owned()))
    }

    fn resolve_elements(&self, name: &str, items: &[UniformValue]) -> Result<Vec<UniformWrite>> {
        let mut writes = Vec::with_capacity(items.len());
        for (i, v) in items.iter().enumerate() {
            let element = format!("{}[{}]", name, i);
            match self.uniforms.get(&element) {
                Some(info) => writes.push(Self::write(info, v)?),
                None => {
                    warn!(
                        "Uniform array \"{}\" has {} values but only {} are active.",
                        name,
                        items.len(),
                        i
                    );
                    break;
                }
            }
        }

        Ok(writes)
    }

    fn write(info: &UniformInfo, value: &UniformValue) -> Result<UniformWrite> {
        let mismatch = || Error::UniformTypeMismatch {
            name: info.name.clone(),
            expected: info.tp,
            actual: value.kind(),
        };

        if let UniformValue::Texture(texture) = *value {
            return if info.tp.is_sampler() {
                Ok(UniformWrite::Texture(info.location, texture))
            } else {
                Err(mismatch())
            };
        }

        if let Setter::Int(_) = info.setter {
            if !is_integral(value) {
                return Err(mismatch());
            }
        }

        let components = value.components().ok_or_else(mismatch)?;
        if components.len() != info.setter.arity() {
            return Err(Error::Arity {
                name: info.name.clone(),
                expected: info.setter.arity(),
                actual: components.len(),
            });
        }

        Ok(UniformWrite::Data(
            info.location,
            info.setter.data(&components),
        ))
    }
}

fn is_integral(value: &UniformValue) -> bool {
    match *value {
        UniformValue::Int(_) | UniformValue::Bool(_) => true,
        UniformValue::Array(ref items) => items.iter().all(is_integral),
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::super::backends::headless::HeadlessVisitor;
    use super::*;

    const VS: &str = "
        attribute vec3 aPosition;
        uniform mat4 uMVP;
        uniform float uOffsets[3];
        void main() { gl_Position = uMVP * vec4(aPosition + uOffsets[0], 1.0); }
    ";

    const FS: &str = "
        uniform vec3 uColor;
        uniform int uMode;
        uniform sampler2D uTexture;
        void main() { gl_FragColor = vec4(uColor, float(uMode)) * texture2D(uTexture, vec2(0.0)); }
    ";

    fn build() -> Program {
        let mut visitor = HeadlessVisitor::new();
        unsafe { Program::build(&mut visitor, VS, FS, &[(0, "aPosition")]).unwrap() }
    }

    #[test]
    fn tables() {
        let program = build();
        assert!(program.declares("uMVP"));
        assert!(program.declares("uOffsets"));
        assert!(program.uniform("uOffsets[2]").is_some());
        assert!(program.uniform("uOffsets[3]").is_none());
        assert_eq!(program.uniform("uOffsets").unwrap().size, 3);
        assert_eq!(program.attribute("aPosition").unwrap().location, 0);
        assert_eq!(program.bindings(), &[(0, "aPosition".to_owned())]);
    }

    #[test]
    fn resolve() {
        let program = build();

        let writes = program.resolve("uColor", &[1.0, 0.5, 0.0].into()).unwrap();
        match writes[0] {
            UniformWrite::Data(_, UniformData::Vector3f(v)) => assert_eq!(v, [1.0, 0.5, 0.0]),
            ref other => panic!("unexpected {:?}", other),
        }

        let writes = program.resolve("uOffsets", &vec![1.0f32, 2.0, 3.0].into()).unwrap();
        assert_eq!(writes.len(), 3);

        match program.resolve("uColor", &[1.0, 0.5].into()) {
            Err(Error::Arity {
                expected, actual, ..
            }) => assert_eq!((expected, actual), (3, 2)),
            other => panic!("unexpected {:?}", other),
        }

        match program.resolve("uMode", &1.5f32.into()) {
            Err(Error::UniformTypeMismatch { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }

        let texture = TextureHandle::default();
        match program.resolve("uColor", &texture.into()) {
            Err(Error::UniformTypeMismatch { actual, .. }) => assert_eq!(actual, "texture"),
            other => panic!("unexpected {:?}", other),
        }

        let writes = program.resolve("uTexture", &texture.into()).unwrap();
        assert!(match writes[0] {
            UniformWrite::Texture(_, h) => h == texture,
            _ => false,
        });

        match program.resolve("uFoo", &1.0f32.into()) {
            Err(Error::UnknownUniform(name)) => assert_eq!(name, "uFoo"),
            other => panic!("unexpected {:?}", other),
        }

        assert!(program
            .resolve("uMissing", &vec![1.0f32, 2.0].into())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn attribute_undefined() {
        let mut visitor = HeadlessVisitor::new();
        let log = visitor.log();
        match unsafe { Program::build(&mut visitor, VS, FS, &[(0, "aPosition"), (1, "aNormal")]) } {
            Err(Error::AttributeUndefined(name)) => assert_eq!(name, "aNormal"),
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            log.count(|v| match *v {
                super::super::backends::headless::Call::DeleteProgram(_) => true,
                _ => false,
            }),
            1
        );
    }
}
