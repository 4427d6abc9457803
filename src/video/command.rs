//! Command descriptors, the validated commands built from them and partial
//! overrides applied in batches.

use std::fmt;
use std::str::FromStr;

use super::assets::prelude::*;
use super::errors::*;
use super::layout::{Elements, VertexAttributes, VertexLayout};
use super::uniform::{UniformValue, Uniforms};
use crate::utils::Color;

/// Identifies a command built by a `Context`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(pub u32);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of keys a command descriptor recognises.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Framebuffer,
    Viewport,
    ClearColor,
    ClearDepth,
    Vert,
    Frag,
    Program,
    VertexLayout,
    Attributes,
    Elements,
    Uniforms,
    DepthEnable,
    Blend,
}

impl Key {
    pub const ALL: [Key; 13] = [
        Key::Framebuffer,
        Key::Viewport,
        Key::ClearColor,
        Key::ClearDepth,
        Key::Vert,
        Key::Frag,
        Key::Program,
        Key::VertexLayout,
        Key::Attributes,
        Key::Elements,
        Key::Uniforms,
        Key::DepthEnable,
        Key::Blend,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Key::Framebuffer => "framebuffer",
            Key::Viewport => "viewport",
            Key::ClearColor => "clearColor",
            Key::ClearDepth => "clearDepth",
            Key::Vert => "vert",
            Key::Frag => "frag",
            Key::Program => "program",
            Key::VertexLayout => "vertexLayout",
            Key::Attributes => "attributes",
            Key::Elements => "elements",
            Key::Uniforms => "uniforms",
            Key::DepthEnable => "depthEnable",
            Key::Blend => "blend",
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Key::Framebuffer => "a framebuffer handle or the backbuffer",
            Key::Viewport => "a viewport",
            Key::ClearColor => "a color",
            Key::ClearDepth => "a number",
            Key::Vert | Key::Frag => "shader source text",
            Key::Program => "a program handle",
            Key::VertexLayout => "a vertex layout",
            Key::Attributes => "vertex attributes",
            Key::Elements => "an index buffer",
            Key::Uniforms => "uniforms",
            Key::DepthEnable => "a boolean",
            Key::Blend => "a blend mode or a boolean",
        }
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Key::ALL
            .iter()
            .find(|v| v.name() == s)
            .cloned()
            .ok_or_else(|| Error::UnknownCommandKey(s.to_owned()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A dynamically typed value for keyed descriptor construction.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Target(RenderTarget),
    Viewport(Viewport),
    Color(Color),
    Number(f32),
    Text(String),
    Program(ProgramHandle),
    VertexLayout(VertexLayout),
    Attributes(VertexAttributes),
    Elements(Elements),
    Uniforms(Uniforms),
    Bool(bool),
    Blend(Blend),
}

macro_rules! impl_field_value {
    ($tp:ty, $variant:ident) => {
        impl From<$tp> for FieldValue {
            fn from(v: $tp) -> Self {
                FieldValue::$variant(v.into())
            }
        }
    };
}

impl_field_value!(RenderTarget, Target);
impl_field_value!(FramebufferHandle, Target);
impl_field_value!(Viewport, Viewport);
impl_field_value!(Color, Color);
impl_field_value!([f32; 4], Color);
impl_field_value!(f32, Number);
impl_field_value!(String, Text);
impl_field_value!(&str, Text);
impl_field_value!(ProgramHandle, Program);
impl_field_value!(VertexLayout, VertexLayout);
impl_field_value!(VertexAttributes, Attributes);
impl_field_value!(Elements, Elements);
impl_field_value!(BufferHandle, Elements);
impl_field_value!(Uniforms, Uniforms);
impl_field_value!(bool, Bool);
impl_field_value!(Blend, Blend);

/// The optional state fields of a command or an override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    pub framebuffer: Option<RenderTarget>,
    pub viewport: Option<Viewport>,
    pub clear_color: Option<Color>,
    pub clear_depth: Option<f32>,
    pub program: Option<ProgramHandle>,
    pub vertex_layout: Option<VertexLayout>,
    pub attributes: Option<VertexAttributes>,
    pub elements: Option<Elements>,
    pub uniforms: Uniforms,
    pub depth_enable: Option<bool>,
    pub blend: Option<Blend>,
}

impl Fields {
    /// Field-wise merge where every field present in `over` wins, and
    /// uniforms are united.
    pub fn merge(&self, over: &Fields) -> Fields {
        Fields {
            framebuffer: over.framebuffer.or(self.framebuffer),
            viewport: over.viewport.or(self.viewport),
            clear_color: over.clear_color.or(self.clear_color),
            clear_depth: over.clear_depth.or(self.clear_depth),
            program: over.program.or(self.program),
            vertex_layout: over
                .vertex_layout
                .clone()
                .or_else(|| self.vertex_layout.clone()),
            attributes: over.attributes.clone().or_else(|| self.attributes.clone()),
            elements: over.elements.or(self.elements),
            uniforms: self.uniforms.merge(&over.uniforms),
            depth_enable: over.depth_enable.or(self.depth_enable),
            blend: over.blend.or(self.blend),
        }
    }

    /// Returns true if the fields carry a draw payload.
    pub fn draws(&self) -> bool {
        self.attributes.is_some() || self.elements.is_some()
    }

    /// Every resource referenced by the fields.
    pub fn resources(&self) -> Vec<Resource> {
        let mut resources = Vec::new();

        if let Some(RenderTarget::Framebuffer(h)) = self.framebuffer {
            resources.push(h.into());
        }

        if let Some(h) = self.program {
            resources.push(h.into());
        }

        if let Some(ref attributes) = self.attributes {
            for (_, v) in attributes.iter() {
                resources.push(v.buffer.into());
            }
        }

        if let Some(ref elements) = self.elements {
            resources.push(elements.buffer.into());
        }

        for (_, v) in self.uniforms.iter() {
            for h in v.textures() {
                resources.push(h.into());
            }
        }

        resources
    }

    fn set(&mut self, key: Key, value: FieldValue) -> Result<()> {
        let mismatch = || Error::InvalidCommandField {
            key: key.name().to_owned(),
            expected: key.expected(),
        };

        match (key, value) {
            (Key::Framebuffer, FieldValue::Target(v)) => self.framebuffer = Some(v),
            (Key::Viewport, FieldValue::Viewport(v)) => self.viewport = Some(v),
            (Key::ClearColor, FieldValue::Color(v)) => self.clear_color = Some(v),
            (Key::ClearDepth, FieldValue::Number(v)) => self.clear_depth = Some(v),
            (Key::Program, FieldValue::Program(v)) => self.program = Some(v),
            (Key::VertexLayout, FieldValue::VertexLayout(v)) => self.vertex_layout = Some(v),
            (Key::Attributes, FieldValue::Attributes(v)) => self.attributes = Some(v),
            (Key::Elements, FieldValue::Elements(v)) => self.elements = Some(v),
            (Key::Uniforms, FieldValue::Uniforms(v)) => self.uniforms = self.uniforms.merge(&v),
            (Key::DepthEnable, FieldValue::Bool(v)) => self.depth_enable = Some(v),
            (Key::Blend, FieldValue::Blend(v)) => self.blend = Some(v),
            (Key::Blend, FieldValue::Bool(v)) => self.blend = Some(v.into()),
            _ => return Err(mismatch()),
        }

        Ok(())
    }
}

macro_rules! impl_field_builders {
    ($name:ident) => {
        impl $name {
            pub fn framebuffer<T: Into<RenderTarget>>(mut self, target: T) -> Self {
                self.fields.framebuffer = Some(target.into());
                self
            }

            pub fn viewport(mut self, viewport: Viewport) -> Self {
                self.fields.viewport = Some(viewport);
                self
            }

            pub fn clear_color<T: Into<Color>>(mut self, color: T) -> Self {
                self.fields.clear_color = Some(color.into());
                self
            }

            pub fn clear_depth(mut self, depth: f32) -> Self {
                self.fields.clear_depth = Some(depth);
                self
            }

            pub fn program(mut self, program: ProgramHandle) -> Self {
                self.fields.program = Some(program);
                self
            }

            pub fn vertex_layout(mut self, layout: VertexLayout) -> Self {
                self.fields.vertex_layout = Some(layout);
                self
            }

            pub fn attributes(mut self, attributes: VertexAttributes) -> Self {
                self.fields.attributes = Some(attributes);
                self
            }

            pub fn elements<T: Into<Elements>>(mut self, elements: T) -> Self {
                self.fields.elements = Some(elements.into());
                self
            }

            pub fn uniform<T1, T2>(mut self, name: T1, value: T2) -> Self
            where
                T1: Into<String>,
                T2: Into<UniformValue>,
            {
                self.fields.uniforms.set(name, value);
                self
            }

            pub fn uniforms(mut self, uniforms: &Uniforms) -> Self {
                self.fields.uniforms = self.fields.uniforms.merge(uniforms);
                self
            }

            pub fn depth_enable(mut self, enable: bool) -> Self {
                self.fields.depth_enable = Some(enable);
                self
            }

            pub fn blend<T: Into<Blend>>(mut self, blend: T) -> Self {
                self.fields.blend = Some(blend.into());
                self
            }

            /// The fields set so far.
            #[inline]
            pub fn fields(&self) -> &Fields {
                &self.fields
            }
        }
    };
}

/// Describes a command before it is validated by `Context::command`.
#[derive(Debug, Clone, Default)]
pub struct CommandDescriptor {
    pub(crate) name: Option<String>,
    pub(crate) vert: Option<String>,
    pub(crate) frag: Option<String>,
    pub(crate) fields: Fields,
    pub(crate) rejected: Option<Error>,
}

impl_field_builders!(CommandDescriptor);

impl CommandDescriptor {
    pub fn new() -> Self {
        Default::default()
    }

    /// A label shown in the debug graph.
    pub fn name<T: Into<String>>(mut self, name: T) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn vert<T: Into<String>>(mut self, source: T) -> Self {
        self.vert = Some(source.into());
        self
    }

    pub fn frag<T: Into<String>>(mut self, source: T) -> Self {
        self.frag = Some(source.into());
        self
    }

    /// Sets a field by its key name. Unknown keys and values of the wrong
    /// kind are reported by `Context::command`.
    pub fn set<T: Into<FieldValue>>(mut self, key: &str, value: T) -> Self {
        if self.rejected.is_some() {
            return self;
        }

        let value = value.into();
        let result = key.parse::<Key>().and_then(|key| match (key, value) {
            (Key::Vert, FieldValue::Text(v)) => {
                self.vert = Some(v);
                Ok(())
            }
            (Key::Frag, FieldValue::Text(v)) => {
                self.frag = Some(v);
                Ok(())
            }
            (Key::Vert, _) | (Key::Frag, _) => Err(Error::InvalidCommandField {
                key: key.name().to_owned(),
                expected: key.expected(),
            }),
            (key, value) => self.fields.set(key, value),
        });

        if let Err(err) = result {
            self.rejected = Some(err);
        }

        self
    }

    /// Returns the first error recorded by `set`.
    pub fn check(&self) -> Result<()> {
        match self.rejected {
            Some(ref err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// A partial command without shader sources, merged into a command for one
/// submission.
#[derive(Debug, Clone, Default)]
pub struct Override {
    pub(crate) fields: Fields,
    pub(crate) rejected: Option<Error>,
}

impl_field_builders!(Override);

impl Override {
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets a field by its key name. Shader sources can not be overridden.
    pub fn set<T: Into<FieldValue>>(mut self, key: &str, value: T) -> Self {
        if self.rejected.is_some() {
            return self;
        }

        let value = value.into();
        let result = key.parse::<Key>().and_then(|key| match key {
            Key::Vert | Key::Frag => Err(Error::InvalidCommandField {
                key: key.name().to_owned(),
                expected: "no shader source in an override",
            }),
            _ => self.fields.set(key, value),
        });

        if let Err(err) = result {
            self.rejected = Some(err);
        }

        self
    }

    pub fn check(&self) -> Result<()> {
        match self.rejected {
            Some(ref err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// A validated command. Commands are cheap to clone and meant to be built once
/// and submitted every frame.
#[derive(Debug, Clone)]
pub struct Command {
    pub(crate) id: CommandId,
    pub(crate) name: Option<String>,
    pub(crate) fields: Fields,
}

impl Command {
    #[inline]
    pub fn id(&self) -> CommandId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|v| v.as_str())
    }

    #[inline]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The same command with `over` merged on top.
    pub fn with_override(&self, over: &Override) -> Command {
        Command {
            id: self.id,
            name: self.name.clone(),
            fields: self.fields.merge(&over.fields),
        }
    }
}
