//! Vertex layouts and the vertex data bound against them.

use std::collections::HashSet;

use super::assets::prelude::*;
use super::errors::*;

/// One attribute of a vertex layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutEntry {
    pub name: String,
    pub location: u32,
    /// Number of components, 1 to 4.
    pub size: u8,
}

/// An ordered list of `(name, location, size)` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    entries: Vec<LayoutEntry>,
}

impl VertexLayout {
    pub fn build() -> VertexLayoutBuilder {
        VertexLayoutBuilder::default()
    }

    #[inline]
    pub fn iter(&self) -> ::std::slice::Iter<LayoutEntry> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Checks component counts, and that names and locations are unique.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut locations = HashSet::new();

        for e in &self.entries {
            if e.size == 0 || e.size > 4 {
                return Err(Error::MalformedAttribute {
                    name: e.name.clone(),
                    reason: format!("size {} is not within 1..=4", e.size),
                });
            }

            if !names.insert(e.name.as_str()) {
                return Err(Error::MalformedAttribute {
                    name: e.name.clone(),
                    reason: "declared more than once".into(),
                });
            }

            if !locations.insert(e.location) {
                return Err(Error::DuplicateAttributeLocation(e.location));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct VertexLayoutBuilder {
    entries: Vec<LayoutEntry>,
}

impl VertexLayoutBuilder {
    pub fn with<T: Into<String>>(mut self, name: T, location: u32, size: u8) -> Self {
        self.entries.push(LayoutEntry {
            name: name.into(),
            location,
            size,
        });
        self
    }

    #[inline]
    pub fn finish(self) -> VertexLayout {
        VertexLayout {
            entries: self.entries,
        }
    }
}

/// A buffer backing one vertex attribute. `offset` and `stride` are in bytes,
/// a zero stride means tightly packed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub buffer: BufferHandle,
    pub offset: u32,
    pub stride: u32,
    pub normalized: bool,
}

impl VertexAttribute {
    pub fn new(buffer: BufferHandle) -> Self {
        VertexAttribute {
            buffer,
            offset: 0,
            stride: 0,
            normalized: false,
        }
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }
}

impl From<BufferHandle> for VertexAttribute {
    fn from(buffer: BufferHandle) -> Self {
        VertexAttribute::new(buffer)
    }
}

/// The vertex buffers of a draw, addressed positionally or by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexAttributes {
    entries: Vec<(Option<String>, VertexAttribute)>,
}

impl VertexAttributes {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds an attribute addressed by name.
    pub fn with<T1, T2>(mut self, name: T1, attribute: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<VertexAttribute>,
    {
        self.entries.push((Some(name.into()), attribute.into()));
        self
    }

    /// Adds an attribute addressed by its position.
    pub fn push<T: Into<VertexAttribute>>(mut self, attribute: T) -> Self {
        self.entries.push((None, attribute.into()));
        self
    }

    /// Finds the attribute backing the `index`-th layout entry named `name`.
    /// Named entries take precedence over positional ones.
    pub fn resolve(&self, index: usize, name: &str) -> Option<&VertexAttribute> {
        if let Some(e) = self
            .entries
            .iter()
            .find(|e| e.0.as_ref().map(|n| n == name).unwrap_or(false))
        {
            return Some(&e.1);
        }

        match self.entries.get(index) {
            Some(&(None, ref attribute)) => Some(attribute),
            _ => None,
        }
    }

    /// Names of the attributes, if every entry is addressed by name.
    pub fn names(&self) -> Option<Vec<&str>> {
        self.entries
            .iter()
            .map(|e| e.0.as_ref().map(|n| n.as_str()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &VertexAttribute)> {
        self.entries
            .iter()
            .map(|e| (e.0.as_ref().map(|n| n.as_str()), &e.1))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The index buffer of a draw. `count` defaults to the buffer length, `offset`
/// is counted in indices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Elements {
    pub buffer: BufferHandle,
    pub count: Option<u32>,
    pub offset: u32,
}

impl Elements {
    pub fn new(buffer: BufferHandle) -> Self {
        Elements {
            buffer,
            count: None,
            offset: 0,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }
}

impl From<BufferHandle> for Elements {
    fn from(buffer: BufferHandle) -> Self {
        Elements::new(buffer)
    }
}

/// How a vertex attribute reads its buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttributePointer {
    pub size: u8,
    pub element: ElementType,
    pub normalized: bool,
    pub stride: u32,
    pub offset: u32,
}
