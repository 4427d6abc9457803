//! Immutable or dynamic GPU buffers holding vertex attributes or indices.

use std::borrow::Cow;

use byteorder::{ByteOrder, NativeEndian};
use serde::{Deserialize, Serialize};

use crate::video::errors::*;

impl_handle!(BufferHandle);

/// The binding point a buffer is created for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferTarget {
    /// Vertex attributes.
    Vertex,
    /// 16-bit triangle indices.
    Index,
}

/// Hint abouts the intended update strategy of the data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferUsage {
    /// The resource is initialized with data and cannot be changed later, this
    /// is the most common and most efficient usage.
    Static,
    /// The resource is updated infrequently, but more frequently than once per
    /// frame.
    Dynamic,
    /// The resource is overwritten every frame.
    Stream,
}

impl Default for BufferUsage {
    fn default() -> Self {
        BufferUsage::Static
    }
}

/// The element type of a buffer. It is fixed by the kind of data supplied at
/// creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::I8 | ElementType::U8 => 1,
            ElementType::I16 | ElementType::U16 => 2,
            ElementType::I32 | ElementType::U32 | ElementType::F32 => 4,
        }
    }
}

/// Typed data uploaded into a buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferData<'a> {
    I8(Cow<'a, [i8]>),
    U8(Cow<'a, [u8]>),
    I16(Cow<'a, [i16]>),
    U16(Cow<'a, [u16]>),
    I32(Cow<'a, [i32]>),
    U32(Cow<'a, [u32]>),
    F32(Cow<'a, [f32]>),
}

macro_rules! impl_buffer_data {
    ($tp:ty, $variant:ident) => {
        impl<'a> From<&'a [$tp]> for BufferData<'a> {
            fn from(v: &'a [$tp]) -> Self {
                BufferData::$variant(Cow::Borrowed(v))
            }
        }

        impl<'a> From<&'a Vec<$tp>> for BufferData<'a> {
            fn from(v: &'a Vec<$tp>) -> Self {
                BufferData::$variant(Cow::Borrowed(&v[..]))
            }
        }

        impl<'a> From<Vec<$tp>> for BufferData<'a> {
            fn from(v: Vec<$tp>) -> Self {
                BufferData::$variant(Cow::Owned(v))
            }
        }

        impl<'a> From<&'a [[$tp; 2]]> for BufferData<'a> {
            fn from(v: &'a [[$tp; 2]]) -> Self {
                BufferData::$variant(Cow::Owned(v.iter().flat_map(|e| e.iter().cloned()).collect()))
            }
        }

        impl<'a> From<&'a [[$tp; 3]]> for BufferData<'a> {
            fn from(v: &'a [[$tp; 3]]) -> Self {
                BufferData::$variant(Cow::Owned(v.iter().flat_map(|e| e.iter().cloned()).collect()))
            }
        }

        impl<'a> From<&'a [[$tp; 4]]> for BufferData<'a> {
            fn from(v: &'a [[$tp; 4]]) -> Self {
                BufferData::$variant(Cow::Owned(v.iter().flat_map(|e| e.iter().cloned()).collect()))
            }
        }
    };
}

impl_buffer_data!(i8, I8);
impl_buffer_data!(u8, U8);
impl_buffer_data!(i16, I16);
impl_buffer_data!(u16, U16);
impl_buffer_data!(i32, I32);
impl_buffer_data!(u32, U32);
impl_buffer_data!(f32, F32);

impl<'a> BufferData<'a> {
    pub fn element_type(&self) -> ElementType {
        match *self {
            BufferData::I8(_) => ElementType::I8,
            BufferData::U8(_) => ElementType::U8,
            BufferData::I16(_) => ElementType::I16,
            BufferData::U16(_) => ElementType::U16,
            BufferData::I32(_) => ElementType::I32,
            BufferData::U32(_) => ElementType::U32,
            BufferData::F32(_) => ElementType::F32,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match *self {
            BufferData::I8(ref v) => v.len(),
            BufferData::U8(ref v) => v.len(),
            BufferData::I16(ref v) => v.len(),
            BufferData::U16(ref v) => v.len(),
            BufferData::I32(ref v) => v.len(),
            BufferData::U32(ref v) => v.len(),
            BufferData::F32(ref v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the index of the first NaN or infinite element, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        match *self {
            BufferData::F32(ref v) => v.iter().position(|e| !e.is_finite()),
            _ => None,
        }
    }

    /// Encodes the elements in native byte order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; self.len() * self.element_type().size()];

        match *self {
            BufferData::I8(ref v) => {
                for (dst, src) in bytes.iter_mut().zip(v.iter()) {
                    *dst = *src as u8;
                }
            }
            BufferData::U8(ref v) => bytes.copy_from_slice(v),
            BufferData::I16(ref v) => {
                for (i, e) in v.iter().enumerate() {
                    NativeEndian::write_i16(&mut bytes[i * 2..], *e);
                }
            }
            BufferData::U16(ref v) => {
                for (i, e) in v.iter().enumerate() {
                    NativeEndian::write_u16(&mut bytes[i * 2..], *e);
                }
            }
            BufferData::I32(ref v) => {
                for (i, e) in v.iter().enumerate() {
                    NativeEndian::write_i32(&mut bytes[i * 4..], *e);
                }
            }
            BufferData::U32(ref v) => {
                for (i, e) in v.iter().enumerate() {
                    NativeEndian::write_u32(&mut bytes[i * 4..], *e);
                }
            }
            BufferData::F32(ref v) => {
                for (i, e) in v.iter().enumerate() {
                    NativeEndian::write_f32(&mut bytes[i * 4..], *e);
                }
            }
        }

        bytes
    }
}

/// The metadata of a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferParams {
    pub target: BufferTarget,
    pub usage: BufferUsage,
    pub element: ElementType,
    /// Number of elements.
    pub len: usize,
}

impl BufferParams {
    /// Size of the buffer in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.len * self.element.size()
    }

    /// Validates `data` as the new content of a buffer described by `self`,
    /// before anything is uploaded.
    pub fn validate(&self, data: &BufferData) -> Result<()> {
        if self.element != data.element_type() {
            return Err(Error::InvalidData {
                resource: "buffer".into(),
                reason: format!(
                    "expects {:?} elements, got {:?}",
                    self.element,
                    data.element_type()
                ),
            });
        }

        if let Some(index) = data.first_non_finite() {
            return Err(Error::DataIntegrity { index });
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flatten() {
        let positions: &[[f32; 2]] = &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        let data = BufferData::from(positions);
        assert_eq!(data.element_type(), ElementType::F32);
        assert_eq!(data.len(), 6);
        assert_eq!(data.to_bytes().len(), 24);
    }

    #[test]
    fn validate() {
        let params = BufferParams {
            target: BufferTarget::Vertex,
            usage: BufferUsage::Dynamic,
            element: ElementType::F32,
            len: 3,
        };

        assert!(params.validate(&BufferData::from(vec![1.0f32, 2.0])).is_ok());

        match params.validate(&BufferData::from(vec![1.0f32, ::std::f32::NAN])) {
            Err(Error::DataIntegrity { index }) => assert_eq!(index, 1),
            other => panic!("unexpected {:?}", other),
        }

        match params.validate(&BufferData::from(vec![1u16, 2])) {
            Err(Error::InvalidData { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
