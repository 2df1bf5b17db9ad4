//! Vertex records and vertex buffer layouts.
use std::mem;

use crate::{vk, Error, Format, PrimitiveTopology, VertexInputRate};

/// Trait implemented by types that represent vertex data in a vertex buffer.
///
/// Use `#[derive(Vertex)]` on a `#[repr(C)]` struct to implement it. The attribute offsets
/// are read from the host-side layout of the struct.
///
/// # Safety
///
/// `ATTRIBUTES` must describe fields of `Self`, in increasing offset order.
pub unsafe trait Vertex: Copy + 'static {
    const ATTRIBUTES: &'static [VertexAttributeDescription];
}

/// Description of a vertex attribute within a vertex layout.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VertexAttributeDescription {
    pub format: Format,
    pub offset: u32,
}

/// Trait implemented by types that can serve as a vertex attribute.
///
/// # Safety
///
/// The in-memory representation of the type must match `FORMAT` exactly.
pub unsafe trait VertexAttribute {
    /// Returns the corresponding data format (the layout of the data in memory).
    const FORMAT: Format;
}

/// Wrapper type for normalized integer attributes.
///
/// Helper for `normalized` in `derive(Vertex)`.
#[doc(hidden)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Norm<T>(pub T);

macro_rules! impl_vertex_attr {
    ($t:ty, $fmt:ident) => {
        unsafe impl VertexAttribute for $t {
            const FORMAT: Format = Format::$fmt;
        }
    };
}

// F32
impl_vertex_attr!(f32, R32_SFLOAT);
impl_vertex_attr!([f32; 2], R32G32_SFLOAT);
impl_vertex_attr!([f32; 3], R32G32B32_SFLOAT);
impl_vertex_attr!([f32; 4], R32G32B32A32_SFLOAT);

// U32
impl_vertex_attr!(u32, R32_UINT);
impl_vertex_attr!([u32; 2], R32G32_UINT);
impl_vertex_attr!([u32; 3], R32G32B32_UINT);
impl_vertex_attr!([u32; 4], R32G32B32A32_UINT);

impl_vertex_attr!(i32, R32_SINT);
impl_vertex_attr!([i32; 2], R32G32_SINT);
impl_vertex_attr!([i32; 3], R32G32B32_SINT);
impl_vertex_attr!([i32; 4], R32G32B32A32_SINT);

// U16
impl_vertex_attr!(u16, R16_UINT);
impl_vertex_attr!([u16; 2], R16G16_UINT);
impl_vertex_attr!([u16; 3], R16G16B16_UINT);
impl_vertex_attr!([u16; 4], R16G16B16A16_UINT);

impl_vertex_attr!(i16, R16_SINT);
impl_vertex_attr!([i16; 2], R16G16_SINT);
impl_vertex_attr!([i16; 3], R16G16B16_SINT);
impl_vertex_attr!([i16; 4], R16G16B16A16_SINT);

// UNORM16
impl_vertex_attr!(Norm<u16>, R16_UNORM);
impl_vertex_attr!(Norm<[u16; 2]>, R16G16_UNORM);
impl_vertex_attr!(Norm<[u16; 3]>, R16G16B16_UNORM);
impl_vertex_attr!(Norm<[u16; 4]>, R16G16B16A16_UNORM);

// SNORM16
impl_vertex_attr!(Norm<i16>, R16_SNORM);
impl_vertex_attr!(Norm<[i16; 2]>, R16G16_SNORM);
impl_vertex_attr!(Norm<[i16; 3]>, R16G16B16_SNORM);
impl_vertex_attr!(Norm<[i16; 4]>, R16G16B16A16_SNORM);

// U8
impl_vertex_attr!(u8, R8_UINT);
impl_vertex_attr!([u8; 2], R8G8_UINT);
impl_vertex_attr!([u8; 3], R8G8B8_UINT);
impl_vertex_attr!([u8; 4], R8G8B8A8_UINT);

impl_vertex_attr!(Norm<u8>, R8_UNORM);
impl_vertex_attr!(Norm<[u8; 2]>, R8G8_UNORM);
impl_vertex_attr!(Norm<[u8; 3]>, R8G8B8_UNORM);
impl_vertex_attr!(Norm<[u8; 4]>, R8G8B8A8_UNORM);

impl_vertex_attr!(i8, R8_SINT);
impl_vertex_attr!([i8; 2], R8G8_SINT);
impl_vertex_attr!([i8; 3], R8G8B8_SINT);
impl_vertex_attr!([i8; 4], R8G8B8A8_SINT);

impl_vertex_attr!(Norm<i8>, R8_SNORM);
impl_vertex_attr!(Norm<[i8; 2]>, R8G8_SNORM);
impl_vertex_attr!(Norm<[i8; 3]>, R8G8B8_SNORM);
impl_vertex_attr!(Norm<[i8; 4]>, R8G8B8A8_SNORM);

// Vertex types from glam --------------------------------------------------------------------------

#[cfg(feature = "glam")]
impl_vertex_attr!(glam::Vec2, R32G32_SFLOAT);
#[cfg(feature = "glam")]
impl_vertex_attr!(glam::Vec3, R32G32B32_SFLOAT);
#[cfg(feature = "glam")]
impl_vertex_attr!(glam::Vec4, R32G32B32A32_SFLOAT);

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Memory layout of the elements of one vertex buffer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    /// Byte distance between consecutive elements.
    pub stride: u32,
    pub input_rate: VertexInputRate,
    pub attributes: Vec<VertexAttributeDescription>,
}

impl VertexBufferLayout {
    /// Starts describing a layout attribute by attribute.
    pub fn builder(input_rate: VertexInputRate) -> VertexLayoutBuilder {
        VertexLayoutBuilder {
            input_rate,
            attributes: vec![],
            offset: 0,
        }
    }

    /// Returns the layout of a vertex record type.
    ///
    /// Fails if the attributes declared by `V` are not tightly packed in declaration order,
    /// or if they don't cover the whole record (padding or undeclared fields).
    pub fn of<V: Vertex>(input_rate: VertexInputRate) -> Result<VertexBufferLayout, Error> {
        let type_name = std::any::type_name::<V>();
        if V::ATTRIBUTES.is_empty() {
            return Err(Error::LayoutMismatch(format!("`{type_name}` declares no vertex attributes")));
        }
        let mut offset = 0u32;
        for (i, attr) in V::ATTRIBUTES.iter().enumerate() {
            if attr.offset != offset {
                return Err(Error::LayoutMismatch(format!(
                    "attribute {i} of `{type_name}` is at offset {}, expected {offset}",
                    attr.offset
                )));
            }
            offset += attr.format.byte_size();
        }
        let size = mem::size_of::<V>();
        if offset as usize != size {
            return Err(Error::LayoutMismatch(format!(
                "attributes of `{type_name}` span {offset} bytes but the record is {size} bytes"
            )));
        }
        Ok(VertexBufferLayout {
            stride: offset,
            input_rate,
            attributes: V::ATTRIBUTES.to_vec(),
        })
    }

    /// Number of bytes occupied by `count` elements.
    pub fn byte_size(&self, count: u32) -> u64 {
        self.stride as u64 * count as u64
    }

    pub fn to_vk_binding(&self, binding: u32) -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding,
            stride: self.stride,
            input_rate: self.input_rate.to_vk_vertex_input_rate(),
        }
    }

    pub fn to_vk_attributes(&self, binding: u32, base_location: u32) -> Vec<vk::VertexInputAttributeDescription> {
        self.attributes
            .iter()
            .enumerate()
            .map(|(i, attr)| vk::VertexInputAttributeDescription {
                location: base_location + i as u32,
                binding,
                format: attr.format.to_vk_format(),
                offset: attr.offset,
            })
            .collect()
    }
}

/// Builds a `VertexBufferLayout` from a list of attribute formats.
///
/// # Examples
///
/// ```
/// use bindery::{Format, VertexBufferLayout, VertexInputRate};
///
/// let layout = VertexBufferLayout::builder(VertexInputRate::Vertex)
///     .attribute(Format::R32G32B32_SFLOAT)
///     .attribute(Format::R32G32_SFLOAT)
///     .build();
/// assert_eq!(layout.stride, 20);
/// assert_eq!(layout.attributes[1].offset, 12);
/// ```
#[derive(Clone, Debug)]
pub struct VertexLayoutBuilder {
    input_rate: VertexInputRate,
    attributes: Vec<VertexAttributeDescription>,
    offset: u32,
}

impl VertexLayoutBuilder {
    /// Appends an attribute right after the previous one.
    pub fn attribute(mut self, format: Format) -> Self {
        self.attributes.push(VertexAttributeDescription {
            format,
            offset: self.offset,
        });
        self.offset += format.byte_size();
        self
    }

    pub fn build(self) -> VertexBufferLayout {
        VertexBufferLayout {
            stride: self.offset,
            input_rate: self.input_rate,
            attributes: self.attributes,
        }
    }
}

/// Vertex layout consumed by a graphics pipeline.
///
/// Buffer `i` is fetched from vertex buffer slot `i`. Shader locations are assigned
/// sequentially across buffers, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexInputState {
    pub topology: PrimitiveTopology,
    pub buffers: Vec<VertexBufferLayout>,
}

impl VertexInputState {
    pub fn new(topology: PrimitiveTopology) -> VertexInputState {
        VertexInputState {
            topology,
            buffers: vec![],
        }
    }

    /// Adds a buffer layout at the next slot.
    pub fn buffer(mut self, layout: VertexBufferLayout) -> Self {
        self.buffers.push(layout);
        self
    }

    /// Total number of attributes across all buffers.
    pub fn attribute_count(&self) -> usize {
        self.buffers.iter().map(|b| b.attributes.len()).sum()
    }

    /// Returns the shader location of an attribute, or `None` if there's no such attribute.
    pub fn location_of(&self, buffer: usize, attribute: usize) -> Option<u32> {
        let layout = self.buffers.get(buffer)?;
        if attribute >= layout.attributes.len() {
            return None;
        }
        let base: usize = self.buffers[..buffer].iter().map(|b| b.attributes.len()).sum();
        Some((base + attribute) as u32)
    }

    /// Returns the format of the attribute at the given shader location.
    pub fn format_at(&self, location: u32) -> Option<Format> {
        self.buffers
            .iter()
            .flat_map(|b| b.attributes.iter())
            .nth(location as usize)
            .map(|a| a.format)
    }

    pub fn to_vk_bindings(&self) -> Vec<vk::VertexInputBindingDescription> {
        self.buffers
            .iter()
            .enumerate()
            .map(|(i, b)| b.to_vk_binding(i as u32))
            .collect()
    }

    pub fn to_vk_attributes(&self) -> Vec<vk::VertexInputAttributeDescription> {
        let mut location = 0;
        let mut attributes = vec![];
        for (i, b) in self.buffers.iter().enumerate() {
            attributes.extend(b.to_vk_attributes(i as u32, location));
            location += b.attributes.len() as u32;
        }
        attributes
    }
}
