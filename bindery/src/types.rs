use std::fmt;

use ash::vk;
use bitflags::bitflags;

////////////////////////////////////////////////////////////////////////////////////////////////////
// FORMATS

/// Numeric interpretation of the components of a format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Uint,
    Sint,
    Unorm,
    Snorm,
    Float,
    Srgb,
    Depth,
}

macro_rules! formats {
    ($($name:ident => ($size:expr, $components:expr, $kind:ident)),* $(,)?) => {
        /// Layout of a vertex attribute or of a texel.
        ///
        /// Formats have at most 4 components. Data wider than that must be split over several
        /// vertex attributes, or be bound through a storage buffer instead.
        #[allow(non_camel_case_types)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum Format {
            $($name,)*
        }

        impl Format {
            /// Size of one element in bytes.
            pub const fn byte_size(self) -> u32 {
                match self {
                    $(Self::$name => $size,)*
                }
            }

            /// Number of components (1 to 4).
            pub const fn component_count(self) -> u32 {
                match self {
                    $(Self::$name => $components,)*
                }
            }

            pub const fn kind(self) -> FormatKind {
                match self {
                    $(Self::$name => FormatKind::$kind,)*
                }
            }

            pub const fn to_vk_format(self) -> vk::Format {
                match self {
                    $(Self::$name => vk::Format::$name,)*
                }
            }
        }
    };
}

formats! {
    // 8-bit
    R8_UINT => (1, 1, Uint),
    R8G8_UINT => (2, 2, Uint),
    R8G8B8_UINT => (3, 3, Uint),
    R8G8B8A8_UINT => (4, 4, Uint),
    R8_SINT => (1, 1, Sint),
    R8G8_SINT => (2, 2, Sint),
    R8G8B8_SINT => (3, 3, Sint),
    R8G8B8A8_SINT => (4, 4, Sint),
    R8_UNORM => (1, 1, Unorm),
    R8G8_UNORM => (2, 2, Unorm),
    R8G8B8_UNORM => (3, 3, Unorm),
    R8G8B8A8_UNORM => (4, 4, Unorm),
    R8_SNORM => (1, 1, Snorm),
    R8G8_SNORM => (2, 2, Snorm),
    R8G8B8_SNORM => (3, 3, Snorm),
    R8G8B8A8_SNORM => (4, 4, Snorm),
    R8G8B8A8_SRGB => (4, 4, Srgb),
    B8G8R8A8_UNORM => (4, 4, Unorm),
    B8G8R8A8_SRGB => (4, 4, Srgb),
    // 16-bit
    R16_UINT => (2, 1, Uint),
    R16G16_UINT => (4, 2, Uint),
    R16G16B16_UINT => (6, 3, Uint),
    R16G16B16A16_UINT => (8, 4, Uint),
    R16_SINT => (2, 1, Sint),
    R16G16_SINT => (4, 2, Sint),
    R16G16B16_SINT => (6, 3, Sint),
    R16G16B16A16_SINT => (8, 4, Sint),
    R16_UNORM => (2, 1, Unorm),
    R16G16_UNORM => (4, 2, Unorm),
    R16G16B16_UNORM => (6, 3, Unorm),
    R16G16B16A16_UNORM => (8, 4, Unorm),
    R16_SNORM => (2, 1, Snorm),
    R16G16_SNORM => (4, 2, Snorm),
    R16G16B16_SNORM => (6, 3, Snorm),
    R16G16B16A16_SNORM => (8, 4, Snorm),
    R16G16_SFLOAT => (4, 2, Float),
    R16G16B16A16_SFLOAT => (8, 4, Float),
    // 32-bit
    R32_UINT => (4, 1, Uint),
    R32G32_UINT => (8, 2, Uint),
    R32G32B32_UINT => (12, 3, Uint),
    R32G32B32A32_UINT => (16, 4, Uint),
    R32_SINT => (4, 1, Sint),
    R32G32_SINT => (8, 2, Sint),
    R32G32B32_SINT => (12, 3, Sint),
    R32G32B32A32_SINT => (16, 4, Sint),
    R32_SFLOAT => (4, 1, Float),
    R32G32_SFLOAT => (8, 2, Float),
    R32G32B32_SFLOAT => (12, 3, Float),
    R32G32B32A32_SFLOAT => (16, 4, Float),
    // depth
    D32_SFLOAT => (4, 1, Depth),
}

impl Format {
    pub const fn is_depth(self) -> bool {
        matches!(self.kind(), FormatKind::Depth)
    }

    /// Whether the format can be used as the color target of a render pass.
    pub const fn is_color_renderable(self) -> bool {
        matches!(
            self,
            Format::R8G8B8A8_UNORM
                | Format::R8G8B8A8_SRGB
                | Format::B8G8R8A8_UNORM
                | Format::B8G8R8A8_SRGB
                | Format::R32G32B32A32_SFLOAT
        )
    }

    /// Encodes a linear RGBA color as one texel of this format.
    ///
    /// Returns `None` if the format is not color-renderable.
    pub fn encode_color(self, color: [f32; 4]) -> Option<Vec<u8>> {
        fn unorm8(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        fn srgb8(v: f32) -> u8 {
            let v = v.clamp(0.0, 1.0);
            let s = if v <= 0.003_130_8 {
                v * 12.92
            } else {
                1.055 * v.powf(1.0 / 2.4) - 0.055
            };
            unorm8(s)
        }
        let [r, g, b, a] = color;
        match self {
            Format::R8G8B8A8_UNORM => Some(vec![unorm8(r), unorm8(g), unorm8(b), unorm8(a)]),
            Format::R8G8B8A8_SRGB => Some(vec![srgb8(r), srgb8(g), srgb8(b), unorm8(a)]),
            Format::B8G8R8A8_UNORM => Some(vec![unorm8(b), unorm8(g), unorm8(r), unorm8(a)]),
            Format::B8G8R8A8_SRGB => Some(vec![srgb8(b), srgb8(g), srgb8(r), unorm8(a)]),
            Format::R32G32B32A32_SFLOAT => Some(color.iter().flat_map(|c| c.to_ne_bytes()).collect()),
            _ => None,
        }
    }
}

impl From<Format> for vk::Format {
    fn from(format: Format) -> Self {
        format.to_vk_format()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// IMAGES

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageType {
    Image1D,
    Image2D,
    Image3D,
}

impl ImageType {
    pub const fn to_vk_image_type(self) -> vk::ImageType {
        match self {
            Self::Image1D => vk::ImageType::TYPE_1D,
            Self::Image2D => vk::ImageType::TYPE_2D,
            Self::Image3D => vk::ImageType::TYPE_3D,
        }
    }
}

impl From<ImageType> for vk::ImageType {
    fn from(ty: ImageType) -> Self {
        ty.to_vk_image_type()
    }
}

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const TRANSFER_SRC = 0b1;
        const TRANSFER_DST = 0b10;
        const SAMPLED = 0b100;
        const STORAGE = 0b1000;
        const COLOR_ATTACHMENT = 0b1_0000;
        const DEPTH_STENCIL_ATTACHMENT = 0b10_0000;
    }
}

impl Default for ImageUsage {
    fn default() -> Self {
        Self::empty()
    }
}

impl ImageUsage {
    pub const fn to_vk_image_usage_flags(self) -> vk::ImageUsageFlags {
        vk::ImageUsageFlags::from_raw(self.bits())
    }
}

impl From<ImageUsage> for vk::ImageUsageFlags {
    fn from(usage: ImageUsage) -> Self {
        usage.to_vk_image_usage_flags()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// BUFFERS

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const TRANSFER_SRC = 0b1;
        const TRANSFER_DST = 0b10;
        const UNIFORM_BUFFER = 0b1_0000;
        const STORAGE_BUFFER = 0b10_0000;
        const INDEX_BUFFER = 0b100_0000;
        const VERTEX_BUFFER = 0b1000_0000;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

impl BufferUsage {
    pub const fn to_vk_buffer_usage_flags(self) -> vk::BufferUsageFlags {
        vk::BufferUsageFlags::from_raw(self.bits())
    }
}

impl From<BufferUsage> for vk::BufferUsageFlags {
    fn from(usage: BufferUsage) -> Self {
        usage.to_vk_buffer_usage_flags()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// SHADER STAGES

bitflags! {
    /// Shader stages that can see a binding.
    #[repr(transparent)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX = 0b1;
        const FRAGMENT = 0b1_0000;
        const COMPUTE = 0b10_0000;
        const ALL_GRAPHICS = Self::VERTEX.bits() | Self::FRAGMENT.bits();
        const ALL = Self::ALL_GRAPHICS.bits() | Self::COMPUTE.bits();
    }
}

impl ShaderStages {
    pub const NONE: ShaderStages = ShaderStages::empty();

    pub const fn to_vk_shader_stage_flags(self) -> vk::ShaderStageFlags {
        vk::ShaderStageFlags::from_raw(self.bits())
    }
}

impl From<ShaderStages> for vk::ShaderStageFlags {
    fn from(stages: ShaderStages) -> Self {
        stages.to_vk_shader_stage_flags()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// VERTEX STATE

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    /// Size of one index in bytes.
    pub const fn byte_size(self) -> u64 {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    pub const fn to_vk_index_type(self) -> vk::IndexType {
        match self {
            Self::U16 => vk::IndexType::UINT16,
            Self::U32 => vk::IndexType::UINT32,
        }
    }
}

impl From<IndexType> for vk::IndexType {
    fn from(ty: IndexType) -> Self {
        ty.to_vk_index_type()
    }
}

/// Whether a vertex buffer advances once per vertex or once per instance.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VertexInputRate {
    #[default]
    Vertex,
    Instance,
}

impl VertexInputRate {
    pub const fn to_vk_vertex_input_rate(self) -> vk::VertexInputRate {
        match self {
            Self::Vertex => vk::VertexInputRate::VERTEX,
            Self::Instance => vk::VertexInputRate::INSTANCE,
        }
    }
}

impl From<VertexInputRate> for vk::VertexInputRate {
    fn from(rate: VertexInputRate) -> Self {
        rate.to_vk_vertex_input_rate()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Whether `count` vertices form whole primitives.
    pub const fn is_valid_vertex_count(self, count: u32) -> bool {
        match self {
            Self::LineList => count % 2 == 0,
            Self::TriangleList => count % 3 == 0,
            _ => true,
        }
    }

    /// Number of primitives assembled from `count` vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use bindery::PrimitiveTopology;
    /// assert_eq!(PrimitiveTopology::TriangleList.primitive_count(9), 3);
    /// assert_eq!(PrimitiveTopology::TriangleStrip.primitive_count(5), 3);
    /// assert_eq!(PrimitiveTopology::LineStrip.primitive_count(1), 0);
    /// ```
    pub const fn primitive_count(self, count: u32) -> u32 {
        match self {
            Self::PointList => count,
            Self::LineList => count / 2,
            Self::LineStrip => count.saturating_sub(1),
            Self::TriangleList => count / 3,
            Self::TriangleStrip => count.saturating_sub(2),
        }
    }

    pub const fn to_vk_primitive_topology(self) -> vk::PrimitiveTopology {
        match self {
            Self::PointList => vk::PrimitiveTopology::POINT_LIST,
            Self::LineList => vk::PrimitiveTopology::LINE_LIST,
            Self::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
            Self::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
            Self::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        }
    }
}

impl From<PrimitiveTopology> for vk::PrimitiveTopology {
    fn from(topology: PrimitiveTopology) -> Self {
        topology.to_vk_primitive_topology()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_sizes() {
        assert_eq!(Format::R32G32B32_SFLOAT.byte_size(), 12);
        assert_eq!(Format::R32G32B32_SFLOAT.component_count(), 3);
        assert_eq!(Format::R16G16_UNORM.byte_size(), 4);
        assert_eq!(Format::R8G8B8A8_SRGB.kind(), FormatKind::Srgb);
        assert!(Format::D32_SFLOAT.is_depth());
    }

    #[test]
    fn vk_conversions() {
        assert_eq!(vk::Format::from(Format::R32G32_SFLOAT), vk::Format::R32G32_SFLOAT);
        assert_eq!(
            vk::BufferUsageFlags::from(BufferUsage::VERTEX_BUFFER | BufferUsage::TRANSFER_DST),
            vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
        );
        assert_eq!(
            vk::ImageUsageFlags::from(ImageUsage::SAMPLED | ImageUsage::COLOR_ATTACHMENT),
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::COLOR_ATTACHMENT
        );
        assert_eq!(
            vk::ShaderStageFlags::from(ShaderStages::ALL_GRAPHICS),
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
        );
        assert_eq!(vk::ShaderStageFlags::from(ShaderStages::NONE), vk::ShaderStageFlags::empty());
    }

    #[test]
    fn encode_clear_colors() {
        assert_eq!(
            Format::R8G8B8A8_UNORM.encode_color([1.0, 0.0, 0.5, 1.0]),
            Some(vec![255, 0, 128, 255])
        );
        assert_eq!(
            Format::B8G8R8A8_UNORM.encode_color([1.0, 0.0, 0.0, 1.0]),
            Some(vec![0, 0, 255, 255])
        );
        assert_eq!(Format::R8G8B8A8_SRGB.encode_color([0.5, 0.0, 1.0, 1.0]), Some(vec![188, 0, 255, 255]));
        assert_eq!(Format::R32_UINT.encode_color([0.0; 4]), None);
    }
}
