use bindery::{Format, Vertex, VertexAttributeDescription, VertexBufferLayout, VertexInputRate};

#[repr(C)]
#[derive(Copy, Clone, Vertex)]
struct PositionColor {
    position: [f32; 3],
    color: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Vertex)]
struct PackedVertex {
    position: [f32; 2],
    #[normalized]
    color: [u8; 4],
    #[normalized]
    normal: [i16; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Vertex)]
struct TupleVertex([f32; 4], u32);

#[repr(C)]
#[derive(Copy, Clone, Vertex)]
struct Padded {
    a: u8,
    b: f32,
}

#[test]
fn named_fields() {
    assert_eq!(
        PositionColor::ATTRIBUTES,
        &[
            VertexAttributeDescription {
                format: Format::R32G32B32_SFLOAT,
                offset: 0
            },
            VertexAttributeDescription {
                format: Format::R32G32B32_SFLOAT,
                offset: 12
            },
        ]
    );
    let layout = VertexBufferLayout::of::<PositionColor>(VertexInputRate::Vertex).unwrap();
    assert_eq!(layout.stride, 24);
    assert_eq!(layout.byte_size(5), 120);
}

#[test]
fn normalized_fields() {
    let formats: Vec<_> = PackedVertex::ATTRIBUTES.iter().map(|a| a.format).collect();
    assert_eq!(
        formats,
        [
            Format::R32G32_SFLOAT,
            Format::R8G8B8A8_UNORM,
            Format::R16G16B16A16_SNORM
        ]
    );
    let offsets: Vec<_> = PackedVertex::ATTRIBUTES.iter().map(|a| a.offset).collect();
    assert_eq!(offsets, [0, 8, 12]);
    assert_eq!(
        VertexBufferLayout::of::<PackedVertex>(VertexInputRate::Instance)
            .unwrap()
            .stride,
        20
    );
}

#[test]
fn tuple_fields() {
    assert_eq!(TupleVertex::ATTRIBUTES[0].format, Format::R32G32B32A32_SFLOAT);
    assert_eq!(TupleVertex::ATTRIBUTES[1].format, Format::R32_UINT);
    assert_eq!(TupleVertex::ATTRIBUTES[1].offset, 16);
}

#[test]
fn padding_is_rejected() {
    // `b` is aligned to 4 bytes, leaving a hole after `a`
    assert_eq!(Padded::ATTRIBUTES[1].offset, 4);
    assert!(VertexBufferLayout::of::<Padded>(VertexInputRate::Vertex).is_err());
}
