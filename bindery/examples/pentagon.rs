//! Draws an indexed pentagon into an offscreen target.
//!
//! Usage: `cargo run --example pentagon [texture.png]`
use std::{env, f32::consts::TAU, fs};

use bindery::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[repr(C)]
#[derive(Copy, Clone, Vertex)]
struct PentagonVertex {
    position: [f32; 2],
    uv: [f32; 2],
    #[normalized]
    color: [u8; 4],
}

#[derive(Arguments)]
struct Material<'a> {
    #[argument(binding = 0, sampled_image, stages(fragment))]
    texture: &'a ImageView,
    #[argument(binding = 1, sampler, stages(fragment))]
    sampler: &'a Sampler,
    #[argument(binding = 2, uniform, stages(vertex))]
    transform: &'a Buffer,
}

fn checkerboard(size: u32) -> TextureData {
    let pixels = (0..size)
        .flat_map(|y| (0..size).flat_map(move |x| if (x / 8 + y / 8) % 2 == 0 { [255; 4] } else { [40, 40, 40, 255] }))
        .collect();
    TextureData::from_raw(size, size, Format::R8G8B8A8_SRGB, pixels).unwrap()
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (device, mut queue) = create_device_and_queue(&DeviceCreateInfo {
        label: "pentagon".to_string(),
        ..Default::default()
    });

    // vertices: four around the rim and the center
    let vertices: Vec<PentagonVertex> = (0..4)
        .map(|i| {
            let angle = i as f32 * TAU / 5.0;
            let (s, c) = angle.sin_cos();
            PentagonVertex {
                position: [c, s],
                uv: [0.5 + 0.5 * c, 0.5 + 0.5 * s],
                color: [255, (i * 60) as u8, 0, 255],
            }
        })
        .chain(std::iter::once(PentagonVertex {
            position: [0.0, 0.0],
            uv: [0.5, 0.5],
            color: [255; 4],
        }))
        .collect();
    let indices = IndexList::new(vec![0u16, 1, 4, 1, 2, 4, 2, 3, 4], PrimitiveTopology::TriangleList, 5).unwrap();

    let vertex_layout = VertexBufferLayout::of::<PentagonVertex>(VertexInputRate::Vertex).unwrap();
    println!(
        "vertex stride: {} bytes, {} triangles, {} bytes of vertices instead of {}",
        vertex_layout.stride,
        indices.triangle_count(),
        vertex_layout.byte_size(vertices.len() as u32),
        vertex_layout.byte_size(indices.len() as u32),
    );

    let vertex_buffer = device
        .create_vertex_buffer("pentagon vertices", &vertices, VertexInputRate::Vertex)
        .unwrap();
    let index_buffer = device.create_index_buffer("pentagon indices", indices.indices()).unwrap();

    let texture_data = match env::args().nth(1) {
        Some(path) => {
            let bytes = fs::read(&path).expect("could not read texture file");
            TextureData::decode(&bytes).expect("could not decode texture")
        }
        None => checkerboard(64),
    };

    let mut encoder = device.create_command_encoder("frame");
    let texture = device
        .create_texture_with_data(&mut encoder, "pentagon texture", &texture_data, ImageUsage::SAMPLED)
        .unwrap();
    let texture_view = texture.create_view();
    let sampler = device
        .create_sampler(&SamplerCreateInfo::default().with_address_mode(AddressMode::Repeat))
        .unwrap();
    let identity: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];
    let transform_bytes: Vec<u8> = identity.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let transform = device
        .create_buffer("transform", BufferUsage::UNIFORM_BUFFER, &transform_bytes)
        .unwrap();

    let material_layout = device.create_binding_layout_for::<Material>("material").unwrap();
    let material = device
        .create_binding_set_for(
            "material",
            &material_layout,
            &Material {
                texture: &texture_view,
                sampler: &sampler,
                transform: &transform,
            },
        )
        .unwrap();

    let pipeline = device
        .graphics_pipeline("pentagon")
        .vertex_input(VertexInputState::new(PrimitiveTopology::TriangleList).buffer(vertex_layout))
        .unwrap()
        .binding_layouts(&[material_layout])
        .unwrap()
        .shader_interface(
            ShaderInterface::new()
                .input(0, Format::R32G32_SFLOAT)
                .input(1, Format::R32G32_SFLOAT)
                .input(2, Format::R8G8B8A8_UNORM)
                .binding(0, 0, BindingType::SampledTexture)
                .binding(0, 1, BindingType::Sampler)
                .binding(0, 2, BindingType::UniformBuffer),
        )
        .build()
        .unwrap();

    let target = device
        .create_texture(
            "color target",
            256,
            256,
            Format::R8G8B8A8_UNORM,
            ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_SRC,
        )
        .unwrap();
    let target_view = target.create_view();
    {
        let mut pass = encoder
            .begin_render_pass(&target_view, Some([0.1, 0.1, 0.1, 1.0]))
            .unwrap();
        pass.bind_pipeline(&pipeline).unwrap();
        pass.bind_vertex_buffer(0, vertex_buffer.whole()).unwrap();
        pass.bind_index_buffer(index_buffer.whole(), IndexType::U16).unwrap();
        pass.bind_binding_set(0, &material).unwrap();
        pass.draw_indexed(0..indices.len() as u32, 0, 0..1).unwrap();
        pass.end();
    }

    queue.submit([encoder.finish()]).unwrap();
    println!("{:?}", queue.stats());
}
