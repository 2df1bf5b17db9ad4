use bindery::*;

#[repr(C)]
#[derive(Copy, Clone, Vertex)]
struct TexturedVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

fn textured_layout_entries() -> [BindingLayoutEntry; 2] {
    [
        BindingLayoutEntry {
            binding: 0,
            visibility: ShaderStages::FRAGMENT,
            ty: BindingType::SampledTexture,
        },
        BindingLayoutEntry {
            binding: 1,
            visibility: ShaderStages::FRAGMENT,
            ty: BindingType::Sampler,
        },
    ]
}

fn sampled_texture(device: &Device) -> Image {
    device
        .create_texture("texture", 8, 8, Format::R8G8B8A8_SRGB, ImageUsage::SAMPLED)
        .unwrap()
}

#[test]
fn duplicate_binding_index_is_rejected() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let mut entries = textured_layout_entries();
    entries[1].binding = 0;
    assert!(matches!(
        device.create_binding_layout("dup", &entries),
        Err(Error::DuplicateBinding(0))
    ));
    assert_eq!(device.live_binding_layout_count(), 0);
}

#[test]
fn layout_entries_are_sorted() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let mut entries = textured_layout_entries();
    entries.reverse();
    let layout = device.create_binding_layout("textured", &entries).unwrap();
    assert_eq!(layout.entries()[0].binding, 0);
    assert_eq!(layout.entry(1).unwrap().ty, BindingType::Sampler);
    assert!(layout.entry(2).is_none());
}

#[test]
fn binding_set_must_cover_every_slot() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let layout = device
        .create_binding_layout("textured", &textured_layout_entries())
        .unwrap();
    let texture = sampled_texture(&device);
    let view = texture.create_view();
    let sampler = device.create_sampler(&SamplerCreateInfo::default()).unwrap();

    // missing slot 1
    let result = device.create_binding_set(
        "incomplete",
        &layout,
        &[BindingSetEntry {
            binding: 0,
            resource: BindingResource::TextureView(&view),
        }],
    );
    assert!(matches!(result, Err(Error::BindingMismatch { binding: 1, .. })));

    // slot 0 twice
    let result = device.create_binding_set(
        "twice",
        &layout,
        &[
            BindingSetEntry {
                binding: 0,
                resource: BindingResource::TextureView(&view),
            },
            BindingSetEntry {
                binding: 0,
                resource: BindingResource::TextureView(&view),
            },
            BindingSetEntry {
                binding: 1,
                resource: BindingResource::Sampler(&sampler),
            },
        ],
    );
    assert!(matches!(result, Err(Error::BindingMismatch { binding: 0, .. })));

    // undeclared slot
    let result = device.create_binding_set(
        "extra",
        &layout,
        &[
            BindingSetEntry {
                binding: 0,
                resource: BindingResource::TextureView(&view),
            },
            BindingSetEntry {
                binding: 1,
                resource: BindingResource::Sampler(&sampler),
            },
            BindingSetEntry {
                binding: 3,
                resource: BindingResource::Sampler(&sampler),
            },
        ],
    );
    assert!(matches!(result, Err(Error::BindingMismatch { binding: 3, .. })));

    // kind mismatch
    let result = device.create_binding_set(
        "swapped",
        &layout,
        &[
            BindingSetEntry {
                binding: 0,
                resource: BindingResource::Sampler(&sampler),
            },
            BindingSetEntry {
                binding: 1,
                resource: BindingResource::TextureView(&view),
            },
        ],
    );
    assert!(matches!(result, Err(Error::BindingMismatch { binding: 0, .. })));

    let set = device
        .create_binding_set(
            "textured",
            &layout,
            &[
                BindingSetEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&sampler),
                },
                BindingSetEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&view),
                },
            ],
        )
        .unwrap();
    assert_eq!(set.resources().map(|(b, _)| b).collect::<Vec<_>>(), [0, 1]);
    assert!(set.layout() == &layout);
}

#[test]
fn binding_set_keeps_resources_alive() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let layout = device
        .create_binding_layout(
            "uniforms",
            &[BindingLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::UniformBuffer,
            }],
        )
        .unwrap();
    let buffer = device
        .create_buffer("uniforms", BufferUsage::UNIFORM_BUFFER, &[0u8; 64])
        .unwrap();
    let set = device
        .create_binding_set(
            "uniforms",
            &layout,
            &[BindingSetEntry {
                binding: 0,
                resource: BindingResource::Buffer(buffer.whole()),
            }],
        )
        .unwrap();
    drop(buffer);
    drop(layout);
    assert_eq!(device.live_buffer_count(), 1);
    assert_eq!(device.live_binding_layout_count(), 1);
    drop(set);
    assert_eq!(device.live_buffer_count(), 0);
    assert_eq!(device.live_binding_layout_count(), 0);
}

#[test]
fn samplers_are_deduplicated() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let a = device.create_sampler(&SamplerCreateInfo::default()).unwrap();
    let b = device.create_sampler(&SamplerCreateInfo::default()).unwrap();
    let c = device
        .create_sampler(&SamplerCreateInfo::default().with_address_mode(AddressMode::Repeat))
        .unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(device.sampler_count(), 2);
}

#[test]
fn set_from_equivalent_layout_is_rejected() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let layout = device
        .create_binding_layout("textured", &textured_layout_entries())
        .unwrap();
    let lookalike = device
        .create_binding_layout("textured (copy)", &textured_layout_entries())
        .unwrap();
    assert_ne!(layout, lookalike);

    let texture = sampled_texture(&device);
    let view = texture.create_view();
    let sampler = device.create_sampler(&SamplerCreateInfo::default()).unwrap();
    let entries = [
        BindingSetEntry {
            binding: 0,
            resource: BindingResource::TextureView(&view),
        },
        BindingSetEntry {
            binding: 1,
            resource: BindingResource::Sampler(&sampler),
        },
    ];
    let set = device.create_binding_set("set", &layout, &entries).unwrap();
    let other_set = device.create_binding_set("other", &lookalike, &entries).unwrap();

    let vertex_layout = VertexBufferLayout::of::<TexturedVertex>(VertexInputRate::Vertex).unwrap();
    let pipeline = device
        .graphics_pipeline("textured")
        .vertex_input(VertexInputState::new(PrimitiveTopology::TriangleList).buffer(vertex_layout))
        .unwrap()
        .binding_layouts(&[layout.clone()])
        .unwrap()
        .build()
        .unwrap();
    let vertices = device
        .create_vertex_buffer("quad", &[TexturedVertex { position: [0.0; 2], uv: [0.0; 2] }; 6], VertexInputRate::Vertex)
        .unwrap();
    let target = device
        .create_texture("target", 16, 16, Format::R8G8B8A8_UNORM, ImageUsage::COLOR_ATTACHMENT)
        .unwrap();

    let mut encoder = device.create_command_encoder("draw");
    let view = target.create_view();
    let mut pass = encoder.begin_render_pass(&view, None).unwrap();
    pass.bind_pipeline(&pipeline).unwrap();
    pass.bind_vertex_buffer(0, vertices.whole()).unwrap();
    // set 0 not bound yet
    assert!(matches!(pass.draw(0..6, 0..1), Err(Error::LayoutMismatch(_))));
    assert!(matches!(
        pass.bind_binding_set(0, &other_set),
        Err(Error::LayoutMismatch(_))
    ));
    // the pipeline only declares set 0
    assert!(matches!(pass.bind_binding_set(1, &set), Err(Error::LayoutMismatch(_))));
    pass.bind_binding_set(0, &set).unwrap();
    pass.draw(0..6, 0..1).unwrap();
}

#[test]
fn binding_layout_size_is_limited() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo {
        limits: Limits::downlevel(),
        ..Default::default()
    });
    let max = device.limits().max_bindings_per_layout;
    let entries: Vec<_> = (0..=max)
        .map(|binding| BindingLayoutEntry {
            binding,
            visibility: ShaderStages::ALL,
            ty: BindingType::UniformBuffer,
        })
        .collect();
    assert!(matches!(
        device.create_binding_layout("big", &entries),
        Err(Error::LimitExceeded { .. })
    ));
    assert!(device.create_binding_layout("ok", &entries[..max as usize]).is_ok());
}
