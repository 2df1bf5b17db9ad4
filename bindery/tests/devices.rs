use bindery::*;

#[repr(C)]
#[derive(Copy, Clone, Vertex)]
struct Position {
    position: [f32; 2],
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn two_devices() -> ((Device, Queue), (Device, Queue)) {
    init_logging();
    let a = create_device_and_queue(&DeviceCreateInfo {
        label: "a".to_string(),
        ..Default::default()
    });
    let b = create_device_and_queue(&DeviceCreateInfo {
        label: "b".to_string(),
        ..Default::default()
    });
    (a, b)
}

fn sampler_entry(sampler: &Sampler) -> BindingSetEntry<'_> {
    BindingSetEntry {
        binding: 0,
        resource: BindingResource::Sampler(sampler),
    }
}

fn is_foreign<T>(result: Result<T, Error>) -> bool {
    matches!(result, Err(Error::ForeignResource { .. }))
}

#[test]
fn host_access_to_a_foreign_buffer_fails() {
    let ((a, _qa), (b, _qb)) = two_devices();
    let on_a = a.create_buffer_uninit("on a", BufferUsage::STORAGE_BUFFER, 4).unwrap();
    let on_b = b.create_buffer_uninit("on b", BufferUsage::STORAGE_BUFFER, 4).unwrap();

    assert!(is_foreign(a.write_buffer(&on_b, 0, &[9; 4])));
    assert!(is_foreign(a.read_buffer(on_b.whole())));
    assert_eq!(a.read_buffer(on_a.whole()).unwrap(), vec![0; 4]);
    assert_eq!(b.read_buffer(on_b.whole()).unwrap(), vec![0; 4]);
}

#[test]
fn foreign_command_list_is_rejected_by_the_queue() {
    let ((a, mut qa), (b, _qb)) = two_devices();
    let _on_a = a
        .create_buffer("on a", BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST, &[1; 4])
        .unwrap();
    let src = b.create_buffer("src", BufferUsage::TRANSFER_SRC, &[5; 4]).unwrap();
    let dst = b.create_buffer_uninit("dst", BufferUsage::TRANSFER_DST, 4).unwrap();
    let mut encoder = b.create_command_encoder("copy on b");
    encoder.copy_buffer_to_buffer(src.whole(), &dst, 0).unwrap();

    assert!(is_foreign(qa.submit([encoder.finish()])));
    assert_eq!(qa.last_submission(), None);
    assert_eq!(b.read_buffer(dst.whole()).unwrap(), vec![0; 4]);
}

#[test]
fn encoder_rejects_foreign_resources() {
    let ((a, _qa), (b, _qb)) = two_devices();
    let src = b.create_buffer("src", BufferUsage::TRANSFER_SRC, &[5; 4]).unwrap();
    let dst = a.create_buffer_uninit("dst", BufferUsage::TRANSFER_DST, 4).unwrap();
    let image = b
        .create_texture(
            "image",
            1,
            1,
            Format::R8G8B8A8_UNORM,
            ImageUsage::TRANSFER_DST | ImageUsage::COLOR_ATTACHMENT,
        )
        .unwrap();

    let mut encoder = a.create_command_encoder("a");
    assert!(is_foreign(encoder.copy_buffer_to_buffer(src.whole(), &dst, 0)));
    assert!(is_foreign(encoder.upload_pixels(&image, &[0; 4], 4, 1)));
    assert!(is_foreign(encoder.begin_render_pass(&image.create_view(), None)));
    assert_eq!(encoder.command_count(), 0);
}

#[test]
fn render_pass_rejects_foreign_bindings() {
    let ((a, _qa), (b, _qb)) = two_devices();
    let target = a
        .create_texture("target", 4, 4, Format::R8G8B8A8_UNORM, ImageUsage::COLOR_ATTACHMENT)
        .unwrap();
    let layout = VertexBufferLayout::builder(VertexInputRate::Vertex)
        .attribute(Format::R32G32_SFLOAT)
        .build();
    let foreign_pipeline = b
        .graphics_pipeline("on b")
        .vertex_input(VertexInputState::new(PrimitiveTopology::TriangleList).buffer(layout))
        .unwrap()
        .binding_layouts(&[])
        .unwrap()
        .build()
        .unwrap();
    let foreign_vertices = b
        .create_vertex_buffer("vertices", &[Position { position: [0.0; 2] }; 3], VertexInputRate::Vertex)
        .unwrap();
    let foreign_indices = b.create_index_buffer("indices", &[0u16, 1, 2]).unwrap();

    let mut encoder = a.create_command_encoder("a");
    let view = target.create_view();
    let mut pass = encoder.begin_render_pass(&view, None).unwrap();
    assert!(is_foreign(pass.bind_pipeline(&foreign_pipeline)));
    assert!(is_foreign(pass.bind_vertex_buffer(0, foreign_vertices.whole())));
    assert!(is_foreign(pass.bind_index_buffer(foreign_indices.whole(), IndexType::U16)));
}

#[test]
fn layouts_and_sets_do_not_cross_devices() {
    let ((a, _qa), (b, _qb)) = two_devices();
    let entries = [BindingLayoutEntry {
        binding: 0,
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Sampler,
    }];
    // first layout of each device: same arena key on both
    let layout_a = a.create_binding_layout("layout", &entries).unwrap();
    let layout_b = b.create_binding_layout("layout", &entries).unwrap();
    assert_eq!(layout_a.id(), layout_b.id());
    assert_ne!(layout_a, layout_b);

    let sampler_a = a.create_sampler(&SamplerCreateInfo::default()).unwrap();
    let sampler_b = b.create_sampler(&SamplerCreateInfo::default()).unwrap();
    assert_eq!(sampler_a.id(), sampler_b.id());
    assert_ne!(sampler_a, sampler_b);

    assert!(is_foreign(a.create_binding_set("set", &layout_b, &[sampler_entry(&sampler_b)])));
    assert!(is_foreign(a.create_binding_set("set", &layout_a, &[sampler_entry(&sampler_b)])));
    let set = a.create_binding_set("set", &layout_a, &[sampler_entry(&sampler_a)]).unwrap();

    let vertex_layout = VertexBufferLayout::builder(VertexInputRate::Vertex)
        .attribute(Format::R32G32_SFLOAT)
        .build();
    let mut builder = a.graphics_pipeline("a");
    builder
        .vertex_input(VertexInputState::new(PrimitiveTopology::TriangleList).buffer(vertex_layout))
        .unwrap();
    assert!(is_foreign(builder.binding_layouts(&[layout_b.clone()])));
    assert_eq!(builder.state(), PipelineState::VertexLayoutBound);

    let target = b
        .create_texture("target", 4, 4, Format::R8G8B8A8_UNORM, ImageUsage::COLOR_ATTACHMENT)
        .unwrap();
    let mut encoder = b.create_command_encoder("b");
    let view = target.create_view();
    let mut pass = encoder.begin_render_pass(&view, None).unwrap();
    assert!(is_foreign(pass.bind_binding_set(0, &set)));
}
