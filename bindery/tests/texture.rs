use ::image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
use bindery::*;

const SIZE: u32 = 256;

fn gradient(width: u32, height: u32) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).flat_map(move |x| [x as u8, y as u8, (x ^ y) as u8, 255]))
        .collect()
}

fn readback(device: &Device, queue: &mut Queue, image: &Image) -> Vec<u8> {
    let buffer = device
        .create_buffer_uninit("readback", BufferUsage::TRANSFER_DST, image.byte_size())
        .unwrap();
    let mut encoder = device.create_command_encoder("readback");
    encoder
        .copy_image_to_buffer(image, &buffer, 0, tight_row_pitch(image.width(), image.format()))
        .unwrap();
    queue.submit([encoder.finish()]).unwrap();
    device.read_buffer(buffer.whole()).unwrap()
}

fn rgba_texture(device: &Device) -> Image {
    device
        .create_texture(
            "texture",
            SIZE,
            SIZE,
            Format::R8G8B8A8_UNORM,
            ImageUsage::SAMPLED | ImageUsage::TRANSFER_DST | ImageUsage::TRANSFER_SRC,
        )
        .unwrap()
}

#[test]
fn short_row_pitch_fails_upload() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let texture = rgba_texture(&device);
    let pixels = gradient(SIZE, SIZE);
    let mut encoder = device.create_command_encoder("upload");
    assert!(matches!(
        encoder.upload_pixels(&texture, &pixels, 900, SIZE),
        Err(Error::InvalidArgument(_))
    ));
    // not a whole number of texels
    assert!(encoder.upload_pixels(&texture, &pixels, 1026, SIZE).is_err());
    assert_eq!(encoder.command_count(), 0);
    encoder.upload_pixels(&texture, &pixels, 1024, SIZE).unwrap();
    assert_eq!(encoder.command_count(), 1);
}

#[test]
fn upload_round_trip() {
    let (device, mut queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let texture = rgba_texture(&device);
    let pixels = gradient(SIZE, SIZE);

    let mut encoder = device.create_command_encoder("upload");
    encoder.upload_pixels(&texture, &pixels, 1024, SIZE).unwrap();
    // nothing is written until submission
    assert_eq!(readback(&device, &mut queue, &texture), vec![0; pixels.len()]);

    queue.submit([encoder.finish()]).unwrap();
    assert_eq!(readback(&device, &mut queue, &texture), pixels);
}

#[test]
fn padded_rows_are_skipped() {
    let (device, mut queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let texture = device
        .create_texture(
            "small",
            3,
            2,
            Format::R8G8B8A8_UNORM,
            ImageUsage::TRANSFER_DST | ImageUsage::TRANSFER_SRC,
        )
        .unwrap();
    let tight = gradient(3, 2);
    // rows of 12 bytes, 16 bytes apart
    let mut padded = vec![0xAA; 16 + 12];
    padded[..12].copy_from_slice(&tight[..12]);
    padded[16..].copy_from_slice(&tight[12..]);

    let mut encoder = device.create_command_encoder("upload");
    assert!(matches!(
        encoder.upload_pixels(&texture, &padded[..27], 16, 2),
        Err(Error::SourceDataInvalid(_))
    ));
    encoder.upload_pixels(&texture, &padded, 16, 2).unwrap();
    queue.submit([encoder.finish()]).unwrap();
    assert_eq!(readback(&device, &mut queue, &texture), tight);
}

#[test]
fn copy_height_is_checked() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let texture = device
        .create_texture("small", 4, 4, Format::R8G8B8A8_UNORM, ImageUsage::TRANSFER_DST)
        .unwrap();
    let staging = device
        .create_buffer("staging", BufferUsage::TRANSFER_SRC, &[0u8; 64])
        .unwrap();
    let mut encoder = device.create_command_encoder("copy");
    assert!(matches!(
        encoder.copy_buffer_to_image(staging.whole(), 16, &texture, 5),
        Err(Error::OutOfRange { .. })
    ));
    assert!(matches!(
        encoder.copy_buffer_to_image(staging.slice(16, 48).unwrap(), 16, &texture, 4),
        Err(Error::OutOfRange { .. })
    ));
    encoder.copy_buffer_to_image(staging.whole(), 16, &texture, 4).unwrap();
}

#[test]
fn texture_dimensions_are_limited() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo {
        limits: Limits::downlevel(),
        ..Default::default()
    });
    let max = device.limits().max_texture_dimension_2d;
    assert!(matches!(
        device.create_texture("huge", max + 1, 1, Format::R8_UNORM, ImageUsage::SAMPLED),
        Err(Error::LimitExceeded { .. })
    ));
    assert!(device.create_texture("empty", 0, 1, Format::R8_UNORM, ImageUsage::SAMPLED).is_err());
    assert_eq!(device.live_image_count(), 0);
}

#[test]
fn undecodable_bytes_allocate_nothing() {
    let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let result = TextureData::decode(b"definitely not a png");
    assert!(matches!(result, Err(Error::SourceDataInvalid(_))));
    assert_eq!(device.live_image_count(), 0);
    assert_eq!(device.live_buffer_count(), 0);

    assert!(matches!(
        TextureData::from_raw(4, 4, Format::R8G8B8A8_UNORM, vec![0; 63]),
        Err(Error::SourceDataInvalid(_))
    ));
}

#[test]
fn decoded_png_is_uploaded() {
    let (device, mut queue) = create_device_and_queue(&DeviceCreateInfo::default());
    let pixels = gradient(5, 3);
    let mut png = vec![];
    PngEncoder::new(&mut png)
        .write_image(&pixels, 5, 3, ColorType::Rgba8)
        .unwrap();

    let data = TextureData::decode(&png).unwrap();
    assert_eq!((data.width, data.height), (5, 3));
    assert_eq!(data.format, Format::R8G8B8A8_SRGB);
    assert_eq!(data.row_pitch(), 20);
    assert_eq!(data.pixels, pixels);

    let mut encoder = device.create_command_encoder("upload");
    let texture = device
        .create_texture_with_data(&mut encoder, "decoded", &data, ImageUsage::SAMPLED | ImageUsage::TRANSFER_SRC)
        .unwrap();
    assert!(texture.usage().contains(ImageUsage::TRANSFER_DST));
    queue.submit([encoder.finish()]).unwrap();
    assert_eq!(readback(&device, &mut queue, &texture), pixels);
}
