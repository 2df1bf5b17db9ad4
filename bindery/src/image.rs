use std::{fmt, rc::Rc};

use tracing::debug;

use crate::{device::Device, tight_row_pitch, vk, Error, Format, ImageId, ImageType, ImageUsage};

/// Information passed to `Device::create_image` to describe the image to be created.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageCreateInfo {
    /// Dimensionality of the image.
    pub type_: ImageType,
    /// Image usage flags. Must include all intended uses of the image.
    pub usage: ImageUsage,
    /// Format of the image.
    pub format: Format,
    pub width: u32,
    pub height: u32,
    /// Depth of the image. Must be 1 for 1D and 2D images.
    pub depth: u32,
}

impl Default for ImageCreateInfo {
    fn default() -> Self {
        ImageCreateInfo {
            type_: ImageType::Image2D,
            usage: ImageUsage::default(),
            format: Format::R8G8B8A8_UNORM,
            width: 1,
            height: 1,
            depth: 1,
        }
    }
}

impl ImageCreateInfo {
    pub fn to_vk(&self) -> vk::ImageCreateInfo {
        vk::ImageCreateInfo {
            image_type: self.type_.to_vk_image_type(),
            format: self.format.to_vk_format(),
            extent: vk::Extent3D {
                width: self.width,
                height: self.height,
                depth: self.depth,
            },
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: vk::ImageTiling::OPTIMAL,
            usage: self.usage.to_vk_image_usage_flags(),
            ..Default::default()
        }
    }
}

pub(crate) struct ImageInner {
    device: Device,
    id: ImageId,
    label: String,
    info: ImageCreateInfo,
}

impl Drop for ImageInner {
    fn drop(&mut self) {
        debug!(label = self.label.as_str(), "destroy image");
        self.device.inner.images.borrow_mut().remove(self.id);
    }
}

/// Reference-counted handle to an image.
#[derive(Clone)]
pub struct Image {
    inner: Rc<ImageInner>,
}

impl Image {
    pub(crate) fn new(device: Device, id: ImageId, label: &str, info: ImageCreateInfo) -> Image {
        Image {
            inner: Rc::new(ImageInner {
                device,
                id,
                label: label.to_string(),
                info,
            }),
        }
    }

    pub fn id(&self) -> ImageId {
        self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn image_type(&self) -> ImageType {
        self.inner.info.type_
    }

    pub fn format(&self) -> Format {
        self.inner.info.format
    }

    /// Returns the size of the image as `(width, height, depth)`.
    pub fn size(&self) -> (u32, u32, u32) {
        let info = &self.inner.info;
        (info.width, info.height, info.depth)
    }

    pub fn width(&self) -> u32 {
        self.inner.info.width
    }

    pub fn height(&self) -> u32 {
        self.inner.info.height
    }

    /// Returns the usage flags of the image.
    pub fn usage(&self) -> ImageUsage {
        self.inner.info.usage
    }

    /// Number of rows of texels, over all depth slices.
    pub fn row_count(&self) -> u32 {
        self.inner.info.height * self.inner.info.depth
    }

    /// Size of the tightly packed texel data in bytes.
    pub fn byte_size(&self) -> u64 {
        tight_row_pitch(self.width(), self.format()) * self.row_count() as u64
    }

    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    pub fn ptr_eq(&self, other: &Image) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Creates a view of the whole image.
    pub fn create_view(&self) -> ImageView {
        ImageView {
            image: self.clone(),
            format: self.format(),
        }
    }

    pub(crate) fn check_usage(&self, required: ImageUsage) -> Result<(), Error> {
        if !self.inner.info.usage.contains(required) {
            return Err(Error::UsageViolation {
                resource: self.inner.label.clone(),
                required: format!("{required:?}"),
                actual: format!("{:?}", self.inner.info.usage),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Image")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("info", &self.inner.info)
            .finish()
    }
}

/// A read view of an image. Keeps its image alive.
#[derive(Clone, Debug)]
pub struct ImageView {
    image: Image,
    format: Format,
}

impl ImageView {
    /// Returns the image this view refers to.
    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Pixel data ready to be uploaded to a texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    /// Tightly packed rows.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Decodes an encoded image (PNG, JPEG) into RGBA8 sRGB texels.
    pub fn decode(bytes: &[u8]) -> Result<TextureData, Error> {
        let rgba = ::image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::SourceDataInvalid("decoded image is empty".to_string()));
        }
        Ok(TextureData {
            width,
            height,
            format: Format::R8G8B8A8_SRGB,
            pixels: rgba.into_raw(),
        })
    }

    /// Wraps raw texels. Fails if the byte count doesn't match the dimensions.
    pub fn from_raw(width: u32, height: u32, format: Format, pixels: Vec<u8>) -> Result<TextureData, Error> {
        let expected = tight_row_pitch(width, format) * height as u64;
        if pixels.len() as u64 != expected {
            return Err(Error::SourceDataInvalid(format!(
                "{}x{} {format} texture needs {expected} bytes, got {}",
                width,
                height,
                pixels.len()
            )));
        }
        Ok(TextureData {
            width,
            height,
            format,
            pixels,
        })
    }

    pub fn row_pitch(&self) -> u64 {
        tight_row_pitch(self.width, self.format)
    }
}
