//! Memory resources (images and buffers).
use tracing::{debug, warn};

use super::{BufferResource, ImageResource};
use crate::{
    as_bytes, Buffer, BufferContents, BufferRange, BufferUsage, CommandEncoder, Device, Error, Image,
    ImageCreateInfo, ImageType, ImageUsage, TextureData, Vertex, VertexBufferLayout, VertexIndex, VertexInputRate,
};

impl Device {
    fn check_buffer_size(&self, label: &str, byte_size: u64) -> Result<(), Error> {
        if byte_size == 0 {
            return Err(Error::InvalidArgument(format!("buffer `{label}` would be empty")));
        }
        let max = self.limits().max_buffer_size;
        if byte_size > max {
            warn!(label, byte_size, max, "buffer size exceeds device limit");
            return Err(Error::LimitExceeded {
                limit: "max_buffer_size",
                value: byte_size,
                max,
            });
        }
        Ok(())
    }

    fn register_buffer(&self, label: &str, usage: BufferUsage, data: Vec<u8>, contents: BufferContents) -> Buffer {
        let size = data.len() as u64;
        let id = self.inner.buffers.borrow_mut().insert(BufferResource {
            label: label.to_string(),
            data,
        });
        debug!(?id, label, size, ?usage, "create buffer");
        Buffer::new(self.clone(), id, label, size, usage, contents)
    }

    /// Creates a buffer holding a copy of `data`.
    ///
    /// The size of the buffer is the length of `data` and never changes.
    pub fn create_buffer(&self, label: &str, usage: BufferUsage, data: &[u8]) -> Result<Buffer, Error> {
        self.check_buffer_size(label, data.len() as u64)?;
        Ok(self.register_buffer(label, usage, data.to_vec(), BufferContents::Raw))
    }

    /// Creates a zero-filled buffer.
    pub fn create_buffer_uninit(&self, label: &str, usage: BufferUsage, byte_size: u64) -> Result<Buffer, Error> {
        self.check_buffer_size(label, byte_size)?;
        let data = self.allocate(label, byte_size)?;
        Ok(self.register_buffer(label, usage, data, BufferContents::Raw))
    }

    /// Creates a vertex buffer from an array of vertex records.
    ///
    /// The buffer remembers the layout of `V`, which is checked against the layout declared by
    /// the pipeline when the buffer is bound.
    pub fn create_vertex_buffer<V: Vertex>(
        &self,
        label: &str,
        vertices: &[V],
        input_rate: VertexInputRate,
    ) -> Result<Buffer, Error> {
        let layout = VertexBufferLayout::of::<V>(input_rate)?;
        if vertices.is_empty() {
            return Err(Error::InvalidArgument(format!("vertex buffer `{label}` would be empty")));
        }
        // SAFETY: `VertexBufferLayout::of` checked that the attributes of `V` cover the whole
        // record without gaps, so there are no padding bytes.
        let data = unsafe { as_bytes(vertices) };
        self.check_buffer_size(label, data.len() as u64)?;
        let data = data.to_vec();
        let contents = BufferContents::Vertices {
            layout,
            count: vertices.len() as u32,
        };
        Ok(self.register_buffer(
            label,
            BufferUsage::VERTEX_BUFFER | BufferUsage::TRANSFER_DST,
            data,
            contents,
        ))
    }

    /// Creates an index buffer.
    pub fn create_index_buffer<I: VertexIndex>(&self, label: &str, indices: &[I]) -> Result<Buffer, Error> {
        if indices.is_empty() {
            return Err(Error::InvalidArgument(format!("index buffer `{label}` would be empty")));
        }
        // SAFETY: index types are plain integers
        let data = unsafe { as_bytes(indices) };
        self.check_buffer_size(label, data.len() as u64)?;
        let data = data.to_vec();
        let contents = BufferContents::Indices {
            index_type: I::TYPE,
            count: indices.len() as u32,
        };
        Ok(self.register_buffer(
            label,
            BufferUsage::INDEX_BUFFER | BufferUsage::TRANSFER_DST,
            data,
            contents,
        ))
    }

    /// Overwrites part of the contents of a buffer from the host.
    pub fn write_buffer(&self, buffer: &Buffer, offset: u64, data: &[u8]) -> Result<(), Error> {
        self.check_owner(buffer.device(), buffer.label())?;
        buffer.slice(offset, data.len() as u64)?;
        let mut buffers = self.inner.buffers.borrow_mut();
        let resource = buffers.get_mut(buffer.id()).expect("invalid buffer id");
        let start = offset as usize;
        resource.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Reads back a range of a buffer.
    pub fn read_buffer(&self, range: BufferRange) -> Result<Vec<u8>, Error> {
        self.check_owner(range.buffer.device(), range.buffer.label())?;
        range.check()?;
        Ok(self.buffer_bytes(range.buffer, range.offset, range.size))
    }

    pub(crate) fn buffer_bytes(&self, buffer: &Buffer, offset: u64, size: u64) -> Vec<u8> {
        let buffers = self.inner.buffers.borrow();
        let resource = buffers.get(buffer.id()).expect("invalid buffer id");
        resource.data[offset as usize..(offset + size) as usize].to_vec()
    }

    pub(crate) fn with_buffer_mut<R>(&self, buffer: &Buffer, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut buffers = self.inner.buffers.borrow_mut();
        let resource = buffers.get_mut(buffer.id()).expect("invalid buffer id");
        f(&mut resource.data)
    }

    pub(crate) fn with_image_mut<R>(&self, image: &Image, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut images = self.inner.images.borrow_mut();
        let resource = images.get_mut(image.id()).expect("invalid image id");
        f(&mut resource.data)
    }

    pub(crate) fn image_bytes(&self, image: &Image) -> Vec<u8> {
        let images = self.inner.images.borrow();
        images.get(image.id()).expect("invalid image id").data.clone()
    }

    /// Creates an image. Its contents are zeroed.
    pub fn create_image(&self, label: &str, info: &ImageCreateInfo) -> Result<Image, Error> {
        let max = self.limits().max_texture_dimension_2d;
        if info.width == 0 || info.height == 0 || info.depth == 0 {
            return Err(Error::InvalidArgument(format!(
                "image `{label}` has an empty extent ({}x{}x{})",
                info.width, info.height, info.depth
            )));
        }
        match info.type_ {
            ImageType::Image1D if info.height != 1 || info.depth != 1 => {
                return Err(Error::InvalidArgument(format!(
                    "1D image `{label}` must have height and depth 1"
                )));
            }
            ImageType::Image2D if info.depth != 1 => {
                return Err(Error::InvalidArgument(format!("2D image `{label}` must have depth 1")));
            }
            _ => {}
        }
        for value in [info.width, info.height, info.depth] {
            if value > max {
                warn!(label, value, max, "image dimension exceeds device limit");
                return Err(Error::LimitExceeded {
                    limit: "max_texture_dimension_2d",
                    value: value as u64,
                    max: max as u64,
                });
            }
        }

        let byte_size =
            info.width as u64 * info.height as u64 * info.depth as u64 * info.format.byte_size() as u64;
        let data = self.allocate(label, byte_size)?;
        let id = self.inner.images.borrow_mut().insert(ImageResource {
            label: label.to_string(),
            data,
        });
        debug!(?id, label, ?info, "create image");
        Ok(Image::new(self.clone(), id, label, *info))
    }

    /// Creates an uninitialized 2D texture.
    pub fn create_texture(
        &self,
        label: &str,
        width: u32,
        height: u32,
        format: crate::Format,
        usage: ImageUsage,
    ) -> Result<Image, Error> {
        self.create_image(
            label,
            &ImageCreateInfo {
                type_: ImageType::Image2D,
                usage,
                format,
                width,
                height,
                depth: 1,
            },
        )
    }

    /// Creates a 2D texture and records the upload of `data` into it.
    ///
    /// `TRANSFER_DST` is added to `usage`. The texture contents are only valid once the
    /// encoder's command list has been submitted.
    pub fn create_texture_with_data(
        &self,
        encoder: &mut CommandEncoder,
        label: &str,
        data: &TextureData,
        usage: ImageUsage,
    ) -> Result<Image, Error> {
        let image = self.create_texture(
            label,
            data.width,
            data.height,
            data.format,
            usage | ImageUsage::TRANSFER_DST,
        )?;
        encoder.upload_pixels(&image, &data.pixels, data.row_pitch(), data.height)?;
        Ok(image)
    }
}
