//! Buffers
use std::{fmt, rc::Rc};

use tracing::debug;

use crate::{device::Device, BufferId, BufferUsage, Error, IndexType, VertexBufferLayout};

/// What a buffer was created to hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferContents {
    /// Untyped bytes.
    Raw,
    /// Vertex records with the given layout.
    Vertices { layout: VertexBufferLayout, count: u32 },
    /// Indices of the given type.
    Indices { index_type: IndexType, count: u32 },
}

pub(crate) struct BufferInner {
    device: Device,
    id: BufferId,
    label: String,
    size: u64,
    usage: BufferUsage,
    contents: BufferContents,
}

impl Drop for BufferInner {
    fn drop(&mut self) {
        debug!(label = self.label.as_str(), "destroy buffer");
        self.device.inner.buffers.borrow_mut().remove(self.id);
    }
}

/// Reference-counted handle to a buffer in device memory.
///
/// The size of a buffer never changes. The memory is freed when the last handle is dropped.
#[derive(Clone)]
pub struct Buffer {
    inner: Rc<BufferInner>,
}

impl Buffer {
    pub(crate) fn new(
        device: Device,
        id: BufferId,
        label: &str,
        size: u64,
        usage: BufferUsage,
        contents: BufferContents,
    ) -> Buffer {
        Buffer {
            inner: Rc::new(BufferInner {
                device,
                id,
                label: label.to_string(),
                size,
                usage,
                contents,
            }),
        }
    }

    pub fn id(&self) -> BufferId {
        self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Returns the size of the buffer in bytes.
    pub fn byte_size(&self) -> u64 {
        self.inner.size
    }

    /// Returns the usage flags of the buffer.
    pub fn usage(&self) -> BufferUsage {
        self.inner.usage
    }

    pub fn contents(&self) -> &BufferContents {
        &self.inner.contents
    }

    /// Returns the vertex layout of the buffer, if it was created with `create_vertex_buffer`.
    pub fn vertex_layout(&self) -> Option<&VertexBufferLayout> {
        match self.inner.contents {
            BufferContents::Vertices { ref layout, .. } => Some(layout),
            _ => None,
        }
    }

    /// Returns the device on which the buffer was created.
    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    /// Whether the two handles refer to the same buffer.
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns a range covering the whole buffer.
    pub fn whole(&self) -> BufferRange {
        BufferRange {
            buffer: self,
            offset: 0,
            size: self.inner.size,
        }
    }

    /// Returns a range of the buffer.
    pub fn slice(&self, offset: u64, size: u64) -> Result<BufferRange, Error> {
        let range = BufferRange {
            buffer: self,
            offset,
            size,
        };
        range.check()?;
        Ok(range)
    }

    pub(crate) fn check_usage(&self, required: BufferUsage) -> Result<(), Error> {
        if !self.inner.usage.contains(required) {
            return Err(Error::UsageViolation {
                resource: self.inner.label.clone(),
                required: format!("{required:?}"),
                actual: format!("{:?}", self.inner.usage),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("size", &self.inner.size)
            .field("usage", &self.inner.usage)
            .finish()
    }
}

/// A byte range within a buffer.
#[derive(Copy, Clone, Debug)]
pub struct BufferRange<'a> {
    pub buffer: &'a Buffer,
    pub offset: u64,
    pub size: u64,
}

impl<'a> BufferRange<'a> {
    /// Fails if the range extends past the end of the buffer.
    pub fn check(&self) -> Result<(), Error> {
        let end = self.offset.checked_add(self.size).unwrap_or(u64::MAX);
        if end > self.buffer.byte_size() {
            return Err(Error::OutOfRange {
                what: "buffer range",
                end,
                limit: self.buffer.byte_size(),
            });
        }
        Ok(())
    }

    pub(crate) fn to_owned(self) -> OwnedBufferRange {
        OwnedBufferRange {
            buffer: self.buffer.clone(),
            offset: self.offset,
            size: self.size,
        }
    }
}

/// A buffer range that keeps its buffer alive.
#[derive(Clone, Debug)]
pub struct OwnedBufferRange {
    pub buffer: Buffer,
    pub offset: u64,
    pub size: u64,
}

impl OwnedBufferRange {
    pub fn as_range(&self) -> BufferRange {
        BufferRange {
            buffer: &self.buffer,
            offset: self.offset,
            size: self.size,
        }
    }
}
