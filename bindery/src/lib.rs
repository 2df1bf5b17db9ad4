//! Resource binding and vertex layout description for rendering pipelines.
//!
//! Buffers of typed vertex/index data, textures and samplers are created on a [`Device`],
//! grouped into [`BindingSet`]s that follow a [`BindingLayout`], and wired into a
//! [`GraphicsPipeline`] for draw calls. Work on the device is recorded into [`CommandList`]s
//! that stay inert until they are submitted to the [`Queue`].

// Lets `#[derive(Vertex)]` and `#[derive(Arguments)]` refer to `bindery::...` from inside this crate.
extern crate self as bindery;

pub use ash::{self, vk};
#[doc(hidden)]
pub use memoffset::offset_of as __offset_of;
#[doc(hidden)]
pub use memoffset::offset_of_tuple as __offset_of_tuple;

pub use argument::*;
pub use binding::*;
pub use buffer::*;
pub use command::*;
pub use device::{create_device_and_queue, *};
pub use error::*;
pub use self::image::*;
pub use index::*;
pub use pipeline::*;
pub use queue::*;
pub use sampler::*;
pub use types::*;
pub use vertex::*;

mod argument;
mod binding;
mod buffer;
mod command;
mod device;
mod error;
mod image;
mod index;
mod pipeline;
mod queue;
mod sampler;
mod types;
mod vertex;

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Reinterprets a slice of plain data as bytes.
///
/// # Safety
///
/// `T` must not contain padding bytes.
pub(crate) unsafe fn as_bytes<T: Copy>(data: &[T]) -> &[u8] {
    std::slice::from_raw_parts(data.as_ptr() as *const u8, std::mem::size_of_val(data))
}

/// Returns the number of bytes between the start of two consecutive rows of a tightly packed
/// image of the given width.
///
/// # Examples
///
/// ```
/// use bindery::{tight_row_pitch, Format};
/// assert_eq!(tight_row_pitch(256, Format::R8G8B8A8_UNORM), 1024);
/// assert_eq!(tight_row_pitch(3, Format::R32G32_SFLOAT), 24);
/// ```
pub fn tight_row_pitch(width: u32, format: Format) -> u64 {
    width as u64 * format.byte_size() as u64
}
