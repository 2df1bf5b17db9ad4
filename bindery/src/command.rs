//! Deferred command recording.
use std::fmt;

use tracing::{debug, warn};

use crate::{Buffer, Device, Error, Image, ImageUsage, ImageView};

mod blit;
mod render;

pub(crate) use blit::rows_span;
pub use render::RenderEncoder;
pub(crate) use render::{DrawState, DrawStats, RenderCommand};

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A recorded device operation.
pub(crate) enum Command {
    CopyBufferToBuffer {
        src: Buffer,
        src_offset: u64,
        dst: Buffer,
        dst_offset: u64,
        size: u64,
    },
    /// Copies `height` rows starting at `src_offset`, `row_pitch` bytes apart, into the first
    /// rows of `dst`.
    CopyBufferToImage {
        src: Buffer,
        src_offset: u64,
        row_pitch: u64,
        dst: Image,
        height: u32,
    },
    /// Copies all rows of `src` into `dst`, `row_pitch` bytes apart.
    CopyImageToBuffer {
        src: Image,
        dst: Buffer,
        dst_offset: u64,
        row_pitch: u64,
    },
    RenderPass {
        target: ImageView,
        clear: Option<[f32; 4]>,
        commands: Vec<RenderCommand>,
    },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::CopyBufferToBuffer { src, dst, size, .. } => f
                .debug_struct("CopyBufferToBuffer")
                .field("src", &src.label())
                .field("dst", &dst.label())
                .field("size", size)
                .finish(),
            Command::CopyBufferToImage { src, dst, height, .. } => f
                .debug_struct("CopyBufferToImage")
                .field("src", &src.label())
                .field("dst", &dst.label())
                .field("height", height)
                .finish(),
            Command::CopyImageToBuffer { src, dst, .. } => f
                .debug_struct("CopyImageToBuffer")
                .field("src", &src.label())
                .field("dst", &dst.label())
                .finish(),
            Command::RenderPass { target, commands, .. } => f
                .debug_struct("RenderPass")
                .field("target", &target.image().label())
                .field("commands", &commands.len())
                .finish(),
        }
    }
}

/// Records device operations into a `CommandList`.
///
/// Nothing is executed until the list returned by `finish` is submitted to the queue.
pub struct CommandEncoder {
    device: Device,
    label: String,
    commands: Vec<Command>,
}

impl CommandEncoder {
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of commands recorded so far. A render pass counts as one command.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn check_buffer(&self, buffer: &Buffer) -> Result<(), Error> {
        self.device.check_owner(buffer.device(), buffer.label())
    }

    pub(crate) fn check_image(&self, image: &Image) -> Result<(), Error> {
        self.device.check_owner(image.device(), image.label())
    }

    pub(crate) fn push(&mut self, command: Command) {
        tracing::trace!(encoder = self.label.as_str(), ?command, "record");
        self.commands.push(command);
    }

    /// Starts a render pass targeting `target`, optionally clearing it first.
    ///
    /// The pass is recorded when the returned encoder is ended or dropped.
    pub fn begin_render_pass(&mut self, target: &ImageView, clear: Option<[f32; 4]>) -> Result<RenderEncoder, Error> {
        self.check_image(target.image())?;
        target.image().check_usage(ImageUsage::COLOR_ATTACHMENT)?;
        if !target.format().is_color_renderable() {
            warn!(format = %target.format(), "render target format is not color-renderable");
            return Err(Error::InvalidArgument(format!(
                "{} is not a color target format",
                target.format()
            )));
        }
        Ok(RenderEncoder::new(self, target.clone(), clear))
    }

    /// Finishes recording.
    pub fn finish(self) -> CommandList {
        debug!(encoder = self.label.as_str(), commands = self.commands.len(), "finish command list");
        CommandList {
            device: self.device,
            label: self.label,
            commands: self.commands,
        }
    }
}

impl Device {
    pub fn create_command_encoder(&self, label: &str) -> CommandEncoder {
        CommandEncoder {
            device: self.clone(),
            label: label.to_string(),
            commands: vec![],
        }
    }
}

/// An immutable list of recorded commands, inert until submitted.
pub struct CommandList {
    pub(crate) device: Device,
    pub(crate) label: String,
    pub(crate) commands: Vec<Command>,
}

impl CommandList {
    /// Returns the device the list was recorded for.
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CommandList")
            .field("label", &self.label)
            .field("commands", &self.commands)
            .finish()
    }
}
