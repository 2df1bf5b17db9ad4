//! Command submission.
use tracing::{debug, trace, warn};

use crate::{
    command::{rows_span, Command, DrawState, RenderCommand},
    tight_row_pitch, Buffer, CommandList, Device, Error, Image, ImageView,
};

/// Identifies a submission to a queue. Submissions are numbered in increasing order, starting at 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionIndex(pub u64);

/// Counters accumulated over all the work executed by a queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Number of submissions that executed to completion.
    pub submissions: u64,
    pub draw_calls: u64,
    /// Vertex shader invocations, counting each instance.
    pub vertices_fetched: u64,
    pub primitives_assembled: u64,
    /// Bytes moved by copy commands, padding excluded.
    pub bytes_copied: u64,
}

/// Executes command lists on the device.
///
/// Execution is synchronous: when `submit` returns, every command of the submitted lists has
/// run, or the first failing command has stopped the submission.
pub struct Queue {
    device: Device,
    last_submission: u64,
    stats: QueueStats,
}

impl Queue {
    pub(crate) fn new(device: Device) -> Queue {
        Queue {
            device,
            last_submission: 0,
            stats: QueueStats::default(),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Index of the last submission that executed to completion, if any.
    pub fn last_submission(&self) -> Option<SubmissionIndex> {
        (self.last_submission != 0).then_some(SubmissionIndex(self.last_submission))
    }

    /// Submits command lists for execution, in order.
    ///
    /// Render commands are checked again against the contents of the buffers at the time of
    /// execution: index values written by the host after recording are validated here.
    /// Commands that ran before a failing command keep their effects. A failed submission
    /// doesn't take a submission index.
    ///
    /// Lists recorded for another device are rejected before anything executes.
    pub fn submit(&mut self, command_lists: impl IntoIterator<Item = CommandList>) -> Result<SubmissionIndex, Error> {
        let command_lists: Vec<CommandList> = command_lists.into_iter().collect();
        for list in command_lists.iter() {
            self.device.check_owner(list.device(), list.label())?;
        }
        let index = SubmissionIndex(self.last_submission + 1);
        for list in command_lists {
            debug!(submission = index.0, list = list.label.as_str(), commands = list.len(), "execute");
            for command in list.commands.iter() {
                if let Err(err) = self.execute(command) {
                    warn!(submission = index.0, list = list.label.as_str(), ?command, "{err}");
                    return Err(err);
                }
            }
        }
        self.last_submission = index.0;
        self.stats.submissions += 1;
        Ok(index)
    }

    fn execute(&mut self, command: &Command) -> Result<(), Error> {
        trace!(?command, "execute");
        match command {
            Command::CopyBufferToBuffer {
                src,
                src_offset,
                dst,
                dst_offset,
                size,
            } => {
                self.copy_buffer_to_buffer(src, *src_offset, dst, *dst_offset, *size);
                Ok(())
            }
            Command::CopyBufferToImage {
                src,
                src_offset,
                row_pitch,
                dst,
                height,
            } => {
                self.copy_buffer_to_image(src, *src_offset, *row_pitch, dst, *height);
                Ok(())
            }
            Command::CopyImageToBuffer {
                src,
                dst,
                dst_offset,
                row_pitch,
            } => {
                self.copy_image_to_buffer(src, dst, *dst_offset, *row_pitch);
                Ok(())
            }
            Command::RenderPass {
                target,
                clear,
                commands,
            } => self.render_pass(target, *clear, commands),
        }
    }

    fn copy_buffer_to_buffer(&mut self, src: &Buffer, src_offset: u64, dst: &Buffer, dst_offset: u64, size: u64) {
        let data = self.device.buffer_bytes(src, src_offset, size);
        self.device.with_buffer_mut(dst, |bytes| {
            bytes[dst_offset as usize..(dst_offset + size) as usize].copy_from_slice(&data)
        });
        self.stats.bytes_copied += size;
    }

    fn copy_buffer_to_image(&mut self, src: &Buffer, src_offset: u64, row_pitch: u64, dst: &Image, height: u32) {
        let row_size = tight_row_pitch(dst.width(), dst.format()) as usize;
        let row_pitch = row_pitch as usize;
        let data = self
            .device
            .buffer_bytes(src, src_offset, rows_span(row_pitch as u64, row_size as u64, height));
        self.device.with_image_mut(dst, |texels| {
            for row in 0..height as usize {
                texels[row * row_size..(row + 1) * row_size]
                    .copy_from_slice(&data[row * row_pitch..row * row_pitch + row_size]);
            }
        });
        self.stats.bytes_copied += (row_size * height as usize) as u64;
    }

    fn copy_image_to_buffer(&mut self, src: &Image, dst: &Buffer, dst_offset: u64, row_pitch: u64) {
        let row_size = tight_row_pitch(src.width(), src.format()) as usize;
        let (row_pitch, dst_offset) = (row_pitch as usize, dst_offset as usize);
        let texels = self.device.image_bytes(src);
        self.device.with_buffer_mut(dst, |bytes| {
            for (row, data) in texels.chunks_exact(row_size).enumerate() {
                let start = dst_offset + row * row_pitch;
                bytes[start..start + row_size].copy_from_slice(data);
            }
        });
        self.stats.bytes_copied += texels.len() as u64;
    }

    fn render_pass(&mut self, target: &ImageView, clear: Option<[f32; 4]>, commands: &[RenderCommand]) -> Result<(), Error> {
        if let Some(color) = clear {
            let texel = target.format().encode_color(color).ok_or_else(|| {
                Error::InvalidArgument(format!("cannot clear a {} render target", target.format()))
            })?;
            self.device.with_image_mut(target.image(), |texels| {
                for t in texels.chunks_exact_mut(texel.len()) {
                    t.copy_from_slice(&texel);
                }
            });
        }

        let mut state = DrawState::new(*self.device.limits(), target.format());
        for command in commands {
            if let Some(stats) = state.apply(command)? {
                self.stats.draw_calls += 1;
                self.stats.vertices_fetched += stats.vertices_fetched;
                self.stats.primitives_assembled += stats.primitives_assembled;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("device", &self.device)
            .field("last_submission", &self.last_submission)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_device_and_queue, BufferUsage, DeviceCreateInfo, Format, ImageUsage};

    #[test]
    fn submissions_are_numbered() {
        let (device, mut queue) = create_device_and_queue(&DeviceCreateInfo::default());
        assert_eq!(queue.last_submission(), None);
        let first = queue.submit([device.create_command_encoder("a").finish()]).unwrap();
        let second = queue.submit(Vec::<CommandList>::new()).unwrap();
        assert_eq!(first, SubmissionIndex(1));
        assert!(second > first);
        assert_eq!(queue.stats().submissions, 2);
    }

    #[test]
    fn failed_submission_takes_no_index() {
        let (device, mut queue) = create_device_and_queue(&DeviceCreateInfo::default());
        let (other, _other_queue) = create_device_and_queue(&DeviceCreateInfo::default());
        queue.submit([device.create_command_encoder("a").finish()]).unwrap();

        let foreign = other.create_command_encoder("foreign").finish();
        assert!(matches!(queue.submit([foreign]), Err(Error::ForeignResource { .. })));
        assert_eq!(queue.last_submission(), Some(SubmissionIndex(1)));
        assert_eq!(queue.stats().submissions, 1);

        let next = queue.submit([device.create_command_encoder("b").finish()]).unwrap();
        assert_eq!(next, SubmissionIndex(2));
    }

    #[test]
    fn buffer_copy_executes_on_submit() {
        let (device, mut queue) = create_device_and_queue(&DeviceCreateInfo::default());
        let src = device
            .create_buffer("src", BufferUsage::TRANSFER_SRC, &[1, 2, 3, 4])
            .unwrap();
        let dst = device
            .create_buffer_uninit("dst", BufferUsage::TRANSFER_DST, 8)
            .unwrap();
        let mut encoder = device.create_command_encoder("copy");
        encoder.copy_buffer_to_buffer(src.whole(), &dst, 2).unwrap();
        let list = encoder.finish();
        assert_eq!(device.read_buffer(dst.whole()).unwrap(), vec![0; 8]);

        queue.submit([list]).unwrap();
        assert_eq!(device.read_buffer(dst.whole()).unwrap(), vec![0, 0, 1, 2, 3, 4, 0, 0]);
        assert_eq!(queue.stats().bytes_copied, 4);
    }

    #[test]
    fn clear_fills_target() {
        let (device, mut queue) = create_device_and_queue(&DeviceCreateInfo::default());
        let image = device
            .create_texture(
                "target",
                2,
                2,
                Format::R8G8B8A8_UNORM,
                ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_SRC,
            )
            .unwrap();
        let readback = device
            .create_buffer_uninit("readback", BufferUsage::TRANSFER_DST, 16)
            .unwrap();
        let mut encoder = device.create_command_encoder("clear");
        encoder
            .begin_render_pass(&image.create_view(), Some([1.0, 0.0, 0.0, 1.0]))
            .unwrap()
            .end();
        encoder.copy_image_to_buffer(&image, &readback, 0, 8).unwrap();
        queue.submit([encoder.finish()]).unwrap();

        let texels = device.read_buffer(readback.whole()).unwrap();
        assert_eq!(&texels[..4], &[255, 0, 0, 255]);
        assert_eq!(&texels[12..], &[255, 0, 0, 255]);
    }
}
