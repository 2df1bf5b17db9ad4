//! Copy commands
use tracing::warn;

use crate::{
    command::Command, tight_row_pitch, Buffer, BufferRange, BufferUsage, CommandEncoder, Error, Image, ImageUsage,
};

/// Checks the row pitch of a copy between a buffer and `image`.
fn check_row_pitch(image: &Image, row_pitch: u64) -> Result<(), Error> {
    let bpp = image.format().byte_size() as u64;
    let row_size = tight_row_pitch(image.width(), image.format());
    if row_pitch < row_size {
        warn!(image = image.label(), row_pitch, row_size, "row pitch too small");
        return Err(Error::InvalidArgument(format!(
            "row pitch {row_pitch} is smaller than a row of `{}` ({row_size} bytes)",
            image.label()
        )));
    }
    if row_pitch % bpp != 0 {
        warn!(image = image.label(), row_pitch, bpp, "row pitch not a multiple of the texel size");
        return Err(Error::InvalidArgument(format!(
            "row pitch {row_pitch} is not a multiple of the texel size ({bpp} bytes)"
        )));
    }
    Ok(())
}

/// Number of bytes spanned by `rows` rows of `row_size` bytes, `row_pitch` bytes apart.
pub(crate) fn rows_span(row_pitch: u64, row_size: u64, rows: u32) -> u64 {
    match rows {
        0 => 0,
        n => row_pitch * (n as u64 - 1) + row_size,
    }
}

impl CommandEncoder {
    /// Records a copy between two buffers.
    pub fn copy_buffer_to_buffer(&mut self, src: BufferRange, dst: &Buffer, dst_offset: u64) -> Result<(), Error> {
        self.check_buffer(src.buffer)?;
        self.check_buffer(dst)?;
        src.buffer.check_usage(BufferUsage::TRANSFER_SRC)?;
        dst.check_usage(BufferUsage::TRANSFER_DST)?;
        src.check()?;
        dst.slice(dst_offset, src.size)?;
        self.push(Command::CopyBufferToBuffer {
            src: src.buffer.clone(),
            src_offset: src.offset,
            dst: dst.clone(),
            dst_offset,
            size: src.size,
        });
        Ok(())
    }

    /// Records a copy of `height` rows from a buffer into the top rows of `image`.
    ///
    /// Rows in the buffer are `row_pitch` bytes apart; padding at the end of each row is skipped.
    pub fn copy_buffer_to_image(
        &mut self,
        src: BufferRange,
        row_pitch: u64,
        image: &Image,
        height: u32,
    ) -> Result<(), Error> {
        self.check_buffer(src.buffer)?;
        self.check_image(image)?;
        src.buffer.check_usage(BufferUsage::TRANSFER_SRC)?;
        image.check_usage(ImageUsage::TRANSFER_DST)?;
        src.check()?;
        check_row_pitch(image, row_pitch)?;
        if height == 0 || height > image.row_count() {
            return Err(Error::OutOfRange {
                what: "copy height",
                end: height as u64,
                limit: image.row_count() as u64,
            });
        }
        let span = rows_span(row_pitch, tight_row_pitch(image.width(), image.format()), height);
        if span > src.size {
            return Err(Error::OutOfRange {
                what: "source rows",
                end: src.offset + span,
                limit: src.offset + src.size,
            });
        }
        self.push(Command::CopyBufferToImage {
            src: src.buffer.clone(),
            src_offset: src.offset,
            row_pitch,
            dst: image.clone(),
            height,
        });
        Ok(())
    }

    /// Records a copy of the whole contents of `image` into `dst`, rows `row_pitch` bytes apart.
    pub fn copy_image_to_buffer(
        &mut self,
        image: &Image,
        dst: &Buffer,
        dst_offset: u64,
        row_pitch: u64,
    ) -> Result<(), Error> {
        self.check_image(image)?;
        self.check_buffer(dst)?;
        image.check_usage(ImageUsage::TRANSFER_SRC)?;
        dst.check_usage(BufferUsage::TRANSFER_DST)?;
        check_row_pitch(image, row_pitch)?;
        let span = rows_span(row_pitch, tight_row_pitch(image.width(), image.format()), image.row_count());
        dst.slice(dst_offset, span)?;
        self.push(Command::CopyImageToBuffer {
            src: image.clone(),
            dst: dst.clone(),
            dst_offset,
            row_pitch,
        });
        Ok(())
    }

    /// Stages `pixels` in a transfer buffer and records their copy into `image`.
    ///
    /// `row_pitch` is the number of bytes between the start of two rows in `pixels`; it must be
    /// at least `width * bytes_per_texel`. Returns once the copy is recorded: the image is only
    /// written when the command list is submitted.
    pub fn upload_pixels(&mut self, image: &Image, pixels: &[u8], row_pitch: u64, height: u32) -> Result<(), Error> {
        self.check_image(image)?;
        image.check_usage(ImageUsage::TRANSFER_DST)?;
        check_row_pitch(image, row_pitch)?;
        let span = rows_span(row_pitch, tight_row_pitch(image.width(), image.format()), height);
        if (pixels.len() as u64) < span {
            return Err(Error::SourceDataInvalid(format!(
                "{height} rows with pitch {row_pitch} need {span} bytes, got {}",
                pixels.len()
            )));
        }
        let staging = self
            .device()
            .create_buffer("staging", BufferUsage::TRANSFER_SRC, pixels)?;
        self.copy_buffer_to_image(staging.whole(), row_pitch, image, height)
    }
}
