//! Encoding: pixels to a truncatable compressed stream.

use log::debug;

use crate::bit_io::{ilog2, BitWriter};
use crate::color;
use crate::dwt;
use crate::error::CodecError;
use crate::image::{
    try_zeroed_vec, Context, ImageDescriptor, Subband, HEADER_MAGIC, HEADER_SIZE,
};
use crate::scan::Scan;
use crate::schedule::{self, BitplaneCodec};
use crate::wdr;

struct Encoder<'a> {
    writer: BitWriter<'a>,
}

impl BitplaneCodec for Encoder<'_> {
    fn eob(&self) -> bool {
        self.writer.eob()
    }

    fn init_subband(
        &mut self,
        band: &mut Subband,
        data: &mut [i16],
        scan: &mut Scan,
    ) -> Result<(), CodecError> {
        band.init_lists(scan)?;
        band.max_bitplane = ilog2((band.peak_coefficient(data) as i32 >> 1) as u32) as i32;
        band.bitplane = band.max_bitplane;
        self.writer.write_bits(band.max_bitplane as u32, 4);
        Ok(())
    }

    fn bitplane_pass(&mut self, band: &mut Subband, data: &mut [i16]) -> bool {
        wdr::encode_bitplane(band, data, &mut self.writer)
    }
}

fn write_header(writer: &mut BitWriter<'_>, descriptor: &ImageDescriptor) -> bool {
    writer.write_bits(HEADER_MAGIC, 8);
    writer.write_bits((descriptor.width - 1) as u32, 16);
    writer.write_bits((descriptor.height - 1) as u32, 16);
    writer.write_bits(u8::from(descriptor.color_mode) as u32, 2);
    writer.write_bits((descriptor.dwt_levels - 1) as u32, 3);
    writer.write_bits(u8::from(descriptor.scan_order) as u32, 2);
    writer.write_bit(u32::from(descriptor.subsampling));
    !writer.eob()
}

/// Encodes `source` pixels into `dest`, whose length is the byte budget.
///
/// `source` must hold exactly `descriptor.pixel_buffer_size()` bytes:
/// grayscale bytes, or interleaved RGB triplets for the 3-plane modes. The
/// descriptor is corrected in place (level count clamped, plane count
/// rederived). Returns the number of bytes actually used; filling the
/// budget is not an error, it just truncates quality.
pub fn encode(
    source: &[u8],
    dest: &mut [u8],
    descriptor: &mut ImageDescriptor,
) -> Result<usize, CodecError> {
    descriptor.validate(false)?;
    if source.len() != descriptor.pixel_buffer_size() {
        return Err(CodecError::InvalidParameter);
    }
    let mut writer = BitWriter::new(dest);
    if !write_header(&mut writer, descriptor) {
        // The header plus at least one payload byte must fit.
        return Err(CodecError::BufferTooSmall(HEADER_SIZE + 1));
    }
    let mut ctx = Context::new(descriptor.clone())?;
    let (width, height, levels) = (ctx.image.width, ctx.image.height, ctx.image.dwt_levels);
    let plane_len = width * height;
    color::pixels_to_planes(ctx.image.color_mode, source, &mut ctx.data, plane_len);
    let mut scratch = try_zeroed_vec::<i16>(width)?;
    for plane in 0..ctx.image.num_planes {
        let slice = &mut ctx.data[plane * plane_len..(plane + 1) * plane_len];
        dwt::forward(slice, &mut scratch, width, height, levels);
    }
    ctx.to_sign_magnitude();
    let mut codec = Encoder { writer };
    schedule::run(&mut ctx, &mut codec)?;
    let used = (codec.writer.bits_used() + 7) / 8;
    debug!(
        "encoded {}x{} ({:?}, {:?}, {} levels) into {} of {} budget bytes",
        width,
        height,
        ctx.image.color_mode,
        ctx.image.scan_order,
        levels,
        used,
        ctx.image.pixel_buffer_size(),
    );
    Ok(used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ColorMode, ScanOrder};

    fn descriptor() -> ImageDescriptor {
        ImageDescriptor::new(8, 8, 1, ColorMode::Grayscale, ScanOrder::Snake, false)
    }

    #[test]
    fn header_layout_is_six_bytes() {
        let mut buffer = [0u8; 8];
        let mut writer = BitWriter::new(&mut buffer);
        let d = ImageDescriptor::new(640, 480, 5, ColorMode::Oklab, ScanOrder::Hilbert, true);
        assert!(write_header(&mut writer, &d));
        assert_eq!(writer.bits_used(), HEADER_SIZE * 8);
        assert_eq!(buffer[0], 0xA5);
        assert_eq!(u16::from_be_bytes([buffer[1], buffer[2]]), 639);
        assert_eq!(u16::from_be_bytes([buffer[3], buffer[4]]), 479);
        // mode=2, levels-1=4, order=3, subsampling=1.
        assert_eq!(buffer[5], 0b10_100_11_1);
    }

    #[test]
    fn undersized_budget_is_rejected() {
        let source = [0u8; 64];
        let mut dest = [0u8; HEADER_SIZE];
        let err = encode(&source, &mut dest, &mut descriptor());
        assert_eq!(err, Err(CodecError::BufferTooSmall(HEADER_SIZE + 1)));
    }

    #[test]
    fn source_size_must_match_descriptor() {
        let source = [0u8; 63];
        let mut dest = [0u8; 256];
        let err = encode(&source, &mut dest, &mut descriptor());
        assert_eq!(err, Err(CodecError::InvalidParameter));
    }

    #[test]
    fn narrow_images_are_rejected() {
        let source = [0u8; 7 * 64];
        let mut dest = [0u8; 1024];
        let mut d = ImageDescriptor::new(7, 64, 1, ColorMode::Grayscale, ScanOrder::Raster, false);
        assert_eq!(
            encode(&source, &mut dest, &mut d),
            Err(CodecError::InvalidParameter)
        );
    }
}
