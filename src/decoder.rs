//! Decoding: any prefix of a stream back to pixels.

use log::debug;

use crate::bit_io::BitReader;
use crate::color;
use crate::dwt;
use crate::error::CodecError;
use crate::image::{
    try_zeroed_vec, ColorMode, Context, ImageDescriptor, ScanOrder, Subband, HEADER_MAGIC,
    SUBBANDS,
};
use crate::lists::NIL;
use crate::scan::Scan;
use crate::schedule::{self, BitplaneCodec};
use crate::wdr;

struct Decoder<'a> {
    reader: BitReader<'a>,
}

impl BitplaneCodec for Decoder<'_> {
    fn eob(&self) -> bool {
        self.reader.eob()
    }

    fn init_subband(
        &mut self,
        band: &mut Subband,
        _data: &mut [i16],
        scan: &mut Scan,
    ) -> Result<(), CodecError> {
        band.init_lists(scan)?;
        band.max_bitplane = self.reader.read_bits(4).map_or(-1, |v| v as i32);
        band.bitplane = band.max_bitplane;
        Ok(())
    }

    fn bitplane_pass(&mut self, band: &mut Subband, data: &mut [i16]) -> bool {
        wdr::decode_bitplane(band, data, &mut self.reader)
    }
}

fn read_header(reader: &mut BitReader<'_>) -> Result<ImageDescriptor, CodecError> {
    let bad = CodecError::InvalidParameter;
    if reader.read_bits(8).ok_or(bad)? != HEADER_MAGIC {
        return Err(bad);
    }
    let width = reader.read_bits(16).ok_or(bad)? as usize + 1;
    let height = reader.read_bits(16).ok_or(bad)? as usize + 1;
    let color_mode = ColorMode::try_from(reader.read_bits(2).ok_or(bad)? as u8).map_err(|_| bad)?;
    let dwt_levels = reader.read_bits(3).ok_or(bad)? as usize + 1;
    let scan_order = ScanOrder::try_from(reader.read_bits(2).ok_or(bad)? as u8).map_err(|_| bad)?;
    let subsampling = reader.read_bit().ok_or(bad)? != 0;
    if reader.eob() {
        // A header with no payload at all decodes to nothing.
        return Err(bad);
    }
    Ok(ImageDescriptor::new(
        width,
        height,
        dwt_levels,
        color_mode,
        scan_order,
        subsampling,
    ))
}

/// Parses and validates the 6-byte stream header without decoding pixels.
/// Use [`ImageDescriptor::pixel_buffer_size`] on the result to size the
/// output buffer for [`decode`].
pub fn decode_header(source: &[u8]) -> Result<ImageDescriptor, CodecError> {
    let mut reader = BitReader::new(source);
    let mut descriptor = read_header(&mut reader)?;
    descriptor.validate(true)?;
    Ok(descriptor)
}

/// Midpoint reconstruction for truncated streams: every coefficient that is
/// known significant but still has uncoded bitplanes gets those low bits set
/// to 1, recovering half the quantisation error on average. Bit 0 (the
/// sign) is left alone.
fn round_coefficients(ctx: &mut Context) {
    let plane_len = ctx.image.width * ctx.image.height;
    for plane in 0..ctx.image.num_planes {
        for level in 0..ctx.image.dwt_levels {
            for orientation in usize::from(level > 0)..SUBBANDS {
                let band = &ctx.planes[plane].bands[level][orientation];
                if band.max_bitplane == 0 || band.bitplane < 2 {
                    continue;
                }
                let mask = (((1u32 << band.bitplane) - 1) ^ 1) as u16;
                let data = &mut ctx.data[plane * plane_len..(plane + 1) * plane_len];
                let mut pixel = band.lsp.head;
                while pixel != NIL {
                    let node = band.cache.node(pixel);
                    let index = band.offset + node.y as usize * band.stride + node.x as usize;
                    data[index] = (data[index] as u16 | mask) as i16;
                    pixel = band.cache.next(pixel);
                }
            }
        }
    }
}

/// Decodes a stream (or any truncation of one past the header) into `dest`.
///
/// `dest` must hold at least the image's pixel buffer size; call
/// [`decode_header`] first to learn it. Exhausting `source` mid-stream is
/// the normal truncation path and still succeeds, yielding a progressively
/// coarser image.
pub fn decode(source: &[u8], dest: &mut [u8]) -> Result<ImageDescriptor, CodecError> {
    let mut reader = BitReader::new(source);
    let mut descriptor = read_header(&mut reader)?;
    descriptor.validate(true)?;
    let required = descriptor.pixel_buffer_size();
    if dest.len() < required {
        return Err(CodecError::BufferTooSmall(required));
    }
    let mut ctx = Context::new(descriptor.clone())?;
    let mut codec = Decoder { reader };
    schedule::run(&mut ctx, &mut codec)?;
    round_coefficients(&mut ctx);
    ctx.from_sign_magnitude();
    let (width, height, levels) = (ctx.image.width, ctx.image.height, ctx.image.dwt_levels);
    let plane_len = width * height;
    let mut scratch = try_zeroed_vec::<i16>(width)?;
    for plane in 0..ctx.image.num_planes {
        let slice = &mut ctx.data[plane * plane_len..(plane + 1) * plane_len];
        dwt::inverse(slice, &mut scratch, width, height, levels);
    }
    color::planes_to_pixels(ctx.image.color_mode, &ctx.data, &mut dest[..required], plane_len);
    debug!(
        "decoded {}x{} ({:?}, {:?}, {} levels) from {} bytes",
        width,
        height,
        ctx.image.color_mode,
        ctx.image.scan_order,
        levels,
        source.len(),
    );
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_magic_is_invalid() {
        let source = [0xA4u8, 0, 7, 0, 7, 0x02, 0, 0];
        let mut dest = [0u8; 64];
        assert_eq!(
            decode(&source, &mut dest),
            Err(CodecError::InvalidParameter)
        );
        assert_eq!(decode_header(&source), Err(CodecError::InvalidParameter));
    }

    #[test]
    fn short_streams_are_invalid() {
        let mut dest = [0u8; 64];
        // Header cut short.
        assert_eq!(
            decode(&[0xA5, 0, 7], &mut dest),
            Err(CodecError::InvalidParameter)
        );
        // Exactly the header and nothing more.
        assert_eq!(
            decode(&[0xA5, 0, 7, 0, 7, 0x02], &mut dest),
            Err(CodecError::InvalidParameter)
        );
    }

    #[test]
    fn impossible_geometry_is_corrupt() {
        // 8x8 claiming 8 DWT levels.
        let source = [0xA5u8, 0, 7, 0, 7, 0b00_111_00_0, 0, 0];
        let mut dest = [0u8; 64];
        assert_eq!(decode(&source, &mut dest), Err(CodecError::DataCorrupted));
        // Width below the minimum.
        let source = [0xA5u8, 0, 5, 0, 7, 0x02, 0, 0];
        assert_eq!(decode(&source, &mut dest), Err(CodecError::DataCorrupted));
    }

    #[test]
    fn undersized_destination_reports_required_size() {
        let source = [0xA5u8, 0, 7, 0, 7, 0x02, 0, 0];
        let mut dest = [0u8; 63];
        assert_eq!(decode(&source, &mut dest), Err(CodecError::BufferTooSmall(64)));
    }
}
