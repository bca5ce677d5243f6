//! Header serialisation across the parameter lattice.

use wavebyte_rs::{
    decode_header, encode, ColorMode, ImageDescriptor, ScanOrder, HEADER_SIZE,
};

const MODES: [ColorMode; 4] = [
    ColorMode::Grayscale,
    ColorMode::YCoCgR,
    ColorMode::Oklab,
    ColorMode::LogL1,
];
const SCANS: [ScanOrder; 4] = [
    ScanOrder::Raster,
    ScanOrder::Snake,
    ScanOrder::Morton,
    ScanOrder::Hilbert,
];

#[test]
fn descriptors_round_trip_through_the_header() {
    let sizes = [(8usize, 8usize), (16, 9), (33, 40)];
    for &(width, height) in &sizes {
        let max_levels = ImageDescriptor::max_dwt_levels(width, height);
        for mode in MODES {
            for scan in SCANS {
                for subsampling in [false, true] {
                    for levels in 1..=max_levels {
                        let mut descriptor = ImageDescriptor::new(
                            width,
                            height,
                            levels,
                            mode,
                            scan,
                            subsampling,
                        );
                        let pixels = vec![127u8; descriptor.pixel_buffer_size()];
                        let mut stream = vec![0u8; 4 * pixels.len() + 64];
                        let used = encode(&pixels, &mut stream, &mut descriptor).unwrap();
                        let parsed = decode_header(&stream[..used]).unwrap();
                        assert_eq!(parsed, descriptor, "{}x{} {:?}", width, height, mode);
                    }
                }
            }
        }
    }
}

#[test]
fn oversized_level_requests_are_clamped_into_the_header() {
    let mut descriptor =
        ImageDescriptor::new(16, 16, 8, ColorMode::Grayscale, ScanOrder::Raster, false);
    let pixels = vec![0u8; 256];
    let mut stream = vec![0u8; 1024];
    let used = encode(&pixels, &mut stream, &mut descriptor).unwrap();
    assert_eq!(descriptor.dwt_levels, 2);
    let parsed = decode_header(&stream[..used]).unwrap();
    assert_eq!(parsed.dwt_levels, 2);
}

#[test]
fn header_is_exactly_six_bytes_before_payload() {
    let mut descriptor =
        ImageDescriptor::new(8, 8, 1, ColorMode::Grayscale, ScanOrder::Raster, false);
    let pixels = vec![0u8; 64];
    let mut stream = vec![0u8; 256];
    let used = encode(&pixels, &mut stream, &mut descriptor).unwrap();
    assert!(used > HEADER_SIZE);
    // The six header bytes alone are not decodable; one payload byte is.
    assert!(decode_header(&stream[..HEADER_SIZE]).is_err());
    assert!(decode_header(&stream[..HEADER_SIZE + 1]).is_ok());
}
