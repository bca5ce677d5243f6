/*!
# wavebyte-rs

`wavebyte-rs` is a pure Rust implementation of a byte-granular scalable
image codec. A single encoded stream serves every quality tier: truncate
the compressed bytes at any point past the 6-byte header and the result is
still a valid image that decodes to a progressively coarser reconstruction.
Encode once, serve many - no per-tier re-encoding, no side-car thumbnails.

## How it works

- A reversible integer 5/3 wavelet transform decomposes each spectral plane
  into a pyramid of subbands.
- Each subband's bitplanes are coded by a two-list significance/refinement
  method whose run lengths use wavelet difference reduction (WDR); there is
  no entropy coder.
- A fixed schedule interleaves subbands across planes and levels so that
  every additional emitted bit buys the largest reconstruction improvement
  available.

Four scan orders (raster, snake, Morton, Hilbert) control how subband
coefficients are enumerated, and four internal color modes are supported:
grayscale, lossless YCoCg-R, and the lossy Oklab and logl1 spaces.

Everything is integer arithmetic; output is bit-exact across platforms.

## Example

```
use wavebyte_rs::{encode, decode, decode_header, ColorMode, ImageDescriptor, ScanOrder};

let pixels = vec![128u8; 32 * 32];
let mut descriptor = ImageDescriptor::new(
    32, 32, 2, ColorMode::Grayscale, ScanOrder::Snake, false,
);
let mut compressed = vec![0u8; pixels.len() + pixels.len() / 4];
let used = encode(&pixels, &mut compressed, &mut descriptor).unwrap();

let header = decode_header(&compressed[..used]).unwrap();
let mut decoded = vec![0u8; header.pixel_buffer_size()];
decode(&compressed[..used], &mut decoded).unwrap();
assert_eq!(decoded, pixels);
```

## Safety

The crate contains no `unsafe` code.
*/

pub mod error;
pub mod image;

mod bit_io;
mod color;
mod decoder;
mod dwt;
mod encoder;
mod lists;
mod scan;
mod schedule;
mod wdr;

pub use decoder::{decode, decode_header};
pub use encoder::encode;
pub use error::CodecError;
pub use image::{
    ColorMode, ImageDescriptor, ScanOrder, HEADER_MAGIC, HEADER_SIZE, MAX_DIMENSION,
    MAX_DWT_LEVEL, MIN_DIMENSION,
};
