//! Image descriptors and the in-memory coefficient model.
//!
//! A decoded image is held as one contiguous buffer of 16-bit coefficients,
//! one plane after another. Each plane carries a tree of wavelet subbands
//! that are rectangular views into that buffer; the subbands own the coding
//! state (current bitplane and the three position lists) used by the
//! bitplane coder.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::bit_io::ilog2;
use crate::error::CodecError;
use crate::lists::{NodeCache, NodeList};
use crate::scan::Scan;
use crate::schedule::starting_round;

/// Smallest supported width/height.
pub const MIN_DIMENSION: usize = 8;
/// Largest supported width/height.
pub const MAX_DIMENSION: usize = (1 << 16) - 1;
/// Maximum number of recursive DWT decompositions.
pub const MAX_DWT_LEVEL: usize = 8;
/// First byte of every compressed stream.
pub const HEADER_MAGIC: u32 = 0xA5;
/// Size of the stream header in bytes.
pub const HEADER_SIZE: usize = 6;

/// Number of subbands produced per DWT decomposition.
pub(crate) const SUBBANDS: usize = 4;

const MAX_PLANES: usize = 3;

/// Internal colorspace the planes are coded in.
///
/// `Oklab` and `LogL1` are not sRGB-reversible; they trade exact round-trips
/// for perceptually better low-rate behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ColorMode {
    Grayscale = 0,
    YCoCgR = 1,
    Oklab = 2,
    LogL1 = 3,
}

impl ColorMode {
    /// Number of spectral planes this mode codes.
    pub fn num_planes(self) -> usize {
        match self {
            Self::Grayscale => 1,
            _ => MAX_PLANES,
        }
    }
}

/// Spatial order in which subband coefficients are enumerated.
///
/// The order is a pure permutation: it changes the run lengths seen by the
/// significance coder (and therefore the compressed size), never the set of
/// coded coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ScanOrder {
    Raster = 0,
    Snake = 1,
    Morton = 2,
    Hilbert = 3,
}

/// Describes an image to encode, or one recovered from a stream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: usize,
    pub height: usize,
    /// Number of DWT decompositions. Clamped on encode to what the
    /// dimensions support.
    pub dwt_levels: usize,
    pub color_mode: ColorMode,
    pub scan_order: ScanOrder,
    /// Delays every chroma subband by one extra scheduling round.
    pub subsampling: bool,
    /// Derived from `color_mode`; filled in during validation.
    pub num_planes: usize,
}

impl ImageDescriptor {
    pub fn new(
        width: usize,
        height: usize,
        dwt_levels: usize,
        color_mode: ColorMode,
        scan_order: ScanOrder,
        subsampling: bool,
    ) -> Self {
        Self {
            width,
            height,
            dwt_levels,
            color_mode,
            scan_order,
            subsampling,
            num_planes: color_mode.num_planes(),
        }
    }

    /// Size in bytes of the raw pixel buffer for this image: one byte per
    /// plane per pixel (grayscale), or interleaved RGB triplets.
    pub fn pixel_buffer_size(&self) -> usize {
        self.width * self.height * self.num_planes
    }

    /// Highest DWT level count the dimensions allow: every level must leave
    /// the coarsest subbands at least 4 coefficients on a side.
    pub fn max_dwt_levels(width: usize, height: usize) -> usize {
        let smallest = width.min(height) as u32;
        (ilog2(smallest) as usize - 3).min(MAX_DWT_LEVEL)
    }

    /// Checks the descriptor against the supported parameter space.
    ///
    /// On the encode side an oversized level count is silently clamped and
    /// the plane count is rederived; on the decode side (`read_only`) any
    /// inconsistency means the stream is corrupt.
    pub(crate) fn validate(&mut self, read_only: bool) -> Result<(), CodecError> {
        let invalid = if read_only {
            CodecError::DataCorrupted
        } else {
            CodecError::InvalidParameter
        };
        if self.width < MIN_DIMENSION
            || self.width > MAX_DIMENSION
            || self.height < MIN_DIMENSION
            || self.height > MAX_DIMENSION
            || self.dwt_levels == 0
            || self.dwt_levels > MAX_DWT_LEVEL
        {
            return Err(invalid);
        }
        let max_levels = Self::max_dwt_levels(self.width, self.height);
        if self.dwt_levels > max_levels {
            if read_only {
                return Err(invalid);
            }
            self.dwt_levels = max_levels;
        }
        if !read_only {
            self.num_planes = self.color_mode.num_planes();
        }
        Ok(())
    }
}

/// One oriented component of a DWT level, plus its coding state.
///
/// `offset`/`stride` locate the subband inside its plane's coefficient
/// buffer. The node cache and the three lists stay empty until the scheduler
/// first activates the subband.
#[derive(Default)]
pub(crate) struct Subband {
    pub cache: NodeCache,
    pub lip: NodeList,
    pub lsp: NodeList,
    pub nsp: NodeList,
    pub offset: usize,
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub max_bitplane: i32,
    pub bitplane: i32,
    pub round: i32,
}

impl Subband {
    /// Allocates the node cache and fills the LIP with every coefficient
    /// position, in scan order.
    pub fn init_lists(&mut self, scan: &mut Scan) -> Result<(), CodecError> {
        self.cache = NodeCache::allocate(self.width * self.height)?;
        self.lip = NodeList::new();
        self.lsp = NodeList::new();
        self.nsp = NodeList::new();
        loop {
            self.cache.push(&mut self.lip, scan.x as u16, scan.y as u16);
            if !scan.advance() {
                break;
            }
        }
        Ok(())
    }

    /// Largest coefficient in the subband. Assumes the plane is already in
    /// sign-magnitude form, so plain signed comparison finds the widest
    /// magnitude.
    pub fn peak_coefficient(&self, data: &[i16]) -> i16 {
        let mut max = data[self.offset];
        for y in 0..self.height {
            let row = self.offset + y * self.stride;
            for x in 0..self.width {
                if data[row + x] > max {
                    max = data[row + x];
                }
            }
        }
        max
    }
}

pub(crate) struct Plane {
    pub bands: [[Subband; SUBBANDS]; MAX_DWT_LEVEL],
}

impl Plane {
    fn new() -> Self {
        Self {
            bands: std::array::from_fn(|_| std::array::from_fn(|_| Subband::default())),
        }
    }
}

/// Per-call codec state: the coefficient buffer and the subband trees.
pub(crate) struct Context {
    pub image: ImageDescriptor,
    pub data: Vec<i16>,
    pub planes: Vec<Plane>,
}

impl Context {
    pub fn new(image: ImageDescriptor) -> Result<Self, CodecError> {
        let plane_len = image.width * image.height;
        let data = try_zeroed_vec::<i16>(plane_len * image.num_planes)?;
        let mut planes: Vec<Plane> = (0..image.num_planes).map(|_| Plane::new()).collect();
        for (index, plane) in planes.iter_mut().enumerate() {
            let mut w = image.width;
            let mut h = image.height;
            // Levels are laid out coarsest-first, so walk the geometry from
            // the finest level down while the dimensions halve.
            for level in (0..image.dwt_levels).rev() {
                for orientation in usize::from(level > 0)..SUBBANDS {
                    let band = &mut plane.bands[level][orientation];
                    // The horizontal and vertical lowpass halves take the
                    // rounded-up share of an odd dimension.
                    band.width = (w + usize::from(orientation & 1 == 0)) >> 1;
                    band.height = (h + usize::from(orientation <= 1)) >> 1;
                    band.stride = image.width << (image.dwt_levels - level);
                    band.round = starting_round(image.color_mode, index, level, orientation)
                        + i32::from(image.subsampling && index > 0);
                    band.offset = if orientation & 1 == 1 { (w + 1) >> 1 } else { 0 }
                        + if orientation > 1 { band.stride >> 1 } else { 0 };
                }
                w = (w + 1) >> 1;
                h = (h + 1) >> 1;
            }
        }
        Ok(Self {
            image,
            data,
            planes,
        })
    }

    /// Remaps every coefficient from two's complement to sign-magnitude
    /// (sign in bit 0, magnitude in bits 1..).
    pub fn to_sign_magnitude(&mut self) {
        for v in &mut self.data {
            let c = *v as i32;
            let mapped = if c < 0 { (-2 * c) | 1 } else { 2 * c };
            *v = mapped as i16;
        }
    }

    /// Inverse of [`Context::to_sign_magnitude`].
    pub fn from_sign_magnitude(&mut self) {
        for v in &mut self.data {
            let c = *v;
            *v = if c & 1 != 0 { -(c >> 1) } else { c >> 1 };
        }
    }
}

/// Fallible zeroed allocation, so running out of memory surfaces as a codec
/// error instead of an abort.
pub(crate) fn try_zeroed_vec<T: Clone + Default>(len: usize) -> Result<Vec<T>, CodecError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| CodecError::OutOfMemory)?;
    v.resize(len, T::default());
    Ok(v)
}
