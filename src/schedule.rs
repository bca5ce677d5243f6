//! Round-based scheduling of subbands across planes and levels.
//!
//! Every subband has a fixed starting round; the scheduler sweeps the whole
//! subband tree once per round, giving one bitplane iteration to each
//! subband that has already started. Coarse luma starts first, detail
//! orientations and chroma trail behind, so the early bytes of the stream
//! carry the visually dominant information. The table only orders bits --
//! a lossless stream reaches the same size regardless.

use log::trace;

use crate::error::CodecError;
use crate::image::{ColorMode, Context, Subband, SUBBANDS};
use crate::scan::Scan;

/// Starting rounds for plane 0, indexed `[level][orientation]` with
/// orientations in LL, HL, LH, HH order and level 0 the coarsest. Only the
/// coarsest level codes its LL band; deeper levels skip orientation 0.
const LUMA_ROUNDS: [[u8; SUBBANDS]; 8] = [
    [0, 1, 1, 2],
    [0, 2, 2, 3],
    [0, 3, 3, 4],
    [0, 4, 4, 5],
    [0, 5, 5, 6],
    [0, 6, 6, 7],
    [0, 7, 7, 8],
    [0, 8, 8, 9],
];

/// Starting rounds for planes 1 and 2 of the multi-plane modes. The chroma
/// DC lags the luma DC by one round.
const CHROMA_ROUNDS: [[u8; SUBBANDS]; 8] = [
    [1, 2, 2, 3],
    [0, 3, 3, 4],
    [0, 4, 4, 5],
    [0, 5, 5, 6],
    [0, 6, 6, 7],
    [0, 7, 7, 8],
    [0, 8, 8, 9],
    [0, 9, 9, 10],
];

/// Round in which a subband first enters the coder.
pub(crate) fn starting_round(
    mode: ColorMode,
    plane: usize,
    level: usize,
    orientation: usize,
) -> i32 {
    let table = if plane == 0 || mode == ColorMode::Grayscale {
        &LUMA_ROUNDS
    } else {
        &CHROMA_ROUNDS
    };
    table[level][orientation] as i32
}

/// The two operations the scheduler needs from either side of the codec.
pub(crate) trait BitplaneCodec {
    fn eob(&self) -> bool;
    /// First-time activation: build the lists and transfer `max_bitplane`.
    fn init_subband(
        &mut self,
        band: &mut Subband,
        data: &mut [i16],
        scan: &mut Scan,
    ) -> Result<(), CodecError>;
    /// One bitplane iteration; `false` when the bit budget ran out.
    fn bitplane_pass(&mut self, band: &mut Subband, data: &mut [i16]) -> bool;
}

/// Drives rounds until every eligible subband reaches bitplane 0 or the
/// buffer is exhausted (which is a normal, successful outcome).
pub(crate) fn run<C: BitplaneCodec>(ctx: &mut Context, codec: &mut C) -> Result<(), CodecError> {
    let plane_len = ctx.image.width * ctx.image.height;
    let levels = ctx.image.dwt_levels;
    let num_planes = ctx.image.num_planes;
    let order = ctx.image.scan_order;
    let mut round: i32 = 0;
    let mut done = false;
    while !done && !codec.eob() {
        done = true;
        let mut chroma = false;
        let mut plane = 0usize;
        let mut level = 0usize;
        let mut orientation = 0usize;
        loop {
            let band = &mut ctx.planes[plane].bands[level][orientation];
            let data = &mut ctx.data[plane * plane_len..(plane + 1) * plane_len];
            if round < band.round || (round > band.round && band.bitplane == 0) {
                // Either not yet eligible, or already finished.
                done &= round > band.round;
            } else {
                if band.round == round {
                    let mut scan = Scan::new(order, band.width, band.height);
                    codec.init_subband(band, data, &mut scan)?;
                }
                if !codec.bitplane_pass(band, data) {
                    return Ok(());
                }
                done &= band.bitplane == 0;
            }
            // Walk plane 0 first; then planes 1 and 2 interleaved at each
            // (level, orientation) position. Orientation 0 only exists at
            // the coarsest level.
            if !chroma {
                orientation += 1;
                if orientation >= SUBBANDS {
                    level += 1;
                    orientation = usize::from(level < levels);
                    if orientation == 0 {
                        level = 0;
                        if num_planes > 1 {
                            chroma = true;
                            plane = 1;
                        } else {
                            break;
                        }
                    }
                }
            } else {
                plane += 1;
                if plane >= num_planes {
                    plane = 1;
                    orientation += 1;
                    if orientation >= SUBBANDS {
                        level += 1;
                        orientation = usize::from(level < levels);
                        if orientation == 0 {
                            break;
                        }
                    }
                }
            }
        }
        trace!("scheduler round {} complete (done: {})", round, done);
        round += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_details_trail_by_level() {
        for level in 0..8 {
            let base = level as i32;
            assert_eq!(
                starting_round(ColorMode::Grayscale, 0, level, 1),
                base + 1
            );
            assert_eq!(
                starting_round(ColorMode::Grayscale, 0, level, 2),
                base + 1
            );
            assert_eq!(
                starting_round(ColorMode::Grayscale, 0, level, 3),
                base + 2
            );
        }
        assert_eq!(starting_round(ColorMode::Grayscale, 0, 0, 0), 0);
    }

    #[test]
    fn chroma_lags_luma() {
        for mode in [ColorMode::YCoCgR, ColorMode::Oklab, ColorMode::LogL1] {
            for plane in 1..3 {
                assert_eq!(starting_round(mode, plane, 0, 0), 1);
                assert_eq!(starting_round(mode, plane, 0, 3), 3);
                for level in 1..8 {
                    assert_eq!(
                        starting_round(mode, plane, level, 1),
                        starting_round(mode, 0, level, 1) + 1
                    );
                }
            }
        }
    }
}
