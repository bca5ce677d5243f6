//! Spatial scan orders.
//!
//! A scan enumerates every coordinate of a `[0, width) x [0, height)`
//! rectangle exactly once. The enumeration is the permutation the bitplane
//! coder codes run lengths against, so each order trades locality
//! differently:
//!
//! - `Raster` is the trivial row-major walk.
//! - `Snake` tiles the rectangle and boustrophedons both inside tiles and
//!   across the tile grid; with odd tile rows/columns every step moves to a
//!   4-neighbour, which keeps significance runs short on smooth subbands.
//! - `Morton` is the Z-order curve, extended to non-square rectangles by
//!   pinning the excess high bits to the longer axis.
//! - `Hilbert` is the generalized Hilbert curve for arbitrary rectangles,
//!   after Jakub Cerveny's gilbert construction, run off an explicit stack.
//!
//! The four variants share one dispatch point so the inner coding loop pays
//! a single predictable branch per step.

use crate::bit_io::{compact_u32, ilog2};
use crate::image::ScanOrder;

const SNAKE_TILE_WIDTH: usize = 4;
const SNAKE_TILE_HEIGHT: usize = 15;
const HILBERT_STACK_DEPTH: usize = 32;

/// A positioned enumerator. `x`/`y` always hold a valid current coordinate;
/// `advance` moves to the next one.
pub(crate) struct Scan {
    pub x: usize,
    pub y: usize,
    width: usize,
    height: usize,
    kind: Kind,
}

enum Kind {
    Raster,
    Snake(Box<SnakeState>),
    Morton(MortonState),
    Hilbert(Box<HilbertState>),
}

impl Scan {
    /// Creates an enumerator positioned on the first coordinate.
    pub fn new(order: ScanOrder, width: usize, height: usize) -> Self {
        let kind = match order {
            ScanOrder::Raster => Kind::Raster,
            ScanOrder::Snake => Kind::Snake(Box::new(SnakeState::new(
                width,
                height,
                SNAKE_TILE_WIDTH,
                SNAKE_TILE_HEIGHT,
            ))),
            ScanOrder::Morton => Kind::Morton(MortonState::new(width, height)),
            ScanOrder::Hilbert => Kind::Hilbert(Box::new(HilbertState::new(width, height))),
        };
        let mut scan = Self {
            x: 0,
            y: 0,
            width,
            height,
            kind,
        };
        if let Kind::Hilbert(_) = scan.kind {
            // The Hilbert walk produces its first coordinate like any other.
            scan.advance();
        }
        scan
    }

    /// Steps to the next coordinate; `false` once the rectangle is spent.
    pub fn advance(&mut self) -> bool {
        match &mut self.kind {
            Kind::Raster => {
                self.x += 1;
                if self.x >= self.width {
                    self.x = 0;
                    self.y += 1;
                    if self.y >= self.height {
                        return false;
                    }
                }
                true
            }
            Kind::Snake(state) => state.advance(&mut self.x, &mut self.y),
            Kind::Morton(state) => state.advance(self.width, self.height, &mut self.x, &mut self.y),
            Kind::Hilbert(state) => state.advance(&mut self.x, &mut self.y),
        }
    }
}

/// Snake state: a tile cursor, a grid cursor and the per-tile dimensions.
/// The grid is forced to an odd number of columns, and the trailing row of
/// tiles to an odd number of rows, so the boustrophedon seams line up.
struct SnakeState {
    tile_x: usize,
    tile_y: usize,
    tile_width: usize,
    tile_height: usize,
    tile_width_default: usize,
    tile_height_default: usize,
    /// Width of the tiles in the last grid column.
    columns_remaining: usize,
    /// Height of the tiles in the last grid row.
    rows_remaining: usize,
    right_to_left: bool,
    grid_x: usize,
    grid_y: usize,
    grid_width: usize,
    grid_height: usize,
    grid_column_index: usize,
    grid_column_odd: bool,
    grid_row_odd: bool,
    offset_x: usize,
    offset_y: usize,
}

/// Nudges a perturbed tile dimension back into `[1, limit]`.
fn clamp_tile_dim(value: i64, limit: usize) -> usize {
    if value < 0 || value as usize > limit {
        limit
    } else if value == 0 {
        1
    } else {
        value as usize
    }
}

impl SnakeState {
    fn new(width: usize, height: usize, tile_width: usize, tile_height: usize) -> Self {
        let mut tile_width = tile_width.min(width);
        let mut tile_height = tile_height.min(height);
        // Perturb the tile width (+1, -2, +3, ...) until the grid has an odd
        // number of columns.
        let mut step: i64 = 1;
        let grid_width = loop {
            let grid_width = (width + tile_width - 1) / tile_width;
            if grid_width & 1 == 1 {
                break grid_width;
            }
            tile_width = clamp_tile_dim(tile_width as i64 + step, width);
            step = -(step.abs() + 1) * step.signum();
        };
        let mut columns_remaining = width % tile_width;
        if columns_remaining == 0 {
            columns_remaining = tile_width;
        }
        // Perturb the tile height (+2, -4, +6, ...) until the trailing grid
        // row has an odd number of rows (or divides evenly).
        let mut step: i64 = 2;
        let rows_remaining = loop {
            let remaining = height % tile_height;
            if remaining > 0 && remaining & 1 == 0 {
                tile_height = clamp_tile_dim(tile_height as i64 + step, height);
                step = -(step.abs() + 2) * step.signum();
            } else {
                break if remaining == 0 { tile_height } else { remaining };
            }
        };
        let grid_height = (height + tile_height - 1) / tile_height;
        Self {
            tile_x: 0,
            tile_y: 0,
            tile_width,
            tile_height,
            tile_width_default: tile_width,
            tile_height_default: tile_height,
            columns_remaining,
            rows_remaining,
            right_to_left: false,
            grid_x: 0,
            grid_y: 0,
            grid_width,
            grid_height,
            grid_column_index: 0,
            grid_column_odd: false,
            grid_row_odd: false,
            offset_x: 0,
            offset_y: 0,
        }
    }

    fn advance(&mut self, x: &mut usize, y: &mut usize) -> bool {
        self.tile_x += 1;
        if self.tile_x >= self.tile_width {
            self.tile_x = 0;
            self.tile_y += 1;
            if self.tile_y >= self.tile_height {
                self.tile_y = 0;
                self.grid_column_index += 1;
                if self.grid_column_index >= self.grid_width {
                    self.grid_column_index = 0;
                    self.grid_y += 1;
                    if self.grid_y >= self.grid_height {
                        return false;
                    }
                    self.grid_row_odd = self.grid_y & 1 == 1;
                    self.tile_height = if self.grid_y < self.grid_height - 1 {
                        self.tile_height_default
                    } else {
                        self.rows_remaining
                    };
                    self.offset_y = self.grid_y * self.tile_height_default;
                }
                let last = self.grid_width - 1;
                self.grid_x = if self.grid_row_odd {
                    last - self.grid_column_index
                } else {
                    self.grid_column_index
                };
                self.grid_column_odd = self.grid_x & 1 == 1;
                self.tile_width = if self.grid_x < last {
                    self.tile_width_default
                } else {
                    self.columns_remaining
                };
                self.offset_x = self.grid_x * self.tile_width_default;
            }
            let row = if self.grid_column_odd {
                self.tile_height - 1 - self.tile_y
            } else {
                self.tile_y
            };
            self.right_to_left = (self.grid_y ^ row) & 1 == 1;
        }
        *x = if self.right_to_left {
            self.tile_width - 1 - self.tile_x
        } else {
            self.tile_x
        } + self.offset_x;
        *y = if self.grid_column_odd {
            self.tile_height - 1 - self.tile_y
        } else {
            self.tile_y
        } + self.offset_y;
        true
    }
}

/// Morton state: linear index plus the bit split between the interleaved
/// square part and the excess along the longer axis.
struct MortonState {
    range: u32,
    mask: u64,
    index: u64,
    length: u64,
}

impl MortonState {
    fn new(width: usize, height: usize) -> Self {
        let range = ilog2(width.min(height) as u32 - 1);
        Self {
            range,
            mask: (1u64 << (range * 2)) - 1,
            index: 0,
            length: 1u64 << (range + ilog2(width.max(height) as u32 - 1)),
        }
    }

    fn advance(&mut self, width: usize, height: usize, x: &mut usize, y: &mut usize) -> bool {
        loop {
            self.index += 1;
            let mut nx = compact_u32((self.index & self.mask) as u32) as usize;
            let mut ny = compact_u32(((self.index >> 1) & self.mask) as u32) as usize;
            let excess = ((self.index & !self.mask) >> self.range) as usize;
            if width > height {
                nx |= excess;
            } else {
                ny |= excess;
            }
            if nx < width && ny < height {
                *x = nx;
                *y = ny;
                return true;
            }
            if self.index >= self.length {
                return false;
            }
        }
    }
}

/// One pending rectangle of the Hilbert subdivision: origin plus the two
/// (signed, axis-aligned) spanning vectors.
#[derive(Clone, Copy, Default)]
struct HilbertItem {
    x: i32,
    y: i32,
    ax: i32,
    ay: i32,
    bx: i32,
    by: i32,
}

struct HilbertState {
    stack: [HilbertItem; HILBERT_STACK_DEPTH],
    depth: usize,
    width: i32,
    height: i32,
    dax: i32,
    day: i32,
    dbx: i32,
    dby: i32,
    index: i32,
}

impl HilbertState {
    fn new(width: usize, height: usize) -> Self {
        let mut state = Self {
            stack: [HilbertItem::default(); HILBERT_STACK_DEPTH],
            depth: 0,
            width: 0,
            height: 0,
            dax: 0,
            day: 0,
            dbx: 0,
            dby: 0,
            index: -1,
        };
        // Orient the top-level curve along the longer axis.
        if width >= height {
            state.push(0, 0, width as i32, 0, 0, height as i32);
        } else {
            state.push(0, 0, 0, height as i32, width as i32, 0);
        }
        state
    }

    fn push(&mut self, x: i32, y: i32, ax: i32, ay: i32, bx: i32, by: i32) {
        self.stack[self.depth] = HilbertItem {
            x,
            y,
            ax,
            ay,
            bx,
            by,
        };
        self.depth += 1;
    }

    fn advance(&mut self, x: &mut usize, y: &mut usize) -> bool {
        loop {
            if self.depth == 0 {
                return false;
            }
            let top = self.depth - 1;
            if self.index < 0 {
                let item = self.stack[top];
                self.width = (item.ax + item.ay).abs();
                self.height = (item.bx + item.by).abs();
                self.dax = item.ax.signum();
                self.day = item.ay.signum();
                self.dbx = item.bx.signum();
                self.dby = item.by.signum();
                self.index = 0;
            }
            if self.height == 1 {
                // Degenerate row: emit along the a-axis.
                if self.index < self.width {
                    let item = &mut self.stack[top];
                    *x = item.x as usize;
                    *y = item.y as usize;
                    item.x += self.dax;
                    item.y += self.day;
                    self.index += 1;
                    return true;
                }
                self.depth -= 1;
                self.index = -1;
                continue;
            }
            if self.width == 1 {
                // Degenerate column: emit along the b-axis.
                if self.index < self.height {
                    let item = &mut self.stack[top];
                    *x = item.x as usize;
                    *y = item.y as usize;
                    item.x += self.dbx;
                    item.y += self.dby;
                    self.index += 1;
                    return true;
                }
                self.depth -= 1;
                self.index = -1;
                continue;
            }
            // Subdivide. Halved vectors are stepped by one where needed so
            // the two (or three) pieces stay joined at odd splits.
            let current = self.stack[top];
            self.depth -= 1;
            self.index = -1;
            let mut ax2 = current.ax / 2;
            let mut ay2 = current.ay / 2;
            let mut bx2 = current.bx / 2;
            let mut by2 = current.by / 2;
            let w2 = (ax2 + ay2).abs();
            let h2 = (bx2 + by2).abs();
            if 2 * self.width > 3 * self.height {
                if w2 % 2 != 0 && self.width > 2 {
                    ax2 += self.dax;
                    ay2 += self.day;
                }
                self.push(
                    current.x + ax2,
                    current.y + ay2,
                    current.ax - ax2,
                    current.ay - ay2,
                    current.bx,
                    current.by,
                );
                self.push(current.x, current.y, ax2, ay2, current.bx, current.by);
            } else {
                if h2 % 2 != 0 && self.height > 2 {
                    bx2 += self.dbx;
                    by2 += self.dby;
                }
                self.push(
                    current.x + (current.ax - self.dax) + (bx2 - self.dbx),
                    current.y + (current.ay - self.day) + (by2 - self.dby),
                    -bx2,
                    -by2,
                    -(current.ax - ax2),
                    -(current.ay - ay2),
                );
                self.push(
                    current.x + bx2,
                    current.y + by2,
                    current.ax,
                    current.ay,
                    current.bx - bx2,
                    current.by - by2,
                );
                self.push(current.x, current.y, bx2, by2, ax2, ay2);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: [ScanOrder; 4] = [
        ScanOrder::Raster,
        ScanOrder::Snake,
        ScanOrder::Morton,
        ScanOrder::Hilbert,
    ];

    fn walk(order: ScanOrder, width: usize, height: usize) -> Vec<(usize, usize)> {
        let mut scan = Scan::new(order, width, height);
        let mut coords = vec![(scan.x, scan.y)];
        while scan.advance() {
            coords.push((scan.x, scan.y));
        }
        coords
    }

    #[test]
    fn every_order_is_a_bijection() {
        let sizes: Vec<(usize, usize)> = {
            let mut sizes = Vec::new();
            for w in 1..=20 {
                for h in 1..=20 {
                    sizes.push((w, h));
                }
            }
            sizes.extend([
                (31, 33),
                (33, 31),
                (64, 64),
                (100, 3),
                (3, 100),
                (127, 16),
                (16, 127),
                (255, 1),
                (1, 255),
            ]);
            sizes
        };
        for order in ORDERS {
            for &(w, h) in &sizes {
                let coords = walk(order, w, h);
                assert_eq!(coords.len(), w * h, "{:?} {}x{} count", order, w, h);
                let mut seen = vec![false; w * h];
                for (x, y) in coords {
                    assert!(x < w && y < h, "{:?} {}x{} out of bounds", order, w, h);
                    assert!(!seen[y * w + x], "{:?} {}x{} repeat at {},{}", order, w, h, x, y);
                    seen[y * w + x] = true;
                }
            }
        }
    }

    #[test]
    fn raster_is_row_major() {
        assert_eq!(
            walk(ScanOrder::Raster, 3, 2),
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn snake_steps_are_unit_manhattan() {
        // Heights above the default tile height (or odd) give odd tile rows
        // throughout, which is what makes the seams line up.
        let sizes = [
            (8, 9),
            (13, 7),
            (5, 5),
            (20, 16),
            (33, 31),
            (64, 45),
            (100, 17),
            (4, 15),
            (12, 15),
            (40, 30),
            (256, 64),
        ];
        for &(w, h) in &sizes {
            let coords = walk(ScanOrder::Snake, w, h);
            for pair in coords.windows(2) {
                let (ax, ay) = pair[0];
                let (bx, by) = pair[1];
                let dist = ax.abs_diff(bx) + ay.abs_diff(by);
                assert_eq!(
                    dist, 1,
                    "{}x{}: {:?} -> {:?} is not a unit step",
                    w, h, pair[0], pair[1]
                );
            }
        }
    }

    #[test]
    fn morton_square_is_z_order() {
        assert_eq!(
            walk(ScanOrder::Morton, 4, 4)[..8],
            [
                (0, 0),
                (1, 0),
                (0, 1),
                (1, 1),
                (2, 0),
                (3, 0),
                (2, 1),
                (3, 1)
            ]
        );
    }

    #[test]
    fn hilbert_steps_are_unit_manhattan_on_even_squares() {
        for size in [2usize, 4, 8, 16, 32] {
            let coords = walk(ScanOrder::Hilbert, size, size);
            for pair in coords.windows(2) {
                let dist = pair[0].0.abs_diff(pair[1].0) + pair[0].1.abs_diff(pair[1].1);
                assert_eq!(dist, 1, "{0}x{0}: {1:?} -> {2:?}", size, pair[0], pair[1]);
            }
        }
    }
}
