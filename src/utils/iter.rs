use crate::metadata::Version;

// Iterator for placing data in encoding region of QR
//------------------------------------------------------------------------------

// Walks column pairs right to left, alternating upward and downward,
// right cell before left cell, skipping the vertical timing column.
// Yields every cell of the region; the caller skips occupied modules.
#[derive(Clone)]
pub struct EncRegionIter {
    r: i32,
    c: i32,
    width: i32,
}

impl EncRegionIter {
    pub const fn new(version: Version) -> Self {
        let w = version.width() as i32;
        Self { r: w - 1, c: w - 1, width: w }
    }
}

impl Iterator for EncRegionIter {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.c < 0 {
            return None;
        }
        let res = (self.r, self.c);
        let adjusted_col = if self.c <= VERT_TIMING_COL { self.c + 1 } else { self.c };
        match (self.width - adjusted_col) % 4 {
            2 if self.r > 0 => {
                self.r -= 1;
                self.c += 1;
            }
            0 if self.r < self.width - 1 => {
                self.r += 1;
                self.c += 1;
            }
            0 | 2 if self.c == VERT_TIMING_COL + 1 => {
                self.c -= 2;
            }
            _ => {
                self.c -= 1;
            }
        }
        Some(res)
    }
}

const VERT_TIMING_COL: i32 = 6;
