use std::ops::Deref;

use crate::builder::QR;
use crate::metadata::Color;

// Masking pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid masking pattern");
        Self(pattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

mod mask_functions {
    pub fn checkerboard(r: i32, c: i32) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i32, _: i32) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i32, c: i32) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i32, c: i32) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i32, c: i32) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i32, c: i32) -> bool {
        ((r * c) & 1) + ((r * c) % 3) == 0
    }

    pub fn diamonds(r: i32, c: i32) -> bool {
        (((r * c) & 1) + ((r * c) % 3)) & 1 == 0
    }

    pub fn meadow(r: i32, c: i32) -> bool {
        (((r + c) & 1) + ((r * c) % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_function(self) -> fn(i32, i32) -> bool {
        debug_assert!(*self < 8, "Invalid pattern");

        match *self {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!(),
        }
    }
}

// Penalty scoring
//------------------------------------------------------------------------------

// Scores every candidate with format info drawn in place and applies the
// winner; ties break toward the lowest pattern index
pub(crate) fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let best_mask = (0..8)
        .min_by_key(|m| {
            let mut candidate = qr.clone();
            candidate.apply_mask(MaskPattern(*m));
            compute_total_penalty(&candidate)
        })
        .expect("Should return atleast 1 mask");
    let best_mask = MaskPattern(best_mask);
    qr.apply_mask(best_mask);
    best_mask
}

pub(crate) fn compute_total_penalty(qr: &QR) -> u32 {
    compute_run_penalty(qr)
        + compute_block_penalty(qr)
        + compute_finder_pattern_penalty(qr)
        + compute_balance_penalty(qr)
}

// Every run of 5 or more same colored modules in a row or column scores
// 3 plus 1 per module beyond 5
fn compute_run_penalty(qr: &QR) -> u32 {
    let w = qr.width() as i32;
    let mut pen = 0;
    for i in 0..w {
        pen += line_run_penalty((0..w).map(|c| qr.color(i, c)));
        pen += line_run_penalty((0..w).map(|r| qr.color(r, i)));
    }
    pen
}

fn line_run_penalty(line: impl Iterator<Item = Color>) -> u32 {
    let mut pen = 0;
    let mut last = None;
    let mut run = 0u32;
    for clr in line {
        if last == Some(clr) {
            run += 1;
        } else {
            if run >= 5 {
                pen += run - 2;
            }
            last = Some(clr);
            run = 1;
        }
    }
    if run >= 5 {
        pen += run - 2;
    }
    pen
}

fn compute_block_penalty(qr: &QR) -> u32 {
    let w = qr.width() as i32;
    let mut pen = 0;
    for r in 0..w - 1 {
        for c in 0..w - 1 {
            let clr = qr.color(r, c);
            if clr == qr.color(r + 1, c)
                && clr == qr.color(r, c + 1)
                && clr == qr.color(r + 1, c + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}

// A dark-light-dark-dark-dark-light-dark run with four light modules on
// either side resembles a finder pattern and scores 40 per occurrence
fn compute_finder_pattern_penalty(qr: &QR) -> u32 {
    let w = qr.width() as i32;
    let mut pen = 0;
    for i in 0..w {
        let row: Vec<Color> = (0..w).map(|c| qr.color(i, c)).collect();
        let col: Vec<Color> = (0..w).map(|r| qr.color(r, i)).collect();
        pen += 40 * (count_finder_windows(&row) + count_finder_windows(&col));
    }
    pen
}

fn count_finder_windows(line: &[Color]) -> u32 {
    use Color::{Dark as D, Light as L};
    static LEADING: [Color; 11] = [L, L, L, L, D, L, D, D, D, L, D];
    static TRAILING: [Color; 11] = [D, L, D, D, D, L, D, L, L, L, L];

    line.windows(11).filter(|win| *win == LEADING || *win == TRAILING).count() as u32
}

// 10 points per 5% step the dark module ratio strays from 50%
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark = qr.count_dark_modules() as u32;
    let total = (qr.width() * qr.width()) as u32;
    let steps = (20 * dark).abs_diff(10 * total) / total;
    10 * steps
}
