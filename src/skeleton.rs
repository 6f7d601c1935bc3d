//! Morphological thinning of a binary mask down to a 1-pixel-wide skeleton.
//!
//! Thinning is the Guo–Hall two-subiteration parallel algorithm: each pass
//! inspects a snapshot and deletes, all at once, the border pixels whose
//! removal keeps 8-connectivity and does not shorten a stroke end. A final
//! sequential pass removes staircase corners, pixels that touch two
//! perpendicular 4-neighbors that are already diagonally adjacent.

use image::{GrayImage, Luma};

use crate::mask::FOREGROUND;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Subiteration {
    Odd,
    Even,
}

/// Zero-padded working copy of the mask, one byte per pixel.
struct BinaryGrid {
    width: usize,
    height: usize,
    stride: usize,
    cells: Vec<bool>,
}

impl BinaryGrid {
    fn from_mask(mask: &GrayImage) -> Self {
        let width = mask.width() as usize;
        let height = mask.height() as usize;
        let stride = width + 2;
        let mut cells = vec![false; stride * (height + 2)];
        for (x, y, p) in mask.enumerate_pixels() {
            if p[0] != 0 {
                cells[(y as usize + 1) * stride + x as usize + 1] = true;
            }
        }
        Self {
            width,
            height,
            stride,
            cells,
        }
    }

    fn to_mask(&self) -> GrayImage {
        let mut out = GrayImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cells[self.index(x, y)] {
                    out.put_pixel(x as u32, y as u32, Luma([FOREGROUND]));
                }
            }
        }
        out
    }

    fn index(&self, x: usize, y: usize) -> usize {
        (y + 1) * self.stride + x + 1
    }

    /// Neighbors counter-clockwise from east: E, NE, N, NW, W, SW, S, SE.
    fn neighbors(&self, x: usize, y: usize) -> [bool; 8] {
        let i = self.index(x, y);
        let s = self.stride;
        [
            self.cells[i + 1],
            self.cells[i + 1 - s],
            self.cells[i - s],
            self.cells[i - 1 - s],
            self.cells[i - 1],
            self.cells[i - 1 + s],
            self.cells[i + s],
            self.cells[i + 1 + s],
        ]
    }

    fn thin_pass(&mut self, pass: Subiteration) -> usize {
        let mut doomed = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                if self.cells[idx] && is_deletable(&self.neighbors(x, y), pass) {
                    doomed.push(idx);
                }
            }
        }
        for &idx in &doomed {
            self.cells[idx] = false;
        }
        doomed.len()
    }

    fn remove_staircases(&mut self) -> usize {
        let mut removed = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                if !self.cells[idx] {
                    continue;
                }
                let n = self.neighbors(x, y);
                let corner = (n[0] && n[2]) || (n[2] && n[4]) || (n[4] && n[6]) || (n[6] && n[0]);
                if corner && connectivity_number(&n) == 1 {
                    self.cells[idx] = false;
                    removed += 1;
                }
            }
        }
        removed
    }
}

/// Number of 4-background runs that touch foreground, `C(P)` in Guo–Hall.
fn crossing_number(n: &[bool; 8]) -> u32 {
    (0..4)
        .filter(|&i| !n[2 * i] && (n[2 * i + 1] || n[(2 * i + 2) % 8]))
        .count() as u32
}

/// Yokoi connectivity number for 8-connectivity; 1 means the pixel is simple.
fn connectivity_number(n: &[bool; 8]) -> u32 {
    let bg = |i: usize| !n[i % 8] as u32;
    [0usize, 2, 4, 6]
        .iter()
        .map(|&k| bg(k) - bg(k) * bg(k + 1) * bg(k + 2))
        .sum()
}

fn is_deletable(n: &[bool; 8], pass: Subiteration) -> bool {
    if crossing_number(n) != 1 {
        return false;
    }

    let mut n1 = 0;
    let mut n2 = 0;
    for k in 0..4 {
        n1 += (n[2 * k] || n[2 * k + 1]) as u32;
        n2 += (n[2 * k + 1] || n[(2 * k + 2) % 8]) as u32;
    }
    let smaller = n1.min(n2);
    if !(2..=3).contains(&smaller) {
        return false;
    }

    let guarded = match pass {
        Subiteration::Odd => (n[1] || n[2] || !n[7]) && n[0],
        Subiteration::Even => (n[5] || n[6] || !n[3]) && n[4],
    };
    !guarded
}

/// Thins `mask` to a skeleton of the same dimensions. The result is a subset of the mask.
pub fn skeletonize(mask: &GrayImage) -> GrayImage {
    let mut grid = BinaryGrid::from_mask(mask);

    let mut passes = 0usize;
    loop {
        let removed = grid.thin_pass(Subiteration::Odd) + grid.thin_pass(Subiteration::Even);
        passes += 1;
        if removed == 0 {
            break;
        }
    }
    let corners = grid.remove_staircases();
    log::debug!("thinning converged after {passes} passes, {corners} staircase pixels removed");

    grid.to_mask()
}
