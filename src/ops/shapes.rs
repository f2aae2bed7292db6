// ============================================================================
// SHAPE RASTERIZATION: rectangles, brush discs and spray scatter
// ============================================================================

use crate::canvas::{Color, PixelBuffer, Point};

/// Radius of the spray-can disc, in pixels.
pub const SPRAY_RADIUS: i32 = 20;
/// Points stamped per spray tick.
pub const SPRAY_DENSITY: usize = 20;

/// Whether `(dx, dy)` lies within a disc of radius `r`. Squared in `i64`.
fn in_disc(dx: i32, dy: i32, r: i32) -> bool {
    let (dx, dy, r) = (dx as i64, dy as i64, r as i64);
    dx * dx + dy * dy <= r * r
}

/// Every integer offset within a disc of `radius` (inclusive), row by row.
pub fn disc_offsets(radius: i32) -> impl Iterator<Item = (i32, i32)> {
    let r = radius.max(0);
    (-r..=r).flat_map(move |dy| {
        (-r..=r)
            .filter(move |&dx| in_disc(dx, dy, r))
            .map(move |dx| (dx, dy))
    })
}

/// Normalise two corners into `(min, max)`.
fn corners(a: Point, b: Point) -> (Point, Point) {
    (
        Point::new(a.x.min(b.x), a.y.min(b.y)),
        Point::new(a.x.max(b.x), a.y.max(b.y)),
    )
}

/// Solid rectangle between two corners (inclusive), one scanline per row.
/// Rows and columns outside the buffer are skipped up front.
pub fn fill_rect(buf: &mut PixelBuffer, a: Point, b: Point, color: Color) {
    let (min, max) = corners(a, b);
    let (x0, x1) = (min.x.max(0), max.x.min(buf.width() - 1));
    let (y0, y1) = (min.y.max(0), max.y.min(buf.height() - 1));
    if x0 > x1 {
        return;
    }
    for y in y0..=y1 {
        buf.draw_line(x0, y, x1, y, color);
    }
}

/// Rectangle border made of `thickness` concentric rings, outermost first.
/// Stops as soon as a ring would have no interior width or height left.
pub fn outline_rect(buf: &mut PixelBuffer, a: Point, b: Point, thickness: i32, color: Color) {
    let (min, max) = corners(a, b);
    for i in 0..thickness.max(1) {
        let (x0, y0) = (min.x.saturating_add(i), min.y.saturating_add(i));
        let (x1, y1) = (max.x.saturating_sub(i), max.y.saturating_sub(i));
        if x1 <= x0 || y1 <= y0 {
            break;
        }
        buf.draw_line(x0, y0, x1, y0, color);
        buf.draw_line(x0, y1, x1, y1, color);
        buf.draw_line(x0, y0, x0, y1, color);
        buf.draw_line(x1, y0, x1, y1, color);
    }
}

/// Small xorshift generator for spray scatter. Seeded per project so
/// replays are reproducible.
#[derive(Clone, Debug)]
pub struct SprayRng(u32);

impl SprayRng {
    pub fn new(seed: u32) -> Self {
        // xorshift has a fixed point at zero
        Self(if seed == 0 { 0x9E37_79B9 } else { seed })
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform integer in `[-r, r]`.
    fn next_offset(&mut self, r: i32) -> i32 {
        let span = 2 * r as i64 + 1;
        (self.next_u32() as i64 % span - r as i64) as i32
    }

    /// A point uniformly distributed in the disc of `radius` around `center`.
    pub fn point_in_disc(&mut self, center: Point, radius: i32) -> Point {
        let r = radius.max(0);
        loop {
            let dx = self.next_offset(r);
            let dy = self.next_offset(r);
            if in_disc(dx, dy, r) {
                return center.offset(dx, dy);
            }
        }
    }
}

/// Stamp one spray tick: [`SPRAY_DENSITY`] random points within
/// [`SPRAY_RADIUS`] of `center`.
pub fn spray(buf: &mut PixelBuffer, center: Point, color: Color, rng: &mut SprayRng) {
    for _ in 0..SPRAY_DENSITY {
        let p = rng.point_in_disc(center, SPRAY_RADIUS);
        buf.set(p.x, p.y, color);
    }
}
