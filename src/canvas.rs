use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CanvasError;

// ============================================================================
// COLOR / POINT
// ============================================================================

/// One RGBA8 pixel value. Equality is exact on all four channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Integer pixel coordinate, either canvas-space or layer-local.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

/// Source-over blend of a single pixel.
///
/// Both fast paths (alpha 0 and alpha 255) skip the float math entirely. The
/// general case keeps the editor's historical channel weighting: the base
/// channel is weighted by the source alpha and the source channel by the
/// remaining base coverage, normalised by the resulting alpha. Channels are
/// truncated toward zero; only the alpha is rounded.
pub fn blend_pixel(base: Color, top: Color) -> Color {
    if top.a == 0 {
        return base;
    }
    if top.a == 255 {
        return top;
    }

    let a1 = top.a as f64 / 255.0;
    let a2 = base.a as f64 / 255.0;
    let factor = a2 * (1.0 - a1);
    let out_a = a1 + factor;

    let channel = |b: u8, s: u8| -> u8 {
        ((b as f64 * a1 + s as f64 * factor) / out_a).clamp(0.0, 255.0) as u8
    };

    Color::new(
        channel(base.r, top.r),
        channel(base.g, top.g),
        channel(base.b, top.b),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

// ============================================================================
// PIXEL BUFFER – contiguous row-major RGBA8 storage
// ============================================================================

/// Owned RGBA8 bitmap, `width * height * 4` bytes, top-left origin.
///
/// Cloning is always a deep copy; two buffers never alias the same memory.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: i32,
    height: i32,
    data: Vec<u8>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    // ---- construction -------------------------------------------------------

    /// Create a fully transparent buffer.
    pub fn new(width: i32, height: i32) -> Result<Self, CanvasError> {
        if width < 0 || height < 0 {
            return Err(CanvasError::InvalidSize {
                width: width as i64,
                height: height as i64,
            });
        }
        Ok(Self::zeroed(width, height))
    }

    /// Infallible constructor for sizes already known to be non-negative
    /// (canvas and layer dimensions).
    pub(crate) fn zeroed(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap an existing row-major RGBA8 byte vector.
    /// `data` must be exactly `width * height * 4` bytes.
    pub fn from_rgba(width: i32, height: i32, data: Vec<u8>) -> Result<Self, CanvasError> {
        if width < 0 || height < 0 || data.len() != width as usize * height as usize * 4 {
            return Err(CanvasError::InvalidSize {
                width: width as i64,
                height: height as i64,
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn memory_bytes(&self) -> usize {
        self.data.len()
    }

    // ---- pixel access -------------------------------------------------------

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            Some((y as usize * self.width as usize + x as usize) * 4)
        } else {
            None
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        let i = self.index(x, y)?;
        let px = &self.data[i..i + 4];
        Some(Color::new(px[0], px[1], px[2], px[3]))
    }

    /// The single write primitive. Returns `false` without writing when
    /// `(x, y)` lies outside the buffer.
    pub fn set(&mut self, x: i32, y: i32, color: Color) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.data[i..i + 4].copy_from_slice(&color.to_array());
                true
            }
            None => false,
        }
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Set every pixel to `color`.
    pub fn fill_all(&mut self, color: Color) {
        let px = color.to_array();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    // ---- drawing ------------------------------------------------------------

    /// DDA line: both endpoints plus `max(|dx|, |dy|)` interior samples
    /// truncated toward zero. Steep sub-pixel slopes can leave gaps.
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        self.set(x1, y1, color);
        self.set(x2, y2, color);

        let w = (x2 as i64 - x1 as i64).abs();
        let h = (y2 as i64 - y1 as i64).abs();
        let step = w.max(h);
        if step == 0 {
            return;
        }

        let dx = (x2 as f64 - x1 as f64) / step as f64;
        let dy = (y2 as f64 - y1 as f64) / step as f64;
        for i in 0..step {
            self.set(
                (x1 as f64 + dx * i as f64) as i32,
                (y1 as f64 + dy * i as f64) as i32,
                color,
            );
        }
    }

    /// 4-connected breadth-first flood fill from `(x, y)`.
    ///
    /// Recoloured pixels no longer match the target, so no visited set is
    /// kept; this relies on `color != target`, which is checked up front.
    pub fn fill(&mut self, x: i32, y: i32, color: Color) {
        let Some(target) = self.get(x, y) else {
            return;
        };
        if target == color {
            return;
        }

        self.set(x, y, color);
        let mut queue = VecDeque::new();
        queue.push_back(Point::new(x, y));

        while let Some(p) = queue.pop_front() {
            let neighbors = [
                Point::new(p.x - 1, p.y),
                Point::new(p.x + 1, p.y),
                Point::new(p.x, p.y - 1),
                Point::new(p.x, p.y + 1),
            ];
            for n in neighbors {
                if self.get(n.x, n.y) == Some(target) {
                    self.set(n.x, n.y, color);
                    queue.push_back(n);
                }
            }
        }
    }

    /// Composite `self` onto `base` with its top-left corner at
    /// `(offset_x, offset_y)`, clipped to the overlap.
    ///
    /// Returns `false` and leaves `base` untouched when `self` is wider or
    /// taller than `base`, or when the two do not overlap at all. Callers
    /// skip the layer in that case.
    pub fn blend_onto(&self, base: &mut PixelBuffer, offset_x: i32, offset_y: i32) -> bool {
        if self.width > base.width || self.height > base.height {
            return false;
        }

        let x0 = offset_x.saturating_neg().max(0);
        let y0 = offset_y.saturating_neg().max(0);
        let x1 = self.width.min(base.width.saturating_sub(offset_x));
        let y1 = self.height.min(base.height.saturating_sub(offset_y));
        if x0 >= x1 || y0 >= y1 {
            return false;
        }

        for sy in y0..y1 {
            for sx in x0..x1 {
                let Some(src) = self.get(sx, sy) else {
                    continue;
                };
                if src.a == 0 {
                    continue;
                }
                let (bx, by) = (sx + offset_x, sy + offset_y);
                if src.a == 255 {
                    base.set(bx, by, src);
                } else if let Some(dst) = base.get(bx, by) {
                    base.set(bx, by, blend_pixel(dst, src));
                }
            }
        }
        true
    }
}

// ============================================================================
// LAYER
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    /// Placement of the buffer's top-left corner in canvas space.
    /// May be negative or beyond the canvas; only the overlap is visible.
    pub x: i32,
    pub y: i32,
    pub visible: bool,
    pub pixels: PixelBuffer,
}

impl Layer {
    /// Blank, fully transparent layer at the canvas origin.
    pub fn new(name: impl Into<String>, width: i32, height: i32) -> Result<Self, CanvasError> {
        Ok(Self::with_pixels(name, PixelBuffer::new(width, height)?))
    }

    pub fn with_pixels(name: impl Into<String>, pixels: PixelBuffer) -> Self {
        Self {
            name: name.into(),
            x: 0,
            y: 0,
            visible: true,
            pixels,
        }
    }

    /// Build a layer from externally decoded RGBA8 data (R, G, B, A order).
    /// Every pixel is copied through [`PixelBuffer::set`].
    pub fn from_rgba(
        name: impl Into<String>,
        width: i32,
        height: i32,
        rgba: &[u8],
    ) -> Result<Self, CanvasError> {
        if width < 0 || height < 0 || rgba.len() != width as usize * height as usize * 4 {
            return Err(CanvasError::InvalidSize {
                width: width as i64,
                height: height as i64,
            });
        }
        let mut pixels = PixelBuffer::zeroed(width, height);
        for (i, px) in rgba.chunks_exact(4).enumerate() {
            let x = (i % width as usize) as i32;
            let y = (i / width as usize) as i32;
            pixels.set(x, y, Color::new(px[0], px[1], px[2], px[3]));
        }
        Ok(Self::with_pixels(name, pixels))
    }

    pub fn width(&self) -> i32 {
        self.pixels.width()
    }

    pub fn height(&self) -> i32 {
        self.pixels.height()
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.x = self.x.saturating_add(dx);
        self.y = self.y.saturating_add(dy);
    }

    /// Convert a canvas-space point into this layer's pixel space.
    pub fn to_local(&self, canvas: Point) -> Point {
        Point::new(canvas.x.saturating_sub(self.x), canvas.y.saturating_sub(self.y))
    }
}

// ============================================================================
// IMAGE – ordered layer stack sharing one canvas
// ============================================================================

/// A document's pixel content: canvas size plus layers in paint order
/// (index 0 is the bottom).
///
/// The active layer is UI state and is tracked by the owner, not here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) layers: Vec<Layer>,
}

impl Image {
    pub fn new(width: i32, height: i32) -> Result<Self, CanvasError> {
        if width < 0 || height < 0 {
            return Err(CanvasError::InvalidSize {
                width: width as i64,
                height: height as i64,
            });
        }
        Ok(Self {
            width,
            height,
            layers: Vec::new(),
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    fn check_index(&self, index: usize) -> Result<(), CanvasError> {
        if index < self.layers.len() {
            Ok(())
        } else {
            Err(CanvasError::IndexOutOfRange {
                index,
                len: self.layers.len(),
            })
        }
    }

    /// Append `layer` on top of the stack and return its index.
    pub fn add_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    pub fn remove_layer(&mut self, index: usize) -> Result<Layer, CanvasError> {
        self.check_index(index)?;
        Ok(self.layers.remove(index))
    }

    /// Insert a deep copy of layer `index` directly above it.
    /// Returns the index of the copy.
    pub fn duplicate_layer(&mut self, index: usize) -> Result<usize, CanvasError> {
        self.check_index(index)?;
        let mut dup = self.layers[index].clone();
        dup.name = format!("{} Copy", dup.name);
        self.layers.insert(index + 1, dup);
        Ok(index + 1)
    }

    /// Move the layer at `from` so it ends up at index `to`.
    pub fn move_layer(&mut self, from: usize, to: usize) -> Result<(), CanvasError> {
        self.check_index(from)?;
        self.check_index(to)?;
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        Ok(())
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> Result<(), CanvasError> {
        self.check_index(index)?;
        self.layers[index].visible = visible;
        Ok(())
    }

    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> Result<(), CanvasError> {
        self.check_index(index)?;
        self.layers[index].name = name.into();
        Ok(())
    }

    /// Fully independent copy: no pixel memory is shared with `self`.
    pub fn deep_copy(&self) -> Image {
        self.clone()
    }

    /// Flatten visible layers bottom to top into a fresh canvas-sized buffer.
    /// `preview` (the in-flight shape overlay) is blended last.
    pub fn composite(&self, preview: Option<&Layer>) -> PixelBuffer {
        let mut out = PixelBuffer::zeroed(self.width, self.height);
        let visible = self.layers.iter().filter(|l| l.visible);
        for layer in visible.chain(preview) {
            if !layer.pixels.blend_onto(&mut out, layer.x, layer.y) {
                tracing::trace!(
                    "composite: skipped layer '{}' ({}x{} at {},{})",
                    layer.name,
                    layer.width(),
                    layer.height(),
                    layer.x,
                    layer.y
                );
            }
        }
        out
    }

    pub fn memory_bytes(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.pixels.memory_bytes() + l.name.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const GREEN: Color = Color::rgb(0, 255, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn count(buf: &PixelBuffer, color: Color) -> usize {
        let mut n = 0;
        for y in 0..buf.height() {
            for x in 0..buf.width() {
                if buf.get(x, y) == Some(color) {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn new_buffer_is_zero_filled() {
        for (w, h) in [(0, 0), (0, 5), (3, 0), (1, 1), (7, 3)] {
            let buf = PixelBuffer::new(w, h).unwrap();
            assert_eq!(buf.as_bytes().len(), (w * h * 4) as usize);
            assert!(buf.as_bytes().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn negative_size_is_rejected() {
        assert_eq!(
            PixelBuffer::new(-1, 4),
            Err(CanvasError::InvalidSize { width: -1, height: 4 })
        );
        assert!(Image::new(4, -2).is_err());
        assert!(Layer::new("x", -3, 1).is_err());
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut buf = PixelBuffer::new(4, 3).unwrap();
        let c = Color::new(1, 2, 3, 4);
        assert!(buf.set(3, 2, c));
        assert_eq!(buf.get(3, 2), Some(c));
        assert_eq!(buf.get(0, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn out_of_bounds_access_is_rejected() {
        let mut buf = PixelBuffer::new(4, 3).unwrap();
        let before = buf.clone();
        for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 3), (100, 100), (i32::MIN, i32::MAX)] {
            assert!(!buf.set(x, y, RED));
            assert_eq!(buf.get(x, y), None);
        }
        assert_eq!(buf, before);
    }

    #[test]
    fn horizontal_line_covers_every_pixel() {
        let mut buf = PixelBuffer::new(10, 10).unwrap();
        buf.draw_line(0, 0, 4, 0, RED);
        for x in 0..=4 {
            assert_eq!(buf.get(x, 0), Some(RED), "pixel {x}");
        }
        assert_eq!(count(&buf, RED), 5);
        assert_eq!(count(&buf, Color::TRANSPARENT), 95);
    }

    #[test]
    fn degenerate_line_writes_single_pixel() {
        let mut buf = PixelBuffer::new(5, 5).unwrap();
        buf.draw_line(2, 3, 2, 3, BLUE);
        assert_eq!(buf.get(2, 3), Some(BLUE));
        assert_eq!(count(&buf, BLUE), 1);
    }

    #[test]
    fn diagonal_line_steps_one_pixel_per_row() {
        let mut buf = PixelBuffer::new(6, 6).unwrap();
        buf.draw_line(5, 5, 0, 0, GREEN);
        for i in 0..6 {
            assert_eq!(buf.get(i, i), Some(GREEN));
        }
        assert_eq!(count(&buf, GREEN), 6);
    }

    #[test]
    fn line_partially_off_canvas_is_clipped() {
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        buf.draw_line(-3, 1, 6, 1, RED);
        assert_eq!(count(&buf, RED), 4);
    }

    #[test]
    fn fill_blank_buffer_recolors_everything() {
        let mut buf = PixelBuffer::new(10, 10).unwrap();
        buf.fill(5, 5, GREEN);
        assert_eq!(count(&buf, GREEN), 100);
    }

    #[test]
    fn fill_with_same_color_is_noop() {
        let mut buf = PixelBuffer::new(6, 6).unwrap();
        buf.fill_all(RED);
        let before = buf.clone();
        buf.fill(2, 2, RED);
        assert_eq!(buf, before);
    }

    #[test]
    fn fill_out_of_bounds_seed_is_noop() {
        let mut buf = PixelBuffer::new(3, 3).unwrap();
        buf.fill(-1, 0, RED);
        buf.fill(3, 3, RED);
        assert_eq!(count(&buf, RED), 0);
    }

    #[test]
    fn fill_stays_inside_enclosed_region() {
        // 7x7 with a red square outline from (1,1) to (5,5)
        let mut buf = PixelBuffer::new(7, 7).unwrap();
        buf.draw_line(1, 1, 5, 1, RED);
        buf.draw_line(1, 5, 5, 5, RED);
        buf.draw_line(1, 1, 1, 5, RED);
        buf.draw_line(5, 1, 5, 5, RED);

        buf.fill(3, 3, BLUE);

        for y in 0..7 {
            for x in 0..7 {
                let inside = (2..=4).contains(&x) && (2..=4).contains(&y);
                let border = (x == 1 || x == 5) && (1..=5).contains(&y)
                    || (y == 1 || y == 5) && (1..=5).contains(&x);
                let expected = if inside {
                    BLUE
                } else if border {
                    RED
                } else {
                    Color::TRANSPARENT
                };
                assert_eq!(buf.get(x, y), Some(expected), "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn fill_does_not_leak_through_diagonal_gaps() {
        // Diagonal wall: 4-connectivity must not cross it.
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        buf.draw_line(0, 3, 3, 0, RED);
        buf.fill(0, 0, GREEN);
        assert_eq!(buf.get(3, 3), Some(Color::TRANSPARENT));
        assert_eq!(count(&buf, GREEN), 6);
    }

    #[test]
    fn blend_transparent_source_leaves_base_unchanged() {
        let src = PixelBuffer::new(4, 4).unwrap();
        let mut base = PixelBuffer::new(4, 4).unwrap();
        base.fill_all(Color::new(10, 20, 30, 200));
        let before = base.clone();
        assert!(src.blend_onto(&mut base, 0, 0));
        assert_eq!(base, before);
    }

    #[test]
    fn blend_opaque_source_copies_overlap() {
        let mut src = PixelBuffer::new(2, 2).unwrap();
        src.fill_all(RED);
        let mut base = PixelBuffer::new(4, 4).unwrap();
        base.fill_all(BLUE);
        assert!(src.blend_onto(&mut base, 1, 2));
        for y in 0..4 {
            for x in 0..4 {
                let covered = (1..3).contains(&x) && (2..4).contains(&y);
                assert_eq!(base.get(x, y), Some(if covered { RED } else { BLUE }));
            }
        }
    }

    #[test]
    fn blend_clips_negative_offsets() {
        let mut src = PixelBuffer::new(3, 3).unwrap();
        src.fill_all(RED);
        let mut base = PixelBuffer::new(4, 4).unwrap();
        assert!(src.blend_onto(&mut base, -2, -1));
        assert_eq!(count(&base, RED), 2);
        assert_eq!(base.get(0, 0), Some(RED));
        assert_eq!(base.get(0, 1), Some(RED));
    }

    #[test]
    fn blend_rejects_larger_source_and_disjoint_offsets() {
        let src = PixelBuffer::new(5, 2).unwrap();
        let mut base = PixelBuffer::new(4, 4).unwrap();
        assert!(!src.blend_onto(&mut base, 0, 0));

        let small = PixelBuffer::new(2, 2).unwrap();
        assert!(!small.blend_onto(&mut base, 4, 0));
        assert!(!small.blend_onto(&mut base, -2, 0));
        assert!(!small.blend_onto(&mut base, 0, 10));
    }

    #[test]
    fn blend_partial_alpha_uses_literal_formula() {
        // Onto a transparent base the factor is zero: the base color survives
        // and only the alpha comes from the source.
        let out = blend_pixel(Color::TRANSPARENT, Color::new(255, 0, 0, 128));
        assert_eq!(out, Color::new(0, 0, 0, 128));

        // Onto an opaque base the resulting alpha is always opaque.
        // a1 = 128/255, factor = 1 - a1: channel = 100 * factor = 49.80 -> 49
        let out = blend_pixel(Color::new(0, 0, 0, 255), Color::new(100, 100, 100, 128));
        assert_eq!(out, Color::new(49, 49, 49, 255));
    }

    #[test]
    fn blend_partial_alpha_over_partial_base() {
        // a1 = 64/255, a2 = 128/255, factor = a2 * (1 - a1)
        //   r = (200*a1 + 40*factor) / (a1+factor)  = 104.05
        //   g = (100*a1 + 80*factor) / (a1+factor)  =  88.01
        //   b = (50*a1 + 160*factor) / (a1+factor)  = 115.97
        //   a = round((a1+factor) * 255)            = round(159.87)
        let out = blend_pixel(Color::new(200, 100, 50, 128), Color::new(40, 80, 160, 64));
        assert_eq!(out, Color::new(104, 88, 115, 160));

        let mut base = PixelBuffer::new(1, 1).unwrap();
        base.set(0, 0, Color::new(200, 100, 50, 128));
        let mut src = PixelBuffer::new(1, 1).unwrap();
        src.set(0, 0, Color::new(40, 80, 160, 64));
        assert!(src.blend_onto(&mut base, 0, 0));
        assert_eq!(base.get(0, 0), Some(Color::new(104, 88, 115, 160)));
    }

    #[test]
    fn layer_from_rgba_copies_channels_in_order() {
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8];
        let layer = Layer::from_rgba("decoded", 2, 1, &bytes).unwrap();
        assert_eq!(layer.pixels.get(0, 0), Some(Color::new(1, 2, 3, 4)));
        assert_eq!(layer.pixels.get(1, 0), Some(Color::new(5, 6, 7, 8)));
        assert!(Layer::from_rgba("short", 2, 2, &bytes).is_err());
    }

    #[test]
    fn composite_single_opaque_layer() {
        let mut image = Image::new(10, 10).unwrap();
        let mut layer = Layer::new("blue", 10, 10).unwrap();
        layer.pixels.fill_all(BLUE);
        image.add_layer(layer);
        let out = image.composite(None);
        assert_eq!(out.width(), 10);
        assert_eq!(out.height(), 10);
        assert_eq!(count(&out, BLUE), 100);
    }

    #[test]
    fn composite_skips_hidden_layers_and_draws_preview_last() {
        let mut image = Image::new(4, 4).unwrap();
        let mut bottom = Layer::new("bottom", 4, 4).unwrap();
        bottom.pixels.fill_all(BLUE);
        let mut hidden = Layer::new("hidden", 4, 4).unwrap();
        hidden.pixels.fill_all(GREEN);
        hidden.visible = false;
        image.add_layer(bottom);
        image.add_layer(hidden);

        let mut preview = Layer::new("preview", 4, 4).unwrap();
        preview.pixels.set(1, 1, RED);

        let out = image.composite(Some(&preview));
        assert_eq!(out.get(1, 1), Some(RED));
        assert_eq!(count(&out, BLUE), 15);
        assert_eq!(count(&out, GREEN), 0);
    }

    #[test]
    fn add_remove_and_reorder_layers() {
        let mut image = Image::new(2, 2).unwrap();
        assert_eq!(image.add_layer(Layer::new("a", 2, 2).unwrap()), 0);
        assert_eq!(image.add_layer(Layer::new("b", 2, 2).unwrap()), 1);
        assert_eq!(image.duplicate_layer(0).unwrap(), 1);
        let names: Vec<_> = image.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["a", "a Copy", "b"]);

        image.move_layer(2, 0).unwrap();
        assert_eq!(image.layer(0).unwrap().name, "b");

        assert_eq!(
            image.remove_layer(3),
            Err(CanvasError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(image.remove_layer(0).unwrap().name, "b");
        assert_eq!(image.len(), 2);
    }

    #[test]
    fn extreme_coordinates_saturate() {
        assert_eq!(Point::new(i32::MAX, i32::MIN).offset(1, -1), Point::new(i32::MAX, i32::MIN));

        let mut layer = Layer::new("far", 2, 2).unwrap();
        layer.translate(i32::MIN, i32::MAX);
        layer.translate(-5, 5);
        assert_eq!(layer.position(), Point::new(i32::MIN, i32::MAX));
        assert_eq!(layer.to_local(Point::new(i32::MAX, i32::MIN)), Point::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn deep_copy_shares_no_pixels() {
        let mut image = Image::new(3, 3).unwrap();
        image.add_layer(Layer::new("a", 3, 3).unwrap());
        let copy = image.deep_copy();
        image.layer_mut(0).unwrap().pixels.set(0, 0, RED);
        assert_eq!(copy.layer(0).unwrap().pixels.get(0, 0), Some(Color::TRANSPARENT));
    }
}
