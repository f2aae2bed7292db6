// ============================================================================
// TRANSFORM OPERATIONS: flip and rotate for buffers and whole images
// ============================================================================

use rayon::prelude::*;

use crate::canvas::{Image, PixelBuffer};

impl PixelBuffer {
    /// Rotate 90° clockwise into a new buffer with swapped dimensions.
    /// Source `(x, y)` lands at `(height - 1 - y, x)`.
    pub fn rotate_90(&self) -> PixelBuffer {
        let (old_w, old_h) = (self.width() as usize, self.height() as usize);
        let mut out = PixelBuffer::zeroed(self.height(), self.width());
        if old_w == 0 || old_h == 0 {
            return out;
        }

        let src = self.as_bytes();
        let new_w = old_h;
        out.as_bytes_mut()
            .par_chunks_exact_mut(new_w * 4)
            .enumerate()
            .for_each(|(dy, row)| {
                // Destination row dy holds source column x = dy, read bottom-up.
                for dx in 0..new_w {
                    let sy = old_h - 1 - dx;
                    let s = (sy * old_w + dy) * 4;
                    row[dx * 4..dx * 4 + 4].copy_from_slice(&src[s..s + 4]);
                }
            });
        out
    }

    /// Mirror left↔right.
    pub fn flip_horizontal(&self) -> PixelBuffer {
        let w = self.width() as usize;
        let mut out = self.clone();
        if w == 0 || self.height() == 0 {
            return out;
        }
        out.as_bytes_mut()
            .par_chunks_exact_mut(w * 4)
            .zip(self.as_bytes().par_chunks_exact(w * 4))
            .for_each(|(dst, src)| {
                for x in 0..w {
                    let s = (w - 1 - x) * 4;
                    dst[x * 4..x * 4 + 4].copy_from_slice(&src[s..s + 4]);
                }
            });
        out
    }

    /// Mirror top↔bottom.
    pub fn flip_vertical(&self) -> PixelBuffer {
        let stride = self.width() as usize * 4;
        let mut out = self.clone();
        if stride == 0 || self.height() == 0 {
            return out;
        }
        out.as_bytes_mut()
            .par_chunks_exact_mut(stride)
            .zip(self.as_bytes().par_chunks_exact(stride).rev())
            .for_each(|(dst, src)| dst.copy_from_slice(src));
        out
    }
}

// ---------------------------------------------------------------------------
//  Whole-canvas transforms (affect ALL layers)
// ---------------------------------------------------------------------------

impl Image {
    /// Rotate the entire canvas 90° clockwise (swaps W↔H).
    ///
    /// Each layer is rotated and re-placed at
    /// `(old_canvas_height - y - layer_height, x)` so it keeps its visual
    /// position relative to the canvas.
    pub fn rotate_90(&mut self) {
        let old_canvas_h = self.height;
        let rotated: Vec<PixelBuffer> = self
            .layers
            .par_iter()
            .map(|layer| layer.pixels.rotate_90())
            .collect();

        for (layer, pixels) in self.layers.iter_mut().zip(rotated) {
            let (old_x, old_y, old_h) = (layer.x, layer.y, layer.height());
            layer.pixels = pixels;
            layer.x = old_canvas_h.saturating_sub(old_y).saturating_sub(old_h);
            layer.y = old_x;
        }
        std::mem::swap(&mut self.width, &mut self.height);
    }

    /// Mirror every layer left↔right. Layer offsets are left as they are.
    pub fn flip_horizontal(&mut self) {
        self.layers.par_iter_mut().for_each(|layer| {
            layer.pixels = layer.pixels.flip_horizontal();
        });
    }

    /// Mirror every layer top↔bottom. Layer offsets are left as they are.
    pub fn flip_vertical(&mut self) {
        self.layers.par_iter_mut().for_each(|layer| {
            layer.pixels = layer.pixels.flip_vertical();
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::canvas::{Color, Image, Layer, PixelBuffer};

    const MARK: Color = Color::rgb(200, 10, 10);

    fn marked(w: i32, h: i32, x: i32, y: i32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(w, h).unwrap();
        buf.set(x, y, MARK);
        buf
    }

    #[test]
    fn rotate_maps_pixel_clockwise() {
        let buf = marked(5, 3, 1, 0);
        let r = buf.rotate_90();
        assert_eq!((r.width(), r.height()), (3, 5));
        // (x, y) -> (height - 1 - y, x)
        assert_eq!(r.get(2, 1), Some(MARK));
    }

    #[test]
    fn four_rotations_are_identity() {
        let buf = marked(5, 3, 4, 2);
        let r = buf.rotate_90().rotate_90().rotate_90().rotate_90();
        assert_eq!((r.width(), r.height()), (5, 3));
        assert_eq!(r.get(4, 2), Some(MARK));
        assert_eq!(r, buf);
    }

    #[test]
    fn rotate_empty_buffer_swaps_dimensions() {
        let buf = PixelBuffer::new(0, 4).unwrap();
        let r = buf.rotate_90();
        assert_eq!((r.width(), r.height()), (4, 0));
    }

    #[test]
    fn flips_mirror_and_are_involutions() {
        let buf = marked(4, 3, 0, 0);

        let h = buf.flip_horizontal();
        assert_eq!(h.get(3, 0), Some(MARK));
        assert_eq!(h.flip_horizontal(), buf);

        let v = buf.flip_vertical();
        assert_eq!(v.get(0, 2), Some(MARK));
        assert_eq!(v.flip_vertical(), buf);
    }

    #[test]
    fn image_rotation_keeps_layer_position() {
        let mut image = Image::new(10, 6).unwrap();
        let mut layer = Layer::new("patch", 2, 3).unwrap();
        layer.x = 1;
        layer.y = 2;
        layer.pixels.fill_all(MARK);
        image.add_layer(layer);

        let before = image.composite(None).rotate_90();
        image.rotate_90();

        assert_eq!((image.width(), image.height()), (6, 10));
        let l = image.layer(0).unwrap();
        assert_eq!((l.x, l.y), (6 - 2 - 3, 1));
        assert_eq!((l.width(), l.height()), (3, 2));
        assert_eq!(image.composite(None), before);
    }

    #[test]
    fn rotation_of_far_offset_layer_saturates() {
        let mut image = Image::new(4, 4).unwrap();
        let mut layer = Layer::new("far", 2, 2).unwrap();
        layer.x = i32::MAX;
        layer.y = i32::MIN;
        image.add_layer(layer);

        image.rotate_90();
        let l = image.layer(0).unwrap();
        assert_eq!((l.x, l.y), (i32::MAX - 2, i32::MAX));
    }

    #[test]
    fn image_flip_does_not_move_layers() {
        let mut image = Image::new(4, 4).unwrap();
        let mut layer = Layer::new("a", 2, 2).unwrap();
        layer.x = 1;
        layer.pixels.set(0, 0, MARK);
        image.add_layer(layer);

        image.flip_horizontal();
        let l = image.layer(0).unwrap();
        assert_eq!((l.x, l.y), (1, 0));
        assert_eq!(l.pixels.get(1, 0), Some(MARK));

        image.flip_vertical();
        assert_eq!(image.layer(0).unwrap().pixels.get(1, 1), Some(MARK));
    }
}
