use serde::{Deserialize, Serialize};

use crate::canvas::{Color, Layer, Point};
use crate::ops::shapes::{self, SprayRng};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Pencil,
    Paintbrush,
    ColorPicker,
    PaintBucket,
    SprayCan,
    Eraser,
    Move,
    Line,
    Rectangle,
    RectangleSelect,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Paintbrush => "Paintbrush",
            Tool::ColorPicker => "Color Picker",
            Tool::PaintBucket => "Paint Bucket",
            Tool::SprayCan => "Spray Can",
            Tool::Eraser => "Eraser",
            Tool::Move => "Move",
            Tool::Line => "Line",
            Tool::Rectangle => "Rectangle",
            Tool::RectangleSelect => "Rectangle Select",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pencil,
            Tool::Paintbrush,
            Tool::ColorPicker,
            Tool::PaintBucket,
            Tool::SprayCan,
            Tool::Eraser,
            Tool::Move,
            Tool::Line,
            Tool::Rectangle,
            Tool::RectangleSelect,
        ]
    }

    /// Shape tools rubber-band into the preview layer until release.
    pub fn uses_preview(&self) -> bool {
        matches!(self, Tool::Line | Tool::Rectangle)
    }

    /// Whether the tool runs again on every pointer sample after `down`.
    /// The bucket fills once, at the press position.
    pub fn repeats_on_drag(&self) -> bool {
        !matches!(self, Tool::PaintBucket)
    }
}

/// Largest accepted brush size. Larger requests are clamped to it.
pub const MAX_BRUSH_SIZE: i32 = 512;

/// Whether the rectangle tool paints a solid area or a border.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    Filled,
    #[default]
    Outline,
}

/// Style configuration passed into every tool call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolProperties {
    pub color: Color,
    /// Brush diameter for paintbrush/eraser; ring count for outlined rectangles.
    pub brush_size: i32,
    pub fill_mode: FillMode,
}

impl ToolProperties {
    /// `brush_size` limited to `0..=MAX_BRUSH_SIZE`.
    pub fn clamped_brush_size(&self) -> i32 {
        self.brush_size.clamp(0, MAX_BRUSH_SIZE)
    }

    pub fn brush_radius(&self) -> i32 {
        self.clamped_brush_size() / 2
    }
}

impl Default for ToolProperties {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            brush_size: 4,
            fill_mode: FillMode::Outline,
        }
    }
}

/// Pointer positions for one tool application, all in the active layer's
/// local pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stroke {
    /// Position at the previous event.
    pub last: Point,
    /// Position where the pointer went down.
    pub origin: Point,
    pub current: Point,
}

impl Stroke {
    /// The first application of a gesture: all three points coincide.
    pub fn at(point: Point) -> Self {
        Self {
            last: point,
            origin: point,
            current: point,
        }
    }
}

/// What a tool application reports back beyond pixel changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolOutcome {
    None,
    /// The color picker sampled a pixel.
    PickedColor(Color),
    /// Rectangle select marked a region (layer-local corners).
    Selected { from: Point, to: Point },
}

// ============================================================================
// TOOL ENGINE: stateless dispatch onto pixel operations
// ============================================================================

/// Maps a tool and a gesture onto operations against the active layer and
/// the preview layer. Holds no state; everything arrives per call.
pub struct ToolEngine;

impl ToolEngine {
    pub fn apply(
        tool: Tool,
        props: &ToolProperties,
        stroke: Stroke,
        layer: &mut Layer,
        preview: &mut Layer,
    ) -> ToolOutcome {
        let Stroke { last, origin, current } = stroke;

        match tool {
            Tool::Pencil => {
                layer
                    .pixels
                    .draw_line(last.x, last.y, current.x, current.y, props.color);
            }
            Tool::Paintbrush => {
                Self::stamp_disc(layer, last, current, props.brush_radius(), props.color);
            }
            Tool::Eraser => {
                Self::stamp_disc(layer, last, current, props.brush_radius(), Color::TRANSPARENT);
            }
            Tool::ColorPicker => {
                if let Some(color) = layer.pixels.get(current.x, current.y) {
                    return ToolOutcome::PickedColor(color);
                }
            }
            Tool::PaintBucket => {
                layer.pixels.fill(current.x, current.y, props.color);
            }
            Tool::SprayCan => {
                // Driven by `spray_tick`; pointer samples only move the nozzle.
            }
            Tool::Move => {
                let dx = current.x.saturating_sub(last.x);
                let dy = current.y.saturating_sub(last.y);
                layer.translate(dx, dy);
                preview.translate(dx, dy);
            }
            Tool::Line => {
                preview.pixels.clear();
                preview
                    .pixels
                    .draw_line(origin.x, origin.y, current.x, current.y, props.color);
            }
            Tool::Rectangle => {
                preview.pixels.clear();
                match props.fill_mode {
                    FillMode::Filled => {
                        shapes::fill_rect(&mut preview.pixels, origin, current, props.color)
                    }
                    FillMode::Outline => shapes::outline_rect(
                        &mut preview.pixels,
                        origin,
                        current,
                        props.clamped_brush_size(),
                        props.color,
                    ),
                }
            }
            Tool::RectangleSelect => {
                return ToolOutcome::Selected {
                    from: origin,
                    to: current,
                };
            }
        }
        ToolOutcome::None
    }

    /// One spray-can timer tick around `current`.
    pub fn spray_tick(props: &ToolProperties, current: Point, layer: &mut Layer, rng: &mut SprayRng) {
        shapes::spray(&mut layer.pixels, current, props.color, rng);
    }

    /// Blend pending preview content into the layer and clear the preview.
    pub fn commit(layer: &mut Layer, preview: &mut Layer) {
        let dx = preview.x.saturating_sub(layer.x);
        let dy = preview.y.saturating_sub(layer.y);
        preview.pixels.blend_onto(&mut layer.pixels, dx, dy);
        preview.pixels.clear();
    }

    /// Round brush approximation: the segment is redrawn once per disc offset.
    fn stamp_disc(layer: &mut Layer, from: Point, to: Point, radius: i32, color: Color) {
        for (dx, dy) in shapes::disc_offsets(radius) {
            let (a, b) = (from.offset(dx, dy), to.offset(dx, dy));
            layer.pixels.draw_line(a.x, a.y, b.x, b.y, color);
        }
    }
}
