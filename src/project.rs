use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canvas::{Color, Image, Layer, PixelBuffer, Point};
use crate::components::history::History;
use crate::components::tools::{
    FillMode, MAX_BRUSH_SIZE, Stroke, Tool, ToolEngine, ToolOutcome, ToolProperties,
};
use crate::error::CanvasError;
use crate::ops::shapes::SprayRng;

/// Pointer phase reported by the front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    Down,
    Move,
    Up,
}

/// One input event: tool, color and a canvas-space point, plus optional
/// side configuration applied before the event is routed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub tool: Tool,
    pub color: Color,
    pub point: Point,
    pub phase: GesturePhase,
    #[serde(default)]
    pub brush_size: Option<i32>,
    #[serde(default)]
    pub fill_mode: Option<FillMode>,
}

/// Canvas-space rectangle recorded by the rectangle-select tool (inclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub min: Point,
    pub max: Point,
}

impl Selection {
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> i32 {
        self.max.x.saturating_sub(self.min.x).saturating_add(1)
    }

    pub fn height(&self) -> i32 {
        self.max.y.saturating_sub(self.min.y).saturating_add(1)
    }
}

/// Pointer state between `down` and `up`, in canvas space. Converted to the
/// active layer's local space on every application so a moving layer sees
/// canvas deltas.
#[derive(Clone, Copy, Debug)]
struct Gesture {
    origin: Point,
    last: Point,
}

/// Single open document.
pub struct Project {
    pub id: Uuid,
    pub image: Image,
    pub history: History,
    /// `None` for unsaved/untitled files.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,

    active_layer: Option<usize>,
    tool: Tool,
    props: ToolProperties,
    selection: Option<Selection>,

    // in-flight gesture
    gesture: Option<Gesture>,
    preview: Option<Layer>,
    spray_rng: SprayRng,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, width: i32, height: i32) -> Result<Self, CanvasError> {
        let mut image = Image::new(width, height)?;
        image.add_layer(Layer::new("Background", width, height)?);
        Ok(Self::with_image(format!("Untitled-{}", untitled_counter), None, image))
    }

    /// Wrap an already decoded image. The top layer becomes active.
    pub fn from_image(path: PathBuf, image: Image) -> Self {
        let name = name_from_path(&path);
        Self::with_image(name, Some(path), image)
    }

    fn with_image(name: String, path: Option<PathBuf>, image: Image) -> Self {
        let active_layer = image.len().checked_sub(1);
        let mut history = History::new();
        history.take_snapshot(&image);

        Self {
            id: Uuid::new_v4(),
            image,
            history,
            path,
            is_dirty: false,
            name,
            active_layer,
            tool: Tool::default(),
            props: ToolProperties::default(),
            selection: None,
            gesture: None,
            preview: None,
            spray_rng: SprayRng::new(0x5EED_1234),
        }
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    /// Record a successful save to `path`: the project takes the file's name
    /// and is no longer dirty.
    pub fn mark_saved(&mut self, path: PathBuf) {
        self.path = Some(path);
        self.update_name_from_path();
        self.mark_clean();
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = name_from_path(path);
        }
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    // ========================================================================
    // TOOL CONFIGURATION
    // ========================================================================

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn properties(&self) -> &ToolProperties {
        &self.props
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Color) {
        self.props.color = color;
    }

    /// Clamped to `0..=MAX_BRUSH_SIZE`.
    pub fn set_brush_size(&mut self, size: i32) {
        self.props.brush_size = size.clamp(0, MAX_BRUSH_SIZE);
    }

    pub fn set_fill_mode(&mut self, mode: FillMode) {
        self.props.fill_mode = mode;
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Reseed the spray scatter so a replayed session paints identically.
    pub fn seed_spray(&mut self, seed: u32) {
        self.spray_rng = SprayRng::new(seed);
    }

    // ========================================================================
    // POINTER INPUT
    // ========================================================================

    pub fn is_pointer_down(&self) -> bool {
        self.gesture.is_some()
    }

    /// Start a gesture at a canvas-space point. A gesture already in flight
    /// is abandoned along with its uncommitted preview.
    pub fn pointer_down(&mut self, point: Point) {
        let Some(layer) = self.active_layer.and_then(|i| self.image.layer(i)) else {
            tracing::debug!("pointer down ignored: no active layer");
            return;
        };

        let mut preview = Layer::with_pixels("preview", PixelBuffer::zeroed(layer.width(), layer.height()));
        preview.x = layer.x;
        preview.y = layer.y;
        self.preview = Some(preview);
        self.gesture = Some(Gesture {
            origin: point,
            last: point,
        });
        tracing::debug!("{} down at {},{}", self.tool.label(), point.x, point.y);
        self.apply_tool(point, true);
    }

    pub fn pointer_move(&mut self, point: Point) {
        if self.gesture.is_some() {
            self.apply_tool(point, false);
        }
    }

    /// Finish the gesture: one last application, commit the preview onto the
    /// active layer and record a history snapshot.
    pub fn pointer_up(&mut self, point: Point) {
        if self.gesture.is_none() {
            return;
        }
        self.apply_tool(point, false);

        let preview = self.preview.take();
        self.gesture = None;
        if let (Some(mut preview), Some(layer)) = (
            preview,
            self.active_layer.and_then(|i| self.image.layer_mut(i)),
        ) {
            ToolEngine::commit(layer, &mut preview);
        }

        tracing::debug!("{} committed at {},{}", self.tool.label(), point.x, point.y);
        self.record();
    }

    /// Route a front-end event: side configuration first, then the phase.
    pub fn apply_event(&mut self, event: &GestureEvent) {
        self.tool = event.tool;
        self.props.color = event.color;
        if let Some(size) = event.brush_size {
            self.set_brush_size(size);
        }
        if let Some(mode) = event.fill_mode {
            self.props.fill_mode = mode;
        }

        match event.phase {
            GesturePhase::Down => self.pointer_down(event.point),
            GesturePhase::Move => self.pointer_move(event.point),
            GesturePhase::Up => self.pointer_up(event.point),
        }
    }

    /// Front-end timer callback for the spray can. Returns `false` when no
    /// spray gesture is in progress.
    pub fn spray_tick(&mut self) -> bool {
        if self.tool != Tool::SprayCan {
            return false;
        }
        let Some(gesture) = self.gesture else {
            return false;
        };
        let Some(layer) = self.active_layer.and_then(|i| self.image.layers.get_mut(i)) else {
            return false;
        };
        let local = layer.to_local(gesture.last);
        ToolEngine::spray_tick(&self.props, local, layer, &mut self.spray_rng);
        true
    }

    fn apply_tool(&mut self, current: Point, first: bool) {
        let Some(gesture) = self.gesture else {
            return;
        };
        if !first && !self.tool.repeats_on_drag() {
            self.gesture = Some(Gesture {
                last: current,
                ..gesture
            });
            return;
        }
        let Some(layer) = self.active_layer.and_then(|i| self.image.layers.get_mut(i)) else {
            return;
        };
        let Some(preview) = self.preview.as_mut() else {
            return;
        };

        let stroke = Stroke {
            last: layer.to_local(gesture.last),
            origin: layer.to_local(gesture.origin),
            current: layer.to_local(current),
        };
        let outcome = ToolEngine::apply(self.tool, &self.props, stroke, layer, preview);

        match outcome {
            ToolOutcome::None => {}
            ToolOutcome::PickedColor(color) => self.props.color = color,
            ToolOutcome::Selected { .. } => {
                self.selection = Some(Selection::from_corners(gesture.origin, current));
            }
        }
        self.gesture = Some(Gesture {
            last: current,
            ..gesture
        });
    }

    // ========================================================================
    // LAYERS
    // ========================================================================

    pub fn active_layer(&self) -> Option<usize> {
        self.active_layer
    }

    /// Append a canvas-sized blank layer on top and make it active.
    pub fn add_layer(&mut self) -> usize {
        let name = format!("Layer {}", self.image.len() + 1);
        let layer = Layer::with_pixels(name, PixelBuffer::zeroed(self.image.width(), self.image.height()));
        let index = self.image.add_layer(layer);
        self.active_layer = Some(index);
        self.record();
        index
    }

    pub fn remove_layer(&mut self, index: usize) -> Result<Layer, CanvasError> {
        let removed = self.image.remove_layer(index)?;
        if let Some(active) = self.active_layer
            && active > index
        {
            self.active_layer = Some(active - 1);
        }
        self.clamp_active();
        self.record();
        Ok(removed)
    }

    pub fn select_layer(&mut self, index: usize) -> Result<(), CanvasError> {
        if index >= self.image.len() {
            return Err(CanvasError::IndexOutOfRange {
                index,
                len: self.image.len(),
            });
        }
        self.active_layer = Some(index);
        Ok(())
    }

    /// Duplicate layer `index` directly above itself; the copy becomes active.
    pub fn duplicate_layer(&mut self, index: usize) -> Result<usize, CanvasError> {
        let copy = self.image.duplicate_layer(index)?;
        self.active_layer = Some(copy);
        self.record();
        Ok(copy)
    }

    /// Reorder a layer; the active selection follows the layer it pointed at.
    pub fn move_layer(&mut self, from: usize, to: usize) -> Result<(), CanvasError> {
        self.image.move_layer(from, to)?;
        if let Some(active) = self.active_layer {
            self.active_layer = Some(if active == from {
                to
            } else if from < active && to >= active {
                active - 1
            } else if from > active && to <= active {
                active + 1
            } else {
                active
            });
        }
        self.record();
        Ok(())
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> Result<(), CanvasError> {
        self.image.set_visible(index, visible)?;
        self.record();
        Ok(())
    }

    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> Result<(), CanvasError> {
        self.image.rename_layer(index, name)?;
        self.record();
        Ok(())
    }

    fn clamp_active(&mut self) {
        self.active_layer = match (self.image.len(), self.active_layer) {
            (0, _) => None,
            (len, Some(i)) => Some(i.min(len - 1)),
            (len, None) => Some(len - 1),
        };
    }

    // ========================================================================
    // CANVAS TRANSFORMS
    // ========================================================================

    pub fn rotate_90(&mut self) {
        self.image.rotate_90();
        self.record();
    }

    pub fn flip_horizontal(&mut self) {
        self.image.flip_horizontal();
        self.record();
    }

    pub fn flip_vertical(&mut self) {
        self.image.flip_vertical();
        self.record();
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    fn record(&mut self) {
        self.history.take_snapshot(&self.image);
        self.mark_dirty();
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.image);
        if changed {
            self.clamp_active();
            self.mark_dirty();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.image);
        if changed {
            self.clamp_active();
            self.mark_dirty();
        }
        changed
    }

    // ========================================================================
    // OUTPUT
    // ========================================================================

    /// Flattened view of the document, including any uncommitted preview.
    pub fn composite(&self) -> PixelBuffer {
        self.image.composite(self.preview.as_ref())
    }
}

fn name_from_path(path: &std::path::Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
