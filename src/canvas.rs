use std::fmt;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use thiserror::Error;
use uuid::Uuid;

use crate::buffer::{BufferError, PixelBuffer};
use crate::ops::adjustments::{AdjustmentKind, FilterError};
use crate::ops::change_log::ChangeLog;
use crate::ops::filter_engine::FilterEngine;
use crate::ops::filters::Preset;
use crate::ops::transform::{self, CropRect, Rotation};

/// Smallest width / height a layer can be resized to.
pub const MIN_LAYER_SIZE: u32 = 20;

/// New text layers start as a 100x60 box with the baseline at (10, 30).
pub const TEXT_LAYER_WIDTH: u32 = 100;
pub const TEXT_LAYER_HEIGHT: u32 = 60;
pub const TEXT_ORIGIN: (i32, i32) = (10, 30);

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("layer index {index} out of range ({len} layers)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{layer} layers do not support {capability}")]
    Unsupported { layer: &'static str, capability: Capability },
    #[error("layer '{0}' is not an image layer")]
    NotAnImageLayer(String),
    #[error("crop {rect} does not fit inside {width}x{height}")]
    CropOutOfBounds { rect: CropRect, width: u32, height: u32 },
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

// ============================================================================
// CAPABILITIES
// ============================================================================

/// What a layer kind can do. Checked before every geometry / filter op.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Rotate,
    Flip,
    Crop,
    Filter,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Rotate => "rotate",
            Capability::Flip   => "flip",
            Capability::Crop   => "crop",
            Capability::Filter => "filters",
        })
    }
}

// ============================================================================
// LAYER BOUNDS
// ============================================================================

/// Position and display size of a layer inside the editor canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl LayerBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Resize, never below [`MIN_LAYER_SIZE`] on either side.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(MIN_LAYER_SIZE);
        self.height = height.max(MIN_LAYER_SIZE);
    }

    fn swap_axes(&mut self) {
        std::mem::swap(&mut self.width, &mut self.height);
    }
}

// ============================================================================
// IMAGE LAYER
// ============================================================================

/// Raster layer: the as-loaded image plus a filter engine over the current
/// geometry (after crop / rotate / flip).
#[derive(Clone, Debug)]
pub struct ImageLayer {
    original: PixelBuffer,
    engine: FilterEngine,
}

impl ImageLayer {
    pub fn new(source: PixelBuffer) -> Self {
        Self { engine: FilterEngine::new(source.clone()), original: source }
    }

    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    pub fn source(&self) -> &PixelBuffer {
        self.engine.source()
    }

    pub fn change_log(&self) -> &ChangeLog {
        self.engine.log()
    }

    /// Replace the edit history, e.g. with a loaded recipe.
    pub fn load_change_log(&mut self, log: ChangeLog) -> Result<(), LayerError> {
        self.engine = FilterEngine::with_log(self.engine.source().clone(), log)?;
        Ok(())
    }

    /// Current pixels with every recorded change applied.
    pub fn rendered(&self) -> Result<PixelBuffer, LayerError> {
        Ok(self.engine.adjusted_buffer(None)?)
    }

    pub fn apply_adjustment(
        &mut self,
        kind: AdjustmentKind,
        value: f64,
    ) -> Result<PixelBuffer, LayerError> {
        Ok(self.engine.apply_adjustment(kind, value)?)
    }

    pub fn apply_preset(&mut self, preset: Preset) -> Result<PixelBuffer, LayerError> {
        Ok(self.engine.apply_preset(preset)?)
    }

    pub fn preview_thumbnail(&self, preset: Preset) -> Result<PixelBuffer, LayerError> {
        Ok(self.engine.preview_thumbnail(preset)?)
    }

    /// One thumbnail per preset, rendered from a downscaled copy of the source.
    pub fn preset_thumbnails(&self, max_edge: u32) -> Result<Vec<(Preset, PixelBuffer)>, LayerError> {
        let small = transform::downscale(self.engine.source(), max_edge)?;
        Preset::ALL
            .into_iter()
            .map(|preset| -> Result<_, LayerError> { Ok((preset, preset.render(&small)?)) })
            .collect()
    }

    fn rotate(&mut self, direction: Rotation) -> Result<(), LayerError> {
        let rotated = transform::rotate(self.engine.source(), direction)?;
        self.engine.replace_source(rotated);
        Ok(())
    }

    fn flip_horizontal(&mut self) -> Result<(), LayerError> {
        let flipped = transform::flip_horizontal(self.engine.source())?;
        self.engine.replace_source(flipped);
        Ok(())
    }

    fn crop(&mut self, rect: CropRect) -> Result<(), LayerError> {
        let cropped = transform::crop(self.engine.source(), rect)?;
        self.engine.replace_source(cropped);
        Ok(())
    }

    /// Back to the image as it was loaded: geometry restored, log cleared.
    pub fn reset_changes(&mut self) {
        self.engine = FilterEngine::new(self.original.clone());
        log::info!("image layer reset to original");
    }
}

// ============================================================================
// TEXT LAYER
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextStyle {
    pub text: String,
    pub font_family: String,
    pub font_size_px: u32,
    pub bold: bool,
    pub italic: bool,
    pub color: [u8; 3],
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text: "Add Text".to_string(),
            font_family: "Arial".to_string(),
            font_size_px: 10,
            bold: false,
            italic: false,
            color: [0, 0, 0],
        }
    }
}

impl TextStyle {
    /// CSS-style font shorthand, e.g. `"bold italic 10px Arial"`.
    pub fn font_spec(&self) -> String {
        let size = format!("{}px", self.font_size_px);
        let parts = [
            if self.bold { "bold" } else { "" },
            if self.italic { "italic" } else { "" },
            size.as_str(),
            self.font_family.as_str(),
        ];
        parts.iter().filter(|p| !p.is_empty()).copied().collect::<Vec<_>>().join(" ")
    }

    pub fn color_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.color[0], self.color[1], self.color[2])
    }
}

/// Text layer. Glyph rasterisation belongs to the drawing surface; this holds
/// the style and the size of the box the text is drawn into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLayer {
    pub style: TextStyle,
    width: u32,
    height: u32,
}

impl Default for TextLayer {
    fn default() -> Self {
        Self { style: TextStyle::default(), width: TEXT_LAYER_WIDTH, height: TEXT_LAYER_HEIGHT }
    }
}

impl TextLayer {
    pub fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rotate(&mut self) {
        std::mem::swap(&mut self.width, &mut self.height);
    }
}

// ============================================================================
// LAYER
// ============================================================================

#[derive(Clone, Debug)]
pub enum LayerContent {
    Image(ImageLayer),
    Text(TextLayer),
}

#[derive(Clone, Debug)]
pub struct Layer {
    pub id: Uuid,
    pub name: String,
    pub visible: bool,
    pub bounds: LayerBounds,
    pub content: LayerContent,
}

impl Layer {
    pub fn image(name: impl Into<String>, source: PixelBuffer) -> Self {
        let bounds = LayerBounds::new(source.width(), source.height());
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            visible: true,
            bounds,
            content: LayerContent::Image(ImageLayer::new(source)),
        }
    }

    pub fn text(name: impl Into<String>, style: TextStyle) -> Self {
        let text = TextLayer { style, ..TextLayer::default() };
        let (w, h) = text.surface_size();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            visible: true,
            bounds: LayerBounds::new(w, h),
            content: LayerContent::Text(text),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.content {
            LayerContent::Image(_) => "image",
            LayerContent::Text(_) => "text",
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match self.content {
            LayerContent::Image(_) => true,
            LayerContent::Text(_) => capability == Capability::Rotate,
        }
    }

    fn require(&self, capability: Capability) -> Result<(), LayerError> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(LayerError::Unsupported { layer: self.kind_name(), capability })
        }
    }

    pub fn as_image(&self) -> Result<&ImageLayer, LayerError> {
        match &self.content {
            LayerContent::Image(img) => Ok(img),
            LayerContent::Text(_) => Err(LayerError::NotAnImageLayer(self.name.clone())),
        }
    }

    pub fn as_image_mut(&mut self) -> Result<&mut ImageLayer, LayerError> {
        match &mut self.content {
            LayerContent::Image(img) => Ok(img),
            LayerContent::Text(_) => Err(LayerError::NotAnImageLayer(self.name.clone())),
        }
    }

    /// Quarter-turn; the layer box swaps width and height.
    pub fn rotate(&mut self, direction: Rotation) -> Result<(), LayerError> {
        self.require(Capability::Rotate)?;
        match &mut self.content {
            LayerContent::Image(img) => img.rotate(direction)?,
            LayerContent::Text(text) => text.rotate(),
        }
        self.bounds.swap_axes();
        log::debug!("layer '{}' rotated {:?}", self.name, direction);
        Ok(())
    }

    pub fn flip_horizontal(&mut self) -> Result<(), LayerError> {
        self.require(Capability::Flip)?;
        self.as_image_mut()?.flip_horizontal()?;
        log::debug!("layer '{}' flipped", self.name);
        Ok(())
    }

    /// Crop to `rect` (source pixels); the layer box takes the crop size,
/// subject to [`MIN_LAYER_SIZE`].
    pub fn crop(&mut self, rect: CropRect) -> Result<(), LayerError> {
        self.require(Capability::Crop)?;
        self.as_image_mut()?.crop(rect)?;
        self.bounds.resize(rect.width, rect.height);
        log::debug!("layer '{}' cropped to {}", self.name, rect);
        Ok(())
    }

    pub fn apply_adjustment(
        &mut self,
        kind: AdjustmentKind,
        value: f64,
    ) -> Result<PixelBuffer, LayerError> {
        self.require(Capability::Filter)?;
        self.as_image_mut()?.apply_adjustment(kind, value)
    }

    pub fn apply_preset(&mut self, preset: Preset) -> Result<PixelBuffer, LayerError> {
        self.require(Capability::Filter)?;
        self.as_image_mut()?.apply_preset(preset)
    }

    /// Restore the loaded image; the layer box returns to its size.
    pub fn reset_changes(&mut self) -> Result<(), LayerError> {
        let img = self.as_image_mut()?;
        img.reset_changes();
        let (w, h) = img.source().dimensions();
        self.bounds.width = w;
        self.bounds.height = h;
        Ok(())
    }
}

// ============================================================================
// CANVAS STATE
// ============================================================================

/// The editor canvas: a stack of layers. Index 0 is the bottom; the last
/// layer is drawn on top.
#[derive(Clone, Debug)]
pub struct CanvasState {
    pub layers: Vec<Layer>,
    pub active_layer_index: usize,
    pub width: u32,
    pub height: u32,
}

impl CanvasState {
    pub fn new(width: u32, height: u32) -> Self {
        Self { layers: Vec::new(), active_layer_index: 0, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, index: usize) -> Result<&Layer, LayerError> {
        let len = self.layers.len();
        self.layers.get(index).ok_or(LayerError::IndexOutOfRange { index, len })
    }

    pub fn layer_mut(&mut self, index: usize) -> Result<&mut Layer, LayerError> {
        let len = self.layers.len();
        self.layers.get_mut(index).ok_or(LayerError::IndexOutOfRange { index, len })
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.get(self.active_layer_index)
    }

    pub fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        self.layers.get_mut(self.active_layer_index)
    }

    /// Composite visible image layers bottom to top (source-over) at their
    /// positions. Layers resized away from their pixel size are resampled to
    /// the box first. Text layers have no raster and are skipped.
    pub fn flatten(&self) -> Result<PixelBuffer, LayerError> {
        let mut out = RgbaImage::new(self.width, self.height);
        for layer in self.layers.iter().filter(|l| l.visible) {
            let LayerContent::Image(img) = &layer.content else { continue };
            let rendered = img.rendered()?.into_rgba_image();
            let b = layer.bounds;
            let top = if rendered.dimensions() == (b.width, b.height) {
                rendered
            } else {
                imageops::resize(&rendered, b.width, b.height, FilterType::Triangle)
            };
            imageops::overlay(&mut out, &top, b.x as i64, b.y as i64);
        }
        Ok(PixelBuffer::from_rgba_image(out)?)
    }
}
