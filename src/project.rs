use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::buffer::PixelBuffer;
use crate::canvas::{CanvasState, Layer, LayerError};
use crate::io::{self, IoError, SaveFormat};
use crate::ops::adjustments::AdjustmentKind;
use crate::ops::canvas_ops;
use crate::ops::filters::Preset;

/// Single open document.
#[derive(Clone, Debug)]
pub struct Project {
    pub id: Uuid,
    pub canvas_state: CanvasState,
    /// `None` for unsaved/untitled documents.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            canvas_state: CanvasState::new(width, height),
            path: None,
            is_dirty: false,
            name: format!("Untitled-{}", untitled_counter),
        }
    }

    pub fn from_file(path: PathBuf, canvas_state: CanvasState) -> Self {
        let name = name_from_path(&path);
        Self {
            id: Uuid::new_v4(),
            canvas_state,
            path: Some(path),
            is_dirty: false,
            name,
        }
    }

    /// Load an image file as a one-layer document. The layer takes the
    /// file's name.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let buffer = io::load_image(path)?;
        let mut state = CanvasState::new(buffer.width(), buffer.height());
        canvas_ops::add_image_layer(&mut state, &name_from_path(path), buffer);
        log::info!("opened {} ({}x{})", path.display(), state.width, state.height);
        Ok(Self::from_file(path.to_path_buf(), state))
    }

    /// Flatten and write the canvas.
    pub fn export(&self, path: &Path, format: SaveFormat, quality: u8) -> Result<(), ExportError> {
        let flat = self.canvas_state.flatten()?;
        io::encode_and_write(&flat, path, format, quality)?;
        Ok(())
    }

    /// Run `edit` on layer `index`; a successful edit marks the document dirty.
    pub fn edit_layer<T>(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut Layer) -> Result<T, LayerError>,
    ) -> Result<T, LayerError> {
        let out = edit(self.canvas_state.layer_mut(index)?)?;
        self.mark_dirty();
        Ok(out)
    }

    pub fn apply_adjustment(
        &mut self,
        index: usize,
        kind: AdjustmentKind,
        value: f64,
    ) -> Result<PixelBuffer, LayerError> {
        self.edit_layer(index, |layer| layer.apply_adjustment(kind, value))
    }

    pub fn apply_preset(&mut self, index: usize, preset: Preset) -> Result<PixelBuffer, LayerError> {
        self.edit_layer(index, |layer| layer.apply_preset(preset))
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
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
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error(transparent)]
    Io(#[from] IoError),
}

fn name_from_path(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
