// ============================================================================
// CANVAS-LEVEL OPERATIONS: add / delete / duplicate / reorder layers
// ============================================================================

use uuid::Uuid;

use crate::buffer::PixelBuffer;
use crate::canvas::{CanvasState, Layer, LayerError, TextStyle};

/// Push an image layer on top of the stack and make it active.
/// An empty canvas adopts the image's size.
pub fn add_image_layer(state: &mut CanvasState, name: &str, source: PixelBuffer) -> usize {
    if state.is_empty() {
        state.width = source.width();
        state.height = source.height();
    }
    state.layers.push(Layer::image(name, source));
    state.active_layer_index = state.layers.len() - 1;
    log::debug!("added image layer '{}' at {}", name, state.active_layer_index);
    state.active_layer_index
}

/// Push a text layer on top of the stack and make it active.
pub fn add_text_layer(state: &mut CanvasState, style: TextStyle) -> usize {
    let name = format!("Text {}", state.layers.len() + 1);
    log::debug!("added text layer '{}' at {}", name, state.layers.len());
    state.layers.push(Layer::text(name, style));
    state.active_layer_index = state.layers.len() - 1;
    state.active_layer_index
}

/// Remove a layer. The active index stays on a valid layer when one exists.
pub fn delete_layer(state: &mut CanvasState, index: usize) -> Result<Layer, LayerError> {
    state.layer(index)?;
    let removed = state.layers.remove(index);
    if state.active_layer_index >= state.layers.len() {
        state.active_layer_index = state.layers.len().saturating_sub(1);
    } else if state.active_layer_index > index {
        state.active_layer_index -= 1;
    }
    log::debug!("deleted layer '{}'", removed.name);
    Ok(removed)
}

/// Copy a layer (pixels, edit history, bounds) directly above the original.
pub fn duplicate_layer(state: &mut CanvasState, index: usize) -> Result<usize, LayerError> {
    let mut dup = state.layer(index)?.clone();
    dup.id = Uuid::new_v4();
    dup.name = format!("{} Copy", dup.name);
    let new_index = index + 1;
    log::debug!("duplicated layer {} as '{}'", index, dup.name);
    state.layers.insert(new_index, dup);
    state.active_layer_index = new_index;
    Ok(new_index)
}

/// Swap with the layer above. No-op for the top layer.
pub fn move_layer_up(state: &mut CanvasState, index: usize) -> Result<usize, LayerError> {
    state.layer(index)?;
    if index + 1 >= state.layers.len() {
        return Ok(index);
    }
    state.layers.swap(index, index + 1);
    state.active_layer_index = index + 1;
    log::debug!("moved layer '{}' up to {}", state.layers[index + 1].name, index + 1);
    Ok(index + 1)
}

/// Swap with the layer below. No-op for the bottom layer.
pub fn move_layer_down(state: &mut CanvasState, index: usize) -> Result<usize, LayerError> {
    state.layer(index)?;
    if index == 0 {
        return Ok(index);
    }
    state.layers.swap(index, index - 1);
    state.active_layer_index = index - 1;
    log::debug!("moved layer '{}' down to {}", state.layers[index - 1].name, index - 1);
    Ok(index - 1)
}

pub fn set_active(state: &mut CanvasState, index: usize) -> Result<(), LayerError> {
    state.layer(index)?;
    state.active_layer_index = index;
    log::debug!("active layer '{}' ({})", state.layers[index].name, index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::ops::adjustments::AdjustmentKind;

    /// Collects debug records from this module so tests can see what was logged.
    struct Capture(Mutex<Vec<String>>);

    impl log::Log for Capture {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.target() == module_path!().trim_end_matches("::tests")
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata())
                && let Ok(mut lines) = self.0.lock()
            {
                lines.push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

    fn captured() -> Vec<String> {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Debug);
        CAPTURE.0.lock().unwrap().clone()
    }

    fn canvas_with(names: &[&str]) -> CanvasState {
        let mut state = CanvasState::new(1, 1);
        for name in names {
            add_image_layer(&mut state, name, PixelBuffer::filled(1, 1, [1, 2, 3, 255]).unwrap());
        }
        state
    }

    fn names(state: &CanvasState) -> Vec<&str> {
        state.layers.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn first_image_sizes_the_canvas() {
        let mut state = CanvasState::new(0, 0);
        add_image_layer(&mut state, "bg", PixelBuffer::filled(7, 4, [0, 0, 0, 255]).unwrap());
        assert_eq!((state.width, state.height), (7, 4));
        add_image_layer(&mut state, "small", PixelBuffer::filled(2, 2, [0, 0, 0, 255]).unwrap());
        assert_eq!((state.width, state.height), (7, 4));
        assert_eq!(state.active_layer_index, 1);
    }

    #[test]
    fn move_up_and_down_swap_neighbours() {
        let mut state = canvas_with(&["a", "b", "c"]);
        assert_eq!(move_layer_up(&mut state, 0).unwrap(), 1);
        assert_eq!(names(&state), ["b", "a", "c"]);
        assert_eq!(move_layer_down(&mut state, 2).unwrap(), 1);
        assert_eq!(names(&state), ["b", "c", "a"]);
    }

    #[test]
    fn moves_at_the_ends_are_noops() {
        let mut state = canvas_with(&["a", "b"]);
        assert_eq!(move_layer_up(&mut state, 1).unwrap(), 1);
        assert_eq!(move_layer_down(&mut state, 0).unwrap(), 0);
        assert_eq!(names(&state), ["a", "b"]);
        assert!(move_layer_up(&mut state, 5).is_err());
    }

    #[test]
    fn delete_keeps_active_index_valid() {
        let mut state = canvas_with(&["a", "b", "c"]);
        assert_eq!(state.active_layer_index, 2);
        delete_layer(&mut state, 2).unwrap();
        assert_eq!(state.active_layer_index, 1);
        set_active(&mut state, 1).unwrap();
        delete_layer(&mut state, 0).unwrap();
        assert_eq!(state.active_layer_index, 0);
        assert_eq!(names(&state), ["b"]);
        delete_layer(&mut state, 0).unwrap();
        assert!(state.is_empty());
        assert!(delete_layer(&mut state, 0).is_err());
    }

    #[test]
    fn duplicate_copies_history_with_a_new_id() {
        let mut state = canvas_with(&["photo"]);
        state.layers[0].apply_adjustment(AdjustmentKind::Contrast, 3.0).unwrap();
        let idx = duplicate_layer(&mut state, 0).unwrap();
        let (orig, dup) = (&state.layers[0], &state.layers[idx]);
        assert_ne!(orig.id, dup.id);
        assert_eq!(dup.name, "photo Copy");
        assert_eq!(
            dup.as_image().unwrap().change_log(),
            orig.as_image().unwrap().change_log()
        );
    }

    #[test]
    fn text_layers_are_numbered() {
        let mut state = canvas_with(&["photo"]);
        let idx = add_text_layer(&mut state, TextStyle::default());
        assert_eq!(state.layers[idx].name, "Text 2");
        assert_eq!(state.layers[idx].kind_name(), "text");
    }

    #[test]
    fn layer_ops_log_at_debug() {
        captured();
        let mut state = canvas_with(&["logged-a", "logged-b"]);
        add_text_layer(&mut state, TextStyle::default());
        duplicate_layer(&mut state, 0).unwrap();
        move_layer_up(&mut state, 2).unwrap();
        move_layer_down(&mut state, 1).unwrap();
        set_active(&mut state, 0).unwrap();

        let lines = captured();
        let has = |needle: &str| lines.iter().any(|l| l.contains(needle));
        assert!(has("added image layer 'logged-a'"));
        assert!(has("added text layer"));
        assert!(has("as 'logged-a Copy'"));
        assert!(has("moved layer 'logged-b' up to 3"));
        assert!(has("moved layer 'logged-a Copy' down to 0"));
        assert!(has("active layer 'logged-a Copy' (0)"));
    }
}
