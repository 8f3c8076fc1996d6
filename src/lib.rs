//! Non-destructive photo adjustments over layered images.
//!
//! Every image layer keeps its loaded pixels untouched and records the last
//! value applied per adjustment in a [`ChangeLog`]; the visible result is
//! recomputed by replaying that log over the source in a fixed order.

pub mod buffer;
pub mod canvas;
pub mod cli;
pub mod io;
pub mod logger;
pub mod ops;
pub mod project;

pub use buffer::{BufferError, PixelBuffer};
pub use canvas::{CanvasState, Capability, Layer, LayerContent, LayerError};
pub use io::{IoError, SaveFormat};
pub use ops::adjustments::{AdjustmentKind, FilterError};
pub use ops::change_log::{Change, ChangeKey, ChangeLog};
pub use ops::filter_engine::{EditState, FilterEngine};
pub use ops::filters::Preset;
pub use project::Project;
