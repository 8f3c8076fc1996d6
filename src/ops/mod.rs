pub mod adjustments;
pub mod canvas_ops;
pub mod change_log;
pub mod filter_engine;
pub mod filters;
pub mod transform;
