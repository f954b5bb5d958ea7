mod camera;
pub mod config;
pub mod controls;
mod error;
pub mod explode;
pub mod selection;
mod viewer;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
pub mod web;

// `pub use ... as scene` makes crate::scene::* resolve to partview_scene::*
pub use partview_scene as scene;
pub use partview_scene::common;
pub use partview_scene::geom_query;

pub use camera::Camera;
pub use config::ViewerConfig;
pub use controls::OrbitControls;
pub use error::{Result, ViewerError};
pub use explode::{DirectionFallback, ExplodeEntry, ExplodeLayout, ExplodePlan};
pub use partview_scene::{ImportError, ImporterRegistry, ModelFormat, ModelImporter, NodeId, Scene};
pub use selection::{SelectionChange, SelectionConfig, SelectionEntry, SelectionManager};
pub use viewer::{Viewer, ViewerState, ViewerStatus};
pub use viewport::ViewportController;
