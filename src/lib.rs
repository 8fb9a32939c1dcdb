//! Raster flood fill with bounded undo/redo.
//!
//! The [`Engine`] owns a pixel buffer mirroring a host [`Surface`], fills
//! regions of it in one of four [`FillMode`]s and keeps up to
//! [`history::MAX_STATES`] full snapshots per direction for undo and redo.
//! [`EngineHandle`] runs an engine on its own thread so a UI can fire fills
//! without blocking and pick up the results as [`Event`]s.

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod fill;
pub mod history;
pub mod surface;
pub mod types;
pub mod worker;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use history::History;
pub use surface::{SoftwareSurface, Surface};
pub use types::{FillMode, FillReport, FillRequest, Outcome, PixelBuffer, Snapshot, argb};
pub use worker::{EngineHandle, Event};
