pub mod mapper;
pub mod mesh;
pub mod overlay;

pub use mapper::CoordinateMapper;
pub use mesh::{BoundingSphere, GlobeMesh};
pub use overlay::{format_overlay, ConsoleOverlay, OverlaySink, RecordingOverlay};
