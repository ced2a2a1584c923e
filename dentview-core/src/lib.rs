/// dentview core library - shared viewer logic for dental model presentation
///
/// Decodes STL meshes, traces silhouettes from alpha rasters, drives an
/// orbit camera from pointer input and derives per-part poses from the
/// camera's rotation. Rendering is left to the host crates.

pub mod animation;
pub mod contour;
pub mod controls;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod options;
pub mod projection;
pub mod scene;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use animation::{Animator, PartConfig, PartSample, Pose};
pub use controls::{OrbitController, PointerButton};
pub use error::{ConfigError, DecodeError, LoadError, RasterError};
pub use geometry::{Aabb, BoundingSphere, Triangle, TriangleMesh};
pub use loader::MeshLoader;
pub use options::{ControlOptions, ViewerConfig};
pub use projection::{Camera, ProjectionMode};
pub use scene::Scene;
pub use transform::{PartState, Transform};
