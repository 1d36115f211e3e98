//! The retained scene graph: node data, arena storage, the tag registry and
//! presentation surfaces.

pub mod graph;
pub mod node;
pub mod registry;
pub mod surface;

pub use graph::{NodeId, Scene};
pub use node::{Color, NodeKind, PropertyValue, SceneNode, TextStyle};
pub use registry::{NodeFactory, NodeRegistry};
pub use surface::{Surface, SurfaceOptions};
