//! Presentation surfaces.
//!
//! A [`Surface`] owns the stage: the root `Container` node everything an
//! application shell composes gets attached under. Actual pixel output is
//! the host renderer's concern; the surface only carries the creation
//! options and the stage handle.

use crate::scene::graph::{NodeId, Scene};
use crate::scene::node::{Color, NodeKind};

/// Creation options for a [`Surface`].
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub width: u32,
    pub height: u32,
    pub antialias: bool,
    pub resolution: f64,
    pub background: Color,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            antialias: true,
            resolution: 1.0,
            background: Color::BLACK,
        }
    }
}

/// A render target with a stage node rooted in a [`Scene`].
pub struct Surface {
    stage: NodeId,
    options: SurfaceOptions,
}

impl Surface {
    pub fn new(scene: &mut Scene, options: SurfaceOptions) -> Self {
        let stage = scene.create(NodeKind::Container);
        log::debug!(
            "surface created: {}x{} (resolution {})",
            options.width,
            options.height,
            options.resolution
        );
        Self { stage, options }
    }

    /// The root container content gets attached under.
    pub fn stage(&self) -> NodeId {
        self.stage
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    pub fn width(&self) -> u32 {
        self.options.width
    }

    pub fn height(&self) -> u32 {
        self.options.height
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.options.width = width;
        self.options.height = height;
    }

    /// Tear down the stage subtree. The surface is unusable afterwards.
    pub fn destroy(self, scene: &mut Scene) {
        scene.destroy(self.stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SurfaceOptions::default();
        assert_eq!(options.width, 512);
        assert_eq!(options.height, 512);
        assert!(options.antialias);
        assert_eq!(options.resolution, 1.0);
    }

    #[test]
    fn test_stage_is_container() {
        let mut scene = Scene::new();
        let surface = Surface::new(&mut scene, SurfaceOptions::default());
        let stage = surface.stage();
        assert_eq!(scene.node(stage).map(|n| n.kind()), Some(NodeKind::Container));
    }

    #[test]
    fn test_destroy_reclaims_stage() {
        let mut scene = Scene::new();
        let surface = Surface::new(&mut scene, SurfaceOptions::default());
        let stage = surface.stage();

        surface.destroy(&mut scene);
        assert!(!scene.contains(stage));
    }
}
