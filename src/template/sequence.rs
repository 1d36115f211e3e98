//! Node sequences: a cloned fragment paired with its instantiated scene
//! nodes.
//!
//! Instantiation walks the declarative tree once, resolves every element
//! through the node registry (text nodes become literal text), and attaches
//! each new scene node under its already-converted parent, preserving
//! document order. The declarative side stays authoritative for structure;
//! the scene side is what mounts and unmounts.
//!
//! `remove` only detaches from the scene parent; the nodes stay alive for
//! re-mounting (template controllers toggle views this way). Reclaiming the
//! scene slots is the explicit `destroy` step when the owning view dies.

use crate::error::{Result, ScenaError};
use crate::scene::node::{NodeKind, SceneNode};
use crate::scene::{NodeId, NodeRegistry, Scene};
use crate::template::fragment::{FragmentNodeId, TemplateFragment, TemplateNodeKind};

/// A fragment instance with one scene node per declarative node.
#[derive(Debug)]
pub struct NodeSequence {
    fragment: TemplateFragment,
    /// Parallel to the fragment arena: `scene_nodes[i]` instantiates node `i`.
    scene_nodes: Vec<Option<NodeId>>,
    /// Scene nodes of the fragment roots, in document order.
    roots: Vec<NodeId>,
    mounted_parent: Option<NodeId>,
}

impl NodeSequence {
    /// The no-view sequence: same contract, every operation a no-op.
    pub fn empty() -> Self {
        Self {
            fragment: TemplateFragment::new(),
            scene_nodes: Vec::new(),
            roots: Vec::new(),
            mounted_parent: None,
        }
    }

    /// Clone `fragment` and instantiate its scene nodes.
    ///
    /// Fails with an object-model error when a declarative node has
    /// children but its scene node kind is a leaf; nothing stays behind in
    /// the arena on failure.
    pub fn instantiate(
        fragment: &TemplateFragment,
        scene: &mut Scene,
        registry: &NodeRegistry,
    ) -> Result<Self> {
        let fragment = fragment.clone();
        let mut sequence = Self {
            scene_nodes: vec![None; fragment.len()],
            roots: Vec::new(),
            mounted_parent: None,
            fragment,
        };

        if let Err(err) = sequence.build(scene, registry) {
            for root in sequence.roots.drain(..) {
                scene.destroy(root);
            }
            return Err(err);
        }
        Ok(sequence)
    }

    fn build(&mut self, scene: &mut Scene, registry: &NodeRegistry) -> Result<()> {
        // Depth-first so every parent is converted before its children
        let mut stack: Vec<(FragmentNodeId, Option<NodeId>)> = self
            .fragment
            .roots()
            .iter()
            .rev()
            .map(|&id| (id, None))
            .collect();

        while let Some((fragment_id, scene_parent)) = stack.pop() {
            let node = self
                .fragment
                .node(fragment_id)
                .ok_or(ScenaError::StaleHandle("fragment node"))?;

            let scene_id = match &node.kind {
                TemplateNodeKind::Element { tag } => {
                    let scene_node = registry.create(tag)?;
                    scene.register(scene_node)
                }
                TemplateNodeKind::Text { content } => scene.create_text(content.clone()),
            };

            match scene_parent {
                Some(parent) => {
                    // The node is not reachable from any root yet; a failed
                    // attach has to reclaim it here or it leaks.
                    if let Err(err) = scene.append_child(parent, scene_id) {
                        scene.destroy(scene_id);
                        return Err(err);
                    }
                }
                None => self.roots.push(scene_id),
            }
            self.scene_nodes[fragment_id] = Some(scene_id);

            for &child in self.fragment.children(fragment_id).iter().rev() {
                stack.push((child, Some(scene_id)));
            }
        }
        Ok(())
    }

    pub fn fragment(&self) -> &TemplateFragment {
        &self.fragment
    }

    /// Declarative target nodes, recomputed from the live fragment.
    pub fn find_targets(&self) -> Vec<FragmentNodeId> {
        self.fragment.find_targets()
    }

    /// Scene nodes paired with [`NodeSequence::find_targets`], index for
    /// index.
    pub fn find_scene_targets(&self) -> Vec<NodeId> {
        self.find_targets()
            .into_iter()
            .filter_map(|id| self.scene_node_for(id))
            .collect()
    }

    pub fn scene_node_for(&self, id: FragmentNodeId) -> Option<NodeId> {
        self.scene_nodes.get(id).copied().flatten()
    }

    pub fn scene_roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Every scene node currently instantiated by this sequence, in
    /// fragment order.
    pub fn scene_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.scene_nodes.iter().copied().flatten()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted_parent.is_some()
    }

    /// Mount the sequence's roots as the last children of `parent`.
    /// No-op for an empty sequence.
    pub fn append_to(&mut self, scene: &mut Scene, parent: NodeId) -> Result<()> {
        if self.roots.is_empty() {
            return Ok(());
        }
        for &root in &self.roots {
            scene.append_child(parent, root)?;
        }
        self.mounted_parent = Some(parent);
        Ok(())
    }

    /// Mount the sequence's roots immediately before `anchor`, which is how
    /// views land at a render location marker.
    pub fn insert_before(&mut self, scene: &mut Scene, anchor: NodeId) -> Result<()> {
        if self.roots.is_empty() {
            return Ok(());
        }
        let parent = scene
            .parent(anchor)
            .ok_or(ScenaError::StaleHandle("anchor"))?;
        for &root in &self.roots {
            scene.insert_before(parent, root, anchor)?;
        }
        self.mounted_parent = Some(parent);
        Ok(())
    }

    /// Detach the roots from the scene parent, first to last. No-op when
    /// nothing is mounted; the subtree stays alive for re-mounting.
    pub fn remove(&mut self, scene: &mut Scene) {
        if self.mounted_parent.take().is_none() {
            return;
        }
        for &root in &self.roots {
            scene.detach(root);
        }
    }

    /// Replace the scene node of `fragment_id` with a render-location
    /// marker occupying the same sibling index, reclaiming the old subtree.
    pub fn convert_to_render_location(
        &mut self,
        scene: &mut Scene,
        fragment_id: FragmentNodeId,
    ) -> Result<NodeId> {
        let target = self
            .scene_node_for(fragment_id)
            .ok_or(ScenaError::StaleHandle("target"))?;

        let marker = scene.register(SceneNode::new(NodeKind::Marker));
        if let Some(parent) = scene.parent(target) {
            scene.insert_before(parent, marker, target)?;
        }
        scene.destroy(target);

        self.scene_nodes[fragment_id] = Some(marker);
        for root in &mut self.roots {
            if *root == target {
                *root = marker;
            }
        }
        Ok(marker)
    }

    /// Drop the scene node of a non-visual placeholder (let elements),
    /// reclaiming its subtree and clearing the association.
    pub fn remove_scene_node(&mut self, scene: &mut Scene, fragment_id: FragmentNodeId) {
        let Some(node) = self.scene_node_for(fragment_id) else {
            return;
        };
        scene.destroy(node);
        self.scene_nodes[fragment_id] = None;
        self.roots.retain(|&root| root != node);
    }

    /// Reclaim every scene node this sequence instantiated.
    pub fn destroy(mut self, scene: &mut Scene) {
        self.remove(scene);
        for root in self.roots.drain(..) {
            scene.destroy(root);
        }
    }
}
