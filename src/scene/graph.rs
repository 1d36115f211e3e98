//! Arena-based scene node storage.
//!
//! The scene stores every retained node in a sparse-set arena with
//! generational indices:
//!
//! - **Generational indices**: [`NodeId`] carries index + generation so a
//!   stale handle to a reclaimed slot is detected instead of silently
//!   resolving to an unrelated node.
//!
//! - **Dense storage**: nodes live contiguously so a surface can iterate
//!   the whole graph cheaply when presenting a frame.
//!
//! - **Sparse map**: O(1) lookup from a stable [`NodeId`] to the dense slot.
//!
//! - **Swap-remove**: O(1) removal without holes in dense storage.
//!
//! Parent/child links live beside the nodes. Only `Container` and `Sprite`
//! nodes accept children; attaching under any other kind is an object-model
//! error. Detaching a node keeps it (and its subtree) alive in the arena so
//! a dynamic view can re-attach it later; reclaiming the slots is a separate
//! explicit step.

use crate::error::{Result, ScenaError};
use crate::scene::node::{NodeKind, SceneNode};

/// Unique identifier for a node in the scene.
///
/// Uses a generational index design:
/// - `index`: position in the sparse array (reusable after removal)
/// - `generation`: version counter that increments when a slot is reused
///
/// This prevents ABA problems where a stale ID might accidentally refer
/// to a new node allocated in the same slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Entry in the sparse map, pointing to a dense array slot.
struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

/// A slot in the dense array: the node plus its graph links.
struct Entry {
    node: SceneNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Back-pointer to sparse array index (for swap-remove fixup)
    sparse_index: u32,
}

/// The retained scene graph.
///
/// All nodes live here; handles are validated on every access so stale
/// [`NodeId`]s read as absent rather than aliasing reused slots.
pub struct Scene {
    dense: Vec<Entry>,
    sparse: Vec<Option<SparseEntry>>,
    /// Reclaimed sparse slots paired with the generation their next
    /// occupant must carry.
    free_slots: Vec<(u32, u32)>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    /// Store a node and return its unique ID.
    ///
    /// The node enters the scene detached; parent links are made with
    /// [`Scene::append_child`] or [`Scene::insert_before`].
    pub fn register(&mut self, node: SceneNode) -> NodeId {
        let (sparse_index, generation) = if let Some(slot) = self.free_slots.pop() {
            // Reuse a freed slot with its pre-bumped generation
            slot
        } else {
            let idx = self.sparse.len() as u32;
            self.sparse.push(None);
            (idx, 0)
        };

        let dense_index = self.dense.len();
        let id = NodeId::new(sparse_index, generation);

        self.dense.push(Entry {
            node,
            parent: None,
            children: Vec::new(),
            sparse_index,
        });

        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });

        id
    }

    fn get_dense_index(&self, id: NodeId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation)
            .map(|e| e.dense_index)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get_dense_index(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.get_dense_index(id).map(|idx| &self.dense[idx].node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.get_dense_index(id)
            .map(move |idx| &mut self.dense[idx].node)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_dense_index(id).and_then(|idx| self.dense[idx].parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get_dense_index(id)
            .map(|idx| self.dense[idx].children.clone())
            .unwrap_or_default()
    }

    /// Position of a node within its parent's child list.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        let parent_idx = self.get_dense_index(parent)?;
        self.dense[parent_idx].children.iter().position(|&c| c == id)
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// The child is detached from any previous parent first. Fails if the
    /// parent's kind is a leaf or either handle is stale.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.link_child(parent, child, None)
    }

    /// Attach `child` under `parent` immediately before `anchor`.
    ///
    /// `anchor` must currently be a child of `parent`; this is how views are
    /// mounted at a render location so the marker keeps its sibling slot.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, anchor: NodeId) -> Result<()> {
        self.link_child(parent, child, Some(anchor))
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId, anchor: Option<NodeId>) -> Result<()> {
        let parent_idx = self
            .get_dense_index(parent)
            .ok_or(ScenaError::StaleHandle("node"))?;
        if self.get_dense_index(child).is_none() {
            return Err(ScenaError::StaleHandle("node"));
        }

        let kind = self.dense[parent_idx].node.kind();
        if !kind.supports_children() {
            return Err(ScenaError::InvalidObjectModel {
                tag: kind.name().to_string(),
            });
        }

        self.detach(child);

        // detach() never moves dense slots, the parent index is still valid
        let children = &mut self.dense[parent_idx].children;
        match anchor {
            Some(anchor) => {
                let at = children
                    .iter()
                    .position(|&c| c == anchor)
                    .ok_or(ScenaError::StaleHandle("anchor"))?;
                children.insert(at, child);
            }
            None => children.push(child),
        }

        let child_idx = self
            .get_dense_index(child)
            .ok_or(ScenaError::StaleHandle("node"))?;
        self.dense[child_idx].parent = Some(parent);
        Ok(())
    }

    /// Unlink a node from its parent, keeping it and its subtree alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(dense_index) = self.get_dense_index(id) else {
            return;
        };
        if let Some(parent_id) = self.dense[dense_index].parent {
            if let Some(parent_dense) = self.get_dense_index(parent_id) {
                self.dense[parent_dense].children.retain(|&c| c != id);
            }
        }
        self.dense[dense_index].parent = None;
    }

    /// Remove a node and its entire subtree from the arena.
    ///
    /// Stale handles are ignored. Handles into the destroyed subtree become
    /// stale; their slots go back on the free list.
    pub fn destroy(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);

        // Collect the subtree first; freeing moves dense slots around.
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            if let Some(idx) = self.get_dense_index(current) {
                stack.extend(self.dense[idx].children.iter().copied());
            }
        }
        for node_id in order {
            self.free_slot(node_id);
        }
    }

    /// Release one slot, using swap-remove to keep dense storage packed.
    fn free_slot(&mut self, id: NodeId) {
        let Some(dense_index) = self.get_dense_index(id) else {
            return;
        };

        let last_dense_index = self.dense.len() - 1;
        let removed = self.dense.swap_remove(dense_index);

        // Fix up the moved entry's sparse slot (if we didn't remove the last)
        if dense_index != last_dense_index && !self.dense.is_empty() {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(ref mut entry) = self.sparse[moved_sparse_idx as usize] {
                entry.dense_index = dense_index;
            }
        }

        self.sparse[id.index as usize] = None;
        self.free_slots.push((id.index, id.generation.wrapping_add(1)));
        drop(removed);
    }

    /// Convenience for literal text content: registers a detached text node.
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.register(SceneNode::text(content))
    }

    /// Convenience used by roots and tests: registers a detached node of the
    /// given kind with default properties.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.register(SceneNode::new(kind))
    }

    pub fn node_count(&self) -> usize {
        self.dense.len()
    }

    pub fn clear(&mut self) {
        self.dense.clear();
        self.sparse.clear();
        self.free_slots.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
