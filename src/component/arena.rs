//! Arena storage for live components.
//!
//! Components reference each other by [`ComponentId`] instead of owning
//! each other: a parent's attachable list is a list of handles into this
//! arena. That keeps the component tree cycle-free and lets lifecycle
//! passes recurse by temporarily extracting one component while the rest
//! of the arena stays borrowable.
//!
//! Same sparse-set shape as the scene arena: generational handles, dense
//! storage, swap-remove.

use crate::component::Component;

/// Unique, generation-checked handle to a component in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ComponentId {
    index: u32,
    generation: u32,
}

impl ComponentId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

struct Slot {
    /// `None` only while the component is extracted for a lifecycle pass.
    component: Option<Component>,
    sparse_index: u32,
}

/// Owns every live component.
#[derive(Default)]
pub struct ComponentArena {
    dense: Vec<Slot>,
    sparse: Vec<Option<SparseEntry>>,
    /// Reclaimed sparse slots paired with the generation their next
    /// occupant must carry.
    free_slots: Vec<(u32, u32)>,
}

impl ComponentArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component: Component) -> ComponentId {
        let (sparse_index, generation) = if let Some(slot) = self.free_slots.pop() {
            slot
        } else {
            let idx = self.sparse.len() as u32;
            self.sparse.push(None);
            (idx, 0)
        };

        let dense_index = self.dense.len();
        self.dense.push(Slot {
            component: Some(component),
            sparse_index,
        });
        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });
        ComponentId::new(sparse_index, generation)
    }

    fn get_dense_index(&self, id: ComponentId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation)
            .map(|e| e.dense_index)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.get_dense_index(id).is_some()
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.get_dense_index(id)
            .and_then(|idx| self.dense[idx].component.as_ref())
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.get_dense_index(id)
            .and_then(move |idx| self.dense[idx].component.as_mut())
    }

    /// Run `f` with the component extracted from the arena.
    ///
    /// The closure also receives the arena so it can recurse into other
    /// components; the extracted slot reads as absent until `f` returns.
    /// Returns `None` for stale handles or re-entrant extraction.
    pub fn with_component_mut<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut Component, &mut ComponentArena) -> R,
    ) -> Option<R> {
        let dense_index = self.get_dense_index(id)?;
        let mut component = self.dense[dense_index].component.take()?;

        let result = f(&mut component, self);

        // The slot may have moved (or been removed) during `f`
        if let Some(idx) = self.get_dense_index(id) {
            self.dense[idx].component = Some(component);
        }
        Some(result)
    }

    /// Remove a component, returning it. Stale handles yield `None`.
    pub fn remove(&mut self, id: ComponentId) -> Option<Component> {
        let dense_index = self.get_dense_index(id)?;
        let last_dense_index = self.dense.len() - 1;
        let removed = self.dense.swap_remove(dense_index);

        if dense_index != last_dense_index && !self.dense.is_empty() {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(ref mut entry) = self.sparse[moved_sparse_idx as usize] {
                entry.dense_index = dense_index;
            }
        }

        self.sparse[id.index as usize] = None;
        self.free_slots.push((id.index, id.generation.wrapping_add(1)));
        removed.component
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
}
