//! External render strategies.
//!
//! A render strategy is host-supplied code invoked for one target during
//! rendering, for drawing the compiler cannot express as instructions
//! (procedural graphics, batched geometry). Strategies are registered by
//! name in the resource registry and resolved through a per-renderer cache.

use std::collections::HashMap;
use std::rc::Rc;

use crate::component::ResourceRegistry;
use crate::error::{Result, ScenaError};
use crate::scene::{NodeId, Scene};
use crate::template::instructions::Instruction;
use crate::template::view::View;

/// What a strategy gets to work with: the scene, the view being rendered,
/// its target node, and the instruction that named it.
pub struct StrategyInput<'a> {
    pub scene: &'a mut Scene,
    pub view: &'a mut View,
    pub target: NodeId,
    pub instruction: &'a Instruction,
}

/// A named external drawing routine.
pub type RenderStrategyFn = Rc<dyn Fn(&mut StrategyInput<'_>) -> Result<()>>;

/// Per-renderer strategy cache, lazily filled from the resource registry.
///
/// Resolution is idempotent: recomputing after a miss lands on the same
/// registered strategy.
#[derive(Default)]
pub struct StrategyCache {
    cache: HashMap<String, RenderStrategyFn>,
}

impl StrategyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &mut self,
        resources: &ResourceRegistry,
        name: &str,
    ) -> Result<RenderStrategyFn> {
        if let Some(strategy) = self.cache.get(name) {
            return Ok(Rc::clone(strategy));
        }
        let strategy = resources
            .strategy(name)
            .ok_or_else(|| ScenaError::UnknownStrategy(name.to_string()))?;
        self.cache.insert(name.to_string(), Rc::clone(&strategy));
        Ok(strategy)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
