//! The borrow bundle threaded through instruction dispatch.
//!
//! Rendering touches almost every subsystem: it allocates scene nodes,
//! creates observers, registers listeners, resolves resources and runs
//! render strategies. [`RenderContext`] carries exactly those borrows so
//! dispatch functions can hand them around (and reborrow for recursion)
//! without the runtime giving up ownership. The component arena travels
//! beside the context rather than inside it, because lifecycle recursion
//! extracts components from the arena while keeping the context intact.

use crate::binding::events::EventManager;
use crate::binding::expression::ExpressionParser;
use crate::binding::observer::ObserverLocator;
use crate::component::ResourceRegistry;
use crate::render::strategy::StrategyCache;
use crate::scene::{NodeRegistry, Scene};

/// Mutable views over the runtime state one render (or lifecycle) pass
/// needs.
pub struct RenderContext<'a> {
    pub scene: &'a mut Scene,
    pub observers: &'a mut ObserverLocator,
    pub events: &'a mut EventManager,
    pub nodes: &'a NodeRegistry,
    pub resources: &'a ResourceRegistry,
    pub parser: &'a dyn ExpressionParser,
    pub strategies: &'a mut StrategyCache,
}
