//! The instruction renderer: replays compiled template definitions against
//! instantiated scene nodes, and the render strategies it can call out to.

pub mod context;
pub mod renderer;
pub mod strategy;

pub use context::RenderContext;
pub use renderer::{create_view, hydrate_element, render};
pub use strategy::{RenderStrategyFn, StrategyCache, StrategyInput};
