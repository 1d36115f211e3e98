//! An instruction-driven component runtime over a retained 2D scene graph.
//!
//! Templates compile (out of band) into a [`template::TemplateDefinition`]:
//! a fragment tree plus per-target instruction lists. The renderer
//! instantiates the fragment into scene nodes and replays the instructions
//! against them, producing views, bindings and nested components. The
//! lifecycle passes then drive components through bind → attach →
//! detach → unbind, and a per-frame tick reconciles bindings with both
//! the view-model and the scene.
//!
//! [`app::AppShell`] ties it together: register element resources, call
//! `app()` with a root element, `start()`, then feed `tick()` and
//! `dispatch_event()` from the host loop.

pub mod app;
pub mod binding;
pub mod component;
pub mod error;
pub mod lifecycle;
pub mod render;
pub mod scene;
pub mod task;
pub mod template;

pub mod prelude {
    pub use crate::app::{AppDefinition, AppShell, Registry, Runtime};
    pub use crate::binding::expression::{
        CachingParser, Expression, ExpressionKind, ExpressionParser, SourceExpression,
    };
    pub use crate::binding::flags::{BindingFlags, BindingMode};
    pub use crate::binding::scope::{BindingContext, OverrideContext, Scope};
    pub use crate::binding::{DispatchStrategy, EventManager, ObserverLocator, SceneEvent};
    pub use crate::component::{
        AttributeDefinition, Component, ComponentArena, ComponentId, CustomAttribute,
        CustomElement, ElementDefinition, LifecycleState, ResourceRegistry, ViewModel,
    };
    pub use crate::error::{Result, ScenaError};
    pub use crate::render::{RenderContext, RenderStrategyFn, StrategyInput};
    pub use crate::scene::{
        Color, NodeId, NodeKind, NodeRegistry, PropertyValue, Scene, SceneNode, Surface,
        SurfaceOptions,
    };
    pub use crate::task::{LifecycleTask, TaskController};
    pub use crate::template::{
        Instruction, NodeSequence, TemplateDefinition, TemplateFragment, TemplateParts, View,
        ViewFactory,
    };
}
