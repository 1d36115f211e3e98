//! Views and view factories.
//!
//! A [`View`] is one instantiated template: the node sequence plus the
//! renderable state (bindables, attachables) the renderer accumulated for
//! it, and the override layer its let declarations write into. A
//! [`ViewFactory`] stamps out views from a shared definition; template
//! controllers hold one and create/discard views as their condition flips.

use std::rc::Rc;

use crate::binding::binding::Bindable;
use crate::binding::scope::OverrideContext;
use crate::component::arena::{ComponentArena, ComponentId};
use crate::error::Result;
use crate::render::context::RenderContext;
use crate::template::instructions::{TemplateDefinition, TemplateParts};
use crate::template::sequence::NodeSequence;

/// Ordered bind/unbind and attach/detach participants of one view.
#[derive(Default)]
pub struct Renderable {
    pub bindables: Vec<Bindable>,
    pub attachables: Vec<ComponentId>,
}

impl Renderable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bindable(&mut self, bindable: Bindable) {
        self.bindables.push(bindable);
    }

    pub fn add_attachable(&mut self, id: ComponentId) {
        self.attachables.push(id);
    }

    /// Most recently added attachable, for controller linking.
    pub fn last_attachable(&self) -> Option<ComponentId> {
        self.attachables.last().copied()
    }
}

/// One rendered template instance.
pub struct View {
    pub sequence: NodeSequence,
    pub renderable: Renderable,
    pub overrides: OverrideContext,
    pub bound: bool,
}

impl View {
    pub fn new(sequence: NodeSequence) -> Self {
        Self {
            sequence,
            renderable: Renderable::new(),
            overrides: OverrideContext::new(),
            bound: false,
        }
    }

    /// A view with nothing to render.
    pub fn empty() -> Self {
        Self::new(NodeSequence::empty())
    }
}

/// Stamps out views from one compiled definition.
pub struct ViewFactory {
    definition: Rc<TemplateDefinition>,
    parts: TemplateParts,
}

impl ViewFactory {
    pub fn new(definition: Rc<TemplateDefinition>) -> Self {
        Self {
            definition,
            parts: TemplateParts::new(),
        }
    }

    pub fn with_parts(mut self, parts: TemplateParts) -> Self {
        self.parts = parts;
        self
    }

    pub fn definition(&self) -> &Rc<TemplateDefinition> {
        &self.definition
    }

    pub fn parts(&self) -> &TemplateParts {
        &self.parts
    }

    /// Instantiate and render a fresh view. The view comes back unbound
    /// and unmounted; the caller binds it and inserts it at its location.
    pub fn create(
        &self,
        ctx: &mut RenderContext<'_>,
        arena: &mut ComponentArena,
    ) -> Result<View> {
        crate::render::create_view(ctx, arena, &self.definition, None, Some(&self.parts))
    }
}
