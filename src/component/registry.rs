//! The component resource registry.
//!
//! Element, attribute and render-strategy resources are registered once at
//! startup and looked up by name during rendering. Like the node registry,
//! registration is write-once per name; the registry is passed explicitly
//! to whoever needs it rather than living in process globals.

use std::collections::HashMap;
use std::rc::Rc;

use crate::component::ViewModel;
use crate::error::{Result, ScenaError};
use crate::render::strategy::RenderStrategyFn;
use crate::template::instructions::TemplateDefinition;

/// Produces a fresh view-model per component instance.
pub type ViewModelFactory = Box<dyn Fn() -> Box<dyn ViewModel>>;

/// A registered custom element: its compiled template plus behavior.
pub struct ElementDefinition {
    pub name: String,
    pub definition: Rc<TemplateDefinition>,
    pub vm_factory: ViewModelFactory,
}

impl ElementDefinition {
    pub fn new(
        name: impl Into<String>,
        definition: Rc<TemplateDefinition>,
        vm_factory: ViewModelFactory,
    ) -> Self {
        Self {
            name: name.into(),
            definition,
            vm_factory,
        }
    }
}

/// A registered custom attribute.
pub struct AttributeDefinition {
    pub name: String,
    pub vm_factory: ViewModelFactory,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, vm_factory: ViewModelFactory) -> Self {
        Self {
            name: name.into(),
            vm_factory,
        }
    }
}

/// Name-keyed component resources, write-once per name.
#[derive(Default)]
pub struct ResourceRegistry {
    elements: HashMap<String, ElementDefinition>,
    attributes: HashMap<String, AttributeDefinition>,
    strategies: HashMap<String, RenderStrategyFn>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_element(&mut self, definition: ElementDefinition) -> Result<()> {
        if self.elements.contains_key(&definition.name) {
            return Err(ScenaError::DuplicateRegistration(definition.name));
        }
        log::trace!("registering element resource {:?}", definition.name);
        self.elements.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn register_attribute(&mut self, definition: AttributeDefinition) -> Result<()> {
        if self.attributes.contains_key(&definition.name) {
            return Err(ScenaError::DuplicateRegistration(definition.name));
        }
        log::trace!("registering attribute resource {:?}", definition.name);
        self.attributes.insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn register_strategy(
        &mut self,
        name: impl Into<String>,
        strategy: RenderStrategyFn,
    ) -> Result<()> {
        let name = name.into();
        if self.strategies.contains_key(&name) {
            return Err(ScenaError::DuplicateRegistration(name));
        }
        log::trace!("registering render strategy {:?}", name);
        self.strategies.insert(name, strategy);
        Ok(())
    }

    pub fn element(&self, name: &str) -> Option<&ElementDefinition> {
        self.elements.get(name)
    }

    pub fn require_element(&self, name: &str) -> Result<&ElementDefinition> {
        self.element(name)
            .ok_or_else(|| ScenaError::UnknownResource(name.to_string()))
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.get(name)
    }

    pub fn require_attribute(&self, name: &str) -> Result<&AttributeDefinition> {
        self.attribute(name)
            .ok_or_else(|| ScenaError::UnknownResource(name.to_string()))
    }

    pub fn strategy(&self, name: &str) -> Option<RenderStrategyFn> {
        self.strategies.get(name).map(Rc::clone)
    }
}
