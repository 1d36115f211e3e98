//! Evaluation scopes.
//!
//! Expressions evaluate against a [`Scope`]: the component's view-model plus
//! an override layer for names introduced by the template itself (let
//! declarations, `$event` inside listener calls). Overrides shadow the
//! view-model on lookup.

use std::collections::HashMap;

use crate::binding::flags::BindingFlags;
use crate::error::Result;
use crate::scene::PropertyValue;

/// State a template can bind against.
///
/// View-models expose their bindable state by name. `get` on an absent name
/// yields [`PropertyValue::Null`] so templates can bind properties the model
/// has not populated yet; `invoke` on an absent method is an error because a
/// listener naming a missing handler is a broken template.
pub trait BindingContext {
    fn get(&self, name: &str) -> PropertyValue;

    fn set(&mut self, name: &str, value: PropertyValue, flags: BindingFlags);

    fn invoke(
        &mut self,
        method: &str,
        args: &[PropertyValue],
        flags: BindingFlags,
    ) -> Result<PropertyValue>;
}

/// Names layered over the view-model for one view: let declarations and the
/// implicit `$event` during listener dispatch.
#[derive(Debug, Clone, Default)]
pub struct OverrideContext {
    values: HashMap<String, PropertyValue>,
}

impl OverrideContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// A view-model plus its override layer, borrowed for one evaluation.
pub struct Scope<'a> {
    pub vm: &'a mut dyn BindingContext,
    pub overrides: &'a mut OverrideContext,
}

impl<'a> Scope<'a> {
    pub fn new(vm: &'a mut dyn BindingContext, overrides: &'a mut OverrideContext) -> Self {
        Self { vm, overrides }
    }

    /// Resolve a name, overrides first.
    pub fn read(&self, name: &str) -> PropertyValue {
        match self.overrides.get(name) {
            Some(value) => value.clone(),
            None => self.vm.get(name),
        }
    }

    /// Write a name back. Names shadowed by an override stay in the
    /// override layer; everything else goes to the view-model.
    pub fn write(&mut self, name: &str, value: PropertyValue, flags: BindingFlags) {
        if self.overrides.contains(name) {
            self.overrides.set(name, value);
        } else {
            self.vm.set(name, value, flags);
        }
    }
}
