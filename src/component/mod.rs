//! Components: view-model contract, lifecycle state, and the two concrete
//! component shapes the renderer hydrates.
//!
//! A **custom element** owns a template-produced [`View`] and renders into
//! a host scene node. A **custom attribute** decorates an existing node
//! without producing nodes of its own; when hydrated with a view factory
//! and a render location it acts as a *template controller*, toggling a
//! dynamic view in and out of the scene.
//!
//! Components never own each other. Children are [`ComponentId`] handles
//! into the [`ComponentArena`]; the lifecycle passes in [`crate::lifecycle`]
//! recurse through the arena.

pub mod arena;
pub mod registry;

pub use arena::{ComponentArena, ComponentId};
pub use registry::{AttributeDefinition, ElementDefinition, ResourceRegistry};

use crate::binding::flags::BindingFlags;
use crate::binding::scope::BindingContext;
use crate::scene::NodeId;
use crate::task::LifecycleTask;
use crate::template::view::{View, ViewFactory};

/// Linear lifecycle progression of one component.
///
/// Hydrate moves `New → Hydrated`, bind to `Bound`, attach to `Attached`;
/// teardown runs detach (`Detached`) strictly before unbind (`Unbound`).
/// An unbound component may be bound again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    New,
    Hydrated,
    Bound,
    Attached,
    Detached,
    Unbound,
}

impl LifecycleState {
    pub fn is_bound(self) -> bool {
        matches!(
            self,
            LifecycleState::Bound | LifecycleState::Attached | LifecycleState::Detached
        )
    }

    pub fn is_attached(self) -> bool {
        self == LifecycleState::Attached
    }
}

/// User-defined component behavior.
///
/// Every hook has a no-op default; implement the ones the component cares
/// about. `detaching` may return a pending task to delay teardown
/// completion (the scene nodes are removed regardless; the task gates the
/// `unbind` that follows).
pub trait ViewModel: BindingContext {
    /// After hydration: resources resolved, view created, nothing bound.
    fn created(&mut self) {}

    /// After this component's bindings (and bound children) applied.
    fn bound(&mut self, _flags: BindingFlags) {}

    fn attaching(&mut self, _flags: BindingFlags) {}

    /// After this component's nodes joined the live scene.
    fn attached(&mut self, _flags: BindingFlags) {}

    /// Begin teardown. Return a pending task to hold unbind until the host
    /// finishes (exit animation); `None` detaches synchronously.
    fn detaching(&mut self, _flags: BindingFlags) -> Option<LifecycleTask> {
        None
    }

    fn detached(&mut self, _flags: BindingFlags) {}

    fn unbound(&mut self, _flags: BindingFlags) {}
}

/// A component with its own template: renders a [`View`] into a host node.
pub struct CustomElement {
    pub name: String,
    pub vm: Box<dyn ViewModel>,
    pub state: LifecycleState,
    /// Scene node the view mounts under.
    pub host: Option<NodeId>,
    pub view: Option<View>,
}

impl CustomElement {
    pub fn new(name: impl Into<String>, vm: Box<dyn ViewModel>) -> Self {
        Self {
            name: name.into(),
            vm,
            state: LifecycleState::New,
            host: None,
            view: None,
        }
    }
}

/// Template-controller half of a custom attribute: a view factory anchored
/// at a render-location marker.
///
/// The controller shows its view while its `value` property is truthy.
/// When linked to a previous controller (else after if) it inverts: the
/// view shows while the linked controller's value is falsy.
pub struct TemplateController {
    pub factory: ViewFactory,
    /// Marker node holding the controller's slot in the scene.
    pub location: NodeId,
    pub view: Option<View>,
    pub linked_to: Option<ComponentId>,
}

/// A component decorating an existing scene node.
pub struct CustomAttribute {
    pub name: String,
    pub vm: Box<dyn ViewModel>,
    pub state: LifecycleState,
    /// The node this attribute was rendered against.
    pub target: Option<NodeId>,
    pub controller: Option<TemplateController>,
}

impl CustomAttribute {
    pub fn new(name: impl Into<String>, vm: Box<dyn ViewModel>) -> Self {
        Self {
            name: name.into(),
            vm,
            state: LifecycleState::New,
            target: None,
            controller: None,
        }
    }

    pub fn is_template_controller(&self) -> bool {
        self.controller.is_some()
    }
}

/// Anything living in the component arena.
pub enum Component {
    Element(CustomElement),
    Attribute(CustomAttribute),
}

impl Component {
    pub fn name(&self) -> &str {
        match self {
            Component::Element(element) => &element.name,
            Component::Attribute(attribute) => &attribute.name,
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self {
            Component::Element(element) => element.state,
            Component::Attribute(attribute) => attribute.state,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Component::Element(_) => "element",
            Component::Attribute(_) => "attribute",
        }
    }

    pub fn vm(&self) -> &dyn ViewModel {
        match self {
            Component::Element(element) => element.vm.as_ref(),
            Component::Attribute(attribute) => attribute.vm.as_ref(),
        }
    }

    pub fn vm_mut(&mut self) -> &mut dyn ViewModel {
        match self {
            Component::Element(element) => element.vm.as_mut(),
            Component::Attribute(attribute) => attribute.vm.as_mut(),
        }
    }
}
