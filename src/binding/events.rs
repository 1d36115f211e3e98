//! Scene event routing.
//!
//! The host synthesizes [`SceneEvent`]s (pointer taps, drags) after its own
//! hit-testing and hands them to the runtime. The [`EventManager`] is a
//! plain registry: listener bindings record which component handles which
//! event on which node, and dispatch resolves the handler chain from it.
//! Keeping registrations as data instead of closures lets dispatch borrow
//! the component arena mutably while walking the chain.

use std::rc::Rc;

use crate::binding::expression::Expression;
use crate::component::ComponentId;
use crate::scene::{NodeId, PropertyValue, Scene};

/// How far an event travels from its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// Handlers on the target node only.
    Direct,
    /// Handlers on the target, then each ancestor up to the root.
    Bubbling,
}

/// An event synthesized by the host against a scene node.
#[derive(Debug, Clone)]
pub struct SceneEvent {
    pub name: String,
    pub target: NodeId,
    /// Handler expressions see this as `$event`.
    pub payload: PropertyValue,
    default_prevented: bool,
}

impl SceneEvent {
    pub fn new(name: impl Into<String>, target: NodeId, payload: PropertyValue) -> Self {
        Self {
            name: name.into(),
            target,
            payload,
            default_prevented: false,
        }
    }

    /// Ask the host to skip its default reaction to this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Handle for deregistering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u32);

struct Registration {
    handle: ListenerHandle,
    node: NodeId,
    event: String,
    strategy: DispatchStrategy,
    component: ComponentId,
    source: Rc<dyn Expression>,
    prevent_default: bool,
}

/// One handler resolved for a dispatch, in call order.
pub struct ResolvedListener {
    pub component: ComponentId,
    pub source: Rc<dyn Expression>,
    pub prevent_default: bool,
}

/// Registry of listener bindings, keyed by node and event name.
#[derive(Default)]
pub struct EventManager {
    registrations: Vec<Registration>,
    next_handle: u32,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &mut self,
        node: NodeId,
        event: impl Into<String>,
        strategy: DispatchStrategy,
        component: ComponentId,
        source: Rc<dyn Expression>,
        prevent_default: bool,
    ) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle += 1;
        self.registrations.push(Registration {
            handle,
            node,
            event: event.into(),
            strategy,
            component,
            source,
            prevent_default,
        });
        handle
    }

    pub fn remove_listener(&mut self, handle: ListenerHandle) {
        self.registrations.retain(|r| r.handle != handle);
    }

    /// Drop every registration for a node. Used when its slot is reclaimed.
    pub fn release_node(&mut self, node: NodeId) {
        self.registrations.retain(|r| r.node != node);
    }

    /// Resolve the handler chain for an event.
    ///
    /// Target handlers come first, then ancestors in bubble order; bubbling
    /// registrations match anywhere on the chain, direct ones only at the
    /// target. Within one node, handlers run in registration order.
    pub fn collect(&self, scene: &Scene, event: &str, target: NodeId) -> Vec<ResolvedListener> {
        let mut chain = vec![target];
        let mut current = target;
        while let Some(parent) = scene.parent(current) {
            chain.push(parent);
            current = parent;
        }

        let mut handlers = Vec::new();
        for (depth, node) in chain.iter().enumerate() {
            for reg in &self.registrations {
                if reg.node != *node || reg.event != event {
                    continue;
                }
                let matches = match reg.strategy {
                    DispatchStrategy::Direct => depth == 0,
                    DispatchStrategy::Bubbling => true,
                };
                if matches {
                    handlers.push(ResolvedListener {
                        component: reg.component,
                        source: Rc::clone(&reg.source),
                        prevent_default: reg.prevent_default,
                    });
                }
            }
        }
        handlers
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.len()
    }
}
