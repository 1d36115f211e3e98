//! Property observation for scene nodes.
//!
//! Each observed `(node, property)` pair gets exactly one
//! [`PropertyObserver`], handed out lazily by the [`ObserverLocator`]. All
//! observed writes go through [`PropertyObserver::set_value`], which
//! enforces the change pipeline:
//!
//! 1. reject values of the wrong semantic type without touching anything
//! 2. drop writes equal to the cached value (no mutation, no notification)
//! 3. mutate the scene node
//! 4. update the cached value
//! 5. notify subscribers with `(new, previous, flags)`, unless the write
//!    carries `FROM_BIND`
//!
//! Writes that bypass the observer (direct `Scene::node_mut` access) are
//! invisible to subscribers; anything that wants to be observed must write
//! through here.

use std::collections::HashMap;

use crate::binding::flags::BindingFlags;
use crate::error::{Result, ScenaError};
use crate::scene::{NodeId, PropertyValue, Scene};

/// Handle for removing a subscriber. Scoped to the observer that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u32);

/// Change callback: `(new_value, previous_value, flags)`.
pub type Subscriber = Box<dyn FnMut(&PropertyValue, &PropertyValue, BindingFlags)>;

/// Whether the property resolves through the node's main schema or its
/// text style block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Direct,
    Style,
}

/// Observes one property of one scene node.
pub struct PropertyObserver {
    node: NodeId,
    property: String,
    route: Route,
    current: PropertyValue,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u32,
}

impl std::fmt::Debug for PropertyObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyObserver")
            .field("node", &self.node)
            .field("property", &self.property)
            .field("route", &self.route)
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl PropertyObserver {
    fn new(node: NodeId, property: &str, route: Route, initial: PropertyValue) -> Self {
        Self {
            node,
            property: property.to_string(),
            route,
            current: initial,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    /// The last value that moved through this observer.
    pub fn cached(&self) -> &PropertyValue {
        &self.current
    }

    /// The live value straight from the scene.
    pub fn get_value(&self, scene: &Scene) -> Result<PropertyValue> {
        let node = scene
            .node(self.node)
            .ok_or(ScenaError::StaleHandle("node"))?;
        match self.route {
            Route::Direct => node.get_property(&self.property),
            Route::Style => node.get_style_property(&self.property),
        }
    }

    /// Run the observed-write pipeline.
    pub fn set_value(
        &mut self,
        scene: &mut Scene,
        value: PropertyValue,
        flags: BindingFlags,
    ) -> Result<()> {
        // Equal values were already validated when they were cached
        if value == self.current {
            return Ok(());
        }

        let node = scene
            .node_mut(self.node)
            .ok_or(ScenaError::StaleHandle("node"))?;
        match self.route {
            Route::Direct => node.set_property(&self.property, value.clone())?,
            Route::Style => node.set_style_property(&self.property, value.clone())?,
        }

        let previous = std::mem::replace(&mut self.current, value);

        if !flags.contains(BindingFlags::FROM_BIND) {
            let current = self.current.clone();
            for (_, subscriber) in self.subscribers.iter_mut() {
                subscriber(&current, &previous, flags);
            }
        }
        Ok(())
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.is_empty()
    }
}

/// Lazily creates and caches one observer per `(node, property)` pair.
#[derive(Default)]
pub struct ObserverLocator {
    observers: HashMap<(NodeId, String), PropertyObserver>,
}

impl ObserverLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The observer for `(node, property)`, created on first use.
    ///
    /// Creation resolves the property against the node's schema, so asking
    /// for a property the node kind does not carry fails here rather than
    /// on the first write.
    pub fn get_observer(
        &mut self,
        scene: &Scene,
        node: NodeId,
        property: &str,
    ) -> Result<&mut PropertyObserver> {
        let key = (node, property.to_string());
        if !self.observers.contains_key(&key) {
            let scene_node = scene.node(node).ok_or(ScenaError::StaleHandle("node"))?;
            let (route, initial) = match scene_node.get_property(property) {
                Ok(value) => (Route::Direct, value),
                Err(ScenaError::UnknownProperty { .. }) => {
                    (Route::Style, scene_node.get_style_property(property)?)
                }
                Err(err) => return Err(err),
            };
            log::trace!("observer created for {:?}.{}", node, property);
            self.observers
                .insert(key.clone(), PropertyObserver::new(node, property, route, initial));
        }
        // Just inserted above when absent
        self.observers
            .get_mut(&key)
            .ok_or(ScenaError::StaleHandle("observer"))
    }

    /// Observed write without holding the observer across the call.
    pub fn set_value(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        property: &str,
        value: PropertyValue,
        flags: BindingFlags,
    ) -> Result<()> {
        self.get_observer(scene, node, property)?
            .set_value(scene, value, flags)
    }

    pub fn peek(&self, node: NodeId, property: &str) -> Option<&PropertyObserver> {
        self.observers.get(&(node, property.to_string()))
    }

    pub fn peek_mut(&mut self, node: NodeId, property: &str) -> Option<&mut PropertyObserver> {
        self.observers.get_mut(&(node, property.to_string()))
    }

    /// Drop all observers for a node. Used when its slot is reclaimed.
    pub fn release_node(&mut self, node: NodeId) {
        self.observers.retain(|(id, _), _| *id != node);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scene_with_sprite() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let id = scene.create(NodeKind::Sprite);
        (scene, id)
    }

    #[test]
    fn test_one_observer_per_pair() {
        let (scene, id) = scene_with_sprite();
        let mut locator = ObserverLocator::new();

        locator.get_observer(&scene, id, "x").unwrap();
        locator.get_observer(&scene, id, "x").unwrap();
        locator.get_observer(&scene, id, "y").unwrap();

        assert_eq!(locator.observer_count(), 2);
    }

    #[test]
    fn test_set_value_mutates_node_and_notifies() {
        let (mut scene, id) = scene_with_sprite();
        let mut locator = ObserverLocator::new();
        let seen: Rc<RefCell<Vec<(PropertyValue, PropertyValue)>>> =
            Rc::new(RefCell::new(Vec::new()));

        let observer = locator.get_observer(&scene, id, "x").unwrap();
        let sink = Rc::clone(&seen);
        observer.subscribe(Box::new(move |new, old, _flags| {
            sink.borrow_mut().push((new.clone(), old.clone()));
        }));

        observer
            .set_value(&mut scene, PropertyValue::Number(25.0), BindingFlags::empty())
            .unwrap();

        assert_eq!(scene.node(id).map(|n| n.x), Some(25.0));
        assert_eq!(
            seen.borrow().as_slice(),
            &[(PropertyValue::Number(25.0), PropertyValue::Number(0.0))]
        );
    }

    #[test]
    fn test_equal_value_is_dropped() {
        let (mut scene, id) = scene_with_sprite();
        let mut locator = ObserverLocator::new();
        let count = Rc::new(RefCell::new(0));

        let observer = locator.get_observer(&scene, id, "x").unwrap();
        let sink = Rc::clone(&count);
        observer.subscribe(Box::new(move |_, _, _| *sink.borrow_mut() += 1));

        observer
            .set_value(&mut scene, PropertyValue::Number(5.0), BindingFlags::empty())
            .unwrap();
        observer
            .set_value(&mut scene, PropertyValue::Number(5.0), BindingFlags::empty())
            .unwrap();

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_invalid_value_changes_nothing() {
        let (mut scene, id) = scene_with_sprite();
        let mut locator = ObserverLocator::new();
        let count = Rc::new(RefCell::new(0));

        let observer = locator.get_observer(&scene, id, "x").unwrap();
        let sink = Rc::clone(&count);
        observer.subscribe(Box::new(move |_, _, _| *sink.borrow_mut() += 1));

        let err = observer
            .set_value(
                &mut scene,
                PropertyValue::Text("nope".into()),
                BindingFlags::empty(),
            )
            .unwrap_err();

        assert!(matches!(err, ScenaError::InvalidValue { .. }));
        assert_eq!(scene.node(id).map(|n| n.x), Some(0.0));
        assert_eq!(observer.cached(), &PropertyValue::Number(0.0));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_from_bind_suppresses_notification() {
        let (mut scene, id) = scene_with_sprite();
        let mut locator = ObserverLocator::new();
        let count = Rc::new(RefCell::new(0));

        let observer = locator.get_observer(&scene, id, "x").unwrap();
        let sink = Rc::clone(&count);
        observer.subscribe(Box::new(move |_, _, _| *sink.borrow_mut() += 1));

        observer
            .set_value(
                &mut scene,
                PropertyValue::Number(9.0),
                BindingFlags::FROM_BIND,
            )
            .unwrap();

        // The write itself still lands
        assert_eq!(scene.node(id).map(|n| n.x), Some(9.0));
        assert_eq!(observer.cached(), &PropertyValue::Number(9.0));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let (mut scene, id) = scene_with_sprite();
        let mut locator = ObserverLocator::new();
        let count = Rc::new(RefCell::new(0));

        let observer = locator.get_observer(&scene, id, "x").unwrap();
        let sink = Rc::clone(&count);
        let sub = observer.subscribe(Box::new(move |_, _, _| *sink.borrow_mut() += 1));

        observer
            .set_value(&mut scene, PropertyValue::Number(1.0), BindingFlags::empty())
            .unwrap();
        observer.unsubscribe(sub);
        observer
            .set_value(&mut scene, PropertyValue::Number(2.0), BindingFlags::empty())
            .unwrap();

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_style_property_routing() {
        let mut scene = Scene::new();
        let id = scene.create(NodeKind::Text);
        let mut locator = ObserverLocator::new();

        locator
            .set_value(
                &mut scene,
                id,
                "font_size",
                PropertyValue::Number(24.0),
                BindingFlags::empty(),
            )
            .unwrap();

        assert_eq!(scene.node(id).map(|n| n.style.font_size), Some(24.0));
    }

    #[test]
    fn test_unknown_property_fails_at_creation() {
        let (scene, id) = scene_with_sprite();
        let mut locator = ObserverLocator::new();

        let err = locator.get_observer(&scene, id, "font_size").unwrap_err();
        assert!(matches!(err, ScenaError::UnknownProperty { .. }));
        assert_eq!(locator.observer_count(), 0);
    }
}
