//! Live binding objects.
//!
//! The renderer turns binding instructions into these structs and parks
//! them on a view's bindable list; the lifecycle passes drive `bind`,
//! `tick` and `unbind` against them. Bindings are plain data plus explicit
//! context parameters, so the passes can hand in exactly the borrows they
//! hold.
//!
//! Data movement model: bind writes the initial value with `FROM_BIND`
//! (observers stay quiet), and the per-frame tick reconciles afterwards.
//! To-view bindings re-evaluate their source and push on change; from-view
//! bindings subscribe to the target observer and flush the latest observed
//! value back into the source on the next tick.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::binding::events::{DispatchStrategy, EventManager, ListenerHandle};
use crate::binding::expression::Expression;
use crate::binding::flags::{BindingFlags, BindingMode};
use crate::binding::observer::{ObserverLocator, SubscriptionId};
use crate::binding::scope::Scope;
use crate::component::{ComponentArena, ComponentId};
use crate::error::{Result, ScenaError};
use crate::scene::{NodeId, PropertyValue, Scene};

/// Where a binding writes: a scene node property (through its observer) or
/// a child component's view-model property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTarget {
    Node(NodeId),
    Component(ComponentId),
}

impl BindingTarget {
    pub fn write(
        &self,
        scene: &mut Scene,
        observers: &mut ObserverLocator,
        arena: &mut ComponentArena,
        to: &str,
        value: PropertyValue,
        flags: BindingFlags,
    ) -> Result<()> {
        match self {
            BindingTarget::Node(id) => observers.set_value(scene, *id, to, value, flags),
            BindingTarget::Component(id) => {
                let component = arena
                    .get_mut(*id)
                    .ok_or(ScenaError::StaleHandle("component"))?;
                component.vm_mut().set(to, value, flags);
                Ok(())
            }
        }
    }

    pub fn read(
        &self,
        scene: &Scene,
        observers: &mut ObserverLocator,
        arena: &ComponentArena,
        to: &str,
    ) -> Result<PropertyValue> {
        match self {
            BindingTarget::Node(id) => observers.get_observer(scene, *id, to)?.get_value(scene),
            BindingTarget::Component(id) => {
                let component = arena.get(*id).ok_or(ScenaError::StaleHandle("component"))?;
                Ok(component.vm().get(to))
            }
        }
    }
}

struct FromViewState {
    subscription: SubscriptionId,
    changed: Rc<Cell<bool>>,
    latest: Rc<RefCell<PropertyValue>>,
}

/// A text/property/style binding: source expression into a target property.
pub struct PropertyBinding {
    source: Rc<dyn Expression>,
    target: BindingTarget,
    to: String,
    mode: BindingMode,
    last: Option<PropertyValue>,
    from_view: Option<FromViewState>,
    bound: bool,
}

impl PropertyBinding {
    pub fn new(
        source: Rc<dyn Expression>,
        target: BindingTarget,
        to: impl Into<String>,
        mode: BindingMode,
    ) -> Self {
        Self {
            source,
            target,
            to: to.into(),
            mode,
            last: None,
            from_view: None,
            bound: false,
        }
    }

    pub fn bind(
        &mut self,
        scene: &mut Scene,
        observers: &mut ObserverLocator,
        arena: &mut ComponentArena,
        scope: &mut Scope<'_>,
        flags: BindingFlags,
    ) -> Result<()> {
        if self.bound {
            return Ok(());
        }
        let bind_flags = flags | BindingFlags::FROM_BIND;

        if self
            .mode
            .intersects(BindingMode::TO_VIEW | BindingMode::ONE_TIME)
        {
            let value = self.source.evaluate(scope, bind_flags)?;
            self.target
                .write(scene, observers, arena, &self.to, value.clone(), bind_flags)?;
            if self.mode.contains(BindingMode::TO_VIEW) {
                self.last = Some(value);
            }
        }

        if self.mode.contains(BindingMode::FROM_VIEW) {
            if !self.source.is_assignable() {
                return Err(ScenaError::NotAssignable(self.source.text().to_string()));
            }
            let node = match self.target {
                BindingTarget::Node(node) => node,
                BindingTarget::Component(_) => {
                    return Err(ScenaError::InvalidTarget("component"));
                }
            };
            let changed = Rc::new(Cell::new(false));
            let latest = Rc::new(RefCell::new(PropertyValue::Null));
            let observer = observers.get_observer(scene, node, &self.to)?;
            let changed_flag = Rc::clone(&changed);
            let latest_slot = Rc::clone(&latest);
            let subscription = observer.subscribe(Box::new(move |new, _previous, _flags| {
                *latest_slot.borrow_mut() = new.clone();
                changed_flag.set(true);
            }));
            self.from_view = Some(FromViewState {
                subscription,
                changed,
                latest,
            });
        }

        self.bound = true;
        Ok(())
    }

    /// Per-frame reconciliation. Target changes flush back to the source
    /// first, then the source is re-evaluated toward the target.
    pub fn tick(
        &mut self,
        scene: &mut Scene,
        observers: &mut ObserverLocator,
        arena: &mut ComponentArena,
        scope: &mut Scope<'_>,
        flags: BindingFlags,
    ) -> Result<()> {
        if !self.bound {
            return Ok(());
        }

        if let Some(from_view) = &self.from_view {
            if from_view.changed.get() {
                from_view.changed.set(false);
                let value = from_view.latest.borrow().clone();
                self.source.assign(scope, value.clone(), flags)?;
                self.last = Some(value);
            }
        }

        if self.mode.contains(BindingMode::TO_VIEW) {
            let value = self.source.evaluate(scope, flags)?;
            if self.last.as_ref() != Some(&value) {
                self.target
                    .write(scene, observers, arena, &self.to, value.clone(), flags)?;
                self.last = Some(value);
            }
        }
        Ok(())
    }

    pub fn unbind(&mut self, observers: &mut ObserverLocator) {
        if !self.bound {
            return;
        }
        if let Some(from_view) = self.from_view.take() {
            if let BindingTarget::Node(node) = self.target {
                if let Some(observer) = observers.peek_mut(node, &self.to) {
                    observer.unsubscribe(from_view.subscription);
                }
            }
        }
        self.last = None;
        self.bound = false;
    }

    pub fn target(&self) -> BindingTarget {
        self.target
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }
}

/// A listener binding: call expression fired when the named event reaches
/// the target node.
pub struct ListenerBinding {
    source: Rc<dyn Expression>,
    node: NodeId,
    event: String,
    strategy: DispatchStrategy,
    prevent_default: bool,
    handle: Option<ListenerHandle>,
}

impl ListenerBinding {
    pub fn new(
        source: Rc<dyn Expression>,
        node: NodeId,
        event: impl Into<String>,
        strategy: DispatchStrategy,
        prevent_default: bool,
    ) -> Self {
        Self {
            source,
            node,
            event: event.into(),
            strategy,
            prevent_default,
            handle: None,
        }
    }

    /// Register with the event manager on behalf of `owner`, whose scope
    /// the handler will evaluate in.
    pub fn bind(&mut self, events: &mut EventManager, owner: ComponentId) {
        if self.handle.is_some() {
            return;
        }
        self.handle = Some(events.add_listener(
            self.node,
            self.event.clone(),
            self.strategy,
            owner,
            Rc::clone(&self.source),
            self.prevent_default,
        ));
    }

    pub fn unbind(&mut self, events: &mut EventManager) {
        if let Some(handle) = self.handle.take() {
            events.remove_listener(handle);
        }
    }
}

/// A call binding: call expression re-run every tick, result written to the
/// target property.
pub struct CallBinding {
    source: Rc<dyn Expression>,
    target: BindingTarget,
    to: String,
    last: Option<PropertyValue>,
    bound: bool,
}

impl CallBinding {
    pub fn new(source: Rc<dyn Expression>, target: BindingTarget, to: impl Into<String>) -> Self {
        Self {
            source,
            target,
            to: to.into(),
            last: None,
            bound: false,
        }
    }

    pub fn bind(
        &mut self,
        scene: &mut Scene,
        observers: &mut ObserverLocator,
        arena: &mut ComponentArena,
        scope: &mut Scope<'_>,
        flags: BindingFlags,
    ) -> Result<()> {
        if self.bound {
            return Ok(());
        }
        let bind_flags = flags | BindingFlags::FROM_BIND;
        let value = self.source.evaluate(scope, bind_flags)?;
        self.target
            .write(scene, observers, arena, &self.to, value.clone(), bind_flags)?;
        self.last = Some(value);
        self.bound = true;
        Ok(())
    }

    pub fn tick(
        &mut self,
        scene: &mut Scene,
        observers: &mut ObserverLocator,
        arena: &mut ComponentArena,
        scope: &mut Scope<'_>,
        flags: BindingFlags,
    ) -> Result<()> {
        if !self.bound {
            return Ok(());
        }
        let value = self.source.evaluate(scope, flags)?;
        if self.last.as_ref() != Some(&value) {
            self.target
                .write(scene, observers, arena, &self.to, value.clone(), flags)?;
            self.last = Some(value);
        }
        Ok(())
    }

    pub fn unbind(&mut self) {
        self.last = None;
        self.bound = false;
    }
}

/// A ref binding: hands the target scene node to a view-model property for
/// imperative access.
pub struct RefBinding {
    name: String,
    node: NodeId,
    bound: bool,
}

impl RefBinding {
    pub fn new(name: impl Into<String>, node: NodeId) -> Self {
        Self {
            name: name.into(),
            node,
            bound: false,
        }
    }

    pub fn bind(&mut self, scope: &mut Scope<'_>, flags: BindingFlags) {
        if self.bound {
            return;
        }
        scope.vm.set(
            &self.name,
            PropertyValue::Node(self.node),
            flags | BindingFlags::FROM_BIND,
        );
        self.bound = true;
    }

    pub fn unbind(&mut self, scope: &mut Scope<'_>, flags: BindingFlags) {
        if !self.bound {
            return;
        }
        scope.vm.set(&self.name, PropertyValue::Null, flags);
        self.bound = false;
    }
}

struct LetEntry {
    source: Rc<dyn Expression>,
    to: String,
    last: Option<PropertyValue>,
}

/// Computed declarations from a let element. Results land in the
/// view-model or the view's override layer, per the direction flag.
pub struct LetBinding {
    entries: Vec<LetEntry>,
    to_view_model: bool,
    bound: bool,
}

impl LetBinding {
    pub fn new(
        declarations: impl IntoIterator<Item = (Rc<dyn Expression>, String)>,
        to_view_model: bool,
    ) -> Self {
        Self {
            entries: declarations
                .into_iter()
                .map(|(source, to)| LetEntry {
                    source,
                    to,
                    last: None,
                })
                .collect(),
            to_view_model,
            bound: false,
        }
    }

    pub fn bind(&mut self, scope: &mut Scope<'_>, flags: BindingFlags) -> Result<()> {
        if self.bound {
            return Ok(());
        }
        let bind_flags = flags | BindingFlags::FROM_BIND;
        for entry in &mut self.entries {
            let value = entry.source.evaluate(scope, bind_flags)?;
            if self.to_view_model {
                scope.vm.set(&entry.to, value.clone(), bind_flags);
            } else {
                scope.overrides.set(entry.to.clone(), value.clone());
            }
            entry.last = Some(value);
        }
        self.bound = true;
        Ok(())
    }

    pub fn tick(&mut self, scope: &mut Scope<'_>, flags: BindingFlags) -> Result<()> {
        if !self.bound {
            return Ok(());
        }
        for entry in &mut self.entries {
            let value = entry.source.evaluate(scope, flags)?;
            if entry.last.as_ref() != Some(&value) {
                if self.to_view_model {
                    scope.vm.set(&entry.to, value.clone(), flags);
                } else {
                    scope.overrides.set(entry.to.clone(), value.clone());
                }
                entry.last = Some(value);
            }
        }
        Ok(())
    }

    pub fn unbind(&mut self, scope: &mut Scope<'_>) {
        if !self.bound {
            return;
        }
        if !self.to_view_model {
            for entry in &self.entries {
                scope.overrides.remove(&entry.to);
            }
        }
        for entry in &mut self.entries {
            entry.last = None;
        }
        self.bound = false;
    }
}

/// Anything on a view's bindable list.
pub enum Bindable {
    Property(PropertyBinding),
    Listener(ListenerBinding),
    Call(CallBinding),
    Ref(RefBinding),
    Let(LetBinding),
    /// Nested component, bound and unbound in list order.
    Component(ComponentId),
}
