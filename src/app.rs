//! The runtime and the application shell.
//!
//! [`Runtime`] owns every piece of mutable state the renderer and the
//! lifecycle passes operate on: the scene, the component arena, observers,
//! event registrations, the registries, the expression parser and the
//! strategy cache. It is constructed explicitly at startup and passed by
//! reference; nothing in the crate reaches for process globals.
//!
//! [`AppShell`] drives top-level components through the lifecycle.
//! `app()` registers a component against a host (allocating a surface
//! stage when none is given); `start()` hydrates, binds and attaches every
//! registered component in order; `stop()` detaches and then unbinds, with
//! unbind chained after any pending detach task. The shell is a cheap
//! clone over shared state so pending detach completions can re-enter it
//! later. Multiple shells coexist, each with its own runtime and state.

use std::cell::RefCell;
use std::rc::Rc;

use crate::binding::expression::CachingParser;
use crate::binding::flags::BindingFlags;
use crate::binding::scope::{OverrideContext, Scope};
use crate::binding::{EventManager, ObserverLocator, SceneEvent};
use crate::component::{ComponentArena, ComponentId, ResourceRegistry};
use crate::error::{Result, ScenaError};
use crate::lifecycle;
use crate::render::{RenderContext, StrategyCache};
use crate::scene::{NodeId, NodeRegistry, PropertyValue, Scene, Surface, SurfaceOptions};
use crate::task::LifecycleTask;

/// A bundle of resources (node types, elements, attributes, strategies)
/// applied to a runtime in one go.
pub trait Registry {
    fn register(&self, runtime: &mut Runtime) -> Result<()>;
}

/// Everything the renderer and lifecycle passes work on.
pub struct Runtime {
    pub scene: Scene,
    pub arena: ComponentArena,
    pub observers: ObserverLocator,
    pub events: EventManager,
    pub nodes: NodeRegistry,
    pub resources: ResourceRegistry,
    parser: CachingParser,
    strategies: StrategyCache,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            arena: ComponentArena::new(),
            observers: ObserverLocator::new(),
            events: EventManager::new(),
            nodes: NodeRegistry::with_builtins(),
            resources: ResourceRegistry::new(),
            parser: CachingParser::new(),
            strategies: StrategyCache::new(),
        }
    }

    /// Split the runtime into a render context plus the arena, the borrow
    /// shape every pass takes.
    pub fn split(&mut self) -> (RenderContext<'_>, &mut ComponentArena) {
        (
            RenderContext {
                scene: &mut self.scene,
                observers: &mut self.observers,
                events: &mut self.events,
                nodes: &self.nodes,
                resources: &self.resources,
                parser: &self.parser,
                strategies: &mut self.strategies,
            },
            &mut self.arena,
        )
    }

    /// Hydrate the named element resource against `host`.
    pub fn hydrate_element(&mut self, resource: &str, host: NodeId) -> Result<ComponentId> {
        let (mut ctx, arena) = self.split();
        crate::render::hydrate_element(&mut ctx, arena, resource, host, None)
    }

    pub fn bind(&mut self, id: ComponentId, flags: BindingFlags) -> Result<()> {
        let (mut ctx, arena) = self.split();
        lifecycle::bind_component(&mut ctx, arena, id, flags)
    }

    pub fn attach(&mut self, id: ComponentId, flags: BindingFlags) -> Result<()> {
        let (mut ctx, arena) = self.split();
        lifecycle::attach_component(&mut ctx, arena, id, flags)
    }

    pub fn detach(&mut self, id: ComponentId, flags: BindingFlags) -> Result<LifecycleTask> {
        let (mut ctx, arena) = self.split();
        lifecycle::detach_component(&mut ctx, arena, id, flags)
    }

    pub fn unbind(&mut self, id: ComponentId, flags: BindingFlags) -> Result<()> {
        let (mut ctx, arena) = self.split();
        lifecycle::unbind_component(&mut ctx, arena, id, flags)
    }

    pub fn tick_component(&mut self, id: ComponentId, flags: BindingFlags) -> Result<()> {
        let (mut ctx, arena) = self.split();
        lifecycle::tick_component(&mut ctx, arena, id, flags)
    }

    /// Remove a component and reclaim everything it owns.
    pub fn discard_component(&mut self, id: ComponentId) -> Result<()> {
        let (mut ctx, arena) = self.split();
        lifecycle::discard_component(&mut ctx, arena, id)
    }

    /// Route a host-synthesized event through the registered listeners.
    ///
    /// Handlers evaluate in their owning component's scope with the event
    /// payload exposed as `$event`. A prevent-default listener marks the
    /// event unless its handler returned `true`.
    pub fn dispatch_event(&mut self, event: &mut SceneEvent) -> Result<()> {
        let handlers = self.events.collect(&self.scene, &event.name, event.target);
        log::trace!(
            "dispatching {:?} at {:?}: {} handler(s)",
            event.name,
            event.target,
            handlers.len()
        );
        for handler in handlers {
            let payload = event.payload.clone();
            let result = self
                .arena
                .with_component_mut(handler.component, |component, _| {
                    let mut overrides = OverrideContext::new();
                    overrides.set("$event", payload);
                    let mut scope = Scope::new(component.vm_mut(), &mut overrides);
                    handler.source.evaluate(&mut scope, BindingFlags::empty())
                })
                .ok_or(ScenaError::StaleHandle("component"))??;
            if handler.prevent_default && result != PropertyValue::Bool(true) {
                event.prevent_default();
            }
        }
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// One top-level component handed to [`AppShell::app`].
pub struct AppDefinition {
    /// Name of a registered element resource.
    pub element: String,
    /// Scene node to render under; a fresh surface stage when `None`.
    pub host: Option<NodeId>,
    /// Surface creation options, used when no host is given.
    pub surface: SurfaceOptions,
}

impl AppDefinition {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            host: None,
            surface: SurfaceOptions::default(),
        }
    }

    pub fn host(mut self, host: NodeId) -> Self {
        self.host = Some(host);
        self
    }

    pub fn surface(mut self, surface: SurfaceOptions) -> Self {
        self.surface = surface;
        self
    }
}

struct AppEntry {
    element: String,
    host: NodeId,
    /// Set once the start task has hydrated the component.
    component: Option<ComponentId>,
}

struct ShellInner {
    runtime: Runtime,
    started: bool,
    entries: Vec<AppEntry>,
    surfaces: Vec<Surface>,
}

/// Sequences hydrate → bind → attach on start and detach → unbind on stop
/// for its registered top-level components.
#[derive(Clone)]
pub struct AppShell {
    inner: Rc<RefCell<ShellInner>>,
}

impl AppShell {
    pub fn new() -> Self {
        Self::from_runtime(Runtime::new())
    }

    /// Wrap an already-configured runtime.
    pub fn from_runtime(runtime: Runtime) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ShellInner {
                runtime,
                started: false,
                entries: Vec::new(),
                surfaces: Vec::new(),
            })),
        }
    }

    /// Apply a resource bundle to the runtime.
    pub fn register(&self, registry: &dyn Registry) -> Result<()> {
        registry.register(&mut self.inner.borrow_mut().runtime)
    }

    /// Register a top-level component.
    ///
    /// Before `start()` this only queues the start task; on a started
    /// shell the component starts immediately.
    pub fn app(&self, definition: AppDefinition) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let host = match definition.host {
            Some(host) => host,
            None => {
                let surface = Surface::new(&mut inner.runtime.scene, definition.surface);
                let stage = surface.stage();
                inner.surfaces.push(surface);
                stage
            }
        };
        inner.entries.push(AppEntry {
            element: definition.element,
            host,
            component: None,
        });
        if inner.started {
            let index = inner.entries.len() - 1;
            Self::run_start_task(&mut inner, index)?;
        }
        Ok(())
    }

    /// Run all pending start tasks in registration order.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.started {
            return Ok(());
        }
        log::debug!("shell starting with {} component(s)", inner.entries.len());
        inner.started = true;
        for index in 0..inner.entries.len() {
            Self::run_start_task(&mut inner, index)?;
        }
        Ok(())
    }

    /// Flip to stopped, then detach and unbind every component in order.
    ///
    /// Unbind runs immediately after a synchronous detach; a pending
    /// detach task gets unbind chained onto its completion. A failed task
    /// still unbinds (logged), it never stalls teardown.
    pub fn stop(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if !inner.started {
            return Ok(());
        }
        log::debug!("shell stopping");
        inner.started = false;
        for index in 0..inner.entries.len() {
            let Some(id) = inner.entries[index].component else {
                continue;
            };
            let task = inner.runtime.detach(id, BindingFlags::FROM_STOP_TASK)?;
            if task.is_done() {
                if !task.succeeded() {
                    log::warn!("detach of component {:?} failed; unbinding anyway", id);
                }
                inner.runtime.unbind(id, BindingFlags::FROM_STOP_TASK)?;
            } else {
                let shell = Rc::clone(&self.inner);
                task.on_complete(move |succeeded| {
                    if !succeeded {
                        log::warn!(
                            "pending detach of component {:?} failed; unbinding anyway",
                            id
                        );
                    }
                    let mut inner = shell.borrow_mut();
                    if let Err(err) = inner.runtime.unbind(id, BindingFlags::FROM_STOP_TASK) {
                        log::warn!("deferred unbind of component {:?} failed: {}", id, err);
                    }
                });
            }
        }
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.inner.borrow().started
    }

    /// Frame driver entry: refresh the bindings of every started component.
    pub fn tick(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if !inner.started {
            return Ok(());
        }
        for index in 0..inner.entries.len() {
            if let Some(id) = inner.entries[index].component {
                inner.runtime.tick_component(id, BindingFlags::FROM_TICK)?;
            }
        }
        Ok(())
    }

    /// Feed a host-synthesized event through the runtime's listeners.
    pub fn dispatch_event(&self, event: &mut SceneEvent) -> Result<()> {
        self.inner.borrow_mut().runtime.dispatch_event(event)
    }

    /// Stage nodes of the surfaces this shell allocated, in `app()` order.
    pub fn stages(&self) -> Vec<NodeId> {
        self.inner
            .borrow()
            .surfaces
            .iter()
            .map(|surface| surface.stage())
            .collect()
    }

    /// Direct runtime access for hosts and tests.
    pub fn with_runtime<R>(&self, f: impl FnOnce(&mut Runtime) -> R) -> R {
        f(&mut self.inner.borrow_mut().runtime)
    }

    fn run_start_task(inner: &mut ShellInner, index: usize) -> Result<()> {
        let (element, host, existing) = {
            let entry = &inner.entries[index];
            (entry.element.clone(), entry.host, entry.component)
        };
        let id = match existing {
            Some(id) => id,
            None => {
                let id = inner.runtime.hydrate_element(&element, host)?;
                inner.entries[index].component = Some(id);
                id
            }
        };
        inner.runtime.bind(id, BindingFlags::FROM_START_TASK)?;
        inner.runtime.attach(id, BindingFlags::FROM_START_TASK)?;
        Ok(())
    }
}

impl Default for AppShell {
    fn default() -> Self {
        Self::new()
    }
}
