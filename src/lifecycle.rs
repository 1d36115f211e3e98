//! Lifecycle passes over the component tree.
//!
//! Components reference their children through the arena, so every pass
//! here is a free function over `(RenderContext, ComponentArena)`: the pass
//! extracts one component, works on it with the arena still available for
//! recursion, and restores it. The passes enforce the linear state machine
//! (`Hydrated → Bound → Attached → Detached → Unbound`) and the one hard
//! ordering rule of the runtime: a component's unbind runs strictly after
//! its detach has completed, even when detach is asynchronous.
//!
//! Detach is the only step that can suspend. `detach_component` returns a
//! [`LifecycleTask`] aggregating the component's own `detaching` task with
//! its children's; the caller chains unbind on completion. Everything else
//! runs to completion on the caller's stack.
//!
//! Template controllers are serviced here too: `bind` and `tick` evaluate
//! the controller's condition and create, mount or discard its dynamic view
//! at the render location accordingly.

use crate::binding::binding::Bindable;
use crate::binding::flags::BindingFlags;
use crate::binding::scope::Scope;
use crate::component::{
    Component, ComponentArena, ComponentId, CustomAttribute, LifecycleState, ViewModel,
};
use crate::error::{Result, ScenaError};
use crate::render::context::RenderContext;
use crate::scene::PropertyValue;
use crate::task::LifecycleTask;
use crate::template::view::View;

/// Bind a component and everything it renders.
///
/// Bindables apply in list order; nested components bind where their
/// hydrate instruction placed them. No-op when already bound.
pub fn bind_component(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    id: ComponentId,
    flags: BindingFlags,
) -> Result<()> {
    arena
        .with_component_mut(id, |component, arena| -> Result<()> {
            match component {
                Component::Element(element) => {
                    if element.state.is_bound() {
                        return Ok(());
                    }
                    log::trace!("binding element {:?}", element.name);
                    if let Some(mut view) = element.view.take() {
                        let outcome =
                            bind_view(ctx, arena, &mut view, element.vm.as_mut(), id, flags);
                        element.view = Some(view);
                        outcome?;
                    }
                    element.state = LifecycleState::Bound;
                    element.vm.bound(flags);
                }
                Component::Attribute(attribute) => {
                    if attribute.state.is_bound() {
                        return Ok(());
                    }
                    log::trace!("binding attribute {:?}", attribute.name);
                    attribute.state = LifecycleState::Bound;
                    update_controller(ctx, arena, attribute, id, flags)?;
                    attribute.vm.bound(flags);
                }
            }
            Ok(())
        })
        .ok_or(ScenaError::StaleHandle("component"))?
}

/// Attach a bound component under its host (elements) or at its render
/// location (controller views), then its attachables in order.
pub fn attach_component(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    id: ComponentId,
    flags: BindingFlags,
) -> Result<()> {
    arena
        .with_component_mut(id, |component, arena| -> Result<()> {
            match component {
                Component::Element(element) => {
                    if element.state.is_attached() {
                        return Ok(());
                    }
                    element.vm.attaching(flags);
                    if let (Some(view), Some(host)) = (&mut element.view, element.host) {
                        view.sequence.append_to(ctx.scene, host)?;
                    }
                    if let Some(view) = &element.view {
                        for child in view.renderable.attachables.clone() {
                            attach_component(ctx, arena, child, flags)?;
                        }
                    }
                    element.state = LifecycleState::Attached;
                    element.vm.attached(flags);
                }
                Component::Attribute(attribute) => {
                    if attribute.state.is_attached() {
                        return Ok(());
                    }
                    attribute.vm.attaching(flags);
                    if let Some(controller) = &mut attribute.controller {
                        if let Some(view) = &mut controller.view {
                            view.sequence.insert_before(ctx.scene, controller.location)?;
                            for child in view.renderable.attachables.clone() {
                                attach_component(ctx, arena, child, flags)?;
                            }
                        }
                    }
                    attribute.state = LifecycleState::Attached;
                    attribute.vm.attached(flags);
                }
            }
            Ok(())
        })
        .ok_or(ScenaError::StaleHandle("component"))?
}

/// Detach a component: children first (reverse of attach order), then its
/// own scene nodes.
///
/// Scene nodes leave the graph immediately; a pending `detaching` task
/// only gates the unbind that follows. The returned task completes when
/// the component's and all its children's detach work has.
pub fn detach_component(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    id: ComponentId,
    flags: BindingFlags,
) -> Result<LifecycleTask> {
    arena
        .with_component_mut(id, |component, arena| -> Result<LifecycleTask> {
            let mut tasks = Vec::new();
            match component {
                Component::Element(element) => {
                    if !element.state.is_attached() {
                        return Ok(LifecycleTask::done());
                    }
                    if let Some(task) = element.vm.detaching(flags) {
                        tasks.push(task);
                    }
                    if let Some(view) = &mut element.view {
                        for child in view.renderable.attachables.clone().into_iter().rev() {
                            tasks.push(detach_component(ctx, arena, child, flags)?);
                        }
                        view.sequence.remove(ctx.scene);
                    }
                    element.state = LifecycleState::Detached;
                    element.vm.detached(flags);
                }
                Component::Attribute(attribute) => {
                    if !attribute.state.is_attached() {
                        return Ok(LifecycleTask::done());
                    }
                    if let Some(task) = attribute.vm.detaching(flags) {
                        tasks.push(task);
                    }
                    if let Some(controller) = &mut attribute.controller {
                        if let Some(view) = &mut controller.view {
                            for child in view.renderable.attachables.clone().into_iter().rev() {
                                tasks.push(detach_component(ctx, arena, child, flags)?);
                            }
                            view.sequence.remove(ctx.scene);
                        }
                    }
                    attribute.state = LifecycleState::Detached;
                    attribute.vm.detached(flags);
                }
            }
            Ok(LifecycleTask::all(tasks))
        })
        .ok_or(ScenaError::StaleHandle("component"))?
}

/// Unbind a detached component, releasing bindings in reverse bind order.
pub fn unbind_component(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    id: ComponentId,
    flags: BindingFlags,
) -> Result<()> {
    arena
        .with_component_mut(id, |component, arena| -> Result<()> {
            match component {
                Component::Element(element) => {
                    if !element.state.is_bound() {
                        return Ok(());
                    }
                    if let Some(mut view) = element.view.take() {
                        let outcome =
                            unbind_view(ctx, arena, &mut view, element.vm.as_mut(), flags);
                        element.view = Some(view);
                        outcome?;
                    }
                    element.state = LifecycleState::Unbound;
                    element.vm.unbound(flags);
                }
                Component::Attribute(attribute) => {
                    if !attribute.state.is_bound() {
                        return Ok(());
                    }
                    let CustomAttribute { vm, controller, .. } = attribute;
                    if let Some(controller) = controller {
                        if let Some(view) = &mut controller.view {
                            unbind_view(ctx, arena, view, vm.as_mut(), flags)?;
                        }
                    }
                    attribute.state = LifecycleState::Unbound;
                    attribute.vm.unbound(flags);
                }
            }
            Ok(())
        })
        .ok_or(ScenaError::StaleHandle("component"))?
}

/// Per-frame refresh: re-evaluate to-view bindings, flush observed
/// from-view changes, service template controllers, recurse into children.
pub fn tick_component(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    id: ComponentId,
    flags: BindingFlags,
) -> Result<()> {
    arena
        .with_component_mut(id, |component, arena| -> Result<()> {
            match component {
                Component::Element(element) => {
                    if !element.state.is_bound() {
                        return Ok(());
                    }
                    if let Some(mut view) = element.view.take() {
                        let outcome = tick_view(ctx, arena, &mut view, element.vm.as_mut(), flags);
                        element.view = Some(view);
                        outcome?;
                    }
                }
                Component::Attribute(attribute) => {
                    if !attribute.state.is_bound() {
                        return Ok(());
                    }
                    update_controller(ctx, arena, attribute, id, flags)?;
                    let CustomAttribute { vm, controller, .. } = attribute;
                    if let Some(controller) = controller {
                        if let Some(view) = &mut controller.view {
                            tick_view(ctx, arena, view, vm.as_mut(), flags)?;
                        }
                    }
                }
            }
            Ok(())
        })
        .ok_or(ScenaError::StaleHandle("component"))?
}

/// Remove a component from the arena and reclaim everything it owns:
/// nested components, controller markers, and instantiated scene nodes.
pub fn discard_component(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    id: ComponentId,
) -> Result<()> {
    let Some(component) = arena.remove(id) else {
        return Ok(());
    };
    match component {
        Component::Element(element) => {
            if let Some(view) = element.view {
                discard_view(ctx, arena, view)?;
            }
        }
        Component::Attribute(attribute) => {
            if let Some(controller) = attribute.controller {
                if let Some(view) = controller.view {
                    discard_view(ctx, arena, view)?;
                }
                ctx.observers.release_node(controller.location);
                ctx.events.release_node(controller.location);
                ctx.scene.destroy(controller.location);
            }
        }
    }
    Ok(())
}

/// Reclaim a view: nested components first, then its scene nodes.
///
/// Observers and listener registrations keyed by the reclaimed nodes go
/// with them, so a later occupant of the slot starts clean.
pub fn discard_view(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    view: View,
) -> Result<()> {
    for child in &view.renderable.attachables {
        discard_component(ctx, arena, *child)?;
    }
    for node in view.sequence.scene_nodes() {
        ctx.observers.release_node(node);
        ctx.events.release_node(node);
    }
    view.sequence.destroy(ctx.scene);
    Ok(())
}

fn bind_view(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    view: &mut View,
    vm: &mut dyn ViewModel,
    owner: ComponentId,
    flags: BindingFlags,
) -> Result<()> {
    if view.bound {
        return Ok(());
    }
    let View {
        renderable,
        overrides,
        bound,
        ..
    } = view;
    for bindable in renderable.bindables.iter_mut() {
        match bindable {
            Bindable::Property(binding) => {
                let mut scope = Scope::new(&mut *vm, overrides);
                binding.bind(ctx.scene, ctx.observers, arena, &mut scope, flags)?;
            }
            Bindable::Listener(binding) => binding.bind(ctx.events, owner),
            Bindable::Call(binding) => {
                let mut scope = Scope::new(&mut *vm, overrides);
                binding.bind(ctx.scene, ctx.observers, arena, &mut scope, flags)?;
            }
            Bindable::Ref(binding) => {
                let mut scope = Scope::new(&mut *vm, overrides);
                binding.bind(&mut scope, flags);
            }
            Bindable::Let(binding) => {
                let mut scope = Scope::new(&mut *vm, overrides);
                binding.bind(&mut scope, flags)?;
            }
            Bindable::Component(child) => bind_component(ctx, arena, *child, flags)?,
        }
    }
    *bound = true;
    Ok(())
}

fn unbind_view(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    view: &mut View,
    vm: &mut dyn ViewModel,
    flags: BindingFlags,
) -> Result<()> {
    if !view.bound {
        return Ok(());
    }
    let unbind_flags = flags | BindingFlags::FROM_UNBIND;
    let View {
        renderable,
        overrides,
        bound,
        ..
    } = view;
    for bindable in renderable.bindables.iter_mut().rev() {
        match bindable {
            Bindable::Property(binding) => binding.unbind(ctx.observers),
            Bindable::Listener(binding) => binding.unbind(ctx.events),
            Bindable::Call(binding) => binding.unbind(),
            Bindable::Ref(binding) => {
                let mut scope = Scope::new(&mut *vm, overrides);
                binding.unbind(&mut scope, unbind_flags);
            }
            Bindable::Let(binding) => {
                let mut scope = Scope::new(&mut *vm, overrides);
                binding.unbind(&mut scope);
            }
            Bindable::Component(child) => unbind_component(ctx, arena, *child, flags)?,
        }
    }
    *bound = false;
    Ok(())
}

fn tick_view(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    view: &mut View,
    vm: &mut dyn ViewModel,
    flags: BindingFlags,
) -> Result<()> {
    if !view.bound {
        return Ok(());
    }
    let View {
        renderable,
        overrides,
        ..
    } = view;
    for bindable in renderable.bindables.iter_mut() {
        match bindable {
            Bindable::Property(binding) => {
                let mut scope = Scope::new(&mut *vm, overrides);
                binding.tick(ctx.scene, ctx.observers, arena, &mut scope, flags)?;
            }
            Bindable::Call(binding) => {
                let mut scope = Scope::new(&mut *vm, overrides);
                binding.tick(ctx.scene, ctx.observers, arena, &mut scope, flags)?;
            }
            Bindable::Let(binding) => {
                let mut scope = Scope::new(&mut *vm, overrides);
                binding.tick(&mut scope, flags)?;
            }
            Bindable::Component(child) => tick_component(ctx, arena, *child, flags)?,
            Bindable::Listener(_) | Bindable::Ref(_) => {}
        }
    }
    Ok(())
}

/// Reconcile a template controller's view with its condition.
///
/// The condition is the `value` property of the controller's own
/// view-model, or the inverse of the linked predecessor's (else after if).
/// A flip to shown creates, binds and (when attached) mounts a fresh view;
/// a flip to hidden detaches, unbinds and discards it.
fn update_controller(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    attribute: &mut CustomAttribute,
    id: ComponentId,
    flags: BindingFlags,
) -> Result<()> {
    let CustomAttribute {
        vm,
        state,
        controller,
        ..
    } = attribute;
    let Some(controller) = controller else {
        return Ok(());
    };

    let shown = match controller.linked_to {
        Some(predecessor) => !truthy(
            &arena
                .get(predecessor)
                .ok_or(ScenaError::StaleHandle("component"))?
                .vm()
                .get("value"),
        ),
        None => truthy(&vm.get("value")),
    };

    if shown && controller.view.is_none() {
        let mut view = controller.factory.create(ctx, arena)?;
        bind_view(ctx, arena, &mut view, vm.as_mut(), id, flags)?;
        if state.is_attached() {
            view.sequence.insert_before(ctx.scene, controller.location)?;
            for child in view.renderable.attachables.clone() {
                attach_component(ctx, arena, child, flags)?;
            }
        }
        controller.view = Some(view);
    } else if !shown {
        if let Some(mut view) = controller.view.take() {
            for child in view.renderable.attachables.clone().into_iter().rev() {
                let task = detach_component(ctx, arena, child, flags)?;
                if !task.is_done() {
                    log::warn!("controller toggle discards a still-pending detach");
                }
            }
            view.sequence.remove(ctx.scene);
            unbind_view(ctx, arena, &mut view, vm.as_mut(), flags)?;
            discard_view(ctx, arena, view)?;
        }
    }
    Ok(())
}

/// Condition semantics for controller values.
fn truthy(value: &PropertyValue) -> bool {
    match value {
        PropertyValue::Null => false,
        PropertyValue::Bool(b) => *b,
        PropertyValue::Number(n) => *n != 0.0,
        PropertyValue::Text(s) => !s.is_empty(),
        PropertyValue::Color(_) | PropertyValue::Node(_) => true,
    }
}
