//! Instruction replay: turning a compiled definition plus an instantiated
//! node sequence into live bindings and hydrated child components.
//!
//! `render` walks the definition's instruction lists against the sequence's
//! targets, index for index, and dispatches each instruction through one
//! exhaustive `match`. Binding instructions produce binding objects on the
//! view's renderable; hydrate instructions recurse, retargeting nested
//! dispatch at the freshly created component; set instructions apply
//! immediately and leave nothing behind. Everything here is synchronous —
//! the only asynchrony in the runtime is lifecycle detach.
//!
//! The target/instruction count check is deliberately direction-aware: a
//! definition compiled against a different fragment shape is a fatal
//! compiler mismatch, and "too many targets" vs "too many instructions"
//! point at different compiler bugs.

use std::rc::Rc;

use crate::binding::binding::{
    Bindable, BindingTarget, CallBinding, LetBinding, ListenerBinding, PropertyBinding, RefBinding,
};
use crate::binding::expression::ExpressionKind;
use crate::binding::flags::{BindingFlags, BindingMode};
use crate::component::{
    Component, ComponentArena, ComponentId, CustomAttribute, CustomElement, LifecycleState,
    TemplateController,
};
use crate::error::{Result, ScenaError};
use crate::render::context::RenderContext;
use crate::render::strategy::StrategyInput;
use crate::scene::NodeId;
use crate::template::fragment::FragmentNodeId;
use crate::template::instructions::{Instruction, TemplateDefinition, TemplateParts};
use crate::template::sequence::NodeSequence;
use crate::template::view::{View, ViewFactory};

/// What an instruction is being dispatched against.
///
/// Targets inside the fragment keep their declarative id so structural
/// instructions (template controllers, let elements) can rewrite the
/// sequence; the host only ever receives surrogates, and components only
/// the nested lists of hydrate instructions.
enum DispatchTarget {
    Fragment { id: FragmentNodeId, node: NodeId },
    Host(NodeId),
    Component(ComponentId),
}

impl DispatchTarget {
    fn node(&self) -> Option<NodeId> {
        match self {
            DispatchTarget::Fragment { node, .. } | DispatchTarget::Host(node) => Some(*node),
            DispatchTarget::Component(_) => None,
        }
    }

    fn binding_target(&self) -> BindingTarget {
        match self {
            DispatchTarget::Fragment { node, .. } | DispatchTarget::Host(node) => {
                BindingTarget::Node(*node)
            }
            DispatchTarget::Component(id) => BindingTarget::Component(*id),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            DispatchTarget::Fragment { .. } => "fragment target",
            DispatchTarget::Host(_) => "host",
            DispatchTarget::Component(_) => "component",
        }
    }

    fn require_node(&self) -> Result<NodeId> {
        self.node()
            .ok_or_else(|| ScenaError::InvalidTarget(self.kind_name()))
    }
}

/// Instantiate `definition` and replay its instructions, producing a fresh
/// unbound, unmounted view.
pub fn create_view(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    definition: &Rc<TemplateDefinition>,
    host: Option<NodeId>,
    parts: Option<&TemplateParts>,
) -> Result<View> {
    let sequence = NodeSequence::instantiate(&definition.fragment, ctx.scene, ctx.nodes)?;
    let mut view = View::new(sequence);
    render(ctx, arena, &mut view, definition, host, parts)?;
    Ok(view)
}

/// Replay a definition against an already instantiated view.
///
/// Per target, instructions dispatch in list order; the surrogate list runs
/// against `host` afterwards. Fails before dispatching anything when the
/// sequence's target count disagrees with the definition.
pub fn render(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    view: &mut View,
    definition: &TemplateDefinition,
    host: Option<NodeId>,
    parts: Option<&TemplateParts>,
) -> Result<()> {
    let targets = view.sequence.find_targets();
    if targets.len() > definition.instructions.len() {
        return Err(ScenaError::SurplusTargets {
            targets: targets.len(),
            instructions: definition.instructions.len(),
        });
    }
    if targets.len() < definition.instructions.len() {
        return Err(ScenaError::SurplusInstructions {
            targets: targets.len(),
            instructions: definition.instructions.len(),
        });
    }

    log::debug!(
        "rendering {:?}: {} targets, {} surrogates",
        definition.name,
        targets.len(),
        definition.surrogates.len()
    );

    for (index, fragment_id) in targets.into_iter().enumerate() {
        let node = view
            .sequence
            .scene_node_for(fragment_id)
            .ok_or(ScenaError::StaleHandle("target"))?;
        let target = DispatchTarget::Fragment {
            id: fragment_id,
            node,
        };
        for instruction in &definition.instructions[index] {
            dispatch(ctx, arena, view, &target, instruction, parts)?;
        }
    }

    if let Some(host) = host {
        let target = DispatchTarget::Host(host);
        for instruction in &definition.surrogates {
            dispatch(ctx, arena, view, &target, instruction, parts)?;
        }
    }
    Ok(())
}

/// Resolve and hydrate the named custom element against `host`.
///
/// The element's own template renders recursively; the caller dispatches
/// the hydrate instruction's nested list and pushes the component onto the
/// outer renderable.
pub fn hydrate_element(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    resource: &str,
    host: NodeId,
    parts: Option<&TemplateParts>,
) -> Result<ComponentId> {
    let (definition, vm) = {
        let resolved = ctx.resources.require_element(resource)?;
        (Rc::clone(&resolved.definition), (resolved.vm_factory)())
    };
    log::debug!("hydrating element {:?} against {:?}", resource, host);

    let mut element = CustomElement::new(resource, vm);
    element.host = Some(host);
    element.view = Some(create_view(ctx, arena, &definition, Some(host), parts)?);
    element.state = LifecycleState::Hydrated;
    element.vm.created();
    Ok(arena.insert(Component::Element(element)))
}

fn dispatch(
    ctx: &mut RenderContext<'_>,
    arena: &mut ComponentArena,
    view: &mut View,
    target: &DispatchTarget,
    instruction: &Instruction,
    parts: Option<&TemplateParts>,
) -> Result<()> {
    log::trace!(
        "dispatching {} against {}",
        instruction.kind(),
        target.kind_name()
    );
    match instruction {
        Instruction::TextBinding { from } => {
            let node = target.require_node()?;
            let source = from.ensure_parsed(ctx.parser, ExpressionKind::Interpolation)?;
            view.renderable.add_bindable(Bindable::Property(PropertyBinding::new(
                source,
                BindingTarget::Node(node),
                "text",
                BindingMode::TO_VIEW,
            )));
        }
        Instruction::PropertyBinding { from, to, mode }
        | Instruction::StylePropertyBinding { from, to, mode } => {
            let source = from.ensure_parsed(ctx.parser, ExpressionKind::Property)?;
            view.renderable.add_bindable(Bindable::Property(PropertyBinding::new(
                source,
                target.binding_target(),
                to,
                *mode,
            )));
        }
        Instruction::ListenerBinding {
            from,
            to,
            strategy,
            prevent_default,
        } => {
            let node = target.require_node()?;
            let source = from.ensure_parsed(ctx.parser, ExpressionKind::Call)?;
            view.renderable.add_bindable(Bindable::Listener(ListenerBinding::new(
                source,
                node,
                to,
                *strategy,
                *prevent_default,
            )));
        }
        Instruction::CallBinding { from, to } => {
            let source = from.ensure_parsed(ctx.parser, ExpressionKind::Call)?;
            view.renderable.add_bindable(Bindable::Call(CallBinding::new(
                source,
                target.binding_target(),
                to,
            )));
        }
        Instruction::RefBinding { from } => {
            let node = target.require_node()?;
            view.renderable
                .add_bindable(Bindable::Ref(RefBinding::new(from, node)));
        }
        Instruction::SetProperty { value, to } => match target.binding_target() {
            BindingTarget::Node(node) => {
                ctx.scene
                    .node_mut(node)
                    .ok_or(ScenaError::StaleHandle("node"))?
                    .set_property(to, value.clone())?;
            }
            BindingTarget::Component(id) => {
                arena
                    .get_mut(id)
                    .ok_or(ScenaError::StaleHandle("component"))?
                    .vm_mut()
                    .set(to, value.clone(), BindingFlags::FROM_BIND);
            }
        },
        Instruction::SetAttribute { value, to } => {
            // Scene nodes carry no attribute bag; DOM-shaped surrogates
            // still have to be accepted for compiled templates to replay.
            log::trace!("ignoring set-attribute {}={:?} on scene target", to, value);
        }
        Instruction::HydrateElement {
            resource,
            instructions,
            parts: own_parts,
        } => {
            let node = target.require_node()?;
            let merged = merge_parts(parts, own_parts.as_ref());
            let id = hydrate_element(ctx, arena, resource, node, merged.as_ref())?;
            for nested in instructions {
                dispatch(ctx, arena, view, &DispatchTarget::Component(id), nested, parts)?;
            }
            view.renderable.add_bindable(Bindable::Component(id));
            view.renderable.add_attachable(id);
        }
        Instruction::HydrateAttribute {
            resource,
            instructions,
        } => {
            let vm = {
                let resolved = ctx.resources.require_attribute(resource)?;
                (resolved.vm_factory)()
            };
            let mut attribute = CustomAttribute::new(resource, vm);
            attribute.target = target.node();
            attribute.state = LifecycleState::Hydrated;
            attribute.vm.created();
            let id = arena.insert(Component::Attribute(attribute));
            for nested in instructions {
                dispatch(ctx, arena, view, &DispatchTarget::Component(id), nested, parts)?;
            }
            view.renderable.add_bindable(Bindable::Component(id));
            view.renderable.add_attachable(id);
        }
        Instruction::HydrateTemplateController {
            resource,
            definition,
            instructions,
            link,
            parts: own_parts,
        } => {
            let DispatchTarget::Fragment { id: fragment_id, .. } = target else {
                return Err(ScenaError::InvalidTarget(target.kind_name()));
            };
            let location = view
                .sequence
                .convert_to_render_location(ctx.scene, *fragment_id)?;
            log::debug!(
                "controller {:?} anchored at {:?} (index {:?})",
                resource,
                location,
                ctx.scene.child_index(location)
            );

            let mut factory = ViewFactory::new(Rc::clone(definition));
            if let Some(merged) = merge_parts(parts, own_parts.as_ref()) {
                factory = factory.with_parts(merged);
            }
            let vm = {
                let resolved = ctx.resources.require_attribute(resource)?;
                (resolved.vm_factory)()
            };
            let mut attribute = CustomAttribute::new(resource, vm);
            attribute.target = Some(location);
            attribute.controller = Some(TemplateController {
                factory,
                location,
                view: None,
                linked_to: if *link {
                    view.renderable.last_attachable()
                } else {
                    None
                },
            });
            attribute.state = LifecycleState::Hydrated;
            attribute.vm.created();
            let id = arena.insert(Component::Attribute(attribute));
            for nested in instructions {
                dispatch(ctx, arena, view, &DispatchTarget::Component(id), nested, parts)?;
            }
            view.renderable.add_bindable(Bindable::Component(id));
            view.renderable.add_attachable(id);
        }
        Instruction::RenderStrategy { name } => {
            let node = target.require_node()?;
            let strategy = ctx.strategies.resolve(ctx.resources, name)?;
            strategy(&mut StrategyInput {
                scene: ctx.scene,
                view,
                target: node,
                instruction,
            })?;
        }
        Instruction::LetElement {
            declarations,
            to_view_model,
        } => {
            let DispatchTarget::Fragment { id: fragment_id, .. } = target else {
                return Err(ScenaError::InvalidTarget(target.kind_name()));
            };
            // Let elements are non-visual; their placeholder leaves the scene
            view.sequence.remove_scene_node(ctx.scene, *fragment_id);
            let mut entries = Vec::with_capacity(declarations.len());
            for declaration in declarations {
                entries.push((
                    declaration
                        .from
                        .ensure_parsed(ctx.parser, ExpressionKind::Property)?,
                    declaration.to.clone(),
                ));
            }
            view.renderable
                .add_bindable(Bindable::Let(LetBinding::new(entries, *to_view_model)));
        }
    }
    Ok(())
}

fn merge_parts(
    inherited: Option<&TemplateParts>,
    own: Option<&TemplateParts>,
) -> Option<TemplateParts> {
    match (inherited, own) {
        (None, None) => None,
        (inherited, own) => {
            let mut merged = inherited.cloned().unwrap_or_default();
            if let Some(own) = own {
                for (name, part) in own {
                    merged.insert(name.clone(), Rc::clone(part));
                }
            }
            Some(merged)
        }
    }
}
