//! End-to-end lifecycle tests through the application shell: start/stop
//! sequencing, asynchronous detach, template controllers, per-frame tick
//! reconciliation and event dispatch.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use scena::prelude::*;

/// Shared handles into a view-model's state, kept outside the arena so
/// tests can poke and inspect after the runtime takes ownership.
#[derive(Clone, Default)]
struct Recorder {
    values: Rc<RefCell<HashMap<String, PropertyValue>>>,
    log: Rc<RefCell<Vec<String>>>,
    detach: Rc<RefCell<Option<TaskController>>>,
}

impl Recorder {
    fn set(&self, name: &str, value: impl Into<PropertyValue>) {
        self.values
            .borrow_mut()
            .insert(name.to_string(), value.into());
    }

    fn get(&self, name: &str) -> PropertyValue {
        self.values
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(PropertyValue::Null)
    }

    fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn count(&self, entry: &str) -> usize {
        self.log.borrow().iter().filter(|e| *e == entry).count()
    }

    fn complete_detach(&self) {
        self.detach
            .borrow_mut()
            .take()
            .expect("no pending detach")
            .complete();
    }

    fn fail_detach(&self) {
        self.detach
            .borrow_mut()
            .take()
            .expect("no pending detach")
            .fail();
    }
}

struct RecordingVm {
    tag: &'static str,
    recorder: Recorder,
    async_detach: bool,
}

impl RecordingVm {
    fn push(&self, hook: &str) {
        self.recorder
            .log
            .borrow_mut()
            .push(format!("{}:{}", self.tag, hook));
    }
}

impl BindingContext for RecordingVm {
    fn get(&self, name: &str) -> PropertyValue {
        self.recorder.get(name)
    }

    fn set(&mut self, name: &str, value: PropertyValue, _flags: BindingFlags) {
        self.recorder.set(name, value);
    }

    fn invoke(
        &mut self,
        method: &str,
        args: &[PropertyValue],
        _flags: BindingFlags,
    ) -> Result<PropertyValue> {
        self.push(&format!("invoke:{}", method));
        if let Some(first) = args.first() {
            self.recorder.set("last_event", first.clone());
        }
        match method {
            "ack" => Ok(PropertyValue::Bool(true)),
            _ => Ok(PropertyValue::Null),
        }
    }
}

impl ViewModel for RecordingVm {
    fn created(&mut self) {
        self.push("created");
    }

    fn bound(&mut self, _flags: BindingFlags) {
        self.push("bound");
    }

    fn attaching(&mut self, _flags: BindingFlags) {
        self.push("attaching");
    }

    fn attached(&mut self, _flags: BindingFlags) {
        self.push("attached");
    }

    fn detaching(&mut self, _flags: BindingFlags) -> Option<LifecycleTask> {
        self.push("detaching");
        if self.async_detach {
            let (task, controller) = LifecycleTask::pending();
            *self.recorder.detach.borrow_mut() = Some(controller);
            Some(task)
        } else {
            None
        }
    }

    fn detached(&mut self, _flags: BindingFlags) {
        self.push("detached");
    }

    fn unbound(&mut self, _flags: BindingFlags) {
        self.push("unbound");
    }
}

fn vm_factory(
    tag: &'static str,
    recorder: &Recorder,
    async_detach: bool,
) -> Box<dyn Fn() -> Box<dyn ViewModel>> {
    let recorder = recorder.clone();
    Box::new(move || {
        Box::new(RecordingVm {
            tag,
            recorder: recorder.clone(),
            async_detach,
        })
    })
}

/// A container holding one text node bound to `"hp: ${hp}"`.
fn label_definition() -> Rc<TemplateDefinition> {
    let mut fragment = TemplateFragment::new();
    let root = fragment.push_element("container", None);
    let text = fragment.push_element("text", Some(root));
    fragment.mark_target(text);
    TemplateDefinition::new("label", fragment)
        .with_instructions(vec![vec![Instruction::TextBinding {
            from: "hp: ${hp}".into(),
        }]])
        .shared()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn shell_with_element(
    name: &'static str,
    definition: Rc<TemplateDefinition>,
    recorder: &Recorder,
    async_detach: bool,
) -> AppShell {
    init_logging();
    let shell = AppShell::new();
    let factory = vm_factory(name, recorder, async_detach);
    shell
        .with_runtime(|rt| {
            rt.resources
                .register_element(ElementDefinition::new(name, definition, factory))
        })
        .unwrap();
    shell
}

fn child_kinds(shell: &AppShell, parent: NodeId) -> Vec<NodeKind> {
    shell.with_runtime(|rt| {
        rt.scene
            .children(parent)
            .iter()
            .map(|id| rt.scene.node(*id).unwrap().kind())
            .collect()
    })
}

fn texts_under(shell: &AppShell, parent: NodeId) -> Vec<String> {
    shell.with_runtime(|rt| {
        rt.scene
            .children(parent)
            .iter()
            .filter_map(|id| {
                let node = rt.scene.node(*id).unwrap();
                (node.kind() == NodeKind::Text).then(|| node.text.clone())
            })
            .collect()
    })
}

fn root_under_stage(shell: &AppShell) -> NodeId {
    let stage = shell.stages()[0];
    shell.with_runtime(|rt| rt.scene.children(stage)[0])
}

#[test]
fn test_start_runs_hydrate_bind_attach_in_order() {
    let recorder = Recorder::default();
    recorder.set("hp", 10.0);
    let shell = shell_with_element("label", label_definition(), &recorder, false);
    shell.app(AppDefinition::new("label")).unwrap();

    // Registration alone runs nothing
    assert!(recorder.log().is_empty());
    assert!(!shell.is_started());

    shell.start().unwrap();
    assert!(shell.is_started());
    assert_eq!(
        recorder.log(),
        vec!["label:created", "label:bound", "label:attaching", "label:attached"]
    );

    let root = root_under_stage(&shell);
    assert_eq!(texts_under(&shell, root), vec!["hp: 10"]);
}

#[test]
fn test_shell_wraps_preconfigured_runtime() {
    init_logging();
    let recorder = Recorder::default();
    recorder.set("hp", 8.0);

    let mut runtime = Runtime::new();
    runtime
        .resources
        .register_element(ElementDefinition::new(
            "label",
            label_definition(),
            vm_factory("label", &recorder, false),
        ))
        .unwrap();

    let shell = AppShell::from_runtime(runtime);
    shell.app(AppDefinition::new("label")).unwrap();
    shell.start().unwrap();

    let root = root_under_stage(&shell);
    assert_eq!(texts_under(&shell, root), vec!["hp: 8"]);
}

#[test]
fn test_app_on_started_shell_starts_immediately() {
    let recorder = Recorder::default();
    recorder.set("hp", 1.0);
    let shell = shell_with_element("label", label_definition(), &recorder, false);

    shell.start().unwrap();
    assert!(recorder.log().is_empty());

    shell.app(AppDefinition::new("label")).unwrap();
    assert_eq!(recorder.count("label:attached"), 1);
    assert_eq!(shell.stages().len(), 1);
}

#[test]
fn test_stop_detaches_then_unbinds() {
    let recorder = Recorder::default();
    recorder.set("hp", 3.0);
    let shell = shell_with_element("label", label_definition(), &recorder, false);
    shell.app(AppDefinition::new("label")).unwrap();
    shell.start().unwrap();

    shell.stop().unwrap();
    assert!(!shell.is_started());

    let log = recorder.log();
    assert_eq!(
        &log[log.len() - 3..],
        ["label:detaching", "label:detached", "label:unbound"]
    );

    let stage = shell.stages()[0];
    assert!(child_kinds(&shell, stage).is_empty());
}

#[test]
fn test_pending_detach_defers_unbind() {
    let recorder = Recorder::default();
    recorder.set("hp", 3.0);
    let shell = shell_with_element("label", label_definition(), &recorder, true);
    shell.app(AppDefinition::new("label")).unwrap();
    shell.start().unwrap();

    shell.stop().unwrap();
    assert_eq!(recorder.count("label:detached"), 1);
    assert_eq!(recorder.count("label:unbound"), 0);

    // Scene nodes leave immediately; only unbind waits on the task
    let stage = shell.stages()[0];
    assert!(child_kinds(&shell, stage).is_empty());

    recorder.complete_detach();
    assert_eq!(recorder.count("label:unbound"), 1);
}

#[test]
fn test_failed_detach_still_unbinds() {
    let recorder = Recorder::default();
    let shell = shell_with_element("label", label_definition(), &recorder, true);
    shell.app(AppDefinition::new("label")).unwrap();
    shell.start().unwrap();

    shell.stop().unwrap();
    recorder.fail_detach();
    assert_eq!(recorder.count("label:unbound"), 1);
}

#[test]
fn test_restart_rebinds_and_remounts() {
    let recorder = Recorder::default();
    recorder.set("hp", 5.0);
    let shell = shell_with_element("label", label_definition(), &recorder, false);
    shell.app(AppDefinition::new("label")).unwrap();

    shell.start().unwrap();
    shell.stop().unwrap();
    shell.start().unwrap();

    assert_eq!(recorder.count("label:created"), 1);
    assert_eq!(recorder.count("label:bound"), 2);
    assert_eq!(recorder.count("label:attached"), 2);

    let stage = shell.stages()[0];
    assert_eq!(child_kinds(&shell, stage), vec![NodeKind::Container]);
}

#[test]
fn test_tick_refreshes_text_binding() {
    let recorder = Recorder::default();
    recorder.set("hp", 10.0);
    let shell = shell_with_element("label", label_definition(), &recorder, false);
    shell.app(AppDefinition::new("label")).unwrap();
    shell.start().unwrap();

    let root = root_under_stage(&shell);
    assert_eq!(texts_under(&shell, root), vec!["hp: 10"]);

    recorder.set("hp", 42.0);
    assert_eq!(texts_under(&shell, root), vec!["hp: 10"]);

    shell.tick().unwrap();
    assert_eq!(texts_under(&shell, root), vec!["hp: 42"]);
}

#[test]
fn test_instruction_target_count_mismatch() {
    let recorder = Recorder::default();
    let shell = AppShell::new();

    let mut fragment = TemplateFragment::new();
    let root = fragment.push_element("container", None);
    fragment.mark_target(root);
    let surplus_instructions = TemplateDefinition::new("surplus-instructions", fragment.clone())
        .with_instructions(vec![vec![], vec![]])
        .shared();
    let surplus_targets = TemplateDefinition::new("surplus-targets", fragment)
        .with_instructions(vec![])
        .shared();

    shell
        .with_runtime(|rt| {
            rt.resources.register_element(ElementDefinition::new(
                "surplus-instructions",
                surplus_instructions,
                vm_factory("surplus-instructions", &recorder, false),
            ))?;
            rt.resources.register_element(ElementDefinition::new(
                "surplus-targets",
                surplus_targets,
                vm_factory("surplus-targets", &recorder, false),
            ))
        })
        .unwrap();

    let (too_many, too_few) = shell.with_runtime(|rt| {
        let host = rt.scene.create(NodeKind::Container);
        (
            rt.hydrate_element("surplus-instructions", host),
            rt.hydrate_element("surplus-targets", host),
        )
    });
    assert!(matches!(
        too_many,
        Err(ScenaError::SurplusInstructions {
            targets: 1,
            instructions: 2,
        })
    ));
    assert!(matches!(
        too_few,
        Err(ScenaError::SurplusTargets {
            targets: 1,
            instructions: 0,
        })
    ));
}

#[test]
fn test_duplicate_registrations_rejected() {
    let recorder = Recorder::default();
    let shell = shell_with_element("label", label_definition(), &recorder, false);

    let element_err = shell.with_runtime(|rt| {
        rt.resources.register_element(ElementDefinition::new(
            "label",
            label_definition(),
            vm_factory("label", &recorder, false),
        ))
    });
    assert!(matches!(
        element_err,
        Err(ScenaError::DuplicateRegistration(name)) if name == "label"
    ));

    let tag_err = shell.with_runtime(|rt| {
        rt.nodes.register(
            "container",
            Box::new(|| SceneNode::new(NodeKind::Container)),
        )
    });
    assert!(matches!(
        tag_err,
        Err(ScenaError::DuplicateRegistration(tag)) if tag == "container"
    ));
}

#[test]
fn test_wrong_value_type_fails_bind() {
    let recorder = Recorder::default();
    recorder.set("label", "abc");

    let mut fragment = TemplateFragment::new();
    let root = fragment.push_element("container", None);
    fragment.mark_target(root);
    let definition = TemplateDefinition::new("badge", fragment)
        .with_instructions(vec![vec![Instruction::PropertyBinding {
            from: "label".into(),
            to: "x".into(),
            mode: BindingMode::TO_VIEW,
        }]])
        .shared();

    let shell = shell_with_element("badge", definition, &recorder, false);
    shell.app(AppDefinition::new("badge")).unwrap();

    let err = shell.start().unwrap_err();
    assert!(matches!(
        err,
        ScenaError::InvalidValue {
            property,
            expected: "number",
            actual: "text",
        } if property == "x"
    ));

    // Attach never ran
    let stage = shell.stages()[0];
    assert!(child_kinds(&shell, stage).is_empty());
    assert_eq!(recorder.count("badge:bound"), 0);
}

/// Single-text inner template for controller views.
fn inner_text(name: &str, content: &str) -> Rc<TemplateDefinition> {
    let mut fragment = TemplateFragment::new();
    fragment.push_text(content, None);
    TemplateDefinition::new(name, fragment).shared()
}

#[test]
fn test_template_controller_toggles_and_keeps_sibling_index() {
    let outer = Recorder::default();
    let when = Recorder::default();
    outer.set("show", true);

    let mut fragment = TemplateFragment::new();
    let root = fragment.push_element("container", None);
    fragment.push_element("sprite", Some(root));
    let slot = fragment.push_element("graphics", Some(root));
    fragment.push_element("sprite", Some(root));
    fragment.mark_target(slot);

    let definition = TemplateDefinition::new("panel", fragment)
        .with_instructions(vec![vec![Instruction::HydrateTemplateController {
            resource: "when".into(),
            definition: inner_text("panel-body", "body"),
            instructions: vec![Instruction::PropertyBinding {
                from: "show".into(),
                to: "value".into(),
                mode: BindingMode::TO_VIEW,
            }],
            link: false,
            parts: None,
        }]])
        .shared();

    let shell = shell_with_element("panel", definition, &outer, false);
    shell
        .with_runtime(|rt| {
            rt.resources
                .register_attribute(AttributeDefinition::new("when", vm_factory("when", &when, false)))
        })
        .unwrap();
    shell.app(AppDefinition::new("panel")).unwrap();
    shell.start().unwrap();

    // The target slot became a marker at its original index, with the
    // controller's view mounted just before it
    let root = root_under_stage(&shell);
    assert_eq!(
        child_kinds(&shell, root),
        vec![NodeKind::Sprite, NodeKind::Text, NodeKind::Marker, NodeKind::Sprite]
    );
    assert_eq!(texts_under(&shell, root), vec!["body"]);

    outer.set("show", false);
    shell.tick().unwrap();
    assert_eq!(
        child_kinds(&shell, root),
        vec![NodeKind::Sprite, NodeKind::Marker, NodeKind::Sprite]
    );

    outer.set("show", true);
    shell.tick().unwrap();
    assert_eq!(
        child_kinds(&shell, root),
        vec![NodeKind::Sprite, NodeKind::Text, NodeKind::Marker, NodeKind::Sprite]
    );
}

#[test]
fn test_controller_reshow_rebinds_recreated_nodes() {
    let outer = Recorder::default();
    let when = Recorder::default();
    outer.set("show", true);
    when.set("hp", 5.0);

    let mut inner = TemplateFragment::new();
    let text = inner.push_element("text", None);
    inner.mark_target(text);
    let body = TemplateDefinition::new("gauge-body", inner)
        .with_instructions(vec![vec![Instruction::TextBinding {
            from: "hp: ${hp}".into(),
        }]])
        .shared();

    let mut fragment = TemplateFragment::new();
    let root = fragment.push_element("container", None);
    let slot = fragment.push_element("graphics", Some(root));
    fragment.mark_target(slot);
    let definition = TemplateDefinition::new("gauge", fragment)
        .with_instructions(vec![vec![Instruction::HydrateTemplateController {
            resource: "when".into(),
            definition: body,
            instructions: vec![Instruction::PropertyBinding {
                from: "show".into(),
                to: "value".into(),
                mode: BindingMode::TO_VIEW,
            }],
            link: false,
            parts: None,
        }]])
        .shared();

    let shell = shell_with_element("gauge", definition, &outer, false);
    shell
        .with_runtime(|rt| {
            rt.resources
                .register_attribute(AttributeDefinition::new("when", vm_factory("when", &when, false)))
        })
        .unwrap();
    shell.app(AppDefinition::new("gauge")).unwrap();
    shell.start().unwrap();

    let root = root_under_stage(&shell);
    assert_eq!(texts_under(&shell, root), vec!["hp: 5"]);

    // Hide and show again: the fresh view's text node may land in a
    // reclaimed arena slot, and it must still receive the bound value.
    outer.set("show", false);
    shell.tick().unwrap();
    assert!(texts_under(&shell, root).is_empty());

    outer.set("show", true);
    shell.tick().unwrap();
    assert_eq!(texts_under(&shell, root), vec!["hp: 5"]);
}

#[test]
fn test_linked_controller_inverts_condition() {
    let outer = Recorder::default();
    let when = Recorder::default();
    outer.set("show", true);

    let mut fragment = TemplateFragment::new();
    let root = fragment.push_element("container", None);
    let then_slot = fragment.push_element("graphics", Some(root));
    let else_slot = fragment.push_element("graphics", Some(root));
    fragment.mark_target(then_slot);
    fragment.mark_target(else_slot);

    let definition = TemplateDefinition::new("either", fragment)
        .with_instructions(vec![
            vec![Instruction::HydrateTemplateController {
                resource: "when".into(),
                definition: inner_text("then-body", "then"),
                instructions: vec![Instruction::PropertyBinding {
                    from: "show".into(),
                    to: "value".into(),
                    mode: BindingMode::TO_VIEW,
                }],
                link: false,
                parts: None,
            }],
            vec![Instruction::HydrateTemplateController {
                resource: "when".into(),
                definition: inner_text("else-body", "else"),
                instructions: vec![],
                link: true,
                parts: None,
            }],
        ])
        .shared();

    let shell = shell_with_element("either", definition, &outer, false);
    shell
        .with_runtime(|rt| {
            rt.resources
                .register_attribute(AttributeDefinition::new("when", vm_factory("when", &when, false)))
        })
        .unwrap();
    shell.app(AppDefinition::new("either")).unwrap();
    shell.start().unwrap();

    let root = root_under_stage(&shell);
    assert_eq!(texts_under(&shell, root), vec!["then"]);

    outer.set("show", false);
    shell.tick().unwrap();
    assert_eq!(texts_under(&shell, root), vec!["else"]);
}

#[test]
fn test_event_dispatch_bubbles_and_prevents_default() {
    let recorder = Recorder::default();

    let mut fragment = TemplateFragment::new();
    let root = fragment.push_element("container", None);
    fragment.push_element("text", Some(root));
    fragment.mark_target(root);

    let definition = TemplateDefinition::new("button", fragment)
        .with_instructions(vec![vec![
            Instruction::ListenerBinding {
                from: "fire($event)".into(),
                to: "tap".into(),
                strategy: DispatchStrategy::Bubbling,
                prevent_default: true,
            },
            Instruction::ListenerBinding {
                from: "ack()".into(),
                to: "ok".into(),
                strategy: DispatchStrategy::Bubbling,
                prevent_default: true,
            },
            Instruction::ListenerBinding {
                from: "fire()".into(),
                to: "press".into(),
                strategy: DispatchStrategy::Direct,
                prevent_default: false,
            },
        ]])
        .shared();

    let shell = shell_with_element("button", definition, &recorder, false);
    shell.app(AppDefinition::new("button")).unwrap();
    shell.start().unwrap();

    let root = root_under_stage(&shell);
    let text = shell.with_runtime(|rt| rt.scene.children(root)[0]);

    // Bubbles from the text leaf to the listener on the container; the
    // handler returned null, so the listener prevents the default
    let mut tap = SceneEvent::new("tap", text, PropertyValue::Number(7.0));
    shell.dispatch_event(&mut tap).unwrap();
    assert_eq!(recorder.count("button:invoke:fire"), 1);
    assert!(tap.default_prevented());
    assert_eq!(recorder.get("last_event"), PropertyValue::Number(7.0));

    // Handler returning true keeps the default
    let mut ok = SceneEvent::new("ok", text, PropertyValue::Null);
    shell.dispatch_event(&mut ok).unwrap();
    assert_eq!(recorder.count("button:invoke:ack"), 1);
    assert!(!ok.default_prevented());

    // Direct listeners only fire when the event targets their own node
    let mut missed = SceneEvent::new("press", text, PropertyValue::Null);
    shell.dispatch_event(&mut missed).unwrap();
    assert_eq!(recorder.count("button:invoke:fire"), 1);

    let mut hit = SceneEvent::new("press", root, PropertyValue::Null);
    shell.dispatch_event(&mut hit).unwrap();
    assert_eq!(recorder.count("button:invoke:fire"), 2);
}

#[test]
fn test_discard_releases_observers_and_listeners() {
    let recorder = Recorder::default();
    recorder.set("hp", 2.0);

    let mut fragment = TemplateFragment::new();
    let root = fragment.push_element("container", None);
    let text = fragment.push_element("text", Some(root));
    fragment.mark_target(root);
    fragment.mark_target(text);
    let definition = TemplateDefinition::new("meter", fragment)
        .with_instructions(vec![
            vec![Instruction::ListenerBinding {
                from: "fire()".into(),
                to: "tap".into(),
                strategy: DispatchStrategy::Bubbling,
                prevent_default: false,
            }],
            vec![Instruction::TextBinding {
                from: "hp: ${hp}".into(),
            }],
        ])
        .shared();

    let shell = shell_with_element("meter", definition, &recorder, false);
    let id = shell
        .with_runtime(|rt| {
            let host = rt.scene.create(NodeKind::Container);
            let id = rt.hydrate_element("meter", host)?;
            rt.bind(id, BindingFlags::empty())?;
            Ok::<_, ScenaError>(id)
        })
        .unwrap();

    shell.with_runtime(|rt| {
        assert_eq!(rt.events.listener_count(), 1);
        assert!(rt.observers.observer_count() > 0);

        rt.discard_component(id).unwrap();
        assert_eq!(rt.events.listener_count(), 0);
        assert_eq!(rt.observers.observer_count(), 0);
        assert!(rt.arena.is_empty());
    });
}

/// Stands in for a template compiler that parses ahead of render time.
struct PreparsedText;

impl Expression for PreparsedText {
    fn evaluate(&self, _scope: &mut Scope<'_>, _flags: BindingFlags) -> Result<PropertyValue> {
        Ok(PropertyValue::Text("ready".into()))
    }

    fn assign(
        &self,
        _scope: &mut Scope<'_>,
        _value: PropertyValue,
        _flags: BindingFlags,
    ) -> Result<()> {
        Err(ScenaError::NotAssignable(self.text().to_string()))
    }

    fn text(&self) -> &str {
        "${never reparsed"
    }
}

#[test]
fn test_preparsed_instruction_source_renders_without_parsing() {
    let recorder = Recorder::default();

    let mut fragment = TemplateFragment::new();
    let root = fragment.push_element("container", None);
    let text = fragment.push_element("text", Some(root));
    fragment.mark_target(text);

    let source: Rc<dyn Expression> = Rc::new(PreparsedText);
    let definition = TemplateDefinition::new("status", fragment)
        .with_instructions(vec![vec![Instruction::TextBinding {
            from: source.into(),
        }]])
        .shared();

    let shell = shell_with_element("status", definition, &recorder, false);
    shell.app(AppDefinition::new("status")).unwrap();
    // The source text is deliberately unparseable, so only the pre-parsed
    // arm can have produced the rendered value.
    shell.start().unwrap();

    let root = root_under_stage(&shell);
    assert_eq!(texts_under(&shell, root), vec!["ready"]);
}

#[test]
fn test_shells_are_independent() {
    let first = Recorder::default();
    let second = Recorder::default();
    first.set("hp", 1.0);
    second.set("hp", 2.0);

    let a = shell_with_element("label", label_definition(), &first, false);
    let b = shell_with_element("label", label_definition(), &second, false);
    a.app(AppDefinition::new("label")).unwrap();
    b.app(AppDefinition::new("label")).unwrap();

    a.start().unwrap();
    assert!(a.is_started());
    assert!(!b.is_started());
    assert_eq!(first.count("label:attached"), 1);
    assert!(second.log().is_empty());

    b.start().unwrap();
    let root_a = root_under_stage(&a);
    let root_b = root_under_stage(&b);
    assert_eq!(texts_under(&a, root_a), vec!["hp: 1"]);
    assert_eq!(texts_under(&b, root_b), vec!["hp: 2"]);
}
