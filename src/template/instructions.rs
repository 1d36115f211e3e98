//! Compiled instructions and template definitions.
//!
//! An [`Instruction`] is one compiled directive for wiring a template
//! target: bind a property, listen for an event, hydrate a nested
//! component. A [`TemplateDefinition`] is the compiler's whole output for
//! one template: the declarative fragment, one instruction list per target
//! in declaration order, and a surrogate list applied to the host node.
//!
//! Binding instructions carry their source as a [`SourceExpression`]:
//! raw text is parsed on dispatch through the shared expression cache,
//! while pre-parsed expressions from a precompiled definition replay
//! without touching the parser.

use std::collections::HashMap;
use std::rc::Rc;

use crate::binding::events::DispatchStrategy;
use crate::binding::expression::SourceExpression;
use crate::binding::flags::BindingMode;
use crate::scene::PropertyValue;
use crate::template::fragment::TemplateFragment;

/// Named replacement templates threaded through template controllers.
pub type TemplateParts = HashMap<String, Rc<TemplateDefinition>>;

/// One `let` declaration: evaluate `from`, expose it as `to`.
#[derive(Debug, Clone)]
pub struct LetDeclaration {
    pub from: SourceExpression,
    pub to: String,
}

/// A compiled directive, dispatched by kind during rendering.
#[derive(Debug, Clone)]
pub enum Instruction {
    /// Interpolated text into the target's `text` property.
    TextBinding { from: SourceExpression },
    /// Expression into a target property, refreshed per the mode.
    PropertyBinding {
        from: SourceExpression,
        to: String,
        mode: BindingMode,
    },
    /// Expression into a target text-style property.
    StylePropertyBinding {
        from: SourceExpression,
        to: String,
        mode: BindingMode,
    },
    /// Call expression run when the named event reaches the target.
    ListenerBinding {
        from: SourceExpression,
        to: String,
        strategy: DispatchStrategy,
        prevent_default: bool,
    },
    /// Call expression re-run on every tick, result into the target property.
    CallBinding { from: SourceExpression, to: String },
    /// Hands the target node itself to the view-model property named `from`.
    RefBinding { from: String },
    /// Literal value applied once at render time.
    SetProperty { value: PropertyValue, to: String },
    /// Literal attribute applied once at render time. Scene nodes carry no
    /// attribute bag, so this lands as a trace-logged no-op.
    SetAttribute { value: String, to: String },
    /// Instantiate the named custom element against the target node.
    HydrateElement {
        resource: String,
        instructions: Vec<Instruction>,
        parts: Option<TemplateParts>,
    },
    /// Instantiate the named custom attribute against the target node.
    HydrateAttribute {
        resource: String,
        instructions: Vec<Instruction>,
    },
    /// Instantiate the named template controller at the target, replacing
    /// the target with a render-location marker.
    HydrateTemplateController {
        resource: String,
        definition: Rc<TemplateDefinition>,
        instructions: Vec<Instruction>,
        /// Chain to the previously rendered controller (else after if).
        link: bool,
        parts: Option<TemplateParts>,
    },
    /// Invoke the named external render strategy against the target.
    RenderStrategy { name: String },
    /// Non-visual declaration block: the target node is removed and each
    /// declaration becomes a computed binding.
    LetElement {
        declarations: Vec<LetDeclaration>,
        /// Write results into the view-model instead of the override layer.
        to_view_model: bool,
    },
}

impl Instruction {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Instruction::TextBinding { .. } => "text-binding",
            Instruction::PropertyBinding { .. } => "property-binding",
            Instruction::StylePropertyBinding { .. } => "style-property-binding",
            Instruction::ListenerBinding { .. } => "listener-binding",
            Instruction::CallBinding { .. } => "call-binding",
            Instruction::RefBinding { .. } => "ref-binding",
            Instruction::SetProperty { .. } => "set-property",
            Instruction::SetAttribute { .. } => "set-attribute",
            Instruction::HydrateElement { .. } => "hydrate-element",
            Instruction::HydrateAttribute { .. } => "hydrate-attribute",
            Instruction::HydrateTemplateController { .. } => "hydrate-template-controller",
            Instruction::RenderStrategy { .. } => "render-strategy",
            Instruction::LetElement { .. } => "let-element",
        }
    }
}

/// The compiler's output for one template, shared across instantiations.
#[derive(Debug, Clone, Default)]
pub struct TemplateDefinition {
    pub name: String,
    pub fragment: TemplateFragment,
    /// One list per target, in the fragment's document order.
    pub instructions: Vec<Vec<Instruction>>,
    /// Applied to the host node after all targets.
    pub surrogates: Vec<Instruction>,
}

impl TemplateDefinition {
    pub fn new(name: impl Into<String>, fragment: TemplateFragment) -> Self {
        Self {
            name: name.into(),
            fragment,
            instructions: Vec::new(),
            surrogates: Vec::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: Vec<Vec<Instruction>>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn with_surrogates(mut self, surrogates: Vec<Instruction>) -> Self {
        self.surrogates = surrogates;
        self
    }

    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }
}
