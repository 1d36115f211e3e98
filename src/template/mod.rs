//! The template layer: declarative fragments, compiled instructions, node
//! sequences and views.

pub mod fragment;
pub mod instructions;
pub mod sequence;
pub mod view;

pub use fragment::{FragmentNodeId, TemplateFragment, TemplateNode, TemplateNodeKind};
pub use instructions::{Instruction, LetDeclaration, TemplateDefinition, TemplateParts};
pub use sequence::NodeSequence;
pub use view::{Renderable, View, ViewFactory};
