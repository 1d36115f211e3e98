//! Declarative template fragments.
//!
//! A fragment is the compiler's cloneable prototype of a template: a flat
//! arena of element and text nodes with parent/child links, some of them
//! flagged as instruction targets. Cloning the arena clones the whole tree
//! in one shot; instantiating it against a [`Scene`] happens in the node
//! sequence layer.
//!
//! [`Scene`]: crate::scene::Scene

/// Index of a node within its fragment. Only meaningful for the fragment
/// that produced it.
pub type FragmentNodeId = usize;

/// What a declarative node describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNodeKind {
    /// Instantiates through the node registry by tag.
    Element { tag: String },
    /// Instantiates as a literal text node.
    Text { content: String },
}

/// One declarative node: its kind, tree links, and whether the compiler
/// flagged it as an instruction target.
#[derive(Debug, Clone)]
pub struct TemplateNode {
    pub kind: TemplateNodeKind,
    pub target: bool,
    pub parent: Option<FragmentNodeId>,
    pub children: Vec<FragmentNodeId>,
}

impl TemplateNode {
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            TemplateNodeKind::Element { tag } => Some(tag),
            TemplateNodeKind::Text { .. } => None,
        }
    }
}

/// A compiler-produced declarative tree, cloned once per instantiation.
#[derive(Debug, Clone, Default)]
pub struct TemplateFragment {
    nodes: Vec<TemplateNode>,
    roots: Vec<FragmentNodeId>,
}

impl TemplateFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element node, as a root when `parent` is `None`.
    pub fn push_element(
        &mut self,
        tag: impl Into<String>,
        parent: Option<FragmentNodeId>,
    ) -> FragmentNodeId {
        self.push_node(
            TemplateNodeKind::Element { tag: tag.into() },
            parent,
        )
    }

    /// Append a text node, as a root when `parent` is `None`.
    pub fn push_text(
        &mut self,
        content: impl Into<String>,
        parent: Option<FragmentNodeId>,
    ) -> FragmentNodeId {
        self.push_node(
            TemplateNodeKind::Text {
                content: content.into(),
            },
            parent,
        )
    }

    fn push_node(&mut self, kind: TemplateNodeKind, parent: Option<FragmentNodeId>) -> FragmentNodeId {
        let id = self.nodes.len();
        self.nodes.push(TemplateNode {
            kind,
            target: false,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent_id) => self.nodes[parent_id].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Flag a node as an instruction target. The compiler flags targets in
    /// document order; one instruction list per flagged node.
    pub fn mark_target(&mut self, id: FragmentNodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.target = true;
        }
    }

    pub fn node(&self, id: FragmentNodeId) -> Option<&TemplateNode> {
        self.nodes.get(id)
    }

    pub fn roots(&self) -> &[FragmentNodeId] {
        &self.roots
    }

    pub fn children(&self, id: FragmentNodeId) -> &[FragmentNodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// All target nodes, recomputed from the live tree in document order.
    pub fn find_targets(&self) -> Vec<FragmentNodeId> {
        let mut targets = Vec::new();
        let mut stack: Vec<FragmentNodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.nodes[id].target {
                targets.push(id);
            }
            stack.extend(self.nodes[id].children.iter().rev());
        }
        targets
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_order_targets() {
        let mut fragment = TemplateFragment::new();
        let root = fragment.push_element("container", None);
        let first = fragment.push_element("sprite", Some(root));
        let nested = fragment.push_element("text", Some(first));
        let second = fragment.push_element("graphics", Some(root));

        fragment.mark_target(second);
        fragment.mark_target(nested);
        fragment.mark_target(root);

        // Depth-first document order, not marking order
        assert_eq!(fragment.find_targets(), vec![root, nested, second]);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut fragment = TemplateFragment::new();
        let root = fragment.push_element("container", None);

        let mut copy = fragment.clone();
        let extra = copy.push_text("hi", Some(root));
        copy.mark_target(extra);

        assert_eq!(fragment.len(), 1);
        assert_eq!(copy.len(), 2);
        assert!(fragment.find_targets().is_empty());
    }

    #[test]
    fn test_tree_links() {
        let mut fragment = TemplateFragment::new();
        let a = fragment.push_element("container", None);
        let b = fragment.push_element("sprite", Some(a));
        let t = fragment.push_text("label", Some(b));

        assert_eq!(fragment.roots(), &[a]);
        assert_eq!(fragment.children(a), &[b]);
        assert_eq!(fragment.node(t).and_then(|n| n.parent), Some(b));
        assert_eq!(fragment.node(b).and_then(|n| n.tag()), Some("sprite"));
        assert_eq!(fragment.node(t).and_then(|n| n.tag()), None);
    }
}
