//! The scene node type registry.
//!
//! Templates name node types by tag (`"container"`, `"sprite"`, ...); the
//! registry maps each tag to a factory that produces a fresh [`SceneNode`]
//! for every instantiation. Registration happens once at startup and is
//! strict: registering a tag twice or asking for an unregistered tag is a
//! fatal error, never a silent overwrite or fallback.

use std::collections::HashMap;

use crate::error::{Result, ScenaError};
use crate::scene::node::{NodeKind, SceneNode};

/// Factory producing a fresh node for a tag. Boxed so applications can
/// register constructors that close over configuration.
pub type NodeFactory = Box<dyn Fn() -> SceneNode>;

/// Maps template tags to scene node factories.
pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

impl NodeRegistry {
    /// An empty registry with no tags.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry pre-loaded with the built-in node types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for kind in [
            NodeKind::Container,
            NodeKind::Sprite,
            NodeKind::Text,
            NodeKind::Graphics,
            NodeKind::Marker,
        ] {
            registry
                .factories
                .insert(kind.name().to_string(), Box::new(move || SceneNode::new(kind)));
        }
        registry
    }

    /// Register a factory under `tag`.
    ///
    /// Fails if the tag is already taken; existing registrations are never
    /// replaced.
    pub fn register(&mut self, tag: &str, factory: NodeFactory) -> Result<()> {
        if self.factories.contains_key(tag) {
            return Err(ScenaError::DuplicateRegistration(tag.to_string()));
        }
        log::trace!("registering scene node type {:?}", tag);
        self.factories.insert(tag.to_string(), factory);
        Ok(())
    }

    /// Instantiate a fresh node for `tag`.
    pub fn create(&self, tag: &str) -> Result<SceneNode> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| ScenaError::UnknownTag(tag.to_string()))?;
        Ok(factory())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
