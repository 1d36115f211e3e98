use thiserror::Error;

/// Errors surfaced by the runtime.
///
/// Every variant is fatal and synchronous: these are programmer or compiler
/// errors, never recoverable runtime conditions. The only expected asynchronous
/// outcome anywhere in the crate is a pending detach task, which is awaited,
/// not raised.
#[derive(Error, Debug)]
pub enum ScenaError {
    /// A scene node type was registered twice under the same tag.
    #[error("\"{0}\" is already registered")]
    DuplicateRegistration(String),
    /// No scene node factory is registered for the tag.
    #[error("no scene node type registered for \"{0}\"")]
    UnknownTag(String),
    /// No component resource (element or attribute) matches the name.
    #[error("unknown component resource \"{0}\"")]
    UnknownResource(String),
    /// No render strategy matches the name.
    #[error("unknown render strategy \"{0}\"")]
    UnknownStrategy(String),
    /// A compiled definition was replayed against a fragment that exposes
    /// more targets than the definition has instruction lists.
    #[error("render mismatch: {targets} targets but only {instructions} instruction lists")]
    SurplusTargets { targets: usize, instructions: usize },
    /// A compiled definition was replayed against a fragment that exposes
    /// fewer targets than the definition has instruction lists.
    #[error("render mismatch: {instructions} instruction lists but only {targets} targets")]
    SurplusInstructions { targets: usize, instructions: usize },
    /// A value of the wrong semantic type was written through an observer.
    #[error("invalid value for \"{property}\": expected {expected}, got {actual}")]
    InvalidValue {
        property: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// A destination name that no property of the node kind answers to.
    #[error("unknown property \"{property}\" on {kind} node")]
    UnknownProperty {
        property: String,
        kind: &'static str,
    },
    /// A declarative node has children but its scene node cannot hold any.
    #[error("invalid object model: \"{tag}\" cannot have child nodes")]
    InvalidObjectModel { tag: String },
    /// A generational id referred to a slot that has been reused or freed.
    #[error("stale {0} reference")]
    StaleHandle(&'static str),
    /// An instruction was dispatched against a target it cannot apply to,
    /// e.g. a listener against a component.
    #[error("instruction cannot target {0}")]
    InvalidTarget(&'static str),
    /// The expression parser rejected a source expression.
    #[error("expression parse error: {0}")]
    Parse(String),
    /// A call expression named a method the view-model does not expose.
    #[error("view-model has no callable member \"{0}\"")]
    UnknownMember(String),
    /// A from-view capable binding was given a source expression that
    /// cannot receive a value.
    #[error("expression \"{0}\" cannot be assigned to")]
    NotAssignable(String),
}

pub type Result<T> = std::result::Result<T, ScenaError>;
