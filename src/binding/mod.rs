//! The binding layer: expressions, scopes, observers, events, and the live
//! binding objects that tie them to scene nodes.

pub mod binding;
pub mod events;
pub mod expression;
pub mod flags;
pub mod observer;
pub mod scope;

pub use binding::{
    Bindable, BindingTarget, CallBinding, LetBinding, ListenerBinding, PropertyBinding, RefBinding,
};
pub use events::{DispatchStrategy, EventManager, ListenerHandle, ResolvedListener, SceneEvent};
pub use expression::{
    CachingParser, Expression, ExpressionKind, ExpressionParser, SourceExpression,
};
pub use flags::{BindingFlags, BindingMode};
pub use observer::{ObserverLocator, PropertyObserver, SubscriptionId};
pub use scope::{BindingContext, OverrideContext, Scope};
