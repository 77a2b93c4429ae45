//! Embedder hooks on object property access.
//!
//! A [`GlobalTemplate`] describes how the global object of a fresh realm is
//! built. When it carries a [`NamedPropertyHandler`], every named lookup on
//! that global is offered to the handler first; a handler answering
//! [`Intercepted::No`] lets the ordinary algorithm (own real property, then
//! the prototype chain) continue.

use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::PropertyAttributes;
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

/// Answer of an interceptor callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Intercepted<T> {
    Yes(T),
    No,
}

/// Callbacks consulted before ordinary named property access on the holder.
///
/// `holder` is the object the access was made on. Implementations must not
/// call back into the interceptable operations on `holder` itself; the real
/// primitives on [`ObjectType`](crate::runner::ds::object::ObjectType) are
/// available for that.
pub trait NamedPropertyHandler {
    fn getter(&self, name: &str, holder: &JsObjectType) -> Result<Intercepted<JsValue>, JErrorType>;

    fn setter(
        &self,
        name: &str,
        value: JsValue,
        holder: &JsObjectType,
    ) -> Result<Intercepted<()>, JErrorType>;

    fn query(
        &self,
        name: &str,
        holder: &JsObjectType,
    ) -> Result<Intercepted<PropertyAttributes>, JErrorType>;

    fn deleter(&self, name: &str, holder: &JsObjectType) -> Result<Intercepted<bool>, JErrorType>;

    fn enumerator(&self, holder: &JsObjectType) -> Result<Intercepted<Vec<String>>, JErrorType>;
}

/// Decides whether code running in `accessor` may touch `target`, a global
/// object owned by a different realm.
pub type AccessCheckFn = Rc<dyn Fn(RealmId, &JsObjectType) -> bool>;

pub struct GlobalTemplate {
    pub class_name: String,
    pub named_handler: Option<Rc<dyn NamedPropertyHandler>>,
    pub access_check: Option<AccessCheckFn>,
}

impl GlobalTemplate {
    pub fn new(class_name: impl Into<String>) -> Self {
        GlobalTemplate {
            class_name: class_name.into(),
            named_handler: None,
            access_check: None,
        }
    }

    pub fn with_named_handler(mut self, handler: Rc<dyn NamedPropertyHandler>) -> Self {
        self.named_handler = Some(handler);
        self
    }

    pub fn with_access_check(mut self, check: AccessCheckFn) -> Self {
        self.access_check = Some(check);
        self
    }
}

impl Default for GlobalTemplate {
    fn default() -> Self {
        GlobalTemplate::new("global")
    }
}
