//! Isolated contexts.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::get;
use crate::runner::ds::property_handler::GlobalTemplate;
use crate::runner::ds::realm::{Realm, RealmId};
use crate::runner::ds::value::JsValue;
use crate::runner::isolate::Isolate;

use super::error::ContextifyError;
use super::interceptor::{allow_all, SandboxInterceptor};

pub(crate) struct ContextInner {
    realm: Rc<Realm>,
    sandbox: JsObjectType,
}

impl ContextInner {
    pub(crate) fn sandbox(&self) -> JsObjectType {
        self.sandbox.clone()
    }
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        debug!(realm = %self.realm.id(), "isolated context released");
    }
}

/// A fresh global scope whose globals live on a host-owned sandbox object.
///
/// Cloning is cheap and yields a handle to the same context. The underlying
/// realm is released as soon as the last handle is dropped; a context also
/// keeps its sandbox alive.
#[derive(Clone)]
pub struct IsolatedContext {
    isolate: Rc<Isolate>,
    inner: Rc<ContextInner>,
}

impl IsolatedContext {
    /// Creates a context backed by `sandbox`, which must be an object.
    pub fn new(isolate: &Rc<Isolate>, sandbox: &JsValue) -> Result<Self, ContextifyError> {
        let sandbox = match sandbox {
            JsValue::Object(o) => o.clone(),
            other => {
                return Err(ContextifyError::Argument(format!(
                    "sandbox must be an object, got {}",
                    describe(other)
                )))
            }
        };
        let class_name = constructor_name(&sandbox);
        let inner = Rc::new_cyclic(|weak| {
            let template = GlobalTemplate::new(class_name)
                .with_named_handler(Rc::new(SandboxInterceptor::new(weak.clone())))
                .with_access_check(allow_all());
            ContextInner {
                realm: isolate.new_scope(template),
                sandbox,
            }
        });
        debug!(realm = %inner.realm.id(), "isolated context created");
        Ok(IsolatedContext {
            isolate: isolate.clone(),
            inner,
        })
    }

    /// The isolated global object as script code inside the context sees it.
    pub fn global(&self) -> JsObjectType {
        self.inner.realm.global_object()
    }

    pub fn sandbox(&self) -> JsObjectType {
        self.inner.sandbox()
    }

    pub fn id(&self) -> RealmId {
        self.inner.realm.id()
    }

    pub fn isolate(&self) -> &Rc<Isolate> {
        &self.isolate
    }

    pub(crate) fn realm(&self) -> &Rc<Realm> {
        &self.inner.realm
    }

    /// Whether two handles refer to the same context.
    pub fn ptr_eq(&self, other: &IsolatedContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for IsolatedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolatedContext")
            .field("realm", &self.inner.realm.id())
            .finish()
    }
}

/// Name of the sandbox's constructor, used as the class name of the
/// isolated global.
fn constructor_name(sandbox: &JsObjectType) -> String {
    let name = match get(sandbox, "constructor") {
        Ok(JsValue::Object(f)) => {
            let name = f.borrow().as_function().map(|kind| kind.name().to_string());
            name
        }
        _ => None,
    };
    match name {
        Some(name) if !name.is_empty() => name,
        _ => "Object".to_string(),
    }
}

pub(crate) fn describe(value: &JsValue) -> &'static str {
    match value {
        JsValue::Undefined => "undefined",
        JsValue::Null => "null",
        JsValue::Boolean(_) => "a boolean",
        JsValue::String(_) => "a string",
        JsValue::Number(_) => "a number",
        JsValue::Object(_) => "an object",
    }
}
