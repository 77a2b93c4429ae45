//! The bridge between an isolated global and its sandbox.
//!
//! Reads try the sandbox and fall back to the proxy global's own built-ins.
//! Writes always land on the sandbox. Enumeration lists the sandbox only.
//! The proxy global is the `holder` every callback receives; the sandbox is
//! reached through a weak link to the owning context.

use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{same_object, DeleteOutcome, JsObjectType};
use crate::runner::ds::object_property::PropertyAttributes;
use crate::runner::ds::operations::object::{
    delete_own, get_own_property, get_own_value, has_own_property, own_enumerable_keys, set,
};
use crate::runner::ds::property_handler::{AccessCheckFn, Intercepted, NamedPropertyHandler};
use crate::runner::ds::value::JsValue;

use super::context::ContextInner;

pub struct SandboxInterceptor {
    context: Weak<ContextInner>,
}

impl SandboxInterceptor {
    pub(crate) fn new(context: Weak<ContextInner>) -> Self {
        SandboxInterceptor { context }
    }

    /// The sandbox of a live context. Callbacks reaching a released context
    /// decline, leaving the proxy global to behave like a plain global.
    fn sandbox(&self, operation: &str, name: &str) -> Option<JsObjectType> {
        match self.context.upgrade() {
            Some(context) => {
                trace!(operation, name, "global property intercepted");
                Some(context.sandbox())
            }
            None => {
                warn!(operation, name, "interceptor called after its context was released");
                None
            }
        }
    }
}

fn is_read_only(object: &JsObjectType, name: &str) -> Result<bool, JErrorType> {
    Ok(get_own_property(object, name)?
        .map(|d| !d.is_writable())
        .unwrap_or(false))
}

impl NamedPropertyHandler for SandboxInterceptor {
    fn getter(&self, name: &str, holder: &JsObjectType) -> Result<Intercepted<JsValue>, JErrorType> {
        let sandbox = match self.sandbox("get", name) {
            Some(s) => s,
            None => return Ok(Intercepted::No),
        };
        if let Some(value) = get_own_value(&sandbox, name)? {
            // An alias of the sandbox seen from inside is the isolated global.
            let value = match &value {
                JsValue::Object(o) if same_object(o, &sandbox) => JsValue::Object(holder.clone()),
                _ => value,
            };
            return Ok(Intercepted::Yes(value));
        }
        Ok(match holder.borrow().get_real_property(name) {
            Some(value) => Intercepted::Yes(value),
            None => Intercepted::No,
        })
    }

    fn setter(
        &self,
        name: &str,
        value: JsValue,
        holder: &JsObjectType,
    ) -> Result<Intercepted<()>, JErrorType> {
        let sandbox = match self.sandbox("set", name) {
            Some(s) => s,
            None => return Ok(Intercepted::No),
        };
        let global_read_only = holder
            .borrow()
            .get_real_descriptor(name)
            .map(|d| !d.is_writable())
            .unwrap_or(false);
        if global_read_only || is_read_only(&sandbox, name)? {
            return Ok(Intercepted::Yes(()));
        }
        set(&sandbox, name, value)?;
        Ok(Intercepted::Yes(()))
    }

    fn query(
        &self,
        name: &str,
        holder: &JsObjectType,
    ) -> Result<Intercepted<PropertyAttributes>, JErrorType> {
        let sandbox = match self.sandbox("query", name) {
            Some(s) => s,
            None => return Ok(Intercepted::No),
        };
        if has_own_property(&sandbox, name)? || holder.borrow().has_real_property(name) {
            Ok(Intercepted::Yes(PropertyAttributes::all()))
        } else {
            Ok(Intercepted::No)
        }
    }

    fn deleter(&self, name: &str, holder: &JsObjectType) -> Result<Intercepted<bool>, JErrorType> {
        let sandbox = match self.sandbox("delete", name) {
            Some(s) => s,
            None => return Ok(Intercepted::No),
        };
        if delete_own(&sandbox, name)? == DeleteOutcome::Deleted {
            return Ok(Intercepted::Yes(true));
        }
        let outcome = holder.borrow_mut().delete_real_property(name);
        Ok(Intercepted::Yes(outcome == DeleteOutcome::Deleted))
    }

    fn enumerator(&self, _holder: &JsObjectType) -> Result<Intercepted<Vec<String>>, JErrorType> {
        let sandbox = match self.sandbox("enumerate", "") {
            Some(s) => s,
            None => return Ok(Intercepted::No),
        };
        Ok(Intercepted::Yes(own_enumerable_keys(&sandbox)?))
    }
}

/// The access check installed on every isolated global: the interceptor
/// enforces the boundary, so cross-realm access is always allowed.
pub(crate) fn allow_all() -> AccessCheckFn {
    Rc::new(|_, _| true)
}
