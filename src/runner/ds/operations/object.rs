//! Interceptable object operations.
//!
//! These are what script code goes through: each one offers the access to the
//! object's named property handler first and only falls back to the real
//! own-property primitives (and the prototype chain) when the handler
//! declines.

use std::collections::HashSet;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{DeleteOutcome, JsObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::property_handler::{Intercepted, NamedPropertyHandler};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

fn handler_of(obj: &JsObjectType) -> Option<Rc<dyn NamedPropertyHandler>> {
    obj.borrow().base.named_handler()
}

pub fn get_prototype_of(obj: &JsObjectType) -> Option<JsObjectType> {
    obj.borrow().base.prototype()
}

pub fn get(obj: &JsObjectType, name: &str) -> Result<JsValue, JErrorType> {
    if let Some(handler) = handler_of(obj) {
        if let Intercepted::Yes(v) = handler.getter(name, obj)? {
            return Ok(v);
        }
    }
    let (own, prototype) = {
        let o = obj.borrow();
        (o.get_real_property(name), o.base.prototype())
    };
    match own {
        Some(v) => Ok(v),
        None => match prototype {
            Some(p) => get(&p, name),
            None => Ok(JsValue::Undefined),
        },
    }
}

fn inherited_read_only(start: Option<JsObjectType>, name: &str) -> bool {
    let mut current = start;
    while let Some(o) = current {
        let next = {
            let o = o.borrow();
            if let Some(d) = o.get_real_descriptor(name) {
                return !d.is_writable();
            }
            o.base.prototype()
        };
        current = next;
    }
    false
}

/// Ordinary `[[Set]]`. Returns `false` when the write was refused.
pub fn set(obj: &JsObjectType, name: &str, value: JsValue) -> Result<bool, JErrorType> {
    if let Some(handler) = handler_of(obj) {
        if let Intercepted::Yes(()) = handler.setter(name, value.clone(), obj)? {
            return Ok(true);
        }
    }
    let (has_own, prototype) = {
        let o = obj.borrow();
        (o.has_real_property(name), o.base.prototype())
    };
    if !has_own && inherited_read_only(prototype, name) {
        return Ok(false);
    }
    obj.borrow_mut().set_real_property(name, value)
}

pub fn has_property(obj: &JsObjectType, name: &str) -> Result<bool, JErrorType> {
    if has_own_property(obj, name)? {
        return Ok(true);
    }
    match get_prototype_of(obj) {
        Some(p) => has_property(&p, name),
        None => Ok(false),
    }
}

pub fn has_own_property(obj: &JsObjectType, name: &str) -> Result<bool, JErrorType> {
    if let Some(handler) = handler_of(obj) {
        if let Intercepted::Yes(_) = handler.query(name, obj)? {
            return Ok(true);
        }
    }
    Ok(obj.borrow().has_real_property(name))
}

pub fn get_own_property(
    obj: &JsObjectType,
    name: &str,
) -> Result<Option<PropertyDescriptor>, JErrorType> {
    if let Some(handler) = handler_of(obj) {
        if let Intercepted::Yes(attributes) = handler.query(name, obj)? {
            let value = match handler.getter(name, obj)? {
                Intercepted::Yes(v) => v,
                Intercepted::No => obj
                    .borrow()
                    .get_real_property(name)
                    .unwrap_or(JsValue::Undefined),
            };
            return Ok(Some(PropertyDescriptor::new(value, attributes)));
        }
    }
    Ok(obj.borrow().get_real_descriptor(name))
}

pub fn get_own_value(obj: &JsObjectType, name: &str) -> Result<Option<JsValue>, JErrorType> {
    Ok(get_own_property(obj, name)?.map(|d| d.value))
}

pub fn delete(obj: &JsObjectType, name: &str) -> Result<bool, JErrorType> {
    Ok(match delete_own(obj, name)? {
        DeleteOutcome::Deleted | DeleteOutcome::Absent => true,
        DeleteOutcome::Refused => false,
    })
}

pub fn delete_own(obj: &JsObjectType, name: &str) -> Result<DeleteOutcome, JErrorType> {
    if let Some(handler) = handler_of(obj) {
        if let Intercepted::Yes(deleted) = handler.deleter(name, obj)? {
            return Ok(if deleted {
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::Refused
            });
        }
    }
    Ok(obj.borrow_mut().delete_real_property(name))
}

pub fn own_enumerable_keys(obj: &JsObjectType) -> Result<Vec<String>, JErrorType> {
    if let Some(handler) = handler_of(obj) {
        if let Intercepted::Yes(keys) = handler.enumerator(obj)? {
            return Ok(keys);
        }
    }
    Ok(obj.borrow().real_own_enumerable_keys())
}

pub fn own_property_names(obj: &JsObjectType) -> Result<Vec<String>, JErrorType> {
    if let Some(handler) = handler_of(obj) {
        if let Intercepted::Yes(keys) = handler.enumerator(obj)? {
            return Ok(keys);
        }
    }
    Ok(obj.borrow().real_own_keys(false))
}

/// Keys visited by `for-in`: own enumerable keys, then those of each
/// prototype not already seen.
pub fn for_in_keys(obj: &JsObjectType) -> Result<Vec<String>, JErrorType> {
    let mut seen = HashSet::new();
    let mut keys = vec![];
    let mut current = Some(obj.clone());
    while let Some(o) = current {
        for key in own_enumerable_keys(&o)? {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
        for key in o.borrow().real_own_keys(false) {
            seen.insert(key);
        }
        current = get_prototype_of(&o);
    }
    Ok(keys)
}

pub fn define_property(
    obj: &JsObjectType,
    name: &str,
    setter: PropertyDescriptorSetter,
) -> Result<bool, JErrorType> {
    obj.borrow_mut().define_own_property(name, setter)
}

/// Walks the prototype chain of `obj` looking for `prototype`.
pub fn ordinary_has_instance(prototype: &JsObjectType, obj: &JsObjectType) -> bool {
    let mut current = get_prototype_of(obj);
    while let Some(p) = current {
        if Rc::ptr_eq(&p, prototype) {
            return true;
        }
        current = get_prototype_of(&p);
    }
    false
}

/// Runs the access check of a global object owned by another realm.
pub fn check_access(accessor: RealmId, obj: &JsObjectType) -> Result<(), JErrorType> {
    let (check, owner) = {
        let o = obj.borrow();
        (o.base.access_check(), o.base.realm_id())
    };
    if let (Some(check), Some(owner)) = (check, owner) {
        if owner != accessor && !check(accessor, obj) {
            return Err(JErrorType::TypeError(
                "Blocked access to the global object of another context".to_string(),
            ));
        }
    }
    Ok(())
}
