//! Object built-in.
//!
//! Provides the Object constructor, its reflection statics and the methods of
//! `Object.prototype`. The statics go through the interceptable operations,
//! so `Object.keys(this)` on a contextified global lists what the sandbox
//! reports.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{object_create, JsObjectType};
use crate::runner::ds::object_property::PropertyDescriptorSetter;
use crate::runner::ds::operations::object::{
    check_access, define_property, get, get_own_property, get_prototype_of, has_own_property,
    has_property, own_enumerable_keys, own_property_names, set,
};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::{arg, this_object};

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object")
        .with_no_prototype()
        .with_constructor(object_constructor)
        .add_method("keys", object_keys)
        .add_method("getOwnPropertyNames", object_get_own_property_names)
        .add_method("defineProperty", object_define_property)
        .add_method("getOwnPropertyDescriptor", object_get_own_property_descriptor)
        .add_method("getPrototypeOf", object_get_prototype_of)
        .add_method("create", object_create_with)
        .add_prototype_method("hasOwnProperty", object_has_own_property)
        .add_prototype_method("toString", object_to_string)
        .add_prototype_method("valueOf", object_value_of);

    registry.register_object(object);
}

/// Object constructor.
fn object_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match arg(&args, 0) {
        JsValue::Null | JsValue::Undefined => Ok(JsValue::Object(ctx.new_object())),
        // Primitives are returned as they are, there are no wrapper objects.
        other => Ok(other),
    }
}

fn require_object(value: &JsValue) -> Result<Option<JsObjectType>, JErrorType> {
    match value {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(
            "Cannot convert undefined or null to object".to_string(),
        )),
        JsValue::Object(o) => Ok(Some(o.clone())),
        _ => Ok(None),
    }
}

fn string_index_keys(value: &JsValue) -> Vec<String> {
    match value {
        JsValue::String(s) => (0..s.encode_utf16().count()).map(|i| i.to_string()).collect(),
        _ => vec![],
    }
}

fn keys_to_array(ctx: &EvalContext, keys: Vec<String>) -> JsValue {
    JsValue::Object(ctx.new_array(keys.into_iter().map(JsValue::String).collect()))
}

/// Object.keys
fn object_keys(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    let keys = match require_object(&target)? {
        Some(o) => {
            check_access(ctx.realm.id(), &o)?;
            own_enumerable_keys(&o)?
        }
        None => string_index_keys(&target),
    };
    Ok(keys_to_array(ctx, keys))
}

/// Object.getOwnPropertyNames
fn object_get_own_property_names(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    let keys = match require_object(&target)? {
        Some(o) => {
            check_access(ctx.realm.id(), &o)?;
            own_property_names(&o)?
        }
        None => {
            let mut keys = string_index_keys(&target);
            if let JsValue::String(_) = target {
                keys.push("length".to_string());
            }
            keys
        }
    };
    Ok(keys_to_array(ctx, keys))
}

fn descriptor_field(
    descriptor: &JsObjectType,
    name: &str,
) -> Result<Option<JsValue>, JErrorType> {
    if has_property(descriptor, name)? {
        Ok(Some(get(descriptor, name)?))
    } else {
        Ok(None)
    }
}

/// Object.defineProperty
///
/// Only data descriptors are supported; a descriptor with `get` or `set`
/// is rejected with a TypeError.
fn object_define_property(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = match arg(&args, 0) {
        JsValue::Object(o) => o,
        _ => {
            return Err(JErrorType::TypeError(
                "Object.defineProperty called on non-object".to_string(),
            ))
        }
    };
    check_access(ctx.realm.id(), &target)?;
    let key = to_string(ctx, &arg(&args, 1))?;
    let descriptor = match arg(&args, 2) {
        JsValue::Object(o) => o,
        other => {
            return Err(JErrorType::TypeError(format!(
                "Property description must be an object: {}",
                other
            )))
        }
    };
    if has_property(&descriptor, "get")? || has_property(&descriptor, "set")? {
        return Err(JErrorType::TypeError(
            "Accessor properties are not supported".to_string(),
        ));
    }
    let setter = PropertyDescriptorSetter {
        value: descriptor_field(&descriptor, "value")?,
        writable: descriptor_field(&descriptor, "writable")?.map(|v| to_boolean(&v)),
        enumerable: descriptor_field(&descriptor, "enumerable")?.map(|v| to_boolean(&v)),
        configurable: descriptor_field(&descriptor, "configurable")?.map(|v| to_boolean(&v)),
    };
    if !define_property(&target, &key, setter)? {
        return Err(JErrorType::TypeError(format!(
            "Cannot redefine property: {}",
            key
        )));
    }
    Ok(JsValue::Object(target))
}

/// Object.getOwnPropertyDescriptor
fn object_get_own_property_descriptor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = match require_object(&arg(&args, 0))? {
        Some(o) => o,
        None => return Ok(JsValue::Undefined),
    };
    check_access(ctx.realm.id(), &target)?;
    let key = to_string(ctx, &arg(&args, 1))?;
    let descriptor = match get_own_property(&target, &key)? {
        Some(d) => d,
        None => return Ok(JsValue::Undefined),
    };
    let result = ctx.new_object();
    set(&result, "value", descriptor.value.clone())?;
    set(&result, "writable", JsValue::Boolean(descriptor.is_writable()))?;
    set(&result, "enumerable", JsValue::Boolean(descriptor.is_enumerable()))?;
    set(&result, "configurable", JsValue::Boolean(descriptor.is_configurable()))?;
    Ok(JsValue::Object(result))
}

/// Object.getPrototypeOf
fn object_get_prototype_of(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    let prototype = match require_object(&target)? {
        Some(o) => get_prototype_of(&o),
        None => {
            let name = match target {
                JsValue::String(_) => "String",
                JsValue::Number(_) => "Number",
                _ => "Boolean",
            };
            ctx.realm.intrinsics().prototype(name)
        }
    };
    Ok(prototype.map(JsValue::Object).unwrap_or(JsValue::Null))
}

/// Object.create
fn object_create_with(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let prototype = match arg(&args, 0) {
        JsValue::Object(o) => Some(o),
        JsValue::Null => None,
        other => {
            return Err(JErrorType::TypeError(format!(
                "Object prototype may only be an Object or null: {}",
                other
            )))
        }
    };
    Ok(JsValue::Object(object_create(prototype)))
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let key = to_string(ctx, &arg(&args, 0))?;
    let found = match require_object(&this)? {
        Some(o) => has_own_property(&o, &key)?,
        None => key == "length" || string_index_keys(&this).contains(&key),
    };
    Ok(JsValue::Boolean(found))
}

/// Object.prototype.toString
fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let tag = match &this {
        JsValue::Undefined => "Undefined".to_string(),
        JsValue::Null => "Null".to_string(),
        JsValue::Boolean(_) => "Boolean".to_string(),
        JsValue::String(_) => "String".to_string(),
        JsValue::Number(_) => "Number".to_string(),
        JsValue::Object(o) => {
            let o = o.borrow();
            if o.is_callable() {
                "Function".to_string()
            } else {
                o.base.class_name().to_string()
            }
        }
    };
    Ok(JsValue::String(format!("[object {}]", tag)))
}

/// Object.prototype.valueOf
fn object_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    this_object(&this, "Object.prototype.valueOf")?;
    Ok(this)
}
