use std::rc::{Rc, Weak};

use crate::parser::ast::FunctionData;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{new_object, object_create, JsObjectType, ObjectKind};
use crate::runner::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::NativeFn;

pub enum FunctionKind {
    Script(ScriptFunction),
    Native(NativeFunction),
}

/// A closure over a parsed function body. Realms are referenced weakly so a
/// function that escapes into host-owned objects cannot keep its realm alive.
pub struct ScriptFunction {
    pub data: Rc<FunctionData>,
    pub environment: JsLexEnvironmentType,
    /// `this` captured at creation time, only for arrow functions.
    pub lexical_this: Option<JsValue>,
    pub realm: Weak<Realm>,
}

pub struct NativeFunction {
    pub name: String,
    pub func: NativeFn,
    pub constructible: bool,
    pub realm: Weak<Realm>,
}

impl FunctionKind {
    pub fn realm(&self) -> Option<Rc<Realm>> {
        match self {
            FunctionKind::Script(f) => f.realm.upgrade(),
            FunctionKind::Native(f) => f.realm.upgrade(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        match self {
            FunctionKind::Script(f) => !f.data.is_arrow,
            FunctionKind::Native(f) => f.constructible,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FunctionKind::Script(f) => f.data.name(),
            FunctionKind::Native(f) => &f.name,
        }
    }
}

fn define_hidden(object: &JsObjectType, name: &str, value: JsValue, writable: bool) {
    object.borrow_mut().define_real_property(
        name,
        PropertyDescriptor::new(
            value,
            PropertyAttributes {
                writable,
                enumerable: false,
                configurable: true,
            },
        ),
    );
}

pub fn new_native_function(
    function_prototype: &JsObjectType,
    realm: Weak<Realm>,
    name: &str,
    func: NativeFn,
    constructible: bool,
) -> JsObjectType {
    let f = new_object(
        "Function",
        Some(function_prototype.clone()),
        ObjectKind::Function(FunctionKind::Native(NativeFunction {
            name: name.to_string(),
            func,
            constructible,
            realm,
        })),
    );
    define_hidden(&f, "name", JsValue::from(name), false);
    f
}

pub fn new_script_function(
    realm: &Rc<Realm>,
    data: Rc<FunctionData>,
    environment: JsLexEnvironmentType,
    lexical_this: Option<JsValue>,
) -> JsObjectType {
    let is_arrow = data.is_arrow;
    let name = data.name().to_string();
    let length = data.params.len() as i64;
    let f = new_object(
        "Function",
        Some(realm.intrinsics().function_prototype()),
        ObjectKind::Function(FunctionKind::Script(ScriptFunction {
            data,
            environment,
            lexical_this,
            realm: Rc::downgrade(realm),
        })),
    );
    define_hidden(&f, "name", JsValue::from(name), false);
    define_hidden(&f, "length", JsValue::from(length), false);
    if !is_arrow {
        let prototype = object_create(Some(realm.intrinsics().object_prototype()));
        define_hidden(&f, "prototype", JsValue::Object(prototype), true);
    }
    f
}
