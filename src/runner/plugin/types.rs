//! Core types shared by the evaluator and the built-in library.

use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{array_create, object_create, JsObjectType};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::expression::{get_value, resolve_binding};
use crate::runner::isolate::Isolate;

/// Execution context passed to the evaluator and to native functions.
///
/// A context is created per script execution and per function call. It
/// names the realm whose intrinsics new objects are built from and the
/// environments identifiers are resolved against.
pub struct EvalContext {
    /// The isolate this code runs on.
    pub isolate: Rc<Isolate>,
    /// Realm of the running code. Switched to the callee's realm on calls.
    pub realm: Rc<Realm>,
    /// Environment for `let`/`const` and block scopes.
    pub lex_env: JsLexEnvironmentType,
    /// Environment `var` and function declarations are hoisted into.
    pub var_env: JsLexEnvironmentType,
    /// Value of `this`.
    pub this_value: JsValue,
    /// The constructor when invoked through `new`.
    pub new_target: Option<JsObjectType>,
    /// The function object being executed, if any.
    pub callee: Option<JsObjectType>,
    /// Display name of the script, used in stack traces.
    pub script_name: Rc<str>,
}

impl EvalContext {
    /// Create a top-level context running in the global scope of `realm`.
    pub fn new(isolate: Rc<Isolate>, realm: Rc<Realm>, script_name: impl Into<Rc<str>>) -> Self {
        let global_env = realm.global_env();
        let this_value = JsValue::Object(realm.global_object());
        EvalContext {
            isolate,
            realm,
            lex_env: global_env.clone(),
            var_env: global_env,
            this_value,
            new_target: None,
            callee: None,
            script_name: script_name.into(),
        }
    }

    /// Create an empty ordinary object of the current realm.
    pub fn new_object(&self) -> JsObjectType {
        object_create(Some(self.realm.intrinsics().object_prototype()))
    }

    /// Create an array of the current realm.
    pub fn new_array(&self, elements: Vec<JsValue>) -> JsObjectType {
        array_create(
            Some(self.realm.intrinsics().prototype_or_object("Array")),
            elements,
        )
    }

    /// Look up an identifier the way script code would.
    pub fn get_binding(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        let reference = resolve_binding(self, name)?;
        get_value(self, &reference)
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType>;

/// Built-in object definition.
/// Describes a built-in like `Array` or `Math`; every realm materializes its
/// own copy of it when created.
pub struct BuiltInObject {
    /// Name of the global binding (e.g., "Array", "Math").
    pub name: String,

    /// Parent prototype name. For constructors this is the parent of the
    /// constructor's `prototype` object; for plain objects it is the object's
    /// own prototype.
    pub prototype: Option<String>,

    /// Methods defined on the object itself.
    pub methods: Vec<(String, NativeFn)>,

    /// Methods defined on the constructor's `prototype` object.
    pub prototype_methods: Vec<(String, NativeFn)>,

    /// Read-only static properties.
    pub properties: Vec<(String, JsValue)>,

    /// Writable, non-enumerable properties of the `prototype` object.
    pub prototype_properties: Vec<(String, JsValue)>,

    /// Constructor function, if this object is constructable.
    pub constructor: Option<NativeFn>,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            prototype: Some("Object".to_string()),
            methods: Vec::new(),
            prototype_methods: Vec::new(),
            properties: Vec::new(),
            prototype_properties: Vec::new(),
            constructor: None,
        }
    }

    /// Set the prototype chain parent.
    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }

    /// Set no prototype (for objects like Object.prototype itself).
    pub fn with_no_prototype(mut self) -> Self {
        self.prototype = None;
        self
    }

    /// Add a native method.
    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.push((name.into(), func));
        self
    }

    /// Add a native method to the constructor's prototype object.
    pub fn add_prototype_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.prototype_methods.push((name.into(), func));
        self
    }

    /// Add a property.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    /// Add a property to the constructor's prototype object.
    pub fn add_prototype_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.prototype_properties.push((name.into(), value));
        self
    }

    /// Set the constructor function.
    pub fn with_constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|(n, _)| n == name)
            || self.prototype_methods.iter().any(|(n, _)| n == name)
    }
}
