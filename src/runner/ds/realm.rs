use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::runner::ds::env_record::EnvironmentRecordType;
use crate::runner::ds::function_object::new_native_function;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{new_object, object_create, JsObjectType, ObjectKind};
use crate::runner::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runner::ds::operations::lex_env::new_global_environment;
use crate::runner::ds::property_handler::GlobalTemplate;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::BuiltInObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RealmId(Uuid);

impl RealmId {
    pub fn new() -> Self {
        RealmId(Uuid::new_v4())
    }
}

impl Default for RealmId {
    fn default() -> Self {
        RealmId::new()
    }
}

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prototype objects of the built-ins, keyed by constructor name.
pub struct Intrinsics {
    object_prototype: JsObjectType,
    function_prototype: JsObjectType,
    prototypes: HashMap<String, JsObjectType>,
}

impl Intrinsics {
    pub fn object_prototype(&self) -> JsObjectType {
        self.object_prototype.clone()
    }

    pub fn function_prototype(&self) -> JsObjectType {
        self.function_prototype.clone()
    }

    pub fn prototype(&self, name: &str) -> Option<JsObjectType> {
        self.prototypes.get(name).cloned()
    }

    /// Like [`Intrinsics::prototype`], but falls back to `Object.prototype`.
    pub fn prototype_or_object(&self, name: &str) -> JsObjectType {
        self.prototype(name)
            .unwrap_or_else(|| self.object_prototype.clone())
    }
}

/// One global environment: a global object seeded with the built-ins, the
/// prototypes those built-ins share, and the environment record that code
/// running in this realm resolves identifiers against.
pub struct Realm {
    id: RealmId,
    intrinsics: Intrinsics,
    global_object: JsObjectType,
    global_env: JsLexEnvironmentType,
}

impl Realm {
    pub fn new(
        template: GlobalTemplate,
        registry: &BuiltInRegistry,
        config: &EngineConfig,
    ) -> Rc<Realm> {
        Rc::new_cyclic(|weak: &Weak<Realm>| {
            let id = RealmId::new();
            let intrinsics = build_intrinsics(registry, weak);

            let global_object = new_object(
                template.class_name.clone(),
                Some(intrinsics.object_prototype()),
                ObjectKind::Global,
            );
            install_global_values(&global_object);
            define_hidden(&global_object, "globalThis", JsValue::Object(global_object.clone()));
            for builtin in registry.objects() {
                if builtin.name == "console" && !config.console {
                    continue;
                }
                let value = materialize(builtin, &intrinsics, weak);
                define_hidden(&global_object, &builtin.name, JsValue::Object(value));
            }
            for (name, func) in registry.global_functions() {
                let f = new_native_function(
                    &intrinsics.function_prototype,
                    weak.clone(),
                    name,
                    *func,
                    false,
                );
                define_hidden(&global_object, name, JsValue::Object(f));
            }
            {
                let mut g = global_object.borrow_mut();
                g.base.set_realm_id(id);
                g.base.set_named_handler(template.named_handler.clone());
                g.base.set_access_check(template.access_check.clone());
            }
            let global_env = new_global_environment(&global_object);

            Realm {
                id,
                intrinsics,
                global_object,
                global_env,
            }
        })
    }

    pub fn id(&self) -> RealmId {
        self.id
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn global_object(&self) -> JsObjectType {
        self.global_object.clone()
    }

    pub fn global_env(&self) -> JsLexEnvironmentType {
        self.global_env.clone()
    }
}

impl Drop for Realm {
    fn drop(&mut self) {
        // Closures declared with let/const at the top level point back at the
        // global environment through their scope chain.
        if let Ok(mut env) = self.global_env.try_borrow_mut() {
            if let EnvironmentRecordType::Global(record) = env.inner.as_mut() {
                record.declarative_record.clear();
            }
        }
        // Built-in methods reach their own prototype again through
        // Function.prototype and Object.prototype.
        let prototypes = self
            .intrinsics
            .prototypes
            .values()
            .chain(std::iter::once(&self.intrinsics.object_prototype))
            .chain(std::iter::once(&self.intrinsics.function_prototype));
        for prototype in prototypes {
            if let Ok(mut p) = prototype.try_borrow_mut() {
                p.clear_real_properties();
            }
        }
        if let Ok(mut g) = self.global_object.try_borrow_mut() {
            g.clear_real_properties();
        }
    }
}

fn define_hidden(object: &JsObjectType, name: &str, value: JsValue) {
    object
        .borrow_mut()
        .define_real_property(name, PropertyDescriptor::new(value, PropertyAttributes::hidden()));
}

fn install_global_values(global: &JsObjectType) {
    let mut g = global.borrow_mut();
    for (name, value) in [
        ("undefined", JsValue::Undefined),
        ("NaN", JsValue::number(f64::NAN)),
        ("Infinity", JsValue::number(f64::INFINITY)),
    ]
    .iter()
    {
        g.define_real_property(
            name,
            PropertyDescriptor::new(value.clone(), PropertyAttributes::frozen()),
        );
    }
}

fn build_intrinsics(registry: &BuiltInRegistry, realm: &Weak<Realm>) -> Intrinsics {
    let object_prototype = object_create(None);
    let function_prototype = new_object("Function", Some(object_prototype.clone()), ObjectKind::Ordinary);
    let mut prototypes = HashMap::new();
    prototypes.insert("Object".to_string(), object_prototype.clone());
    prototypes.insert("Function".to_string(), function_prototype.clone());

    for builtin in registry.objects() {
        resolve_prototype(&builtin.name, registry, &mut prototypes);
    }

    for builtin in registry.objects() {
        if let Some(prototype) = prototypes.get(&builtin.name) {
            for (name, value) in builtin.prototype_properties.iter() {
                define_hidden(prototype, name, value.clone());
            }
            for (name, func) in builtin.prototype_methods.iter() {
                let f = new_native_function(&function_prototype, realm.clone(), name, *func, false);
                define_hidden(prototype, name, JsValue::Object(f));
            }
        }
    }

    Intrinsics {
        object_prototype,
        function_prototype,
        prototypes,
    }
}

/// Creates the prototype object of a constructor built-in, creating its
/// parent first when needed.
fn resolve_prototype(
    name: &str,
    registry: &BuiltInRegistry,
    prototypes: &mut HashMap<String, JsObjectType>,
) -> Option<JsObjectType> {
    if let Some(p) = prototypes.get(name) {
        return Some(p.clone());
    }
    let builtin = registry.get_object(name)?;
    if builtin.constructor.is_none() {
        return None;
    }
    let parent = match &builtin.prototype {
        Some(parent) => resolve_prototype(parent, registry, prototypes),
        None => None,
    };
    let prototype = object_create(parent);
    prototypes.insert(name.to_string(), prototype.clone());
    Some(prototype)
}

fn materialize(builtin: &BuiltInObject, intrinsics: &Intrinsics, realm: &Weak<Realm>) -> JsObjectType {
    let object = match builtin.constructor {
        Some(constructor) => {
            let f = new_native_function(
                &intrinsics.function_prototype,
                realm.clone(),
                &builtin.name,
                constructor,
                true,
            );
            if let Some(prototype) = intrinsics.prototype(&builtin.name) {
                f.borrow_mut().define_real_property(
                    "prototype",
                    PropertyDescriptor::new(
                        JsValue::Object(prototype.clone()),
                        PropertyAttributes::frozen(),
                    ),
                );
                define_hidden(&prototype, "constructor", JsValue::Object(f.clone()));
            }
            f
        }
        None => {
            let prototype = match &builtin.prototype {
                Some(parent) => Some(intrinsics.prototype_or_object(parent)),
                None => None,
            };
            new_object(builtin.name.clone(), prototype, ObjectKind::Ordinary)
        }
    };
    for (name, func) in builtin.methods.iter() {
        let f = new_native_function(&intrinsics.function_prototype, realm.clone(), name, *func, false);
        define_hidden(&object, name, JsValue::Object(f));
    }
    for (name, value) in builtin.properties.iter() {
        object.borrow_mut().define_real_property(
            name,
            PropertyDescriptor::new(value.clone(), PropertyAttributes::frozen()),
        );
    }
    object
}
