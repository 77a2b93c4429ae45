//! Built-in registry: the blueprint every new realm is seeded from.

use std::collections::HashMap;

use thiserror::Error;

use super::types::{BuiltInObject, NativeFn};
use crate::runner::std_lib::register_core_builtins;

/// Error type for registry operations.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),
    #[error("Method not found: {0}.{1}")]
    MethodNotFound(String, String),
}

/// Registry for built-in objects.
/// Holds the definitions of all built-ins in registration order; realms
/// created after a change pick it up, existing realms are unaffected.
pub struct BuiltInRegistry {
    /// All registered built-in objects.
    objects: Vec<BuiltInObject>,

    /// Position of each object in `objects`.
    index: HashMap<String, usize>,

    /// Functions bound directly on the global object (`parseInt`, ...).
    global_functions: Vec<(String, NativeFn)>,
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: Vec::new(),
            index: HashMap::new(),
            global_functions: Vec::new(),
        }
    }

    /// Create a registry with the core built-ins.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        registry
    }

    /// Register a built-in object, replacing any previous one of that name.
    pub fn register_object(&mut self, obj: BuiltInObject) {
        match self.index.get(&obj.name) {
            Some(&i) => self.objects[i] = obj,
            None => {
                self.index.insert(obj.name.clone(), self.objects.len());
                self.objects.push(obj);
            }
        }
    }

    /// Register a function bound on the global object.
    pub fn register_global_function(&mut self, name: impl Into<String>, func: NativeFn) {
        let name = name.into();
        self.global_functions.retain(|(n, _)| *n != name);
        self.global_functions.push((name, func));
    }

    /// Get a registered object by name.
    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.index.get(name).map(|&i| &self.objects[i])
    }

    /// Get a mutable reference to a registered object.
    pub fn get_object_mut(&mut self, name: &str) -> Option<&mut BuiltInObject> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.objects[i]),
            None => None,
        }
    }

    /// Override an existing built-in method, static or on the prototype.
    pub fn override_method(
        &mut self,
        object: &str,
        method: &str,
        func: NativeFn,
    ) -> Result<(), PluginError> {
        let obj = self
            .get_object_mut(object)
            .ok_or_else(|| PluginError::ObjectNotFound(object.to_string()))?;

        let slot = obj
            .methods
            .iter_mut()
            .chain(obj.prototype_methods.iter_mut())
            .find(|(n, _)| n == method)
            .ok_or_else(|| PluginError::MethodNotFound(object.to_string(), method.to_string()))?;
        slot.1 = func;
        Ok(())
    }

    /// Check if an object exists in the registry.
    pub fn has_object(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Check if a method exists on an object or its prototype.
    pub fn has_method(&self, object: &str, method: &str) -> bool {
        self.get_object(object)
            .map(|obj| obj.has_method(method))
            .unwrap_or(false)
    }

    /// Registered objects, in registration order.
    pub fn objects(&self) -> impl Iterator<Item = &BuiltInObject> {
        self.objects.iter()
    }

    /// Get list of all registered object names.
    pub fn object_names(&self) -> Vec<&str> {
        self.objects.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn global_functions(&self) -> &[(String, NativeFn)] {
        &self.global_functions
    }
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::error::JErrorType;
    use crate::runner::ds::value::JsValue;
    use crate::runner::plugin::types::EvalContext;

    fn answer(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        Ok(JsValue::from(42i64))
    }

    #[test]
    fn core_registry_has_the_standard_objects() {
        let registry = BuiltInRegistry::with_core();
        for name in ["Object", "Function", "Array", "String", "Number", "Boolean", "Math", "JSON", "Error", "TypeError", "console"].iter() {
            assert!(registry.has_object(name), "missing {}", name);
        }
        assert!(registry.has_method("Array", "push"));
        assert!(registry.has_method("Object", "keys"));
        assert!(registry.global_functions().iter().any(|(n, _)| n == "parseInt"));
    }

    #[test]
    fn override_replaces_existing_methods_only() {
        let mut registry = BuiltInRegistry::with_core();
        assert!(registry.override_method("Math", "abs", answer).is_ok());
        assert!(matches!(
            registry.override_method("Math", "nope", answer),
            Err(PluginError::MethodNotFound(_, _))
        ));
        assert!(matches!(
            registry.override_method("Nope", "abs", answer),
            Err(PluginError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn registering_twice_keeps_one_entry() {
        let mut registry = BuiltInRegistry::new();
        registry.register_object(BuiltInObject::new("Thing"));
        registry.register_object(BuiltInObject::new("Thing").add_method("answer", answer));
        assert_eq!(registry.object_names(), vec!["Thing"]);
        assert!(registry.has_method("Thing", "answer"));
    }
}
