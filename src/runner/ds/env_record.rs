use std::collections::HashMap;
use std::rc::Weak;
use std::cell::RefCell;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::operations::object::{delete, get, has_property, set};
use crate::runner::ds::value::JsValue;

pub trait EnvironmentRecord {
    fn has_binding(&self, name: &str) -> Result<bool, JErrorType>;
    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType>;
    fn create_immutable_binding(&mut self, name: String) -> Result<(), JErrorType>;
    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType>;
    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType>;
    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType>;
    fn delete_binding(&mut self, name: &str) -> Result<bool, JErrorType>;
}

pub enum EnvironmentRecordType {
    Declarative(DeclarativeEnvironmentRecord),
    Object(ObjectEnvironmentRecord),
    Global(GlobalEnvironmentRecord),
}
impl EnvironmentRecordType {
    pub fn as_env_record(&self) -> &dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Object(d) => d,
            EnvironmentRecordType::Global(d) => d,
        }
    }

    pub fn as_env_record_mut(&mut self) -> &mut dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Object(d) => d,
            EnvironmentRecordType::Global(d) => d,
        }
    }
}

#[derive(PartialEq)]
pub enum BindingFlag {
    NoDelete,
    IsImmutable,
}

pub struct DeclarativeEnvironmentRecord {
    bindings: HashMap<String, Option<JsValue>>,
    binding_flags: HashMap<String, Vec<BindingFlag>>,
}
impl DeclarativeEnvironmentRecord {
    pub fn new() -> Self {
        DeclarativeEnvironmentRecord {
            bindings: HashMap::new(),
            binding_flags: HashMap::new(),
        }
    }

    pub fn binding_names(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    pub fn is_immutable(&self, name: &str) -> bool {
        self.has_flag(name, BindingFlag::IsImmutable)
    }

    fn has_flag(&self, name: &str, flag: BindingFlag) -> bool {
        self.binding_flags
            .get(name)
            .map(|flags| flags.contains(&flag))
            .unwrap_or(false)
    }

    /// Drops every binding. Breaks closure cycles that run through this record.
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.binding_flags.clear();
    }
}
impl Default for DeclarativeEnvironmentRecord {
    fn default() -> Self {
        Self::new()
    }
}
impl EnvironmentRecord for DeclarativeEnvironmentRecord {
    fn has_binding(&self, name: &str) -> Result<bool, JErrorType> {
        Ok(self.bindings.contains_key(name))
    }

    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType> {
        if !self.bindings.contains_key(&name) {
            self.bindings.insert(name.clone(), None);
            if can_delete {
                self.binding_flags.insert(name, vec![]);
            } else {
                self.binding_flags.insert(name, vec![BindingFlag::NoDelete]);
            }
        }
        Ok(())
    }

    fn create_immutable_binding(&mut self, name: String) -> Result<(), JErrorType> {
        if !self.bindings.contains_key(&name) {
            self.bindings.insert(name.clone(), None);
            self.binding_flags.insert(
                name,
                vec![BindingFlag::IsImmutable, BindingFlag::NoDelete],
            );
        }
        Ok(())
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        let immutable = self.is_immutable(name);
        match self.bindings.get_mut(name) {
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
            Some(None) => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            Some(Some(_)) if immutable => Err(JErrorType::TypeError(
                "Assignment to constant variable".to_string(),
            )),
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
        }
    }

    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        match self.bindings.get(name) {
            Some(Some(v)) => Ok(v.clone()),
            Some(None) => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    fn delete_binding(&mut self, name: &str) -> Result<bool, JErrorType> {
        if !self.bindings.contains_key(name) {
            return Ok(true);
        }
        if self.has_flag(name, BindingFlag::NoDelete) {
            return Ok(false);
        }
        self.bindings.remove(name);
        self.binding_flags.remove(name);
        Ok(true)
    }
}

/// Bindings backed by the properties of an object. Every access goes through
/// the interceptable object operations, so a global object carrying a named
/// property handler sees identifier resolution as property traffic.
pub struct ObjectEnvironmentRecord {
    binding_object: Weak<RefCell<ObjectType>>,
}
impl ObjectEnvironmentRecord {
    pub fn new(binding_object: &JsObjectType) -> Self {
        ObjectEnvironmentRecord {
            binding_object: std::rc::Rc::downgrade(binding_object),
        }
    }

    pub fn binding_object(&self) -> Result<JsObjectType, JErrorType> {
        self.binding_object.upgrade().ok_or_else(|| {
            JErrorType::ReferenceError("global object is no longer available".to_string())
        })
    }
}
impl EnvironmentRecord for ObjectEnvironmentRecord {
    fn has_binding(&self, name: &str) -> Result<bool, JErrorType> {
        has_property(&self.binding_object()?, name)
    }

    fn create_mutable_binding(&mut self, name: String, _can_delete: bool) -> Result<(), JErrorType> {
        set(&self.binding_object()?, &name, JsValue::Undefined).map(|_| ())
    }

    fn create_immutable_binding(&mut self, name: String) -> Result<(), JErrorType> {
        Err(JErrorType::TypeError(format!(
            "Cannot create immutable binding '{}' on an object",
            name
        )))
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        self.set_mutable_binding(name, value)
    }

    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        // Sloppy mode: a refused write is silently dropped.
        set(&self.binding_object()?, name, value).map(|_| ())
    }

    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        get(&self.binding_object()?, name)
    }

    fn delete_binding(&mut self, name: &str) -> Result<bool, JErrorType> {
        delete(&self.binding_object()?, name)
    }
}

pub struct GlobalEnvironmentRecord {
    pub object_record: ObjectEnvironmentRecord,
    pub declarative_record: DeclarativeEnvironmentRecord,
}
impl GlobalEnvironmentRecord {
    pub fn new(global_object: &JsObjectType) -> Self {
        GlobalEnvironmentRecord {
            object_record: ObjectEnvironmentRecord::new(global_object),
            declarative_record: DeclarativeEnvironmentRecord::new(),
        }
    }

    pub fn has_lexical_declaration(&self, name: &str) -> bool {
        self.declarative_record.bindings.contains_key(name)
    }
}
impl EnvironmentRecord for GlobalEnvironmentRecord {
    fn has_binding(&self, name: &str) -> Result<bool, JErrorType> {
        if self.has_lexical_declaration(name) {
            return Ok(true);
        }
        self.object_record.has_binding(name)
    }

    fn create_mutable_binding(&mut self, name: String, can_delete: bool) -> Result<(), JErrorType> {
        self.declarative_record.create_mutable_binding(name, can_delete)
    }

    fn create_immutable_binding(&mut self, name: String) -> Result<(), JErrorType> {
        self.declarative_record.create_immutable_binding(name)
    }

    fn initialize_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        if self.has_lexical_declaration(name) {
            self.declarative_record.initialize_binding(name, value)
        } else {
            self.object_record.initialize_binding(name, value)
        }
    }

    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        if self.has_lexical_declaration(name) {
            self.declarative_record.set_mutable_binding(name, value)
        } else {
            self.object_record.set_mutable_binding(name, value)
        }
    }

    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        if self.has_lexical_declaration(name) {
            self.declarative_record.get_binding_value(name)
        } else {
            self.object_record.get_binding_value(name)
        }
    }

    fn delete_binding(&mut self, name: &str) -> Result<bool, JErrorType> {
        if self.has_lexical_declaration(name) {
            self.declarative_record.delete_binding(name)
        } else {
            self.object_record.delete_binding(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_bindings_reject_assignment() {
        let mut record = DeclarativeEnvironmentRecord::new();
        record.create_immutable_binding("c".to_string()).unwrap();
        assert!(matches!(
            record.get_binding_value("c"),
            Err(JErrorType::ReferenceError(_))
        ));
        record.initialize_binding("c", JsValue::from(1i64)).unwrap();
        assert!(matches!(
            record.set_mutable_binding("c", JsValue::from(2i64)),
            Err(JErrorType::TypeError(_))
        ));
        assert_eq!(record.get_binding_value("c").unwrap(), JsValue::from(1i64));
    }

    #[test]
    fn deletable_bindings_can_be_removed() {
        let mut record = DeclarativeEnvironmentRecord::new();
        record.create_mutable_binding("a".to_string(), true).unwrap();
        record.create_mutable_binding("b".to_string(), false).unwrap();
        assert!(record.delete_binding("a").unwrap());
        assert!(!record.delete_binding("b").unwrap());
        assert!(!record.has_binding("a").unwrap());
    }
}
