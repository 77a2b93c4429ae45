use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object_property::{
    to_array_index, PropertyAttributes, PropertyDescriptor, PropertyDescriptorSetter,
};
use crate::runner::ds::property_handler::{AccessCheckFn, NamedPropertyHandler};
use crate::runner::ds::realm::RealmId;
use crate::runner::ds::value::JsValue;

pub type JsObjectType = Rc<RefCell<ObjectType>>;

pub enum ObjectKind {
    Ordinary,
    /// Dense element storage; holes read as `undefined`.
    Array(Vec<JsValue>),
    Function(FunctionKind),
    Error,
    Global,
    /// Opaque host data, e.g. the handles handed out by the `vm` binding.
    Embedder(Rc<dyn Any>),
}

/// Result of removing an own property without consulting any interceptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    Absent,
    Refused,
}

pub struct ObjectBase {
    class_name: String,
    properties: HashMap<String, PropertyDescriptor>,
    insertion_order: Vec<String>,
    prototype: Option<JsObjectType>,
    extensible: bool,
    named_handler: Option<Rc<dyn NamedPropertyHandler>>,
    access_check: Option<AccessCheckFn>,
    realm_id: Option<RealmId>,
}

impl ObjectBase {
    pub fn new(class_name: impl Into<String>, prototype: Option<JsObjectType>) -> Self {
        ObjectBase {
            class_name: class_name.into(),
            properties: HashMap::new(),
            insertion_order: Vec::new(),
            prototype,
            extensible: true,
            named_handler: None,
            access_check: None,
            realm_id: None,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn set_class_name(&mut self, class_name: impl Into<String>) {
        self.class_name = class_name.into();
    }

    pub fn prototype(&self) -> Option<JsObjectType> {
        self.prototype.clone()
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    pub fn prevent_extensions(&mut self) {
        self.extensible = false;
    }

    pub fn named_handler(&self) -> Option<Rc<dyn NamedPropertyHandler>> {
        self.named_handler.clone()
    }

    pub fn set_named_handler(&mut self, handler: Option<Rc<dyn NamedPropertyHandler>>) {
        self.named_handler = handler;
    }

    pub fn access_check(&self) -> Option<AccessCheckFn> {
        self.access_check.clone()
    }

    pub fn set_access_check(&mut self, check: Option<AccessCheckFn>) {
        self.access_check = check;
    }

    pub fn realm_id(&self) -> Option<RealmId> {
        self.realm_id
    }

    pub fn set_realm_id(&mut self, id: RealmId) {
        self.realm_id = Some(id);
    }

    fn insert(&mut self, name: String, descriptor: PropertyDescriptor) {
        if !self.properties.contains_key(&name) {
            self.insertion_order.push(name.clone());
        }
        self.properties.insert(name, descriptor);
    }

    fn remove(&mut self, name: &str) {
        if self.properties.remove(name).is_some() {
            self.insertion_order.retain(|n| n != name);
        }
    }

    /// Own keys with integer-like names first in ascending order, then the
    /// rest in insertion order.
    fn ordered_keys(&self, enumerable_only: bool) -> Vec<String> {
        let visible = |name: &String| {
            !enumerable_only
                || self
                    .properties
                    .get(name)
                    .map(|d| d.is_enumerable())
                    .unwrap_or(false)
        };
        let mut indices: Vec<(u32, &String)> = self
            .insertion_order
            .iter()
            .filter(|n| visible(n))
            .filter_map(|n| to_array_index(n).map(|i| (i, n)))
            .collect();
        indices.sort_by_key(|(i, _)| *i);
        let mut keys: Vec<String> = indices.into_iter().map(|(_, n)| n.clone()).collect();
        keys.extend(
            self.insertion_order
                .iter()
                .filter(|n| visible(n) && to_array_index(n).is_none())
                .cloned(),
        );
        keys
    }
}

pub struct ObjectType {
    pub base: ObjectBase,
    pub kind: ObjectKind,
}

impl ObjectType {
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array(_))
    }

    pub fn as_function(&self) -> Option<&FunctionKind> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn embedder_data(&self) -> Option<Rc<dyn Any>> {
        match &self.kind {
            ObjectKind::Embedder(d) => Some(d.clone()),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Real (uninterceptable) own-property primitives.
    // -----------------------------------------------------------------------

    pub fn get_real_descriptor(&self, name: &str) -> Option<PropertyDescriptor> {
        if let ObjectKind::Array(elements) = &self.kind {
            if name == "length" {
                return Some(PropertyDescriptor::new(
                    JsValue::from(elements.len() as i64),
                    PropertyAttributes {
                        writable: true,
                        enumerable: false,
                        configurable: false,
                    },
                ));
            }
            if let Some(index) = to_array_index(name) {
                return elements
                    .get(index as usize)
                    .map(|v| PropertyDescriptor::new(v.clone(), PropertyAttributes::all()));
            }
        }
        self.base.properties.get(name).cloned()
    }

    pub fn get_real_property(&self, name: &str) -> Option<JsValue> {
        self.get_real_descriptor(name).map(|d| d.value)
    }

    pub fn has_real_property(&self, name: &str) -> bool {
        match &self.kind {
            ObjectKind::Array(elements) => {
                if name == "length" {
                    return true;
                }
                if let Some(index) = to_array_index(name) {
                    return (index as usize) < elements.len();
                }
                self.base.properties.contains_key(name)
            }
            _ => self.base.properties.contains_key(name),
        }
    }

    /// Assigns an own property, creating it when absent. Returns `false` when
    /// the property is read-only or the object is not extensible.
    pub fn set_real_property(&mut self, name: &str, value: JsValue) -> Result<bool, JErrorType> {
        if let ObjectKind::Array(elements) = &mut self.kind {
            if name == "length" {
                let new_len = array_length_from(&value)?;
                elements.resize(new_len, JsValue::Undefined);
                return Ok(true);
            }
            if let Some(index) = to_array_index(name) {
                let index = index as usize;
                if index >= elements.len() {
                    if !self.base.extensible {
                        return Ok(false);
                    }
                    elements.resize(index + 1, JsValue::Undefined);
                }
                elements[index] = value;
                return Ok(true);
            }
        }
        match self.base.properties.get_mut(name) {
            Some(descriptor) => {
                if !descriptor.is_writable() {
                    return Ok(false);
                }
                descriptor.value = value;
                Ok(true)
            }
            None => {
                if !self.base.extensible {
                    return Ok(false);
                }
                self.base.insert(
                    name.to_string(),
                    PropertyDescriptor::new(value, PropertyAttributes::all()),
                );
                Ok(true)
            }
        }
    }

    /// Creates or redefines an own property with the given attributes,
    /// bypassing writability. Used for built-ins and literals.
    pub fn define_real_property(&mut self, name: &str, descriptor: PropertyDescriptor) {
        if let ObjectKind::Array(elements) = &mut self.kind {
            if let Some(index) = to_array_index(name) {
                let index = index as usize;
                if index >= elements.len() {
                    elements.resize(index + 1, JsValue::Undefined);
                }
                elements[index] = descriptor.value;
                return;
            }
        }
        self.base.insert(name.to_string(), descriptor);
    }

    /// `Object.defineProperty` semantics for data properties.
    pub fn define_own_property(
        &mut self,
        name: &str,
        setter: PropertyDescriptorSetter,
    ) -> Result<bool, JErrorType> {
        match self.get_real_descriptor(name) {
            None => {
                if !self.base.extensible {
                    return Ok(false);
                }
                let attributes = PropertyAttributes {
                    writable: setter.writable.unwrap_or(false),
                    enumerable: setter.enumerable.unwrap_or(false),
                    configurable: setter.configurable.unwrap_or(false),
                };
                self.define_real_property(
                    name,
                    PropertyDescriptor::new(setter.value.unwrap_or(JsValue::Undefined), attributes),
                );
                Ok(true)
            }
            Some(current) => {
                let current_attributes = current.attributes;
                if !current_attributes.configurable {
                    let loosening = setter.configurable == Some(true)
                        || setter
                            .enumerable
                            .map(|e| e != current_attributes.enumerable)
                            .unwrap_or(false)
                        || (!current_attributes.writable
                            && (setter.writable == Some(true) || setter.value.is_some()));
                    if loosening {
                        return Ok(false);
                    }
                }
                if self.is_array() && name == "length" {
                    if let Some(v) = setter.value {
                        return self.set_real_property(name, v);
                    }
                    return Ok(true);
                }
                let attributes = PropertyAttributes {
                    writable: setter.writable.unwrap_or(current_attributes.writable),
                    enumerable: setter.enumerable.unwrap_or(current_attributes.enumerable),
                    configurable: setter.configurable.unwrap_or(current_attributes.configurable),
                };
                self.define_real_property(
                    name,
                    PropertyDescriptor::new(setter.value.unwrap_or(current.value), attributes),
                );
                Ok(true)
            }
        }
    }

    pub fn delete_real_property(&mut self, name: &str) -> DeleteOutcome {
        if let ObjectKind::Array(elements) = &mut self.kind {
            if name == "length" {
                return DeleteOutcome::Refused;
            }
            if let Some(index) = to_array_index(name) {
                let index = index as usize;
                if index < elements.len() {
                    elements[index] = JsValue::Undefined;
                    return DeleteOutcome::Deleted;
                }
                return DeleteOutcome::Absent;
            }
        }
        match self.base.properties.get(name) {
            None => DeleteOutcome::Absent,
            Some(d) if !d.is_configurable() => DeleteOutcome::Refused,
            Some(_) => {
                self.base.remove(name);
                DeleteOutcome::Deleted
            }
        }
    }

    pub fn real_own_keys(&self, enumerable_only: bool) -> Vec<String> {
        let mut keys = vec![];
        if let ObjectKind::Array(elements) = &self.kind {
            keys.extend((0..elements.len()).map(|i| i.to_string()));
            if !enumerable_only {
                keys.push("length".to_string());
            }
        }
        keys.extend(self.base.ordered_keys(enumerable_only));
        keys
    }

    pub fn real_own_enumerable_keys(&self) -> Vec<String> {
        self.real_own_keys(true)
    }

    /// Drops every own property and element. Used when a realm is torn down
    /// to cut the reference cycles that run through built-in prototypes.
    pub fn clear_real_properties(&mut self) {
        self.base.properties.clear();
        self.base.insertion_order.clear();
        if let ObjectKind::Array(elements) = &mut self.kind {
            elements.clear();
        }
    }
}

fn array_length_from(value: &JsValue) -> Result<usize, JErrorType> {
    match value.as_f64() {
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(n as usize),
        _ => Err(JErrorType::RangeError("Invalid array length".to_string())),
    }
}

pub fn new_object(
    class_name: impl Into<String>,
    prototype: Option<JsObjectType>,
    kind: ObjectKind,
) -> JsObjectType {
    Rc::new(RefCell::new(ObjectType {
        base: ObjectBase::new(class_name, prototype),
        kind,
    }))
}

pub fn object_create(prototype: Option<JsObjectType>) -> JsObjectType {
    new_object("Object", prototype, ObjectKind::Ordinary)
}

pub fn array_create(prototype: Option<JsObjectType>, elements: Vec<JsValue>) -> JsObjectType {
    new_object("Array", prototype, ObjectKind::Array(elements))
}

pub fn same_object(a: &JsObjectType, b: &JsObjectType) -> bool {
    Rc::ptr_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_put_indices_first() {
        let o = object_create(None);
        {
            let mut o = o.borrow_mut();
            o.set_real_property("b", JsValue::from(1i64)).unwrap();
            o.set_real_property("2", JsValue::from(2i64)).unwrap();
            o.set_real_property("a", JsValue::from(3i64)).unwrap();
            o.set_real_property("0", JsValue::from(4i64)).unwrap();
        }
        assert_eq!(o.borrow().real_own_enumerable_keys(), vec!["0", "2", "b", "a"]);
    }

    #[test]
    fn non_configurable_properties_refuse_deletion() {
        let o = object_create(None);
        o.borrow_mut().define_real_property(
            "NaN",
            PropertyDescriptor::new(JsValue::number(f64::NAN), PropertyAttributes::frozen()),
        );
        assert_eq!(o.borrow_mut().delete_real_property("NaN"), DeleteOutcome::Refused);
        assert_eq!(o.borrow_mut().delete_real_property("missing"), DeleteOutcome::Absent);
        assert!(!o.borrow_mut().set_real_property("NaN", JsValue::Null).unwrap());
    }

    #[test]
    fn array_length_tracks_elements() {
        let a = array_create(None, vec![]);
        a.borrow_mut().set_real_property("3", JsValue::Null).unwrap();
        assert_eq!(a.borrow().get_real_property("length"), Some(JsValue::from(4i64)));
        a.borrow_mut()
            .set_real_property("length", JsValue::from(1i64))
            .unwrap();
        assert_eq!(a.borrow().real_own_enumerable_keys(), vec!["0"]);
    }
}
