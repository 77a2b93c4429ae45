use crate::runner::ds::value::JsValue;

/// Attribute bits of a data property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyAttributes {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyAttributes {
    /// Attributes of a property created by plain assignment.
    pub fn all() -> Self {
        PropertyAttributes {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Attributes used for built-in methods and constructors.
    pub fn hidden() -> Self {
        PropertyAttributes {
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    pub fn frozen() -> Self {
        PropertyAttributes {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }
}

impl Default for PropertyAttributes {
    fn default() -> Self {
        PropertyAttributes::all()
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub value: JsValue,
    pub attributes: PropertyAttributes,
}

impl PropertyDescriptor {
    pub fn new(value: JsValue, attributes: PropertyAttributes) -> Self {
        PropertyDescriptor { value, attributes }
    }

    pub fn is_writable(&self) -> bool {
        self.attributes.writable
    }

    pub fn is_enumerable(&self) -> bool {
        self.attributes.enumerable
    }

    pub fn is_configurable(&self) -> bool {
        self.attributes.configurable
    }
}

/// Partial descriptor as accepted by `Object.defineProperty`: absent fields
/// keep their current value, or default to `false` on creation.
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptorSetter {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

/// Canonical array index form of a property name, if it has one.
pub fn to_array_index(name: &str) -> Option<u32> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match name.parse::<u32>() {
        Ok(i) if i != u32::MAX => Some(i),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::to_array_index;

    #[test]
    fn array_index_is_canonical() {
        assert_eq!(to_array_index("0"), Some(0));
        assert_eq!(to_array_index("42"), Some(42));
        assert_eq!(to_array_index("042"), None);
        assert_eq!(to_array_index("-1"), None);
        assert_eq!(to_array_index("1.5"), None);
        assert_eq!(to_array_index(""), None);
    }
}
