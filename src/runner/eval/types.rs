//! Completion records and references used by the evaluator.
//!
//! A thrown value never shows up as a completion: it travels as the `Err`
//! side of [`EvalResult`] so `?` unwinds it.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionType {
    Normal,
    Return,
    Break,
    Continue,
}

/// Outcome of evaluating a statement.
#[derive(Debug, Clone)]
pub struct Completion {
    pub completion_type: CompletionType,
    /// `None` is the empty completion value, which lets a loop body or
    /// block keep the value of an earlier statement.
    pub value: Option<JsValue>,
}

impl Completion {
    fn of(completion_type: CompletionType, value: Option<JsValue>) -> Self {
        Completion {
            completion_type,
            value,
        }
    }

    pub fn normal() -> Self {
        Self::of(CompletionType::Normal, None)
    }

    pub fn normal_with_value(value: JsValue) -> Self {
        Self::of(CompletionType::Normal, Some(value))
    }

    pub fn return_value(value: JsValue) -> Self {
        Self::of(CompletionType::Return, Some(value))
    }

    pub fn break_completion() -> Self {
        Self::of(CompletionType::Break, None)
    }

    pub fn continue_completion() -> Self {
        Self::of(CompletionType::Continue, None)
    }

    pub fn is_normal(&self) -> bool {
        self.completion_type == CompletionType::Normal
    }

    /// True for return, break and continue.
    pub fn is_abrupt(&self) -> bool {
        !self.is_normal()
    }

    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }

    /// Supplies `value` when this completion carries none.
    pub fn update_empty(mut self, value: Option<JsValue>) -> Self {
        if self.value.is_none() {
            self.value = value;
        }
        self
    }
}

/// What a [`Reference`] resolves against.
#[derive(Clone)]
pub enum ReferenceBase {
    Object(JsObjectType),
    /// A primitive; property reads go through its prototype in the
    /// current realm.
    Primitive(JsValue),
    Environment(JsLexEnvironmentType),
    /// The name was found in no environment. Reading it is a
    /// `ReferenceError`; writing it creates a global property.
    Unresolvable,
}

/// A resolved name: either an identifier binding or a property access.
#[derive(Clone)]
pub struct Reference {
    pub base: ReferenceBase,
    pub referenced_name: String,
}

impl Reference {
    pub fn property(base: JsValue, name: impl Into<String>) -> Self {
        let base = match base {
            JsValue::Object(o) => ReferenceBase::Object(o),
            other => ReferenceBase::Primitive(other),
        };
        Reference {
            base,
            referenced_name: name.into(),
        }
    }

    pub fn environment(env: JsLexEnvironmentType, name: impl Into<String>) -> Self {
        Reference {
            base: ReferenceBase::Environment(env),
            referenced_name: name.into(),
        }
    }

    pub fn unresolvable(name: impl Into<String>) -> Self {
        Reference {
            base: ReferenceBase::Unresolvable,
            referenced_name: name.into(),
        }
    }

    pub fn is_property_reference(&self) -> bool {
        matches!(
            self.base,
            ReferenceBase::Object(_) | ReferenceBase::Primitive(_)
        )
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self.base, ReferenceBase::Unresolvable)
    }

    /// The `this` a call through this reference receives. Environment
    /// and unresolvable bases give `undefined`, which the callee then
    /// replaces with its realm's global.
    pub fn get_this_value(&self) -> JsValue {
        match &self.base {
            ReferenceBase::Object(o) => JsValue::Object(o.clone()),
            ReferenceBase::Primitive(v) => v.clone(),
            ReferenceBase::Environment(_) | ReferenceBase::Unresolvable => JsValue::Undefined,
        }
    }
}

pub type EvalResult = Result<Completion, JErrorType>;

pub type ValueResult = Result<JsValue, JErrorType>;

pub type ReferenceResult = Result<Reference, JErrorType>;
