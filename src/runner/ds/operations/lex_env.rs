use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::env_record::{
    DeclarativeEnvironmentRecord, EnvironmentRecordType, GlobalEnvironmentRecord,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::object::JsObjectType;

pub fn new_declarative_environment(outer: Option<JsLexEnvironmentType>) -> JsLexEnvironmentType {
    Rc::new(RefCell::new(LexEnvironment {
        inner: Box::new(EnvironmentRecordType::Declarative(
            DeclarativeEnvironmentRecord::new(),
        )),
        outer,
    }))
}

pub fn new_global_environment(global_object: &JsObjectType) -> JsLexEnvironmentType {
    Rc::new(RefCell::new(LexEnvironment {
        inner: Box::new(EnvironmentRecordType::Global(GlobalEnvironmentRecord::new(
            global_object,
        ))),
        outer: None,
    }))
}

/// Innermost environment holding a binding for `name`.
pub fn find_binding_environment(
    env: &JsLexEnvironmentType,
    name: &str,
) -> Result<Option<JsLexEnvironmentType>, JErrorType> {
    let mut current = Some(env.clone());
    while let Some(e) = current {
        let (found, outer) = {
            let borrowed = e.borrow();
            (
                borrowed.inner.as_env_record().has_binding(name)?,
                borrowed.outer.clone(),
            )
        };
        if found {
            return Ok(Some(e));
        }
        current = outer;
    }
    Ok(None)
}
