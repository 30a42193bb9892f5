//! Runtime values.
//!
//! Arrays and objects live behind `Rc<RefCell<_>>`: every register holding
//! one aliases the same storage, which is what field and element writes
//! through other references require. Address values point into that
//! storage; `load`/`store` through them read and write the slot itself.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::error::RuntimeError;

#[derive(Debug, Clone, Default)]
pub struct Object {
    pub class: String,
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Uninit,
    Int(i32),
    Bool(bool),
    Char(char),
    Str(Rc<String>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Object>>),
    /// Address of `object.field`, produced by `load_addr`.
    FieldAddr {
        object: Rc<RefCell<Object>>,
        field: String,
    },
    /// Address of `array[index]`, produced by `elem_T`.
    ElemAddr {
        array: Rc<RefCell<Vec<Value>>>,
        index: usize,
    },
}

impl Value {
    pub fn as_int(&self) -> Result<i32, RuntimeError> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Char(c) => Ok(*c as i32),
            other => Err(RuntimeError::TypeError(format!("expected int, got {other:?}"))),
        }
    }

    pub fn as_bool(&self) -> Result<bool, RuntimeError> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(RuntimeError::TypeError(format!(
                "expected boolean, got {other:?}"
            ))),
        }
    }

    pub fn as_array(&self) -> Result<Rc<RefCell<Vec<Value>>>, RuntimeError> {
        match self {
            Value::Array(a) => Ok(a.clone()),
            other => Err(RuntimeError::TypeError(format!(
                "expected array, got {other:?}"
            ))),
        }
    }

    pub fn as_object(&self) -> Result<Rc<RefCell<Object>>, RuntimeError> {
        match self {
            Value::Object(o) => Ok(o.clone()),
            other => Err(RuntimeError::TypeError(format!(
                "expected object, got {other:?}"
            ))),
        }
    }

    /// Printable form for `print_T`.
    pub fn render(&self) -> Result<String, RuntimeError> {
        match self {
            Value::Int(v) => Ok(v.to_string()),
            Value::Char(c) => Ok(c.to_string()),
            Value::Bool(v) => Ok(v.to_string()),
            Value::Str(s) => Ok(s.as_str().to_string()),
            // a char[] prints as the text it spells
            Value::Array(a) => {
                let mut out = String::new();
                for v in a.borrow().iter() {
                    match v {
                        Value::Char(c) => out.push(*c),
                        other => {
                            return Err(RuntimeError::TypeError(format!(
                                "unprintable array element {other:?}"
                            )));
                        }
                    }
                }
                Ok(out)
            }
            other => Err(RuntimeError::TypeError(format!("unprintable value {other:?}"))),
        }
    }
}
