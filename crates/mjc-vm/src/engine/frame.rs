//! Call frames: one register file per activation.
//!
//! A `store` into a register holding an address value writes through it;
//! everything else rebinds the register. `load` reads through addresses the
//! same way.

use std::collections::HashMap;

use crate::engine::error::RuntimeError;
use crate::engine::value::Value;

#[derive(Debug, Default)]
pub struct Frame {
    regs: HashMap<String, Value>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, reg: impl Into<String>, value: Value) {
        self.regs.insert(reg.into(), value);
    }

    pub fn get(&self, reg: &str) -> Result<Value, RuntimeError> {
        self.regs
            .get(reg)
            .cloned()
            .ok_or_else(|| RuntimeError::UnsetRegister(reg.to_string()))
    }

    /// Read a register, following an address value into the heap.
    pub fn read(&self, reg: &str) -> Result<Value, RuntimeError> {
        match self.get(reg)? {
            Value::FieldAddr { object, field } => Ok(object
                .borrow()
                .fields
                .get(&field)
                .cloned()
                .unwrap_or_default()),
            Value::ElemAddr { array, index } => {
                Ok(array.borrow().get(index).cloned().unwrap_or_default())
            }
            value => Ok(value),
        }
    }

    /// Write a register, following an address value into the heap.
    pub fn write(&mut self, reg: &str, value: Value) {
        match self.regs.get(reg) {
            Some(Value::FieldAddr { object, field }) => {
                object.borrow_mut().fields.insert(field.clone(), value);
            }
            Some(Value::ElemAddr { array, index }) => {
                let mut array = array.borrow_mut();
                let index = *index;
                if index < array.len() {
                    array[index] = value;
                }
            }
            _ => {
                self.regs.insert(reg.to_string(), value);
            }
        }
    }
}
