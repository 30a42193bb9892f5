//! The MJIR execution loop.
//!
//! `run` splits the flattened program into its text section, class records,
//! and function bodies, then calls `main`. Method calls recurse on the host
//! stack behind a configurable depth limit. Integer arithmetic wraps to 32
//! bits; division and modulo by zero, out-of-bounds indexing, and call
//! recursion past the limit fault with a [`RuntimeError`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use mjc_ir::{BinOp, Instr, IrType, Lit};

use super::error::RuntimeError;
use super::frame::Frame;
use super::value::{Object, Value};

pub struct Vm {
    recursion_limit: u32,
}

impl Default for Vm {
    fn default() -> Self {
        Self {
            recursion_limit: 1024,
        }
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Execute a flattened program, writing `print_T` output to `out`.
    /// Returns the exit code: 0, or 1 after an assertion failure.
    pub fn run(&self, instrs: &[Instr], out: &mut dyn Write) -> Result<i32, RuntimeError> {
        let mut exec = Executor::load(instrs, out, self.recursion_limit)?;
        let main = exec
            .functions
            .keys()
            .find(|name| name.ends_with(".main"))
            .cloned()
            .ok_or(RuntimeError::NoMain)?;
        let args = Value::Array(Rc::new(RefCell::new(Vec::new())));
        exec.call(&main, vec![args], None, 0)?;
        Ok(if exec.assert_failed { 1 } else { 0 })
    }
}

/// One global constant from the text section.
enum Global {
    Str(Rc<String>),
    /// Template; each `store` instantiates a fresh copy.
    Array(Vec<Value>),
}

struct ClassMeta {
    superclass: Option<String>,
    /// Field short names with their declared types, inherited included.
    fields: Vec<(String, IrType)>,
}

struct FuncCode<'p> {
    params: Vec<String>,
    instrs: &'p [Instr],
    labels: HashMap<&'p str, usize>,
}

struct Executor<'p, 'w> {
    globals: HashMap<String, Global>,
    classes: HashMap<String, ClassMeta>,
    functions: HashMap<String, FuncCode<'p>>,
    out: &'w mut dyn Write,
    /// Arguments queued by `param_T` for the next `call_T`.
    pending: Vec<Value>,
    assert_failed: bool,
    recursion_limit: u32,
}

impl<'p, 'w> Executor<'p, 'w> {
    fn load(
        instrs: &'p [Instr],
        out: &'w mut dyn Write,
        recursion_limit: u32,
    ) -> Result<Self, RuntimeError> {
        let mut globals = HashMap::new();
        let mut classes: HashMap<String, ClassMeta> = HashMap::new();
        let mut functions = HashMap::new();

        fn seal<'p>(
            instrs: &'p [Instr],
            current: &mut Option<(String, Vec<String>, usize)>,
            end: usize,
            functions: &mut HashMap<String, FuncCode<'p>>,
        ) {
            if let Some((name, params, start)) = current.take() {
                let body = &instrs[start..end];
                let labels = body
                    .iter()
                    .enumerate()
                    .filter_map(|(i, instr)| match instr {
                        Instr::Label(l) => Some((l.as_str(), i)),
                        _ => None,
                    })
                    .collect();
                functions.insert(
                    name,
                    FuncCode {
                        params,
                        instrs: body,
                        labels,
                    },
                );
            }
        }

        let mut current: Option<(String, Vec<String>, usize)> = None;
        for (index, instr) in instrs.iter().enumerate() {
            match instr {
                Instr::GlobalString { name, value } => {
                    seal(instrs, &mut current, index, &mut functions);
                    globals.insert(name.clone(), Global::Str(Rc::new(value.clone())));
                }
                Instr::GlobalArray { name, values, .. } => {
                    seal(instrs, &mut current, index, &mut functions);
                    let values = values.iter().map(lit_value).collect::<Result<_, _>>()?;
                    globals.insert(name.clone(), Global::Array(values));
                }
                Instr::Class { name, superclass } => {
                    seal(instrs, &mut current, index, &mut functions);
                    classes.insert(
                        name.trim_start_matches('@').to_string(),
                        ClassMeta {
                            superclass: superclass.clone(),
                            fields: Vec::new(),
                        },
                    );
                }
                Instr::Field { ty, name, .. } => {
                    seal(instrs, &mut current, index, &mut functions);
                    let (class, field) = split_qualified(name)?;
                    if let Some(meta) = classes.get_mut(class) {
                        meta.fields.push((field.to_string(), ty.clone()));
                    }
                }
                Instr::Define { name, params, .. } => {
                    seal(instrs, &mut current, index, &mut functions);
                    let params = params.iter().map(|(_, reg)| reg.clone()).collect();
                    current = Some((name.clone(), params, index + 1));
                }
                _ => {}
            }
        }
        seal(instrs, &mut current, instrs.len(), &mut functions);

        Ok(Self {
            globals,
            classes,
            functions,
            out,
            pending: Vec::new(),
            assert_failed: false,
            recursion_limit,
        })
    }

    fn call(
        &mut self,
        name: &str,
        args: Vec<Value>,
        this: Option<Value>,
        depth: u32,
    ) -> Result<Option<Value>, RuntimeError> {
        if depth > self.recursion_limit {
            return Err(RuntimeError::StackOverflow);
        }
        let func = self
            .functions
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownMethod(name.to_string()))?;
        let code = func.instrs;
        let param_regs = func.params.clone();

        let mut frame = Frame::new();
        for (reg, value) in param_regs.iter().zip(args) {
            frame.bind(reg.clone(), value);
        }
        if let Some(this) = this {
            frame.bind("%this", this);
        }

        let mut ip = 0usize;
        while ip < code.len() {
            match &code[ip] {
                Instr::Label(_) => {}
                Instr::Param { src, .. } => {
                    let value = self.value_of(&frame, src)?;
                    self.pending.push(value);
                }
                Instr::Alloc { dest, .. } => frame.bind(dest.clone(), Value::Uninit),
                Instr::Store { ty, src, dest, .. } => {
                    let mut value = self.value_of(&frame, src)?;
                    // char[] slots accept string constants, spelled out
                    if *ty == IrType::CharArray {
                        if let Value::Str(s) = &value {
                            let chars = s.chars().map(Value::Char).collect();
                            value = Value::Array(Rc::new(RefCell::new(chars)));
                        }
                    }
                    frame.write(dest, value);
                }
                Instr::StoreElem { src, arr, idx, .. } => {
                    let value = self.value_of(&frame, src)?;
                    let array = self.value_of(&frame, arr)?.as_array()?;
                    let index = self.value_of(&frame, idx)?.as_int()?;
                    let len = array.borrow().len();
                    if index < 0 || index as usize >= len {
                        return Err(RuntimeError::IndexOutOfBounds { index, len });
                    }
                    array.borrow_mut()[index as usize] = value;
                }
                Instr::Load { ty, src, dest } => {
                    let mut value = if src.starts_with('@') {
                        self.global_value(src)?
                    } else {
                        frame.read(src)?
                    };
                    if *ty == IrType::CharArray {
                        if let Value::Str(s) = &value {
                            let chars = s.chars().map(Value::Char).collect();
                            value = Value::Array(Rc::new(RefCell::new(chars)));
                        }
                    }
                    frame.write(dest, value);
                }
                Instr::LoadAddr { src, dest } => {
                    let addr = self.field_addr(&frame, src)?;
                    frame.bind(dest.clone(), addr);
                }
                Instr::Literal { value, dest, .. } => {
                    let value = match value {
                        Lit::Label(label) => self.global_value(label)?,
                        lit => lit_value(lit)?,
                    };
                    frame.write(dest, value);
                }
                Instr::Binary {
                    op,
                    left,
                    right,
                    dest,
                } => {
                    let l = self.value_of(&frame, left)?;
                    let r = self.value_of(&frame, right)?;
                    let value = binary(*op, l, r)?;
                    frame.write(dest, value);
                }
                Instr::Not { src, dest } => {
                    let value = Value::Bool(!self.value_of(&frame, src)?.as_bool()?);
                    frame.write(dest, value);
                }
                Instr::Elem { arr, idx, dest, .. } => {
                    let array = self.value_of(&frame, arr)?.as_array()?;
                    let index = self.value_of(&frame, idx)?.as_int()?;
                    let len = array.borrow().len();
                    if index < 0 || index as usize >= len {
                        return Err(RuntimeError::IndexOutOfBounds { index, len });
                    }
                    frame.bind(
                        dest.clone(),
                        Value::ElemAddr {
                            array,
                            index: index as usize,
                        },
                    );
                }
                Instr::Length { src, dest } => {
                    let value = match self.value_of(&frame, src)? {
                        Value::Array(a) => Value::Int(a.borrow().len() as i32),
                        Value::Str(s) => Value::Int(s.chars().count() as i32),
                        other => {
                            return Err(RuntimeError::TypeError(format!(
                                "length of {other:?}"
                            )));
                        }
                    };
                    frame.write(dest, value);
                }
                Instr::Call { target, dest, .. } => {
                    let (receiver, method) = self.resolve_call(&frame, target)?;
                    let argc = self
                        .functions
                        .get(&method)
                        .map(|f| f.params.len())
                        .unwrap_or(0);
                    let split = self.pending.len().saturating_sub(argc);
                    let args = self.pending.split_off(split);
                    let result = self.call(&method, args, Some(receiver), depth + 1)?;
                    frame.bind(dest.clone(), result.unwrap_or_default());
                }
                Instr::Return { src, .. } => {
                    return Ok(Some(self.value_of(&frame, src)?));
                }
                Instr::ReturnVoid => return Ok(None),
                Instr::Jump { target } => {
                    ip = self.jump_target(name, target)?;
                    continue;
                }
                Instr::CBranch {
                    cond,
                    then_to,
                    else_to,
                } => {
                    let taken = if self.value_of(&frame, cond)?.as_bool()? {
                        then_to
                    } else {
                        else_to
                    };
                    ip = self.jump_target(name, taken)?;
                    continue;
                }
                Instr::NewObject { class, dest } => {
                    let object = self.instantiate(class)?;
                    frame.write(dest, object);
                }
                Instr::NewArray { ty, size, dest } => {
                    let len = self.value_of(&frame, size)?.as_int()?;
                    if len < 0 {
                        return Err(RuntimeError::IndexOutOfBounds {
                            index: len,
                            len: 0,
                        });
                    }
                    let fill = default_value(&ty.element().unwrap_or(IrType::Int));
                    let values = vec![fill; len as usize];
                    frame.bind(dest.clone(), Value::Array(Rc::new(RefCell::new(values))));
                }
                Instr::Print { src, .. } => {
                    let value = self.value_of(&frame, src)?;
                    let text = value.render()?;
                    writeln!(self.out, "{text}")?;
                    if text.starts_with("assertion_fail") {
                        self.assert_failed = true;
                    }
                }
                // structure records never appear inside a body
                Instr::Define { .. }
                | Instr::Class { .. }
                | Instr::Field { .. }
                | Instr::GlobalString { .. }
                | Instr::GlobalArray { .. } => {}
            }
            ip += 1;
        }
        Ok(None)
    }

    fn jump_target(&self, func: &str, label: &str) -> Result<usize, RuntimeError> {
        self.functions[func]
            .labels
            .get(label)
            .copied()
            .ok_or_else(|| RuntimeError::UnknownLabel(label.to_string()))
    }

    fn value_of(&self, frame: &Frame, operand: &str) -> Result<Value, RuntimeError> {
        if operand.starts_with('@') {
            self.global_value(operand)
        } else {
            frame.read(operand)
        }
    }

    fn global_value(&self, name: &str) -> Result<Value, RuntimeError> {
        match self.globals.get(name) {
            Some(Global::Str(s)) => Ok(Value::Str(s.clone())),
            Some(Global::Array(template)) => {
                Ok(Value::Array(Rc::new(RefCell::new(template.clone()))))
            }
            None => Err(RuntimeError::UnsetRegister(name.to_string())),
        }
    }

    /// `%obj.@Class.field` to an address value.
    fn field_addr(&self, frame: &Frame, operand: &str) -> Result<Value, RuntimeError> {
        let (base, qualified) = operand.split_once(".@").ok_or_else(|| {
            RuntimeError::TypeError(format!("malformed field reference {operand}"))
        })?;
        let (_, field) = qualified
            .split_once('.')
            .ok_or_else(|| RuntimeError::TypeError(format!("malformed field reference {operand}")))?;
        let object = frame.read(base)?.as_object()?;
        Ok(Value::FieldAddr {
            object,
            field: field.to_string(),
        })
    }

    /// Resolve `%recv.@Class.method`: dispatch on the receiver's runtime
    /// class, walking its superclass chain, with the static class as the
    /// fallback.
    fn resolve_call(&self, frame: &Frame, target: &str) -> Result<(Value, String), RuntimeError> {
        let (base, qualified) = target.split_once(".@").ok_or_else(|| {
            RuntimeError::UnknownMethod(target.to_string())
        })?;
        let (static_class, method) = qualified
            .split_once('.')
            .ok_or_else(|| RuntimeError::UnknownMethod(target.to_string()))?;
        let receiver = frame.read(base)?;
        let object = receiver.as_object()?;

        let mut class = Some(object.borrow().class.clone());
        while let Some(name) = class {
            let candidate = format!("@{name}.{method}");
            if self.functions.contains_key(&candidate) {
                return Ok((receiver, candidate));
            }
            class = self
                .classes
                .get(&name)
                .and_then(|meta| meta.superclass.clone());
        }
        Ok((receiver, format!("@{static_class}.{method}")))
    }

    fn instantiate(&self, class: &str) -> Result<Value, RuntimeError> {
        let meta = self
            .classes
            .get(class)
            .ok_or_else(|| RuntimeError::UnknownMethod(format!("@{class}")))?;
        let mut fields = HashMap::new();
        for (name, ty) in &meta.fields {
            fields.insert(name.clone(), default_value(ty));
        }
        Ok(Value::Object(Rc::new(RefCell::new(Object {
            class: class.to_string(),
            fields,
        }))))
    }
}

fn split_qualified(name: &str) -> Result<(&str, &str), RuntimeError> {
    name.trim_start_matches('@')
        .split_once('.')
        .ok_or_else(|| RuntimeError::TypeError(format!("malformed symbol {name}")))
}

fn lit_value(lit: &Lit) -> Result<Value, RuntimeError> {
    match lit {
        Lit::Int(v) => Ok(Value::Int(*v)),
        Lit::Bool(v) => Ok(Value::Bool(*v)),
        Lit::Char(v) => Ok(Value::Char(*v)),
        Lit::Label(name) => Err(RuntimeError::TypeError(format!(
            "unresolved constant {name}"
        ))),
    }
}

fn default_value(ty: &IrType) -> Value {
    match ty {
        IrType::Int => Value::Int(0),
        IrType::Boolean => Value::Bool(false),
        IrType::Char => Value::Char('\0'),
        _ => Value::Uninit,
    }
}

fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, RuntimeError> {
    use BinOp::*;
    match op {
        Add | Sub | Mul | Div | Mod => match (&l, &r) {
            (Value::Str(a), Value::Str(b)) if op == Add => {
                Ok(Value::Str(Rc::new(format!("{a}{b}"))))
            }
            (Value::Char(_), Value::Char(_)) => {
                let v = int_arith(op, l.as_int()?, r.as_int()?)?;
                Ok(Value::Char(char::from_u32(v as u32).unwrap_or('\0')))
            }
            _ => Ok(Value::Int(int_arith(op, l.as_int()?, r.as_int()?)?)),
        },
        Eq => Ok(Value::Bool(equal(&l, &r))),
        Ne => Ok(Value::Bool(!equal(&l, &r))),
        Lt | Le | Gt | Ge => {
            let (a, b) = (l.as_int()?, r.as_int()?);
            let v = match op {
                Lt => a < b,
                Le => a <= b,
                Gt => a > b,
                Ge => a >= b,
                _ => unreachable!(),
            };
            Ok(Value::Bool(v))
        }
        And => Ok(Value::Bool(l.as_bool()? && r.as_bool()?)),
        Or => Ok(Value::Bool(l.as_bool()? || r.as_bool()?)),
    }
}

fn int_arith(op: BinOp, a: i32, b: i32) -> Result<i32, RuntimeError> {
    use BinOp::*;
    Ok(match op {
        Add => a.wrapping_add(b),
        Sub => a.wrapping_sub(b),
        Mul => a.wrapping_mul(b),
        Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            a.wrapping_div(b)
        }
        Mod => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            a.wrapping_rem(b)
        }
        _ => unreachable!("not an arithmetic opcode"),
    })
}

fn equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Char(a), Value::Char(b)) => a == b,
        (Value::Int(a), Value::Char(b)) | (Value::Char(b), Value::Int(a)) => *a == *b as i32,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        (Value::Uninit, Value::Uninit) => true,
        _ => false,
    }
}
