//! MJIR instructions.
//!
//! Operands are register and symbol names in their printed form:
//! - `%x`, `%1`, `%this` - registers (named locals, numbered temporaries)
//! - `%x.2` - a local renamed to avoid shadowing an outer binding
//! - `%2.@A.n`, `%this.@A.n` - a field slot of the object held in a register
//! - `@A.m`, `@.str.0`, `@.const_a.1` - global symbols
//!
//! Branch targets are stored as bare label names; the printed form carries
//! the `%` sigil (`jump %if.end`).

/// Type suffix carried by typed opcodes (`add_int`, `store_char[]`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Boolean,
    Char,
    Int,
    Void,
    Str,
    IntArray,
    CharArray,
    StrArray,
    /// A user class, by name.
    Class(String),
}

impl IrType {
    /// Element type of an array suffix (`int[]` -> `int`).
    pub fn element(&self) -> Option<IrType> {
        match self {
            IrType::IntArray => Some(IrType::Int),
            IrType::CharArray => Some(IrType::Char),
            IrType::StrArray => Some(IrType::Str),
            _ => None,
        }
    }
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::Boolean => write!(f, "boolean"),
            IrType::Char => write!(f, "char"),
            IrType::Int => write!(f, "int"),
            IrType::Void => write!(f, "void"),
            IrType::Str => write!(f, "String"),
            IrType::IntArray => write!(f, "int[]"),
            IrType::CharArray => write!(f, "char[]"),
            IrType::StrArray => write!(f, "String[]"),
            IrType::Class(name) => write!(f, "{name}"),
        }
    }
}

/// A compile-time constant operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lit {
    Int(i32),
    Bool(bool),
    Char(char),
    /// A text-section symbol standing in for a string or array constant.
    Label(String),
}

impl std::fmt::Display for Lit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lit::Int(v) => write!(f, "{v}"),
            Lit::Bool(v) => write!(f, "{v}"),
            Lit::Char(c) => match c {
                '\n' => write!(f, "'\\n'"),
                '\t' => write!(f, "'\\t'"),
                '\'' => write!(f, "'\\''"),
                '\\' => write!(f, "'\\\\'"),
                c => write!(f, "'{c}'"),
            },
            Lit::Label(name) => f.write_str(name),
        }
    }
}

/// Binary opcodes. Arithmetic and relational families carry the `_int`
/// suffix, the logical family `_boolean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add_int",
            BinOp::Sub => "sub_int",
            BinOp::Mul => "mul_int",
            BinOp::Div => "div_int",
            BinOp::Mod => "mod_int",
            BinOp::Eq => "eq_int",
            BinOp::Ne => "ne_int",
            BinOp::Lt => "lt_int",
            BinOp::Le => "le_int",
            BinOp::Gt => "gt_int",
            BinOp::Ge => "ge_int",
            BinOp::And => "and_boolean",
            BinOp::Or => "or_boolean",
        }
    }

    /// True for the comparison family, whose result is a boolean.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

/// A single three-address instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// Block entry pseudo-instruction, printed `name:`.
    Label(String),
    /// Method header: `define_T @Class.m (T %1, ...)`.
    Define {
        ret: IrType,
        name: String,
        params: Vec<(IrType, String)>,
    },
    /// Class record: `class @A B`.
    Class {
        name: String,
        superclass: Option<String>,
    },
    /// Field record with optional constant initializer: `field_int @A.n 7`.
    Field {
        ty: IrType,
        name: String,
        init: Option<Lit>,
    },
    /// Deduplicated string constant in the text section.
    GlobalString { name: String, value: String },
    /// Constant array in the text section: `global_int[]_3 @.const_a.0 [1, 2, 3]`.
    GlobalArray {
        ty: IrType,
        len: u32,
        name: String,
        values: Vec<Lit>,
    },
    /// Reserve a local slot. Sized form (`alloc_int[]_3`) for initializer
    /// lists and string-backed char arrays.
    Alloc {
        ty: IrType,
        len: Option<u32>,
        dest: String,
    },
    /// Write a value into a register or address slot.
    Store {
        ty: IrType,
        len: Option<u32>,
        src: String,
        dest: String,
    },
    /// Write into an array element: `store_int_array %v %a %i`.
    StoreElem {
        ty: IrType,
        src: String,
        arr: String,
        idx: String,
    },
    /// Read a slot into a fresh temporary.
    Load {
        ty: IrType,
        src: String,
        dest: String,
    },
    /// Materialize the address of a field slot: `load_addr %2.@A.n %3`.
    LoadAddr { src: String, dest: String },
    Literal {
        ty: IrType,
        value: Lit,
        dest: String,
    },
    Binary {
        op: BinOp,
        left: String,
        right: String,
        dest: String,
    },
    Not { src: String, dest: String },
    /// Address of an array element: `elem_int[] %a %i %addr`.
    Elem {
        ty: IrType,
        arr: String,
        idx: String,
        dest: String,
    },
    Length { src: String, dest: String },
    Param { ty: IrType, src: String },
    /// Method call. The target carries the receiver register and the mangled
    /// method name (`%b.@B.get`); dispatch resolves on the receiver's class.
    Call {
        ty: IrType,
        target: String,
        dest: String,
    },
    Return { ty: IrType, src: String },
    ReturnVoid,
    Jump { target: String },
    CBranch {
        cond: String,
        then_to: String,
        else_to: String,
    },
    NewObject { class: String, dest: String },
    NewArray {
        ty: IrType,
        size: String,
        dest: String,
    },
    Print { ty: IrType, src: String },
}

/// The leading register of an operand: `%2.@A.n` reads register `%2`.
fn base_reg(operand: &str) -> Option<&str> {
    if !operand.starts_with('%') {
        return None;
    }
    Some(operand.split('.').next().unwrap_or(operand))
}

impl Instr {
    /// The register this instruction writes, if any.
    pub fn def(&self) -> Option<&str> {
        match self {
            Instr::Store { dest, .. }
            | Instr::Load { dest, .. }
            | Instr::LoadAddr { dest, .. }
            | Instr::Literal { dest, .. }
            | Instr::Binary { dest, .. }
            | Instr::Not { dest, .. }
            | Instr::Elem { dest, .. }
            | Instr::Length { dest, .. }
            | Instr::Call { dest, .. }
            | Instr::NewObject { dest, .. }
            | Instr::NewArray { dest, .. } => Some(dest),
            _ => None,
        }
    }

    /// Base registers this instruction reads.
    pub fn uses(&self) -> Vec<&str> {
        let operands: Vec<&str> = match self {
            Instr::Store { src, .. }
            | Instr::Load { src, .. }
            | Instr::LoadAddr { src, .. }
            | Instr::Not { src, .. }
            | Instr::Length { src, .. }
            | Instr::Param { src, .. }
            | Instr::Return { src, .. }
            | Instr::Print { src, .. } => vec![src],
            Instr::StoreElem { src, arr, idx, .. } => vec![src, arr, idx],
            Instr::Binary { left, right, .. } => vec![left, right],
            Instr::Elem { arr, idx, .. } => vec![arr, idx],
            Instr::Call { target, .. } => vec![target],
            Instr::CBranch { cond, .. } => vec![cond],
            Instr::NewArray { size, .. } => vec![size],
            _ => Vec::new(),
        };
        operands.into_iter().filter_map(base_reg).collect()
    }

    /// Instructions that must survive dead-code elimination regardless of
    /// liveness: observable effects, control flow, and structure records.
    pub fn has_side_effects(&self) -> bool {
        matches!(
            self,
            Instr::Label(_)
                | Instr::Define { .. }
                | Instr::Class { .. }
                | Instr::Field { .. }
                | Instr::GlobalString { .. }
                | Instr::GlobalArray { .. }
                | Instr::StoreElem { .. }
                | Instr::Param { .. }
                | Instr::Call { .. }
                | Instr::Return { .. }
                | Instr::ReturnVoid
                | Instr::Jump { .. }
                | Instr::CBranch { .. }
                | Instr::Print { .. }
        )
    }

    /// True for `jump`, `cbranch`, and both return forms.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instr::Jump { .. } | Instr::CBranch { .. } | Instr::Return { .. } | Instr::ReturnVoid
        )
    }

    /// Labels this instruction branches to.
    pub fn branch_targets(&self) -> Vec<&str> {
        match self {
            Instr::Jump { target } => vec![target],
            Instr::CBranch {
                then_to, else_to, ..
            } => vec![then_to, else_to],
            _ => Vec::new(),
        }
    }
}
