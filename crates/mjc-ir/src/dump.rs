//! Textual form of MJIR.
//!
//! Opcodes carry their operand type as a suffix (`add_int`, `store_char[]`);
//! branch operands carry the `%` sigil (`jump %while.cond`). The pretty form
//! indents everything but labels and separates functions with blank lines.

use std::fmt;

use crate::instr::Instr;
use crate::module::Module;

fn write_alloc_suffix(f: &mut fmt::Formatter<'_>, len: Option<u32>) -> fmt::Result {
    if let Some(len) = len {
        write!(f, "_{len}")?;
    }
    Ok(())
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Label(name) => write!(f, "{name}:"),
            Instr::Define { ret, name, params } => {
                write!(f, "define_{ret} {name} (")?;
                for (i, (ty, reg)) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{ty} {reg}")?;
                }
                write!(f, ")")
            }
            Instr::Class { name, superclass } => match superclass {
                Some(sup) => write!(f, "class {name} {sup}"),
                None => write!(f, "class {name}"),
            },
            Instr::Field { ty, name, init } => match init {
                Some(value) => write!(f, "field_{ty} {name} {value}"),
                None => write!(f, "field_{ty} {name}"),
            },
            Instr::GlobalString { name, value } => {
                write!(f, "global_String {name} {value:?}")
            }
            Instr::GlobalArray {
                ty,
                len,
                name,
                values,
            } => {
                write!(f, "global_{ty}_{len} {name} [")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            Instr::Alloc { ty, len, dest } => {
                write!(f, "alloc_{ty}")?;
                write_alloc_suffix(f, *len)?;
                write!(f, " {dest}")
            }
            Instr::Store { ty, len, src, dest } => {
                write!(f, "store_{ty}")?;
                write_alloc_suffix(f, *len)?;
                write!(f, " {src} {dest}")
            }
            Instr::StoreElem { ty, src, arr, idx } => {
                write!(f, "store_{ty}_array {src} {arr} {idx}")
            }
            Instr::Load { ty, src, dest } => write!(f, "load_{ty} {src} {dest}"),
            Instr::LoadAddr { src, dest } => write!(f, "load_addr {src} {dest}"),
            Instr::Literal { ty, value, dest } => write!(f, "literal_{ty} {value} {dest}"),
            Instr::Binary {
                op,
                left,
                right,
                dest,
            } => write!(f, "{} {left} {right} {dest}", op.mnemonic()),
            Instr::Not { src, dest } => write!(f, "not_boolean {src} {dest}"),
            Instr::Elem { ty, arr, idx, dest } => write!(f, "elem_{ty} {arr} {idx} {dest}"),
            Instr::Length { src, dest } => write!(f, "length {src} {dest}"),
            Instr::Param { ty, src } => write!(f, "param_{ty} {src}"),
            Instr::Call { ty, target, dest } => write!(f, "call_{ty} {target} {dest}"),
            Instr::Return { ty, src } => write!(f, "return_{ty} {src}"),
            Instr::ReturnVoid => write!(f, "return_void"),
            Instr::Jump { target } => write!(f, "jump %{target}"),
            Instr::CBranch {
                cond,
                then_to,
                else_to,
            } => write!(f, "cbranch {cond} %{then_to} %{else_to}"),
            Instr::NewObject { class, dest } => write!(f, "new_@{class} {dest}"),
            Instr::NewArray { ty, size, dest } => write!(f, "new_array_{ty} {size} {dest}"),
            Instr::Print { ty, src } => write!(f, "print_{ty} {src}"),
        }
    }
}

/// One instruction per line, no indentation. The raw dump of the flattened
/// program.
pub fn dump_flat(instrs: &[Instr]) -> String {
    let mut out = String::new();
    for instr in instrs {
        out.push_str(&instr.to_string());
        out.push('\n');
    }
    out
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first_section = true;
        if !self.text.is_empty() {
            for instr in &self.text {
                writeln!(f, "{instr}")?;
            }
            first_section = false;
        }
        for class in &self.classes {
            if !first_section {
                writeln!(f)?;
            }
            first_section = false;
            writeln!(f, "{}", class.decl)?;
            for field in &class.fields {
                writeln!(f, "  {field}")?;
            }
        }
        for func in &self.functions {
            if !first_section {
                writeln!(f)?;
            }
            first_section = false;
            writeln!(f, "{}", func.define)?;
            for (_, block) in func.cfg.blocks() {
                for instr in &block.instrs {
                    match instr {
                        Instr::Label(_) => writeln!(f, "{instr}")?,
                        _ => writeln!(f, "  {instr}")?,
                    }
                }
            }
        }
        Ok(())
    }
}
