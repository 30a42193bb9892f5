//! Whole-program MJIR: text section, class records, and method bodies.

use crate::block::Cfg;
use crate::instr::Instr;

/// One lowered method: its `define_T` header plus the body CFG.
#[derive(Debug, Clone)]
pub struct Function {
    /// Mangled name, `@Class.method`.
    pub name: String,
    pub define: Instr,
    pub cfg: Cfg,
}

/// The `class` record of one class together with its `field_T` records.
#[derive(Debug, Clone)]
pub struct ClassRecord {
    pub decl: Instr,
    pub fields: Vec<Instr>,
}

/// A compiled program.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Global string and array constants, emitted first.
    pub text: Vec<Instr>,
    pub classes: Vec<ClassRecord>,
    pub functions: Vec<Function>,
}

impl Module {
    /// The final instruction list: text section, class and field records,
    /// then each method's blocks in emission order.
    pub fn flatten(&self) -> Vec<Instr> {
        let mut out = self.text.clone();
        for class in &self.classes {
            out.push(class.decl.clone());
            out.extend(class.fields.iter().cloned());
        }
        for func in &self.functions {
            out.push(func.define.clone());
            for (_, block) in func.cfg.blocks() {
                out.extend(block.instrs.iter().cloned());
            }
        }
        out
    }

    /// Instruction count of the flattened program, the unit of the
    /// optimizer's speedup ratio.
    pub fn instr_count(&self) -> usize {
        let body: usize = self
            .functions
            .iter()
            .map(|f| 1 + f.cfg.blocks().map(|(_, b)| b.instrs.len()).sum::<usize>())
            .sum();
        let records: usize = self.classes.iter().map(|c| 1 + c.fields.len()).sum();
        self.text.len() + records + body
    }
}
