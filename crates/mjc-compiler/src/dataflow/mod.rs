//! The dataflow pass: classical analyses over per-method CFGs driving
//! constant propagation, dead-code elimination, and CFG cleanup.
//!
//! Per method, in order: constant propagation (backed by reaching
//! definitions), dead-code elimination (backed by live variables), then
//! jump short-circuiting, block merging, and unused-alloc removal. Each
//! step runs to its own fixed point.

mod liveness;
mod optimize;
mod reaching;
mod simplify;

#[cfg(test)]
mod liveness_tests;
#[cfg(test)]
mod reaching_tests;

use mjc_ir::{Cfg, Module};

pub use liveness::{Liveness, live_variables};
pub use reaching::{Def, ReachingDefs, reaching_definitions};

/// Instruction counts around the optimizer, for the speedup report.
#[derive(Debug, Clone, Copy)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
}

impl OptimizeStats {
    pub fn speedup(&self) -> f64 {
        self.before as f64 / self.after as f64
    }
}

/// Optimize every method of a module in place.
pub fn optimize(module: &mut Module) -> OptimizeStats {
    let before = module.instr_count();
    for func in &mut module.functions {
        optimize_cfg(&mut func.cfg);
    }
    let after = module.instr_count();
    OptimizeStats { before, after }
}

fn optimize_cfg(cfg: &mut Cfg) {
    optimize::constant_propagation(cfg);
    optimize::dead_code_elimination(cfg);
    simplify::short_circuit_jumps(cfg);
    simplify::merge_blocks(cfg);
    simplify::discard_unused_allocs(cfg);
}
