//! Live variables: a backward, union dataflow analysis.
//!
//! `use[B]` holds registers read in B before any write, `def[B]` registers
//! written; `in`/`out` sets are iterated to a fixed point over the reversed
//! flow.

use std::collections::HashSet;

use mjc_ir::Cfg;

pub struct Liveness {
    pub ins: Vec<HashSet<String>>,
    pub outs: Vec<HashSet<String>>,
}

pub fn live_variables(cfg: &Cfg) -> Liveness {
    let block_count = cfg.len();
    let mut uses = vec![HashSet::new(); block_count];
    let mut defs = vec![HashSet::new(); block_count];
    for (block, data) in cfg.blocks() {
        for instr in &data.instrs {
            for used in instr.uses() {
                if !defs[block].contains(used) {
                    uses[block].insert(used.to_string());
                }
            }
            if let Some(dest) = instr.def() {
                defs[block].insert(dest.to_string());
            }
        }
    }

    let mut ins = vec![HashSet::new(); block_count];
    let mut outs = vec![HashSet::new(); block_count];
    let mut changed = true;
    while changed {
        changed = false;
        for block in cfg.block_ids().rev() {
            let mut outgoing: HashSet<String> = HashSet::new();
            for succ in cfg.successors(block) {
                outgoing.extend(ins[succ].iter().cloned());
            }
            let mut incoming: HashSet<String> = uses[block].clone();
            incoming.extend(outgoing.difference(&defs[block]).cloned());
            if incoming != ins[block] || outgoing != outs[block] {
                ins[block] = incoming;
                outs[block] = outgoing;
                changed = true;
            }
        }
    }

    Liveness { ins, outs }
}
