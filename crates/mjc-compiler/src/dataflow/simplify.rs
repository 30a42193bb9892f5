//! Control-flow simplification after the value-level optimizations.
//!
//! Three passes, each to a fixed point:
//! - short-circuit blocks holding nothing but a label and a `jump`,
//!   redirecting their predecessors past them
//! - merge a block into its unique predecessor when that predecessor jumps
//!   straight to it
//! - drop `alloc` slots no load or store mentions anymore

use std::collections::HashSet;

use mjc_ir::block::EXIT_LABEL;
use mjc_ir::{BlockId, Cfg, Instr};

pub fn short_circuit_jumps(cfg: &mut Cfg) {
    loop {
        let Some((id, label, target)) = find_trivial_jump(cfg) else {
            return;
        };
        for block in cfg.block_ids() {
            if block == id {
                continue;
            }
            if let Some(term) = cfg.block_mut(block).instrs.last_mut() {
                redirect(term, &label, &target);
            }
        }
        cfg.retain_blocks(&HashSet::from([id]));
    }
}

fn find_trivial_jump(cfg: &Cfg) -> Option<(BlockId, String, String)> {
    for (id, block) in cfg.blocks() {
        if id == cfg.entry() || !block.is_trivial_jump() {
            continue;
        }
        let Some(Instr::Jump { target }) = block.terminator() else {
            continue;
        };
        // a self-loop has nothing to forward to
        if *target == block.label {
            continue;
        }
        return Some((id, block.label.clone(), target.clone()));
    }
    None
}

fn redirect(term: &mut Instr, from: &str, to: &str) {
    match term {
        Instr::Jump { target } if target == from => *target = to.to_string(),
        Instr::CBranch {
            then_to, else_to, ..
        } => {
            if then_to == from {
                *then_to = to.to_string();
            }
            if else_to == from {
                *else_to = to.to_string();
            }
        }
        _ => {}
    }
}

pub fn merge_blocks(cfg: &mut Cfg) {
    loop {
        let Some((pred, succ)) = find_mergeable(cfg) else {
            return;
        };
        let mut tail: Vec<Instr> = cfg.block(succ).body().to_vec();
        let pred_block = cfg.block_mut(pred);
        pred_block.instrs.pop(); // the jump into succ
        pred_block.instrs.append(&mut tail);
        cfg.retain_blocks(&HashSet::from([succ]));
    }
}

fn find_mergeable(cfg: &Cfg) -> Option<(BlockId, BlockId)> {
    let preds = cfg.predecessor_map();
    for (id, block) in cfg.blocks() {
        let Some(Instr::Jump { target }) = block.terminator() else {
            continue;
        };
        // the exit block stays distinguished
        if target == EXIT_LABEL {
            continue;
        }
        let Some(succ) = cfg.resolve(target) else {
            continue;
        };
        if succ == cfg.entry() || succ == id {
            continue;
        }
        if preds[succ].len() == 1 {
            return Some((id, succ));
        }
    }
    None
}

pub fn discard_unused_allocs(cfg: &mut Cfg) {
    let mut referenced: HashSet<String> = HashSet::new();
    for (_, block) in cfg.blocks() {
        for instr in &block.instrs {
            if matches!(instr, Instr::Alloc { .. }) {
                continue;
            }
            for used in instr.uses() {
                referenced.insert(used.to_string());
            }
            if let Some(dest) = instr.def() {
                referenced.insert(dest.to_string());
            }
        }
    }
    for block in cfg.block_ids() {
        cfg.block_mut(block).instrs.retain(|instr| match instr {
            Instr::Alloc { dest, .. } => referenced.contains(dest),
            _ => true,
        });
    }
}
