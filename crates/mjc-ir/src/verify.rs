//! Structural checks on lowered CFGs.
//!
//! Enforced after lowering and again after optimization:
//! - every block ends in exactly one terminator, and only at the end
//! - every branch target resolves to a block
//! - there is exactly one `exit` block and it holds the method's return
//! - every block reachable from the entry can reach `exit`
//! - numbered temporaries are assigned at most once per method

use std::collections::{HashMap, HashSet};

use crate::block::{Cfg, EXIT_LABEL};
use crate::instr::Instr;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("block %{0} has no terminator")]
    MissingTerminator(String),
    #[error("block %{0} has a terminator before its end")]
    EarlyTerminator(String),
    #[error("branch to unknown label %{0}")]
    UnresolvedLabel(String),
    #[error("method has no exit block")]
    NoExit,
    #[error("return outside the exit block, in %{0}")]
    ReturnOutsideExit(String),
    #[error("block %{0} cannot reach the exit")]
    ExitUnreachable(String),
    #[error("temporary {0} assigned more than once")]
    TempReassigned(String),
}

/// Check block structure, label resolution, and the single-exit property.
pub fn verify_cfg(cfg: &Cfg) -> Result<(), VerifyError> {
    let exit = cfg.exit().ok_or(VerifyError::NoExit)?;

    for (id, block) in cfg.blocks() {
        if block.terminator().is_none() {
            return Err(VerifyError::MissingTerminator(block.label.clone()));
        }
        for instr in &block.instrs[..block.instrs.len() - 1] {
            if instr.is_terminator() {
                return Err(VerifyError::EarlyTerminator(block.label.clone()));
            }
        }
        for target in block.instrs.last().unwrap().branch_targets() {
            if cfg.resolve(target).is_none() {
                return Err(VerifyError::UnresolvedLabel(target.to_string()));
            }
        }
        let is_return = matches!(
            block.terminator(),
            Some(Instr::Return { .. } | Instr::ReturnVoid)
        );
        if is_return && id != exit {
            return Err(VerifyError::ReturnOutsideExit(block.label.clone()));
        }
        if id == exit && !is_return {
            return Err(VerifyError::MissingTerminator(EXIT_LABEL.to_string()));
        }
    }

    // Reverse reachability from exit: every live block must be on some path
    // to the return.
    let preds = cfg.predecessor_map();
    let mut reaches_exit = HashSet::new();
    let mut queue = vec![exit];
    while let Some(id) = queue.pop() {
        if !reaches_exit.insert(id) {
            continue;
        }
        queue.extend(preds[id].iter().copied());
    }
    for id in cfg.reachable() {
        if !reaches_exit.contains(&id) {
            return Err(VerifyError::ExitUnreachable(cfg.block(id).label.clone()));
        }
    }

    Ok(())
}

/// Check the single-assignment property of numbered temporaries.
pub fn verify_temps(cfg: &Cfg) -> Result<(), VerifyError> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (_, block) in cfg.blocks() {
        for instr in &block.instrs {
            let Some(dest) = instr.def() else { continue };
            if !is_numbered_temp(dest) {
                continue;
            }
            // alloc/store reuse of the slot itself is not a redefinition;
            // only value-producing instructions count.
            if matches!(instr, Instr::Store { .. }) {
                continue;
            }
            *seen.entry(dest).or_insert(0) += 1;
            if seen[dest] > 1 {
                return Err(VerifyError::TempReassigned(dest.to_string()));
            }
        }
    }
    Ok(())
}

/// `%7` is a numbered temporary; `%x`, `%x.2`, `%this` are named slots.
pub fn is_numbered_temp(reg: &str) -> bool {
    reg.strip_prefix('%')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}
