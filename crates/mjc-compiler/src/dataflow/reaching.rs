//! Reaching definitions: a forward, union dataflow analysis.
//!
//! A definition is any instruction that writes a register, identified by
//! its (block, index) position. `gen[B]` holds the last definition of each
//! register in B, `kill[B]` every other definition of those registers;
//! `in`/`out` sets are iterated to a fixed point. The result is insensitive
//! to the order blocks are visited in.

use std::collections::{HashMap, HashSet};

use mjc_ir::{BlockId, Cfg};

/// A definition site: (block, instruction index within the block).
pub type Def = (BlockId, usize);

pub struct ReachingDefs {
    pub ins: Vec<HashSet<Def>>,
    pub outs: Vec<HashSet<Def>>,
    /// Register defined at each site.
    pub var_of: HashMap<Def, String>,
    /// All definition sites of each register.
    pub defs_of: HashMap<String, HashSet<Def>>,
}

impl ReachingDefs {
    /// Walk a block replaying kills, handing each instruction's reaching
    /// set for one register to the visitor.
    pub fn reaching_at<'c>(&self, cfg: &'c Cfg, block: BlockId) -> ReachingCursor<'c, '_> {
        let mut current: HashMap<&str, HashSet<Def>> = HashMap::new();
        for def in &self.ins[block] {
            current
                .entry(self.var_of[def].as_str())
                .or_default()
                .insert(*def);
        }
        ReachingCursor {
            cfg,
            rd: self,
            block,
            index: 0,
            current,
        }
    }
}

/// In-block cursor over reaching definitions, advanced one instruction at a
/// time.
pub struct ReachingCursor<'c, 'r> {
    cfg: &'c Cfg,
    rd: &'r ReachingDefs,
    block: BlockId,
    index: usize,
    current: HashMap<&'r str, HashSet<Def>>,
}

impl ReachingCursor<'_, '_> {
    /// Definitions of `reg` reaching the instruction at `index`. Call
    /// before [`advance`](Self::advance)-ing past it.
    pub fn reaching(&self, reg: &str) -> HashSet<Def> {
        self.current.get(reg).cloned().unwrap_or_default()
    }

    pub fn advance(&mut self) {
        let instr = &self.cfg.block(self.block).instrs[self.index];
        if let Some(dest) = instr.def() {
            let site = (self.block, self.index);
            if let Some(var) = self.rd.var_of.get(&site) {
                self.current.insert(var.as_str(), HashSet::from([site]));
            } else {
                // a site unknown to the analysis (instruction rewritten
                // since): kill conservatively
                self.current.remove(dest);
            }
        }
        self.index += 1;
    }
}

pub fn reaching_definitions(cfg: &Cfg) -> ReachingDefs {
    let mut var_of: HashMap<Def, String> = HashMap::new();
    let mut defs_of: HashMap<String, HashSet<Def>> = HashMap::new();
    for (block, data) in cfg.blocks() {
        for (index, instr) in data.instrs.iter().enumerate() {
            if let Some(dest) = instr.def() {
                var_of.insert((block, index), dest.to_string());
                defs_of
                    .entry(dest.to_string())
                    .or_default()
                    .insert((block, index));
            }
        }
    }

    let block_count = cfg.len();
    let mut r#gen = vec![HashSet::new(); block_count];
    let mut kill = vec![HashSet::new(); block_count];
    for (block, data) in cfg.blocks() {
        // last definition of each register wins within the block
        let mut last: HashMap<&str, Def> = HashMap::new();
        for (index, instr) in data.instrs.iter().enumerate() {
            if let Some(dest) = instr.def() {
                last.insert(dest, (block, index));
            }
        }
        for (var, def) in last {
            r#gen[block].insert(def);
            for other in &defs_of[var] {
                if *other != def {
                    kill[block].insert(*other);
                }
            }
        }
    }

    let preds = cfg.predecessor_map();
    let mut ins = vec![HashSet::new(); block_count];
    let mut outs = vec![HashSet::new(); block_count];
    let mut changed = true;
    while changed {
        changed = false;
        for block in cfg.block_ids() {
            let mut incoming: HashSet<Def> = HashSet::new();
            for pred in &preds[block] {
                incoming.extend(outs[*pred].iter().copied());
            }
            let mut outgoing: HashSet<Def> = r#gen[block].clone();
            outgoing.extend(incoming.difference(&kill[block]).copied());
            if incoming != ins[block] || outgoing != outs[block] {
                ins[block] = incoming;
                outs[block] = outgoing;
                changed = true;
            }
        }
    }

    ReachingDefs {
        ins,
        outs,
        var_of,
        defs_of,
    }
}
