//! Basic blocks and per-method control-flow graphs.
//!
//! Blocks live in an arena indexed by [`BlockId`]; edges are derived from
//! block terminators rather than stored, so rewrites during optimization
//! cannot leave edges stale. Block order in the arena is emission order.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::instr::Instr;

pub type BlockId = usize;

/// Label of the distinguished exit block every method has.
pub const EXIT_LABEL: &str = "exit";

/// A maximal straight-line instruction sequence. The first instruction is
/// always the block's label pseudo-instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub label: String,
    pub instrs: Vec<Instr>,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let instrs = vec![Instr::Label(label.clone())];
        Self { label, instrs }
    }

    pub fn push(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    /// The trailing `jump`/`cbranch`/`return`, if the block has one.
    pub fn terminator(&self) -> Option<&Instr> {
        self.instrs.last().filter(|i| i.is_terminator())
    }

    /// Instructions after the leading label.
    pub fn body(&self) -> &[Instr] {
        &self.instrs[1..]
    }

    /// True when the block carries nothing but its label and an
    /// unconditional jump.
    pub fn is_trivial_jump(&self) -> bool {
        self.instrs.len() == 2 && matches!(self.instrs[1], Instr::Jump { .. })
    }
}

/// Control-flow graph of one method.
#[derive(Debug, Clone, Default)]
pub struct Cfg {
    blocks: Vec<BasicBlock>,
    by_label: IndexMap<String, BlockId>,
    reserved: HashSet<String>,
}

impl Cfg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block with the given (unique) label.
    pub fn add_block(&mut self, label: impl Into<String>) -> BlockId {
        let label = label.into();
        debug_assert!(!self.by_label.contains_key(&label), "duplicate label {label}");
        self.reserved.remove(&label);
        let id = self.blocks.len();
        self.by_label.insert(label.clone(), id);
        self.blocks.push(BasicBlock::new(label));
        id
    }

    /// Claim a label that is not yet in use: `base` itself when free,
    /// otherwise `base.1`, `base.2`, ...
    pub fn fresh_label(&mut self, base: &str) -> String {
        let taken =
            |l: &str, cfg: &Cfg| cfg.by_label.contains_key(l) || cfg.reserved.contains(l);
        let mut label = base.to_string();
        let mut n = 0;
        while taken(&label, self) {
            n += 1;
            label = format!("{base}.{n}");
        }
        self.reserved.insert(label.clone());
        label
    }

    pub fn resolve(&self, label: &str) -> Option<BlockId> {
        self.by_label.get(label).copied()
    }

    pub fn entry(&self) -> BlockId {
        0
    }

    pub fn exit(&self) -> Option<BlockId> {
        self.resolve(EXIT_LABEL)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id]
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &BasicBlock)> {
        self.blocks.iter().enumerate()
    }

    pub fn block_ids(&self) -> impl DoubleEndedIterator<Item = BlockId> + use<> {
        0..self.blocks.len()
    }

    /// Successor blocks, in terminator operand order.
    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        let Some(term) = self.blocks[id].terminator() else {
            return Vec::new();
        };
        term.branch_targets()
            .iter()
            .filter_map(|label| self.resolve(label))
            .collect()
    }

    /// Predecessor lists for every block.
    pub fn predecessor_map(&self) -> Vec<Vec<BlockId>> {
        let mut preds = vec![Vec::new(); self.blocks.len()];
        for id in self.block_ids() {
            for succ in self.successors(id) {
                preds[succ].push(id);
            }
        }
        preds
    }

    /// Blocks reachable from the entry.
    pub fn reachable(&self) -> HashSet<BlockId> {
        let mut seen = HashSet::new();
        if self.blocks.is_empty() {
            return seen;
        }
        let mut queue = vec![self.entry()];
        while let Some(id) = queue.pop() {
            if !seen.insert(id) {
                continue;
            }
            queue.extend(self.successors(id));
        }
        seen
    }

    /// Drop the given blocks, remapping every surviving id and label.
    pub fn retain_blocks(&mut self, dead: &HashSet<BlockId>) {
        if dead.is_empty() {
            return;
        }
        let blocks = std::mem::take(&mut self.blocks);
        self.by_label.clear();
        for (id, block) in blocks.into_iter().enumerate() {
            if dead.contains(&id) {
                continue;
            }
            let new_id = self.blocks.len();
            self.by_label.insert(block.label.clone(), new_id);
            self.blocks.push(block);
        }
    }
}
