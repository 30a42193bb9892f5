//! Constant propagation and dead-code elimination.
//!
//! Propagation is an iterative rewrite: each round recomputes reaching
//! definitions, resolves which definition sites hold known constants
//! (literals, and copies through `store`/`load` chains), then replaces
//! loads of known constants with `literal_T` and folds instructions whose
//! operands are all known. Rounds repeat until nothing changes; every
//! rewrite strictly reduces the number of non-literal instructions, so the
//! loop terminates.
//!
//! Elimination removes instructions whose only effect is a register dead at
//! that point. Calls, prints, params, branches, and stores through
//! materialized addresses always survive.

use std::collections::{HashMap, HashSet};

use mjc_ir::{BinOp, Cfg, Instr, IrType, Lit};

use super::liveness::live_variables;
use super::reaching::{Def, reaching_definitions};

/// Lattice value of a definition site.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Unknown,
    Known(Lit),
    NonConst,
}

impl Value {
    fn meet(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Unknown, v) | (v, Value::Unknown) => v.clone(),
            (Value::NonConst, _) | (_, Value::NonConst) => Value::NonConst,
            (Value::Known(a), Value::Known(b)) if a == b => Value::Known(a.clone()),
            _ => Value::NonConst,
        }
    }
}

/// How a definition site computes its value, in terms of other sites.
enum Flow {
    Literal(Lit),
    /// `store`/`load` copy: value of the copied register at that point.
    Copy(Vec<Def>),
    Opaque,
}

pub fn constant_propagation(cfg: &mut Cfg) {
    while propagate_round(cfg) {}
}

fn propagate_round(cfg: &mut Cfg) -> bool {
    let rd = reaching_definitions(cfg);

    // Dependency graph of definition sites, plus the reaching sets of every
    // operand we might substitute or fold.
    let mut flows: HashMap<Def, Flow> = HashMap::new();
    let mut operand_defs: HashMap<(Def, usize), Vec<Def>> = HashMap::new();
    for block in cfg.block_ids() {
        let mut cursor = rd.reaching_at(cfg, block);
        for (index, instr) in cfg.block(block).instrs.iter().enumerate() {
            let site = (block, index);
            for (slot, used) in instr.uses().iter().enumerate() {
                let mut defs: Vec<Def> = cursor.reaching(used).into_iter().collect();
                defs.sort_unstable();
                operand_defs.insert((site, slot), defs);
            }
            let flow = match instr {
                Instr::Literal { value, .. } => Flow::Literal(value.clone()),
                Instr::Store { src, .. } | Instr::Load { src, .. } => {
                    let mut defs: Vec<Def> = cursor.reaching(src).into_iter().collect();
                    defs.sort_unstable();
                    Flow::Copy(defs)
                }
                _ => Flow::Opaque,
            };
            if instr.def().is_some() {
                flows.insert(site, flow);
            }
            cursor.advance();
        }
    }

    // Resolve the lattice.
    let mut values: HashMap<Def, Value> =
        flows.keys().map(|site| (*site, Value::Unknown)).collect();
    let mut changed = true;
    while changed {
        changed = false;
        for (site, flow) in &flows {
            let next = match flow {
                Flow::Literal(lit) => Value::Known(lit.clone()),
                Flow::Copy(defs) => meet_sites(defs, &values),
                Flow::Opaque => Value::NonConst,
            };
            if values[site] != next {
                values.insert(*site, next);
                changed = true;
            }
        }
    }

    let operand_value = |site: Def, slot: usize| -> Value {
        match operand_defs.get(&(site, slot)) {
            Some(defs) if !defs.is_empty() => meet_sites(defs, &values),
            _ => Value::NonConst,
        }
    };

    // Rewrite.
    let mut rewrote = false;
    for block in cfg.block_ids() {
        for index in 0..cfg.block(block).instrs.len() {
            let site = (block, index);
            let replacement = match &cfg.block(block).instrs[index] {
                Instr::Load { ty, dest, .. } => match operand_value(site, 0) {
                    Value::Known(value) => Some(Instr::Literal {
                        ty: ty.clone(),
                        value,
                        dest: dest.clone(),
                    }),
                    _ => None,
                },
                Instr::Binary { op, dest, .. } => {
                    match (operand_value(site, 0), operand_value(site, 1)) {
                        (Value::Known(left), Value::Known(right)) => fold_binary(*op, &left, &right)
                            .map(|(ty, value)| Instr::Literal {
                                ty,
                                value,
                                dest: dest.clone(),
                            }),
                        _ => None,
                    }
                }
                Instr::Not { dest, .. } => match operand_value(site, 0) {
                    Value::Known(Lit::Bool(v)) => Some(Instr::Literal {
                        ty: IrType::Boolean,
                        value: Lit::Bool(!v),
                        dest: dest.clone(),
                    }),
                    _ => None,
                },
                _ => None,
            };
            if let Some(replacement) = replacement {
                cfg.block_mut(block).instrs[index] = replacement;
                rewrote = true;
            }
        }
    }
    rewrote
}

fn meet_sites(defs: &[Def], values: &HashMap<Def, Value>) -> Value {
    if defs.is_empty() {
        return Value::NonConst;
    }
    let mut acc = Value::Unknown;
    for def in defs {
        let v = values.get(def).cloned().unwrap_or(Value::NonConst);
        acc = acc.meet(&v);
    }
    acc
}

/// Fold a binary instruction over constant operands. Division and modulo by
/// a zero constant are left alone: the fault belongs to the runtime.
fn fold_binary(op: BinOp, left: &Lit, right: &Lit) -> Option<(IrType, Lit)> {
    use BinOp::*;
    match (left, right) {
        (Lit::Int(a), Lit::Int(b)) => {
            let (a, b) = (*a, *b);
            let folded = match op {
                Add => (IrType::Int, Lit::Int(a.wrapping_add(b))),
                Sub => (IrType::Int, Lit::Int(a.wrapping_sub(b))),
                Mul => (IrType::Int, Lit::Int(a.wrapping_mul(b))),
                Div if b != 0 => (IrType::Int, Lit::Int(a.wrapping_div(b))),
                Mod if b != 0 => (IrType::Int, Lit::Int(a.wrapping_rem(b))),
                Eq => (IrType::Boolean, Lit::Bool(a == b)),
                Ne => (IrType::Boolean, Lit::Bool(a != b)),
                Lt => (IrType::Boolean, Lit::Bool(a < b)),
                Le => (IrType::Boolean, Lit::Bool(a <= b)),
                Gt => (IrType::Boolean, Lit::Bool(a > b)),
                Ge => (IrType::Boolean, Lit::Bool(a >= b)),
                _ => return None,
            };
            Some(folded)
        }
        (Lit::Char(a), Lit::Char(b)) if op.is_relational() => {
            let value = match op {
                Eq => a == b,
                Ne => a != b,
                Lt => a < b,
                Le => a <= b,
                Gt => a > b,
                Ge => a >= b,
                _ => unreachable!(),
            };
            Some((IrType::Boolean, Lit::Bool(value)))
        }
        (Lit::Bool(a), Lit::Bool(b)) => {
            let value = match op {
                And => *a && *b,
                Or => *a || *b,
                Eq => a == b,
                Ne => a != b,
                _ => return None,
            };
            Some((IrType::Boolean, Lit::Bool(value)))
        }
        _ => None,
    }
}

pub fn dead_code_elimination(cfg: &mut Cfg) {
    while eliminate_round(cfg) {}
}

fn eliminate_round(cfg: &mut Cfg) -> bool {
    let lv = live_variables(cfg);

    // Stores through these registers write memory the register names only
    // indirectly; they must survive.
    let address_temps: HashSet<String> = cfg
        .blocks()
        .flat_map(|(_, b)| b.instrs.iter())
        .filter_map(|instr| match instr {
            Instr::LoadAddr { dest, .. } | Instr::Elem { dest, .. } => Some(dest.clone()),
            _ => None,
        })
        .collect();

    let mut removed = false;
    for block in cfg.block_ids() {
        let mut live = lv.outs[block].clone();
        let instrs = std::mem::take(&mut cfg.block_mut(block).instrs);
        let mut kept = Vec::with_capacity(instrs.len());
        for instr in instrs.into_iter().rev() {
            let removable = match instr.def() {
                Some(dest) if !live.contains(dest) && !instr.has_side_effects() => {
                    match &instr {
                        Instr::Store { dest, .. } => !address_temps.contains(dest),
                        _ => true,
                    }
                }
                _ => false,
            };
            if removable {
                removed = true;
                continue;
            }
            if let Some(dest) = instr.def() {
                live.remove(dest);
            }
            for used in instr.uses() {
                live.insert(used.to_string());
            }
            kept.push(instr);
        }
        kept.reverse();
        cfg.block_mut(block).instrs = kept;
    }
    removed
}
