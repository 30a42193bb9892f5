use crate::block::Cfg;
use crate::instr::{BinOp, Instr, IrType, Lit};

fn diamond() -> Cfg {
    // entry -> (then | else) -> exit
    let mut cfg = Cfg::new();
    let entry = cfg.add_block("entry");
    cfg.block_mut(entry).push(Instr::Literal {
        ty: IrType::Boolean,
        value: Lit::Bool(true),
        dest: "%1".into(),
    });
    cfg.block_mut(entry).push(Instr::CBranch {
        cond: "%1".into(),
        then_to: "if.then".into(),
        else_to: "if.end".into(),
    });
    let then = cfg.add_block("if.then");
    cfg.block_mut(then).push(Instr::Jump {
        target: "if.end".into(),
    });
    let end = cfg.add_block("if.end");
    cfg.block_mut(end).push(Instr::Jump {
        target: "exit".into(),
    });
    let exit = cfg.add_block("exit");
    cfg.block_mut(exit).push(Instr::ReturnVoid);
    cfg
}

#[test]
fn successors_follow_terminator_operands() {
    let cfg = diamond();
    assert_eq!(cfg.successors(0), vec![1, 2]);
    assert_eq!(cfg.successors(1), vec![2]);
    assert_eq!(cfg.successors(2), vec![3]);
    assert!(cfg.successors(3).is_empty());
}

#[test]
fn predecessors_invert_successors() {
    let cfg = diamond();
    let preds = cfg.predecessor_map();
    assert!(preds[0].is_empty());
    assert_eq!(preds[1], vec![0]);
    assert_eq!(preds[2], vec![0, 1]);
    assert_eq!(preds[3], vec![2]);
}

#[test]
fn fresh_label_suffixes_collisions() {
    let mut cfg = Cfg::new();
    cfg.add_block("if.then");
    assert_eq!(cfg.fresh_label("if.then"), "if.then.1");
    // reserved but not yet added labels also collide
    assert_eq!(cfg.fresh_label("if.then"), "if.then.2");
    assert_eq!(cfg.fresh_label("while.cond"), "while.cond");
}

#[test]
fn retain_blocks_remaps_labels() {
    let mut cfg = diamond();
    // short-circuit if.then out of the graph
    cfg.block_mut(0).instrs.pop();
    cfg.block_mut(0).push(Instr::CBranch {
        cond: "%1".into(),
        then_to: "if.end".into(),
        else_to: "if.end".into(),
    });
    let dead = std::collections::HashSet::from([1usize]);
    cfg.retain_blocks(&dead);
    assert_eq!(cfg.len(), 3);
    assert_eq!(cfg.resolve("if.end"), Some(1));
    assert_eq!(cfg.resolve("exit"), Some(2));
    assert_eq!(cfg.successors(0), vec![1, 1]);
}

#[test]
fn uses_strip_field_suffixes() {
    let instr = Instr::LoadAddr {
        src: "%2.@A.n".into(),
        dest: "%3".into(),
    };
    assert_eq!(instr.uses(), vec!["%2"]);
    assert_eq!(instr.def(), Some("%3"));

    let call = Instr::Call {
        ty: IrType::Int,
        target: "%b.@B.get".into(),
        dest: "%4".into(),
    };
    assert_eq!(call.uses(), vec!["%b"]);
}

#[test]
fn globals_are_not_uses() {
    let instr = Instr::Binary {
        op: BinOp::Add,
        left: "%1".into(),
        right: "%2".into(),
        dest: "%3".into(),
    };
    assert_eq!(instr.uses(), vec!["%1", "%2"]);

    let print = Instr::Print {
        ty: IrType::Str,
        src: "@.str.0".into(),
    };
    assert!(print.uses().is_empty());
}
