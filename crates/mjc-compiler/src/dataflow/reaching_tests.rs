use indoc::indoc;

use mjc_ir::{Cfg, Instr};

use crate::analyze::analyze;
use crate::codegen::lower;
use crate::dataflow::reaching_definitions;
use crate::parser::parse_program;

fn main_cfg(source: &str) -> Cfg {
    let program = parse_program(source).expect("parses");
    let analysis = analyze(&program).expect("analyzes");
    let module = lower(&program, &analysis);
    module.functions.into_iter().next().expect("main").cfg
}

#[test]
fn straight_line_definitions_reach_their_uses() {
    let cfg = main_cfg(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int x = 2;
                print(x);
            }
        }
    "#});
    let rd = reaching_definitions(&cfg);
    assert_eq!(rd.defs_of["%x"].len(), 1);
    let store_site = *rd.defs_of["%x"].iter().next().unwrap();

    // advance the cursor to the load of %x and ask what reaches it
    let entry = cfg.entry();
    let mut cursor = rd.reaching_at(&cfg, entry);
    for instr in &cfg.block(entry).instrs {
        if matches!(instr, Instr::Load { src, .. } if src == "%x") {
            assert_eq!(cursor.reaching("%x"), std::collections::HashSet::from([store_site]));
            return;
        }
        cursor.advance();
    }
    panic!("no load of %x found");
}

#[test]
fn loop_headers_merge_definitions_from_both_paths() {
    let cfg = main_cfg(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int i = 0;
                while (i < 3) {
                    i = i + 1;
                }
                print(i);
            }
        }
    "#});
    let rd = reaching_definitions(&cfg);
    let cond = cfg.resolve("while.cond").expect("loop header");
    let reaching_i: Vec<_> = rd.ins[cond]
        .iter()
        .filter(|def| rd.var_of[*def] == "%i")
        .collect();
    // the initial store and the back-edge store both reach the header
    assert_eq!(reaching_i.len(), 2);
}

#[test]
fn fixed_point_satisfies_the_flow_equations() {
    let cfg = main_cfg(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int a = 1;
                if (a < 2) {
                    a = 2;
                } else {
                    a = 3;
                }
                print(a);
            }
        }
    "#});
    let rd = reaching_definitions(&cfg);
    let preds = cfg.predecessor_map();
    for block in cfg.block_ids() {
        let mut expected: std::collections::HashSet<_> = Default::default();
        for pred in &preds[block] {
            expected.extend(rd.outs[*pred].iter().copied());
        }
        assert_eq!(expected, rd.ins[block], "in[{block}] breaks the equation");
    }
}
