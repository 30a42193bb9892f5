use indoc::indoc;

use mjc_ir::Cfg;

use crate::analyze::analyze;
use crate::codegen::lower;
use crate::dataflow::live_variables;
use crate::parser::parse_program;

fn main_cfg(source: &str) -> Cfg {
    let program = parse_program(source).expect("parses");
    let analysis = analyze(&program).expect("analyzes");
    let module = lower(&program, &analysis);
    module.functions.into_iter().next().expect("main").cfg
}

#[test]
fn nothing_is_live_into_a_self_contained_method() {
    let cfg = main_cfg(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int x = 1;
                print(x);
            }
        }
    "#});
    let lv = live_variables(&cfg);
    assert!(lv.ins[cfg.entry()].is_empty());
}

#[test]
fn loop_counters_stay_live_around_the_back_edge() {
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
    let lv = live_variables(&cfg);
    let cond = cfg.resolve("while.cond").expect("loop header");
    let body = cfg.resolve("while.body").expect("loop body");
    assert!(lv.ins[cond].contains("%i"));
    assert!(lv.outs[body].contains("%i"));
    // the slot is still needed after the loop, for the print
    let end = cfg.resolve("while.end").expect("loop end");
    assert!(lv.ins[end].contains("%i"));
}

#[test]
fn values_dead_after_their_last_read_leave_the_sets() {
    let cfg = main_cfg(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int a = 1;
                print(a);
                int b = 2;
                print(b);
            }
        }
    "#});
    let lv = live_variables(&cfg);
    // everything is consumed inside the entry block
    assert!(lv.outs[cfg.entry()].is_empty());
}
