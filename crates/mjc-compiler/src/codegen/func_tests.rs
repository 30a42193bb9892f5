use indoc::indoc;

use mjc_ir::{Module, verify_cfg, verify_temps};

use crate::analyze::analyze;
use crate::codegen::lower;
use crate::parser::parse_program;

fn compile(source: &str) -> Module {
    let program = parse_program(source).expect("parses");
    let analysis = analyze(&program).expect("analyzes");
    let module = lower(&program, &analysis);
    for func in &module.functions {
        verify_cfg(&func.cfg).unwrap_or_else(|e| panic!("{}: {e}", func.name));
        verify_temps(&func.cfg).unwrap_or_else(|e| panic!("{}: {e}", func.name));
    }
    module
}

#[test]
fn hello_world() {
    let module = compile(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                print("hi");
            }
        }
    "#});
    insta::assert_snapshot!(module.to_string(), @r#"
    global_String @.str.0 "hi"

    class @Main

    define_void @Main.main (String[] %args)
    entry:
      print_String @.str.0
      jump %exit
    exit:
      return_void
    "#);
}

#[test]
fn arithmetic_declaration_and_print() {
    let module = compile(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int x = 2 + 3 * 4;
                print(x);
            }
        }
    "#});
    insta::assert_snapshot!(module.to_string(), @r"
    class @Main

    define_void @Main.main (String[] %args)
    entry:
      alloc_int %x
      literal_int 2 %1
      literal_int 3 %2
      literal_int 4 %3
      mul_int %2 %3 %4
      add_int %1 %4 %5
      store_int %5 %x
      load_int %x %6
      print_int %6
      jump %exit
    exit:
      return_void
    ");
}

#[test]
fn inherited_field_records_and_replay() {
    let module = compile(indoc! {r#"
        class A {
            int n = 7;
        }
        class B extends A {
        }
        class Main {
            public static void main(String[] args) {
                B b = new B();
                print(b.n);
            }
        }
    "#});
    insta::assert_snapshot!(module.to_string(), @r"
    class @A
      field_int @A.n 7

    class @B A
      field_int @B.n 7

    class @Main

    define_void @Main.main (String[] %args)
    entry:
      new_@B %b
      load_B %b %1
      load_addr %1.@B.n %2
      literal_int 7 %3
      store_int %3 %2
      load_addr %b.@B.n %4
      load_int %4 %5
      print_int %5
      jump %exit
    exit:
      return_void
    ");
}

#[test]
fn while_and_if_build_labeled_diamonds() {
    let module = compile(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int i = 0;
                while (i < 3) {
                    if (i == 1) {
                        print(i);
                    }
                    i = i + 1;
                }
            }
        }
    "#});
    insta::assert_snapshot!(module.to_string(), @r"
    class @Main

    define_void @Main.main (String[] %args)
    entry:
      alloc_int %i
      literal_int 0 %1
      store_int %1 %i
      jump %while.cond
    while.cond:
      load_int %i %2
      literal_int 3 %3
      lt_int %2 %3 %4
      cbranch %4 %while.body %while.end
    while.body:
      load_int %i %5
      literal_int 1 %6
      eq_int %5 %6 %7
      cbranch %7 %if.then %if.end
    if.then:
      load_int %i %8
      print_int %8
      jump %if.end
    if.end:
      load_int %i %9
      literal_int 1 %10
      add_int %9 %10 %11
      store_int %11 %i
      jump %while.cond
    while.end:
      jump %exit
    exit:
      return_void
    ");
}

#[test]
fn methods_use_the_param_and_return_slot_convention() {
    let module = compile(indoc! {r#"
        class A {
            public int twice(int k) { return k * 2; }
        }
    "#});
    insta::assert_snapshot!(module.to_string(), @r"
    class @A

    define_int @A.twice (int %1)
    entry:
      alloc_int %2
      alloc_int %k
      store_int %1 %k
      load_int %k %3
      literal_int 2 %4
      mul_int %3 %4 %5
      store_int %5 %2
      jump %exit
    exit:
      load_int %2 %6
      return_int %6
    ");
}

#[test]
fn calls_pass_params_and_name_the_receiver() {
    let module = compile(indoc! {r#"
        class A {
            public int add(int a, int b) { return a + b; }
        }
        class Main {
            public static void main(String[] args) {
                A a = new A();
                print(a.add(1, 2));
            }
        }
    "#});
    let main = &module.functions[1];
    let body: Vec<String> = main
        .cfg
        .block(main.cfg.entry())
        .body()
        .iter()
        .map(|i| i.to_string())
        .collect();
    assert_eq!(
        body,
        vec![
            "new_@A %a",
            "literal_int 1 %1",
            "literal_int 2 %2",
            "param_int %1",
            "param_int %2",
            "call_int %a.@A.add %3",
            "print_int %3",
            "jump %exit",
        ]
    );
}

#[test]
fn assert_prints_the_prebuilt_message_and_unwinds() {
    let module = compile(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int x = 1;
                assert x == 1;
            }
        }
    "#});
    insta::assert_snapshot!(module.to_string(), @r#"
    global_String @.str.0 "assertion_fail on 4:16"

    class @Main

    define_void @Main.main (String[] %args)
    entry:
      alloc_int %x
      literal_int 1 %1
      store_int %1 %x
      load_int %x %2
      literal_int 1 %3
      eq_int %2 %3 %4
      cbranch %4 %assert.true %assert.false
    assert.false:
      print_String @.str.0
      jump %exit
    assert.true:
      jump %exit
    exit:
      return_void
    "#);
}

#[test]
fn for_loops_rename_shadowed_counters() {
    let module = compile(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int i = 100;
                for (int i = 0; i < 2; i = i + 1) {
                    print(i);
                }
                print(i);
            }
        }
    "#});
    let main = &module.functions[0];
    let dump = main
        .cfg
        .blocks()
        .flat_map(|(_, b)| b.instrs.iter())
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(dump.contains("alloc_int %i.2"), "{dump}");
    assert!(dump.contains("store_int %1 %i"), "{dump}");
    // loop body reads the renamed slot, the trailing print the outer one
    assert!(dump.contains("load_int %i.2"), "{dump}");
    verify_temps(&main.cfg).expect("temps stay single-assignment");
}

#[test]
fn string_literals_deduplicate() {
    let module = compile(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                print("hi");
                print("hi");
                print("other");
            }
        }
    "#});
    assert_eq!(module.text.len(), 2);
}

#[test]
fn char_array_locals_get_sized_slots() {
    let module = compile(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                char[] word = "hello";
                int[] nums = {1, 2, 3};
            }
        }
    "#});
    let main = &module.functions[0];
    let body: Vec<String> = main
        .cfg
        .block(main.cfg.entry())
        .body()
        .iter()
        .map(|i| i.to_string())
        .collect();
    assert_eq!(
        body,
        vec![
            "alloc_char[]_5 %word",
            "store_char[] @.str.0 %word",
            "alloc_int[]_3 %nums",
            "store_int[]_3 @.const_nums.0 %nums",
            "jump %exit",
        ]
    );
    assert_eq!(module.text.len(), 2);
}

#[test]
fn return_in_every_branch_still_reaches_exit() {
    let module = compile(indoc! {r#"
        class A {
            public int sign(int n) {
                if (n < 0) {
                    return 0 - 1;
                } else {
                    return 1;
                }
            }
        }
    "#});
    let func = &module.functions[0];
    verify_cfg(&func.cfg).expect("well-formed");
    let exit = func.cfg.exit().expect("has exit");
    let reachable = func.cfg.reachable();
    let preds = func.cfg.predecessor_map();
    // both branches store to the slot and jump straight to exit; the sealed
    // join block is left behind, unreachable
    let live_preds = preds[exit]
        .iter()
        .filter(|p| reachable.contains(p))
        .count();
    assert_eq!(live_preds, 2);
}

#[test]
fn break_jumps_to_the_innermost_loop_end() {
    let module = compile(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                while (true) {
                    for (int i = 0; i < 3; i = i + 1) {
                        if (i == 1) break;
                    }
                    break;
                }
            }
        }
    "#});
    let main = &module.functions[0];
    verify_cfg(&main.cfg).expect("well-formed");
    let dump = main
        .cfg
        .blocks()
        .flat_map(|(_, b)| b.instrs.iter())
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(dump.contains("jump %for.end"), "{dump}");
    assert!(dump.contains("jump %while.end"), "{dump}");
}
