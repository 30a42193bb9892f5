//! End-to-end runs: source text through the full pipeline and the
//! interpreter.

use indoc::indoc;

use crate::{check, compile, compile_optimized};

fn run(source: &str) -> (String, i32) {
    let module = compile(source).expect("compiles");
    let mut out = Vec::new();
    let code = mjc_vm::Vm::new()
        .run(&module.flatten(), &mut out)
        .expect("runs");
    (String::from_utf8(out).expect("utf8"), code)
}

#[test]
fn hello_world() {
    let (out, code) = run(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                print("hi");
            }
        }
    "#});
    assert_eq!(out, "hi\n");
    assert_eq!(code, 0);
}

#[test]
fn arithmetic_and_print() {
    let (out, code) = run(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int x = 2 + 3 * 4;
                print(x);
            }
        }
    "#});
    assert_eq!(out, "14\n");
    assert_eq!(code, 0);
}

#[test]
fn inherited_field_through_a_subclass_instance() {
    let (out, code) = run(indoc! {r#"
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
    assert_eq!(out, "7\n");
    assert_eq!(code, 0);
}

#[test]
fn method_calls_and_loops() {
    let (out, code) = run(indoc! {r#"
        class Math {
            public int square(int n) { return n * n; }
        }
        class Main {
            public static void main(String[] args) {
                Math m = new Math();
                for (int i = 1; i < 4; i = i + 1) {
                    print(m.square(i));
                }
            }
        }
    "#});
    assert_eq!(out, "1\n4\n9\n");
    assert_eq!(code, 0);
}

#[test]
fn arrays_and_char_strings() {
    let (out, code) = run(indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int[] a = {5, 6, 7};
                a[1] = a[0] + a[2];
                print(a[1]);
                char[] word = "ok";
                print(word.length);
                print(word[1]);
            }
        }
    "#});
    assert_eq!(out, "12\n2\nk\n");
    assert_eq!(code, 0);
}

#[test]
fn failed_assertion_reports_its_coordinates() {
    let source = indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int x = 1;
                assert x == 2;
            }
        }
    "#};
    let module = compile(source).expect("compiles");
    let mut out = Vec::new();
    let code = mjc_vm::Vm::new()
        .run(&module.flatten(), &mut out)
        .expect("runs");
    assert_eq!(String::from_utf8(out).unwrap(), "assertion_fail on 4:16\n");
    assert_eq!(code, 1);
}

#[test]
fn compile_time_errors_surface_in_wire_format() {
    let source = indoc! {r#"
        class Main {
            public static void main(String[] args) {
                print(y);
            }
        }
    "#};
    let err = check(source).expect_err("rejects");
    assert_eq!(err.to_string(), "SemanticError: UNDECLARED_NAME y @ 3:15");
}

#[test]
fn the_optimized_pipeline_is_a_drop_in_replacement() {
    let source = indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int x = 2;
                int y = 21;
                print(x * y);
            }
        }
    "#};
    let (module, stats) = compile_optimized(source).expect("compiles");
    let mut out = Vec::new();
    let code = mjc_vm::Vm::new()
        .run(&module.flatten(), &mut out)
        .expect("runs");
    assert_eq!(String::from_utf8(out).unwrap(), "42\n");
    assert_eq!(code, 0);
    assert!(stats.after <= stats.before);
}
