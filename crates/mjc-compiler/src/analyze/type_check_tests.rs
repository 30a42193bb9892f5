use indoc::indoc;

use crate::analyze::{Analysis, MjType, analyze};
use crate::parser::parse_program;

fn check(source: &str) -> Analysis {
    let program = parse_program(source).expect("parses");
    analyze(&program).expect("analyzes")
}

fn check_err(source: &str) -> String {
    let program = parse_program(source).expect("parses");
    analyze(&program).expect_err("rejects").to_string()
}

fn wrap_main(body: &str) -> String {
    format!(
        "class Main {{\n    public static void main(String[] args) {{\n{body}\n    }}\n}}\n"
    )
}

#[test]
fn undeclared_name_is_pinpointed() {
    let source = wrap_main("        print(y);");
    assert_eq!(
        check_err(&source),
        "SemanticError: UNDECLARED_NAME y @ 3:15"
    );
}

#[test]
fn array_assignment_must_match_element_type() {
    let source = wrap_main("        int[] a = new char[3];");
    assert_eq!(
        check_err(&source),
        "SemanticError: ASSIGN_TYPE_MISMATCH type(int[]) type(char[]) @ 3:15"
    );
}

#[test]
fn break_outside_a_loop_is_rejected() {
    let source = wrap_main("        if (true) break;");
    assert_eq!(
        check_err(&source),
        "SemanticError: WRONG_BREAK_STATEMENT @ 3:19"
    );
}

#[test]
fn break_inside_nested_loops_is_fine() {
    let source = wrap_main(indoc! {"
                while (true) {
                    for (int i = 0; i < 3; i = i + 1) {
                        if (i == 2) break;
                    }
                    break;
                }"
    });
    check(&source);
}

#[test]
fn duplicate_classes_are_rejected() {
    let source = "class A { }\nclass A { }\n";
    assert_eq!(
        check_err(source),
        "SemanticError: ALREADY_DECLARED_CLASS A @ 2:1"
    );
}

#[test]
fn classes_may_extend_later_declarations() {
    let source = indoc! {r#"
        class B extends A {
            public int get() { return n; }
        }
        class A {
            int n = 7;
        }
    "#};
    check(source);
}

#[test]
fn inherited_fields_resolve_through_the_chain() {
    let source = indoc! {r#"
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
    "#};
    check(source);
}

#[test]
fn subclass_references_widen_into_superclass_slots() {
    let source = indoc! {r#"
        class A { }
        class B extends A { }
        class Main {
            public static void main(String[] args) {
                A a = new B();
            }
        }
    "#};
    check(source);

    let reversed = indoc! {r#"
        class A { }
        class B extends A { }
        class Main {
            public static void main(String[] args) {
                B b = new A();
            }
        }
    "#};
    let program = parse_program(reversed).expect("parses");
    let err = analyze(&program).expect_err("narrowing is rejected").to_string();
    assert_eq!(
        err,
        "SemanticError: ASSIGN_TYPE_MISMATCH type(B) type(A) @ 5:11"
    );
}

#[test]
fn string_initializes_char_array_but_does_not_pass_as_one() {
    let ok = wrap_main("        char[] word = \"hello\";");
    check(&ok);

    let source = indoc! {r#"
        class A {
            public int len(char[] word) { return word.length; }
        }
        class Main {
            public static void main(String[] args) {
                A a = new A();
                print(a.len("hello"));
            }
        }
    "#};
    let program = parse_program(source).expect("parses");
    let err = analyze(&program).expect_err("no coercion at calls").to_string();
    assert_eq!(
        err,
        "SemanticError: PARAMETER_TYPE_MISMATCH word @ 7:17"
    );
}

#[test]
fn conditions_must_be_boolean() {
    let source = wrap_main("        if (1) print(2);");
    assert_eq!(
        check_err(&source),
        "SemanticError: CONDITIONAL_EXPRESSION_TYPE_MISMATCH type(int) @ 3:9"
    );
}

#[test]
fn returns_must_match_the_signature() {
    let source = indoc! {r#"
        class A {
            public int get() { return true; }
        }
    "#};
    assert_eq!(
        check_err(source),
        "SemanticError: RETURN_TYPE_MISMATCH type(boolean) type(int) @ 2:24"
    );
}

#[test]
fn call_checking_covers_count_and_types() {
    let source = indoc! {r#"
        class A {
            public int add(int a, int b) { return a + b; }
        }
        class Main {
            public static void main(String[] args) {
                A a = new A();
                print(a.add(1));
            }
        }
    "#};
    assert_eq!(
        check_err(source),
        "SemanticError: ARGUMENT_COUNT_MISMATCH add @ 7:17"
    );

    let source = indoc! {r#"
        class A {
            public int add(int a, int b) { return a + b; }
        }
        class Main {
            public static void main(String[] args) {
                A a = new A();
                print(a.add(1, true));
            }
        }
    "#};
    assert_eq!(
        check_err(source),
        "SemanticError: PARAMETER_TYPE_MISMATCH b @ 7:17"
    );
}

#[test]
fn members_require_an_object_receiver() {
    let source = wrap_main("        int x = 1;\n        print(x.n);");
    assert_eq!(
        check_err(&source),
        "SemanticError: OBJECT_TYPE_MUST_BE_A_CLASS n @ 4:17"
    );
}

#[test]
fn unknown_fields_and_methods_are_reported() {
    let source = indoc! {r#"
        class A { }
        class Main {
            public static void main(String[] args) {
                A a = new A();
                print(a.n);
            }
        }
    "#};
    assert_eq!(
        check_err(source),
        "SemanticError: UNDECLARED_FIELD n @ 5:17"
    );

    let source = indoc! {r#"
        class A { }
        class Main {
            public static void main(String[] args) {
                A a = new A();
                a.run();
            }
        }
    "#};
    assert_eq!(
        check_err(source),
        "SemanticError: UNDECLARED_METHOD run @ 5:11"
    );
}

#[test]
fn this_is_rejected_in_main() {
    let source = wrap_main("        print(this.n);");
    assert_eq!(
        check_err(&source),
        "SemanticError: UNDECLARED_NAME this @ 3:15"
    );
}

#[test]
fn this_resolves_in_instance_methods() {
    let source = indoc! {r#"
        class A {
            int n = 1;
            public int get() { return this.n; }
        }
    "#};
    let analysis = check(source);
    assert!(analysis.registry.lookup_method("A", "get").is_some());
}

#[test]
fn init_lists_must_be_uniform_constants() {
    let mixed = wrap_main("        int[] a = {1, 'x'};");
    assert_eq!(
        check_err(&mixed),
        "SemanticError: ARRAY_ELEMENT_TYPE_MISMATCH type(int) type(char) @ 3:23"
    );

    let non_const = wrap_main("        int y = 1;\n        int[] a = {y};");
    assert_eq!(
        check_err(&non_const),
        "SemanticError: NOT_A_CONSTANT @ 4:20"
    );
}

#[test]
fn redeclaration_in_one_scope_is_rejected_but_shadowing_is_not() {
    let dup = wrap_main("        int x = 1;\n        int x = 2;");
    assert_eq!(
        check_err(&dup),
        "SemanticError: ALREADY_DECLARED_NAME x @ 4:13"
    );

    let shadow = wrap_main("        int x = 1;\n        { boolean x = true; }");
    check(&shadow);
}

#[test]
fn unsupported_operations_name_the_operator() {
    let source = wrap_main("        boolean b = true + false;");
    assert_eq!(
        check_err(&source),
        "SemanticError: UNSUPPORTED_BINARY_OPERATION + type(boolean) @ 3:21"
    );

    let source = wrap_main("        int x = -true;");
    assert_eq!(
        check_err(&source),
        "SemanticError: UNSUPPORTED_UNARY_OPERATION - type(boolean) @ 3:17"
    );
}

#[test]
fn analysis_is_idempotent() {
    let source = indoc! {r#"
        class A {
            int n = 7;
            public int twice(int k) { return k * 2; }
        }
        class Main {
            public static void main(String[] args) {
                A a = new A();
                print(a.twice(a.n));
            }
        }
    "#};
    let program = parse_program(source).expect("parses");
    let first = analyze(&program).expect("analyzes");
    let second = analyze(&program).expect("analyzes");
    assert_eq!(first.types, second.types);
}

#[test]
fn expression_types_are_recorded() {
    let source = wrap_main("        int x = 2 + 3;\n        boolean b = x < 4;");
    let program = parse_program(&source).expect("parses");
    let analysis = analyze(&program).expect("analyzes");
    let recorded: Vec<&MjType> = analysis.types.values().collect();
    assert!(recorded.contains(&&MjType::Int));
    assert!(recorded.contains(&&MjType::Boolean));
}
