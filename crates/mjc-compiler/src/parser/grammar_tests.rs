use indoc::indoc;

use crate::parser::ast::*;
use crate::parser::{dump_program, parse_program};

fn parse(source: &str) -> Program {
    parse_program(source).expect("parses")
}

/// The single statement of `Main.main` in a one-class program.
fn main_stmts(program: &Program) -> &[Stmt] {
    let MethodItem::Main(main) = &program.classes[0].methods[0] else {
        panic!("expected main");
    };
    let Stmt::Compound { stmts, .. } = &main.body else {
        panic!("expected compound body");
    };
    stmts
}

fn wrap_main(body: &str) -> String {
    format!(
        "class Main {{\n    public static void main(String[] args) {{\n{body}\n    }}\n}}\n"
    )
}

#[test]
fn arithmetic_dump_carries_precedence_and_coordinates() {
    let source = indoc! {r#"
        class Main {
            public static void main(String[] args) {
                int x = 2 + 3 * 4;
                print(x);
            }
        }
    "#};
    let program = parse(source);
    insta::assert_snapshot!(dump_program(&program), @r#"
    Program
      ClassDecl: Main @ 1:1
        MainMethodDecl: args @ 2:5
          Compound @ 2:44
            DeclList @ 3:9
              VarDecl: int x @ 3:13
                BinaryOp: + @ 3:17
                  Constant int: 2 @ 3:17
                  BinaryOp: * @ 3:21
                    Constant int: 3 @ 3:21
                    Constant int: 4 @ 3:25
            Print @ 4:9
              ID: x @ 4:15
    "#);
}

#[test]
fn class_header_fields_and_methods() {
    let source = indoc! {r#"
        class B extends A {
            int n = 7;
            char c;
            public int get(int k, boolean flag) {
                return n;
            }
        }
    "#};
    let program = parse(source);
    let class = &program.classes[0];
    assert_eq!(class.name.name, "B");
    assert_eq!(class.extends.as_ref().map(|e| e.name.as_str()), Some("A"));
    assert_eq!(class.fields.len(), 2);
    assert!(class.fields[0].init.is_some());
    assert!(class.fields[1].init.is_none());
    let MethodItem::Method(method) = &class.methods[0] else {
        panic!("expected a regular method");
    };
    assert_eq!(method.ret.name, "int");
    assert_eq!(method.params.len(), 2);
    assert_eq!(method.params[1].ty.name, "boolean");
}

#[test]
fn assignment_is_right_associative() {
    let source = wrap_main("        a = b = 1;");
    let program = parse(&source);
    let [Stmt::Expr { expr, .. }] = main_stmts(&program) else {
        panic!("expected one expression statement");
    };
    let ExprKind::Assign { target, value } = &expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(&target.kind, ExprKind::Name(n) if n == "a"));
    assert!(matches!(&value.kind, ExprKind::Assign { .. }));
}

#[test]
fn relational_binds_tighter_than_logical() {
    let source = wrap_main("        boolean b = 1 < 2 && 3 < 4;");
    let program = parse(&source);
    let [Stmt::Decl { decls, .. }] = main_stmts(&program) else {
        panic!("expected a declaration");
    };
    let init = decls[0].init.as_ref().expect("has initializer");
    let ExprKind::Binary { op, left, right } = &init.kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::And);
    assert!(matches!(
        &left.kind,
        ExprKind::Binary {
            op: BinaryOp::Lt,
            ..
        }
    ));
    assert!(matches!(
        &right.kind,
        ExprKind::Binary {
            op: BinaryOp::Lt,
            ..
        }
    ));
}

#[test]
fn dangling_else_binds_to_nearest_if() {
    let source = wrap_main("        if (a) if (b) print(1); else print(2);");
    let program = parse(&source);
    let [Stmt::If {
        then_branch,
        else_branch,
        ..
    }] = main_stmts(&program)
    else {
        panic!("expected if");
    };
    assert!(else_branch.is_none());
    let Stmt::If {
        else_branch: inner_else,
        ..
    } = then_branch.as_ref()
    else {
        panic!("expected nested if");
    };
    assert!(inner_else.is_some());
}

#[test]
fn postfix_chains_nest_left_to_right() {
    let source = wrap_main("        int n = a.b.length + c.m(1, 2)[0];");
    let program = parse(&source);
    let [Stmt::Decl { decls, .. }] = main_stmts(&program) else {
        panic!("expected a declaration");
    };
    let init = decls[0].init.as_ref().expect("has initializer");
    let ExprKind::Binary { left, right, .. } = &init.kind else {
        panic!("expected binary");
    };
    assert!(matches!(&left.kind, ExprKind::Length { .. }));
    let ExprKind::ArrayRef { array, .. } = &right.kind else {
        panic!("expected array ref");
    };
    assert!(matches!(&array.kind, ExprKind::MethodCall { .. }));
}

#[test]
fn for_header_with_declaration_and_update() {
    let source = wrap_main("        for (int i = 0; i < 10; i = i + 1) print(i);");
    let program = parse(&source);
    let [Stmt::For {
        init, cond, next, ..
    }] = main_stmts(&program)
    else {
        panic!("expected for");
    };
    assert!(matches!(init, Some(ForInit::Decl(decls)) if decls.len() == 1));
    assert!(cond.is_some());
    assert!(next.is_some());
}

#[test]
fn initializer_lists_tolerate_trailing_comma() {
    let source = wrap_main("        int[] a = {1, 2, 3,};");
    let program = parse(&source);
    let [Stmt::Decl { decls, .. }] = main_stmts(&program) else {
        panic!("expected a declaration");
    };
    let init = decls[0].init.as_ref().expect("has initializer");
    let ExprKind::InitList { elems } = &init.kind else {
        panic!("expected init list");
    };
    assert_eq!(elems.len(), 3);
}

#[test]
fn multi_declarator_statement_shares_the_type() {
    let source = wrap_main("        int a = 1, b, c = 3;");
    let program = parse(&source);
    let [Stmt::Decl { decls, .. }] = main_stmts(&program) else {
        panic!("expected a declaration");
    };
    assert_eq!(decls.len(), 3);
    assert!(decls.iter().all(|d| d.ty.name == "int"));
    assert!(decls[1].init.is_none());
}

#[test]
fn new_expressions() {
    let source = wrap_main("        a = new int[3]; b = new Point();");
    let program = parse(&source);
    let stmts = main_stmts(&program);
    let Stmt::Expr { expr, .. } = &stmts[0] else {
        panic!()
    };
    let ExprKind::Assign { value, .. } = &expr.kind else {
        panic!()
    };
    assert!(matches!(&value.kind, ExprKind::NewArray { ty, .. } if ty.name == "int[]"));
    let Stmt::Expr { expr, .. } = &stmts[1] else {
        panic!()
    };
    let ExprKind::Assign { value, .. } = &expr.kind else {
        panic!()
    };
    assert!(matches!(&value.kind, ExprKind::NewObject { class } if class.name == "Point"));
}

#[test]
fn expression_ids_are_unique() {
    let source = wrap_main("        int x = 1 + 2 * 3; print(x, x);");
    let program = parse(&source);
    let mut ids = Vec::new();
    fn collect(expr: &Expr, ids: &mut Vec<u32>) {
        ids.push(expr.id.0);
        match &expr.kind {
            ExprKind::Binary { left, right, .. } => {
                collect(left, ids);
                collect(right, ids);
            }
            ExprKind::Assign { target, value } => {
                collect(target, ids);
                collect(value, ids);
            }
            _ => {}
        }
    }
    for stmt in main_stmts(&program) {
        match stmt {
            Stmt::Decl { decls, .. } => {
                for decl in decls {
                    if let Some(init) = &decl.init {
                        collect(init, &mut ids);
                    }
                }
            }
            Stmt::Print { args, .. } => {
                for arg in args {
                    collect(arg, &mut ids);
                }
            }
            _ => {}
        }
    }
    let unique: std::collections::HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn syntax_errors_are_fatal_and_pinpointed() {
    let err = parse_program("class Main {").expect_err("unterminated class");
    let msg = err.to_string();
    assert!(msg.starts_with("ParserError: "), "{msg}");
    assert!(msg.contains("@ 1:13"), "{msg}");

    let source = wrap_main("        1 = x;");
    let err = parse_program(&source).expect_err("bad lvalue");
    assert_eq!(
        err.to_string(),
        "ParserError: invalid assignment target @ 3:9"
    );
}
