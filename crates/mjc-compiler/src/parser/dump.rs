//! Textual AST dump with coordinates, one node per line.

use std::fmt::Write;

use crate::parser::ast::*;

/// Render the tree the way the `parse` tool prints it.
pub fn dump_program(program: &Program) -> String {
    let mut p = Printer::default();
    p.line(0, "Program");
    for class in &program.classes {
        p.class_decl(class, 1);
    }
    p.out
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn class_decl(&mut self, class: &ClassDecl, depth: usize) {
        let mut header = format!("ClassDecl: {}", class.name.name);
        if let Some(sup) = &class.extends {
            let _ = write!(header, " extends {}", sup.name);
        }
        let _ = write!(header, " @ {}", class.coord);
        self.line(depth, header);
        for field in &class.fields {
            self.var_decl(field, depth + 1);
        }
        for method in &class.methods {
            match method {
                MethodItem::Method(m) => self.method_decl(m, depth + 1),
                MethodItem::Main(m) => self.main_decl(m, depth + 1),
            }
        }
    }

    fn var_decl(&mut self, decl: &VarDecl, depth: usize) {
        self.line(
            depth,
            format!(
                "VarDecl: {} {} @ {}",
                decl.ty.name, decl.name.name, decl.coord
            ),
        );
        if let Some(init) = &decl.init {
            self.expr(init, depth + 1);
        }
    }

    fn method_decl(&mut self, method: &MethodDecl, depth: usize) {
        self.line(
            depth,
            format!(
                "MethodDecl: {} {} @ {}",
                method.ret.name, method.name.name, method.coord
            ),
        );
        for param in &method.params {
            self.line(
                depth + 1,
                format!(
                    "ParamDecl: {} {} @ {}",
                    param.ty.name, param.name.name, param.coord
                ),
            );
        }
        self.stmt(&method.body, depth + 1);
    }

    fn main_decl(&mut self, main: &MainMethodDecl, depth: usize) {
        self.line(
            depth,
            format!("MainMethodDecl: {} @ {}", main.args.name, main.coord),
        );
        self.stmt(&main.body, depth + 1);
    }

    fn stmt(&mut self, stmt: &Stmt, depth: usize) {
        match stmt {
            Stmt::Compound { stmts, coord } => {
                self.line(depth, format!("Compound @ {coord}"));
                for s in stmts {
                    self.stmt(s, depth + 1);
                }
            }
            Stmt::Decl { decls, coord } => {
                self.line(depth, format!("DeclList @ {coord}"));
                for decl in decls {
                    self.var_decl(decl, depth + 1);
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                coord,
            } => {
                self.line(depth, format!("If @ {coord}"));
                self.expr(cond, depth + 1);
                self.stmt(then_branch, depth + 1);
                if let Some(else_branch) = else_branch {
                    self.stmt(else_branch, depth + 1);
                }
            }
            Stmt::While { cond, body, coord } => {
                self.line(depth, format!("While @ {coord}"));
                self.expr(cond, depth + 1);
                self.stmt(body, depth + 1);
            }
            Stmt::For {
                init,
                cond,
                next,
                body,
                coord,
            } => {
                self.line(depth, format!("For @ {coord}"));
                match init {
                    Some(ForInit::Decl(decls)) => {
                        for decl in decls {
                            self.var_decl(decl, depth + 1);
                        }
                    }
                    Some(ForInit::Expr(expr)) => self.expr(expr, depth + 1),
                    None => {}
                }
                if let Some(cond) = cond {
                    self.expr(cond, depth + 1);
                }
                if let Some(next) = next {
                    self.expr(next, depth + 1);
                }
                self.stmt(body, depth + 1);
            }
            Stmt::Assert { expr, coord } => {
                self.line(depth, format!("Assert @ {coord}"));
                self.expr(expr, depth + 1);
            }
            Stmt::Print { args, coord } => {
                self.line(depth, format!("Print @ {coord}"));
                for arg in args {
                    self.expr(arg, depth + 1);
                }
            }
            Stmt::Break { coord } => self.line(depth, format!("Break @ {coord}")),
            Stmt::Return { expr, coord } => {
                self.line(depth, format!("Return @ {coord}"));
                if let Some(expr) = expr {
                    self.expr(expr, depth + 1);
                }
            }
            Stmt::Expr { expr, .. } => self.expr(expr, depth),
        }
    }

    fn expr(&mut self, expr: &Expr, depth: usize) {
        let coord = expr.coord;
        match &expr.kind {
            ExprKind::Assign { target, value } => {
                self.line(depth, format!("Assignment @ {coord}"));
                self.expr(target, depth + 1);
                self.expr(value, depth + 1);
            }
            ExprKind::Binary { op, left, right } => {
                self.line(depth, format!("BinaryOp: {} @ {coord}", op.symbol()));
                self.expr(left, depth + 1);
                self.expr(right, depth + 1);
            }
            ExprKind::Unary { op, operand } => {
                self.line(depth, format!("UnaryOp: {} @ {coord}", op.symbol()));
                self.expr(operand, depth + 1);
            }
            ExprKind::ArrayRef { array, index } => {
                self.line(depth, format!("ArrayRef @ {coord}"));
                self.expr(array, depth + 1);
                self.expr(index, depth + 1);
            }
            ExprKind::FieldAccess { object, field } => {
                self.line(depth, format!("FieldAccess: {} @ {coord}", field.name));
                self.expr(object, depth + 1);
            }
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => {
                self.line(depth, format!("MethodCall: {} @ {coord}", method.name));
                self.expr(object, depth + 1);
                for arg in args {
                    self.expr(arg, depth + 1);
                }
            }
            ExprKind::Length { target } => {
                self.line(depth, format!("Length @ {coord}"));
                self.expr(target, depth + 1);
            }
            ExprKind::NewArray { ty, size } => {
                self.line(depth, format!("NewArray: {} @ {coord}", ty.name));
                self.expr(size, depth + 1);
            }
            ExprKind::NewObject { class } => {
                self.line(depth, format!("NewObject: {} @ {coord}", class.name));
            }
            ExprKind::Int(value) => self.line(depth, format!("Constant int: {value} @ {coord}")),
            ExprKind::Char(value) => {
                self.line(depth, format!("Constant char: {value:?} @ {coord}"));
            }
            ExprKind::Str(value) => {
                self.line(depth, format!("Constant String: {value:?} @ {coord}"));
            }
            ExprKind::Bool(value) => {
                self.line(depth, format!("Constant boolean: {value} @ {coord}"));
            }
            ExprKind::This => self.line(depth, format!("This @ {coord}")),
            ExprKind::Name(name) => self.line(depth, format!("ID: {name} @ {coord}")),
            ExprKind::InitList { elems } => {
                self.line(depth, format!("InitList @ {coord}"));
                for elem in elems {
                    self.expr(elem, depth + 1);
                }
            }
        }
    }
}
