//! Second pass: name resolution and type checking.
//!
//! Walks the AST left-to-right, depth-first, with the registry from the
//! first pass in hand. Resolved expression types land in a side table keyed
//! by [`ExprId`]; the tree itself stays untouched. The first violation
//! aborts the walk.

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, SemanticErrorKind as SE};
use crate::parser::ast::*;
use crate::source::Coord;

use super::registry::{ClassRegistry, build_registry};
use super::scope::ScopedSymbolTable;
use super::types::MjType;

/// The analyzer's output: the class registry plus a type for every
/// expression in the program.
#[derive(Debug)]
pub struct Analysis {
    pub registry: ClassRegistry,
    pub(crate) types: HashMap<ExprId, MjType>,
}

impl Analysis {
    pub fn expr_type(&self, id: ExprId) -> &MjType {
        &self.types[&id]
    }
}

/// Run both semantic passes over a parsed program.
pub fn analyze(program: &Program) -> Result<Analysis, Diagnostic> {
    let registry = build_registry(program)?;
    let types = {
        let mut checker = SemanticAnalyzer::new(&registry);
        checker.check_program(program)?;
        checker.types
    };
    Ok(Analysis { registry, types })
}

type Check<T> = Result<T, Diagnostic>;

struct SemanticAnalyzer<'a> {
    registry: &'a ClassRegistry,
    scope: ScopedSymbolTable,
    types: HashMap<ExprId, MjType>,
    current_class: String,
    current_ret: MjType,
    in_loop: bool,
    in_main: bool,
    main_declared: bool,
}

impl<'a> SemanticAnalyzer<'a> {
    fn new(registry: &'a ClassRegistry) -> Self {
        Self {
            registry,
            scope: ScopedSymbolTable::new(),
            types: HashMap::new(),
            current_class: String::new(),
            current_ret: MjType::Void,
            in_loop: false,
            in_main: false,
            main_declared: false,
        }
    }

    fn record(&mut self, id: ExprId, ty: MjType) -> MjType {
        self.types.insert(id, ty.clone());
        ty
    }

    /// Assignment compatibility: identity, subclass widening into a
    /// superclass slot, and the `char[] = String` initialization form.
    fn is_assignable(&self, declared: &MjType, actual: &MjType) -> bool {
        if declared == actual {
            return true;
        }
        if matches!((declared, actual), (MjType::CharArray, MjType::Str)) {
            return true;
        }
        if let (MjType::Object(sup), MjType::Object(sub)) = (declared, actual) {
            return self.registry.is_subclass_of(sub, sup);
        }
        false
    }

    fn check_program(&mut self, program: &Program) -> Check<()> {
        for class in &program.classes {
            self.check_class(class)?;
        }
        Ok(())
    }

    fn check_class(&mut self, class: &ClassDecl) -> Check<()> {
        self.current_class = class.name.name.clone();

        for field in &class.fields {
            self.check_field_decl(class, field)?;
        }
        for method in &class.methods {
            match method {
                MethodItem::Method(decl) => self.check_method(decl)?,
                MethodItem::Main(decl) => self.check_main(decl)?,
            }
        }
        Ok(())
    }

    /// Field initializers must be constants; their type must fit the field.
    fn check_field_decl(&mut self, class: &ClassDecl, field: &VarDecl) -> Check<()> {
        let declared = self
            .registry
            .get(&class.name.name)
            .and_then(|info| info.fields.get(&field.name.name))
            .cloned()
            .expect("field registered by the first pass");

        let Some(init) = &field.init else {
            return Ok(());
        };
        match &init.kind {
            ExprKind::InitList { .. } => {}
            _ if init.is_constant() => {}
            _ => {
                return Err(Diagnostic::semantic(
                    SE::NotAConstant,
                    field.name.name.clone(),
                    init.coord,
                ));
            }
        }
        let actual = self.check_expr(init)?;
        if !self.is_assignable(&declared, &actual) {
            return Err(self.assign_mismatch(&declared, &actual, field.coord));
        }
        Ok(())
    }

    fn check_method(&mut self, decl: &MethodDecl) -> Check<()> {
        let sig = self
            .registry
            .get(&self.current_class)
            .and_then(|info| info.methods.get(&decl.name.name))
            .cloned()
            .expect("method registered by the first pass");

        self.current_ret = sig.ret.clone();
        self.in_main = false;
        self.scope.push_scope();
        for (param, (name, ty)) in decl.params.iter().zip(&sig.params) {
            if self.scope.lookup_current(name).is_some() {
                return Err(Diagnostic::semantic(
                    SE::ParameterAlreadyDeclared,
                    name.clone(),
                    param.coord,
                ));
            }
            self.scope.insert(name.clone(), ty.clone());
        }
        self.check_stmt(&decl.body)?;
        self.scope.pop_scope();
        self.current_ret = MjType::Void;
        Ok(())
    }

    fn check_main(&mut self, decl: &MainMethodDecl) -> Check<()> {
        if self.main_declared {
            return Err(Diagnostic::semantic(
                SE::AlreadyDeclaredMethod,
                "main",
                decl.coord,
            ));
        }
        self.main_declared = true;

        self.current_ret = MjType::Void;
        self.in_main = true;
        self.scope.push_scope();
        self.scope.insert(decl.args.name.clone(), MjType::StrArray);
        self.check_stmt(&decl.body)?;
        self.scope.pop_scope();
        self.in_main = false;
        Ok(())
    }

    fn check_local_decl(&mut self, decl: &VarDecl) -> Check<()> {
        let declared = self.registry.resolve_type(&decl.ty).ok_or_else(|| {
            Diagnostic::semantic(SE::UndeclaredClass, decl.ty.name.clone(), decl.coord)
        })?;
        if self.scope.lookup_current(&decl.name.name).is_some() {
            return Err(Diagnostic::semantic(
                SE::AlreadyDeclaredName,
                decl.name.name.clone(),
                decl.coord,
            ));
        }
        if let Some(init) = &decl.init {
            let actual = self.check_expr(init)?;
            if !self.is_assignable(&declared, &actual) {
                return Err(self.assign_mismatch(&declared, &actual, decl.coord));
            }
        }
        self.scope.insert(decl.name.name.clone(), declared);
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Check<()> {
        match stmt {
            Stmt::Compound { stmts, .. } => {
                self.scope.push_scope();
                for s in stmts {
                    self.check_stmt(s)?;
                }
                self.scope.pop_scope();
                Ok(())
            }
            Stmt::Decl { decls, .. } => {
                for decl in decls {
                    self.check_local_decl(decl)?;
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                coord,
            } => {
                self.check_condition(cond, *coord)?;
                self.scope.push_scope();
                self.check_stmt(then_branch)?;
                self.scope.pop_scope();
                if let Some(else_branch) = else_branch {
                    self.scope.push_scope();
                    self.check_stmt(else_branch)?;
                    self.scope.pop_scope();
                }
                Ok(())
            }
            Stmt::While { cond, body, coord } => {
                self.check_condition(cond, *coord)?;
                let outer_loop = self.in_loop;
                self.in_loop = true;
                self.scope.push_scope();
                self.check_stmt(body)?;
                self.scope.pop_scope();
                self.in_loop = outer_loop;
                Ok(())
            }
            Stmt::For {
                init,
                cond,
                next,
                body,
                coord,
            } => {
                self.scope.push_scope();
                match init {
                    Some(ForInit::Decl(decls)) => {
                        for decl in decls {
                            self.check_local_decl(decl)?;
                        }
                    }
                    Some(ForInit::Expr(expr)) => {
                        self.check_expr(expr)?;
                    }
                    None => {}
                }
                if let Some(cond) = cond {
                    self.check_condition(cond, *coord)?;
                }
                if let Some(next) = next {
                    self.check_expr(next)?;
                }
                let outer_loop = self.in_loop;
                self.in_loop = true;
                self.check_stmt(body)?;
                self.in_loop = outer_loop;
                self.scope.pop_scope();
                Ok(())
            }
            Stmt::Assert { expr, coord } => {
                let ty = self.check_expr(expr)?;
                if ty != MjType::Boolean {
                    return Err(Diagnostic::semantic(
                        SE::AssertExpressionTypeMismatch,
                        ty.to_string(),
                        *coord,
                    ));
                }
                Ok(())
            }
            Stmt::Print { args, coord } => {
                for arg in args {
                    let ty = self.check_expr(arg)?;
                    if !matches!(ty, MjType::Int | MjType::Char | MjType::Str) {
                        return Err(Diagnostic::semantic(
                            SE::PrintExpressionTypeMismatch,
                            ty.to_string(),
                            *coord,
                        ));
                    }
                }
                Ok(())
            }
            Stmt::Break { coord } => {
                if !self.in_loop {
                    return Err(Diagnostic::semantic(SE::WrongBreakStatement, "", *coord));
                }
                Ok(())
            }
            Stmt::Return { expr, coord } => {
                let actual = match expr {
                    Some(expr) => self.check_expr(expr)?,
                    None => MjType::Void,
                };
                if actual != self.current_ret {
                    return Err(Diagnostic::semantic(
                        SE::ReturnTypeMismatch,
                        format!("{actual} {}", self.current_ret),
                        *coord,
                    ));
                }
                Ok(())
            }
            Stmt::Expr { expr, .. } => {
                self.check_expr(expr)?;
                Ok(())
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr, coord: Coord) -> Check<()> {
        let ty = self.check_expr(cond)?;
        if ty != MjType::Boolean {
            return Err(Diagnostic::semantic(
                SE::ConditionalExpressionTypeMismatch,
                ty.to_string(),
                coord,
            ));
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &Expr) -> Check<MjType> {
        let coord = expr.coord;
        let ty = match &expr.kind {
            ExprKind::Assign { target, value } => {
                let declared = self.check_expr(target)?;
                let actual = self.check_expr(value)?;
                if !self.is_assignable(&declared, &actual) {
                    return Err(self.assign_mismatch(&declared, &actual, coord));
                }
                declared
            }
            ExprKind::Binary { op, left, right } => {
                let ltype = self.check_expr(left)?;
                let rtype = self.check_expr(right)?;
                self.check_binary(*op, &ltype, &rtype, coord)?
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.check_expr(operand)?;
                let symbol = op.symbol();
                if !ty.unary_ops().contains(&symbol) {
                    return Err(Diagnostic::semantic(
                        SE::UnsupportedUnaryOperation,
                        format!("{symbol} {ty}"),
                        coord,
                    ));
                }
                match op {
                    UnaryOp::Not => MjType::Boolean,
                    UnaryOp::Neg | UnaryOp::Pos => ty,
                }
            }
            ExprKind::ArrayRef { array, index } => {
                let array_ty = self.check_expr(array)?;
                let index_ty = self.check_expr(index)?;
                if index_ty != MjType::Int {
                    return Err(Diagnostic::semantic(
                        SE::ArrayDimentionMismatch,
                        index_ty.to_string(),
                        coord,
                    ));
                }
                match array_ty {
                    MjType::IntArray => MjType::Int,
                    MjType::CharArray => MjType::Char,
                    other => {
                        return Err(Diagnostic::semantic(
                            SE::ArrayRefTypeMismatch,
                            other.to_string(),
                            coord,
                        ));
                    }
                }
            }
            ExprKind::FieldAccess { object, field } => {
                let object_ty = self.check_expr(object)?;
                let MjType::Object(class) = object_ty else {
                    return Err(Diagnostic::semantic(
                        SE::ObjectTypeMustBeAClass,
                        field.name.clone(),
                        coord,
                    ));
                };
                self.registry
                    .lookup_field(&class, &field.name)
                    .cloned()
                    .ok_or_else(|| {
                        Diagnostic::semantic(SE::UndeclaredField, field.name.clone(), coord)
                    })?
            }
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => {
                let object_ty = self.check_expr(object)?;
                let MjType::Object(class) = object_ty else {
                    return Err(Diagnostic::semantic(
                        SE::ObjectTypeMustBeAClass,
                        method.name.clone(),
                        coord,
                    ));
                };
                let sig = self
                    .registry
                    .lookup_method(&class, &method.name)
                    .cloned()
                    .ok_or_else(|| {
                        Diagnostic::semantic(SE::UndeclaredMethod, method.name.clone(), coord)
                    })?;
                if args.len() != sig.params.len() {
                    return Err(Diagnostic::semantic(
                        SE::ArgumentCountMismatch,
                        method.name.clone(),
                        coord,
                    ));
                }
                for (arg, (param_name, param_ty)) in args.iter().zip(&sig.params) {
                    let arg_ty = self.check_expr(arg)?;
                    if arg_ty != *param_ty {
                        return Err(Diagnostic::semantic(
                            SE::ParameterTypeMismatch,
                            param_name.clone(),
                            coord,
                        ));
                    }
                }
                sig.ret
            }
            ExprKind::Length { target } => {
                let ty = self.check_expr(target)?;
                if !matches!(ty, MjType::IntArray | MjType::CharArray | MjType::Str) {
                    return Err(Diagnostic::semantic(
                        SE::InvalidLengthTarget,
                        ty.to_string(),
                        coord,
                    ));
                }
                MjType::Int
            }
            ExprKind::NewArray { ty, size } => {
                let size_ty = self.check_expr(size)?;
                if size_ty != MjType::Int {
                    return Err(Diagnostic::semantic(
                        SE::ArrayDimentionMismatch,
                        size_ty.to_string(),
                        coord,
                    ));
                }
                match ty.name.as_str() {
                    "int[]" => MjType::IntArray,
                    "char[]" => MjType::CharArray,
                    other => {
                        return Err(Diagnostic::semantic(SE::UndeclaredClass, other, coord));
                    }
                }
            }
            ExprKind::NewObject { class } => {
                if !self.registry.contains(&class.name) {
                    return Err(Diagnostic::semantic(
                        SE::UndeclaredClass,
                        class.name.clone(),
                        coord,
                    ));
                }
                MjType::Object(class.name.clone())
            }
            ExprKind::Int(_) => MjType::Int,
            ExprKind::Char(_) => MjType::Char,
            ExprKind::Str(_) => MjType::Str,
            ExprKind::Bool(_) => MjType::Boolean,
            ExprKind::This => {
                // main is static: there is no receiver to name
                if self.in_main {
                    return Err(Diagnostic::semantic(SE::UndeclaredName, "this", coord));
                }
                MjType::Object(self.current_class.clone())
            }
            ExprKind::Name(name) => self.lookup_name(name, coord)?,
            ExprKind::InitList { elems } => self.check_init_list(elems, coord)?,
        };
        Ok(self.record(expr.id, ty))
    }

    fn check_binary(
        &mut self,
        op: BinaryOp,
        ltype: &MjType,
        rtype: &MjType,
        coord: Coord,
    ) -> Check<MjType> {
        if ltype != rtype {
            return Err(Diagnostic::semantic(
                SE::BinaryExpressionTypeMismatch,
                format!("{} {ltype} {rtype}", op.symbol()),
                coord,
            ));
        }
        let symbol = op.symbol();
        if op.is_logical() {
            if *ltype != MjType::Boolean {
                return Err(Diagnostic::semantic(
                    SE::UnsupportedBinaryOperation,
                    format!("{symbol} {ltype}"),
                    coord,
                ));
            }
            return Ok(MjType::Boolean);
        }
        if ltype.binary_ops().contains(&symbol) {
            return Ok(ltype.clone());
        }
        if ltype.rel_ops().contains(&symbol) {
            return Ok(MjType::Boolean);
        }
        Err(Diagnostic::semantic(
            SE::UnsupportedBinaryOperation,
            format!("{symbol} {ltype}"),
            coord,
        ))
    }

    /// Innermost scope outward, then the current class's fields along the
    /// superclass chain.
    fn lookup_name(&self, name: &str, coord: Coord) -> Check<MjType> {
        if let Some(ty) = self.scope.lookup(name) {
            return Ok(ty.clone());
        }
        if !self.in_main {
            if let Some(ty) = self.registry.lookup_field(&self.current_class, name) {
                return Ok(ty.clone());
            }
        }
        Err(Diagnostic::semantic(SE::UndeclaredName, name, coord))
    }

    fn check_init_list(&mut self, elems: &[Expr], coord: Coord) -> Check<MjType> {
        for elem in elems {
            if !elem.is_constant() {
                return Err(Diagnostic::semantic(SE::NotAConstant, "", elem.coord));
            }
        }
        let mut elem_ty = None;
        for elem in elems {
            let ty = self.check_expr(elem)?;
            match &elem_ty {
                None => elem_ty = Some(ty),
                Some(first) if *first == ty => {}
                Some(first) => {
                    return Err(Diagnostic::semantic(
                        SE::ArrayElementTypeMismatch,
                        format!("{first} {ty}"),
                        elem.coord,
                    ));
                }
            }
        }
        match elem_ty {
            Some(MjType::Int) => Ok(MjType::IntArray),
            Some(MjType::Char) => Ok(MjType::CharArray),
            Some(other) => Err(Diagnostic::semantic(
                SE::ArrayElementTypeMismatch,
                other.to_string(),
                coord,
            )),
            // an empty list has no element type to infer
            None => Err(Diagnostic::semantic(SE::NotAConstant, "", coord)),
        }
    }

    fn assign_mismatch(&self, declared: &MjType, actual: &MjType, coord: Coord) -> Diagnostic {
        Diagnostic::semantic(
            SE::AssignTypeMismatch,
            format!("{declared} {actual}"),
            coord,
        )
    }
}
