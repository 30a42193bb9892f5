//! Per-method lowering to a CFG of three-address instructions.
//!
//! Register conventions: parameters arrive in `%1..%n`; a non-void method
//! allocates its return slot next, and every `return e` stores into the
//! slot and jumps to the single `exit` block, which loads and returns it.
//! Locals live in named slots (`%x`); a name that would collide with an
//! already-allocated slot is suffixed (`%x.2`). Primitive reads go through
//! `load_T` into fresh temporaries; arrays, strings, and objects are passed
//! by reference.

use std::collections::HashSet;

use indexmap::IndexMap;

use mjc_ir::block::EXIT_LABEL;
use mjc_ir::{BinOp, BlockId, Cfg, Function, Instr, IrType, Lit};

use crate::analyze::MjType;
use crate::parser::ast::*;

use super::{ModuleBuilder, const_lit};

pub(crate) struct FuncLowering<'a, 'm> {
    mb: &'m mut ModuleBuilder<'a>,
    current_class: String,
    cfg: Cfg,
    current: BlockId,
    temp_counter: u32,
    scopes: Vec<IndexMap<String, String>>,
    allocated: HashSet<String>,
    break_target: Option<String>,
    return_slot: Option<(String, IrType)>,
    terminated: bool,
}

impl<'a, 'm> FuncLowering<'a, 'm> {
    pub fn method(
        mb: &'m mut ModuleBuilder<'a>,
        class_name: &str,
        decl: &MethodDecl,
    ) -> Function {
        let sig = mb
            .analysis
            .registry
            .get(class_name)
            .and_then(|info| info.methods.get(&decl.name.name))
            .cloned()
            .expect("method registered");
        let name = format!("@{class_name}.{}", decl.name.name);

        let params: Vec<(IrType, String)> = sig
            .params
            .iter()
            .enumerate()
            .map(|(i, (_, ty))| (ty.ir_type(), format!("%{}", i + 1)))
            .collect();
        let define = Instr::Define {
            ret: sig.ret.ir_type(),
            name: name.clone(),
            params: params.clone(),
        };

        let mut lowering = Self::start(mb, class_name, sig.params.len() as u32);

        if sig.ret != MjType::Void {
            let ty = sig.ret.ir_type();
            let slot = lowering.new_temp();
            lowering.emit(Instr::Alloc {
                ty: ty.clone(),
                len: None,
                dest: slot.clone(),
            });
            lowering.return_slot = Some((slot, ty));
        }

        // Spill incoming parameters into named slots.
        for (i, (pname, ty)) in sig.params.iter().enumerate() {
            let reg = lowering.allocate_local(pname);
            let ty = ty.ir_type();
            lowering.emit(Instr::Alloc {
                ty: ty.clone(),
                len: None,
                dest: reg.clone(),
            });
            lowering.emit(Instr::Store {
                ty,
                len: None,
                src: format!("%{}", i + 1),
                dest: reg,
            });
        }

        lowering.lower_stmt(&decl.body);
        lowering.finish(name, define)
    }

    pub fn main(
        mb: &'m mut ModuleBuilder<'a>,
        class_name: &str,
        decl: &MainMethodDecl,
    ) -> Function {
        let name = format!("@{class_name}.main");
        let args_reg = format!("%{}", decl.args.name);
        let define = Instr::Define {
            ret: IrType::Void,
            name: name.clone(),
            params: vec![(IrType::StrArray, args_reg.clone())],
        };

        let mut lowering = Self::start(mb, class_name, 0);
        lowering.allocated.insert(decl.args.name.clone());
        lowering.scopes
            .last_mut()
            .expect("frame")
            .insert(decl.args.name.clone(), args_reg);

        lowering.lower_stmt(&decl.body);
        lowering.finish(name, define)
    }

    fn start(mb: &'m mut ModuleBuilder<'a>, class_name: &str, temp_counter: u32) -> Self {
        let mut cfg = Cfg::new();
        let exit = cfg.fresh_label(EXIT_LABEL);
        debug_assert_eq!(exit, EXIT_LABEL);
        let entry = cfg.add_block("entry");
        Self {
            mb,
            current_class: class_name.to_string(),
            cfg,
            current: entry,
            temp_counter,
            scopes: vec![IndexMap::new()],
            allocated: HashSet::new(),
            break_target: None,
            return_slot: None,
            terminated: false,
        }
    }

    fn finish(mut self, name: String, define: Instr) -> Function {
        if !self.terminated {
            self.emit(Instr::Jump {
                target: EXIT_LABEL.to_string(),
            });
        }
        self.switch_to(EXIT_LABEL.to_string());
        match self.return_slot.take() {
            Some((slot, ty)) => {
                let value = self.new_temp();
                self.emit(Instr::Load {
                    ty: ty.clone(),
                    src: slot,
                    dest: value.clone(),
                });
                self.emit(Instr::Return { ty, src: value });
            }
            None => self.emit(Instr::ReturnVoid),
        }
        Function {
            name,
            define,
            cfg: self.cfg,
        }
    }

    // --- plumbing ---

    fn new_temp(&mut self) -> String {
        self.temp_counter += 1;
        format!("%{}", self.temp_counter)
    }

    fn emit(&mut self, instr: Instr) {
        self.cfg.block_mut(self.current).push(instr);
    }

    fn switch_to(&mut self, label: String) {
        self.current = self.cfg.add_block(label);
        self.terminated = false;
    }

    fn lookup_reg(&self, name: &str) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
    }

    /// Claim a slot register for a local, suffixing on collision with any
    /// slot already allocated in this method.
    fn allocate_local(&mut self, name: &str) -> String {
        let mut chosen = name.to_string();
        let mut version = 1;
        while self.allocated.contains(&chosen) {
            version += 1;
            chosen = format!("{name}.{version}");
        }
        self.allocated.insert(chosen.clone());
        let reg = format!("%{chosen}");
        self.scopes
            .last_mut()
            .expect("frame")
            .insert(name.to_string(), reg.clone());
        reg
    }

    fn mj_type(&self, expr: &Expr) -> MjType {
        self.mb.analysis.expr_type(expr.id).clone()
    }

    fn ir_type(&self, expr: &Expr) -> IrType {
        self.mb.analysis.expr_type(expr.id).ir_type()
    }

    // --- statements ---

    fn lower_stmt(&mut self, stmt: &Stmt) {
        // straight-line code after a break or return is unreachable
        if self.terminated {
            return;
        }
        match stmt {
            Stmt::Compound { stmts, .. } => {
                self.scopes.push(IndexMap::new());
                for s in stmts {
                    self.lower_stmt(s);
                }
                self.scopes.pop();
            }
            Stmt::Decl { decls, .. } => {
                for decl in decls {
                    self.lower_local(decl);
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => self.lower_if(cond, then_branch, else_branch.as_deref()),
            Stmt::While { cond, body, .. } => self.lower_while(cond, body),
            Stmt::For {
                init,
                cond,
                next,
                body,
                ..
            } => self.lower_for(init.as_ref(), cond.as_ref(), next.as_ref(), body),
            Stmt::Assert { expr, .. } => self.lower_assert(expr),
            Stmt::Print { args, .. } => {
                for arg in args {
                    let ty = self.ir_type(arg);
                    let value = self.value(arg);
                    self.emit(Instr::Print { ty, src: value });
                }
            }
            Stmt::Break { .. } => {
                let target = self.break_target.clone().expect("break inside a loop");
                self.emit(Instr::Jump { target });
                self.terminated = true;
            }
            Stmt::Return { expr, .. } => {
                if let Some(expr) = expr {
                    let value = self.value(expr);
                    let (slot, ty) = self.return_slot.clone().expect("non-void return slot");
                    self.emit(Instr::Store {
                        ty,
                        len: None,
                        src: value,
                        dest: slot,
                    });
                }
                self.emit(Instr::Jump {
                    target: EXIT_LABEL.to_string(),
                });
                self.terminated = true;
            }
            Stmt::Expr { expr, .. } => {
                self.value(expr);
            }
        }
    }

    fn lower_local(&mut self, decl: &VarDecl) {
        let declared = self
            .mb
            .analysis
            .registry
            .resolve_type(&decl.ty)
            .expect("declared type resolved");
        let ty = declared.ir_type();
        let reg = self.allocate_local(&decl.name.name);

        match &decl.init {
            Some(init) => match &init.kind {
                ExprKind::InitList { elems } => {
                    let values: Vec<Lit> = elems.iter().map(const_lit).collect();
                    let len = values.len() as u32;
                    let arr_ty = self.ir_type(init);
                    let label = self.mb.intern_array(&decl.name.name, arr_ty.clone(), values);
                    self.emit(Instr::Alloc {
                        ty: arr_ty.clone(),
                        len: Some(len),
                        dest: reg.clone(),
                    });
                    self.emit(Instr::Store {
                        ty: arr_ty,
                        len: Some(len),
                        src: label,
                        dest: reg,
                    });
                }
                // a string constant backs a sized char[] slot
                ExprKind::Str(s) if declared == MjType::CharArray => {
                    let len = s.chars().count() as u32;
                    let label = self.mb.intern_string(s);
                    self.emit(Instr::Alloc {
                        ty: IrType::CharArray,
                        len: Some(len),
                        dest: reg.clone(),
                    });
                    self.emit(Instr::Store {
                        ty: IrType::CharArray,
                        len: None,
                        src: label,
                        dest: reg,
                    });
                }
                // objects are built in place, no separate slot
                ExprKind::NewObject { class } => {
                    self.lower_new_object(&class.name.clone(), &reg);
                }
                _ => {
                    self.emit(Instr::Alloc {
                        ty: ty.clone(),
                        len: None,
                        dest: reg.clone(),
                    });
                    let value = self.value(init);
                    self.emit(Instr::Store {
                        ty,
                        len: None,
                        src: value,
                        dest: reg,
                    });
                }
            },
            None => self.emit(Instr::Alloc {
                ty,
                len: None,
                dest: reg,
            }),
        }
    }

    fn lower_if(&mut self, cond: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        let cond_value = self.value(cond);
        let then_label = self.cfg.fresh_label("if.then");
        let end_label = self.cfg.fresh_label("if.end");
        let else_label = match else_branch {
            Some(_) => self.cfg.fresh_label("if.else"),
            None => end_label.clone(),
        };

        self.emit(Instr::CBranch {
            cond: cond_value,
            then_to: then_label.clone(),
            else_to: else_label.clone(),
        });

        self.switch_to(then_label);
        self.lower_stmt(then_branch);
        if !self.terminated {
            self.emit(Instr::Jump {
                target: end_label.clone(),
            });
        }

        if let Some(else_branch) = else_branch {
            self.switch_to(else_label);
            self.lower_stmt(else_branch);
            if !self.terminated {
                self.emit(Instr::Jump {
                    target: end_label.clone(),
                });
            }
        }

        self.switch_to(end_label);
    }

    fn lower_while(&mut self, cond: &Expr, body: &Stmt) {
        let cond_label = self.cfg.fresh_label("while.cond");
        let body_label = self.cfg.fresh_label("while.body");
        let end_label = self.cfg.fresh_label("while.end");

        self.emit(Instr::Jump {
            target: cond_label.clone(),
        });
        self.switch_to(cond_label.clone());
        let cond_value = self.value(cond);
        self.emit(Instr::CBranch {
            cond: cond_value,
            then_to: body_label.clone(),
            else_to: end_label.clone(),
        });

        self.switch_to(body_label);
        let saved = self.break_target.replace(end_label.clone());
        self.lower_stmt(body);
        if !self.terminated {
            self.emit(Instr::Jump {
                target: cond_label,
            });
        }
        self.break_target = saved;

        self.switch_to(end_label);
    }

    fn lower_for(
        &mut self,
        init: Option<&ForInit>,
        cond: Option<&Expr>,
        next: Option<&Expr>,
        body: &Stmt,
    ) {
        self.scopes.push(IndexMap::new());
        match init {
            Some(ForInit::Decl(decls)) => {
                for decl in decls {
                    self.lower_local(decl);
                }
            }
            Some(ForInit::Expr(expr)) => {
                self.value(expr);
            }
            None => {}
        }

        let cond_label = self.cfg.fresh_label("for.cond");
        let body_label = self.cfg.fresh_label("for.body");
        let inc_label = self.cfg.fresh_label("for.inc");
        let end_label = self.cfg.fresh_label("for.end");

        self.emit(Instr::Jump {
            target: cond_label.clone(),
        });
        self.switch_to(cond_label.clone());
        let cond_value = match cond {
            Some(cond) => self.value(cond),
            None => {
                let t = self.new_temp();
                self.emit(Instr::Literal {
                    ty: IrType::Boolean,
                    value: Lit::Bool(true),
                    dest: t.clone(),
                });
                t
            }
        };
        self.emit(Instr::CBranch {
            cond: cond_value,
            then_to: body_label.clone(),
            else_to: end_label.clone(),
        });

        self.switch_to(body_label);
        let saved = self.break_target.replace(end_label.clone());
        self.lower_stmt(body);
        if !self.terminated {
            self.emit(Instr::Jump {
                target: inc_label.clone(),
            });
        }
        self.break_target = saved;

        self.switch_to(inc_label);
        if let Some(next) = next {
            self.value(next);
        }
        self.emit(Instr::Jump { target: cond_label });

        self.switch_to(end_label);
        self.scopes.pop();
    }

    fn lower_assert(&mut self, expr: &Expr) {
        let message = format!("assertion_fail on {}", expr.coord);
        let label = self.mb.intern_string(&message);

        let cond_value = self.value(expr);
        let true_label = self.cfg.fresh_label("assert.true");
        let false_label = self.cfg.fresh_label("assert.false");

        self.emit(Instr::CBranch {
            cond: cond_value,
            then_to: true_label.clone(),
            else_to: false_label.clone(),
        });

        self.switch_to(false_label);
        self.emit(Instr::Print {
            ty: IrType::Str,
            src: label,
        });
        self.emit(Instr::Jump {
            target: EXIT_LABEL.to_string(),
        });

        self.switch_to(true_label);
    }

    // --- expressions ---

    /// Lower an expression to a register or symbol holding its value.
    fn value(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Int(v) => self.literal(IrType::Int, Lit::Int(*v)),
            ExprKind::Bool(v) => self.literal(IrType::Boolean, Lit::Bool(*v)),
            ExprKind::Char(v) => self.literal(IrType::Char, Lit::Char(*v)),
            ExprKind::Str(s) => self.mb.intern_string(s),
            ExprKind::This => "%this".to_string(),
            ExprKind::Name(name) => self.name_value(name, expr),
            ExprKind::Assign { target, value } => self.lower_assign(target, value),
            ExprKind::Binary { op, left, right } => {
                let l = self.value(left);
                let r = self.value(right);
                let dest = self.new_temp();
                self.emit(Instr::Binary {
                    op: bin_op(*op),
                    left: l,
                    right: r,
                    dest: dest.clone(),
                });
                dest
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Pos => self.value(operand),
                UnaryOp::Not => {
                    let v = self.value(operand);
                    let dest = self.new_temp();
                    self.emit(Instr::Not {
                        src: v,
                        dest: dest.clone(),
                    });
                    dest
                }
                UnaryOp::Neg => {
                    let v = self.value(operand);
                    let zero = self.new_temp();
                    self.emit(Instr::Literal {
                        ty: IrType::Int,
                        value: Lit::Int(0),
                        dest: zero.clone(),
                    });
                    let dest = self.new_temp();
                    self.emit(Instr::Binary {
                        op: BinOp::Sub,
                        left: zero,
                        right: v,
                        dest: dest.clone(),
                    });
                    dest
                }
            },
            ExprKind::ArrayRef { array, index } => {
                let arr_ty = self.ir_type(array);
                let elem_ty = self.ir_type(expr);
                let arr = self.value(array);
                let idx = self.value(index);
                let addr = self.new_temp();
                self.emit(Instr::Elem {
                    ty: arr_ty,
                    arr,
                    idx,
                    dest: addr.clone(),
                });
                let dest = self.new_temp();
                self.emit(Instr::Load {
                    ty: elem_ty,
                    src: addr,
                    dest: dest.clone(),
                });
                dest
            }
            ExprKind::FieldAccess { object, field } => {
                let addr = self.field_addr(object, &field.name);
                let ty = self.ir_type(expr);
                let dest = self.new_temp();
                self.emit(Instr::Load {
                    ty,
                    src: addr,
                    dest: dest.clone(),
                });
                dest
            }
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => {
                let class = self.static_class(object);
                let receiver = self.value(object);
                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    let ty = self.ir_type(arg);
                    let value = self.value(arg);
                    lowered.push((ty, value));
                }
                for (ty, value) in lowered {
                    self.emit(Instr::Param { ty, src: value });
                }
                let dest = self.new_temp();
                self.emit(Instr::Call {
                    ty: self.ir_type(expr),
                    target: format!("{receiver}.@{class}.{}", method.name),
                    dest: dest.clone(),
                });
                dest
            }
            ExprKind::Length { target } => {
                let v = self.value(target);
                let dest = self.new_temp();
                self.emit(Instr::Length {
                    src: v,
                    dest: dest.clone(),
                });
                dest
            }
            ExprKind::NewArray { size, .. } => {
                let arr_ty = self.ir_type(expr);
                let size = self.value(size);
                let dest = self.new_temp();
                self.emit(Instr::NewArray {
                    ty: arr_ty,
                    size,
                    dest: dest.clone(),
                });
                dest
            }
            ExprKind::NewObject { class } => {
                let dest = self.new_temp();
                self.lower_new_object(&class.name.clone(), &dest);
                dest
            }
            ExprKind::InitList { .. } => unreachable!("initializer lists are lowered at declarations"),
        }
    }

    fn literal(&mut self, ty: IrType, value: Lit) -> String {
        let dest = self.new_temp();
        self.emit(Instr::Literal {
            ty,
            value,
            dest: dest.clone(),
        });
        dest
    }

    /// A name read: primitives load into a temp, reference types are used
    /// through their slot. A name that is not a local resolves to a field of
    /// `this`.
    fn name_value(&mut self, name: &str, expr: &Expr) -> String {
        let ty = self.mj_type(expr);
        match self.lookup_reg(name) {
            Some(reg) => match ty {
                MjType::Int | MjType::Boolean | MjType::Char => {
                    let dest = self.new_temp();
                    self.emit(Instr::Load {
                        ty: ty.ir_type(),
                        src: reg,
                        dest: dest.clone(),
                    });
                    dest
                }
                _ => reg,
            },
            None => {
                let addr = self.new_temp();
                self.emit(Instr::LoadAddr {
                    src: format!("%this.@{}.{name}", self.current_class),
                    dest: addr.clone(),
                });
                let dest = self.new_temp();
                self.emit(Instr::Load {
                    ty: ty.ir_type(),
                    src: addr,
                    dest: dest.clone(),
                });
                dest
            }
        }
    }

    fn lower_assign(&mut self, target: &Expr, value: &Expr) -> String {
        // building a fresh object straight into a local slot skips the temp
        if let (ExprKind::NewObject { class }, ExprKind::Name(name)) =
            (&value.kind, &target.kind)
        {
            if let Some(reg) = self.lookup_reg(name) {
                self.lower_new_object(&class.name.clone(), &reg);
                return reg;
            }
        }

        let ty = self.ir_type(target);
        let v = self.value(value);
        match &target.kind {
            ExprKind::Name(name) => match self.lookup_reg(name) {
                Some(reg) => {
                    self.emit(Instr::Store {
                        ty,
                        len: None,
                        src: v.clone(),
                        dest: reg,
                    });
                }
                None => {
                    let addr = self.new_temp();
                    self.emit(Instr::LoadAddr {
                        src: format!("%this.@{}.{name}", self.current_class),
                        dest: addr.clone(),
                    });
                    self.emit(Instr::Store {
                        ty,
                        len: None,
                        src: v.clone(),
                        dest: addr,
                    });
                }
            },
            ExprKind::FieldAccess { object, field } => {
                let addr = self.field_addr(object, &field.name);
                self.emit(Instr::Store {
                    ty,
                    len: None,
                    src: v.clone(),
                    dest: addr,
                });
            }
            ExprKind::ArrayRef { array, index } => {
                let arr = self.value(array);
                let idx = self.value(index);
                self.emit(Instr::StoreElem {
                    ty,
                    src: v.clone(),
                    arr,
                    idx,
                });
            }
            _ => unreachable!("assignment targets are places"),
        }
        v
    }

    /// Materialize the address of `object.field`.
    fn field_addr(&mut self, object: &Expr, field: &str) -> String {
        let class = self.static_class(object);
        let obj = self.value(object);
        let addr = self.new_temp();
        self.emit(Instr::LoadAddr {
            src: format!("{obj}.@{class}.{field}"),
            dest: addr.clone(),
        });
        addr
    }

    fn static_class(&self, object: &Expr) -> String {
        match self.mb.analysis.expr_type(object.id) {
            MjType::Object(name) => name.clone(),
            other => unreachable!("receiver is an object, got {other}"),
        }
    }

    /// `new C()` into a target register, then re-play the class's field
    /// initializers into the fresh object.
    fn lower_new_object(&mut self, class: &str, dest: &str) {
        self.emit(Instr::NewObject {
            class: class.to_string(),
            dest: dest.to_string(),
        });
        let fields = self.mb.replay_fields(class).to_vec();
        for field in fields {
            let obj = self.new_temp();
            self.emit(Instr::Load {
                ty: IrType::Class(class.to_string()),
                src: dest.to_string(),
                dest: obj.clone(),
            });
            let addr = self.new_temp();
            self.emit(Instr::LoadAddr {
                src: format!("{obj}.@{class}.{}", field.name),
                dest: addr.clone(),
            });
            let value = match field.value {
                Lit::Label(label) => label,
                lit => {
                    let v = self.new_temp();
                    self.emit(Instr::Literal {
                        ty: field.ty.clone(),
                        value: lit,
                        dest: v.clone(),
                    });
                    v
                }
            };
            self.emit(Instr::Store {
                ty: field.ty,
                len: None,
                src: value,
                dest: addr,
            });
        }
    }
}

fn bin_op(op: BinaryOp) -> BinOp {
    match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div => BinOp::Div,
        BinaryOp::Mod => BinOp::Mod,
        BinaryOp::Eq => BinOp::Eq,
        BinaryOp::Ne => BinOp::Ne,
        BinaryOp::Lt => BinOp::Lt,
        BinaryOp::Le => BinOp::Le,
        BinaryOp::Gt => BinOp::Gt,
        BinaryOp::Ge => BinOp::Ge,
        BinaryOp::And => BinOp::And,
        BinaryOp::Or => BinOp::Or,
    }
}
