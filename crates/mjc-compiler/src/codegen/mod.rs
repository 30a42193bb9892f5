//! IR lowering: the typed AST to MJIR.
//!
//! Two passes over the class list. The first builds every class and field
//! record (and the per-class initializer replay tables `new` needs), so a
//! method can instantiate a class declared after it. The second lowers
//! method bodies to per-method CFGs.
//!
//! Name mangling: methods `@Class.method`, field records `@Class.field`,
//! a field slot of a live object `%obj.@Class.field`.

mod func;

#[cfg(test)]
mod func_tests;

use indexmap::IndexMap;

use mjc_ir::{ClassRecord, Instr, IrType, Lit, Module};

use crate::analyze::Analysis;
use crate::parser::ast::{ClassDecl, Expr, ExprKind, MethodItem, Program};

use func::FuncLowering;

/// Lower an analyzed program. Infallible: every rule that could fail has
/// already been enforced.
pub fn lower(program: &Program, analysis: &Analysis) -> Module {
    let decls: IndexMap<&str, &ClassDecl> = program
        .classes
        .iter()
        .map(|class| (class.name.name.as_str(), class))
        .collect();

    let mut builder = ModuleBuilder {
        analysis,
        text: Vec::new(),
        string_labels: IndexMap::new(),
        const_counter: 0,
        replay: IndexMap::new(),
    };

    let mut classes = Vec::new();
    for class in &program.classes {
        classes.push(builder.class_record(class, &decls));
    }

    let mut functions = Vec::new();
    for class in &program.classes {
        for method in &class.methods {
            let function = match method {
                MethodItem::Method(decl) => {
                    FuncLowering::method(&mut builder, &class.name.name, decl)
                }
                MethodItem::Main(decl) => {
                    FuncLowering::main(&mut builder, &class.name.name, decl)
                }
            };
            functions.push(function);
        }
    }

    Module {
        text: builder.text,
        classes,
        functions,
    }
}

/// One field to re-play into a freshly built object.
#[derive(Debug, Clone)]
pub(crate) struct FieldInit {
    pub ty: IrType,
    pub name: String,
    pub value: Lit,
}

pub(crate) struct ModuleBuilder<'a> {
    pub analysis: &'a Analysis,
    pub text: Vec<Instr>,
    string_labels: IndexMap<String, String>,
    const_counter: u32,
    /// Class name → initialized fields, superclass entries first.
    replay: IndexMap<String, Vec<FieldInit>>,
}

impl<'a> ModuleBuilder<'a> {
    /// Deduplicate a string constant into the text section.
    pub fn intern_string(&mut self, payload: &str) -> String {
        if let Some(label) = self.string_labels.get(payload) {
            return label.clone();
        }
        let label = format!("@.str.{}", self.string_labels.len());
        self.text.push(Instr::GlobalString {
            name: label.clone(),
            value: payload.to_string(),
        });
        self.string_labels.insert(payload.to_string(), label.clone());
        label
    }

    /// Emit a constant array into the text section.
    pub fn intern_array(&mut self, name_hint: &str, ty: IrType, values: Vec<Lit>) -> String {
        let label = format!("@.const_{name_hint}.{}", self.const_counter);
        self.const_counter += 1;
        self.text.push(Instr::GlobalArray {
            len: values.len() as u32,
            name: label.clone(),
            ty,
            values,
        });
        label
    }

    pub fn replay_fields(&self, class: &str) -> &[FieldInit] {
        self.replay.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The `class` record plus its `field_T` records. Inherited fields are
    /// re-qualified under the subclass; a redeclared name keeps the
    /// inherited position but the subclass's initializer.
    fn class_record(
        &mut self,
        class: &ClassDecl,
        decls: &IndexMap<&str, &ClassDecl>,
    ) -> ClassRecord {
        let class_name = &class.name.name;
        let decl = Instr::Class {
            name: format!("@{class_name}"),
            superclass: class.extends.as_ref().map(|e| e.name.clone()),
        };

        // Root ancestor first, so subclass initializers override.
        let chain: Vec<String> = {
            let mut chain: Vec<String> = self
                .analysis
                .registry
                .ancestry(class_name)
                .map(|info| info.name.clone())
                .collect();
            chain.reverse();
            chain
        };

        let mut records: IndexMap<String, (IrType, Option<Lit>)> = IndexMap::new();
        for ancestor in &chain {
            let Some(decl_ast) = decls.get(ancestor.as_str()) else {
                continue;
            };
            for field in &decl_ast.fields {
                let ty = self
                    .analysis
                    .registry
                    .lookup_field(ancestor, &field.name.name)
                    .expect("field registered")
                    .ir_type();
                let value = field
                    .init
                    .as_ref()
                    .map(|init| self.field_value(&field.name.name, init));
                records.insert(field.name.name.clone(), (ty, value));
            }
        }

        let mut fields = Vec::with_capacity(records.len());
        let mut replay = Vec::new();
        for (short, (ty, value)) in records {
            let qualified = format!("@{class_name}.{short}");
            if let Some(value) = &value {
                replay.push(FieldInit {
                    ty: ty.clone(),
                    name: short.clone(),
                    value: value.clone(),
                });
            }
            fields.push(Instr::Field {
                ty,
                name: qualified,
                init: value,
            });
        }
        self.replay.insert(class_name.clone(), replay);

        ClassRecord { decl, fields }
    }

    /// Constant value of a field initializer; strings and initializer lists
    /// go to the text section and are referenced by label.
    fn field_value(&mut self, field_name: &str, init: &Expr) -> Lit {
        match &init.kind {
            ExprKind::Int(v) => Lit::Int(*v),
            ExprKind::Bool(v) => Lit::Bool(*v),
            ExprKind::Char(v) => Lit::Char(*v),
            ExprKind::Str(s) => {
                let payload = s.clone();
                Lit::Label(self.intern_string(&payload))
            }
            ExprKind::InitList { elems } => {
                let values: Vec<Lit> = elems.iter().map(const_lit).collect();
                let ty = self.analysis.expr_type(init.id).ir_type();
                Lit::Label(self.intern_array(field_name, ty, values))
            }
            _ => unreachable!("field initializers are constants"),
        }
    }
}

/// Constant expression to its literal. Initializer-list elements only.
pub(crate) fn const_lit(expr: &Expr) -> Lit {
    match &expr.kind {
        ExprKind::Int(v) => Lit::Int(*v),
        ExprKind::Bool(v) => Lit::Bool(*v),
        ExprKind::Char(v) => Lit::Char(*v),
        _ => unreachable!("initializer-list elements are constants"),
    }
}
