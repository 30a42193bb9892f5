//! The class registry and its two-sweep builder.
//!
//! Sweep A registers every class name; sweep B resolves superclasses,
//! fields, and method signatures. Registering names first lets fields and
//! parameters refer to classes declared later (and to the declaring class
//! itself). Inheritance is stored as a superclass *name*; chain walks
//! re-index into the registry, so there are no owning cycles.

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, SemanticErrorKind as SE};
use crate::parser::ast::{ClassDecl, MethodItem, Program, TypeSpec};
use crate::source::Coord;

use super::types::{MethodSig, MjType};

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: IndexMap<String, MjType>,
    pub methods: IndexMap<String, MethodSig>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassInfo>,
}

impl ClassRegistry {
    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Walk `name` and its superclasses, innermost first.
    pub fn ancestry<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ClassInfo> {
        let mut current = self.get(name);
        std::iter::from_fn(move || {
            let info = current?;
            current = info.superclass.as_deref().and_then(|sup| self.get(sup));
            Some(info)
        })
    }

    /// Resolve a field on a class, following the superclass chain.
    pub fn lookup_field(&self, class: &str, field: &str) -> Option<&MjType> {
        self.ancestry(class).find_map(|info| info.fields.get(field))
    }

    /// Resolve a method on a class, following the superclass chain.
    pub fn lookup_method(&self, class: &str, method: &str) -> Option<&MethodSig> {
        self.ancestry(class)
            .find_map(|info| info.methods.get(method))
    }

    /// True when `sub` is `sup` or one of its descendants.
    pub fn is_subclass_of(&self, sub: &str, sup: &str) -> bool {
        self.ancestry(sub).any(|info| info.name == sup)
    }

    /// Resolve a written type to the type domain.
    pub fn resolve_type(&self, spec: &TypeSpec) -> Option<MjType> {
        let ty = match spec.name.as_str() {
            "boolean" => MjType::Boolean,
            "char" => MjType::Char,
            "int" => MjType::Int,
            "void" => MjType::Void,
            "String" => MjType::Str,
            "int[]" => MjType::IntArray,
            "char[]" => MjType::CharArray,
            "String[]" => MjType::StrArray,
            name => {
                if !self.contains(name) {
                    return None;
                }
                MjType::Object(name.to_string())
            }
        };
        Some(ty)
    }
}

/// First pass over the program: collect class, field, and method signatures.
pub fn build_registry(program: &Program) -> Result<ClassRegistry, Diagnostic> {
    let mut registry = ClassRegistry::default();

    // Sweep A: class names only.
    for class in &program.classes {
        if registry.contains(&class.name.name) {
            return Err(already_declared(SE::AlreadyDeclaredClass, class));
        }
        registry.classes.insert(
            class.name.name.clone(),
            ClassInfo {
                name: class.name.name.clone(),
                superclass: None,
                fields: IndexMap::new(),
                methods: IndexMap::new(),
            },
        );
    }

    // Sweep B: members, with every class name now resolvable.
    for class in &program.classes {
        let class_name = &class.name.name;

        if let Some(extends) = &class.extends {
            if !registry.contains(&extends.name) {
                return Err(Diagnostic::semantic(
                    SE::UndeclaredClass,
                    extends.name.clone(),
                    class.coord,
                ));
            }
            registry.classes[class_name].superclass = Some(extends.name.clone());
        }

        for field in &class.fields {
            if registry.classes[class_name].fields.contains_key(&field.name.name) {
                return Err(Diagnostic::semantic(
                    SE::AlreadyDeclaredField,
                    field.name.name.clone(),
                    field.coord,
                ));
            }
            let ty = resolve_or(&registry, &field.ty, SE::UndeclaredClass, field.coord)?;
            registry.classes[class_name]
                .fields
                .insert(field.name.name.clone(), ty);
        }

        for method in &class.methods {
            match method {
                MethodItem::Method(decl) => {
                    if registry.classes[class_name].methods.contains_key(&decl.name.name) {
                        return Err(Diagnostic::semantic(
                            SE::AlreadyDeclaredMethod,
                            decl.name.name.clone(),
                            decl.coord,
                        ));
                    }
                    let ret =
                        resolve_or(&registry, &decl.ret, SE::ReturnTypeMismatch, decl.coord)?;
                    let mut params = Vec::with_capacity(decl.params.len());
                    for param in &decl.params {
                        let ty =
                            resolve_or(&registry, &param.ty, SE::UndeclaredClass, param.coord)?;
                        params.push((param.name.name.clone(), ty));
                    }
                    registry.classes[class_name]
                        .methods
                        .insert(decl.name.name.clone(), MethodSig { ret, params });
                }
                MethodItem::Main(decl) => {
                    if registry.classes[class_name].methods.contains_key("main") {
                        return Err(Diagnostic::semantic(
                            SE::AlreadyDeclaredMethod,
                            "main",
                            decl.coord,
                        ));
                    }
                    registry.classes[class_name].methods.insert(
                        "main".to_string(),
                        MethodSig {
                            ret: MjType::Void,
                            params: vec![(decl.args.name.clone(), MjType::StrArray)],
                        },
                    );
                }
            }
        }
    }

    Ok(registry)
}

fn resolve_or(
    registry: &ClassRegistry,
    spec: &TypeSpec,
    kind: SE,
    coord: Coord,
) -> Result<MjType, Diagnostic> {
    registry
        .resolve_type(spec)
        .ok_or_else(|| Diagnostic::semantic(kind, spec.name.clone(), coord))
}

fn already_declared(kind: SE, class: &ClassDecl) -> Diagnostic {
    Diagnostic::semantic(kind, class.name.name.clone(), class.coord)
}
