//! The MiniJava AST.
//!
//! Plain tagged trees built by the parser and never mutated afterwards.
//! Every node carries its source [`Coord`]; every expression additionally
//! carries an [`ExprId`] under which the semantic analyzer records its
//! resolved type.

use serde::Serialize;

use crate::source::Coord;

/// Stable handle of an expression node, assigned left-to-right by the
/// parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ident {
    pub name: String,
    pub coord: Coord,
}

/// A type as written: `int`, `char[]`, `String`, or a class name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSpec {
    pub name: String,
    pub coord: Coord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl {
    pub name: Ident,
    pub extends: Option<Ident>,
    pub fields: Vec<VarDecl>,
    pub methods: Vec<MethodItem>,
    pub coord: Coord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MethodItem {
    Method(MethodDecl),
    Main(MainMethodDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDecl {
    pub ret: TypeSpec,
    pub name: Ident,
    pub params: Vec<ParamDecl>,
    pub body: Stmt,
    pub coord: Coord,
}

/// `public static void main(String[] args)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainMethodDecl {
    pub args: Ident,
    pub body: Stmt,
    pub coord: Coord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDecl {
    pub ty: TypeSpec,
    pub name: Ident,
    pub coord: Coord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarDecl {
    pub ty: TypeSpec,
    pub name: Ident,
    pub init: Option<Expr>,
    pub coord: Coord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Compound {
        stmts: Vec<Stmt>,
        coord: Coord,
    },
    /// One declaration statement, possibly with several declarators.
    Decl {
        decls: Vec<VarDecl>,
        coord: Coord,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        coord: Coord,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        coord: Coord,
    },
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        next: Option<Expr>,
        body: Box<Stmt>,
        coord: Coord,
    },
    Assert {
        expr: Expr,
        coord: Coord,
    },
    Print {
        args: Vec<Expr>,
        coord: Coord,
    },
    Break {
        coord: Coord,
    },
    Return {
        expr: Option<Expr>,
        coord: Coord,
    },
    Expr {
        expr: Expr,
        coord: Coord,
    },
}

impl Stmt {
    pub fn coord(&self) -> Coord {
        match self {
            Stmt::Compound { coord, .. }
            | Stmt::Decl { coord, .. }
            | Stmt::If { coord, .. }
            | Stmt::While { coord, .. }
            | Stmt::For { coord, .. }
            | Stmt::Assert { coord, .. }
            | Stmt::Print { coord, .. }
            | Stmt::Break { coord }
            | Stmt::Return { coord, .. }
            | Stmt::Expr { coord, .. } => *coord,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ForInit {
    Decl(Vec<VarDecl>),
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub coord: Coord,
    pub id: ExprId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    ArrayRef {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    FieldAccess {
        object: Box<Expr>,
        field: Ident,
    },
    MethodCall {
        object: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
    },
    Length {
        target: Box<Expr>,
    },
    NewArray {
        ty: TypeSpec,
        size: Box<Expr>,
    },
    NewObject {
        class: Ident,
    },
    Int(i32),
    Char(char),
    Str(String),
    Bool(bool),
    This,
    Name(String),
    InitList {
        elems: Vec<Expr>,
    },
}

impl Expr {
    /// True for the literal forms an initializer list accepts.
    pub fn is_constant(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Int(_) | ExprKind::Char(_) | ExprKind::Str(_) | ExprKind::Bool(_)
        )
    }
}
