//! Recursive-descent parser for MiniJava.
//!
//! Implements the declared grammar directly: one function per production,
//! binary operators parsed level by level in precedence order
//! (`||` < `&&` < `== !=` < `< <= > >=` < `+ -` < `* / %` < unary).
//! `else` binds to the nearest `if`. The first syntax error aborts.

use crate::diagnostics::Diagnostic;
use crate::parser::ast::*;
use crate::parser::lexer::{Token, TokenKind, lex, token_text};
use crate::source::{Coord, LineIndex};

/// Parse a whole translation unit.
pub fn parse_program(source: &str) -> Result<Program, Diagnostic> {
    let index = LineIndex::new(source);
    let tokens = lex(source, &index)?;
    let mut parser = Parser {
        source,
        index: &index,
        tokens,
        pos: 0,
        next_expr_id: 0,
    };
    parser.program()
}

struct Parser<'src> {
    source: &'src str,
    index: &'src LineIndex,
    tokens: Vec<Token>,
    pos: usize,
    next_expr_id: u32,
}

impl<'src> Parser<'src> {
    // --- cursor ---

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn current_coord(&self) -> Coord {
        match self.tokens.get(self.pos) {
            Some(token) => self.index.coord_at(token.span.start),
            None => self.index.coord_at(self.source.len()),
        }
    }

    fn error(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::parser(message, self.current_coord())
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        let found = match self.peek() {
            Some(kind) => kind.describe(),
            None => "end of input",
        };
        self.error(format!("expected {expected}, found {found}"))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Diagnostic> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn text(&self, token: &Token) -> &'src str {
        token_text(self.source, token)
    }

    fn coord(&self, token: &Token) -> Coord {
        self.index.coord_at(token.span.start)
    }

    fn mk_expr(&mut self, kind: ExprKind, coord: Coord) -> Expr {
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        Expr { kind, coord, id }
    }

    fn ident(&mut self) -> Result<Ident, Diagnostic> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident {
            name: self.text(&token).to_string(),
            coord: self.coord(&token),
        })
    }

    // --- declarations ---

    fn program(&mut self) -> Result<Program, Diagnostic> {
        let mut classes = vec![self.class_decl()?];
        while self.peek().is_some() {
            classes.push(self.class_decl()?);
        }
        Ok(Program { classes })
    }

    fn class_decl(&mut self) -> Result<ClassDecl, Diagnostic> {
        let class_token = self.expect(TokenKind::Class)?;
        let coord = self.coord(&class_token);
        let name = self.ident()?;
        let extends = if self.eat(TokenKind::Extends) {
            Some(self.ident()?)
        } else {
            None
        };
        self.expect(TokenKind::LBrace)?;

        // Fields precede methods in a class body.
        let mut fields = Vec::new();
        while self.at_type_start() && !self.at(TokenKind::Public) {
            fields.extend(self.var_decl_list()?);
            self.expect(TokenKind::Semicolon)?;
        }

        let mut methods = Vec::new();
        while self.at(TokenKind::Public) {
            methods.push(self.method_item()?);
        }

        self.expect(TokenKind::RBrace)?;
        Ok(ClassDecl {
            name,
            extends,
            fields,
            methods,
            coord,
        })
    }

    fn at_type_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                TokenKind::Void
                    | TokenKind::Boolean
                    | TokenKind::Char
                    | TokenKind::Int
                    | TokenKind::String
                    | TokenKind::Ident
            )
        )
    }

    fn type_spec(&mut self) -> Result<TypeSpec, Diagnostic> {
        let token = match self.peek() {
            Some(
                TokenKind::Void
                | TokenKind::Boolean
                | TokenKind::Char
                | TokenKind::Int
                | TokenKind::String
                | TokenKind::Ident,
            ) => self.bump(),
            _ => return Err(self.unexpected("a type")),
        };
        let coord = self.coord(&token);
        let mut name = self.text(&token).to_string();
        // only int[] and char[] exist as declared array types
        if matches!(token.kind, TokenKind::Int | TokenKind::Char) && self.at(TokenKind::LBrack) {
            self.bump();
            self.expect(TokenKind::RBrack)?;
            name.push_str("[]");
        }
        Ok(TypeSpec { name, coord })
    }

    /// `type a = init, b, c = init` - shared type, several declarators.
    fn var_decl_list(&mut self) -> Result<Vec<VarDecl>, Diagnostic> {
        let ty = self.type_spec()?;
        let mut decls = Vec::new();
        loop {
            let name = self.ident()?;
            let init = if self.eat(TokenKind::Eq) {
                Some(self.initializer()?)
            } else {
                None
            };
            decls.push(VarDecl {
                ty: ty.clone(),
                coord: name.coord,
                name,
                init,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(decls)
    }

    fn initializer(&mut self) -> Result<Expr, Diagnostic> {
        if !self.at(TokenKind::LBrace) {
            return self.expr();
        }
        let brace = self.bump();
        let coord = self.coord(&brace);
        let mut elems = Vec::new();
        if !self.at(TokenKind::RBrace) {
            loop {
                elems.push(self.expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
                // tolerate a trailing comma before the closing brace
                if self.at(TokenKind::RBrace) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.mk_expr(ExprKind::InitList { elems }, coord))
    }

    fn method_item(&mut self) -> Result<MethodItem, Diagnostic> {
        let public = self.expect(TokenKind::Public)?;
        let coord = self.coord(&public);
        if self.at(TokenKind::Static) {
            return Ok(MethodItem::Main(self.main_method_decl(coord)?));
        }
        let ret = self.type_spec()?;
        let name = self.ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let ty = self.type_spec()?;
                let name = self.ident()?;
                params.push(ParamDecl {
                    ty,
                    coord: name.coord,
                    name,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.compound()?;
        Ok(MethodItem::Method(MethodDecl {
            ret,
            name,
            params,
            body,
            coord,
        }))
    }

    fn main_method_decl(&mut self, coord: Coord) -> Result<MainMethodDecl, Diagnostic> {
        self.expect(TokenKind::Static)?;
        self.expect(TokenKind::Void)?;
        self.expect(TokenKind::Main)?;
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::String)?;
        self.expect(TokenKind::LBrack)?;
        self.expect(TokenKind::RBrack)?;
        let args = self.ident()?;
        self.expect(TokenKind::RParen)?;
        let body = self.compound()?;
        Ok(MainMethodDecl { args, body, coord })
    }

    // --- statements ---

    fn compound(&mut self) -> Result<Stmt, Diagnostic> {
        let brace = self.expect(TokenKind::LBrace)?;
        let coord = self.coord(&brace);
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.peek().is_none() {
                return Err(self.unexpected("'}'"));
            }
            stmts.push(self.statement()?);
        }
        self.bump();
        Ok(Stmt::Compound { stmts, coord })
    }

    fn statement(&mut self) -> Result<Stmt, Diagnostic> {
        match self.peek() {
            Some(TokenKind::LBrace) => self.compound(),
            Some(TokenKind::If) => self.if_stmt(),
            Some(TokenKind::While) => self.while_stmt(),
            Some(TokenKind::For) => self.for_stmt(),
            Some(TokenKind::Assert) => {
                let coord = self.current_coord();
                self.bump();
                let expr = self.expr()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Assert { expr, coord })
            }
            Some(TokenKind::Print) => self.print_stmt(),
            Some(TokenKind::Break) => {
                let coord = self.current_coord();
                self.bump();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Break { coord })
            }
            Some(TokenKind::Return) => {
                let coord = self.current_coord();
                self.bump();
                let expr = if self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Return { expr, coord })
            }
            Some(_) if self.at_decl_start() => {
                let coord = self.current_coord();
                let decls = self.var_decl_list()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Decl { decls, coord })
            }
            Some(_) => {
                let coord = self.current_coord();
                let expr = self.expr()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Expr { expr, coord })
            }
            None => Err(self.unexpected("a statement")),
        }
    }

    /// A statement starts a declaration when it leads with a type keyword,
    /// or with `Ident Ident` (a class-typed variable).
    fn at_decl_start(&self) -> bool {
        match self.peek() {
            Some(
                TokenKind::Boolean | TokenKind::Char | TokenKind::Int | TokenKind::String,
            ) => true,
            Some(TokenKind::Ident) => self.nth(1) == Some(TokenKind::Ident),
            _ => false,
        }
    }

    fn if_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let coord = self.current_coord();
        self.bump();
        self.expect(TokenKind::LParen)?;
        let cond = self.expr()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.eat(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            coord,
        })
    }

    fn while_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let coord = self.current_coord();
        self.bump();
        self.expect(TokenKind::LParen)?;
        let cond = self.expr()?;
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { cond, body, coord })
    }

    fn for_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let coord = self.current_coord();
        self.bump();
        self.expect(TokenKind::LParen)?;
        let init = if self.at(TokenKind::Semicolon) {
            None
        } else if self.at_decl_start() {
            Some(ForInit::Decl(self.var_decl_list()?))
        } else {
            Some(ForInit::Expr(self.expr()?))
        };
        self.expect(TokenKind::Semicolon)?;
        let cond = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        let next = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init,
            cond,
            next,
            body,
            coord,
        })
    }

    fn print_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let coord = self.current_coord();
        self.bump();
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Print { args, coord })
    }

    // --- expressions ---

    fn expr(&mut self) -> Result<Expr, Diagnostic> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, Diagnostic> {
        let left = self.or_expr()?;
        if !self.at(TokenKind::Eq) {
            return Ok(left);
        }
        if !matches!(
            left.kind,
            ExprKind::Name(_) | ExprKind::FieldAccess { .. } | ExprKind::ArrayRef { .. }
        ) {
            return Err(Diagnostic::parser("invalid assignment target", left.coord));
        }
        self.bump();
        let coord = left.coord;
        let value = self.assignment()?;
        Ok(self.mk_expr(
            ExprKind::Assign {
                target: Box::new(left),
                value: Box::new(value),
            },
            coord,
        ))
    }

    fn binary_level(
        &mut self,
        ops: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, Diagnostic>,
    ) -> Result<Expr, Diagnostic> {
        let mut left = next(self)?;
        'outer: loop {
            for &(kind, op) in ops {
                if self.at(kind) {
                    self.bump();
                    let right = next(self)?;
                    let coord = left.coord;
                    left = self.mk_expr(
                        ExprKind::Binary {
                            op,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                        coord,
                    );
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn or_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.binary_level(&[(TokenKind::PipePipe, BinaryOp::Or)], Self::and_expr)
    }

    fn and_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.binary_level(&[(TokenKind::AmpAmp, BinaryOp::And)], Self::equality_expr)
    }

    fn equality_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.binary_level(
            &[
                (TokenKind::EqEq, BinaryOp::Eq),
                (TokenKind::BangEq, BinaryOp::Ne),
            ],
            Self::relational_expr,
        )
    }

    fn relational_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.binary_level(
            &[
                (TokenKind::Lt, BinaryOp::Lt),
                (TokenKind::LtEq, BinaryOp::Le),
                (TokenKind::Gt, BinaryOp::Gt),
                (TokenKind::GtEq, BinaryOp::Ge),
            ],
            Self::additive_expr,
        )
    }

    fn additive_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.binary_level(
            &[
                (TokenKind::Plus, BinaryOp::Add),
                (TokenKind::Minus, BinaryOp::Sub),
            ],
            Self::multiplicative_expr,
        )
    }

    fn multiplicative_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.binary_level(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Mod),
            ],
            Self::unary_expr,
        )
    }

    fn unary_expr(&mut self) -> Result<Expr, Diagnostic> {
        let op = match self.peek() {
            Some(TokenKind::Plus) => Some(UnaryOp::Pos),
            Some(TokenKind::Minus) => Some(UnaryOp::Neg),
            Some(TokenKind::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.postfix_expr();
        };
        let coord = self.current_coord();
        self.bump();
        let operand = self.unary_expr()?;
        Ok(self.mk_expr(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            coord,
        ))
    }

    fn postfix_expr(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.primary_expr()?;
        loop {
            if self.eat(TokenKind::Dot) {
                if self.at(TokenKind::Length) {
                    let token = self.bump();
                    let coord = self.coord(&token);
                    expr = self.mk_expr(
                        ExprKind::Length {
                            target: Box::new(expr),
                        },
                        coord,
                    );
                    continue;
                }
                let member = self.ident()?;
                if self.at(TokenKind::LParen) {
                    self.bump();
                    let mut args = Vec::new();
                    if !self.at(TokenKind::RParen) {
                        loop {
                            args.push(self.expr()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    let coord = member.coord;
                    expr = self.mk_expr(
                        ExprKind::MethodCall {
                            object: Box::new(expr),
                            method: member,
                            args,
                        },
                        coord,
                    );
                } else {
                    let coord = member.coord;
                    expr = self.mk_expr(
                        ExprKind::FieldAccess {
                            object: Box::new(expr),
                            field: member,
                        },
                        coord,
                    );
                }
            } else if self.at(TokenKind::LBrack) {
                self.bump();
                let index = self.expr()?;
                self.expect(TokenKind::RBrack)?;
                let coord = expr.coord;
                expr = self.mk_expr(
                    ExprKind::ArrayRef {
                        array: Box::new(expr),
                        index: Box::new(index),
                    },
                    coord,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary_expr(&mut self) -> Result<Expr, Diagnostic> {
        let coord = self.current_coord();
        match self.peek() {
            Some(TokenKind::IntLiteral) => {
                let token = self.bump();
                let value = self.text(&token).parse::<i64>().unwrap_or(i64::MAX) as i32;
                Ok(self.mk_expr(ExprKind::Int(value), coord))
            }
            Some(TokenKind::CharLiteral) => {
                let token = self.bump();
                let value = decode_char(self.text(&token));
                Ok(self.mk_expr(ExprKind::Char(value), coord))
            }
            Some(TokenKind::StringLiteral) => {
                let token = self.bump();
                let value = decode_string(self.text(&token));
                Ok(self.mk_expr(ExprKind::Str(value), coord))
            }
            Some(TokenKind::True) => {
                self.bump();
                Ok(self.mk_expr(ExprKind::Bool(true), coord))
            }
            Some(TokenKind::False) => {
                self.bump();
                Ok(self.mk_expr(ExprKind::Bool(false), coord))
            }
            Some(TokenKind::This) => {
                self.bump();
                Ok(self.mk_expr(ExprKind::This, coord))
            }
            Some(TokenKind::Ident) => {
                let token = self.bump();
                let name = self.text(&token).to_string();
                Ok(self.mk_expr(ExprKind::Name(name), coord))
            }
            Some(TokenKind::New) => self.new_expr(),
            Some(TokenKind::LParen) => {
                self.bump();
                let expr = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn new_expr(&mut self) -> Result<Expr, Diagnostic> {
        let new_token = self.expect(TokenKind::New)?;
        let coord = self.coord(&new_token);
        match self.peek() {
            Some(TokenKind::Int | TokenKind::Char) => {
                let token = self.bump();
                let elem_coord = self.coord(&token);
                let name = format!("{}[]", self.text(&token));
                self.expect(TokenKind::LBrack)?;
                let size = self.expr()?;
                self.expect(TokenKind::RBrack)?;
                Ok(self.mk_expr(
                    ExprKind::NewArray {
                        ty: TypeSpec {
                            name,
                            coord: elem_coord,
                        },
                        size: Box::new(size),
                    },
                    coord,
                ))
            }
            Some(TokenKind::Ident) => {
                let class = self.ident()?;
                self.expect(TokenKind::LParen)?;
                self.expect(TokenKind::RParen)?;
                Ok(self.mk_expr(ExprKind::NewObject { class }, coord))
            }
            _ => Err(self.unexpected("'int', 'char', or a class name")),
        }
    }
}

fn decode_char(text: &str) -> char {
    let inner = &text[1..text.len() - 1];
    let mut chars = inner.chars();
    match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some(c) => c,
            None => '\\',
        },
        Some(c) => c,
        None => '\0',
    }
}

fn decode_string(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(c) => out.push(c),
            None => out.push('\\'),
        }
    }
    out
}
