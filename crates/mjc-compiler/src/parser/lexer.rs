//! Lexer for MiniJava.
//!
//! Produces span-based tokens; text is sliced from the source only when
//! needed. Whitespace and both comment forms are skipped by the lexer
//! itself. The first illegal character aborts with a `LexerError`.

use logos::Logos;

use crate::diagnostics::Diagnostic;
use crate::source::LineIndex;

/// Byte span of a token in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
pub enum TokenKind {
    // Keywords
    #[token("class")]
    Class,
    #[token("extends")]
    Extends,
    #[token("public")]
    Public,
    #[token("static")]
    Static,
    #[token("void")]
    Void,
    #[token("main")]
    Main,
    #[token("String")]
    String,
    #[token("boolean")]
    Boolean,
    #[token("char")]
    Char,
    #[token("int")]
    Int,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("assert")]
    Assert,
    #[token("break")]
    Break,
    #[token("return")]
    Return,
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("length")]
    Length,
    #[token("print")]
    Print,

    // Literals
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
    #[regex("[0-9]+")]
    IntLiteral,
    #[regex(r"'(\\['nt\\]|[^\\'])'")]
    CharLiteral,
    #[regex(r#""([^"\\\n\r]|\\.)*""#)]
    StringLiteral,

    // Operators (longer tokens first)
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,

    // Punctuation
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

impl TokenKind {
    /// Human form used in parser error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Class => "'class'",
            TokenKind::Extends => "'extends'",
            TokenKind::Public => "'public'",
            TokenKind::Static => "'static'",
            TokenKind::Void => "'void'",
            TokenKind::Main => "'main'",
            TokenKind::String => "'String'",
            TokenKind::Boolean => "'boolean'",
            TokenKind::Char => "'char'",
            TokenKind::Int => "'int'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::For => "'for'",
            TokenKind::Assert => "'assert'",
            TokenKind::Break => "'break'",
            TokenKind::Return => "'return'",
            TokenKind::New => "'new'",
            TokenKind::This => "'this'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Length => "'length'",
            TokenKind::Print => "'print'",
            TokenKind::Ident => "identifier",
            TokenKind::IntLiteral => "int literal",
            TokenKind::CharLiteral => "char literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::EqEq => "'=='",
            TokenKind::BangEq => "'!='",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::Eq => "'='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Bang => "'!'",
            TokenKind::Dot => "'.'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrack => "'['",
            TokenKind::RBrack => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
        }
    }
}

/// A token: kind plus span. Text is sliced from the source on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Tokenize the whole source, failing on the first illegal character.
pub fn lex(source: &str, index: &LineIndex) -> Result<Vec<Token>, Diagnostic> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                span: Span {
                    start: span.start,
                    end: span.end,
                },
            }),
            Err(()) => {
                let ch = source[span.start..].chars().next().unwrap_or('\u{fffd}');
                return Err(Diagnostic::lexer(
                    format!("Illegal character {ch:?}"),
                    index.coord_at(span.start),
                ));
            }
        }
    }
    Ok(tokens)
}

/// The source text of a token.
pub fn token_text<'src>(source: &'src str, token: &Token) -> &'src str {
    &source[token.span.start..token.span.end]
}
