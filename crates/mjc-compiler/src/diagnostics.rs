//! Compiler diagnostics.
//!
//! Every pass fails fast: the first error is wrapped in a [`Diagnostic`] and
//! bubbled to the caller, which prints it and stops. `Display` produces the
//! one-line forms the test fixtures expect; [`DiagnosticsPrinter`] renders
//! the offending source line with a caret on demand.

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use crate::source::{Coord, LineIndex};

/// Semantic error kinds, printed in their wire form (`UNDECLARED_NAME`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    AlreadyDeclaredClass,
    UndeclaredClass,
    AlreadyDeclaredField,
    UndeclaredField,
    AlreadyDeclaredMethod,
    UndeclaredMethod,
    AlreadyDeclaredName,
    UndeclaredName,
    ParameterAlreadyDeclared,
    ReturnTypeMismatch,
    ArgumentCountMismatch,
    ParameterTypeMismatch,
    AssignTypeMismatch,
    BinaryExpressionTypeMismatch,
    UnsupportedBinaryOperation,
    UnsupportedUnaryOperation,
    ConditionalExpressionTypeMismatch,
    AssertExpressionTypeMismatch,
    PrintExpressionTypeMismatch,
    ArrayDimentionMismatch,
    ArrayRefTypeMismatch,
    ArrayElementTypeMismatch,
    InvalidLengthTarget,
    ObjectTypeMustBeAClass,
    WrongBreakStatement,
    NotAConstant,
}

impl std::fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AlreadyDeclaredClass => "ALREADY_DECLARED_CLASS",
            Self::UndeclaredClass => "UNDECLARED_CLASS",
            Self::AlreadyDeclaredField => "ALREADY_DECLARED_FIELD",
            Self::UndeclaredField => "UNDECLARED_FIELD",
            Self::AlreadyDeclaredMethod => "ALREADY_DECLARED_METHOD",
            Self::UndeclaredMethod => "UNDECLARED_METHOD",
            Self::AlreadyDeclaredName => "ALREADY_DECLARED_NAME",
            Self::UndeclaredName => "UNDECLARED_NAME",
            Self::ParameterAlreadyDeclared => "PARAMETER_ALREADY_DECLARED",
            Self::ReturnTypeMismatch => "RETURN_TYPE_MISMATCH",
            Self::ArgumentCountMismatch => "ARGUMENT_COUNT_MISMATCH",
            Self::ParameterTypeMismatch => "PARAMETER_TYPE_MISMATCH",
            Self::AssignTypeMismatch => "ASSIGN_TYPE_MISMATCH",
            Self::BinaryExpressionTypeMismatch => "BINARY_EXPRESSION_TYPE_MISMATCH",
            Self::UnsupportedBinaryOperation => "UNSUPPORTED_BINARY_OPERATION",
            Self::UnsupportedUnaryOperation => "UNSUPPORTED_UNARY_OPERATION",
            Self::ConditionalExpressionTypeMismatch => "CONDITIONAL_EXPRESSION_TYPE_MISMATCH",
            Self::AssertExpressionTypeMismatch => "ASSERT_EXPRESSION_TYPE_MISMATCH",
            Self::PrintExpressionTypeMismatch => "PRINT_EXPRESSION_TYPE_MISMATCH",
            Self::ArrayDimentionMismatch => "ARRAY_DIMENTION_MISMATCH",
            Self::ArrayRefTypeMismatch => "ARRAY_REF_TYPE_MISMATCH",
            Self::ArrayElementTypeMismatch => "ARRAY_ELEMENT_TYPE_MISMATCH",
            Self::InvalidLengthTarget => "INVALID_LENGTH_TARGET",
            Self::ObjectTypeMustBeAClass => "OBJECT_TYPE_MUST_BE_A_CLASS",
            Self::WrongBreakStatement => "WRONG_BREAK_STATEMENT",
            Self::NotAConstant => "NOT_A_CONSTANT",
        };
        f.write_str(name)
    }
}

/// Which pass produced the diagnostic. Decides the printed shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexer,
    Parser,
    Semantic(SemanticErrorKind),
}

/// A fatal, pinpointed compiler error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Offending name, operator, or type pair; empty when the kind says it all.
    pub detail: String,
    pub coord: Coord,
}

impl Diagnostic {
    pub fn lexer(message: impl Into<String>, coord: Coord) -> Self {
        Self {
            kind: DiagnosticKind::Lexer,
            detail: message.into(),
            coord,
        }
    }

    pub fn parser(message: impl Into<String>, coord: Coord) -> Self {
        Self {
            kind: DiagnosticKind::Parser,
            detail: message.into(),
            coord,
        }
    }

    pub fn semantic(kind: SemanticErrorKind, detail: impl Into<String>, coord: Coord) -> Self {
        Self {
            kind: DiagnosticKind::Semantic(kind),
            detail: detail.into(),
            coord,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            DiagnosticKind::Lexer => {
                write!(f, "LexerError: {} at {}", self.detail, self.coord)
            }
            DiagnosticKind::Parser => {
                write!(f, "ParserError: {} @ {}", self.detail, self.coord)
            }
            DiagnosticKind::Semantic(kind) => {
                write!(f, "SemanticError: {kind}")?;
                if !self.detail.is_empty() {
                    write!(f, " {}", self.detail)?;
                }
                write!(f, " @ {}", self.coord)
            }
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Renders a diagnostic against its source with a caret under the offending
/// position.
pub struct DiagnosticsPrinter<'a> {
    diagnostic: &'a Diagnostic,
    source: &'a str,
    path: Option<&'a str>,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(diagnostic: &'a Diagnostic, source: &'a str) -> Self {
        Self {
            diagnostic,
            source,
            path: None,
        }
    }

    pub fn path(mut self, path: &'a str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn render(&self) -> String {
        let index = LineIndex::new(self.source);
        let start = index.offset_of(self.diagnostic.coord).min(self.source.len());
        let end = (start + 1).min(self.source.len());
        let title = self.diagnostic.to_string();

        let mut snippet = Snippet::source(self.source)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(start..end.max(start)).label(&title));
        if let Some(path) = self.path {
            snippet = snippet.path(path);
        }

        let report = [Level::ERROR.primary_title(&title).element(snippet)];
        Renderer::plain().render(&report).to_string()
    }
}
