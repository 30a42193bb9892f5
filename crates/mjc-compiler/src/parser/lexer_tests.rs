use crate::parser::lexer::{TokenKind, lex, token_text};
use crate::source::LineIndex;

fn kinds(source: &str) -> Vec<TokenKind> {
    let index = LineIndex::new(source);
    lex(source, &index)
        .expect("lexes")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn keywords_win_over_identifiers() {
    assert_eq!(
        kinds("class Main extends whiles"),
        vec![
            TokenKind::Class,
            TokenKind::Ident,
            TokenKind::Extends,
            TokenKind::Ident,
        ]
    );
}

#[test]
fn longer_operators_win() {
    assert_eq!(
        kinds("<= < == = != ! && ||"),
        vec![
            TokenKind::LtEq,
            TokenKind::Lt,
            TokenKind::EqEq,
            TokenKind::Eq,
            TokenKind::BangEq,
            TokenKind::Bang,
            TokenKind::AmpAmp,
            TokenKind::PipePipe,
        ]
    );
}

#[test]
fn comments_and_whitespace_are_skipped() {
    let source = "int x; // trailing\n/* a\n * block */ int y;";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Int,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::Int,
            TokenKind::Ident,
            TokenKind::Semicolon,
        ]
    );
}

#[test]
fn char_and_string_literals() {
    let source = r#"'a' '\n' '\'' "hi\n" """#;
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::CharLiteral,
            TokenKind::CharLiteral,
            TokenKind::CharLiteral,
            TokenKind::StringLiteral,
            TokenKind::StringLiteral,
        ]
    );
}

#[test]
fn token_text_slices_the_source() {
    let source = "print(x);";
    let index = LineIndex::new(source);
    let tokens = lex(source, &index).expect("lexes");
    assert_eq!(token_text(source, &tokens[0]), "print");
    assert_eq!(token_text(source, &tokens[2]), "x");
}

#[test]
fn illegal_character_is_fatal_with_coordinates() {
    let source = "int x;\n  #";
    let index = LineIndex::new(source);
    let err = lex(source, &index).expect_err("rejects '#'");
    assert_eq!(
        err.to_string(),
        "LexerError: Illegal character '#' at 2:3"
    );
}
