//! Tests for the lexer
//!
//! These tests drive the token stream directly, without a parser on top,
//! so they can check spans, flags and the rescan entry points.

#![allow(clippy::unwrap_used, clippy::panic)]

use esparse::lexer::{Lexer, TokenKind};

/// Collect every token kind until end of input.
#[allow(clippy::expect_used)]
fn kinds(source: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(source);
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token().expect("lex failed");
        if token.is_eof() {
            break;
        }
        out.push(token.kind);
    }
    out
}

#[allow(clippy::expect_used)]
fn single(source: &str) -> esparse::Token {
    let mut lexer = Lexer::new(source);
    lexer.next_token().expect("lex failed")
}

#[test]
fn test_keywords_vs_contextual_words() {
    assert_eq!(kinds("if"), vec![TokenKind::If]);
    assert_eq!(kinds("yield"), vec![TokenKind::Yield]);
    assert_eq!(kinds("await"), vec![TokenKind::Await]);
    // contextual keywords stay identifiers at the token level
    assert_eq!(kinds("let"), vec![TokenKind::Identifier("let".to_string())]);
    assert_eq!(
        kinds("async of static"),
        vec![
            TokenKind::Identifier("async".to_string()),
            TokenKind::Identifier("of".to_string()),
            TokenKind::Identifier("static".to_string()),
        ]
    );
}

#[test]
fn test_punctuator_maximal_munch() {
    assert_eq!(
        kinds(">>>= >>> >>= >> >= >"),
        vec![
            TokenKind::GtGtGtEq,
            TokenKind::GtGtGt,
            TokenKind::GtGtEq,
            TokenKind::GtGt,
            TokenKind::GtEq,
            TokenKind::Gt,
        ]
    );
    assert_eq!(
        kinds("** **= * *="),
        vec![
            TokenKind::StarStar,
            TokenKind::StarStarEq,
            TokenKind::Star,
            TokenKind::StarEq,
        ]
    );
    assert_eq!(
        kinds("... . => ="),
        vec![
            TokenKind::DotDotDot,
            TokenKind::Dot,
            TokenKind::Arrow,
            TokenKind::Eq,
        ]
    );
}

#[test]
fn test_numeric_literals() {
    assert_eq!(kinds("42"), vec![TokenKind::Number(42.0)]);
    assert_eq!(kinds("4.25"), vec![TokenKind::Number(4.25)]);
    assert_eq!(kinds(".5"), vec![TokenKind::Number(0.5)]);
    assert_eq!(kinds("1e3"), vec![TokenKind::Number(1000.0)]);
    assert_eq!(kinds("2E-2"), vec![TokenKind::Number(0.02)]);
    assert_eq!(kinds("0xFF"), vec![TokenKind::Number(255.0)]);
    assert_eq!(kinds("0b101"), vec![TokenKind::Number(5.0)]);
    assert_eq!(kinds("0o17"), vec![TokenKind::Number(15.0)]);
}

#[test]
fn test_legacy_octal_sets_flag() {
    let token = single("010");
    assert_eq!(token.kind, TokenKind::Number(8.0));
    assert!(token.octal);
    let token = single("42");
    assert!(!token.octal);
    // string with a legacy octal escape
    let token = single("'\\07'");
    assert!(token.octal);
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        kinds("'a\\tb'"),
        vec![TokenKind::String("a\tb".to_string())]
    );
    assert_eq!(
        kinds("\"\\u0041\\x42\""),
        vec![TokenKind::String("AB".to_string())]
    );
    assert_eq!(
        kinds("'\\u{1F600}'"),
        vec![TokenKind::String("\u{1F600}".to_string())]
    );
    // line continuation swallows the newline
    assert_eq!(
        kinds("'a\\\nb'"),
        vec![TokenKind::String("ab".to_string())]
    );
}

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new("'abc");
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.message(), "Unterminated string constant");
}

#[test]
fn test_identifier_unicode_escapes() {
    let token = single("\\u0061bc");
    assert_eq!(token.kind, TokenKind::Identifier("abc".to_string()));
    assert!(token.had_escape);
    // keywords may not be written with escapes
    let mut lexer = Lexer::new("\\u0069f");
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.message(), "Keyword must not contain escaped characters");
}

#[test]
fn test_newline_before_flag() {
    let mut lexer = Lexer::new("a\nb c");
    let a = lexer.next_token().unwrap();
    let b = lexer.next_token().unwrap();
    let c = lexer.next_token().unwrap();
    assert!(!a.newline_before);
    assert!(b.newline_before);
    assert!(!c.newline_before);
}

#[test]
fn test_comments_are_skipped_but_newlines_count() {
    let mut lexer = Lexer::new("a // one\nb /* two\nthree */ c");
    let a = lexer.next_token().unwrap();
    let b = lexer.next_token().unwrap();
    let c = lexer.next_token().unwrap();
    assert_eq!(a.kind, TokenKind::Identifier("a".to_string()));
    assert!(b.newline_before);
    // a block comment containing a newline also sets the flag
    assert!(c.newline_before);
}

#[test]
fn test_spans_and_positions() {
    let mut lexer = Lexer::new("ab\ncd");
    let ab = lexer.next_token().unwrap();
    assert_eq!(ab.span.start.index, 0);
    assert_eq!(ab.span.end.index, 2);
    assert_eq!(ab.span.start.line, 1);
    assert_eq!(ab.span.start.column, 0);
    let cd = lexer.next_token().unwrap();
    assert_eq!(cd.span.start.index, 3);
    assert_eq!(cd.span.start.line, 2);
    assert_eq!(cd.span.start.column, 0);
}

#[test]
fn test_template_tokens() {
    let mut lexer = Lexer::new("`a${b}c`");
    let head = lexer.next_token().unwrap();
    let TokenKind::TemplateHead(chunk) = &head.kind else {
        panic!("expected template head, got {:?}", head.kind);
    };
    assert_eq!(chunk.raw, "a");
    assert_eq!(chunk.cooked.as_deref(), Some("a"));
    let b = lexer.next_token().unwrap();
    assert_eq!(b.kind, TokenKind::Identifier("b".to_string()));
    // the parser hands the closing brace back for template continuation
    let rbrace = lexer.next_token().unwrap();
    assert_eq!(rbrace.kind, TokenKind::RBrace);
    let tail = lexer.rescan_template_continuation(rbrace.span).unwrap();
    let TokenKind::TemplateTail(chunk) = &tail.kind else {
        panic!("expected template tail, got {:?}", tail.kind);
    };
    assert_eq!(chunk.raw, "c");
}

#[test]
fn test_template_no_substitution() {
    let token = single("`plain`");
    let TokenKind::TemplateNoSub(chunk) = &token.kind else {
        panic!("expected template, got {:?}", token.kind);
    };
    assert_eq!(chunk.raw, "plain");
    // chunk span excludes the backticks
    assert_eq!(chunk.span.start.index, 1);
    assert_eq!(chunk.span.end.index, 6);
}

#[test]
fn test_template_invalid_escape_cooks_to_none() {
    let token = single("`\\u{ZZ}`");
    let TokenKind::TemplateNoSub(chunk) = &token.kind else {
        panic!("expected template, got {:?}", token.kind);
    };
    assert!(chunk.cooked.is_none());
    assert_eq!(chunk.raw, "\\u{ZZ}");
}

#[test]
fn test_regexp_rescan() {
    // in isolation the lexer produces Slash; the parser requests a rescan
    // when expression position makes it a regex
    let mut lexer = Lexer::new("/ab[/]c/gi");
    let slash = lexer.next_token().unwrap();
    assert_eq!(slash.kind, TokenKind::Slash);
    let regex = lexer.rescan_as_regexp(slash.span).unwrap();
    let TokenKind::RegExp { pattern, flags } = &regex.kind else {
        panic!("expected regex, got {:?}", regex.kind);
    };
    assert_eq!(pattern, "ab[/]c");
    assert_eq!(flags, "gi");
}

#[test]
fn test_unterminated_regexp() {
    let mut lexer = Lexer::new("/ab");
    let slash = lexer.next_token().unwrap();
    let err = lexer.rescan_as_regexp(slash.span).unwrap_err();
    assert_eq!(err.message(), "Unterminated regular expression");
}

#[test]
fn test_checkpoint_restore_roundtrip() {
    let mut lexer = Lexer::new("a b c");
    let _a = lexer.next_token().unwrap();
    let checkpoint = lexer.checkpoint();
    let b1 = lexer.next_token().unwrap();
    let _c = lexer.next_token().unwrap();
    lexer.restore(checkpoint);
    let b2 = lexer.next_token().unwrap();
    assert_eq!(b1.kind, b2.kind);
    assert_eq!(b1.span, b2.span);
}

#[test]
fn test_unexpected_character() {
    let mut lexer = Lexer::new("a # b");
    let _a = lexer.next_token().unwrap();
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.message(), "Unexpected character '#'");
}

#[test]
fn test_unicode_whitespace_and_line_separators() {
    // U+2028 terminates lines for ASI purposes
    let mut lexer = Lexer::new("a\u{2028}b");
    let _a = lexer.next_token().unwrap();
    let b = lexer.next_token().unwrap();
    assert!(b.newline_before);
    assert_eq!(b.span.start.line, 2);
    // NBSP is plain whitespace
    assert_eq!(
        kinds("a\u{00A0}b"),
        vec![
            TokenKind::Identifier("a".to_string()),
            TokenKind::Identifier("b".to_string()),
        ]
    );
}
