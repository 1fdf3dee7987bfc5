//! Lexer for ECMAScript source text
//!
//! Converts source text into a stream of tokens on demand. The cursor only
//! moves forward, except for the explicit rescan operations the parser uses
//! when grammatical context disambiguates `/` (division vs. regex) and `}`
//! (block close vs. template continuation).

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{ErrorLocation, ParseError};
use crate::unicode;

/// A single source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Byte offset into the source text.
    pub index: u32,
    /// 1-based line number.
    pub line: u32,
    /// 0-based column number.
    pub column: u32,
}

impl Position {
    pub fn new(index: u32, line: u32, column: u32) -> Self {
        Self {
            index,
            line,
            column,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self {
            index: 0,
            line: 1,
            column: 0,
        }
    }
}

/// Source span information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: Position::default(),
            end: Position::default(),
        }
    }
}

/// A literal chunk of a template literal (a "quasi"), between substitutions.
///
/// `cooked` is `None` when the chunk contains an escape sequence that failed
/// to decode. The lexer cannot know whether that is legal (it depends on
/// whether the template is tagged), so it defers the decision to the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateChunk {
    pub cooked: Option<String>,
    pub raw: String,
    /// Span of the raw chunk, excluding the surrounding delimiters.
    pub span: Span,
}

/// Token types for ECMAScript.
///
/// Contextual keywords (`let`, `static`, `async`, `of`, `get`, `set`,
/// `from`, `as`, `target`) are lexed as `Identifier` and recognized by the
/// parser where grammar position makes them special.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(String),
    RegExp { pattern: String, flags: String },
    True,
    False,
    Null,

    Identifier(String),

    // Reserved words
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Return,
    Super,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    // Contextually reserved (identifier outside generators/async/modules)
    Yield,
    Await,

    // Punctuators
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Dot,       // .
    DotDotDot, // ...
    Semicolon, // ;
    Comma,     // ,
    Colon,     // :
    Arrow,     // =>

    Lt,         // <
    Gt,         // >
    LtEq,       // <=
    GtEq,       // >=
    EqEq,       // ==
    BangEq,     // !=
    EqEqEq,     // ===
    BangEqEq,   // !==
    Plus,       // +
    Minus,      // -
    Star,       // *
    Percent,    // %
    StarStar,   // **
    Slash,      // /
    PlusPlus,   // ++
    MinusMinus, // --
    LtLt,       // <<
    GtGt,       // >>
    GtGtGt,     // >>>
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Bang,       // !
    Tilde,      // ~
    AmpAmp,     // &&
    PipePipe,   // ||
    Question,   // ?

    Eq,         // =
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    PercentEq,  // %=
    StarStarEq, // **=
    SlashEq,    // /=
    LtLtEq,     // <<=
    GtGtEq,     // >>=
    GtGtGtEq,   // >>>=
    AmpEq,      // &=
    PipeEq,     // |=
    CaretEq,    // ^=

    // Template literals
    TemplateHead(TemplateChunk),   // `...${
    TemplateMiddle(TemplateChunk), // }...${
    TemplateTail(TemplateChunk),   // }...`
    TemplateNoSub(TemplateChunk),  // `...`

    Eof,
}

/// A token with its source location and deferred-legality flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line terminator occurred between the previous token and this one.
    /// This is the sole input to automatic semicolon insertion.
    pub newline_before: bool,
    /// The token is a legacy octal numeric literal, a decimal with a leading
    /// zero, or a string containing a legacy octal escape. Only the parser
    /// knows whether strict mode makes these illegal.
    pub octal: bool,
    /// The token was written with `\u` escapes (identifiers only).
    pub had_escape: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            newline_before: false,
            octal: false,
            had_escape: false,
        }
    }

    pub fn eof(at: Position) -> Self {
        Self::new(TokenKind::Eof, Span::new(at, at))
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Map an identifier spelling to its reserved-word token, if any.
fn keyword(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "class" => TokenKind::Class,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "debugger" => TokenKind::Debugger,
        "default" => TokenKind::Default,
        "delete" => TokenKind::Delete,
        "do" => TokenKind::Do,
        "else" => TokenKind::Else,
        "enum" => TokenKind::Enum,
        "export" => TokenKind::Export,
        "extends" => TokenKind::Extends,
        "finally" => TokenKind::Finally,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "import" => TokenKind::Import,
        "in" => TokenKind::In,
        "instanceof" => TokenKind::Instanceof,
        "new" => TokenKind::New,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "switch" => TokenKind::Switch,
        "this" => TokenKind::This,
        "throw" => TokenKind::Throw,
        "try" => TokenKind::Try,
        "typeof" => TokenKind::Typeof,
        "var" => TokenKind::Var,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        "with" => TokenKind::With,
        "yield" => TokenKind::Yield,
        "await" => TokenKind::Await,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => return None,
    };
    Some(kind)
}

/// Lexer state checkpoint for one-token lookahead.
#[derive(Clone)]
pub struct LexerCheckpoint {
    current_pos: usize,
    line: u32,
    column: u32,
    prev_cr: bool,
    saw_newline: bool,
}

/// Lexer for tokenizing ECMAScript source text.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// Base offset added to char_indices positions (needed when resetting
    /// chars from the middle of the source).
    chars_base_offset: usize,
    current_pos: usize,
    line: u32,
    column: u32,
    token_start: Position,
    /// Tracks line terminators between tokens (for ASI).
    saw_newline: bool,
    /// The previous character was CR, so a following LF is the same line
    /// terminator sequence.
    prev_cr: bool,
    flag_octal: bool,
    flag_escape: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            chars_base_offset: 0,
            current_pos: 0,
            line: 1,
            column: 0,
            token_start: Position::default(),
            saw_newline: false,
            prev_cr: false,
            flag_octal: false,
            flag_escape: false,
        }
    }

    /// Create a checkpoint of the current lexer state for lookahead.
    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            current_pos: self.current_pos,
            line: self.line,
            column: self.column,
            prev_cr: self.prev_cr,
            saw_newline: self.saw_newline,
        }
    }

    /// Restore the lexer state from a checkpoint.
    pub fn restore(&mut self, checkpoint: LexerCheckpoint) {
        self.current_pos = checkpoint.current_pos;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.prev_cr = checkpoint.prev_cr;
        self.saw_newline = checkpoint.saw_newline;
        self.reset_chars(checkpoint.current_pos);
    }

    /// Rebuild the char iterator from an absolute byte offset (O(1) instead
    /// of re-walking the prefix).
    fn reset_chars(&mut self, offset: usize) {
        self.chars_base_offset = offset;
        self.chars = self
            .source
            .get(offset..)
            .unwrap_or("")
            .char_indices()
            .peekable();
    }

    fn pos(&self) -> Position {
        Position::new(self.current_pos as u32, self.line, self.column)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = self.chars_base_offset + pos + ch.len_utf8();
            match ch {
                '\r' => {
                    self.line += 1;
                    self.column = 0;
                    self.prev_cr = true;
                }
                '\n' => {
                    // CRLF counts as a single line terminator sequence.
                    if !self.prev_cr {
                        self.line += 1;
                    }
                    self.column = 0;
                    self.prev_cr = false;
                }
                '\u{2028}' | '\u{2029}' => {
                    self.line += 1;
                    self.column = 0;
                    self.prev_cr = false;
                }
                _ => {
                    self.column += 1;
                    self.prev_cr = false;
                }
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let slice = self.source.get(self.current_pos..)?;
        let mut iter = slice.chars();
        iter.next();
        iter.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make_span(&self) -> Span {
        Span::new(self.token_start, self.pos())
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::lexical(
            message,
            ErrorLocation {
                index: self.token_start.index,
                line: self.token_start.line,
                column: self.token_start.column,
            },
        )
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments()?;

        self.token_start = self.pos();
        self.flag_octal = false;
        self.flag_escape = false;
        let newline_before = self.saw_newline;

        let Some((_pos, ch)) = self.advance() else {
            let mut token = Token::eof(self.pos());
            token.newline_before = newline_before;
            return Ok(token);
        };

        let kind = match ch {
            // Single character tokens
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,

            // Potentially multi-character tokens
            '.' => self.scan_dot()?,
            '+' => self.scan_plus(),
            '-' => self.scan_minus(),
            '*' => self.scan_star(),
            '/' => self.scan_slash(),
            '%' => self.scan_percent(),
            '=' => self.scan_equals(),
            '!' => self.scan_bang(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '&' => self.scan_ampersand(),
            '|' => self.scan_pipe(),
            '^' => self.scan_caret(),
            '?' => TokenKind::Question,

            // String literals
            '"' | '\'' => self.scan_string(ch)?,

            // Template literals
            '`' => self.scan_template_chunk(true)?,

            // Numbers
            '0'..='9' => self.scan_number(ch)?,

            // Identifier written with a leading \u escape
            '\\' => self.scan_escaped_identifier_start()?,

            // Identifiers and keywords
            c if unicode::is_id_start(c) => self.scan_identifier(c)?,

            c => return Err(self.error_here(format!("Unexpected character '{c}'"))),
        };

        let mut token = Token::new(kind, self.make_span());
        token.newline_before = newline_before;
        token.octal = self.flag_octal;
        token.had_escape = self.flag_escape;
        Ok(token)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        self.saw_newline = false;

        loop {
            match self.peek() {
                Some(c) if unicode::is_whitespace(c) => {
                    self.advance();
                }
                Some(c) if unicode::is_line_terminator(c) => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some('/') => {
                    let next = self.peek_next();
                    if next == Some('/') {
                        self.advance();
                        self.advance();
                        while let Some(ch) = self.peek() {
                            if unicode::is_line_terminator(ch) {
                                break;
                            }
                            self.advance();
                        }
                    } else if next == Some('*') {
                        self.token_start = self.pos();
                        self.advance();
                        self.advance();
                        loop {
                            match self.advance() {
                                Some((_, '*')) if self.peek() == Some('/') => {
                                    self.advance();
                                    break;
                                }
                                Some((_, c)) if unicode::is_line_terminator(c) => {
                                    self.saw_newline = true;
                                }
                                Some(_) => {}
                                None => return Err(self.error_here("Unterminated comment")),
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn scan_dot(&mut self) -> Result<TokenKind, ParseError> {
        if matches!(self.peek(), Some('0'..='9')) {
            // .123 style number
            self.scan_number('.')
        } else if self.peek() == Some('.') && self.peek_next() == Some('.') {
            self.advance();
            self.advance();
            Ok(TokenKind::DotDotDot)
        } else {
            Ok(TokenKind::Dot)
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        if self.match_char('+') {
            TokenKind::PlusPlus
        } else if self.match_char('=') {
            TokenKind::PlusEq
        } else {
            TokenKind::Plus
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        if self.match_char('-') {
            TokenKind::MinusMinus
        } else if self.match_char('=') {
            TokenKind::MinusEq
        } else {
            TokenKind::Minus
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        if self.match_char('*') {
            if self.match_char('=') {
                TokenKind::StarStarEq
            } else {
                TokenKind::StarStar
            }
        } else if self.match_char('=') {
            TokenKind::StarEq
        } else {
            TokenKind::Star
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::SlashEq
        } else {
            TokenKind::Slash
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::PercentEq
        } else {
            TokenKind::Percent
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::EqEqEq
            } else {
                TokenKind::EqEq
            }
        } else if self.match_char('>') {
            TokenKind::Arrow
        } else {
            TokenKind::Eq
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::BangEqEq
            } else {
                TokenKind::BangEq
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.match_char('<') {
            if self.match_char('=') {
                TokenKind::LtLtEq
            } else {
                TokenKind::LtLt
            }
        } else if self.match_char('=') {
            TokenKind::LtEq
        } else {
            TokenKind::Lt
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.match_char('>') {
            if self.match_char('>') {
                if self.match_char('=') {
                    TokenKind::GtGtGtEq
                } else {
                    TokenKind::GtGtGt
                }
            } else if self.match_char('=') {
                TokenKind::GtGtEq
            } else {
                TokenKind::GtGt
            }
        } else if self.match_char('=') {
            TokenKind::GtEq
        } else {
            TokenKind::Gt
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        if self.match_char('&') {
            TokenKind::AmpAmp
        } else if self.match_char('=') {
            TokenKind::AmpEq
        } else {
            TokenKind::Amp
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        if self.match_char('|') {
            TokenKind::PipePipe
        } else if self.match_char('=') {
            TokenKind::PipeEq
        } else {
            TokenKind::Pipe
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::CaretEq
        } else {
            TokenKind::Caret
        }
    }

    // ============ IDENTIFIERS ============

    fn scan_identifier(&mut self, first: char) -> Result<TokenKind, ParseError> {
        let mut name = String::new();
        name.push(first);
        self.scan_identifier_rest(&mut name)?;
        self.finish_identifier(name)
    }

    /// An identifier whose very first character is a `\u` escape.
    fn scan_escaped_identifier_start(&mut self) -> Result<TokenKind, ParseError> {
        if !self.match_char('u') {
            return Err(self.error_here("Unexpected character '\\'"));
        }
        let ch = self.scan_unicode_escape()?;
        if !unicode::is_id_start(ch) {
            return Err(self.error_here("Invalid Unicode escape sequence"));
        }
        self.flag_escape = true;
        let mut name = String::new();
        name.push(ch);
        self.scan_identifier_rest(&mut name)?;
        self.finish_identifier(name)
    }

    fn scan_identifier_rest(&mut self, name: &mut String) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if unicode::is_id_continue(c) => {
                    name.push(c);
                    self.advance();
                }
                Some('\\') => {
                    self.advance();
                    if !self.match_char('u') {
                        return Err(self.error_here("Invalid Unicode escape sequence"));
                    }
                    let ch = self.scan_unicode_escape()?;
                    if !unicode::is_id_continue(ch) {
                        return Err(self.error_here("Invalid Unicode escape sequence"));
                    }
                    self.flag_escape = true;
                    name.push(ch);
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn finish_identifier(&self, name: String) -> Result<TokenKind, ParseError> {
        match keyword(&name) {
            Some(kind) => {
                if self.flag_escape {
                    Err(self.error_here("Keyword must not contain escaped characters"))
                } else {
                    Ok(kind)
                }
            }
            None => Ok(TokenKind::Identifier(name)),
        }
    }

    /// Decode a `\uHHHH` or `\u{H+}` escape, with `\u` already consumed.
    fn scan_unicode_escape(&mut self) -> Result<char, ParseError> {
        if self.match_char('{') {
            let mut value: u32 = 0;
            let mut any = false;
            loop {
                match self.peek() {
                    Some('}') => {
                        self.advance();
                        break;
                    }
                    Some(c) if c.is_ascii_hexdigit() => {
                        self.advance();
                        any = true;
                        value = value
                            .saturating_mul(16)
                            .saturating_add(c.to_digit(16).unwrap_or(0));
                        if value > 0x0010_FFFF {
                            return Err(self.error_here("Invalid Unicode escape sequence"));
                        }
                    }
                    _ => return Err(self.error_here("Invalid Unicode escape sequence")),
                }
            }
            if !any {
                return Err(self.error_here("Invalid Unicode escape sequence"));
            }
            char::from_u32(value).ok_or_else(|| self.error_here("Invalid Unicode escape sequence"))
        } else {
            let value = self.scan_hex_digits(4)?;
            char::from_u32(value).ok_or_else(|| self.error_here("Invalid Unicode escape sequence"))
        }
    }

    fn scan_hex_digits(&mut self, count: usize) -> Result<u32, ParseError> {
        let mut value: u32 = 0;
        for _ in 0..count {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.advance();
                    value = value * 16 + c.to_digit(16).unwrap_or(0);
                }
                _ => return Err(self.error_here("Invalid hexadecimal escape sequence")),
            }
        }
        Ok(value)
    }

    // ============ STRINGS ============

    fn scan_string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => self.scan_string_escape(&mut value)?,
                Some((_, c)) if unicode::is_line_terminator(c) => {
                    return Err(self.error_here("Unterminated string constant"));
                }
                Some((_, c)) => value.push(c),
                None => return Err(self.error_here("Unterminated string constant")),
            }
        }

        Ok(TokenKind::String(value))
    }

    fn scan_string_escape(&mut self, value: &mut String) -> Result<(), ParseError> {
        match self.advance() {
            None => Err(self.error_here("Unterminated string constant")),
            Some((_, c)) if unicode::is_line_terminator(c) => {
                // Line continuation; CRLF is a single terminator sequence.
                if c == '\r' && self.peek() == Some('\n') {
                    self.advance();
                }
                Ok(())
            }
            Some((_, 'n')) => {
                value.push('\n');
                Ok(())
            }
            Some((_, 'r')) => {
                value.push('\r');
                Ok(())
            }
            Some((_, 't')) => {
                value.push('\t');
                Ok(())
            }
            Some((_, 'b')) => {
                value.push('\u{0008}');
                Ok(())
            }
            Some((_, 'f')) => {
                value.push('\u{000C}');
                Ok(())
            }
            Some((_, 'v')) => {
                value.push('\u{000B}');
                Ok(())
            }
            Some((_, 'x')) => {
                let code = self.scan_hex_digits(2)?;
                value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                Ok(())
            }
            Some((_, 'u')) => {
                let ch = self.scan_unicode_escape()?;
                value.push(ch);
                Ok(())
            }
            Some((_, '0')) => {
                match self.peek() {
                    Some('0'..='7') => {
                        // Legacy octal escape; the parser rejects it in
                        // strict code via the octal flag.
                        self.flag_octal = true;
                        let code = self.scan_octal_tail(0);
                        value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                    }
                    Some('8' | '9') => {
                        self.flag_octal = true;
                        value.push('\0');
                    }
                    _ => value.push('\0'),
                }
                Ok(())
            }
            Some((_, c @ '1'..='7')) => {
                self.flag_octal = true;
                let code = self.scan_octal_tail(c.to_digit(8).unwrap_or(0));
                value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                Ok(())
            }
            Some((_, c @ ('8' | '9'))) => {
                // NonOctalDecimalEscape: \8 and \9 are sloppy-only.
                self.flag_octal = true;
                value.push(c);
                Ok(())
            }
            Some((_, c)) => {
                value.push(c);
                Ok(())
            }
        }
    }

    /// Continue a legacy octal escape after its first digit. At most three
    /// octal digits total, value capped below 0o400.
    fn scan_octal_tail(&mut self, first: u32) -> u32 {
        let mut code = first;
        let mut digits = 1;
        while digits < 3 {
            match self.peek() {
                Some(c @ '0'..='7') => {
                    let next = code * 8 + c.to_digit(8).unwrap_or(0);
                    if next > 0xFF {
                        break;
                    }
                    code = next;
                    self.advance();
                    digits += 1;
                }
                _ => break,
            }
        }
        code
    }

    // ============ NUMBERS ============

    fn scan_number(&mut self, first: char) -> Result<TokenKind, ParseError> {
        let value = if first == '0' {
            match self.peek() {
                Some('x' | 'X') => {
                    self.advance();
                    self.scan_radix_digits(16)?
                }
                Some('o' | 'O') => {
                    self.advance();
                    self.scan_radix_digits(8)?
                }
                Some('b' | 'B') => {
                    self.advance();
                    self.scan_radix_digits(2)?
                }
                Some('0'..='9') => self.scan_legacy_zero_prefixed()?,
                _ => self.scan_decimal("0")?,
            }
        } else {
            let mut lead = String::new();
            lead.push(first);
            self.scan_decimal(&lead)?
        };

        // A numeric literal must not be directly followed by an identifier
        // start or another digit.
        if let Some(c) = self.peek() {
            if unicode::is_id_start(c) || c.is_ascii_digit() {
                return Err(self.error_here("Identifier directly after number"));
            }
        }

        Ok(TokenKind::Number(value))
    }

    fn scan_radix_digits(&mut self, radix: u32) -> Result<f64, ParseError> {
        let mut value: f64 = 0.0;
        let mut any = false;
        while let Some(c) = self.peek() {
            match c.to_digit(radix) {
                Some(d) => {
                    value = value * f64::from(radix) + f64::from(d);
                    any = true;
                    self.advance();
                }
                None => break,
            }
        }
        if !any {
            return Err(self.error_here("Missing digits after radix prefix"));
        }
        Ok(value)
    }

    /// Legacy `0`-prefixed literals: `0777` is octal, `0789` falls back to a
    /// non-octal decimal. Both are octal-flagged for the strict-mode check.
    fn scan_legacy_zero_prefixed(&mut self) -> Result<f64, ParseError> {
        self.flag_octal = true;
        let mut digits = String::new();
        let mut non_octal = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='7' => digits.push(c),
                '8' | '9' => {
                    digits.push(c);
                    non_octal = true;
                }
                _ => break,
            }
            self.advance();
        }
        if non_octal {
            // 08, 09, 0789...: decimal with a leading zero. May still grow a
            // fraction or exponent.
            self.scan_decimal(&digits)
        } else {
            let mut value: f64 = 0.0;
            for c in digits.chars() {
                value = value * 8.0 + f64::from(c.to_digit(8).unwrap_or(0));
            }
            Ok(value)
        }
    }

    /// Decimal literal: integer part already collected in `lead` (which is
    /// `.` when the literal started with a decimal point).
    fn scan_decimal(&mut self, lead: &str) -> Result<f64, ParseError> {
        let mut num = String::new();
        let started_with_dot = lead == ".";
        if !started_with_dot {
            num.push_str(lead);
            while let Some(c @ '0'..='9') = self.peek() {
                num.push(c);
                self.advance();
            }
        }

        if started_with_dot {
            num.push_str("0.");
            while let Some(c @ '0'..='9') = self.peek() {
                num.push(c);
                self.advance();
            }
        } else if self.peek() == Some('.') {
            self.advance();
            num.push('.');
            while let Some(c @ '0'..='9') = self.peek() {
                num.push(c);
                self.advance();
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            num.push('e');
            if matches!(self.peek(), Some('+' | '-')) {
                if let Some((_, sign)) = self.advance() {
                    num.push(sign);
                }
            }
            let mut any = false;
            while let Some(c @ '0'..='9') = self.peek() {
                num.push(c);
                self.advance();
                any = true;
            }
            if !any {
                return Err(self.error_here("Missing exponent digits"));
            }
        }

        // Trailing-dot forms like `1.` parse fine with from_str.
        Ok(num.parse().unwrap_or(f64::NAN))
    }

    // ============ TEMPLATES ============

    /// Scan one template quasi. `from_head` is true when entered from a
    /// backtick, false when resumed after a `}` closing a substitution.
    fn scan_template_chunk(&mut self, from_head: bool) -> Result<TokenKind, ParseError> {
        let raw_start = self.pos();
        let mut cooked = Some(String::new());

        loop {
            let chunk_end = self.pos();
            match self.advance() {
                None => return Err(self.error_here("Unterminated template literal")),
                Some((_, '`')) => {
                    let chunk = self.finish_chunk(cooked, raw_start, chunk_end);
                    return Ok(if from_head {
                        TokenKind::TemplateNoSub(chunk)
                    } else {
                        TokenKind::TemplateTail(chunk)
                    });
                }
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    let chunk = self.finish_chunk(cooked, raw_start, chunk_end);
                    return Ok(if from_head {
                        TokenKind::TemplateHead(chunk)
                    } else {
                        TokenKind::TemplateMiddle(chunk)
                    });
                }
                Some((_, '\\')) => self.scan_template_escape(&mut cooked)?,
                Some((_, '\r')) => {
                    // Both the cooked and raw values normalize CRLF/CR to LF.
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                    if let Some(s) = cooked.as_mut() {
                        s.push('\n');
                    }
                }
                Some((_, c)) => {
                    if let Some(s) = cooked.as_mut() {
                        s.push(c);
                    }
                }
            }
        }
    }

    fn finish_chunk(
        &self,
        cooked: Option<String>,
        raw_start: Position,
        raw_end: Position,
    ) -> TemplateChunk {
        let raw = self
            .source
            .get(raw_start.index as usize..raw_end.index as usize)
            .unwrap_or("")
            .replace("\r\n", "\n")
            .replace('\r', "\n");
        TemplateChunk {
            cooked,
            raw,
            span: Span::new(raw_start, raw_end),
        }
    }

    /// Decode one escape sequence inside a template quasi.
    ///
    /// Invalid escapes do not error here: they poison `cooked` to `None` and
    /// scanning continues, because tagged templates tolerate them. The parser
    /// raises the error for untagged templates.
    fn scan_template_escape(&mut self, cooked: &mut Option<String>) -> Result<(), ParseError> {
        fn push(cooked: &mut Option<String>, c: char) {
            if let Some(s) = cooked.as_mut() {
                s.push(c);
            }
        }

        match self.advance() {
            None => Err(self.error_here("Unterminated template literal")),
            Some((_, c)) if unicode::is_line_terminator(c) => {
                // Line continuation.
                if c == '\r' && self.peek() == Some('\n') {
                    self.advance();
                }
                Ok(())
            }
            Some((_, 'n')) => {
                push(cooked, '\n');
                Ok(())
            }
            Some((_, 'r')) => {
                push(cooked, '\r');
                Ok(())
            }
            Some((_, 't')) => {
                push(cooked, '\t');
                Ok(())
            }
            Some((_, 'b')) => {
                push(cooked, '\u{0008}');
                Ok(())
            }
            Some((_, 'f')) => {
                push(cooked, '\u{000C}');
                Ok(())
            }
            Some((_, 'v')) => {
                push(cooked, '\u{000B}');
                Ok(())
            }
            Some((_, 'x')) => {
                let mut code: u32 = 0;
                for _ in 0..2 {
                    match self.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            self.advance();
                            code = code * 16 + c.to_digit(16).unwrap_or(0);
                        }
                        _ => {
                            *cooked = None;
                            return Ok(());
                        }
                    }
                }
                push(cooked, char::from_u32(code).unwrap_or('\u{FFFD}'));
                Ok(())
            }
            Some((_, 'u')) => {
                self.scan_template_unicode_escape(cooked);
                Ok(())
            }
            Some((_, '0')) => {
                // Bare \0 is NUL; \0 followed by a digit is an illegal
                // octal-like escape, stricter than string literals.
                if matches!(self.peek(), Some('0'..='9')) {
                    *cooked = None;
                } else {
                    push(cooked, '\0');
                }
                Ok(())
            }
            Some((_, '1'..='9')) => {
                // Octal-like escapes are always illegal in templates,
                // regardless of strict mode.
                *cooked = None;
                Ok(())
            }
            Some((_, c)) => {
                push(cooked, c);
                Ok(())
            }
        }
    }

    fn scan_template_unicode_escape(&mut self, cooked: &mut Option<String>) {
        if self.peek() == Some('{') {
            self.advance();
            let mut value: u32 = 0;
            let mut any = false;
            loop {
                match self.peek() {
                    Some('}') => {
                        self.advance();
                        break;
                    }
                    Some(c) if c.is_ascii_hexdigit() => {
                        self.advance();
                        any = true;
                        value = value
                            .saturating_mul(16)
                            .saturating_add(c.to_digit(16).unwrap_or(0));
                    }
                    // Unterminated `\u{`: don't consume the terminator, it
                    // may be a backtick or `${` that ends the quasi.
                    _ => {
                        *cooked = None;
                        return;
                    }
                }
            }
            if !any || value > 0x0010_FFFF {
                *cooked = None;
                return;
            }
            match char::from_u32(value) {
                Some(c) => {
                    if let Some(s) = cooked.as_mut() {
                        s.push(c);
                    }
                }
                None => *cooked = None,
            }
        } else {
            let mut value: u32 = 0;
            for _ in 0..4 {
                match self.peek() {
                    Some(c) if c.is_ascii_hexdigit() => {
                        self.advance();
                        value = value * 16 + c.to_digit(16).unwrap_or(0);
                    }
                    _ => {
                        *cooked = None;
                        return;
                    }
                }
            }
            match char::from_u32(value) {
                Some(c) => {
                    if let Some(s) = cooked.as_mut() {
                        s.push(c);
                    }
                }
                None => *cooked = None,
            }
        }
    }

    /// Resume template scanning after the `}` that closed a substitution.
    /// The parser hands back the span of the `}` it consumed as an RBrace.
    pub fn rescan_template_continuation(&mut self, rbrace_span: Span) -> Result<Token, ParseError> {
        self.line = rbrace_span.end.line;
        self.column = rbrace_span.end.column;
        self.current_pos = rbrace_span.end.index as usize;
        self.prev_cr = false;
        self.reset_chars(self.current_pos);

        self.token_start = rbrace_span.start;
        self.flag_octal = false;
        self.flag_escape = false;
        let kind = self.scan_template_chunk(false)?;
        Ok(Token::new(kind, self.make_span()))
    }

    // ============ REGULAR EXPRESSIONS ============

    /// Re-lex a `/` or `/=` token as a regular expression literal. Called by
    /// the parser at positions where the grammar expects an expression.
    pub fn rescan_as_regexp(&mut self, slash_span: Span) -> Result<Token, ParseError> {
        self.line = slash_span.start.line;
        self.column = slash_span.start.column;
        self.current_pos = slash_span.start.index as usize;
        self.prev_cr = false;
        self.reset_chars(self.current_pos);

        self.token_start = self.pos();
        self.flag_octal = false;
        self.flag_escape = false;

        // Consume the opening /
        self.advance();

        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            match self.advance() {
                None => return Err(self.error_here("Unterminated regular expression")),
                Some((_, c)) if unicode::is_line_terminator(c) => {
                    return Err(self.error_here("Unterminated regular expression"));
                }
                Some((_, '/')) if !in_class => break,
                Some((_, '[')) => {
                    in_class = true;
                    pattern.push('[');
                }
                Some((_, ']')) => {
                    in_class = false;
                    pattern.push(']');
                }
                Some((_, '\\')) => {
                    pattern.push('\\');
                    match self.advance() {
                        None => return Err(self.error_here("Unterminated regular expression")),
                        Some((_, c)) if unicode::is_line_terminator(c) => {
                            return Err(self.error_here("Unterminated regular expression"));
                        }
                        Some((_, c)) => pattern.push(c),
                    }
                }
                Some((_, c)) => pattern.push(c),
            }
        }

        // Flags: structural validation only (known set, no repeats); the
        // pattern body is not deeply validated.
        let mut flags = String::new();
        while let Some(c) = self.peek() {
            if !unicode::is_id_continue(c) {
                break;
            }
            if !matches!(c, 'g' | 'i' | 'm' | 's' | 'u' | 'y') || flags.contains(c) {
                return Err(self.error_here("Invalid regular expression flags"));
            }
            flags.push(c);
            self.advance();
        }

        Ok(Token::new(
            TokenKind::RegExp { pattern, flags },
            self.make_span(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut tokens = vec![];
        loop {
            let token = lexer.next_token().unwrap();
            if token.kind == TokenKind::Eof {
                break;
            }
            tokens.push(token.kind);
        }
        tokens
    }

    fn lex_err(source: &str) -> ParseError {
        let mut lexer = Lexer::new(source);
        loop {
            match lexer.next_token() {
                Ok(token) if token.kind == TokenKind::Eof => {
                    panic!("expected a lexical error for {source:?}")
                }
                Ok(_) => {}
                Err(e) => return e,
            }
        }
    }

    #[test]
    fn numbers() {
        assert_eq!(lex("42"), vec![TokenKind::Number(42.0)]);
        assert_eq!(lex("3.14"), vec![TokenKind::Number(3.14)]);
        assert_eq!(lex("1e10"), vec![TokenKind::Number(1e10)]);
        assert_eq!(lex("1E+2"), vec![TokenKind::Number(100.0)]);
        assert_eq!(lex(".5"), vec![TokenKind::Number(0.5)]);
        assert_eq!(lex("1."), vec![TokenKind::Number(1.0)]);
        assert_eq!(lex("0xff"), vec![TokenKind::Number(255.0)]);
        assert_eq!(lex("0b1010"), vec![TokenKind::Number(10.0)]);
        assert_eq!(lex("0o17"), vec![TokenKind::Number(15.0)]);
    }

    #[test]
    fn legacy_octal_numbers_are_flagged() {
        let mut lexer = Lexer::new("0777");
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Number(511.0));
        assert!(token.octal);

        let mut lexer = Lexer::new("08");
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Number(8.0));
        assert!(token.octal);
    }

    #[test]
    fn number_followed_by_identifier_is_an_error() {
        let err = lex_err("3in");
        assert!(matches!(err, ParseError::Lexical { .. }));
    }

    #[test]
    fn strings() {
        assert_eq!(
            lex(r#""hello""#),
            vec![TokenKind::String("hello".to_string())]
        );
        assert_eq!(
            lex(r#"'wor\tld'"#),
            vec![TokenKind::String("wor\tld".to_string())]
        );
        assert_eq!(
            lex(r#""A\x42""#),
            vec![TokenKind::String("AB".to_string())]
        );
        assert_eq!(
            lex(r#""\u{1F600}""#),
            vec![TokenKind::String("\u{1F600}".to_string())]
        );
    }

    #[test]
    fn string_octal_escape_is_flagged() {
        let mut lexer = Lexer::new(r#"'\101'"#);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::String("A".to_string()));
        assert!(token.octal);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(lex_err("'abc"), ParseError::Lexical { .. }));
        assert!(matches!(lex_err("'ab\nc'"), ParseError::Lexical { .. }));
    }

    #[test]
    fn bad_escape_in_string_is_an_error() {
        assert!(matches!(lex_err(r#""\xZZ""#), ParseError::Lexical { .. }));
        assert!(matches!(
            lex_err(r#""\u{110000}""#),
            ParseError::Lexical { .. }
        ));
    }

    #[test]
    fn operators() {
        assert_eq!(
            lex("+ - * / %"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent
            ]
        );
        assert_eq!(lex("=== !=="), vec![TokenKind::EqEqEq, TokenKind::BangEqEq]);
        assert_eq!(lex("** **="), vec![TokenKind::StarStar, TokenKind::StarStarEq]);
        assert_eq!(lex(">>>="), vec![TokenKind::GtGtGtEq]);
        assert_eq!(lex("=> ..."), vec![TokenKind::Arrow, TokenKind::DotDotDot]);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            lex("var let x"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier("let".to_string()),
                TokenKind::Identifier("x".to_string())
            ]
        );
        assert_eq!(
            lex("yield await"),
            vec![TokenKind::Yield, TokenKind::Await]
        );
        assert_eq!(
            lex("async of"),
            vec![
                TokenKind::Identifier("async".to_string()),
                TokenKind::Identifier("of".to_string())
            ]
        );
    }

    #[test]
    fn escaped_identifier() {
        let mut lexer = Lexer::new(r"\u0061bc");
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Identifier("abc".to_string()));
        assert!(token.had_escape);
    }

    #[test]
    fn escaped_keyword_is_an_error() {
        assert!(matches!(lex_err(r"\u0069f"), ParseError::Lexical { .. }));
    }

    #[test]
    fn comments() {
        assert_eq!(
            lex("1 // one\n2"),
            vec![TokenKind::Number(1.0), TokenKind::Number(2.0)]
        );
        assert_eq!(
            lex("1 /* x */ 2"),
            vec![TokenKind::Number(1.0), TokenKind::Number(2.0)]
        );
        assert!(matches!(lex_err("/* open"), ParseError::Lexical { .. }));
    }

    #[test]
    fn newline_before_flag() {
        let mut lexer = Lexer::new("a\nb");
        {
            let a = lexer.next_token().unwrap();
            assert!(!a.newline_before);
            let b = lexer.next_token().unwrap();
            assert!(b.newline_before);
        }
    }

    #[test]
    fn newline_inside_block_comment_counts() {
        let mut lexer = Lexer::new("a /*\n*/ b");
        {
            lexer.next_token().unwrap();
            let b = lexer.next_token().unwrap();
            assert!(b.newline_before);
        }
    }

    #[test]
    fn template_no_sub() {
        let tokens = lex("`hello`");
        match tokens.as_slice() {
            [TokenKind::TemplateNoSub(chunk)] => {
                assert_eq!(chunk.cooked.as_deref(), Some("hello"));
                assert_eq!(chunk.raw, "hello");
            }
            other => panic!("unexpected tokens {other:?}"),
        }
    }

    #[test]
    fn template_head_stops_at_substitution() {
        let tokens = lex("`foo${");
        match tokens.as_slice() {
            [TokenKind::TemplateHead(chunk)] => {
                assert_eq!(chunk.cooked.as_deref(), Some("foo"));
                assert_eq!(chunk.raw, "foo");
            }
            other => panic!("unexpected tokens {other:?}"),
        }
    }

    #[test]
    fn template_invalid_escape_poisons_cooked() {
        let tokens = lex(r"`\01`");
        match tokens.as_slice() {
            [TokenKind::TemplateNoSub(chunk)] => {
                assert_eq!(chunk.cooked, None);
                assert_eq!(chunk.raw, r"\01");
            }
            other => panic!("unexpected tokens {other:?}"),
        }

        let tokens = lex(r"`\u25a0`");
        match tokens.as_slice() {
            [TokenKind::TemplateNoSub(chunk)] => {
                assert_eq!(chunk.cooked.as_deref(), Some("\u{25a0}"));
                assert_eq!(chunk.raw, r"\u25a0");
            }
            other => panic!("unexpected tokens {other:?}"),
        }
    }

    #[test]
    fn template_bare_nul_escape_is_legal() {
        let tokens = lex(r"`\0`");
        match tokens.as_slice() {
            [TokenKind::TemplateNoSub(chunk)] => {
                assert_eq!(chunk.cooked.as_deref(), Some("\0"));
            }
            other => panic!("unexpected tokens {other:?}"),
        }
    }

    #[test]
    fn unterminated_template_is_always_an_error() {
        assert!(matches!(lex_err("`abc"), ParseError::Lexical { .. }));
        assert!(matches!(lex_err(r"`a\u{12"), ParseError::Lexical { .. }));
    }

    #[test]
    fn template_continuation_rescan() {
        let mut lexer = Lexer::new("`a${x}b`");
        {
            let head = lexer.next_token().unwrap();
            assert!(matches!(head.kind, TokenKind::TemplateHead(_)));
            let x = lexer.next_token().unwrap();
            assert_eq!(x.kind, TokenKind::Identifier("x".to_string()));
            let rbrace = lexer.next_token().unwrap();
            assert_eq!(rbrace.kind, TokenKind::RBrace);
            let tail = lexer.rescan_template_continuation(rbrace.span).unwrap();
            match tail.kind {
                TokenKind::TemplateTail(chunk) => {
                    assert_eq!(chunk.cooked.as_deref(), Some("b"));
                }
                other => panic!("unexpected kind {other:?}"),
            }
        }
    }

    #[test]
    fn regexp_rescan() {
        let mut lexer = Lexer::new("/ab[/]c/gi");
        {
            let slash = lexer.next_token().unwrap();
            assert_eq!(slash.kind, TokenKind::Slash);
            let token = lexer.rescan_as_regexp(slash.span).unwrap();
            assert_eq!(
                token.kind,
                TokenKind::RegExp {
                    pattern: "ab[/]c".to_string(),
                    flags: "gi".to_string()
                }
            );
        }
    }

    #[test]
    fn regexp_flag_validation() {
        let mut lexer = Lexer::new("/a/gg");
        let slash = lexer.next_token().unwrap();
        assert!(lexer.rescan_as_regexp(slash.span).is_err());

        let mut lexer = Lexer::new("/a/q");
        let slash = lexer.next_token().unwrap();
        assert!(lexer.rescan_as_regexp(slash.span).is_err());
    }

    #[test]
    fn positions_are_tracked() {
        let mut lexer = Lexer::new("a\n  b");
        {
            let a = lexer.next_token().unwrap();
            assert_eq!(a.span.start, Position::new(0, 1, 0));
            assert_eq!(a.span.end, Position::new(1, 1, 1));
            let b = lexer.next_token().unwrap();
            assert_eq!(b.span.start, Position::new(4, 2, 2));
        }
    }

    #[test]
    fn crlf_counts_as_one_line() {
        let mut lexer = Lexer::new("a\r\nb");
        {
            lexer.next_token().unwrap();
            let b = lexer.next_token().unwrap();
            assert_eq!(b.span.start.line, 2);
            assert!(b.newline_before);
        }
    }
}
