//! Recursive-descent parser for ECMAScript
//!
//! Consumes tokens from the [`Lexer`] one at a time with a single token of
//! lookahead and produces a [`Program`]. Operator precedence is handled by
//! precedence climbing; cover grammars (parenthesized arrow heads,
//! destructuring targets) are resolved by checkpoint backtracking and by
//! reinterpreting already-built expression nodes as patterns. Static
//! semantics (binding collisions, strict mode restrictions, label and export
//! rules) are enforced inline so the first violation aborts the parse.

use indexmap::IndexMap;

use crate::ParseOptions;
use crate::ast::*;
use crate::error::{ErrorLocation, ParseError};
use crate::lexer::{Lexer, LexerCheckpoint, Position, Span, TemplateChunk, Token, TokenKind};
use crate::scope::{BindingKind, ScopeKind, ScopeStack};

/// Future reserved words that become reserved in strict mode code.
const STRICT_RESERVED: &[&str] = &[
    "implements",
    "interface",
    "let",
    "package",
    "private",
    "protected",
    "public",
    "static",
    "yield",
];

fn is_strict_reserved(name: &str) -> bool {
    STRICT_RESERVED.contains(&name)
}

fn is_restricted_name(name: &str) -> bool {
    name == "eval" || name == "arguments"
}

/// Grammar context, saved and restored around nested function-like regions.
#[derive(Debug, Clone, Copy)]
struct Context {
    strict: bool,
    module: bool,
    in_function: bool,
    in_iteration: bool,
    in_switch: bool,
    allow_in: bool,
    allow_yield: bool,
    allow_await: bool,
    in_formal_params: bool,
    allow_super_property: bool,
    allow_super_call: bool,
    /// Inside a real function body. Arrows inherit this unchanged, the same
    /// way they inherit `this` and `super`.
    allow_new_target: bool,
}

/// What kind of function-like body is being parsed; drives `super` and
/// parameter-uniqueness rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    Normal,
    Method,
    Getter,
    Setter,
    Constructor,
    DerivedConstructor,
}

impl FunctionKind {
    fn is_method(self) -> bool {
        !matches!(self, FunctionKind::Normal)
    }

    /// UniqueFormalParameters positions: duplicates are illegal even in
    /// sloppy mode.
    fn unique_params(self) -> bool {
        !matches!(self, FunctionKind::Normal)
    }
}

/// Active break/continue target.
struct Label {
    name: String,
    iteration: bool,
}

/// Result of scanning a directive prologue.
struct Prologue {
    use_strict: bool,
    strict_at: Option<Position>,
    first_octal: Option<Position>,
}

/// Everything needed to rewind the token stream for cover-grammar retries.
struct ParserCheckpoint {
    lexer: LexerCheckpoint,
    current: Token,
    previous: Token,
    pending_cover_init: Option<Position>,
    pending_proto_dup: Option<Position>,
}

pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    ctx: Context,
    depth: u32,
    max_depth: u32,
    keep_raw: bool,
    web_compat: bool,
    labels: Vec<Label>,
    scopes: ScopeStack,
    /// Exported name -> every span that exported it; checked once at the end
    /// of the module so duplicates are reported in source order.
    exports: IndexMap<String, Vec<Span>>,
    /// Position of the first `{ a = b }` shorthand initializer that has not
    /// yet been legitimized by reinterpretation as a destructuring pattern.
    pending_cover_init: Option<Position>,
    /// Position of the second `__proto__: v` in an object literal, pending
    /// the same resolution.
    pending_proto_dup: Option<Position>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, options: &ParseOptions) -> Self {
        let module = options.module;
        let placeholder = Token::eof(Position::default());
        Self {
            source,
            lexer: Lexer::new(source),
            current: placeholder.clone(),
            previous: placeholder,
            ctx: Context {
                strict: options.strict || module,
                module,
                in_function: false,
                in_iteration: false,
                in_switch: false,
                allow_in: true,
                allow_yield: false,
                allow_await: false,
                in_formal_params: false,
                allow_super_property: false,
                allow_super_call: false,
                allow_new_target: false,
            },
            depth: 0,
            max_depth: options.max_depth,
            keep_raw: options.raw,
            web_compat: options.web_compat,
            labels: Vec::new(),
            scopes: ScopeStack::new(
                if module {
                    ScopeKind::Module
                } else {
                    ScopeKind::Script
                },
                options.web_compat,
            ),
            exports: IndexMap::new(),
            pending_cover_init: None,
            pending_proto_dup: None,
        }
    }

    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        self.advance()?;
        let mut body = Vec::new();
        let prologue = self.parse_directive_prologue(&mut body)?;
        if prologue.use_strict {
            self.ctx.strict = true;
        }
        if self.ctx.strict {
            if let Some(pos) = prologue.first_octal {
                return Err(self.octal_string_error(pos));
            }
        }
        while !self.current.is_eof() {
            let item = if self.ctx.module {
                self.parse_module_item()?
            } else {
                self.parse_statement_list_item()?
            };
            body.push(item);
        }
        self.finalize_exports()?;
        Ok(Program {
            body,
            source_type: if self.ctx.module {
                SourceType::Module
            } else {
                SourceType::Script
            },
            span: Span::new(Position::default(), self.current.span.end),
        })
    }

    // ============ TOKEN PLUMBING ============

    fn advance(&mut self) -> Result<(), ParseError> {
        let next = self.lexer.next_token()?;
        self.previous = std::mem::replace(&mut self.current, next);
        Ok(())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.unexpected())
        }
    }

    /// One extra token of lookahead, without disturbing `current`.
    fn peek_token(&mut self) -> Result<Token, ParseError> {
        let checkpoint = self.lexer.checkpoint();
        let token = self.lexer.next_token()?;
        self.lexer.restore(checkpoint);
        Ok(token)
    }

    fn checkpoint(&self) -> ParserCheckpoint {
        ParserCheckpoint {
            lexer: self.lexer.checkpoint(),
            current: self.current.clone(),
            previous: self.previous.clone(),
            pending_cover_init: self.pending_cover_init,
            pending_proto_dup: self.pending_proto_dup,
        }
    }

    fn restore(&mut self, checkpoint: ParserCheckpoint) {
        self.lexer.restore(checkpoint.lexer);
        self.current = checkpoint.current;
        self.previous = checkpoint.previous;
        self.pending_cover_init = checkpoint.pending_cover_init;
        self.pending_proto_dup = checkpoint.pending_proto_dup;
    }

    /// The spelling of `current` when it is an unescaped identifier.
    fn ident_name(&self) -> Option<&str> {
        match &self.current.kind {
            TokenKind::Identifier(name) if !self.current.had_escape => Some(name.as_str()),
            _ => None,
        }
    }

    fn is_ident(&self, name: &str) -> bool {
        self.ident_name() == Some(name)
    }

    fn start(&self) -> Position {
        self.current.span.start
    }

    fn finish_span(&self, start: Position) -> Span {
        Span::new(start, self.previous.span.end)
    }

    fn slice(&self, span: Span) -> &str {
        self.source
            .get(span.start.index as usize..span.end.index as usize)
            .unwrap_or("")
    }

    fn raw_of(&self, span: Span) -> Option<String> {
        if self.keep_raw {
            Some(self.slice(span).to_string())
        } else {
            None
        }
    }

    fn location(&self, pos: Position) -> ErrorLocation {
        ErrorLocation {
            index: pos.index,
            line: pos.line,
            column: pos.column,
        }
    }

    fn error_at(&self, pos: Position, message: impl Into<String>) -> ParseError {
        ParseError::syntax(message, self.location(pos))
    }

    fn semantic_at(&self, pos: Position, message: impl Into<String>) -> ParseError {
        ParseError::semantic(message, self.location(pos))
    }

    fn unexpected(&self) -> ParseError {
        let message = match &self.current.kind {
            TokenKind::Number(_) => "Unexpected number".to_string(),
            TokenKind::String(_) => "Unexpected string".to_string(),
            TokenKind::RegExp { .. } => "Unexpected regular expression".to_string(),
            TokenKind::TemplateHead(_)
            | TokenKind::TemplateMiddle(_)
            | TokenKind::TemplateTail(_)
            | TokenKind::TemplateNoSub(_) => "Unexpected template string".to_string(),
            TokenKind::Identifier(name) => format!("Unexpected identifier '{name}'"),
            TokenKind::Eof => "Unexpected end of input".to_string(),
            other => format!("Unexpected token '{}'", token_text(other)),
        };
        self.error_at(self.current.span.start, message)
    }

    fn octal_string_error(&self, pos: Position) -> ParseError {
        self.error_at(pos, "Octal escape sequences are not allowed in strict mode")
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::DepthExceeded {
                location: self.location(self.current.span.start),
            });
        }
        Ok(())
    }

    /// Automatic semicolon insertion. A statement may end with an explicit
    /// `;`, before a `}`, at end of input, or after a line break.
    fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::Semicolon) {
            return self.advance();
        }
        if self.current.newline_before
            || self.current.is_eof()
            || self.check(&TokenKind::RBrace)
        {
            return Ok(());
        }
        Err(self.unexpected())
    }

    // ============ COVER GRAMMAR BOOKKEEPING ============

    /// Run `f` in a position where its result can never be reinterpreted as
    /// a destructuring pattern, surfacing any deferred cover-grammar errors
    /// it produced.
    fn isolate<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let saved_init = self.pending_cover_init.take();
        let saved_proto = self.pending_proto_dup.take();
        let value = f(self)?;
        self.take_cover_errors()?;
        self.pending_cover_init = saved_init;
        self.pending_proto_dup = saved_proto;
        Ok(value)
    }

    fn take_cover_errors(&mut self) -> Result<(), ParseError> {
        if let Some(pos) = self.pending_cover_init.take() {
            return Err(self.error_at(
                pos,
                "Shorthand property assignments are valid only in destructuring patterns",
            ));
        }
        if let Some(pos) = self.pending_proto_dup.take() {
            return Err(self.semantic_at(
                pos,
                "Duplicate __proto__ fields are not allowed in object literals",
            ));
        }
        Ok(())
    }

    // ============ DIRECTIVE PROLOGUE ============

    /// Parse the run of leading string-literal expression statements. A
    /// statement is a directive only when the whole expression is a single
    /// unparenthesized string literal; its value is the raw source between
    /// the quotes, so `"use\x20strict"` does not enable strict mode.
    fn parse_directive_prologue(
        &mut self,
        body: &mut Vec<Statement>,
    ) -> Result<Prologue, ParseError> {
        let mut prologue = Prologue {
            use_strict: false,
            strict_at: None,
            first_octal: None,
        };
        while matches!(self.current.kind, TokenKind::String(_)) {
            let token_span = self.current.span;
            let octal = self.current.octal;
            let start = self.start();
            let expression = self.isolate(Self::parse_expression)?;
            self.expect_semicolon()?;
            let span = self.finish_span(start);
            let is_directive = matches!(
                &expression,
                Expression::Literal(Literal {
                    value: LiteralValue::String(_),
                    span: lit_span,
                    ..
                }) if *lit_span == token_span
            );
            if is_directive {
                let inner = Span::new(
                    Position::new(
                        token_span.start.index + 1,
                        token_span.start.line,
                        token_span.start.column + 1,
                    ),
                    Position::new(
                        token_span.end.index - 1,
                        token_span.end.line,
                        token_span.end.column,
                    ),
                );
                let raw = self.slice(inner).to_string();
                if raw == "use strict" && !prologue.use_strict {
                    prologue.use_strict = true;
                    prologue.strict_at = Some(token_span.start);
                }
                if octal && prologue.first_octal.is_none() {
                    prologue.first_octal = Some(token_span.start);
                }
                body.push(Statement::Expression(ExpressionStatement {
                    expression,
                    directive: Some(raw),
                    span,
                }));
            } else {
                body.push(Statement::Expression(ExpressionStatement {
                    expression,
                    directive: None,
                    span,
                }));
                break;
            }
        }
        Ok(prologue)
    }
}

/// Source spelling of a fixed-text token.
fn token_text(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::Null => "null",
        TokenKind::Break => "break",
        TokenKind::Case => "case",
        TokenKind::Catch => "catch",
        TokenKind::Class => "class",
        TokenKind::Const => "const",
        TokenKind::Continue => "continue",
        TokenKind::Debugger => "debugger",
        TokenKind::Default => "default",
        TokenKind::Delete => "delete",
        TokenKind::Do => "do",
        TokenKind::Else => "else",
        TokenKind::Enum => "enum",
        TokenKind::Export => "export",
        TokenKind::Extends => "extends",
        TokenKind::Finally => "finally",
        TokenKind::For => "for",
        TokenKind::Function => "function",
        TokenKind::If => "if",
        TokenKind::Import => "import",
        TokenKind::In => "in",
        TokenKind::Instanceof => "instanceof",
        TokenKind::New => "new",
        TokenKind::Return => "return",
        TokenKind::Super => "super",
        TokenKind::Switch => "switch",
        TokenKind::This => "this",
        TokenKind::Throw => "throw",
        TokenKind::Try => "try",
        TokenKind::Typeof => "typeof",
        TokenKind::Var => "var",
        TokenKind::Void => "void",
        TokenKind::While => "while",
        TokenKind::With => "with",
        TokenKind::Yield => "yield",
        TokenKind::Await => "await",
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::Dot => ".",
        TokenKind::DotDotDot => "...",
        TokenKind::Semicolon => ";",
        TokenKind::Comma => ",",
        TokenKind::Colon => ":",
        TokenKind::Arrow => "=>",
        TokenKind::Lt => "<",
        TokenKind::Gt => ">",
        TokenKind::LtEq => "<=",
        TokenKind::GtEq => ">=",
        TokenKind::EqEq => "==",
        TokenKind::BangEq => "!=",
        TokenKind::EqEqEq => "===",
        TokenKind::BangEqEq => "!==",
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Percent => "%",
        TokenKind::StarStar => "**",
        TokenKind::Slash => "/",
        TokenKind::PlusPlus => "++",
        TokenKind::MinusMinus => "--",
        TokenKind::LtLt => "<<",
        TokenKind::GtGt => ">>",
        TokenKind::GtGtGt => ">>>",
        TokenKind::Amp => "&",
        TokenKind::Pipe => "|",
        TokenKind::Caret => "^",
        TokenKind::Bang => "!",
        TokenKind::Tilde => "~",
        TokenKind::AmpAmp => "&&",
        TokenKind::PipePipe => "||",
        TokenKind::Question => "?",
        TokenKind::Eq => "=",
        TokenKind::PlusEq => "+=",
        TokenKind::MinusEq => "-=",
        TokenKind::StarEq => "*=",
        TokenKind::PercentEq => "%=",
        TokenKind::StarStarEq => "**=",
        TokenKind::SlashEq => "/=",
        TokenKind::LtLtEq => "<<=",
        TokenKind::GtGtEq => ">>=",
        TokenKind::GtGtGtEq => ">>>=",
        TokenKind::AmpEq => "&=",
        TokenKind::PipeEq => "|=",
        TokenKind::CaretEq => "^=",
        _ => "",
    }
}

/// Collect every name a binding pattern introduces, in source order.
fn collect_bound_names(pattern: &Pattern, out: &mut Vec<(String, Span)>) {
    match pattern {
        Pattern::Identifier(id) => out.push((id.name.clone(), id.span)),
        Pattern::Array(arr) => {
            for element in arr.elements.iter().flatten() {
                collect_bound_names(element, out);
            }
        }
        Pattern::Object(obj) => {
            for property in &obj.properties {
                match property {
                    ObjectPatternProperty::Property(p) => collect_bound_names(&p.value, out),
                    ObjectPatternProperty::Rest(rest) => collect_bound_names(&rest.argument, out),
                }
            }
        }
        Pattern::Assignment(assign) => collect_bound_names(&assign.left, out),
        Pattern::Rest(rest) => collect_bound_names(&rest.argument, out),
        // Member-expression targets bind nothing.
        Pattern::Expression(_) => {}
    }
}

// ============ STATEMENTS ============

impl<'a> Parser<'a> {
    fn parse_module_item(&mut self) -> Result<Statement, ParseError> {
        match &self.current.kind {
            TokenKind::Import => {
                let peek = self.peek_token()?;
                if peek.kind == TokenKind::Dot {
                    // import.meta, as an expression statement
                    self.parse_statement(false)
                } else {
                    self.parse_import_declaration()
                }
            }
            TokenKind::Export => self.parse_export_declaration(),
            _ => self.parse_statement_list_item(),
        }
    }

    fn parse_statement_list_item(&mut self) -> Result<Statement, ParseError> {
        self.descend()?;
        let result = self.statement_list_item_inner();
        self.depth -= 1;
        result
    }

    fn statement_list_item_inner(&mut self) -> Result<Statement, ParseError> {
        match &self.current.kind {
            TokenKind::Function => self.parse_function_declaration(false),
            TokenKind::Class => self.parse_class_declaration(false),
            TokenKind::Const => self.parse_declaration_statement(VariableKind::Const),
            TokenKind::Identifier(name) if name == "let" && !self.current.had_escape => {
                if self.peek_starts_binding()? {
                    self.parse_declaration_statement(VariableKind::Let)
                } else {
                    self.parse_statement(false)
                }
            }
            TokenKind::Identifier(name) if name == "async" && !self.current.had_escape => {
                let peek = self.peek_token()?;
                if peek.kind == TokenKind::Function && !peek.newline_before {
                    self.parse_function_declaration(true)
                } else {
                    self.parse_statement(false)
                }
            }
            _ => self.parse_statement(false),
        }
    }

    /// Whether the token after `let` commits us to a lexical declaration.
    fn peek_starts_binding(&mut self) -> Result<bool, ParseError> {
        let peek = self.peek_token()?;
        Ok(matches!(
            peek.kind,
            TokenKind::Identifier(_)
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Yield
                | TokenKind::Await
        ))
    }

    /// A statement in single-statement position (loop bodies, if arms).
    /// Declarations are rejected here; `allow_function` admits the Annex B
    /// function-as-if-body form in sloppy mode.
    fn parse_statement(&mut self, allow_function: bool) -> Result<Statement, ParseError> {
        self.descend()?;
        let result = self.statement_inner(allow_function);
        self.depth -= 1;
        result
    }

    fn statement_inner(&mut self, allow_function: bool) -> Result<Statement, ParseError> {
        match &self.current.kind {
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Var => self.parse_declaration_statement(VariableKind::Var),
            TokenKind::Semicolon => {
                let start = self.start();
                self.advance()?;
                Ok(Statement::Empty(EmptyStatement {
                    span: self.finish_span(start),
                }))
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Continue => self.parse_continue_statement(),
            TokenKind::Break => self.parse_break_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::With => self.parse_with_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Debugger => {
                let start = self.start();
                self.advance()?;
                self.expect_semicolon()?;
                Ok(Statement::Debugger(DebuggerStatement {
                    span: self.finish_span(start),
                }))
            }
            TokenKind::Function => {
                if allow_function && !self.ctx.strict && self.web_compat {
                    self.parse_function_declaration(false)
                } else {
                    Err(self.error_at(
                        self.start(),
                        "Function declarations cannot appear in single-statement position",
                    ))
                }
            }
            TokenKind::Class | TokenKind::Const => Err(self.unexpected()),
            TokenKind::Import => {
                let peek = self.peek_token()?;
                if peek.kind == TokenKind::Dot {
                    // import.meta reaches the expression grammar; declarations
                    // stay module-top-level only
                    self.parse_expression_statement()
                } else {
                    Err(self.error_at(
                        self.start(),
                        "'import' and 'export' may only appear at the top level of a module",
                    ))
                }
            }
            TokenKind::Export => Err(self.error_at(
                self.start(),
                "'import' and 'export' may only appear at the top level of a module",
            )),
            TokenKind::Identifier(name) if name == "let" => {
                let peek = self.peek_token()?;
                if peek.kind == TokenKind::LBracket {
                    // `let [` commits to a declaration, which is not a statement
                    return Err(self.unexpected());
                }
                if self.label_candidate().is_some() && peek.kind == TokenKind::Colon {
                    self.parse_labeled_statement(allow_function)
                } else {
                    self.parse_expression_statement()
                }
            }
            _ => {
                if self.label_candidate().is_some() {
                    let peek = self.peek_token()?;
                    if peek.kind == TokenKind::Colon {
                        return self.parse_labeled_statement(allow_function);
                    }
                }
                self.parse_expression_statement()
            }
        }
    }

    /// A name that may serve as a label or identifier reference, including
    /// `yield`/`await` where they are not reserved.
    fn label_candidate(&self) -> Option<String> {
        match &self.current.kind {
            TokenKind::Identifier(name) => Some(name.clone()),
            TokenKind::Yield if !self.ctx.strict && !self.ctx.allow_yield => {
                Some("yield".to_string())
            }
            TokenKind::Await if !self.ctx.module && !self.ctx.allow_await => {
                Some("await".to_string())
            }
            _ => None,
        }
    }

    fn parse_labeled_statement(&mut self, allow_function: bool) -> Result<Statement, ParseError> {
        let mut ids: Vec<Identifier> = Vec::new();
        loop {
            let Some(name) = self.label_candidate() else { break };
            let peek = self.peek_token()?;
            if peek.kind != TokenKind::Colon {
                break;
            }
            if self.labels.iter().any(|l| l.name == name) || ids.iter().any(|i| i.name == name) {
                return Err(self.semantic_at(
                    self.start(),
                    format!("Label '{name}' has already been declared"),
                ));
            }
            let span = self.current.span;
            self.advance()?;
            self.advance()?;
            ids.push(Identifier { name, span });
        }
        let iteration = matches!(
            self.current.kind,
            TokenKind::Do | TokenKind::While | TokenKind::For
        );
        for id in &ids {
            self.labels.push(Label {
                name: id.name.clone(),
                iteration,
            });
        }
        let body = if self.check(&TokenKind::Function) && !self.ctx.strict && self.web_compat {
            // Annex B labelled function declarations, plain functions only
            let stmt = self.parse_function_declaration(false)?;
            if let Statement::FunctionDeclaration(f) = &stmt {
                if f.generator {
                    return Err(
                        self.error_at(stmt.span().start, "Generators cannot be labelled")
                    );
                }
            }
            stmt
        } else {
            self.parse_statement(allow_function)?
        };
        self.labels.truncate(self.labels.len() - ids.len());
        let mut stmt = body;
        for id in ids.into_iter().rev() {
            let span = Span::new(id.span.start, stmt.span().end);
            stmt = Statement::Labeled(LabeledStatement {
                label: id,
                body: Box::new(stmt),
                span,
            });
        }
        Ok(stmt)
    }

    fn parse_block(&mut self) -> Result<BlockStatement, ParseError> {
        self.scopes.enter(ScopeKind::Block);
        let block = self.parse_block_in_current_scope();
        self.scopes.exit();
        block
    }

    /// Block whose statements declare into the scope the caller set up
    /// (function bodies, catch handlers).
    fn parse_block_in_current_scope(&mut self) -> Result<BlockStatement, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.current.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement_list_item()?);
        }
        self.advance()?;
        Ok(BlockStatement {
            body,
            span: self.finish_span(start),
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        let expression = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(Statement::Expression(ExpressionStatement {
            expression,
            directive: None,
            span: self.finish_span(start),
        }))
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        let consequent = Box::new(self.parse_statement(true)?);
        let alternate = if self.match_token(&TokenKind::Else)? {
            Some(Box::new(self.parse_statement(true)?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
            span: self.finish_span(start),
        }))
    }

    fn parse_iteration_body(&mut self) -> Result<Statement, ParseError> {
        let saved = self.ctx;
        self.ctx.in_iteration = true;
        self.ctx.allow_in = true;
        let body = self.parse_statement(false);
        self.ctx = saved;
        body
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        let body = Box::new(self.parse_iteration_body()?);
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        // the semicolon after do-while is always optional
        if self.check(&TokenKind::Semicolon) {
            self.advance()?;
        }
        Ok(Statement::DoWhile(DoWhileStatement {
            body,
            test,
            span: self.finish_span(start),
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_iteration_body()?);
        Ok(Statement::While(WhileStatement {
            test,
            body,
            span: self.finish_span(start),
        }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        self.expect(&TokenKind::LParen)?;
        // `let` commits to a lexical head only when a binding follows;
        // decided up front since the peek needs the lexer
        if self.is_ident("let") && self.peek_starts_binding()? {
            return self.parse_for_lexical(start, VariableKind::Let);
        }
        match &self.current.kind {
            TokenKind::Semicolon => {
                self.advance()?;
                self.parse_for_classic(start, None)
            }
            TokenKind::Var => {
                let saved = self.ctx.allow_in;
                self.ctx.allow_in = false;
                let decl = self.parse_variable_declaration_list(VariableKind::Var, false);
                self.ctx.allow_in = saved;
                self.parse_for_head_tail(start, decl?)
            }
            TokenKind::Const => self.parse_for_lexical(start, VariableKind::Const),
            _ => self.parse_for_expression_head(start),
        }
    }

    /// `let`/`const` loop heads get a scope that wraps the whole loop.
    fn parse_for_lexical(
        &mut self,
        start: Position,
        kind: VariableKind,
    ) -> Result<Statement, ParseError> {
        self.scopes.enter(ScopeKind::Block);
        let saved = self.ctx.allow_in;
        self.ctx.allow_in = false;
        let decl = self.parse_variable_declaration_list(kind, false);
        self.ctx.allow_in = saved;
        let stmt = match decl {
            Ok(decl) => self.parse_for_head_tail(start, decl),
            Err(e) => Err(e),
        };
        self.scopes.exit();
        stmt
    }

    fn parse_for_head_tail(
        &mut self,
        start: Position,
        decl: VariableDeclaration,
    ) -> Result<Statement, ParseError> {
        let is_in = self.check(&TokenKind::In);
        let is_of = !is_in && self.is_ident("of");
        if is_in || is_of {
            let loop_kind = if is_in { "for-in" } else { "for-of" };
            if decl.declarations.len() != 1 {
                return Err(self.error_at(
                    decl.span.start,
                    format!("Invalid left-hand side in {loop_kind} loop: must be a single binding"),
                ));
            }
            if let Some(d) = decl.declarations.first() {
                if d.init.is_some() {
                    return Err(self.error_at(
                        d.span.start,
                        format!("{loop_kind} loop variable declaration may not have an initializer"),
                    ));
                }
            }
            self.advance()?;
            let right = if is_in {
                self.parse_expression()?
            } else {
                self.isolate(Self::parse_assignment_expression)?
            };
            self.expect(&TokenKind::RParen)?;
            let body = Box::new(self.parse_iteration_body()?);
            let left = ForTarget::VariableDeclaration(decl);
            let span = self.finish_span(start);
            if is_in {
                Ok(Statement::ForIn(ForInStatement { left, right, body, span }))
            } else {
                Ok(Statement::ForOf(ForOfStatement { left, right, body, span }))
            }
        } else {
            self.check_declaration_inits(&decl)?;
            self.expect(&TokenKind::Semicolon)?;
            self.parse_for_classic(start, Some(ForInit::VariableDeclaration(decl)))
        }
    }

    fn parse_for_expression_head(&mut self, start: Position) -> Result<Statement, ParseError> {
        let saved = self.ctx.allow_in;
        self.ctx.allow_in = false;
        let first = self.parse_assignment_expression();
        self.ctx.allow_in = saved;
        let first = first?;
        let is_in = self.check(&TokenKind::In);
        let is_of = !is_in && self.is_ident("of");
        if is_in || is_of {
            let loop_kind = if is_in { "for-in" } else { "for-of" };
            let left = self.for_target_from_expression(first, loop_kind)?;
            self.advance()?;
            let right = if is_in {
                self.parse_expression()?
            } else {
                self.isolate(Self::parse_assignment_expression)?
            };
            self.expect(&TokenKind::RParen)?;
            let body = Box::new(self.parse_iteration_body()?);
            let span = self.finish_span(start);
            return if is_in {
                Ok(Statement::ForIn(ForInStatement { left, right, body, span }))
            } else {
                Ok(Statement::ForOf(ForOfStatement { left, right, body, span }))
            };
        }
        self.take_cover_errors()?;
        let init = if self.check(&TokenKind::Comma) {
            let seq_start = first.span().start;
            let mut expressions = vec![first];
            while self.match_token(&TokenKind::Comma)? {
                let saved = self.ctx.allow_in;
                self.ctx.allow_in = false;
                let next = self.isolate(Self::parse_assignment_expression);
                self.ctx.allow_in = saved;
                expressions.push(next?);
            }
            Expression::Sequence(SequenceExpression {
                expressions,
                span: Span::new(seq_start, self.previous.span.end),
            })
        } else {
            first
        };
        self.expect(&TokenKind::Semicolon)?;
        self.parse_for_classic(start, Some(ForInit::Expression(init)))
    }

    fn for_target_from_expression(
        &mut self,
        expr: Expression,
        loop_kind: &str,
    ) -> Result<ForTarget, ParseError> {
        let pos = expr.span().start;
        match expr {
            Expression::Identifier(_)
            | Expression::Member(_)
            | Expression::Array(_)
            | Expression::Object(_) => {
                let pattern = self.reinterpret_expression_as_pattern(expr)?;
                Ok(ForTarget::Pattern(pattern))
            }
            _ => Err(self.error_at(
                pos,
                format!("Invalid left-hand side in {loop_kind} loop"),
            )),
        }
    }

    fn parse_for_classic(
        &mut self,
        start: Position,
        init: Option<ForInit>,
    ) -> Result<Statement, ParseError> {
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_iteration_body()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: self.finish_span(start),
        }))
    }

    fn parse_continue_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        let label = self.parse_optional_label()?;
        self.expect_semicolon()?;
        match &label {
            Some(id) => {
                let target = self.labels.iter().find(|l| l.name == id.name);
                match target {
                    None => {
                        return Err(self
                            .semantic_at(id.span.start, format!("Undefined label '{}'", id.name)));
                    }
                    Some(l) if !l.iteration => {
                        return Err(self.semantic_at(
                            id.span.start,
                            format!(
                                "Illegal continue statement: '{}' does not denote an iteration statement",
                                id.name
                            ),
                        ));
                    }
                    Some(_) => {}
                }
            }
            None => {
                if !self.ctx.in_iteration {
                    return Err(self.semantic_at(start, "Illegal continue statement"));
                }
            }
        }
        Ok(Statement::Continue(ContinueStatement {
            label,
            span: self.finish_span(start),
        }))
    }

    fn parse_break_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        let label = self.parse_optional_label()?;
        self.expect_semicolon()?;
        match &label {
            Some(id) => {
                if !self.labels.iter().any(|l| l.name == id.name) {
                    return Err(
                        self.semantic_at(id.span.start, format!("Undefined label '{}'", id.name))
                    );
                }
            }
            None => {
                if !self.ctx.in_iteration && !self.ctx.in_switch {
                    return Err(self.semantic_at(start, "Illegal break statement"));
                }
            }
        }
        Ok(Statement::Break(BreakStatement {
            label,
            span: self.finish_span(start),
        }))
    }

    /// Label operand of break/continue; a line break forces the plain form.
    fn parse_optional_label(&mut self) -> Result<Option<Identifier>, ParseError> {
        if self.current.newline_before {
            return Ok(None);
        }
        if let Some(name) = self.label_candidate() {
            let span = self.current.span;
            self.advance()?;
            Ok(Some(Identifier { name, span }))
        } else {
            Ok(None)
        }
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        if !self.ctx.in_function {
            return Err(self.semantic_at(start, "Illegal return statement"));
        }
        self.advance()?;
        let argument = if self.current.newline_before
            || self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RBrace)
            || self.current.is_eof()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon()?;
        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.finish_span(start),
        }))
    }

    fn parse_with_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        if self.ctx.strict {
            return Err(self.error_at(start, "Strict mode code may not include a with statement"));
        }
        self.advance()?;
        self.expect(&TokenKind::LParen)?;
        let object = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_statement(false)?);
        Ok(Statement::With(WithStatement {
            object,
            body,
            span: self.finish_span(start),
        }))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        self.expect(&TokenKind::LParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::LBrace)?;
        self.scopes.enter(ScopeKind::Block);
        let saved = self.ctx;
        self.ctx.in_switch = true;
        let cases = self.parse_switch_cases();
        self.ctx = saved;
        self.scopes.exit();
        let cases = cases?;
        self.expect(&TokenKind::RBrace)?;
        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
            span: self.finish_span(start),
        }))
    }

    fn parse_switch_cases(&mut self) -> Result<Vec<SwitchCase>, ParseError> {
        let mut cases = Vec::new();
        let mut default_seen = false;
        while !self.check(&TokenKind::RBrace) {
            let case_start = self.start();
            let test = match &self.current.kind {
                TokenKind::Case => {
                    self.advance()?;
                    let test = self.parse_expression()?;
                    self.expect(&TokenKind::Colon)?;
                    Some(test)
                }
                TokenKind::Default => {
                    if default_seen {
                        return Err(self.semantic_at(
                            self.start(),
                            "More than one default clause in switch statement",
                        ));
                    }
                    default_seen = true;
                    self.advance()?;
                    self.expect(&TokenKind::Colon)?;
                    None
                }
                _ => return Err(self.unexpected()),
            };
            let mut consequent = Vec::new();
            while !matches!(
                self.current.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace
            ) {
                if self.current.is_eof() {
                    return Err(self.unexpected());
                }
                consequent.push(self.parse_statement_list_item()?);
            }
            cases.push(SwitchCase {
                test,
                consequent,
                span: self.finish_span(case_start),
            });
        }
        Ok(cases)
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        if self.current.newline_before {
            return Err(self.error_at(start, "Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(Statement::Throw(ThrowStatement {
            argument,
            span: self.finish_span(start),
        }))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        let block = self.parse_block()?;
        let handler = if self.check(&TokenKind::Catch) {
            Some(self.parse_catch_clause()?)
        } else {
            None
        };
        let finalizer = if self.match_token(&TokenKind::Finally)? {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at(start, "Missing catch or finally after try"));
        }
        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
            span: self.finish_span(start),
        }))
    }

    fn parse_catch_clause(&mut self) -> Result<CatchClause, ParseError> {
        let start = self.start();
        self.advance()?;
        self.expect(&TokenKind::LParen)?;
        let simple = matches!(
            self.current.kind,
            TokenKind::Identifier(_) | TokenKind::Yield | TokenKind::Await
        );
        self.scopes.enter_catch(simple);
        let result = self.parse_catch_rest(start, simple);
        self.scopes.exit();
        result
    }

    fn parse_catch_rest(&mut self, start: Position, simple: bool) -> Result<CatchClause, ParseError> {
        let param = self.parse_binding_pattern()?;
        let mut names = Vec::new();
        collect_bound_names(&param, &mut names);
        if !simple {
            let mut seen = rustc_hash::FxHashSet::default();
            for (name, span) in &names {
                if !seen.insert(name.as_str()) {
                    return Err(self.semantic_at(
                        span.start,
                        format!("Identifier '{name}' has already been declared"),
                    ));
                }
            }
        }
        for (name, span) in &names {
            self.scopes
                .declare(name, BindingKind::CatchParam, *span, self.ctx.strict)?;
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block_in_current_scope()?;
        Ok(CatchClause {
            param,
            body,
            span: self.finish_span(start),
        })
    }

    // ============ VARIABLE DECLARATIONS ============

    fn parse_declaration_statement(&mut self, kind: VariableKind) -> Result<Statement, ParseError> {
        let mut decl = self.parse_variable_declaration_list(kind, true)?;
        self.check_declaration_inits(&decl)?;
        self.expect_semicolon()?;
        decl.span = self.finish_span(decl.span.start);
        Ok(Statement::VariableDeclaration(decl))
    }

    fn parse_variable_declaration_list(
        &mut self,
        kind: VariableKind,
        allow_in: bool,
    ) -> Result<VariableDeclaration, ParseError> {
        let start = self.start();
        self.advance()?;
        let binding = if kind == VariableKind::Var {
            BindingKind::Var
        } else {
            BindingKind::Lexical
        };
        let mut declarations = Vec::new();
        loop {
            let d_start = self.start();
            let id = self.parse_binding_pattern()?;
            let mut names = Vec::new();
            collect_bound_names(&id, &mut names);
            if binding == BindingKind::Lexical {
                for (name, span) in &names {
                    if name == "let" {
                        return Err(self.error_at(
                            span.start,
                            "let is disallowed as a lexically bound name",
                        ));
                    }
                }
            }
            for (name, span) in &names {
                self.scopes.declare(name, binding, *span, self.ctx.strict)?;
            }
            let init = if self.check(&TokenKind::Eq) {
                self.advance()?;
                let saved = self.ctx.allow_in;
                self.ctx.allow_in = allow_in;
                let init = self.isolate(Self::parse_assignment_expression);
                self.ctx.allow_in = saved;
                Some(init?)
            } else {
                None
            };
            declarations.push(VariableDeclarator {
                id,
                init,
                span: self.finish_span(d_start),
            });
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(VariableDeclaration {
            kind,
            declarations,
            span: self.finish_span(start),
        })
    }

    fn check_declaration_inits(&self, decl: &VariableDeclaration) -> Result<(), ParseError> {
        for d in &decl.declarations {
            if d.init.is_none() {
                if decl.kind == VariableKind::Const {
                    return Err(
                        self.error_at(d.span.start, "Missing initializer in const declaration")
                    );
                }
                if !matches!(d.id, Pattern::Identifier(_)) {
                    return Err(self.error_at(
                        d.span.start,
                        "Missing initializer in destructuring declaration",
                    ));
                }
            }
        }
        Ok(())
    }
}

// ============ EXPRESSIONS ============

/// Binary and logical operators share the precedence climb but build
/// different node families.
enum BinaryOrLogical {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOrLogical> {
    let op = match kind {
        TokenKind::PipePipe => BinaryOrLogical::Logical(LogicalOp::Or),
        TokenKind::AmpAmp => BinaryOrLogical::Logical(LogicalOp::And),
        TokenKind::Pipe => BinaryOrLogical::Binary(BinaryOp::BitOr),
        TokenKind::Caret => BinaryOrLogical::Binary(BinaryOp::BitXor),
        TokenKind::Amp => BinaryOrLogical::Binary(BinaryOp::BitAnd),
        TokenKind::EqEq => BinaryOrLogical::Binary(BinaryOp::Eq),
        TokenKind::BangEq => BinaryOrLogical::Binary(BinaryOp::NotEq),
        TokenKind::EqEqEq => BinaryOrLogical::Binary(BinaryOp::StrictEq),
        TokenKind::BangEqEq => BinaryOrLogical::Binary(BinaryOp::StrictNotEq),
        TokenKind::Lt => BinaryOrLogical::Binary(BinaryOp::Lt),
        TokenKind::Gt => BinaryOrLogical::Binary(BinaryOp::Gt),
        TokenKind::LtEq => BinaryOrLogical::Binary(BinaryOp::LtEq),
        TokenKind::GtEq => BinaryOrLogical::Binary(BinaryOp::GtEq),
        TokenKind::Instanceof => BinaryOrLogical::Binary(BinaryOp::Instanceof),
        TokenKind::In => BinaryOrLogical::Binary(BinaryOp::In),
        TokenKind::LtLt => BinaryOrLogical::Binary(BinaryOp::Shl),
        TokenKind::GtGt => BinaryOrLogical::Binary(BinaryOp::Shr),
        TokenKind::GtGtGt => BinaryOrLogical::Binary(BinaryOp::UShr),
        TokenKind::Plus => BinaryOrLogical::Binary(BinaryOp::Add),
        TokenKind::Minus => BinaryOrLogical::Binary(BinaryOp::Sub),
        TokenKind::Star => BinaryOrLogical::Binary(BinaryOp::Mul),
        TokenKind::Slash => BinaryOrLogical::Binary(BinaryOp::Div),
        TokenKind::Percent => BinaryOrLogical::Binary(BinaryOp::Mod),
        TokenKind::StarStar => BinaryOrLogical::Binary(BinaryOp::Exp),
        _ => return None,
    };
    Some(op)
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::AddAssign,
        TokenKind::MinusEq => AssignOp::SubAssign,
        TokenKind::StarEq => AssignOp::MulAssign,
        TokenKind::SlashEq => AssignOp::DivAssign,
        TokenKind::PercentEq => AssignOp::ModAssign,
        TokenKind::StarStarEq => AssignOp::ExpAssign,
        TokenKind::LtLtEq => AssignOp::ShlAssign,
        TokenKind::GtGtEq => AssignOp::ShrAssign,
        TokenKind::GtGtGtEq => AssignOp::UShrAssign,
        TokenKind::AmpEq => AssignOp::BitAndAssign,
        TokenKind::PipeEq => AssignOp::BitOrAssign,
        TokenKind::CaretEq => AssignOp::BitXorAssign,
        _ => return None,
    };
    Some(op)
}

/// All reserved spellings, for places that must reject keyword-shaped
/// identifier names (shorthand properties, export locals).
fn is_keyword_spelling(name: &str) -> bool {
    matches!(
        name,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "enum"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "new"
            | "null"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "yield"
            | "await"
    )
}

/// `get`/`set` classification for method heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessorHint {
    None,
    Get,
    Set,
}

impl<'a> Parser<'a> {
    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let first = self.isolate(Self::parse_assignment_expression)?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let start = first.span().start;
        let mut expressions = vec![first];
        while self.match_token(&TokenKind::Comma)? {
            expressions.push(self.isolate(Self::parse_assignment_expression)?);
        }
        Ok(Expression::Sequence(SequenceExpression {
            expressions,
            span: Span::new(start, self.previous.span.end),
        }))
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, ParseError> {
        self.descend()?;
        let result = self.assignment_expression_inner();
        self.depth -= 1;
        result
    }

    fn assignment_expression_inner(&mut self) -> Result<Expression, ParseError> {
        let start = self.start();
        if self.ctx.allow_yield && self.check(&TokenKind::Yield) {
            return self.parse_yield_expression();
        }

        // Arrow heads are a cover grammar; commit only when `=>` follows the
        // parameter list, otherwise rewind and parse as a plain expression.
        if self.check(&TokenKind::LParen) {
            let cp = self.checkpoint();
            match self.try_parse_arrow_params(false) {
                Ok(Some(params)) => return self.parse_arrow_tail(start, params, false),
                _ => self.restore(cp),
            }
        } else if self.is_ident("async") {
            let peek = self.peek_token()?;
            if !peek.newline_before {
                if peek.kind == TokenKind::LParen {
                    let cp = self.checkpoint();
                    let attempt = (|| {
                        self.advance()?;
                        self.try_parse_arrow_params(true)
                    })();
                    match attempt {
                        Ok(Some(params)) => return self.parse_arrow_tail(start, params, true),
                        _ => self.restore(cp),
                    }
                } else if matches!(
                    peek.kind,
                    TokenKind::Identifier(_) | TokenKind::Yield | TokenKind::Await
                ) {
                    let cp = self.checkpoint();
                    let attempt = (|| {
                        self.advance()?;
                        self.try_parse_async_arrow_ident()
                    })();
                    match attempt {
                        Ok(Some(param)) => return self.parse_arrow_tail(start, vec![param], true),
                        _ => self.restore(cp),
                    }
                }
            }
        }
        if matches!(
            self.current.kind,
            TokenKind::Identifier(_) | TokenKind::Yield | TokenKind::Await
        ) {
            let peek = self.peek_token()?;
            if peek.kind == TokenKind::Arrow && !peek.newline_before {
                let id = self.parse_binding_identifier()?;
                return self.parse_arrow_tail(start, vec![Pattern::Identifier(id)], false);
            }
        }

        let left = self.parse_conditional_expression()?;
        let Some(operator) = assign_op(&self.current.kind) else {
            return Ok(left);
        };
        let target = if operator == AssignOp::Assign {
            self.to_assignment_target(left, true)?
        } else {
            self.take_cover_errors()?;
            self.to_assignment_target(left, false)?
        };
        self.advance()?;
        let right = self.isolate(Self::parse_assignment_expression)?;
        Ok(Expression::Assignment(AssignmentExpression {
            operator,
            left: target,
            right: Box::new(right),
            span: self.finish_span(start),
        }))
    }

    fn to_assignment_target(
        &mut self,
        expr: Expression,
        allow_pattern: bool,
    ) -> Result<AssignTarget, ParseError> {
        match expr {
            Expression::Identifier(id) => {
                self.check_assignment_name(&id)?;
                Ok(AssignTarget::Expression(Box::new(Expression::Identifier(
                    id,
                ))))
            }
            Expression::Member(_) => Ok(AssignTarget::Expression(Box::new(expr))),
            Expression::Array(_) | Expression::Object(_) if allow_pattern => {
                let pattern = self.reinterpret_expression_as_pattern(expr)?;
                Ok(AssignTarget::Pattern(Box::new(pattern)))
            }
            other => Err(self.error_at(
                other.span().start,
                "Invalid left-hand side in assignment",
            )),
        }
    }

    fn check_assignment_name(&self, id: &Identifier) -> Result<(), ParseError> {
        if self.ctx.strict && is_restricted_name(&id.name) {
            return Err(self.semantic_at(
                id.span.start,
                "Unexpected eval or arguments in strict mode",
            ));
        }
        Ok(())
    }

    fn parse_yield_expression(&mut self) -> Result<Expression, ParseError> {
        let start = self.start();
        if self.ctx.in_formal_params {
            return Err(self.error_at(start, "Yield expression not allowed in formal parameter"));
        }
        self.advance()?;
        let delegate = !self.current.newline_before && self.check(&TokenKind::Star);
        if delegate {
            self.advance()?;
        }
        let argument = if delegate
            || (!self.current.newline_before && self.token_starts_expression())
        {
            Some(Box::new(self.isolate(Self::parse_assignment_expression)?))
        } else {
            None
        };
        Ok(Expression::Yield(YieldExpression {
            argument,
            delegate,
            span: self.finish_span(start),
        }))
    }

    /// A conservative test for whether `current` can begin an operand; used
    /// only to decide whether `yield` takes an argument.
    fn token_starts_expression(&self) -> bool {
        !matches!(
            self.current.kind,
            TokenKind::Semicolon
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Comma
                | TokenKind::Colon
                | TokenKind::Question
                | TokenKind::Eof
        )
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, ParseError> {
        let start = self.start();
        let test = self.parse_binary_expression(0)?;
        if !self.match_token(&TokenKind::Question)? {
            return Ok(test);
        }
        let saved = self.ctx.allow_in;
        self.ctx.allow_in = true;
        let consequent = self.isolate(Self::parse_assignment_expression);
        self.ctx.allow_in = saved;
        let consequent = consequent?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.isolate(Self::parse_assignment_expression)?;
        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: self.finish_span(start),
        }))
    }

    fn binary_precedence(&self, kind: &TokenKind) -> u8 {
        match kind {
            TokenKind::PipePipe => 1,
            TokenKind::AmpAmp => 2,
            TokenKind::Pipe => 3,
            TokenKind::Caret => 4,
            TokenKind::Amp => 5,
            TokenKind::EqEq | TokenKind::BangEq | TokenKind::EqEqEq | TokenKind::BangEqEq => 6,
            TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::Instanceof => 7,
            TokenKind::In if self.ctx.allow_in => 7,
            TokenKind::LtLt | TokenKind::GtGt | TokenKind::GtGtGt => 8,
            TokenKind::Plus | TokenKind::Minus => 9,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 10,
            TokenKind::StarStar => 11,
            _ => 0,
        }
    }

    fn parse_binary_expression(&mut self, min_prec: u8) -> Result<Expression, ParseError> {
        self.descend()?;
        let result = self.binary_expression_inner(min_prec);
        self.depth -= 1;
        result
    }

    fn binary_expression_inner(&mut self, min_prec: u8) -> Result<Expression, ParseError> {
        let start = self.start();
        let mut left = self.parse_unary_expression()?;
        loop {
            let prec = self.binary_precedence(&self.current.kind);
            if prec == 0 || prec < min_prec {
                break;
            }
            let op_kind = self.current.kind.clone();
            self.advance()?;
            // `**` is right-associative; everything else binds left
            let next_min = if matches!(op_kind, TokenKind::StarStar) {
                prec
            } else {
                prec + 1
            };
            let right = self.parse_binary_expression(next_min)?;
            let span = Span::new(start, self.previous.span.end);
            left = match binary_op(&op_kind) {
                Some(BinaryOrLogical::Logical(operator)) => {
                    Expression::Logical(LogicalExpression {
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    })
                }
                Some(BinaryOrLogical::Binary(operator)) => Expression::Binary(BinaryExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                }),
                None => return Err(self.unexpected()),
            };
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, ParseError> {
        self.descend()?;
        let result = self.unary_expression_inner();
        self.depth -= 1;
        result
    }

    fn unary_expression_inner(&mut self) -> Result<Expression, ParseError> {
        let start = self.start();
        let operator = match &self.current.kind {
            TokenKind::Delete => Some(UnaryOp::Delete),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance()?;
            let argument = self.parse_unary_expression()?;
            if operator == UnaryOp::Delete
                && self.ctx.strict
                && matches!(argument, Expression::Identifier(_))
            {
                return Err(
                    self.semantic_at(start, "Delete of an unqualified identifier in strict mode")
                );
            }
            let expr = Expression::Unary(UnaryExpression {
                operator,
                argument: Box::new(argument),
                span: self.finish_span(start),
            });
            self.check_exponent_operand()?;
            return Ok(expr);
        }
        match &self.current.kind {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let operator = if self.check(&TokenKind::PlusPlus) {
                    UpdateOp::Inc
                } else {
                    UpdateOp::Dec
                };
                self.advance()?;
                let argument = self.parse_unary_expression()?;
                self.check_update_target(&argument, "prefix")?;
                Ok(Expression::Update(UpdateExpression {
                    operator,
                    argument: Box::new(argument),
                    prefix: true,
                    span: self.finish_span(start),
                }))
            }
            TokenKind::Await if self.ctx.allow_await => {
                if self.ctx.in_formal_params {
                    return Err(
                        self.error_at(start, "Await expression not allowed in formal parameter")
                    );
                }
                self.advance()?;
                let argument = Box::new(self.parse_unary_expression()?);
                let expr = Expression::Await(AwaitExpression {
                    argument,
                    span: self.finish_span(start),
                });
                self.check_exponent_operand()?;
                Ok(expr)
            }
            _ => self.parse_postfix_expression(),
        }
    }

    /// A unary form may not sit directly under `**`.
    fn check_exponent_operand(&self) -> Result<(), ParseError> {
        if self.check(&TokenKind::StarStar) {
            return Err(self.error_at(
                self.current.span.start,
                "Unary operand of ** must be parenthesized",
            ));
        }
        Ok(())
    }

    fn check_update_target(&self, expr: &Expression, what: &str) -> Result<(), ParseError> {
        match expr {
            Expression::Identifier(id) => {
                if self.ctx.strict && is_restricted_name(&id.name) {
                    return Err(self.semantic_at(
                        id.span.start,
                        "Unexpected eval or arguments in strict mode",
                    ));
                }
                Ok(())
            }
            Expression::Member(_) => Ok(()),
            _ => Err(self.error_at(
                expr.span().start,
                format!("Invalid left-hand side expression in {what} operation"),
            )),
        }
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, ParseError> {
        let start = self.start();
        let expr = self.parse_left_hand_side_expression(true)?;
        if !self.current.newline_before
            && matches!(
                self.current.kind,
                TokenKind::PlusPlus | TokenKind::MinusMinus
            )
        {
            self.check_update_target(&expr, "postfix")?;
            let operator = if self.check(&TokenKind::PlusPlus) {
                UpdateOp::Inc
            } else {
                UpdateOp::Dec
            };
            self.advance()?;
            return Ok(Expression::Update(UpdateExpression {
                operator,
                argument: Box::new(expr),
                prefix: false,
                span: self.finish_span(start),
            }));
        }
        Ok(expr)
    }

    fn parse_left_hand_side_expression(
        &mut self,
        allow_call: bool,
    ) -> Result<Expression, ParseError> {
        let start = self.start();
        let base = match &self.current.kind {
            TokenKind::New => self.parse_new_expression()?,
            TokenKind::Super => self.parse_super_expression()?,
            _ => self.parse_primary_expression()?,
        };
        self.parse_call_member_tail(base, start, allow_call)
    }

    fn parse_call_member_tail(
        &mut self,
        mut expr: Expression,
        start: Position,
        allow_call: bool,
    ) -> Result<Expression, ParseError> {
        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let property = self.parse_identifier_name()?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property: Box::new(Expression::Identifier(property)),
                        computed: false,
                        span: self.finish_span(start),
                    });
                }
                TokenKind::LBracket => {
                    self.advance()?;
                    let saved = self.ctx.allow_in;
                    self.ctx.allow_in = true;
                    let property = self.parse_expression();
                    self.ctx.allow_in = saved;
                    let property = property?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property: Box::new(property),
                        computed: true,
                        span: self.finish_span(start),
                    });
                }
                TokenKind::LParen if allow_call => {
                    let arguments = self.parse_arguments()?;
                    expr = Expression::Call(CallExpression {
                        callee: Box::new(expr),
                        arguments,
                        span: self.finish_span(start),
                    });
                }
                TokenKind::TemplateHead(_) | TokenKind::TemplateNoSub(_) => {
                    let quasi = self.parse_template_literal(true)?;
                    expr = Expression::TaggedTemplate(TaggedTemplateExpression {
                        tag: Box::new(expr),
                        quasi,
                        span: self.finish_span(start),
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let saved = self.ctx.allow_in;
        self.ctx.allow_in = true;
        let result = self.parse_argument_list();
        self.ctx.allow_in = saved;
        result
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let argument = if self.check(&TokenKind::DotDotDot) {
                let start = self.start();
                self.advance()?;
                let argument = Box::new(self.isolate(Self::parse_assignment_expression)?);
                Expression::Spread(SpreadElement {
                    argument,
                    span: self.finish_span(start),
                })
            } else {
                self.isolate(Self::parse_assignment_expression)?
            };
            arguments.push(argument);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.advance()?;
        Ok(arguments)
    }

    fn parse_new_expression(&mut self) -> Result<Expression, ParseError> {
        self.descend()?;
        let result = self.new_expression_inner();
        self.depth -= 1;
        result
    }

    fn new_expression_inner(&mut self) -> Result<Expression, ParseError> {
        let start = self.start();
        let new_span = self.current.span;
        self.advance()?;
        if self.check(&TokenKind::Dot) {
            self.advance()?;
            if !self.is_ident("target") {
                return Err(self.unexpected());
            }
            if !self.ctx.allow_new_target {
                return Err(self.error_at(start, "new.target expression is not allowed here"));
            }
            let property = Identifier {
                name: "target".to_string(),
                span: self.current.span,
            };
            self.advance()?;
            return Ok(Expression::MetaProperty(MetaProperty {
                meta: Identifier {
                    name: "new".to_string(),
                    span: new_span,
                },
                property,
                span: self.finish_span(start),
            }));
        }
        let callee = if self.check(&TokenKind::New) {
            self.parse_new_expression()?
        } else if self.check(&TokenKind::Super) {
            return Err(self.error_at(self.start(), "'super' keyword unexpected here"));
        } else {
            let base_start = self.start();
            let base = self.parse_primary_expression()?;
            self.parse_call_member_tail(base, base_start, false)?
        };
        let arguments = if self.check(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
            span: self.finish_span(start),
        }))
    }

    fn parse_super_expression(&mut self) -> Result<Expression, ParseError> {
        let span = self.current.span;
        self.advance()?;
        match &self.current.kind {
            TokenKind::LParen => {
                if !self.ctx.allow_super_call {
                    return Err(self.error_at(
                        span.start,
                        "'super' call is only allowed in a derived class constructor",
                    ));
                }
            }
            TokenKind::Dot | TokenKind::LBracket => {
                if !self.ctx.allow_super_property {
                    return Err(
                        self.error_at(span.start, "'super' keyword is only allowed in methods")
                    );
                }
            }
            _ => return Err(self.unexpected()),
        }
        Ok(Expression::Super(SuperNode { span }))
    }

    /// Any IdentifierName, including reserved words; member properties and
    /// property keys live in this namespace.
    fn parse_identifier_name(&mut self) -> Result<Identifier, ParseError> {
        let span = self.current.span;
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.clone(),
            other => {
                let text = token_text(other);
                if !text.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                    return Err(self.unexpected());
                }
                text.to_string()
            }
        };
        self.advance()?;
        Ok(Identifier { name, span })
    }

    fn parse_identifier_reference(&mut self) -> Result<Identifier, ParseError> {
        let span = self.current.span;
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                if self.ctx.strict && is_strict_reserved(&name) {
                    return Err(self.error_at(span.start, "Unexpected strict mode reserved word"));
                }
                self.advance()?;
                Ok(Identifier { name, span })
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        let start = self.start();
        match &self.current.kind {
            TokenKind::Number(value) => {
                if self.ctx.strict && self.current.octal {
                    return Err(
                        self.error_at(start, "Octal literals are not allowed in strict mode")
                    );
                }
                let value = *value;
                let span = self.current.span;
                let raw = self.raw_of(span);
                self.advance()?;
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Number(value),
                    raw,
                    span,
                }))
            }
            TokenKind::String(s) => {
                if self.ctx.strict && self.current.octal {
                    return Err(self.octal_string_error(start));
                }
                let value = s.clone();
                let span = self.current.span;
                let raw = self.raw_of(span);
                self.advance()?;
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::String(value),
                    raw,
                    span,
                }))
            }
            TokenKind::True | TokenKind::False => {
                let value = self.check(&TokenKind::True);
                let span = self.current.span;
                let raw = self.raw_of(span);
                self.advance()?;
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Boolean(value),
                    raw,
                    span,
                }))
            }
            TokenKind::Null => {
                let span = self.current.span;
                let raw = self.raw_of(span);
                self.advance()?;
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Null,
                    raw,
                    span,
                }))
            }
            TokenKind::Slash | TokenKind::SlashEq => {
                // expression position: `/` starts a regular expression
                self.current = self.lexer.rescan_as_regexp(self.current.span)?;
                let (pattern, flags) = match &self.current.kind {
                    TokenKind::RegExp { pattern, flags } => (pattern.clone(), flags.clone()),
                    _ => return Err(self.unexpected()),
                };
                let span = self.current.span;
                let raw = self.raw_of(span);
                self.advance()?;
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::RegExp { pattern, flags },
                    raw,
                    span,
                }))
            }
            TokenKind::This => {
                let span = self.current.span;
                self.advance()?;
                Ok(Expression::This(ThisExpression { span }))
            }
            TokenKind::Identifier(_) => {
                if self.is_ident("async") {
                    let peek = self.peek_token()?;
                    if peek.kind == TokenKind::Function && !peek.newline_before {
                        return self.parse_function_expression(start, true);
                    }
                }
                Ok(Expression::Identifier(self.parse_identifier_reference()?))
            }
            TokenKind::Yield => {
                if self.ctx.allow_yield {
                    Err(self.unexpected())
                } else if self.ctx.strict {
                    Err(self.error_at(start, "Unexpected strict mode reserved word"))
                } else {
                    let span = self.current.span;
                    self.advance()?;
                    Ok(Expression::Identifier(Identifier {
                        name: "yield".to_string(),
                        span,
                    }))
                }
            }
            TokenKind::Await => {
                if self.ctx.allow_await {
                    Err(self.unexpected())
                } else if self.ctx.module {
                    Err(self.error_at(start, "Unexpected reserved word 'await'"))
                } else {
                    let span = self.current.span;
                    self.advance()?;
                    Ok(Expression::Identifier(Identifier {
                        name: "await".to_string(),
                        span,
                    }))
                }
            }
            TokenKind::Function => self.parse_function_expression(start, false),
            TokenKind::Class => self.parse_class_expression(start),
            TokenKind::LParen => self.parse_paren_expression(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::TemplateHead(_) | TokenKind::TemplateNoSub(_) => {
                Ok(Expression::TemplateLiteral(
                    self.parse_template_literal(false)?,
                ))
            }
            TokenKind::Import => {
                let import_span = self.current.span;
                self.advance()?;
                if !self.check(&TokenKind::Dot) {
                    return Err(self.error_at(
                        start,
                        "'import' may only appear at the top level of a module",
                    ));
                }
                self.advance()?;
                if !self.is_ident("meta") {
                    return Err(self.unexpected());
                }
                if !self.ctx.module {
                    return Err(self.error_at(start, "Cannot use 'import.meta' outside a module"));
                }
                let property = Identifier {
                    name: "meta".to_string(),
                    span: self.current.span,
                };
                self.advance()?;
                Ok(Expression::MetaProperty(MetaProperty {
                    meta: Identifier {
                        name: "import".to_string(),
                        span: import_span,
                    },
                    property,
                    span: self.finish_span(start),
                }))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_paren_expression(&mut self) -> Result<Expression, ParseError> {
        self.descend()?;
        let result = self.paren_expression_inner();
        self.depth -= 1;
        result
    }

    fn paren_expression_inner(&mut self) -> Result<Expression, ParseError> {
        self.advance()?;
        if self.check(&TokenKind::RParen) {
            return Err(self.unexpected());
        }
        let saved = self.ctx.allow_in;
        self.ctx.allow_in = true;
        let expr = self.parse_expression();
        self.ctx.allow_in = saved;
        let expr = expr?;
        self.expect(&TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_array_literal(&mut self) -> Result<Expression, ParseError> {
        let start = self.start();
        self.advance()?;
        let saved = self.ctx.allow_in;
        self.ctx.allow_in = true;
        let elements = self.parse_array_elements();
        self.ctx.allow_in = saved;
        let elements = elements?;
        self.expect(&TokenKind::RBracket)?;
        Ok(Expression::Array(ArrayExpression {
            elements,
            span: self.finish_span(start),
        }))
    }

    fn parse_array_elements(&mut self) -> Result<Vec<Option<Expression>>, ParseError> {
        let mut elements = Vec::new();
        loop {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            if self.check(&TokenKind::Comma) {
                self.advance()?;
                elements.push(None);
                continue;
            }
            let element = if self.check(&TokenKind::DotDotDot) {
                let start = self.start();
                self.advance()?;
                let argument = Box::new(self.parse_assignment_expression()?);
                Expression::Spread(SpreadElement {
                    argument,
                    span: self.finish_span(start),
                })
            } else {
                self.parse_assignment_expression()?
            };
            elements.push(Some(element));
            if !self.check(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        Ok(elements)
    }

    fn parse_object_literal(&mut self) -> Result<Expression, ParseError> {
        let start = self.start();
        self.advance()?;
        let saved = self.ctx.allow_in;
        self.ctx.allow_in = true;
        let properties = self.parse_object_properties();
        self.ctx.allow_in = saved;
        let properties = properties?;
        self.expect(&TokenKind::RBrace)?;
        Ok(Expression::Object(ObjectExpression {
            properties,
            span: self.finish_span(start),
        }))
    }

    fn parse_object_properties(&mut self) -> Result<Vec<ObjectProperty>, ParseError> {
        let mut properties = Vec::new();
        let mut proto_seen = false;
        while !self.check(&TokenKind::RBrace) {
            if self.current.is_eof() {
                return Err(self.unexpected());
            }
            if self.check(&TokenKind::DotDotDot) {
                let start = self.start();
                self.advance()?;
                let argument = Box::new(self.parse_assignment_expression()?);
                properties.push(ObjectProperty::Spread(SpreadElement {
                    argument,
                    span: self.finish_span(start),
                }));
            } else {
                let property = self.parse_object_property(&mut proto_seen)?;
                properties.push(ObjectProperty::Property(property));
            }
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        Ok(properties)
    }

    fn parse_object_property(&mut self, proto_seen: &mut bool) -> Result<Property, ParseError> {
        let start = self.start();
        let (is_async, generator, accessor) = self.parse_method_modifiers()?;
        let (key, computed) = self.parse_property_key()?;
        match accessor {
            AccessorHint::Get => {
                let value = self.parse_method_function(false, false, FunctionKind::Getter)?;
                return Ok(Property {
                    key,
                    value: Expression::Function(value),
                    kind: PropertyKind::Get,
                    computed,
                    method: false,
                    shorthand: false,
                    span: self.finish_span(start),
                });
            }
            AccessorHint::Set => {
                let value = self.parse_method_function(false, false, FunctionKind::Setter)?;
                return Ok(Property {
                    key,
                    value: Expression::Function(value),
                    kind: PropertyKind::Set,
                    computed,
                    method: false,
                    shorthand: false,
                    span: self.finish_span(start),
                });
            }
            AccessorHint::None => {}
        }
        if is_async || generator || self.check(&TokenKind::LParen) {
            let value = self.parse_method_function(is_async, generator, FunctionKind::Method)?;
            return Ok(Property {
                key,
                value: Expression::Function(value),
                kind: PropertyKind::Init,
                computed,
                method: true,
                shorthand: false,
                span: self.finish_span(start),
            });
        }
        if self.check(&TokenKind::Colon) {
            // duplicate `__proto__: v` definitions are illegal in object
            // literals, but fine once the literal turns out to be a pattern
            if !computed && key.static_name().as_deref() == Some("__proto__") {
                if *proto_seen && self.pending_proto_dup.is_none() {
                    self.pending_proto_dup = Some(start);
                }
                *proto_seen = true;
            }
            self.advance()?;
            let value = self.parse_assignment_expression()?;
            return Ok(Property {
                key,
                value,
                kind: PropertyKind::Init,
                computed,
                method: false,
                shorthand: false,
                span: self.finish_span(start),
            });
        }
        let id = self.shorthand_identifier(&key)?;
        if self.check(&TokenKind::Eq) {
            // CoverInitializedName: legal only if the whole literal is
            // reinterpreted as a destructuring pattern
            let eq_pos = self.start();
            self.advance()?;
            let right = Box::new(self.isolate(Self::parse_assignment_expression)?);
            if self.pending_cover_init.is_none() {
                self.pending_cover_init = Some(eq_pos);
            }
            let span = self.finish_span(start);
            let value = Expression::Assignment(AssignmentExpression {
                operator: AssignOp::Assign,
                left: AssignTarget::Expression(Box::new(Expression::Identifier(id))),
                right,
                span,
            });
            return Ok(Property {
                key,
                value,
                kind: PropertyKind::Init,
                computed: false,
                method: false,
                shorthand: true,
                span,
            });
        }
        Ok(Property {
            key,
            value: Expression::Identifier(id),
            kind: PropertyKind::Init,
            computed: false,
            method: false,
            shorthand: true,
            span: self.finish_span(start),
        })
    }

    /// Validate a shorthand-property key as an identifier reference.
    fn shorthand_identifier(&self, key: &PropertyKey) -> Result<Identifier, ParseError> {
        let PropertyKey::Identifier(id) = key else {
            return Err(self.error_at(key.span().start, "Unexpected token in object literal"));
        };
        let name = id.name.as_str();
        if is_keyword_spelling(name) {
            let ok = match name {
                "yield" => !self.ctx.strict && !self.ctx.allow_yield,
                "await" => !self.ctx.module && !self.ctx.allow_await,
                _ => false,
            };
            if !ok {
                return Err(self.error_at(id.span.start, format!("Unexpected token '{name}'")));
            }
        } else if self.ctx.strict && is_strict_reserved(name) {
            return Err(self.error_at(id.span.start, "Unexpected strict mode reserved word"));
        }
        Ok(id.clone())
    }

    fn parse_property_key(&mut self) -> Result<(PropertyKey, bool), ParseError> {
        match &self.current.kind {
            TokenKind::LBracket => {
                self.advance()?;
                let expr = self.isolate(Self::parse_assignment_expression)?;
                self.expect(&TokenKind::RBracket)?;
                Ok((PropertyKey::Computed(Box::new(expr)), true))
            }
            TokenKind::String(s) => {
                if self.ctx.strict && self.current.octal {
                    return Err(self.octal_string_error(self.start()));
                }
                let span = self.current.span;
                let literal = Literal {
                    value: LiteralValue::String(s.clone()),
                    raw: self.raw_of(span),
                    span,
                };
                self.advance()?;
                Ok((PropertyKey::Literal(literal), false))
            }
            TokenKind::Number(n) => {
                if self.ctx.strict && self.current.octal {
                    return Err(self.error_at(
                        self.start(),
                        "Octal literals are not allowed in strict mode",
                    ));
                }
                let value = *n;
                let span = self.current.span;
                let literal = Literal {
                    value: LiteralValue::Number(value),
                    raw: self.raw_of(span),
                    span,
                };
                self.advance()?;
                Ok((PropertyKey::Literal(literal), false))
            }
            _ => Ok((PropertyKey::Identifier(self.parse_identifier_name()?), false)),
        }
    }

    /// `async`, `*`, and `get`/`set` prefixes shared by object literal
    /// methods and class members.
    fn parse_method_modifiers(&mut self) -> Result<(bool, bool, AccessorHint), ParseError> {
        let mut is_async = false;
        if self.is_ident("async") {
            let peek = self.peek_token()?;
            if !peek.newline_before && !is_method_head_terminator(&peek.kind) {
                is_async = true;
                self.advance()?;
                if self.check(&TokenKind::Star) {
                    return Err(self.error_at(self.start(), "Async generators are not supported"));
                }
            }
        }
        let generator = if is_async {
            false
        } else {
            self.match_token(&TokenKind::Star)?
        };
        let mut accessor = AccessorHint::None;
        if !is_async && !generator && (self.is_ident("get") || self.is_ident("set")) {
            let peek = self.peek_token()?;
            if !is_method_head_terminator(&peek.kind) {
                accessor = if self.is_ident("get") {
                    AccessorHint::Get
                } else {
                    AccessorHint::Set
                };
                self.advance()?;
            }
        }
        Ok((is_async, generator, accessor))
    }

    fn parse_template_literal(&mut self, tagged: bool) -> Result<TemplateLiteral, ParseError> {
        let start = self.start();
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        match &self.current.kind {
            TokenKind::TemplateNoSub(chunk) => {
                let chunk = chunk.clone();
                quasis.push(self.template_element(chunk, true, tagged)?);
                self.advance()?;
            }
            TokenKind::TemplateHead(chunk) => {
                let chunk = chunk.clone();
                quasis.push(self.template_element(chunk, false, tagged)?);
                self.advance()?;
                loop {
                    let saved = self.ctx.allow_in;
                    self.ctx.allow_in = true;
                    let expr = self.parse_expression();
                    self.ctx.allow_in = saved;
                    expressions.push(expr?);
                    if !self.check(&TokenKind::RBrace) {
                        return Err(self.unexpected());
                    }
                    // hand the `}` back to the lexer so it can resume the
                    // template in literal mode
                    self.current = self.lexer.rescan_template_continuation(self.current.span)?;
                    match &self.current.kind {
                        TokenKind::TemplateMiddle(chunk) => {
                            let chunk = chunk.clone();
                            quasis.push(self.template_element(chunk, false, tagged)?);
                            self.advance()?;
                        }
                        TokenKind::TemplateTail(chunk) => {
                            let chunk = chunk.clone();
                            quasis.push(self.template_element(chunk, true, tagged)?);
                            self.advance()?;
                            break;
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
            }
            _ => return Err(self.unexpected()),
        }
        Ok(TemplateLiteral {
            quasis,
            expressions,
            span: self.finish_span(start),
        })
    }

    fn template_element(
        &self,
        chunk: TemplateChunk,
        tail: bool,
        tagged: bool,
    ) -> Result<TemplateElement, ParseError> {
        // undecodable escapes only survive under a tag, as cooked: null
        if chunk.cooked.is_none() && !tagged {
            return Err(self.error_at(
                chunk.span.start,
                "Invalid escape sequence in template literal",
            ));
        }
        Ok(TemplateElement {
            cooked: chunk.cooked,
            raw: chunk.raw,
            tail,
            span: chunk.span,
        })
    }
}

/// Tokens after `async`/`get`/`set` that mean the word was a property key
/// itself rather than a modifier.
fn is_method_head_terminator(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LParen
            | TokenKind::Colon
            | TokenKind::Comma
            | TokenKind::RBrace
            | TokenKind::RParen
            | TokenKind::Eq
            | TokenKind::Semicolon
    )
}

// ============ FUNCTIONS AND CLASSES ============

impl<'a> Parser<'a> {
    fn parse_function_declaration(&mut self, is_async: bool) -> Result<Statement, ParseError> {
        let decl = self.parse_function_declaration_inner(is_async, false)?;
        Ok(Statement::FunctionDeclaration(decl))
    }

    fn parse_function_declaration_inner(
        &mut self,
        is_async: bool,
        allow_anonymous: bool,
    ) -> Result<FunctionDeclaration, ParseError> {
        let start = self.start();
        if is_async {
            self.advance()?;
        }
        self.expect(&TokenKind::Function)?;
        let generator = self.match_token(&TokenKind::Star)?;
        if is_async && generator {
            return Err(self.error_at(start, "Async generators are not supported"));
        }
        let id = if allow_anonymous && self.check(&TokenKind::LParen) {
            None
        } else {
            Some(self.parse_binding_identifier()?)
        };
        if let Some(id) = &id {
            self.scopes
                .declare(&id.name, BindingKind::Function, id.span, self.ctx.strict)?;
        }
        let (params, body, strict_body) = self.parse_function_rest(is_async, generator, FunctionKind::Normal)?;
        if strict_body && !self.ctx.strict {
            if let Some(id) = &id {
                self.check_retro_strict_name(id)?;
            }
        }
        Ok(FunctionDeclaration {
            id,
            params,
            body,
            generator,
            is_async,
            span: self.finish_span(start),
        })
    }

    fn parse_function_expression(
        &mut self,
        start: Position,
        is_async: bool,
    ) -> Result<Expression, ParseError> {
        if is_async {
            self.advance()?;
        }
        self.expect(&TokenKind::Function)?;
        let generator = self.match_token(&TokenKind::Star)?;
        if is_async && generator {
            return Err(self.error_at(start, "Async generators are not supported"));
        }
        // the name of a function expression lives inside the function, so it
        // obeys the inner yield/await rules
        let id = if self.check(&TokenKind::LParen) {
            None
        } else {
            let saved = self.ctx;
            self.ctx.allow_yield = generator;
            self.ctx.allow_await = is_async;
            let id = self.parse_binding_identifier();
            self.ctx = saved;
            Some(id?)
        };
        let (params, body, strict_body) = self.parse_function_rest(is_async, generator, FunctionKind::Normal)?;
        if strict_body && !self.ctx.strict {
            if let Some(id) = &id {
                self.check_retro_strict_name(id)?;
            }
        }
        Ok(Expression::Function(FunctionExpression {
            id,
            params,
            body,
            generator,
            is_async,
            span: self.finish_span(start),
        }))
    }

    /// A function name parsed in sloppy code must be revalidated when the
    /// body turns out to begin with a use strict directive.
    fn check_retro_strict_name(&self, id: &Identifier) -> Result<(), ParseError> {
        if is_restricted_name(&id.name) {
            return Err(self.semantic_at(
                id.span.start,
                "Unexpected eval or arguments in strict mode",
            ));
        }
        if is_strict_reserved(&id.name) {
            return Err(self.error_at(id.span.start, "Unexpected strict mode reserved word"));
        }
        Ok(())
    }

    /// Parameter list and body, shared by declarations, expressions and
    /// methods. Returns the strictness the body settled on, so callers can
    /// revalidate names parsed before the directive prologue was seen.
    fn parse_function_rest(
        &mut self,
        is_async: bool,
        generator: bool,
        kind: FunctionKind,
    ) -> Result<(Vec<Pattern>, BlockStatement, bool), ParseError> {
        let saved_ctx = self.ctx;
        let saved_labels = std::mem::take(&mut self.labels);
        self.ctx.in_function = true;
        self.ctx.in_iteration = false;
        self.ctx.in_switch = false;
        self.ctx.allow_in = true;
        self.ctx.allow_yield = generator;
        self.ctx.allow_await = is_async;
        self.ctx.allow_super_property = kind.is_method();
        self.ctx.allow_super_call = kind == FunctionKind::DerivedConstructor;
        self.ctx.allow_new_target = true;
        let result = self.function_rest_inner(kind);
        let strict_body = self.ctx.strict;
        self.ctx = saved_ctx;
        self.labels = saved_labels;
        let (params, body) = result?;
        Ok((params, body, strict_body))
    }

    fn function_rest_inner(
        &mut self,
        kind: FunctionKind,
    ) -> Result<(Vec<Pattern>, BlockStatement), ParseError> {
        self.ctx.in_formal_params = true;
        let params = self.parse_formal_parameters();
        self.ctx.in_formal_params = false;
        let params = params?;
        match kind {
            FunctionKind::Getter => {
                if let Some(p) = params.first() {
                    return Err(self.error_at(
                        p.span().start,
                        "Getter must not have any formal parameters",
                    ));
                }
            }
            FunctionKind::Setter => {
                if params.len() != 1 {
                    return Err(self.error_at(
                        self.previous.span.start,
                        "Setter must have exactly one formal parameter",
                    ));
                }
                if let Some(Pattern::Rest(rest)) = params.first() {
                    return Err(self.error_at(
                        rest.span.start,
                        "Setter function argument must not be a rest parameter",
                    ));
                }
            }
            _ => {}
        }
        let mut names = Vec::new();
        for param in &params {
            collect_bound_names(param, &mut names);
        }
        let simple = params.iter().all(|p| matches!(p, Pattern::Identifier(_)));
        self.scopes.enter(ScopeKind::Function);
        for (name, span) in &names {
            self.scopes
                .declare(name, BindingKind::Parameter, *span, self.ctx.strict)?;
        }
        let body = self.parse_function_body_block(&names, simple, kind.unique_params());
        self.scopes.exit();
        Ok((params, body?))
    }

    /// `{ ... }` body with directive prologue handling. Parameter validation
    /// is deferred to this point because the prologue can retroactively make
    /// the whole function strict.
    fn parse_function_body_block(
        &mut self,
        names: &[(String, Span)],
        simple: bool,
        unique: bool,
    ) -> Result<BlockStatement, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        let prologue = self.parse_directive_prologue(&mut body)?;
        if prologue.use_strict {
            if !simple {
                return Err(self.error_at(
                    prologue.strict_at.unwrap_or(start),
                    "Illegal 'use strict' directive in function with non-simple parameter list",
                ));
            }
            self.ctx.strict = true;
        }
        if self.ctx.strict {
            if let Some(pos) = prologue.first_octal {
                return Err(self.octal_string_error(pos));
            }
        }
        self.validate_params(names, simple, self.ctx.strict, unique)?;
        while !self.check(&TokenKind::RBrace) {
            if self.current.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement_list_item()?);
        }
        self.advance()?;
        Ok(BlockStatement {
            body,
            span: self.finish_span(start),
        })
    }

    fn validate_params(
        &self,
        names: &[(String, Span)],
        simple: bool,
        strict: bool,
        unique: bool,
    ) -> Result<(), ParseError> {
        if strict || unique || !simple {
            let mut seen = rustc_hash::FxHashSet::default();
            for (name, span) in names {
                if !seen.insert(name.as_str()) {
                    return Err(self.semantic_at(
                        span.start,
                        "Duplicate parameter name not allowed in this context",
                    ));
                }
            }
        }
        if strict {
            for (name, span) in names {
                if is_restricted_name(name) {
                    return Err(self.semantic_at(
                        span.start,
                        "Unexpected eval or arguments in strict mode",
                    ));
                }
                if is_strict_reserved(name) {
                    return Err(self.error_at(span.start, "Unexpected strict mode reserved word"));
                }
            }
        }
        Ok(())
    }

    fn parse_formal_parameters(&mut self) -> Result<Vec<Pattern>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::DotDotDot) {
                let start = self.start();
                self.advance()?;
                let argument = Box::new(self.parse_binding_pattern()?);
                if self.check(&TokenKind::Eq) {
                    return Err(self.error_at(
                        self.start(),
                        "Rest parameter may not have a default initializer",
                    ));
                }
                params.push(Pattern::Rest(RestElement {
                    argument,
                    span: self.finish_span(start),
                }));
                if !self.check(&TokenKind::RParen) {
                    return Err(self.error_at(
                        self.start(),
                        "Rest parameter must be last formal parameter",
                    ));
                }
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    // ============ ARROWS ============

    /// Attempt a parenthesized arrow head starting at `(`. `Ok(None)` means
    /// the list parsed but no `=>` followed; the caller rewinds either way it
    /// fails.
    fn try_parse_arrow_params(
        &mut self,
        is_async: bool,
    ) -> Result<Option<Vec<Pattern>>, ParseError> {
        let saved = self.ctx;
        self.ctx.in_formal_params = true;
        if is_async {
            self.ctx.allow_await = true;
        }
        let result = self.parse_formal_parameters();
        self.ctx = saved;
        let params = result?;
        if self.check(&TokenKind::Arrow) && !self.current.newline_before {
            Ok(Some(params))
        } else {
            Ok(None)
        }
    }

    /// `async x => ...`: a single unparenthesized parameter after `async`.
    fn try_parse_async_arrow_ident(&mut self) -> Result<Option<Pattern>, ParseError> {
        if self.current.newline_before {
            return Ok(None);
        }
        let saved = self.ctx;
        self.ctx.allow_await = true;
        let id = self.parse_binding_identifier();
        self.ctx = saved;
        let id = id?;
        if self.check(&TokenKind::Arrow) && !self.current.newline_before {
            Ok(Some(Pattern::Identifier(id)))
        } else {
            Ok(None)
        }
    }

    /// Past the parameter list with `=>` in hand; errors are fatal from here.
    fn parse_arrow_tail(
        &mut self,
        start: Position,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<Expression, ParseError> {
        self.expect(&TokenKind::Arrow)?;
        let saved_ctx = self.ctx;
        let saved_labels = std::mem::take(&mut self.labels);
        // arrows keep the enclosing this/super environment but reset
        // everything generator- or loop-shaped
        self.ctx.in_function = true;
        self.ctx.in_iteration = false;
        self.ctx.in_switch = false;
        self.ctx.in_formal_params = false;
        self.ctx.allow_in = true;
        self.ctx.allow_yield = false;
        self.ctx.allow_await = is_async;
        let result = self.arrow_tail_inner(start, params, is_async);
        self.ctx = saved_ctx;
        self.labels = saved_labels;
        result
    }

    fn arrow_tail_inner(
        &mut self,
        start: Position,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<Expression, ParseError> {
        let mut names = Vec::new();
        for param in &params {
            collect_bound_names(param, &mut names);
        }
        let simple = params.iter().all(|p| matches!(p, Pattern::Identifier(_)));
        self.scopes.enter(ScopeKind::Function);
        for (name, span) in &names {
            self.scopes
                .declare(name, BindingKind::Parameter, *span, self.ctx.strict)?;
        }
        let body = if self.check(&TokenKind::LBrace) {
            self.parse_function_body_block(&names, simple, true)
                .map(ArrowBody::Block)
        } else {
            match self.validate_params(&names, simple, self.ctx.strict, true) {
                Ok(()) => self
                    .isolate(Self::parse_assignment_expression)
                    .map(|e| ArrowBody::Expression(Box::new(e))),
                Err(e) => Err(e),
            }
        };
        self.scopes.exit();
        let body = body?;
        Ok(Expression::Arrow(ArrowFunctionExpression {
            params,
            body,
            is_async,
            span: self.finish_span(start),
        }))
    }

    // ============ CLASSES ============

    fn parse_class_declaration(&mut self, allow_anonymous: bool) -> Result<Statement, ParseError> {
        let decl = self.parse_class_declaration_inner(allow_anonymous)?;
        Ok(Statement::ClassDeclaration(decl))
    }

    fn parse_class_declaration_inner(
        &mut self,
        allow_anonymous: bool,
    ) -> Result<ClassDeclaration, ParseError> {
        let start = self.start();
        self.advance()?;
        // class bodies and heritage clauses are always strict
        let saved_strict = self.ctx.strict;
        self.ctx.strict = true;
        let result = self.class_declaration_parts(start, allow_anonymous);
        self.ctx.strict = saved_strict;
        result
    }

    fn class_declaration_parts(
        &mut self,
        start: Position,
        allow_anonymous: bool,
    ) -> Result<ClassDeclaration, ParseError> {
        let id = if allow_anonymous
            && !matches!(self.current.kind, TokenKind::Identifier(_))
        {
            None
        } else {
            Some(self.parse_binding_identifier()?)
        };
        if let Some(id) = &id {
            self.scopes
                .declare(&id.name, BindingKind::Class, id.span, true)?;
        }
        let (super_class, body) = self.parse_class_tail()?;
        Ok(ClassDeclaration {
            id,
            super_class,
            body,
            span: self.finish_span(start),
        })
    }

    fn parse_class_expression(&mut self, start: Position) -> Result<Expression, ParseError> {
        self.advance()?;
        let saved_strict = self.ctx.strict;
        self.ctx.strict = true;
        let result = self.class_expression_parts(start);
        self.ctx.strict = saved_strict;
        result
    }

    fn class_expression_parts(&mut self, start: Position) -> Result<Expression, ParseError> {
        // the name of a class expression binds only inside the class
        let id = if matches!(self.current.kind, TokenKind::Identifier(_)) {
            Some(self.parse_binding_identifier()?)
        } else {
            None
        };
        let (super_class, body) = self.parse_class_tail()?;
        Ok(Expression::Class(ClassExpression {
            id,
            super_class,
            body,
            span: self.finish_span(start),
        }))
    }

    fn parse_class_tail(
        &mut self,
    ) -> Result<(Option<Box<Expression>>, ClassBody), ParseError> {
        let super_class = if self.match_token(&TokenKind::Extends)? {
            Some(Box::new(self.parse_left_hand_side_expression(true)?))
        } else {
            None
        };
        let body = self.parse_class_body(super_class.is_some())?;
        Ok((super_class, body))
    }

    fn parse_class_body(&mut self, derived: bool) -> Result<ClassBody, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        let mut seen_constructor = false;
        while !self.check(&TokenKind::RBrace) {
            if self.current.is_eof() {
                return Err(self.unexpected());
            }
            if self.match_token(&TokenKind::Semicolon)? {
                continue;
            }
            body.push(self.parse_class_member(derived, &mut seen_constructor)?);
        }
        self.advance()?;
        Ok(ClassBody {
            body,
            span: self.finish_span(start),
        })
    }

    fn parse_class_member(
        &mut self,
        derived: bool,
        seen_constructor: &mut bool,
    ) -> Result<MethodDefinition, ParseError> {
        let start = self.start();
        let mut is_static = false;
        if self.is_ident("static") {
            let peek = self.peek_token()?;
            // `static() {}` is a method named static
            if peek.kind != TokenKind::LParen {
                is_static = true;
                self.advance()?;
            }
        }
        let (is_async, generator, accessor) = self.parse_method_modifiers()?;
        let (key, computed) = self.parse_property_key()?;
        let static_name = if computed { None } else { key.static_name() };
        let is_constructor =
            !is_static && static_name.as_deref() == Some("constructor");
        if is_constructor {
            if accessor != AccessorHint::None {
                return Err(self.error_at(start, "Class constructor may not be an accessor"));
            }
            if generator {
                return Err(self.error_at(start, "Class constructor may not be a generator"));
            }
            if is_async {
                return Err(self.error_at(start, "Class constructor may not be an async method"));
            }
            if *seen_constructor {
                return Err(self.semantic_at(start, "A class may only have one constructor"));
            }
            *seen_constructor = true;
        }
        if is_static && static_name.as_deref() == Some("prototype") {
            return Err(self.error_at(
                start,
                "Classes may not have a static property named 'prototype'",
            ));
        }
        let (kind, fk) = if is_constructor {
            let fk = if derived {
                FunctionKind::DerivedConstructor
            } else {
                FunctionKind::Constructor
            };
            (MethodKind::Constructor, fk)
        } else {
            match accessor {
                AccessorHint::Get => (MethodKind::Get, FunctionKind::Getter),
                AccessorHint::Set => (MethodKind::Set, FunctionKind::Setter),
                AccessorHint::None => (MethodKind::Method, FunctionKind::Method),
            }
        };
        let value = self.parse_method_function(is_async, generator, fk)?;
        Ok(MethodDefinition {
            key,
            value,
            kind,
            computed,
            is_static,
            span: self.finish_span(start),
        })
    }

    fn parse_method_function(
        &mut self,
        is_async: bool,
        generator: bool,
        kind: FunctionKind,
    ) -> Result<FunctionExpression, ParseError> {
        let start = self.start();
        let (params, body, _) = self.parse_function_rest(is_async, generator, kind)?;
        Ok(FunctionExpression {
            id: None,
            params,
            body,
            generator,
            is_async,
            span: self.finish_span(start),
        })
    }
}

// ============ BINDING PATTERNS ============

impl<'a> Parser<'a> {
    fn parse_binding_pattern(&mut self) -> Result<Pattern, ParseError> {
        self.descend()?;
        let result = match &self.current.kind {
            TokenKind::LBracket => self.parse_array_binding_pattern(),
            TokenKind::LBrace => self.parse_object_binding_pattern(),
            _ => self.parse_binding_identifier().map(Pattern::Identifier),
        };
        self.depth -= 1;
        result
    }

    fn parse_binding_identifier(&mut self) -> Result<Identifier, ParseError> {
        let span = self.current.span;
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                if self.ctx.strict {
                    if is_restricted_name(&name) {
                        return Err(self.semantic_at(
                            span.start,
                            "Unexpected eval or arguments in strict mode",
                        ));
                    }
                    if is_strict_reserved(&name) {
                        return Err(
                            self.error_at(span.start, "Unexpected strict mode reserved word")
                        );
                    }
                }
                self.advance()?;
                Ok(Identifier { name, span })
            }
            TokenKind::Yield => {
                if self.ctx.strict {
                    return Err(self.error_at(span.start, "Unexpected strict mode reserved word"));
                }
                if self.ctx.allow_yield {
                    return Err(self.unexpected());
                }
                self.advance()?;
                Ok(Identifier {
                    name: "yield".to_string(),
                    span,
                })
            }
            TokenKind::Await => {
                if self.ctx.module {
                    return Err(self.error_at(span.start, "Unexpected reserved word 'await'"));
                }
                if self.ctx.allow_await {
                    return Err(self.unexpected());
                }
                self.advance()?;
                Ok(Identifier {
                    name: "await".to_string(),
                    span,
                })
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Binding pattern with an optional default initializer.
    fn parse_binding_element(&mut self) -> Result<Pattern, ParseError> {
        let start = self.start();
        let pattern = self.parse_binding_pattern()?;
        if self.check(&TokenKind::Eq) {
            self.advance()?;
            let saved = self.ctx.allow_in;
            self.ctx.allow_in = true;
            let right = self.isolate(Self::parse_assignment_expression);
            self.ctx.allow_in = saved;
            let right = Box::new(right?);
            return Ok(Pattern::Assignment(AssignmentPattern {
                left: Box::new(pattern),
                right,
                span: self.finish_span(start),
            }));
        }
        Ok(pattern)
    }

    fn parse_array_binding_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.start();
        self.advance()?;
        let mut elements = Vec::new();
        loop {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            if self.check(&TokenKind::Comma) {
                self.advance()?;
                elements.push(None);
                continue;
            }
            if self.check(&TokenKind::DotDotDot) {
                let rest_start = self.start();
                self.advance()?;
                let argument = Box::new(self.parse_binding_pattern()?);
                if self.check(&TokenKind::Eq) {
                    return Err(self.error_at(
                        self.start(),
                        "Rest element may not have a default initializer",
                    ));
                }
                elements.push(Some(Pattern::Rest(RestElement {
                    argument,
                    span: self.finish_span(rest_start),
                })));
                if !self.check(&TokenKind::RBracket) {
                    return Err(
                        self.error_at(self.start(), "Rest element must be last element")
                    );
                }
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if !self.check(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Pattern::Array(ArrayPattern {
            elements,
            span: self.finish_span(start),
        }))
    }

    fn parse_object_binding_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.start();
        self.advance()?;
        let mut properties = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.current.is_eof() {
                return Err(self.unexpected());
            }
            if self.check(&TokenKind::DotDotDot) {
                let rest_start = self.start();
                self.advance()?;
                // object rest binds a plain identifier only
                let id = self.parse_binding_identifier()?;
                properties.push(ObjectPatternProperty::Rest(RestElement {
                    argument: Box::new(Pattern::Identifier(id)),
                    span: self.finish_span(rest_start),
                }));
                if !self.check(&TokenKind::RBrace) {
                    return Err(
                        self.error_at(self.start(), "Rest element must be last element")
                    );
                }
                break;
            }
            properties.push(ObjectPatternProperty::Property(
                self.parse_binding_property()?,
            ));
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Pattern::Object(ObjectPattern {
            properties,
            span: self.finish_span(start),
        }))
    }

    fn parse_binding_property(&mut self) -> Result<PatternProperty, ParseError> {
        let start = self.start();
        let (key, computed) = self.parse_property_key()?;
        if computed || self.check(&TokenKind::Colon) {
            self.expect(&TokenKind::Colon)?;
            let value = Box::new(self.parse_binding_element()?);
            return Ok(PatternProperty {
                key,
                value,
                computed,
                shorthand: false,
                span: self.finish_span(start),
            });
        }
        let PropertyKey::Identifier(id) = &key else {
            return Err(self.error_at(key.span().start, "Unexpected token in binding pattern"));
        };
        let id = id.clone();
        self.check_binding_name(&id)?;
        let value = if self.check(&TokenKind::Eq) {
            self.advance()?;
            let right = Box::new(self.isolate(Self::parse_assignment_expression)?);
            let span = self.finish_span(start);
            Box::new(Pattern::Assignment(AssignmentPattern {
                left: Box::new(Pattern::Identifier(id)),
                right,
                span,
            }))
        } else {
            Box::new(Pattern::Identifier(id))
        };
        Ok(PatternProperty {
            key,
            value,
            computed: false,
            shorthand: true,
            span: self.finish_span(start),
        })
    }

    /// Property keys admit any IdentifierName; a shorthand binding reuses the
    /// key as a binding identifier, which is stricter.
    fn check_binding_name(&self, id: &Identifier) -> Result<(), ParseError> {
        let name = id.name.as_str();
        if is_keyword_spelling(name) {
            let ok = match name {
                "yield" => !self.ctx.strict && !self.ctx.allow_yield,
                "await" => !self.ctx.module && !self.ctx.allow_await,
                _ => false,
            };
            if !ok {
                return Err(self.error_at(id.span.start, format!("Unexpected token '{name}'")));
            }
        } else if self.ctx.strict {
            if is_restricted_name(name) {
                return Err(self.semantic_at(
                    id.span.start,
                    "Unexpected eval or arguments in strict mode",
                ));
            }
            if is_strict_reserved(name) {
                return Err(self.error_at(id.span.start, "Unexpected strict mode reserved word"));
            }
        }
        Ok(())
    }

    // ============ PATTERN REINTERPRETATION ============

    /// Commit an already-parsed expression to destructuring-target duty.
    /// This legitimizes shorthand initializers and duplicate `__proto__`
    /// definitions recorded while the expression was still ambiguous.
    fn reinterpret_expression_as_pattern(
        &mut self,
        expr: Expression,
    ) -> Result<Pattern, ParseError> {
        self.pending_cover_init = None;
        self.pending_proto_dup = None;
        self.expr_to_pattern(expr)
    }

    fn expr_to_pattern(&mut self, expr: Expression) -> Result<Pattern, ParseError> {
        match expr {
            Expression::Identifier(id) => {
                self.check_assignment_name(&id)?;
                Ok(Pattern::Identifier(id))
            }
            Expression::Member(_) => Ok(Pattern::Expression(Box::new(expr))),
            Expression::Array(arr) => {
                let len = arr.elements.len();
                let mut elements = Vec::with_capacity(len);
                for (i, element) in arr.elements.into_iter().enumerate() {
                    match element {
                        None => elements.push(None),
                        Some(Expression::Spread(spread)) => {
                            if i + 1 != len {
                                return Err(self.error_at(
                                    spread.span.start,
                                    "Rest element must be last element",
                                ));
                            }
                            let target = self.expr_to_pattern(*spread.argument)?;
                            if matches!(target, Pattern::Assignment(_)) {
                                return Err(self.error_at(
                                    spread.span.start,
                                    "Rest element may not have a default initializer",
                                ));
                            }
                            elements.push(Some(Pattern::Rest(RestElement {
                                argument: Box::new(target),
                                span: spread.span,
                            })));
                        }
                        Some(element) => elements.push(Some(self.expr_to_pattern(element)?)),
                    }
                }
                Ok(Pattern::Array(ArrayPattern {
                    elements,
                    span: arr.span,
                }))
            }
            Expression::Object(obj) => {
                let len = obj.properties.len();
                let mut properties = Vec::with_capacity(len);
                for (i, property) in obj.properties.into_iter().enumerate() {
                    match property {
                        ObjectProperty::Spread(spread) => {
                            if i + 1 != len {
                                return Err(self.error_at(
                                    spread.span.start,
                                    "Rest element must be last element",
                                ));
                            }
                            let argument = match *spread.argument {
                                Expression::Identifier(id) => {
                                    self.check_assignment_name(&id)?;
                                    Pattern::Identifier(id)
                                }
                                member @ Expression::Member(_) => {
                                    Pattern::Expression(Box::new(member))
                                }
                                other => {
                                    return Err(self.error_at(
                                        other.span().start,
                                        "Invalid destructuring assignment target",
                                    ));
                                }
                            };
                            properties.push(ObjectPatternProperty::Rest(RestElement {
                                argument: Box::new(argument),
                                span: spread.span,
                            }));
                        }
                        ObjectProperty::Property(p) => {
                            if p.method || p.kind != PropertyKind::Init {
                                return Err(self.error_at(
                                    p.span.start,
                                    "Invalid destructuring assignment target",
                                ));
                            }
                            let value = self.expr_to_pattern(p.value)?;
                            properties.push(ObjectPatternProperty::Property(PatternProperty {
                                key: p.key,
                                value: Box::new(value),
                                computed: p.computed,
                                shorthand: p.shorthand,
                                span: p.span,
                            }));
                        }
                    }
                }
                Ok(Pattern::Object(ObjectPattern {
                    properties,
                    span: obj.span,
                }))
            }
            Expression::Assignment(a) if a.operator == AssignOp::Assign => {
                let left = match a.left {
                    AssignTarget::Pattern(p) => *p,
                    AssignTarget::Expression(e) => self.expr_to_pattern(*e)?,
                };
                Ok(Pattern::Assignment(AssignmentPattern {
                    left: Box::new(left),
                    right: a.right,
                    span: a.span,
                }))
            }
            other => Err(self.error_at(
                other.span().start,
                "Invalid destructuring assignment target",
            )),
        }
    }

    // ============ MODULES ============

    fn parse_import_declaration(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        if matches!(self.current.kind, TokenKind::String(_)) {
            // side-effect import
            let source = self.parse_module_source()?;
            self.expect_semicolon()?;
            return Ok(Statement::Import(ImportDeclaration {
                specifiers: Vec::new(),
                source,
                span: self.finish_span(start),
            }));
        }
        let mut specifiers = Vec::new();
        if matches!(
            self.current.kind,
            TokenKind::Identifier(_) | TokenKind::Yield | TokenKind::Await
        ) {
            let spec_start = self.start();
            let local = self.parse_imported_binding()?;
            specifiers.push(ImportSpecifier::Default {
                local,
                span: self.finish_span(spec_start),
            });
            if self.match_token(&TokenKind::Comma)? {
                self.parse_namespace_or_named_imports(&mut specifiers)?;
            }
        } else {
            self.parse_namespace_or_named_imports(&mut specifiers)?;
        }
        self.expect_contextual("from")?;
        let source = self.parse_module_source()?;
        self.expect_semicolon()?;
        Ok(Statement::Import(ImportDeclaration {
            specifiers,
            source,
            span: self.finish_span(start),
        }))
    }

    fn parse_namespace_or_named_imports(
        &mut self,
        specifiers: &mut Vec<ImportSpecifier>,
    ) -> Result<(), ParseError> {
        match &self.current.kind {
            TokenKind::Star => {
                let spec_start = self.start();
                self.advance()?;
                self.expect_contextual("as")?;
                let local = self.parse_imported_binding()?;
                specifiers.push(ImportSpecifier::Namespace {
                    local,
                    span: self.finish_span(spec_start),
                });
                Ok(())
            }
            TokenKind::LBrace => {
                self.advance()?;
                while !self.check(&TokenKind::RBrace) {
                    if self.current.is_eof() {
                        return Err(self.unexpected());
                    }
                    let spec_start = self.start();
                    let imported = self.parse_identifier_name()?;
                    let local = if self.is_ident("as") {
                        self.advance()?;
                        self.parse_imported_binding()?
                    } else {
                        // without `as` the imported name is also the binding
                        self.check_binding_name(&imported)?;
                        self.scopes.declare(
                            &imported.name,
                            BindingKind::Import,
                            imported.span,
                            true,
                        )?;
                        imported.clone()
                    };
                    specifiers.push(ImportSpecifier::Named {
                        local,
                        imported,
                        span: self.finish_span(spec_start),
                    });
                    if !self.check(&TokenKind::RBrace) {
                        self.expect(&TokenKind::Comma)?;
                    }
                }
                self.advance()?;
                Ok(())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_imported_binding(&mut self) -> Result<Identifier, ParseError> {
        let id = self.parse_binding_identifier()?;
        self.scopes
            .declare(&id.name, BindingKind::Import, id.span, true)?;
        Ok(id)
    }

    fn parse_module_source(&mut self) -> Result<Literal, ParseError> {
        let TokenKind::String(s) = &self.current.kind else {
            return Err(self.unexpected());
        };
        let span = self.current.span;
        let literal = Literal {
            value: LiteralValue::String(s.clone()),
            raw: self.raw_of(span),
            span,
        };
        self.advance()?;
        Ok(literal)
    }

    fn expect_contextual(&mut self, word: &str) -> Result<(), ParseError> {
        if self.is_ident(word) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_export_declaration(&mut self) -> Result<Statement, ParseError> {
        let start = self.start();
        self.advance()?;
        match &self.current.kind {
            TokenKind::Star => {
                self.advance()?;
                self.expect_contextual("from")?;
                let source = self.parse_module_source()?;
                self.expect_semicolon()?;
                Ok(Statement::ExportAll(ExportAllDeclaration {
                    source,
                    span: self.finish_span(start),
                }))
            }
            TokenKind::Default => {
                self.advance()?;
                let declaration = self.parse_export_default_kind()?;
                self.register_export("default", Span::new(start, self.previous.span.end));
                Ok(Statement::ExportDefault(ExportDefaultDeclaration {
                    declaration,
                    span: self.finish_span(start),
                }))
            }
            TokenKind::LBrace => {
                let specifiers = self.parse_export_specifiers()?;
                let source = if self.is_ident("from") {
                    self.advance()?;
                    Some(self.parse_module_source()?)
                } else {
                    None
                };
                self.expect_semicolon()?;
                if source.is_none() {
                    // local names must be references into module scope, so
                    // reserved spellings are out
                    for spec in &specifiers {
                        if is_keyword_spelling(&spec.local.name) {
                            return Err(self.error_at(
                                spec.local.span.start,
                                format!("Unexpected token '{}'", spec.local.name),
                            ));
                        }
                    }
                }
                for spec in &specifiers {
                    self.register_export(&spec.exported.name, spec.span);
                }
                Ok(Statement::ExportNamed(ExportNamedDeclaration {
                    declaration: None,
                    specifiers,
                    source,
                    span: self.finish_span(start),
                }))
            }
            _ => {
                let declaration = self.parse_exported_declaration()?;
                let mut names: Vec<(String, Span)> = Vec::new();
                match &declaration {
                    Statement::VariableDeclaration(d) => {
                        for declarator in &d.declarations {
                            collect_bound_names(&declarator.id, &mut names);
                        }
                    }
                    Statement::FunctionDeclaration(f) => {
                        if let Some(id) = &f.id {
                            names.push((id.name.clone(), id.span));
                        }
                    }
                    Statement::ClassDeclaration(c) => {
                        if let Some(id) = &c.id {
                            names.push((id.name.clone(), id.span));
                        }
                    }
                    _ => {}
                }
                for (name, span) in names {
                    self.register_export(&name, span);
                }
                Ok(Statement::ExportNamed(ExportNamedDeclaration {
                    declaration: Some(Box::new(declaration)),
                    specifiers: Vec::new(),
                    source: None,
                    span: self.finish_span(start),
                }))
            }
        }
    }

    fn parse_export_default_kind(&mut self) -> Result<ExportDefaultKind, ParseError> {
        match &self.current.kind {
            TokenKind::Function => Ok(ExportDefaultKind::Function(
                self.parse_function_declaration_inner(false, true)?,
            )),
            TokenKind::Class => Ok(ExportDefaultKind::Class(
                self.parse_class_declaration_inner(true)?,
            )),
            TokenKind::Identifier(name) if name == "async" && !self.current.had_escape => {
                let peek = self.peek_token()?;
                if peek.kind == TokenKind::Function && !peek.newline_before {
                    Ok(ExportDefaultKind::Function(
                        self.parse_function_declaration_inner(true, true)?,
                    ))
                } else {
                    let expr = self.isolate(Self::parse_assignment_expression)?;
                    self.expect_semicolon()?;
                    Ok(ExportDefaultKind::Expression(expr))
                }
            }
            _ => {
                let expr = self.isolate(Self::parse_assignment_expression)?;
                self.expect_semicolon()?;
                Ok(ExportDefaultKind::Expression(expr))
            }
        }
    }

    fn parse_exported_declaration(&mut self) -> Result<Statement, ParseError> {
        match &self.current.kind {
            TokenKind::Var => self.parse_declaration_statement(VariableKind::Var),
            TokenKind::Const => self.parse_declaration_statement(VariableKind::Const),
            TokenKind::Function => self.parse_function_declaration(false),
            TokenKind::Class => self.parse_class_declaration(false),
            TokenKind::Identifier(name) if name == "let" && !self.current.had_escape => {
                self.parse_declaration_statement(VariableKind::Let)
            }
            TokenKind::Identifier(name) if name == "async" && !self.current.had_escape => {
                let peek = self.peek_token()?;
                if peek.kind == TokenKind::Function && !peek.newline_before {
                    self.parse_function_declaration(true)
                } else {
                    Err(self.unexpected())
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_export_specifiers(&mut self) -> Result<Vec<ExportSpecifier>, ParseError> {
        self.advance()?;
        let mut specifiers = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.current.is_eof() {
                return Err(self.unexpected());
            }
            let spec_start = self.start();
            let local = self.parse_identifier_name()?;
            let exported = if self.is_ident("as") {
                self.advance()?;
                self.parse_identifier_name()?
            } else {
                local.clone()
            };
            specifiers.push(ExportSpecifier {
                local,
                exported,
                span: self.finish_span(spec_start),
            });
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.advance()?;
        Ok(specifiers)
    }

    fn register_export(&mut self, name: &str, span: Span) {
        self.exports.entry(name.to_string()).or_default().push(span);
    }

    /// Exported names must be unique across the whole module; checked once
    /// at the end so every form of export participates.
    fn finalize_exports(&self) -> Result<(), ParseError> {
        for (name, spans) in &self.exports {
            if spans.len() > 1 {
                if let Some(span) = spans.get(1) {
                    return Err(self.semantic_at(
                        span.start,
                        format!("Duplicate export of '{name}'"),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program, ParseError> {
        Parser::new(source, &ParseOptions::default()).parse_program()
    }

    fn parse_module(source: &str) -> Result<Program, ParseError> {
        let options = ParseOptions {
            module: true,
            ..ParseOptions::default()
        };
        Parser::new(source, &options).parse_program()
    }

    fn error_message(source: &str) -> String {
        parse(source).unwrap_err().message().to_string()
    }

    #[test]
    fn empty_program() {
        let program = parse("").unwrap();
        assert!(program.body.is_empty());
        assert_eq!(program.source_type, SourceType::Script);
    }

    #[test]
    fn directive_prologue_detects_use_strict() {
        let err = parse("'use strict'; with (x) {}").unwrap_err();
        assert_eq!(
            err.message(),
            "Strict mode code may not include a with statement"
        );
        // a parenthesized string is not a directive
        assert!(parse("('use strict'); with (x) {}").is_ok());
    }

    #[test]
    fn asi_splits_postfix_across_newline() {
        let program = parse("x\n++y").unwrap();
        assert_eq!(program.body.len(), 2);
        let Some(Statement::Expression(second)) = program.body.get(1) else {
            panic!("expected expression statement");
        };
        assert!(matches!(second.expression, Expression::Update(_)));
    }

    #[test]
    fn asi_requires_statement_break() {
        assert!(parse("x y").is_err());
        assert!(parse("x; y").is_ok());
        assert!(parse("x\ny").is_ok());
    }

    #[test]
    fn exponent_is_right_associative() {
        let program = parse("a ** b ** c;").unwrap();
        let Some(Statement::Expression(stmt)) = program.body.first() else {
            panic!("expected expression statement");
        };
        let Expression::Binary(outer) = &stmt.expression else {
            panic!("expected binary expression");
        };
        assert_eq!(outer.operator, BinaryOp::Exp);
        assert!(matches!(*outer.right, Expression::Binary(_)));
        assert!(matches!(*outer.left, Expression::Identifier(_)));
    }

    #[test]
    fn unary_under_exponent_requires_parens() {
        assert!(parse("-a ** b").is_err());
        assert!(parse("(-a) ** b").is_ok());
        assert!(parse("a ** -b").is_ok());
    }

    #[test]
    fn in_operator_excluded_from_for_init() {
        let program = parse("for (a in b ;;);").unwrap_err();
        // `in` cannot appear in the init, so this parses as for-in and the
        // stray semicolon is the error
        assert!(program.message().starts_with("Unexpected"));
        assert!(parse("for (var a = (b in c);;);").is_ok());
    }

    #[test]
    fn arrow_parameter_cover_grammar() {
        assert!(parse("(a, b) => a + b;").is_ok());
        assert!(parse("(a, ...rest) => rest;").is_ok());
        assert!(parse("({a = 1}) => a;").is_ok());
        // same text without the arrow is a plain parenthesized sequence
        assert!(parse("(a, b);").is_ok());
        assert_eq!(
            error_message("({a = 1});"),
            "Shorthand property assignments are valid only in destructuring patterns"
        );
    }

    #[test]
    fn arrow_needs_same_line_token() {
        assert!(parse("(a, b)\n=> a").is_err());
    }

    #[test]
    fn async_arrows_and_calls() {
        assert!(parse("async (a) => a;").is_ok());
        assert!(parse("async a => a;").is_ok());
        // without the arrow, `async(a)` is a call
        let program = parse("async(a);").unwrap();
        let Some(Statement::Expression(stmt)) = program.body.first() else {
            panic!("expected expression statement");
        };
        assert!(matches!(stmt.expression, Expression::Call(_)));
    }

    #[test]
    fn async_generators_rejected() {
        assert_eq!(
            error_message("async function* f() {}"),
            "Async generators are not supported"
        );
        assert_eq!(
            error_message("({ async *m() {} });"),
            "Async generators are not supported"
        );
    }

    #[test]
    fn duplicate_proto_in_object_literal() {
        assert_eq!(
            error_message("({ __proto__: 1, __proto__: 2 });"),
            "Duplicate __proto__ fields are not allowed in object literals"
        );
        // fine as a destructuring pattern
        assert!(parse("({ __proto__: a, __proto__: b } = c);").is_ok());
        // computed and shorthand keys do not count
        assert!(parse("({ __proto__: 1, ['__proto__']: 2 });").is_ok());
        assert!(parse("var __proto__; ({ __proto__: 1, __proto__ });").is_ok());
    }

    #[test]
    fn destructuring_assignment_targets() {
        assert!(parse("[a, b] = c;").is_ok());
        assert!(parse("({a, b: [x]} = c);").is_ok());
        assert!(parse("[a.b] = c;").is_ok());
        assert_eq!(
            error_message("[a + 1] = c;"),
            "Invalid destructuring assignment target"
        );
        assert_eq!(
            error_message("({ m() {} } = c);"),
            "Invalid destructuring assignment target"
        );
    }

    #[test]
    fn rest_element_must_be_last() {
        assert_eq!(
            error_message("[...a, b] = c;"),
            "Rest element must be last element"
        );
        assert_eq!(
            error_message("function f(...a, b) {}"),
            "Rest parameter must be last formal parameter"
        );
    }

    #[test]
    fn compound_assignment_needs_simple_target() {
        assert!(parse("a += 1;").is_ok());
        assert!(parse("a.b += 1;").is_ok());
        assert!(parse("[a] = b;").is_ok());
        assert_eq!(
            error_message("[a] += b;"),
            "Invalid left-hand side in assignment"
        );
    }

    #[test]
    fn strict_mode_restrictions() {
        assert_eq!(
            error_message("'use strict'; var eval = 1;"),
            "Unexpected eval or arguments in strict mode"
        );
        assert_eq!(
            error_message("'use strict'; 010;"),
            "Octal literals are not allowed in strict mode"
        );
        assert_eq!(
            error_message("'use strict'; '\\01';"),
            "Octal escape sequences are not allowed in strict mode"
        );
        assert_eq!(
            error_message("'use strict'; delete x;"),
            "Delete of an unqualified identifier in strict mode"
        );
        assert_eq!(
            error_message("'use strict'; function f(a, a) {}"),
            "Duplicate parameter name not allowed in this context"
        );
        // sloppy code allows all of these
        assert!(parse("var eval = 1; 010; delete x; function f(a, a) {}").is_ok());
    }

    #[test]
    fn use_strict_with_non_simple_params() {
        assert_eq!(
            error_message("function f(a = 1) { 'use strict'; }"),
            "Illegal 'use strict' directive in function with non-simple parameter list"
        );
        assert!(parse("function f(a) { 'use strict'; }").is_ok());
    }

    #[test]
    fn retroactive_strict_function_name() {
        assert_eq!(
            error_message("function eval() { 'use strict'; }"),
            "Unexpected eval or arguments in strict mode"
        );
    }

    #[test]
    fn labels_and_jumps() {
        assert!(parse("loop: for (;;) { break loop; }").is_ok());
        assert!(parse("loop: for (;;) { continue loop; }").is_ok());
        assert_eq!(error_message("break;"), "Illegal break statement");
        assert_eq!(error_message("continue;"), "Illegal continue statement");
        assert_eq!(
            error_message("x: { continue x; }"),
            "Illegal continue statement: 'x' does not denote an iteration statement"
        );
        assert_eq!(error_message("for (;;) break x;"), "Undefined label 'x'");
        assert_eq!(
            error_message("x: x: ;"),
            "Label 'x' has already been declared"
        );
    }

    #[test]
    fn return_outside_function() {
        assert_eq!(error_message("return 1;"), "Illegal return statement");
        assert!(parse("function f() { return 1; }").is_ok());
    }

    #[test]
    fn for_in_of_heads() {
        assert!(parse("for (var a in b);").is_ok());
        assert!(parse("for (let [a, b] of c);").is_ok());
        assert!(parse("for (a.b of c);").is_ok());
        assert_eq!(
            error_message("for (var a = 1 in b);"),
            "for-in loop variable declaration may not have an initializer"
        );
        assert_eq!(
            error_message("for (let a = 1 of b);"),
            "for-of loop variable declaration may not have an initializer"
        );
        assert_eq!(
            error_message("for (var a, b in c);"),
            "Invalid left-hand side in for-in loop: must be a single binding"
        );
        assert_eq!(
            error_message("for (a + 1 in b);"),
            "Invalid left-hand side in for-in loop"
        );
    }

    #[test]
    fn lexical_declarations() {
        assert_eq!(
            error_message("const a;"),
            "Missing initializer in const declaration"
        );
        assert_eq!(
            error_message("let [a];"),
            "Missing initializer in destructuring declaration"
        );
        assert_eq!(
            error_message("let let = 1;"),
            "let is disallowed as a lexically bound name"
        );
        assert_eq!(
            error_message("let a; var a;"),
            "Identifier 'a' has already been declared"
        );
        // `let` is still a valid identifier in sloppy mode
        assert!(parse("let = 1; let(x);").is_ok());
    }

    #[test]
    fn yield_inside_generator_only() {
        assert!(parse("function* g() { yield 1; yield* a; yield; }").is_ok());
        // sloppy non-generator: yield is an identifier
        assert!(parse("var yield = 1; yield;").is_ok());
        assert_eq!(
            error_message("function* g(a = yield) {}"),
            "Yield expression not allowed in formal parameter"
        );
    }

    #[test]
    fn await_inside_async_only() {
        assert!(parse("async function f() { await x; }").is_ok());
        // await is an identifier in sloppy scripts
        assert!(parse("var await = 1;").is_ok());
        assert_eq!(
            error_message("async function f(a = await x) {}"),
            "Await expression not allowed in formal parameter"
        );
    }

    #[test]
    fn new_target_and_nested_new() {
        assert!(parse("function f() { new.target; }").is_ok());
        assert_eq!(
            error_message("new.target;"),
            "new.target expression is not allowed here"
        );
        let program = parse("new new a();").unwrap();
        let Some(Statement::Expression(stmt)) = program.body.first() else {
            panic!("expected expression statement");
        };
        let Expression::New(outer) = &stmt.expression else {
            panic!("expected new expression");
        };
        assert!(matches!(*outer.callee, Expression::New(_)));
    }

    #[test]
    fn super_placement() {
        assert!(parse("class A extends B { constructor() { super(); } }").is_ok());
        assert!(parse("class A { m() { super.x; } }").is_ok());
        assert_eq!(
            error_message("class A { constructor() { super(); } }"),
            "'super' call is only allowed in a derived class constructor"
        );
        assert_eq!(
            error_message("function f() { super.x; }"),
            "'super' keyword is only allowed in methods"
        );
    }

    #[test]
    fn class_constructor_rules() {
        assert_eq!(
            error_message("class A { constructor() {} constructor() {} }"),
            "A class may only have one constructor"
        );
        assert_eq!(
            error_message("class A { get constructor() {} }"),
            "Class constructor may not be an accessor"
        );
        assert_eq!(
            error_message("class A { *constructor() {} }"),
            "Class constructor may not be a generator"
        );
        assert_eq!(
            error_message("class A { static prototype() {} }"),
            "Classes may not have a static property named 'prototype'"
        );
        // `static` itself can name a method
        assert!(parse("class A { static() {} static static() {} }").is_ok());
    }

    #[test]
    fn class_bodies_are_strict() {
        assert_eq!(
            error_message("class A { m() { with (x) {} } }"),
            "Strict mode code may not include a with statement"
        );
    }

    #[test]
    fn getters_and_setters() {
        assert!(parse("({ get x() { return 1; }, set x(v) {} });").is_ok());
        assert_eq!(
            error_message("({ get x(a) {} });"),
            "Getter must not have any formal parameters"
        );
        assert_eq!(
            error_message("({ set x() {} });"),
            "Setter must have exactly one formal parameter"
        );
        assert_eq!(
            error_message("({ set x(...v) {} });"),
            "Setter function argument must not be a rest parameter"
        );
        // get/set as plain property names
        assert!(parse("({ get: 1, set: 2 });").is_ok());
    }

    #[test]
    fn template_literals() {
        assert!(parse("`plain`;").is_ok());
        assert!(parse("`a${b}c${`nested${d}`}e`;").is_ok());
        assert!(parse("tag`a${b}c`;").is_ok());
        // bad escapes survive only under a tag
        assert!(parse("tag`\\unicode`;").is_ok());
        assert_eq!(
            error_message("`\\unicode`;"),
            "Invalid escape sequence in template literal"
        );
    }

    #[test]
    fn regex_vs_division() {
        let program = parse("a / b; /regex/g;").unwrap();
        let Some(Statement::Expression(first)) = program.body.first() else {
            panic!("expected expression statement");
        };
        assert!(matches!(first.expression, Expression::Binary(_)));
        let Some(Statement::Expression(second)) = program.body.get(1) else {
            panic!("expected expression statement");
        };
        assert!(matches!(
            second.expression,
            Expression::Literal(Literal {
                value: LiteralValue::RegExp { .. },
                ..
            })
        ));
    }

    #[test]
    fn annex_b_function_in_if_body() {
        assert!(parse("if (a) function f() {}").is_ok());
        assert_eq!(
            error_message("'use strict'; if (a) function f() {}"),
            "Function declarations cannot appear in single-statement position"
        );
    }

    #[test]
    fn catch_scope_rules() {
        assert!(parse("try {} catch (e) { var e; }").is_ok());
        assert_eq!(
            error_message("try {} catch (e) { let e; }"),
            "Identifier 'e' has already been declared"
        );
        assert_eq!(
            error_message("try {} catch ([e, e]) {}"),
            "Identifier 'e' has already been declared"
        );
        assert_eq!(error_message("try {}"), "Missing catch or finally after try");
    }

    #[test]
    fn switch_single_default() {
        assert_eq!(
            error_message("switch (a) { default: default: }"),
            "More than one default clause in switch statement"
        );
    }

    #[test]
    fn newline_after_throw() {
        assert_eq!(error_message("throw\n1;"), "Illegal newline after throw");
        assert!(parse("throw 1;").is_ok());
    }

    #[test]
    fn module_items() {
        assert!(parse_module("import a, { b as c, d } from 'm'; export { d };").is_ok());
        assert!(parse_module("import * as ns from 'm';").is_ok());
        assert!(parse_module("export default function () {}").is_ok());
        assert!(parse_module("export * from 'm';").is_ok());
        assert!(parse_module("import.meta.url;").is_ok());
        assert_eq!(
            parse("import.meta;").unwrap_err().message(),
            "Cannot use 'import.meta' outside a module"
        );
        assert_eq!(
            parse("import a from 'm';").unwrap_err().message(),
            "'import' and 'export' may only appear at the top level of a module"
        );
    }

    #[test]
    fn duplicate_exports() {
        let err = parse_module("export var a; export { a };").unwrap_err();
        assert_eq!(err.message(), "Duplicate export of 'a'");
        let err = parse_module("export default 1;\nexport { b as default };").unwrap_err();
        assert_eq!(err.message(), "Duplicate export of 'default'");
    }

    #[test]
    fn duplicate_import_bindings() {
        let err = parse_module("import { a } from 'm'; import { a } from 'n';").unwrap_err();
        assert_eq!(err.message(), "Identifier 'a' has already been declared");
    }

    #[test]
    fn modules_are_strict() {
        assert_eq!(
            parse_module("with (x) {}").unwrap_err().message(),
            "Strict mode code may not include a with statement"
        );
        assert_eq!(
            parse_module("var await = 1;").unwrap_err().message(),
            "Unexpected reserved word 'await'"
        );
    }

    #[test]
    fn depth_guard_trips_on_deep_nesting() {
        let source = format!("{}1{}", "(".repeat(2000), ")".repeat(2000));
        let err = parse(&source).unwrap_err();
        assert!(matches!(err, ParseError::DepthExceeded { .. }));
    }

    #[test]
    fn spans_cover_statements() {
        let program = parse("var a = 1;").unwrap();
        let Some(stmt) = program.body.first() else {
            panic!("expected a statement");
        };
        assert_eq!(stmt.span().start.index, 0);
        assert_eq!(stmt.span().end.index, 10);
        assert_eq!(program.span.end.index, 10);
    }

    #[test]
    fn sequence_and_conditional() {
        let program = parse("a, b ? c : d, e;").unwrap();
        let Some(Statement::Expression(stmt)) = program.body.first() else {
            panic!("expected expression statement");
        };
        let Expression::Sequence(seq) = &stmt.expression else {
            panic!("expected sequence");
        };
        assert_eq!(seq.expressions.len(), 3);
        assert!(matches!(seq.expressions.get(1), Some(Expression::Conditional(_))));
    }
}
