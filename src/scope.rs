//! Scope and binding tracking
//!
//! A transient stack of scope frames owned by the parser, used only to
//! detect duplicate-binding and scoping-rule violations while the syntactic
//! region is being parsed. Frames are discarded as their region closes; the
//! AST never sees any of this.

use rustc_hash::FxHashMap;

use crate::error::{ErrorLocation, ParseError};
use crate::lexer::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Script,
    Module,
    Function,
    Block,
    /// Catch clause: covers both the parameter and the handler body, so a
    /// lexical declaration in the body collides with the parameter.
    Catch,
}

impl ScopeKind {
    /// `var` declarations hoist up to the nearest of these.
    fn is_var_boundary(self) -> bool {
        matches!(
            self,
            ScopeKind::Script | ScopeKind::Module | ScopeKind::Function
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Lexical,
    Function,
    Class,
    Parameter,
    CatchParam,
    Import,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    kind: BindingKind,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    bindings: FxHashMap<String, Binding>,
    /// For catch scopes: the parameter is a plain identifier, enabling the
    /// Annex B `catch (e) { var e }` relaxation.
    simple_catch: bool,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            bindings: FxHashMap::default(),
            simple_catch: false,
        }
    }
}

/// Stack of scope frames, innermost last.
pub struct ScopeStack {
    scopes: Vec<Scope>,
    web_compat: bool,
}

impl ScopeStack {
    pub fn new(root: ScopeKind, web_compat: bool) -> Self {
        Self {
            scopes: vec![Scope::new(root)],
            web_compat,
        }
    }

    pub fn enter(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope::new(kind));
    }

    pub fn enter_catch(&mut self, simple_param: bool) {
        let mut scope = Scope::new(ScopeKind::Catch);
        scope.simple_catch = simple_param;
        self.scopes.push(scope);
    }

    pub fn exit(&mut self) {
        // The root frame stays; productions only pop what they pushed.
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare a name in the appropriate scope, raising the duplicate-binding
    /// and collision errors the grammar's static semantics require.
    pub fn declare(
        &mut self,
        name: &str,
        kind: BindingKind,
        span: Span,
        strict: bool,
    ) -> Result<(), ParseError> {
        match kind {
            BindingKind::Var => self.declare_var(name, span, strict),
            BindingKind::Parameter | BindingKind::CatchParam => {
                // Duplicate parameters have their own mode-dependent rule,
                // validated by the parser once strictness is known.
                self.insert_current(name, kind);
                Ok(())
            }
            BindingKind::Function => self.declare_function(name, span, strict),
            BindingKind::Lexical | BindingKind::Class | BindingKind::Import => {
                self.declare_lexical(name, kind, span)
            }
        }
    }

    /// `var` hoists through block scopes up to the nearest function-like
    /// frame; any lexical binding on the way up is a collision.
    fn declare_var(&mut self, name: &str, span: Span, strict: bool) -> Result<(), ParseError> {
        let web_compat = self.web_compat && !strict;
        let mut boundary = None;
        for (i, scope) in self.scopes.iter().enumerate().rev() {
            if let Some(existing) = scope.bindings.get(name) {
                match existing.kind {
                    BindingKind::Lexical | BindingKind::Class | BindingKind::Import => {
                        return Err(redeclaration(name, span));
                    }
                    BindingKind::Function if !scope.kind.is_var_boundary() => {
                        // Annex B: a block-level function declaration behaves
                        // var-like in sloppy code and may coexist with var.
                        if !web_compat {
                            return Err(redeclaration(name, span));
                        }
                    }
                    BindingKind::CatchParam => {
                        // Annex B allows `catch (e) { var e }` for simple
                        // catch parameters only.
                        if !(web_compat && scope.simple_catch) {
                            return Err(redeclaration(name, span));
                        }
                    }
                    BindingKind::Var | BindingKind::Parameter | BindingKind::Function => {}
                }
            }
            if scope.kind.is_var_boundary() {
                boundary = Some(i);
                break;
            }
        }
        if let Some(i) = boundary {
            if let Some(scope) = self.scopes.get_mut(i) {
                scope
                    .bindings
                    .entry(name.to_string())
                    .or_insert(Binding { kind: BindingKind::Var });
            }
        }
        Ok(())
    }

    /// Function declarations are var-like at the top level of a function,
    /// script or module, and lexical-like inside blocks.
    fn declare_function(&mut self, name: &str, span: Span, strict: bool) -> Result<(), ParseError> {
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };
        let at_boundary = scope.kind.is_var_boundary();
        if let Some(existing) = scope.bindings.get(name) {
            let allowed = match existing.kind {
                BindingKind::Function | BindingKind::Var | BindingKind::Parameter => {
                    at_boundary && !strict
                }
                _ => false,
            };
            if !allowed {
                return Err(redeclaration(name, span));
            }
        }
        scope.bindings.insert(
            name.to_string(),
            Binding {
                kind: BindingKind::Function,
            },
        );
        Ok(())
    }

    /// `let`/`const`/`class`/imports collide with any other binding in the
    /// same frame.
    fn declare_lexical(
        &mut self,
        name: &str,
        kind: BindingKind,
        span: Span,
    ) -> Result<(), ParseError> {
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };
        if scope.bindings.contains_key(name) {
            return Err(redeclaration(name, span));
        }
        scope.bindings.insert(name.to_string(), Binding { kind });
        Ok(())
    }

    fn insert_current(&mut self, name: &str, kind: BindingKind) {
        if let Some(scope) = self.scopes.last_mut() {
            // First declaration wins; later duplicates are handled by the
            // parameter-list validator.
            scope
                .bindings
                .entry(name.to_string())
                .or_insert(Binding { kind });
        }
    }
}

fn redeclaration(name: &str, span: Span) -> ParseError {
    ParseError::semantic(
        format!("Identifier '{name}' has already been declared"),
        ErrorLocation {
            index: span.start.index,
            line: span.start.line,
            column: span.start.column,
        },
    )
}
