//! ECMAScript parser producing ESTree-compatible syntax trees
//!
//! # Example
//!
//! ```
//! use esparse::{ParseOptions, estree};
//!
//! let program = esparse::parse_script("const answer = 40 + 2;").unwrap();
//! assert_eq!(program.body.len(), 1);
//!
//! let json = estree::to_json(&program, &ParseOptions::default());
//! assert_eq!(json["body"][0]["type"], "VariableDeclaration");
//! ```

pub mod ast;
pub mod error;
pub mod estree;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod unicode;

pub use ast::Program;
pub use error::ErrorLocation;
pub use error::ParseError;
pub use lexer::Lexer;
pub use lexer::Position;
pub use lexer::Span;
pub use lexer::Token;
pub use lexer::TokenKind;
pub use parser::Parser;

use serde::{Deserialize, Serialize};

/// Parser configuration.
///
/// The defaults parse sloppy-mode scripts with raw literal text retained and
/// the Annex B web-compatibility grammar enabled, without positional
/// metadata in the serialized output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Parse as a module: strict mode, import/export, top-level `await`
    /// reserved.
    pub module: bool,
    /// Force strict mode even without a `"use strict"` directive.
    pub strict: bool,
    /// Attach `range` (byte offsets) to serialized nodes.
    pub ranges: bool,
    /// Attach `loc` (line/column pairs) to serialized nodes.
    pub loc: bool,
    /// Keep the raw source text of literals.
    pub raw: bool,
    /// Annex B extensions: labelled functions, function statements in
    /// sloppy single-statement positions, `catch (e) { var e }`.
    pub web_compat: bool,
    /// Recursion limit for nested constructs, counted at every
    /// self-recursive grammar entry point.
    pub max_depth: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            module: false,
            strict: false,
            ranges: false,
            loc: false,
            raw: true,
            web_compat: true,
            max_depth: 256,
        }
    }
}

/// Parse `source` with the given options.
pub fn parse(source: &str, options: &ParseOptions) -> Result<Program, ParseError> {
    Parser::new(source, options).parse_program()
}

/// Parse `source` as a sloppy-mode script with default options.
pub fn parse_script(source: &str) -> Result<Program, ParseError> {
    parse(source, &ParseOptions::default())
}

/// Parse `source` as a module.
pub fn parse_module(source: &str) -> Result<Program, ParseError> {
    let options = ParseOptions {
        module: true,
        ..ParseOptions::default()
    };
    parse(source, &options)
}
