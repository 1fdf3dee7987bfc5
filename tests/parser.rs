//! Tests for the parser
//!
//! AST-shape assertions over complete programs: operator precedence,
//! automatic semicolon insertion, cover-grammar disambiguation and the
//! ES2017 feature surface.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use esparse::ast::*;
use esparse::{ParseError, parse_module, parse_script};

#[allow(clippy::expect_used)]
fn body(source: &str) -> Vec<Statement> {
    parse_script(source).expect("parse failed").body
}

fn first_expression(source: &str) -> Expression {
    let mut statements = body(source);
    match statements.remove(0) {
        Statement::Expression(s) => s.expression,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn test_precedence_mixes_logical_and_arithmetic() {
    // a + b * c || d && e
    let Expression::Logical(or) = first_expression("a + b * c || d && e;") else {
        panic!("expected ||");
    };
    assert_eq!(or.operator, LogicalOp::Or);
    let Expression::Binary(add) = *or.left else {
        panic!("expected + on the left");
    };
    assert_eq!(add.operator, BinaryOp::Add);
    assert!(matches!(
        *add.right,
        Expression::Binary(BinaryExpression {
            operator: BinaryOp::Mul,
            ..
        })
    ));
    let Expression::Logical(and) = *or.right else {
        panic!("expected && on the right");
    };
    assert_eq!(and.operator, LogicalOp::And);
}

#[test]
fn test_assignment_is_right_associative() {
    let Expression::Assignment(outer) = first_expression("a = b = c;") else {
        panic!("expected assignment");
    };
    assert!(matches!(*outer.right, Expression::Assignment(_)));
}

#[test]
fn test_member_call_chain() {
    let Expression::Call(call) = first_expression("a.b[c](d, ...e);") else {
        panic!("expected call");
    };
    assert_eq!(call.arguments.len(), 2);
    assert!(matches!(
        call.arguments.last(),
        Some(Expression::Spread(_))
    ));
    let Expression::Member(computed) = *call.callee else {
        panic!("expected member callee");
    };
    assert!(computed.computed);
    let Expression::Member(dot) = *computed.object else {
        panic!("expected inner member");
    };
    assert!(!dot.computed);
}

#[test]
fn test_keywords_allowed_as_member_properties() {
    let Expression::Member(member) = first_expression("a.if;") else {
        panic!("expected member");
    };
    let Expression::Identifier(prop) = *member.property else {
        panic!("expected identifier property");
    };
    assert_eq!(prop.name, "if");
}

#[test]
fn test_asi_at_end_of_input_and_before_brace() {
    assert!(parse_script("a = 1").is_ok());
    assert!(parse_script("{ a = 1 }").is_ok());
    assert!(parse_script("do a; while (b)").is_ok());
}

#[test]
fn test_asi_restricted_productions() {
    // return stops at the newline
    let statements = body("function f() { return\n1; }");
    let Some(Statement::FunctionDeclaration(f)) = statements.first() else {
        panic!("expected function");
    };
    let Some(Statement::Return(ret)) = f.body.body.first() else {
        panic!("expected return");
    };
    assert!(ret.argument.is_none());
}

#[test]
fn test_object_literal_forms() {
    let Expression::Object(object) =
        first_expression("({ a, b: 1, 'c': 2, 3: 4, [k]: 5, m() {}, *g() {}, async h() {} });")
    else {
        panic!("expected object");
    };
    assert_eq!(object.properties.len(), 8);
    let ObjectProperty::Property(shorthand) = &object.properties[0] else {
        panic!("expected property");
    };
    assert!(shorthand.shorthand);
    let ObjectProperty::Property(computed) = &object.properties[4] else {
        panic!("expected property");
    };
    assert!(computed.computed);
    let ObjectProperty::Property(method) = &object.properties[5] else {
        panic!("expected property");
    };
    assert!(method.method);
}

#[test]
fn test_object_spread() {
    let Expression::Object(object) = first_expression("({ ...rest, a: 1 });") else {
        panic!("expected object");
    };
    assert!(matches!(object.properties.first(), Some(ObjectProperty::Spread(_))));
}

#[test]
fn test_array_holes() {
    let Expression::Array(array) = first_expression("[, a, , b, ];") else {
        panic!("expected array");
    };
    // leading hole, a, hole, b; the trailing comma is not an elision
    assert_eq!(array.elements.len(), 4);
    assert!(array.elements[0].is_none());
    assert!(array.elements[2].is_none());
    assert!(array.elements[3].is_some());
}

#[test]
fn test_arrow_bodies() {
    let Expression::Arrow(concise) = first_expression("x => x * 2;") else {
        panic!("expected arrow");
    };
    assert!(matches!(concise.body, ArrowBody::Expression(_)));
    let Expression::Arrow(block) = first_expression("(x, y) => { return x; };") else {
        panic!("expected arrow");
    };
    assert!(matches!(block.body, ArrowBody::Block(_)));
    assert_eq!(block.params.len(), 2);
}

#[test]
fn test_nested_arrows() {
    let Expression::Arrow(outer) = first_expression("a => b => a + b;") else {
        panic!("expected arrow");
    };
    let ArrowBody::Expression(inner) = outer.body else {
        panic!("expected expression body");
    };
    assert!(matches!(*inner, Expression::Arrow(_)));
}

#[test]
fn test_conditional_vs_arrow_ambiguity() {
    // `a ? b : c => d` keeps the arrow inside the alternate
    let Expression::Conditional(cond) = first_expression("a ? b : c => d;") else {
        panic!("expected conditional");
    };
    assert!(matches!(*cond.alternate, Expression::Arrow(_)));
}

#[test]
fn test_generator_declaration_and_yield_delegate() {
    let statements = body("function* g() { yield* inner(); }");
    let Some(Statement::FunctionDeclaration(g)) = statements.first() else {
        panic!("expected function");
    };
    assert!(g.generator);
    let Some(Statement::Expression(stmt)) = g.body.body.first() else {
        panic!("expected expression statement");
    };
    let Expression::Yield(y) = &stmt.expression else {
        panic!("expected yield");
    };
    assert!(y.delegate);
}

#[test]
fn test_async_function_and_await() {
    let statements = body("async function f(x) { return await g(x); }");
    let Some(Statement::FunctionDeclaration(f)) = statements.first() else {
        panic!("expected function");
    };
    assert!(f.is_async);
    assert!(!f.generator);
}

#[test]
fn test_class_members() {
    let statements = body(
        "class A extends B { constructor(x) { super(x); } get p() {} set p(v) {} static s() {} *g() {} }",
    );
    let Some(Statement::ClassDeclaration(class)) = statements.first() else {
        panic!("expected class");
    };
    assert!(class.super_class.is_some());
    let kinds: Vec<MethodKind> = class.body.body.iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MethodKind::Constructor,
            MethodKind::Get,
            MethodKind::Set,
            MethodKind::Method,
            MethodKind::Method,
        ]
    );
    assert!(class.body.body[3].is_static);
    assert!(class.body.body[4].value.generator);
}

#[test]
fn test_destructuring_declarations() {
    let statements = body("var { a, b: { c = 1 }, ...rest } = obj, [x, , ...ys] = arr;");
    let Some(Statement::VariableDeclaration(decl)) = statements.first() else {
        panic!("expected declaration");
    };
    assert_eq!(decl.declarations.len(), 2);
    let Pattern::Object(object) = &decl.declarations[0].id else {
        panic!("expected object pattern");
    };
    assert!(matches!(
        object.properties.last(),
        Some(ObjectPatternProperty::Rest(_))
    ));
    let Pattern::Array(array) = &decl.declarations[1].id else {
        panic!("expected array pattern");
    };
    assert!(array.elements[1].is_none());
    assert!(matches!(
        array.elements.last(),
        Some(Some(Pattern::Rest(_)))
    ));
}

#[test]
fn test_for_variants() {
    assert!(matches!(
        body("for (;;) break;").first(),
        Some(Statement::For(_))
    ));
    assert!(matches!(
        body("for (var i = 0; i < 3; i++) ;").first(),
        Some(Statement::For(_))
    ));
    assert!(matches!(
        body("for (const k in obj) ;").first(),
        Some(Statement::ForIn(_))
    ));
    assert!(matches!(
        body("for (let v of xs) ;").first(),
        Some(Statement::ForOf(_))
    ));
    // `of` is contextual: this is a classic for loop over an identifier
    assert!(matches!(
        body("for (of; of; of) ;").first(),
        Some(Statement::For(_))
    ));
}

#[test]
fn test_for_head_let_disambiguation() {
    // `let` followed by a binding commits to a lexical head
    let statements = body("for (let [a] of xs) ;");
    let Some(Statement::ForOf(stmt)) = statements.first() else {
        panic!("expected for-of");
    };
    assert!(matches!(stmt.left, ForTarget::VariableDeclaration(_)));
    // otherwise it is a plain identifier in an expression head
    assert!(matches!(
        body("for (let in obj) ;").first(),
        Some(Statement::ForIn(_))
    ));
    assert!(matches!(
        body("for (let; ; ) ;").first(),
        Some(Statement::For(_))
    ));
}

#[test]
fn test_directive_prologue_stops_at_first_statement() {
    let statements = body("'one'; 'two'; x; 'three';");
    let directives: Vec<Option<&str>> = statements
        .iter()
        .map(|s| match s {
            Statement::Expression(e) => e.directive.as_deref(),
            _ => None,
        })
        .collect();
    assert_eq!(directives, vec![Some("one"), Some("two"), None, None]);
}

#[test]
fn test_tagged_template_with_member_tag() {
    let Expression::TaggedTemplate(tagged) = first_expression("a.b`x${y}z`;") else {
        panic!("expected tagged template");
    };
    assert!(matches!(*tagged.tag, Expression::Member(_)));
    assert_eq!(tagged.quasi.quasis.len(), 2);
    assert_eq!(tagged.quasi.expressions.len(), 1);
}

#[test]
fn test_nested_template_tag_status_is_per_template() {
    // an outer tag covers only the outer template: the untagged inner
    // template must still cook its escapes
    assert_eq!(
        parse_script("tag`a${ `\\u{ZZ}` }b`;").unwrap_err().message(),
        "Invalid escape sequence in template literal"
    );
    // and an inner tag covers only the inner template
    assert!(parse_script("`a${ tag`\\u{ZZ}` }b`;").is_ok());
    let Expression::TaggedTemplate(outer) = first_expression("tag`a${ `inner ${x}` }b`;") else {
        panic!("expected tagged template");
    };
    let Some(Expression::TemplateLiteral(inner)) = outer.quasi.expressions.first() else {
        panic!("expected nested template");
    };
    assert_eq!(inner.quasis.len(), 2);
}

#[test]
fn test_sequence_in_parens_is_not_arrow_params() {
    let Expression::Call(call) = first_expression("f((a, b));") else {
        panic!("expected call");
    };
    assert_eq!(call.arguments.len(), 1);
    assert!(matches!(
        call.arguments.first(),
        Some(Expression::Sequence(_))
    ));
}

#[test]
fn test_module_roundtrip_shapes() {
    let program = parse_module(
        "import def, * as ns from 'a';\nimport { x, y as z } from 'b';\nexport { z as w };\nexport const k = 1;\nexport default class {}",
    )
    .unwrap();
    assert_eq!(program.source_type, SourceType::Module);
    assert_eq!(program.body.len(), 5);
    let Some(Statement::Import(first)) = program.body.first() else {
        panic!("expected import");
    };
    assert_eq!(first.specifiers.len(), 2);
    assert!(matches!(
        program.body.last(),
        Some(Statement::ExportDefault(ExportDefaultDeclaration {
            declaration: ExportDefaultKind::Class(_),
            ..
        }))
    ));
}

#[test]
fn test_error_location_points_at_offending_token() {
    let err = parse_script("var a = ;").unwrap_err();
    let location = err.location();
    assert_eq!(location.line, 1);
    assert_eq!(location.column, 8);
    assert!(matches!(err, ParseError::Syntax { .. }));
}

#[test]
fn test_deterministic_output() {
    let source = "class A { m() { return [1, , 2].map(x => x ** 2); } }";
    let first = parse_script(source).unwrap();
    let second = parse_script(source).unwrap();
    assert_eq!(first, second);
}
