//! ESTree serialization
//!
//! Flattens the typed AST into [`serde_json::Value`] trees shaped like
//! esprima's output: a `type` discriminant plus per-node fields, with
//! `range` and `loc` attached on demand. Emission is separate from parsing
//! so the same [`Program`] can be serialized with different metadata
//! settings.

use serde_json::{Map, Value, json};

use crate::ParseOptions;
use crate::ast::*;
use crate::lexer::Span;

/// Serialize a parsed program into an ESTree JSON document.
pub fn to_json(program: &Program, options: &ParseOptions) -> Value {
    Serializer {
        ranges: options.ranges,
        loc: options.loc,
    }
    .program(program)
}

/// Format a number the way JavaScript's `String(n)` does, as far as the
/// parser needs it: property keys and duplicate detection.
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value == value.trunc() && value.abs() < 1e21 {
        return format!("{value:.0}");
    }
    format!("{value}")
}

struct Serializer {
    ranges: bool,
    loc: bool,
}

impl Serializer {
    fn node(&self, ty: &str, span: Span, fields: Vec<(&'static str, Value)>) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(ty.to_string()));
        for (key, value) in fields {
            map.insert(key.to_string(), value);
        }
        if self.ranges {
            map.insert(
                "range".to_string(),
                json!([span.start.index, span.end.index]),
            );
        }
        if self.loc {
            map.insert(
                "loc".to_string(),
                json!({
                    "start": { "line": span.start.line, "column": span.start.column },
                    "end": { "line": span.end.line, "column": span.end.column },
                }),
            );
        }
        Value::Object(map)
    }

    fn program(&self, program: &Program) -> Value {
        self.node(
            "Program",
            program.span,
            vec![
                (
                    "body",
                    Value::Array(program.body.iter().map(|s| self.statement(s)).collect()),
                ),
                (
                    "sourceType",
                    Value::String(program.source_type.as_str().to_string()),
                ),
            ],
        )
    }

    fn statement(&self, statement: &Statement) -> Value {
        match statement {
            Statement::Expression(s) => {
                let mut fields = vec![("expression", self.expression(&s.expression))];
                if let Some(directive) = &s.directive {
                    fields.push(("directive", Value::String(directive.clone())));
                }
                self.node("ExpressionStatement", s.span, fields)
            }
            Statement::Block(s) => self.block(s),
            Statement::Empty(s) => self.node("EmptyStatement", s.span, vec![]),
            Statement::Debugger(s) => self.node("DebuggerStatement", s.span, vec![]),
            Statement::With(s) => self.node(
                "WithStatement",
                s.span,
                vec![
                    ("object", self.expression(&s.object)),
                    ("body", self.statement(&s.body)),
                ],
            ),
            Statement::Return(s) => self.node(
                "ReturnStatement",
                s.span,
                vec![(
                    "argument",
                    s.argument
                        .as_ref()
                        .map_or(Value::Null, |e| self.expression(e)),
                )],
            ),
            Statement::Labeled(s) => self.node(
                "LabeledStatement",
                s.span,
                vec![
                    ("label", self.identifier(&s.label)),
                    ("body", self.statement(&s.body)),
                ],
            ),
            Statement::Break(s) => self.node(
                "BreakStatement",
                s.span,
                vec![(
                    "label",
                    s.label.as_ref().map_or(Value::Null, |l| self.identifier(l)),
                )],
            ),
            Statement::Continue(s) => self.node(
                "ContinueStatement",
                s.span,
                vec![(
                    "label",
                    s.label.as_ref().map_or(Value::Null, |l| self.identifier(l)),
                )],
            ),
            Statement::If(s) => self.node(
                "IfStatement",
                s.span,
                vec![
                    ("test", self.expression(&s.test)),
                    ("consequent", self.statement(&s.consequent)),
                    (
                        "alternate",
                        s.alternate
                            .as_ref()
                            .map_or(Value::Null, |a| self.statement(a)),
                    ),
                ],
            ),
            Statement::Switch(s) => self.node(
                "SwitchStatement",
                s.span,
                vec![
                    ("discriminant", self.expression(&s.discriminant)),
                    (
                        "cases",
                        Value::Array(s.cases.iter().map(|c| self.switch_case(c)).collect()),
                    ),
                ],
            ),
            Statement::Throw(s) => self.node(
                "ThrowStatement",
                s.span,
                vec![("argument", self.expression(&s.argument))],
            ),
            Statement::Try(s) => self.node(
                "TryStatement",
                s.span,
                vec![
                    ("block", self.block(&s.block)),
                    (
                        "handler",
                        s.handler
                            .as_ref()
                            .map_or(Value::Null, |h| self.catch_clause(h)),
                    ),
                    (
                        "finalizer",
                        s.finalizer.as_ref().map_or(Value::Null, |f| self.block(f)),
                    ),
                ],
            ),
            Statement::While(s) => self.node(
                "WhileStatement",
                s.span,
                vec![
                    ("test", self.expression(&s.test)),
                    ("body", self.statement(&s.body)),
                ],
            ),
            Statement::DoWhile(s) => self.node(
                "DoWhileStatement",
                s.span,
                vec![
                    ("body", self.statement(&s.body)),
                    ("test", self.expression(&s.test)),
                ],
            ),
            Statement::For(s) => self.node(
                "ForStatement",
                s.span,
                vec![
                    (
                        "init",
                        s.init.as_ref().map_or(Value::Null, |init| match init {
                            ForInit::VariableDeclaration(d) => self.variable_declaration(d),
                            ForInit::Expression(e) => self.expression(e),
                        }),
                    ),
                    (
                        "test",
                        s.test.as_ref().map_or(Value::Null, |e| self.expression(e)),
                    ),
                    (
                        "update",
                        s.update
                            .as_ref()
                            .map_or(Value::Null, |e| self.expression(e)),
                    ),
                    ("body", self.statement(&s.body)),
                ],
            ),
            Statement::ForIn(s) => self.node(
                "ForInStatement",
                s.span,
                vec![
                    ("left", self.for_target(&s.left)),
                    ("right", self.expression(&s.right)),
                    ("body", self.statement(&s.body)),
                ],
            ),
            Statement::ForOf(s) => self.node(
                "ForOfStatement",
                s.span,
                vec![
                    ("left", self.for_target(&s.left)),
                    ("right", self.expression(&s.right)),
                    ("body", self.statement(&s.body)),
                ],
            ),
            Statement::VariableDeclaration(s) => self.variable_declaration(s),
            Statement::FunctionDeclaration(s) => self.function_declaration(s),
            Statement::ClassDeclaration(s) => self.class_declaration(s),
            Statement::Import(s) => self.node(
                "ImportDeclaration",
                s.span,
                vec![
                    (
                        "specifiers",
                        Value::Array(
                            s.specifiers
                                .iter()
                                .map(|sp| self.import_specifier(sp))
                                .collect(),
                        ),
                    ),
                    ("source", self.literal(&s.source)),
                ],
            ),
            Statement::ExportNamed(s) => self.node(
                "ExportNamedDeclaration",
                s.span,
                vec![
                    (
                        "declaration",
                        s.declaration
                            .as_ref()
                            .map_or(Value::Null, |d| self.statement(d)),
                    ),
                    (
                        "specifiers",
                        Value::Array(
                            s.specifiers
                                .iter()
                                .map(|sp| {
                                    self.node(
                                        "ExportSpecifier",
                                        sp.span,
                                        vec![
                                            ("local", self.identifier(&sp.local)),
                                            ("exported", self.identifier(&sp.exported)),
                                        ],
                                    )
                                })
                                .collect(),
                        ),
                    ),
                    (
                        "source",
                        s.source.as_ref().map_or(Value::Null, |l| self.literal(l)),
                    ),
                ],
            ),
            Statement::ExportDefault(s) => self.node(
                "ExportDefaultDeclaration",
                s.span,
                vec![(
                    "declaration",
                    match &s.declaration {
                        ExportDefaultKind::Function(f) => self.function_declaration(f),
                        ExportDefaultKind::Class(c) => self.class_declaration(c),
                        ExportDefaultKind::Expression(e) => self.expression(e),
                    },
                )],
            ),
            Statement::ExportAll(s) => self.node(
                "ExportAllDeclaration",
                s.span,
                vec![("source", self.literal(&s.source))],
            ),
        }
    }

    fn block(&self, block: &BlockStatement) -> Value {
        self.node(
            "BlockStatement",
            block.span,
            vec![(
                "body",
                Value::Array(block.body.iter().map(|s| self.statement(s)).collect()),
            )],
        )
    }

    fn switch_case(&self, case: &SwitchCase) -> Value {
        self.node(
            "SwitchCase",
            case.span,
            vec![
                (
                    "test",
                    case.test
                        .as_ref()
                        .map_or(Value::Null, |e| self.expression(e)),
                ),
                (
                    "consequent",
                    Value::Array(case.consequent.iter().map(|s| self.statement(s)).collect()),
                ),
            ],
        )
    }

    fn catch_clause(&self, clause: &CatchClause) -> Value {
        self.node(
            "CatchClause",
            clause.span,
            vec![
                ("param", self.pattern(&clause.param)),
                ("body", self.block(&clause.body)),
            ],
        )
    }

    fn for_target(&self, target: &ForTarget) -> Value {
        match target {
            ForTarget::VariableDeclaration(d) => self.variable_declaration(d),
            ForTarget::Pattern(p) => self.pattern(p),
        }
    }

    fn variable_declaration(&self, declaration: &VariableDeclaration) -> Value {
        self.node(
            "VariableDeclaration",
            declaration.span,
            vec![
                (
                    "declarations",
                    Value::Array(
                        declaration
                            .declarations
                            .iter()
                            .map(|d| {
                                self.node(
                                    "VariableDeclarator",
                                    d.span,
                                    vec![
                                        ("id", self.pattern(&d.id)),
                                        (
                                            "init",
                                            d.init
                                                .as_ref()
                                                .map_or(Value::Null, |e| self.expression(e)),
                                        ),
                                    ],
                                )
                            })
                            .collect(),
                    ),
                ),
                (
                    "kind",
                    Value::String(declaration.kind.as_str().to_string()),
                ),
            ],
        )
    }

    fn function_declaration(&self, function: &FunctionDeclaration) -> Value {
        self.node(
            "FunctionDeclaration",
            function.span,
            self.function_fields(
                function.id.as_ref(),
                &function.params,
                &function.body,
                function.generator,
                function.is_async,
            ),
        )
    }

    fn function_expression(&self, function: &FunctionExpression) -> Value {
        self.node(
            "FunctionExpression",
            function.span,
            self.function_fields(
                function.id.as_ref(),
                &function.params,
                &function.body,
                function.generator,
                function.is_async,
            ),
        )
    }

    fn function_fields(
        &self,
        id: Option<&Identifier>,
        params: &[Pattern],
        body: &BlockStatement,
        generator: bool,
        is_async: bool,
    ) -> Vec<(&'static str, Value)> {
        vec![
            ("id", id.map_or(Value::Null, |i| self.identifier(i))),
            (
                "params",
                Value::Array(params.iter().map(|p| self.pattern(p)).collect()),
            ),
            ("body", self.block(body)),
            ("generator", Value::Bool(generator)),
            ("expression", Value::Bool(false)),
            ("async", Value::Bool(is_async)),
        ]
    }

    fn class_declaration(&self, class: &ClassDeclaration) -> Value {
        self.node(
            "ClassDeclaration",
            class.span,
            self.class_fields(class.id.as_ref(), class.super_class.as_deref(), &class.body),
        )
    }

    fn class_fields(
        &self,
        id: Option<&Identifier>,
        super_class: Option<&Expression>,
        body: &ClassBody,
    ) -> Vec<(&'static str, Value)> {
        vec![
            ("id", id.map_or(Value::Null, |i| self.identifier(i))),
            (
                "superClass",
                super_class.map_or(Value::Null, |e| self.expression(e)),
            ),
            (
                "body",
                self.node(
                    "ClassBody",
                    body.span,
                    vec![(
                        "body",
                        Value::Array(
                            body.body.iter().map(|m| self.method_definition(m)).collect(),
                        ),
                    )],
                ),
            ),
        ]
    }

    fn method_definition(&self, method: &MethodDefinition) -> Value {
        self.node(
            "MethodDefinition",
            method.span,
            vec![
                ("key", self.property_key(&method.key)),
                ("computed", Value::Bool(method.computed)),
                ("value", self.function_expression(&method.value)),
                ("kind", Value::String(method.kind.as_str().to_string())),
                ("static", Value::Bool(method.is_static)),
            ],
        )
    }

    fn import_specifier(&self, specifier: &ImportSpecifier) -> Value {
        match specifier {
            ImportSpecifier::Named {
                local,
                imported,
                span,
            } => self.node(
                "ImportSpecifier",
                *span,
                vec![
                    ("local", self.identifier(local)),
                    ("imported", self.identifier(imported)),
                ],
            ),
            ImportSpecifier::Default { local, span } => self.node(
                "ImportDefaultSpecifier",
                *span,
                vec![("local", self.identifier(local))],
            ),
            ImportSpecifier::Namespace { local, span } => self.node(
                "ImportNamespaceSpecifier",
                *span,
                vec![("local", self.identifier(local))],
            ),
        }
    }

    fn expression(&self, expression: &Expression) -> Value {
        match expression {
            Expression::Identifier(e) => self.identifier(e),
            Expression::Literal(e) => self.literal(e),
            Expression::This(e) => self.node("ThisExpression", e.span, vec![]),
            Expression::Super(e) => self.node("Super", e.span, vec![]),
            Expression::Array(e) => self.node(
                "ArrayExpression",
                e.span,
                vec![(
                    "elements",
                    Value::Array(
                        e.elements
                            .iter()
                            .map(|el| el.as_ref().map_or(Value::Null, |x| self.expression(x)))
                            .collect(),
                    ),
                )],
            ),
            Expression::Object(e) => self.node(
                "ObjectExpression",
                e.span,
                vec![(
                    "properties",
                    Value::Array(
                        e.properties
                            .iter()
                            .map(|p| match p {
                                ObjectProperty::Property(p) => self.property(p),
                                ObjectProperty::Spread(s) => self.spread(s),
                            })
                            .collect(),
                    ),
                )],
            ),
            Expression::Function(e) => self.function_expression(e),
            Expression::Arrow(e) => {
                let (body, is_expr) = match &e.body {
                    ArrowBody::Block(b) => (self.block(b), false),
                    ArrowBody::Expression(x) => (self.expression(x), true),
                };
                self.node(
                    "ArrowFunctionExpression",
                    e.span,
                    vec![
                        ("id", Value::Null),
                        (
                            "params",
                            Value::Array(e.params.iter().map(|p| self.pattern(p)).collect()),
                        ),
                        ("body", body),
                        ("generator", Value::Bool(false)),
                        ("expression", Value::Bool(is_expr)),
                        ("async", Value::Bool(e.is_async)),
                    ],
                )
            }
            Expression::Class(e) => self.node(
                "ClassExpression",
                e.span,
                self.class_fields(e.id.as_ref(), e.super_class.as_deref(), &e.body),
            ),
            Expression::TemplateLiteral(e) => self.template_literal(e),
            Expression::TaggedTemplate(e) => self.node(
                "TaggedTemplateExpression",
                e.span,
                vec![
                    ("tag", self.expression(&e.tag)),
                    ("quasi", self.template_literal(&e.quasi)),
                ],
            ),
            Expression::Member(e) => self.node(
                "MemberExpression",
                e.span,
                vec![
                    ("computed", Value::Bool(e.computed)),
                    ("object", self.expression(&e.object)),
                    ("property", self.expression(&e.property)),
                ],
            ),
            Expression::Call(e) => self.node(
                "CallExpression",
                e.span,
                vec![
                    ("callee", self.expression(&e.callee)),
                    (
                        "arguments",
                        Value::Array(e.arguments.iter().map(|a| self.expression(a)).collect()),
                    ),
                ],
            ),
            Expression::New(e) => self.node(
                "NewExpression",
                e.span,
                vec![
                    ("callee", self.expression(&e.callee)),
                    (
                        "arguments",
                        Value::Array(e.arguments.iter().map(|a| self.expression(a)).collect()),
                    ),
                ],
            ),
            Expression::Update(e) => self.node(
                "UpdateExpression",
                e.span,
                vec![
                    ("operator", Value::String(e.operator.as_str().to_string())),
                    ("argument", self.expression(&e.argument)),
                    ("prefix", Value::Bool(e.prefix)),
                ],
            ),
            Expression::Unary(e) => self.node(
                "UnaryExpression",
                e.span,
                vec![
                    ("operator", Value::String(e.operator.as_str().to_string())),
                    ("argument", self.expression(&e.argument)),
                    ("prefix", Value::Bool(true)),
                ],
            ),
            Expression::Binary(e) => self.node(
                "BinaryExpression",
                e.span,
                vec![
                    ("operator", Value::String(e.operator.as_str().to_string())),
                    ("left", self.expression(&e.left)),
                    ("right", self.expression(&e.right)),
                ],
            ),
            Expression::Logical(e) => self.node(
                "LogicalExpression",
                e.span,
                vec![
                    ("operator", Value::String(e.operator.as_str().to_string())),
                    ("left", self.expression(&e.left)),
                    ("right", self.expression(&e.right)),
                ],
            ),
            Expression::Conditional(e) => self.node(
                "ConditionalExpression",
                e.span,
                vec![
                    ("test", self.expression(&e.test)),
                    ("consequent", self.expression(&e.consequent)),
                    ("alternate", self.expression(&e.alternate)),
                ],
            ),
            Expression::Assignment(e) => self.node(
                "AssignmentExpression",
                e.span,
                vec![
                    ("operator", Value::String(e.operator.as_str().to_string())),
                    (
                        "left",
                        match &e.left {
                            AssignTarget::Pattern(p) => self.pattern(p),
                            AssignTarget::Expression(x) => self.expression(x),
                        },
                    ),
                    ("right", self.expression(&e.right)),
                ],
            ),
            Expression::Sequence(e) => self.node(
                "SequenceExpression",
                e.span,
                vec![(
                    "expressions",
                    Value::Array(e.expressions.iter().map(|x| self.expression(x)).collect()),
                )],
            ),
            Expression::Yield(e) => self.node(
                "YieldExpression",
                e.span,
                vec![
                    (
                        "argument",
                        e.argument
                            .as_ref()
                            .map_or(Value::Null, |x| self.expression(x)),
                    ),
                    ("delegate", Value::Bool(e.delegate)),
                ],
            ),
            Expression::Await(e) => self.node(
                "AwaitExpression",
                e.span,
                vec![("argument", self.expression(&e.argument))],
            ),
            Expression::MetaProperty(e) => self.node(
                "MetaProperty",
                e.span,
                vec![
                    ("meta", self.identifier(&e.meta)),
                    ("property", self.identifier(&e.property)),
                ],
            ),
            Expression::Spread(e) => self.spread(e),
        }
    }

    fn template_literal(&self, template: &TemplateLiteral) -> Value {
        self.node(
            "TemplateLiteral",
            template.span,
            vec![
                (
                    "quasis",
                    Value::Array(
                        template
                            .quasis
                            .iter()
                            .map(|q| {
                                self.node(
                                    "TemplateElement",
                                    q.span,
                                    vec![
                                        (
                                            "value",
                                            json!({
                                                "raw": q.raw,
                                                "cooked": q.cooked,
                                            }),
                                        ),
                                        ("tail", Value::Bool(q.tail)),
                                    ],
                                )
                            })
                            .collect(),
                    ),
                ),
                (
                    "expressions",
                    Value::Array(
                        template
                            .expressions
                            .iter()
                            .map(|x| self.expression(x))
                            .collect(),
                    ),
                ),
            ],
        )
    }

    fn property(&self, property: &Property) -> Value {
        self.node(
            "Property",
            property.span,
            vec![
                ("key", self.property_key(&property.key)),
                ("computed", Value::Bool(property.computed)),
                ("value", self.expression(&property.value)),
                (
                    "kind",
                    Value::String(property.kind.as_str().to_string()),
                ),
                ("method", Value::Bool(property.method)),
                ("shorthand", Value::Bool(property.shorthand)),
            ],
        )
    }

    fn property_key(&self, key: &PropertyKey) -> Value {
        match key {
            PropertyKey::Identifier(id) => self.identifier(id),
            PropertyKey::Literal(lit) => self.literal(lit),
            PropertyKey::Computed(expr) => self.expression(expr),
        }
    }

    fn spread(&self, spread: &SpreadElement) -> Value {
        self.node(
            "SpreadElement",
            spread.span,
            vec![("argument", self.expression(&spread.argument))],
        )
    }

    fn pattern(&self, pattern: &Pattern) -> Value {
        match pattern {
            Pattern::Identifier(p) => self.identifier(p),
            Pattern::Array(p) => self.node(
                "ArrayPattern",
                p.span,
                vec![(
                    "elements",
                    Value::Array(
                        p.elements
                            .iter()
                            .map(|el| el.as_ref().map_or(Value::Null, |x| self.pattern(x)))
                            .collect(),
                    ),
                )],
            ),
            Pattern::Object(p) => self.node(
                "ObjectPattern",
                p.span,
                vec![(
                    "properties",
                    Value::Array(
                        p.properties
                            .iter()
                            .map(|prop| match prop {
                                ObjectPatternProperty::Property(prop) => self.node(
                                    "Property",
                                    prop.span,
                                    vec![
                                        ("key", self.property_key(&prop.key)),
                                        ("computed", Value::Bool(prop.computed)),
                                        ("value", self.pattern(&prop.value)),
                                        ("kind", Value::String("init".to_string())),
                                        ("method", Value::Bool(false)),
                                        ("shorthand", Value::Bool(prop.shorthand)),
                                    ],
                                ),
                                ObjectPatternProperty::Rest(rest) => self.rest(rest),
                            })
                            .collect(),
                    ),
                )],
            ),
            Pattern::Assignment(p) => self.node(
                "AssignmentPattern",
                p.span,
                vec![
                    ("left", self.pattern(&p.left)),
                    ("right", self.expression(&p.right)),
                ],
            ),
            Pattern::Rest(p) => self.rest(p),
            Pattern::Expression(p) => self.expression(p),
        }
    }

    fn rest(&self, rest: &RestElement) -> Value {
        self.node(
            "RestElement",
            rest.span,
            vec![("argument", self.pattern(&rest.argument))],
        )
    }

    fn identifier(&self, identifier: &Identifier) -> Value {
        self.node(
            "Identifier",
            identifier.span,
            vec![("name", Value::String(identifier.name.clone()))],
        )
    }

    fn literal(&self, literal: &Literal) -> Value {
        let mut fields: Vec<(&'static str, Value)> = Vec::new();
        match &literal.value {
            LiteralValue::Null => fields.push(("value", Value::Null)),
            LiteralValue::Boolean(b) => fields.push(("value", Value::Bool(*b))),
            LiteralValue::String(s) => fields.push(("value", Value::String(s.clone()))),
            LiteralValue::Number(n) => fields.push((
                "value",
                // non-finite numbers have no JSON representation
                serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            )),
            LiteralValue::RegExp { pattern, flags } => {
                // a compiled RegExp value cannot cross into JSON
                fields.push(("value", json!({})));
                fields.push(("regex", json!({ "pattern": pattern, "flags": flags })));
            }
        }
        if let Some(raw) = &literal.raw {
            fields.push(("raw", Value::String(raw.clone())));
        }
        self.node("Literal", literal.span, fields)
    }
}
